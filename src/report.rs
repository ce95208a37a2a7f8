// Query submission and reporting: forwards one catalog entry to the graph
// client and renders the records and status attributes as console text.

use std::io::Write;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;
use tracing::{debug, warn};

use crate::api::{GraphClient, ResultSet, StatusAttributes};
use crate::catalog::Operation;
use crate::error::{Error, Result};

/// Attributes printed after every response.
pub const RESPONSE_ATTRIBUTES: [&str; 3] = [
    "x-ms-status-code",
    "x-ms-total-server-time-ms",
    "x-ms-total-request-charge",
];

/// Extra attributes printed when a request fails.
pub const ERROR_ATTRIBUTES: [&str; 2] = ["x-ms-retry-after-ms", "x-ms-activity-id"];

pub struct Reporter<'a, C: ?Sized> {
    client: &'a C,
    progress: bool,
}

impl<'a, C: GraphClient + ?Sized> Reporter<'a, C> {
    pub fn new(client: &'a C) -> Self {
        Reporter {
            client,
            progress: false,
        }
    }

    /// Show a spinner on stderr while a query is in flight.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.progress = enabled;
        self
    }

    /// Run `operation` and print its outcome to `out`.
    ///
    /// A service error is printed with its status code and attributes and
    /// then returned, so the caller decides whether the session goes on.
    pub async fn submit<W: Write>(&self, operation: Operation, out: &mut W) -> Result<ResultSet> {
        debug!(label = operation.label, query = operation.query, "Submitting query");

        let spinner = self.progress.then(|| progress_spinner(operation.label));
        let outcome = self.client.submit(operation.query).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match outcome {
            Ok(result) => {
                debug!(records = result.len(), "Query completed");
                render_results(operation, &result, out)?;
                Ok(result)
            }
            Err(err) => {
                if let Error::Service {
                    code, attributes, ..
                } = &err
                {
                    warn!(code = *code, "Request failed");
                    render_service_error(*code, attributes, out)?;
                }
                Err(err)
            }
        }
    }
}

fn progress_spinner(label: &str) -> ProgressBar {
    let pb = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        pb.set_style(style);
    }
    pb.set_message(format!("Running \"{}\"...", label));
    pb.enable_steady_tick(Duration::from_millis(100));
    pb
}

/// Records (or "No Results") followed by the status attributes block.
pub fn render_results<W: Write>(operation: Operation, result: &ResultSet, out: &mut W) -> Result<()> {
    if result.is_empty() {
        writeln!(out, "No Results")?;
    } else {
        writeln!(out, "\tQuery: [{}, {}]", operation.label, operation.query)?;
        writeln!(out, "\tResult:")?;
        for record in result {
            writeln!(out, "\t{}", to_json(record))?;
        }
        writeln!(out)?;
    }
    render_status_attributes(result.status_attributes(), out)
}

pub fn render_status_attributes<W: Write>(attributes: &StatusAttributes, out: &mut W) -> Result<()> {
    writeln!(out, "\tStatusAttributes:")?;
    for key in RESPONSE_ATTRIBUTES {
        render_attribute(attributes, key, out)?;
    }
    Ok(())
}

pub fn render_service_error<W: Write>(
    code: u16,
    attributes: &StatusAttributes,
    out: &mut W,
) -> Result<()> {
    writeln!(out, "\tRequest Error!")?;
    writeln!(out, "\tStatusCode: {}", code)?;
    render_status_attributes(attributes, out)?;
    for key in ERROR_ATTRIBUTES {
        render_attribute(attributes, key, out)?;
    }
    Ok(())
}

/// JSON text of `attributes[key]`, or `null` when the key is absent.
pub fn attribute_as_string(attributes: &StatusAttributes, key: &str) -> String {
    attributes
        .get(key)
        .map(to_json)
        .unwrap_or_else(|| "null".to_string())
}

fn render_attribute<W: Write>(attributes: &StatusAttributes, key: &str, out: &mut W) -> Result<()> {
    writeln!(out, "\t[\"{}\"] : {}", key, attribute_as_string(attributes, key))?;
    Ok(())
}

fn to_json(value: &Value) -> String {
    // Serializing a `Value` cannot fail.
    serde_json::to_string(value).unwrap_or_default()
}
