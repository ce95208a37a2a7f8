// UI layer: the numbered query menu. Reads one selection per line, hands
// the chosen query to the reporter and loops until the user quits.
//
// Input and output are generic so the whole session can be driven from an
// in-memory script in tests.

use std::io::{self, BufRead, Write};

use tracing::info;

use crate::api::GraphClient;
use crate::catalog::{Catalog, Selection};
use crate::error::{Error, Result};
use crate::report::Reporter;

/// Interactive menu over a fixed catalog.
pub struct Dispatcher<'a, C: ?Sized, R, W> {
    catalog: Catalog,
    reporter: Reporter<'a, C>,
    input: R,
    output: W,
}

impl<'a, C, R, W> Dispatcher<'a, C, R, W>
where
    C: GraphClient + ?Sized,
    R: BufRead,
    W: Write,
{
    pub fn new(catalog: Catalog, client: &'a C, input: R, output: W) -> Self {
        Dispatcher {
            catalog,
            reporter: Reporter::new(client),
            input,
            output,
        }
    }

    /// Show a spinner while queries run.
    pub fn with_progress(mut self, enabled: bool) -> Self {
        self.reporter = self.reporter.with_progress(enabled);
        self
    }

    /// Run the menu loop.
    ///
    /// Returns `Ok` when the user picks `0`, closes the input, or picks a
    /// number outside the menu. Non-numeric input and request failures end
    /// the session with an error.
    pub async fn run(&mut self) -> Result<()> {
        loop {
            self.print_menu()?;
            let choice = self.read_choice()?;

            match self.catalog.select(choice) {
                Selection::Exit => break,
                Selection::OutOfRange(choice) => {
                    info!(choice, "Selection outside the menu, ending session");
                    writeln!(self.output, "No such query. Game over.")?;
                    break;
                }
                Selection::Entry(operation) => {
                    self.reporter.submit(operation, &mut self.output).await?;
                    writeln!(self.output)?;
                    writeln!(self.output, "Press Enter to continue")?;
                    self.output.flush()?;
                    self.wait_for_enter()?;
                }
            }
        }

        writeln!(self.output, "Done. Press any key to exit...")?;
        self.output.flush()?;
        self.wait_for_enter()?;
        Ok(())
    }

    pub fn into_output(self) -> W {
        self.output
    }

    fn print_menu(&mut self) -> io::Result<()> {
        writeln!(self.output, "Gremlin Queries")?;
        writeln!(self.output, "===============")?;
        for (index, operation) in self.catalog.operations().enumerate() {
            writeln!(self.output, "{}. {}", index + 1, operation.label)?;
        }
        writeln!(
            self.output,
            "What query would you like to run? Select 0 to quit."
        )?;
        self.output.flush()
    }

    fn read_choice(&mut self) -> Result<i64> {
        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            // End of input reads as the exit sentinel.
            return Ok(0);
        }
        let trimmed = line.trim();
        trimmed
            .parse::<i64>()
            .map_err(|_| Error::Input(format!("{:?} is not a number", trimmed)))
    }

    fn wait_for_enter(&mut self) -> io::Result<()> {
        let mut line = String::new();
        self.input.read_line(&mut line)?;
        Ok(())
    }
}

/// Run the menu on stdin/stdout with the default holiday catalog.
pub async fn main_menu<C: GraphClient + ?Sized>(client: &C) -> Result<()> {
    let stdin = io::stdin();
    let mut dispatcher =
        Dispatcher::new(Catalog::default(), client, stdin.lock(), io::stdout()).with_progress(true);
    dispatcher.run().await
}
