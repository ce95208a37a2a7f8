// Entrypoint for the graphmas console client.
// - Keeps `main` small: load config, connect, hand the client to the menu.
// - The client is closed on every exit path, including errors.

use anyhow::Context;
use graphmas_cli::api::pool::PoolSettings;
use graphmas_cli::api::{GraphClient, GremlinClient};
use graphmas_cli::config::Config;
use graphmas_cli::ui::main_menu;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Logs go to stderr so stdout only carries the menu and query output.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    println!("{}", config.summary());

    let client = GremlinClient::connect(&config, PoolSettings::default())
        .await
        .context("Failed to connect to the graph service")?;

    // Blocks until the user quits or a request fails.
    let outcome = main_menu(&client).await;
    client.close().await;

    outcome.context("Session ended with an error")
}
