//! Mathbox - everyday calculators in the terminal.

use anyhow::Result;
use mathbox_cli::{app, config};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Parse CLI args and settings first; the log level can come from either
    let config = config::AppConfig::parse();
    let settings = config::Settings::load(config.config.as_deref())?;

    // RUST_LOG wins over -v and the settings file
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(config.log_level(&settings)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    app::run(&config, &settings).await
}
