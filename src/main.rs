//! ovh-exporter entry point.
//!
//! Initializes logging and delegates to the CLI module.

use ovh_exporter::cli::LogFormat;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments first to get the logging flags
    let cli = ovh_exporter::cli::parse_cli();

    // Priority: RUST_LOG env var > --log.level CLI arg > default "info"
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&cli.log_level));

    match cli.log_format {
        LogFormat::Logfmt => tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init(),
        LogFormat::Json => tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init(),
    }

    ovh_exporter::cli::run_with_cli(cli).await
}
