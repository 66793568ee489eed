//! Flag definitions and process wiring for ovh-exporter.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use prometheus::Registry;
use tokio::sync::broadcast;
use tracing::{error, info, warn};

use crate::collectors::{discover_projects, UsageCollector};
use crate::metrics::{UsageMetrics, DEFAULT_NAMESPACE};
use crate::ovh::{Credentials, OvhClient};
use crate::server::{MetricsServer, WebConfig, DEFAULT_LISTEN_ADDRESS, DEFAULT_TELEMETRY_PATH};

/// How long background tasks get to finish after a shutdown signal.
const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(30);

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum LogFormat {
    /// Human readable key=value lines.
    Logfmt,
    /// One JSON object per line.
    Json,
}

/// Prometheus exporter for OVH Public Cloud storage usage.
#[derive(Parser, Debug)]
#[command(name = "ovh-exporter")]
#[command(about = "Prometheus OVH API Exporter")]
#[command(version)]
#[command(
    long_about = "ovh-exporter polls the OVH API for the current hourly storage usage of every public cloud project and exposes it as Prometheus gauges.\n\nExample usage:\n  ovh-exporter --api-endpoint ovh-eu --api-app-key KEY --api-app-secret SECRET --api-consumer-key CK"
)]
pub struct Cli {
    /// OVH API endpoint. Either a URL or one of these aliases: ovh-eu, ovh-ca, ovh-us,
    /// kimsufi-eu, kimsufi-ca, soyoustart-eu, soyoustart-ca.
    #[arg(long, env = "OVH_EXPORTER_API_ENDPOINT")]
    pub api_endpoint: String,

    /// OVH API application key.
    #[arg(long, env = "OVH_EXPORTER_API_APP_KEY")]
    pub api_app_key: String,

    /// OVH API application secret.
    #[arg(long, env = "OVH_EXPORTER_API_APP_SECRET", hide_env_values = true)]
    pub api_app_secret: String,

    /// OVH API consumer key.
    #[arg(long, env = "OVH_EXPORTER_API_CONSUMER_KEY", hide_env_values = true)]
    pub api_consumer_key: String,

    /// Timeout for OVH API requests, in seconds.
    #[arg(long, env = "OVH_EXPORTER_API_TIMEOUT", default_value = "30",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub api_timeout: u64,

    /// Address on which to expose metrics and the landing page.
    #[arg(long = "web.listen-address", env = "OVH_EXPORTER_WEB_LISTEN_ADDRESS",
          default_value = DEFAULT_LISTEN_ADDRESS)]
    pub listen_address: String,

    /// Path under which to expose metrics.
    #[arg(long = "web.telemetry-path", env = "OVH_EXPORTER_WEB_TELEMETRY_PATH",
          default_value = DEFAULT_TELEMETRY_PATH)]
    pub telemetry_path: String,

    /// Path to a web configuration file enabling TLS and/or basic authentication.
    #[arg(long = "web.config.file", env = "OVH_EXPORTER_WEB_CONFIG_FILE")]
    pub web_config_file: Option<PathBuf>,

    /// Prefix for every exported metric name.
    #[arg(long, env = "OVH_EXPORTER_METRIC_PREFIX", default_value = DEFAULT_NAMESPACE)]
    pub metric_prefix: String,

    /// Seconds between two collection cycles.
    #[arg(long, env = "OVH_EXPORTER_COLLECT_INTERVAL", default_value = "60",
          value_parser = clap::value_parser!(u64).range(1..))]
    pub collect_interval: u64,

    /// Log level (trace, debug, info, warn, error).
    #[arg(long = "log.level", default_value = "info")]
    pub log_level: String,

    /// Log output format.
    #[arg(long = "log.format", value_enum, default_value = "logfmt")]
    pub log_format: LogFormat,
}

impl Cli {
    /// Load `--web.config.file`, or an empty config when the flag is unset.
    fn web_config(&self) -> anyhow::Result<WebConfig> {
        match &self.web_config_file {
            Some(path) => Ok(WebConfig::load(path)?),
            None => Ok(WebConfig::default()),
        }
    }

    fn credentials(&self) -> Credentials {
        Credentials {
            app_key: self.api_app_key.clone(),
            app_secret: self.api_app_secret.clone(),
            consumer_key: self.api_consumer_key.clone(),
        }
    }
}

/// Parse CLI arguments and return the Cli struct.
///
/// This allows main.rs to access logging flags before running the exporter.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Parse CLI arguments and run the exporter.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the exporter with the parsed arguments.
///
/// Discovery failures are fatal and return before anything is served.
/// Otherwise this returns once a shutdown signal has been handled.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    info!(version = env!("CARGO_PKG_VERSION"), "Starting ovh-exporter");

    let web_config = cli.web_config()?;

    let client = OvhClient::new(
        &cli.api_endpoint,
        cli.credentials(),
        Duration::from_secs(cli.api_timeout),
    )
    .context("Failed to create OVH API client")?;
    info!(endpoint = client.base_url(), "Using OVH API endpoint");
    let client = Arc::new(client);

    let projects = discover_projects(client.as_ref())
        .await
        .context("Failed to discover cloud projects")?;
    if projects.is_empty() {
        warn!("No cloud projects found, only the exporter endpoint will be served");
    }

    let registry = Registry::new();
    let metrics = UsageMetrics::new(&registry, &cli.metric_prefix)
        .with_context(|| format!("Invalid metric prefix '{}'", cli.metric_prefix))?;

    let server = MetricsServer::bind(&cli.listen_address, registry, &cli.telemetry_path)
        .await
        .context("Failed to start scrape endpoint")?
        .with_web_config(&web_config)
        .context("Failed to apply web config")?;

    let (shutdown_tx, _) = broadcast::channel(1);

    let collector = UsageCollector::new(client, metrics, projects)
        .with_interval(Duration::from_secs(cli.collect_interval));
    let collector_handle = collector.spawn(shutdown_tx.subscribe());
    let mut server_handle = tokio::spawn(server.serve(shutdown_tx.subscribe()));

    tokio::select! {
        result = &mut server_handle => {
            // The server only returns on its own if it failed.
            let _ = shutdown_tx.send(());
            let _ = tokio::time::timeout(SHUTDOWN_TIMEOUT, collector_handle).await;
            return match result {
                Ok(Ok(())) => Ok(()),
                Ok(Err(e)) => Err(e).context("Scrape endpoint failed"),
                Err(e) => Err(e).context("Scrape endpoint task panicked"),
            };
        }
        signal = shutdown_signal() => {
            signal.context("Failed to listen for shutdown signals")?;
        }
    }

    info!("Shutting down");
    // Ignore send error - tasks may have already stopped
    let _ = shutdown_tx.send(());

    let drain = async {
        if let Err(e) = collector_handle.await {
            error!(error = %e, "Usage collector panicked during shutdown");
        }
        match server_handle.await {
            Ok(Err(e)) => error!(error = %e, "Scrape endpoint failed during shutdown"),
            Err(e) => error!(error = %e, "Scrape endpoint panicked during shutdown"),
            Ok(Ok(())) => {}
        }
    };
    if tokio::time::timeout(SHUTDOWN_TIMEOUT, drain).await.is_err() {
        warn!(
            timeout_secs = SHUTDOWN_TIMEOUT.as_secs(),
            "Shutdown timed out, exiting anyway"
        );
    }

    info!("Shutdown complete");
    Ok(())
}

/// Resolve on SIGINT or SIGTERM.
#[cfg(unix)]
async fn shutdown_signal() -> std::io::Result<()> {
    use tokio::signal::unix::{signal, SignalKind};

    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sigint = signal(SignalKind::interrupt())?;

    tokio::select! {
        _ = sigterm.recv() => info!("Received SIGTERM"),
        _ = sigint.recv() => info!("Received SIGINT"),
    }
    Ok(())
}

#[cfg(not(unix))]
async fn shutdown_signal() -> std::io::Result<()> {
    tokio::signal::ctrl_c().await?;
    info!("Received Ctrl-C");
    Ok(())
}
