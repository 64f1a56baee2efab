use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, ValueEnum};
use tokio::signal;
use tracing::info;
use tracing_subscriber::EnvFilter;

use turnstile::config::AppConfig;
use turnstile::http::HttpServer;
use turnstile::ratelimit::RateLimiter;

/// Per-resource token bucket admission control service.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Cli {
    /// Path to the configuration file (JSON, YAML or TOML)
    #[arg(short, long, env = "TURNSTILE_CONFIG", default_value = "config/config.yaml")]
    config: PathBuf,

    /// Override the configured listen port
    #[arg(short, long)]
    port: Option<u16>,

    /// Log output format
    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_tracing(cli.log_format);

    info!("Starting Turnstile Admission Control Service");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let mut config = AppConfig::from_file(&cli.config)?;
    if let Some(port) = cli.port {
        config.server.port = port;
    }
    info!(
        addr = %config.server.socket_addr(),
        endpoints = config.rate_limits_per_endpoint.len(),
        "Configuration loaded"
    );

    let rate_limiter = Arc::new(RateLimiter::from_limits(&config.rate_limits_per_endpoint));
    info!(buckets = rate_limiter.bucket_count(), "Rate limiter initialized");

    let server = HttpServer::new(config.server.socket_addr(), rate_limiter)
        .with_shutdown_timeout(config.server.shutdown_timeout());

    server.serve_with_shutdown(shutdown_signal()).await?;

    info!("Turnstile Admission Control Service stopped");
    Ok(())
}

/// Install the global subscriber. `RUST_LOG` takes precedence over the
/// `info` default.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    match format {
        LogFormat::Text => tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_thread_ids(true)
            .init(),
        LogFormat::Json => tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .with_current_span(true)
            .init(),
    }
}

/// Wait for a shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating graceful shutdown");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating graceful shutdown");
        }
    }
}
