//! synd-serve - HTTP API for Syndicate

use anyhow::{Context, Result};
use clap::Parser;
use libsyndicate::logging::LoggingConfig;
use libsyndicate::service::events::EventReceiver;
use libsyndicate::{Codec, Config, SyndicateService};
use tokio::sync::broadcast::error::RecvError;

#[derive(Parser, Debug)]
#[command(name = "synd-serve")]
#[command(version)]
#[command(about = "Serve the Syndicate publishing API over HTTP", long_about = None)]
struct Cli {
    /// Address to listen on (overrides [server].bind)
    #[arg(short, long)]
    bind: Option<String>,

    /// Key used to encrypt and decrypt stored API keys
    #[arg(long, env = "SYNDICATE_ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: Option<String>,

    /// Enable verbose logging to stderr
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    LoggingConfig::from_env().with_verbose(cli.verbose).init();

    let config = Config::load()?;
    let codec = match cli.encryption_key {
        Some(key) => Codec::new(&key)?,
        None => Codec::from_env()?,
    };
    let service = SyndicateService::from_config(&config, codec).await?;

    tokio::spawn(log_events(service.subscribe()));

    let bind = cli.bind.unwrap_or_else(|| config.server.bind.clone());
    let listener = tokio::net::TcpListener::bind(&bind)
        .await
        .with_context(|| format!("Failed to bind {}", bind))?;
    tracing::info!("Listening on {}", bind);

    axum::serve(listener, synd_serve::router(service))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}

async fn log_events(mut events: EventReceiver) {
    loop {
        match events.recv().await {
            Ok(event) => match serde_json::to_string(&event) {
                Ok(json) => tracing::info!(target: "syndicate::events", "{}", json),
                Err(e) => tracing::warn!("Failed to serialize event: {}", e),
            },
            Err(RecvError::Lagged(skipped)) => {
                tracing::warn!("Event log fell behind, skipped {} events", skipped)
            }
            Err(RecvError::Closed) => break,
        }
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    tracing::info!("Shutting down");
}
