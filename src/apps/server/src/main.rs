use anyhow::Result;
use clap::Parser;
use lightchat_server::config::API_KEYS_ENV;
use lightchat_server::ServerConfig;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "lightchat-server", version, about = "LightChat API key and streaming chat proxy")]
struct Args {
    /// Address to listen on
    #[arg(long)]
    bind: Option<String>,

    /// OpenAI-compatible upstream base URL
    #[arg(long)]
    upstream: Option<String>,

    /// Model name sent upstream
    #[arg(long)]
    model: Option<String>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LIGHTCHAT_LOG_LEVEL", default_value = "info")]
    log_level: String,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},hyper=warn,reqwest=warn", args.log_level)));
    tracing_subscriber::fmt().with_env_filter(filter).with_target(false).init();

    let mut config = ServerConfig::load(args.config.as_deref())?;
    if let Ok(raw) = std::env::var(API_KEYS_ENV) {
        config.merge_api_keys(&raw);
    }
    if let Some(bind) = args.bind {
        config.bind = bind;
    }
    if let Some(upstream) = args.upstream {
        config.upstream_url = upstream;
    }
    if let Some(model) = args.model {
        config.model = model;
    }
    if config.api_keys.is_empty() {
        tracing::warn!("No shared API keys configured; clients must supply their own");
    }

    lightchat_server::run(config, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
