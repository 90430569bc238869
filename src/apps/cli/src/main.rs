/// LightChat CLI
///
/// Terminal chat client for the LightChat proxy

mod logging;
mod ui;

use anyhow::{Context, Result};
use clap::Parser;
use lightchat_core::{ClientConfig, FileStore, Preferences, ProxyTransport};
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(name = "lightchat", version, about = "LightChat - streaming chat in your terminal")]
struct Cli {
    /// LightChat server URL (overrides the config file)
    #[arg(long)]
    server: Option<String>,

    /// Client config file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error, off)
    #[arg(long)]
    log_level: Option<String>,

    /// Debug mode
    #[arg(short, long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_config = logging::LogConfig::new(cli.log_level.as_deref(), cli.debug);
    if let Err(e) = logging::init(&log_config) {
        eprintln!("Warning: {:#}", e);
    }
    logging::spawn_log_cleanup_task(log_config.logs_root.clone());
    tracing::info!("Starting LightChat CLI v{}", lightchat_core::VERSION);

    let mut config = match cli.config.clone().or_else(ClientConfig::default_path) {
        Some(path) => ClientConfig::load(&path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => ClientConfig::default(),
    };
    if let Some(server) = cli.server {
        config.server_url = server;
    }
    tracing::info!("Using server {}", config.server_url);

    let settings_path = FileStore::default_path().unwrap_or_else(|| PathBuf::from("lightchat-settings.json"));
    let store = FileStore::open(settings_path);
    tracing::info!("Settings file: {}", store.path().display());
    let prefs = Preferences::load(Arc::new(store));
    let transport = Arc::new(ProxyTransport::new(config.server_url.clone(), config.request_timeout())?);
    let http = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(30))
        .build()
        .context("Failed to build HTTP client")?;

    let app = ui::chat::ChatApp::new(&config, prefs, transport, http);

    ui::install_panic_hook();
    let mut terminal = ui::init_terminal()?;
    let result = app.run(&mut terminal).await;
    ui::restore_terminal(terminal)?;

    if let Err(e) = &result {
        tracing::error!("LightChat CLI exited with error: {:#}", e);
    }
    result
}
