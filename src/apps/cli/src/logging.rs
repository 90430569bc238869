//! Logging Configuration
//!
//! The terminal belongs to the UI, so every run logs into its own session
//! directory under the user data dir.

use anyhow::{Context, Result};
use chrono::Local;
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::EnvFilter;

const SESSION_DIR_PATTERN: &str = r"^\d{8}T\d{6}$";
const MAX_LOG_SESSIONS: usize = 50;
const LOG_RETENTION_DAYS: i64 = 7;
pub const LOG_LEVEL_ENV: &str = "LIGHTCHAT_LOG_LEVEL";

#[derive(Debug, Clone)]
pub struct LogConfig {
    pub level: LevelFilter,
    pub logs_root: PathBuf,
    pub session_log_dir: PathBuf,
}

impl LogConfig {
    pub fn new(cli_level: Option<&str>, is_debug: bool) -> Self {
        let env_level = std::env::var(LOG_LEVEL_ENV).ok();
        let level = resolve_level(cli_level, env_level.as_deref(), is_debug);
        let logs_root = logs_root();
        let session_log_dir = create_session_log_dir(&logs_root);

        Self {
            level,
            logs_root,
            session_log_dir,
        }
    }

    pub fn app_log_path(&self) -> PathBuf {
        self.session_log_dir.join("app.log")
    }
}

/// `--log-level` wins, then `LIGHTCHAT_LOG_LEVEL`, then `--debug`.
/// Unparseable values fall through to the next source.
pub fn resolve_level(cli_level: Option<&str>, env_level: Option<&str>, is_debug: bool) -> LevelFilter {
    cli_level
        .and_then(parse_log_level)
        .or_else(|| env_level.and_then(parse_log_level))
        .unwrap_or(if is_debug {
            LevelFilter::DEBUG
        } else {
            LevelFilter::INFO
        })
}

pub fn parse_log_level(value: &str) -> Option<LevelFilter> {
    match value.trim().to_lowercase().as_str() {
        "trace" => Some(LevelFilter::TRACE),
        "debug" => Some(LevelFilter::DEBUG),
        "info" => Some(LevelFilter::INFO),
        "warn" => Some(LevelFilter::WARN),
        "error" => Some(LevelFilter::ERROR),
        "off" => Some(LevelFilter::OFF),
        _ => None,
    }
}

pub fn logs_root() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("lightchat")
        .join("logs")
}

pub fn create_session_log_dir(logs_root: &Path) -> PathBuf {
    let timestamp = Local::now().format("%Y%m%dT%H%M%S").to_string();
    let session_dir = logs_root.join(&timestamp);

    if let Err(e) = std::fs::create_dir_all(&session_dir) {
        eprintln!("Warning: Failed to create log session directory: {}", e);
        return logs_root.to_path_buf();
    }

    session_dir
}

/// Install the global subscriber writing to `app.log`. `log` records from the
/// library crates are captured through tracing-subscriber's log bridge.
pub fn init(config: &LogConfig) -> Result<()> {
    let path = config.app_log_path();
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let filter = EnvFilter::new(format!(
        "{},hyper=warn,hyper_util=warn,reqwest=warn",
        config.level
    ));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_thread_ids(true)
        .init();

    tracing::info!(
        "Logging initialized: level={}, session_dir={}",
        config.level,
        config.session_log_dir.display()
    );
    Ok(())
}

fn parse_session_timestamp(name: &str) -> Option<chrono::NaiveDateTime> {
    chrono::NaiveDateTime::parse_from_str(name, "%Y%m%dT%H%M%S").ok()
}

pub fn spawn_log_cleanup_task(logs_root: PathBuf) {
    tokio::spawn(async move {
        tokio::time::sleep(tokio::time::Duration::from_secs(10)).await;
        let now = Local::now().naive_local();
        if let Err(e) = do_cleanup_log_sessions(&logs_root, MAX_LOG_SESSIONS, now).await {
            tracing::warn!("Failed to cleanup old log sessions: {}", e);
        }
    });
}

/// Delete the oldest session dirs beyond `max_sessions`, but only those past
/// the retention window. Returns how many were removed.
async fn do_cleanup_log_sessions(
    logs_root: &Path,
    max_sessions: usize,
    now: chrono::NaiveDateTime,
) -> Result<usize, std::io::Error> {
    let regex = regex::Regex::new(SESSION_DIR_PATTERN).map_err(|e| {
        std::io::Error::new(
            std::io::ErrorKind::InvalidInput,
            format!("Invalid session dir pattern: {}", e),
        )
    })?;
    let mut entries = tokio::fs::read_dir(logs_root).await?;
    let mut session_dirs: Vec<String> = Vec::new();

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_dir() {
            continue;
        }

        let name = entry.file_name().to_string_lossy().to_string();
        if regex.is_match(&name) {
            session_dirs.push(name);
        }
    }

    session_dirs.sort();

    if session_dirs.len() <= max_sessions {
        return Ok(0);
    }

    let retention_threshold = now - chrono::Duration::days(LOG_RETENTION_DAYS);
    let excess_count = session_dirs.len() - max_sessions;
    let to_delete: Vec<_> = session_dirs
        .into_iter()
        .take(excess_count)
        .filter(|name| {
            parse_session_timestamp(name)
                .map(|ts| ts < retention_threshold)
                .unwrap_or(false)
        })
        .collect();

    if to_delete.is_empty() {
        return Ok(0);
    }

    tracing::info!(
        "Cleaning up {} old log session(s) older than {} days",
        to_delete.len(),
        LOG_RETENTION_DAYS
    );

    let mut removed = 0;
    for session_name in to_delete {
        let session_path = logs_root.join(&session_name);
        match tokio::fs::remove_dir_all(&session_path).await {
            Ok(_) => {
                removed += 1;
                tracing::debug!("Removed old log session: {}", session_name);
            }
            Err(e) => {
                tracing::warn!("Failed to remove log session {}: {}", session_name, e);
            }
        }
    }

    Ok(removed)
}
