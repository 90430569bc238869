//! Client configuration
//!
//! Loaded from TOML; every field has a default so an empty or missing file
//! yields a working client pointed at a local proxy.

use crate::chat::context::DEFAULT_CONTEXT_MESSAGES;
use crate::util::errors::{LightChatError, LightChatResult};
use log::debug;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 600;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the LightChat proxy.
    pub server_url: String,
    /// Prior messages sent with each request.
    pub context_messages: usize,
    pub request_timeout_secs: u64,
    /// Export destination; the download dir when unset.
    pub export_dir: Option<PathBuf>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_SERVER_URL.to_string(),
            context_messages: DEFAULT_CONTEXT_MESSAGES,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            export_dir: None,
        }
    }
}

impl ClientConfig {
    pub fn from_toml_str(raw: &str) -> LightChatResult<Self> {
        toml::from_str(raw).map_err(|e| LightChatError::config(e.to_string()))
    }

    /// Read `path`; a missing file gives the defaults.
    pub fn load(path: &Path) -> LightChatResult<Self> {
        match std::fs::read_to_string(path) {
            Ok(raw) => {
                debug!("Loading client config: path={}", path.display());
                Self::from_toml_str(&raw)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e.into()),
        }
    }

    /// `<config dir>/lightchat/client.toml`
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("lightchat").join("client.toml"))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(ClientConfig::from_toml_str("").expect("parse"), ClientConfig::default());
    }

    #[test]
    fn partial_file_overrides_only_given_fields() {
        let config = ClientConfig::from_toml_str(
            r#"
            server_url = "http://chat.local:8080"
            context_messages = 5
            "#,
        )
        .expect("parse");
        assert_eq!(config.server_url, "http://chat.local:8080");
        assert_eq!(config.context_messages, 5);
        assert_eq!(config.request_timeout_secs, DEFAULT_REQUEST_TIMEOUT_SECS);
    }

    #[test]
    fn bad_toml_is_a_config_error() {
        let err = ClientConfig::from_toml_str("server_url = [").expect_err("invalid");
        assert!(matches!(err, LightChatError::Config(_)));
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("missing.toml");
        assert_eq!(ClientConfig::load(&path).expect("load"), ClientConfig::default());
    }
}
