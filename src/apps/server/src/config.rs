//! Server configuration
//!
//! TOML file, then `LIGHTCHAT_API_KEYS`, then command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

pub const API_KEYS_ENV: &str = "LIGHTCHAT_API_KEYS";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    /// OpenAI-compatible base URL.
    pub upstream_url: String,
    pub model: String,
    /// Shared keys handed out to clients without their own.
    pub api_keys: Vec<String>,
    /// Longest silence tolerated between upstream SSE frames.
    pub idle_timeout_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:3000".to_string(),
            upstream_url: "https://api.openai.com".to_string(),
            model: "gpt-3.5-turbo".to_string(),
            api_keys: Vec::new(),
            idle_timeout_secs: 600,
        }
    }
}

impl ServerConfig {
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        toml::from_str(raw).context("Invalid server config")
    }

    /// Read `path` when given; otherwise start from the defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config {}", path.display()))?;
                Self::from_toml_str(&raw)
            }
            None => Ok(Self::default()),
        }
    }

    /// Append comma-separated keys, skipping blanks and duplicates.
    pub fn merge_api_keys(&mut self, raw: &str) {
        for key in raw.split(',').map(str::trim).filter(|key| !key.is_empty()) {
            if !self.api_keys.iter().any(|existing| existing == key) {
                self.api_keys.push(key.to_string());
            }
        }
    }

    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_partial_config() {
        let config = ServerConfig::from_toml_str(
            r#"
            model = "gpt-4o-mini"
            api_keys = ["sk-a", "sk-b"]
            "#,
        )
        .expect("parse");
        assert_eq!(config.model, "gpt-4o-mini");
        assert_eq!(config.api_keys, vec!["sk-a", "sk-b"]);
        assert_eq!(config.bind, "127.0.0.1:3000");
    }

    #[test]
    fn merges_env_keys_without_duplicates() {
        let mut config = ServerConfig {
            api_keys: vec!["sk-a".to_string()],
            ..ServerConfig::default()
        };
        config.merge_api_keys(" sk-a, sk-b ,, sk-c");
        assert_eq!(config.api_keys, vec!["sk-a", "sk-b", "sk-c"]);
    }

    #[test]
    fn rejects_wrong_types() {
        assert!(ServerConfig::from_toml_str("api_keys = \"sk-a\"").is_err());
    }
}
