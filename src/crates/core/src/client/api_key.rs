use crate::util::errors::{LightChatError, LightChatResult};
use log::{info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};

/// Body of `GET /api/get_available_api_key`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailableApiKey {
    pub api_key: String,
}

pub const AVAILABLE_API_KEY_PATH: &str = "/api/get_available_api_key";

/// Fetch the shared fallback key handed out by the server.
pub async fn fetch_available_api_key(client: &Client, base_url: &str) -> LightChatResult<String> {
    let url = format!("{}{}", base_url.trim_end_matches('/'), AVAILABLE_API_KEY_PATH);
    let response = client.get(&url).send().await?;
    let status = response.status();
    if !status.is_success() {
        warn!("Fallback API key request failed: status={}", status);
        return Err(LightChatError::service(format!(
            "Failed to get API key: {}",
            status.canonical_reason().unwrap_or("Service Error")
        )));
    }

    let body: AvailableApiKey = response.json().await?;
    info!(
        "Fetched fallback API key: present={}",
        !body.api_key.is_empty()
    );
    Ok(body.api_key)
}

/// The key a request should carry: the user's own key first, then the
/// server-assigned one. `None` lets the proxy pick from its pool.
pub fn resolve_api_key(user_key: &str, server_key: &str) -> Option<String> {
    [user_key, server_key]
        .into_iter()
        .map(str::trim)
        .find(|key| !key.is_empty())
        .map(str::to_string)
}
