// src/notify/telegram.rs - Telegram Bot API messaging channel

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

use super::MessagingChannel;
use crate::error::{LoadwatchError, Result};

#[derive(Debug, Serialize)]
struct SendMessageRequest<'a> {
    chat_id: &'a str,
    text: &'a str,
    parse_mode: &'a str,
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    ok: bool,
    #[serde(default)]
    description: Option<String>,
}

/// Posts messages through `{api_base}/bot{token}/sendMessage`
#[derive(Debug, Clone)]
pub struct TelegramChannel {
    client: reqwest::Client,
    endpoint: Url,
    masked_token: String,
    timeout: Duration,
}

impl TelegramChannel {
    /// Build a channel. An empty token is a configuration error.
    pub fn new(api_base: &str, token: &str, timeout: Duration) -> Result<Self> {
        let token = normalize_token(token)?;

        let mut base = api_base.trim().to_string();
        if !base.ends_with('/') {
            base.push('/');
        }
        let endpoint = Url::parse(&base)
            .and_then(|base| base.join(&format!("./bot{}/sendMessage", token)))
            .map_err(|e| {
                LoadwatchError::Configuration(format!("Invalid API base URL '{}': {}", api_base, e))
            })?;

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| {
                LoadwatchError::Configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint,
            masked_token: mask_token(&token),
            timeout,
        })
    }
}

#[async_trait]
impl MessagingChannel for TelegramChannel {
    async fn post(&self, destination: &str, text: &str) -> Result<()> {
        debug!(
            "Sending request to bot{}/sendMessage for chat {}",
            self.masked_token, destination
        );

        let request = SendMessageRequest {
            chat_id: destination,
            text,
            parse_mode: "Markdown",
        };

        let response = self
            .client
            .post(self.endpoint.clone())
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LoadwatchError::Timeout {
                        timeout_seconds: self.timeout.as_secs(),
                    }
                } else {
                    // Strip the URL, it carries the token
                    LoadwatchError::Network(e.without_url().to_string())
                }
            })?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if !status.is_success() {
            return Err(LoadwatchError::Notification(format!(
                "Messaging API returned {}: {}",
                status, body
            )));
        }

        match serde_json::from_str::<ApiResponse>(&body) {
            Ok(api) if !api.ok => Err(LoadwatchError::Notification(format!(
                "Messaging API rejected message: {}",
                api.description.unwrap_or_else(|| "no description".to_string())
            ))),
            _ => Ok(()),
        }
    }

    fn name(&self) -> &'static str {
        "telegram"
    }
}

/// Trim the token and repair the duplicated `id:secret:id:secret` form
/// produced by some setup scripts
pub fn normalize_token(token: &str) -> Result<String> {
    let token = token.trim();
    if token.is_empty() {
        return Err(LoadwatchError::Configuration(
            "Missing messaging bot token".to_string(),
        ));
    }

    let parts: Vec<&str> = token.split(':').collect();
    if parts.len() > 2 {
        warn!("Token appears to be duplicated, keeping the first id:secret pair");
        return Ok(format!("{}:{}", parts[0], parts[1]));
    }
    if parts.len() < 2 {
        warn!("Token doesn't contain the expected id:secret format");
    }

    Ok(token.to_string())
}

/// Keep the first and last five characters of long tokens for log lines
pub fn mask_token(token: &str) -> String {
    let chars: Vec<char> = token.chars().collect();
    if chars.len() > 10 {
        let head: String = chars[..5].iter().collect();
        let tail: String = chars[chars.len() - 5..].iter().collect();
        format!("{}...{}", head, tail)
    } else {
        "***masked***".to_string()
    }
}
