// src/notify/mod.rs - Alert delivery with an in-memory retry queue

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use std::collections::VecDeque;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::alerting::AlertLevel;
use crate::config::NotifierConfig;
use crate::error::{LoadwatchError, Result};

pub mod format;
pub mod telegram;

pub use format::{format_alert, CONNECTION_TEST_MESSAGE};
pub use telegram::TelegramChannel;

/// External channel able to deliver a text message to a destination
#[async_trait]
pub trait MessagingChannel: Send + Sync {
    async fn post(&self, destination: &str, text: &str) -> Result<()>;

    fn name(&self) -> &'static str;
}

/// Formatted alert waiting for redelivery
#[derive(Debug, Clone)]
pub struct QueuedAlert {
    pub id: Uuid,
    pub text: String,
    pub level: AlertLevel,
    pub model_name: Option<String>,
    pub attempts: u32,
    pub queued_at: DateTime<Utc>,
}

/// Result of one pass over the retry queue
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueueReport {
    pub attempted: usize,
    pub delivered: usize,
    pub requeued: usize,
}

/// Sends alerts through a messaging channel.
///
/// Sends never return errors: a failed delivery is logged, the formatted
/// message goes to the back of the retry queue and `false` is returned.
/// The queue lives in memory only and is lost when the process exits.
pub struct Notifier {
    channel: Arc<dyn MessagingChannel>,
    destination: String,
    utc_offset: FixedOffset,
    queue: Mutex<VecDeque<QueuedAlert>>,
}

impl Notifier {
    /// Create a notifier. An empty destination is a configuration error.
    pub fn new(
        channel: Arc<dyn MessagingChannel>,
        destination: impl Into<String>,
        utc_offset: FixedOffset,
    ) -> Result<Self> {
        let destination = destination.into().trim().to_string();
        if destination.is_empty() {
            return Err(LoadwatchError::Configuration(
                "Missing messaging destination (chat id)".to_string(),
            ));
        }

        Ok(Self {
            channel,
            destination,
            utc_offset,
            queue: Mutex::new(VecDeque::new()),
        })
    }

    /// Build a Telegram-backed notifier. Missing credentials fail here so no
    /// malformed request is ever sent.
    pub fn from_config(config: &NotifierConfig) -> Result<Self> {
        let token = config.bot_token.as_deref().unwrap_or_default();
        let chat_id = config.chat_id.as_deref().unwrap_or_default();
        if token.trim().is_empty() || chat_id.trim().is_empty() {
            error!("Missing messaging token or chat id. Set TELEGRAM_BOT_TOKEN and TELEGRAM_CHAT_ID");
            return Err(LoadwatchError::Configuration(
                "Missing messaging token or chat id".to_string(),
            ));
        }

        let utc_offset = FixedOffset::east_opt(config.utc_offset_minutes * 60).ok_or_else(|| {
            LoadwatchError::Configuration(format!(
                "Invalid UTC offset: {} minutes",
                config.utc_offset_minutes
            ))
        })?;

        let channel = TelegramChannel::new(
            &config.api_base,
            token,
            std::time::Duration::from_secs(config.timeout_seconds),
        )?;

        Self::new(Arc::new(channel), chat_id, utc_offset)
    }

    fn now(&self) -> DateTime<FixedOffset> {
        Utc::now().with_timezone(&self.utc_offset)
    }

    /// Format and send an alert. `false` means the message was queued for
    /// retry, not that it was lost.
    pub async fn send_alert(
        &self,
        message: &str,
        level: AlertLevel,
        model_name: Option<&str>,
        error_value: Option<f64>,
    ) -> bool {
        let text = format_alert(level, model_name, error_value, message, self.now());

        match self.channel.post(&self.destination, &text).await {
            Ok(()) => {
                info!(
                    level = %level,
                    model = model_name.unwrap_or("-"),
                    "Sent alert via {}",
                    self.channel.name()
                );
                true
            }
            Err(e) => {
                warn!(
                    level = %level,
                    model = model_name.unwrap_or("-"),
                    error_value = error_value.unwrap_or(f64::NAN),
                    error = %e,
                    "Failed to send alert, queued for retry"
                );
                self.queue.lock().await.push_back(QueuedAlert {
                    id: Uuid::new_v4(),
                    text,
                    level,
                    model_name: model_name.map(str::to_string),
                    attempts: 1,
                    queued_at: Utc::now(),
                });
                false
            }
        }
    }

    /// Try every queued alert once. Failures go back to the tail.
    pub async fn process_queue(&self) -> QueueReport {
        let pending: Vec<QueuedAlert> = self.queue.lock().await.drain(..).collect();
        let mut report = QueueReport {
            attempted: pending.len(),
            ..QueueReport::default()
        };

        for mut alert in pending {
            alert.attempts += 1;
            match self.channel.post(&self.destination, &alert.text).await {
                Ok(()) => {
                    info!(
                        alert_id = %alert.id,
                        attempts = alert.attempts,
                        "Redelivered queued alert"
                    );
                    report.delivered += 1;
                }
                Err(e) => {
                    warn!(
                        alert_id = %alert.id,
                        attempts = alert.attempts,
                        error = %e,
                        "Redelivery failed, keeping alert queued"
                    );
                    report.requeued += 1;
                    self.queue.lock().await.push_back(alert);
                }
            }
        }

        if report.attempted > 0 {
            info!(
                "Processed retry queue: {} attempted, {} delivered, {} requeued",
                report.attempted, report.delivered, report.requeued
            );
        }
        report
    }

    /// Send a probe message. Never queues on failure.
    pub async fn test_connection(&self) -> bool {
        match self.channel.post(&self.destination, CONNECTION_TEST_MESSAGE).await {
            Ok(()) => {
                info!("Messaging connection test successful");
                true
            }
            Err(e) => {
                error!("Messaging connection test failed: {}", e);
                false
            }
        }
    }

    pub async fn queue_len(&self) -> usize {
        self.queue.lock().await.len()
    }

    /// Copy of the queued alerts, oldest first
    pub async fn pending(&self) -> Vec<QueuedAlert> {
        self.queue.lock().await.iter().cloned().collect()
    }
}
