// src/notify/format.rs - Alert message formatting

use chrono::{DateTime, FixedOffset};

use crate::alerting::AlertLevel;

/// Timestamp layout used in alert messages
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S %:z";

/// Probe sent by connection tests
pub const CONNECTION_TEST_MESSAGE: &str =
    "🔄 *Connection Test*\n\nThis is a test message from the Electric Load Forecasting system.";

/// Render an alert as a Markdown message.
///
/// Pure function of its inputs so the exact payload can be checked without
/// a network call.
pub fn format_alert(
    level: AlertLevel,
    model_name: Option<&str>,
    error_value: Option<f64>,
    body: &str,
    timestamp: DateTime<FixedOffset>,
) -> String {
    let emoji = level.emoji();
    let mut text = format!("{} *Load Forecasting Alert* {}\n\n", emoji, emoji);

    if let Some(model) = model_name {
        text.push_str(&format!("*Model:* `{}`\n", model));
    }

    if let Some(error) = error_value {
        text.push_str(&format!("*Forecast Error:* `{:.2}%`\n\n", error));
    }

    text.push_str(body);
    text.push_str("\n\n");
    text.push_str(&format!("*Time:* `{}`", timestamp.format(TIMESTAMP_FORMAT)));
    text
}
