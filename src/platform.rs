use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::Value;

#[cfg(test)]
pub mod mock;

/// Remote lifecycle of a scheduled event, using Discord's status codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoteEventStatus {
    Scheduled,
    Active,
    Completed,
    Canceled,
    Unknown(u8),
}

impl RemoteEventStatus {
    pub fn from_code(code: u8) -> Self {
        match code {
            1 => RemoteEventStatus::Scheduled,
            2 => RemoteEventStatus::Active,
            3 => RemoteEventStatus::Completed,
            4 => RemoteEventStatus::Canceled,
            other => RemoteEventStatus::Unknown(other),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteEvent {
    pub id: String,
    pub name: String,
    pub status: RemoteEventStatus,
}

/// One response from the subscriber listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum SubscriberPage {
    Users(Vec<String>),
    RateLimited(Duration),
    Malformed(String),
}

impl SubscriberPage {
    pub fn from_json(body: Value) -> Self {
        match body {
            Value::Array(entries) => SubscriberPage::Users(
                entries
                    .iter()
                    .filter_map(|entry| entry.get("user")?.get("username")?.as_str())
                    .map(str::to_string)
                    .collect(),
            ),
            Value::Object(ref map) => {
                let retry = map
                    .get("retry_after")
                    .and_then(Value::as_f64)
                    .and_then(|secs| Duration::try_from_secs_f64(secs).ok());
                match retry {
                    Some(wait) => SubscriberPage::RateLimited(wait),
                    None => SubscriberPage::Malformed(body.to_string()),
                }
            }
            other => SubscriberPage::Malformed(other.to_string()),
        }
    }
}

/// The chat operations the roster loop depends on.
#[async_trait]
pub trait EventPlatform: Send + Sync {
    async fn list_events(&self) -> Result<Vec<RemoteEvent>>;
    async fn list_subscribers(&self, event_id: &str) -> Result<SubscriberPage>;
    async fn send_message(&self, channel_id: &str, content: &str) -> Result<String>;
    async fn edit_message(&self, channel_id: &str, message_id: &str, content: &str)
    -> Result<()>;
}
