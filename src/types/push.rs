use serde::Deserialize;
use std::fmt;
use std::sync::Arc;
use time::OffsetDateTime;

/// Scope under which this process is allowed to send notifications.
///
/// Resolved once at startup from the signing certificate and shared
/// read-only by every request afterwards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Topic(Arc<str>);

impl Topic {
    pub fn new(value: impl Into<Arc<str>>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Topic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One device registration, stored as a JSON file under `<mailbox>/.push/`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Subscription {
    #[serde(rename = "aps-account-id")]
    pub account_id: String,
    #[serde(rename = "aps-device-token")]
    pub device_token: String,
    #[serde(default)]
    pub mailboxes: Vec<String>,
}

impl Subscription {
    /// Leading eight characters of the device token, used in replies and logs.
    pub fn token_prefix(&self) -> &str {
        let end = self
            .device_token
            .char_indices()
            .nth(8)
            .map(|(idx, _)| idx)
            .unwrap_or(self.device_token.len());
        &self.device_token[..end]
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notification {
    pub device_token: String,
    pub topic: Topic,
    pub expiration: OffsetDateTime,
    pub payload: String,
}

/// What the push service answered for a single notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DispatchResponse {
    pub status: u16,
    pub reason: String,
    pub timestamp: Option<OffsetDateTime>,
}
