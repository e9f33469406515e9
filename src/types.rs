//! Core types shared by the registry, the facade and the presentation layer.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::{SystemTime, UNIX_EPOCH};

/// Event name for a message received on a subscribed topic.
pub const EVENT_RECEIVED: &str = "event-received";

/// Event name for a listening task that ended with an error.
pub const SUBSCRIPTION_ERROR: &str = "subscription-error";

/// Microseconds since Unix epoch.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Timestamp(pub i64);

impl Timestamp {
    /// Current time.
    pub fn now() -> Self {
        let micros = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_micros() as i64)
            .unwrap_or(0);
        Timestamp(micros)
    }
}

impl fmt::Debug for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Timestamp({})", self.0)
    }
}

/// Identifies one listening task. Never reused within a registry.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

impl fmt::Debug for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SubscriptionId({})", self.0)
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A message received on a topic, tagged with its capture time.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EventMessage {
    pub topic: String,
    pub data: serde_json::Value,
    pub timestamp: Timestamp,
}

/// Something delivered to the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    EventReceived { message: EventMessage },
    SubscriptionError { topic: String, error: String },
}

impl Notification {
    /// Name the presentation layer listens on.
    pub fn event_name(&self) -> &'static str {
        match self {
            Notification::EventReceived { .. } => EVENT_RECEIVED,
            Notification::SubscriptionError { .. } => SUBSCRIPTION_ERROR,
        }
    }

    /// Topic this notification concerns.
    pub fn topic(&self) -> &str {
        match self {
            Notification::EventReceived { message } => &message.topic,
            Notification::SubscriptionError { topic, .. } => topic,
        }
    }
}

/// One page of keys from a prefix search.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyListResult {
    pub keys: Vec<String>,
    pub total: usize,
}

impl From<Vec<String>> for KeyListResult {
    fn from(keys: Vec<String>) -> Self {
        let total = keys.len();
        Self { keys, total }
    }
}
