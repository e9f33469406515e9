//! Subscription registry configuration and reports.

use crate::config::duration_ms;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for a subscription registry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistryConfig {
    /// How long `drain` waits for listening tasks to unwind before detaching them.
    /// Default: 5s
    #[serde(with = "duration_ms")]
    pub shutdown_timeout: Duration,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            shutdown_timeout: Duration::from_secs(5),
        }
    }
}

/// Outcome of draining a registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DrainReport {
    /// Subscriptions that were registered and got cancelled.
    pub cancelled: usize,
    /// True if every listening task finished within the timeout.
    pub drained: bool,
    /// Tasks still running when the timeout hit. They keep unwinding on their own.
    pub detached: usize,
}
