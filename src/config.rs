//! Shell configuration.

use crate::error::Result;
use crate::retry::RetryPolicy;
use crate::subscriptions::RegistryConfig;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Environment variable holding the API key unless configured otherwise.
pub const DEFAULT_API_KEY_ENV: &str = "INSI_API_KEY";

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub client: ClientConfig,
    pub retry: RetryPolicy,
    pub subscriptions: RegistryConfig,
}

impl ShellConfig {
    /// Load from a JSON file. Missing fields take their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let data = std::fs::read_to_string(path)?;
        Self::from_json(&data)
    }

    pub fn from_json(data: &str) -> Result<Self> {
        Ok(serde_json::from_str(data)?)
    }
}

/// How to reach the remote cluster.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Name of the environment variable with the API key.
    pub api_key_env: String,

    pub endpoints: Vec<String>,

    /// Skip TLS certificate verification.
    pub skip_verify: bool,

    /// Per-request timeout.
    /// Default: 30s
    #[serde(with = "duration_ms")]
    pub timeout: Duration,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_key_env: DEFAULT_API_KEY_ENV.to_string(),
            endpoints: vec![
                "red.insulalabs.io:443".to_string(),
                "blue.insulalabs.io:443".to_string(),
                "green.insulalabs.io:443".to_string(),
            ],
            skip_verify: false,
            timeout: Duration::from_secs(30),
            domain: None,
        }
    }
}

impl ClientConfig {
    /// API key from the configured environment variable, if set and non-empty.
    pub fn api_key(&self) -> Option<String> {
        std::env::var(&self.api_key_env)
            .ok()
            .filter(|key| !key.is_empty())
    }

    /// True when the UI has to ask the user for a key.
    pub fn requires_api_key(&self) -> bool {
        self.api_key().is_none()
    }
}

/// Serde adapter storing a `Duration` as whole milliseconds.
pub(crate) mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
