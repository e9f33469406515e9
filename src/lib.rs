//! # loxhaus
//!
//! Backend core of a desktop shell for a remote key-value store, its blob
//! objects and its topic-based event feed.
//!
//! ## Core Concepts
//!
//! - **Subscriptions**: one cancellable listening task per topic, with safe
//!   replacement, bulk teardown and bounded draining
//! - **Retries**: delete-class operations survive server rate limiting with
//!   bounded, hint-aware backoff
//! - **Collaborators**: the remote clients and the UI event bus are traits,
//!   injected at construction
//!
//! ## Example
//!
//! ```ignore
//! use loxhaus::{ChannelSink, Shell, ShellConfig};
//!
//! let config = ShellConfig::load("config.json")?;
//! let (sink, notifications) = ChannelSink::new();
//! let shell = Shell::new(Arc::new(client), blobs, sink, config)?;
//!
//! // Listen on a topic; messages arrive on `notifications`
//! shell.subscribe_to_topic("orders")?;
//!
//! // Deletes are retried while throttled
//! shell.delete_value("orders/42").await?;
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod retry;
pub mod shell;
pub mod subscriptions;
pub mod types;

// Re-exports
pub use client::{
    BlobClient, ChannelSink, EventSource, EventStream, KeyValueClient, NotifySink, RemoteError,
};
pub use config::{ClientConfig, ShellConfig};
pub use error::{Result, ShellError};
pub use retry::{classify_message, Classification, Classify, RetryError, RetryExecutor, RetryPolicy};
pub use shell::Shell;
pub use subscriptions::{DrainReport, RegistryConfig, SubscriptionRegistry};
pub use types::*;
