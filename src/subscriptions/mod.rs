//! Topic subscriptions against the remote event feed.
//!
//! The registry owns one listening task per subscribed topic:
//! - Subscribing to a topic that already has a listener replaces it
//! - A task removes its own entry when its stream ends, never a replacement
//! - Cancellation is advisory; `drain` waits for tasks with a bounded timeout
//!
//! Messages and listener failures reach the presentation layer through a
//! [`NotifySink`](crate::client::NotifySink).
//!
//! # Example
//!
//! ```ignore
//! let (sink, notifications) = ChannelSink::new();
//! let registry = SubscriptionRegistry::new(client, sink, RegistryConfig::default())?;
//!
//! registry.subscribe("orders")?;
//! assert_eq!(registry.active_topics(), vec!["orders"]);
//!
//! for notification in notifications.iter() {
//!     match notification {
//!         Notification::EventReceived { message } => println!("{:?}", message.data),
//!         Notification::SubscriptionError { topic, error } => eprintln!("{topic}: {error}"),
//!     }
//! }
//! ```

mod manager;
mod types;

pub use manager::SubscriptionRegistry;
pub use types::{DrainReport, RegistryConfig};
