//! Interfaces of the remote collaborators.
//!
//! The remote store, blob and event clients are given dependencies. This
//! module only describes the surface the registry and the facade call into:
//!
//! - [`EventSource`] opens a stream of messages for a topic
//! - [`NotifySink`] delivers notifications to the presentation layer
//! - [`KeyValueClient`] and [`BlobClient`] carry the plain remote calls

use crate::types::Notification;
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

/// Failure reported by a remote client.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum RemoteError {
    #[error("key not found")]
    NotFound,

    /// Throttled by the server, with its suggested wait when it gave one.
    #[error("rate limited")]
    RateLimited { retry_after: Option<Duration> },

    /// Anything else, carried as the client's error text.
    #[error("{0}")]
    Other(String),
}

impl RemoteError {
    pub fn other(message: impl Into<String>) -> Self {
        RemoteError::Other(message.into())
    }
}

/// Messages received on one topic. Ends with `None` on graceful close and
/// yields `Err` on abnormal termination.
pub type EventStream = Pin<Box<dyn Stream<Item = Result<serde_json::Value, RemoteError>> + Send>>;

/// Opens topic listeners against the remote event feed.
pub trait EventSource: Send + Sync + 'static {
    /// Start listening on `topic`.
    ///
    /// The stream should stop once `cancel` fires; the caller also stops
    /// polling it at that point.
    fn listen(&self, topic: &str, cancel: CancellationToken) -> EventStream;
}

impl<T: EventSource + ?Sized> EventSource for Arc<T> {
    fn listen(&self, topic: &str, cancel: CancellationToken) -> EventStream {
        (**self).listen(topic, cancel)
    }
}

/// Fire-and-forget delivery to the presentation layer.
pub trait NotifySink: Send + Sync + 'static {
    fn emit(&self, notification: Notification);
}

impl<T: NotifySink + ?Sized> NotifySink for Arc<T> {
    fn emit(&self, notification: Notification) {
        (**self).emit(notification)
    }
}

/// Sink that pushes notifications into an unbounded channel.
#[derive(Clone)]
pub struct ChannelSink {
    sender: Sender<Notification>,
}

impl ChannelSink {
    /// Create a sink and the receiver the presentation layer drains.
    pub fn new() -> (Self, Receiver<Notification>) {
        let (sender, receiver) = unbounded();
        (Self { sender }, receiver)
    }
}

impl NotifySink for ChannelSink {
    fn emit(&self, notification: Notification) {
        // Receiver gone means nobody is rendering anymore.
        let _ = self.sender.send(notification);
    }
}

/// Remote key-value calls: the persistent tier, the cache tier and the
/// event administration endpoints.
pub trait KeyValueClient: Send + Sync + 'static {
    fn iterate_by_prefix(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    fn get(&self, key: &str) -> impl Future<Output = Result<String, RemoteError>> + Send;

    fn set(&self, key: &str, value: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn iterate_cache_by_prefix(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    fn get_cache(&self, key: &str) -> impl Future<Output = Result<String, RemoteError>> + Send;

    fn set_cache(
        &self,
        key: &str,
        value: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn delete_cache(&self, key: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;

    fn publish_event(
        &self,
        topic: &str,
        data: &str,
    ) -> impl Future<Output = Result<(), RemoteError>> + Send;

    /// Drop every event subscriber on every node. Returns how many were removed.
    fn purge_event_subscriptions(&self) -> impl Future<Output = Result<u64, RemoteError>> + Send;
}

/// Remote blob calls used by the facade. Transfer itself is not covered.
pub trait BlobClient: Send + Sync + 'static {
    fn iterate_by_prefix(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<String>, RemoteError>> + Send;

    fn delete(&self, key: &str) -> impl Future<Output = Result<(), RemoteError>> + Send;
}
