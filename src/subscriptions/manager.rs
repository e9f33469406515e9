//! Registry of per-topic listening tasks.

use crate::client::{EventSource, NotifySink, RemoteError};
use crate::error::{Result, ShellError};
use crate::types::{EventMessage, Notification, SubscriptionId, Timestamp};
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio_stream::StreamExt;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{debug, error, info, trace, warn};

use super::types::{DrainReport, RegistryConfig};

/// One active listening task.
struct Subscription {
    id: SubscriptionId,
    /// Stops the listening task. Owned by the map entry until invoked.
    cancel: CancellationToken,
    started: Timestamp,
}

/// State shared between the registry and its listening tasks.
struct Shared<S, N> {
    /// Active subscriptions by topic. At most one per topic.
    subscriptions: RwLock<HashMap<String, Subscription>>,
    source: S,
    sink: N,
}

impl<S, N> Shared<S, N> {
    /// Remove the entry for `topic` only if it still belongs to `id`.
    fn remove_own(&self, topic: &str, id: SubscriptionId) -> bool {
        let mut subs = self.subscriptions.write();
        match subs.get(topic) {
            Some(sub) if sub.id == id => {
                subs.remove(topic);
                true
            }
            _ => false,
        }
    }
}

/// Tracks, replaces and tears down topic listeners.
///
/// Every subscribed topic has exactly one listening task. The task streams
/// messages from the [`EventSource`] into the [`NotifySink`] until it is
/// cancelled or the stream ends, then removes its own registry entry.
pub struct SubscriptionRegistry<S, N> {
    shared: Arc<Shared<S, N>>,
    /// Counter for generating subscription IDs.
    next_id: AtomicU64,
    /// Parent of every subscription's cancellation token.
    lifetime: CancellationToken,
    tracker: TaskTracker,
    runtime: Handle,
    config: RegistryConfig,
}

impl<S: EventSource, N: NotifySink> SubscriptionRegistry<S, N> {
    /// Create a registry that runs listening tasks on the current tokio runtime.
    pub fn new(source: S, sink: N, config: RegistryConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ShellError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, source, sink, config))
    }

    /// Create a registry that runs listening tasks on `runtime`.
    pub fn with_runtime(runtime: Handle, source: S, sink: N, config: RegistryConfig) -> Self {
        Self {
            shared: Arc::new(Shared {
                subscriptions: RwLock::new(HashMap::new()),
                source,
                sink,
            }),
            next_id: AtomicU64::new(1),
            lifetime: CancellationToken::new(),
            tracker: TaskTracker::new(),
            runtime,
            config,
        }
    }

    /// Start listening on `topic`, replacing any existing listener for it.
    ///
    /// Returns as soon as the listening task is spawned. Failures of the
    /// listener are reported through the sink, never here.
    pub fn subscribe(&self, topic: &str) -> Result<SubscriptionId> {
        if topic.trim().is_empty() {
            return Err(ShellError::InvalidTopic(topic.to_string()));
        }
        if self.lifetime.is_cancelled() {
            return Err(ShellError::RegistryClosed);
        }

        let id = SubscriptionId(self.next_id.fetch_add(1, Ordering::SeqCst));
        let cancel = self.lifetime.child_token();

        {
            let mut subs = self.shared.subscriptions.write();
            if let Some(previous) = subs.remove(topic) {
                previous.cancel.cancel();
                debug!(topic, replaced = %previous.id, by = %id, "replacing subscription");
            }
            subs.insert(
                topic.to_string(),
                Subscription {
                    id,
                    cancel: cancel.clone(),
                    started: Timestamp::now(),
                },
            );
        }

        let shared = Arc::clone(&self.shared);
        self.tracker
            .spawn_on(listen(shared, topic.to_string(), id, cancel), &self.runtime);

        Ok(id)
    }

    /// Cancel and forget the listener for `topic`. Returns whether one existed.
    pub fn unsubscribe(&self, topic: &str) -> bool {
        let mut subs = self.shared.subscriptions.write();
        match subs.remove(topic) {
            Some(sub) => {
                sub.cancel.cancel();
                debug!(topic, id = %sub.id, "unsubscribed");
                true
            }
            None => false,
        }
    }

    /// Topics with a registered listener, sorted.
    pub fn active_topics(&self) -> Vec<String> {
        let mut topics: Vec<String> = self.shared.subscriptions.read().keys().cloned().collect();
        topics.sort();
        topics
    }

    /// Cancel every listener and clear the registry.
    ///
    /// Does not wait for the tasks to finish; see [`drain`](Self::drain).
    pub fn unsubscribe_all(&self) -> usize {
        let mut subs = self.shared.subscriptions.write();
        for sub in subs.values() {
            sub.cancel.cancel();
        }
        let cancelled = subs.len();
        *subs = HashMap::new();

        if cancelled > 0 {
            debug!(cancelled, "unsubscribed from all topics");
        }
        cancelled
    }

    /// Cancel every listener and wait up to the configured timeout for the
    /// listening tasks to finish. Tasks still running afterwards are detached.
    pub async fn drain(&self) -> DrainReport {
        let cancelled = self.unsubscribe_all();

        self.tracker.close();
        let drained = tokio::time::timeout(self.config.shutdown_timeout, self.tracker.wait())
            .await
            .is_ok();
        let detached = if drained { 0 } else { self.tracker.len() };
        if !self.lifetime.is_cancelled() {
            self.tracker.reopen();
        }

        if !drained {
            warn!(
                detached,
                timeout_ms = self.config.shutdown_timeout.as_millis() as u64,
                "listening tasks still unwinding, detaching"
            );
        }

        DrainReport {
            cancelled,
            drained,
            detached,
        }
    }

    /// Stop accepting subscriptions and drain the existing ones.
    pub async fn close(&self) -> DrainReport {
        self.lifetime.cancel();
        self.drain().await
    }

    pub fn is_closed(&self) -> bool {
        self.lifetime.is_cancelled()
    }

    pub fn is_active(&self, topic: &str) -> bool {
        self.shared.subscriptions.read().contains_key(topic)
    }

    /// ID of the listener currently registered for `topic`.
    pub fn current_id(&self, topic: &str) -> Option<SubscriptionId> {
        self.shared.subscriptions.read().get(topic).map(|s| s.id)
    }

    /// When the current listener for `topic` was started.
    pub fn started_at(&self, topic: &str) -> Option<Timestamp> {
        self.shared.subscriptions.read().get(topic).map(|s| s.started)
    }

    pub fn len(&self) -> usize {
        self.shared.subscriptions.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Listening tasks that have not finished yet, including cancelled ones.
    pub fn running_tasks(&self) -> usize {
        self.tracker.len()
    }
}

impl<S, N> Drop for SubscriptionRegistry<S, N> {
    fn drop(&mut self) {
        self.lifetime.cancel();
    }
}

/// Body of a listening task.
async fn listen<S: EventSource, N: NotifySink>(
    shared: Arc<Shared<S, N>>,
    topic: String,
    id: SubscriptionId,
    cancel: CancellationToken,
) {
    info!(topic = %topic, id = %id, "subscribing to topic");

    match pump(&shared, &topic, &cancel).await {
        Ok(()) => {
            info!(topic = %topic, id = %id, cancelled = cancel.is_cancelled(), "listener stopped");
        }
        Err(err) => {
            error!(topic = %topic, id = %id, error = %err, "subscription error");
            shared.sink.emit(Notification::SubscriptionError {
                topic: topic.clone(),
                error: err.to_string(),
            });
        }
    }

    if shared.remove_own(&topic, id) {
        debug!(topic = %topic, id = %id, "removed finished subscription");
    }
}

/// Forward messages until cancellation, close or a stream error.
async fn pump<S: EventSource, N: NotifySink>(
    shared: &Shared<S, N>,
    topic: &str,
    cancel: &CancellationToken,
) -> std::result::Result<(), RemoteError> {
    let mut events = shared.source.listen(topic, cancel.clone());

    loop {
        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Ok(()),
            next = events.next() => match next {
                Some(Ok(data)) => {
                    trace!(topic, "event received from server");
                    shared.sink.emit(Notification::EventReceived {
                        message: EventMessage {
                            topic: topic.to_string(),
                            data,
                            timestamp: Timestamp::now(),
                        },
                    });
                }
                Some(Err(err)) => return Err(err),
                None => return Ok(()),
            },
        }
    }
}
