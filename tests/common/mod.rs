//! Test doubles shared by the integration tests.

#![allow(dead_code)]

use loxhaus::{EventSource, EventStream, RemoteError};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::mpsc::{unbounded_channel, UnboundedSender};
use tokio_stream::wrappers::UnboundedReceiverStream;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

pub type Item = Result<Value, RemoteError>;

/// Event source driven by the test.
///
/// Each `listen` opens a fresh channel; the test pushes messages, errors or a
/// close into the most recent stream for a topic.
#[derive(Default)]
pub struct TestSource {
    senders: Mutex<HashMap<String, UnboundedSender<Item>>>,
    listens: AtomicUsize,
    live: Arc<AtomicUsize>,
}

impl TestSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total `listen` calls so far.
    pub fn listens(&self) -> usize {
        self.listens.load(Ordering::SeqCst)
    }

    /// Streams not yet dropped by their listening task.
    pub fn live(&self) -> usize {
        self.live.load(Ordering::SeqCst)
    }

    /// Whether a stream has been opened for `topic`.
    pub fn is_listening(&self, topic: &str) -> bool {
        self.senders.lock().contains_key(topic)
    }

    pub fn send(&self, topic: &str, item: Item) -> bool {
        match self.senders.lock().get(topic) {
            Some(sender) => sender.send(item).is_ok(),
            None => false,
        }
    }

    /// End the most recent stream for `topic` gracefully.
    pub fn close(&self, topic: &str) {
        self.senders.lock().remove(topic);
    }
}

impl EventSource for TestSource {
    fn listen(&self, topic: &str, _cancel: CancellationToken) -> EventStream {
        let (sender, receiver) = unbounded_channel();
        self.senders.lock().insert(topic.to_string(), sender);
        self.listens.fetch_add(1, Ordering::SeqCst);
        self.live.fetch_add(1, Ordering::SeqCst);

        Box::pin(Tracked {
            inner: UnboundedReceiverStream::new(receiver),
            live: Arc::clone(&self.live),
        })
    }
}

/// Stream wrapper that counts itself as live until dropped.
struct Tracked {
    inner: UnboundedReceiverStream<Item>,
    live: Arc<AtomicUsize>,
}

impl Stream for Tracked {
    type Item = Item;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}

impl Drop for Tracked {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

/// Poll `condition` until it holds or two seconds pass.
pub async fn eventually(mut condition: impl FnMut() -> bool) -> bool {
    for _ in 0..400 {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    condition()
}

pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_test_writer()
        .with_max_level(tracing::Level::DEBUG)
        .try_init();
}
