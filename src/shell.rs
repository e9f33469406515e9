//! Facade the UI binds to.

use crate::client::{BlobClient, EventSource, KeyValueClient, NotifySink, RemoteError};
use crate::config::ShellConfig;
use crate::error::{Result, ShellError};
use crate::retry::{RetryError, RetryExecutor};
use crate::subscriptions::{DrainReport, SubscriptionRegistry};
use crate::types::{KeyListResult, SubscriptionId};
use std::sync::Arc;
use tokio::runtime::Handle;
use tracing::{error, info};

/// Application backend: remote value, cache and blob operations plus topic
/// subscriptions.
///
/// Delete operations are retried while the server reports rate limiting.
/// Every collaborator is passed in at construction.
pub struct Shell<C, B, N> {
    client: Arc<C>,
    blobs: B,
    retry: RetryExecutor,
    registry: SubscriptionRegistry<Arc<C>, N>,
    config: ShellConfig,
}

impl<C, B, N> Shell<C, B, N>
where
    C: KeyValueClient + EventSource,
    B: BlobClient,
    N: NotifySink,
{
    /// Create a shell whose listeners run on the current tokio runtime.
    pub fn new(client: Arc<C>, blobs: B, sink: N, config: ShellConfig) -> Result<Self> {
        let runtime = Handle::try_current().map_err(|_| ShellError::NoRuntime)?;
        Ok(Self::with_runtime(runtime, client, blobs, sink, config))
    }

    pub fn with_runtime(
        runtime: Handle,
        client: Arc<C>,
        blobs: B,
        sink: N,
        config: ShellConfig,
    ) -> Self {
        let registry = SubscriptionRegistry::with_runtime(
            runtime,
            Arc::clone(&client),
            sink,
            config.subscriptions.clone(),
        );

        Self {
            client,
            blobs,
            retry: RetryExecutor::new(config.retry.clone()),
            registry,
            config,
        }
    }

    pub fn config(&self) -> &ShellConfig {
        &self.config
    }

    pub fn requires_api_key(&self) -> bool {
        self.config.client.requires_api_key()
    }

    pub fn registry(&self) -> &SubscriptionRegistry<Arc<C>, N> {
        &self.registry
    }

    // --- Values ---

    pub async fn search_values(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<KeyListResult> {
        self.client
            .iterate_by_prefix(prefix, offset, limit)
            .await
            .map(KeyListResult::from)
            .map_err(|err| {
                error!(prefix, error = %err, "failed to search values");
                err.into()
            })
    }

    /// Value for `key`, or `None` if the key does not exist.
    pub async fn get_value(&self, key: &str) -> Result<Option<String>> {
        match self.client.get(key).await {
            Ok(value) => Ok(Some(value)),
            Err(RemoteError::NotFound) => Ok(None),
            Err(err) => {
                error!(key, error = %err, "failed to get value");
                Err(err.into())
            }
        }
    }

    pub async fn set_value(&self, key: &str, value: &str) -> Result<()> {
        self.client.set(key, value).await.map_err(|err| {
            error!(key, error = %err, "failed to set value");
            err.into()
        })
    }

    pub async fn delete_value(&self, key: &str) -> Result<()> {
        let client = &*self.client;
        self.retry
            .run("delete_value", key, move || client.delete(key))
            .await
            .map_err(|err| retry_failure("delete_value", key, err))
    }

    // --- Cache ---

    pub async fn search_cache(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<KeyListResult> {
        self.client
            .iterate_cache_by_prefix(prefix, offset, limit)
            .await
            .map(KeyListResult::from)
            .map_err(|err| {
                error!(prefix, error = %err, "failed to search cache");
                err.into()
            })
    }

    /// Cached value for `key`, or `None` if the key does not exist.
    pub async fn get_cache(&self, key: &str) -> Result<Option<String>> {
        match self.client.get_cache(key).await {
            Ok(value) => Ok(Some(value)),
            Err(RemoteError::NotFound) => Ok(None),
            Err(err) => {
                error!(key, error = %err, "failed to get cache");
                Err(err.into())
            }
        }
    }

    pub async fn set_cache(&self, key: &str, value: &str) -> Result<()> {
        self.client.set_cache(key, value).await.map_err(|err| {
            error!(key, error = %err, "failed to set cache");
            err.into()
        })
    }

    pub async fn delete_cache(&self, key: &str) -> Result<()> {
        let client = &*self.client;
        self.retry
            .run("delete_cache", key, move || client.delete_cache(key))
            .await
            .map_err(|err| retry_failure("delete_cache", key, err))
    }

    // --- Blobs ---

    pub async fn search_blobs(
        &self,
        prefix: &str,
        offset: usize,
        limit: usize,
    ) -> Result<KeyListResult> {
        self.blobs
            .iterate_by_prefix(prefix, offset, limit)
            .await
            .map(KeyListResult::from)
            .map_err(|err| {
                error!(prefix, error = %err, "failed to search blobs");
                err.into()
            })
    }

    pub async fn delete_blob(&self, key: &str) -> Result<()> {
        let blobs = &self.blobs;
        self.retry
            .run("delete_blob", key, move || blobs.delete(key))
            .await
            .map_err(|err| retry_failure("delete_blob", key, err))
    }

    // --- Events ---

    pub async fn publish_event(&self, topic: &str, data: &str) -> Result<()> {
        info!(topic, data, "publishing event to server");
        self.client.publish_event(topic, data).await.map_err(|err| {
            error!(topic, error = %err, "failed to publish event");
            ShellError::from(err)
        })?;
        info!(topic, "event published successfully");
        Ok(())
    }

    /// Drop every event subscriber on every node of the cluster.
    pub async fn purge_all_subscribers(&self) -> Result<u64> {
        self.client.purge_event_subscriptions().await.map_err(|err| {
            error!(error = %err, "failed to purge all subscribers");
            err.into()
        })
    }

    pub fn subscribe_to_topic(&self, topic: &str) -> Result<SubscriptionId> {
        self.registry.subscribe(topic)
    }

    pub fn unsubscribe_from_topic(&self, topic: &str) -> bool {
        self.registry.unsubscribe(topic)
    }

    pub fn active_subscriptions(&self) -> Vec<String> {
        self.registry.active_topics()
    }

    pub fn unsubscribe_from_all(&self) -> usize {
        self.registry.unsubscribe_all()
    }

    /// Close the registry and wait for the listening tasks to unwind.
    pub async fn shutdown(&self) -> DrainReport {
        self.registry.close().await
    }
}

fn retry_failure(operation: &str, key: &str, err: RetryError<RemoteError>) -> ShellError {
    let err = ShellError::from_retry(operation, err);
    error!(operation, key, error = %err, "operation failed");
    err
}
