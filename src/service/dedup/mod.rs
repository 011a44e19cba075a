pub mod memory;
pub mod surreal;

use std::{ops::Deref, sync::Arc, time::Duration};

use async_trait::async_trait;
use memory::MemoryDedupCache;
use surreal::SurrealDedupCache;

use crate::base::{
    clock::{Clock, SystemClock},
    config::Config,
    types::{Res, Void},
};

// Traits.

/// Generic time-bounded key store that dedup backends must implement.
///
/// A key that was `put` reports `exists == true` until its TTL elapses, after
/// which it behaves as if it was never written. Backends never require an
/// explicit delete.
#[async_trait]
pub trait GenericDedupCache: Send + Sync + 'static {
    /// Whether the key was recorded and has not yet expired.
    async fn exists(&self, key: &str) -> Res<bool>;

    /// Record the key for `ttl`.
    async fn put(&self, key: &str, ttl: Duration) -> Void;
}

// Structs.

/// Dedup cache for the application.
///
/// This is trivially cloneable and can be passed around without the need for `Arc` or `Mutex`.
#[derive(Clone)]
pub struct DedupCache {
    inner: Arc<dyn GenericDedupCache>,
}

impl Deref for DedupCache {
    type Target = dyn GenericDedupCache;

    fn deref(&self) -> &Self::Target {
        &*self.inner
    }
}

impl DedupCache {
    pub fn new(inner: Arc<dyn GenericDedupCache>) -> Self {
        Self { inner }
    }

    /// Build the backend named by `dedup_endpoint`.
    ///
    /// `memory` selects the in-process map; anything else is handed to
    /// SurrealDB as a connection endpoint.
    pub async fn from_config(config: &Config) -> Res<Self> {
        let clock: Arc<dyn Clock> = Arc::new(SystemClock);

        if config.dedup_endpoint == "memory" {
            return Ok(Self::memory(clock));
        }

        Self::surreal(config, clock).await
    }

    /// In-process backend.
    pub fn memory(clock: Arc<dyn Clock>) -> Self {
        Self::new(Arc::new(MemoryDedupCache::new(clock)))
    }

    /// SurrealDB backend.
    pub async fn surreal(config: &Config, clock: Arc<dyn Clock>) -> Res<Self> {
        let cache = SurrealDedupCache::connect(config, clock).await?;
        Ok(Self::new(Arc::new(cache)))
    }
}

/// The key that identifies one inbound event delivery.
pub fn dedup_key(channel_id: &str, event_ts: &str) -> String {
    format!("{channel_id}_{event_ts}")
}
