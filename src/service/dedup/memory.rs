//! In-process dedup backend.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
    time::Duration,
};

use anyhow::anyhow;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tracing::{debug, instrument};

use crate::base::{
    clock::Clock,
    types::{Res, Void},
};

use super::GenericDedupCache;

/// A map from key to expiry instant.
///
/// Expired entries are swept on the next `put`.
pub struct MemoryDedupCache {
    entries: Mutex<HashMap<String, DateTime<Utc>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryDedupCache {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
            clock,
        }
    }

    fn lock(&self) -> Res<std::sync::MutexGuard<'_, HashMap<String, DateTime<Utc>>>> {
        self.entries.lock().map_err(|_| anyhow!("Dedup cache lock poisoned."))
    }
}

#[async_trait]
impl GenericDedupCache for MemoryDedupCache {
    #[instrument(name = "MemoryDedupCache::exists", skip(self))]
    async fn exists(&self, key: &str) -> Res<bool> {
        let now = self.clock.now();
        let entries = self.lock()?;

        Ok(entries.get(key).is_some_and(|expires_at| *expires_at > now))
    }

    #[instrument(name = "MemoryDedupCache::put", skip(self))]
    async fn put(&self, key: &str, ttl: Duration) -> Void {
        let now = self.clock.now();
        let expires_at = now + chrono::Duration::from_std(ttl)?;
        let mut entries = self.lock()?;

        entries.retain(|_, expiry| *expiry > now);
        entries.insert(key.to_string(), expires_at);

        debug!("Dedup cache holds {} live keys.", entries.len());

        Ok(())
    }
}
