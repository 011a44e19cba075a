//! SurrealDB dedup backend.
//!
//! Each key becomes a `dedup` record holding its expiry as unix seconds.
//! Works against the embedded `mem://` engine or a shared remote instance, so
//! several relay processes can suppress each other's redeliveries.

use std::{sync::Arc, time::Duration};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use surrealdb::{
    Surreal,
    engine::any::{self, Any},
    opt::auth::Root,
};
use tracing::{info, instrument};

use crate::base::{
    clock::Clock,
    config::Config,
    types::{Res, Void},
};

use super::GenericDedupCache;

const TABLE: &str = "dedup";

/// A dedup record in the database.
#[derive(Debug, Serialize, Deserialize)]
struct DedupRecord {
    expires_at: i64,
}

pub struct SurrealDedupCache {
    db: Surreal<Any>,
    clock: Arc<dyn Clock>,
}

impl SurrealDedupCache {
    /// Connect to `dedup_endpoint`, signing in when credentials are configured.
    #[instrument(name = "SurrealDedupCache::connect", skip_all)]
    pub async fn connect(config: &Config, clock: Arc<dyn Clock>) -> Res<Self> {
        let db = any::connect(config.dedup_endpoint.as_str()).await?;

        if let (Some(username), Some(password)) = (&config.dedup_username, &config.dedup_password) {
            db.signin(Root { username, password }).await?;
        }

        db.use_ns("relay").use_db("bot").await?;

        info!("Dedup store connected at `{}`.", config.dedup_endpoint);

        Ok(Self { db, clock })
    }
}

#[async_trait]
impl GenericDedupCache for SurrealDedupCache {
    #[instrument(name = "SurrealDedupCache::exists", skip(self))]
    async fn exists(&self, key: &str) -> Res<bool> {
        let record: Option<DedupRecord> = self.db.select((TABLE, key.to_string())).await?;
        let now = self.clock.now().timestamp();

        Ok(record.is_some_and(|record| record.expires_at > now))
    }

    #[instrument(name = "SurrealDedupCache::put", skip(self))]
    async fn put(&self, key: &str, ttl: Duration) -> Void {
        let now = self.clock.now().timestamp();
        let expires_at = now.saturating_add(i64::try_from(ttl.as_secs())?);

        self.db.query("DELETE dedup WHERE expires_at <= $now").bind(("now", now)).await?.check()?;

        let _: Option<DedupRecord> = self.db.upsert((TABLE, key.to_string())).content(DedupRecord { expires_at }).await?;

        Ok(())
    }
}
