//! TTL-based schema cache.
//!
//! Explicitly owned and explicitly passed; never a process-wide singleton,
//! so tests can run multiple schema versions side by side. Concurrent reads
//! go through an `RwLock`; refreshes serialize behind a `Mutex` so at most
//! one fetch is in flight per cache.

use std::sync::Arc;
use std::time::{Duration, Instant};

use tokio::sync::{Mutex, RwLock};

use crate::config::SchemaCacheConfig;
use crate::error::Result;
use crate::metrics::get_metrics;

use super::{SchemaDescriptor, SchemaProvider};

struct CachedSchema {
    schema: Arc<SchemaDescriptor>,
    fetched_at: Instant,
}

/// Caches the fetched schema with a time-to-live refresh policy.
pub struct SchemaCache {
    provider: Arc<dyn SchemaProvider>,
    ttl: Duration,
    enabled: bool,
    slot: RwLock<Option<CachedSchema>>,
    /// Serializes refreshes: at most one in-flight fetch.
    refresh: Mutex<()>,
}

impl SchemaCache {
    /// Create a new schema cache from configuration.
    pub fn new(provider: Arc<dyn SchemaProvider>, config: &SchemaCacheConfig) -> Self {
        Self {
            provider,
            ttl: Duration::from_secs(config.ttl_secs),
            enabled: config.enabled,
            slot: RwLock::new(None),
            refresh: Mutex::new(()),
        }
    }

    /// Create a cache that always fetches (for tests and one-shot commands).
    pub fn disabled(provider: Arc<dyn SchemaProvider>) -> Self {
        Self::new(
            provider,
            &SchemaCacheConfig {
                enabled: false,
                ttl_secs: 0,
            },
        )
    }

    /// Get the schema, refreshing if stale or missing.
    pub async fn get(&self) -> Result<Arc<SchemaDescriptor>> {
        if !self.enabled {
            let schema = self.provider.fetch_schema().await?;
            return Ok(Arc::new(schema));
        }

        let metrics = get_metrics();

        if let Some(cached) = self.fresh().await {
            metrics.schema_cache_hits_total.inc();
            return Ok(cached);
        }
        metrics.schema_cache_misses_total.inc();

        let _guard = self.refresh.lock().await;

        // Another refresher may have filled the slot while we waited.
        if let Some(cached) = self.fresh().await {
            return Ok(cached);
        }

        tracing::debug!("Refreshing schema from provider");
        let schema = Arc::new(self.provider.fetch_schema().await?);
        *self.slot.write().await = Some(CachedSchema {
            schema: schema.clone(),
            fetched_at: Instant::now(),
        });

        Ok(schema)
    }

    /// Drop the cached schema so the next `get` refetches.
    pub async fn invalidate(&self) {
        *self.slot.write().await = None;
    }

    async fn fresh(&self) -> Option<Arc<SchemaDescriptor>> {
        let slot = self.slot.read().await;
        slot.as_ref()
            .filter(|c| c.fetched_at.elapsed() < self.ttl)
            .map(|c| c.schema.clone())
    }
}
