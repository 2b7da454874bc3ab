//! Shared icon stores
//!
//! [`MemorySharedIconStore`] keeps one record per `(path_hint, visibility)`.
//! [`CachedSharedIconStore`] fronts any backend with a bounded, expiring
//! moka cache. Only hits are cached, so an icon added to the backend becomes
//! visible on the next lookup.

use async_trait::async_trait;
use dashmap::DashMap;
use extforge_core::{PipelineConfig, SharedIconRecord, SharedIconStore, StoreResult, Visibility};
use moka::future::Cache;
use std::time::Duration;

type IconKey = (String, Visibility);

/// Shared icons held in memory
#[derive(Debug, Default)]
pub struct MemorySharedIconStore {
    icons: DashMap<IconKey, SharedIconRecord>,
}

impl MemorySharedIconStore {
    /// Create an empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace by `(path_hint, visibility)`
    pub fn upsert(&self, record: SharedIconRecord) -> Option<SharedIconRecord> {
        let key = (record.path_hint.clone(), record.visibility.clone());
        self.icons.insert(key, record)
    }

    /// Insert many records, returning how many replaced an existing one
    pub fn upsert_all(&self, records: impl IntoIterator<Item = SharedIconRecord>) -> usize {
        records
            .into_iter()
            .filter_map(|record| self.upsert(record))
            .count()
    }

    /// Number of records
    #[must_use]
    pub fn len(&self) -> usize {
        self.icons.len()
    }

    /// Check if empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.icons.is_empty()
    }
}

#[async_trait]
impl SharedIconStore for MemorySharedIconStore {
    async fn find_icons(
        &self,
        visibility: &Visibility,
        paths: &[String],
    ) -> StoreResult<Vec<SharedIconRecord>> {
        Ok(paths
            .iter()
            .filter_map(|path| {
                self.icons
                    .get(&(path.clone(), visibility.clone()))
                    .map(|entry| entry.value().clone())
            })
            .collect())
    }
}

/// Statistics for cache monitoring
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of entries in cache
    pub entry_count: u64,
}

/// Read-through cache in front of a shared icon store
#[derive(Debug)]
pub struct CachedSharedIconStore<S> {
    inner: S,
    cache: Cache<IconKey, SharedIconRecord>,
}

impl<S: SharedIconStore> CachedSharedIconStore<S> {
    /// Cache up to `capacity` records for `ttl`
    #[must_use]
    pub fn new(inner: S, capacity: u64, ttl: Duration) -> Self {
        Self {
            inner,
            cache: Cache::builder()
                .max_capacity(capacity)
                .time_to_live(ttl)
                .build(),
        }
    }

    /// Sized from pipeline configuration
    #[must_use]
    pub fn from_config(inner: S, config: &PipelineConfig) -> Self {
        Self::new(inner, config.cache_capacity, config.cache_ttl())
    }

    /// Drop every cached record
    pub fn invalidate_all(&self) {
        self.cache.invalidate_all();
    }

    /// Cache statistics
    pub async fn stats(&self) -> CacheStats {
        self.cache.run_pending_tasks().await;
        CacheStats {
            entry_count: self.cache.entry_count(),
        }
    }

    /// Wrapped store
    #[must_use]
    pub fn inner(&self) -> &S {
        &self.inner
    }
}

#[async_trait]
impl<S: SharedIconStore> SharedIconStore for CachedSharedIconStore<S> {
    async fn find_icons(
        &self,
        visibility: &Visibility,
        paths: &[String],
    ) -> StoreResult<Vec<SharedIconRecord>> {
        let mut found = Vec::with_capacity(paths.len());
        let mut misses = Vec::new();
        for path in paths {
            match self.cache.get(&(path.clone(), visibility.clone())).await {
                Some(record) => found.push(record),
                None => misses.push(path.clone()),
            }
        }

        if !misses.is_empty() {
            tracing::trace!(hits = found.len(), misses = misses.len(), "shared icon cache");
            for record in self.inner.find_icons(visibility, &misses).await? {
                self.cache
                    .insert(
                        (record.path_hint.clone(), record.visibility.clone()),
                        record.clone(),
                    )
                    .await;
                found.push(record);
            }
        }
        Ok(found)
    }
}
