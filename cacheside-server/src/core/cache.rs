use super::types::{CacheConfig, CacheEntry, CacheStats};
use parking_lot::RwLock;
use radix_trie::{Trie, TrieCommon};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors from the cache collaborator. These never reach a caller of the
/// service: the accessor downgrades every one of them to a miss.
#[derive(Debug, Error)]
pub enum CacheError {
    #[error("cache unavailable: {0}")]
    Unavailable(String),

    #[error("cache capacity exceeded")]
    CapacityExceeded,
}

/// Result type alias for cache operations
pub type CacheResult<T> = std::result::Result<T, CacheError>;

/// Minimal contract for the volatile cache collaborator.
///
/// Every method reports failure through `CacheResult` rather than
/// panicking, so an unreachable cache degrades to a forced miss.
pub trait CacheBackend: Send + Sync + 'static {
    /// Look up a key. Expired entries read as absent.
    fn get(&self, key: &str) -> impl Future<Output = CacheResult<Option<Vec<u8>>>> + Send;

    /// Store a value under a key with the given TTL.
    fn set(
        &self,
        key: &str,
        value: Vec<u8>,
        ttl_secs: u64,
    ) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Delete a single key. Returns whether a live entry was removed.
    fn delete(&self, key: &str) -> impl Future<Output = CacheResult<bool>> + Send;

    /// Delete every key matching a glob-style pattern (`*` wildcard).
    /// Returns the number of entries removed.
    fn delete_matching(&self, pattern: &str) -> impl Future<Output = CacheResult<usize>> + Send;
}

/// In-memory TTL cache over a radix trie.
///
/// The trie keeps the keyspace ordered by prefix, so the dominant
/// invalidation shape (`notes:*`) is a subtree walk instead of a scan
/// over every key. Expiry is lazy on read plus a background sweep.
#[derive(Clone)]
pub struct MemoryCache {
    data: Arc<RwLock<Trie<String, CacheEntry>>>,
    stats: Arc<RwLock<CacheStats>>,
    config: CacheConfig,
}

impl MemoryCache {
    /// Create a new cache with the given configuration
    pub fn new(config: CacheConfig) -> Self {
        info!(
            "Initializing cache with default_ttl={}s, max_entries={}",
            config.default_ttl_secs, config.max_entries
        );

        Self {
            data: Arc::new(RwLock::new(Trie::new())),
            stats: Arc::new(RwLock::new(CacheStats::default())),
            config,
        }
    }

    /// Start background sweep of expired entries
    pub fn start_ttl_cleanup(&self) -> tokio::task::JoinHandle<()> {
        let interval_ms = self.config.cleanup_interval_ms;
        info!("Starting TTL cleanup task (interval={}ms)", interval_ms);

        let cache = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_millis(interval_ms));

            loop {
                interval.tick().await;
                cache.cleanup_expired();
            }
        })
    }

    /// Get statistics
    pub fn stats(&self) -> CacheStats {
        self.stats.read().clone()
    }

    /// Current number of keys, expired entries included until swept
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Remaining TTL for a key, None if absent or expired
    pub fn ttl(&self, key: &str) -> Option<u64> {
        let data = self.data.read();
        data.get(key)
            .filter(|entry| !entry.is_expired())
            .map(|entry| entry.remaining_ttl_secs())
    }

    fn cleanup_expired(&self) {
        let mut data = self.data.write();

        let expired_keys: Vec<String> = data
            .iter()
            .filter(|(_, v)| v.is_expired())
            .map(|(k, _)| k.clone())
            .collect();

        let count = expired_keys.len();
        if count > 0 {
            debug!("Cleaning up {} expired entries", count);
            for key in expired_keys {
                data.remove(&key);
            }
            let mut stats = self.stats.write();
            stats.total_keys = stats.total_keys.saturating_sub(count);
        }
    }

    /// Collect live keys matching a pattern, prefix-scanning when the
    /// pattern has a single trailing wildcard.
    fn matching_keys(data: &Trie<String, CacheEntry>, pattern: &str) -> Vec<String> {
        if pattern == "*" {
            return data.keys().cloned().collect();
        }

        if let Some(prefix) = pattern.strip_suffix('*') {
            if !prefix.contains('*') {
                return data
                    .get_raw_descendant(prefix)
                    .map(|subtrie| subtrie.keys().cloned().collect())
                    .unwrap_or_default();
            }
        }

        data.keys()
            .filter(|k| key_matches(pattern, k))
            .cloned()
            .collect()
    }
}

impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> CacheResult<Option<Vec<u8>>> {
        debug!("cache GET key={}", key);

        let mut data = self.data.write();
        let mut stats = self.stats.write();
        stats.gets += 1;

        if let Some(entry) = data.get_mut(key) {
            if entry.is_expired() {
                debug!("cache entry expired: {}", key);
                data.remove(key);
                stats.misses += 1;
                stats.total_keys = stats.total_keys.saturating_sub(1);
                return Ok(None);
            }

            entry.update_access();
            stats.hits += 1;
            Ok(Some(entry.data.clone()))
        } else {
            stats.misses += 1;
            Ok(None)
        }
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl_secs: u64) -> CacheResult<bool> {
        debug!("cache SET key={}, size={}, ttl={}s", key, value.len(), ttl_secs);

        let mut data = self.data.write();

        let is_new = data.get(key).is_none();
        if is_new && data.len() >= self.config.max_entries {
            warn!(
                "Cache entry limit reached: {}/{}",
                data.len(),
                self.config.max_entries
            );
            return Err(CacheError::CapacityExceeded);
        }

        data.insert(key.to_string(), CacheEntry::new(value, ttl_secs));

        let mut stats = self.stats.write();
        stats.sets += 1;
        if is_new {
            stats.total_keys += 1;
        }

        Ok(true)
    }

    async fn delete(&self, key: &str) -> CacheResult<bool> {
        debug!("cache DELETE key={}", key);

        let mut data = self.data.write();
        let removed = data.remove(key);

        if removed.is_some() {
            let mut stats = self.stats.write();
            stats.dels += 1;
            stats.total_keys = stats.total_keys.saturating_sub(1);
            Ok(true)
        } else {
            Ok(false)
        }
    }

    async fn delete_matching(&self, pattern: &str) -> CacheResult<usize> {
        debug!("cache DELETE_MATCHING pattern={}", pattern);

        let mut data = self.data.write();
        let keys = Self::matching_keys(&data, pattern);

        let count = keys.len();
        for key in &keys {
            data.remove(key);
        }

        if count > 0 {
            let mut stats = self.stats.write();
            stats.pattern_dels += count as u64;
            stats.total_keys = stats.total_keys.saturating_sub(count);
        }

        Ok(count)
    }
}

/// Glob-style key matching with `*` wildcards.
pub fn key_matches(pattern: &str, key: &str) -> bool {
    // Exact match
    if !pattern.contains('*') {
        return pattern == key;
    }

    // Match everything
    if pattern == "*" {
        return true;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut remainder = key;

    // Anchored prefix
    if let Some(first) = segments.first() {
        if !first.is_empty() {
            match remainder.strip_prefix(first) {
                Some(rest) => remainder = rest,
                None => return false,
            }
        }
    }

    // Anchored suffix
    let last = segments[segments.len() - 1];
    if !last.is_empty() {
        match remainder.strip_suffix(last) {
            Some(rest) => remainder = rest,
            None => return false,
        }
    }

    // Middle segments must appear in order
    for segment in &segments[1..segments.len() - 1] {
        if segment.is_empty() {
            continue;
        }
        match remainder.find(segment) {
            Some(pos) => remainder = &remainder[pos + segment.len()..],
            None => return false,
        }
    }

    true
}
