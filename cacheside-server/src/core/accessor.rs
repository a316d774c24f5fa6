use super::cache::CacheBackend;
use super::error::Result;
use super::record::{decode_cached, encode_cached};
use serde::{Serialize, de::DeserializeOwned};
use std::future::Future;
use tracing::{debug, warn};

/// Cache key for a single note
pub fn note_key(id: u64) -> String {
    format!("note:{id}")
}

/// Cache key for a user's profile (user plus their notes)
pub fn user_profile_key(id: u64) -> String {
    format!("user:{id}:profile")
}

/// Cache key for one page of the note listing
pub fn notes_page_key(offset: usize, limit: usize) -> String {
    format!("notes:{offset}:{limit}")
}

/// Cache key for one page of the user listing
pub fn users_page_key(offset: usize, limit: usize) -> String {
    format!("users:{offset}:{limit}")
}

/// Wildcard covering every cached note listing page
pub const NOTES_PATTERN: &str = "notes:*";
/// Wildcard covering every cached user listing page
pub const USERS_PATTERN: &str = "users:*";

/// Cache-aside accessor: read-through population on the read path,
/// explicit invalidation after writes.
///
/// The cache handle is injected at construction and owned by the caller
/// for its whole lifecycle. Every cache failure is downgraded to a miss
/// here, so callers only ever see primary-store outcomes.
#[derive(Clone)]
pub struct CacheAside<C> {
    cache: C,
    default_ttl_secs: u64,
}

impl<C: CacheBackend> CacheAside<C> {
    pub fn new(cache: C, default_ttl_secs: u64) -> Self {
        Self {
            cache,
            default_ttl_secs,
        }
    }

    pub fn cache(&self) -> &C {
        &self.cache
    }

    /// Read-through fetch.
    ///
    /// On a cache hit the primary store is not touched. On a miss,
    /// `load` queries the primary store; a `Some` result is cached with
    /// the default TTL before being returned, a `None` result is
    /// returned without populating the cache. A primary-store error
    /// from `load` propagates; cache errors never do.
    pub async fn fetch<T, F, Fut>(&self, key: &str, load: F) -> Result<Option<T>>
    where
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<T>>>,
    {
        match self.cache.get(key).await {
            Ok(Some(bytes)) => {
                if let Some(value) = decode_cached(&bytes) {
                    debug!("cache HIT key={}", key);
                    return Ok(Some(value));
                }
                // Undecodable or schema-mismatched entry, reload below
                warn!("discarding undecodable cache entry key={}", key);
            }
            Ok(None) => debug!("cache MISS key={}", key),
            Err(e) => warn!("cache get failed, falling back to store: {}", e),
        }

        let Some(value) = load().await? else {
            return Ok(None);
        };

        match encode_cached(&value) {
            Ok(bytes) => {
                if let Err(e) = self.cache.set(key, bytes, self.default_ttl_secs).await {
                    warn!("cache set failed for key={}: {}", key, e);
                }
            }
            Err(e) => warn!("cache encode failed for key={}: {}", key, e),
        }

        Ok(Some(value))
    }

    /// Delete one cache key. Failures are logged and swallowed; the
    /// staleness window is bounded by the TTL.
    pub async fn invalidate_key(&self, key: &str) {
        if let Err(e) = self.cache.delete(key).await {
            warn!("cache delete failed for key={}: {}", key, e);
        }
    }

    /// Delete every cache key matching a glob pattern, returning the
    /// number of entries removed (0 when the cache is unreachable).
    pub async fn invalidate(&self, pattern: &str) -> usize {
        match self.cache.delete_matching(pattern).await {
            Ok(count) => {
                debug!("invalidated {} entries for pattern={}", count, pattern);
                count
            }
            Err(e) => {
                warn!("cache pattern delete failed for pattern={}: {}", pattern, e);
                0
            }
        }
    }
}

/// Cache stand-in where every operation fails, for fail-open tests
#[cfg(test)]
pub(crate) struct FailingCache;

#[cfg(test)]
impl CacheBackend for FailingCache {
    async fn get(&self, _key: &str) -> super::cache::CacheResult<Option<Vec<u8>>> {
        Err(super::cache::CacheError::Unavailable(
            "connection refused".to_string(),
        ))
    }

    async fn set(
        &self,
        _key: &str,
        _value: Vec<u8>,
        _ttl_secs: u64,
    ) -> super::cache::CacheResult<bool> {
        Err(super::cache::CacheError::Unavailable(
            "connection refused".to_string(),
        ))
    }

    async fn delete(&self, _key: &str) -> super::cache::CacheResult<bool> {
        Err(super::cache::CacheError::Unavailable(
            "connection refused".to_string(),
        ))
    }

    async fn delete_matching(&self, _pattern: &str) -> super::cache::CacheResult<usize> {
        Err(super::cache::CacheError::Unavailable(
            "connection refused".to_string(),
        ))
    }
}
