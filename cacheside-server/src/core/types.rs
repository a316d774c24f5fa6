use serde::{Deserialize, Serialize};
use std::time::Instant;

/// Cached value with expiry metadata
#[derive(Debug, Clone)]
pub struct CacheEntry {
    /// Serialized payload
    pub data: Vec<u8>,
    /// Expiration time
    pub expires_at: Instant,
    /// When the entry was created
    pub created_at: Instant,
    /// Last access time
    pub accessed_at: Instant,
}

impl CacheEntry {
    /// Create a new entry expiring `ttl_secs` from now
    pub fn new(data: Vec<u8>, ttl_secs: u64) -> Self {
        let now = Instant::now();
        Self {
            data,
            expires_at: now + std::time::Duration::from_secs(ttl_secs),
            created_at: now,
            accessed_at: now,
        }
    }

    /// Check if the entry has expired
    pub fn is_expired(&self) -> bool {
        Instant::now() >= self.expires_at
    }

    /// Update access time
    pub fn update_access(&mut self) {
        self.accessed_at = Instant::now();
    }

    /// Remaining TTL in seconds
    pub fn remaining_ttl_secs(&self) -> u64 {
        let now = Instant::now();
        if now >= self.expires_at {
            0
        } else {
            (self.expires_at - now).as_secs()
        }
    }
}

/// Configuration for the in-memory cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// TTL applied to entries populated by the read path, in seconds
    pub default_ttl_secs: u64,
    /// Expired-entry sweep interval in milliseconds
    pub cleanup_interval_ms: u64,
    /// Maximum number of entries, refuse sets beyond this
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            default_ttl_secs: 300,
            cleanup_interval_ms: 100,
            max_entries: 100_000,
        }
    }
}

/// Statistics for the cache
#[derive(Debug, Default, Clone, Serialize)]
pub struct CacheStats {
    /// Current number of keys
    pub total_keys: usize,
    /// Number of GET operations
    pub gets: u64,
    /// Number of SET operations
    pub sets: u64,
    /// Number of single-key deletes
    pub dels: u64,
    /// Number of keys removed by pattern deletes
    pub pattern_dels: u64,
    /// Number of hits
    pub hits: u64,
    /// Number of misses
    pub misses: u64,
}

impl CacheStats {
    /// Calculate hit rate
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}
