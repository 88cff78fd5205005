//! # Stage: Response Cache
//!
//! ## Responsibility
//! Remember recent results so an identical prompt (after trimming and
//! lowercasing) under the same classifier mode skips classification, routing
//! and generation entirely.
//!
//! ## Guarantees
//! - Bounded: never holds more than `capacity` entries; inserting a new key
//!   at capacity evicts exactly one entry, the least recently used.
//! - Fresh: never returns an entry older than its TTL. An expired entry is
//!   dropped on the lookup that finds it and counted as a miss.
//! - True LRU: both `get` hits and `put` refresh recency.
//! - Atomic: key table, recency order and counters sit behind a single
//!   lock, held only for in-memory bookkeeping.
//!
//! ## NOT Responsible For
//! - Deduplicating concurrent misses for the same key (both may generate)
//! - Persistence across restarts

use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::time::{Duration, Instant};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::classifier::ClassifierMode;

/// Default maximum number of entries.
pub const DEFAULT_CAPACITY: usize = 100;
/// Default time-to-live in seconds.
pub const DEFAULT_TTL_SECS: u64 = 1800;

/// SHA-256 hex digest of `normalize(prompt) + "::" + mode`.
///
/// `normalize` trims surrounding whitespace and lowercases.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CacheKey(String);

impl CacheKey {
    /// Derive the key for a prompt under a classifier mode.
    ///
    /// # Example
    ///
    /// ```rust
    /// use prompt_gateway::{CacheKey, ClassifierMode};
    /// let a = CacheKey::new("Hello World", ClassifierMode::RuleBased);
    /// let b = CacheKey::new("  hello world ", ClassifierMode::RuleBased);
    /// assert_eq!(a, b);
    /// ```
    pub fn new(prompt: &str, mode: ClassifierMode) -> Self {
        let normalized = prompt.trim().to_lowercase();
        let mut hasher = Sha256::new();
        hasher.update(normalized.as_bytes());
        hasher.update(b"::");
        hasher.update(mode.as_str().as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    /// The 64-character hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Point-in-time cache counters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheStats {
    /// Live entries (expired entries not yet looked up still count).
    pub size: usize,
    /// Maximum entries.
    pub capacity: usize,
    /// Time-to-live in whole seconds.
    pub ttl_secs: u64,
    /// Lookups that returned a value.
    pub hits: u64,
    /// Lookups that found nothing or an expired entry.
    pub misses: u64,
    /// `hits / (hits + misses)`, `0.0` before the first lookup.
    pub hit_rate: f64,
}

struct Entry<V> {
    value: V,
    inserted_at: Instant,
    last_accessed_at: Instant,
    expires_at: Instant,
    seq: u64,
}

struct Inner<V> {
    entries: HashMap<CacheKey, Entry<V>>,
    /// Access sequence → key. The first entry is the least recently used.
    recency: BTreeMap<u64, CacheKey>,
    next_seq: u64,
    hits: u64,
    misses: u64,
}

impl<V> Inner<V> {
    fn new() -> Self {
        Self {
            entries: HashMap::new(),
            recency: BTreeMap::new(),
            next_seq: 0,
            hits: 0,
            misses: 0,
        }
    }

    fn bump(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    fn remove(&mut self, key: &CacheKey) -> Option<Entry<V>> {
        let entry = self.entries.remove(key)?;
        self.recency.remove(&entry.seq);
        Some(entry)
    }

    fn evict_lru(&mut self) -> Option<CacheKey> {
        let (_, key) = self.recency.pop_first()?;
        self.entries.remove(&key);
        Some(key)
    }
}

/// Bounded LRU cache with per-entry TTL.
///
/// Values are cloned out on every hit; callers never borrow cache storage.
///
/// # Panics
///
/// This type and its methods never panic.
pub struct ResponseCache<V> {
    capacity: usize,
    ttl: Duration,
    inner: Mutex<Inner<V>>,
}

impl<V> fmt::Debug for ResponseCache<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResponseCache")
            .field("capacity", &self.capacity)
            .field("ttl", &self.ttl)
            .field("size", &self.inner.lock().entries.len())
            .finish()
    }
}

impl<V: Clone> Default for ResponseCache<V> {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY, Duration::from_secs(DEFAULT_TTL_SECS))
    }
}

impl<V: Clone> ResponseCache<V> {
    /// Create a cache. A capacity of zero is raised to one.
    pub fn new(capacity: usize, ttl: Duration) -> Self {
        Self {
            capacity: capacity.max(1),
            ttl,
            inner: Mutex::new(Inner::new()),
        }
    }

    /// Look up `key`.
    ///
    /// A hit refreshes recency and `last_accessed_at`. An expired entry is
    /// removed and reported as a miss.
    pub fn get(&self, key: &CacheKey) -> Option<V> {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let expired = match inner.entries.get(key) {
            None => {
                inner.misses += 1;
                return None;
            }
            Some(entry) => now > entry.expires_at,
        };

        if expired {
            if let Some(stale) = inner.remove(key) {
                let age_ms = now.duration_since(stale.inserted_at).as_millis() as u64;
                tracing::debug!(key = %key, age_ms, "cache entry expired");
            }
            inner.misses += 1;
            return None;
        }

        let seq = inner.bump();
        inner.hits += 1;
        let Inner {
            entries, recency, ..
        } = &mut *inner;
        let entry = entries.get_mut(key)?;
        recency.remove(&entry.seq);
        recency.insert(seq, key.clone());
        entry.seq = seq;
        entry.last_accessed_at = now;
        Some(entry.value.clone())
    }

    /// Insert or overwrite `key`.
    ///
    /// Resets the entry's TTL. A new key at capacity first evicts the least
    /// recently used entry; overwriting an existing key evicts nothing.
    pub fn put(&self, key: CacheKey, value: V) {
        let now = Instant::now();
        let mut inner = self.inner.lock();

        let existed = inner.remove(&key).is_some();
        if !existed && inner.entries.len() >= self.capacity {
            if let Some(evicted) = inner.evict_lru() {
                tracing::debug!(key = %evicted, "cache evicted least recently used entry");
            }
        }

        let seq = inner.bump();
        inner.recency.insert(seq, key.clone());
        inner.entries.insert(
            key,
            Entry {
                value,
                inserted_at: now,
                last_accessed_at: now,
                expires_at: now + self.ttl,
                seq,
            },
        );
    }

    /// Drop every entry and reset the hit/miss counters.
    pub fn clear(&self) {
        let mut inner = self.inner.lock();
        *inner = Inner::new();
    }

    /// Current counters.
    pub fn stats(&self) -> CacheStats {
        let inner = self.inner.lock();
        let lookups = inner.hits + inner.misses;
        let hit_rate = if lookups == 0 {
            0.0
        } else {
            inner.hits as f64 / lookups as f64
        };
        CacheStats {
            size: inner.entries.len(),
            capacity: self.capacity,
            ttl_secs: self.ttl.as_secs(),
            hits: inner.hits,
            misses: inner.misses,
            hit_rate,
        }
    }

    /// Number of stored entries.
    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// When `key` was last read or written, if present.
    pub fn last_accessed(&self, key: &CacheKey) -> Option<Instant> {
        self.inner.lock().entries.get(key).map(|e| e.last_accessed_at)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
