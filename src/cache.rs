//! Explicit memoization of expensive results.
//!
//! There is no process-wide cache: callers own a [`Memo`] and pass it to the
//! call sites that should reuse results. Entries are keyed by the xxhash64 of
//! the operation name and the postcard encoding of its arguments, and values
//! are stored postcard-encoded in a pluggable [`CacheStore`].
//!
//! # Example
//!
//! ```rust
//! use verity::cache::Memo;
//!
//! let mut memo = Memo::in_memory();
//! let mut calls = 0;
//! for _ in 0..3 {
//!     let sum: u64 = memo
//!         .get_or_compute("sum", &[1u64, 2, 3], || {
//!             calls += 1;
//!             Ok(6)
//!         })
//!         .unwrap();
//!     assert_eq!(sum, 6);
//! }
//! assert_eq!(calls, 1);
//! assert_eq!(memo.stats().hits, 2);
//! ```

use std::collections::HashMap;

use serde::de::DeserializeOwned;
use serde::Serialize;
use xxhash_rust::xxh64::Xxh64;

use crate::error::Result;

// ============================================================================
// CACHE KEY
// ============================================================================

/// Content-derived cache key: xxhash64 of operation identity plus arguments.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(pub u64);

impl CacheKey {
    /// Key for calling `op` with `args`.
    ///
    /// The operation name is length-prefixed so that `("ab", x)` and
    /// `("a", "b" ++ x)` never hash the same input.
    pub fn for_call<A: Serialize + ?Sized>(op: &str, args: &A) -> Result<Self> {
        let encoded = postcard::to_stdvec(args)?;
        let mut hasher = Xxh64::new(0);
        hasher.update(&(op.len() as u64).to_le_bytes());
        hasher.update(op.as_bytes());
        hasher.update(&encoded);
        Ok(Self(hasher.digest()))
    }

    #[inline]
    pub const fn as_u64(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

// ============================================================================
// BACKING STORES
// ============================================================================

/// Where encoded cache entries live.
pub trait CacheStore {
    fn get(&self, key: CacheKey) -> Option<Vec<u8>>;

    fn put(&mut self, key: CacheKey, value: Vec<u8>);

    fn remove(&mut self, key: CacheKey);

    fn clear(&mut self);

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Unbounded in-memory store.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<CacheKey, Vec<u8>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total size of stored payloads in bytes.
    pub fn payload_bytes(&self) -> usize {
        self.entries.values().map(Vec::len).sum()
    }
}

impl CacheStore for MemoryStore {
    fn get(&self, key: CacheKey) -> Option<Vec<u8>> {
        self.entries.get(&key).cloned()
    }

    fn put(&mut self, key: CacheKey, value: Vec<u8>) {
        self.entries.insert(key, value);
    }

    fn remove(&mut self, key: CacheKey) {
        self.entries.remove(&key);
    }

    fn clear(&mut self) {
        self.entries.clear();
    }

    fn len(&self) -> usize {
        self.entries.len()
    }
}

// ============================================================================
// MEMO
// ============================================================================

/// Hit/miss counters.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub insertions: u64,
}

impl CacheStats {
    /// Fraction of lookups served from the cache, 0.0 when nothing was looked up.
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

/// Memoizer over an explicit backing store.
#[derive(Debug)]
pub struct Memo<S = MemoryStore> {
    store: S,
    stats: CacheStats,
}

impl Memo<MemoryStore> {
    /// Memo backed by a fresh [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(MemoryStore::new())
    }
}

impl<S: CacheStore> Memo<S> {
    pub fn new(store: S) -> Self {
        Self {
            store,
            stats: CacheStats::default(),
        }
    }

    /// Return the cached result of `op(args)`, computing and storing it on a miss.
    ///
    /// Errors from `compute` are returned as-is and nothing is stored. A stored
    /// entry that no longer decodes as `T` is treated as a miss and replaced.
    pub fn get_or_compute<A, T, F>(&mut self, op: &str, args: &A, compute: F) -> Result<T>
    where
        A: Serialize + ?Sized,
        T: Serialize + DeserializeOwned,
        F: FnOnce() -> Result<T>,
    {
        let key = CacheKey::for_call(op, args)?;

        if let Some(bytes) = self.store.get(key) {
            match postcard::from_bytes::<T>(&bytes) {
                Ok(value) => {
                    self.stats.hits += 1;
                    tracing::trace!(%key, op, "cache hit");
                    return Ok(value);
                }
                Err(e) => {
                    tracing::debug!(%key, op, error = %e, "discarding undecodable cache entry");
                    self.store.remove(key);
                }
            }
        }

        self.stats.misses += 1;
        tracing::trace!(%key, op, "cache miss");

        let value = compute()?;
        self.store.put(key, postcard::to_stdvec(&value)?);
        self.stats.insertions += 1;
        Ok(value)
    }

    pub fn stats(&self) -> CacheStats {
        self.stats
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    /// Drop every entry and reset the counters.
    pub fn clear(&mut self) {
        self.store.clear();
        self.stats = CacheStats::default();
        tracing::debug!("cache cleared");
    }

    pub fn into_store(self) -> S {
        self.store
    }
}
