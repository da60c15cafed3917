//! Per-Chunk Lazy Cache
//!
//! One slot per logical chunk, allocated when the decoder opens and never
//! resized. A slot starts empty and is filled at most once with the chunk's
//! decompressed bytes; after that every reader shares the same immutable
//! buffer.
//!
//! ## Synchronization
//!
//! ```text
//! get_or_load(i)
//!     ↓
//! slot[i].value set? ──YES──→ clone handle, return (no lock)
//!     │
//!     NO
//!     ↓
//! lock slot[i]   (other slots unaffected)
//!     ↓
//! value set now? ──YES──→ another thread loaded it, return
//!     │
//!     NO
//!     ↓
//! load() → Ok: publish, return
//!        → Err: leave slot empty, return error
//! ```
//!
//! A failed load is not remembered. The next request for that chunk tries
//! again, and concurrent retries of the same chunk still serialize on its lock,
//! so a successful chunk is decompressed exactly once.
//!
//! Nothing is ever evicted: the cache lives as long as its decoder.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, OnceLock, PoisonError};
use std::time::Instant;

use bytes::Bytes;
use chunkstore_core::{Error, Result};
use chunkstore_observability::metrics;
use serde::Serialize;

#[derive(Debug, Default)]
struct ChunkSlot {
    /// Held only while loading
    lock: Mutex<()>,
    value: OnceLock<Bytes>,
}

/// Snapshot of cache counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Lookups that found the chunk already loaded
    pub hits: u64,
    /// Lookups that found the slot empty on arrival
    pub misses: u64,
    /// Successful loads (one per populated slot)
    pub decompressions: u64,
    /// Loads that returned an error
    pub failures: u64,
    /// Slots holding a chunk
    pub populated: usize,
    /// Decompressed bytes held
    pub cached_bytes: u64,
}

/// Fixed arena of write-once chunk slots
#[derive(Debug)]
pub struct ChunkCache {
    slots: Box<[ChunkSlot]>,
    hits: AtomicU64,
    misses: AtomicU64,
    decompressions: AtomicU64,
    failures: AtomicU64,
    cached_bytes: AtomicU64,
}

impl ChunkCache {
    pub fn new(chunk_count: usize) -> Self {
        let slots = (0..chunk_count).map(|_| ChunkSlot::default()).collect();
        Self {
            slots,
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
            decompressions: AtomicU64::new(0),
            failures: AtomicU64::new(0),
            cached_bytes: AtomicU64::new(0),
        }
    }

    /// Number of slots
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Return chunk `index`, running `load` if no thread has loaded it yet.
    ///
    /// `load` runs under the slot's lock, so at most one loader per slot is
    /// active at a time.
    pub fn get_or_load<F>(&self, index: usize, load: F) -> Result<Bytes>
    where
        F: FnOnce() -> Result<Bytes>,
    {
        let slot = self.slots.get(index).ok_or(Error::ChunkOutOfRange(index))?;

        if let Some(chunk) = slot.value.get() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            metrics::CHUNK_CACHE_HITS_TOTAL.inc();
            return Ok(chunk.clone());
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        metrics::CHUNK_CACHE_MISSES_TOTAL.inc();

        // Guards no data, so a poisoned lock is still usable
        let _guard = slot.lock.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(chunk) = slot.value.get() {
            return Ok(chunk.clone());
        }

        let start = Instant::now();
        match load() {
            Ok(chunk) => {
                metrics::CHUNK_LOAD_SECONDS.observe(start.elapsed().as_secs_f64());
                self.decompressions.fetch_add(1, Ordering::Relaxed);
                self.cached_bytes
                    .fetch_add(chunk.len() as u64, Ordering::Relaxed);
                metrics::CHUNK_DECOMPRESSIONS_TOTAL.inc();
                metrics::CHUNK_CACHE_BYTES.add(chunk.len() as i64);

                tracing::trace!(chunk = index, bytes = chunk.len(), "Cached chunk");

                // Only the lock holder fills the slot, and it was empty above
                Ok(slot.value.get_or_init(|| chunk).clone())
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                metrics::CHUNK_LOAD_ERRORS_TOTAL.inc();
                tracing::warn!(chunk = index, error = %e, "Chunk load failed");
                Err(e)
            }
        }
    }

    /// Chunk `index` if already loaded
    pub fn get(&self, index: usize) -> Option<Bytes> {
        self.slots.get(index)?.value.get().cloned()
    }

    pub fn is_populated(&self, index: usize) -> bool {
        self.slots
            .get(index)
            .map(|slot| slot.value.get().is_some())
            .unwrap_or(false)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            decompressions: self.decompressions.load(Ordering::Relaxed),
            failures: self.failures.load(Ordering::Relaxed),
            populated: self.slots.iter().filter(|s| s.value.get().is_some()).count(),
            cached_bytes: self.cached_bytes.load(Ordering::Relaxed),
        }
    }
}

impl Drop for ChunkCache {
    fn drop(&mut self) {
        metrics::CHUNK_CACHE_BYTES.sub(*self.cached_bytes.get_mut() as i64);
    }
}
