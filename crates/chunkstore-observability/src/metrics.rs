use lazy_static::lazy_static;
use prometheus::{Histogram, HistogramOpts, IntCounter, IntGauge, Registry};
use std::sync::Once;

static INIT: Once = Once::new();

lazy_static! {
    /// Global Prometheus metrics registry
    pub static ref REGISTRY: Registry = Registry::new();

    // ============================================================================
    // Encoder Metrics
    // ============================================================================

    /// Chunks compressed and written
    pub static ref CHUNKS_FLUSHED_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_chunks_flushed_total",
        "Total chunks compressed and written"
    ).expect("metric can be created");

    /// Compressed chunk bytes written
    pub static ref COMPRESSED_BYTES_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_compressed_bytes_total",
        "Total compressed chunk bytes written"
    ).expect("metric can be created");

    // ============================================================================
    // Decoder Metrics
    // ============================================================================

    /// Chunk lookups served from an already decompressed chunk
    pub static ref CHUNK_CACHE_HITS_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_chunk_cache_hits_total",
        "Total chunk lookups served from cache"
    ).expect("metric can be created");

    /// Chunk lookups that found the slot empty
    pub static ref CHUNK_CACHE_MISSES_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_chunk_cache_misses_total",
        "Total chunk lookups that missed the cache"
    ).expect("metric can be created");

    /// Successful chunk decompressions
    pub static ref CHUNK_DECOMPRESSIONS_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_chunk_decompressions_total",
        "Total chunks decompressed"
    ).expect("metric can be created");

    /// Chunk loads that failed on read or decompression
    pub static ref CHUNK_LOAD_ERRORS_TOTAL: IntCounter = IntCounter::new(
        "chunkstore_chunk_load_errors_total",
        "Total failed chunk loads"
    ).expect("metric can be created");

    /// Decompressed bytes held by open decoders
    pub static ref CHUNK_CACHE_BYTES: IntGauge = IntGauge::new(
        "chunkstore_chunk_cache_bytes",
        "Decompressed chunk bytes currently cached"
    ).expect("metric can be created");

    /// Time to read and decompress one chunk
    pub static ref CHUNK_LOAD_SECONDS: Histogram = Histogram::with_opts(
        HistogramOpts::new("chunkstore_chunk_load_seconds", "Chunk load latency in seconds")
            .buckets(vec![0.00005, 0.0001, 0.00025, 0.0005, 0.001, 0.0025, 0.005, 0.01, 0.05, 0.1]),
    ).expect("metric can be created");
}

/// Initialize metrics registry
/// Can be called multiple times safely (idempotent)
pub fn init() {
    INIT.call_once(|| {
        // Encoder metrics
        REGISTRY
            .register(Box::new(CHUNKS_FLUSHED_TOTAL.clone()))
            .expect("chunks_flushed_total can be registered");
        REGISTRY
            .register(Box::new(COMPRESSED_BYTES_TOTAL.clone()))
            .expect("compressed_bytes_total can be registered");

        // Decoder metrics
        REGISTRY
            .register(Box::new(CHUNK_CACHE_HITS_TOTAL.clone()))
            .expect("chunk_cache_hits_total can be registered");
        REGISTRY
            .register(Box::new(CHUNK_CACHE_MISSES_TOTAL.clone()))
            .expect("chunk_cache_misses_total can be registered");
        REGISTRY
            .register(Box::new(CHUNK_DECOMPRESSIONS_TOTAL.clone()))
            .expect("chunk_decompressions_total can be registered");
        REGISTRY
            .register(Box::new(CHUNK_LOAD_ERRORS_TOTAL.clone()))
            .expect("chunk_load_errors_total can be registered");
        REGISTRY
            .register(Box::new(CHUNK_CACHE_BYTES.clone()))
            .expect("chunk_cache_bytes can be registered");
        REGISTRY
            .register(Box::new(CHUNK_LOAD_SECONDS.clone()))
            .expect("chunk_load_seconds can be registered");
    });
}
