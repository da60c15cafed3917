//! Chunk Store Observability
//!
//! Prometheus metrics for the chunk encoder and decoder.
//!
//! # Usage
//!
//! ```no_run
//! use chunkstore_observability::{gather_text, metrics};
//!
//! // Register metrics with the global registry
//! metrics::init();
//!
//! // ... build and read stores ...
//!
//! // Prometheus text exposition format
//! let text = gather_text().unwrap();
//! println!("{}", text);
//! ```

pub mod metrics;

use prometheus::{Encoder, TextEncoder};

// Re-export commonly used items
pub use metrics::{init as init_metrics, REGISTRY};

/// Initialize all observability components
pub fn init() {
    metrics::init();
}

/// Render every registered metric in the Prometheus text format
pub fn gather_text() -> prometheus::Result<String> {
    let encoder = TextEncoder::new();
    let families = REGISTRY.gather();

    let mut buffer = Vec::new();
    encoder.encode(&families, &mut buffer)?;
    String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_does_not_panic() {
        init();
    }

    #[test]
    fn test_init_metrics_alias() {
        init_metrics();
    }

    #[test]
    fn test_double_init_is_safe() {
        init();
        init();
    }

    #[test]
    fn test_gather_text_lists_chunk_metrics() {
        init();
        metrics::CHUNK_DECOMPRESSIONS_TOTAL.inc();

        let text = gather_text().unwrap();
        assert!(text.contains("chunkstore_chunk_decompressions_total"));
        assert!(text.contains("# TYPE chunkstore_chunk_cache_bytes gauge"));
    }
}
