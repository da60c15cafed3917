//! Fault-injection tests for the chunk store read path
//!
//! Truncated and flaky byte sources must surface as errors on the affected
//! call only, leaving the decoder usable.

use std::io;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use bytes::{BufMut, Bytes};
use chunkstore_storage::{
    ByteSource, ChunkDecoder, ChunkEncoder, ChunkStoreConfig, ChunkTable, CodecKind,
    DocAddressBuilder, Error, Result, StoredAddresses,
};

// ============================================================================
// Fault Injection Helpers
// ============================================================================

/// Source that fails the first `failures` reads of the range starting at `target`
struct FlakySource {
    inner: Bytes,
    target: u64,
    failures: AtomicU64,
    reads: AtomicU64,
}

impl FlakySource {
    fn new(inner: Bytes, target: u64, failures: u64) -> Self {
        Self {
            inner,
            target,
            failures: AtomicU64::new(failures),
            reads: AtomicU64::new(0),
        }
    }
}

impl ByteSource for FlakySource {
    fn len(&self) -> u64 {
        ByteSource::len(&self.inner)
    }

    fn read(&self, start: u64, end: u64) -> Result<Bytes> {
        if start == self.target {
            self.reads.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(io::Error::new(io::ErrorKind::TimedOut, "injected read timeout").into());
            }
        }
        self.inner.read(start, end)
    }
}

/// Source that drops the last byte of the range starting at `target`
struct TruncatingSource {
    inner: Bytes,
    target: u64,
}

impl ByteSource for TruncatingSource {
    fn len(&self) -> u64 {
        ByteSource::len(&self.inner)
    }

    fn read(&self, start: u64, end: u64) -> Result<Bytes> {
        if start == self.target && end > start {
            return self.inner.read(start, end - 1);
        }
        self.inner.read(start, end)
    }
}

fn config(codec: CodecKind) -> ChunkStoreConfig {
    ChunkStoreConfig {
        chunk_size: 8,
        codec,
        ..Default::default()
    }
}

fn build(n: u64, config: &ChunkStoreConfig) -> (Bytes, StoredAddresses) {
    let mut encoder = ChunkEncoder::new(Vec::new(), config).unwrap();
    let mut addresses = DocAddressBuilder::new(config.chunk_size).unwrap();
    for i in 0..n {
        let data = format!("{{\"doc\":{},\"text\":\"{}\"}}", i, "chunked ".repeat(4));
        addresses.push(encoder.add(b"json", data.as_bytes()).unwrap());
    }
    encoder.close().unwrap();
    (Bytes::from(encoder.into_inner()), addresses.finish())
}

// ============================================================================
// Corruption
// ============================================================================

#[test]
fn test_truncated_chunk_fails_with_decompression_error() {
    for codec in [CodecKind::Zstd, CodecKind::Lz4] {
        let config = config(codec);
        let (store, addresses) = build(24, &config);
        let table = ChunkTable::read_footer(&store).unwrap();
        let chunk_one = table.chunk_range(1).unwrap();

        let source = TruncatingSource {
            inner: store,
            target: chunk_one.start,
        };
        let decoder = ChunkDecoder::open(Arc::new(source), Arc::new(addresses), &config).unwrap();

        let err = decoder.get_record(9).unwrap_err();
        assert!(matches!(err, Error::Decompression(_)), "{}: {:?}", codec, err);
        assert!(!decoder.is_cached(1));

        // Neighbouring chunks are unaffected
        assert!(decoder.get_record(0).is_ok());
        assert!(decoder.get_record(16).is_ok());
        assert_eq!(decoder.cache_stats().failures, 1);
    }
}

// ============================================================================
// Transient failures
// ============================================================================

#[test]
fn test_retry_after_transient_read_failure() {
    let config = config(CodecKind::Zstd);
    let (store, addresses) = build(24, &config);
    let target = ChunkTable::read_footer(&store).unwrap().chunk_range(2).unwrap().start;

    let source = Arc::new(FlakySource::new(store, target, 2));
    let decoder = ChunkDecoder::open(source.clone(), Arc::new(addresses), &config).unwrap();

    for _ in 0..2 {
        match decoder.get_record(20) {
            Err(Error::Io(e)) => assert_eq!(e.kind(), io::ErrorKind::TimedOut),
            other => panic!("expected injected I/O error, got {:?}", other),
        }
        assert!(!decoder.is_cached(2));
    }

    let record = decoder.get_record(20).unwrap();
    assert!(record.data.starts_with(b"{\"doc\":20,"));
    assert!(decoder.is_cached(2));

    // Later lookups in the chunk are served from cache
    decoder.get_record(21).unwrap();
    assert_eq!(source.reads.load(Ordering::SeqCst), 3);

    let stats = decoder.cache_stats();
    assert_eq!(stats.failures, 2);
    assert_eq!(stats.decompressions, 1);
}

// ============================================================================
// Malformed footers
// ============================================================================

fn open_err(store: Vec<u8>) -> Error {
    match ChunkDecoder::open(
        Arc::new(Bytes::from(store)),
        Arc::new(StoredAddresses::default()),
        &ChunkStoreConfig::default(),
    ) {
        Ok(_) => panic!("malformed store opened"),
        Err(e) => e,
    }
}

#[test]
fn test_malformed_footers_rejected() {
    // Shorter than the footer
    assert!(matches!(open_err(vec![0; 7]), Error::MalformedFooter(_)));

    // Table length past the start of the store
    let mut store = vec![0u8; 4];
    store.put_u32(100);
    store.put_u32(1);
    assert!(matches!(open_err(store), Error::MalformedFooter(_)));

    // Offset count of zero
    let mut store = vec![0u8];
    store.put_u32(1);
    store.put_u32(0);
    assert!(matches!(open_err(store), Error::MalformedFooter(_)));

    // First offset not zero
    let mut store = vec![0xAA, 0xAA, 3];
    store.put_u32(1);
    store.put_u32(1);
    assert!(matches!(open_err(store), Error::MalformedFooter(_)));

    // Offsets decreasing
    let mut store = vec![0xAA; 4];
    store.extend_from_slice(&[0, 5, 4]);
    store.put_u32(3);
    store.put_u32(3);
    assert!(matches!(open_err(store), Error::MalformedFooter(_)));
}

#[test]
fn test_truncated_store_rejected_at_open() {
    let config = config(CodecKind::Zstd);
    let (store, _) = build(20, &config);

    for cut in [1, 4, 8, 12, store.len() / 2] {
        let truncated = store.slice(..store.len() - cut);
        let result = ChunkDecoder::open(
            Arc::new(truncated),
            Arc::new(StoredAddresses::default()),
            &config,
        );
        assert!(result.is_err(), "store cut by {} bytes opened", cut);
    }
}

#[test]
fn test_random_tails_never_panic() {
    // Deterministic pseudo-random garbage
    let mut state = 0x2545_F491_4F6C_DD1Du64;
    for len in 0..200usize {
        let store: Vec<u8> = (0..len)
            .map(|_| {
                state ^= state << 13;
                state ^= state >> 7;
                state ^= state << 17;
                state as u8
            })
            .collect();
        let _ = ChunkTable::read_footer(&Bytes::from(store));
    }
}
