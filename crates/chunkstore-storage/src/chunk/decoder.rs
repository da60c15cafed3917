//! Chunk Decoder - Random Access to Stored Documents
//!
//! `ChunkDecoder` answers "give me document `d`" against a finished store. It
//! decompresses a chunk the first time any document in it is requested and
//! keeps the result for as long as the decoder is open.
//!
//! ## Lookup Path
//!
//! ```text
//! get_record(doc)
//!     ↓
//! chunk = doc / chunk_size          offset = addresses.chunk_offset(doc)
//!     ↓
//! cache.get_or_load(chunk)
//!     │  miss: source.read(offsets[chunk]..offsets[chunk+1]) → codec.decompress
//!     ↓
//! [varint metaLen][varint dataLen][meta][data] at offset
//!     ↓
//! StoredRecord { meta, data }       (slices of the cached chunk)
//! ```
//!
//! ## Thread Safety
//!
//! ChunkDecoder is `Send + Sync` and meant to be shared behind an `Arc`.
//! Concurrent lookups in different chunks never wait on each other; lookups
//! racing on a chunk that isn't loaded yet wait for the single loader. See
//! [`ChunkCache`](super::ChunkCache).
//!
//! ## Error Handling
//!
//! - `DocumentNotFound`: document maps past the last chunk or has no address
//! - `ChunkOutOfRange`: chunk index past the offset table
//! - `Decompression`: the codec rejected the chunk bytes
//! - `CorruptRecord`: a record runs past the end of its chunk
//! - `FramingMismatch`: `get_record` on a raw store
//! - `Io`: the byte source failed
//!
//! A failed lookup leaves the decoder usable; the affected chunk is retried on
//! the next request.

use std::sync::Arc;

use bytes::Bytes;
use chunkstore_core::{CodecKind, Error, Framing, Result, StoredRecord};

use super::address::DocAddressTable;
use super::cache::{CacheStats, ChunkCache};
use super::source::ByteSource;
use super::table::ChunkTable;
use crate::codec::{codec_for, ChunkCodec};
use crate::config::ChunkStoreConfig;

/// Reads documents from a chunk store
pub struct ChunkDecoder {
    /// Offset table parsed at open
    table: ChunkTable,

    /// Backing bytes of the store
    source: Arc<dyn ByteSource>,

    codec: Arc<dyn ChunkCodec>,

    /// Intra-chunk offset of each document
    addresses: Arc<dyn DocAddressTable>,

    chunk_size: u64,

    framing: Framing,

    /// One write-once slot per chunk
    cache: ChunkCache,
}

impl std::fmt::Debug for ChunkDecoder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChunkDecoder")
            .field("table", &self.table)
            .field("chunk_size", &self.chunk_size)
            .field("framing", &self.framing)
            .field("cache", &self.cache)
            .finish_non_exhaustive()
    }
}

impl ChunkDecoder {
    /// Create a decoder from an already parsed table
    pub fn new(
        table: ChunkTable,
        source: Arc<dyn ByteSource>,
        codec: Arc<dyn ChunkCodec>,
        addresses: Arc<dyn DocAddressTable>,
        config: &ChunkStoreConfig,
    ) -> Result<Self> {
        config.validate()?;

        if table.data_len() > source.len() {
            return Err(Error::MalformedFooter(format!(
                "chunks end at {} but the source holds {} bytes",
                table.data_len(),
                source.len()
            )));
        }

        let cache = ChunkCache::new(table.chunk_count());

        tracing::debug!(
            chunks = table.chunk_count(),
            docs = addresses.doc_count(),
            codec = %codec.kind(),
            chunk_size = config.chunk_size,
            "Opened chunk decoder"
        );

        Ok(Self {
            table,
            source,
            codec,
            addresses,
            chunk_size: config.chunk_size,
            framing: config.framing,
            cache,
        })
    }

    /// Parse the footer at the end of `source` and open it
    pub fn open(
        source: Arc<dyn ByteSource>,
        addresses: Arc<dyn DocAddressTable>,
        config: &ChunkStoreConfig,
    ) -> Result<Self> {
        Self::open_with_codec(source, addresses, codec_for(config.codec), config)
    }

    /// Like [`open`](Self::open), with an explicit codec instance
    pub fn open_with_codec(
        source: Arc<dyn ByteSource>,
        addresses: Arc<dyn DocAddressTable>,
        codec: Arc<dyn ChunkCodec>,
        config: &ChunkStoreConfig,
    ) -> Result<Self> {
        let table = ChunkTable::read_footer(source.as_ref())?;
        Self::new(table, source, codec, addresses, config)
    }

    /// Fetch document `doc`.
    ///
    /// The returned `meta` and `data` share the cached chunk buffer.
    pub fn get_record(&self, doc: u64) -> Result<StoredRecord> {
        if self.framing != Framing::LengthPrefixed {
            return Err(Error::FramingMismatch);
        }

        let chunk = self.chunk_for(doc).ok_or(Error::DocumentNotFound(doc))?;
        let offset = self.addresses.chunk_offset(doc)?;

        let buf = self.read_chunk(chunk)?;
        let offset = usize::try_from(offset).map_err(|_| {
            Error::CorruptRecord(format!("document {} has offset {} past any chunk", doc, offset))
        })?;

        let (record, _) = StoredRecord::decode_framed(&buf, offset)?;
        Ok(record)
    }

    /// The whole decompressed chunk `index`, loading it on first use
    pub fn read_chunk(&self, index: usize) -> Result<Bytes> {
        self.cache.get_or_load(index, || self.load_chunk(index))
    }

    /// Bytes `[start, end)` of decompressed chunk `chunk`.
    ///
    /// This is how lines of a raw store are read back.
    pub fn read_raw(&self, chunk: usize, start: usize, end: usize) -> Result<Bytes> {
        let buf = self.read_chunk(chunk)?;
        if start > end || end > buf.len() {
            return Err(Error::CorruptRecord(format!(
                "range [{}, {}) outside chunk {} of {} bytes",
                start,
                end,
                chunk,
                buf.len()
            )));
        }
        Ok(buf.slice(start..end))
    }

    fn load_chunk(&self, index: usize) -> Result<Bytes> {
        let range = self.table.chunk_range(index)?;
        if range.is_empty() {
            return Ok(Bytes::new());
        }

        let compressed = self.source.read(range.start, range.end)?;

        let mut out = Vec::new();
        self.codec.decompress(&mut out, &compressed)?;

        tracing::debug!(
            chunk = index,
            compressed_bytes = compressed.len(),
            bytes = out.len(),
            "Decompressed chunk"
        );

        Ok(Bytes::from(out))
    }

    /// Chunk holding `doc`, if the table reaches that far
    pub fn chunk_for(&self, doc: u64) -> Option<usize> {
        let chunk = usize::try_from(doc / self.chunk_size).ok()?;
        (chunk < self.table.chunk_count()).then_some(chunk)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn is_cached(&self, chunk: usize) -> bool {
        self.cache.is_populated(chunk)
    }

    /// Number of logical chunks
    pub fn chunk_count(&self) -> usize {
        self.table.chunk_count()
    }

    pub fn doc_count(&self) -> u64 {
        self.addresses.doc_count()
    }

    pub fn table(&self) -> &ChunkTable {
        &self.table
    }

    pub fn codec_kind(&self) -> CodecKind {
        self.codec.kind()
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn chunk_size(&self) -> u64 {
        self.chunk_size
    }

    /// Drop the decoder and every cached chunk with it.
    ///
    /// Records already handed out stay valid; each keeps its own chunk alive.
    pub fn close(self) {
        let stats = self.cache.stats();
        tracing::debug!(
            populated = stats.populated,
            cached_bytes = stats.cached_bytes,
            "Closed chunk decoder"
        );
    }
}
