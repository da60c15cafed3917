//! Chunkstore Storage Layer
//!
//! This crate implements the stored-document region of a search segment: the
//! part of the segment that holds each document's original bytes so a search
//! hit can be turned back into a document.
//!
//! ## What is a Chunk Store?
//!
//! Documents are grouped into chunks of a fixed number of records. Each chunk
//! is compressed on its own, so reading one document costs one chunk
//! decompression, not a whole-segment one. A table of cumulative compressed
//! offsets at the end of the store maps chunk index to byte range.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌──────────────────┐
//! │ Segment builder  │
//! └────────┬─────────┘
//!          │ (meta, data) per document
//!          ▼
//! ┌──────────────────┐     ┌───────────────────┐
//! │ ChunkEncoder     │────►│ DocAddressBuilder │
//! │ - Frames         │     │ - Intra-chunk     │
//! │ - Compresses     │     │   offsets         │
//! │ - Offset table   │     └─────────┬─────────┘
//! └────────┬─────────┘               │
//!          │ store bytes             │ address table
//!          ▼                         ▼
//! ┌─────────────────────────────────────────────┐
//! │ ByteSource (Bytes, FileSource, ...)         │
//! └────────┬────────────────────────────────────┘
//!          │
//!          ▼
//! ┌──────────────────┐
//! │ ChunkDecoder     │
//! │ - ChunkTable     │
//! │ - ChunkCache     │
//! │ - Codec          │
//! └────────┬─────────┘
//!          │ StoredRecord
//!          ▼
//! ┌──────────────────┐
//! │ Query execution  │
//! └──────────────────┘
//! ```
//!
//! ## Main Components
//!
//! ### ChunkEncoder
//! Single-writer builder. Frames records, flushes every `chunk_size` of them
//! through the codec, and writes the offset table and footer on close.
//!
//! ### ChunkDecoder
//! Shared, concurrent reader. Parses the footer once, then decompresses each
//! chunk at most once, on first use, and serves records as zero-copy slices of
//! the cached buffer.
//!
//! ### Codecs
//! [`ZstdCodec`] (tunable, default for stored documents), [`Lz4Codec`] (fixed,
//! for the raw secondary store), and [`PassthroughCodec`].
//!
//! ## Usage Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use bytes::Bytes;
//! use chunkstore_storage::{ChunkDecoder, ChunkEncoder, ChunkStoreConfig, DocAddressBuilder};
//!
//! let config = ChunkStoreConfig::default();
//! let mut encoder = ChunkEncoder::new(Vec::new(), &config)?;
//! let mut addresses = DocAddressBuilder::new(config.chunk_size)?;
//!
//! for doc in documents {
//!     addresses.push(encoder.add(&doc.meta, &doc.data)?);
//! }
//! let info = encoder.close()?;
//!
//! let decoder = ChunkDecoder::open(
//!     Arc::new(Bytes::from(encoder.into_inner())),
//!     Arc::new(addresses.finish()),
//!     &config,
//! )?;
//! let record = decoder.get_record(42)?;
//! ```
//!
//! ## Design Decisions
//!
//! ### Why Fixed-Count Chunks?
//! - **Addressing is arithmetic**: chunk index is `doc / chunk_size`
//! - **Bounded work per lookup**: one chunk of at most `chunk_size` records
//!
//! ### Why a Slot per Chunk?
//! Readers in different chunks never contend. Readers racing on the same
//! unloaded chunk wait for one decompression instead of each doing their own.

pub mod chunk;
pub mod codec;
pub mod config;

pub use chunk::{
    ByteSource, CacheStats, ChunkCache, ChunkDecoder, ChunkEncoder, ChunkTable, DocAddressBuilder,
    DocAddressTable, FileSource, StoredAddresses, ADDRESS_WIDTH, DEFAULT_CHUNK_SIZE, FOOTER_SIZE,
};
pub use codec::{
    codec_for, ChunkCodec, Lz4Codec, PassthroughCodec, ZstdCodec, DEFAULT_COMPRESSION_LEVEL,
    MAX_CHUNK_BYTES,
};
pub use config::ChunkStoreConfig;

pub use chunkstore_core::{ChunkStoreInfo, CodecKind, Error, Framing, Result, StoredRecord};
