//! Chunk Store Format
//!
//! This module implements the stored-document region of a search segment:
//! documents grouped into fixed-count chunks, each chunk compressed on its own,
//! followed by an offset table for random access.
//!
//! ## Store Layout
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │ Chunk 0 (compressed, chunk_size records)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Chunk 1 (compressed)                                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │ ...                                                         │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Chunk k-1 (compressed, possibly partial)                    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Offset table                                                │
//! │ - k+1 varints: cumulative compressed offsets, first is 0    │
//! ├─────────────────────────────────────────────────────────────┤
//! │ Footer (8 bytes)                                            │
//! │ - Offset table byte length (u32, big-endian)                │
//! │ - Offset count = k+1 (u32, big-endian)                      │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Chunk `i` occupies `[offsets[i], offsets[i+1])`. A reader finds the table by
//! reading the last 8 bytes and stepping back `table_len + 8`.
//!
//! ## Chunk Format (Decompressed)
//!
//! With [`Framing::LengthPrefixed`](chunkstore_core::Framing):
//! ```text
//! Record 1:
//!   - Meta length (varint, unsigned)
//!   - Data length (varint, unsigned)
//!   - Meta bytes
//!   - Data bytes
//! Record 2:
//!   ...
//! ```
//! With `Framing::Raw` the chunk is just the bytes written, back to back.
//!
//! ## Locating a Document
//!
//! Chunk index is `doc / chunk_size`. The intra-chunk byte offset comes from a
//! [`DocAddressTable`] kept alongside the store (built in lockstep with the
//! encoder by [`DocAddressBuilder`]).
//!
//! ## Usage
//!
//! ### Writing
//! ```ignore
//! let mut encoder = ChunkEncoder::new(Vec::new(), &ChunkStoreConfig::default())?;
//! let mut addresses = DocAddressBuilder::new(128)?;
//!
//! for (meta, data) in documents {
//!     let written = encoder.add(meta, data)?;
//!     addresses.push(written);
//! }
//!
//! encoder.close()?;
//! let store = Bytes::from(encoder.into_inner());
//! ```
//!
//! ### Reading
//! ```ignore
//! let decoder = ChunkDecoder::open(
//!     Arc::new(store),
//!     Arc::new(addresses.finish()),
//!     &ChunkStoreConfig::default(),
//! )?;
//!
//! let record = decoder.get_record(42)?;
//! ```

mod address;
mod cache;
mod decoder;
mod encoder;
mod source;
mod table;

pub use address::{DocAddressBuilder, DocAddressTable, StoredAddresses, ADDRESS_WIDTH};
pub use cache::{CacheStats, ChunkCache};
pub use decoder::ChunkDecoder;
pub use encoder::ChunkEncoder;
pub use source::{ByteSource, FileSource};
pub use table::ChunkTable;

/// Records per chunk unless configured otherwise
pub const DEFAULT_CHUNK_SIZE: u64 = 128;

/// Trailing bytes after the offset table: table length + offset count
pub const FOOTER_SIZE: usize = 8;
