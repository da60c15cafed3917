//! Chunk Store Metadata and Identifiers
//!
//! This module defines the small enums and metadata structures shared between
//! the writer and reader sides of a chunk store.
//!
//! ## What is a Chunk Store?
//! The stored-document region of a search segment: documents are grouped into
//! chunks of `chunk_size` records, each chunk compressed independently, followed
//! by an offset table that maps chunk index to compressed byte range.
//!
//! ## Codec Types
//! - **None**: No compression (tests, debugging)
//! - **Lz4**: Fixed-mode, fast; used for the secondary raw store
//! - **Zstd**: Level-tunable; used for stored-document chunks (default level 3)
//!
//! ## Framing
//! - **LengthPrefixed**: each record is `[varint metaLen][varint dataLen][meta][data]`
//! - **Raw**: bytes are stored as written; the caller tracks where each line starts
//!
//! ## Example
//! ```ignore
//! let info = ChunkStoreInfo {
//!     codec: CodecKind::Zstd,
//!     framing: Framing::LengthPrefixed,
//!     chunk_size: 128,
//!     record_count: 300,
//!     chunk_count: 4,
//!     compressed_bytes: 18_422,
//!     table_bytes: 7,
//! };
//! ```

use serde::{Deserialize, Serialize};

/// Summary of a finished chunk store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStoreInfo {
    /// Codec the chunks were compressed with
    pub codec: CodecKind,

    /// Record framing inside each chunk
    pub framing: Framing,

    /// Records per chunk
    pub chunk_size: u64,

    /// Records added
    pub record_count: u64,

    /// Length of the offset table (logical chunk count + 1)
    pub chunk_count: u32,

    /// Bytes of compressed chunk data
    pub compressed_bytes: u64,

    /// Bytes of serialized offset table (excluding the 8 trailing count bytes)
    pub table_bytes: u32,
}

impl ChunkStoreInfo {
    /// Total bytes the store occupies in its sink
    pub fn total_bytes(&self) -> u64 {
        self.compressed_bytes + self.table_bytes as u64 + 8
    }
}

/// Compression codec identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[repr(u16)]
pub enum CodecKind {
    None = 0,
    Lz4 = 1,
    #[default]
    Zstd = 2,
}

impl TryFrom<u16> for CodecKind {
    type Error = crate::Error;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(CodecKind::None),
            1 => Ok(CodecKind::Lz4),
            2 => Ok(CodecKind::Zstd),
            _ => Err(crate::Error::InvalidCodec(value)),
        }
    }
}

impl std::str::FromStr for CodecKind {
    type Err = crate::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" => Ok(CodecKind::None),
            "lz4" => Ok(CodecKind::Lz4),
            "zstd" => Ok(CodecKind::Zstd),
            other => Err(crate::Error::InvalidConfig(format!(
                "unknown codec '{}'",
                other
            ))),
        }
    }
}

impl std::fmt::Display for CodecKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            CodecKind::None => "none",
            CodecKind::Lz4 => "lz4",
            CodecKind::Zstd => "zstd",
        };
        f.write_str(name)
    }
}

/// How records are laid out inside a chunk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Framing {
    #[default]
    LengthPrefixed,
    Raw,
}
