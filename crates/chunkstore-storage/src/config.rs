//! Chunk Store Configuration
//!
//! This module defines configuration shared by the encoder and decoder.
//!
//! ## ChunkStoreConfig
//!
//! - **chunk_size**: Records per chunk (default: 128). Must be > 0.
//! - **codec**: `zstd`, `lz4` or `none` (default: `zstd`)
//! - **compression_level**: Level passed to the codec (default: 3, ignored by lz4)
//! - **framing**: `length_prefixed` or `raw` (default: `length_prefixed`)
//!
//! Writer and reader must agree on `chunk_size`, `codec` and `framing`; none
//! of them are recorded in the footer.
//!
//! ## Usage
//!
//! ```ignore
//! use chunkstore_storage::ChunkStoreConfig;
//!
//! // Stored-document chunks
//! let config = ChunkStoreConfig::default();
//!
//! // Secondary raw store
//! let config = ChunkStoreConfig {
//!     codec: CodecKind::Lz4,
//!     framing: Framing::Raw,
//!     ..Default::default()
//! };
//!
//! // From TOML
//! let config: ChunkStoreConfig = toml::from_str("chunk_size = 64")?;
//! ```

use chunkstore_core::{CodecKind, Error, Framing, Result};
use serde::{Deserialize, Serialize};

use crate::chunk::DEFAULT_CHUNK_SIZE;
use crate::codec::DEFAULT_COMPRESSION_LEVEL;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChunkStoreConfig {
    /// Records per chunk (default: 128)
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u64,

    /// Chunk codec (default: zstd)
    #[serde(default)]
    pub codec: CodecKind,

    /// Compression level (default: 3)
    #[serde(default = "default_compression_level")]
    pub compression_level: i32,

    /// Record framing inside a chunk (default: length-prefixed)
    #[serde(default)]
    pub framing: Framing,
}

impl Default for ChunkStoreConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            codec: CodecKind::default(),
            compression_level: default_compression_level(),
            framing: Framing::default(),
        }
    }
}

impl ChunkStoreConfig {
    /// Layout of the secondary raw store: lz4, no record framing
    pub fn raw_lz4() -> Self {
        Self {
            codec: CodecKind::Lz4,
            framing: Framing::Raw,
            ..Default::default()
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        Ok(())
    }
}

fn default_chunk_size() -> u64 {
    DEFAULT_CHUNK_SIZE
}

fn default_compression_level() -> i32 {
    DEFAULT_COMPRESSION_LEVEL
}
