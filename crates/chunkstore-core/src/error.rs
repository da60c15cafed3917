//! Error Types for Chunkstore
//!
//! This module defines all error types that can occur while building or
//! reading a chunked document store.
//!
//! ## Error Categories
//!
//! ### I/O Errors
//! - Sink write failures during a build
//! - Byte source read failures during a lookup
//!
//! ### Data Integrity Errors
//! - `MalformedFooter`: Offset table or trailing counts don't describe the bytes we have
//! - `InvalidVarint`: Truncated or over-long varint
//! - `CorruptRecord`: A record's length prefixes run past the end of its chunk
//! - `Decompression`: Codec rejected a chunk (truncated or corrupt block)
//!
//! ### Lookup Errors
//! - `DocumentNotFound`: Document number maps past the last chunk
//! - `ChunkOutOfRange`: Chunk index is past the offset table
//! - `FramingMismatch`: Record access on a store written without record framing
//!
//! ### Configuration Errors
//! - `InvalidCodec`: Unknown codec id
//! - `InvalidConfig`: e.g. a chunk size of zero
//!
//! ## Usage
//! All functions in chunkstore return `Result<T>` which is aliased to `Result<T, Error>`.
//!
//! ## Example
//! ```ignore
//! use chunkstore_core::{Error, Result};
//!
//! fn open(path: &str) -> Result<Vec<u8>> {
//!     // I/O errors automatically convert via #[from]
//!     let data = std::fs::read(path)?;
//!     if data.len() < 8 {
//!         return Err(Error::MalformedFooter("store shorter than footer".to_string()));
//!     }
//!     Ok(data)
//! }
//! ```

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid codec type: {0}")]
    InvalidCodec(u16),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Compression error: {0}")]
    Compression(String),

    #[error("Decompression error: {0}")]
    Decompression(String),

    #[error("Malformed footer: {0}")]
    MalformedFooter(String),

    #[error("Invalid varint: {0}")]
    InvalidVarint(String),

    #[error("Corrupt record: {0}")]
    CorruptRecord(String),

    #[error("Document not found: {0}")]
    DocumentNotFound(u64),

    #[error("Chunk index out of range: {0}")]
    ChunkOutOfRange(usize),

    #[error("Record access requires length-prefixed framing")]
    FramingMismatch,
}

impl Error {
    /// True for errors that mean the stored bytes themselves are bad, as opposed
    /// to a failed read or a bad argument.
    pub fn is_corruption(&self) -> bool {
        matches!(
            self,
            Error::Decompression(_)
                | Error::MalformedFooter(_)
                | Error::InvalidVarint(_)
                | Error::CorruptRecord(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
