//! Document Address Table
//!
//! The chunk store only knows which chunk a document lives in (`doc /
//! chunk_size`). Where the document starts *inside* the decompressed chunk
//! comes from a separate table kept next to the store.
//!
//! ## Stored Layout
//!
//! One big-endian u64 per document, [`ADDRESS_WIDTH`] bytes each, holding the
//! document's byte offset within its decompressed chunk:
//!
//! ```text
//! [doc 0 offset: u64 BE][doc 1 offset: u64 BE]...[doc n-1 offset: u64 BE]
//! ```
//!
//! Document `d` is at bytes `[d * 8, d * 8 + 8)`, so lookups need no index of
//! their own.

use std::io::Write;

use bytes::{Buf, BufMut, Bytes};
use chunkstore_core::{Error, Result};

/// Bytes per stored address
pub const ADDRESS_WIDTH: usize = 8;

/// Maps a document number to its byte offset within its decompressed chunk.
pub trait DocAddressTable: Send + Sync {
    /// Number of documents with an address
    fn doc_count(&self) -> u64;

    /// Intra-chunk byte offset of `doc`.
    ///
    /// Fails with `Error::DocumentNotFound` past `doc_count`.
    fn chunk_offset(&self, doc: u64) -> Result<u64>;
}

/// Records intra-chunk offsets in lockstep with a `ChunkEncoder`.
///
/// Feed it the return value of every `ChunkEncoder::add`.
#[derive(Debug, Clone)]
pub struct DocAddressBuilder {
    chunk_size: u64,
    offset: u64,
    addresses: Vec<u64>,
}

impl DocAddressBuilder {
    pub fn new(chunk_size: u64) -> Result<Self> {
        if chunk_size == 0 {
            return Err(Error::InvalidConfig("chunk_size must be > 0".to_string()));
        }
        Ok(Self {
            chunk_size,
            offset: 0,
            addresses: Vec::new(),
        })
    }

    /// Record the next document, which took `written` bytes in its chunk
    pub fn push(&mut self, written: usize) {
        self.addresses.push(self.offset);
        self.offset += written as u64;

        if self.addresses.len() as u64 % self.chunk_size == 0 {
            self.offset = 0;
        }
    }

    pub fn len(&self) -> usize {
        self.addresses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.addresses.is_empty()
    }

    pub fn finish(self) -> StoredAddresses {
        StoredAddresses {
            addresses: self.addresses,
        }
    }
}

/// A finished address table, held in memory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StoredAddresses {
    addresses: Vec<u64>,
}

impl StoredAddresses {
    pub fn from_offsets(addresses: Vec<u64>) -> Self {
        Self { addresses }
    }

    /// Parse the fixed-width stored layout
    pub fn from_bytes(mut bytes: Bytes) -> Result<Self> {
        if bytes.len() % ADDRESS_WIDTH != 0 {
            return Err(Error::CorruptRecord(format!(
                "address table of {} bytes is not a multiple of {}",
                bytes.len(),
                ADDRESS_WIDTH
            )));
        }

        let mut addresses = Vec::with_capacity(bytes.len() / ADDRESS_WIDTH);
        while bytes.has_remaining() {
            addresses.push(bytes.get_u64());
        }
        Ok(Self { addresses })
    }

    pub fn to_bytes(&self) -> Bytes {
        let mut out = Vec::with_capacity(self.addresses.len() * ADDRESS_WIDTH);
        for &addr in &self.addresses {
            out.put_u64(addr);
        }
        Bytes::from(out)
    }

    pub fn write_to(&self, sink: &mut impl Write) -> Result<()> {
        sink.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn offsets(&self) -> &[u64] {
        &self.addresses
    }
}

impl DocAddressTable for StoredAddresses {
    fn doc_count(&self) -> u64 {
        self.addresses.len() as u64
    }

    fn chunk_offset(&self, doc: u64) -> Result<u64> {
        usize::try_from(doc)
            .ok()
            .and_then(|i| self.addresses.get(i))
            .copied()
            .ok_or(Error::DocumentNotFound(doc))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offsets_reset_every_chunk() {
        let mut builder = DocAddressBuilder::new(3).unwrap();
        for written in [5, 7, 2, 4, 4, 1, 9] {
            builder.push(written);
        }
        let table = builder.finish();

        assert_eq!(table.offsets(), &[0, 5, 12, 0, 4, 8, 0]);
        assert_eq!(table.doc_count(), 7);
        assert_eq!(table.chunk_offset(4).unwrap(), 4);
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(DocAddressBuilder::new(0).is_err());
    }

    #[test]
    fn test_missing_document() {
        let table = StoredAddresses::from_offsets(vec![0, 10]);
        assert!(matches!(table.chunk_offset(2), Err(Error::DocumentNotFound(2))));
        assert!(matches!(
            table.chunk_offset(u64::MAX),
            Err(Error::DocumentNotFound(u64::MAX))
        ));
    }

    #[test]
    fn test_stored_layout_is_big_endian_fixed_width() {
        let table = StoredAddresses::from_offsets(vec![1, 0x0102]);
        let bytes = table.to_bytes();

        assert_eq!(bytes.len(), 2 * ADDRESS_WIDTH);
        assert_eq!(&bytes[..8], &[0, 0, 0, 0, 0, 0, 0, 1]);
        assert_eq!(&bytes[8..], &[0, 0, 0, 0, 0, 0, 1, 2]);
        assert_eq!(StoredAddresses::from_bytes(bytes).unwrap(), table);
    }

    #[test]
    fn test_partial_address_rejected() {
        let err = StoredAddresses::from_bytes(Bytes::from_static(&[0; 12])).unwrap_err();
        assert!(matches!(err, Error::CorruptRecord(_)));
    }

    #[test]
    fn test_write_to() {
        let table = StoredAddresses::from_offsets(vec![0, 3, 0]);
        let mut out = Vec::new();
        table.write_to(&mut out).unwrap();
        assert_eq!(out.len(), 24);
    }
}
