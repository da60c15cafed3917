//! Stored Record
//!
//! A `StoredRecord` is one document's `(meta, data)` byte pair. Chunkstore never
//! looks inside either half: meta is typically a field/type header produced by
//! the segment builder, data the serialized field values.
//!
//! ## Framed Layout
//! Inside a decompressed chunk every record is written as
//! ```text
//! [varint metaLen][varint dataLen][meta bytes][data bytes]
//! ```
//!
//! ## Design Decisions
//! - Uses `bytes::Bytes` so records handed out by the decoder are zero-copy
//!   slices of the cached, immutable chunk buffer
//! - `Bytes` is reference counted, so a record view can never outlive the
//!   buffer it points into

use bytes::{BufMut, Bytes};
use serde::{Deserialize, Serialize};

use crate::{varint, Error, Result};

/// A single document's stored bytes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct StoredRecord {
    /// Document metadata (opaque)
    pub meta: Bytes,

    /// Document payload (opaque)
    pub data: Bytes,
}

impl StoredRecord {
    pub fn new(meta: impl Into<Bytes>, data: impl Into<Bytes>) -> Self {
        Self {
            meta: meta.into(),
            data: data.into(),
        }
    }

    /// Size of this record once framed: both length prefixes plus payload
    pub fn framed_len(&self) -> usize {
        framed_len(self.meta.len(), self.data.len())
    }

    /// Append this record's framed form to `buf`
    pub fn encode_framed(&self, buf: &mut impl BufMut) -> usize {
        encode_framed(buf, &self.meta, &self.data)
    }

    /// Decode the framed record starting at byte `at` of a decompressed chunk.
    ///
    /// `meta` and `data` are slices of `chunk`, not copies. Returns the record
    /// and the number of bytes it occupied.
    pub fn decode_framed(chunk: &Bytes, at: usize) -> Result<(Self, usize)> {
        if at >= chunk.len() {
            return Err(Error::CorruptRecord(format!(
                "record at {} starts past the end of a {} byte chunk",
                at,
                chunk.len()
            )));
        }

        let mut pos = at;
        let (meta_len, read) = varint::decode_uvarint(&chunk[pos..])
            .map_err(|e| Error::CorruptRecord(format!("meta length at {}: {}", pos, e)))?;
        pos += read;
        let (data_len, read) = varint::decode_uvarint(&chunk[pos..])
            .map_err(|e| Error::CorruptRecord(format!("data length at {}: {}", pos, e)))?;
        pos += read;

        let remaining = (chunk.len() - pos) as u64;
        if meta_len > remaining || data_len > remaining - meta_len {
            return Err(Error::CorruptRecord(format!(
                "record at {} claims {} + {} bytes, only {} left in chunk",
                at, meta_len, data_len, remaining
            )));
        }

        let meta_end = pos + meta_len as usize;
        let data_end = meta_end + data_len as usize;
        let record = Self {
            meta: chunk.slice(pos..meta_end),
            data: chunk.slice(meta_end..data_end),
        };
        Ok((record, data_end - at))
    }
}

/// Size of a framed record with the given meta and data lengths
pub fn framed_len(meta_len: usize, data_len: usize) -> usize {
    varint::encoded_len(meta_len as u64) + varint::encoded_len(data_len as u64) + meta_len + data_len
}

/// Write `[varint metaLen][varint dataLen][meta][data]` and return the byte count
pub fn encode_framed(buf: &mut impl BufMut, meta: &[u8], data: &[u8]) -> usize {
    varint::encode_varint_u64(buf, meta.len() as u64);
    varint::encode_varint_u64(buf, data.len() as u64);
    buf.put_slice(meta);
    buf.put_slice(data);
    framed_len(meta.len(), data.len())
}
