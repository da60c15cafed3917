//! Chunk Offset Table
//!
//! The offset table maps chunk index to a compressed byte range. It is written
//! once by the encoder at close and parsed once when a store is opened.
//!
//! ## Footer Parsing
//!
//! 1. Read the last 8 bytes: table byte length, offset count (both u32 BE)
//! 2. Step back `table_len + 8` bytes to the start of the table
//! 3. Decode exactly `offset_count` varints, consuming exactly `table_len` bytes
//! 4. Check `offsets[0] == 0`, offsets non-decreasing, and the last offset
//!    equal to the table start (chunks fill the bytes before the table)
//!
//! Any inconsistency rejects the whole store with `Error::MalformedFooter`. A
//! store is never partially opened.
//!
//! ## Counts
//!
//! The footer's count is the number of offsets, `k + 1` for `k` logical
//! chunks. [`ChunkTable::offset_count`] returns that value,
//! [`ChunkTable::chunk_count`] returns `k`.

use std::io::Write;
use std::ops::Range;

use bytes::BufMut;
use chunkstore_core::{varint, Error, Result};

use super::source::ByteSource;
use super::FOOTER_SIZE;

/// Parsed offset table, held for the life of an open store
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkTable {
    offsets: Vec<u64>,
}

impl ChunkTable {
    /// Build a table from cumulative offsets, checking its invariants
    pub fn from_offsets(offsets: Vec<u64>) -> Result<Self> {
        match offsets.first() {
            None => return Err(Error::MalformedFooter("offset table is empty".to_string())),
            Some(&first) if first != 0 => {
                return Err(Error::MalformedFooter(format!(
                    "first offset is {}, expected 0",
                    first
                )))
            }
            Some(_) => {}
        }

        if let Some(i) = offsets.windows(2).position(|w| w[1] < w[0]) {
            return Err(Error::MalformedFooter(format!(
                "offset {} ({}) is below offset {} ({})",
                i + 1,
                offsets[i + 1],
                i,
                offsets[i]
            )));
        }

        Ok(Self { offsets })
    }

    /// Write `offsets` as varints followed by the 8-byte footer.
    ///
    /// Returns the table's byte length (excluding the footer).
    pub fn write_footer(sink: &mut impl Write, offsets: &[u64]) -> Result<u32> {
        let mut table = Vec::with_capacity(offsets.len() * 2 + FOOTER_SIZE);
        for &offset in offsets {
            varint::encode_varint_u64(&mut table, offset);
        }

        let table_len = u32::try_from(table.len()).map_err(|_| {
            Error::InvalidConfig(format!("offset table of {} bytes is too large", table.len()))
        })?;
        let count = u32::try_from(offsets.len()).map_err(|_| {
            Error::InvalidConfig(format!("{} offsets exceed the footer's range", offsets.len()))
        })?;

        table.put_u32(table_len);
        table.put_u32(count);
        sink.write_all(&table)?;

        tracing::debug!(offsets = offsets.len(), table_len, "Wrote chunk offset table");

        Ok(table_len)
    }

    /// Parse the footer at the end of `source`
    pub fn read_footer(source: &dyn ByteSource) -> Result<Self> {
        let len = source.len();
        if len < FOOTER_SIZE as u64 {
            return Err(Error::MalformedFooter(format!(
                "store of {} bytes is shorter than the footer",
                len
            )));
        }

        let footer = source.read(len - FOOTER_SIZE as u64, len)?;
        if footer.len() != FOOTER_SIZE {
            return Err(Error::MalformedFooter("short footer read".to_string()));
        }
        let table_len = u32::from_be_bytes([footer[0], footer[1], footer[2], footer[3]]) as u64;
        let count = u32::from_be_bytes([footer[4], footer[5], footer[6], footer[7]]) as u64;

        if count == 0 {
            return Err(Error::MalformedFooter("offset count is 0".to_string()));
        }
        if table_len + FOOTER_SIZE as u64 > len {
            return Err(Error::MalformedFooter(format!(
                "table of {} bytes doesn't fit in a {} byte store",
                table_len, len
            )));
        }
        // Every varint takes at least one byte
        if count > table_len {
            return Err(Error::MalformedFooter(format!(
                "{} offsets can't fit in {} table bytes",
                count, table_len
            )));
        }

        let table_start = len - FOOTER_SIZE as u64 - table_len;
        let table = source.read(table_start, table_start + table_len)?;

        let mut offsets = Vec::with_capacity(count as usize);
        let mut pos = 0;
        for _ in 0..count {
            let (offset, read) = varint::decode_uvarint(&table[pos..])
                .map_err(|e| Error::MalformedFooter(format!("offset {}: {}", offsets.len(), e)))?;
            offsets.push(offset);
            pos += read;
        }

        if pos as u64 != table_len {
            return Err(Error::MalformedFooter(format!(
                "decoded {} offsets from {} of {} table bytes",
                count, pos, table_len
            )));
        }

        let table = Self::from_offsets(offsets)?;
        if table.data_len() != table_start {
            return Err(Error::MalformedFooter(format!(
                "chunks end at {} but the table starts at {}",
                table.data_len(),
                table_start
            )));
        }

        tracing::debug!(
            offsets = table.offset_count(),
            table_len,
            data_len = table.data_len(),
            "Parsed chunk offset table"
        );

        Ok(table)
    }

    /// Compressed byte range of chunk `index`
    pub fn chunk_range(&self, index: usize) -> Result<Range<u64>> {
        if index + 1 >= self.offsets.len() {
            return Err(Error::ChunkOutOfRange(index));
        }
        Ok(self.offsets[index]..self.offsets[index + 1])
    }

    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Number of offsets (the count stored in the footer)
    pub fn offset_count(&self) -> usize {
        self.offsets.len()
    }

    /// Number of logical chunks
    pub fn chunk_count(&self) -> usize {
        self.offsets.len() - 1
    }

    /// Total compressed chunk bytes
    pub fn data_len(&self) -> u64 {
        self.offsets.last().copied().unwrap_or(0)
    }
}
