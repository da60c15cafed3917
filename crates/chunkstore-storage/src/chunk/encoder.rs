//! Chunk Encoder - Building the Stored-Document Region
//!
//! `ChunkEncoder` packs document records into fixed-count chunks, compresses
//! each chunk independently, and finishes with the offset table a reader needs
//! for random access.
//!
//! ## What Does ChunkEncoder Do?
//!
//! 1. **Frames records** as `[varint metaLen][varint dataLen][meta][data]`
//! 2. **Counts records** and flushes every `chunk_size` of them
//! 3. **Compresses each chunk** with the configured codec and level
//! 4. **Tracks cumulative compressed offsets**, one per logical chunk
//! 5. **Writes the footer**: offsets as varints, then table length and offset
//!    count as big-endian u32s
//!
//! ## Flush Bookkeeping
//!
//! `flush` always appends the running byte count to the offsets list, even
//! when nothing was buffered. Offsets therefore track logical chunks, and
//! `close` on a store whose record count is an exact multiple of `chunk_size`
//! records a trailing zero-length chunk. The one exception is a store that
//! never received any bytes: `close` skips the final flush and the table is
//! just `[0]`. Bytes written to a raw line that was never ended are still
//! flushed.
//!
//! ## Raw Framing
//!
//! With `Framing::Raw` no length prefixes are written. `add(meta, data)` stores
//! `meta` then `data` as-is; `write` + `new_line` let a caller assemble a line
//! from several pieces before ending it.
//!
//! ## Failure
//!
//! Any sink or codec error is returned immediately. The encoder makes no
//! attempt to recover: the build must be discarded and restarted.
//!
//! ## Thread Safety
//!
//! ChunkEncoder is single-writer. All mutating methods take `&mut self`.

use std::io::Write;
use std::sync::Arc;

use bytes::{BufMut, BytesMut};
use chunkstore_core::{record, ChunkStoreInfo, Error, Framing, Result};
use chunkstore_observability::metrics;

use super::table::ChunkTable;
use crate::codec::{codec_for, ChunkCodec};
use crate::config::ChunkStoreConfig;

/// Builds a chunk store into any `Write` sink
pub struct ChunkEncoder<W: Write> {
    /// Destination for compressed chunks and the footer
    sink: W,

    /// Chunk codec
    codec: Arc<dyn ChunkCodec>,

    /// Level handed to the codec on every flush
    level: i32,

    /// Record layout inside a chunk
    framing: Framing,

    /// Records per chunk
    chunk_size: u64,

    /// Uncompressed bytes of the chunk being built
    buf: BytesMut,

    /// Scratch space for the compressed chunk, reused across flushes
    compressed: Vec<u8>,

    /// Records added so far
    records: u64,

    /// Compressed bytes written to the sink so far
    bytes: u64,

    /// Cumulative compressed offsets, starting at 0
    offsets: Vec<u64>,
}

impl<W: Write> ChunkEncoder<W> {
    /// Create an encoder using the codec named in `config`
    pub fn new(sink: W, config: &ChunkStoreConfig) -> Result<Self> {
        Self::with_codec(sink, codec_for(config.codec), config)
    }

    /// Create an encoder with an explicit codec instance
    pub fn with_codec(sink: W, codec: Arc<dyn ChunkCodec>, config: &ChunkStoreConfig) -> Result<Self> {
        config.validate()?;

        Ok(Self {
            sink,
            codec,
            level: config.compression_level,
            framing: config.framing,
            chunk_size: config.chunk_size,
            buf: BytesMut::new(),
            compressed: Vec::new(),
            records: 0,
            bytes: 0,
            offsets: vec![0],
        })
    }

    /// Add one document and return the number of logical bytes it took.
    ///
    /// The return value is what a [`DocAddressBuilder`](super::DocAddressBuilder)
    /// needs to track intra-chunk offsets in lockstep.
    pub fn add(&mut self, meta: &[u8], data: &[u8]) -> Result<usize> {
        let written = match self.framing {
            Framing::LengthPrefixed => record::encode_framed(&mut self.buf, meta, data),
            Framing::Raw => {
                self.buf.put_slice(meta);
                self.buf.put_slice(data);
                meta.len() + data.len()
            }
        };

        self.new_line()?;
        Ok(written)
    }

    /// Append bytes to the current line of a raw store
    pub fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.framing != Framing::Raw {
            return Err(Error::FramingMismatch);
        }
        self.buf.put_slice(data);
        Ok(data.len())
    }

    /// End the current record, flushing if it completes a chunk
    pub fn new_line(&mut self) -> Result<()> {
        self.records += 1;
        if self.records % self.chunk_size != 0 {
            return Ok(());
        }
        self.flush()
    }

    /// Compress and write the pending chunk, then record its end offset.
    ///
    /// The offset is recorded even when the buffer is empty.
    pub fn flush(&mut self) -> Result<()> {
        if !self.buf.is_empty() {
            self.codec
                .compress(&mut self.compressed, &self.buf, self.level)?;
            self.sink.write_all(&self.compressed)?;

            let written = self.compressed.len() as u64;
            self.bytes += written;

            metrics::CHUNKS_FLUSHED_TOTAL.inc();
            metrics::COMPRESSED_BYTES_TOTAL.inc_by(written);

            tracing::debug!(
                chunk = self.offsets.len() - 1,
                raw_bytes = self.buf.len(),
                compressed_bytes = written,
                codec = %self.codec.kind(),
                "Flushed chunk"
            );

            self.buf.clear();
        }

        self.offsets.push(self.bytes);
        Ok(())
    }

    /// Flush the trailing partial chunk and write the offset table and footer.
    ///
    /// A store that never received a record or a byte has no chunks: its
    /// table is `[0]`.
    pub fn close(&mut self) -> Result<ChunkStoreInfo> {
        if self.records > 0 || !self.buf.is_empty() {
            self.flush()?;
        }

        let chunk_count = u32::try_from(self.offsets.len()).map_err(|_| {
            Error::InvalidConfig(format!("{} chunks exceed the footer's range", self.offsets.len()))
        })?;
        let table_bytes = ChunkTable::write_footer(&mut self.sink, &self.offsets)?;
        self.sink.flush()?;

        tracing::debug!(
            records = self.records,
            chunk_count,
            compressed_bytes = self.bytes,
            table_bytes,
            "Closed chunk store"
        );

        Ok(ChunkStoreInfo {
            codec: self.codec.kind(),
            framing: self.framing,
            chunk_size: self.chunk_size,
            record_count: self.records,
            chunk_count,
            compressed_bytes: self.bytes,
            table_bytes,
        })
    }

    /// Clear all state so the encoder can build another store into the same sink.
    ///
    /// Buffers keep their capacity.
    pub fn reset(&mut self) {
        self.buf.clear();
        self.compressed.clear();
        self.offsets.clear();
        self.offsets.push(0);
        self.records = 0;
        self.bytes = 0;
    }

    /// Reset and swap in a new sink, returning the old one
    pub fn reset_with(&mut self, sink: W) -> W {
        self.reset();
        std::mem::replace(&mut self.sink, sink)
    }

    /// Uncompressed bytes waiting for the next flush
    pub fn buffer_size(&self) -> usize {
        self.buf.len()
    }

    /// Length of the offset table so far (logical chunks + 1)
    pub fn chunk_count(&self) -> usize {
        self.offsets.len()
    }

    /// Cumulative compressed offsets recorded so far
    pub fn offsets(&self) -> &[u64] {
        &self.offsets
    }

    /// Records added so far
    pub fn record_count(&self) -> u64 {
        self.records
    }

    /// Compressed chunk bytes written so far (excludes the footer)
    pub fn compressed_bytes(&self) -> u64 {
        self.bytes
    }

    pub fn framing(&self) -> Framing {
        self.framing
    }

    pub fn get_ref(&self) -> &W {
        &self.sink
    }

    pub fn into_inner(self) -> W {
        self.sink
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunk::FOOTER_SIZE;
    use crate::codec::PassthroughCodec;
    use chunkstore_core::CodecKind;

    fn config(chunk_size: u64) -> ChunkStoreConfig {
        ChunkStoreConfig {
            chunk_size,
            ..Default::default()
        }
    }

    /// Sink that fails every write after the first `allowed` bytes
    struct FailingSink {
        allowed: usize,
        written: Vec<u8>,
    }

    impl Write for FailingSink {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            if self.written.len() + buf.len() > self.allowed {
                return Err(std::io::Error::new(std::io::ErrorKind::Other, "disk full"));
            }
            self.written.extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_add_returns_framed_length() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(128)).unwrap();

        assert_eq!(encoder.add(b"ab", b"xyz").unwrap(), 7);
        assert_eq!(encoder.add(&[], &vec![0u8; 200]).unwrap(), 1 + 2 + 200);
        assert_eq!(encoder.record_count(), 2);
        assert_eq!(encoder.buffer_size(), 7 + 203);
    }

    #[test]
    fn test_flush_at_chunk_boundary() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(4)).unwrap();

        for i in 0..3 {
            encoder.add(b"m", format!("doc-{}", i).as_bytes()).unwrap();
        }
        assert_eq!(encoder.chunk_count(), 1);
        assert!(encoder.buffer_size() > 0);

        encoder.add(b"m", b"doc-3").unwrap();
        assert_eq!(encoder.chunk_count(), 2);
        assert_eq!(encoder.buffer_size(), 0);
        assert!(encoder.compressed_bytes() > 0);
        assert_eq!(encoder.offsets()[1], encoder.compressed_bytes());
    }

    #[test]
    fn test_three_flush_points_for_300_records() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(128)).unwrap();

        let mut flushes = Vec::new();
        for i in 0..300u32 {
            let before = encoder.chunk_count();
            encoder.add(b"meta", &i.to_be_bytes()).unwrap();
            if encoder.chunk_count() != before {
                flushes.push(i + 1);
            }
        }
        encoder.close().unwrap();

        assert_eq!(flushes, vec![128, 256]);
        let offsets = encoder.offsets();
        assert_eq!(offsets.len(), 4);
        assert_eq!(offsets[0], 0);
        assert!(offsets.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_empty_flush_still_records_offset() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(2)).unwrap();
        encoder.add(b"", b"a").unwrap();
        encoder.add(b"", b"b").unwrap();
        assert_eq!(encoder.offsets().len(), 2);

        // Nothing buffered, but the offset list still grows
        encoder.flush().unwrap();
        assert_eq!(encoder.offsets().len(), 3);
        assert_eq!(encoder.offsets()[1], encoder.offsets()[2]);
    }

    #[test]
    fn test_exact_multiple_gets_trailing_empty_chunk() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(2)).unwrap();
        for _ in 0..4 {
            encoder.add(b"", b"x").unwrap();
        }
        let info = encoder.close().unwrap();

        // Two full chunks plus the empty close-time flush
        assert_eq!(info.chunk_count, 4);
        let offsets = encoder.offsets();
        assert_eq!(offsets[2], offsets[3]);
    }

    #[test]
    fn test_empty_store() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(128)).unwrap();
        let info = encoder.close().unwrap();

        assert_eq!(info.chunk_count, 1);
        assert_eq!(encoder.offsets(), &[0]);
        assert_eq!(info.compressed_bytes, 0);
        assert_eq!(info.record_count, 0);

        // One varint (0), then table length 1 and count 1
        assert_eq!(encoder.into_inner(), vec![0, 0, 0, 0, 1, 0, 0, 0, 1]);
    }

    #[test]
    fn test_close_footer_layout() {
        let mut encoder =
            ChunkEncoder::with_codec(Vec::new(), Arc::new(PassthroughCodec), &config(2)).unwrap();
        encoder.add(b"a", b"b").unwrap(); // framed: [1,1,a,b]
        encoder.add(b"", b"").unwrap(); //   framed: [0,0]
        encoder.add(b"", b"c").unwrap(); //  framed: [0,1,c]
        let info = encoder.close().unwrap();
        let out = encoder.into_inner();

        // Chunk 0 = 6 bytes, chunk 1 = 3 bytes, offsets [0, 6, 9]
        assert_eq!(info.compressed_bytes, 9);
        assert_eq!(&out[..6], &[1, 1, b'a', b'b', 0, 0]);
        assert_eq!(&out[6..9], &[0, 1, b'c']);
        assert_eq!(&out[9..12], &[0, 6, 9]);

        let footer = &out[out.len() - FOOTER_SIZE..];
        assert_eq!(u32::from_be_bytes(footer[..4].try_into().unwrap()), 3);
        assert_eq!(u32::from_be_bytes(footer[4..].try_into().unwrap()), 3);
        assert_eq!(out.len() as u64, info.total_bytes());
    }

    #[test]
    fn test_reset_reuses_encoder() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(2)).unwrap();
        encoder.add(b"m", b"first build").unwrap();
        encoder.close().unwrap();
        let first = encoder.reset_with(Vec::new());
        assert!(!first.is_empty());

        assert_eq!(encoder.offsets(), &[0]);
        assert_eq!(encoder.record_count(), 0);
        assert_eq!(encoder.buffer_size(), 0);
        assert_eq!(encoder.compressed_bytes(), 0);

        encoder.add(b"m", b"first build").unwrap();
        encoder.close().unwrap();
        assert_eq!(encoder.into_inner(), first);
    }

    #[test]
    fn test_raw_framing_writes_bytes_verbatim() {
        let config = ChunkStoreConfig {
            codec: CodecKind::None,
            framing: Framing::Raw,
            chunk_size: 2,
            ..Default::default()
        };
        let mut encoder = ChunkEncoder::new(Vec::new(), &config).unwrap();

        assert_eq!(encoder.write(b"col=").unwrap(), 4);
        assert_eq!(encoder.write(b"1").unwrap(), 1);
        encoder.new_line().unwrap();
        assert_eq!(encoder.add(b"col=", b"2").unwrap(), 5);
        encoder.close().unwrap();

        let out = encoder.into_inner();
        assert_eq!(&out[..10], b"col=1col=2");
    }

    #[test]
    fn test_unterminated_raw_line_flushed_on_close() {
        let config = ChunkStoreConfig {
            codec: CodecKind::None,
            framing: Framing::Raw,
            chunk_size: 4,
            ..Default::default()
        };
        let mut encoder = ChunkEncoder::new(Vec::new(), &config).unwrap();

        encoder.write(b"pending-bytes").unwrap();
        let info = encoder.close().unwrap();

        assert_eq!(info.record_count, 0);
        assert_eq!(info.compressed_bytes, 13);
        assert_eq!(info.chunk_count, 2);
        assert_eq!(encoder.offsets(), &[0, 13]);

        let out = encoder.into_inner();
        assert_eq!(&out[..13], b"pending-bytes");
        assert_eq!(out.len() as u64, info.total_bytes());
    }

    #[test]
    fn test_write_rejected_for_framed_store() {
        let mut encoder = ChunkEncoder::new(Vec::new(), &config(2)).unwrap();
        assert!(matches!(encoder.write(b"x"), Err(Error::FramingMismatch)));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        assert!(ChunkEncoder::new(Vec::new(), &config(0)).is_err());
    }

    #[test]
    fn test_sink_failure_propagates() {
        let sink = FailingSink {
            allowed: 0,
            written: Vec::new(),
        };
        let mut encoder = ChunkEncoder::new(sink, &config(1)).unwrap();

        let err = encoder.add(b"meta", b"data").unwrap_err();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_footer_write_failure_propagates() {
        let mut probe = ChunkEncoder::new(Vec::new(), &config(1)).unwrap();
        probe.add(b"meta", b"data").unwrap();
        let chunk_bytes = probe.compressed_bytes() as usize;

        // Room for the chunk but not the table
        let sink = FailingSink {
            allowed: chunk_bytes,
            written: Vec::new(),
        };
        let mut encoder = ChunkEncoder::new(sink, &config(1)).unwrap();
        encoder.add(b"meta", b"data").unwrap();
        assert!(encoder.close().is_err());
    }

    #[test]
    fn test_lz4_codec_store() {
        let config = ChunkStoreConfig {
            codec: CodecKind::Lz4,
            chunk_size: 16,
            ..Default::default()
        };
        let mut encoder = ChunkEncoder::new(Vec::new(), &config).unwrap();
        for i in 0..100 {
            encoder
                .add(b"type=doc", format!("{{\"id\":{},\"body\":\"{}\"}}", i, "x".repeat(64)).as_bytes())
                .unwrap();
        }
        let info = encoder.close().unwrap();
        assert_eq!(info.codec, CodecKind::Lz4);
        assert_eq!(info.chunk_count, 8); // 7 chunks (6 full + 1 partial) + leading 0
    }
}
