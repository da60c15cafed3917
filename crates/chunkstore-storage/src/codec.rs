//! Chunk Codecs
//!
//! Every chunk is compressed on its own, so any chunk can be decompressed
//! without touching its neighbours. The codec is pluggable through
//! [`ChunkCodec`]; the store never looks inside compressed bytes.
//!
//! ## Bundled Codecs
//!
//! | Codec | Level | Used for |
//! |-------|-------|----------|
//! | [`ZstdCodec`] | tunable (default 3) | stored-document chunks |
//! | [`Lz4Codec`] | fixed | the secondary raw store |
//! | [`PassthroughCodec`] | n/a | tests, debugging |
//!
//! ## Buffer Reuse
//!
//! Both directions write into a caller-owned `Vec<u8>`. The encoder keeps one
//! scratch buffer for the lifetime of a build, so steady-state compression does
//! not allocate.
//!
//! ## LZ4 Framing
//!
//! LZ4 blocks don't carry their decompressed size, so `Lz4Codec` prepends it as
//! a 4-byte little-endian integer (the same layout as
//! `lz4_flex::compress_prepend_size`). A decoded length that disagrees with the
//! prefix is reported as corruption.
//!
//! ## Output Bounds
//!
//! Zstd output is capped at [`MAX_CHUNK_BYTES`]. A frame that
//! declares a larger content size, or decodes past its declared size, fails
//! before the output buffer grows past the cap.

use std::io::Read;
use std::sync::Arc;

use chunkstore_core::{CodecKind, Error, Result};

/// Default zstd level for stored-document chunks
pub const DEFAULT_COMPRESSION_LEVEL: i32 = 3;

/// Largest chunk the zstd codec will decompress
pub const MAX_CHUNK_BYTES: u64 = 256 * 1024 * 1024;

/// Compress/decompress a single independent chunk.
pub trait ChunkCodec: Send + Sync {
    /// Stable identifier for this codec.
    fn kind(&self) -> CodecKind;

    /// Compress `src` into `dst`, replacing its contents.
    ///
    /// Codecs without levels ignore `level`.
    fn compress(&self, dst: &mut Vec<u8>, src: &[u8], level: i32) -> Result<()>;

    /// Decompress `src` into `dst`, replacing its contents.
    ///
    /// Must reproduce exactly the bytes given to `compress`, or fail with
    /// [`Error::Decompression`].
    fn decompress(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<()>;
}

/// Build the codec for `kind`
pub fn codec_for(kind: CodecKind) -> Arc<dyn ChunkCodec> {
    match kind {
        CodecKind::None => Arc::new(PassthroughCodec),
        CodecKind::Lz4 => Arc::new(Lz4Codec),
        CodecKind::Zstd => Arc::new(ZstdCodec),
    }
}

/// Zstandard chunk codec.
///
/// Level 1 is fast and larger, 22 slow and smallest.
#[derive(Debug, Clone, Copy, Default)]
pub struct ZstdCodec;

impl ChunkCodec for ZstdCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::Zstd
    }

    fn compress(&self, dst: &mut Vec<u8>, src: &[u8], level: i32) -> Result<()> {
        let bound = zstd::zstd_safe::compress_bound(src.len());
        dst.clear();
        dst.resize(bound, 0);

        let written = zstd::bulk::compress_to_buffer(src, &mut dst[..], level)
            .map_err(|e| Error::Compression(format!("zstd: {}", e)))?;
        dst.truncate(written);
        Ok(())
    }

    fn decompress(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
        decompress_zstd_bounded(dst, src, MAX_CHUNK_BYTES)
    }
}

fn decompress_zstd_bounded(dst: &mut Vec<u8>, src: &[u8], limit: u64) -> Result<()> {
    dst.clear();

    let declared = zstd::zstd_safe::get_frame_content_size(src)
        .map_err(|_| Error::Decompression("zstd: unreadable frame header".to_string()))?;
    if let Some(size) = declared {
        if size > limit {
            return Err(Error::Decompression(format!(
                "zstd: frame declares {} bytes, limit is {}",
                size, limit
            )));
        }
    }
    let cap = declared.unwrap_or(limit);

    // The streaming decoder reports a frame that ends early as an error,
    // which is how a truncated chunk surfaces.
    let decoder = zstd::stream::read::Decoder::with_buffer(src)
        .map_err(|e| Error::Decompression(format!("zstd: {}", e)))?;
    decoder
        .take(cap + 1)
        .read_to_end(dst)
        .map_err(|e| Error::Decompression(format!("zstd: {}", e)))?;

    if dst.len() as u64 > cap {
        dst.clear();
        return Err(Error::Decompression(format!(
            "zstd: frame decodes past {} bytes",
            cap
        )));
    }
    Ok(())
}

/// LZ4 block codec with a size prefix. Fixed mode: `level` is ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct Lz4Codec;

const LZ4_SIZE_PREFIX: usize = 4;

/// An LZ4 block never expands its input by more than this factor.
const LZ4_MAX_RATIO: usize = 255;

impl ChunkCodec for Lz4Codec {
    fn kind(&self) -> CodecKind {
        CodecKind::Lz4
    }

    fn compress(&self, dst: &mut Vec<u8>, src: &[u8], _level: i32) -> Result<()> {
        let size = u32::try_from(src.len())
            .map_err(|_| Error::Compression(format!("lz4: block of {} bytes too large", src.len())))?;

        dst.clear();
        dst.extend_from_slice(&size.to_le_bytes());
        dst.resize(
            LZ4_SIZE_PREFIX + lz4_flex::block::get_maximum_output_size(src.len()),
            0,
        );

        let written = lz4_flex::block::compress_into(src, &mut dst[LZ4_SIZE_PREFIX..])
            .map_err(|e| Error::Compression(format!("lz4: {}", e)))?;
        dst.truncate(LZ4_SIZE_PREFIX + written);
        Ok(())
    }

    fn decompress(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
        if src.len() < LZ4_SIZE_PREFIX {
            return Err(Error::Decompression(format!(
                "lz4: block of {} bytes has no size prefix",
                src.len()
            )));
        }

        let mut prefix = [0u8; LZ4_SIZE_PREFIX];
        prefix.copy_from_slice(&src[..LZ4_SIZE_PREFIX]);
        let expected = u32::from_le_bytes(prefix) as usize;
        let body = src.len() - LZ4_SIZE_PREFIX;
        if expected > body.saturating_mul(LZ4_MAX_RATIO) + 16 {
            return Err(Error::Decompression(format!(
                "lz4: size prefix {} impossible for {} byte block",
                expected, body
            )));
        }

        dst.clear();
        dst.resize(expected, 0);
        let written = lz4_flex::block::decompress_into(&src[LZ4_SIZE_PREFIX..], &mut dst[..])
            .map_err(|e| Error::Decompression(format!("lz4: {}", e)))?;

        if written != expected {
            dst.clear();
            return Err(Error::Decompression(format!(
                "lz4: expected {} bytes, decoded {}",
                expected, written
            )));
        }
        Ok(())
    }
}

/// Identity codec
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl ChunkCodec for PassthroughCodec {
    fn kind(&self) -> CodecKind {
        CodecKind::None
    }

    fn compress(&self, dst: &mut Vec<u8>, src: &[u8], _level: i32) -> Result<()> {
        dst.clear();
        dst.extend_from_slice(src);
        Ok(())
    }

    fn decompress(&self, dst: &mut Vec<u8>, src: &[u8]) -> Result<()> {
        dst.clear();
        dst.extend_from_slice(src);
        Ok(())
    }
}
