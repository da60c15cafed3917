//! Configuration management for chunkctl
//!
//! Store settings come from three places, later ones winning:
//! 1. Built-in defaults (`ChunkStoreConfig::default()`)
//! 2. A TOML file given with `--config`
//! 3. Individual flags (`--codec`, `--level`, `--chunk-size`)
//!
//! Writer and reader must agree on these settings, so `get` accepts the same
//! flags as `pack`.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chunkstore_core::CodecKind;
use chunkstore_storage::ChunkStoreConfig;
use clap::Args;

/// Flags shared by every subcommand that touches a store
#[derive(Debug, Clone, Default, Args)]
pub struct StoreOptions {
    /// TOML file with store settings
    #[arg(long, global = true, env = "CHUNKSTORE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Chunk codec: zstd, lz4 or none
    #[arg(long, global = true)]
    pub codec: Option<CodecKind>,

    /// Compression level handed to the codec
    #[arg(long, global = true, allow_negative_numbers = true)]
    pub level: Option<i32>,

    /// Records per chunk
    #[arg(long, global = true)]
    pub chunk_size: Option<u64>,

    /// Store lines without record framing
    #[arg(long, global = true)]
    pub raw: bool,
}

impl StoreOptions {
    /// Merge defaults, the config file and flags into one validated config
    pub fn resolve(&self) -> Result<ChunkStoreConfig> {
        let mut config = match &self.config {
            Some(path) => load_config(path)?,
            None => ChunkStoreConfig::default(),
        };

        if let Some(codec) = self.codec {
            config.codec = codec;
        }
        if let Some(level) = self.level {
            config.compression_level = level;
        }
        if let Some(chunk_size) = self.chunk_size {
            config.chunk_size = chunk_size;
        }
        if self.raw {
            config.framing = chunkstore_core::Framing::Raw;
        }

        config.validate().context("Invalid store configuration")?;
        Ok(config)
    }
}

/// Load store settings from a TOML file
pub fn load_config(path: &Path) -> Result<ChunkStoreConfig> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config {}", path.display()))?;
    let config: ChunkStoreConfig = toml::from_str(&contents)
        .with_context(|| format!("Failed to parse config {}", path.display()))?;
    Ok(config)
}

/// Path of the document-address table written next to `store`
pub fn address_path(store: &Path) -> PathBuf {
    let mut name = store.as_os_str().to_os_string();
    name.push(".idx");
    PathBuf::from(name)
}
