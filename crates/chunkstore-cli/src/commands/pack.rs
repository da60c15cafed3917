//! `chunkctl pack`: build a chunk store from JSON lines
//!
//! Each non-empty input line is one document:
//!
//! ```text
//! {"meta": "type=article", "data": "plain text body"}
//! {"data": {"title": "structured", "tags": ["a", "b"]}}
//! ```
//!
//! `meta` defaults to empty. A string `data` is stored as its UTF-8 bytes; any
//! other JSON value is stored as compact JSON.

use std::fs::File;
use std::io::{self, BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use anyhow::{Context, Result};
use chunkstore_core::ChunkStoreInfo;
use chunkstore_storage::{ChunkEncoder, ChunkStoreConfig, DocAddressBuilder, StoredAddresses};
use serde::{Deserialize, Serialize};
use tabled::Tabled;

use crate::config::address_path;
use crate::format::Formatter;

#[derive(Debug, Deserialize)]
struct InputDocument {
    #[serde(default)]
    meta: String,
    data: serde_json::Value,
}

impl InputDocument {
    fn data_bytes(&self) -> Result<Vec<u8>> {
        match &self.data {
            serde_json::Value::String(text) => Ok(text.as_bytes().to_vec()),
            other => Ok(serde_json::to_vec(other)?),
        }
    }
}

#[derive(Debug, Serialize, Tabled)]
struct PackSummary {
    #[tabled(rename = "Store")]
    store: String,
    #[tabled(rename = "Records")]
    records: u64,
    #[tabled(rename = "Offsets")]
    offsets: u32,
    #[tabled(rename = "Codec")]
    codec: String,
    #[tabled(rename = "Chunk bytes")]
    compressed_bytes: u64,
    #[tabled(rename = "Table bytes")]
    table_bytes: u32,
    #[tabled(rename = "Total bytes")]
    total_bytes: u64,
}

/// Encode every document from `reader` into `sink`
pub fn pack_documents<R: BufRead, W: Write>(
    reader: R,
    sink: W,
    config: &ChunkStoreConfig,
) -> Result<(ChunkStoreInfo, StoredAddresses, W)> {
    let mut encoder = ChunkEncoder::new(sink, config)?;
    let mut addresses = DocAddressBuilder::new(config.chunk_size)?;

    for (n, line) in reader.lines().enumerate() {
        let line = line.with_context(|| format!("Failed to read input line {}", n + 1))?;
        if line.trim().is_empty() {
            continue;
        }

        let doc: InputDocument = serde_json::from_str(&line)
            .with_context(|| format!("Invalid document on line {}", n + 1))?;
        let data = doc.data_bytes()?;

        let written = encoder
            .add(doc.meta.as_bytes(), &data)
            .with_context(|| format!("Failed to add document from line {}", n + 1))?;
        addresses.push(written);
    }

    let info = encoder.close().context("Failed to finish store")?;
    Ok((info, addresses.finish(), encoder.into_inner()))
}

/// Handle `chunkctl pack <input> <output>`; `-` reads standard input
pub fn handle_pack(
    input: &Path,
    output: &Path,
    config: &ChunkStoreConfig,
    formatter: &Formatter,
) -> Result<()> {
    let reader: Box<dyn BufRead> = if input == Path::new("-") {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(input)
            .with_context(|| format!("Failed to open input {}", input.display()))?;
        Box::new(BufReader::new(file))
    };

    let file = File::create(output)
        .with_context(|| format!("Failed to create store {}", output.display()))?;
    let (info, addresses, sink) = pack_documents(reader, BufWriter::new(file), config)?;
    sink.into_inner()
        .map_err(|e| e.into_error())
        .and_then(|file| file.sync_all())
        .with_context(|| format!("Failed to sync store {}", output.display()))?;

    let idx_path = address_path(output);
    let mut idx = File::create(&idx_path)
        .with_context(|| format!("Failed to create address table {}", idx_path.display()))?;
    addresses.write_to(&mut idx)?;
    idx.sync_all()?;

    tracing::info!(
        store = %output.display(),
        records = info.record_count,
        chunks = info.chunk_count,
        bytes = info.total_bytes(),
        "Packed store"
    );

    formatter.print_single(PackSummary {
        store: output.display().to_string(),
        records: info.record_count,
        offsets: info.chunk_count,
        codec: info.codec.to_string(),
        compressed_bytes: info.compressed_bytes,
        table_bytes: info.table_bytes,
        total_bytes: info.total_bytes(),
    })?;
    formatter.print_success(&format!("Address table written to {}", idx_path.display()));

    Ok(())
}
