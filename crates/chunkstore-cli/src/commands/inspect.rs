//! `chunkctl inspect`: print a store's footer and chunk layout

use std::path::Path;

use anyhow::{Context, Result};
use chunkstore_storage::{ByteSource, ChunkTable, FileSource, FOOTER_SIZE};
use serde::Serialize;
use tabled::Tabled;

use crate::format::Formatter;

#[derive(Debug, Serialize, Tabled)]
struct StoreSummary {
    #[tabled(rename = "Store bytes")]
    store_bytes: u64,
    #[tabled(rename = "Chunks")]
    chunks: usize,
    #[tabled(rename = "Offsets")]
    offsets: usize,
    #[tabled(rename = "Chunk bytes")]
    chunk_bytes: u64,
    #[tabled(rename = "Table bytes")]
    table_bytes: u64,
}

#[derive(Debug, Serialize, Tabled)]
struct ChunkRow {
    #[tabled(rename = "Chunk")]
    chunk: usize,
    #[tabled(rename = "Start")]
    start: u64,
    #[tabled(rename = "End")]
    end: u64,
    #[tabled(rename = "Bytes")]
    bytes: u64,
}

#[derive(Debug, Serialize)]
struct InspectReport {
    summary: StoreSummary,
    chunks: Vec<ChunkRow>,
}

fn build_report(source: &dyn ByteSource) -> Result<InspectReport> {
    let table = ChunkTable::read_footer(source)?;

    let chunks = (0..table.chunk_count())
        .map(|chunk| {
            let range = table.chunk_range(chunk)?;
            Ok(ChunkRow {
                chunk,
                start: range.start,
                end: range.end,
                bytes: range.end - range.start,
            })
        })
        .collect::<chunkstore_core::Result<Vec<_>>>()?;

    let summary = StoreSummary {
        store_bytes: source.len(),
        chunks: table.chunk_count(),
        offsets: table.offset_count(),
        chunk_bytes: table.data_len(),
        table_bytes: source.len() - table.data_len() - FOOTER_SIZE as u64,
    };

    Ok(InspectReport { summary, chunks })
}

/// Handle `chunkctl inspect <store>`
pub fn handle_inspect(store: &Path, formatter: &Formatter) -> Result<()> {
    let source =
        FileSource::open(store).with_context(|| format!("Failed to open store {}", store.display()))?;
    let report = build_report(&source)
        .with_context(|| format!("Failed to read footer of {}", store.display()))?;

    if formatter.is_json() {
        return formatter.print_json(&report);
    }

    formatter.print_info(&format!("Store {}", store.display()));
    formatter.print_single(report.summary)?;
    formatter.print_list(report.chunks)?;
    Ok(())
}
