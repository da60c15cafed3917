//! `chunkctl get`: fetch documents by number

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use chunkstore_storage::{ChunkDecoder, ChunkStoreConfig, FileSource, StoredAddresses};
use serde::Serialize;
use tabled::Tabled;

use crate::config::address_path;
use crate::format::{display_bytes, Formatter};

#[derive(Debug, Serialize, Tabled)]
struct RecordRow {
    #[tabled(rename = "Doc")]
    doc: u64,
    #[tabled(rename = "Chunk")]
    chunk: usize,
    #[tabled(rename = "Meta")]
    meta: String,
    #[tabled(rename = "Data")]
    data: String,
}

/// Open the store at `store` together with its `.idx` address table
pub fn open_store(store: &Path, config: &ChunkStoreConfig) -> Result<ChunkDecoder> {
    let idx_path = address_path(store);
    let raw = std::fs::read(&idx_path)
        .with_context(|| format!("Failed to read address table {}", idx_path.display()))?;
    let addresses = StoredAddresses::from_bytes(raw.into())
        .with_context(|| format!("Corrupt address table {}", idx_path.display()))?;

    let source = FileSource::open(store)
        .with_context(|| format!("Failed to open store {}", store.display()))?;

    ChunkDecoder::open(Arc::new(source), Arc::new(addresses), config)
        .with_context(|| format!("Failed to open store {}", store.display()))
}

fn fetch(decoder: &ChunkDecoder, docs: &[u64]) -> Result<Vec<RecordRow>> {
    docs.iter()
        .map(|&doc| {
            let record = decoder
                .get_record(doc)
                .with_context(|| format!("Failed to read document {}", doc))?;
            Ok(RecordRow {
                doc,
                chunk: decoder.chunk_for(doc).unwrap_or_default(),
                meta: display_bytes(&record.meta),
                data: display_bytes(&record.data),
            })
        })
        .collect()
}

/// Handle `chunkctl get <store> <doc>...`
pub fn handle_get(
    store: &Path,
    docs: &[u64],
    config: &ChunkStoreConfig,
    formatter: &Formatter,
) -> Result<()> {
    let decoder = open_store(store, config)?;
    let rows = fetch(&decoder, docs)?;

    let stats = decoder.cache_stats();
    tracing::debug!(
        hits = stats.hits,
        misses = stats.misses,
        decompressions = stats.decompressions,
        cached_bytes = stats.cached_bytes,
        "Chunk cache after lookups"
    );

    formatter.print_list(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::pack::pack_documents;
    use std::fs;

    fn write_store(dir: &Path, config: &ChunkStoreConfig) -> std::path::PathBuf {
        let input = (0..10)
            .map(|i| format!("{{\"meta\": \"m{}\", \"data\": \"body {}\"}}\n", i, i))
            .collect::<String>();
        let (_, addresses, store) = pack_documents(input.as_bytes(), Vec::new(), config).unwrap();

        let path = dir.join("docs.store");
        fs::write(&path, store).unwrap();
        fs::write(address_path(&path), addresses.to_bytes()).unwrap();
        path
    }

    #[test]
    fn test_fetch_from_packed_files() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChunkStoreConfig {
            chunk_size: 4,
            ..Default::default()
        };
        let path = write_store(dir.path(), &config);

        let decoder = open_store(&path, &config).unwrap();
        let rows = fetch(&decoder, &[9, 0, 5]).unwrap();

        assert_eq!(rows[0].data, "body 9");
        assert_eq!(rows[0].chunk, 2);
        assert_eq!(rows[1].meta, "m0");
        assert_eq!(rows[2].data, "body 5");
        assert_eq!(rows[2].chunk, 1);
        assert_eq!(decoder.cache_stats().decompressions, 3);
    }

    #[test]
    fn test_missing_document() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChunkStoreConfig::default();
        let path = write_store(dir.path(), &config);

        let decoder = open_store(&path, &config).unwrap();
        let err = fetch(&decoder, &[10]).unwrap_err();
        assert!(err.to_string().contains("document 10"));
    }

    #[test]
    fn test_missing_address_table() {
        let dir = tempfile::tempdir().unwrap();
        let config = ChunkStoreConfig::default();
        let path = write_store(dir.path(), &config);
        fs::remove_file(address_path(&path)).unwrap();

        let err = open_store(&path, &config).unwrap_err();
        assert!(err.to_string().contains("address table"));
    }
}
