//! Build a small chunk store on disk, then read documents back through a
//! file-backed decoder.
//!
//! ```bash
//! cargo run -p chunkstore-storage --example write_and_read
//! ```

use std::fs::File;
use std::io::BufWriter;
use std::sync::Arc;

use chunkstore_storage::{
    ChunkDecoder, ChunkEncoder, ChunkStoreConfig, DocAddressBuilder, FileSource,
};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let dir = std::env::temp_dir().join("chunkstore-example");
    std::fs::create_dir_all(&dir)?;
    let path = dir.join("docs.store");

    let config = ChunkStoreConfig {
        chunk_size: 32,
        ..Default::default()
    };

    let mut encoder = ChunkEncoder::new(BufWriter::new(File::create(&path)?), &config)?;
    let mut addresses = DocAddressBuilder::new(config.chunk_size)?;

    for i in 0..1_000u32 {
        let meta = format!("id={}", i);
        let data = format!("{{\"title\":\"document {}\",\"tags\":[\"a\",\"b\"]}}", i);
        addresses.push(encoder.add(meta.as_bytes(), data.as_bytes())?);
    }

    let info = encoder.close()?;
    drop(encoder);

    println!("\n📦 Wrote {}", path.display());
    println!("   Records:      {}", info.record_count);
    println!("   Offsets:      {}", info.chunk_count);
    println!("   Chunk bytes:  {}", info.compressed_bytes);
    println!("   Table bytes:  {}\n", info.table_bytes);

    let decoder = ChunkDecoder::open(
        Arc::new(FileSource::open(&path)?),
        Arc::new(addresses.finish()),
        &config,
    )?;

    for doc in [0u64, 31, 32, 999] {
        let record = decoder.get_record(doc)?;
        println!(
            "doc {:>4}  meta={:<8} data={}",
            doc,
            String::from_utf8_lossy(&record.meta),
            String::from_utf8_lossy(&record.data)
        );
    }

    let stats = decoder.cache_stats();
    println!(
        "\n✅ {} lookups, {} chunks decompressed, {} bytes cached",
        stats.hits + stats.misses,
        stats.decompressions,
        stats.cached_bytes
    );

    Ok(())
}
