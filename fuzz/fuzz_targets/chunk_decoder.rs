#![no_main]

use std::sync::Arc;

use bytes::Bytes;
use chunkstore_storage::{ChunkDecoder, ChunkStoreConfig, CodecKind, StoredAddresses};
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // First byte picks the codec, the next 64 bytes are the address table and
    // the rest is the store. Every lookup must return, never panic.
    let Some((&selector, rest)) = data.split_first() else {
        return;
    };
    let split = rest.len().min(64) / 8 * 8;
    let (addresses, store) = rest.split_at(split);

    let codec = match selector % 3 {
        0 => CodecKind::None,
        1 => CodecKind::Lz4,
        _ => CodecKind::Zstd,
    };
    let config = ChunkStoreConfig {
        codec,
        chunk_size: u64::from(selector % 8) + 1,
        ..Default::default()
    };

    let Ok(addresses) = StoredAddresses::from_bytes(Bytes::copy_from_slice(addresses)) else {
        return;
    };
    let Ok(decoder) = ChunkDecoder::open(
        Arc::new(Bytes::copy_from_slice(store)),
        Arc::new(addresses),
        &config,
    ) else {
        return;
    };

    for doc in 0..decoder.doc_count() + 1 {
        let _ = decoder.get_record(doc);
    }
    for chunk in 0..decoder.chunk_count() {
        let _ = decoder.read_raw(chunk, 0, 16);
    }
});
