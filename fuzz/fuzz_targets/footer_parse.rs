#![no_main]

use bytes::Bytes;
use chunkstore_storage::ChunkTable;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    // Arbitrary tails: bad counts, oversized table lengths, truncated or
    // overlong varints, decreasing offsets. None of these may panic.
    let bytes = Bytes::copy_from_slice(data);

    if let Ok(table) = ChunkTable::read_footer(&bytes) {
        assert!(table.data_len() <= bytes.len() as u64);
        for chunk in 0..table.chunk_count() {
            let range = table.chunk_range(chunk).unwrap();
            assert!(range.start <= range.end);
        }
        assert!(table.chunk_range(table.chunk_count()).is_err());
    }
});
