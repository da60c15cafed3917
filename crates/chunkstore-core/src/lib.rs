pub mod chunk;
pub mod error;
pub mod record;
pub mod varint;

pub use chunk::{ChunkStoreInfo, CodecKind, Framing};
pub use error::{Error, Result};
pub use record::StoredRecord;
