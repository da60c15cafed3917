//! Command handlers for chunkctl
//!
//! - Pack: build a store and its address table from JSON lines
//! - Inspect: print the footer and per-chunk byte ranges
//! - Get: fetch documents by number

pub mod get;
pub mod inspect;
pub mod pack;

pub use get::handle_get;
pub use inspect::handle_inspect;
pub use pack::handle_pack;
