//! # Formats Module
//!
//! Text serialization formats for translation catalogs.
//!
//! File I/O operations are in the app layer; everything here works on
//! in-memory strings.

pub mod ts;

pub use ts::{parse_ts, write_ts};
