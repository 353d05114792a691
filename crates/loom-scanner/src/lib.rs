//! Loom Scanner: UTF-8 source text to a nested array of cells (spec §4.2).
//!
//! # Modules
//!
//! - `token`: lex-category classification over the first byte of a run
//! - `numbers`: integer/decimal/percent/money parsing
//! - `dates`: date/time/zone parsing
//! - `scan`: the scanner proper — nesting, newline hints, quote/quasi prefixes

pub mod dates;
pub mod numbers;
pub mod scan;
pub mod token;

pub use scan::{scan, ScanOptions};
