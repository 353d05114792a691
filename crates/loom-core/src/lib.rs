//! Loom Core: the memory substrate shared by every other Loom crate.
//!
//! Key design principles (carried from the evaluator's own design notes):
//! - A `Cell` is what the language talks about at the leaf level: a fixed-size,
//!   copyable header-plus-payload record. It never owns a variable-length
//!   payload directly; instead it refers to a pooled `Stub` via a `NodeRef`.
//! - A `Stub` is a pooled series node (the implementation of arrays, strings,
//!   keylists, contexts, and actions). Stubs are owned by a `Pool`, are either
//!   "manual" (must be explicitly freed or promoted) or "managed" (owned by
//!   the garbage collector), and never both.
//! - `error` gives every other crate the one structured, first-class `Error`
//!   value and the `Result`-carrying `Raised` type used for the abrupt-failure
//!   path described in the evaluator's design notes.
//!
//! # Modules
//!
//! - `flags`: `CellFlags` / `SeriesFlags` bit sets
//! - `heart`: the heart-byte enumeration (fundamental value kind)
//! - `quote`: quote-byte arithmetic (quoting, quasi, isotope)
//! - `pool`: pooled stub allocation, manual/managed bookkeeping
//! - `cell`: the `Cell` record and `NodeRef` payload handle
//! - `error`: the structured `Error` value and taxonomy

pub mod cell;
pub mod error;
pub mod flags;
pub mod heart;
pub mod pool;
pub mod quote;

pub use cell::{Cell, NodeRef};
pub use error::{Error, ErrorId, Raised};
pub use flags::{CellFlags, SeriesFlags};
pub use heart::Heart;
pub use pool::{Pool, StubIndex};
pub use quote::{MAX_QUOTE_DEPTH, QuoteByte};
