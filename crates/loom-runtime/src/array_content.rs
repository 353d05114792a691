//! The actual payload a [`crate::series::Stub`] carries, independent of its
//! `Flavor` tag. Kept as its own small module so `series.rs` can stay
//! focused on the header/flags bookkeeping.

use crate::series::DynamicCells;
use loom_core::cell::{NodeRef, SymbolId};

/// What a stub's bytes actually are.
#[derive(Debug, Default)]
pub enum Content {
    /// A non-dynamic (small, never-grown) cell array.
    Cells(Vec<loom_core::cell::Cell>),
    /// A dynamic, bias-shiftable cell array (spec §3.2).
    Dynamic(DynamicCells),
    /// UTF-8 text or binary bytes (STRING/BINARY flavors).
    Bytes(Vec<u8>),
    /// A keylist: an array of interned symbol pointers.
    Symbols(Vec<SymbolId>),
    /// A nodelist: raw series-node pointers (API handle list, guard stack
    /// backing store).
    Nodes(Vec<NodeRef>),
    /// Released by [`loom_core::pool::PoolObject::release_payload`]; reads
    /// after this point are the "series data freed" error (spec §3.2).
    #[default]
    Freed,
}

impl Content {
    pub fn len(&self) -> usize {
        match self {
            Content::Cells(v) => v.len(),
            Content::Dynamic(d) => d.used,
            Content::Bytes(v) => v.len(),
            Content::Symbols(v) => v.len(),
            Content::Nodes(v) => v.len(),
            Content::Freed => 0,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn cells(&self) -> Option<&[loom_core::cell::Cell]> {
        match self {
            Content::Cells(v) => Some(v),
            Content::Dynamic(d) => Some(d.as_slice()),
            _ => None,
        }
    }

    pub fn cells_mut(&mut self) -> Option<&mut [loom_core::cell::Cell]> {
        match self {
            Content::Cells(v) => Some(v),
            Content::Dynamic(d) => Some(d.as_mut_slice()),
            _ => None,
        }
    }

    pub fn bytes(&self) -> Option<&[u8]> {
        match self {
            Content::Bytes(v) => Some(v),
            _ => None,
        }
    }
}
