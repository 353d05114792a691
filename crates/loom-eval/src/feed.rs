//! The feed abstraction (spec §4.4: "a feed exposes a current value, a
//! fetch-next operation that advances, and a reify operation").
//!
//! This crate's arrays are never C-variadic (no FFI varargs source the way
//! `navicore-cem3`'s scheduler reads off a raw pointer), so `reify` has
//! nothing to collapse; the feed is always already backed by a pooled array
//! and `reify` is a no-op kept only so the type matches the spec's shape.

use loom_core::cell::{Cell, NodeRef};
use loom_runtime::Interpreter;

/// An array being walked by the evaluator: the array node and the current
/// cursor.
#[derive(Clone, Debug)]
pub struct Feed {
    pub array: NodeRef,
    pub index: usize,
}

impl Feed {
    pub fn new(array: NodeRef) -> Feed {
        Feed { array, index: 0 }
    }

    fn slice<'a>(&self, interp: &'a Interpreter) -> &'a [Cell] {
        interp
            .get_stub(self.array.0)
            .and_then(|s| s.content.cells())
            .unwrap_or(&[])
    }

    /// The current value without advancing, or `None` at end of feed.
    pub fn current(&self, interp: &Interpreter) -> Option<Cell> {
        self.slice(interp).get(self.index).cloned()
    }

    /// Peek one past the current value, without advancing either cursor.
    pub fn lookahead(&self, interp: &Interpreter) -> Option<Cell> {
        self.slice(interp).get(self.index + 1).cloned()
    }

    pub fn at_end(&self, interp: &Interpreter) -> bool {
        self.index >= self.slice(interp).len()
    }

    /// Fetch-next: return the current value and advance the cursor.
    pub fn fetch(&mut self, interp: &Interpreter) -> Option<Cell> {
        let v = self.current(interp);
        if v.is_some() {
            self.index += 1;
        }
        v
    }

    /// Collapse this feed into an allocated array, starting at the current
    /// cursor. Since every `loom-eval` feed is already array-backed this is
    /// just "the remaining slice", not a real C-variadic reification.
    pub fn reify_rest(&self, interp: &Interpreter) -> Vec<Cell> {
        self.slice(interp)[self.index.min(self.slice(interp).len())..].to_vec()
    }
}
