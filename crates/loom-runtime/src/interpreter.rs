//! The `Interpreter`: packages what the source keeps as process-wide globals
//! into one struct (spec §9 design note, SPEC_FULL §5 REDESIGN FLAG).
//!
//! The canon/symbol table, the data stack, the guard stack, the live-frame
//! chain, and the GC ballast all live here as fields rather than `static`s.
//! `loom-eval`'s `evaluate` takes `&mut Interpreter` explicitly.

use crate::action::ActionDef;
use crate::gc::{self, FrameRoots, Roots};
use crate::series::Stub;
use crate::symbol::SymbolTable;
use loom_core::cell::{Cell, NodeRef, SymbolId};
use loom_core::pool::{Pool, StubIndex};
use std::cell::Cell as StdCell;
use std::collections::HashMap;

/// Construction-time knobs (spec SPEC_FULL §4.3: "the interpreter core
/// itself is configured purely through the `Interpreter::new`/
/// `InterpreterOptions` constructor").
#[derive(Copy, Clone, Debug)]
pub struct InterpreterOptions {
    /// Allocations between GC ballast resets (spec §4.1).
    pub ballast: i64,
    /// Initial guard-stack capacity.
    pub guard_stack_capacity: usize,
}

impl Default for InterpreterOptions {
    fn default() -> Self {
        InterpreterOptions { ballast: 10_000, guard_stack_capacity: 64 }
    }
}

/// Single-threaded, cooperative-scheduling interpreter state (spec §5).
/// Diagnostics counters are plain `Cell<u64>`s rather than atomics, per
/// SPEC_FULL §5: there is exactly one evaluator, on one OS thread, ever
/// touching this struct.
pub struct Interpreter {
    pub pool: Pool<Stub>,
    pub symbols: SymbolTable,
    pub data_stack: Vec<Cell>,
    pub guard_stack: Vec<NodeRef>,
    pub globals: Vec<Cell>,

    /// The lib/user context's word bindings, flattened to a map keyed by
    /// symbol rather than a keylist+varlist pair. `loom-eval` binds
    /// top-level set-words here; it is the one context every other
    /// binding (LET/USE overlays, function-local scopes) shadows.
    pub env: HashMap<SymbolId, Cell>,

    /// Out-of-band action metadata, keyed by the details array's stub
    /// index. The archetype array itself is what the GC walks and what
    /// gives an action its identity; `ActionDef` is not `Cell`-storable
    /// (its `Dispatcher::Interpreted` body is an array, but its
    /// `Dispatcher::Generic` arm is a plain Rust enum) so it lives here
    /// instead of packed into array elements.
    pub actions: HashMap<StubIndex, ActionDef>,

    collections_run: StdCell<u64>,
    stubs_allocated: StdCell<u64>,
}

impl Interpreter {
    pub fn new(opts: InterpreterOptions) -> Interpreter {
        Interpreter {
            pool: Pool::new(opts.ballast),
            symbols: SymbolTable::new(),
            data_stack: Vec::new(),
            guard_stack: Vec::with_capacity(opts.guard_stack_capacity),
            globals: Vec::new(),
            env: HashMap::new(),
            actions: HashMap::new(),
            collections_run: StdCell::new(0),
            stubs_allocated: StdCell::new(0),
        }
    }

    /// Allocate a stub, bumping the diagnostics counter and requesting a
    /// recycle at the next safe point if the pool's ballast is exhausted
    /// (spec §4.1 "GC trigger").
    pub fn alloc_stub(&mut self, stub: Stub) -> NodeRef {
        let (idx, exhausted) = self.pool.alloc_stub(stub);
        self.stubs_allocated.set(self.stubs_allocated.get() + 1);
        if exhausted {
            crate::signal::request_recycle();
        }
        NodeRef(idx)
    }

    pub fn manage(&mut self, node: NodeRef) {
        self.pool.manage(node.0);
    }

    /// Guard a node against collection for the duration of a GC-unsafe
    /// region (spec §4.1 "guarded stack"). Caller must pop it back off via
    /// [`Interpreter::unguard`] when the region ends.
    pub fn guard(&mut self, node: NodeRef) {
        self.guard_stack.push(node);
    }

    pub fn unguard(&mut self) -> Option<NodeRef> {
        self.guard_stack.pop()
    }

    /// Run a full mark/sweep pass over every live evaluator frame supplied
    /// by the caller (the evaluator owns the actual frame chain; this
    /// crate only owns the sweep mechanics).
    pub fn collect(&mut self, frames: &[FrameRoots]) -> gc::CollectStats {
        let roots = Roots {
            data_stack: &self.data_stack,
            guard_stack: &self.guard_stack,
            frames,
            globals: &self.globals,
        };
        let stats = gc::collect(&mut self.pool, &roots);
        self.pool.reset_ballast();
        crate::signal::clear_recycle();
        self.collections_run.set(self.collections_run.get() + 1);
        stats
    }

    pub fn collections_run(&self) -> u64 {
        self.collections_run.get()
    }

    pub fn stubs_allocated(&self) -> u64 {
        self.stubs_allocated.get()
    }

    pub fn get_stub(&self, idx: StubIndex) -> Option<&Stub> {
        self.pool.get(idx)
    }

    pub fn get_stub_mut(&mut self, idx: StubIndex) -> Option<&mut Stub> {
        self.pool.get_mut(idx)
    }

    /// Mold a cell using this interpreter's pool and symbol table (spec
    /// §4.3 `mold`).
    pub fn mold(&self, cell: &Cell, opts: &crate::mold::MoldOptions) -> String {
        crate::mold::mold_cell(cell, &self.pool, &self.symbols, opts)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::make_array;

    #[test]
    fn fresh_interpreter_has_empty_stacks() {
        let interp = Interpreter::new(InterpreterOptions::default());
        assert!(interp.data_stack.is_empty());
        assert!(interp.guard_stack.is_empty());
    }

    #[test]
    fn alloc_and_manage_then_collect_sweeps_unreachable() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let node = interp.alloc_stub(make_array(vec![], false));
        interp.manage(node);
        let stats = interp.collect(&[]);
        assert_eq!(stats.swept, 1);
        assert!(interp.get_stub(node.0).is_none());
    }

    #[test]
    fn guarded_node_survives_collection() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let node = interp.alloc_stub(make_array(vec![], false));
        interp.manage(node);
        interp.guard(node);
        let stats = interp.collect(&[]);
        assert_eq!(stats.swept, 0);
        assert!(interp.get_stub(node.0).is_some());
    }

    #[test]
    fn ballast_exhaustion_requests_recycle() {
        let mut interp = Interpreter::new(InterpreterOptions { ballast: 1, guard_stack_capacity: 4 });
        crate::signal::clear_recycle();
        interp.alloc_stub(make_array(vec![], false));
        assert!(crate::signal::recycle_requested());
        crate::signal::clear_recycle();
    }
}
