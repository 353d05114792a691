//! The tracing garbage collector (spec §4.1).
//!
//! Marks from five root sets — the data stack, the guard stack, the live
//! frame chain, the symbol/canon table's hitch chains, and whatever global
//! root cells the caller supplies — then sweeps every managed stub that
//! wasn't reached. Cycle-breaking reuses a transient `black` coloring bit on
//! each stub (spec §9's design note): a cleaner implementation would use a
//! caller-supplied visited-set instead of mutating the node, but this
//! follows the source's own approach of a coloring bit that every walk
//! (mark, and separately `freeze`) must clear when it's done.

use crate::array_content::Content;
use crate::series::{Flavor, Stub};
use loom_core::cell::{Cell, NodeRef, Payload};
use loom_core::flags::SeriesFlags;
use loom_core::pool::{Pool, StubIndex};

/// Everything the collector needs to mark from, gathered by the caller
/// (normally `Interpreter::collect`) for one recycle pass.
pub struct Roots<'a> {
    pub data_stack: &'a [Cell],
    pub guard_stack: &'a [NodeRef],
    /// One entry per live evaluator frame: its varlist (if an action frame)
    /// and its `out`/`spare` cells.
    pub frames: &'a [FrameRoots],
    pub globals: &'a [Cell],
}

#[derive(Clone, Debug)]
pub struct FrameRoots {
    pub varlist: Option<NodeRef>,
    pub out: Cell,
    pub spare: Cell,
}

/// Result of one collection pass, for logging/testing (spec §4.2's logging
/// ambient-stack requirement: "GC mark/sweep passes... fields for objects
/// swept/retained").
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub struct CollectStats {
    pub marked: usize,
    pub swept: usize,
}

/// Mark every reachable managed stub in `pool`, then sweep (reclaim)
/// whatever managed stub was not reached. Manual (unmanaged) stubs are never
/// swept — they are the caller's responsibility (spec invariant 2).
pub fn collect(pool: &mut Pool<Stub>, roots: &Roots) -> CollectStats {
    let span = tracing::trace_span!("gc_collect");
    let _enter = span.enter();

    let mut stats = CollectStats::default();
    for cell in roots.data_stack {
        mark_cell(pool, cell, &mut stats);
    }
    for node in roots.guard_stack {
        mark_node(pool, *node, &mut stats);
    }
    for frame in roots.frames {
        if let Some(v) = frame.varlist {
            mark_node(pool, v, &mut stats);
        }
        mark_cell(pool, &frame.out, &mut stats);
        mark_cell(pool, &frame.spare, &mut stats);
    }
    for cell in roots.globals {
        mark_cell(pool, cell, &mut stats);
    }

    uncolor_all(pool);

    let to_sweep: Vec<StubIndex> = pool
        .live_indices()
        .filter(|idx| pool.is_managed(*idx))
        .filter(|idx| {
            pool.get(*idx)
                .is_some_and(|s| !s.flags.contains(SeriesFlags::BLACK))
        })
        .collect();
    for idx in to_sweep {
        pool.reclaim(idx);
        stats.swept += 1;
    }

    // Second uncolor pass: stubs kept alive still carry BLACK from the mark
    // walk above; clear it now that sweep has used it to decide liveness.
    uncolor_all(pool);

    tracing::trace!(marked = stats.marked, swept = stats.swept, "gc pass complete");
    stats
}

fn mark_cell(pool: &mut Pool<Stub>, cell: &Cell, stats: &mut CollectStats) {
    if let Some(NodeRef(idx)) = cell.node1() {
        mark_node(pool, NodeRef(idx), stats);
    }
}

fn mark_node(pool: &mut Pool<Stub>, node: NodeRef, stats: &mut CollectStats) {
    let NodeRef(idx) = node;
    let already_black = pool.get(idx).is_some_and(|s| s.flags.contains(SeriesFlags::BLACK));
    if already_black {
        return;
    }
    let Some(stub) = pool.get_mut(idx) else { return };
    stub.flags.insert(SeriesFlags::BLACK);
    stats.marked += 1;

    // Collect child references before recursing, to avoid holding the
    // mutable borrow of `pool` across the recursive call.
    let mut children: Vec<NodeRef> = Vec::new();
    if let Some(cells) = pool.get(idx).and_then(|s| s.content.cells()) {
        for cell in cells {
            if let Some(n) = cell.node1() {
                children.push(n);
            }
        }
    }
    if let Some(stub) = pool.get(idx) {
        if let Some(l) = stub.side.link {
            children.push(l);
        }
        if let Some(m) = stub.side.misc_node {
            children.push(m);
        }
        if let Some(b) = stub.side.bonus {
            children.push(b);
        }
    }
    for child in children {
        mark_node(pool, child, stats);
    }
}

fn uncolor_all(pool: &mut Pool<Stub>) {
    let indices: Vec<StubIndex> = pool.live_indices().collect();
    for idx in indices {
        if let Some(s) = pool.get_mut(idx) {
            s.flags.remove(SeriesFlags::BLACK);
        }
    }
}

/// Deep-freeze `root`, recursively marking every reachable sub-array
/// shallow-frozen and every reachable sub-context deep-frozen (spec
/// invariant 4), reusing the same `black`-coloring cycle-breaker the mark
/// pass uses. Must uncolor on exit (spec §9 design note).
pub fn freeze_deep(pool: &mut Pool<Stub>, root: NodeRef) {
    freeze_walk(pool, root);
    uncolor_all(pool);
}

fn freeze_walk(pool: &mut Pool<Stub>, node: NodeRef) {
    let NodeRef(idx) = node;
    let already_black = pool.get(idx).is_some_and(|s| s.flags.contains(SeriesFlags::BLACK));
    if already_black {
        return;
    }
    let Some(stub) = pool.get_mut(idx) else { return };
    stub.flags.insert(SeriesFlags::BLACK);
    stub.flags.insert(SeriesFlags::FROZEN_SHALLOW);
    stub.flags.insert(SeriesFlags::FROZEN_DEEP);

    let mut children: Vec<NodeRef> = Vec::new();
    if let Some(cells) = pool.get(idx).and_then(|s| s.content.cells()) {
        for cell in cells {
            if let Some(n) = cell.node1() {
                children.push(n);
            }
        }
    }
    for child in children {
        freeze_walk(pool, child);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::array::make_array;
    use loom_core::heart::Heart;

    fn push_array(pool: &mut Pool<Stub>, cells: Vec<Cell>) -> NodeRef {
        let stub = make_array(cells, false);
        let (idx, _) = pool.alloc_stub(stub);
        pool.manage(idx);
        NodeRef(idx)
    }

    #[test]
    fn unreachable_managed_stub_is_swept() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let _unreachable = push_array(&mut pool, vec![Cell::fresh()]);
        let roots = Roots { data_stack: &[], guard_stack: &[], frames: &[], globals: &[] };
        let stats = collect(&mut pool, &roots);
        assert_eq!(stats.swept, 1);
    }

    #[test]
    fn reachable_via_data_stack_survives() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let node = push_array(&mut pool, vec![Cell::fresh()]);
        let cell = Cell::new(Heart::Block, Payload::Series(node));
        let roots = Roots { data_stack: &[cell], guard_stack: &[], frames: &[], globals: &[] };
        let stats = collect(&mut pool, &roots);
        assert_eq!(stats.swept, 0);
        assert!(pool.get(node.0).is_some());
    }

    #[test]
    fn nested_arrays_mark_transitively() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let inner = push_array(&mut pool, vec![Cell::fresh()]);
        let inner_cell = Cell::new(Heart::Block, Payload::Series(inner));
        let outer = push_array(&mut pool, vec![inner_cell]);
        let outer_cell = Cell::new(Heart::Block, Payload::Series(outer));
        let roots = Roots { data_stack: &[outer_cell], guard_stack: &[], frames: &[], globals: &[] };
        let stats = collect(&mut pool, &roots);
        assert_eq!(stats.swept, 0);
        assert!(pool.get(inner.0).is_some());
    }

    #[test]
    fn coloring_bit_is_cleared_after_collection() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let node = push_array(&mut pool, vec![Cell::fresh()]);
        let cell = Cell::new(Heart::Block, Payload::Series(node));
        let roots = Roots { data_stack: &[cell], guard_stack: &[], frames: &[], globals: &[] };
        collect(&mut pool, &roots);
        assert!(!pool.get(node.0).unwrap().flags.contains(SeriesFlags::BLACK));
    }

    #[test]
    fn manual_unmanaged_stub_is_never_swept() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let stub = make_array(vec![Cell::fresh()], false);
        let (idx, _) = pool.alloc_stub(stub); // left manual, not managed
        let roots = Roots { data_stack: &[], guard_stack: &[], frames: &[], globals: &[] };
        collect(&mut pool, &roots);
        assert!(pool.get(idx).is_some());
    }

    #[test]
    fn freeze_deep_propagates_to_reachable_sub_array() {
        let mut pool: Pool<Stub> = Pool::new(1000);
        let inner = push_array(&mut pool, vec![Cell::fresh()]);
        let inner_cell = Cell::new(Heart::Block, Payload::Series(inner));
        let outer = push_array(&mut pool, vec![inner_cell]);
        freeze_deep(&mut pool, outer);
        assert!(pool.get(inner.0).unwrap().flags.contains(SeriesFlags::FROZEN_SHALLOW));
        assert!(!pool.get(inner.0).unwrap().flags.contains(SeriesFlags::BLACK));
    }
}
