//! `reduce` and `compose` (SPEC_FULL §6: "implemented in `loom-eval::combinators`
//! atop the action executor, not the scanner").
//!
//! Both walk a source block and build a fresh one; neither is a primitive
//! the frame trampoline special-cases, they are ordinary natives that call
//! back into [`crate::eval`].

use crate::control::{raise, EvalError, EvalResult};
use crate::env::EvalContext;
use crate::feed::Feed;
use loom_core::cell::{Cell, NodeRef, Payload};
use loom_core::flags::CellFlags;
use loom_core::heart::Heart;
use loom_core::ErrorId;
use loom_runtime::array::make_array;

fn block_node(cell: &Cell) -> Result<NodeRef, EvalError> {
    match (&cell.heart, &cell.payload) {
        (Heart::Block, Payload::Series(n)) => Ok(*n),
        _ => raise(ErrorId::NotRelated, "expected a block"),
    }
}

/// `reduce block`: evaluate every expression in `block` in turn, collecting
/// each result into a new block (spec §6's reduce/compose law:
/// "newline-before hints survive a `reduce`+`compose` round trip"). A void
/// result is skipped outright; a null result raises `need-non-null` rather
/// than being stored, since arrays can only hold storable `Element`s (spec
/// §8 S7, and `loom_core::cell::Element`'s rejection of `Payload::Null`).
/// An optional `/predicate` action is applied to each kept value before it
/// goes in the block, mirroring Ren-C's `reduce:predicate`.
pub fn reduce(ctx: &mut EvalContext, block: &Cell, predicate: Option<&Cell>) -> EvalResult {
    let node = block_node(block)?;
    let mut feed = Feed::new(node);
    let mut out = Vec::new();
    while !feed.at_end(ctx.interp) {
        let newline_before = feed.current(ctx.interp).map(|c| c.flags.contains(CellFlags::NEWLINE_BEFORE)).unwrap_or(false);
        let mut v = crate::eval::eval_expr(ctx, &mut feed)?;
        if matches!(v.payload, Payload::Void) {
            continue;
        }
        if matches!(v.payload, Payload::Null) {
            return raise(ErrorId::NeedNonNull, "reduce encountered a null result");
        }
        if let Some(pred) = predicate {
            v = apply_unary(ctx, pred, v)?;
        }
        if newline_before {
            v.flags.insert(CellFlags::NEWLINE_BEFORE);
        }
        out.push(v);
    }
    let new_node = ctx.interp.alloc_stub(make_array(out, false));
    ctx.interp.manage(new_node);
    Ok(Cell::new(Heart::Block, Payload::Series(new_node)))
}

/// `compose block`: copy `block` verbatim except that each `(group)` is
/// replaced by the result of evaluating its contents, preserving the
/// group's own newline-before hint on the substituted cell.
pub fn compose(ctx: &mut EvalContext, block: &Cell) -> EvalResult {
    let node = block_node(block)?;
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    let source: Vec<Cell> = stub.content.cells().unwrap_or(&[]).to_vec();

    let mut out = Vec::with_capacity(source.len());
    for cell in source {
        if cell.heart == Heart::Group {
            let inner_node = match cell.payload {
                Payload::Series(n) => n,
                _ => return raise(ErrorId::BadMake, "malformed group"),
            };
            let mut inner_feed = Feed::new(inner_node);
            let mut v = crate::eval::do_block(ctx, &mut inner_feed)?;
            if cell.flags.contains(CellFlags::NEWLINE_BEFORE) {
                v.flags.insert(CellFlags::NEWLINE_BEFORE);
            }
            out.push(v);
        } else {
            out.push(cell);
        }
    }
    let new_node = ctx.interp.alloc_stub(make_array(out, false));
    ctx.interp.manage(new_node);
    Ok(Cell::new(Heart::Block, Payload::Series(new_node)))
}

/// Apply a one-argument action to an already-evaluated value. The feed
/// passed to `call_action` is never actually read from: a unary
/// predicate's only parameter is filled from `left_in` before any
/// feed-driven fulfillment would run.
fn apply_unary(ctx: &mut EvalContext, action: &Cell, arg: Cell) -> EvalResult {
    if action.heart != Heart::Action {
        return raise(ErrorId::NotRelated, "reduce:predicate requires an action");
    }
    let node = match action.payload {
        Payload::Action(n) => n,
        _ => return raise(ErrorId::NotRelated, "reduce:predicate requires an action"),
    };
    let mut feed = Feed::new(node);
    crate::frame::call_action(ctx, node, None, Vec::new(), Some(arg), &mut feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_runtime::{Interpreter, InterpreterOptions};

    fn make_block(interp: &mut Interpreter, cells: Vec<Cell>) -> Cell {
        let node = interp.alloc_stub(make_array(cells, false));
        interp.manage(node);
        Cell::new(Heart::Block, Payload::Series(node))
    }

    fn int(n: i64) -> Cell {
        Cell::new(Heart::Integer, Payload::Integer(n))
    }

    #[test]
    fn reduce_skips_void_results_and_keeps_plain_values() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let block = make_block(&mut interp, vec![int(1), int(2), int(3)]);
        let mut ctx = EvalContext::new(&mut interp);
        let result = reduce(&mut ctx, &block, None).unwrap();
        let node = match result.payload {
            Payload::Series(n) => n,
            _ => panic!("expected a block"),
        };
        let cells = ctx.interp.get_stub(node.0).unwrap().content.cells().unwrap().to_vec();
        assert_eq!(cells.len(), 3);
        assert_eq!(cells[0].payload, Payload::Integer(1));
    }

    #[test]
    fn reduce_rejects_a_non_block_argument() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let mut ctx = EvalContext::new(&mut interp);
        let not_a_block = int(5);
        let err = reduce(&mut ctx, &not_a_block, None).unwrap_err();
        match err {
            EvalError::Raised(r) => assert_eq!(r.0.id, loom_core::ErrorId::NotRelated),
            other => panic!("expected Raised, got {other:?}"),
        }
    }

    #[test]
    fn compose_leaves_plain_values_untouched() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let block = make_block(&mut interp, vec![int(1), int(2)]);
        let mut ctx = EvalContext::new(&mut interp);
        let result = compose(&mut ctx, &block).unwrap();
        let node = match result.payload {
            Payload::Series(n) => n,
            _ => panic!("expected a block"),
        };
        let cells = ctx.interp.get_stub(node.0).unwrap().content.cells().unwrap().to_vec();
        assert_eq!(cells, vec![int(1), int(2)]);
    }
}
