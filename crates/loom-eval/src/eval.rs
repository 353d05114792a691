//! The trampoline's value-producing half: turn one fetched cell, or one
//! whole statement, into a result (spec §4.4, §5).

use crate::control::{raise, EvalResult};
use crate::env::EvalContext;
use crate::feed::Feed;
use crate::frame;
use loom_core::cell::{Cell, NodeRef, Payload, SymbolId, WordBinding};
use loom_core::heart::Heart;
use loom_core::ErrorId;
use loom_runtime::action::ActionDef;

fn word_symbol(cell: &Cell) -> SymbolId {
    match cell.payload {
        Payload::Word { symbol, .. } => symbol,
        _ => unreachable!("word_symbol called on a non-word cell"),
    }
}

fn action_node(cell: &Cell) -> NodeRef {
    match cell.payload {
        Payload::Action(n) => n,
        _ => unreachable!("action_node called on a non-action cell"),
    }
}

fn series_node(cell: &Cell) -> Result<NodeRef, crate::control::EvalError> {
    match cell.payload {
        Payload::Series(n) => Ok(n),
        _ => raise(ErrorId::NotRelated, "expected a series-flavored value"),
    }
}

/// Conditional truthiness (spec's "only false and null are conditionally
/// false" convention, carried from `original_source` since the distilled
/// spec's §4.4 assumes it without restating it).
pub fn is_truthy(cell: &Cell) -> bool {
    !matches!(cell.payload, Payload::Logic(false) | Payload::Null)
}

fn path_segments(ctx: &EvalContext, cell: &Cell) -> Result<Vec<Cell>, crate::control::EvalError> {
    let node = series_node(cell)?;
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "path series has been freed");
    };
    Ok(stub.content.cells().unwrap_or(&[]).to_vec())
}

/// Evaluate exactly one unit starting at the feed's current position:
/// a literal, a set-word assignment (whose right-hand side is a *full*
/// expression), a word/path lookup, or — if the word/path resolves to an
/// action — a complete call. Never chases a further enfix operator past
/// what it fetches (that's `eval_expr`'s job).
pub fn eval_step(ctx: &mut EvalContext, feed: &mut Feed) -> EvalResult {
    let Some(cur) = feed.fetch(ctx.interp) else {
        return Ok(Cell::new(Heart::Void, Payload::Void));
    };
    match cur.heart {
        Heart::SetWord => {
            let sym = word_symbol(&cur);
            let value = eval_expr(ctx, feed)?;
            ctx.bind(sym, value.clone());
            Ok(value)
        }
        Heart::GetWord => {
            let sym = word_symbol(&cur);
            Ok(ctx.lookup(sym).unwrap_or_else(frame::null_cell))
        }
        Heart::Word => {
            let sym = word_symbol(&cur);
            let Some(val) = ctx.lookup(sym) else {
                return raise(
                    ErrorId::NotInContext,
                    format!("{} has no value", ctx.interp.symbols.spelling(sym)),
                );
            };
            if val.heart == Heart::Action {
                frame::call_action(ctx, action_node(&val), Some(sym), Vec::new(), None, feed)
            } else {
                Ok(val)
            }
        }
        Heart::Path => {
            let segs = path_segments(ctx, &cur)?;
            let Some(head) = segs.first() else {
                return raise(ErrorId::BadMake, "empty path");
            };
            let head_sym = word_symbol(head);
            let Some(val) = ctx.lookup(head_sym) else {
                return raise(
                    ErrorId::NotInContext,
                    format!("{} has no value", ctx.interp.symbols.spelling(head_sym)),
                );
            };
            if val.heart != Heart::Action {
                return raise(ErrorId::NotRelated, "path head is not an action");
            }
            let refinements: Vec<SymbolId> = segs[1..].iter().map(word_symbol).collect();
            frame::call_action(ctx, action_node(&val), Some(head_sym), refinements, None, feed)
        }
        Heart::Group => {
            let node = series_node(&cur)?;
            let mut inner = Feed::new(node);
            do_block(ctx, &mut inner)
        }
        _ => Ok(cur),
    }
}

/// Whether the feed's current token is a word bound to an enfixed action,
/// without advancing the cursor. `require_defer` narrows the match to
/// actions with `defers_lookback` set (and not `postpones_entirely`) — the
/// check `frame::fulfill_arg` uses to give a deferring enfix op one hop at
/// an argument's already-fetched value before the calling action's own
/// fulfillment finalizes it (spec §4.4 "Enfix deferral": `return the 1
/// then [x]` must attach `then` to `the 1`, not to `return`).
pub(crate) fn peek_enfix_matching(
    ctx: &EvalContext,
    feed: &Feed,
    require_defer: bool,
) -> Option<(SymbolId, NodeRef, ActionDef)> {
    let cur = feed.current(ctx.interp)?;
    if cur.heart != Heart::Word {
        return None;
    }
    let sym = word_symbol(&cur);
    let val = ctx.lookup(sym)?;
    if val.heart != Heart::Action {
        return None;
    }
    let node = match val.payload {
        Payload::Action(n) => n,
        _ => return None,
    };
    let def = ctx.interp.actions.get(&node.0)?.clone();
    if !def.enfixed {
        return None;
    }
    if require_defer && (!def.defers_lookback || def.postpones_entirely) {
        return None;
    }
    Some((sym, node, def))
}

fn peek_enfix(ctx: &EvalContext, feed: &Feed) -> Option<(SymbolId, NodeRef, ActionDef)> {
    peek_enfix_matching(ctx, feed, false)
}

/// Evaluate a full expression: one unit via [`eval_step`], then keep
/// chaining while the next token is a bound enfix action (spec §4.4
/// "Enfix (infix) discipline"). Each round consumes the enfix word and
/// calls it with `out` as its left operand, so a run of enfix operators
/// associates left-to-right with no precedence climbing — `1 + 2 * 3`
/// computes `(1 + 2) * 3` (spec §8 S2), not `1 + (2 * 3)`.
pub fn eval_expr(ctx: &mut EvalContext, feed: &mut Feed) -> EvalResult {
    if feed.at_end(ctx.interp) {
        return Ok(Cell::new(Heart::Void, Payload::Void));
    }
    let mut out = eval_step(ctx, feed)?;
    while let Some((sym, node, _def)) = peek_enfix(ctx, feed) {
        feed.fetch(ctx.interp); // consume the enfix word itself
        out = frame::call_action(ctx, node, Some(sym), Vec::new(), Some(out), feed)?;
    }
    Ok(out)
}

/// Run every statement in a block, returning the last non-vanishing
/// result (spec §4.4 "Invisible / vanishing": a void result leaves `out`
/// stale rather than overwriting it).
pub fn do_block(ctx: &mut EvalContext, feed: &mut Feed) -> EvalResult {
    let mut out = Cell::new(Heart::Void, Payload::Void);
    while !feed.at_end(ctx.interp) {
        let v = eval_expr(ctx, feed)?;
        if !matches!(v.payload, Payload::Void) {
            out = v;
        }
    }
    Ok(out)
}

/// Evaluate a scanned top-level array (the `evaluate` entry point named
/// throughout spec §8's scenarios).
pub fn evaluate(ctx: &mut EvalContext, array: NodeRef) -> EvalResult {
    let mut feed = Feed::new(array);
    do_block(ctx, &mut feed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_runtime::array::make_array;
    use loom_runtime::{Interpreter, InterpreterOptions};

    fn int(n: i64) -> Cell {
        Cell::new(Heart::Integer, Payload::Integer(n))
    }

    fn array_of(interp: &mut Interpreter, cells: Vec<Cell>) -> NodeRef {
        let node = interp.alloc_stub(make_array(cells, false));
        interp.manage(node);
        node
    }

    #[test]
    fn is_truthy_treats_only_false_and_null_as_falsey() {
        assert!(!is_truthy(&Cell::new(Heart::Logic, Payload::Logic(false))));
        assert!(!is_truthy(&Cell::new(Heart::Blank, Payload::Null)));
        assert!(is_truthy(&Cell::new(Heart::Logic, Payload::Logic(true))));
        assert!(is_truthy(&int(0)));
        assert!(is_truthy(&Cell::new(Heart::Blank, Payload::Blank)));
    }

    #[test]
    fn eval_step_passes_a_literal_through_unevaluated() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let node = array_of(&mut interp, vec![int(7)]);
        let mut ctx = EvalContext::new(&mut interp);
        let mut feed = Feed::new(node);
        let result = eval_step(&mut ctx, &mut feed).unwrap();
        assert_eq!(result.payload, Payload::Integer(7));
    }

    #[test]
    fn do_block_returns_the_last_non_void_result() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let node = array_of(&mut interp, vec![int(1), int(2), int(3)]);
        let mut ctx = EvalContext::new(&mut interp);
        let mut feed = Feed::new(node);
        let result = do_block(&mut ctx, &mut feed).unwrap();
        assert_eq!(result.payload, Payload::Integer(3));
    }

    #[test]
    fn do_block_on_an_empty_array_yields_void() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let node = array_of(&mut interp, vec![]);
        let mut ctx = EvalContext::new(&mut interp);
        let mut feed = Feed::new(node);
        let result = do_block(&mut ctx, &mut feed).unwrap();
        assert!(matches!(result.payload, Payload::Void));
    }

    #[test]
    fn eval_step_evaluates_a_set_word_and_binds_its_value() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let sym = interp.symbols.intern("a");
        let set_word = Cell::new(Heart::SetWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound });
        let node = array_of(&mut interp, vec![set_word, int(9)]);
        let mut ctx = EvalContext::new(&mut interp);
        let mut feed = Feed::new(node);
        let result = eval_step(&mut ctx, &mut feed).unwrap();
        assert_eq!(result.payload, Payload::Integer(9));
        assert_eq!(ctx.lookup(sym).unwrap().payload, Payload::Integer(9));
    }
}
