//! Native and generic dispatch tables (spec §4.4 DISPATCH, §4.5 core
//! generics).
//!
//! `dispatch` serves `Dispatcher::Native` actions: control flow (`if`,
//! `either`, `while`), the one standard-I/O primitive the core needs to
//! demonstrate an external interface (`write-stdout`, spec §6), `return`,
//! and the `reduce`/`compose` combinators SPEC_FULL §6 adds. `generic_dispatch`
//! serves `Dispatcher::Generic` actions: arithmetic/compare funnel straight
//! into `loom_runtime::generics`; the series-generic verbs (`append`,
//! `pick`, `length?`, `copy`, `find`) are "one helper keyed only by
//! series-ness" per spec §4.5, routed through `loom_runtime::array`.

use crate::control::{raise, EvalError, EvalResult, Throw};
use crate::env::EvalContext;
use crate::feed::Feed;
use loom_core::cell::{Cell, NodeRef, Payload};
use loom_core::heart::Heart;
use loom_core::ErrorId;
use loom_runtime::action::{ActionDef, Dispatcher, Param};
use loom_runtime::{array, generics};

fn series_node(cell: &Cell) -> Result<NodeRef, EvalError> {
    match cell.payload {
        Payload::Series(n) => Ok(n),
        _ => raise(ErrorId::NotRelated, "expected a series-flavored value"),
    }
}

fn block_node(cell: &Cell) -> Result<NodeRef, EvalError> {
    if cell.heart != Heart::Block {
        return raise(ErrorId::NotRelated, "expected a block");
    }
    series_node(cell)
}

/// `Dispatcher::Native` entries (spec §4.4's action-executor built-ins, not
/// keyed by argument type).
pub fn dispatch(ctx: &mut EvalContext, name: &str, args: &[Cell]) -> EvalResult {
    match name {
        "not" => Ok(Cell::new(Heart::Logic, Payload::Logic(!crate::eval::is_truthy(&args[0])))),
        "negate" => negate(&args[0]),
        "if" => native_if(ctx, args),
        "either" => native_either(ctx, args),
        "while" => native_while(ctx, args),
        "then" => native_then(ctx, args),
        "else" => native_else(ctx, args),
        "write-stdout" => native_write_stdout(ctx, &args[0]),
        "return" => native_return(args),
        "the" => Ok(args[0].clone()),
        "reduce" => {
            let predicate = args.get(1).filter(|c| !matches!(c.payload, Payload::Null));
            crate::combinators::reduce(ctx, &args[0], predicate)
        }
        "compose" => crate::combinators::compose(ctx, &args[0]),
        "function" => native_function(ctx, args),
        _ => raise(ErrorId::NotRelated, format!("no such native: {name}")),
    }
}

/// `Dispatcher::Generic` entries (spec §4.5: dispatched by the leading
/// argument's heart, or for arithmetic/compare, by the shared numeric-tower
/// promotion rule).
pub fn generic_dispatch(ctx: &mut EvalContext, verb: &str, args: &[Cell]) -> EvalResult {
    match verb {
        "+" | "-" | "*" | "/" | "**" => {
            generics::arithmetic(verb, &args[0], &args[1]).map_err(EvalError::from)
        }
        "<" | ">" | "<=" | ">=" | "=" | "<>" => {
            let b = generics::compare_verb(verb, &args[0], &args[1])?;
            Ok(Cell::new(Heart::Logic, Payload::Logic(b)))
        }
        "append" => generic_append(ctx, args),
        "pick" => generic_pick(ctx, args),
        "length?" => generic_length(ctx, &args[0]),
        "copy" => generic_copy(ctx, &args[0]),
        "find" => generic_find(ctx, args),
        _ => raise(ErrorId::NotRelated, format!("no such generic: {verb}")),
    }
}

fn negate(cell: &Cell) -> EvalResult {
    match cell.payload {
        Payload::Integer(n) => Ok(Cell::new(Heart::Integer, Payload::Integer(-n))),
        Payload::Decimal(d) => Ok(Cell::new(Heart::Decimal, Payload::Decimal(-d))),
        Payload::Percent(p) => Ok(Cell::new(Heart::Percent, Payload::Percent(-p))),
        _ => raise(ErrorId::NotRelated, "negate requires a number"),
    }
}

fn native_if(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    if crate::eval::is_truthy(&args[0]) {
        let node = block_node(&args[1])?;
        let mut feed = Feed::new(node);
        crate::eval::do_block(ctx, &mut feed)
    } else {
        Ok(crate::frame::null_cell())
    }
}

fn native_either(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let branch = if crate::eval::is_truthy(&args[0]) { &args[1] } else { &args[2] };
    let node = block_node(branch)?;
    let mut feed = Feed::new(node);
    crate::eval::do_block(ctx, &mut feed)
}

fn native_while(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let cond_node = block_node(&args[0])?;
    let body_node = block_node(&args[1])?;
    let mut out = Cell::new(Heart::Void, Payload::Void);
    loop {
        let mut cond_feed = Feed::new(cond_node);
        let cond = crate::eval::do_block(ctx, &mut cond_feed)?;
        if !crate::eval::is_truthy(&cond) {
            break;
        }
        let mut body_feed = Feed::new(body_node);
        let v = crate::eval::do_block(ctx, &mut body_feed)?;
        if !matches!(v.payload, Payload::Void) {
            out = v;
        }
    }
    Ok(out)
}

/// Enfix `then`: runs its block only when the left-hand value is not null
/// (spec §4.4's enfix discipline; the block parameter is ordinary, so
/// unlike a true Ren-C `then` this does not also accept a one-argument
/// action — see `DESIGN.md`).
fn native_then(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    if matches!(args[0].payload, Payload::Null) {
        Ok(args[0].clone())
    } else {
        let node = block_node(&args[1])?;
        let mut feed = Feed::new(node);
        crate::eval::do_block(ctx, &mut feed)
    }
}

/// Enfix `else`: runs its block only when the left-hand value *is* null
/// (spec §8 S3: "`else` is enfix and consumes the result-cell from `if`").
fn native_else(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    if matches!(args[0].payload, Payload::Null) {
        let node = block_node(&args[1])?;
        let mut feed = Feed::new(node);
        crate::eval::do_block(ctx, &mut feed)
    } else {
        Ok(args[0].clone())
    }
}

/// `write-stdout` (spec §6): TEXT, BINARY, or a single-codepoint ISSUE.
/// This is the one standard-I/O primitive the core contracts for; the
/// buffered stdio-module replacement described in spec §6 lives outside
/// the core (`loom-repl`, if it chooses to install one).
fn native_write_stdout(ctx: &mut EvalContext, value: &Cell) -> EvalResult {
    use std::io::Write;
    let text = match (&value.heart, &value.payload) {
        (Heart::Text, Payload::Series(node)) | (Heart::Issue, Payload::Series(node)) => {
            let stub = ctx.interp.get_stub(node.0);
            stub.and_then(|s| s.content.bytes()).map(|b| String::from_utf8_lossy(b).into_owned())
        }
        (Heart::Binary, Payload::Series(node)) => {
            let stub = ctx.interp.get_stub(node.0);
            stub.and_then(|s| s.content.bytes()).map(|b| b.iter().map(|c| *c as char).collect())
        }
        _ => return raise(ErrorId::NotRelated, "write-stdout requires text, binary, or issue"),
    };
    let Some(text) = text else {
        return raise(ErrorId::SeriesDataFreed, "write-stdout argument has been freed");
    };
    let mut stdout = std::io::stdout();
    let _ = stdout.write_all(text.as_bytes());
    Ok(value.clone())
}

/// `return`: throws, labeled by the `return` symbol, to be caught by the
/// nearest enclosing interpreted-action dispatch (spec §4.4 "Throws").
/// A full build gives every call its own unforgeable `RETURN` bound to
/// that specific frame; this crate's tree-walking call stack makes the
/// innermost interpreted dispatch boundary exactly the frame a same-named
/// throw should unwind to, so a shared label symbol is sufficient here —
/// recorded as a simplification in `DESIGN.md`.
fn native_return(args: &[Cell]) -> EvalResult {
    Err(EvalError::Thrown(Throw { label: return_label(), value: args[0].clone() }))
}

pub fn return_label() -> Cell {
    Cell::new(Heart::Blank, Payload::Blank)
}

/// Whether a caught throw is this crate's `return` signal.
pub fn is_return_throw(t: &Throw) -> bool {
    matches!(t.label.payload, Payload::Blank)
}

/// `function spec body`: build a user-defined action (spec §4.4's
/// `Dispatcher::Interpreted`). A plain WORD in the spec block becomes a
/// normal parameter; `/word` (scanned as a two-element PATH headed by
/// BLANK, see `loom-scanner`) becomes a refinement that takes an argument
/// (spec §8 S6's `a /b [integer!] /c [integer!]`). A BLOCK immediately
/// following either is a type annotation; this crate's minimal dispatch
/// table does not typecheck (see `frame::call_action_inner`'s TYPECHECKING
/// comment) so it is only skipped over, never interpreted.
fn native_function(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let spec_node = block_node(&args[0])?;
    let body_node = block_node(&args[1])?;
    let spec_cells: Vec<Cell> = {
        let Some(stub) = ctx.interp.get_stub(spec_node.0) else {
            return raise(ErrorId::SeriesDataFreed, "function spec has been freed");
        };
        stub.content.cells().unwrap_or(&[]).to_vec()
    };
    let params = parse_function_spec(ctx, &spec_cells);
    let def = ActionDef::new(params, Dispatcher::Interpreted { body: body_node });
    Ok(crate::bootstrap::make_action(ctx.interp, def))
}

fn parse_function_spec(ctx: &EvalContext, cells: &[Cell]) -> Vec<Param> {
    let mut out = Vec::new();
    let mut i = 0;
    while i < cells.len() {
        match (&cells[i].heart, &cells[i].payload) {
            (Heart::Word, Payload::Word { symbol, .. }) => {
                out.push(Param::normal(*symbol));
                i += 1;
            }
            (Heart::Path, Payload::Series(node)) => {
                if let Some(sym) = refinement_symbol(ctx, *node) {
                    out.push(Param::refinement(sym, true));
                }
                i += 1;
            }
            _ => {
                i += 1;
                continue;
            }
        }
        if i < cells.len() && cells[i].heart == Heart::Block {
            i += 1; // skip the type-spec block
        }
    }
    out
}

fn refinement_symbol(ctx: &EvalContext, node: NodeRef) -> Option<loom_core::cell::SymbolId> {
    let stub = ctx.interp.get_stub(node.0)?;
    let inner = stub.content.cells()?;
    if inner.len() != 2 {
        return None;
    }
    match inner[1].payload {
        Payload::Word { symbol, .. } => Some(symbol),
        _ => None,
    }
}

fn generic_append(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let node = series_node(&args[0])?;
    let Some(stub) = ctx.interp.get_stub_mut(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    array::append(stub, args[1].clone()).map_err(EvalError::from)?;
    Ok(args[0].clone())
}

fn generic_pick(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let node = series_node(&args[0])?;
    let index = match args[1].payload {
        Payload::Integer(n) => n,
        _ => return raise(ErrorId::NotRelated, "pick requires an integer index"),
    };
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    match array::pick(stub, index).map_err(EvalError::from)? {
        Some(c) => Ok(c),
        None => Ok(crate::frame::null_cell()),
    }
}

fn generic_length(ctx: &mut EvalContext, value: &Cell) -> EvalResult {
    let node = series_node(value)?;
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    Ok(Cell::new(Heart::Integer, Payload::Integer(array::length(stub) as i64)))
}

fn generic_copy(ctx: &mut EvalContext, value: &Cell) -> EvalResult {
    let node = series_node(value)?;
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    let copied = array::copy_shallow(stub).map_err(EvalError::from)?;
    let new_node = ctx.interp.alloc_stub(copied);
    ctx.interp.manage(new_node);
    Ok(Cell::new(value.heart, Payload::Series(new_node)))
}

fn generic_find(ctx: &mut EvalContext, args: &[Cell]) -> EvalResult {
    let node = series_node(&args[0])?;
    let Some(stub) = ctx.interp.get_stub(node.0) else {
        return raise(ErrorId::SeriesDataFreed, "series data has been freed");
    };
    let needle = &args[1];
    let found = array::find(stub, needle, |a, b| generics::compare_strict(a, b) == Some(std::cmp::Ordering::Equal))
        .map_err(EvalError::from)?;
    match found {
        Some(idx) => Ok(Cell::new(Heart::Integer, Payload::Integer(idx as i64 + 1))),
        None => Ok(crate::frame::null_cell()),
    }
}
