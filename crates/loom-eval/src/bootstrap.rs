//! Registers the built-in actions a fresh [`Interpreter`] needs before any
//! source can run (spec §8's scenarios all assume `+`, `if`, `else`, and
//! friends already exist — nothing in this crate scans or evaluates a
//! "mezzanine" bootstrap block the way a full build would).
//!
//! Every entry here is a details-flavored array of one element (the
//! archetype cell points back at its own stub, spec §3.3) whose `ActionDef`
//! lives in `Interpreter::actions` and whose callable value is bound
//! straight into `Interpreter::env`.

use loom_core::cell::{Cell, Payload, SymbolId};
use loom_core::heart::Heart;
use loom_runtime::action::{ActionDef, Dispatcher, Param};
use loom_runtime::series::{Flavor, Stub};
use loom_runtime::{array_content::Content, Interpreter};

fn intern(interp: &mut Interpreter, name: &str) -> SymbolId {
    interp.symbols.intern(name)
}

/// Allocate the action's details stub, record its `ActionDef`, and return
/// the `Heart::Action` value cell the evaluator's word lookup expects
/// (distinct from `ActionDef::archetype`'s `Heart::Frame` cell, which
/// nothing in this crate constructs since no code asks a running frame for
/// its own archetype back).
pub fn make_action(interp: &mut Interpreter, def: ActionDef) -> Cell {
    let stub = Stub::new(Flavor::Details, Content::Cells(Vec::new()));
    let node = interp.alloc_stub(stub);
    interp.manage(node);
    interp.actions.insert(node.0, def);
    Cell::new(Heart::Action, Payload::Action(node))
}

fn bind(interp: &mut Interpreter, name: &str, action: Cell) {
    let sym = intern(interp, name);
    interp.env.insert(sym, action);
}

fn binary_params(interp: &mut Interpreter) -> Vec<Param> {
    vec![Param::normal(intern(interp, "value1")), Param::normal(intern(interp, "value2"))]
}

fn unary_params(interp: &mut Interpreter) -> Vec<Param> {
    vec![Param::normal(intern(interp, "value"))]
}

/// Populate a fresh interpreter's global environment with every native and
/// generic action spec §8's scenarios exercise.
pub fn bootstrap(interp: &mut Interpreter) {
    for verb in ["+", "-", "*", "/", "**"] {
        let params = binary_params(interp);
        let def = ActionDef::new(params, Dispatcher::Generic(verb)).enfix();
        let action = make_action(interp, def);
        bind(interp, verb, action);
    }
    for verb in ["<", ">", "<=", ">=", "=", "<>"] {
        let params = binary_params(interp);
        let def = ActionDef::new(params, Dispatcher::Generic(verb)).enfix();
        let action = make_action(interp, def);
        bind(interp, verb, action);
    }

    for verb in ["append", "pick", "find"] {
        let params = binary_params(interp);
        let def = ActionDef::new(params, Dispatcher::Generic(verb));
        let action = make_action(interp, def);
        bind(interp, verb, action);
    }
    for verb in ["length?", "copy"] {
        let params = unary_params(interp);
        let def = ActionDef::new(params, Dispatcher::Generic(verb));
        let action = make_action(interp, def);
        bind(interp, verb, action);
    }

    for name in ["not", "negate", "write-stdout", "return", "compose"] {
        let params = unary_params(interp);
        let def = ActionDef::new(params, Dispatcher::Native(name));
        let action = make_action(interp, def);
        bind(interp, name, action);
    }
    {
        let spec = intern(interp, "spec");
        let body = intern(interp, "body");
        let def = ActionDef::new(vec![Param::normal(spec), Param::normal(body)], Dispatcher::Native("function"));
        let action = make_action(interp, def);
        bind(interp, "function", action);
    }

    {
        let cond = intern(interp, "condition");
        let branch = intern(interp, "branch");
        let def = ActionDef::new(vec![Param::normal(cond), Param::normal(branch)], Dispatcher::Native("if"));
        let action = make_action(interp, def);
        bind(interp, "if", action);
    }
    {
        let cond = intern(interp, "condition");
        let t = intern(interp, "true-branch");
        let f = intern(interp, "false-branch");
        let def = ActionDef::new(
            vec![Param::normal(cond), Param::normal(t), Param::normal(f)],
            Dispatcher::Native("either"),
        );
        let action = make_action(interp, def);
        bind(interp, "either", action);
    }
    {
        let cond = intern(interp, "condition");
        let body = intern(interp, "body");
        let def = ActionDef::new(vec![Param::normal(cond), Param::normal(body)], Dispatcher::Native("while"));
        let action = make_action(interp, def);
        bind(interp, "while", action);
    }
    for name in ["then", "else"] {
        let left = intern(interp, "left");
        let branch = intern(interp, "branch");
        // `defers_lookback` (spec §4.4): lets `then`/`else` reach back and
        // claim an argument another call already fetched, e.g. `return the
        // 1 then [x]` attaches to `the 1`, not to `return`.
        let def = ActionDef::new(vec![Param::normal(left), Param::normal(branch)], Dispatcher::Native(name))
            .enfix()
            .defers();
        let action = make_action(interp, def);
        bind(interp, name, action);
    }
    {
        let value = intern(interp, "value");
        let def = ActionDef::new(vec![Param::normal(value)], Dispatcher::Native("the"));
        let action = make_action(interp, def);
        bind(interp, "the", action);
    }
    {
        let block = intern(interp, "block");
        let predicate = intern(interp, "predicate");
        let def = ActionDef::new(
            vec![Param::normal(block), Param::refinement(predicate, true)],
            Dispatcher::Native("reduce"),
        );
        let action = make_action(interp, def);
        bind(interp, "reduce", action);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::EvalContext;
    use crate::eval::evaluate;
    use loom_runtime::InterpreterOptions;
    use loom_scanner::scan::{scan, ScanOptions};

    fn run(source: &str) -> Cell {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        bootstrap(&mut interp);
        let scanned = scan(&mut interp, source, ScanOptions::default()).unwrap();
        let node = match scanned.payload {
            Payload::Series(n) => n,
            _ => panic!("scan did not produce a block"),
        };
        let mut ctx = EvalContext::new(&mut interp);
        evaluate(&mut ctx, node).unwrap()
    }

    /// Same as `run`, but also hands back the block's elements as plain
    /// `Payload`s so the caller doesn't need to keep the interpreter alive
    /// itself just to dereference a `Payload::Series` result.
    fn run_block(source: &str) -> Vec<Payload> {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        bootstrap(&mut interp);
        let scanned = scan(&mut interp, source, ScanOptions::default()).unwrap();
        let node = match scanned.payload {
            Payload::Series(n) => n,
            _ => panic!("scan did not produce a block"),
        };
        let mut ctx = EvalContext::new(&mut interp);
        let result = evaluate(&mut ctx, node).unwrap();
        let block_node = match result.payload {
            Payload::Series(n) => n,
            other => panic!("expected a block, got {other:?}"),
        };
        let stub = ctx.interp.get_stub(block_node.0).unwrap();
        stub.content.cells().unwrap().iter().map(|c| c.payload.clone()).collect()
    }

    #[test]
    fn s1_set_word_then_enfix_plus() {
        let result = run("a: 1 + 2 a");
        assert_eq!(result.payload, Payload::Integer(3));
    }

    #[test]
    fn s2_enfix_precedence_is_left_to_right() {
        let result = run("1 + 2 * 3");
        assert_eq!(result.payload, Payload::Integer(9));
    }

    #[test]
    fn s3_if_else_consumes_null_result() {
        assert_eq!(run("if true [10] else [20]").payload, Payload::Integer(10));
        assert_eq!(run("if false [10] else [20]").payload, Payload::Integer(20));
    }

    #[test]
    fn s6_refinement_reordering() {
        let source = "foo: function [a /b [integer!] /c [integer!]] [a]
             foo/c/b 10 20 30";
        assert_eq!(run(source).payload, Payload::Integer(10));

        let source = "foo: function [a /b [integer!] /c [integer!]] [b]
             foo/c/b 10 20 30";
        assert_eq!(run(source).payload, Payload::Integer(30));

        let source = "foo: function [a /b [integer!] /c [integer!]] [c]
             foo/c/b 10 20 30";
        assert_eq!(run(source).payload, Payload::Integer(20));

        let source = "foo: function [a /b [integer!] /c [integer!]] [b]
             foo/b 10 20";
        assert_eq!(run(source).payload, Payload::Integer(20));

        let source = "foo: function [a /b [integer!] /c [integer!]] [c]
             foo/b 10 20";
        assert_eq!(run(source).payload, Payload::Null);
    }

    #[test]
    fn s7_reduce_skips_void_and_applies_predicate() {
        let elems = run_block("reduce [1 + 2 10 * 10]");
        assert_eq!(elems, vec![Payload::Integer(3), Payload::Integer(100)]);

        let elems = run_block("reduce/predicate [1 2 3] :negate");
        assert_eq!(
            elems,
            vec![Payload::Integer(-1), Payload::Integer(-2), Payload::Integer(-3)]
        );
    }
}
