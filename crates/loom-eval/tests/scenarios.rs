//! End-to-end scan -> evaluate scenarios (spec §8 S1-S3, S6-S7; S4-S5 live in
//! `loom-path`'s own tests since they exercise the normalizer, not the
//! evaluator). Placed as a `tests/` integration test, matching the
//! teacher's own `crates/runtime/tests/test_closures.rs` convention of
//! putting cross-module, scenario-level coverage outside the unit-test
//! modules of the crates it spans.

use loom_core::cell::Payload;
use loom_eval::{bootstrap, evaluate, EvalContext};
use loom_runtime::{Interpreter, InterpreterOptions};
use loom_scanner::scan::{scan, ScanOptions};

fn run(source: &str) -> Payload {
    let mut interp = Interpreter::new(InterpreterOptions::default());
    bootstrap(&mut interp);
    let scanned = scan(&mut interp, source, ScanOptions::default()).expect("scan failed");
    let node = match scanned.payload {
        Payload::Series(n) => n,
        _ => panic!("scan did not produce a block"),
    };
    let mut ctx = EvalContext::new(&mut interp);
    evaluate(&mut ctx, node).expect("evaluate failed").payload
}

#[test]
fn s1_scan_then_evaluate_set_word_binds_and_returns() {
    // scan("a: 1 + 2") -> [SET-WORD(a) INTEGER(1) WORD(+) INTEGER(2)];
    // evaluate binds a to 3 and returns 3.
    let mut interp = Interpreter::new(InterpreterOptions::default());
    bootstrap(&mut interp);
    let scanned = scan(&mut interp, "a: 1 + 2", ScanOptions::default()).unwrap();
    let node = match scanned.payload {
        Payload::Series(n) => n,
        _ => panic!("expected a block"),
    };
    let stub = interp.get_stub(node.0).unwrap();
    let cells = stub.content.cells().unwrap();
    assert_eq!(cells.len(), 4);
    assert_eq!(cells[0].heart, loom_core::heart::Heart::SetWord);
    assert_eq!(cells[1].payload, Payload::Integer(1));
    assert_eq!(cells[2].heart, loom_core::heart::Heart::Word);
    assert_eq!(cells[3].payload, Payload::Integer(2));

    let mut ctx = EvalContext::new(&mut interp);
    let result = evaluate(&mut ctx, node).unwrap();
    assert_eq!(result.payload, Payload::Integer(3));
}

#[test]
fn s2_enfix_does_not_let_the_next_operator_steal_the_right_arg() {
    // `1 + 2 * 3` must compute (1 + 2) * 3 = 9, not 1 + (2 * 3) = 7: after
    // `+` fulfills its right argument with a single evaluation unit, the
    // trailing `* 3` is left for the *caller's* enfix-chaining loop, not
    // absorbed into `+`'s own argument fetch.
    assert_eq!(run("1 + 2 * 3"), Payload::Integer(9));
}

#[test]
fn s3_if_else_branches_on_result_cell() {
    assert_eq!(run("if true [10] else [20]"), Payload::Integer(10));
    assert_eq!(run("if false [10] else [20]"), Payload::Integer(20));
}

#[test]
fn s6_refinement_reordering_any_callsite_order() {
    let def = "foo: function [a /b [integer!] /c [integer!]] [reduce [a b c]]\n";

    let elems = run_block(&format!("{def}foo/c/b 10 20 30"));
    assert_eq!(elems, vec![Payload::Integer(10), Payload::Integer(30), Payload::Integer(20)]);

    let elems = run_block(&format!("{def}foo/b 10 20"));
    assert_eq!(elems[0], Payload::Integer(10));
    assert_eq!(elems[1], Payload::Integer(20));
    assert_eq!(elems[2], Payload::Null);
}

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
fn s7_reduce_skips_void_and_predicate_applies_to_each_kept_value() {
    assert_eq!(
        run_block("reduce [1 + 2 10 * 10]"),
        vec![Payload::Integer(3), Payload::Integer(100)]
    );
    assert_eq!(
        run_block("reduce/predicate [1 2 3] :negate"),
        vec![Payload::Integer(-1), Payload::Integer(-2), Payload::Integer(-3)]
    );
}

#[test]
fn s7_reduce_raises_need_non_null_on_a_null_result() {
    use loom_eval::control::EvalError;

    let mut interp = Interpreter::new(InterpreterOptions::default());
    bootstrap(&mut interp);
    let source = "foo: function [a /b [integer!]] [b]\nreduce [foo 1]";
    let scanned = scan(&mut interp, source, ScanOptions::default()).unwrap();
    let node = match scanned.payload {
        Payload::Series(n) => n,
        _ => panic!("expected a block"),
    };
    let mut ctx = EvalContext::new(&mut interp);
    let err = evaluate(&mut ctx, node).unwrap_err();
    match err {
        EvalError::Raised(r) => assert_eq!(r.0.id, loom_core::ErrorId::NeedNonNull),
        other => panic!("expected a Raised need-non-null error, got {other:?}"),
    }
}

#[test]
fn law_reduce_then_compose_preserves_newline_hints_at_group_positions() {
    use loom_core::flags::CellFlags;

    let mut interp = Interpreter::new(InterpreterOptions::default());
    bootstrap(&mut interp);
    let source = "compose [1\n(1 + 1) 3]";
    let scanned = scan(&mut interp, source, ScanOptions::default()).unwrap();
    let node = match scanned.payload {
        Payload::Series(n) => n,
        _ => panic!("expected a block"),
    };
    let mut ctx = EvalContext::new(&mut interp);
    let result = evaluate(&mut ctx, node).unwrap();
    let block_node = match result.payload {
        Payload::Series(n) => n,
        other => panic!("expected a block, got {other:?}"),
    };
    let stub = ctx.interp.get_stub(block_node.0).unwrap();
    let cells = stub.content.cells().unwrap();
    assert_eq!(cells[1].payload, Payload::Integer(2));
    assert!(
        cells[1].flags.contains(CellFlags::NEWLINE_BEFORE),
        "the substituted value should keep the source group's newline-before hint"
    );
}

#[test]
fn unbound_word_raises_not_in_context() {
    use loom_eval::control::EvalError;

    let mut interp = Interpreter::new(InterpreterOptions::default());
    bootstrap(&mut interp);
    let scanned = scan(&mut interp, "this-is-not-bound-anywhere", ScanOptions::default()).unwrap();
    let node = match scanned.payload {
        Payload::Series(n) => n,
        _ => panic!("expected a block"),
    };
    let mut ctx = EvalContext::new(&mut interp);
    let err = evaluate(&mut ctx, node).unwrap_err();
    match err {
        EvalError::Raised(r) => assert_eq!(r.0.id, loom_core::ErrorId::NotInContext),
        other => panic!("expected not-in-context, got {other:?}"),
    }
}

#[test]
fn return_unwinds_to_the_nearest_enclosing_function_call() {
    let source = "foo: function [a] [return a + 1 100]\nfoo 5";
    assert_eq!(run(source), Payload::Integer(6));
}

#[test]
fn law_enfix_deferral_lets_then_attach_to_the_not_to_return() {
    // spec §8 "Laws / Enfix deferral": `return the 1 then [x]` must attach
    // `then` to `the 1`, not hand `return` the bare `1` and strand `then
    // [x]` unevaluated in the feed. `the 1` is truthy, so `then`'s branch
    // runs and its result becomes what `return` unwinds with.
    let source = "foo: function [a] [return the 1 then [a + 100]]\nfoo 5";
    assert_eq!(run(source), Payload::Integer(105));
}
