//! Word binding backing store.
//!
//! Spec §3.4 describes binding as a word pointing at a slot in a context's
//! varlist, with module binding walking a per-symbol hitch chain instead.
//! `loom-runtime::context` already implements the varlist/keylist half of
//! that for OBJECT/MODULE/PORT contexts; wiring every top-level word and
//! every function-local variable through a real varlist (plus LET/USE
//! overlay frames over it) is real estate this crate doesn't need in order
//! to make spec §8's S1-S7 scenarios concretely runnable. Instead, binding
//! here is flattened to a scope stack of plain symbol maps: the top of
//! `EvalContext::scopes` stands in for a function's LET/USE overlay, and
//! `Interpreter::env` (searched last) stands in for the lib/user context.
//! This is recorded as a simplification in `DESIGN.md`.

use loom_core::cell::{Cell, SymbolId};
use loom_runtime::Interpreter;
use std::collections::HashMap;

pub struct EvalContext<'a> {
    pub interp: &'a mut Interpreter,
    pub scopes: Vec<HashMap<SymbolId, Cell>>,
    /// Guards against unbounded native recursion standing in for the
    /// spec's "C stack overflow check" (spec §5).
    pub depth: usize,
}

pub const MAX_EVAL_DEPTH: usize = 4_000;

impl<'a> EvalContext<'a> {
    pub fn new(interp: &'a mut Interpreter) -> EvalContext<'a> {
        EvalContext { interp, scopes: Vec::new(), depth: 0 }
    }

    /// Look up a word's value: innermost scope outward, then the global
    /// env.
    pub fn lookup(&self, symbol: SymbolId) -> Option<Cell> {
        for scope in self.scopes.iter().rev() {
            if let Some(c) = scope.get(&symbol) {
                return Some(c.clone());
            }
        }
        self.interp.env.get(&symbol).cloned()
    }

    /// Bind a set-word: into the innermost active scope if one exists
    /// (function-local), else into the global env (top-level).
    pub fn bind(&mut self, symbol: SymbolId, value: Cell) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(symbol, value);
        } else {
            self.interp.env.insert(symbol, value);
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub fn pop_scope(&mut self) {
        self.scopes.pop();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_core::cell::Payload;
    use loom_core::Heart;
    use loom_runtime::{Interpreter, InterpreterOptions};

    #[test]
    fn lookup_falls_back_from_innermost_scope_to_global_env() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let a = interp.symbols.intern("a");
        let b = interp.symbols.intern("b");
        interp.env.insert(a, Cell::new(Heart::Integer, Payload::Integer(1)));

        let mut ctx = EvalContext::new(&mut interp);
        ctx.push_scope();
        ctx.bind(b, Cell::new(Heart::Integer, Payload::Integer(2)));

        assert_eq!(ctx.lookup(a).unwrap().payload, Payload::Integer(1));
        assert_eq!(ctx.lookup(b).unwrap().payload, Payload::Integer(2));
    }

    #[test]
    fn an_inner_scope_binding_shadows_an_outer_one_until_popped() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let a = interp.symbols.intern("a");
        let mut ctx = EvalContext::new(&mut interp);

        ctx.push_scope();
        ctx.bind(a, Cell::new(Heart::Integer, Payload::Integer(1)));
        ctx.push_scope();
        ctx.bind(a, Cell::new(Heart::Integer, Payload::Integer(2)));
        assert_eq!(ctx.lookup(a).unwrap().payload, Payload::Integer(2));

        ctx.pop_scope();
        assert_eq!(ctx.lookup(a).unwrap().payload, Payload::Integer(1));
    }

    #[test]
    fn binding_with_no_active_scope_goes_to_the_global_env() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let a = interp.symbols.intern("a");
        let mut ctx = EvalContext::new(&mut interp);
        ctx.bind(a, Cell::new(Heart::Integer, Payload::Integer(7)));
        assert!(ctx.scopes.is_empty());
        assert_eq!(ctx.interp.env.get(&a).unwrap().payload, Payload::Integer(7));
    }

    #[test]
    fn an_unbound_symbol_looks_up_to_none() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let a = interp.symbols.intern("never-bound");
        let ctx = EvalContext::new(&mut interp);
        assert!(ctx.lookup(a).is_none());
    }
}
