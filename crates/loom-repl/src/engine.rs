//! Wires `loom-scanner` -> `loom-eval` -> `loom-runtime::mold` into the one
//! round trip the REPL's read-eval-print loop needs per line (spec §6
//! "Standard I/O" / "Source file format": this is the thin external front
//! end, not part of the core).

use loom_core::cell::Payload;
use loom_eval::control::EvalError;
use loom_eval::{bootstrap, evaluate, EvalContext};
use loom_runtime::mold::MoldOptions;
use loom_runtime::{Interpreter, InterpreterOptions};
use loom_scanner::scan::{scan, ScanOptions};

/// One REPL session's persistent interpreter state. A line-oriented front
/// end keeps evaluating into the same [`Interpreter`] so that a `set-word`
/// on one line is visible on the next, the way the teacher's own `seqr`
/// keeps one stack alive across lines.
pub struct Engine {
    pub interp: Interpreter,
}

impl Engine {
    pub fn new(options: InterpreterOptions) -> Engine {
        let mut interp = Interpreter::new(options);
        bootstrap(&mut interp);
        Engine { interp }
    }

    /// Scan and evaluate one line of source, returning its molded result or
    /// a formatted error message (spec §7 "User-visible behavior": includes
    /// the error id/message; `near`/`where`/`file`/`line` are surfaced when
    /// the error carries them).
    pub fn eval_line(&mut self, source: &str) -> Result<String, String> {
        let scanned = scan(&mut self.interp, source, ScanOptions::default()).map_err(format_raised)?;
        let node = match scanned.payload {
            Payload::Series(n) => n,
            _ => return Err("** internal: scan did not produce a block".to_string()),
        };
        let mut ctx = EvalContext::new(&mut self.interp);
        let result = evaluate(&mut ctx, node).map_err(format_eval_error)?;
        if matches!(result.payload, Payload::Void) {
            return Ok(String::new());
        }
        Ok(self.interp.mold(&result, &MoldOptions::default()))
    }
}

fn format_raised(r: loom_core::Raised) -> String {
    format_error(&r.0)
}

fn format_eval_error(e: EvalError) -> String {
    match e {
        EvalError::Raised(r) => format_error(&r.0),
        EvalError::Thrown(_) => "** no-catch-for-throw: nothing in this line caught that throw".to_string(),
    }
}

fn format_error(err: &loom_core::Error) -> String {
    let mut s = format!("** {}: {}", err.id, err.message);
    if let Some(near) = &err.near {
        s.push_str(&format!(" (near: {near})"));
    }
    if !err.where_.is_empty() {
        s.push_str(&format!(" (where: {})", err.where_.join(" -> ")));
    }
    if let Some(file) = &err.file {
        s.push_str(&format!(" ({file}:{})", err.line.unwrap_or(0)));
    }
    s
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn eval_line_persists_bindings_across_calls() {
        let mut engine = Engine::new(InterpreterOptions::default());
        assert_eq!(engine.eval_line("a: 1 + 2").unwrap(), "3");
        assert_eq!(engine.eval_line("a").unwrap(), "3");
    }

    #[test]
    fn eval_line_reports_unbound_word_as_an_error() {
        let mut engine = Engine::new(InterpreterOptions::default());
        let err = engine.eval_line("totally-unbound-word").unwrap_err();
        assert!(err.contains("not-in-context"), "got: {err}");
    }

    #[test]
    fn eval_line_molds_a_block_result() {
        let mut engine = Engine::new(InterpreterOptions::default());
        let out = engine.eval_line("reduce [1 + 2 10 * 10]").unwrap();
        assert_eq!(out, "[3 100]");
    }
}
