//! The evaluator's two abrupt-exit channels (spec §4.4 "Throws", §7
//! "Propagation").
//!
//! `loom-core::Raised` already carries the abrupt-failure path every other
//! crate uses; the evaluator adds a second, structurally distinct channel
//! for a *throw* — a labeled non-local control transfer that unwinds until
//! a frame recognizes its label, rather than until the outermost
//! trampoline. `EvalError` is this crate's own `Result` error type rather
//! than reusing bare `Raised`, precisely because it must carry both.

use loom_core::cell::Cell;
use loom_core::{Error, ErrorId, Raised};

/// A labeled non-local control transfer (spec §4.4: "a cell labeled with a
/// value ... plus a thrown payload"). `label` is typically an action
/// reference (`RETURN`, `UNWIND`) or, for the self-catching `REDO` case,
/// the binding of `REDO` to the currently-running frame.
#[derive(Clone, Debug)]
pub struct Throw {
    pub label: Cell,
    pub value: Cell,
}

#[derive(Clone, Debug)]
pub enum EvalError {
    Raised(Raised),
    Thrown(Throw),
}

impl From<Raised> for EvalError {
    fn from(r: Raised) -> EvalError {
        EvalError::Raised(r)
    }
}

impl From<Error> for EvalError {
    fn from(e: Error) -> EvalError {
        EvalError::Raised(Raised(e))
    }
}

pub type EvalResult = Result<Cell, EvalError>;

/// Build an `EvalError::Raised` from an id and message, the `loom-eval`
/// equivalent of `loom_core::fail!` for a function returning `EvalResult`
/// rather than `Result<T, Raised>`.
pub fn raise<T>(id: ErrorId, msg: impl Into<String>) -> Result<T, EvalError> {
    Err(EvalError::Raised(Raised(Error::new(id, msg))))
}

/// A throw whose label reaches the outermost trampoline with nothing to
/// catch it (spec §7's `no-catch-for-throw`).
pub fn uncaught_throw(t: Throw) -> EvalError {
    EvalError::Raised(Raised(
        Error::new(ErrorId::NoCatchForThrow, "no matching catch for throw").with_arg1(format!("{:?}", t.label)),
    ))
}
