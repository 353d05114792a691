//! The structured error value and the abrupt-failure path (spec §6, §7).
//!
//! Every raised error is, at the language level, an object-like value with a
//! fixed field set. Internally, fallible operations in every Loom crate
//! return `Result<T, Raised>` — the single `Result`-carrying abrupt path
//! spec §9 asks for. `Raised` is deliberately just a newtype around `Error`
//! rather than a `std::error::Error` impl pulled from `thiserror`: the
//! teacher hand-rolls its runtime error state (`runtime/src/error.rs`)
//! instead of reaching for an error-derive crate, and this follows the same
//! convention, upgraded from a bare `String` to the structured value the
//! language itself can catch and inspect.

use std::fmt;

/// The error taxonomy (spec §7). Each variant names one `id` symbol; the
/// groupings mirror the spec's Syntax/Type-Argument/Range/Access/Control/
/// Resource/User sections.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ErrorId {
    // Syntax (raised by the scanner)
    Missing,
    InvalidChars,
    TooLong,

    // Type / Argument
    ExpectArg,
    NotRelated,
    BadCast,
    IsotopeArg,
    BadVoid,
    AmbiguousInfix,
    EvaluativeQuote,
    LiteralLeftPath,
    BadMake,
    BadParameter,

    // Range
    OutOfRange,
    Overflow,
    QuoteOverflow,
    ZeroDivide,

    // Access
    SeriesHeld,
    SeriesFrozen,
    SeriesProtected,
    SeriesAutoLocked,
    SeriesDataFreed,
    ExpiredFrame,
    NotInContext,
    ProtectedKey,

    // Control
    NoCatchForThrow,
    NeedNonNull,

    // Resource
    NoMemory,
    StackOverflow,

    // User
    UserFail,
}

impl ErrorId {
    /// The symbol this id molds as in an error's `id` field.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorId::Missing => "missing",
            ErrorId::InvalidChars => "invalid-chars",
            ErrorId::TooLong => "too-long",
            ErrorId::ExpectArg => "expect-arg",
            ErrorId::NotRelated => "not-related",
            ErrorId::BadCast => "bad-cast",
            ErrorId::IsotopeArg => "isotope-arg",
            ErrorId::BadVoid => "bad-void",
            ErrorId::AmbiguousInfix => "ambiguous-infix",
            ErrorId::EvaluativeQuote => "evaluative-quote",
            ErrorId::LiteralLeftPath => "literal-left-path",
            ErrorId::BadMake => "bad-make",
            ErrorId::BadParameter => "bad-parameter",
            ErrorId::OutOfRange => "out-of-range",
            ErrorId::Overflow => "overflow",
            ErrorId::QuoteOverflow => "quote-overflow",
            ErrorId::ZeroDivide => "zero-divide",
            ErrorId::SeriesHeld => "series-held",
            ErrorId::SeriesFrozen => "series-frozen",
            ErrorId::SeriesProtected => "series-protected",
            ErrorId::SeriesAutoLocked => "series-auto-locked",
            ErrorId::SeriesDataFreed => "series-data-freed",
            ErrorId::ExpiredFrame => "expired-frame",
            ErrorId::NotInContext => "not-in-context",
            ErrorId::ProtectedKey => "protected-key",
            ErrorId::NoCatchForThrow => "no-catch-for-throw",
            ErrorId::NeedNonNull => "need-non-null",
            ErrorId::NoMemory => "no-memory",
            ErrorId::StackOverflow => "stack-overflow",
            ErrorId::UserFail => "user-fail",
        }
    }
}

impl fmt::Display for ErrorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured, first-class error value (spec §6 "Error shape").
///
/// `arg1..arg3` are free-form interpolation slots; this crate stores them as
/// owned strings rather than `loom_core::Cell` payloads to avoid a circular
/// dependency back on `loom-runtime` (which owns the series/array types a
/// real `arg` cell would need). `loom-runtime::mold` is responsible for
/// rendering an `Error` into the ERROR! context's field layout described in
/// spec §6.
#[derive(Clone, Debug, PartialEq)]
pub struct Error {
    pub id: ErrorId,
    pub message: String,
    pub arg1: Option<String>,
    pub arg2: Option<String>,
    pub arg3: Option<String>,
    /// Source excerpt around the offending position, if known.
    pub near: Option<String>,
    /// Call-stack label chain, innermost first.
    pub where_: Vec<String>,
    pub file: Option<String>,
    pub line: Option<u32>,
}

impl Error {
    pub fn new(id: ErrorId, message: impl Into<String>) -> Error {
        Error {
            id,
            message: message.into(),
            arg1: None,
            arg2: None,
            arg3: None,
            near: None,
            where_: Vec::new(),
            file: None,
            line: None,
        }
    }

    pub fn with_arg1(mut self, arg: impl Into<String>) -> Error {
        self.arg1 = Some(arg.into());
        self
    }

    pub fn with_arg2(mut self, arg: impl Into<String>) -> Error {
        self.arg2 = Some(arg.into());
        self
    }

    pub fn with_arg3(mut self, arg: impl Into<String>) -> Error {
        self.arg3 = Some(arg.into());
        self
    }

    pub fn with_near(mut self, near: impl Into<String>) -> Error {
        self.near = Some(near.into());
        self
    }

    pub fn with_location(mut self, file: impl Into<String>, line: u32) -> Error {
        self.file = Some(file.into());
        self.line = Some(line);
        self
    }

    /// Push a call-stack label onto `where_` as the error unwinds through a
    /// frame (innermost label pushed first, matching the trampoline's own
    /// unwind order).
    pub fn push_where(&mut self, label: impl Into<String>) {
        self.where_.push(label.into());
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "** {}: {}", self.id, self.message)
    }
}

impl std::error::Error for Error {}

/// Wraps an [`Error`] as the `Err` side of the abrupt-failure `Result`.
/// Distinct from the language's *definitional* failures (spec §7,
/// "raised cells" returned as ordinary values) — a `Raised` has already
/// decided to unwind the Rust call stack; a definitional failure is instead
/// represented as an ordinary `Cell`/`Element` with an `Error` heart and
/// handed back through the normal evaluator data path.
#[derive(Clone, Debug, PartialEq)]
pub struct Raised(pub Error);

impl From<Error> for Raised {
    fn from(e: Error) -> Raised {
        Raised(e)
    }
}

impl fmt::Display for Raised {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl std::error::Error for Raised {}

/// Convenience constructor used throughout the other crates:
/// `fail!(ErrorId::Overflow, "integer overflow in +")`.
#[macro_export]
macro_rules! fail {
    ($id:expr, $msg:expr) => {
        return Err($crate::Raised($crate::Error::new($id, $msg)))
    };
    ($id:expr, $msg:expr, $($arg:expr),+ $(,)?) => {{
        let mut e = $crate::Error::new($id, $msg);
        let args = [$($arg.to_string()),+];
        let mut it = args.into_iter();
        if let Some(a) = it.next() { e = e.with_arg1(a); }
        if let Some(a) = it.next() { e = e.with_arg2(a); }
        if let Some(a) = it.next() { e = e.with_arg3(a); }
        return Err($crate::Raised(e));
    }};
}
