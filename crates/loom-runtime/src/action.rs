//! Action: a details-flavored array whose element 0 is the action
//! archetype and whose remaining elements are the dispatcher's private data
//! (spec §3.3).
//!
//! The evaluator (`loom-eval`) owns frame fulfillment and dispatch; this
//! module owns the *shape* an action takes once built: its parameter list
//! (with quoting class, refinement-ness, variadic-ness — spec §4.4) and its
//! dispatcher (native Rust closure, interpreted body block, or a generic
//! keyed by leading-argument heart — spec §4.5).

use loom_core::cell::{Cell, NodeRef};
use loom_core::heart::Heart;

/// How a parameter pulls its argument from the feed (spec §4.4, "Quoting
/// parameter classes").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ParamClass {
    Normal,
    Meta,
    Hard,
    Soft,
    Medium,
}

/// One declared parameter.
#[derive(Clone, Debug, PartialEq)]
pub struct Param {
    pub symbol: loom_core::cell::SymbolId,
    pub class: ParamClass,
    /// `/refinement` parameter: optional, defaults to `null`, does not
    /// itself carry a value (a following normal parameter, if any, does).
    pub is_refinement: bool,
    /// A refinement that takes no following argument receives `#`
    /// ("blackhole") when used (spec §4.4).
    pub refinement_takes_arg: bool,
    /// Variadic parameter: receives a VARARGS handle rather than a value.
    pub is_variadic: bool,
    /// The `return`/`unwind` pseudo-parameter: fulfillment skips it (spec
    /// §4.4's FULFILLING_ARGS table, "return slot → none").
    pub is_return: bool,
}

impl Param {
    pub fn normal(symbol: loom_core::cell::SymbolId) -> Param {
        Param {
            symbol,
            class: ParamClass::Normal,
            is_refinement: false,
            refinement_takes_arg: false,
            is_variadic: false,
            is_return: false,
        }
    }

    pub fn refinement(symbol: loom_core::cell::SymbolId, takes_arg: bool) -> Param {
        Param {
            symbol,
            class: ParamClass::Normal,
            is_refinement: true,
            refinement_takes_arg: takes_arg,
            is_variadic: false,
            is_return: false,
        }
    }
}

/// What runs when the frame reaches DISPATCH (spec §4.4).
#[derive(Clone)]
pub enum Dispatcher {
    /// A built-in implemented directly in Rust. Stored as a plain symbol
    /// name the evaluator's native table resolves at dispatch time, rather
    /// than a raw function pointer, so the action value itself stays
    /// `Clone`/`Debug`-friendly like every other cell payload.
    Native(&'static str),
    /// An interpreter-defined function: body block plus the array it was
    /// bound against (for virtual-binding specifier lookups).
    Interpreted { body: NodeRef },
    /// A generic dispatched by the dynamic heart of its first argument
    /// (spec §4.5).
    Generic(&'static str),
}

impl std::fmt::Debug for Dispatcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Dispatcher::Native(name) => write!(f, "Native({name})"),
            Dispatcher::Interpreted { body } => write!(f, "Interpreted({body:?})"),
            Dispatcher::Generic(verb) => write!(f, "Generic({verb})"),
        }
    }
}

/// An action's full definition: its declared parameters, dispatcher, and
/// enfix bits (spec §4.4).
#[derive(Clone, Debug)]
pub struct ActionDef {
    pub params: Vec<Param>,
    pub dispatcher: Dispatcher,
    pub enfixed: bool,
    pub defers_lookback: bool,
    pub postpones_entirely: bool,
}

impl ActionDef {
    pub fn new(params: Vec<Param>, dispatcher: Dispatcher) -> ActionDef {
        ActionDef { params, dispatcher, enfixed: false, defers_lookback: false, postpones_entirely: false }
    }

    pub fn enfix(mut self) -> ActionDef {
        self.enfixed = true;
        self
    }

    pub fn defers(mut self) -> ActionDef {
        self.defers_lookback = true;
        self
    }

    pub fn postpones(mut self) -> ActionDef {
        self.postpones_entirely = true;
        self
    }

    /// The archetype cell for this action: a FRAME cell whose context
    /// points back at itself (spec §3.3, "a FRAME cell bound to this
    /// action").
    pub fn archetype(self_ref: NodeRef) -> Cell {
        Cell::new(Heart::Frame, loom_core::cell::Payload::Action(self_ref))
    }
}
