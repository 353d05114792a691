//! The value cell (spec §3.1).
//!
//! A `Cell` is the fixed-size record every Loom value is represented as: a
//! small header (heart byte, quote byte, per-cell flags) plus a payload that
//! either embeds small data directly or refers to a pooled series via a
//! [`NodeRef`]. Cells are `Copy`-cheap on purpose — passing one around never
//! allocates — which is what lets the evaluator push and pop them on a plain
//! `Vec<Cell>` data stack without bookkeeping beyond the GC's mark pass.
//!
//! Two overlapping sum types exist, per the evaluator's own design note
//! (spec §9): [`Payload`] is the full set, including the unstable isotope
//! payloads; [`Element`] is the storable-only subset accepted at sites that
//! may not hold an isotope (array elements, object fields, bound
//! variables). Constructing an `Element` from a `Payload` fails instead of
//! silently decaying, mirroring "attempting to store [an isotope] elsewhere
//! fails" in spec §3.1.

use crate::flags::CellFlags;
use crate::heart::Heart;
use crate::pool::StubIndex;
use crate::quote::QuoteByte;

/// A handle to a pooled series node. Cheap to copy; meaningless outside the
/// `Pool` that minted the underlying `StubIndex`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeRef(pub StubIndex);

/// A symbol table entry (interned identifier). See `loom-runtime::symbol`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// A word's binding payload: either unbound (just the symbol) or bound to a
/// context slot (spec §3.4).
#[derive(Copy, Clone, Debug, PartialEq)]
pub enum WordBinding {
    Unbound,
    Bound {
        /// The context's varlist (or, for a module, the patch chain head).
        context: NodeRef,
        /// Index into the context's keylist (meaningless for module binding,
        /// which instead walks the hitch chain by symbol).
        index: u32,
    },
}

/// The full payload a cell may carry, including unstable isotope forms.
/// Only [`Element`]-compatible variants may be stored in arrays, object
/// fields, or bound variables; the rest exist only transiently in an
/// evaluator frame's `out`/`spare` slots.
#[derive(Clone, Debug, PartialEq)]
pub enum Payload {
    Blank,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Percent(f64),
    /// Fixed-point amount in the minor unit (cents) plus an optional
    /// ISO-4217-shaped currency tag; `original_source`'s money type is
    /// always exact decimal, never float, to avoid rounding surprises.
    Money { cents: i64, currency: Option<[u8; 3]> },
    Pair(i32, i32),
    /// Days since the epoch, an optional nanosecond time-of-day, and an
    /// optional zone offset in minutes.
    Date { days: i32, nanos: Option<i64>, zone_minutes: Option<i16> },
    /// Nanoseconds since midnight.
    Time(i64),
    Comma,

    Word { symbol: SymbolId, binding: WordBinding },

    /// Series-flavored kinds (TEXT/FILE/EMAIL/URL/TAG/ISSUE/BINARY/BLOCK/
    /// GROUP/PATH/TUPLE/BITSET/MAP) all refer to a pooled stub.
    Series(NodeRef),
    /// OBJECT/MODULE/PORT/ERROR/FRAME varlists.
    Context(NodeRef),
    /// A details-flavored array (action body + archetype).
    Action(NodeRef),
    Handle(NodeRef),

    /// Signals a statement that produced nothing observable; the evaluator
    /// leaves `out` stale rather than overwriting it with this.
    Void,
    /// The absence of a value (distinct from `Blank`, which is an ordinary
    /// storable value meaning "deliberately nothing").
    Null,
    /// Action-activation isotope: "this word, if fetched, should be called
    /// rather than merely referenced".
    Activation(NodeRef),
    /// A splice isotope: a block whose elements should be spread into the
    /// surrounding context rather than nested.
    Splice(NodeRef),
    /// End-of-input isotope produced by a feed with nothing left to fetch.
    EndOfInput,
}

/// The storable-only subset of [`Payload`]. Every variant here has a
/// matching `Payload` variant; the reverse is not true.
#[derive(Clone, Debug, PartialEq)]
pub enum Element {
    Blank,
    Logic(bool),
    Integer(i64),
    Decimal(f64),
    Percent(f64),
    Money { cents: i64, currency: Option<[u8; 3]> },
    Pair(i32, i32),
    Date { days: i32, nanos: Option<i64>, zone_minutes: Option<i16> },
    Time(i64),
    Comma,
    Word { symbol: SymbolId, binding: WordBinding },
    Series(NodeRef),
    Context(NodeRef),
    Action(NodeRef),
    Handle(NodeRef),
}

impl Element {
    /// Widen a storable element back into the full payload space. Always
    /// succeeds since `Element` is a strict subset.
    pub fn into_payload(self) -> Payload {
        match self {
            Element::Blank => Payload::Blank,
            Element::Logic(b) => Payload::Logic(b),
            Element::Integer(n) => Payload::Integer(n),
            Element::Decimal(d) => Payload::Decimal(d),
            Element::Percent(p) => Payload::Percent(p),
            Element::Money { cents, currency } => Payload::Money { cents, currency },
            Element::Pair(x, y) => Payload::Pair(x, y),
            Element::Date { days, nanos, zone_minutes } => {
                Payload::Date { days, nanos, zone_minutes }
            }
            Element::Time(t) => Payload::Time(t),
            Element::Comma => Payload::Comma,
            Element::Word { symbol, binding } => Payload::Word { symbol, binding },
            Element::Series(n) => Payload::Series(n),
            Element::Context(n) => Payload::Context(n),
            Element::Action(n) => Payload::Action(n),
            Element::Handle(n) => Payload::Handle(n),
        }
    }
}

/// Attempting to store an isotope where only an [`Element`] is accepted
/// (spec §3.1: "attempting to store one elsewhere fails").
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct IsotopeNotStorable;

impl TryFrom<Payload> for Element {
    type Error = IsotopeNotStorable;

    fn try_from(p: Payload) -> Result<Element, IsotopeNotStorable> {
        match p {
            Payload::Blank => Ok(Element::Blank),
            Payload::Logic(b) => Ok(Element::Logic(b)),
            Payload::Integer(n) => Ok(Element::Integer(n)),
            Payload::Decimal(d) => Ok(Element::Decimal(d)),
            Payload::Percent(p) => Ok(Element::Percent(p)),
            Payload::Money { cents, currency } => Ok(Element::Money { cents, currency }),
            Payload::Pair(x, y) => Ok(Element::Pair(x, y)),
            Payload::Date { days, nanos, zone_minutes } => {
                Ok(Element::Date { days, nanos, zone_minutes })
            }
            Payload::Time(t) => Ok(Element::Time(t)),
            Payload::Comma => Ok(Element::Comma),
            Payload::Word { symbol, binding } => Ok(Element::Word { symbol, binding }),
            Payload::Series(n) => Ok(Element::Series(n)),
            Payload::Context(n) => Ok(Element::Context(n)),
            Payload::Action(n) => Ok(Element::Action(n)),
            Payload::Handle(n) => Ok(Element::Handle(n)),
            Payload::Void
            | Payload::Null
            | Payload::Activation(_)
            | Payload::Splice(_)
            | Payload::EndOfInput => Err(IsotopeNotStorable),
        }
    }
}

/// The cell itself: header plus payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Cell {
    pub heart: Heart,
    pub quote: QuoteByte,
    pub flags: CellFlags,
    pub payload: Payload,
}

impl Cell {
    /// A fresh, erased cell: all-zero payload, no type written yet. Spec
    /// §3.1: "immediately before first initialization... becomes readable
    /// only after a type has been written."
    pub fn fresh() -> Cell {
        Cell {
            heart: Heart::Void,
            quote: QuoteByte::UNQUOTED,
            flags: CellFlags::empty(),
            payload: Payload::Void,
        }
    }

    /// A fresh cell is never readable; `heart == Void` with no flags set is
    /// the sentinel this type uses for "not yet initialized" (it is also
    /// the representation of a stale/invisible evaluator result, which is
    /// intentional: both states mean "nothing meaningful is here yet").
    pub fn is_fresh(&self) -> bool {
        self.heart == Heart::Void && self.flags.is_empty() && matches!(self.payload, Payload::Void)
    }

    pub fn new(heart: Heart, payload: Payload) -> Cell {
        Cell { heart, quote: QuoteByte::UNQUOTED, flags: CellFlags::empty(), payload }
    }

    /// This cell's first payload node pointer, if any, independent of
    /// whatever `NODE1_NEEDS_MARK` currently says — used to verify spec
    /// invariant 1 (the flag and the actual payload must agree).
    pub fn node1(&self) -> Option<NodeRef> {
        match &self.payload {
            Payload::Series(n)
            | Payload::Context(n)
            | Payload::Action(n)
            | Payload::Handle(n)
            | Payload::Activation(n)
            | Payload::Splice(n) => Some(*n),
            Payload::Word { binding: WordBinding::Bound { context, .. }, .. } => Some(*context),
            _ => None,
        }
    }

    /// Recompute and install the GC mark-hint flags from the actual
    /// payload. Callers that build a cell's payload directly (rather than
    /// through a constructor helper) must call this before handing the cell
    /// to the GC; debug builds assert the two never drift apart.
    pub fn sync_mark_flags(&mut self) {
        self.flags.set(CellFlags::NODE1_NEEDS_MARK, self.node1().is_some());
        self.flags.set(CellFlags::NODE2_NEEDS_MARK, false);
    }

    /// Spec invariant 1: if a mark-hint flag is set, the corresponding
    /// payload slot actually holds a node reference.
    pub fn mark_flags_consistent(&self) -> bool {
        self.flags.contains(CellFlags::NODE1_NEEDS_MARK) == self.node1().is_some()
    }

    pub fn is_isotope(&self) -> bool {
        self.quote.is_isotope()
            || matches!(
                self.payload,
                Payload::Void | Payload::Null | Payload::Activation(_) | Payload::Splice(_) | Payload::EndOfInput
            )
    }

    /// `decay`: turn an unstable multi-return into its primary value.
    /// Splices decay to the series they wrap; everything else is already
    /// its own primary value (decay is idempotent on stable cells).
    pub fn decay(self) -> Cell {
        match self.payload {
            Payload::Splice(n) => Cell::new(Heart::Block, Payload::Series(n)),
            _ => self,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_cell_is_fresh_until_written() {
        let c = Cell::fresh();
        assert!(c.is_fresh());
        let c = Cell::new(Heart::Integer, Payload::Integer(0));
        assert!(!c.is_fresh());
    }

    #[test]
    fn node_mark_flags_track_payload() {
        let mut c = Cell::new(Heart::Series, Payload::Integer(0)).clone();
        // Series heart with a scalar payload shouldn't happen in practice,
        // but sync_mark_flags must still reflect reality rather than the heart.
        c.sync_mark_flags();
        assert!(!c.flags.contains(CellFlags::NODE1_NEEDS_MARK));
        assert!(c.mark_flags_consistent());
    }

    #[test]
    fn storing_an_isotope_as_an_element_fails() {
        let err = Element::try_from(Payload::Void).unwrap_err();
        assert_eq!(err, IsotopeNotStorable);
    }

    #[test]
    fn element_round_trips_through_payload() {
        let e = Element::Integer(42);
        let p = e.clone().into_payload();
        let back: Element = p.try_into().unwrap();
        assert_eq!(e, back);
    }

    #[test]
    fn decay_unwraps_splice_to_block() {
        let n = NodeRef(StubIndex(0));
        let c = Cell::new(Heart::Void, Payload::Splice(n));
        let d = c.decay();
        assert_eq!(d.heart, Heart::Block);
        assert_eq!(d.payload, Payload::Series(n));
    }
}
