//! Quote-byte arithmetic (spec §3.1, §4.3).
//!
//! The quote byte packs three concepts into one small value:
//! - an ordinary quote depth (`'x`, `''x`, …),
//! - the "quasi" marker (`~foo~`), storable but flagged "not quite the base
//!   value", and
//! - the "isotope" marker, an unstable, non-storable state used for
//!   signalling (`null`, `void`, end-of-input, action-activation, splices).
//!
//! Quasi and isotope occupy two reserved byte values above the ordinary
//! quoting range, so `depth + 1` overflow and "is this quasi" are both plain
//! integer comparisons.

/// Deepest ordinary quote level representable before `quote-overflow`.
pub const MAX_QUOTE_DEPTH: u8 = 126;

const QUASI_SENTINEL: u8 = MAX_QUOTE_DEPTH + 1;
const ISOTOPE_SENTINEL: u8 = MAX_QUOTE_DEPTH + 2;

/// The quote byte itself. Ordinary depths are `0..=MAX_QUOTE_DEPTH`; the two
/// values above that are reserved sentinels.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct QuoteByte(u8);

impl QuoteByte {
    pub const UNQUOTED: QuoteByte = QuoteByte(0);
    pub const QUASI: QuoteByte = QuoteByte(QUASI_SENTINEL);
    pub const ISOTOPE: QuoteByte = QuoteByte(ISOTOPE_SENTINEL);

    /// Construct an ordinary quoted level. Returns `None` if `depth` exceeds
    /// `MAX_QUOTE_DEPTH` (caller should raise `quote-overflow`).
    pub fn quoted(depth: u8) -> Option<QuoteByte> {
        if depth <= MAX_QUOTE_DEPTH {
            Some(QuoteByte(depth))
        } else {
            None
        }
    }

    pub fn is_unquoted(self) -> bool {
        self.0 == 0
    }

    pub fn is_quasi(self) -> bool {
        self.0 == QUASI_SENTINEL
    }

    pub fn is_isotope(self) -> bool {
        self.0 == ISOTOPE_SENTINEL
    }

    /// Ordinary quote depth, or `None` for quasi/isotope.
    pub fn depth(self) -> Option<u8> {
        if self.0 <= MAX_QUOTE_DEPTH { Some(self.0) } else { None }
    }

    /// Quote one more level. `None` on overflow past `MAX_QUOTE_DEPTH`, and
    /// on quasi/isotope (those are not further quotable; callers wrap the
    /// cell in a BLOCK! or similar to quote a quasi-form instead).
    pub fn quote(self) -> Option<QuoteByte> {
        self.depth().and_then(|d| QuoteByte::quoted(d + 1))
    }

    /// Unquote one level. Unquoting at depth 0 is a no-op per spec §4.3
    /// ("unquoting at 0 leaves unquoted"). Unquoting quasi/isotope is also a
    /// no-op; callers distinguish those states with `is_quasi`/`is_isotope`.
    pub fn unquote(self) -> QuoteByte {
        match self.depth() {
            Some(0) | None => self,
            Some(d) => QuoteByte(d - 1),
        }
    }

    /// `metafy`: reify this quote state into its quasi/meta-decorated form.
    /// An isotope metafies to quasi at the same conceptual level; an
    /// ordinary value at depth 0 metafies to quasi; a quoted value's meta
    /// form is one quote level up (so the original depth is recoverable).
    pub fn metafy(self) -> QuoteByte {
        match self.0 {
            ISOTOPE_SENTINEL => QuoteByte::QUASI,
            QUASI_SENTINEL => QuoteByte::QUASI,
            d => QuoteByte(d.saturating_add(1).min(MAX_QUOTE_DEPTH)),
        }
    }
}

impl Default for QuoteByte {
    fn default() -> Self {
        QuoteByte::UNQUOTED
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quote_unquote_round_trip() {
        let q = QuoteByte::UNQUOTED.quote().unwrap().quote().unwrap();
        assert_eq!(q.depth(), Some(2));
        let u = q.unquote().unquote();
        assert_eq!(u, QuoteByte::UNQUOTED);
    }

    #[test]
    fn unquote_at_zero_is_noop() {
        assert_eq!(QuoteByte::UNQUOTED.unquote(), QuoteByte::UNQUOTED);
    }

    #[test]
    fn quote_overflow_is_none() {
        let max = QuoteByte::quoted(MAX_QUOTE_DEPTH).unwrap();
        assert!(max.quote().is_none());
    }

    #[test]
    fn quasi_and_isotope_are_distinct_reserved_states() {
        assert!(QuoteByte::QUASI.is_quasi());
        assert!(!QuoteByte::QUASI.is_isotope());
        assert!(QuoteByte::ISOTOPE.is_isotope());
        assert_eq!(QuoteByte::QUASI.depth(), None);
    }

    #[test]
    fn metafy_reifies_isotopes_to_quasi() {
        assert_eq!(QuoteByte::ISOTOPE.metafy(), QuoteByte::QUASI);
    }
}
