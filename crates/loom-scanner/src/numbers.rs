//! Number-token lexing (spec §4.2 "Numbers").
//!
//! Decimals accept a leading sign, `'`-separated digit groups (the
//! separator is dropped, not validated for grouping), an optional exponent,
//! and an optional `%` suffix that turns the result into a PERCENT. An
//! integer that is too long or overflows 64 bits falls back to decimal
//! rather than being rejected outright; only a genuinely unparseable numeric
//! run raises `out-of-range`.

use loom_core::{Error, ErrorId, Raised};

const MAX_INTEGER_DIGITS: usize = 19;

#[derive(Clone, Debug, PartialEq)]
pub enum NumberToken {
    Integer(i64),
    Decimal(f64),
    Percent(f64),
}

/// Strip `'` digit-group separators (spec: "optional `'` digit separators
/// (ignored)").
fn strip_separators(s: &str) -> String {
    s.chars().filter(|c| *c != '\'').collect()
}

/// Parse a numeric run already isolated by the caller (the scanner decides
/// where a numeric token starts/ends; this just interprets its text).
pub fn parse_number(raw: &str) -> Result<NumberToken, Raised> {
    let is_percent = raw.ends_with('%');
    let body = if is_percent { &raw[..raw.len() - 1] } else { raw };
    let cleaned = strip_separators(body);

    let looks_decimal =
        cleaned.contains('.') || cleaned.to_ascii_lowercase().contains('e') || is_percent;

    if !looks_decimal {
        let digit_count = cleaned.trim_start_matches(['+', '-']).len();
        if digit_count <= MAX_INTEGER_DIGITS {
            if let Ok(n) = cleaned.parse::<i64>() {
                return Ok(NumberToken::Integer(n));
            }
        }
        // Overflowed 64-bit range or too many digits: fall back to decimal.
        return cleaned
            .parse::<f64>()
            .map(NumberToken::Decimal)
            .map_err(|_| out_of_range(raw));
    }

    let value: f64 = cleaned.parse().map_err(|_| out_of_range(raw))?;
    if is_percent {
        Ok(NumberToken::Percent(value / 100.0))
    } else {
        Ok(NumberToken::Decimal(value))
    }
}

fn out_of_range(raw: &str) -> Raised {
    Raised(Error::new(ErrorId::OutOfRange, format!("not a valid number: {raw}")).with_near(raw))
}

/// Money literal: `$12.34` or `$USD12.34`. Always exact (stored as
/// cents), never float, to avoid rounding surprises (spec §4.3 design
/// note on `Payload::Money`).
pub fn parse_money(raw: &str) -> Result<(i64, Option<[u8; 3]>), Raised> {
    let body = raw.strip_prefix('$').ok_or_else(|| out_of_range(raw))?;
    let (currency, digits) = if body.len() >= 3 && body.as_bytes()[..3].iter().all(|b| b.is_ascii_alphabetic()) {
        let mut tag = [0u8; 3];
        tag.copy_from_slice(&body.as_bytes()[..3]);
        (Some(tag), &body[3..])
    } else {
        (None, body)
    };
    let negative = digits.starts_with('-');
    let unsigned = digits.trim_start_matches(['+', '-']);
    let mut parts = unsigned.splitn(2, '.');
    let whole: i64 = parts.next().unwrap_or("0").parse().map_err(|_| out_of_range(raw))?;
    let frac_str = parts.next().unwrap_or("0");
    let frac: i64 = if frac_str.is_empty() {
        0
    } else {
        let two = format!("{:0<2}", &frac_str[..frac_str.len().min(2)]);
        two.parse().map_err(|_| out_of_range(raw))?
    };
    let cents = whole * 100 + frac;
    Ok((if negative { -cents } else { cents }, currency))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_integer() {
        assert_eq!(parse_number("42").unwrap(), NumberToken::Integer(42));
    }

    #[test]
    fn negative_integer() {
        assert_eq!(parse_number("-7").unwrap(), NumberToken::Integer(-7));
    }

    #[test]
    fn digit_separators_are_ignored() {
        assert_eq!(parse_number("1'000'000").unwrap(), NumberToken::Integer(1_000_000));
    }

    #[test]
    fn decimal_with_exponent() {
        assert_eq!(parse_number("1.5e2").unwrap(), NumberToken::Decimal(150.0));
    }

    #[test]
    fn percent_suffix_divides_by_hundred() {
        assert_eq!(parse_number("50%").unwrap(), NumberToken::Percent(0.5));
    }

    #[test]
    fn overly_long_integer_falls_back_to_decimal() {
        let raw = "1".repeat(25);
        match parse_number(&raw).unwrap() {
            NumberToken::Decimal(_) => {}
            other => panic!("expected decimal fallback, got {other:?}"),
        }
    }

    #[test]
    fn money_with_currency_tag() {
        let (cents, tag) = parse_money("$USD12.34").unwrap();
        assert_eq!(cents, 1234);
        assert_eq!(tag, Some(*b"USD"));
    }

    #[test]
    fn money_without_currency_tag() {
        let (cents, tag) = parse_money("$-5.50").unwrap();
        assert_eq!(cents, -550);
        assert_eq!(tag, None);
    }
}
