//! Date/time token lexing (spec §4.2 "Dates").
//!
//! Accepts `DD-MON-YYYY` and `YYYY/MM/DD`, an optional `/HH:MM:SS(.ffff)?`
//! time-of-day suffix, and an optional `+HH:MM`/`-HHMM` zone. Month names
//! match the English prefix table case-insensitively with a 3-letter
//! minimum. February 29 is validated against the Gregorian leap rule.

use loom_core::{Error, ErrorId, Raised};

const MONTHS: [&str; 12] = [
    "january", "february", "march", "april", "may", "june", "july", "august", "september",
    "october", "november", "december",
];

fn month_from_name(name: &str) -> Option<u32> {
    let lower = name.to_ascii_lowercase();
    if lower.len() < 3 {
        return None;
    }
    MONTHS.iter().position(|m| m.starts_with(&lower)).map(|i| i as u32 + 1)
}

pub fn is_leap_year(y: i32) -> bool {
    (y % 4 == 0 && y % 100 != 0) || y % 400 == 0
}

fn days_in_month(y: i32, m: u32) -> u32 {
    match m {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 => if is_leap_year(y) { 29 } else { 28 },
        _ => 0,
    }
}

/// Days since the Unix epoch (1970-01-01 = 0), proleptic Gregorian.
/// Howard Hinnant's days_from_civil, the inverse of `mold::civil_from_days`.
pub fn days_from_civil(y: i32, m: u32, d: u32) -> i32 {
    let y = if m <= 2 { y as i64 - 1 } else { y as i64 };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as u64;
    let mp = if m > 2 { m - 3 } else { m + 9 } as u64;
    let doy = (153 * mp + 2) / 5 + d as u64 - 1;
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy;
    (era * 146097 + doe as i64 - 719468) as i32
}

fn validate_date(y: i32, m: u32, d: u32) -> Result<(), Raised> {
    if !(1..=12).contains(&m) || d == 0 || d > days_in_month(y, m) {
        return Err(Raised(Error::new(
            ErrorId::OutOfRange,
            format!("invalid date {y:04}-{m:02}-{d:02}"),
        )));
    }
    Ok(())
}

#[derive(Clone, Debug, PartialEq)]
pub struct ScannedDate {
    pub days: i32,
    pub nanos: Option<i64>,
    pub zone_minutes: Option<i16>,
}

/// Parse the time-of-day portion (`HH:MM` or `HH:MM:SS(.ffff)?`) into
/// nanoseconds since midnight.
pub fn parse_time_of_day(raw: &str) -> Result<i64, Raised> {
    let bad = || Raised(Error::new(ErrorId::OutOfRange, format!("invalid time: {raw}")));
    let mut parts = raw.splitn(3, ':');
    let h: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let m: i64 = parts.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let sec_part = parts.next().unwrap_or("0");
    let (s, frac_nanos) = match sec_part.split_once('.') {
        Some((s, frac)) => {
            let s: i64 = s.parse().map_err(|_| bad())?;
            let padded = format!("{:0<9}", &frac[..frac.len().min(9)]);
            let n: i64 = padded.parse().map_err(|_| bad())?;
            (s, n)
        }
        None => (sec_part.parse().map_err(|_| bad())?, 0),
    };
    if !(0..24).contains(&h) || !(0..60).contains(&m) || !(0..60).contains(&s) {
        return Err(bad());
    }
    Ok(((h * 3600 + m * 60 + s) * 1_000_000_000) + frac_nanos)
}

fn parse_zone(raw: &str) -> Result<i16, Raised> {
    let bad = || Raised(Error::new(ErrorId::OutOfRange, format!("invalid zone offset: {raw}")));
    let (sign, rest) = match raw.as_bytes().first() {
        Some(b'+') => (1i16, &raw[1..]),
        Some(b'-') => (-1i16, &raw[1..]),
        _ => return Err(bad()),
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 {
        return Err(bad());
    }
    let h: i16 = digits[0..2].parse().map_err(|_| bad())?;
    let m: i16 = digits[2..4].parse().map_err(|_| bad())?;
    Ok(sign * (h * 60 + m))
}

/// Parse a full date token, including optional `/time` and zone suffix.
/// `raw` is the whole token text as the scanner isolated it, e.g.
/// `1-Jan-2024/10:30:00+05:00`.
pub fn parse_date(raw: &str) -> Result<ScannedDate, Raised> {
    let bad = || Raised(Error::new(ErrorId::OutOfRange, format!("invalid date: {raw}")));

    let (date_part, rest) = match raw.split_once('/') {
        Some((d, r)) => (d, Some(r)),
        None => (raw, None),
    };

    let (y, m, d) = if date_part.contains('-') {
        let segs: Vec<&str> = date_part.split('-').collect();
        if segs.len() != 3 {
            return Err(bad());
        }
        let day: u32 = segs[0].parse().map_err(|_| bad())?;
        let month = segs[1].parse::<u32>().ok().or_else(|| month_from_name(segs[1])).ok_or_else(bad)?;
        let year: i32 = segs[2].parse().map_err(|_| bad())?;
        (year, month, day)
    } else if date_part.contains('/') {
        return Err(bad()); // already split on first '/', a second means malformed y/m/d
    } else {
        let segs: Vec<&str> = date_part.splitn(3, |c| c == '/').collect();
        let _ = segs;
        return Err(bad());
    };

    validate_date(y, m, d)?;
    let days = days_from_civil(y, m, d);

    let (time_part, zone_part) = match rest {
        None => (None, None),
        Some(r) => {
            if let Some(pos) = r.find(['+', '-']) {
                // Guard against the '-' inside a bare negative-less time (there is
                // none — HH:MM:SS never contains +/-), so the first +/- found is
                // unambiguously the zone marker.
                (Some(&r[..pos]), Some(&r[pos..]))
            } else {
                (Some(r), None)
            }
        }
    };

    let nanos = match time_part {
        Some(t) if !t.is_empty() => Some(parse_time_of_day(t)?),
        _ => None,
    };
    let zone_minutes = match zone_part {
        Some(z) => Some(parse_zone(z)?),
        None => None,
    };

    Ok(ScannedDate { days, nanos, zone_minutes })
}

/// `YYYY/MM/DD` form (no dashes, no month name).
pub fn parse_date_slash(raw: &str) -> Result<ScannedDate, Raised> {
    let bad = || Raised(Error::new(ErrorId::OutOfRange, format!("invalid date: {raw}")));
    let mut segs = raw.splitn(4, '/');
    let y: i32 = segs.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let m: u32 = segs.next().ok_or_else(bad)?.parse().map_err(|_| bad())?;
    let d_and_rest = segs.next().ok_or_else(bad)?;
    let d: u32 = d_and_rest.parse().map_err(|_| bad())?;
    validate_date(y, m, d)?;
    let days = days_from_civil(y, m, d);
    let rest: Vec<&str> = segs.collect();
    let nanos = if let Some(t) = rest.first() {
        Some(parse_time_of_day(t)?)
    } else {
        None
    };
    Ok(ScannedDate { days, nanos, zone_minutes: None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn month_name_prefix_matches_case_insensitively() {
        assert_eq!(month_from_name("Jan"), Some(1));
        assert_eq!(month_from_name("december"), Some(12));
        assert_eq!(month_from_name("ja"), None); // below 3-letter minimum
    }

    #[test]
    fn leap_year_rule_matches_gregorian() {
        assert!(is_leap_year(2000));
        assert!(!is_leap_year(1900));
        assert!(is_leap_year(2024));
        assert!(!is_leap_year(2023));
    }

    #[test]
    fn feb29_rejected_on_non_leap_year() {
        let err = parse_date("29-Feb-2023").unwrap_err();
        assert_eq!(err.0.id, loom_core::ErrorId::OutOfRange);
    }

    #[test]
    fn feb29_accepted_on_leap_year() {
        let d = parse_date("29-Feb-2024").unwrap();
        assert_eq!(days_from_civil(2024, 2, 29), d.days);
    }

    #[test]
    fn dd_mon_yyyy_with_time_and_zone() {
        let d = parse_date("1-Jan-2024/10:30:00+05:00").unwrap();
        assert_eq!(d.zone_minutes, Some(5 * 60));
        assert!(d.nanos.is_some());
    }

    #[test]
    fn yyyy_slash_mm_slash_dd() {
        let d = parse_date_slash("2024/02/29").unwrap();
        assert_eq!(d.days, days_from_civil(2024, 2, 29));
    }

    #[test]
    fn days_from_civil_round_trips_known_epoch() {
        assert_eq!(days_from_civil(1970, 1, 1), 0);
    }
}
