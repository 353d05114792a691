//! `mold`/`form` textual representation (spec §4.3, SPEC_FULL §6).
//!
//! `mold` produces a re-loadable representation (quotes around TEXT, `#`
//! prefix on ISSUE, etc.); `form` omits those decorators. Both need access
//! to the series pool for series-flavored hearts, so they take a `Pool<Stub>`
//! rather than living on `Cell` alone.

use crate::series::Stub;
use crate::symbol::SymbolTable;
use loom_core::cell::{Cell, Payload};
use loom_core::heart::Heart;
use loom_core::pool::Pool;
use loom_core::quote::QuoteByte;

pub struct MoldOptions {
    /// `form` mode: omit decorators (quotes, `#`, block brackets are kept —
    /// only per-element decoration is dropped).
    pub form: bool,
}

impl Default for MoldOptions {
    fn default() -> Self {
        MoldOptions { form: false }
    }
}

/// Mold a single cell to a `String`. Series-flavored hearts look their
/// content up in `pool`; word spellings come from `symbols`. An
/// absent/freed stub molds as a placeholder rather than panicking, since
/// `mold` is also used by error reporting on partially-torn-down state.
pub fn mold_cell(cell: &Cell, pool: &Pool<Stub>, symbols: &SymbolTable, opts: &MoldOptions) -> String {
    let prefix = quote_prefix(cell.quote);
    let body = mold_payload(cell, pool, symbols, opts);
    format!("{prefix}{body}")
}

fn quote_prefix(q: QuoteByte) -> String {
    if q.is_quasi() {
        return String::new(); // quasi wraps with ~...~ instead, applied by caller around body
    }
    if q.is_isotope() {
        return String::new();
    }
    "'".repeat(q.depth().unwrap_or(0) as usize)
}

fn mold_payload(cell: &Cell, pool: &Pool<Stub>, symbols: &SymbolTable, opts: &MoldOptions) -> String {
    let wrap_quasi = |s: String| if cell.quote.is_quasi() { format!("~{s}~") } else { s };

    let body = match (&cell.heart, &cell.payload) {
        (Heart::Blank, _) => "_".to_string(),
        (Heart::Logic, Payload::Logic(b)) => if *b { "true".to_string() } else { "false".to_string() },
        (Heart::Integer, Payload::Integer(n)) => n.to_string(),
        (Heart::Decimal, Payload::Decimal(d)) => mold_decimal(*d),
        (Heart::Percent, Payload::Percent(p)) => format!("{}%", mold_decimal(*p * 100.0)),
        (Heart::Money, Payload::Money { cents, currency }) => mold_money(*cents, currency.as_ref()),
        (Heart::Pair, Payload::Pair(x, y)) => format!("{x}x{y}"),
        (Heart::Date, Payload::Date { days, nanos, zone_minutes }) => {
            mold_date(*days, *nanos, *zone_minutes)
        }
        (Heart::Time, Payload::Time(nanos)) => mold_time(*nanos),
        (Heart::Comma, _) => ",".to_string(),
        (Heart::Word, Payload::Word { symbol, .. }) => symbols.spelling(*symbol).to_string(),
        (Heart::SetWord, Payload::Word { symbol, .. }) => format!("{}:", symbols.spelling(*symbol)),
        (Heart::GetWord, Payload::Word { symbol, .. }) => format!(":{}", symbols.spelling(*symbol)),
        (Heart::MetaWord, Payload::Word { symbol, .. }) => format!("^{}", symbols.spelling(*symbol)),
        (Heart::TheWord, Payload::Word { symbol, .. }) => format!("@{}", symbols.spelling(*symbol)),
        (Heart::TypeWord, Payload::Word { symbol, .. }) => format!("&{}", symbols.spelling(*symbol)),
        (Heart::Text, Payload::Series(node)) => mold_text(node, pool, opts.form),
        (Heart::File, Payload::Series(node)) => format!("%{}", bytes_as_str(node, pool)),
        (Heart::Email, Payload::Series(node)) => bytes_as_str(node, pool),
        (Heart::Url, Payload::Series(node)) => bytes_as_str(node, pool),
        (Heart::Tag, Payload::Series(node)) => format!("<{}>", bytes_as_str(node, pool)),
        (Heart::Issue, Payload::Series(node)) => format!("#{}", bytes_as_str(node, pool)),
        (Heart::Binary, Payload::Series(node)) => mold_binary(node, pool),
        (Heart::Block, Payload::Series(node)) => mold_array(node, pool, symbols, opts, "[", "]", " "),
        (Heart::Group, Payload::Series(node)) => mold_array(node, pool, symbols, opts, "(", ")", " "),
        (Heart::Path, Payload::Series(node)) => mold_array(node, pool, symbols, opts, "", "", "/"),
        (Heart::Tuple, Payload::Series(node)) => mold_array(node, pool, symbols, opts, "", "", "."),
        (Heart::Map, Payload::Series(node)) => mold_map(node, pool, symbols, opts),
        (Heart::Bitset, Payload::Series(_)) => "make bitset! []".to_string(),
        (Heart::Object, Payload::Context(_)) => "make object! []".to_string(),
        (Heart::Frame, Payload::Action(_)) => "make frame! []".to_string(),
        (Heart::Module, Payload::Context(_)) => "make module! []".to_string(),
        (Heart::Port, Payload::Context(_)) => "make port! []".to_string(),
        (Heart::Error, Payload::Context(_)) => "make error! []".to_string(),
        (Heart::Action, Payload::Action(_)) => "make action! []".to_string(),
        (Heart::Handle, _) => "#[handle]".to_string(),
        (Heart::Void, Payload::Void) => "".to_string(),
        _ => format!("#[{:?}]", cell.heart),
    };
    wrap_quasi(body)
}

fn mold_decimal(d: f64) -> String {
    if d.fract() == 0.0 && d.abs() < 1e15 {
        format!("{d:.1}")
    } else {
        format!("{d}")
    }
}

fn mold_money(cents: i64, currency: Option<&[u8; 3]>) -> String {
    let sign = if cents < 0 { "-" } else { "" };
    let abs = cents.unsigned_abs();
    let whole = abs / 100;
    let frac = abs % 100;
    let tag = currency
        .map(|c| format!("{}", std::str::from_utf8(c).unwrap_or("???")))
        .unwrap_or_default();
    format!("${sign}{tag}{whole}.{frac:02}")
}

/// Gregorian day-number to `YYYY/MM/DD`, matching the scanner's own
/// accepted input grammar (spec §4.2 "Dates").
fn mold_date(days: i32, nanos: Option<i64>, zone_minutes: Option<i16>) -> String {
    let (y, m, d) = civil_from_days(days);
    let mut s = format!("{y:04}/{m:02}/{d:02}");
    if let Some(ns) = nanos {
        s.push('/');
        s.push_str(&mold_time(ns));
    }
    if let Some(zm) = zone_minutes {
        let sign = if zm < 0 { '-' } else { '+' };
        let zm = zm.unsigned_abs();
        s.push_str(&format!("{sign}{:02}:{:02}", zm / 60, zm % 60));
    }
    s
}

fn mold_time(nanos: i64) -> String {
    let total_secs = nanos / 1_000_000_000;
    let h = total_secs / 3600;
    let m = (total_secs % 3600) / 60;
    let s = total_secs % 60;
    format!("{h:02}:{m:02}:{s:02}")
}

/// Days-since-epoch to proleptic Gregorian (y, m, d). Howard Hinnant's
/// civil_from_days algorithm, used because it's branch-free and correct
/// across the whole `i32` range without a lookup table.
fn civil_from_days(z: i32) -> (i32, u32, u32) {
    let z = z as i64 + 719468;
    let era = if z >= 0 { z } else { z - 146096 } / 146097;
    let doe = (z - era * 146097) as u64;
    let yoe = (doe - doe / 1460 + doe / 36524 - doe / 146096) / 365;
    let y = yoe as i64 + era * 400;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let d = (doy - (153 * mp + 2) / 5 + 1) as u32;
    let m = if mp < 10 { mp + 3 } else { mp - 9 } as u32;
    let y = if m <= 2 { y + 1 } else { y };
    (y as i32, m, d)
}

fn bytes_as_str(node: &loom_core::cell::NodeRef, pool: &Pool<Stub>) -> String {
    pool.get(node.0)
        .and_then(|s| s.content.bytes())
        .map(|b| String::from_utf8_lossy(b).into_owned())
        .unwrap_or_else(|| "#[freed]".to_string())
}

fn mold_text(node: &loom_core::cell::NodeRef, pool: &Pool<Stub>, form: bool) -> String {
    let s = bytes_as_str(node, pool);
    if form { s } else { format!("\"{}\"", s.replace('"', "^\"")) }
}

fn mold_binary(node: &loom_core::cell::NodeRef, pool: &Pool<Stub>) -> String {
    let bytes = pool.get(node.0).and_then(|s| s.content.bytes()).unwrap_or(&[]);
    let hex: String = bytes.iter().map(|b| format!("{b:02X}")).collect();
    format!("#{{{hex}}}")
}

fn mold_array(
    node: &loom_core::cell::NodeRef,
    pool: &Pool<Stub>,
    symbols: &SymbolTable,
    opts: &MoldOptions,
    open: &str,
    close: &str,
    sep: &str,
) -> String {
    let Some(stub) = pool.get(node.0) else { return format!("{open}{close}") };
    if stub.flags.contains(loom_core::flags::SeriesFlags::INACCESSIBLE) {
        return "#[freed]".to_string();
    }
    let cells = stub.content.cells().unwrap_or(&[]);
    let parts: Vec<String> = cells.iter().map(|c| mold_cell(c, pool, symbols, opts)).collect();
    format!("{open}{}{close}", parts.join(sep))
}

fn mold_map(node: &loom_core::cell::NodeRef, pool: &Pool<Stub>, symbols: &SymbolTable, opts: &MoldOptions) -> String {
    let Some(stub) = pool.get(node.0) else { return "#[freed]".to_string() };
    let cells = stub.content.cells().unwrap_or(&[]);
    let parts: Vec<String> = cells
        .chunks(2)
        .map(|pair| {
            if pair.len() == 2 {
                format!(
                    "{} {}",
                    mold_cell(&pair[0], pool, symbols, opts),
                    mold_cell(&pair[1], pool, symbols, opts)
                )
            } else {
                mold_cell(&pair[0], pool, symbols, opts)
            }
        })
        .collect();
    format!("make map! [{}]", parts.join(" "))
}
