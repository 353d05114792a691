//! `to-local` / `to-rebol` path normalization (spec §4.6).
//!
//! Both directions are pure functions over text: they never touch the
//! filesystem (the `tempfile`-backed tests below only use `tempfile` to get
//! realistic, collision-free path *strings* to feed through the normalizer,
//! not to perform I/O). The system's own FILE! convention always uses `/` as
//! its segment separator and an optional leading `/` for "rooted"; the local
//! convention is platform-dependent, which is why every entry point takes an
//! explicit [`Platform`] rather than reading `cfg(windows)` — the scanner and
//! evaluator this crate serves run the same way on every host, and the
//! scenarios in spec §8 (S4/S5) exercise both platforms' rendering from a
//! single binary.
//!
//! Grounded on `examples/original_source/extensions/filesystem/mod-filesystem.c`'s
//! `To_REBOL_Path` / `Mold_File_To_Local`, reworked as a segment-list
//! transform instead of a single forward-scanning mold buffer — the `.`/`..`
//! resolution and drive-letter handling are the same state machine, just
//! expressed over `Vec<String>` rather than character-at-a-time mold
//! appends, which is the natural idiom once the host language has a real
//! string-splitting standard library.

use loom_core::{fail, Error, ErrorId, Raised};

/// Which separator/drive convention to render for (or to parse from, in
/// [`to_rebol`]). Deliberately explicit rather than `cfg`-gated: the
/// normalizer is pure text manipulation, so nothing stops a single build
/// from rendering both conventions (e.g. a cross-compiling build tool).
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Posix,
}

/// Options for [`to_local`] (spec §4.6).
#[derive(Clone, Debug)]
pub struct ToLocalOptions {
    pub platform: Platform,
    /// Prefix a relative path with `cwd` before resolving `.`/`..`.
    pub full: bool,
    /// The current working directory, in the system's own FILE! convention
    /// (leading `/`, `/`-separated). Required when `full` is set.
    pub cwd: Option<String>,
    /// The source is known to denote a directory; ensure the output ends in
    /// the platform separator.
    pub dir: bool,
    /// Suppress the trailing separator even if `dir` would otherwise add
    /// one (spec: "Win32 does not want tail slash for dir info").
    pub trim_tail_slash: bool,
}

impl Default for ToLocalOptions {
    fn default() -> Self {
        ToLocalOptions {
            platform: Platform::Posix,
            full: false,
            cwd: None,
            dir: false,
            trim_tail_slash: false,
        }
    }
}

/// Options for [`to_rebol`] (spec §4.6).
#[derive(Clone, Debug)]
pub struct ToRebolOptions {
    pub platform: Platform,
    /// The source is known to denote a directory; ensure the output ends in
    /// `/`.
    pub src_is_dir: bool,
}

impl Default for ToRebolOptions {
    fn default() -> Self {
        ToRebolOptions { platform: Platform::Posix, src_is_dir: false }
    }
}

/// A parsed path: an optional drive letter (Windows only), whether it was
/// rooted (led with a separator), and its `/`-free segments after `.`/`..`
/// resolution.
struct Segments {
    drive: Option<char>,
    rooted: bool,
    parts: Vec<String>,
}

/// Split `text` on `/` and resolve `.`/`..` against a starting segment list
/// (spec §4.6: "`.` segments are dropped, `..` segments pop the last
/// segment from the output").
fn resolve_segments(base: Vec<String>, text: &str) -> Vec<String> {
    let mut parts = base;
    for seg in text.split('/') {
        match seg {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other.to_string()),
        }
    }
    parts
}

/// Parse a FILE!-convention path into rooted/drive/segments, resolving
/// `.`/`..` as we go. A leading `/<letter>/...` or `/<letter>` is treated as
/// a Windows drive root only when `platform` is `Windows`; on POSIX it is
/// just an ordinary top-level directory named after that letter (spec S4:
/// the same `%/c/users/me/` renders as `/c/users/me/` on POSIX, untouched).
fn parse_rebol_path(file: &str, platform: Platform) -> Segments {
    if let Some(rest) = file.strip_prefix('/') {
        if platform == Platform::Windows {
            let mut iter = rest.splitn(2, '/');
            let first = iter.next().unwrap_or("");
            if first.len() == 1 && first.chars().next().is_some_and(|c| c.is_ascii_alphabetic()) {
                let drive = first.chars().next().unwrap().to_ascii_uppercase();
                let remainder = iter.next().unwrap_or("");
                return Segments { drive: Some(drive), rooted: true, parts: resolve_segments(Vec::new(), remainder) };
            }
        }
        Segments { drive: None, rooted: true, parts: resolve_segments(Vec::new(), rest) }
    } else {
        Segments { drive: None, rooted: false, parts: resolve_segments(Vec::new(), file) }
    }
}

fn render_local(seg: &Segments, platform: Platform, dir: bool, trim_tail_slash: bool) -> String {
    let sep = match platform {
        Platform::Windows => '\\',
        Platform::Posix => '/',
    };
    let mut out = String::new();
    match (platform, seg.drive) {
        (Platform::Windows, Some(d)) => {
            out.push(d);
            out.push(':');
            out.push(sep);
        }
        _ => {
            if seg.rooted {
                out.push(sep);
            }
        }
    }
    out.push_str(&seg.parts.join(&sep.to_string()));
    let want_tail_sep = dir && !trim_tail_slash;
    if want_tail_sep && !out.ends_with(sep) {
        out.push(sep);
    }
    out
}

/// `to-local(file, {full?, trim-tail-slash?, wild?})` (spec §4.6).
///
/// `wild` (glob-pattern paths) is accepted for interface parity with the
/// spec's option set but does not change rendering here: this crate does
/// not interpret glob metacharacters, it only normalizes separators and
/// `.`/`..`, so a wildcard segment passes through like any other segment.
pub fn to_local(file: &str, opts: &ToLocalOptions) -> Result<String, Raised> {
    let parsed = parse_rebol_path(file, opts.platform);

    let seg = if parsed.rooted {
        parsed
    } else if opts.full {
        let Some(cwd) = &opts.cwd else {
            fail!(ErrorId::BadMake, "to-local with full: requires a current directory");
        };
        let base = parse_rebol_path(cwd, opts.platform);
        Segments { drive: base.drive, rooted: true, parts: resolve_segments(base.parts, file) }
    } else {
        parsed
    };

    Ok(render_local(&seg, opts.platform, opts.dir, opts.trim_tail_slash))
}

/// `to-rebol(local, {src-is-dir?})` (spec §4.6): the inverse of [`to_local`].
///
/// Rejects the legacy MSDOS `vol:file` form (a drive letter followed
/// directly by a relative tail with no root separator, e.g. `C:foo`) per
/// the spec's documented-rejected open question (SPEC_FULL §11): the
/// normalizer has no notion of "current directory on drive C" to resolve
/// that against, so it raises `bad-make` rather than silently guessing.
pub fn to_rebol(local: &str, opts: &ToRebolOptions) -> Result<String, Raised> {
    let (drive, rest) = match opts.platform {
        Platform::Windows => split_drive(local)?,
        Platform::Posix => (None, local),
    };

    let sep = match opts.platform {
        Platform::Windows => '\\',
        Platform::Posix => '/',
    };
    let normalized = collapse_separators(rest, sep);
    let parts: Vec<String> =
        normalized.split('/').filter(|s| !s.is_empty()).map(|s| s.to_string()).collect();

    let mut out = String::from("/");
    if let Some(d) = drive {
        out.push(d.to_ascii_lowercase());
        out.push('/');
    }
    out.push_str(&parts.join("/"));
    if opts.src_is_dir && !out.ends_with('/') {
        out.push('/');
    }
    Ok(out)
}

/// Split a Windows-local path into an optional drive letter and the
/// remainder. Returns `bad-make` for the legacy `C:foo` (no separator right
/// after the colon, and something follows it) form.
fn split_drive(local: &str) -> Result<(Option<char>, &str), Raised> {
    let mut chars = local.chars();
    let Some(first) = chars.next() else {
        return Ok((None, local));
    };
    if !first.is_ascii_alphabetic() || chars.next() != Some(':') {
        return Ok((None, local));
    }
    let rest = &local[2..];
    match rest.chars().next() {
        None => Ok((Some(first), rest)),
        Some('\\') | Some('/') => Ok((Some(first), &rest[1..])),
        Some(_) => {
            fail!(
                ErrorId::BadMake,
                "legacy vol:file path form is not supported",
                local
            );
        }
    }
}

/// Collapse runs of `sep` (and the other slash style, which local text
/// should not contain but tolerated defensively) into a single `/`.
fn collapse_separators(text: &str, sep: char) -> String {
    let mut out = String::with_capacity(text.len());
    let mut last_was_sep = false;
    for c in text.chars() {
        let is_sep = c == sep || c == '/' || c == '\\';
        if is_sep {
            if !last_was_sep {
                out.push('/');
            }
            last_was_sep = true;
        } else {
            out.push(c);
            last_was_sep = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn s4_windows_drive_root_with_dir_flag() {
        let opts = ToLocalOptions { platform: Platform::Windows, dir: true, ..Default::default() };
        let out = to_local("/c/users/me/", &opts).unwrap();
        assert_eq!(out, "C:\\users\\me\\");
    }

    #[test]
    fn s4_posix_drive_segment_is_ordinary() {
        let opts = ToLocalOptions { platform: Platform::Posix, dir: true, ..Default::default() };
        let out = to_local("/c/users/me/", &opts).unwrap();
        assert_eq!(out, "/c/users/me/");
    }

    #[test]
    fn s5_relative_full_pops_one_segment() {
        let opts = ToLocalOptions {
            platform: Platform::Posix,
            full: true,
            cwd: Some("/home/x/y/".to_string()),
            ..Default::default()
        };
        let out = to_local("../a", &opts).unwrap();
        assert_eq!(out, "/home/x/a");
    }

    #[test]
    fn relative_without_full_is_left_relative() {
        let opts = ToLocalOptions::default();
        let out = to_local("a/b", &opts).unwrap();
        assert_eq!(out, "a/b");
    }

    #[test]
    fn dot_segments_are_dropped_even_without_full() {
        let opts = ToLocalOptions::default();
        let out = to_local("a/./b/./c", &opts).unwrap();
        assert_eq!(out, "a/b/c");
    }

    #[test]
    fn to_rebol_windows_drive_round_trips_case_insensitively() {
        let local = to_local("/c/users/me", &ToLocalOptions { platform: Platform::Windows, ..Default::default() })
            .unwrap();
        assert_eq!(local, "C:\\users\\me");
        let back = to_rebol(&local, &ToRebolOptions { platform: Platform::Windows, src_is_dir: false }).unwrap();
        assert_eq!(back, "/c/users/me");
    }

    #[test]
    fn to_rebol_collapses_runs_of_separators() {
        let out = to_rebol(
            "C:\\\\users\\\\\\me",
            &ToRebolOptions { platform: Platform::Windows, src_is_dir: false },
        )
        .unwrap();
        assert_eq!(out, "/c/users/me");
    }

    #[test]
    fn to_rebol_appends_trailing_slash_for_known_directory() {
        let out = to_rebol("/home/x", &ToRebolOptions { platform: Platform::Posix, src_is_dir: true }).unwrap();
        assert_eq!(out, "/home/x/");
    }

    #[test]
    fn law_round_trip_for_redundancy_free_path() {
        // spec §8 law: to-rebol(to-local(p, full:false), src-is-dir:false) == p
        // for p with no redundant slashes or ./.. segments.
        let p = "/home/x/y";
        let local = to_local(p, &ToLocalOptions { platform: Platform::Posix, ..Default::default() }).unwrap();
        let back = to_rebol(&local, &ToRebolOptions { platform: Platform::Posix, src_is_dir: false }).unwrap();
        assert_eq!(back, p);
    }

    #[test]
    fn legacy_vol_file_msdos_syntax_is_rejected() {
        // SPEC_FULL §11 open-question decision: `C:foo` with no root slash
        // stays rejected.
        let err = to_rebol("C:foo", &ToRebolOptions { platform: Platform::Windows, src_is_dir: false })
            .unwrap_err();
        assert_eq!(err.0.id, ErrorId::BadMake);
    }

    #[test]
    fn bare_drive_with_no_tail_is_accepted() {
        let out = to_rebol("C:", &ToRebolOptions { platform: Platform::Windows, src_is_dir: false }).unwrap();
        assert_eq!(out, "/c/");
    }

    #[test]
    fn tempfile_backed_realistic_fixture_round_trips() {
        // No actual I/O: tempfile just gives us a realistic absolute POSIX
        // path string with a random, collision-free leaf component.
        let dir = tempfile::tempdir().unwrap();
        let leaf = dir.path().file_name().unwrap().to_string_lossy().into_owned();
        let rebol_path = format!("/tmp/{leaf}");
        let local = to_local(&rebol_path, &ToLocalOptions { platform: Platform::Posix, ..Default::default() })
            .unwrap();
        assert_eq!(local, rebol_path);
    }
}
