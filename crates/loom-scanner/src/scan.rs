//! The scanner proper (spec §4.2).
//!
//! Converts a UTF-8 source string into a nested array of [`Cell`]s,
//! recursively scanning `[...]`/`(...)` and splitting `a/b/c`-shaped runs
//! into PATH (and `a.b.c`-shaped runs into TUPLE) element arrays. Newline
//! occurrences set `newline-before` on the *next* cell produced; a trailing
//! newline before an array's closing bracket marks the array itself
//! `newline-at-tail`.
//!
//! Source text is char-indexed rather than byte-indexed for simplicity;
//! this only affects internal cursor arithmetic, not the scanned values
//! themselves, and keeps every position comparison correct across non-ASCII
//! source (an index in `Vec<char>` is already a codepoint index).

use crate::dates;
use crate::numbers::{self, NumberToken};
use crate::token::{classify_first_byte, is_run_terminator, LexCategory};
use loom_core::cell::{Cell, Payload, SymbolId, WordBinding};
use loom_core::flags::CellFlags;
use loom_core::heart::Heart;
use loom_core::{Error, ErrorId, Raised};
use loom_runtime::array::make_array;
use loom_runtime::Interpreter;

pub struct ScanOptions {
    pub file: Option<String>,
    pub start_line: u32,
}

impl Default for ScanOptions {
    fn default() -> Self {
        ScanOptions { file: None, start_line: 1 }
    }
}

struct Scanner<'a> {
    chars: Vec<char>,
    pos: usize,
    line: u32,
    interp: &'a mut Interpreter,
    file_sym: Option<SymbolId>,
}

/// Scan `source` into a BLOCK-flavored array, returning the cell that
/// refers to it (heart `Block`, newline hints set per spec §4.2).
pub fn scan(interp: &mut Interpreter, source: &str, options: ScanOptions) -> Result<Cell, Raised> {
    let file_sym = options.file.as_deref().map(|f| interp.symbols.intern(f));
    let mut scanner = Scanner {
        chars: source.chars().collect(),
        pos: 0,
        line: options.start_line,
        interp,
        file_sym,
    };
    let (cells, newline_at_tail) = scanner.scan_array(None)?;
    Ok(scanner.finish_array(cells, newline_at_tail, Heart::Block))
}

impl<'a> Scanner<'a> {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.chars.get(self.pos + offset).copied()
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.peek()?;
        self.pos += 1;
        if c == '\n' {
            self.line += 1;
        }
        Some(c)
    }

    fn at_end(&self) -> bool {
        self.pos >= self.chars.len()
    }

    fn finish_array(&mut self, cells: Vec<Cell>, newline_at_tail: bool, heart: Heart) -> Cell {
        let mut stub = make_array(cells, newline_at_tail);
        if self.file_sym.is_some() {
            stub.flags.insert(loom_core::flags::SeriesFlags::HAS_FILE_LINE);
        }
        let node = self.interp.alloc_stub(stub);
        self.interp.manage(node);
        Cell::new(heart, Payload::Series(node))
    }

    /// Skip whitespace and `;`-to-end-of-line comments. Returns whether any
    /// newline was crossed (spec §4.2: "Newline occurrences... set
    /// newline-before on the next token produced").
    fn skip_ws_and_comments(&mut self) -> bool {
        let mut saw_newline = false;
        loop {
            match self.peek() {
                Some(c) if c.is_whitespace() => {
                    if c == '\n' {
                        saw_newline = true;
                    }
                    self.bump();
                }
                Some(';') => {
                    while let Some(c) = self.peek() {
                        if c == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                _ => break,
            }
        }
        saw_newline
    }

    /// Scan a nested array's contents up to (and consuming) `terminator`,
    /// or to end of input if `terminator` is `None` (top level). Returns
    /// the cells and whether the array should mold `newline-at-tail`.
    fn scan_array(&mut self, terminator: Option<char>) -> Result<(Vec<Cell>, bool), Raised> {
        let mut cells = Vec::new();
        let opened_at_line = self.line;
        loop {
            let saw_newline = self.skip_ws_and_comments();
            match (self.peek(), terminator) {
                (None, None) => return Ok((cells, saw_newline)),
                (None, Some(t)) => {
                    return Err(Raised(
                        Error::new(ErrorId::Missing, format!("missing closing '{t}'"))
                            .with_location(self.file_name(), opened_at_line),
                    ));
                }
                (Some(c), Some(t)) if c == t => {
                    self.bump();
                    return Ok((cells, saw_newline));
                }
                (Some(c), _) if c == ']' || c == ')' => {
                    return Err(Raised(Error::new(
                        ErrorId::InvalidChars,
                        format!("unexpected closing '{c}'"),
                    )));
                }
                _ => {
                    let mut value = self.scan_value()?;
                    value.flags.set(CellFlags::NEWLINE_BEFORE, saw_newline);
                    cells.push(value);
                }
            }
        }
    }

    fn file_name(&self) -> String {
        self.file_sym.map(|s| self.interp.symbols.spelling(s).to_string()).unwrap_or_default()
    }

    /// Scan one value, including any leading quote/quasi decoration.
    fn scan_value(&mut self) -> Result<Cell, Raised> {
        let mut quote_count: u8 = 0;
        while self.peek() == Some('\'') && self.peek_at(1).is_some_and(|c| !c.is_ascii_digit()) {
            self.bump();
            quote_count += 1;
        }

        let mut cell = self.scan_value_inner()?;

        for _ in 0..quote_count {
            match cell.quote.quote() {
                Some(q) => cell.quote = q,
                None => {
                    return Err(Raised(Error::new(ErrorId::QuoteOverflow, "quote depth exceeds maximum")));
                }
            }
        }
        Ok(cell)
    }

    fn scan_value_inner(&mut self) -> Result<Cell, Raised> {
        let Some(c) = self.peek() else {
            return Err(Raised(Error::new(ErrorId::Missing, "unexpected end of input")));
        };
        match classify_first_byte(c) {
            LexCategory::BlockOpen => {
                self.bump();
                let (cells, tail) = self.scan_array(Some(']'))?;
                Ok(self.finish_array(cells, tail, Heart::Block))
            }
            LexCategory::GroupOpen => {
                self.bump();
                let (cells, tail) = self.scan_array(Some(')'))?;
                Ok(self.finish_array(cells, tail, Heart::Group))
            }
            LexCategory::BlockClose | LexCategory::GroupClose => Err(Raised(Error::new(
                ErrorId::InvalidChars,
                format!("unexpected closing '{c}'"),
            ))),
            LexCategory::StringDouble => self.scan_string('"', '"'),
            LexCategory::StringBrace => self.scan_string('{', '}'),
            LexCategory::Sharp => self.scan_sharp(),
            LexCategory::File => self.scan_file(),
            LexCategory::Tag => self.scan_tag(),
            LexCategory::Money => self.scan_money(),
            LexCategory::Quasi => self.scan_quasi(),
            LexCategory::Comma => {
                self.bump();
                Ok(Cell::new(Heart::Comma, Payload::Comma))
            }
            LexCategory::WordLike => self.scan_word_like(),
        }
    }

    fn take_run(&mut self) -> String {
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if is_run_terminator(c) {
                break;
            }
            s.push(c);
            self.bump();
        }
        s
    }

    fn scan_string(&mut self, open: char, close: char) -> Result<Cell, Raised> {
        self.bump(); // opening delimiter
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(Raised(Error::new(ErrorId::Missing, "unterminated string"))),
                Some(c) if c == close => break,
                Some('^') => {
                    // caret escape: ^" -> ", ^^ -> ^, ^/ -> newline
                    match self.bump() {
                        Some('"') => s.push('"'),
                        Some('^') => s.push('^'),
                        Some('/') => s.push('\n'),
                        Some(other) => {
                            s.push('^');
                            s.push(other);
                        }
                        None => return Err(Raised(Error::new(ErrorId::Missing, "unterminated escape"))),
                    }
                }
                Some('\r') => {
                    // lone CR is not permitted in strings (spec §6); a CRLF pair
                    // collapses to LF only when the caller explicitly requested it,
                    // which this entry point does not, so CR is rejected outright.
                    return Err(Raised(Error::new(ErrorId::InvalidChars, "lone CR not permitted in string")));
                }
                Some(c) => s.push(c),
            }
        }
        let _ = open;
        Ok(self.finish_text(s, Heart::Text))
    }

    fn finish_text(&mut self, s: String, heart: Heart) -> Cell {
        let mut stub = loom_runtime::series::Stub::new(
            loom_runtime::series::Flavor::String,
            loom_runtime::array_content::Content::Bytes(s.into_bytes()),
        );
        stub.side.misc_scalar = 0;
        let node = self.interp.alloc_stub(stub);
        self.interp.manage(node);
        Cell::new(heart, Payload::Series(node))
    }

    fn scan_sharp(&mut self) -> Result<Cell, Raised> {
        if self.peek_at(1) == Some('{') {
            self.bump(); // '#'
            return self.scan_binary();
        }
        self.bump(); // '#'
        let rest = self.take_run();
        if rest.is_empty() {
            // The zero-codepoint ISSUE, also the truthy "blackhole" marker
            // (spec §9 open question: kept as the same constructor at the
            // scanner level; `loom-core::cell` already splits Blackhole out
            // as its own storable Element at the value-model layer).
            return Ok(self.finish_text(String::new(), Heart::Issue));
        }
        Ok(self.finish_text(rest, Heart::Issue))
    }

    fn scan_binary(&mut self) -> Result<Cell, Raised> {
        self.bump(); // '{'
        let mut hex = String::new();
        loop {
            match self.bump() {
                None => return Err(Raised(Error::new(ErrorId::Missing, "unterminated binary literal"))),
                Some('}') => break,
                Some(c) if c.is_whitespace() => {}
                Some(c) => hex.push(c),
            }
        }
        if hex.len() % 2 != 0 {
            return Err(Raised(Error::new(ErrorId::InvalidChars, "binary literal has odd hex digit count")));
        }
        let mut bytes = Vec::with_capacity(hex.len() / 2);
        let chars: Vec<char> = hex.chars().collect();
        for pair in chars.chunks(2) {
            let s: String = pair.iter().collect();
            let b = u8::from_str_radix(&s, 16)
                .map_err(|_| Raised(Error::new(ErrorId::InvalidChars, "invalid hex digit in binary literal")))?;
            bytes.push(b);
        }
        let mut stub = loom_runtime::series::Stub::new(
            loom_runtime::series::Flavor::Binary,
            loom_runtime::array_content::Content::Bytes(bytes),
        );
        stub.flags.insert(loom_core::flags::SeriesFlags::empty());
        let node = self.interp.alloc_stub(stub);
        self.interp.manage(node);
        Ok(Cell::new(Heart::Binary, Payload::Series(node)))
    }

    fn scan_file(&mut self) -> Result<Cell, Raised> {
        self.bump(); // '%'
        if self.peek() == Some('"') {
            // Quoted path form accepting a wider character set than the
            // bare form below (spec §4.2 "Files").
            let inner = self.scan_string('"', '"')?;
            return Ok(Cell { heart: Heart::File, ..inner });
        }
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_whitespace() || matches!(c, '[' | ']' | '(' | ')' | ':' | ';') {
                break;
            }
            s.push(c);
            self.bump();
        }
        Ok(self.finish_text(s, Heart::File))
    }

    fn scan_tag(&mut self) -> Result<Cell, Raised> {
        self.bump(); // '<'
        let mut s = String::new();
        loop {
            match self.bump() {
                None => return Err(Raised(Error::new(ErrorId::Missing, "unterminated tag"))),
                Some('>') => break,
                Some(c) => s.push(c),
            }
        }
        Ok(self.finish_text(s, Heart::Tag))
    }

    fn scan_money(&mut self) -> Result<Cell, Raised> {
        let run = self.take_run();
        let (cents, currency) = numbers::parse_money(&run)?;
        Ok(Cell::new(Heart::Money, Payload::Money { cents, currency }))
    }

    /// `~word~` quasi form (spec §4.2 pending-quasi accumulation). General
    /// quasi-of-any-value is out of scope for this scanner's simplified
    /// grammar; see `DESIGN.md`.
    fn scan_quasi(&mut self) -> Result<Cell, Raised> {
        self.bump(); // leading '~'
        let mut inner = String::new();
        loop {
            match self.peek() {
                Some('~') => {
                    self.bump();
                    break;
                }
                Some(c) if is_run_terminator(c) => {
                    return Err(Raised(Error::new(ErrorId::Missing, "unterminated quasi form")));
                }
                Some(c) => {
                    inner.push(c);
                    self.bump();
                }
                None => return Err(Raised(Error::new(ErrorId::Missing, "unterminated quasi form"))),
            }
        }
        let sym = self.interp.symbols.intern(&inner);
        let mut cell = Cell::new(Heart::Word, Payload::Word { symbol: sym, binding: WordBinding::Unbound });
        cell.quote = loom_core::quote::QuoteByte::QUASI;
        Ok(cell)
    }

    fn scan_word_like(&mut self) -> Result<Cell, Raised> {
        let run = self.take_run();
        self.classify_run(&run)
    }

    /// Classify an isolated run of word/number/path characters. Splits on
    /// `/` or `.` into PATH/TUPLE segments when the run contains either and
    /// isn't itself a full numeric/date/pair token.
    fn classify_run(&mut self, run: &str) -> Result<Cell, Raised> {
        if run.is_empty() {
            return Err(Raised(Error::new(ErrorId::Missing, "empty token")));
        }

        if let Ok(tok) = numbers::parse_number(run) {
            return Ok(match tok {
                NumberToken::Integer(n) => Cell::new(Heart::Integer, Payload::Integer(n)),
                NumberToken::Decimal(d) => Cell::new(Heart::Decimal, Payload::Decimal(d)),
                NumberToken::Percent(p) => Cell::new(Heart::Percent, Payload::Percent(p)),
            });
        }

        if let Some((xs, ys)) = run.split_once('x') {
            if let (Ok(x), Ok(y)) = (xs.parse::<i32>(), ys.parse::<i32>()) {
                return Ok(Cell::new(Heart::Pair, Payload::Pair(x, y)));
            }
        }

        if looks_like_date(run) {
            let scanned = if run.contains('-') {
                dates::parse_date(run)?
            } else {
                dates::parse_date_slash(run)?
            };
            return Ok(Cell::new(
                Heart::Date,
                Payload::Date { days: scanned.days, nanos: scanned.nanos, zone_minutes: scanned.zone_minutes },
            ));
        }

        if run.contains('@') && !run.starts_with('@') {
            return Ok(self.finish_text(run.to_string(), Heart::Email));
        }

        if run.contains("://") {
            return Ok(self.finish_text(run.to_string(), Heart::Url));
        }

        if run.ends_with(':') && run.len() > 1 && !run[..run.len() - 1].contains([':']) {
            let sym = self.interp.symbols.intern(&run[..run.len() - 1]);
            return Ok(Cell::new(Heart::SetWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound }));
        }
        if let Some(rest) = run.strip_prefix(':') {
            let sym = self.interp.symbols.intern(rest);
            return Ok(Cell::new(Heart::GetWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound }));
        }
        if let Some(rest) = run.strip_prefix('^') {
            let sym = self.interp.symbols.intern(rest);
            return Ok(Cell::new(Heart::MetaWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound }));
        }
        if let Some(rest) = run.strip_prefix('@') {
            let sym = self.interp.symbols.intern(rest);
            return Ok(Cell::new(Heart::TheWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound }));
        }
        if let Some(rest) = run.strip_prefix('&') {
            let sym = self.interp.symbols.intern(rest);
            return Ok(Cell::new(Heart::TypeWord, Payload::Word { symbol: sym, binding: WordBinding::Unbound }));
        }
        if let Some(rest) = run.strip_prefix('/') {
            // Refinement: represented as a 2-element PATH headed by BLANK
            // (spec §4.2 lists REFINEMENT as its own token kind; the value
            // model represents it as a path, matching how a word following
            // a bare `/` is reached during ordinary path scanning below).
            let inner = self.classify_run(rest)?;
            let cells = vec![Cell::new(Heart::Blank, Payload::Blank), inner];
            return Ok(self.finish_array(cells, false, Heart::Path));
        }

        if run.contains('/') {
            let segs: Vec<Cell> =
                run.split('/').map(|s| self.classify_run(s)).collect::<Result<_, _>>()?;
            return Ok(self.finish_array(segs, false, Heart::Path));
        }
        if run.contains('.') && run.chars().filter(|c| *c == '.').count() >= 1 && !run.starts_with('.') {
            let segs: Vec<Cell> =
                run.split('.').map(|s| self.classify_run(s)).collect::<Result<_, _>>()?;
            return Ok(self.finish_array(segs, false, Heart::Tuple));
        }

        let sym = self.interp.symbols.intern(run);
        Ok(Cell::new(Heart::Word, Payload::Word { symbol: sym, binding: WordBinding::Unbound }))
    }
}

fn looks_like_date(run: &str) -> bool {
    let main = run.split('/').next().unwrap_or(run);
    if main.contains('-') {
        let segs: Vec<&str> = main.split('-').collect();
        segs.len() == 3 && segs[0].chars().all(|c| c.is_ascii_digit())
    } else if main.matches('/').count() == 0 && run.matches('/').count() >= 2 {
        let segs: Vec<&str> = run.splitn(3, '/').collect();
        segs.len() >= 3 && segs.iter().take(3).all(|s| s.chars().all(|c| c.is_ascii_digit()))
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loom_runtime::InterpreterOptions;

    fn scan_src(src: &str) -> (Interpreter, Cell) {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let cell = scan(&mut interp, src, ScanOptions::default()).unwrap();
        (interp, cell)
    }

    fn block_cells<'a>(interp: &'a Interpreter, cell: &Cell) -> &'a [Cell] {
        match cell.payload {
            Payload::Series(node) => interp.get_stub(node.0).unwrap().content.cells().unwrap(),
            _ => panic!("expected a block cell"),
        }
    }

    #[test]
    fn scans_set_word_integer_word_integer() {
        let (interp, cell) = scan_src("a: 1 + 2");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells.len(), 4);
        assert_eq!(cells[0].heart, Heart::SetWord);
        assert_eq!(cells[1].heart, Heart::Integer);
        assert_eq!(cells[1].payload, Payload::Integer(1));
        assert_eq!(cells[2].heart, Heart::Word);
        assert_eq!(cells[3].payload, Payload::Integer(2));
    }

    #[test]
    fn nested_block_scans_recursively() {
        let (interp, cell) = scan_src("[1 [2 3]]");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells.len(), 1);
        let inner = block_cells(&interp, &cells[0]);
        assert_eq!(inner.len(), 2);
    }

    #[test]
    fn unclosed_block_raises_missing() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let err = scan(&mut interp, "[1 2", ScanOptions::default()).unwrap_err();
        assert_eq!(err.0.id, ErrorId::Missing);
    }

    #[test]
    fn newline_before_is_set_on_next_token() {
        let (interp, cell) = scan_src("a\nb");
        let cells = block_cells(&interp, &cell);
        assert!(!cells[0].flags.contains(CellFlags::NEWLINE_BEFORE));
        assert!(cells[1].flags.contains(CellFlags::NEWLINE_BEFORE));
    }

    #[test]
    fn trailing_newline_marks_newline_at_tail() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let cell = scan(&mut interp, "[1\n]", ScanOptions::default()).unwrap();
        let node = match cell.payload {
            Payload::Series(n) => n,
            _ => unreachable!(),
        };
        assert!(interp
            .get_stub(node.0)
            .unwrap()
            .flags
            .contains(loom_core::flags::SeriesFlags::NEWLINE_AT_TAIL));
    }

    #[test]
    fn path_splits_on_slash() {
        let (interp, cell) = scan_src("a/b/c");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells[0].heart, Heart::Path);
        let segs = block_cells(&interp, &cells[0]);
        assert_eq!(segs.len(), 3);
    }

    #[test]
    fn tuple_splits_on_dot() {
        let (interp, cell) = scan_src("a.b.c");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells[0].heart, Heart::Tuple);
    }

    #[test]
    fn string_literal_with_caret_escape() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let cell = scan(&mut interp, r#""a^"b""#, ScanOptions::default()).unwrap();
        let cells = block_cells(&interp, &cell);
        let node = match cells[0].payload {
            Payload::Series(n) => n,
            _ => unreachable!(),
        };
        let bytes = interp.get_stub(node.0).unwrap().content.bytes().unwrap();
        assert_eq!(std::str::from_utf8(bytes).unwrap(), "a\"b");
    }

    #[test]
    fn binary_literal_decodes_hex() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let cell = scan(&mut interp, "#{00FF}", ScanOptions::default()).unwrap();
        let cells = block_cells(&interp, &cell);
        let node = match cells[0].payload {
            Payload::Series(n) => n,
            _ => unreachable!(),
        };
        let bytes = interp.get_stub(node.0).unwrap().content.bytes().unwrap();
        assert_eq!(bytes, &[0x00, 0xFF]);
    }

    #[test]
    fn quote_prefix_increments_quote_byte() {
        let (interp, cell) = scan_src("'a");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells[0].quote.depth(), Some(1));
    }

    #[test]
    fn quasi_word_form() {
        let (interp, cell) = scan_src("~foo~");
        let cells = block_cells(&interp, &cell);
        assert!(cells[0].quote.is_quasi());
    }

    #[test]
    fn date_with_month_name() {
        let (interp, cell) = scan_src("1-Jan-2024");
        let cells = block_cells(&interp, &cell);
        assert_eq!(cells[0].heart, Heart::Date);
    }

    #[test]
    fn mismatched_closer_raises() {
        let mut interp = Interpreter::new(InterpreterOptions::default());
        let err = scan(&mut interp, "(1 2]", ScanOptions::default()).unwrap_err();
        assert_eq!(err.0.id, ErrorId::InvalidChars);
    }
}
