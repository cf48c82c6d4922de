//! Line scanning: raw text to indent-annotated line records and a cursor.

use std::collections::VecDeque;

use memchr::memchr_iter;

use crate::error::Error;
use crate::Result;

/// One non-blank input line with its indentation resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ParsedLine {
    /// Line content with the indent removed and trailing whitespace
    /// trimmed.
    pub(crate) content: String,
    /// Columns of leading whitespace.
    pub(crate) indent: usize,
    /// `indent / indent_unit` (floored when non-strict tolerates a
    /// non-multiple).
    pub(crate) depth: usize,
    /// 1-based line number in the source text.
    pub(crate) number: usize,
}

/// Scan output: content lines in order, blank lines kept aside.
#[derive(Debug, Default)]
pub(crate) struct ScanDocument {
    pub(crate) lines: Vec<ParsedLine>,
    pub(crate) blank_lines: Vec<ParsedLine>,
}

impl ScanDocument {
    pub(crate) fn cursor(&self) -> Cursor<'_> {
        Cursor { lines: &self.lines, position: 0 }
    }
}

pub(crate) fn scan(input: &str, unit: usize, strict: bool) -> Result<ScanDocument> {
    let mut document = ScanDocument::default();
    let bytes = input.as_bytes();
    let mut start = 0;
    let mut number = 1;
    for end in memchr_iter(b'\n', bytes) {
        push_line(&mut document, &input[start..end], number, unit, strict)?;
        start = end + 1;
        number += 1;
    }
    if start < input.len() {
        push_line(&mut document, &input[start..], number, unit, strict)?;
    }
    Ok(document)
}

pub(crate) fn scan_from_lines<I, S>(lines: I, unit: usize, strict: bool) -> Result<ScanDocument>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut document = ScanDocument::default();
    for (idx, line) in lines.into_iter().enumerate() {
        push_line(&mut document, line.as_ref(), idx + 1, unit, strict)?;
    }
    Ok(document)
}

fn push_line(
    document: &mut ScanDocument,
    raw: &str,
    number: usize,
    unit: usize,
    strict: bool,
) -> Result<()> {
    match parse_line(raw, number, unit, strict)? {
        Scanned::Blank(line) => document.blank_lines.push(line),
        Scanned::Content(line) => document.lines.push(line),
    }
    Ok(())
}

pub(crate) enum Scanned {
    Content(ParsedLine),
    Blank(ParsedLine),
}

/// Resolve one raw line. A tab in the indent is fatal in strict mode and
/// counts as a single space otherwise; an indent that is not a multiple
/// of `unit` is fatal in strict mode and floors to the nearest depth
/// otherwise. Blank and whitespace-only lines skip both checks.
pub(crate) fn parse_line(raw: &str, number: usize, unit: usize, strict: bool) -> Result<Scanned> {
    let raw = raw.strip_suffix('\r').unwrap_or(raw);
    let mut indent = 0;
    let mut offset = 0;
    let mut saw_tab = false;
    for byte in raw.bytes() {
        match byte {
            b' ' => indent += 1,
            b'\t' => {
                saw_tab = true;
                indent += 1;
            }
            _ => break,
        }
        offset += 1;
    }

    let content = raw[offset..].trim_end();
    if content.is_empty() {
        return Ok(Scanned::Blank(ParsedLine {
            content: String::new(),
            indent,
            depth: indent / unit,
            number,
        }));
    }

    if strict && saw_tab {
        return Err(Error::tabs_not_allowed().at(number, 1).with_content(raw));
    }
    if strict && indent % unit != 0 {
        return Err(Error::indent_not_multiple(indent, unit)
            .at(number, indent + 1)
            .with_content(content));
    }

    Ok(Scanned::Content(ParsedLine {
        content: content.to_string(),
        indent,
        depth: indent / unit,
        number,
    }))
}

/// Immutable position over the scanned lines. Advancing yields a new
/// cursor; the cheap `Copy` makes backtracking free.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Cursor<'a> {
    lines: &'a [ParsedLine],
    position: usize,
}

impl<'a> Cursor<'a> {
    pub(crate) fn peek(&self) -> Option<&'a ParsedLine> {
        self.lines.get(self.position)
    }

    pub(crate) fn next(&self) -> Option<(&'a ParsedLine, Cursor<'a>)> {
        self.peek().map(|line| (line, self.advance(1)))
    }

    pub(crate) fn advance(&self, count: usize) -> Cursor<'a> {
        Cursor {
            lines: self.lines,
            position: (self.position + count).min(self.lines.len()),
        }
    }

    pub(crate) fn at_end(&self) -> bool {
        self.position >= self.lines.len()
    }

    pub(crate) fn remaining(&self) -> usize {
        self.lines.len() - self.position
    }

    /// The current line, only if it sits exactly at `depth`.
    pub(crate) fn peek_at_depth(&self, depth: usize) -> Option<&'a ParsedLine> {
        self.peek().filter(|line| line.depth == depth)
    }

    /// True when a line at `depth` appears ahead before any shallower
    /// line.
    pub(crate) fn has_more_at_depth(&self, depth: usize) -> bool {
        for line in &self.lines[self.position..] {
            if line.depth == depth {
                return true;
            }
            if line.depth < depth {
                return false;
            }
        }
        false
    }
}

/// Lazy counterpart of [`scan`] for the event decoder: lines materialize
/// on demand with a small peek buffer, so taking a prefix of the event
/// stream does not pay for scanning the rest of the input.
pub(crate) struct LineScanner<'s> {
    input: &'s str,
    offset: usize,
    next_number: usize,
    unit: usize,
    strict: bool,
    buffer: VecDeque<ParsedLine>,
}

impl<'s> LineScanner<'s> {
    pub(crate) fn new(input: &'s str, unit: usize, strict: bool) -> Self {
        Self {
            input,
            offset: 0,
            next_number: 1,
            unit,
            strict,
            buffer: VecDeque::new(),
        }
    }

    /// The `index`-th unconsumed content line, scanning just far enough
    /// to answer.
    pub(crate) fn peek(&mut self, index: usize) -> Result<Option<&ParsedLine>> {
        while self.buffer.len() <= index {
            if !self.pull()? {
                return Ok(None);
            }
        }
        Ok(self.buffer.get(index))
    }

    /// Consume the current content line. Call only after a successful
    /// `peek(0)`.
    pub(crate) fn bump(&mut self) -> ParsedLine {
        self.buffer.pop_front().expect("bump without peek")
    }

    fn pull(&mut self) -> Result<bool> {
        loop {
            if self.offset >= self.input.len() {
                return Ok(false);
            }
            let rest = &self.input[self.offset..];
            let (raw, consumed) = match memchr::memchr(b'\n', rest.as_bytes()) {
                Some(end) => (&rest[..end], end + 1),
                None => (rest, rest.len()),
            };
            self.offset += consumed;
            let number = self.next_number;
            self.next_number += 1;
            match parse_line(raw, number, self.unit, self.strict)? {
                Scanned::Blank(_) => continue,
                Scanned::Content(line) => {
                    self.buffer.push_back(line);
                    return Ok(true);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lines(input: &str) -> ScanDocument {
        scan(input, 2, true).unwrap()
    }

    #[rstest::rstest]
    fn test_scan_records_indent_depth_and_numbers() {
        let doc = lines("a:\n  b: 1\n    c: 2");
        let got: Vec<(usize, usize, &str)> = doc
            .lines
            .iter()
            .map(|line| (line.number, line.depth, line.content.as_str()))
            .collect();
        assert_eq!(got, vec![(1, 0, "a:"), (2, 1, "b: 1"), (3, 2, "c: 2")]);
    }

    #[rstest::rstest]
    fn test_blank_lines_kept_aside() {
        let doc = lines("a: 1\n\n   \nb: 2");
        assert_eq!(doc.lines.len(), 2);
        assert_eq!(doc.blank_lines.len(), 2);
        assert_eq!(doc.blank_lines[1].number, 3);
        assert_eq!(doc.blank_lines[1].indent, 3);
    }

    #[rstest::rstest]
    fn test_crlf_and_trailing_whitespace_trimmed() {
        let doc = lines("a: 1\r\nb: 2  ");
        assert_eq!(doc.lines[0].content, "a: 1");
        assert_eq!(doc.lines[1].content, "b: 2");
    }

    #[rstest::rstest]
    fn test_strict_rejects_tabs_and_odd_indent() {
        assert!(matches!(
            scan("\tkey: 1", 2, true).unwrap_err().kind,
            crate::error::ErrorKind::TabsNotAllowed
        ));
        assert!(matches!(
            scan("a:\n   b: 1", 2, true).unwrap_err().kind,
            crate::error::ErrorKind::IndentNotMultiple { indent: 3, unit: 2 }
        ));
    }

    #[rstest::rstest]
    fn test_non_strict_tab_counts_one_space() {
        let doc = scan("\t\tkey: 1", 2, false).unwrap();
        assert_eq!(doc.lines[0].indent, 2);
        assert_eq!(doc.lines[0].depth, 1);

        let doc = scan("   key: 1", 2, false).unwrap();
        assert_eq!(doc.lines[0].depth, 1);
    }

    #[rstest::rstest]
    fn test_cursor_operations() {
        let doc = lines("a:\n  b: 1\n  c:\n    d: 2\ne: 3");
        let cursor = doc.cursor();
        assert_eq!(cursor.peek().unwrap().content, "a:");
        assert!(!cursor.at_end());

        let (line, rest) = cursor.next().unwrap();
        assert_eq!(line.content, "a:");
        assert_eq!(rest.peek().unwrap().content, "b: 1");

        assert!(rest.peek_at_depth(1).is_some());
        assert!(rest.peek_at_depth(0).is_none());

        assert!(rest.has_more_at_depth(1));
        assert!(rest.has_more_at_depth(0));
        let at_d = rest.advance(2);
        assert_eq!(at_d.peek().unwrap().content, "d: 2");
        assert!(!at_d.has_more_at_depth(1));

        assert!(cursor.advance(10).at_end());
    }

    #[rstest::rstest]
    fn test_lazy_scanner_matches_eager() {
        let input = "a: 1\n\n  b: 2\nc: 3";
        let doc = scan(input, 2, false).unwrap();
        let mut lazy = LineScanner::new(input, 2, false);
        let mut collected = Vec::new();
        while lazy.peek(0).unwrap().is_some() {
            collected.push(lazy.bump());
        }
        assert_eq!(collected, doc.lines);
    }

    #[rstest::rstest]
    fn test_lazy_scanner_peek_ahead() {
        let mut lazy = LineScanner::new("a: 1\nb: 2\nc: 3", 2, true);
        assert_eq!(lazy.peek(1).unwrap().unwrap().content, "b: 2");
        assert_eq!(lazy.peek(0).unwrap().unwrap().content, "a: 1");
        lazy.bump();
        assert_eq!(lazy.peek(0).unwrap().unwrap().content, "b: 2");
        assert!(lazy.peek(2).unwrap().is_none());
    }
}
