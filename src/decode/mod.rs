//! Decoder: TOON text to a value tree.
//!
//! The eager decoder walks a [`scan::Cursor`] and produces a [`Node`]
//! tree — values plus the per-key "was quoted" bit the path expander
//! consults. [`expand`] lowers that tree to `serde_json::Value`.

pub(crate) mod events;
pub(crate) mod expand;
pub(crate) mod parse;
pub(crate) mod scan;

use serde_json::Value;

use crate::error::{Error, SequenceKind};
use crate::options::DecodeOptions;
use crate::Result;

use self::parse::{
    array_header, delimited_values, is_tabular_row, key_token, primitive_token, unquoted_char,
    ArrayHeader, KeyToken,
};
use self::scan::{Cursor, ParsedLine, ScanDocument};

/// Decoded tree prior to path expansion.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Node {
    Primitive(Value),
    Array(Vec<Node>),
    Object(Vec<(KeyToken, Node)>),
}

/// Root delimiter when no enclosing array provides one.
pub(crate) const DOCUMENT_DELIMITER: char = ',';

pub(crate) fn decode_document(document: &ScanDocument, options: &DecodeOptions) -> Result<Node> {
    let decoder = Decoder { strict: options.strict };
    decoder.value_from_lines(document.cursor())
}

struct Decoder {
    strict: bool,
}

/// An array decoded below its header line. `deindent_next` is set when a
/// tabular section ended on a key-value line at row depth; that line
/// belongs to the enclosing object despite the extra indent.
struct DecodedArray<'a> {
    node: Node,
    cursor: Cursor<'a>,
    deindent_next: bool,
}

impl Decoder {
    fn value_from_lines(&self, cursor: Cursor<'_>) -> Result<Node> {
        let Some(first) = cursor.peek() else {
            return Ok(Node::Object(Vec::new()));
        };
        if self.strict && first.depth != 0 {
            return Err(pin(Error::syntax("unexpected indentation at document root"), first));
        }
        let base = first.depth;

        if let Some(header) = array_header(&first.content, DOCUMENT_DELIMITER)
            .map_err(|err| pin(err, first))?
        {
            if header.key.is_none() {
                let decoded =
                    self.array_from_header(&header, cursor.advance(1), base, first)?;
                ensure_consumed(decoded.cursor)?;
                return Ok(decoded.node);
            }
        }

        if cursor.remaining() == 1 && unquoted_char(&first.content, ':').is_none() {
            let value = primitive_token(&first.content, self.strict)
                .map_err(|err| pin(err, first))?;
            return Ok(Node::Primitive(value));
        }

        let (entries, rest) = self.object(cursor, base, DOCUMENT_DELIMITER)?;
        ensure_consumed(rest)?;
        Ok(Node::Object(entries))
    }

    /// Decode object entries at exactly `depth` until a shallower line or
    /// the end of input.
    fn object<'a>(
        &self,
        mut cursor: Cursor<'a>,
        depth: usize,
        delimiter: char,
    ) -> Result<(Vec<(KeyToken, Node)>, Cursor<'a>)> {
        let mut entries = Vec::new();
        let mut deindent_next = false;
        while let Some((line, after)) = cursor.next() {
            let effective = if std::mem::take(&mut deindent_next) { depth } else { line.depth };
            if effective < depth {
                break;
            }
            if effective > depth {
                return Err(pin(Error::syntax("unexpected indentation"), line));
            }

            if let Some(header) =
                array_header(&line.content, delimiter).map_err(|err| pin(err, line))?
            {
                let key = header.key.clone().ok_or_else(|| {
                    pin(Error::syntax("array header inside an object needs a key"), line)
                })?;
                let decoded = self.array_from_header(&header, after, depth, line)?;
                entries.push((key, decoded.node));
                cursor = decoded.cursor;
                deindent_next = decoded.deindent_next;
                continue;
            }

            let Some(colon) = unquoted_char(&line.content, ':') else {
                if self.strict {
                    return Err(pin(
                        Error::syntax("expected `key: value` or an array header")
                            .with_suggestion("add a `:` after the key"),
                        line,
                    ));
                }
                let key = key_token(&line.content).map_err(|err| pin(err, line))?;
                entries.push((key, Node::Primitive(Value::Null)));
                cursor = after;
                continue;
            };

            let key = key_token(&line.content[..colon]).map_err(|err| pin(err, line))?;
            let raw_value = line.content[colon + 1..].trim();
            if raw_value.is_empty() {
                match after.peek() {
                    Some(next) if next.depth > depth => {
                        let (nested, rest) = self.object(after, depth + 1, delimiter)?;
                        entries.push((key, Node::Object(nested)));
                        cursor = rest;
                    }
                    _ => {
                        entries.push((key, Node::Primitive(Value::Null)));
                        cursor = after;
                    }
                }
            } else {
                let value = primitive_token(raw_value, self.strict).map_err(|err| pin(err, line))?;
                entries.push((key, Node::Primitive(value)));
                cursor = after;
            }
        }
        Ok((entries, cursor))
    }

    /// Decode the array a header line introduced. `base_depth` is the
    /// depth children hang under (children live at `base_depth + 1`);
    /// `header_line` positions errors.
    fn array_from_header<'a>(
        &self,
        header: &ArrayHeader,
        cursor: Cursor<'a>,
        base_depth: usize,
        header_line: &ParsedLine,
    ) -> Result<DecodedArray<'a>> {
        if let Some(inline) = header.inline.as_deref() {
            let cells = delimited_values(inline, header.delimiter)
                .map_err(|err| pin(err, header_line))?;
            if self.strict && cells.len() != header.len {
                return Err(pin(
                    Error::length_mismatch(header.len, cells.len(), SequenceKind::Inline),
                    header_line,
                ));
            }
            let mut items = Vec::with_capacity(cells.len());
            for cell in cells {
                let value =
                    primitive_token(cell, self.strict).map_err(|err| pin(err, header_line))?;
                items.push(Node::Primitive(value));
            }
            return Ok(DecodedArray { node: Node::Array(items), cursor, deindent_next: false });
        }

        if let Some(fields) = header.fields.as_deref() {
            return self.tabular(
                cursor,
                base_depth,
                fields,
                header.delimiter,
                header.len,
                header_line,
            );
        }

        if header.len == 0 {
            return Ok(DecodedArray {
                node: Node::Array(Vec::new()),
                cursor,
                deindent_next: false,
            });
        }

        match cursor.peek() {
            Some(next) if next.depth > base_depth => {}
            _ => {
                if self.strict {
                    return Err(pin(Error::expected_value(), header_line));
                }
                return Ok(DecodedArray {
                    node: Node::Array(Vec::new()),
                    cursor,
                    deindent_next: false,
                });
            }
        }
        self.list(cursor, base_depth + 1, header.delimiter, header.len, header_line)
    }

    /// Tabular rows one level under `base_depth`, ending on a shallower
    /// line or a key-value line. Strict mode pins rows at exactly
    /// `base_depth + 1`; non-strict mode takes the first row's depth as
    /// long as it clears the header.
    fn tabular<'a>(
        &self,
        mut cursor: Cursor<'a>,
        base_depth: usize,
        fields: &[KeyToken],
        delimiter: char,
        expected: usize,
        header_line: &ParsedLine,
    ) -> Result<DecodedArray<'a>> {
        let mut rows = Vec::with_capacity(expected);
        let mut deindent_next = false;
        let mut row_depth = None;
        while let Some(line) = cursor.peek() {
            let target = match row_depth {
                Some(depth) => depth,
                None => {
                    if line.depth <= base_depth {
                        break;
                    }
                    if self.strict && line.depth != base_depth + 1 {
                        return Err(pin(
                            Error::syntax("unexpected indentation in tabular array"),
                            line,
                        ));
                    }
                    row_depth = Some(line.depth);
                    line.depth
                }
            };
            if line.depth < target {
                break;
            }
            if line.depth > target {
                return Err(pin(Error::syntax("unexpected indentation in tabular array"), line));
            }
            let content = strip_row_dash(&line.content);
            let next_content = cursor
                .advance(1)
                .peek_at_depth(target)
                .map(|next| strip_row_dash(&next.content));
            if !is_tabular_row(content, delimiter, next_content) {
                deindent_next = true;
                break;
            }
            let cells = delimited_values(content, delimiter).map_err(|err| pin(err, line))?;
            let row = self.tabular_row(&cells, fields, line)?;
            rows.push(row);
            cursor = cursor.advance(1);
        }
        if self.strict && rows.len() != expected {
            return Err(pin(
                Error::length_mismatch(expected, rows.len(), SequenceKind::Tabular),
                header_line,
            ));
        }
        Ok(DecodedArray { node: Node::Array(rows), cursor, deindent_next })
    }

    fn tabular_row(
        &self,
        cells: &[&str],
        fields: &[KeyToken],
        line: &ParsedLine,
    ) -> Result<Node> {
        if cells.len() != fields.len() && self.strict {
            return Err(pin(
                Error::syntax(format!(
                    "row has {} values but the header declares {} fields",
                    cells.len(),
                    fields.len()
                )),
                line,
            ));
        }
        let mut entries = Vec::with_capacity(fields.len());
        for (idx, field) in fields.iter().enumerate() {
            let cell = cells.get(idx).copied().unwrap_or("");
            let value = primitive_token(cell, self.strict).map_err(|err| pin(err, line))?;
            entries.push((field.clone(), Node::Primitive(value)));
        }
        Ok(Node::Object(entries))
    }

    /// List items (`- …`) at exactly `item_depth`.
    fn list<'a>(
        &self,
        mut cursor: Cursor<'a>,
        item_depth: usize,
        delimiter: char,
        expected: usize,
        header_line: &ParsedLine,
    ) -> Result<DecodedArray<'a>> {
        let mut items = Vec::with_capacity(expected);
        while cursor.has_more_at_depth(item_depth) {
            let Some(line) = cursor.peek_at_depth(item_depth) else {
                // A deeper line sits between items.
                match cursor.peek() {
                    Some(line) => {
                        return Err(pin(
                            Error::syntax("unexpected indentation in list array"),
                            line,
                        ));
                    }
                    None => break,
                }
            };
            let Some(item_content) = list_item_content(&line.content) else {
                return Err(pin(
                    Error::syntax("expected a `- ` list item").with_suggestion(
                        "every element of a list array starts with a dash",
                    ),
                    line,
                ));
            };
            let (item, rest) = self.list_item(item_content, cursor.advance(1), item_depth, delimiter, line)?;
            items.push(item);
            cursor = rest;
        }
        if self.strict && items.len() != expected {
            return Err(pin(
                Error::length_mismatch(expected, items.len(), SequenceKind::List),
                header_line,
            ));
        }
        Ok(DecodedArray { node: Node::Array(items), cursor, deindent_next: false })
    }

    /// One list item: nested array, object item, or bare primitive. The
    /// dispatch mirrors the encoder's `- ` emission exactly.
    fn list_item<'a>(
        &self,
        content: &str,
        cursor: Cursor<'a>,
        item_depth: usize,
        delimiter: char,
        line: &ParsedLine,
    ) -> Result<(Node, Cursor<'a>)> {
        if content.is_empty() {
            return Ok((Node::Object(Vec::new()), cursor));
        }

        if let Some(header) = array_header(content, delimiter).map_err(|err| pin(err, line))? {
            let Some(key) = header.key.clone() else {
                let decoded = self.array_from_header(&header, cursor, item_depth, line)?;
                return Ok((decoded.node, decoded.cursor));
            };
            // Keyed header opens an object item; the array's children sit
            // two levels under the dash line. Non-strict tabular blocks
            // additionally tolerate rows one level higher.
            let base_depth = if header.fields.is_some() && !self.strict {
                item_depth
            } else {
                item_depth + 1
            };
            let decoded = self.array_from_header(&header, cursor, base_depth, line)?;
            let mut entries = vec![(key, decoded.node)];
            let (rest_entries, rest) = self.object(decoded.cursor, item_depth + 1, delimiter)?;
            entries.extend(rest_entries);
            return Ok((Node::Object(entries), rest));
        }

        if let Some(colon) = unquoted_char(content, ':') {
            let key = key_token(&content[..colon]).map_err(|err| pin(err, line))?;
            let raw_value = content[colon + 1..].trim();
            let (first_node, after_first) = if raw_value.is_empty() {
                match cursor.peek() {
                    Some(next) if next.depth > item_depth + 1 => {
                        let (nested, rest) = self.object(cursor, item_depth + 2, delimiter)?;
                        (Node::Object(nested), rest)
                    }
                    _ => (Node::Primitive(Value::Null), cursor),
                }
            } else {
                let value = primitive_token(raw_value, self.strict).map_err(|err| pin(err, line))?;
                (Node::Primitive(value), cursor)
            };
            let mut entries = vec![(key, first_node)];
            let (rest_entries, rest) = self.object(after_first, item_depth + 1, delimiter)?;
            entries.extend(rest_entries);
            return Ok((Node::Object(entries), rest));
        }

        let value = primitive_token(content, self.strict).map_err(|err| pin(err, line))?;
        if let Some(next) = cursor.peek() {
            if next.depth > item_depth {
                return Err(pin(Error::invalid_object_list_item(), line));
            }
        }
        Ok((Node::Primitive(value), cursor))
    }
}

/// Tabular rows tolerate an optional leading dash.
pub(crate) fn strip_row_dash(content: &str) -> &str {
    match content.strip_prefix('-') {
        Some(rest) if rest.starts_with(' ') => rest.trim_start(),
        _ => content,
    }
}

pub(crate) fn list_item_content(content: &str) -> Option<&str> {
    let rest = content.strip_prefix('-')?;
    if rest.is_empty() {
        return Some("");
    }
    Some(rest.trim_start())
}

fn ensure_consumed(cursor: Cursor<'_>) -> Result<()> {
    if cursor.at_end() {
        return Ok(());
    }
    match cursor.peek() {
        Some(line) => Err(pin(Error::syntax("unexpected trailing content"), line)),
        None => Ok(()),
    }
}

/// Fill in position and content on an error that lacks them.
pub(crate) fn pin(mut err: Error, line: &ParsedLine) -> Error {
    if err.location.is_none() {
        err = err.at(line.number, line.indent + 1);
    }
    if err.line_content.is_none() {
        err = err.with_content(line.content.clone());
    }
    err
}
