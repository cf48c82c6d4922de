//! Streaming decoder: the same dispatch as the eager decoder, emitted as
//! a lazy event sequence, plus the event-to-value reducer.
//!
//! [`Events`] keeps O(depth) state — a frame stack over a lazily scanned
//! line stream — so taking a prefix of the events only pays for the input
//! it actually covered.

use std::collections::VecDeque;

use serde_json::{Map, Value};

use crate::error::{Error, SequenceKind};
use crate::options::DecodeOptions;
use crate::Result;

use super::parse::{
    array_header, delimited_values, is_tabular_row, key_token, primitive_token, unquoted_char,
    ArrayHeader, KeyToken,
};
use super::scan::{LineScanner, ParsedLine};
use super::{list_item_content, pin, strip_row_dash, DOCUMENT_DELIMITER};

/// One step of the streaming decoder output.
#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    StartObject,
    EndObject,
    StartArray { length: usize },
    EndArray,
    Key { name: String, was_quoted: bool },
    Primitive { value: Value },
}

/// Lazy event stream over a TOON document. Construct with
/// [`crate::decode_events`]; dropping the stream early abandons the rest
/// of the input unscanned.
pub struct Events<'a> {
    scanner: LineScanner<'a>,
    queue: VecDeque<Event>,
    stack: Vec<Frame>,
    state: State,
    pending_error: Option<Error>,
    strict: bool,
}

#[derive(Clone, Copy, PartialEq)]
enum State {
    Start,
    Running,
    Finished,
}

enum Frame {
    Object {
        depth: usize,
        delimiter: char,
        deindent_next: bool,
    },
    List {
        item_depth: usize,
        delimiter: char,
        expected: usize,
        seen: usize,
        header: ParsedLine,
    },
    Tabular {
        base_depth: usize,
        row_depth: Option<usize>,
        delimiter: char,
        fields: Vec<KeyToken>,
        expected: usize,
        seen: usize,
        header: ParsedLine,
    },
}

impl<'a> Events<'a> {
    pub(crate) fn new(input: &'a str, options: &DecodeOptions) -> Self {
        Self {
            scanner: LineScanner::new(input, options.indent.width(), options.strict),
            queue: VecDeque::new(),
            stack: Vec::new(),
            state: State::Start,
            pending_error: None,
            strict: options.strict,
        }
    }

    fn emit(&mut self, event: Event) {
        self.queue.push_back(event);
    }

    fn emit_key(&mut self, key: &KeyToken) {
        self.emit(Event::Key { name: key.text.to_string(), was_quoted: key.quoted });
    }

    fn peek_line(&mut self, index: usize) -> Result<Option<ParsedLine>> {
        Ok(self.scanner.peek(index)?.cloned())
    }

    /// Root dispatch, mirroring the eager decoder's `value_from_lines`.
    fn begin(&mut self) -> Result<()> {
        self.state = State::Running;
        let Some(first) = self.peek_line(0)? else {
            self.emit(Event::StartObject);
            self.emit(Event::EndObject);
            self.state = State::Finished;
            return Ok(());
        };
        if self.strict && first.depth != 0 {
            return Err(pin(Error::syntax("unexpected indentation at document root"), &first));
        }
        let base = first.depth;

        if let Some(header) = array_header(&first.content, DOCUMENT_DELIMITER)
            .map_err(|err| pin(err, &first))?
        {
            if header.key.is_none() {
                self.scanner.bump();
                return self.enter_array(header, base, &first);
            }
        }

        if self.peek_line(1)?.is_none() && unquoted_char(&first.content, ':').is_none() {
            let value =
                primitive_token(&first.content, self.strict).map_err(|err| pin(err, &first))?;
            self.scanner.bump();
            self.emit(Event::Primitive { value });
            self.state = State::Finished;
            return Ok(());
        }

        self.emit(Event::StartObject);
        self.stack.push(Frame::Object {
            depth: base,
            delimiter: DOCUMENT_DELIMITER,
            deindent_next: false,
        });
        Ok(())
    }

    fn step(&mut self) -> Result<()> {
        let Some(top) = self.stack.last() else {
            return match self.peek_line(0)? {
                Some(line) => Err(pin(Error::syntax("unexpected trailing content"), &line)),
                None => {
                    self.state = State::Finished;
                    Ok(())
                }
            };
        };
        match top {
            Frame::Object { depth, delimiter, deindent_next } => {
                let (depth, delimiter, deindent) = (*depth, *delimiter, *deindent_next);
                self.object_step(depth, delimiter, deindent)
            }
            Frame::List { item_depth, delimiter, expected, seen, header } => {
                let (item_depth, delimiter, expected, seen) =
                    (*item_depth, *delimiter, *expected, *seen);
                let header = header.clone();
                self.list_step(item_depth, delimiter, expected, seen, &header)
            }
            Frame::Tabular { base_depth, row_depth, delimiter, fields, expected, seen, header } => {
                let (base_depth, row_depth, delimiter, expected, seen) =
                    (*base_depth, *row_depth, *delimiter, *expected, *seen);
                let fields = fields.clone();
                let header = header.clone();
                self.tabular_step(base_depth, row_depth, delimiter, &fields, expected, seen, &header)
            }
        }
    }

    fn object_step(&mut self, depth: usize, delimiter: char, deindent: bool) -> Result<()> {
        let line = match self.peek_line(0)? {
            Some(line) => line,
            None => {
                self.emit(Event::EndObject);
                self.stack.pop();
                return Ok(());
            }
        };
        let effective = if deindent {
            if let Some(Frame::Object { deindent_next, .. }) = self.stack.last_mut() {
                *deindent_next = false;
            }
            depth
        } else {
            line.depth
        };
        if effective < depth {
            self.emit(Event::EndObject);
            self.stack.pop();
            return Ok(());
        }
        if effective > depth {
            return Err(pin(Error::syntax("unexpected indentation"), &line));
        }
        self.scanner.bump();

        if let Some(header) =
            array_header(&line.content, delimiter).map_err(|err| pin(err, &line))?
        {
            let key = header.key.clone().ok_or_else(|| {
                pin(Error::syntax("array header inside an object needs a key"), &line)
            })?;
            self.emit_key(&key);
            return self.enter_array(header, depth, &line);
        }

        let Some(colon) = unquoted_char(&line.content, ':') else {
            if self.strict {
                return Err(pin(
                    Error::syntax("expected `key: value` or an array header")
                        .with_suggestion("add a `:` after the key"),
                    &line,
                ));
            }
            let key = key_token(&line.content).map_err(|err| pin(err, &line))?;
            self.emit_key(&key);
            self.emit(Event::Primitive { value: Value::Null });
            return Ok(());
        };

        let key = key_token(&line.content[..colon]).map_err(|err| pin(err, &line))?;
        self.emit_key(&key);
        let raw_value = line.content[colon + 1..].trim();
        if raw_value.is_empty() {
            match self.peek_line(0)? {
                Some(next) if next.depth > depth => {
                    self.emit(Event::StartObject);
                    self.stack.push(Frame::Object {
                        depth: depth + 1,
                        delimiter,
                        deindent_next: false,
                    });
                }
                _ => self.emit(Event::Primitive { value: Value::Null }),
            }
        } else {
            let value = primitive_token(raw_value, self.strict).map_err(|err| pin(err, &line))?;
            self.emit(Event::Primitive { value });
        }
        Ok(())
    }

    fn list_step(
        &mut self,
        item_depth: usize,
        delimiter: char,
        expected: usize,
        seen: usize,
        header: &ParsedLine,
    ) -> Result<()> {
        let line = self.peek_line(0)?;
        let ended = match &line {
            None => true,
            Some(line) if line.depth < item_depth => true,
            _ => false,
        };
        if ended {
            if self.strict && seen != expected {
                return Err(pin(
                    Error::length_mismatch(expected, seen, SequenceKind::List),
                    header,
                ));
            }
            self.emit(Event::EndArray);
            self.stack.pop();
            return Ok(());
        }
        let line = line.expect("list line peeked");
        if line.depth > item_depth {
            return Err(pin(Error::syntax("unexpected indentation in list array"), &line));
        }
        let Some(content) = list_item_content(&line.content) else {
            return Err(pin(
                Error::syntax("expected a `- ` list item")
                    .with_suggestion("every element of a list array starts with a dash"),
                &line,
            ));
        };
        let content = content.to_string();
        self.scanner.bump();
        if let Some(Frame::List { seen, .. }) = self.stack.last_mut() {
            *seen += 1;
        }

        if content.is_empty() {
            self.emit(Event::StartObject);
            self.emit(Event::EndObject);
            return Ok(());
        }

        if let Some(header) = array_header(&content, delimiter).map_err(|err| pin(err, &line))? {
            match header.key.clone() {
                None => return self.enter_array(header, item_depth, &line),
                Some(key) => {
                    self.emit(Event::StartObject);
                    self.emit_key(&key);
                    self.stack.push(Frame::Object {
                        depth: item_depth + 1,
                        delimiter,
                        deindent_next: false,
                    });
                    let base_depth = if header.fields.is_some() && !self.strict {
                        item_depth
                    } else {
                        item_depth + 1
                    };
                    return self.enter_array(header, base_depth, &line);
                }
            }
        }

        if let Some(colon) = unquoted_char(&content, ':') {
            let key = key_token(&content[..colon]).map_err(|err| pin(err, &line))?;
            self.emit(Event::StartObject);
            self.emit_key(&key);
            self.stack.push(Frame::Object {
                depth: item_depth + 1,
                delimiter,
                deindent_next: false,
            });
            let raw_value = content[colon + 1..].trim();
            if raw_value.is_empty() {
                match self.peek_line(0)? {
                    Some(next) if next.depth > item_depth + 1 => {
                        self.emit(Event::StartObject);
                        self.stack.push(Frame::Object {
                            depth: item_depth + 2,
                            delimiter,
                            deindent_next: false,
                        });
                    }
                    _ => self.emit(Event::Primitive { value: Value::Null }),
                }
            } else {
                let value =
                    primitive_token(raw_value, self.strict).map_err(|err| pin(err, &line))?;
                self.emit(Event::Primitive { value });
            }
            return Ok(());
        }

        let value = primitive_token(&content, self.strict).map_err(|err| pin(err, &line))?;
        self.emit(Event::Primitive { value });
        if let Some(next) = self.peek_line(0)? {
            if next.depth > item_depth {
                return Err(pin(Error::invalid_object_list_item(), &line));
            }
        }
        Ok(())
    }

    fn tabular_step(
        &mut self,
        base_depth: usize,
        row_depth: Option<usize>,
        delimiter: char,
        fields: &[KeyToken],
        expected: usize,
        seen: usize,
        header: &ParsedLine,
    ) -> Result<()> {
        let line = self.peek_line(0)?;
        let line = match line {
            None => return self.finish_tabular(expected, seen, false, header),
            Some(line) => line,
        };
        let target = match row_depth {
            Some(depth) => depth,
            None => {
                if line.depth <= base_depth {
                    return self.finish_tabular(expected, seen, false, header);
                }
                if self.strict && line.depth != base_depth + 1 {
                    return Err(pin(
                        Error::syntax("unexpected indentation in tabular array"),
                        &line,
                    ));
                }
                if let Some(Frame::Tabular { row_depth, .. }) = self.stack.last_mut() {
                    *row_depth = Some(line.depth);
                }
                line.depth
            }
        };
        if line.depth < target {
            return self.finish_tabular(expected, seen, false, header);
        }
        if line.depth > target {
            return Err(pin(Error::syntax("unexpected indentation in tabular array"), &line));
        }

        let content = strip_row_dash(&line.content);
        let next_line = self.peek_line(1)?;
        let next_content = next_line
            .as_ref()
            .filter(|next| next.depth == target)
            .map(|next| strip_row_dash(&next.content));
        if !is_tabular_row(content, delimiter, next_content) {
            return self.finish_tabular(expected, seen, true, header);
        }

        let cells = delimited_values(content, delimiter).map_err(|err| pin(err, &line))?;
        if cells.len() != fields.len() && self.strict {
            return Err(pin(
                Error::syntax(format!(
                    "row has {} values but the header declares {} fields",
                    cells.len(),
                    fields.len()
                )),
                &line,
            ));
        }
        self.emit(Event::StartObject);
        for (idx, field) in fields.iter().enumerate() {
            let cell = cells.get(idx).copied().unwrap_or("");
            let value = primitive_token(cell, self.strict).map_err(|err| pin(err, &line))?;
            self.emit(Event::Key { name: field.text.to_string(), was_quoted: field.quoted });
            self.emit(Event::Primitive { value });
        }
        self.emit(Event::EndObject);
        self.scanner.bump();
        if let Some(Frame::Tabular { seen, .. }) = self.stack.last_mut() {
            *seen += 1;
        }
        Ok(())
    }

    fn finish_tabular(
        &mut self,
        expected: usize,
        seen: usize,
        deindent: bool,
        header: &ParsedLine,
    ) -> Result<()> {
        if self.strict && seen != expected {
            return Err(pin(
                Error::length_mismatch(expected, seen, SequenceKind::Tabular),
                header,
            ));
        }
        self.stack.pop();
        self.emit(Event::EndArray);
        if deindent {
            if let Some(Frame::Object { deindent_next, .. }) = self.stack.last_mut() {
                *deindent_next = true;
            }
        }
        Ok(())
    }

    /// Mirror of the eager decoder's `array_from_header`.
    fn enter_array(
        &mut self,
        header: ArrayHeader,
        base_depth: usize,
        header_line: &ParsedLine,
    ) -> Result<()> {
        self.emit(Event::StartArray { length: header.len });

        if let Some(inline) = header.inline.as_deref() {
            let cells = delimited_values(inline, header.delimiter)
                .map_err(|err| pin(err, header_line))?;
            if self.strict && cells.len() != header.len {
                return Err(pin(
                    Error::length_mismatch(header.len, cells.len(), SequenceKind::Inline),
                    header_line,
                ));
            }
            for cell in cells {
                let value =
                    primitive_token(cell, self.strict).map_err(|err| pin(err, header_line))?;
                self.emit(Event::Primitive { value });
            }
            self.emit(Event::EndArray);
            return Ok(());
        }

        if let Some(fields) = header.fields {
            self.stack.push(Frame::Tabular {
                base_depth,
                row_depth: None,
                delimiter: header.delimiter,
                fields,
                expected: header.len,
                seen: 0,
                header: header_line.clone(),
            });
            return Ok(());
        }

        if header.len == 0 {
            self.emit(Event::EndArray);
            return Ok(());
        }

        match self.peek_line(0)? {
            Some(next) if next.depth > base_depth => {
                self.stack.push(Frame::List {
                    item_depth: base_depth + 1,
                    delimiter: header.delimiter,
                    expected: header.len,
                    seen: 0,
                    header: header_line.clone(),
                });
                Ok(())
            }
            _ => {
                if self.strict {
                    return Err(pin(Error::expected_value(), header_line));
                }
                self.emit(Event::EndArray);
                Ok(())
            }
        }
    }
}

impl Iterator for Events<'_> {
    type Item = Result<Event>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queue.pop_front() {
                return Some(Ok(event));
            }
            if let Some(err) = self.pending_error.take() {
                self.state = State::Finished;
                return Some(Err(err));
            }
            let result = match self.state {
                State::Finished => return None,
                State::Start => self.begin(),
                State::Running => self.step(),
            };
            if let Err(err) = result {
                self.pending_error = Some(err);
            }
        }
    }
}

/// Rebuild a value from an event sequence using a stack of partial
/// containers. A stream that ends inside a container is `Incomplete`.
pub fn events_to_value<I>(events: I) -> Result<Value>
where
    I: IntoIterator<Item = Result<Event>>,
{
    enum Partial {
        Array(Vec<Value>),
        Object { map: Map<String, Value>, pending: Option<String> },
    }

    fn attach(stack: &mut Vec<Partial>, root: &mut Option<Value>, value: Value) -> Result<()> {
        match stack.last_mut() {
            None => {
                if root.is_some() {
                    return Err(Error::syntax("multiple root values in event stream"));
                }
                *root = Some(value);
                Ok(())
            }
            Some(Partial::Array(items)) => {
                items.push(value);
                Ok(())
            }
            Some(Partial::Object { map, pending }) => {
                let key = pending
                    .take()
                    .ok_or_else(|| Error::syntax("value event without a preceding key"))?;
                map.insert(key, value);
                Ok(())
            }
        }
    }

    let mut stack: Vec<Partial> = Vec::new();
    let mut root: Option<Value> = None;
    for event in events {
        match event? {
            Event::StartObject => {
                stack.push(Partial::Object { map: Map::new(), pending: None });
            }
            Event::StartArray { length } => {
                stack.push(Partial::Array(Vec::with_capacity(length)));
            }
            Event::Key { name, .. } => match stack.last_mut() {
                Some(Partial::Object { pending, .. }) => {
                    if pending.is_some() {
                        return Err(Error::syntax("key event follows an unconsumed key"));
                    }
                    *pending = Some(name);
                }
                _ => return Err(Error::syntax("key event outside an object")),
            },
            Event::Primitive { value } => attach(&mut stack, &mut root, value)?,
            Event::EndObject => match stack.pop() {
                Some(Partial::Object { map, pending: None }) => {
                    attach(&mut stack, &mut root, Value::Object(map))?;
                }
                Some(Partial::Object { .. }) => {
                    return Err(Error::syntax("object ended while a key was pending"));
                }
                _ => return Err(Error::syntax("unbalanced end of object")),
            },
            Event::EndArray => match stack.pop() {
                Some(Partial::Array(items)) => {
                    attach(&mut stack, &mut root, Value::Array(items))?;
                }
                _ => return Err(Error::syntax("unbalanced end of array")),
            },
        }
    }
    if !stack.is_empty() {
        return Err(Error::incomplete());
    }
    root.ok_or_else(Error::incomplete)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::options::DecodeOptions;
    use serde_json::json;

    fn events(input: &str) -> Vec<Event> {
        Events::new(input, &DecodeOptions::default())
            .collect::<Result<Vec<_>>>()
            .unwrap()
    }

    fn key(name: &str) -> Event {
        Event::Key { name: name.to_string(), was_quoted: false }
    }

    fn prim(value: serde_json::Value) -> Event {
        Event::Primitive { value }
    }

    #[rstest::rstest]
    fn test_inline_root_array_events() {
        assert_eq!(
            events("[3]: a,b,c"),
            vec![
                Event::StartArray { length: 3 },
                prim(json!("a")),
                prim(json!("b")),
                prim(json!("c")),
                Event::EndArray,
            ]
        );
    }

    #[rstest::rstest]
    fn test_object_events() {
        assert_eq!(
            events("name: Alice\nage: 30"),
            vec![
                Event::StartObject,
                key("name"),
                prim(json!("Alice")),
                key("age"),
                prim(json!(30.0)),
                Event::EndObject,
            ]
        );
    }

    #[rstest::rstest]
    fn test_tabular_events() {
        assert_eq!(
            events("[2]{id,name}:\n  1,Alice\n  2,Bob"),
            vec![
                Event::StartArray { length: 2 },
                Event::StartObject,
                key("id"),
                prim(json!(1.0)),
                key("name"),
                prim(json!("Alice")),
                Event::EndObject,
                Event::StartObject,
                key("id"),
                prim(json!(2.0)),
                key("name"),
                prim(json!("Bob")),
                Event::EndObject,
                Event::EndArray,
            ]
        );
    }

    #[rstest::rstest]
    fn test_quoted_key_bit_in_events() {
        let got = events("\"user.name\": Alice");
        assert_eq!(
            got[1],
            Event::Key { name: "user.name".to_string(), was_quoted: true }
        );
    }

    #[rstest::rstest]
    fn test_empty_input_is_empty_object() {
        assert_eq!(events(""), vec![Event::StartObject, Event::EndObject]);
    }

    #[rstest::rstest]
    fn test_length_mismatch_surfaces_after_start() {
        let mut stream = Events::new("items[2]:\n  - Apple", &DecodeOptions::default());
        assert!(matches!(stream.next(), Some(Ok(Event::StartObject))));
        assert!(matches!(stream.next(), Some(Ok(Event::Key { .. }))));
        assert!(matches!(stream.next(), Some(Ok(Event::StartArray { length: 2 }))));
        assert!(matches!(stream.next(), Some(Ok(Event::Primitive { .. }))));
        let err = stream.next().unwrap().unwrap_err();
        assert!(matches!(
            err.kind,
            crate::error::ErrorKind::LengthMismatch { expected: 2, actual: 1, .. }
        ));
        assert!(stream.next().is_none());
    }

    #[rstest::rstest]
    fn test_take_prefix_is_lazy() {
        let big = format!("[1000000]:{}", "\n  - x".repeat(4));
        let mut stream = Events::new(&big, &DecodeOptions::default());
        assert!(matches!(
            stream.next(),
            Some(Ok(Event::StartArray { length: 1_000_000 }))
        ));
        assert!(matches!(stream.next(), Some(Ok(Event::Primitive { .. }))));
    }

    #[rstest::rstest]
    fn test_events_to_value_round_trip() {
        let value = events_to_value(Events::new(
            "name: Alice\nitems[2]: 1,2",
            &DecodeOptions::default(),
        ))
        .unwrap();
        assert_eq!(value, json!({"name": "Alice", "items": [1.0, 2.0]}));
    }

    #[rstest::rstest]
    fn test_events_to_value_incomplete() {
        let truncated = vec![
            Ok(Event::StartObject),
            Ok(key("a")),
            Ok(prim(json!(1))),
        ];
        let err = events_to_value(truncated).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Incomplete);

        let err = events_to_value(Vec::<Result<Event>>::new()).unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::Incomplete);
    }
}
