//! Encoder: value tree to TOON text.
//!
//! Orchestrates normalization, array shape analysis, key collapsing and
//! line emission. The layout rules live here; quoting lives in
//! [`crate::text`], shape analysis in [`shape`], chain folding in
//! [`collapse`].

pub(crate) mod collapse;
pub(crate) mod shape;
pub(crate) mod writer;

use indexmap::IndexSet;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::Error;
use crate::normalize::normalize;
use crate::num::push_number;
use crate::options::{EncodeOptions, KeyCollapsing};
use crate::text::{is_expandable_key, needs_quoting, quote_into};
use crate::Result;

use self::collapse::collapse_entry;
use self::shape::{classify, ArrayLayout};
use self::writer::Writer;

pub(crate) fn to_string<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<String> {
    render(value, options).map(Writer::finish)
}

pub(crate) fn to_lines<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<Vec<String>> {
    render(value, options).map(Writer::into_lines)
}

fn render<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<Writer> {
    let value = serde_json::to_value(value)
        .map_err(|err| Error::serialize(format!("serialize failed: {err}")))?;
    let value = normalize(value, options.max_depth)?;
    let mut encoder = Encoder::new(options);
    encoder.encode_root(&value)?;
    Ok(encoder.out)
}

struct Encoder {
    out: Writer,
    delimiter: char,
    collapsing: bool,
    flatten_depth: usize,
    root_keys: IndexSet<String>,
}

impl Encoder {
    fn new(options: &EncodeOptions) -> Self {
        Self {
            out: Writer::new(options.indent.width()),
            delimiter: options.delimiter.as_char(),
            collapsing: matches!(options.key_collapsing, KeyCollapsing::Safe),
            flatten_depth: options.flatten_depth.unwrap_or(usize::MAX),
            root_keys: IndexSet::new(),
        }
    }

    fn encode_root(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Object(map) => {
                self.root_keys = map.keys().cloned().collect();
                self.encode_object(map, 0)
            }
            Value::Array(items) => self.encode_array(items, 0, None, false),
            _ => {
                let mut line = String::new();
                self.push_scalar(&mut line, value)?;
                self.out.push(0, line);
                Ok(())
            }
        }
    }

    fn encode_object(&mut self, map: &Map<String, Value>, depth: usize) -> Result<()> {
        let siblings: IndexSet<&str> = map.keys().map(String::as_str).collect();
        for (key, value) in map {
            self.encode_entry(key, value, depth, &siblings)?;
        }
        Ok(())
    }

    fn encode_entry(
        &mut self,
        key: &str,
        value: &Value,
        depth: usize,
        siblings: &IndexSet<&str>,
    ) -> Result<()> {
        if self.collapsing {
            if let Some(folded) =
                collapse_entry(key, value, siblings, &self.root_keys, self.flatten_depth)
            {
                // Collapsed keys are all-identifier chains and stay bare.
                return self.encode_rendered_entry(&folded.key, folded.value, depth);
            }
        }
        let key = self.key_literal(key);
        self.encode_rendered_entry(&key, value, depth)
    }

    fn encode_rendered_entry(&mut self, key: &str, value: &Value, depth: usize) -> Result<()> {
        match value {
            Value::Array(items) => self.encode_array(items, depth, Some(key), false),
            Value::Object(map) => {
                self.out.push(depth, format!("{key}:"));
                self.encode_object(map, depth + 1)
            }
            _ => {
                let mut line = format!("{key}: ");
                self.push_scalar(&mut line, value)?;
                self.out.push(depth, line);
                Ok(())
            }
        }
    }

    /// Emit an array at `depth`. `key` is a pre-rendered key literal;
    /// `dash` marks a list-item position, where the header itself gets a
    /// `- ` prefix and, when keyed, children drop one extra level so they
    /// cannot collide with the item's remaining keys.
    fn encode_array(
        &mut self,
        items: &[Value],
        depth: usize,
        key: Option<&str>,
        dash: bool,
    ) -> Result<()> {
        let child_depth = depth + 1 + usize::from(dash && key.is_some());
        let prefix = if dash { "- " } else { "" };
        match classify(items) {
            ArrayLayout::Empty => {
                let header = self.array_header(key, 0, None);
                self.out.push(depth, format!("{prefix}{header}"));
                Ok(())
            }
            ArrayLayout::Inline => {
                let header = self.array_header(key, items.len(), None);
                let mut line = format!("{prefix}{header} ");
                for (idx, item) in items.iter().enumerate() {
                    if idx > 0 {
                        line.push(self.delimiter);
                    }
                    self.push_scalar(&mut line, item)?;
                }
                self.out.push(depth, line);
                Ok(())
            }
            ArrayLayout::Tabular(fields) => {
                let header = self.array_header(key, items.len(), Some(&fields));
                self.out.push(depth, format!("{prefix}{header}"));
                for item in items {
                    let row = self.tabular_row(item, &fields)?;
                    self.out.push(child_depth, row);
                }
                Ok(())
            }
            ArrayLayout::List => {
                let header = self.array_header(key, items.len(), None);
                self.out.push(depth, format!("{prefix}{header}"));
                for item in items {
                    self.encode_list_item(item, child_depth)?;
                }
                Ok(())
            }
        }
    }

    fn encode_list_item(&mut self, item: &Value, depth: usize) -> Result<()> {
        match item {
            Value::Array(items) => self.encode_array(items, depth, None, true),
            Value::Object(map) => self.encode_object_item(map, depth),
            _ => {
                let mut line = String::from("- ");
                self.push_scalar(&mut line, item)?;
                self.out.push(depth, line);
                Ok(())
            }
        }
    }

    /// Object list item: first entry inline after `- `, remaining entries
    /// one level down, children of the first entry two levels down.
    fn encode_object_item(&mut self, map: &Map<String, Value>, depth: usize) -> Result<()> {
        let mut entries = map.iter();
        let Some((first_key, first_value)) = entries.next() else {
            self.out.push(depth, "-".to_string());
            return Ok(());
        };

        let first_key = self.key_literal(first_key);
        match first_value {
            Value::Array(items) => {
                self.encode_array(items, depth, Some(&first_key), true)?;
            }
            Value::Object(nested) => {
                self.out.push(depth, format!("- {first_key}:"));
                self.encode_object(nested, depth + 2)?;
            }
            _ => {
                let mut line = format!("- {first_key}: ");
                self.push_scalar(&mut line, first_value)?;
                self.out.push(depth, line);
            }
        }

        let siblings: IndexSet<&str> = map.keys().map(String::as_str).collect();
        for (key, value) in entries {
            self.encode_entry(key, value, depth + 1, &siblings)?;
        }
        Ok(())
    }

    fn array_header(&self, key: Option<&str>, len: usize, fields: Option<&[&str]>) -> String {
        let mut line = String::new();
        if let Some(key) = key {
            line.push_str(key);
        }
        line.push('[');
        let mut buffer = itoa::Buffer::new();
        line.push_str(buffer.format(len));
        line.push(']');
        if let Some(fields) = fields {
            line.push('{');
            for (idx, field) in fields.iter().enumerate() {
                if idx > 0 {
                    line.push(self.delimiter);
                }
                line.push_str(&self.key_literal(field));
            }
            line.push('}');
        }
        line.push(':');
        line
    }

    fn tabular_row(&self, item: &Value, fields: &[&str]) -> Result<String> {
        let row = item
            .as_object()
            .ok_or_else(|| Error::serialize("tabular row is not an object"))?;
        let mut line = String::new();
        for (idx, field) in fields.iter().enumerate() {
            if idx > 0 {
                line.push(self.delimiter);
            }
            let cell = row
                .get(*field)
                .ok_or_else(|| Error::serialize("tabular row missing field"))?;
            self.push_scalar(&mut line, cell)?;
        }
        Ok(line)
    }

    fn push_scalar(&self, out: &mut String, value: &Value) -> Result<()> {
        match value {
            Value::Null => out.push_str("null"),
            Value::Bool(true) => out.push_str("true"),
            Value::Bool(false) => out.push_str("false"),
            Value::Number(number) => push_number(out, number),
            Value::String(text) => {
                if needs_quoting(text, self.delimiter) {
                    quote_into(out, text);
                } else {
                    out.push_str(text);
                }
            }
            Value::Array(_) | Value::Object(_) => {
                return Err(Error::serialize("non-primitive value in scalar position"));
            }
        }
        Ok(())
    }

    /// Keys share the scalar quoting rules and additionally quote any
    /// literal dotted key a path-expanding decoder would split.
    fn key_literal(&self, key: &str) -> String {
        let mut out = String::with_capacity(key.len() + 2);
        if needs_quoting(key, self.delimiter) || is_expandable_key(key) {
            quote_into(&mut out, key);
        } else {
            out.push_str(key);
        }
        out
    }
}
