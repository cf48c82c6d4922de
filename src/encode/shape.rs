//! Array shape analysis: decides which physical layout an array gets.

use serde_json::Value;

/// Physical layout for an array, chosen from a uniform-shape scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum ArrayLayout<'a> {
    /// `key[0]:`
    Empty,
    /// Every element primitive: `key[N]: v1,v2,…` on one line.
    Inline,
    /// Every element an object over one shared primitive-valued key set:
    /// `key[N]{f1,…}:` with one row per element. Field order comes from
    /// the first element.
    Tabular(Vec<&'a str>),
    /// Anything else: one `- ` item per element.
    List,
}

pub(crate) fn is_primitive(value: &Value) -> bool {
    matches!(
        value,
        Value::Null | Value::Bool(_) | Value::Number(_) | Value::String(_)
    )
}

pub(crate) fn classify(items: &[Value]) -> ArrayLayout<'_> {
    if items.is_empty() {
        return ArrayLayout::Empty;
    }
    if items.iter().all(is_primitive) {
        return ArrayLayout::Inline;
    }
    match tabular_fields(items) {
        Some(fields) => ArrayLayout::Tabular(fields),
        None => ArrayLayout::List,
    }
}

/// The shared field list, if every element is an object with exactly the
/// first element's keys and only primitive values. A row whose value is a
/// container disqualifies the whole array rather than erroring; it falls
/// back to the list layout.
fn tabular_fields(items: &[Value]) -> Option<Vec<&str>> {
    let first = items.first()?.as_object()?;
    if first.is_empty() {
        return None;
    }
    let fields: Vec<&str> = first.keys().map(String::as_str).collect();
    for item in items {
        let row = item.as_object()?;
        if row.len() != fields.len() {
            return None;
        }
        for field in &fields {
            if !is_primitive(row.get(*field)?) {
                return None;
            }
        }
    }
    Some(fields)
}
