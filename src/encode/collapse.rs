//! Key collapsing: fusing single-key object chains into dotted keys.

use indexmap::IndexSet;
use serde_json::Value;

use crate::text::is_identifier_segment;

/// A chain `k: {k1: {k2: v}}` accepted for collapsing: the dotted key and
/// the value the chain bottoms out at.
pub(crate) struct CollapsedEntry<'v> {
    pub(crate) key: String,
    pub(crate) value: &'v Value,
}

/// Try to collapse the entry `(key, value)`. The chain is followed while
/// the current value is a single-entry object, capped at `flatten_depth`
/// segments. The collapse is accepted only when:
///
/// - at least two segments took part,
/// - every segment is an identifier (`[A-Za-z_][A-Za-z0-9_]*`),
/// - the dotted key collides with no sibling of the original entry and no
///   literal key of the document root.
pub(crate) fn collapse_entry<'v>(
    key: &str,
    value: &'v Value,
    siblings: &IndexSet<&str>,
    root_keys: &IndexSet<String>,
    flatten_depth: usize,
) -> Option<CollapsedEntry<'v>> {
    if flatten_depth < 2 {
        return None;
    }

    let mut segments = vec![key];
    let mut cursor = value;
    while segments.len() < flatten_depth {
        let Value::Object(map) = cursor else {
            break;
        };
        if map.len() != 1 {
            break;
        }
        let (next_key, next_value) = map.iter().next()?;
        segments.push(next_key.as_str());
        cursor = next_value;
    }

    if segments.len() < 2 || !segments.iter().all(|segment| is_identifier_segment(segment)) {
        return None;
    }

    let dotted = segments.join(".");
    if siblings.contains(dotted.as_str()) || root_keys.contains(dotted.as_str()) {
        return None;
    }

    Some(CollapsedEntry { key: dotted, value: cursor })
}
