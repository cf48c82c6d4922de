//! Lowering the decoded [`Node`] tree to `serde_json::Value`, reversing
//! key collapsing when path expansion is on.

use serde_json::{Map, Value};

use crate::error::Error;
use crate::options::ExpandPaths;
use crate::text::{is_expandable_key, is_identifier_segment};
use crate::Result;

use super::Node;

pub(crate) fn node_to_value(node: Node, expand: ExpandPaths, strict: bool) -> Result<Value> {
    match node {
        Node::Primitive(value) => Ok(value),
        Node::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(node_to_value(item, expand, strict)?);
            }
            Ok(Value::Array(out))
        }
        Node::Object(entries) => {
            let mut map = Map::with_capacity(entries.len());
            for (key, child) in entries {
                let value = node_to_value(child, expand, strict)?;
                let expandable = expand == ExpandPaths::Safe
                    && !key.quoted
                    && is_expandable_key(&key.text);
                if expandable {
                    let segments: Vec<&str> = key.text.split('.').collect();
                    debug_assert!(segments.iter().all(|s| is_identifier_segment(s)));
                    insert_path(&mut map, &segments, value, strict, &key.text)?;
                } else {
                    insert_literal(&mut map, key.text.to_string(), value, expand, strict)?;
                }
            }
            Ok(Value::Object(map))
        }
    }
}

/// Literal (non-expanded) insertion. Duplicate keys are last-write-wins;
/// under safe expansion two objects deep-merge instead, and an object/
/// non-object collision is a conflict in strict mode.
fn insert_literal(
    map: &mut Map<String, Value>,
    key: String,
    value: Value,
    expand: ExpandPaths,
    strict: bool,
) -> Result<()> {
    if expand == ExpandPaths::Safe {
        if let Some(existing) = map.get_mut(&key) {
            match (existing, value) {
                (Value::Object(target), Value::Object(source)) => {
                    return merge_objects(target, source, strict, &key);
                }
                (existing, value) => {
                    if strict && existing.is_object() != value.is_object() {
                        return Err(Error::expansion_conflict(key));
                    }
                    *existing = value;
                    return Ok(());
                }
            }
        }
    }
    map.insert(key, value);
    Ok(())
}

fn insert_path(
    map: &mut Map<String, Value>,
    segments: &[&str],
    value: Value,
    strict: bool,
    path: &str,
) -> Result<()> {
    let (head, rest) = match segments.split_first() {
        Some(split) => split,
        None => return Err(Error::syntax("empty expansion path")),
    };
    if rest.is_empty() {
        if let Some(existing) = map.get_mut(*head) {
            return match (existing, value) {
                (Value::Object(target), Value::Object(source)) => {
                    merge_objects(target, source, strict, path)
                }
                (existing, value) => {
                    if strict {
                        return Err(Error::expansion_conflict(path));
                    }
                    *existing = value;
                    Ok(())
                }
            };
        }
        map.insert((*head).to_string(), value);
        return Ok(());
    }

    match map.get_mut(*head) {
        Some(Value::Object(_)) => {}
        Some(_) => {
            if strict {
                return Err(Error::expansion_conflict(path));
            }
            map.insert((*head).to_string(), Value::Object(Map::new()));
        }
        None => {
            map.insert((*head).to_string(), Value::Object(Map::new()));
        }
    }
    let nested = map
        .get_mut(*head)
        .and_then(Value::as_object_mut)
        .ok_or_else(|| Error::syntax("expansion target is not an object"))?;
    insert_path(nested, rest, value, strict, path)
}

fn merge_objects(
    target: &mut Map<String, Value>,
    source: Map<String, Value>,
    strict: bool,
    path: &str,
) -> Result<()> {
    for (key, value) in source {
        match target.get_mut(&key) {
            None => {
                target.insert(key, value);
            }
            Some(Value::Object(existing)) => match value {
                Value::Object(source) => merge_objects(existing, source, strict, path)?,
                value => {
                    if strict {
                        return Err(Error::expansion_conflict(path));
                    }
                    target.insert(key, value);
                }
            },
            Some(existing) => {
                if strict {
                    return Err(Error::expansion_conflict(path));
                }
                *existing = value;
            }
        }
    }
    Ok(())
}
