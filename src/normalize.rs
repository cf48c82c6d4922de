//! Value normalization ahead of encoding.
//!
//! Host values reach the codec through `serde`, so most host-specific
//! conversion already happened by the time a [`Value`] exists: non-finite
//! floats arrive as `Null`, map keys arrive as strings, opaque types are
//! whatever their `Serialize` impl produced. What remains is canonical
//! number form and the nesting guard.

use serde_json::{Map, Number, Value};

use crate::error::Error;
use crate::Result;

/// Normalize a value tree in place of host-bridge quirks:
///
/// - `-0.0` becomes `0.0`;
/// - nesting deeper than `max_depth` fails with `DepthExceeded`.
///
/// Normalization is idempotent.
pub fn normalize(value: Value, max_depth: usize) -> Result<Value> {
    normalize_at(value, max_depth, 0)
}

fn normalize_at(value: Value, max_depth: usize, depth: usize) -> Result<Value> {
    if depth > max_depth {
        return Err(Error::depth_exceeded(max_depth));
    }
    match value {
        Value::Number(number) => Ok(Value::Number(normalize_number(number))),
        Value::Array(items) => {
            let mut out = Vec::with_capacity(items.len());
            for item in items {
                out.push(normalize_at(item, max_depth, depth + 1)?);
            }
            Ok(Value::Array(out))
        }
        Value::Object(map) => {
            let mut out = Map::with_capacity(map.len());
            for (key, item) in map {
                out.insert(key, normalize_at(item, max_depth, depth + 1)?);
            }
            Ok(Value::Object(out))
        }
        other => Ok(other),
    }
}

fn normalize_number(number: Number) -> Number {
    if let Some(value) = number.as_f64() {
        if !value.is_finite() {
            // Unreachable through serde_json, which has no non-finite
            // representation; kept so hand-built numbers cannot leak.
            return Number::from(0);
        }
        if value == 0.0 && value.is_sign_negative() {
            return Number::from_f64(0.0).unwrap_or_else(|| Number::from(0));
        }
    }
    number
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[rstest::rstest]
    fn test_negative_zero_flattens() {
        let out = normalize(json!({"n": -0.0}), 10).unwrap();
        let n = out["n"].as_f64().unwrap();
        assert_eq!(n, 0.0);
        assert!(n.is_sign_positive());
    }

    #[rstest::rstest]
    fn test_integers_untouched() {
        let out = normalize(json!({"a": 30, "b": [1, 2]}), 10).unwrap();
        assert_eq!(out, json!({"a": 30, "b": [1, 2]}));
    }

    #[rstest::rstest]
    fn test_depth_guard() {
        let mut value = json!(1);
        for _ in 0..5 {
            value = json!({ "next": value });
        }
        assert!(normalize(value.clone(), 4).is_err());
        assert!(normalize(value, 5).is_ok());
    }

    #[rstest::rstest]
    fn test_idempotent() {
        let value = json!({"a": -0.0, "b": [{"c": 1.5}], "d": null});
        let once = normalize(value, 10).unwrap();
        let twice = normalize(once.clone(), 10).unwrap();
        assert_eq!(once, twice);
    }
}
