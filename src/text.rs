//! Scalar and key quoting: deciding when a string needs quotes, JSON-style
//! escaping, and the shared shape predicates both halves of the codec use.

use memchr::memchr;

use crate::error::Error;

/// True when `value` cannot appear as a bare scalar with the given
/// delimiter active: it would be mistaken for a keyword, a number, or
/// structure, or it carries characters the line grammar reserves.
pub(crate) fn needs_quoting(value: &str, delimiter: char) -> bool {
    if value.is_empty() || value.chars().all(char::is_whitespace) {
        return true;
    }
    // Leading or trailing whitespace would be lost to line trimming.
    if value.chars().next().is_some_and(char::is_whitespace)
        || value.chars().next_back().is_some_and(char::is_whitespace)
    {
        return true;
    }
    if matches!(value, "true" | "false" | "null") {
        return true;
    }
    if is_numeric_literal(value) {
        return true;
    }
    value.chars().any(|ch| {
        matches!(ch, '[' | ']' | '{' | '}' | '-' | ':' | '"' | '\\' | '\n' | '\r' | '\t')
            || ch == delimiter
    })
}

/// Append `value` with JSON-style escaping in a single scan. Only the five
/// escapes the grammar defines are produced; other control characters pass
/// through literally.
pub(crate) fn escape_into(out: &mut String, value: &str) {
    let mut start = 0;
    for (idx, byte) in value.bytes().enumerate() {
        let escaped = match byte {
            b'\\' => "\\\\",
            b'"' => "\\\"",
            b'\n' => "\\n",
            b'\r' => "\\r",
            b'\t' => "\\t",
            _ => continue,
        };
        if start < idx {
            out.push_str(&value[start..idx]);
        }
        out.push_str(escaped);
        start = idx + 1;
    }
    if start < value.len() {
        out.push_str(&value[start..]);
    }
}

/// Append `value` wrapped in double quotes, escaping as needed.
pub(crate) fn quote_into(out: &mut String, value: &str) {
    out.push('"');
    escape_into(out, value);
    out.push('"');
}

/// Undo [`escape_into`] on the interior of a quoted token (quotes already
/// stripped). Unknown escapes are `BadEscape`.
pub(crate) fn unescape(inner: &str) -> Result<String, Error> {
    let bytes = inner.as_bytes();
    if memchr(b'\\', bytes).is_none() {
        return Ok(inner.to_string());
    }
    let mut out = String::with_capacity(inner.len());
    let mut idx = 0;
    while let Some(offset) = memchr(b'\\', &bytes[idx..]) {
        let pos = idx + offset;
        out.push_str(&inner[idx..pos]);
        match bytes.get(pos + 1) {
            Some(b'\\') => out.push('\\'),
            Some(b'"') => out.push('"'),
            Some(b'n') => out.push('\n'),
            Some(b'r') => out.push('\r'),
            Some(b't') => out.push('\t'),
            Some(&other) => {
                let sequence = format!("\\{}", char::from(other));
                return Err(Error::bad_escape(sequence));
            }
            None => return Err(Error::bad_escape("\\")),
        }
        idx = pos + 2;
    }
    out.push_str(&inner[idx..]);
    Ok(out)
}

/// `[A-Za-z_][A-Za-z0-9_]*` — one segment of a collapsible dotted key.
pub(crate) fn is_identifier_segment(segment: &str) -> bool {
    let bytes = segment.as_bytes();
    let Some(&first) = bytes.first() else {
        return false;
    };
    if !first.is_ascii_alphabetic() && first != b'_' {
        return false;
    }
    bytes[1..]
        .iter()
        .all(|b| b.is_ascii_alphanumeric() || *b == b'_')
}

/// True when every dot-separated segment of `key` is an identifier, i.e.
/// a decoder running path expansion would split it.
pub(crate) fn is_expandable_key(key: &str) -> bool {
    key.contains('.') && key.split('.').all(is_identifier_segment)
}

/// Exact match for the numeric token shape `-?\d+(\.\d+)?([eE][+-]?\d+)?`.
pub(crate) fn is_numeric_literal(token: &str) -> bool {
    let bytes = token.as_bytes();
    let mut idx = 0;
    if bytes.first() == Some(&b'-') {
        idx = 1;
    }
    let int_start = idx;
    while idx < bytes.len() && bytes[idx].is_ascii_digit() {
        idx += 1;
    }
    if idx == int_start {
        return false;
    }
    if bytes.get(idx) == Some(&b'.') {
        idx += 1;
        let frac_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == frac_start {
            return false;
        }
    }
    if matches!(bytes.get(idx), Some(b'e') | Some(b'E')) {
        idx += 1;
        if matches!(bytes.get(idx), Some(b'+') | Some(b'-')) {
            idx += 1;
        }
        let exp_start = idx;
        while idx < bytes.len() && bytes[idx].is_ascii_digit() {
            idx += 1;
        }
        if idx == exp_start {
            return false;
        }
    }
    idx == bytes.len()
}
