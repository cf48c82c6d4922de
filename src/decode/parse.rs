//! Line-level parsing primitives: keys, array headers, scalar tokens and
//! delimiter-aware splitting. Everything here is quote-aware; a delimiter
//! or colon inside a double-quoted run is never structural.

use memchr::{memchr2, memchr3};
use serde_json::{Number, Value};
use smallvec::SmallVec;
use smol_str::SmolStr;

use crate::error::Error;
use crate::text::{is_numeric_literal, unescape};
use crate::Result;

pub(crate) type TokenBuf<'a> = SmallVec<[&'a str; 16]>;

/// A decoded key with the bit the path expander needs: whether the source
/// spelled it quoted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct KeyToken {
    pub(crate) text: SmolStr,
    pub(crate) quoted: bool,
}

impl KeyToken {
    pub(crate) fn bare(text: &str) -> Self {
        Self { text: SmolStr::new(text), quoted: false }
    }
}

pub(crate) fn key_token(raw: &str) -> Result<KeyToken> {
    let raw = raw.trim();
    if let Some(rest) = raw.strip_prefix('"') {
        let inner = rest
            .strip_suffix('"')
            .filter(|_| raw.len() >= 2)
            .ok_or_else(|| Error::syntax(format!("unterminated quoted key `{raw}`")))?;
        let text = unescape(inner)?;
        return Ok(KeyToken { text: SmolStr::new(text), quoted: true });
    }
    Ok(KeyToken::bare(raw))
}

/// A parsed `key?[N]{fields?}: inline?` header line.
#[derive(Debug, Clone)]
pub(crate) struct ArrayHeader {
    pub(crate) key: Option<KeyToken>,
    pub(crate) len: usize,
    /// Active delimiter for this array: the bracket marker when present,
    /// otherwise inherited from the enclosing array.
    pub(crate) delimiter: char,
    pub(crate) fields: Option<Vec<KeyToken>>,
    /// Raw text after the colon, trimmed; `None` when empty.
    pub(crate) inline: Option<String>,
}

/// Try to read `content` as an array header. Returns `Ok(None)` when the
/// line is not a header at all (no unquoted `[`, or a colon introduces a
/// plain value before the bracket). A line that is recognizably a header
/// but malformed is `BadHeader`.
pub(crate) fn array_header(content: &str, inherited: char) -> Result<Option<ArrayHeader>> {
    let Some(bracket) = unquoted_char(content, '[') else {
        return Ok(None);
    };
    if let Some(colon) = unquoted_char(content, ':') {
        if colon < bracket {
            return Ok(None);
        }
    }
    let Some(bracket_end) = content[bracket + 1..].find(']').map(|idx| bracket + 1 + idx) else {
        return Err(Error::bad_header("array header is missing `]`").with_content(content));
    };

    let key_part = content[..bracket].trim();
    let key = if key_part.is_empty() { None } else { Some(key_token(key_part)?) };

    let inner = content[bracket + 1..bracket_end].trim();
    if inner.is_empty() {
        return Err(Error::bad_header("array header has empty brackets `[]`")
            .with_content(content)
            .with_suggestion("write the element count, e.g. `[3]`"));
    }
    if inner.starts_with('-') {
        return Err(Error::bad_header(format!("array length `{inner}` is negative"))
            .with_content(content));
    }
    let digits_end = inner
        .bytes()
        .position(|byte| !byte.is_ascii_digit())
        .unwrap_or(inner.len());
    if digits_end == 0 {
        return Err(Error::bad_header(format!("array length `{inner}` is not a number"))
            .with_content(content));
    }
    let len: usize = inner[..digits_end]
        .parse()
        .map_err(|_| Error::bad_header(format!("array length `{inner}` is out of range")))?;
    let delimiter = match inner[digits_end..].chars().next() {
        None => inherited,
        Some(marker @ (',' | '\t' | '|')) if inner[digits_end..].chars().count() == 1 => marker,
        Some(_) => {
            return Err(Error::bad_header(format!("invalid delimiter marker in `[{inner}]`"))
                .with_content(content));
        }
    };

    let mut rest = content[bracket_end + 1..].trim_start();
    let mut fields = None;
    if let Some(after_brace) = rest.strip_prefix('{') {
        let Some(end) = unquoted_char(after_brace, '}') else {
            return Err(Error::bad_header("field list is missing `}`").with_content(content));
        };
        let mut parsed = Vec::new();
        for token in delimited_values(&after_brace[..end], delimiter)? {
            if token.is_empty() {
                return Err(Error::bad_header("field list has an empty name")
                    .with_content(content));
            }
            parsed.push(key_token(token)?);
        }
        if parsed.is_empty() {
            return Err(Error::bad_header("field list `{}` is empty").with_content(content));
        }
        fields = Some(parsed);
        rest = after_brace[end + 1..].trim_start();
    }

    let Some(after_colon) = rest.strip_prefix(':') else {
        return Err(Error::bad_header("array header is missing `:`").with_content(content));
    };
    let inline = after_colon.trim();
    let inline = if inline.is_empty() { None } else { Some(inline.to_string()) };

    if fields.is_some() && inline.is_some() {
        return Err(Error::bad_header("tabular header cannot carry inline values")
            .with_content(content));
    }

    Ok(Some(ArrayHeader { key, len, delimiter, fields, inline }))
}

/// Decode one scalar token. Quoted tokens unescape to strings; `null`,
/// `true` and `false` are keywords; tokens with the numeric shape become
/// finite `f64` numbers (`-0` collapses to `+0`); everything else is a
/// bare string.
pub(crate) fn primitive_token(token: &str, strict: bool) -> Result<Value> {
    let token = token.trim();
    if token.starts_with('"') {
        let inner = token
            .get(1..token.len().saturating_sub(1))
            .filter(|_| token.len() >= 2 && token.ends_with('"'))
            .ok_or_else(|| Error::syntax(format!("unterminated string `{token}`")))?;
        return Ok(Value::String(unescape(inner)?));
    }
    match token {
        "" => return Ok(Value::String(String::new())),
        "null" => return Ok(Value::Null),
        "true" => return Ok(Value::Bool(true)),
        "false" => return Ok(Value::Bool(false)),
        _ => {}
    }
    if is_numeric_literal(token) {
        match token.parse::<f64>() {
            Ok(number) if number.is_finite() => {
                let number = if number == 0.0 { 0.0 } else { number };
                let number = Number::from_f64(number)
                    .ok_or_else(|| Error::bad_number(token))?;
                return Ok(Value::Number(number));
            }
            _ if strict => return Err(Error::bad_number(token)),
            _ => return Ok(Value::String(token.to_string())),
        }
    }
    Ok(Value::String(token.to_string()))
}

/// Split `input` on `delimiter` outside double-quoted runs; tokens come
/// back trimmed but otherwise raw (quotes and escapes intact) for
/// [`primitive_token`] to finish.
pub(crate) fn delimited_values(input: &str, delimiter: char) -> Result<TokenBuf<'_>> {
    let mut tokens = TokenBuf::new();
    let bytes = input.as_bytes();
    let delim = delimiter as u8;
    let mut in_quotes = false;
    let mut escape = false;
    let mut start = 0;
    let mut idx = 0;

    while idx < bytes.len() {
        if escape {
            escape = false;
            idx += 1;
            continue;
        }
        if in_quotes {
            match memchr2(b'\\', b'"', &bytes[idx..]) {
                Some(offset) => {
                    let pos = idx + offset;
                    if bytes[pos] == b'\\' {
                        escape = true;
                    } else {
                        in_quotes = false;
                    }
                    idx = pos + 1;
                }
                None => idx = bytes.len(),
            }
            continue;
        }
        match memchr2(delim, b'"', &bytes[idx..]) {
            Some(offset) => {
                let pos = idx + offset;
                if bytes[pos] == b'"' {
                    in_quotes = true;
                    idx = pos + 1;
                    continue;
                }
                tokens.push(input[start..pos].trim());
                start = pos + 1;
                idx = start;
            }
            None => break,
        }
    }

    if in_quotes {
        return Err(Error::syntax("unterminated string in value list").with_content(input));
    }
    if start < bytes.len() || input.ends_with(delimiter) || bytes.is_empty() {
        tokens.push(input[start..].trim());
    }
    Ok(tokens)
}

/// First position of `needle` in `s` outside any double-quoted run.
pub(crate) fn unquoted_char(s: &str, needle: char) -> Option<usize> {
    let bytes = s.as_bytes();
    let needle = needle as u8;
    let mut in_quotes = false;
    let mut escape = false;
    let mut idx = 0;
    while idx < bytes.len() {
        if escape {
            escape = false;
            idx += 1;
            continue;
        }
        if in_quotes {
            match memchr2(b'\\', b'"', &bytes[idx..]) {
                Some(offset) => {
                    let pos = idx + offset;
                    if bytes[pos] == b'\\' {
                        escape = true;
                    } else {
                        in_quotes = false;
                    }
                    idx = pos + 1;
                }
                None => return None,
            }
            continue;
        }
        match memchr3(needle, b'"', b'\\', &bytes[idx..]) {
            Some(offset) => {
                let pos = idx + offset;
                match bytes[pos] {
                    b'"' => in_quotes = true,
                    b'\\' => {}
                    _ => return Some(pos),
                }
                idx = pos + 1;
            }
            None => return None,
        }
    }
    None
}

/// Decide whether a line inside a tabular block is a data row or a
/// key-value line that ends the block:
///
/// - no unquoted colon: row;
/// - no unquoted delimiter: key-value;
/// - delimiter before the first colon: row;
/// - otherwise look at the next line at the same depth and treat this
///   one as a row only if that neighbour reads as a row outright.
pub(crate) fn is_tabular_row(content: &str, delimiter: char, next_same_depth: Option<&str>) -> bool {
    match row_signal(content, delimiter) {
        Some(is_row) => is_row,
        None => next_same_depth
            .map(|next| row_signal(next, delimiter) == Some(true))
            .unwrap_or(false),
    }
}

fn row_signal(content: &str, delimiter: char) -> Option<bool> {
    let colon = unquoted_char(content, ':');
    let delim = unquoted_char(content, delimiter);
    match (colon, delim) {
        (None, _) => Some(true),
        (Some(_), None) => Some(false),
        (Some(colon), Some(delim)) if delim < colon => Some(true),
        _ => None,
    }
}
