//! TOON (Token-Oriented Object Notation) encoder/decoder.
//!
//! TOON is a line-oriented, indentation-sensitive interchange format that
//! spends fewer tokens than JSON on the same data while staying readable.
//! Arrays carry their length in a `[N]` header and pick one of three
//! layouts: inline primitives, tabular rows over a shared field set, or a
//! `- ` list.
//!
//! # Examples
//!
//! Encode anything `Serialize`:
//!
//! ```rust
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct User {
//!     name: String,
//!     age: u32,
//! }
//!
//! let user = User { name: "Alice".to_string(), age: 30 };
//! assert_eq!(toon_codec::encode(&user)?, "name: Alice\nage: 30");
//! # Ok::<(), toon_codec::Error>(())
//! ```
//!
//! Uniform object arrays become tables:
//!
//! ```rust
//! use serde_json::json;
//!
//! let rows = json!([{"id": 1, "name": "Alice"}, {"id": 2, "name": "Bob"}]);
//! assert_eq!(toon_codec::encode(&rows)?, "[2]{id,name}:\n  1,Alice\n  2,Bob");
//! # Ok::<(), toon_codec::Error>(())
//! ```
//!
//! Decode back to a value tree (numbers come back as `f64`):
//!
//! ```rust
//! use serde_json::json;
//!
//! let value = toon_codec::decode("scores[3]: 95, 87, 92")?;
//! assert_eq!(value, json!({"scores": [95.0, 87.0, 92.0]}));
//! # Ok::<(), toon_codec::Error>(())
//! ```
//!
//! Key collapsing and path expansion:
//!
//! ```rust
//! use serde_json::json;
//! use toon_codec::{DecodeOptions, EncodeOptions, ExpandPaths, KeyCollapsing};
//!
//! let value = json!({"data": {"config": {"server": "localhost"}}});
//! let options = EncodeOptions::new().with_key_collapsing(KeyCollapsing::Safe);
//! let text = toon_codec::encode_with_options(&value, &options)?;
//! assert_eq!(text, "data.config.server: localhost");
//!
//! let options = DecodeOptions::new().with_expand_paths(ExpandPaths::Safe);
//! assert_eq!(toon_codec::decode_with_options(&text, &options)?, value);
//! # Ok::<(), toon_codec::Error>(())
//! ```
//!
//! Stream events instead of materializing the tree:
//!
//! ```rust
//! use toon_codec::{DecodeOptions, Event};
//!
//! let mut events = toon_codec::decode_events("[3]: a,b,c", &DecodeOptions::default());
//! assert_eq!(events.next().unwrap()?, Event::StartArray { length: 3 });
//! # Ok::<(), toon_codec::Error>(())
//! ```

mod encode;
mod error;
mod normalize;
mod num;
mod options;
mod text;

mod decode;

use serde::de::DeserializeOwned;
use serde::Serialize;
pub use serde_json::Value;

pub use crate::decode::events::{events_to_value, Event, Events};
pub use crate::error::{Error, ErrorKind, Location, SequenceKind};
pub use crate::options::{
    DecodeOptions, Delimiter, EncodeOptions, ExpandPaths, Indent, KeyCollapsing,
};

pub type Result<T> = std::result::Result<T, Error>;

/// Encode a value as a TOON document with default options.
///
/// The value goes through `serde_json::to_value` first, so anything
/// `Serialize` works; see [`normalize`] for the canonicalization applied
/// on the way in. The output carries no trailing newline.
pub fn encode<T: Serialize>(value: &T) -> Result<String> {
    encode_with_options(value, &EncodeOptions::default())
}

pub fn encode_with_options<T: Serialize>(value: &T, options: &EncodeOptions) -> Result<String> {
    encode::to_string(value, options)
}

/// Like [`encode`], but yields one string per output line.
pub fn encode_lines<T: Serialize>(value: &T) -> Result<Vec<String>> {
    encode_lines_with_options(value, &EncodeOptions::default())
}

pub fn encode_lines_with_options<T: Serialize>(
    value: &T,
    options: &EncodeOptions,
) -> Result<Vec<String>> {
    encode::to_lines(value, options)
}

/// Decode a TOON document into a [`Value`] with default options
/// (strict mode on, no path expansion).
///
/// All decoded numbers are finite `f64`. When a document repeats a key,
/// the last occurrence wins.
pub fn decode(input: &str) -> Result<Value> {
    decode_with_options(input, &DecodeOptions::default())
}

pub fn decode_with_options(input: &str, options: &DecodeOptions) -> Result<Value> {
    let document = decode::scan::scan(input, options.indent.width(), options.strict)?;
    let node = decode::decode_document(&document, options)?;
    decode::expand::node_to_value(node, options.expand_paths, options.strict)
}

/// Decode from pre-split lines (no newline handling).
pub fn decode_from_lines<I, S>(lines: I) -> Result<Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    decode_from_lines_with_options(lines, &DecodeOptions::default())
}

pub fn decode_from_lines_with_options<I, S>(lines: I, options: &DecodeOptions) -> Result<Value>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let document =
        decode::scan::scan_from_lines(lines, options.indent.width(), options.strict)?;
    let node = decode::decode_document(&document, options)?;
    decode::expand::node_to_value(node, options.expand_paths, options.strict)
}

/// Decode lazily into an [`Event`] stream. The stream holds O(depth)
/// state and only scans as far as the events consumed; reduce it back to
/// a value with [`events_to_value`]. Path expansion does not apply to
/// event streams — `Key` events carry `was_quoted` so consumers can run
/// their own.
pub fn decode_events<'a>(input: &'a str, options: &DecodeOptions) -> Events<'a> {
    Events::new(input, options)
}

/// Decode straight into any `DeserializeOwned` type.
pub fn from_str<T: DeserializeOwned>(input: &str) -> Result<T> {
    from_str_with_options(input, &DecodeOptions::default())
}

pub fn from_str_with_options<T: DeserializeOwned>(
    input: &str,
    options: &DecodeOptions,
) -> Result<T> {
    let value = decode_with_options(input, options)?;
    serde_json::from_value(value)
        .map_err(|err| Error::deserialize(format!("deserialize failed: {err}")))
}

/// Normalize a value tree the way [`encode`] does before layout: `-0.0`
/// flattens to `0.0` and nesting beyond `max_depth` is rejected.
/// Idempotent.
pub fn normalize(value: Value, max_depth: usize) -> Result<Value> {
    normalize::normalize(value, max_depth)
}
