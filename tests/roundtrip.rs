//! Property tests for the codec's round-trip guarantees.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};
use toon_codec::{
    decode, decode_events, encode, events_to_value, normalize, DecodeOptions, EncodeOptions,
    ExpandPaths, KeyCollapsing,
};

/// Decoding pins every number to f64; widen expected values the same way
/// before comparing.
fn widen(value: Value) -> Value {
    match value {
        Value::Number(number) => {
            let float = number.as_f64().expect("finite number");
            Value::Number(Number::from_f64(float).expect("finite number"))
        }
        Value::Array(items) => Value::Array(items.into_iter().map(widen).collect()),
        Value::Object(map) => {
            Value::Object(map.into_iter().map(|(key, value)| (key, widen(value))).collect())
        }
        other => other,
    }
}

fn scalar() -> impl Strategy<Value = Value> {
    prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(|n| Value::Number(Number::from(n))),
        any::<f64>().prop_filter_map("finite", |f| Number::from_f64(f).map(Value::Number)),
        text().prop_map(Value::String),
    ]
}

fn text() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[ -~]{0,12}").unwrap(),
        prop_oneof![
            Just("a\nb".to_string()),
            Just("tab\tseparated".to_string()),
            Just("  padded  ".to_string()),
            Just("naïve café".to_string()),
            Just("- dash".to_string()),
            Just("true".to_string()),
            Just("007".to_string()),
        ],
    ]
}

fn key() -> impl Strategy<Value = String> {
    prop_oneof![
        prop::string::string_regex("[a-zA-Z_][a-zA-Z0-9_]{0,8}").unwrap(),
        prop::string::string_regex("[ -~]{0,10}").unwrap(),
    ]
}

/// Arbitrary value trees. Nested objects are kept non-empty: a bare
/// `key:` line decodes to null, so empty objects only survive at the
/// root.
fn value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::vec((key(), inner), 1..4).prop_map(|entries| {
                Value::Object(entries.into_iter().collect::<Map<String, Value>>())
            }),
        ]
    })
}

fn ident() -> impl Strategy<Value = String> {
    prop::string::string_regex("[a-z_][a-z0-9_]{0,6}").unwrap()
}

/// Nested objects whose keys are all identifier segments, the shape key
/// collapsing applies to.
fn ident_value() -> impl Strategy<Value = Value> {
    scalar().prop_recursive(3, 16, 3, |inner| {
        prop::collection::vec((ident(), inner), 1..3)
            .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<String, Value>>()))
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    #[test]
    fn decode_inverts_encode(value in value()) {
        let text = encode(&value).unwrap();
        let decoded = decode(&text).unwrap();
        let expected = widen(normalize(value, 1000).unwrap());
        prop_assert_eq!(decoded, expected, "document:\n{}", text);
    }

    #[test]
    fn event_stream_agrees_with_eager_decoder(value in value()) {
        let text = encode(&value).unwrap();
        let eager = decode(&text).unwrap();
        let streamed =
            events_to_value(decode_events(&text, &DecodeOptions::default())).unwrap();
        prop_assert_eq!(streamed, eager, "document:\n{}", text);
    }

    #[test]
    fn normalize_is_idempotent(value in value()) {
        let once = normalize(value, 1000).unwrap();
        let twice = normalize(once.clone(), 1000).unwrap();
        prop_assert_eq!(once, twice);
    }

    #[test]
    fn encoded_arrays_declare_their_length(items in prop::collection::vec(scalar(), 0..6)) {
        let value = Value::Array(items.clone());
        let text = encode(&value).unwrap();
        prop_assert!(
            text.starts_with(&format!("[{}]", items.len())),
            "expected length prefix"
        );
        prop_assert!(decode(&text).is_ok(), "document:\n{}", text);
    }

    #[test]
    fn collapse_then_expand_is_identity(value in ident_value()) {
        let encode_options =
            EncodeOptions::new().with_key_collapsing(KeyCollapsing::Safe);
        let decode_options =
            DecodeOptions::new().with_expand_paths(ExpandPaths::Safe);
        let text = toon_codec::encode_with_options(&value, &encode_options).unwrap();
        let round = toon_codec::decode_with_options(&text, &decode_options).unwrap();
        let expected = widen(normalize(value, 1000).unwrap());
        prop_assert_eq!(round, expected, "document:\n{}", text);
    }

    #[test]
    fn encode_never_panics_on_lines(value in value()) {
        let lines = toon_codec::encode_lines(&value).unwrap();
        let joined = lines.join("\n");
        prop_assert_eq!(joined, encode(&value).unwrap());
    }
}
