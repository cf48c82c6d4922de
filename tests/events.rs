use rstest::rstest;
use serde_json::json;
use toon_codec::{
    decode, decode_events, events_to_value, DecodeOptions, Event, ErrorKind, Result,
};

fn collect(input: &str) -> Vec<Event> {
    decode_events(input, &DecodeOptions::default())
        .collect::<Result<Vec<_>>>()
        .unwrap()
}

#[rstest]
fn inline_array_event_sequence() {
    assert_eq!(
        collect("[3]: a,b,c"),
        vec![
            Event::StartArray { length: 3 },
            Event::Primitive { value: json!("a") },
            Event::Primitive { value: json!("b") },
            Event::Primitive { value: json!("c") },
            Event::EndArray,
        ]
    );
}

#[rstest]
fn key_events_carry_the_quoted_bit() {
    let events = collect("\"user.name\": Alice\nage: 30");
    assert_eq!(
        events,
        vec![
            Event::StartObject,
            Event::Key { name: "user.name".to_string(), was_quoted: true },
            Event::Primitive { value: json!("Alice") },
            Event::Key { name: "age".to_string(), was_quoted: false },
            Event::Primitive { value: json!(30.0) },
            Event::EndObject,
        ]
    );
}

#[rstest]
#[case("")]
#[case("42")]
#[case("name: Alice\nage: 30")]
#[case("a:\n  b: 1\n  c: 2\nd: 3")]
#[case("a:")]
#[case("[0]:")]
#[case("[2]: 1,2")]
#[case("scores[3]: 95, 87, 92")]
#[case("[2]{id,name}:\n  1,Alice\n  2,Bob")]
#[case("items[3]:\n  - 1\n  - a: 1\n  - text")]
#[case("items[2]:\n  - [2]: 1,2\n  - x")]
#[case("items[2]:\n  - a:\n      b: 1\n  - a:\n      b: 2")]
#[case("items[1]:\n  - users[2]{id,name}:\n      1, Ada\n      2, Bob\n    status: active")]
#[case("items[1]{a,b}:\n  x,y\nother: 1")]
#[case("items[1]{a,b}:\n  x,y\n  other: 1")]
#[case("items[2]:\n  -\n  - 1")]
#[case("tags[3|]: reading|gaming|coding")]
#[case("items[2|]{a|b}:\n  1|2\n  3|4")]
#[case("deep:\n  er:\n    most: 1")]
fn event_stream_reduces_to_the_eager_value(#[case] input: &str) {
    let options = DecodeOptions::default();
    let eager = decode(input).unwrap();
    let streamed = events_to_value(decode_events(input, &options)).unwrap();
    assert_eq!(streamed, eager, "input:\n{input}");
}

#[rstest]
fn lenient_streams_match_too() {
    let options = DecodeOptions::new().with_strict(false);
    for input in ["items[2]: a", "items[1]{a,b}:\n  1", "a: 1\nbare", "items[2]:"] {
        let eager = toon_codec::decode_with_options(input, &options).unwrap();
        let streamed = events_to_value(decode_events(input, &options)).unwrap();
        assert_eq!(streamed, eager, "input:\n{input}");
    }
}

#[rstest]
fn stream_errors_match_eager_errors() {
    for input in [
        "items[2]:\n  - Apple",
        "items[2]{a,b}:\n  1,2",
        "items[2]: a",
        "value: \"bad\\q\"",
        "items[]:",
        "a:\n\tb: 1",
    ] {
        let eager = decode(input).unwrap_err();
        let streamed = events_to_value(decode_events(input, &DecodeOptions::default()));
        let streamed = streamed.unwrap_err();
        assert_eq!(
            std::mem::discriminant(&eager.kind),
            std::mem::discriminant(&streamed.kind),
            "input:\n{input}\n eager: {eager}\n stream: {streamed}"
        );
    }
}

#[rstest]
fn prefix_consumption_stops_early() {
    // Only the consumed prefix is parsed; the malformed tail is never
    // reached.
    let input = "items[3]:\n  - ok\n  - also ok\n  - [broken";
    let mut events = decode_events(input, &DecodeOptions::default());
    assert_eq!(
        events.next().unwrap().unwrap(),
        Event::StartObject
    );
    assert_eq!(
        events.next().unwrap().unwrap(),
        Event::Key { name: "items".to_string(), was_quoted: false }
    );
    assert_eq!(events.next().unwrap().unwrap(), Event::StartArray { length: 3 });
    assert_eq!(
        events.next().unwrap().unwrap(),
        Event::Primitive { value: json!("ok") }
    );
    drop(events);
}

#[rstest]
fn length_error_is_raised_at_the_point_of_detection() {
    let mut events = decode_events("items[2]:\n  - Apple", &DecodeOptions::default());
    let mut seen = Vec::new();
    let err = loop {
        match events.next().unwrap() {
            Ok(event) => seen.push(event),
            Err(err) => break err,
        }
    };
    assert_eq!(
        seen,
        vec![
            Event::StartObject,
            Event::Key { name: "items".to_string(), was_quoted: false },
            Event::StartArray { length: 2 },
            Event::Primitive { value: json!("Apple") },
        ]
    );
    assert!(matches!(err.kind, ErrorKind::LengthMismatch { expected: 2, actual: 1, .. }));
    assert!(events.next().is_none());
}

#[rstest]
fn reducer_rejects_incomplete_streams() {
    let err = events_to_value(vec![
        Ok(Event::StartArray { length: 1 }),
        Ok(Event::Primitive { value: json!(1) }),
    ])
    .unwrap_err();
    assert_eq!(err.kind, ErrorKind::Incomplete);
}
