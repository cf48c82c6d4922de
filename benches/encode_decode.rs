use criterion::{black_box, criterion_group, criterion_main, Criterion};
use serde_json::{json, Value};
use toon_codec::{decode, decode_events, encode, events_to_value, DecodeOptions};

fn sample_document() -> Value {
    let users: Vec<Value> = (0..200)
        .map(|idx| {
            json!({
                "id": idx,
                "name": format!("user-{idx:03}"),
                "active": idx % 3 == 0,
                "score": (idx as f64) * 1.5,
            })
        })
        .collect();
    json!({
        "service": {"name": "directory", "region": "eu-west-1"},
        "users": users,
        "tags": ["alpha", "beta", "gamma"],
    })
}

fn bench_encode(c: &mut Criterion) {
    let value = sample_document();
    c.bench_function("encode_200_rows", |b| {
        b.iter(|| encode(black_box(&value)).unwrap());
    });
}

fn bench_decode(c: &mut Criterion) {
    let text = encode(&sample_document()).unwrap();
    c.bench_function("decode_200_rows", |b| {
        b.iter(|| decode(black_box(&text)).unwrap());
    });
}

fn bench_events(c: &mut Criterion) {
    let text = encode(&sample_document()).unwrap();
    let options = DecodeOptions::default();
    c.bench_function("decode_events_200_rows", |b| {
        b.iter(|| events_to_value(decode_events(black_box(&text), &options)).unwrap());
    });
}

criterion_group!(benches, bench_encode, bench_decode, bench_events);
criterion_main!(benches);
