use criterion::{criterion_group, criterion_main, BatchSize, Criterion, Throughput};
use byteschema::{
    from_bytes, proto, record, register_record, to_bytes, Bytes, Pinned, ProtocolTag,
};
use std::collections::BTreeMap;

#[derive(Debug, Default, Clone, PartialEq)]
struct Sample {
    id: u64,
    name: String,
    readings: Vec<Pinned<i32, proto::Varint>>,
    tags: BTreeMap<String, u16>,
    blob: Bytes,
}

record!(Sample {
    id => ProtocolTag::Varint,
    name,
    readings,
    tags,
    blob,
});

fn sample(readings: usize) -> Sample {
    let mut tags = BTreeMap::new();
    tags.insert("site".to_string(), 7);
    tags.insert("rack".to_string(), 12);
    Sample {
        id: 123_456_789,
        name: "sensor-array".into(),
        readings: (0..readings as i32).map(|i| Pinned::new(i * 3 - 500)).collect(),
        tags,
        blob: Bytes::from(vec![0xA5; 256]),
    }
}

#[allow(clippy::unwrap_used)]
fn bench_integers(c: &mut Criterion) {
    let mut group = c.benchmark_group("integers");
    let values: Vec<u64> = (0..1024).map(|i| i * 7919).collect();
    let varint: Vec<Pinned<u64, proto::Varint>> = values.iter().copied().map(Pinned::new).collect();

    group.throughput(Throughput::Elements(values.len() as u64));
    group.bench_function("encode_fixed", |b| b.iter(|| to_bytes(&values).unwrap()));
    group.bench_function("encode_varint", |b| b.iter(|| to_bytes(&varint).unwrap()));

    let fixed_bytes = to_bytes(&values).unwrap();
    let varint_bytes = to_bytes(&varint).unwrap();
    group.bench_function("decode_fixed", |b| {
        b.iter(|| from_bytes::<Vec<u64>>(&fixed_bytes).unwrap())
    });
    group.bench_function("decode_varint", |b| {
        b.iter(|| from_bytes::<Vec<Pinned<u64, proto::Varint>>>(&varint_bytes).unwrap())
    });
    group.finish();
}

#[allow(clippy::unwrap_used)]
fn bench_records(c: &mut Criterion) {
    register_record::<Sample>().unwrap();
    let mut group = c.benchmark_group("records");

    for &readings in &[16usize, 256, 4096] {
        let value = sample(readings);
        let encoded = to_bytes(&value).unwrap();
        group.throughput(Throughput::Bytes(encoded.len() as u64));

        group.bench_function(format!("encode_{readings}"), |b| {
            b.iter_batched(|| value.clone(), |v| to_bytes(&v).unwrap(), BatchSize::SmallInput)
        });
        group.bench_function(format!("decode_{readings}"), |b| {
            b.iter(|| from_bytes::<Sample>(&encoded).unwrap())
        });
    }
    group.finish();
}

criterion_group!(benches, bench_integers, bench_records);
criterion_main!(benches);
