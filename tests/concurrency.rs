//! Concurrent encode/decode against the shared registry and configuration

#![allow(clippy::expect_used, clippy::unwrap_used)]

mod common;

use byteschema::config;
use byteschema::{from_bytes, proto, to_bytes, OneOf2, Pinned};
use common::config_guard;
use std::collections::BTreeMap;
use std::thread;

type Payload = (
    u64,
    String,
    Vec<Pinned<i32, proto::Varint>>,
    BTreeMap<u16, OneOf2<bool, String>>,
);

fn payload(seed: u64) -> Payload {
    let mut map = BTreeMap::new();
    map.insert(seed as u16, OneOf2::First(seed % 2 == 0));
    map.insert((seed + 1) as u16, OneOf2::Second(format!("v{seed}")));
    (
        seed,
        "x".repeat((seed % 64) as usize),
        (0..(seed % 16) as i32).map(|i| Pinned::new(i - 8)).collect(),
        map,
    )
}

#[test]
fn test_parallel_roundtrips() {
    let _guard = config_guard();
    thread::scope(|scope| {
        for worker in 0..8u64 {
            scope.spawn(move || {
                for i in 0..2_000u64 {
                    let value = payload(worker * 10_000 + i);
                    let bytes = to_bytes(&value).expect("encode");
                    assert_eq!(from_bytes::<Payload>(&bytes).expect("decode"), value);
                }
            });
        }
    });
}

#[test]
fn test_depth_budget_is_per_thread() {
    let _guard = config_guard();
    config::update(|c| c.max_recursion_depth = 6).expect("update");
    // Vec<Vec<Vec<u8>>> needs 4 levels; eight threads at once must not add up
    let nested = vec![vec![vec![1u8, 2], vec![]], vec![vec![3]]];
    thread::scope(|scope| {
        for _ in 0..8 {
            scope.spawn(|| {
                for _ in 0..500 {
                    let bytes = to_bytes(&nested).expect("encode");
                    assert_eq!(from_bytes::<Vec<Vec<Vec<u8>>>>(&bytes).expect("decode"), nested);
                }
            });
        }
    });
}

#[test]
fn test_config_updates_seen_by_other_threads() {
    let _guard = config_guard();
    config::update(|c| c.max_string_size = 1).expect("update");
    let result = thread::spawn(|| from_bytes::<String>(&[0x02, b'a', b'b']))
        .join()
        .expect("join");
    assert!(result.is_err());
}

#[test]
fn test_concurrent_updates_are_not_lost() {
    let _guard = config_guard();
    let start = config::current().expect("current").max_string_size;
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                for _ in 0..50 {
                    config::update(|c| {
                        let seen = c.max_string_size;
                        thread::sleep(std::time::Duration::from_micros(200));
                        c.max_string_size = seen + 1;
                    })
                    .expect("update");
                }
            });
        }
    });
    assert_eq!(config::current().expect("current").max_string_size, start + 200);
}
