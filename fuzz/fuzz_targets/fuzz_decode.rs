#![no_main]

use byteschema::{from_bytes, from_bytes_as, proto, to_bytes, Bytes, OneOf3, Pinned, ProtocolTag};
use libfuzzer_sys::fuzz_target;
use std::collections::BTreeMap;

type Nested = Vec<OneOf3<String, Vec<Pinned<i64, proto::Varint>>, Option<Bytes>>>;

fuzz_target!(|data: &[u8]| {
    // Arbitrary input must fail cleanly, never panic or over-allocate
    let _ = from_bytes::<BTreeMap<String, Vec<u32>>>(data);
    let _ = from_bytes_as::<Vec<u16>>(data, &ProtocolTag::FixedWidth(8));

    // Anything that decodes must survive a canonical round trip
    if let Ok(value) = from_bytes::<Nested>(data) {
        let encoded = to_bytes(&value).expect("re-encode");
        assert_eq!(from_bytes::<Nested>(&encoded).expect("re-decode"), value);
    }
});
