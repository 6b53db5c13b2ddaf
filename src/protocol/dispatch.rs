//! # Encode / Decode Dispatch
//!
//! The generic entry points. Each call:
//! 1. settles the tag (explicit, else resolved from the type),
//! 2. enters one level of the recursion guard,
//! 3. runs the type's built-in codec for that tag, or the registered user codec.
//!
//! Composite codecs call back into [`encode_with`]/[`decode_with`] for every
//! element, so each element resolves its own tag independently of the outer one.
//!
//! ```rust
//! use byteschema::{from_bytes_as, to_bytes_as, ProtocolTag};
//!
//! let bytes = to_bytes_as(&-1i32, &ProtocolTag::Varint).unwrap();
//! assert_eq!(&bytes[..], &[0x01]);
//! assert_eq!(from_bytes_as::<i32>(&bytes, &ProtocolTag::Varint).unwrap(), -1);
//!
//! let bytes = to_bytes_as(&String::from("hi"), &ProtocolTag::FixedWidth(4)).unwrap();
//! assert_eq!(&bytes[..], b"hi\0\0");
//! ```

use super::depth;
use super::registry;
use super::resolver::{self, Wire};
use super::tag::ProtocolTag;
use crate::config;
use crate::core::io::{Reader, Writer};
use crate::error::{CodecError, Result};
use crate::utils::metrics::{global_metrics, Timer};
use bytes::{BufMut, Bytes, BytesMut};
use std::any::type_name;
use tracing::{trace, warn};

/// Encodes `value` under `tag`, or under its resolved protocol when `tag` is `None`.
pub fn encode_with<T: Wire>(w: &mut Writer<'_>, value: &T, tag: Option<&ProtocolTag>) -> Result<()> {
    let tag = resolver::effective::<T>(tag)?;
    let _depth = depth::enter()?;
    trace!(ty = type_name::<T>(), %tag, "encode");

    if T::supports(&tag) {
        return value.write_wire(w, &tag);
    }
    match registry::global().codec::<T>(&tag)? {
        Some(codec) => codec.encode(w, value),
        None => Err(resolver::unsupported::<T>(&tag)),
    }
}

/// Decodes a `T` under `tag`, or under its resolved protocol when `tag` is `None`.
pub fn decode_with<T: Wire>(r: &mut Reader<'_>, tag: Option<&ProtocolTag>) -> Result<T> {
    let tag = resolver::effective::<T>(tag)?;
    let _depth = depth::enter()?;
    trace!(ty = type_name::<T>(), %tag, "decode");

    if T::supports(&tag) {
        return T::read_wire(r, &tag);
    }
    match registry::global().codec::<T>(&tag)? {
        Some(codec) => codec.decode(r),
        None => Err(resolver::unsupported::<T>(&tag)),
    }
}

/// Encodes under the resolved protocol.
pub fn encode<T: Wire>(w: &mut Writer<'_>, value: &T) -> Result<()> {
    encode_with(w, value, None)
}

/// Encodes under an explicit protocol.
pub fn encode_as<T: Wire>(w: &mut Writer<'_>, value: &T, tag: &ProtocolTag) -> Result<()> {
    encode_with(w, value, Some(tag))
}

/// Decodes under the resolved protocol.
pub fn decode<T: Wire>(r: &mut Reader<'_>) -> Result<T> {
    decode_with(r, None)
}

/// Decodes under an explicit protocol.
pub fn decode_as<T: Wire>(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<T> {
    decode_with(r, Some(tag))
}

fn encode_to_bytes<T: Wire>(value: &T, tag: Option<&ProtocolTag>) -> Result<Bytes> {
    let _timer = Timer::start("encode");
    let metrics = global_metrics();
    let mut sink = BytesMut::with_capacity(64).writer();
    let result = {
        let mut w = Writer::new(&mut sink);
        encode_with(&mut w, value, tag).map(|()| w.bytes_written())
    };
    match result {
        Ok(written) => {
            metrics.value_encoded(written);
            Ok(sink.into_inner().freeze())
        }
        Err(e) => {
            metrics.encode_failed();
            Err(e)
        }
    }
}

fn decode_from_bytes<T: Wire>(bytes: &[u8], tag: Option<&ProtocolTag>) -> Result<T> {
    let _timer = Timer::start("decode");
    let metrics = global_metrics();
    let mut src = bytes;
    let (result, consumed) = {
        let mut r = Reader::new(&mut src);
        let result = decode_with::<T>(&mut r, tag);
        (result, r.bytes_read())
    };
    let value = match result {
        Ok(value) => value,
        Err(e) => {
            metrics.decode_failed();
            return Err(e);
        }
    };

    let remaining = bytes.len().saturating_sub(consumed as usize);
    if remaining > 0 {
        let cfg = config::current()?;
        if cfg.strict_eof {
            if !cfg.error_policy.tolerates_lossy_decode() {
                metrics.decode_failed();
                return Err(CodecError::TrailingBytes { remaining });
            }
            metrics.policy_repair();
            warn!(remaining, ty = type_name::<T>(), "Trailing bytes after decoded value ignored");
        } else {
            trace!(remaining, ty = type_name::<T>(), "Trailing bytes left unread");
        }
    }
    metrics.value_decoded(consumed);
    Ok(value)
}

/// Encodes `value` under its resolved protocol into a fresh buffer.
pub fn to_bytes<T: Wire>(value: &T) -> Result<Bytes> {
    encode_to_bytes(value, None)
}

/// Encodes `value` under `tag` into a fresh buffer.
pub fn to_bytes_as<T: Wire>(value: &T, tag: &ProtocolTag) -> Result<Bytes> {
    encode_to_bytes(value, Some(tag))
}

/// Decodes a complete `T` from `bytes` under its resolved protocol. With
/// `strict_eof`, unread trailing bytes are an error.
pub fn from_bytes<T: Wire>(bytes: &[u8]) -> Result<T> {
    decode_from_bytes(bytes, None)
}

/// Decodes a complete `T` from `bytes` under `tag`.
pub fn from_bytes_as<T: Wire>(bytes: &[u8], tag: &ProtocolTag) -> Result<T> {
    decode_from_bytes(bytes, Some(tag))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_spec_vectors() {
        let _guard = config::test_guard();
        assert_eq!(&to_bytes_as(&300u32, &ProtocolTag::Varint).expect("300")[..], &[0xAC, 0x02]);
        assert_eq!(from_bytes_as::<u32>(&[0xAC, 0x02], &ProtocolTag::Varint).expect("300"), 300);
        assert_eq!(&to_bytes_as(&-1i32, &ProtocolTag::Varint).expect("-1")[..], &[0x01]);
        assert_eq!(from_bytes_as::<i32>(&[0x01], &ProtocolTag::Varint).expect("-1"), -1);
        let hi = String::from("hi");
        assert_eq!(&to_bytes(&hi).expect("varint")[..], &[0x02, b'h', b'i']);
        assert_eq!(
            &to_bytes_as(&hi, &ProtocolTag::FixedWidth(4)).expect("fixed")[..],
            &[b'h', b'i', 0x00, 0x00]
        );
    }

    #[test]
    fn test_unsupported_tag_is_configuration_error() {
        let _guard = config::test_guard();
        let err = to_bytes_as(&1.5f64, &ProtocolTag::Varint).expect_err("float varint");
        assert!(err.is_configuration());
        let err = from_bytes_as::<bool>(&[1], &ProtocolTag::Schema).expect_err("bool schema");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_trailing_bytes_policy() {
        let _guard = config::test_guard();
        assert_eq!(from_bytes::<u8>(&[7, 8]).expect("lenient"), 7);

        config::update(|c| c.strict_eof = true).expect("update");
        assert!(matches!(
            from_bytes::<u8>(&[7, 8]),
            Err(CodecError::TrailingBytes { remaining: 1 })
        ));

        config::update(|c| c.error_policy = config::ErrorPolicy::Ignore).expect("update");
        assert_eq!(from_bytes::<u8>(&[7, 8]).expect("ignored"), 7);
    }

    #[test]
    fn test_depth_unwinds_after_error() {
        let _guard = config::test_guard();
        assert!(from_bytes::<Vec<u32>>(&[0x02, 0x00]).is_err());
        assert_eq!(depth::current(), 0);
    }
}
