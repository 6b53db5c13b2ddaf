//! Built-in codecs for `bool`, the fixed-size integers and the floats.
//!
//! | Type | `FixedWidth` | `Varint` |
//! |---|---|---|
//! | `bool` | 1 byte, `0x00`/`0x01` | no |
//! | `u8`..`u64` | `size_of` bytes in configured byte order | base-128 |
//! | `i8`..`i64` | two's complement, same as the unsigned type | ZigZag + base-128 |
//! | `f32`, `f64` | IEEE-754 bit pattern in configured byte order | no |
//!
//! `FixedWidth(0)` and `FixedWidth(size_of::<T>())` are the same rule; any other width
//! is unsupported for scalars.

use super::io::{Reader, Writer};
use super::varint;
use crate::config::{self, ByteOrder};
use crate::error::{constants, CodecError, Result};
use crate::protocol::resolver::{self, Wire};
use crate::protocol::tag::ProtocolTag;
use crate::utils::metrics::global_metrics;
use std::any::type_name;
use std::fmt;
use std::mem::size_of;
use tracing::warn;

/// Value for a varint that does not fit the target type: the truncating cast under
/// `Ignore`, otherwise `InvalidVarint`.
fn narrowed<T>(raw: impl fmt::Display, cast: T) -> Result<T> {
    if !config::current()?.error_policy.tolerates_lossy_decode() {
        return Err(CodecError::InvalidVarint(constants::ERR_VARINT_RANGE));
    }
    global_metrics().policy_repair();
    warn!(value = %raw, ty = type_name::<T>(), "Varint value narrowed to target width");
    Ok(cast)
}

impl Wire for bool {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::FIXED
    }

    fn supports(tag: &ProtocolTag) -> bool {
        tag.is_natural_width(1)
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        resolver::ensure_supported::<Self>(tag)?;
        w.write_byte(u8::from(*self))
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        resolver::ensure_supported::<Self>(tag)?;
        Ok(r.read_byte()? != 0)
    }
}

macro_rules! int_wire {
    ($($ty:ty => $wide:ty, $write:path, $read:path;)*) => {$(
        impl Wire for $ty {
            fn default_protocol() -> ProtocolTag {
                ProtocolTag::FIXED
            }

            fn supports(tag: &ProtocolTag) -> bool {
                *tag == ProtocolTag::Varint || tag.is_natural_width(size_of::<$ty>())
            }

            fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
                match tag {
                    ProtocolTag::Varint => $write(w, <$wide>::from(*self)),
                    _ if tag.is_natural_width(size_of::<$ty>()) => {
                        let bytes = match config::current()?.byte_order {
                            ByteOrder::Big => self.to_be_bytes(),
                            ByteOrder::Little => self.to_le_bytes(),
                        };
                        w.write_bytes(&bytes)
                    }
                    _ => Err(resolver::unsupported::<Self>(tag)),
                }
            }

            #[allow(unreachable_patterns)]
            fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
                match tag {
                    ProtocolTag::Varint => {
                        let raw = $read(r)?;
                        match <$ty>::try_from(raw) {
                            Ok(value) => Ok(value),
                            Err(_) => narrowed(raw, raw as $ty),
                        }
                    }
                    _ if tag.is_natural_width(size_of::<$ty>()) => {
                        let mut buf = [0u8; size_of::<$ty>()];
                        r.read_bytes(&mut buf)?;
                        Ok(match config::current()?.byte_order {
                            ByteOrder::Big => <$ty>::from_be_bytes(buf),
                            ByteOrder::Little => <$ty>::from_le_bytes(buf),
                        })
                    }
                    _ => Err(resolver::unsupported::<Self>(tag)),
                }
            }
        }
    )*};
}

int_wire! {
    u8 => u64, varint::write_uvarint, varint::read_uvarint;
    u16 => u64, varint::write_uvarint, varint::read_uvarint;
    u32 => u64, varint::write_uvarint, varint::read_uvarint;
    u64 => u64, varint::write_uvarint, varint::read_uvarint;
    i8 => i64, varint::write_svarint, varint::read_svarint;
    i16 => i64, varint::write_svarint, varint::read_svarint;
    i32 => i64, varint::write_svarint, varint::read_svarint;
    i64 => i64, varint::write_svarint, varint::read_svarint;
}

macro_rules! float_wire {
    ($($ty:ty => $bits:ty;)*) => {$(
        impl Wire for $ty {
            fn default_protocol() -> ProtocolTag {
                ProtocolTag::FIXED
            }

            fn supports(tag: &ProtocolTag) -> bool {
                tag.is_natural_width(size_of::<$ty>())
            }

            fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
                resolver::ensure_supported::<Self>(tag)?;
                let bits = self.to_bits();
                let bytes = match config::current()?.byte_order {
                    ByteOrder::Big => bits.to_be_bytes(),
                    ByteOrder::Little => bits.to_le_bytes(),
                };
                w.write_bytes(&bytes)
            }

            fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
                resolver::ensure_supported::<Self>(tag)?;
                let mut buf = [0u8; size_of::<$ty>()];
                r.read_bytes(&mut buf)?;
                let bits = match config::current()?.byte_order {
                    ByteOrder::Big => <$bits>::from_be_bytes(buf),
                    ByteOrder::Little => <$bits>::from_le_bytes(buf),
                };
                Ok(<$ty>::from_bits(bits))
            }
        }
    )*};
}

float_wire! {
    f32 => u32;
    f64 => u64;
}

#[cfg(test)]
mod tests {
    use crate::config::{self, ByteOrder, ErrorPolicy};
    use crate::error::CodecError;
    use crate::protocol::dispatch::{from_bytes, from_bytes_as, to_bytes, to_bytes_as};
    use crate::protocol::tag::ProtocolTag;

    #[test]
    fn test_bool_bytes() {
        let _guard = config::test_guard();
        assert_eq!(&to_bytes(&true).expect("true")[..], &[0x01]);
        assert_eq!(&to_bytes(&false).expect("false")[..], &[0x00]);
        assert!(from_bytes::<bool>(&[0x02]).expect("nonzero"));
        assert!(to_bytes_as(&true, &ProtocolTag::Varint).is_err());
    }

    #[test]
    fn test_fixed_integers_follow_byte_order() {
        let _guard = config::test_guard();
        assert_eq!(&to_bytes(&0x0102_0304u32).expect("be")[..], &[1, 2, 3, 4]);
        assert_eq!(&to_bytes(&-2i16).expect("be")[..], &[0xFF, 0xFE]);

        config::update(|c| c.byte_order = ByteOrder::Little).expect("update");
        assert_eq!(&to_bytes(&0x0102_0304u32).expect("le")[..], &[4, 3, 2, 1]);
        assert_eq!(from_bytes::<u16>(&[0x34, 0x12]).expect("le"), 0x1234);
    }

    #[test]
    fn test_explicit_natural_width() {
        let _guard = config::test_guard();
        let bytes = to_bytes_as(&7u64, &ProtocolTag::FixedWidth(8)).expect("width 8");
        assert_eq!(bytes.len(), 8);
        assert!(to_bytes_as(&7u64, &ProtocolTag::FixedWidth(4)).is_err());
    }

    #[test]
    fn test_varint_extremes() {
        let _guard = config::test_guard();
        for value in [i64::MIN, -1, 0, 1, i64::MAX] {
            let bytes = to_bytes_as(&value, &ProtocolTag::Varint).expect("encode");
            assert_eq!(from_bytes_as::<i64>(&bytes, &ProtocolTag::Varint).expect("decode"), value);
        }
        let bytes = to_bytes_as(&u64::MAX, &ProtocolTag::Varint).expect("encode");
        assert_eq!(bytes.len(), 10);
        assert_eq!(from_bytes_as::<u64>(&bytes, &ProtocolTag::Varint).expect("decode"), u64::MAX);
    }

    #[test]
    fn test_narrowing_policy() {
        let _guard = config::test_guard();
        // 300 does not fit a u8
        let wide = [0xAC, 0x02];
        assert!(matches!(
            from_bytes_as::<u8>(&wide, &ProtocolTag::Varint),
            Err(CodecError::InvalidVarint(_))
        ));

        config::update(|c| c.error_policy = ErrorPolicy::Medium).expect("update");
        assert!(from_bytes_as::<u8>(&wide, &ProtocolTag::Varint).is_err());

        config::update(|c| c.error_policy = ErrorPolicy::Ignore).expect("update");
        assert_eq!(from_bytes_as::<u8>(&wide, &ProtocolTag::Varint).expect("narrowed"), 44);
    }

    #[test]
    fn test_floats_bit_exact_both_orders() {
        let _guard = config::test_guard();
        let values = [0.0f64, -0.0, 1.5, f64::MIN_POSITIVE, f64::MAX, f64::INFINITY];
        for order in [ByteOrder::Big, ByteOrder::Little] {
            config::update(|c| c.byte_order = order).expect("update");
            for value in values {
                let bytes = to_bytes(&value).expect("encode");
                let back = from_bytes::<f64>(&bytes).expect("decode");
                assert_eq!(back.to_bits(), value.to_bits());
            }
            let nan = f32::from_bits(0x7FC0_0001);
            let back = from_bytes::<f32>(&to_bytes(&nan).expect("nan")).expect("nan");
            assert_eq!(back.to_bits(), nan.to_bits());
        }
    }
}
