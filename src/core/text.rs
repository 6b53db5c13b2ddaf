//! Strings and byte buffers.
//!
//! - `Varint`: base-128 byte length, then the raw bytes. Decode checks the length
//!   against `max_string_size` before allocating.
//! - `FixedWidth(N)`: exactly N bytes, no prefix. `FixedWidth(0)` is the empty value.
//!
//! A fixed-width `String` is truncated on a character boundary and zero-padded on
//! encode; decode drops the trailing zero padding. A fixed-width [`Bytes`] buffer must
//! match N exactly unless the error policy repairs shapes.
//!
//! [`Bytes`] is the owned, reference-counted result type for raw buffers: the decoded
//! allocation is released when the last handle drops.

use super::io::{Reader, Writer};
use super::varint;
use crate::config;
use crate::error::{CodecError, Result};
use crate::protocol::resolver::{self, Wire};
use crate::protocol::tag::ProtocolTag;
use crate::utils::metrics::global_metrics;
use bytes::{Bytes, BytesMut};
use tracing::warn;

fn read_prefixed(r: &mut Reader<'_>, what: &'static str) -> Result<BytesMut> {
    let limit = config::current()?.max_string_size;
    let len = varint::read_length(r, what, limit)?;
    let mut buf = BytesMut::zeroed(len);
    r.read_bytes(&mut buf)?;
    Ok(buf)
}

fn read_exact(r: &mut Reader<'_>, width: usize) -> Result<BytesMut> {
    let mut buf = BytesMut::zeroed(width);
    r.read_bytes(&mut buf)?;
    Ok(buf)
}

/// Longest prefix of `s` that fits `width` bytes without splitting a character.
fn fit_to_width(s: &str, width: usize) -> &str {
    if s.len() <= width {
        return s;
    }
    let mut cut = width;
    while !s.is_char_boundary(cut) {
        cut -= 1;
    }
    &s[..cut]
}

impl Wire for String {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        matches!(tag, ProtocolTag::Varint | ProtocolTag::FixedWidth(_))
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        match *tag {
            ProtocolTag::Varint => {
                varint::write_uvarint(w, self.len() as u64)?;
                w.write_bytes(self.as_bytes())
            }
            ProtocolTag::FixedWidth(width) => {
                let fitted = fit_to_width(self, width);
                w.write_bytes(fitted.as_bytes())?;
                w.write_zeros(width - fitted.len())
            }
            _ => Err(resolver::unsupported::<Self>(tag)),
        }
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        let raw = match *tag {
            ProtocolTag::Varint => read_prefixed(r, "string")?,
            ProtocolTag::FixedWidth(width) => {
                let mut buf = read_exact(r, width)?;
                let end = buf.iter().rposition(|b| *b != 0).map_or(0, |i| i + 1);
                buf.truncate(end);
                buf
            }
            _ => return Err(resolver::unsupported::<Self>(tag)),
        };
        String::from_utf8(raw.to_vec()).map_err(|_| CodecError::InvalidUtf8)
    }
}

impl Wire for Bytes {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        matches!(tag, ProtocolTag::Varint | ProtocolTag::FixedWidth(_))
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        match *tag {
            ProtocolTag::Varint => {
                varint::write_uvarint(w, self.len() as u64)?;
                w.write_bytes(self)
            }
            ProtocolTag::FixedWidth(width) if self.len() == width => w.write_bytes(self),
            ProtocolTag::FixedWidth(width) => {
                if !config::current()?.error_policy.repairs_shape() {
                    return Err(CodecError::length_overflow("byte buffer", self.len(), width));
                }
                global_metrics().policy_repair();
                warn!(len = self.len(), width, "Byte buffer resized to fixed width");
                let kept = self.len().min(width);
                w.write_bytes(&self[..kept])?;
                w.write_zeros(width - kept)
            }
            _ => Err(resolver::unsupported::<Self>(tag)),
        }
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        let buf = match *tag {
            ProtocolTag::Varint => read_prefixed(r, "byte buffer")?,
            ProtocolTag::FixedWidth(width) => read_exact(r, width)?,
            _ => return Err(resolver::unsupported::<Self>(tag)),
        };
        Ok(buf.freeze())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ErrorPolicy;
    use crate::protocol::dispatch::{from_bytes, from_bytes_as, to_bytes, to_bytes_as};

    #[test]
    fn test_fixed_string_truncates_on_char_boundary() {
        let _guard = config::test_guard();
        // 'é' is two bytes; a cut at 2 would split it
        let s = String::from("aé");
        let bytes = to_bytes_as(&s, &ProtocolTag::FixedWidth(2)).expect("encode");
        assert_eq!(&bytes[..], &[b'a', 0x00]);
        assert_eq!(
            from_bytes_as::<String>(&bytes, &ProtocolTag::FixedWidth(2)).expect("decode"),
            "a"
        );
    }

    #[test]
    fn test_fixed_zero_is_empty() {
        let _guard = config::test_guard();
        let s = String::from("ignored");
        assert!(to_bytes_as(&s, &ProtocolTag::FixedWidth(0)).expect("encode").is_empty());
        assert_eq!(from_bytes_as::<String>(&[], &ProtocolTag::FixedWidth(0)).expect("decode"), "");
    }

    #[test]
    fn test_invalid_utf8_rejected() {
        let _guard = config::test_guard();
        assert!(matches!(
            from_bytes::<String>(&[0x02, 0xC3, 0x28]),
            Err(CodecError::InvalidUtf8)
        ));
    }

    #[test]
    fn test_string_limit_checked_before_read() {
        let _guard = config::test_guard();
        config::update(|c| c.max_string_size = 3).expect("update");
        assert!(matches!(
            from_bytes::<String>(&[0x04, b'a', b'b', b'c', b'd']),
            Err(CodecError::LengthOverflow { len: 4, limit: 3, .. })
        ));
        // a huge declared length fails without a matching allocation
        assert!(matches!(
            from_bytes::<Bytes>(&[0xFF, 0xFF, 0xFF, 0xFF, 0x0F]),
            Err(CodecError::LengthOverflow { .. })
        ));
    }

    #[test]
    fn test_bytes_fixed_width_policy() {
        let _guard = config::test_guard();
        let buf = Bytes::from_static(&[1, 2, 3]);
        let tag = ProtocolTag::FixedWidth(2);
        assert!(matches!(
            to_bytes_as(&buf, &tag),
            Err(CodecError::LengthOverflow { len: 3, limit: 2, .. })
        ));

        config::update(|c| c.error_policy = ErrorPolicy::Medium).expect("update");
        assert_eq!(&to_bytes_as(&buf, &tag).expect("truncated")[..], &[1, 2]);
        let padded = to_bytes_as(&buf, &ProtocolTag::FixedWidth(5)).expect("padded");
        assert_eq!(&padded[..], &[1, 2, 3, 0, 0]);
    }

    #[test]
    fn test_bytes_varint_roundtrip() {
        let _guard = config::test_guard();
        let buf = Bytes::from_static(b"\x00\xFFraw");
        let bytes = to_bytes(&buf).expect("encode");
        assert_eq!(bytes[0], 5);
        assert_eq!(from_bytes::<Bytes>(&bytes).expect("decode"), buf);
    }
}
