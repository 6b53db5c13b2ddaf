//! Tagged unions.
//!
//! A sum type is written under `Varint` as the zero-based index of its active
//! alternative followed by that alternative's payload under the payload type's own
//! resolved protocol. Decoding an index outside the declared alternatives raises
//! `VariantOutOfRange`.
//!
//! [`sum_type!`](crate::sum_type) declares an enum of single-payload variants and its
//! codec. `OneOf2`..`OneOf4` cover anonymous alternatives.
//!
//! ```rust
//! use byteschema::sum_type;
//!
//! sum_type! {
//!     #[derive(Debug, PartialEq)]
//!     pub enum Reading {
//!         Celsius(f32),
//!         Label(String),
//!     }
//! }
//!
//! let bytes = byteschema::to_bytes(&Reading::Label("off".into())).unwrap();
//! assert_eq!(&bytes[..], &[0x01, 0x03, b'o', b'f', b'f']);
//! assert_eq!(Reading::Label("off".into()).variant_index(), 1);
//! ```

use super::io::{Reader, Writer};
use super::varint;
use crate::error::{CodecError, Result};

/// Writes the index of the active alternative.
pub fn write_discriminant(w: &mut Writer<'_>, index: usize) -> Result<()> {
    varint::write_uvarint(w, index as u64)
}

/// Reads an alternative index and checks it against `count`.
pub fn read_discriminant(r: &mut Reader<'_>, count: usize) -> Result<usize> {
    let index = varint::read_uvarint(r)?;
    if index >= count as u64 {
        return Err(CodecError::VariantOutOfRange { index, count });
    }
    // below count, so it fits
    Ok(index as usize)
}

#[doc(hidden)]
#[macro_export]
macro_rules! __wire_sum_impl {
    ([$($gen:ident),*] $ty:ty { $($variant:ident($inner:ty)),+ }) => {
        impl<$($gen),*> $ty {
            /// Zero-based index of the active alternative.
            #[allow(unused_assignments, unreachable_code, irrefutable_let_patterns)]
            pub fn variant_index(&self) -> usize {
                let mut index = 0usize;
                $(
                    if let Self::$variant(_) = self {
                        return index;
                    }
                    index += 1;
                )+
                index
            }
        }

        impl<$($gen: $crate::Wire),*> $crate::Wire for $ty {
            fn default_protocol() -> $crate::ProtocolTag {
                $crate::ProtocolTag::Varint
            }

            fn supports(tag: &$crate::ProtocolTag) -> bool {
                *tag == $crate::ProtocolTag::Varint
            }

            fn write_wire(
                &self,
                w: &mut $crate::Writer<'_>,
                tag: &$crate::ProtocolTag,
            ) -> $crate::Result<()> {
                $crate::protocol::resolver::ensure_supported::<Self>(tag)?;
                $crate::core::union::write_discriminant(w, self.variant_index())?;
                match self {
                    $(Self::$variant(value) => {
                        $crate::protocol::dispatch::encode_with::<$inner>(w, value, None)
                    })+
                }
            }

            #[allow(unused_assignments)]
            fn read_wire(
                r: &mut $crate::Reader<'_>,
                tag: &$crate::ProtocolTag,
            ) -> $crate::Result<Self> {
                $crate::protocol::resolver::ensure_supported::<Self>(tag)?;
                const COUNT: usize = [$(stringify!($variant)),+].len();
                let index = $crate::core::union::read_discriminant(r, COUNT)?;
                let mut current = 0usize;
                $(
                    if index == current {
                        return $crate::protocol::dispatch::decode_with::<$inner>(r, None)
                            .map(Self::$variant);
                    }
                    current += 1;
                )+
                Err($crate::CodecError::VariantOutOfRange {
                    index: index as u64,
                    count: COUNT,
                })
            }
        }
    };
}

/// Declares an enum whose variants each carry one payload, with a `Varint` codec.
/// Variant order is the wire index.
#[macro_export]
macro_rules! sum_type {
    (
        $(#[$meta:meta])*
        $vis:vis enum $name:ident {
            $($(#[$vmeta:meta])* $variant:ident($inner:ty)),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        $vis enum $name {
            $($(#[$vmeta])* $variant($inner)),+
        }

        $crate::__wire_sum_impl!([] $name { $($variant($inner)),+ });
    };
}

/// One of two alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OneOf2<A, B> {
    First(A),
    Second(B),
}

/// One of three alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OneOf3<A, B, C> {
    First(A),
    Second(B),
    Third(C),
}

/// One of four alternatives.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum OneOf4<A, B, C, D> {
    First(A),
    Second(B),
    Third(C),
    Fourth(D),
}

crate::__wire_sum_impl!([A, B] OneOf2<A, B> { First(A), Second(B) });
crate::__wire_sum_impl!([A, B, C] OneOf3<A, B, C> { First(A), Second(B), Third(C) });
crate::__wire_sum_impl!([A, B, C, D] OneOf4<A, B, C, D> {
    First(A),
    Second(B),
    Third(C),
    Fourth(D)
});

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::protocol::dispatch::{from_bytes, to_bytes, to_bytes_as};
    use crate::protocol::pinned::Pinned;
    use crate::protocol::tag::{proto, ProtocolTag};

    #[test]
    fn test_each_alternative_roundtrips() {
        let _guard = config::test_guard();
        type Value = OneOf3<u8, String, Vec<Pinned<i64, proto::Varint>>>;
        let values: Vec<Value> = vec![
            OneOf3::First(9),
            OneOf3::Second("two".into()),
            OneOf3::Third(vec![Pinned::new(-3)]),
        ];
        for (index, value) in values.into_iter().enumerate() {
            assert_eq!(value.variant_index(), index);
            let bytes = to_bytes(&value).expect("encode");
            assert_eq!(bytes[0] as usize, index);
            assert_eq!(from_bytes::<Value>(&bytes).expect("decode"), value);
        }
    }

    #[test]
    fn test_index_equal_to_count_rejected() {
        let _guard = config::test_guard();
        assert!(matches!(
            from_bytes::<OneOf2<u8, u8>>(&[0x02, 0x00]),
            Err(CodecError::VariantOutOfRange { index: 2, count: 2 })
        ));
    }

    #[test]
    fn test_only_varint_supported() {
        let _guard = config::test_guard();
        let value: OneOf2<u8, bool> = OneOf2::Second(true);
        assert_eq!(&to_bytes(&value).expect("encode")[..], &[0x01, 0x01]);
        assert!(to_bytes_as(&value, &ProtocolTag::FIXED).is_err());
    }

    crate::sum_type! {
        #[derive(Debug, PartialEq)]
        enum Single {
            Only(u16),
        }
    }

    #[test]
    fn test_single_alternative() {
        let _guard = config::test_guard();
        let bytes = to_bytes(&Single::Only(258)).expect("encode");
        assert_eq!(&bytes[..], &[0x00, 0x01, 0x02]);
        assert!(from_bytes::<Single>(&[0x01, 0x00, 0x00]).is_err());
    }
}
