//! Sequences, maps, tuples and optionals.
//!
//! Elements never inherit the container's tag: each one goes back through the
//! dispatcher under its own resolved protocol. Use [`Pinned`](crate::Pinned) to give
//! elements a different one.
//!
//! | Type | `Varint` | `FixedWidth(N)` |
//! |---|---|---|
//! | `Vec<T>` | count prefix + elements | exactly N elements, no prefix |
//! | `BTreeMap`, `HashMap` | count prefix + key/value pairs | exactly N pairs, no prefix |
//! | tuples (arity 1..6) | no | `FixedWidth(0)` or `FixedWidth(arity)` |
//! | `Option<T>` | presence flag + payload | no |
//!
//! `Vec<u8>` counts are checked against `max_string_size`, the same bound as
//! [`Bytes`](bytes::Bytes); every other container uses `max_container_size`.

use super::io::{Reader, Writer};
use super::varint;
use crate::config;
use crate::error::{CodecError, Result};
use crate::protocol::dispatch::{decode_with, encode_with};
use crate::protocol::resolver::{self, Wire};
use crate::protocol::tag::ProtocolTag;
use crate::utils::metrics::global_metrics;
use std::any::TypeId;
use std::collections::{btree_map, hash_map, BTreeMap, HashMap};
use std::hash::{BuildHasher, Hash};
use tracing::{debug, warn};

/// Upper bound on up-front reservation for decoded containers; larger ones grow as
/// elements actually arrive.
const MAX_PREALLOC: usize = 4096;

/// Number of elements to write for a container of `len` under `FixedWidth(width)`.
/// Over-long containers are cut to `width` when the policy repairs shapes.
fn fixed_count(what: &'static str, len: usize, width: usize) -> Result<usize> {
    if len == width {
        return Ok(width);
    }
    if len > width && config::current()?.error_policy.repairs_shape() {
        global_metrics().policy_repair();
        warn!(what, len, width, "Container truncated to fixed width");
        return Ok(width);
    }
    Err(CodecError::length_overflow(what, len, width))
}

/// Writes the count prefix (`Varint`) or checks the fixed count, returning how many
/// elements follow.
fn write_count<T: Wire>(w: &mut Writer<'_>, tag: &ProtocolTag, what: &'static str, len: usize) -> Result<usize> {
    match *tag {
        ProtocolTag::Varint => {
            varint::write_uvarint(w, len as u64)?;
            Ok(len)
        }
        ProtocolTag::FixedWidth(width) => fixed_count(what, len, width),
        _ => Err(resolver::unsupported::<T>(tag)),
    }
}

/// Label for byte vectors, which are bounded like strings rather than containers.
const BYTE_VEC: &str = "byte buffer";

/// Reads the count prefix (`Varint`, checked against `max_container_size`, or
/// `max_string_size` for byte vectors) or takes the fixed count.
fn read_count<T: Wire>(r: &mut Reader<'_>, tag: &ProtocolTag, what: &'static str) -> Result<usize> {
    match *tag {
        ProtocolTag::Varint => {
            let config = config::current()?;
            let limit = if what == BYTE_VEC {
                config.max_string_size
            } else {
                config.max_container_size
            };
            varint::read_length(r, what, limit)
        }
        ProtocolTag::FixedWidth(width) => Ok(width),
        _ => Err(resolver::unsupported::<T>(tag)),
    }
}

fn is_container_tag(tag: &ProtocolTag) -> bool {
    matches!(tag, ProtocolTag::Varint | ProtocolTag::FixedWidth(_))
}

impl<T: Wire> Wire for Vec<T> {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        is_container_tag(tag)
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        let count = write_count::<Self>(w, tag, "sequence", self.len())?;
        for item in &self[..count] {
            encode_with(w, item, None)?;
        }
        Ok(())
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        let what = if TypeId::of::<T>() == TypeId::of::<u8>() {
            BYTE_VEC
        } else {
            "sequence"
        };
        let count = read_count::<Self>(r, tag, what)?;
        let mut out = Vec::with_capacity(count.min(MAX_PREALLOC));
        for _ in 0..count {
            out.push(decode_with::<T>(r, None)?);
        }
        Ok(out)
    }
}

impl<K: Wire + Ord, V: Wire> Wire for BTreeMap<K, V> {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        is_container_tag(tag)
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        let count = write_count::<Self>(w, tag, "map", self.len())?;
        for (key, value) in self.iter().take(count) {
            encode_with(w, key, None)?;
            encode_with(w, value, None)?;
        }
        Ok(())
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        let count = read_count::<Self>(r, tag, "map")?;
        let mut out = BTreeMap::new();
        for _ in 0..count {
            let key = decode_with::<K>(r, None)?;
            let value = decode_with::<V>(r, None)?;
            match out.entry(key) {
                btree_map::Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                btree_map::Entry::Occupied(_) => debug!("Duplicate map key dropped"),
            }
        }
        Ok(out)
    }
}

impl<K, V, S> Wire for HashMap<K, V, S>
where
    K: Wire + Eq + Hash,
    V: Wire,
    S: BuildHasher + Default + 'static,
{
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        is_container_tag(tag)
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        let count = write_count::<Self>(w, tag, "map", self.len())?;
        for (key, value) in self.iter().take(count) {
            encode_with(w, key, None)?;
            encode_with(w, value, None)?;
        }
        Ok(())
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        let count = read_count::<Self>(r, tag, "map")?;
        let mut out = HashMap::with_capacity_and_hasher(count.min(MAX_PREALLOC), S::default());
        for _ in 0..count {
            let key = decode_with::<K>(r, None)?;
            let value = decode_with::<V>(r, None)?;
            match out.entry(key) {
                hash_map::Entry::Vacant(slot) => {
                    slot.insert(value);
                }
                hash_map::Entry::Occupied(_) => debug!("Duplicate map key dropped"),
            }
        }
        Ok(out)
    }
}

macro_rules! tuple_wire {
    ($($arity:literal => ($($name:ident : $idx:tt),+);)*) => {$(
        impl<$($name: Wire),+> Wire for ($($name,)+) {
            fn default_protocol() -> ProtocolTag {
                ProtocolTag::FIXED
            }

            fn supports(tag: &ProtocolTag) -> bool {
                tag.is_natural_width($arity)
            }

            fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
                resolver::ensure_supported::<Self>(tag)?;
                $(encode_with(w, &self.$idx, None)?;)+
                Ok(())
            }

            fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
                resolver::ensure_supported::<Self>(tag)?;
                Ok(($(decode_with::<$name>(r, None)?,)+))
            }
        }
    )*};
}

tuple_wire! {
    1 => (A: 0);
    2 => (A: 0, B: 1);
    3 => (A: 0, B: 1, C: 2);
    4 => (A: 0, B: 1, C: 2, D: 3);
    5 => (A: 0, B: 1, C: 2, D: 3, E: 4);
    6 => (A: 0, B: 1, C: 2, D: 3, E: 4, F: 5);
}

impl<T: Wire> Wire for Option<T> {
    fn default_protocol() -> ProtocolTag {
        ProtocolTag::Varint
    }

    fn supports(tag: &ProtocolTag) -> bool {
        *tag == ProtocolTag::Varint
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        resolver::ensure_supported::<Self>(tag)?;
        match self {
            None => varint::write_uvarint(w, 0),
            Some(value) => {
                varint::write_uvarint(w, 1)?;
                encode_with(w, value, None)
            }
        }
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        resolver::ensure_supported::<Self>(tag)?;
        match varint::read_uvarint(r)? {
            0 => Ok(None),
            _ => decode_with::<T>(r, None).map(Some),
        }
    }
}
