//! # Protocol-Bound Values
//!
//! `Pinned<T, P>` fixes the protocol of a value in its type. Its resolved protocol is
//! `P`'s tag, so a container of pinned elements encodes each element under that tag
//! instead of the element type's default. Nesting pins one protocol per level:
//!
//! ```rust
//! use byteschema::{proto, Pinned};
//!
//! type Cell = Pinned<i32, proto::Varint>;
//! type Row = Pinned<Vec<Cell>, proto::Fixed<2>>;
//! type Grid = Pinned<Vec<Row>, proto::Varint>;
//!
//! let grid = Grid::new(vec![
//!     Row::new(vec![Cell::new(1), Cell::new(2)]),
//!     Row::new(vec![Cell::new(3), Cell::new(-4)]),
//! ]);
//!
//! let bytes = byteschema::to_bytes(&grid).unwrap();
//! // one count prefix, no row prefixes, zigzag cells
//! assert_eq!(&bytes[..], &[0x02, 0x02, 0x04, 0x06, 0x07]);
//! assert_eq!(byteschema::from_bytes::<Grid>(&bytes).unwrap(), grid);
//! ```

use super::dispatch::{decode_with, encode_with};
use super::registry::{self, Registry};
use super::resolver::{self, Wire};
use super::tag::{ProtocolSpec, ProtocolTag};
use crate::core::io::{Reader, Writer};
use crate::error::Result;
use std::any::type_name;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::ops::{Deref, DerefMut};
use tracing::warn;

/// A value bound to protocol `P`.
pub struct Pinned<T, P> {
    value: T,
    _protocol: PhantomData<fn() -> P>,
}

impl<T, P> Pinned<T, P> {
    pub fn new(value: T) -> Self {
        Self {
            value,
            _protocol: PhantomData,
        }
    }

    pub fn get(&self) -> &T {
        &self.value
    }

    pub fn get_mut(&mut self) -> &mut T {
        &mut self.value
    }

    pub fn into_inner(self) -> T {
        self.value
    }
}

impl<T, P> Deref for Pinned<T, P> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.value
    }
}

impl<T, P> DerefMut for Pinned<T, P> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.value
    }
}

impl<T, P> From<T> for Pinned<T, P> {
    fn from(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Default, P> Default for Pinned<T, P> {
    fn default() -> Self {
        Self::new(T::default())
    }
}

impl<T: Clone, P> Clone for Pinned<T, P> {
    fn clone(&self) -> Self {
        Self::new(self.value.clone())
    }
}

impl<T: fmt::Debug, P> fmt::Debug for Pinned<T, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Pinned").field(&self.value).finish()
    }
}

impl<T: PartialEq, P> PartialEq for Pinned<T, P> {
    fn eq(&self, other: &Self) -> bool {
        self.value == other.value
    }
}

impl<T: Eq, P> Eq for Pinned<T, P> {}

impl<T: PartialOrd, P> PartialOrd for Pinned<T, P> {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        self.value.partial_cmp(&other.value)
    }
}

impl<T: Ord, P> Ord for Pinned<T, P> {
    fn cmp(&self, other: &Self) -> Ordering {
        self.value.cmp(&other.value)
    }
}

impl<T: Hash, P> Hash for Pinned<T, P> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.hash(state);
    }
}

/// Whether `registry` holds a codec for `T` under `tag`. A failed lookup counts as
/// absent here; the dispatcher's own codec lookup reports the error.
fn registered<T: Wire>(registry: &Registry, tag: &ProtocolTag) -> bool {
    match registry.has_codec::<T>(tag) {
        Ok(found) => found,
        Err(err) => {
            warn!(ty = type_name::<T>(), %tag, error = %err, "Codec lookup failed");
            false
        }
    }
}

impl<T: Wire, P: ProtocolSpec> Wire for Pinned<T, P> {
    /// `P`'s tag, or `T`'s own resolved protocol when `P` is [`proto::Default`].
    ///
    /// [`proto::Default`]: super::tag::proto::Default
    fn default_protocol() -> ProtocolTag {
        match P::tag() {
            ProtocolTag::Default => resolver::resolve::<T>().unwrap_or(ProtocolTag::Default),
            tag => tag,
        }
    }

    fn supports(tag: &ProtocolTag) -> bool {
        T::supports(tag) || registered::<T>(registry::global(), tag)
    }

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
        encode_with(w, &self.value, Some(tag))
    }

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self> {
        decode_with::<T>(r, Some(tag)).map(Self::new)
    }
}
