//! Protocol tags: which wire rule applies to a value.
//!
//! `ProtocolTag` is the runtime form used by the registry and by call sites.
//! The `proto` markers carry the same tags at the type level so a
//! [`Pinned`](crate::Pinned) value can fix its protocol in its type.

use std::borrow::Cow;
use std::fmt;

/// Selects the wire encoding rule for a value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ProtocolTag {
    /// Fixed number of bytes or elements. `0` derives the width from the type for
    /// scalars and tuples, and means "empty" for strings, buffers and containers.
    FixedWidth(usize),
    /// Base-128 varint integers, length-prefixed strings and containers, flagged
    /// optionals and indexed sum types
    Varint,
    /// Positional record layout from a registered schema
    Schema,
    /// Defer to the resolver
    Default,
    /// User-registered rule, identified by name
    Custom(Cow<'static, str>),
}

impl ProtocolTag {
    /// `FixedWidth(0)`: width derived from the type.
    pub const FIXED: ProtocolTag = ProtocolTag::FixedWidth(0);

    pub fn custom(name: impl Into<Cow<'static, str>>) -> Self {
        ProtocolTag::Custom(name.into())
    }

    /// Width carried by a `FixedWidth` tag.
    pub fn fixed_width(&self) -> Option<usize> {
        match self {
            ProtocolTag::FixedWidth(n) => Some(*n),
            _ => None,
        }
    }

    /// True for `FixedWidth(0)` or `FixedWidth(natural)`.
    pub fn is_natural_width(&self, natural: usize) -> bool {
        matches!(self, ProtocolTag::FixedWidth(n) if *n == 0 || *n == natural)
    }
}

impl fmt::Display for ProtocolTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolTag::FixedWidth(0) => write!(f, "Fixed"),
            ProtocolTag::FixedWidth(n) => write!(f, "Fixed<{n}>"),
            ProtocolTag::Varint => write!(f, "Varint"),
            ProtocolTag::Schema => write!(f, "Schema"),
            ProtocolTag::Default => write!(f, "Default"),
            ProtocolTag::Custom(name) => write!(f, "Custom({name})"),
        }
    }
}

/// A type-level protocol tag.
///
/// Implement this on a unit struct to pin a custom protocol:
///
/// ```rust
/// use byteschema::{ProtocolSpec, ProtocolTag};
///
/// struct Obfuscated;
///
/// impl ProtocolSpec for Obfuscated {
///     fn tag() -> ProtocolTag {
///         ProtocolTag::custom("obfuscated")
///     }
/// }
/// ```
pub trait ProtocolSpec: 'static {
    fn tag() -> ProtocolTag;
}

/// Type-level markers for the built-in tags.
pub mod proto {
    use super::{ProtocolSpec, ProtocolTag};

    /// `FixedWidth(N)`; `Fixed` alone is `FixedWidth(0)`.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Fixed<const N: usize = 0>;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Varint;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Schema;

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Default;

    impl<const N: usize> ProtocolSpec for Fixed<N> {
        fn tag() -> ProtocolTag {
            ProtocolTag::FixedWidth(N)
        }
    }

    impl ProtocolSpec for Varint {
        fn tag() -> ProtocolTag {
            ProtocolTag::Varint
        }
    }

    impl ProtocolSpec for Schema {
        fn tag() -> ProtocolTag {
            ProtocolTag::Schema
        }
    }

    impl ProtocolSpec for Default {
        fn tag() -> ProtocolTag {
            ProtocolTag::Default
        }
    }
}
