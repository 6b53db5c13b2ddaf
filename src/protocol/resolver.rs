//! # Protocol Resolver
//!
//! Maps a value type to its canonical protocol tag when the call site gives none.
//!
//! Resolution order:
//! 1. a binding registered with [`bind_protocol`](crate::bind_protocol)
//! 2. the type's own [`Wire::default_protocol`]
//!
//! A resolution that ends at [`ProtocolTag::Default`] is a configuration error.

use super::registry;
use super::tag::ProtocolTag;
use crate::core::io::{Reader, Writer};
use crate::error::{constants, CodecError, Result};
use std::any::{type_name, TypeId};

/// A value type with built-in wire codecs.
///
/// `write_wire`/`read_wire` are only invoked by the dispatcher with a tag for which
/// `supports` returned true; other tags fall through to user codecs in the registry.
pub trait Wire: Sized + 'static {
    /// The tag used when neither the call site nor a binding names one.
    fn default_protocol() -> ProtocolTag;

    /// Whether a built-in codec exists for this type under `tag`.
    fn supports(tag: &ProtocolTag) -> bool;

    fn write_wire(&self, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()>;

    fn read_wire(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<Self>;
}

/// Canonical tag for `T`.
pub fn resolve<T: Wire>() -> Result<ProtocolTag> {
    let tag = match registry::global().binding(TypeId::of::<T>())? {
        Some(bound) => bound,
        None => T::default_protocol(),
    };
    if tag == ProtocolTag::Default {
        return Err(CodecError::ConfigError(format!(
            "{}: {}",
            constants::ERR_DEFAULT_UNRESOLVED,
            type_name::<T>()
        )));
    }
    Ok(tag)
}

/// The tag a call will actually run under: explicit tags win, `Default` and
/// absent tags go through [`resolve`].
pub fn effective<T: Wire>(tag: Option<&ProtocolTag>) -> Result<ProtocolTag> {
    match tag {
        None | Some(ProtocolTag::Default) => resolve::<T>(),
        Some(explicit) => Ok(explicit.clone()),
    }
}

/// Whether `T` has exactly one codec, built-in or registered, for `tag`.
pub fn is_dispatchable<T: Wire>(tag: &ProtocolTag) -> Result<bool> {
    if T::supports(tag) {
        return Ok(true);
    }
    registry::global().has_codec::<T>(tag)
}

/// Configuration error for a (type, tag) pair without a codec.
pub fn unsupported<T>(tag: &ProtocolTag) -> CodecError {
    CodecError::ConfigError(format!(
        "{}: {} under {}",
        constants::ERR_NO_CODEC,
        type_name::<T>(),
        tag
    ))
}

/// Guard for built-in codecs reached with a tag they do not implement.
pub fn ensure_supported<T: Wire>(tag: &ProtocolTag) -> Result<()> {
    if T::supports(tag) {
        Ok(())
    } else {
        Err(unsupported::<T>(tag))
    }
}
