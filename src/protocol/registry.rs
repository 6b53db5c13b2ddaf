//! # Codec Registry
//!
//! Keyed lookup from (value type, protocol tag) to codec behaviour, plus the
//! per-type default bindings and record schemas consulted by the dispatcher.
//!
//! Built-in codecs live on the [`Wire`] impls; the registry only holds what host
//! code adds. Every registration is validated when it is made: a second codec for the
//! same pair, a codec shadowing a built-in one, a binding to a tag with no codec, or
//! a second schema for a record all fail with `ConfigError` up front.
//!
//! ```rust
//! use byteschema::{ProtocolTag, Writer, Reader};
//! use byteschema::core::varint;
//!
//! byteschema::register_fn::<i64, _, _>(
//!     ProtocolTag::custom("offset"),
//!     |w: &mut Writer<'_>, v: &i64| varint::write_svarint(w, *v - 1000),
//!     |r: &mut Reader<'_>| Ok(varint::read_svarint(r)? + 1000),
//! )
//! .unwrap();
//!
//! let bytes = byteschema::to_bytes_as(&1001i64, &ProtocolTag::custom("offset")).unwrap();
//! assert_eq!(&bytes[..], &[0x02]);
//! ```

use super::resolver::Wire;
use super::schema::SchemaDescriptor;
use super::tag::ProtocolTag;
use crate::core::io::{Reader, Writer};
use crate::error::{constants, CodecError, Result};
use once_cell::sync::Lazy;
use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// User codec for one (type, tag) pair.
pub trait Codec<T>: Send + Sync + 'static {
    fn encode(&self, w: &mut Writer<'_>, value: &T) -> Result<()>;

    fn decode(&self, r: &mut Reader<'_>) -> Result<T>;
}

/// Codec assembled from a pair of closures.
pub struct FnCodec<E, D> {
    encode: E,
    decode: D,
}

impl<E, D> FnCodec<E, D> {
    pub fn new(encode: E, decode: D) -> Self {
        Self { encode, decode }
    }
}

impl<T, E, D> Codec<T> for FnCodec<E, D>
where
    E: Fn(&mut Writer<'_>, &T) -> Result<()> + Send + Sync + 'static,
    D: Fn(&mut Reader<'_>) -> Result<T> + Send + Sync + 'static,
{
    fn encode(&self, w: &mut Writer<'_>, value: &T) -> Result<()> {
        (self.encode)(w, value)
    }

    fn decode(&self, r: &mut Reader<'_>) -> Result<T> {
        (self.decode)(r)
    }
}

type Erased = Box<dyn Any + Send + Sync>;

fn lock_error() -> CodecError {
    CodecError::ConfigError(constants::ERR_LOCK_POISONED.to_string())
}

/// Registry of type bindings, user codecs and record schemas.
///
/// Encoding and decoding only ever consult the instance returned by [`global`]. A
/// registry built with [`Registry::new`] applies the same registration checks but is
/// never seen by the dispatcher.
pub struct Registry {
    bindings: RwLock<HashMap<TypeId, ProtocolTag>>,
    codecs: RwLock<HashMap<(TypeId, ProtocolTag), Erased>>,
    schemas: RwLock<HashMap<TypeId, Erased>>,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// A standalone registry, separate from [`global`].
    pub fn new() -> Self {
        Self {
            bindings: RwLock::new(HashMap::new()),
            codecs: RwLock::new(HashMap::new()),
            schemas: RwLock::new(HashMap::new()),
        }
    }

    /// Registers `codec` for `T` under `tag`.
    pub fn register_codec<T, C>(&self, tag: ProtocolTag, codec: C) -> Result<()>
    where
        T: Wire,
        C: Codec<T>,
    {
        if tag == ProtocolTag::Default {
            return Err(CodecError::ConfigError(format!(
                "Cannot register a codec for {} under Default",
                type_name::<T>()
            )));
        }
        if T::supports(&tag) {
            return Err(CodecError::ConfigError(format!(
                "{} already has a built-in codec under {}",
                type_name::<T>(),
                tag
            )));
        }

        let mut codecs = self.codecs.write().map_err(|_| lock_error())?;
        let key = (TypeId::of::<T>(), tag);
        if codecs.contains_key(&key) {
            return Err(CodecError::ConfigError(format!(
                "Codec for {} under {} registered twice",
                type_name::<T>(),
                key.1
            )));
        }
        debug!(ty = type_name::<T>(), tag = %key.1, "Registered codec");
        let shared: Arc<dyn Codec<T>> = Arc::new(codec);
        codecs.insert(key, Box::new(shared));
        Ok(())
    }

    /// Registers a codec built from an encode and a decode closure.
    pub fn register_fn<T, E, D>(&self, tag: ProtocolTag, encode: E, decode: D) -> Result<()>
    where
        T: Wire,
        E: Fn(&mut Writer<'_>, &T) -> Result<()> + Send + Sync + 'static,
        D: Fn(&mut Reader<'_>) -> Result<T> + Send + Sync + 'static,
    {
        self.register_codec::<T, _>(tag, FnCodec::new(encode, decode))
    }

    /// Looks up the user codec for (`T`, `tag`).
    pub fn codec<T: Wire>(&self, tag: &ProtocolTag) -> Result<Option<Arc<dyn Codec<T>>>> {
        let codecs = self.codecs.read().map_err(|_| lock_error())?;
        Ok(codecs
            .get(&(TypeId::of::<T>(), tag.clone()))
            .and_then(|erased| erased.downcast_ref::<Arc<dyn Codec<T>>>())
            .cloned())
    }

    pub fn has_codec<T: Wire>(&self, tag: &ProtocolTag) -> Result<bool> {
        let codecs = self.codecs.read().map_err(|_| lock_error())?;
        Ok(codecs.contains_key(&(TypeId::of::<T>(), tag.clone())))
    }

    /// Sets the default protocol of `T`. At most once per type.
    pub fn bind_protocol<T: Wire>(&self, tag: ProtocolTag) -> Result<()> {
        if tag == ProtocolTag::Default {
            return Err(CodecError::ConfigError(format!(
                "{}: {}",
                constants::ERR_DEFAULT_UNRESOLVED,
                type_name::<T>()
            )));
        }
        if !T::supports(&tag) && !self.has_codec::<T>(&tag)? {
            return Err(CodecError::ConfigError(format!(
                "{}: {} under {}",
                constants::ERR_NO_CODEC,
                type_name::<T>(),
                tag
            )));
        }

        let mut bindings = self.bindings.write().map_err(|_| lock_error())?;
        if let Some(existing) = bindings.get(&TypeId::of::<T>()) {
            return Err(CodecError::ConfigError(format!(
                "{} is already bound to {}",
                type_name::<T>(),
                existing
            )));
        }
        debug!(ty = type_name::<T>(), %tag, "Bound default protocol");
        bindings.insert(TypeId::of::<T>(), tag);
        Ok(())
    }

    pub fn binding(&self, ty: TypeId) -> Result<Option<ProtocolTag>> {
        let bindings = self.bindings.read().map_err(|_| lock_error())?;
        Ok(bindings.get(&ty).cloned())
    }

    /// Registers the one schema of record type `T`. The field order is frozen here.
    pub fn register_schema<T: Wire>(&self, schema: SchemaDescriptor<T>) -> Result<()> {
        if !T::supports(&ProtocolTag::Schema) {
            return Err(CodecError::ConfigError(format!(
                "{} does not dispatch the Schema protocol",
                type_name::<T>()
            )));
        }

        let mut schemas = self.schemas.write().map_err(|_| lock_error())?;
        if schemas.contains_key(&TypeId::of::<T>()) {
            return Err(CodecError::ConfigError(format!(
                "Schema for {} registered twice",
                type_name::<T>()
            )));
        }
        debug!(
            record = type_name::<T>(),
            fields = schema.fields().len(),
            "Registered schema"
        );
        schemas.insert(TypeId::of::<T>(), Box::new(Arc::new(schema)));
        Ok(())
    }

    pub fn schema<T: Wire>(&self) -> Result<Arc<SchemaDescriptor<T>>> {
        let schemas = self.schemas.read().map_err(|_| lock_error())?;
        schemas
            .get(&TypeId::of::<T>())
            .and_then(|erased| erased.downcast_ref::<Arc<SchemaDescriptor<T>>>())
            .cloned()
            .ok_or_else(|| {
                CodecError::ConfigError(format!(
                    "{}: {}",
                    constants::ERR_SCHEMA_MISSING,
                    type_name::<T>()
                ))
            })
    }

    pub fn has_schema<T: Wire>(&self) -> Result<bool> {
        let schemas = self.schemas.read().map_err(|_| lock_error())?;
        Ok(schemas.contains_key(&TypeId::of::<T>()))
    }
}

#[cfg(test)]
impl Registry {
    /// A registry whose codec table lock is poisoned.
    pub(crate) fn poisoned() -> Self {
        let registry = Self::new();
        let _ = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _held = registry.codecs.write();
            panic!("poisoning codec table");
        }));
        registry
    }
}

static REGISTRY: Lazy<Registry> = Lazy::new(Registry::new);

/// The process-wide registry used by the dispatcher.
pub fn global() -> &'static Registry {
    &REGISTRY
}

/// Registers `codec` for `T` under `tag` in the global registry.
pub fn register_codec<T: Wire, C: Codec<T>>(tag: ProtocolTag, codec: C) -> Result<()> {
    global().register_codec::<T, C>(tag, codec)
}

/// Registers a closure pair for `T` under `tag` in the global registry.
pub fn register_fn<T, E, D>(tag: ProtocolTag, encode: E, decode: D) -> Result<()>
where
    T: Wire,
    E: Fn(&mut Writer<'_>, &T) -> Result<()> + Send + Sync + 'static,
    D: Fn(&mut Reader<'_>) -> Result<T> + Send + Sync + 'static,
{
    global().register_fn::<T, E, D>(tag, encode, decode)
}

/// Binds the default protocol of `T` in the global registry.
pub fn bind_protocol<T: Wire>(tag: ProtocolTag) -> Result<()> {
    global().bind_protocol::<T>(tag)
}
