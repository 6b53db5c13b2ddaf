//! # Schema Codec
//!
//! A record becomes serializable by registering one [`SchemaDescriptor`]: an ordered,
//! immutable list of field bindings. Encoding walks the fields in registration order
//! and runs each field's codec back to back. There are no delimiters and no field
//! identifiers on the wire, so the layout is purely positional: reordering, inserting
//! or removing a field produces a different, incompatible format.
//!
//! Field tags are resolved when the descriptor is built and frozen with it.
//!
//! ## Declaring a record
//! ```rust
//! use byteschema::{record, register_record, ProtocolTag};
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Point {
//!     x: f32,
//!     y: f32,
//! }
//!
//! #[derive(Debug, Default, PartialEq)]
//! struct Scene {
//!     path: Vec<Point>,
//!     triple: Vec<i32>,
//!     name: String,
//! }
//!
//! record!(Point { x, y });
//! record!(Scene { path, triple => ProtocolTag::FixedWidth(3), name });
//!
//! register_record::<Point>().unwrap();
//! register_record::<Scene>().unwrap();
//!
//! let scene = Scene {
//!     path: vec![Point { x: 0.0, y: 1.0 }],
//!     triple: vec![1, 2, 3],
//!     name: "First".into(),
//! };
//! let bytes = byteschema::to_bytes(&scene).unwrap();
//! assert_eq!(byteschema::from_bytes::<Scene>(&bytes).unwrap(), scene);
//! ```

use super::dispatch::{decode_with, encode_with};
use super::registry;
use super::resolver::{self, Wire};
use super::tag::ProtocolTag;
use crate::core::io::{Reader, Writer};
use crate::error::{CodecError, Result};
use std::any::type_name;
use std::fmt;

type FieldEncode<T> = dyn Fn(&mut Writer<'_>, &T) -> Result<()> + Send + Sync;
type FieldDecode<T> = dyn Fn(&mut Reader<'_>, &mut T) -> Result<()> + Send + Sync;

/// One field binding: name, value type, frozen tag and accessors.
pub struct FieldDescriptor<T> {
    name: &'static str,
    value_type: &'static str,
    tag: ProtocolTag,
    encode: Box<FieldEncode<T>>,
    decode: Box<FieldDecode<T>>,
}

impl<T> FieldDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn value_type(&self) -> &'static str {
        self.value_type
    }

    pub fn tag(&self) -> &ProtocolTag {
        &self.tag
    }
}

impl<T> fmt::Debug for FieldDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("tag", &self.tag)
            .finish()
    }
}

/// Ordered field bindings of record type `T`.
pub struct SchemaDescriptor<T> {
    record: &'static str,
    fields: Vec<FieldDescriptor<T>>,
}

impl<T: 'static> SchemaDescriptor<T> {
    pub fn builder() -> SchemaBuilder<T> {
        SchemaBuilder {
            fields: Vec::new(),
            errors: Vec::new(),
        }
    }

    pub fn record(&self) -> &'static str {
        self.record
    }

    pub fn fields(&self) -> &[FieldDescriptor<T>] {
        &self.fields
    }

    /// Encodes every field of `value` in registration order.
    pub fn encode(&self, w: &mut Writer<'_>, value: &T) -> Result<()> {
        for field in &self.fields {
            (field.encode)(w, value)?;
        }
        Ok(())
    }

    /// Decodes every field into `out` in registration order.
    pub fn decode_into(&self, r: &mut Reader<'_>, out: &mut T) -> Result<()> {
        for field in &self.fields {
            (field.decode)(r, out)?;
        }
        Ok(())
    }
}

impl<T> fmt::Debug for SchemaDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SchemaDescriptor")
            .field("record", &self.record)
            .field("fields", &self.fields)
            .finish()
    }
}

/// Collects field bindings; problems are reported together by [`build`](Self::build).
pub struct SchemaBuilder<T> {
    fields: Vec<FieldDescriptor<T>>,
    errors: Vec<String>,
}

impl<T: 'static> SchemaBuilder<T> {
    /// Adds a field under its type's resolved protocol.
    pub fn field<F: Wire>(self, name: &'static str, get: fn(&T) -> &F, get_mut: fn(&mut T) -> &mut F) -> Self {
        self.field_with(name, None, get, get_mut)
    }

    /// Adds a field under an explicit protocol.
    pub fn field_as<F: Wire>(
        self,
        name: &'static str,
        tag: ProtocolTag,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        self.field_with(name, Some(tag), get, get_mut)
    }

    /// Adds a field, resolving the protocol when `tag` is `None` or `Default`.
    pub fn field_with<F: Wire>(
        mut self,
        name: &'static str,
        tag: Option<ProtocolTag>,
        get: fn(&T) -> &F,
        get_mut: fn(&mut T) -> &mut F,
    ) -> Self {
        if self.fields.iter().any(|f| f.name == name) {
            self.errors.push(format!("Duplicate field '{name}'"));
            return self;
        }

        let tag = match resolver::effective::<F>(tag.as_ref()) {
            Ok(tag) => tag,
            Err(e) => {
                self.errors.push(format!("Field '{name}': {e}"));
                return self;
            }
        };
        match resolver::is_dispatchable::<F>(&tag) {
            Ok(true) => {}
            Ok(false) => {
                self.errors.push(format!(
                    "Field '{name}': no codec for {} under {tag}",
                    type_name::<F>()
                ));
                return self;
            }
            Err(e) => {
                self.errors.push(format!("Field '{name}': {e}"));
                return self;
            }
        }

        let encode_tag = tag.clone();
        let decode_tag = tag.clone();
        self.fields.push(FieldDescriptor {
            name,
            value_type: type_name::<F>(),
            tag,
            encode: Box::new(move |w: &mut Writer<'_>, record: &T| {
                encode_with::<F>(w, get(record), Some(&encode_tag))
            }),
            decode: Box::new(move |r: &mut Reader<'_>, record: &mut T| {
                *get_mut(record) = decode_with::<F>(r, Some(&decode_tag))?;
                Ok(())
            }),
        });
        self
    }

    pub fn build(self) -> Result<SchemaDescriptor<T>> {
        if !self.errors.is_empty() {
            return Err(CodecError::ConfigError(format!(
                "Schema for {} is invalid:\n  - {}",
                type_name::<T>(),
                self.errors.join("\n  - ")
            )));
        }
        Ok(SchemaDescriptor {
            record: type_name::<T>(),
            fields: self.fields,
        })
    }
}

/// A record type with a declared field list, usually implemented by [`record!`](crate::record).
pub trait Record: Wire + Default {
    fn schema() -> Result<SchemaDescriptor<Self>>;
}

/// Registers the one schema of `T` in the global registry.
pub fn register_schema<T: Wire>(schema: SchemaDescriptor<T>) -> Result<()> {
    registry::global().register_schema(schema)
}

/// Builds and registers the schema declared by `T`.
pub fn register_record<T: Record>() -> Result<()> {
    register_schema(T::schema()?)
}

/// `Wire::write_wire` body for record types.
pub fn write_record<T: Wire>(value: &T, w: &mut Writer<'_>, tag: &ProtocolTag) -> Result<()> {
    resolver::ensure_supported::<T>(tag)?;
    registry::global().schema::<T>()?.encode(w, value)
}

/// `Wire::read_wire` body for record types.
pub fn read_record<T: Wire + Default>(r: &mut Reader<'_>, tag: &ProtocolTag) -> Result<T> {
    resolver::ensure_supported::<T>(tag)?;
    let schema = registry::global().schema::<T>()?;
    let mut out = T::default();
    schema.decode_into(r, &mut out)?;
    Ok(out)
}

/// Implements [`Wire`](crate::Wire) for a record type whose schema is registered
/// separately with [`register_schema`](crate::register_schema).
#[macro_export]
macro_rules! schema_wire {
    ($ty:ty) => {
        impl $crate::Wire for $ty {
            fn default_protocol() -> $crate::ProtocolTag {
                $crate::ProtocolTag::Schema
            }

            fn supports(tag: &$crate::ProtocolTag) -> bool {
                *tag == $crate::ProtocolTag::Schema
            }

            fn write_wire(
                &self,
                w: &mut $crate::Writer<'_>,
                tag: &$crate::ProtocolTag,
            ) -> $crate::Result<()> {
                $crate::protocol::schema::write_record(self, w, tag)
            }

            fn read_wire(
                r: &mut $crate::Reader<'_>,
                tag: &$crate::ProtocolTag,
            ) -> $crate::Result<Self> {
                $crate::protocol::schema::read_record(r, tag)
            }
        }
    };
}

/// Declares a record: implements [`Wire`](crate::Wire) and [`Record`](crate::Record)
/// with the fields in the order listed. `field => tag` overrides a field's protocol.
#[macro_export]
macro_rules! record {
    ($ty:ty { $($field:ident $(=> $tag:expr)?),* $(,)? }) => {
        $crate::schema_wire!($ty);

        impl $crate::Record for $ty {
            fn schema() -> $crate::Result<$crate::SchemaDescriptor<Self>> {
                $crate::SchemaDescriptor::<Self>::builder()
                    $(
                        .field_with(
                            stringify!($field),
                            $crate::__record_tag!($($tag)?),
                            |r| &r.$field,
                            |r| &mut r.$field,
                        )
                    )*
                    .build()
            }
        }
    };
}

#[doc(hidden)]
#[macro_export]
macro_rules! __record_tag {
    () => {
        ::core::option::Option::None
    };
    ($tag:expr) => {
        ::core::option::Option::Some($tag)
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config;
    use crate::protocol::dispatch::{from_bytes, to_bytes};

    #[derive(Debug, Default, PartialEq)]
    struct Pair {
        a: u8,
        b: String,
    }

    crate::schema_wire!(Pair);

    fn pair_schema() -> SchemaBuilder<Pair> {
        SchemaDescriptor::<Pair>::builder()
            .field("a", |p| &p.a, |p| &mut p.a)
            .field("b", |p| &p.b, |p| &mut p.b)
    }

    #[test]
    fn test_builder_records_fields_in_order() {
        let schema = pair_schema().build().expect("build");
        let names: Vec<_> = schema.fields().iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert!(schema.record().ends_with("Pair"));
        assert_eq!(schema.fields()[0].tag(), &ProtocolTag::FIXED);
        assert_eq!(schema.fields()[1].tag(), &ProtocolTag::Varint);
        assert_eq!(schema.fields()[1].value_type(), type_name::<String>());
    }

    #[test]
    fn test_builder_rejects_bad_fields() {
        let err = pair_schema()
            .field("a", |p| &p.a, |p| &mut p.a)
            .field_as("b2", ProtocolTag::Varint, |p: &Pair| &p.b, |p: &mut Pair| &mut p.b)
            .build();
        assert!(err.is_err());

        let err = SchemaDescriptor::<Pair>::builder()
            .field_as("b", ProtocolTag::Schema, |p| &p.b, |p| &mut p.b)
            .build()
            .expect_err("string under Schema");
        assert!(err.to_string().contains("no codec"));
    }

    #[test]
    fn test_unregistered_record_fails_at_dispatch() {
        let _guard = config::test_guard();

        #[derive(Debug, Default)]
        struct Lonely {
            _x: u8,
        }
        crate::schema_wire!(Lonely);

        let err = to_bytes(&Lonely::default()).expect_err("no schema");
        assert!(err.is_configuration());
    }

    #[test]
    fn test_registered_record_roundtrip() {
        let _guard = config::test_guard();
        register_schema(pair_schema().build().expect("build")).expect("register");
        assert!(register_schema(pair_schema().build().expect("build")).is_err());

        let value = Pair { a: 5, b: "ok".into() };
        let bytes = to_bytes(&value).expect("encode");
        assert_eq!(&bytes[..], &[5, 2, b'o', b'k']);
        assert_eq!(from_bytes::<Pair>(&bytes).expect("decode"), value);
    }
}
