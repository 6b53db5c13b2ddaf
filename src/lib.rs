//! # byteschema
//!
//! Protocol-tag driven binary serialization.
//!
//! Every value is written under a [`ProtocolTag`] that selects its wire rule:
//! fixed width, base-128 varint, a registered record schema, or a user-registered
//! custom codec. When a call gives no tag, the type's canonical tag is resolved
//! (a [`bind_protocol`] binding, else the type's built-in default). Containers, sum
//! types and records resolve each element's tag on their own; [`Pinned`] fixes an
//! element's tag in its type.
//!
//! ## Quick Start
//! ```rust
//! use byteschema::{from_bytes, to_bytes, to_bytes_as, ProtocolTag};
//!
//! // u32 defaults to fixed width, big endian
//! assert_eq!(&to_bytes(&300u32).unwrap()[..], &[0, 0, 1, 0x2C]);
//! assert_eq!(&to_bytes_as(&300u32, &ProtocolTag::Varint).unwrap()[..], &[0xAC, 0x02]);
//!
//! // strings default to a varint length prefix
//! let bytes = to_bytes(&String::from("hi")).unwrap();
//! assert_eq!(&bytes[..], &[0x02, b'h', b'i']);
//! assert_eq!(from_bytes::<String>(&bytes).unwrap(), "hi");
//! ```
//!
//! ## Streams
//! [`Writer`] and [`Reader`] wrap any `std::io::Write` / `std::io::Read`:
//! ```rust
//! use byteschema::{decode, encode, Reader, Writer};
//!
//! let mut out = Vec::new();
//! let mut w = Writer::new(&mut out);
//! encode(&mut w, &(7u8, Some(-1i16))).unwrap();
//!
//! let mut src = &out[..];
//! let mut r = Reader::new(&mut src);
//! let back: (u8, Option<i16>) = decode(&mut r).unwrap();
//! assert_eq!(back, (7, Some(-1)));
//! r.finish().unwrap();
//! ```
//!
//! ## Configuration
//! Byte order, size limits, recursion depth, EOF strictness and the error policy live
//! in the process-wide [`config`]. Every codec reads the live value when it runs.

pub mod config;
pub mod core;
pub mod error;
pub mod protocol;
pub mod utils;

pub use crate::core::io::{Reader, Writer};
pub use crate::core::union::{OneOf2, OneOf3, OneOf4};
pub use config::{ByteOrder, ErrorPolicy, GlobalConfig};
pub use error::{CodecError, Result};
pub use protocol::dispatch::{
    decode, decode_as, decode_with, encode, encode_as, encode_with, from_bytes, from_bytes_as,
    to_bytes, to_bytes_as,
};
pub use protocol::pinned::Pinned;
pub use protocol::registry::{bind_protocol, register_codec, register_fn, Codec, FnCodec, Registry};
pub use protocol::resolver::{resolve, Wire};
pub use protocol::schema::{
    register_record, register_schema, FieldDescriptor, Record, SchemaBuilder, SchemaDescriptor,
};
pub use protocol::tag::{proto, ProtocolSpec, ProtocolTag};

pub use bytes::Bytes;
