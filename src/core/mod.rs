//! # Core Codecs
//!
//! Byte streams, varints and the built-in `Wire` impls.
//!
//! ## Components
//! - **IO**: `Writer`/`Reader` over any `std::io` sink or source
//! - **Varint**: LEB128 and zigzag helpers
//! - **Primitives**: bool, integers and floats
//! - **Text**: `String` and `bytes::Bytes`
//! - **Containers**: `Vec`, maps, tuples and `Option`
//! - **Union**: tagged sum types
//!
//! ## Security
//! - Length prefixes are checked against the configured limits before allocation
//! - Nesting is bounded by `max_recursion_depth`

pub mod containers;
pub mod io;
pub mod primitives;
pub mod text;
pub mod union;
pub mod varint;
