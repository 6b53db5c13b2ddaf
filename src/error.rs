//! # Error Types
//!
//! Error handling for every encode/decode call and every registration.
//!
//! ## Error Categories
//! - **Stream Errors**: the reader ran dry, the sink refused bytes, trailing bytes remain
//! - **Data Errors**: malformed varints, sizes beyond the configured limits,
//!   out-of-range sum type discriminants, invalid UTF-8
//! - **Safety Errors**: nesting deeper than the configured recursion limit
//! - **Configuration Errors**: no codec resolvable for a (type, protocol) pair,
//!   duplicate registrations, invalid configuration values
//!
//! Every error aborts the current call at the point of detection. A failed decode
//! leaves no partially built value behind; the caller discards the target.
//!
//! ## Example Usage
//! ```rust
//! use byteschema::error::{CodecError, Result};
//! use byteschema::ProtocolTag;
//!
//! fn read_count(bytes: &[u8]) -> Result<u32> {
//!     byteschema::from_bytes_as::<u32>(bytes, &ProtocolTag::Varint)
//! }
//!
//! assert_eq!(read_count(&[0xAC, 0x02]).unwrap(), 300);
//! assert!(matches!(read_count(&[0x80]), Err(CodecError::UnexpectedEof { .. })));
//! ```

use std::io;
use thiserror::Error;

/// Error message constants to reduce allocations in error paths.
pub mod constants {
    /// Stream errors
    pub const ERR_UNEXPECTED_EOF: &str = "Unexpected end of stream";

    /// Varint errors
    pub const ERR_VARINT_TOO_LONG: &str = "Varint continuation exceeds 64 bits";
    pub const ERR_VARINT_RANGE: &str = "Varint value does not fit the target integer";

    /// Registry and configuration errors
    pub const ERR_LOCK_POISONED: &str = "Synchronization primitive poisoned";
    pub const ERR_DEFAULT_UNRESOLVED: &str = "No concrete default protocol for type";
    pub const ERR_NO_CODEC: &str = "No codec registered for type and protocol";
    pub const ERR_SCHEMA_MISSING: &str = "No schema registered for record type";
}

/// CodecError is the error type for all encode, decode and registration operations
#[derive(Error, Debug)]
pub enum CodecError {
    #[error("Unexpected EOF: needed {needed} more byte(s)")]
    UnexpectedEof { needed: usize },

    #[error("Invalid varint: {0}")]
    InvalidVarint(&'static str),

    #[error("Length overflow: {what} length {len} exceeds limit {limit}")]
    LengthOverflow {
        what: &'static str,
        len: u64,
        limit: u64,
    },

    #[error("Variant index {index} out of range for {count} alternative(s)")]
    VariantOutOfRange { index: u64, count: usize },

    #[error("Recursion limit of {limit} exceeded")]
    RecursionLimit { limit: usize },

    #[error("Invalid UTF-8 in string payload")]
    InvalidUtf8,

    #[error("{remaining} trailing byte(s) after decoded value")]
    TrailingBytes { remaining: usize },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Custom error: {0}")]
    Custom(String),
}

impl CodecError {
    /// Shorthand for a size mismatch or limit violation.
    pub fn length_overflow(what: &'static str, len: impl TryInto<u64>, limit: impl TryInto<u64>) -> Self {
        CodecError::LengthOverflow {
            what,
            len: len.try_into().unwrap_or(u64::MAX),
            limit: limit.try_into().unwrap_or(u64::MAX),
        }
    }

    /// True for failures caused by setup (registration, binding, configuration)
    /// rather than by the bytes being decoded.
    pub fn is_configuration(&self) -> bool {
        matches!(self, CodecError::ConfigError(_))
    }
}

/// Type alias for Results using CodecError
pub type Result<T> = std::result::Result<T, CodecError>;
