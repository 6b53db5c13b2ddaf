//! # Protocol Layer
//!
//! Tag resolution, codec lookup and dispatch.
//!
//! ## Components
//! - **Tag**: `ProtocolTag` values and type-level `proto` markers
//! - **Resolver**: canonical tag for a type, and the `Wire` trait
//! - **Registry**: user codecs, default bindings and record schemas
//! - **Dispatch**: the generic encode/decode entry points
//! - **Pinned**: values with a protocol fixed in their type
//! - **Schema**: ordered field lists for record types
//!
//! ## Resolution
//! ```text
//! explicit tag > bind_protocol binding > Wire::default_protocol
//! ```

pub mod depth;
pub mod dispatch;
pub mod pinned;
pub mod registry;
pub mod resolver;
pub mod schema;
pub mod tag;
