//! # Utility Modules
//!
//! Supporting utilities shared by the codecs.
//!
//! ## Components
//! - **Metrics**: thread-safe counters for encodes, decodes, failures and policy repairs

pub mod metrics;
