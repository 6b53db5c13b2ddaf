//! Nesting limit for dispatched values.
//!
//! Every value that passes through the dispatcher holds a guard for the duration of
//! its encode or decode. The count is per thread, so concurrent calls on other
//! threads never share a budget.

use crate::config;
use crate::error::{CodecError, Result};
use std::cell::Cell;

thread_local! {
    static DEPTH: Cell<usize> = const { Cell::new(0) };
}

/// Holds one level of nesting until dropped.
#[must_use]
pub struct DepthGuard {
    _private: (),
}

/// Enters one level, failing once the configured `max_recursion_depth` is exceeded.
pub fn enter() -> Result<DepthGuard> {
    let limit = config::current()?.max_recursion_depth;
    DEPTH.with(|depth| {
        let next = depth.get() + 1;
        if next > limit {
            return Err(CodecError::RecursionLimit { limit });
        }
        depth.set(next);
        Ok(DepthGuard { _private: () })
    })
}

/// Current nesting level on this thread.
pub fn current() -> usize {
    DEPTH.with(Cell::get)
}

impl Drop for DepthGuard {
    fn drop(&mut self) {
        DEPTH.with(|depth| depth.set(depth.get().saturating_sub(1)));
    }
}
