//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Mutex, MutexGuard};

static LOCK: Mutex<()> = Mutex::new(());

/// Serializes tests that read or mutate the process-wide configuration and restores
/// the defaults before handing over.
pub fn config_guard() -> MutexGuard<'static, ()> {
    let guard = LOCK.lock().unwrap_or_else(|e| e.into_inner());
    byteschema::config::reset().expect("reset config");
    guard
}

/// Hex rendering for assertion messages.
pub fn hex(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02X}")).collect::<Vec<_>>().join(" ")
}
