//! Codec Metrics
//!
//! Process-wide counters for the whole-buffer entry points (`to_bytes*` /
//! `from_bytes*`) and for error-policy repairs made anywhere in the codecs.
//!
//! Uses atomic counters for thread-safe metrics collection.

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, info};

/// Global metrics collector for codec operations
#[derive(Debug)]
pub struct CodecMetrics {
    /// Values encoded successfully
    pub values_encoded: AtomicU64,
    /// Values decoded successfully
    pub values_decoded: AtomicU64,
    /// Bytes produced by successful encodes
    pub bytes_written: AtomicU64,
    /// Bytes consumed by successful decodes
    pub bytes_read: AtomicU64,
    /// Encodes that returned an error
    pub encode_failures: AtomicU64,
    /// Decodes that returned an error
    pub decode_failures: AtomicU64,
    /// Violations repaired or downgraded by the error policy
    pub policy_repairs: AtomicU64,
    start_time: Instant,
}

impl CodecMetrics {
    pub fn new() -> Self {
        Self {
            values_encoded: AtomicU64::new(0),
            values_decoded: AtomicU64::new(0),
            bytes_written: AtomicU64::new(0),
            bytes_read: AtomicU64::new(0),
            encode_failures: AtomicU64::new(0),
            decode_failures: AtomicU64::new(0),
            policy_repairs: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a successful encode of `byte_count` bytes
    pub fn value_encoded(&self, byte_count: u64) {
        self.values_encoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_written.fetch_add(byte_count, Ordering::Relaxed);
    }

    /// Record a successful decode of `byte_count` bytes
    pub fn value_decoded(&self, byte_count: u64) {
        self.values_decoded.fetch_add(1, Ordering::Relaxed);
        self.bytes_read.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn encode_failed(&self) {
        self.encode_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn decode_failed(&self) {
        self.decode_failures.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a violation the error policy repaired instead of raising
    pub fn policy_repair(&self) {
        self.policy_repairs.fetch_add(1, Ordering::Relaxed);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            values_encoded: self.values_encoded.load(Ordering::Relaxed),
            values_decoded: self.values_decoded.load(Ordering::Relaxed),
            bytes_written: self.bytes_written.load(Ordering::Relaxed),
            bytes_read: self.bytes_read.load(Ordering::Relaxed),
            encode_failures: self.encode_failures.load(Ordering::Relaxed),
            decode_failures: self.decode_failures.load(Ordering::Relaxed),
            policy_repairs: self.policy_repairs.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            values_encoded = snapshot.values_encoded,
            values_decoded = snapshot.values_decoded,
            bytes_written = snapshot.bytes_written,
            bytes_read = snapshot.bytes_read,
            encode_failures = snapshot.encode_failures,
            decode_failures = snapshot.decode_failures,
            policy_repairs = snapshot.policy_repairs,
            uptime_seconds = snapshot.uptime_seconds,
            "Codec metrics snapshot"
        );
    }
}

impl Default for CodecMetrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub values_encoded: u64,
    pub values_decoded: u64,
    pub bytes_written: u64,
    pub bytes_read: u64,
    pub encode_failures: u64,
    pub decode_failures: u64,
    pub policy_repairs: u64,
    pub uptime_seconds: u64,
}

static METRICS: Lazy<CodecMetrics> = Lazy::new(CodecMetrics::new);

/// Get the global metrics instance
pub fn global_metrics() -> &'static CodecMetrics {
    &METRICS
}

/// Timer for measuring an encode or decode pass; logs the duration on drop
pub struct Timer {
    start: Instant,
    operation: &'static str,
}

impl Timer {
    pub fn start(operation: &'static str) -> Self {
        Self {
            start: Instant::now(),
            operation,
        }
    }
}

impl Drop for Timer {
    fn drop(&mut self) {
        debug!(
            operation = self.operation,
            duration_us = self.start.elapsed().as_micros() as u64,
            "Operation completed"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = CodecMetrics::new();
        metrics.value_encoded(4);
        metrics.value_encoded(6);
        metrics.value_decoded(3);
        metrics.decode_failed();
        metrics.policy_repair();

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.values_encoded, 2);
        assert_eq!(snapshot.bytes_written, 10);
        assert_eq!(snapshot.values_decoded, 1);
        assert_eq!(snapshot.bytes_read, 3);
        assert_eq!(snapshot.encode_failures, 0);
        assert_eq!(snapshot.decode_failures, 1);
        assert_eq!(snapshot.policy_repairs, 1);
        metrics.log_metrics();
    }

    #[test]
    fn test_global_metrics_track_dispatch() {
        let _guard = crate::config::test_guard();
        let before = global_metrics().snapshot();
        let bytes = crate::to_bytes(&7u32).expect("encode");
        assert!(crate::from_bytes::<u32>(&bytes[..2]).is_err());
        let after = global_metrics().snapshot();
        assert!(after.values_encoded > before.values_encoded);
        assert!(after.bytes_written >= before.bytes_written + 4);
        assert!(after.decode_failures > before.decode_failures);
    }
}
