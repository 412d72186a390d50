//! Observability and Metrics
//!
//! Counters describing what the parser saw and what it dropped. Silent drops are
//! the norm for a passive decoder, so these are the only place they become visible.
//!
//! Uses atomic counters so a snapshot can be taken from another thread while the
//! parser runs.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::info;

/// Metrics collector for one parser instance
#[derive(Debug)]
pub struct Metrics {
    /// Datagrams handed to the parser
    pub packets_total: AtomicU64,
    /// Bytes handed to the parser
    pub bytes_total: AtomicU64,
    /// Datagrams shorter than the packet header
    pub packets_truncated: AtomicU64,
    /// Datagrams dropped for carrying the encryption flag
    pub packets_encrypted: AtomicU64,
    /// Datagrams dropped on checksum mismatch
    pub checksum_failures: AtomicU64,
    /// Commands read
    pub commands_total: AtomicU64,
    /// Commands skipped for having an unhandled type
    pub commands_unknown: AtomicU64,
    /// Commands that ended packet processing early
    pub commands_malformed: AtomicU64,
    /// Fragment commands read
    pub fragments_total: AtomicU64,
    /// Fragments dropped by the reassembler
    pub fragments_rejected: AtomicU64,
    /// Fragment series completed
    pub segments_completed: AtomicU64,
    /// Fragment series evicted before completion
    pub segments_evicted: AtomicU64,
    /// Operation requests decoded
    pub requests_decoded: AtomicU64,
    /// Operation responses decoded
    pub responses_decoded: AtomicU64,
    /// Events decoded
    pub events_decoded: AtomicU64,
    /// Messages with an unrecognized message type
    pub messages_unknown: AtomicU64,
    /// Payloads the value decoder rejected
    pub decode_errors: AtomicU64,
    /// Start time for uptime calculation
    start_time: Instant,
}

impl Metrics {
    /// Create a new metrics collector
    pub fn new() -> Self {
        Self {
            packets_total: AtomicU64::new(0),
            bytes_total: AtomicU64::new(0),
            packets_truncated: AtomicU64::new(0),
            packets_encrypted: AtomicU64::new(0),
            checksum_failures: AtomicU64::new(0),
            commands_total: AtomicU64::new(0),
            commands_unknown: AtomicU64::new(0),
            commands_malformed: AtomicU64::new(0),
            fragments_total: AtomicU64::new(0),
            fragments_rejected: AtomicU64::new(0),
            segments_completed: AtomicU64::new(0),
            segments_evicted: AtomicU64::new(0),
            requests_decoded: AtomicU64::new(0),
            responses_decoded: AtomicU64::new(0),
            events_decoded: AtomicU64::new(0),
            messages_unknown: AtomicU64::new(0),
            decode_errors: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    #[inline]
    fn bump(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a datagram handed to the parser
    pub fn packet_received(&self, byte_count: u64) {
        Self::bump(&self.packets_total);
        self.bytes_total.fetch_add(byte_count, Ordering::Relaxed);
    }

    pub fn packet_truncated(&self) {
        Self::bump(&self.packets_truncated);
    }

    pub fn packet_encrypted(&self) {
        Self::bump(&self.packets_encrypted);
    }

    pub fn checksum_failed(&self) {
        Self::bump(&self.checksum_failures);
    }

    pub fn command_read(&self) {
        Self::bump(&self.commands_total);
    }

    pub fn command_unknown(&self) {
        Self::bump(&self.commands_unknown);
    }

    pub fn command_malformed(&self) {
        Self::bump(&self.commands_malformed);
    }

    pub fn fragment_read(&self) {
        Self::bump(&self.fragments_total);
    }

    pub fn fragment_rejected(&self) {
        Self::bump(&self.fragments_rejected);
    }

    pub fn segment_completed(&self) {
        Self::bump(&self.segments_completed);
    }

    /// Record series dropped by eviction or expiry
    pub fn segments_evicted(&self, count: u64) {
        self.segments_evicted.fetch_add(count, Ordering::Relaxed);
    }

    pub fn request_decoded(&self) {
        Self::bump(&self.requests_decoded);
    }

    pub fn response_decoded(&self) {
        Self::bump(&self.responses_decoded);
    }

    pub fn event_decoded(&self) {
        Self::bump(&self.events_decoded);
    }

    pub fn message_unknown(&self) {
        Self::bump(&self.messages_unknown);
    }

    pub fn decode_error(&self) {
        Self::bump(&self.decode_errors);
    }

    /// Get current metrics snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            packets_total: self.packets_total.load(Ordering::Relaxed),
            bytes_total: self.bytes_total.load(Ordering::Relaxed),
            packets_truncated: self.packets_truncated.load(Ordering::Relaxed),
            packets_encrypted: self.packets_encrypted.load(Ordering::Relaxed),
            checksum_failures: self.checksum_failures.load(Ordering::Relaxed),
            commands_total: self.commands_total.load(Ordering::Relaxed),
            commands_unknown: self.commands_unknown.load(Ordering::Relaxed),
            commands_malformed: self.commands_malformed.load(Ordering::Relaxed),
            fragments_total: self.fragments_total.load(Ordering::Relaxed),
            fragments_rejected: self.fragments_rejected.load(Ordering::Relaxed),
            segments_completed: self.segments_completed.load(Ordering::Relaxed),
            segments_evicted: self.segments_evicted.load(Ordering::Relaxed),
            requests_decoded: self.requests_decoded.load(Ordering::Relaxed),
            responses_decoded: self.responses_decoded.load(Ordering::Relaxed),
            events_decoded: self.events_decoded.load(Ordering::Relaxed),
            messages_unknown: self.messages_unknown.load(Ordering::Relaxed),
            decode_errors: self.decode_errors.load(Ordering::Relaxed),
            uptime_seconds: self.start_time.elapsed().as_secs(),
        }
    }

    /// Log current metrics
    pub fn log_metrics(&self) {
        let snapshot = self.snapshot();
        info!(
            packets_total = snapshot.packets_total,
            bytes_total = snapshot.bytes_total,
            packets_truncated = snapshot.packets_truncated,
            packets_encrypted = snapshot.packets_encrypted,
            checksum_failures = snapshot.checksum_failures,
            commands_total = snapshot.commands_total,
            commands_unknown = snapshot.commands_unknown,
            commands_malformed = snapshot.commands_malformed,
            fragments_total = snapshot.fragments_total,
            fragments_rejected = snapshot.fragments_rejected,
            segments_completed = snapshot.segments_completed,
            segments_evicted = snapshot.segments_evicted,
            requests_decoded = snapshot.requests_decoded,
            responses_decoded = snapshot.responses_decoded,
            events_decoded = snapshot.events_decoded,
            messages_unknown = snapshot.messages_unknown,
            decode_errors = snapshot.decode_errors,
            uptime_seconds = snapshot.uptime_seconds,
            "Decoder metrics snapshot"
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

/// Snapshot of metrics at a point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub packets_total: u64,
    pub bytes_total: u64,
    pub packets_truncated: u64,
    pub packets_encrypted: u64,
    pub checksum_failures: u64,
    pub commands_total: u64,
    pub commands_unknown: u64,
    pub commands_malformed: u64,
    pub fragments_total: u64,
    pub fragments_rejected: u64,
    pub segments_completed: u64,
    pub segments_evicted: u64,
    pub requests_decoded: u64,
    pub responses_decoded: u64,
    pub events_decoded: u64,
    pub messages_unknown: u64,
    pub decode_errors: u64,
    pub uptime_seconds: u64,
}

impl MetricsSnapshot {
    /// Messages delivered to any callback
    pub fn messages_decoded(&self) -> u64 {
        self.requests_decoded + self.responses_decoded + self.events_decoded
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_accumulate() {
        let metrics = Metrics::new();
        metrics.packet_received(40);
        metrics.packet_received(2);
        metrics.packet_truncated();
        metrics.request_decoded();
        metrics.event_decoded();
        metrics.segments_evicted(3);

        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.packets_total, 2);
        assert_eq!(snapshot.bytes_total, 42);
        assert_eq!(snapshot.packets_truncated, 1);
        assert_eq!(snapshot.segments_evicted, 3);
        assert_eq!(snapshot.messages_decoded(), 2);
    }
}
