//! # Fragment Reassembly
//!
//! Messages too large for one command arrive as a series of `SendFragment`
//! commands. Each fragment names the sequence number that started its series, the
//! declared total length, and the byte offset its payload belongs at.
//!
//! A series lives in the pending table from its first fragment until the running
//! byte count reaches the declared total, at which point it is removed and its
//! buffer returned exactly once. Placement uses the explicit offset, so arrival
//! order does not matter.
//!
//! The byte count is the sum of fragment payload lengths, not the number of distinct
//! bytes covered. Duplicate or overlapping fragments therefore advance it too.
//!
//! Without limits the table grows without bound when series never complete; see
//! [`ReassemblyConfig`] for the available caps and [`Reassembler::evict_older_than`]
//! for explicit expiry.

use crate::config::ReassemblyConfig;
use crate::core::packet::FragmentHeader;
use bytes::{Bytes, BytesMut};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::time::{Duration, Instant};
use tracing::{debug, trace, warn};

/// One fragment as read off the wire.
#[derive(Debug, Clone, Copy)]
pub struct Fragment<'a> {
    pub header: FragmentHeader,
    pub payload: &'a [u8],
}

/// Why a fragment was dropped without being written.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// The series declared a total length above the configured maximum.
    Oversized { total_length: usize },
    /// The payload would land outside the series buffer.
    OutOfBounds { offset: usize, length: usize },
}

/// Result of feeding one fragment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Assembly {
    /// Stored; the series is still incomplete.
    Pending,
    /// The series completed; this is its full buffer.
    Complete(Bytes),
    /// Dropped without touching any buffer.
    Rejected(Rejection),
}

/// Partially received message.
#[derive(Debug)]
pub struct SegmentedPackage {
    /// Declared final size, fixed by the first fragment seen.
    pub total_length: usize,
    /// Zero-filled storage of `total_length` bytes.
    pub buffer: BytesMut,
    /// Sum of payload lengths written so far.
    pub bytes_written: usize,
    created_at: Instant,
    generation: u64,
}

impl SegmentedPackage {
    fn new(total_length: usize, generation: u64) -> Self {
        Self {
            total_length,
            buffer: BytesMut::zeroed(total_length),
            bytes_written: 0,
            created_at: Instant::now(),
            generation,
        }
    }

    #[inline]
    pub fn is_complete(&self) -> bool {
        self.bytes_written >= self.total_length
    }

    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }
}

/// Pending segment table keyed by starting sequence number.
#[derive(Debug)]
pub struct Reassembler {
    pending: HashMap<u32, SegmentedPackage>,
    /// Creation order for FIFO eviction. Entries for series that already completed
    /// or expired are skipped lazily by matching the generation.
    creation_order: VecDeque<(u32, u64)>,
    next_generation: u64,
    /// Series evicted by the pending cap since the last `take_evicted`.
    evicted: usize,
    config: ReassemblyConfig,
}

impl Default for Reassembler {
    fn default() -> Self {
        Self::new(ReassemblyConfig::default())
    }
}

impl Reassembler {
    pub fn new(config: ReassemblyConfig) -> Self {
        if config.max_pending_segments == Some(0) {
            warn!("max_pending_segments of 0 is invalid - keeping one pending series");
        }
        Self {
            pending: HashMap::new(),
            creation_order: VecDeque::new(),
            next_generation: 0,
            evicted: 0,
            config,
        }
    }

    pub fn config(&self) -> &ReassemblyConfig {
        &self.config
    }

    /// Number of incomplete series.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    /// Look at an incomplete series.
    pub fn get(&self, start_sequence_number: u32) -> Option<&SegmentedPackage> {
        self.pending.get(&start_sequence_number)
    }

    /// Store one fragment, returning the full buffer once its series completes.
    ///
    /// A rejected fragment leaves the table untouched: it neither opens a series
    /// nor evicts one to make room.
    pub fn accept(&mut self, fragment: Fragment<'_>) -> Assembly {
        let header = fragment.header;
        let key = header.start_sequence_number;
        let existing = self.pending.get(&key).map(|package| package.total_length);
        let total_length = existing.unwrap_or(header.total_length as usize);

        if existing.is_none() && total_length > self.config.max_segment_length {
            warn!(
                start_sequence_number = key,
                total_length,
                max = self.config.max_segment_length,
                "Fragment series exceeds maximum length - dropping fragment"
            );
            return Assembly::Rejected(Rejection::Oversized { total_length });
        }

        let offset = header.fragment_offset as usize;
        let length = fragment.payload.len();
        let end = match offset.checked_add(length) {
            Some(end) if end <= total_length => end,
            _ => {
                warn!(
                    start_sequence_number = key,
                    fragment_number = header.fragment_number,
                    offset,
                    length,
                    total_length,
                    "Fragment outside series buffer - dropping fragment"
                );
                return Assembly::Rejected(Rejection::OutOfBounds { offset, length });
            }
        };

        if existing.is_none() {
            self.make_room();
        }

        let package = match self.pending.entry(key) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => {
                let generation = self.next_generation;
                self.next_generation += 1;
                self.creation_order.push_back((key, generation));
                trace!(
                    start_sequence_number = key,
                    total_length,
                    fragment_count = header.fragment_count,
                    "New fragment series"
                );
                entry.insert(SegmentedPackage::new(total_length, generation))
            }
        };

        package.buffer[offset..end].copy_from_slice(fragment.payload);
        package.bytes_written += length;
        trace!(
            start_sequence_number = key,
            fragment_number = header.fragment_number,
            bytes_written = package.bytes_written,
            total_length = package.total_length,
            "Fragment stored"
        );

        if !package.is_complete() {
            return Assembly::Pending;
        }

        match self.pending.remove(&key) {
            Some(package) => {
                debug!(
                    start_sequence_number = key,
                    total_length = package.total_length,
                    "Fragment series complete"
                );
                self.compact_order();
                Assembly::Complete(package.buffer.freeze())
            }
            None => Assembly::Pending,
        }
    }

    /// Drop every series older than `max_age`. Returns how many were dropped.
    pub fn evict_older_than(&mut self, max_age: Duration) -> usize {
        let now = Instant::now();
        let before = self.pending.len();

        self.pending
            .retain(|_, package| now.duration_since(package.created_at) < max_age);

        let removed = before - self.pending.len();
        if removed > 0 {
            self.compact_order();
            debug!(removed, "Evicted expired fragment series");
        }
        removed
    }

    /// Apply the configured time-to-live, if any.
    pub fn evict_expired(&mut self) -> usize {
        match self.config.segment_ttl {
            Some(ttl) => self.evict_older_than(ttl),
            None => 0,
        }
    }

    /// Number of series evicted by the pending cap since the previous call.
    pub fn take_evicted(&mut self) -> usize {
        std::mem::take(&mut self.evicted)
    }

    /// Drop every pending series.
    pub fn clear(&mut self) -> usize {
        let removed = self.pending.len();
        self.pending.clear();
        self.creation_order.clear();
        if removed > 0 {
            debug!(removed, "Cleared pending fragment series");
        }
        removed
    }

    /// Evict the oldest series until a new one fits under the cap.
    fn make_room(&mut self) {
        let Some(max) = self.config.max_pending_segments else {
            return;
        };
        // a cap of 0 fails validation; unvalidated it behaves as 1
        while self.pending.len() >= max.max(1) {
            if !self.evict_oldest() {
                break;
            }
        }
    }

    fn evict_oldest(&mut self) -> bool {
        while let Some((key, generation)) = self.creation_order.pop_front() {
            let live = self
                .pending
                .get(&key)
                .is_some_and(|package| package.generation == generation);
            if live {
                self.pending.remove(&key);
                self.evicted += 1;
                debug!(
                    start_sequence_number = key,
                    "Evicted oldest fragment series to stay under limit"
                );
                return true;
            }
        }
        false
    }

    /// Keep the creation queue from accumulating stale entries.
    fn compact_order(&mut self) {
        if self.creation_order.len() <= self.pending.len() * 2 + 16 {
            return;
        }
        let pending = &self.pending;
        self.creation_order.retain(|(key, generation)| {
            pending
                .get(key)
                .is_some_and(|package| package.generation == *generation)
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(key: u32, total: u32, offset: u32, payload: &[u8]) -> Fragment<'_> {
        Fragment {
            header: FragmentHeader {
                start_sequence_number: key,
                fragment_count: 0,
                fragment_number: 0,
                total_length: total,
                fragment_offset: offset,
            },
            payload,
        }
    }

    #[test]
    fn test_completes_out_of_order() {
        let mut reassembler = Reassembler::default();

        assert_eq!(reassembler.accept(fragment(1, 6, 4, b"ef")), Assembly::Pending);
        assert_eq!(reassembler.accept(fragment(1, 6, 0, b"ab")), Assembly::Pending);
        assert_eq!(reassembler.len(), 1);

        let done = reassembler.accept(fragment(1, 6, 2, b"cd"));
        assert_eq!(done, Assembly::Complete(Bytes::from_static(b"abcdef")));
        assert!(reassembler.is_empty());
    }

    #[test]
    fn test_total_length_fixed_by_first_fragment() {
        let mut reassembler = Reassembler::default();

        reassembler.accept(fragment(5, 4, 0, b"ab"));
        // a later fragment declaring a different total does not resize the series
        reassembler.accept(fragment(5, 100, 2, b"c"));
        let package = reassembler.get(5).unwrap();
        assert_eq!(package.total_length, 4);
        assert_eq!(package.bytes_written, 3);
        assert_eq!(&package.buffer[..], b"abc\0");
    }

    #[test]
    fn test_duplicate_fragment_counts_twice() {
        let mut reassembler = Reassembler::default();

        reassembler.accept(fragment(2, 4, 0, b"ab"));
        let done = reassembler.accept(fragment(2, 4, 0, b"ab"));
        // completion is declared even though bytes 2..4 were never written
        assert_eq!(done, Assembly::Complete(Bytes::from_static(b"ab\0\0")));
    }

    #[test]
    fn test_out_of_bounds_rejected() {
        let mut reassembler = Reassembler::default();

        let result = reassembler.accept(fragment(3, 4, 3, b"xy"));
        assert_eq!(
            result,
            Assembly::Rejected(Rejection::OutOfBounds {
                offset: 3,
                length: 2
            })
        );
        assert!(reassembler.get(3).is_none());

        // against an open series the stored total applies and nothing is counted
        reassembler.accept(fragment(3, 4, 0, b"a"));
        assert!(matches!(
            reassembler.accept(fragment(3, 100, 3, b"xy")),
            Assembly::Rejected(Rejection::OutOfBounds { .. })
        ));
        assert_eq!(reassembler.get(3).unwrap().bytes_written, 1);
    }

    #[test]
    fn test_rejected_zero_length_series_leaves_no_entry() {
        let mut reassembler = Reassembler::default();

        let result = reassembler.accept(fragment(9, 0, 0, b"x"));
        assert_eq!(
            result,
            Assembly::Rejected(Rejection::OutOfBounds {
                offset: 0,
                length: 1
            })
        );
        assert!(reassembler.is_empty());
    }

    #[test]
    fn test_rejected_fragment_never_evicts() {
        let mut reassembler = Reassembler::new(ReassemblyConfig {
            max_pending_segments: Some(1),
            ..Default::default()
        });

        reassembler.accept(fragment(1, 4, 0, b"a"));
        let result = reassembler.accept(fragment(2, 2, 5, b"zz"));

        assert!(matches!(result, Assembly::Rejected(Rejection::OutOfBounds { .. })));
        assert!(reassembler.get(1).is_some());
        assert_eq!(reassembler.take_evicted(), 0);
    }

    #[test]
    fn test_zero_cap_keeps_one_series() {
        let config = ReassemblyConfig {
            max_pending_segments: Some(0),
            ..Default::default()
        };
        assert!(!config.validate().is_empty());

        let mut reassembler = Reassembler::new(config);
        reassembler.accept(fragment(1, 4, 0, b"a"));
        reassembler.accept(fragment(2, 4, 0, b"a"));

        assert_eq!(reassembler.len(), 1);
        assert!(reassembler.get(2).is_some());
        assert_eq!(reassembler.take_evicted(), 1);
    }

    #[test]
    fn test_oversized_rejected() {
        let mut reassembler = Reassembler::new(ReassemblyConfig {
            max_segment_length: 8,
            ..Default::default()
        });

        let result = reassembler.accept(fragment(4, 9, 0, b"x"));
        assert_eq!(
            result,
            Assembly::Rejected(Rejection::Oversized { total_length: 9 })
        );
        assert!(reassembler.is_empty());
    }

    #[test]
    fn test_zero_length_series_completes_immediately() {
        let mut reassembler = Reassembler::default();
        assert_eq!(
            reassembler.accept(fragment(8, 0, 0, b"")),
            Assembly::Complete(Bytes::new())
        );
    }

    #[test]
    fn test_max_pending_evicts_oldest() {
        let mut reassembler = Reassembler::new(ReassemblyConfig {
            max_pending_segments: Some(2),
            ..Default::default()
        });

        reassembler.accept(fragment(1, 4, 0, b"a"));
        reassembler.accept(fragment(2, 4, 0, b"a"));
        reassembler.accept(fragment(3, 4, 0, b"a"));

        assert_eq!(reassembler.len(), 2);
        assert_eq!(reassembler.take_evicted(), 1);
        assert_eq!(reassembler.take_evicted(), 0);
        assert!(reassembler.get(1).is_none());
        assert!(reassembler.get(2).is_some());
        assert!(reassembler.get(3).is_some());
    }

    #[test]
    fn test_eviction_skips_reused_key() {
        let mut reassembler = Reassembler::new(ReassemblyConfig {
            max_pending_segments: Some(2),
            ..Default::default()
        });

        // series 1 completes, then key 1 is reused by a newer series
        reassembler.accept(fragment(1, 1, 0, b"a"));
        reassembler.accept(fragment(2, 4, 0, b"a"));
        reassembler.accept(fragment(1, 4, 0, b"b"));
        reassembler.accept(fragment(3, 4, 0, b"c"));

        assert!(reassembler.get(2).is_none());
        assert_eq!(&reassembler.get(1).unwrap().buffer[..1], b"b");
        assert!(reassembler.get(3).is_some());
    }

    #[test]
    fn test_evict_older_than() {
        let mut reassembler = Reassembler::default();
        reassembler.accept(fragment(1, 4, 0, b"a"));
        reassembler.accept(fragment(2, 4, 0, b"a"));

        assert_eq!(reassembler.evict_older_than(Duration::from_secs(3600)), 0);
        assert_eq!(reassembler.evict_older_than(Duration::ZERO), 2);
        assert!(reassembler.is_empty());
    }

    #[test]
    fn test_evict_expired_without_ttl_is_noop() {
        let mut reassembler = Reassembler::default();
        reassembler.accept(fragment(1, 4, 0, b"a"));
        assert_eq!(reassembler.evict_expired(), 0);
        assert_eq!(reassembler.clear(), 1);
    }
}
