//! Ingest statistics
//!
//! Counters updated on the hardware-callback thread without blocking.

use std::sync::atomic::{AtomicU64, Ordering};

/// Snapshot of the ingest counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestSnapshot {
    /// Callback invocations observed
    pub frames_received: u64,
    /// Frames published to the cache (and offered for distribution)
    pub frames_published: u64,
    /// Incomplete frames dropped
    pub frames_dropped_incomplete: u64,
    /// Frames carrying the benign trailing-buffer status, processed anyway
    pub frames_tolerated_trailing: u64,
}

/// Atomic ingest counters
#[derive(Debug, Default)]
pub struct IngestStats {
    frames_received: AtomicU64,
    frames_published: AtomicU64,
    frames_dropped_incomplete: AtomicU64,
    frames_tolerated_trailing: AtomicU64,
}

impl IngestStats {
    /// Create zeroed counters
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a callback invocation
    pub fn record_received(&self) {
        self.frames_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a frame published to the cache
    pub fn record_published(&self) {
        self.frames_published.fetch_add(1, Ordering::Relaxed);
    }

    /// Count an incomplete frame dropped
    pub fn record_dropped_incomplete(&self) {
        self.frames_dropped_incomplete.fetch_add(1, Ordering::Relaxed);
    }

    /// Count a tolerated trailing-buffer frame
    pub fn record_tolerated_trailing(&self) {
        self.frames_tolerated_trailing.fetch_add(1, Ordering::Relaxed);
    }

    /// Read all counters at once
    pub fn snapshot(&self) -> IngestSnapshot {
        IngestSnapshot {
            frames_received: self.frames_received.load(Ordering::Relaxed),
            frames_published: self.frames_published.load(Ordering::Relaxed),
            frames_dropped_incomplete: self.frames_dropped_incomplete.load(Ordering::Relaxed),
            frames_tolerated_trailing: self.frames_tolerated_trailing.load(Ordering::Relaxed),
        }
    }
}
