//! Bounded per-subscription backlog
//!
//! Each outbound channel subscription buffers not-yet-consumed packets in a
//! fixed-capacity deque. When a new packet arrives on a full backlog the
//! oldest queued packet is dropped to make room: consumers always converge
//! on the most recent data, and the producer never blocks or grows memory.

use std::collections::VecDeque;

use crate::frame::EncodedImage;

/// Fixed-capacity packet queue with drop-oldest overflow
#[derive(Debug)]
pub struct Backlog {
    /// Maximum number of queued packets
    capacity: usize,
    /// Queued packets, oldest first
    frames: VecDeque<EncodedImage>,
    /// Packets shed to make room for newer ones
    dropped: u64,
}

impl Backlog {
    /// Create a backlog holding at most `capacity` packets (minimum 1)
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            frames: VecDeque::with_capacity(capacity),
            dropped: 0,
        }
    }

    /// Queue a packet, shedding the oldest one first if full
    ///
    /// Returns true if a packet was dropped to make room.
    pub fn push(&mut self, image: EncodedImage) -> bool {
        let mut dropped = false;
        if self.frames.len() == self.capacity {
            self.frames.pop_front();
            self.dropped += 1;
            dropped = true;
        }
        self.frames.push_back(image);
        dropped
    }

    /// Take the oldest queued packet
    pub fn pop(&mut self) -> Option<EncodedImage> {
        self.frames.pop_front()
    }

    /// Number of queued packets
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// Whether the backlog is empty
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Maximum number of queued packets
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Packets dropped to overflow since creation
    pub fn dropped(&self) -> u64 {
        self.dropped
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use bytes::Bytes;
    use chrono::Utc;

    use crate::frame::{FrameMetadata, ImageEncoding};

    use super::*;

    fn packet(seqno: u64) -> EncodedImage {
        EncodedImage {
            width: 2,
            height: 2,
            step: 2,
            encoding: ImageEncoding::Mono16,
            data: Bytes::from_static(&[0u8; 8]),
            metadata: FrameMetadata {
                device: "camera".to_string(),
                seqno,
                captured_at: Utc::now(),
                extended: HashMap::new(),
            },
        }
    }

    #[test]
    fn test_push_within_capacity() {
        let mut backlog = Backlog::new(2);
        assert!(!backlog.push(packet(1)));
        assert!(!backlog.push(packet(2)));
        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.dropped(), 0);
    }

    #[test]
    fn test_overflow_drops_oldest() {
        let mut backlog = Backlog::new(2);
        backlog.push(packet(1));
        backlog.push(packet(2));
        assert!(backlog.push(packet(3)));

        assert_eq!(backlog.len(), 2);
        assert_eq!(backlog.dropped(), 1);
        // The oldest packet (seqno 1) was shed; 2 and 3 remain in order
        assert_eq!(backlog.pop().unwrap().metadata.seqno, 2);
        assert_eq!(backlog.pop().unwrap().metadata.seqno, 3);
        assert!(backlog.pop().is_none());
    }

    #[test]
    fn test_count_never_exceeds_capacity() {
        let mut backlog = Backlog::new(3);
        for seqno in 0..100 {
            backlog.push(packet(seqno));
            assert!(backlog.len() <= 3);
        }
        // The newest packet is always retained
        let last = std::iter::from_fn(|| backlog.pop()).last().unwrap();
        assert_eq!(last.metadata.seqno, 99);
    }

    #[test]
    fn test_zero_capacity_clamps_to_one() {
        let mut backlog = Backlog::new(0);
        backlog.push(packet(1));
        backlog.push(packet(2));
        assert_eq!(backlog.len(), 1);
        assert_eq!(backlog.pop().unwrap().metadata.seqno, 2);
    }
}
