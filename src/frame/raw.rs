//! Raw sensor frames as delivered by the capture hardware
//!
//! A `RawFrame` is the immutable, reference-counted form of one hardware
//! frame. The ingestion callback builds it once; afterwards it is shared
//! between the current-frame cache and every distribution channel without
//! copying the pixel payload.

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Pixel depth of a raw frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelDepth {
    /// 8-bit grayscale samples
    Mono8,
    /// 16-bit grayscale samples (canonical depth for thermal data)
    Mono16,
}

impl PixelDepth {
    /// Bytes per sample at this depth
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            PixelDepth::Mono8 => 1,
            PixelDepth::Mono16 => 2,
        }
    }

    /// Expected buffer length in bytes for a frame of the given dimensions
    pub fn frame_len(&self, width: u32, height: u32) -> usize {
        width as usize * height as usize * self.bytes_per_sample()
    }
}

/// One immutable sensor frame
///
/// Cheap to clone: the pixel payload is a refcounted `Bytes`, so the cache
/// and all subscribers share a single allocation.
#[derive(Debug, Clone)]
pub struct RawFrame {
    /// Pixel payload, row-major, native-endian samples
    pub data: Bytes,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Sample depth of `data`
    pub depth: PixelDepth,
    /// Session-scoped sequence number (strictly increasing, never reused)
    pub seqno: u64,
    /// Wall-clock arrival time
    pub captured_at: DateTime<Utc>,
}

impl RawFrame {
    /// Create a new frame
    ///
    /// The caller is expected to have validated that `data` holds exactly
    /// `depth.frame_len(width, height)` bytes; the session drops mismatched
    /// hardware buffers before they reach this constructor.
    pub fn new(
        data: Bytes,
        width: u32,
        height: u32,
        depth: PixelDepth,
        seqno: u64,
        captured_at: DateTime<Utc>,
    ) -> Self {
        Self {
            data,
            width,
            height,
            depth,
            seqno,
            captured_at,
        }
    }

    /// Number of pixels in the frame
    pub fn pixel_count(&self) -> usize {
        self.width as usize * self.height as usize
    }

    /// Whether the payload length matches the declared dimensions and depth
    pub fn is_well_formed(&self) -> bool {
        self.data.len() == self.depth.frame_len(self.width, self.height)
    }
}
