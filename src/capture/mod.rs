//! Current-frame cache
//!
//! Holds the single most recently ingested frame under a mutex so
//! synchronous "give me the current frame" requests always observe either
//! the previous or the newest frame, never a torn one. Snapshots re-encode
//! on demand; the lock covers only the read/replace, never the encoding.

use std::sync::Mutex;

use crate::frame::{EncodeError, EncodedImage, FrameCodec, PngCompression, RawFrame};

/// Error type for snapshot requests
#[derive(Debug, Clone)]
pub enum CaptureError {
    /// No frame has been ingested yet
    NoFrame,
    /// The cached frame failed to encode
    Encode(EncodeError),
}

impl std::fmt::Display for CaptureError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CaptureError::NoFrame => write!(f, "Could not read from camera: no frame yet"),
            CaptureError::Encode(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for CaptureError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CaptureError::Encode(err) => Some(err),
            CaptureError::NoFrame => None,
        }
    }
}

impl From<EncodeError> for CaptureError {
    fn from(err: EncodeError) -> Self {
        CaptureError::Encode(err)
    }
}

/// Cache of the most recently published frame
#[derive(Debug, Default)]
pub struct CaptureState {
    current: Mutex<Option<RawFrame>>,
}

impl CaptureState {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached frame with a newer one
    pub fn publish(&self, frame: RawFrame) {
        let mut current = self.current.lock().unwrap();
        *current = Some(frame);
    }

    /// Clone the latest published frame out of the cache
    pub fn latest(&self) -> Option<RawFrame> {
        self.current.lock().unwrap().clone()
    }

    /// Whether any frame has been published yet
    pub fn has_frame(&self) -> bool {
        self.current.lock().unwrap().is_some()
    }

    /// Encode the latest frame as uncompressed mono16
    pub fn snapshot(&self, codec: &FrameCodec) -> Result<EncodedImage, CaptureError> {
        let frame = self.latest().ok_or(CaptureError::NoFrame)?;
        Ok(codec.encode_raw(&frame)?)
    }

    /// Encode the latest frame as a 16-bit PNG
    pub fn snapshot_png(
        &self,
        codec: &FrameCodec,
        compression: PngCompression,
    ) -> Result<EncodedImage, CaptureError> {
        let frame = self.latest().ok_or(CaptureError::NoFrame)?;
        Ok(codec.encode_png(&frame, compression)?)
    }
}
