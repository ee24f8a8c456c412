//! Frame encoding
//!
//! Converts raw sensor frames into self-describing `EncodedImage` records:
//! uncompressed mono16 for the lossless channel, 16-bit grayscale PNG for
//! the compressed channels. PNG is used deliberately: the sensor delivers
//! more than 8 bits per sample, which rules out JPEG.
//!
//! Every encoding stamps the currently-resolved thermal format label into
//! the frame metadata so consumers can interpret sample values.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use bytes::Bytes;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ExtendedColorType, ImageEncoder};

use super::image::{
    EncodedImage, FrameMetadata, ImageEncoding, IrFormat, MetaValue, META_IR_FORMAT,
};
use super::raw::{PixelDepth, RawFrame};

/// PNG compression effort
///
/// PNG is lossless, so the preview channel's "lower quality" is a
/// lower-effort compression level rather than a lossy quality factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PngCompression {
    /// Fast, larger output (preview channel)
    Fast,
    /// Balanced effort (full-quality channel default)
    Default,
    /// Smallest output, slowest
    Best,
}

impl PngCompression {
    fn to_image(self) -> CompressionType {
        match self {
            PngCompression::Fast => CompressionType::Fast,
            PngCompression::Default => CompressionType::Default,
            PngCompression::Best => CompressionType::Best,
        }
    }
}

/// Error type for frame encoding
#[derive(Debug, Clone)]
pub enum EncodeError {
    /// Payload length does not match the declared dimensions
    BufferSize {
        /// Expected length in bytes
        expected: usize,
        /// Actual length in bytes
        got: usize,
    },
    /// The PNG encoder rejected the frame
    Png(String),
}

impl std::fmt::Display for EncodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EncodeError::BufferSize { expected, got } => {
                write!(f, "Frame buffer size mismatch: expected {expected} bytes, got {got}")
            }
            EncodeError::Png(msg) => write!(f, "PNG encoding failed: {msg}"),
        }
    }
}

impl std::error::Error for EncodeError {}

/// Shared cell holding the currently-resolved thermal format mode
///
/// Written by the parameter registry when `ir_format` changes, read by the
/// codec on every encode. Atomic so the hardware-callback thread never
/// takes a lock for it.
#[derive(Debug)]
pub struct FormatCell(AtomicU8);

impl FormatCell {
    /// Create a cell holding the given mode
    pub fn new(format: IrFormat) -> Self {
        Self(AtomicU8::new(Self::to_tag(format)))
    }

    /// Current mode
    pub fn get(&self) -> IrFormat {
        Self::from_tag(self.0.load(Ordering::Acquire))
    }

    /// Replace the mode
    pub fn set(&self, format: IrFormat) {
        self.0.store(Self::to_tag(format), Ordering::Release);
    }

    fn to_tag(format: IrFormat) -> u8 {
        match format {
            IrFormat::TemperatureLinear10mK => 0,
            IrFormat::TemperatureLinear100mK => 1,
            IrFormat::Radiometric => 2,
        }
    }

    fn from_tag(tag: u8) -> IrFormat {
        match tag {
            0 => IrFormat::TemperatureLinear10mK,
            1 => IrFormat::TemperatureLinear100mK,
            _ => IrFormat::Radiometric,
        }
    }
}

/// Widen 8-bit samples to the canonical 16-bit depth
///
/// Each sample is shifted into the high byte so full-scale input maps to
/// full-scale output.
pub fn widen_to_mono16(samples: &[u8]) -> Bytes {
    let mut out = Vec::with_capacity(samples.len() * 2);
    for &s in samples {
        out.extend_from_slice(&((s as u16) << 8).to_ne_bytes());
    }
    Bytes::from(out)
}

/// Encodes raw frames into consumer-facing image records
#[derive(Debug)]
pub struct FrameCodec {
    /// Device identity label stamped into every frame's metadata
    device: String,
    /// Currently-resolved thermal format mode
    format: Arc<FormatCell>,
}

impl FrameCodec {
    /// Create a codec for the given device identity and shared format cell
    pub fn new(device: impl Into<String>, format: Arc<FormatCell>) -> Self {
        Self {
            device: device.into(),
            format,
        }
    }

    /// The thermal format label the next encoding will carry
    pub fn current_format(&self) -> IrFormat {
        self.format.get()
    }

    /// Encode a frame as uncompressed mono16
    ///
    /// Row-major layout, stride equal to the frame width in samples. Mono8
    /// input is widened to 16 bits.
    pub fn encode_raw(&self, frame: &RawFrame) -> Result<EncodedImage, EncodeError> {
        let data = self.mono16_payload(frame)?;

        Ok(EncodedImage {
            width: frame.width,
            height: frame.height,
            step: frame.width,
            encoding: ImageEncoding::Mono16,
            data,
            metadata: self.metadata(frame),
        })
    }

    /// Encode a frame as a 16-bit grayscale PNG
    ///
    /// A failure here is fatal to this frame's encoding only; the caller
    /// drops the frame, not the session.
    pub fn encode_png(
        &self,
        frame: &RawFrame,
        compression: PngCompression,
    ) -> Result<EncodedImage, EncodeError> {
        let samples = self.mono16_payload(frame)?;

        let mut out = Vec::new();
        let encoder =
            PngEncoder::new_with_quality(&mut out, compression.to_image(), FilterType::Adaptive);
        encoder
            .write_image(&samples, frame.width, frame.height, ExtendedColorType::L16)
            .map_err(|e| EncodeError::Png(e.to_string()))?;

        Ok(EncodedImage {
            width: frame.width,
            height: frame.height,
            step: 0,
            encoding: ImageEncoding::Compressed,
            data: Bytes::from(out),
            metadata: self.metadata(frame),
        })
    }

    /// Get the frame payload as mono16 bytes, widening mono8 input
    fn mono16_payload(&self, frame: &RawFrame) -> Result<Bytes, EncodeError> {
        let expected = frame.depth.frame_len(frame.width, frame.height);
        if frame.data.len() != expected {
            return Err(EncodeError::BufferSize {
                expected,
                got: frame.data.len(),
            });
        }

        match frame.depth {
            PixelDepth::Mono16 => Ok(frame.data.clone()),
            PixelDepth::Mono8 => Ok(widen_to_mono16(&frame.data)),
        }
    }

    fn metadata(&self, frame: &RawFrame) -> FrameMetadata {
        let mut extended = HashMap::new();
        extended.insert(
            META_IR_FORMAT.to_string(),
            MetaValue::Str(self.format.get().label().to_string()),
        );

        FrameMetadata {
            device: self.device.clone(),
            seqno: frame.seqno,
            captured_at: frame.captured_at,
            extended,
        }
    }
}
