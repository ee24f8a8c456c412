//! Encoded image records and frame metadata
//!
//! An `EncodedImage` is the self-describing, consumer-facing form of a
//! frame: raw mono16 for the lossless channel, PNG for the compressed
//! channels. It is immutable once constructed and designed to be cheap to
//! clone, so one encoding can be offered to several subscribers.

use std::collections::HashMap;

use bytes::Bytes;
use chrono::{DateTime, Utc};

/// Metadata key carrying the thermal sample interpretation label
pub const META_IR_FORMAT: &str = "ir_format";

/// How the image payload is encoded
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageEncoding {
    /// Uncompressed 8-bit grayscale, row-major
    Mono8,
    /// Uncompressed 16-bit grayscale, row-major, native-endian samples
    Mono16,
    /// PNG-compressed payload
    Compressed,
}

/// A typed metadata value attached to a frame
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    /// UTF-8 string
    Str(String),
    /// Double-precision float
    F64(f64),
    /// Signed integer
    I64(i64),
}

impl MetaValue {
    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a float
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            MetaValue::F64(v) => Some(*v),
            MetaValue::I64(v) => Some(*v as f64),
            _ => None,
        }
    }
}

/// Per-frame metadata block
#[derive(Debug, Clone)]
pub struct FrameMetadata {
    /// Identity of the producing device (model + serial)
    pub device: String,
    /// Session-scoped sequence number
    pub seqno: u64,
    /// Wall-clock capture time
    pub captured_at: DateTime<Utc>,
    /// Extensible key/value annotations (always carries `ir_format`)
    pub extended: HashMap<String, MetaValue>,
}

impl FrameMetadata {
    /// The thermal format label attached to this frame, if present
    pub fn ir_format(&self) -> Option<&str> {
        self.extended.get(META_IR_FORMAT).and_then(MetaValue::as_str)
    }
}

/// A self-describing encoded frame
///
/// The payload is refcounted; cloning shares the allocation.
#[derive(Debug, Clone)]
pub struct EncodedImage {
    /// Image width in pixels
    pub width: u32,
    /// Image height in pixels
    pub height: u32,
    /// Row stride in samples for raw encodings, 0 for compressed payloads
    pub step: u32,
    /// Payload encoding
    pub encoding: ImageEncoding,
    /// Encoded payload bytes
    pub data: Bytes,
    /// Per-frame metadata
    pub metadata: FrameMetadata,
}

/// Thermal sample interpretation mode
///
/// Describes how raw 16-bit sample values map to physical units. The label
/// set is closed: these are the only modes the device exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrFormat {
    /// Linear temperature, 10 mK per count
    TemperatureLinear10mK,
    /// Linear temperature, 100 mK per count
    TemperatureLinear100mK,
    /// Uncalibrated radiometric counts
    Radiometric,
}

impl IrFormat {
    /// All modes, in device order
    pub const ALL: [IrFormat; 3] = [
        IrFormat::TemperatureLinear10mK,
        IrFormat::TemperatureLinear100mK,
        IrFormat::Radiometric,
    ];

    /// Logical label used by the parameter interface and frame metadata
    pub fn label(&self) -> &'static str {
        match self {
            IrFormat::TemperatureLinear10mK => "temperature_linear_10mK",
            IrFormat::TemperatureLinear100mK => "temperature_linear_100mK",
            IrFormat::Radiometric => "radiometric",
        }
    }

    /// Enumeration entry label used by the device register
    pub fn device_label(&self) -> &'static str {
        match self {
            IrFormat::TemperatureLinear10mK => "TemperatureLinear10mK",
            IrFormat::TemperatureLinear100mK => "TemperatureLinear100mK",
            IrFormat::Radiometric => "Radiometric",
        }
    }

    /// Resolve a logical label (exact match)
    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.label() == label)
    }

    /// Resolve a device enumeration label (exact match)
    pub fn from_device_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.device_label() == label)
    }
}

impl std::fmt::Display for IrFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}
