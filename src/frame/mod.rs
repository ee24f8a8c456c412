//! Frame model and encoding
//!
//! This module provides:
//! - Raw sensor frame representation (`RawFrame`)
//! - Self-describing encoded image records (`EncodedImage`)
//! - Mono16 / 16-bit PNG encoding with per-frame metadata
//! - The closed set of thermal format labels (`IrFormat`)

pub mod codec;
pub mod image;
pub mod raw;

pub use codec::{widen_to_mono16, EncodeError, FormatCell, FrameCodec, PngCompression};
pub use image::{
    EncodedImage, FrameMetadata, ImageEncoding, IrFormat, MetaValue, META_IR_FORMAT,
};
pub use raw::{PixelDepth, RawFrame};
