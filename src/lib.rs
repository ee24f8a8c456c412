//! Thermal camera acquisition and streaming library
//!
//! This crate turns the asynchronous stream of raw sensor frames a thermal
//! camera delivers on its hardware callback into:
//!
//! - one always-current frame cache answering synchronous capture requests
//! - multiple independently-paced outbound channels (raw mono16,
//!   full-quality PNG, fast preview PNG), each consumer with its own small
//!   bounded backlog that sheds its oldest packet on overflow
//! - a typed parameter registry mapping logical names onto the device's
//!   register table, with derived `fps` and `ir_format` parameters
//!
//! # Architecture
//!
//! ```text
//!   hardware callback ──► CameraSession::on_frame
//!                           │
//!             ┌─────────────┴──────────────┐
//!             ▼                            ▼
//!       CaptureState                 StreamEngine
//!       (current frame,              (Idle ⇄ Streaming,
//!        snapshot on demand)          fan-out per channel)
//!                                          │
//!                              raw / compressed / preview
//!                                          ▼
//!                                   Subscriptions
//!                              (bounded backlog, drop oldest)
//!
//!   control plane ──► get_param / set_param ──► ParamRegistry ──► NodeMap
//! ```
//!
//! # Example
//!
//! ```no_run
//! use thermocam::device::{CameraConfig, CameraSession, DeviceIdentity, MockCamera};
//! use thermocam::stream::ChannelKind;
//!
//! # async fn run() -> Result<(), Box<dyn std::error::Error>> {
//! let camera = MockCamera::a320();
//! let identity = DeviceIdentity::new("FLIR Systems", "ThermoVision A320", "70500123");
//! let session = CameraSession::start(camera.clone(), identity, CameraConfig::default())?;
//!
//! let mut frames = session.attach(ChannelKind::Raw);
//! session.start_streaming()?;
//!
//! while let Some(image) = frames.recv().await {
//!     println!("frame {} ({}x{})", image.metadata.seqno, image.width, image.height);
//! }
//! # Ok(())
//! # }
//! ```
//!
//! The hardware SDK boundary is abstract: anything implementing
//! [`device::CaptureDevice`] and [`device::NodeMap`] can back a session.

pub mod capture;
pub mod device;
pub mod frame;
pub mod params;
pub mod stats;
pub mod stream;

pub use capture::{CaptureError, CaptureState};
pub use device::{CameraConfig, CameraSession, DeviceError, DeviceIdentity, DeviceSelector};
pub use frame::{EncodedImage, FrameCodec, IrFormat, PngCompression, RawFrame};
pub use params::{ParamError, ParamValue};
pub use stream::{ChannelKind, StreamError, StreamingState, Subscription};
