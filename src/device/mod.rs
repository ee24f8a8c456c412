//! Device handle, registers, and session lifecycle
//!
//! This module provides:
//! - The abstract register table (`NodeMap`) and its coercion rules
//! - Device identity records and selection (`DeviceIdentity`, `DeviceSelector`)
//! - Session configuration (`CameraConfig`)
//! - The session itself (`CameraSession`): configure, ingest, tear down
//! - A mock device for tests and demos (feature `mock`)

pub mod config;
pub mod identity;
#[cfg(any(test, feature = "mock"))]
pub mod mock;
pub mod node;
pub mod session;

pub use config::{CameraConfig, DEFAULT_BACKLOG, MAX_DOWNSAMPLE};
pub use identity::{
    find_device, ip_from_gige, ip_to_gige, mac_from_str, mac_to_string, DeviceIdentity,
    DeviceSelector,
};
#[cfg(any(test, feature = "mock"))]
pub use mock::{MockCamera, MockNodeMap};
pub use node::{coerce, NodeError, NodeKind, NodeMap, NodeValue};
pub use session::{
    CameraSession, CaptureDevice, DeviceError, FrameEvent, FrameHandler, FrameStatus,
    STATUS_TRAILING_BUFFER,
};
