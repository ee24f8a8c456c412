//! Camera session lifecycle
//!
//! `CameraSession` owns a device handle from configuration through
//! teardown and wires the other components together:
//!
//! ```text
//!  hardware callback ──► on_frame ──► CaptureState (current-frame cache)
//!                          │
//!                          └────────► StreamEngine (fan-out, if streaming)
//!
//!  control plane ──► capture_frame / start_streaming / get_param / ...
//! ```
//!
//! The ingestion path runs on the hardware's callback thread and is
//! fire-and-forget: defective frames are dropped and logged, never
//! propagated. Teardown is best-effort and order-independent: every step is
//! attempted even when an earlier one fails, because leaking a hardware
//! handle is worse than a secondary error during cleanup.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use chrono::Utc;

use crate::capture::{CaptureError, CaptureState};
use crate::frame::{
    widen_to_mono16, EncodedImage, FormatCell, FrameCodec, IrFormat, PixelDepth, RawFrame,
};
use crate::params::{ParamError, ParamRegistry, ParamValue};
use crate::stats::{IngestSnapshot, IngestStats};
use crate::stream::{ChannelKind, StreamEngine, StreamError, Subscription};

use super::config::CameraConfig;
use super::identity::DeviceIdentity;
use super::node::{NodeError, NodeMap};

/// Incomplete-image status reported for the trailing buffer by the
/// ThermoVision A320. The frame data is complete in practice, so this one
/// status is tolerated and the frame processed normally.
pub const STATUS_TRAILING_BUFFER: i32 = 5;

/// Completeness status attached to a hardware frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameStatus {
    /// The frame buffer is complete
    Complete,
    /// The device flagged the frame incomplete with the given status code
    Incomplete(i32),
}

/// One frame delivery from the hardware callback
#[derive(Debug, Clone)]
pub struct FrameEvent {
    /// Pixel payload, row-major, native-endian samples
    pub data: Bytes,
    /// Frame width in pixels
    pub width: u32,
    /// Frame height in pixels
    pub height: u32,
    /// Sample depth of `data`
    pub depth: PixelDepth,
    /// Completeness status
    pub status: FrameStatus,
}

/// Receiver for hardware frame deliveries
///
/// Invoked on the device's callback thread; implementations must not block
/// and must not re-enter device configuration calls.
pub trait FrameHandler: Send + Sync {
    /// Handle one frame delivery
    fn on_frame(&self, event: FrameEvent);
}

/// Abstract capture device handle
///
/// The hardware SDK boundary. All methods are short synchronous calls into
/// the device.
pub trait CaptureDevice: Send + Sync {
    /// The device's register table
    fn node_map(&self) -> Arc<dyn NodeMap>;

    /// Configure continuous acquisition mode
    fn set_continuous_acquisition(&self) -> Result<(), DeviceError>;

    /// Start delivering frames to the registered handler
    fn begin_acquisition(&self) -> Result<(), DeviceError>;

    /// Stop delivering frames
    fn end_acquisition(&self) -> Result<(), DeviceError>;

    /// Register the frame ingestion handler
    fn register_handler(&self, handler: Arc<dyn FrameHandler>) -> Result<(), DeviceError>;

    /// Deregister the frame ingestion handler
    fn deregister_handler(&self) -> Result<(), DeviceError>;

    /// Release the device handle
    fn release(&self) -> Result<(), DeviceError>;
}

/// Error type for device session operations
#[derive(Debug, Clone)]
pub enum DeviceError {
    /// Acquisition control failed
    Acquisition(String),
    /// A register operation failed
    Node(NodeError),
    /// One or more teardown steps failed (all were attempted)
    Teardown(Vec<DeviceError>),
}

impl std::fmt::Display for DeviceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeviceError::Acquisition(msg) => write!(f, "Device acquisition error: {}", msg),
            DeviceError::Node(err) => write!(f, "{}", err),
            DeviceError::Teardown(errors) => {
                write!(f, "Device teardown completed with {} error(s)", errors.len())
            }
        }
    }
}

impl std::error::Error for DeviceError {}

impl From<NodeError> for DeviceError {
    fn from(err: NodeError) -> Self {
        DeviceError::Node(err)
    }
}

/// A running camera session
///
/// Created with [`CameraSession::start`], which configures the device,
/// registers the ingestion callback, and begins acquisition. Any failure
/// during startup is fatal and propagated; per-request errors afterwards
/// are local to their caller.
pub struct CameraSession {
    device: Arc<dyn CaptureDevice>,
    identity: DeviceIdentity,
    config: CameraConfig,
    codec: FrameCodec,
    capture: Arc<CaptureState>,
    engine: Arc<StreamEngine>,
    params: ParamRegistry,
    fps: Mutex<f64>,
    seqno: AtomicU64,
    stats: IngestStats,
}

impl CameraSession {
    /// Open a session on an already-opened device handle
    ///
    /// Resolves the initial thermal format and frame rate from the register
    /// table (missing values are logged and defaulted), configures
    /// continuous acquisition, registers the ingestion callback, and begins
    /// acquisition.
    pub fn start(
        device: Arc<dyn CaptureDevice>,
        identity: DeviceIdentity,
        config: CameraConfig,
    ) -> Result<Arc<Self>, DeviceError> {
        let nodes = device.node_map();
        let format = Arc::new(FormatCell::new(IrFormat::Radiometric));
        let params = ParamRegistry::new(nodes, format.clone());

        match params.get("ir_format") {
            Ok(ParamValue::Str(label)) => {
                if let Some(initial) = IrFormat::from_label(&label) {
                    format.set(initial);
                }
            }
            Ok(_) => {}
            Err(err) => {
                tracing::warn!(error = %err, "Unable to resolve initial thermal format");
            }
        }

        let fps = match params.get("fps") {
            Ok(value) => value.as_double().unwrap_or(0.0),
            Err(err) => {
                tracing::warn!(error = %err, "Unable to retrieve frame rate");
                0.0
            }
        };

        let session = Arc::new(Self {
            codec: FrameCodec::new(identity.label(), format),
            capture: Arc::new(CaptureState::new()),
            engine: Arc::new(StreamEngine::new(&config)),
            params,
            fps: Mutex::new(fps),
            seqno: AtomicU64::new(0),
            stats: IngestStats::new(),
            identity,
            config,
            device,
        });

        session.device.set_continuous_acquisition()?;
        let handler: Arc<dyn FrameHandler> = session.clone();
        session.device.register_handler(handler)?;
        if let Err(err) = session.device.begin_acquisition() {
            // Startup failed after handler registration; undo best-effort
            if let Err(dereg_err) = session.device.deregister_handler() {
                tracing::warn!(error = %dereg_err, "Handler deregistration failed during aborted startup");
            }
            return Err(err);
        }

        tracing::info!(
            device = %session.identity,
            format = %session.codec.current_format(),
            fps,
            "Camera session started"
        );
        Ok(session)
    }

    /// Identity of the device behind this session
    pub fn identity(&self) -> &DeviceIdentity {
        &self.identity
    }

    /// Frame rate resolved at session startup
    pub fn fps(&self) -> f64 {
        *self.fps.lock().unwrap()
    }

    /// Ingest counters
    pub fn stats(&self) -> IngestSnapshot {
        self.stats.snapshot()
    }

    /// Encode and return the most recent frame, uncompressed
    pub fn capture_frame(&self) -> Result<EncodedImage, CaptureError> {
        self.capture.snapshot(&self.codec)
    }

    /// Encode and return the most recent frame as a 16-bit PNG
    pub fn capture_frame_compressed(&self) -> Result<EncodedImage, CaptureError> {
        self.capture
            .snapshot_png(&self.codec, self.config.full_compression)
    }

    /// Begin fanning frames out to attached subscriptions
    pub fn start_streaming(&self) -> Result<(), StreamError> {
        self.engine.start()
    }

    /// Stop fanning frames out
    pub fn stop_streaming(&self) -> Result<(), StreamError> {
        self.engine.stop()
    }

    /// Whether frames are currently being distributed
    pub fn is_streaming(&self) -> bool {
        self.engine.is_streaming()
    }

    /// Attach a consumer to an outbound channel
    pub fn attach(&self, kind: ChannelKind) -> Subscription {
        self.engine.attach(kind)
    }

    /// Attach a consumer with a specific backlog capacity
    pub fn attach_with_capacity(&self, kind: ChannelKind, capacity: usize) -> Subscription {
        self.engine.attach_with_capacity(kind, capacity)
    }

    /// Read a device parameter
    pub fn get_param(&self, name: &str) -> Result<ParamValue, ParamError> {
        self.params.get(name)
    }

    /// Write a device parameter
    pub fn set_param(&self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        self.params.set(name, value)
    }

    /// Tear the session down
    ///
    /// Every step is attempted regardless of earlier failures: stop
    /// acquisition, flip streaming off, deregister the callback, release
    /// the handle. Collected failures are returned together. Call from the
    /// thread that started the session, after the callback is quiescent.
    pub fn close(&self) -> Result<(), DeviceError> {
        let mut failures = Vec::new();

        if let Err(err) = self.device.end_acquisition() {
            tracing::warn!(error = %err, "end_acquisition failed during teardown");
            failures.push(err);
        }

        // stop() from Idle just means streaming was never on
        let _ = self.engine.stop();
        self.engine.shutdown();

        if let Err(err) = self.device.deregister_handler() {
            tracing::warn!(error = %err, "Handler deregistration failed during teardown");
            failures.push(err);
        }

        if let Err(err) = self.device.release() {
            tracing::warn!(error = %err, "Device release failed during teardown");
            failures.push(err);
        }

        if failures.is_empty() {
            tracing::info!(device = %self.identity, "Camera session closed");
            Ok(())
        } else {
            Err(DeviceError::Teardown(failures))
        }
    }
}

impl FrameHandler for CameraSession {
    fn on_frame(&self, event: FrameEvent) {
        self.stats.record_received();
        let seqno = self.seqno.fetch_add(1, Ordering::Relaxed) + 1;

        match event.status {
            FrameStatus::Complete => {}
            FrameStatus::Incomplete(STATUS_TRAILING_BUFFER) => {
                // Trailing buffer defect on the A320; the frame is usable
                self.stats.record_tolerated_trailing();
            }
            FrameStatus::Incomplete(code) => {
                tracing::warn!(seqno, code, "Image incomplete, dropping frame");
                self.stats.record_dropped_incomplete();
                return;
            }
        }

        let expected = event.depth.frame_len(event.width, event.height);
        if event.data.len() != expected {
            tracing::warn!(
                seqno,
                expected,
                got = event.data.len(),
                "Frame buffer size mismatch, dropping frame"
            );
            self.stats.record_dropped_incomplete();
            return;
        }

        // Normalize to the canonical 16-bit depth
        let data = match event.depth {
            PixelDepth::Mono16 => event.data,
            PixelDepth::Mono8 => widen_to_mono16(&event.data),
        };
        let frame = RawFrame::new(
            data,
            event.width,
            event.height,
            PixelDepth::Mono16,
            seqno,
            Utc::now(),
        );

        self.capture.publish(frame.clone());
        self.engine.distribute(&frame, &self.codec);
        self.stats.record_published();
    }
}
