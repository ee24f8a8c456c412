//! In-memory mock camera
//!
//! Stands in for real hardware in tests and the demo: a register table with
//! the same coercion rules the SDK applies, and a device handle whose
//! `emit` method plays the role of the hardware callback thread. Lifecycle
//! calls are recorded so tests can assert that teardown ran every step, and
//! individual steps can be armed to fail.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;

use crate::frame::PixelDepth;

use super::node::{coerce, NodeError, NodeKind, NodeMap, NodeValue};
use super::session::{CaptureDevice, DeviceError, FrameEvent, FrameHandler, FrameStatus};

/// One register in the mock table
#[derive(Debug, Clone)]
struct MockNode {
    kind: NodeKind,
    value: NodeValue,
    entries: Vec<String>,
    readable: bool,
    writable: bool,
}

/// In-memory register table
#[derive(Debug, Default)]
pub struct MockNodeMap {
    nodes: Mutex<HashMap<String, MockNode>>,
}

impl MockNodeMap {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a table mirroring an A320-class device
    ///
    /// All direct parameter registers, the thermal format enumeration, and
    /// a discrete rate enumeration; no continuous rate register.
    pub fn a320() -> Self {
        let map = Self::new();
        map.insert_float("ObjectEmissivity", 0.95);
        map.insert_float("ObjectDistance", 1.0);
        map.insert_float("ReflectedTemperature", 293.15);
        map.insert_float("AtmosphericTemperature", 293.15);
        map.insert_float("RelativeHumidity", 0.5);
        map.insert_float("EstimatedTransmission", 0.98);
        map.insert_float("ExtOpticsTemperature", 293.15);
        map.insert_float("ExtOpticsTransmission", 1.0);
        map.insert_float("ScaleLimitLow", 0.0);
        map.insert_float("ScaleLimitUpper", 65535.0);
        map.insert_int("FocusPos", 0);
        map.insert_int("CurrentCase", 0);
        map.insert_enum(
            "IRFormat",
            &["TemperatureLinear10mK", "TemperatureLinear100mK", "Radiometric"],
            "Radiometric",
        );
        map.insert_enum("IRFrameRate", &["Rate15Hz", "Rate30Hz", "Rate60Hz"], "Rate30Hz");
        map
    }

    /// Add a float register
    pub fn insert_float(&self, name: &str, value: f64) {
        self.insert(name, NodeKind::Float, NodeValue::Float(value), &[]);
    }

    /// Add an integer register
    pub fn insert_int(&self, name: &str, value: i64) {
        self.insert(name, NodeKind::Integer, NodeValue::Int(value), &[]);
    }

    /// Add a string register
    pub fn insert_string(&self, name: &str, value: &str) {
        self.insert(
            name,
            NodeKind::String,
            NodeValue::Str(value.to_string()),
            &[],
        );
    }

    /// Add an enumeration register with the given entries and current label
    pub fn insert_enum(&self, name: &str, entries: &[&str], current: &str) {
        self.insert(
            name,
            NodeKind::Enumeration,
            NodeValue::Enum(current.to_string()),
            entries,
        );
    }

    /// Mark a register unreadable (reads return `None`)
    pub fn set_readable(&self, name: &str, readable: bool) {
        if let Some(node) = self.nodes.lock().unwrap().get_mut(name) {
            node.readable = readable;
        }
    }

    /// Mark a register read-only
    pub fn set_writable(&self, name: &str, writable: bool) {
        if let Some(node) = self.nodes.lock().unwrap().get_mut(name) {
            node.writable = writable;
        }
    }

    /// Remove a register entirely
    pub fn remove(&self, name: &str) {
        self.nodes.lock().unwrap().remove(name);
    }

    fn insert(&self, name: &str, kind: NodeKind, value: NodeValue, entries: &[&str]) {
        self.nodes.lock().unwrap().insert(
            name.to_string(),
            MockNode {
                kind,
                value,
                entries: entries.iter().map(|e| e.to_string()).collect(),
                readable: true,
                writable: true,
            },
        );
    }
}

impl NodeMap for MockNodeMap {
    fn kind(&self, name: &str) -> Option<NodeKind> {
        self.nodes.lock().unwrap().get(name).map(|n| n.kind)
    }

    fn read(&self, name: &str) -> Option<NodeValue> {
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(name)?;
        if !node.readable {
            return None;
        }
        Some(node.value.clone())
    }

    fn write(&self, name: &str, value: NodeValue) -> Result<(), NodeError> {
        let mut nodes = self.nodes.lock().unwrap();
        let node = nodes
            .get_mut(name)
            .ok_or_else(|| NodeError::MissingNode(name.to_string()))?;
        if !node.writable {
            return Err(NodeError::NotWritable(name.to_string()));
        }

        let coerced = coerce(name, node.kind, value)?;
        if let NodeValue::Enum(label) = &coerced {
            if !node.entries.iter().any(|e| e == label) {
                return Err(NodeError::UnknownEntry {
                    node: name.to_string(),
                    label: label.clone(),
                });
            }
        }

        node.value = coerced;
        Ok(())
    }

    fn entries(&self, name: &str) -> Option<Vec<String>> {
        let nodes = self.nodes.lock().unwrap();
        let node = nodes.get(name)?;
        if node.kind != NodeKind::Enumeration {
            return None;
        }
        Some(node.entries.clone())
    }
}

/// In-memory capture device
pub struct MockCamera {
    nodes: Arc<MockNodeMap>,
    handler: Mutex<Option<Arc<dyn FrameHandler>>>,
    acquiring: AtomicBool,
    continuous: AtomicBool,
    released: AtomicBool,
    calls: Mutex<Vec<&'static str>>,
    failing: Mutex<HashSet<&'static str>>,
}

impl MockCamera {
    /// Create a camera over the given register table
    pub fn new(nodes: Arc<MockNodeMap>) -> Arc<Self> {
        Arc::new(Self {
            nodes,
            handler: Mutex::new(None),
            acquiring: AtomicBool::new(false),
            continuous: AtomicBool::new(false),
            released: AtomicBool::new(false),
            calls: Mutex::new(Vec::new()),
            failing: Mutex::new(HashSet::new()),
        })
    }

    /// Create a camera with the A320-class register table
    pub fn a320() -> Arc<Self> {
        Self::new(Arc::new(MockNodeMap::a320()))
    }

    /// The underlying mock register table
    pub fn nodes(&self) -> &MockNodeMap {
        &self.nodes
    }

    /// Arm one lifecycle step to fail
    pub fn fail_step(&self, step: &'static str) {
        self.failing.lock().unwrap().insert(step);
    }

    /// Lifecycle calls observed so far, in order
    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    /// Whether acquisition is currently running
    pub fn is_acquiring(&self) -> bool {
        self.acquiring.load(Ordering::Acquire)
    }

    /// Whether continuous acquisition mode was configured
    pub fn is_continuous(&self) -> bool {
        self.continuous.load(Ordering::Acquire)
    }

    /// Whether a frame handler is currently registered
    pub fn handler_registered(&self) -> bool {
        self.handler.lock().unwrap().is_some()
    }

    /// Whether the handle has been released
    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::Acquire)
    }

    /// Deliver a frame event to the registered handler
    ///
    /// Plays the role of the hardware callback thread. Events emitted while
    /// acquisition is stopped or no handler is registered are discarded,
    /// as the hardware would.
    pub fn emit(&self, event: FrameEvent) {
        if !self.is_acquiring() {
            return;
        }
        let handler = self.handler.lock().unwrap().clone();
        if let Some(handler) = handler {
            handler.on_frame(event);
        }
    }

    /// Emit a complete mono16 frame built from the given samples
    pub fn emit_mono16(&self, width: u32, height: u32, samples: &[u16]) {
        let mut data = Vec::with_capacity(samples.len() * 2);
        for s in samples {
            data.extend_from_slice(&s.to_ne_bytes());
        }
        self.emit(FrameEvent {
            data: Bytes::from(data),
            width,
            height,
            depth: PixelDepth::Mono16,
            status: FrameStatus::Complete,
        });
    }

    fn step(&self, name: &'static str) -> Result<(), DeviceError> {
        self.calls.lock().unwrap().push(name);
        if self.failing.lock().unwrap().contains(name) {
            return Err(DeviceError::Acquisition(format!("{} failed", name)));
        }
        Ok(())
    }
}

impl CaptureDevice for MockCamera {
    fn node_map(&self) -> Arc<dyn NodeMap> {
        self.nodes.clone()
    }

    fn set_continuous_acquisition(&self) -> Result<(), DeviceError> {
        self.step("set_continuous_acquisition")?;
        self.continuous.store(true, Ordering::Release);
        Ok(())
    }

    fn begin_acquisition(&self) -> Result<(), DeviceError> {
        self.step("begin_acquisition")?;
        self.acquiring.store(true, Ordering::Release);
        Ok(())
    }

    fn end_acquisition(&self) -> Result<(), DeviceError> {
        self.step("end_acquisition")?;
        self.acquiring.store(false, Ordering::Release);
        Ok(())
    }

    fn register_handler(&self, handler: Arc<dyn FrameHandler>) -> Result<(), DeviceError> {
        self.step("register_handler")?;
        *self.handler.lock().unwrap() = Some(handler);
        Ok(())
    }

    fn deregister_handler(&self) -> Result<(), DeviceError> {
        self.step("deregister_handler")?;
        *self.handler.lock().unwrap() = None;
        Ok(())
    }

    fn release(&self) -> Result<(), DeviceError> {
        self.step("release")?;
        self.released.store(true, Ordering::Release);
        Ok(())
    }
}
