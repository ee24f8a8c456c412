//! Parameter registry
//!
//! Maps logical parameter names onto device registers. Most parameters are
//! direct bindings: a static `name -> (register, type)` table resolved
//! against the device node map. Two are synthetic: `fps`, derived from one
//! of two possible rate registers, and `ir_format`, which validates against
//! the closed thermal-format label set and feeds the resolved mode to the
//! frame codec.
//!
//! Failed sets leave both the device and the cached state unchanged.

use std::sync::Arc;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::device::node::{NodeMap, NodeValue};
use crate::frame::{FormatCell, IrFormat};

use super::error::ParamError;
use super::value::{ParamKind, ParamValue};

/// Thermal format register
const REG_IR_FORMAT: &str = "IRFormat";
/// Discrete frame-rate enumeration register
const REG_IR_FRAME_RATE: &str = "IRFrameRate";
/// Continuous frame-rate register (not present on all devices)
const REG_ACQUISITION_FRAME_RATE: &str = "AcquisitionFrameRate";

/// Rate labels look like "Rate30Hz"; the numeric suffix is the rate in Hz.
static RATE_LABEL: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"Rate(\d+)Hz$").expect("rate label pattern is valid"));

/// A direct logical-name -> register binding
#[derive(Debug, Clone, Copy)]
struct Binding {
    name: &'static str,
    register: &'static str,
    kind: ParamKind,
}

/// Direct register bindings, constructed once and never mutated
#[rustfmt::skip]
const BINDINGS: &[Binding] = &[
    Binding { name: "object_emissivity", register: "ObjectEmissivity", kind: ParamKind::Double },
    Binding { name: "object_distance", register: "ObjectDistance", kind: ParamKind::Double },
    Binding { name: "reflected_temperature", register: "ReflectedTemperature", kind: ParamKind::Double },
    Binding { name: "atmospheric_temperature", register: "AtmosphericTemperature", kind: ParamKind::Double },
    Binding { name: "relative_humidity", register: "RelativeHumidity", kind: ParamKind::Double },
    Binding { name: "estimated_transmission", register: "EstimatedTransmission", kind: ParamKind::Double },
    Binding { name: "ext_optics_temperature", register: "ExtOpticsTemperature", kind: ParamKind::Double },
    Binding { name: "ext_optics_transmission", register: "ExtOpticsTransmission", kind: ParamKind::Double },
    Binding { name: "focus_pos", register: "FocusPos", kind: ParamKind::Int32 },
    Binding { name: "scale_limit_low", register: "ScaleLimitLow", kind: ParamKind::Double },
    Binding { name: "scale_limit_upper", register: "ScaleLimitUpper", kind: ParamKind::Double },
    Binding { name: "current_case", register: "CurrentCase", kind: ParamKind::Int32 },
];

/// Parameters with derived get/set logic instead of a single register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Synthetic {
    /// Effective frame rate
    Fps,
    /// Thermal format mode
    IrFormat,
}

impl Synthetic {
    fn lookup(name: &str) -> Option<Self> {
        match name {
            "fps" => Some(Synthetic::Fps),
            "ir_format" => Some(Synthetic::IrFormat),
            _ => None,
        }
    }
}

/// Parse the numeric suffix out of a rate enumeration label
fn parse_rate_label(label: &str) -> Option<f64> {
    RATE_LABEL
        .captures(label)
        .and_then(|c| c.get(1))
        .and_then(|m| m.as_str().parse::<f64>().ok())
}

/// Registry mapping logical parameter names to device state
pub struct ParamRegistry {
    nodes: Arc<dyn NodeMap>,
    format: Arc<FormatCell>,
}

impl ParamRegistry {
    /// Create a registry over the given node map and shared format cell
    pub fn new(nodes: Arc<dyn NodeMap>, format: Arc<FormatCell>) -> Self {
        Self { nodes, format }
    }

    /// Logical names this registry recognizes
    pub fn names() -> impl Iterator<Item = &'static str> {
        BINDINGS
            .iter()
            .map(|b| b.name)
            .chain(["fps", "ir_format"])
    }

    /// Read a parameter
    pub fn get(&self, name: &str) -> Result<ParamValue, ParamError> {
        if let Some(synthetic) = Synthetic::lookup(name) {
            return match synthetic {
                Synthetic::Fps => self.get_fps(),
                Synthetic::IrFormat => self.get_ir_format(),
            };
        }

        let binding = Self::binding(name)?;
        let value = self
            .nodes
            .read(binding.register)
            .ok_or_else(|| ParamError::Unavailable(name.to_string()))?;

        match binding.kind {
            ParamKind::Double => value
                .as_float()
                .map(ParamValue::Double)
                .ok_or_else(|| ParamError::Unavailable(name.to_string())),
            ParamKind::Int32 => value
                .as_int()
                .map(|v| ParamValue::Int32(v as i32))
                .ok_or_else(|| ParamError::Unavailable(name.to_string())),
            ParamKind::Str => value
                .as_label()
                .map(|s| ParamValue::Str(s.to_string()))
                .ok_or_else(|| ParamError::Unavailable(name.to_string())),
        }
    }

    /// Write a parameter
    ///
    /// The value's type tag must match the binding's declared type; integer
    /// input widens into double-typed parameters, nothing else coerces.
    pub fn set(&self, name: &str, value: ParamValue) -> Result<(), ParamError> {
        if let Some(synthetic) = Synthetic::lookup(name) {
            return match synthetic {
                Synthetic::Fps => self.set_fps(value),
                Synthetic::IrFormat => self.set_ir_format(value),
            };
        }

        let binding = Self::binding(name)?;
        let node_value = match binding.kind {
            ParamKind::Double => NodeValue::Float(
                value
                    .as_double()
                    .ok_or_else(|| Self::type_mismatch(name, ParamKind::Double, &value))?,
            ),
            ParamKind::Int32 => NodeValue::Int(
                value
                    .as_i32()
                    .ok_or_else(|| Self::type_mismatch(name, ParamKind::Int32, &value))?
                    as i64,
            ),
            ParamKind::Str => NodeValue::Str(
                value
                    .as_str()
                    .ok_or_else(|| Self::type_mismatch(name, ParamKind::Str, &value))?
                    .to_string(),
            ),
        };

        self.nodes.write(binding.register, node_value)?;
        Ok(())
    }

    /// Device-supported frame rates, enumerated from the rate register
    ///
    /// Every entry label must match the recognized pattern; a label that
    /// does not is a reported error rather than a silently skipped entry.
    pub fn available_fps(&self) -> Result<Vec<(f64, String)>, ParamError> {
        let entries = self
            .nodes
            .entries(REG_IR_FRAME_RATE)
            .ok_or_else(|| ParamError::Unavailable("fps".to_string()))?;

        let mut rates = Vec::with_capacity(entries.len());
        for label in entries {
            let rate = parse_rate_label(&label)
                .ok_or_else(|| ParamError::UnrecognizedRateLabel(label.clone()))?;
            rates.push((rate, label));
        }
        Ok(rates)
    }

    fn get_fps(&self) -> Result<ParamValue, ParamError> {
        // Prefer the continuous rate register when the device has one
        if let Some(value) = self.nodes.read(REG_ACQUISITION_FRAME_RATE) {
            if let Some(rate) = value.as_float() {
                return Ok(ParamValue::Double(rate));
            }
        }

        let value = self
            .nodes
            .read(REG_IR_FRAME_RATE)
            .ok_or_else(|| ParamError::Unavailable("fps".to_string()))?;
        let label = value
            .as_label()
            .ok_or_else(|| ParamError::Unavailable("fps".to_string()))?;
        let rate = parse_rate_label(label)
            .ok_or_else(|| ParamError::UnrecognizedRateLabel(label.to_string()))?;
        Ok(ParamValue::Double(rate))
    }

    fn set_fps(&self, value: ParamValue) -> Result<(), ParamError> {
        let requested = value
            .as_double()
            .ok_or_else(|| Self::type_mismatch("fps", ParamKind::Double, &value))?;

        // Supported rates are enumerated at call time; the requested rate
        // must exactly match one of them.
        let rates = self.available_fps()?;
        for (rate, label) in &rates {
            if *rate == requested {
                self.nodes
                    .write(REG_IR_FRAME_RATE, NodeValue::Enum(label.clone()))?;
                return Ok(());
            }
        }

        Err(ParamError::UnsupportedValue {
            name: "fps".to_string(),
            value: requested.to_string(),
            available: rates.iter().map(|(r, _)| r.to_string()).collect(),
        })
    }

    fn get_ir_format(&self) -> Result<ParamValue, ParamError> {
        let value = self
            .nodes
            .read(REG_IR_FORMAT)
            .ok_or_else(|| ParamError::Unavailable("ir_format".to_string()))?;
        let label = value
            .as_label()
            .ok_or_else(|| ParamError::Unavailable("ir_format".to_string()))?;

        match IrFormat::from_device_label(label) {
            Some(format) => Ok(ParamValue::Str(format.label().to_string())),
            None => {
                tracing::warn!(label, "Device reported an unknown thermal format label");
                Err(ParamError::Unavailable("ir_format".to_string()))
            }
        }
    }

    fn set_ir_format(&self, value: ParamValue) -> Result<(), ParamError> {
        let label = value
            .as_str()
            .ok_or_else(|| Self::type_mismatch("ir_format", ParamKind::Str, &value))?;

        let format = IrFormat::from_label(label).ok_or_else(|| ParamError::UnsupportedValue {
            name: "ir_format".to_string(),
            value: label.to_string(),
            available: IrFormat::ALL.iter().map(|f| f.label().to_string()).collect(),
        })?;

        self.nodes
            .write(REG_IR_FORMAT, NodeValue::Enum(format.device_label().to_string()))?;

        // The cache only moves after the device accepted the write, so a
        // rejected set leaves previously encoded metadata labels intact.
        self.format.set(format);
        tracing::info!(format = %format, "Thermal format changed");
        Ok(())
    }

    fn binding(name: &str) -> Result<&'static Binding, ParamError> {
        BINDINGS
            .iter()
            .find(|b| b.name == name)
            .ok_or_else(|| ParamError::Unsupported(name.to_string()))
    }

    fn type_mismatch(name: &str, expected: ParamKind, value: &ParamValue) -> ParamError {
        ParamError::TypeMismatch {
            name: name.to_string(),
            expected,
            got: value.kind(),
        }
    }
}
