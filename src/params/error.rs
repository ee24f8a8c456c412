//! Parameter registry error types

use crate::device::node::NodeError;

use super::value::ParamKind;

/// Error type for parameter operations
#[derive(Debug, Clone)]
pub enum ParamError {
    /// No parameter with this logical name exists
    Unsupported(String),
    /// The value's type tag does not match the parameter's declared type
    TypeMismatch {
        /// Logical parameter name
        name: String,
        /// Expected type tag
        expected: ParamKind,
        /// Type tag of the rejected value
        got: ParamKind,
    },
    /// The value is well-typed but not one the device supports
    UnsupportedValue {
        /// Logical parameter name
        name: String,
        /// The rejected value
        value: String,
        /// Values the device currently supports
        available: Vec<String>,
    },
    /// A frame-rate enumeration label did not match the recognized format
    UnrecognizedRateLabel(String),
    /// The backing register is missing or unreadable
    Unavailable(String),
    /// The device rejected a register write
    Node(NodeError),
}

impl std::fmt::Display for ParamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamError::Unsupported(name) => write!(f, "Unsupported parameter: {}", name),
            ParamError::TypeMismatch {
                name,
                expected,
                got,
            } => write!(
                f,
                "Parameter {} expects {} values, got {}",
                name, expected, got
            ),
            ParamError::UnsupportedValue {
                name,
                value,
                available,
            } => write!(
                f,
                "Unsupported value '{}' for parameter {} (supported: {})",
                value,
                name,
                available.join(", ")
            ),
            ParamError::UnrecognizedRateLabel(label) => {
                write!(f, "Unrecognized frame rate label: {}", label)
            }
            ParamError::Unavailable(name) => {
                write!(f, "Parameter {} is not available on this device", name)
            }
            ParamError::Node(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for ParamError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ParamError::Node(err) => Some(err),
            _ => None,
        }
    }
}

impl From<NodeError> for ParamError {
    fn from(err: NodeError) -> Self {
        ParamError::Node(err)
    }
}
