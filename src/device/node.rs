//! Device register (node) model
//!
//! GigE-style cameras expose configuration and status as a table of named,
//! typed registers. This module defines the abstract register interface the
//! rest of the crate programs against, plus the type-aware write coercion
//! rules.
//!
//! Reads are deliberately forgiving: a missing, unavailable, or unreadable
//! register reads as `None`, so callers can treat absent telemetry as
//! optional. Writes are strict: an unmatched enumeration label or an
//! incompatible value is a reported error, never a silent no-op.

/// Underlying type of a device register
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    /// Free-form string register
    String,
    /// Integer register
    Integer,
    /// Floating-point register
    Float,
    /// Enumeration register (a closed set of labeled entries)
    Enumeration,
}

impl std::fmt::Display for NodeKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            NodeKind::String => "string",
            NodeKind::Integer => "integer",
            NodeKind::Float => "float",
            NodeKind::Enumeration => "enumeration",
        };
        f.write_str(name)
    }
}

/// A value read from or written to a device register
///
/// Enumeration registers are represented by their current entry's display
/// label, matching how the control plane addresses them.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeValue {
    /// String register value
    Str(String),
    /// Integer register value
    Int(i64),
    /// Float register value
    Float(f64),
    /// Enumeration entry label
    Enum(String),
}

impl NodeValue {
    /// Try to get this value as a float (integers widen)
    pub fn as_float(&self) -> Option<f64> {
        match self {
            NodeValue::Float(v) => Some(*v),
            NodeValue::Int(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as an integer (floats truncate)
    pub fn as_int(&self) -> Option<i64> {
        match self {
            NodeValue::Int(v) => Some(*v),
            NodeValue::Float(v) => Some(*v as i64),
            _ => None,
        }
    }

    /// Try to get this value as a string or enumeration label
    pub fn as_label(&self) -> Option<&str> {
        match self {
            NodeValue::Str(s) | NodeValue::Enum(s) => Some(s),
            _ => None,
        }
    }
}

/// Error type for register writes
#[derive(Debug, Clone)]
pub enum NodeError {
    /// No register with this name exists
    MissingNode(String),
    /// The register exists but rejects writes
    NotWritable(String),
    /// No enumeration entry with this label (exact, case-sensitive match)
    UnknownEntry {
        /// Register name
        node: String,
        /// Requested entry label
        label: String,
    },
    /// The value cannot be coerced to the register's type
    TypeMismatch {
        /// Register name
        node: String,
        /// The register's underlying type
        kind: NodeKind,
        /// Description of the rejected value
        value: String,
    },
}

impl std::fmt::Display for NodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            NodeError::MissingNode(name) => write!(f, "No such device register: {}", name),
            NodeError::NotWritable(name) => write!(f, "Device register not writable: {}", name),
            NodeError::UnknownEntry { node, label } => {
                write!(f, "Register {} has no enumeration entry '{}'", node, label)
            }
            NodeError::TypeMismatch { node, kind, value } => {
                write!(f, "Register {} ({}) rejects value {}", node, kind, value)
            }
        }
    }
}

impl std::error::Error for NodeError {}

/// Abstract device register table
///
/// The hardware SDK boundary. Implementations resolve register names to the
/// device's node map; writes take effect on hardware immediately, with no
/// queuing or batching.
pub trait NodeMap: Send + Sync {
    /// Underlying type of the named register, `None` if it does not exist
    fn kind(&self, name: &str) -> Option<NodeKind>;

    /// Read the named register
    ///
    /// Returns `None` when the register is missing, unavailable, or
    /// unreadable. Enumeration registers read as their current entry label.
    fn read(&self, name: &str) -> Option<NodeValue>;

    /// Write the named register, coercing `value` to the register's type
    ///
    /// Coercion rules:
    /// - integer registers accept `Int` and `Float` (truncating)
    /// - float registers accept `Float` and `Int` (widening)
    /// - string registers accept `Str`
    /// - enumeration registers accept `Str`/`Enum`, resolved by exact
    ///   label match
    fn write(&self, name: &str, value: NodeValue) -> Result<(), NodeError>;

    /// Entry labels of an enumeration register, `None` for other kinds
    fn entries(&self, name: &str) -> Option<Vec<String>>;
}

/// Coerce a value to a register's underlying type
///
/// Shared by `NodeMap` implementations so every backend applies the same
/// rules. Enumeration coercion only validates the shape here; label
/// resolution stays with the implementation, which knows the entry set.
pub fn coerce(node: &str, kind: NodeKind, value: NodeValue) -> Result<NodeValue, NodeError> {
    let mismatch = |value: &NodeValue| NodeError::TypeMismatch {
        node: node.to_string(),
        kind,
        value: format!("{:?}", value),
    };

    match kind {
        NodeKind::Integer => value
            .as_int()
            .map(NodeValue::Int)
            .ok_or_else(|| mismatch(&value)),
        NodeKind::Float => value
            .as_float()
            .map(NodeValue::Float)
            .ok_or_else(|| mismatch(&value)),
        NodeKind::String => match value {
            NodeValue::Str(s) => Ok(NodeValue::Str(s)),
            other => Err(mismatch(&other)),
        },
        NodeKind::Enumeration => match value {
            NodeValue::Str(s) | NodeValue::Enum(s) => Ok(NodeValue::Enum(s)),
            other => Err(mismatch(&other)),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_coerce_integer_accepts_numeric() {
        assert_eq!(
            coerce("FocusPos", NodeKind::Integer, NodeValue::Int(5)).unwrap(),
            NodeValue::Int(5)
        );
        assert_eq!(
            coerce("FocusPos", NodeKind::Integer, NodeValue::Float(5.9)).unwrap(),
            NodeValue::Int(5)
        );
        assert!(coerce(
            "FocusPos",
            NodeKind::Integer,
            NodeValue::Str("5".to_string())
        )
        .is_err());
    }

    #[test]
    fn test_coerce_float_widens_int() {
        assert_eq!(
            coerce("ObjectDistance", NodeKind::Float, NodeValue::Int(2)).unwrap(),
            NodeValue::Float(2.0)
        );
    }

    #[test]
    fn test_coerce_enumeration_takes_labels() {
        assert_eq!(
            coerce(
                "IRFormat",
                NodeKind::Enumeration,
                NodeValue::Str("Radiometric".to_string())
            )
            .unwrap(),
            NodeValue::Enum("Radiometric".to_string())
        );
        assert!(coerce("IRFormat", NodeKind::Enumeration, NodeValue::Int(1)).is_err());
    }

    #[test]
    fn test_node_error_display() {
        let err = NodeError::UnknownEntry {
            node: "IRFormat".to_string(),
            label: "Bogus".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Register IRFormat has no enumeration entry 'Bogus'"
        );
    }
}
