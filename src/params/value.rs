//! Typed parameter values
//!
//! The control plane reads and writes parameters as type-tagged values.
//! The tag must match the registry's expectation for each name; the only
//! cross-type acceptance is numeric widening of integer input into
//! double-typed parameters.

/// Type tag of a parameter value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamKind {
    /// Double-precision float
    Double,
    /// 32-bit signed integer
    Int32,
    /// UTF-8 string
    Str,
}

impl std::fmt::Display for ParamKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ParamKind::Double => "double",
            ParamKind::Int32 => "int32",
            ParamKind::Str => "string",
        };
        f.write_str(name)
    }
}

/// A type-tagged parameter value
#[derive(Debug, Clone, PartialEq)]
pub enum ParamValue {
    /// Double-precision float
    Double(f64),
    /// 32-bit signed integer
    Int32(i32),
    /// UTF-8 string
    Str(String),
}

impl ParamValue {
    /// The value's type tag
    pub fn kind(&self) -> ParamKind {
        match self {
            ParamValue::Double(_) => ParamKind::Double,
            ParamValue::Int32(_) => ParamKind::Int32,
            ParamValue::Str(_) => ParamKind::Str,
        }
    }

    /// Try to get this value as a double (int32 widens)
    pub fn as_double(&self) -> Option<f64> {
        match self {
            ParamValue::Double(v) => Some(*v),
            ParamValue::Int32(v) => Some(*v as f64),
            _ => None,
        }
    }

    /// Try to get this value as an int32 (no truncation of doubles)
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            ParamValue::Int32(v) => Some(*v),
            _ => None,
        }
    }

    /// Try to get this value as a string reference
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ParamValue::Str(s) => Some(s),
            _ => None,
        }
    }
}

impl std::fmt::Display for ParamValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ParamValue::Double(v) => write!(f, "{}", v),
            ParamValue::Int32(v) => write!(f, "{}", v),
            ParamValue::Str(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_tags() {
        assert_eq!(ParamValue::Double(1.0).kind(), ParamKind::Double);
        assert_eq!(ParamValue::Int32(1).kind(), ParamKind::Int32);
        assert_eq!(ParamValue::Str("x".into()).kind(), ParamKind::Str);
    }

    #[test]
    fn test_int_widens_to_double_only() {
        assert_eq!(ParamValue::Int32(3).as_double(), Some(3.0));
        // Doubles never silently truncate to int32
        assert_eq!(ParamValue::Double(3.0).as_i32(), None);
        assert_eq!(ParamValue::Str("3".into()).as_double(), None);
    }
}
