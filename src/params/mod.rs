//! Device parameter registry
//!
//! The control plane addresses device configuration through logical
//! parameter names. Most names bind directly to one typed register; `fps`
//! and `ir_format` are synthetic parameters with derived logic. Unknown
//! names and ill-typed values are reported errors that leave device state
//! untouched.

pub mod error;
pub mod registry;
pub mod value;

pub use error::ParamError;
pub use registry::ParamRegistry;
pub use value::{ParamKind, ParamValue};
