// models/src/lib.rs

pub mod errors;
pub mod medical;
pub mod validation;

pub use errors::{ValidationError, ValidationResult};
pub use medical::*;
