// models/src/errors.rs

pub use thiserror::Error;

/// A validation error raised while checking request input or decoding enum
/// values. The display text is what API callers see.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// A required field was absent or empty.
    #[error("{0} is required")]
    MissingField(String),
    /// A field that must be a canonical UUID was not.
    #[error("{0} must be a valid UUID")]
    InvalidUuid(String),
    /// A field that must be a `YYYY-MM-DD` date was not.
    #[error("{0} must be in YYYY-MM-DD format")]
    InvalidDateFormat(String),
    /// An enum-typed field carried a value outside its domain.
    #[error("invalid {field}: {value}")]
    InvalidEnumValue { field: String, value: String },
    /// A string exceeded its maximum length.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },
    /// A string was shorter than required.
    #[error("{field} must be at least {min} characters long")]
    TooShort { field: String, min: usize },
    /// A numeric field fell outside of its allowed range.
    #[error("{0} is out of range")]
    OutOfRange(String),
    /// A field did not match the expected format.
    #[error("{0} has an invalid format")]
    InvalidFormat(String),
    /// Start and end of a date range were inverted.
    #[error("startDate must not be after endDate")]
    InvertedRange,
}

/// A type alias for a `Result` that returns a `ValidationError` on failure.
pub type ValidationResult<T> = Result<T, ValidationError>;
