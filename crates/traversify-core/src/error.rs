//! Error taxonomy for engine operations.

use thiserror::Error;

/// Engine errors.
///
/// Every variant is local and non-fatal: the operation that produced it left
/// all layer buffers untouched.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EngineError {
    #[error("Pointer at ({x:.1}, {y:.1}) is outside the displayed image")]
    OutOfBounds { x: f64, y: f64 },
    #[error("No source image loaded")]
    NoActiveImage,
    #[error("Invalid value for {field}: {reason}")]
    InvalidConfig { field: &'static str, reason: String },
    #[error("Dimension mismatch: expected {expected:?}, got {actual:?}")]
    DimensionMismatch {
        expected: (u32, u32),
        actual: (u32, u32),
    },
    #[error("Config error: {0}")]
    Config(String),
}

impl EngineError {
    pub(crate) fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field,
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EngineError {
    fn from(err: serde_json::Error) -> Self {
        Self::Config(err.to_string())
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
