//! Errors crossing the foreign engine boundary.

use cv_core::CoreError;
use thiserror::Error;

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum EngineError {
    /// Curve text rejected by the engine's parser.
    #[error("Curve parse failed: {message}")]
    Parse { message: String },

    /// The engine raised while evaluating.
    #[error("Numeric engine failure: {message}")]
    Foreign { message: String },

    /// A handle the runtime no longer knows about.
    #[error("Stale foreign handle: {id}")]
    StaleHandle { id: u64 },

    #[error("Missing field in engine value: {field}")]
    MissingField { field: String },

    #[error("Type mismatch for {what}: expected {expected}")]
    TypeMismatch {
        what: String,
        expected: &'static str,
    },

    #[error("Length mismatch for {what}: x has {x_len} values, y has {y_len}")]
    LengthMismatch {
        what: String,
        x_len: usize,
        y_len: usize,
    },

    #[error(transparent)]
    Core(#[from] CoreError),
}

impl EngineError {
    pub fn is_parse(&self) -> bool {
        matches!(self, EngineError::Parse { .. })
    }
}
