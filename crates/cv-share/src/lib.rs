//! cv-share: shareable-link codec for the visualizer state.
//!
//! The whole interactive state (both curve texts, transform kind, current
//! position and per-trace visibility) round-trips through a URL query string.
//! Decoding is per field: a malformed or missing field falls back to its
//! default and is reported as a warning without affecting the other fields.

pub mod codec;
pub mod field;
pub mod state;

pub use codec::{
    Decoded, PARAM_CURVE_A, PARAM_CURVE_B, PARAM_POSITION, PARAM_TRANSFORM_KIND,
    PARAM_VISIBILITIES, decode, encode, query_of, share_link,
};
pub use field::decode_field;
pub use state::SharedState;

pub type ShareResult<T> = Result<T, ShareError>;

/// A shareable-link field that could not be used.
///
/// Always recoverable: the field's default is substituted.
#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum ShareError {
    #[error("Missing share parameter: {field}")]
    Missing { field: &'static str },

    #[error("Malformed share parameter {field}={value:?}: {reason}")]
    Malformed {
        field: &'static str,
        value: String,
        reason: String,
    },
}

impl ShareError {
    pub fn field(&self) -> &'static str {
        match self {
            ShareError::Missing { field } | ShareError::Malformed { field, .. } => field,
        }
    }
}
