use thiserror::Error;

pub type CoreResult<T> = Result<T, CoreError>;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid visibility bitstring {input:?}: {reason}")]
    InvalidBitstring { input: String, reason: &'static str },

    #[error("Trace slot index out of bounds (index={index}, len={len})")]
    SlotOob { index: usize, len: usize },
}
