use cv_engine::EngineError;

use crate::config::ConfigError;
use crate::plot::PlotError;
use crate::store::CurveRole;

pub type VizResult<T> = Result<T, VizError>;

#[derive(thiserror::Error, Debug)]
pub enum VizError {
    /// The engine rejected a curve definition. The previous curve is kept.
    #[error("Curve {role} rejected: {message}")]
    ParseFailed { role: CurveRole, message: String },

    /// The engine raised while computing; the last drawn frame stays.
    #[error("Numeric engine failure: {0}")]
    Engine(#[from] EngineError),

    #[error("Plot error: {0}")]
    Plot(#[from] PlotError),

    #[error("Legend entry out of range (index={index}, len={len})")]
    LegendOob { index: usize, len: usize },

    #[error("Config error: {0}")]
    Config(#[from] ConfigError),
}

impl VizError {
    pub fn is_parse_failure(&self) -> bool {
        matches!(self, VizError::ParseFailed { .. })
    }
}
