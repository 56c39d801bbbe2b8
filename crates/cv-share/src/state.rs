use cv_core::SlotVisibilities;
use cv_engine::TransformKind;
use serde::{Deserialize, Serialize};

/// Everything needed to reproduce a view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedState {
    pub curve_a: String,
    pub curve_b: String,
    pub kind: TransformKind,
    pub position: f64,
    pub visibilities: SlotVisibilities,
}
