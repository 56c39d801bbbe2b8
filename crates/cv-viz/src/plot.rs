//! Plot backend contract.
//!
//! The charting library addresses traces by plot index. Every batched call
//! takes one patch per index, in the same order.

use cv_core::{TraceSlot, Visibility};
use cv_engine::Series;
use serde::Serialize;

pub type PlotResult<T> = Result<T, PlotError>;

#[derive(thiserror::Error, Debug, Clone, PartialEq)]
pub enum PlotError {
    #[error("Plot has not been created")]
    NotCreated,

    #[error("Trace index out of range (index={index}, len={len})")]
    IndexOob { index: usize, len: usize },

    #[error("Patch count {patches} does not match index count {indices}")]
    BatchMismatch { patches: usize, indices: usize },

    #[error("Backend error: {message}")]
    Backend { message: String },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceMode {
    Lines,
    Markers,
}

/// Initial definition of one trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceSpec {
    pub name: String,
    pub mode: TraceMode,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub visible: Visibility,
    pub data: Series,
}

impl TraceSpec {
    pub fn empty(slot: TraceSlot, name: impl Into<String>, visible: Visibility) -> Self {
        Self {
            name: name.into(),
            mode: if slot.is_marker() {
                TraceMode::Markers
            } else {
                TraceMode::Lines
            },
            legend_group: slot.legend_group().map(String::from),
            show_legend: !slot.is_marker(),
            visible,
            data: Series::default(),
        }
    }
}

/// Partial trace update; `None` leaves the attribute untouched.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct TracePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Series>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub visible: Option<Visibility>,
}

impl TracePatch {
    pub fn data(series: Series) -> Self {
        Self {
            data: Some(series),
            ..Self::default()
        }
    }

    /// Empty the trace; used for construction curves until the next sample.
    pub fn cleared() -> Self {
        Self::data(Series::default())
    }

    pub fn visibility(visible: Visibility) -> Self {
        Self {
            visible: Some(visible),
            ..Self::default()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Layout {
    pub x_range: [f64; 2],
    pub y_range: [f64; 2],
    pub colorway: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct LayoutPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub x_range: Option<[f64; 2]>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub y_range: Option<[f64; 2]>,
}

/// What the backend reports about a drawn trace.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TraceInfo {
    pub index: usize,
    pub name: String,
    pub legend_group: Option<String>,
    pub show_legend: bool,
    pub visible: Visibility,
    /// Resolved line/marker color, if the backend knows it.
    pub color: Option<String>,
}

pub trait PlotBackend {
    fn create_plot(&mut self, traces: Vec<TraceSpec>, layout: Layout) -> PlotResult<()>;

    /// Change attributes of the traces at `indices`.
    fn restyle(&mut self, patches: Vec<TracePatch>, indices: &[usize]) -> PlotResult<()>;

    /// Change traces and layout in one redraw.
    fn update(
        &mut self,
        patches: Vec<TracePatch>,
        layout: LayoutPatch,
        indices: &[usize],
    ) -> PlotResult<()>;

    fn traces(&self) -> Vec<TraceInfo>;
}

/// Shared argument check for backends.
pub fn check_batch(patches: usize, indices: &[usize], len: usize) -> PlotResult<()> {
    if patches != indices.len() {
        return Err(PlotError::BatchMismatch {
            patches,
            indices: indices.len(),
        });
    }
    match indices.iter().find(|&&index| index >= len) {
        Some(&index) => Err(PlotError::IndexOob { index, len }),
        None => Ok(()),
    }
}
