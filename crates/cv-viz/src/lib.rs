//! cv-viz: state synchronization between the numeric engine and the plot.
//!
//! Layers:
//! - store (visualization state, staleness tracking, handle ownership)
//! - plot (plot backend contract) and recording (headless backend)
//! - labels (typeset label sink)
//! - legend (custom legend derived from trace visibility)
//! - visualizer (redraw engine: full and partial update paths)
//! - config (YAML configuration)

pub mod config;
pub mod error;
pub mod labels;
pub mod legend;
pub mod plot;
pub mod recording;
pub mod store;
pub mod visualizer;

pub use config::{ConfigError, VizConfig};
pub use error::{VizError, VizResult};
pub use labels::{LabelSink, LabelTarget, RecordingLabels, tex_source};
pub use legend::{LegendEntry, LegendKey};
pub use plot::{
    Layout, LayoutPatch, PlotBackend, PlotError, PlotResult, TraceInfo, TraceMode, TracePatch,
    TraceSpec,
};
pub use recording::{PlotCommand, RecordingPlot};
pub use store::{CurveRole, Staleness, VisualizationState};
pub use visualizer::{InputFlags, Visualizer};
