//! Headless plot backend that keeps the drawn state and a command log.

use serde::Serialize;
use tracing::trace;

use crate::plot::{
    Layout, LayoutPatch, PlotBackend, PlotError, PlotResult, TraceInfo, TracePatch, TraceSpec,
    check_batch,
};

/// One call received by the backend.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum PlotCommand {
    Create {
        traces: usize,
    },
    Restyle {
        indices: Vec<usize>,
        patches: Vec<TracePatch>,
    },
    Update {
        indices: Vec<usize>,
        patches: Vec<TracePatch>,
        layout: LayoutPatch,
    },
}

#[derive(Debug, Default)]
pub struct RecordingPlot {
    traces: Vec<TraceSpec>,
    layout: Option<Layout>,
    log: Vec<PlotCommand>,
}

impl RecordingPlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[PlotCommand] {
        &self.log
    }

    /// Drain the log, keeping the drawn state.
    pub fn take_commands(&mut self) -> Vec<PlotCommand> {
        std::mem::take(&mut self.log)
    }

    pub fn trace(&self, index: usize) -> Option<&TraceSpec> {
        self.traces.get(index)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.layout.as_ref()
    }

    fn apply(&mut self, patches: &[TracePatch], indices: &[usize]) {
        for (patch, &index) in patches.iter().zip(indices) {
            let trace = &mut self.traces[index];
            if let Some(data) = &patch.data {
                trace.data = data.clone();
            }
            if let Some(name) = &patch.name {
                trace.name = name.clone();
            }
            if let Some(visible) = patch.visible {
                trace.visible = visible;
            }
        }
    }

    fn check(&self, patches: &[TracePatch], indices: &[usize]) -> PlotResult<()> {
        if self.layout.is_none() {
            return Err(PlotError::NotCreated);
        }
        check_batch(patches.len(), indices, self.traces.len())
    }
}

impl PlotBackend for RecordingPlot {
    fn create_plot(&mut self, traces: Vec<TraceSpec>, layout: Layout) -> PlotResult<()> {
        self.log.push(PlotCommand::Create {
            traces: traces.len(),
        });
        self.traces = traces;
        self.layout = Some(layout);
        Ok(())
    }

    fn restyle(&mut self, patches: Vec<TracePatch>, indices: &[usize]) -> PlotResult<()> {
        self.check(&patches, indices)?;
        trace!(?indices, "restyle");
        self.apply(&patches, indices);
        self.log.push(PlotCommand::Restyle {
            indices: indices.to_vec(),
            patches,
        });
        Ok(())
    }

    fn update(
        &mut self,
        patches: Vec<TracePatch>,
        layout: LayoutPatch,
        indices: &[usize],
    ) -> PlotResult<()> {
        self.check(&patches, indices)?;
        trace!(?indices, "update");
        self.apply(&patches, indices);
        if let Some(current) = self.layout.as_mut() {
            if let Some(x) = layout.x_range {
                current.x_range = x;
            }
            if let Some(y) = layout.y_range {
                current.y_range = y;
            }
        }
        self.log.push(PlotCommand::Update {
            indices: indices.to_vec(),
            patches,
            layout,
        });
        Ok(())
    }

    fn traces(&self) -> Vec<TraceInfo> {
        let colorway = self.layout.as_ref().map(|l| l.colorway.as_slice()).unwrap_or(&[]);
        self.traces
            .iter()
            .enumerate()
            .map(|(index, spec)| TraceInfo {
                index,
                name: spec.name.clone(),
                legend_group: spec.legend_group.clone(),
                show_legend: spec.show_legend,
                visible: spec.visible,
                color: (!colorway.is_empty()).then(|| colorway[index % colorway.len()].clone()),
            })
            .collect()
    }
}
