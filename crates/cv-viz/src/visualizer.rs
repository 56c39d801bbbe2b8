//! Redraw engine.
//!
//! Two update paths:
//! - partial: the position moved; only the position-dependent traces are
//!   restyled in one batch.
//! - full: a curve or the kind changed; the profile is recomputed, the
//!   structural traces and both axis ranges go out in one batched update,
//!   then the partial path runs and the legend is rebuilt.
//!
//! When both are pending the full path always runs first.

use cv_core::{SlotVisibilities, TraceSlot, Visibility};
use cv_engine::{EngineExt, NumericEngine, Series, TransformKind};
use cv_share::{ShareError, SharedState, decode};
use tracing::{debug, warn};

use crate::config::VizConfig;
use crate::error::{VizError, VizResult};
use crate::labels::{LabelSink, LabelTarget, tex_source};
use crate::legend::{self, LegendEntry};
use crate::plot::{Layout, LayoutPatch, PlotBackend, TracePatch, TraceSpec};
use crate::store::{CurveRole, Staleness, VisualizationState};

/// Curve inputs the engine last rejected.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct InputFlags {
    pub a_invalid: bool,
    pub b_invalid: bool,
}

impl InputFlags {
    pub fn is_flagged(&self, role: CurveRole) -> bool {
        match role {
            CurveRole::A => self.a_invalid,
            CurveRole::B => self.b_invalid,
        }
    }

    fn set(&mut self, role: CurveRole, invalid: bool) {
        match role {
            CurveRole::A => self.a_invalid = invalid,
            CurveRole::B => self.b_invalid = invalid,
        }
    }
}

/// Trace names are inline math for the charting library.
fn math(tex: &str) -> String {
    format!("${tex}$")
}

fn slot_name(slot: TraceSlot, kind: TransformKind) -> String {
    let labels = kind.labels();
    math(match slot {
        TraceSlot::OperandA => labels.operand_a,
        TraceSlot::TransformedA => labels.transformed_a,
        TraceSlot::OperandB => labels.operand_b,
        TraceSlot::RunningSum | TraceSlot::RunningSumMarker => labels.sum,
        TraceSlot::Result | TraceSlot::ResultMarker => labels.operator,
    })
}

fn indices(slots: &[TraceSlot]) -> Vec<usize> {
    slots.iter().map(|s| s.index()).collect()
}

pub struct Visualizer<E: NumericEngine, P: PlotBackend, L: LabelSink> {
    engine: E,
    plot: P,
    labels: L,
    config: VizConfig,
    state: VisualizationState,
    legend: Vec<LegendEntry>,
    flags: InputFlags,
}

impl<E: NumericEngine, P: PlotBackend, L: LabelSink> Visualizer<E, P, L> {
    /// Parse the configured curves, create the plot and draw the first frame.
    pub fn new(engine: E, mut plot: P, mut labels: L, config: VizConfig) -> VizResult<Self> {
        config.validate()?;
        let mut state = VisualizationState::new(
            &engine,
            &config.curve_a,
            &config.curve_b,
            config.kind,
            config.decimals,
            config.aspect_ratio,
        )?;
        if let Err(e) = state.recompute_profile(&engine) {
            state.release(&engine);
            return Err(e);
        }

        let traces = TraceSlot::ALL
            .iter()
            .map(|&slot| {
                TraceSpec::empty(slot, slot_name(slot, config.kind), config.visibilities.get(slot))
            })
            .collect();
        let ranges = state.viewport();
        let layout = Layout {
            x_range: ranges.map_or([0.0, 1.0], |r| r.x),
            y_range: ranges.map_or([0.0, 1.0], |r| r.y),
            colorway: config.colorway.clone(),
        };
        if let Err(e) = plot.create_plot(traces, layout) {
            state.release(&engine);
            return Err(e.into());
        }

        labels.render_label(LabelTarget::PositionSign, r"\Delta");
        for kind in TransformKind::ALL {
            labels.render_label(LabelTarget::KindOption(kind), kind.labels().operator);
        }

        let mut viz = Self {
            engine,
            plot,
            labels,
            config,
            state,
            legend: Vec::new(),
            flags: InputFlags::default(),
        };
        if let Err(e) = viz.on_structure_changed() {
            viz.shutdown();
            return Err(e);
        }
        Ok(viz)
    }

    pub fn state(&self) -> &VisualizationState {
        &self.state
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn plot(&self) -> &P {
        &self.plot
    }

    /// Direct backend access for hosts that draw outside the redraw paths.
    pub fn plot_mut(&mut self) -> &mut P {
        &mut self.plot
    }

    pub fn labels(&self) -> &L {
        &self.labels
    }

    pub fn config(&self) -> &VizConfig {
        &self.config
    }

    pub fn legend(&self) -> &[LegendEntry] {
        &self.legend
    }

    pub fn input_flags(&self) -> InputFlags {
        self.flags
    }

    /// Slider moved.
    pub fn on_position_changed(&mut self, x: f64) -> VizResult<()> {
        self.state.set_position(x);
        if self.state.staleness() == Staleness::Profile {
            return self.on_structure_changed();
        }
        self.redraw_position()
    }

    /// Recompute the profile and redraw everything.
    pub fn on_structure_changed(&mut self) -> VizResult<()> {
        self.state.recompute_profile(&self.engine)?;
        let kind = self.state.kind();

        let operand_a = self.engine.curve_series(self.state.curve(CurveRole::A))?;
        let operand_b = self.engine.curve_series(self.state.curve(CurveRole::B))?;
        let result = self
            .state
            .profile()
            .map(|p| p.result.clone())
            .unwrap_or_default();

        let patches = TraceSlot::STRUCTURAL
            .iter()
            .map(|&slot| {
                let patch = match slot {
                    TraceSlot::OperandA => TracePatch::data(operand_a.clone()),
                    TraceSlot::OperandB => TracePatch::data(operand_b.clone()),
                    TraceSlot::Result => TracePatch::data(result.clone()),
                    _ => TracePatch::cleared(),
                };
                patch.named(slot_name(slot, kind))
            })
            .collect();
        let layout = self
            .state
            .viewport()
            .map(|r| LayoutPatch {
                x_range: Some(r.x),
                y_range: Some(r.y),
            })
            .unwrap_or_default();
        self.plot
            .update(patches, layout, &indices(&TraceSlot::STRUCTURAL))?;
        self.labels
            .render_prefixed(LabelTarget::Title, &format!("{kind}: "), &kind.title_tex());
        debug!(%kind, result_points = result.len(), "full redraw");

        self.redraw_position()?;
        self.rebuild_legend();
        Ok(())
    }

    fn redraw_position(&mut self) -> VizResult<()> {
        self.state.recompute_sample(&self.engine)?;
        let position = self.state.position();
        let (sample, value) = match (self.state.sample(), self.state.result_value()) {
            (Some(sample), Some(value)) => (sample, value),
            _ => return Ok(()),
        };

        let patches = TraceSlot::POSITION_DEPENDENT
            .iter()
            .map(|&slot| {
                TracePatch::data(match slot {
                    TraceSlot::TransformedA => sample.transformed_a.clone(),
                    TraceSlot::RunningSum => sample.sum.clone(),
                    TraceSlot::RunningSumMarker => Series::point(sample.result.x, sample.result.y),
                    _ => Series::point(position, value),
                })
            })
            .collect();
        self.plot
            .restyle(patches, &indices(&TraceSlot::POSITION_DEPENDENT))?;
        self.labels
            .render_label(LabelTarget::PositionValue, &self.state.position_label());
        Ok(())
    }

    /// A curve input changed. A rejected definition flags the input and
    /// leaves the drawn frame alone.
    pub fn on_curve_edited(&mut self, role: CurveRole, text: &str) -> VizResult<()> {
        if let Err(e) = self.state.set_curve(&self.engine, role, text) {
            if e.is_parse_failure() {
                warn!(%role, error = %e, "curve rejected");
                self.flags.set(role, true);
            }
            return Err(e);
        }
        self.flags.set(role, false);
        self.on_structure_changed()
    }

    pub fn on_transform_kind_changed(&mut self, kind: TransformKind) -> VizResult<()> {
        self.state.set_transform_kind(kind);
        self.on_structure_changed()
    }

    /// Plot area resized; zero-sized areas keep the previous ratio.
    pub fn on_resize(&mut self, width: f64, height: f64) -> VizResult<()> {
        if width > 0.0 && height > 0.0 {
            self.state.set_aspect_ratio(width / height);
        }
        self.on_structure_changed()
    }

    /// Apply a decoded share state. Returns a warning per curve the engine
    /// rejected; those fall back to the configured default.
    pub fn restore(&mut self, shared: &SharedState) -> VizResult<Vec<ShareError>> {
        let mut warnings = Vec::new();
        for role in CurveRole::ALL {
            let (text, default) = match role {
                CurveRole::A => (&shared.curve_a, &self.config.curve_a),
                CurveRole::B => (&shared.curve_b, &self.config.curve_b),
            };
            if text == self.state.raw_text(role) {
                continue;
            }
            match self.state.set_curve(&self.engine, role, text) {
                Ok(()) => {}
                Err(VizError::ParseFailed { message, .. }) => {
                    warn!(%role, reason = %message, "shared curve rejected, using default");
                    warnings.push(ShareError::Malformed {
                        field: role.param(),
                        value: text.clone(),
                        reason: message,
                    });
                    if default != self.state.raw_text(role) {
                        self.state.set_curve(&self.engine, role, default)?;
                    }
                }
                Err(e) => return Err(e),
            }
            self.flags.set(role, false);
        }
        self.state.set_transform_kind(shared.kind);
        self.on_structure_changed()?;

        self.state.set_position(shared.position);
        self.redraw_position()?;
        self.apply_visibilities(shared.visibilities)?;
        debug!(warnings = warnings.len(), "state restored");
        Ok(warnings)
    }

    /// Decode a query string and restore it. Decode and restore warnings are
    /// returned together.
    pub fn load_query(&mut self, query: &str) -> VizResult<Vec<ShareError>> {
        let decoded = decode(query, &self.config.shared_defaults());
        let mut warnings = decoded.warnings;
        warnings.extend(self.restore(&decoded.state)?);
        Ok(warnings)
    }

    pub fn apply_visibilities(&mut self, visibilities: SlotVisibilities) -> VizResult<()> {
        let patches = visibilities
            .iter()
            .map(|(_, v)| TracePatch::visibility(v))
            .collect();
        self.plot.restyle(patches, &indices(&TraceSlot::ALL))?;
        self.rebuild_legend();
        Ok(())
    }

    /// Toggle every member of a legend entry together.
    pub fn toggle_legend_entry(&mut self, index: usize) -> VizResult<Visibility> {
        let entry = self.legend.get(index).ok_or(VizError::LegendOob {
            index,
            len: self.legend.len(),
        })?;
        let visible = entry.toggled();
        let members = entry.members.clone();
        let patches = members.iter().map(|_| TracePatch::visibility(visible)).collect();
        self.plot.restyle(patches, &members)?;
        debug!(index, ?visible, "legend toggled");
        self.rebuild_legend();
        Ok(visible)
    }

    pub fn visibilities(&self) -> SlotVisibilities {
        let mut visibilities = SlotVisibilities::all_visible();
        for trace in self.plot.traces() {
            if let Ok(slot) = TraceSlot::from_index(trace.index) {
                visibilities.set(slot, trace.visible);
            }
        }
        visibilities
    }

    pub fn export_state(&self) -> SharedState {
        SharedState {
            curve_a: self.state.raw_text(CurveRole::A).to_string(),
            curve_b: self.state.raw_text(CurveRole::B).to_string(),
            kind: self.state.kind(),
            position: self.state.position(),
            visibilities: self.visibilities(),
        }
    }

    /// Link to the configured page that reproduces the current view.
    pub fn share_link(&self) -> String {
        cv_share::share_link(&self.config.base_url, &self.export_state())
    }

    fn rebuild_legend(&mut self) {
        self.legend = legend::rebuild(&self.plot.traces());
        self.labels.clear_legend();
        for (i, entry) in self.legend.iter().enumerate() {
            self.labels
                .render_label(LabelTarget::LegendEntry(i), &tex_source(&entry.label));
        }
    }

    /// Release every engine handle and hand the collaborators back.
    pub fn shutdown(self) -> (E, P, L) {
        self.state.release(&self.engine);
        (self.engine, self.plot, self.labels)
    }
}
