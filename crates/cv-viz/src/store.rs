//! Visualization state store.
//!
//! Owns the persistent engine handles (both curves and the profile) and the
//! derived values the plot is drawn from. Mutation goes through composite
//! operations that keep the staleness marker honest: a changed input marks
//! exactly the derived data that depends on it.

use core::fmt;

use cv_core::{
    AxisRanges, Tolerances, clamp_to, compute_range, label_padding, nearly_equal, pad_label,
};
use cv_engine::{
    CurveHandle, EngineExt, NumericEngine, ProfileHandle, ProfileSummary, TransformKind,
    TransformSample,
};
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::{VizError, VizResult};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CurveRole {
    A,
    B,
}

impl CurveRole {
    pub const ALL: [CurveRole; 2] = [CurveRole::A, CurveRole::B];

    /// Share-link parameter carrying this curve.
    pub fn param(self) -> &'static str {
        match self {
            CurveRole::A => cv_share::PARAM_CURVE_A,
            CurveRole::B => cv_share::PARAM_CURVE_B,
        }
    }
}

impl fmt::Display for CurveRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            CurveRole::A => "A",
            CurveRole::B => "B",
        })
    }
}

/// How much derived data is out of date, ordered by cost of recomputation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Staleness {
    Fresh,
    /// Only the sample at the current position.
    Sample,
    /// The profile, and with it the sample.
    Profile,
}

struct Profile {
    handle: ProfileHandle,
    summary: ProfileSummary,
}

struct Curve {
    handle: CurveHandle,
    raw: String,
}

pub struct VisualizationState {
    curve_a: Curve,
    curve_b: Curve,
    kind: TransformKind,
    position: f64,
    profile: Option<Profile>,
    sample: Option<TransformSample>,
    result_value: Option<f64>,
    viewport: Option<AxisRanges>,
    label_padding: usize,
    decimals: usize,
    aspect_ratio: f64,
    staleness: Staleness,
}

impl fmt::Debug for VisualizationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VisualizationState")
            .field("curve_a", &self.curve_a.handle.raw())
            .field("curve_b", &self.curve_b.handle.raw())
            .field("kind", &self.kind)
            .field("position", &self.position)
            .field("staleness", &self.staleness)
            .finish_non_exhaustive()
    }
}

fn parse<E: NumericEngine + ?Sized>(engine: &E, role: CurveRole, raw: &str) -> VizResult<Curve> {
    match engine.parse_curve(raw) {
        Ok(handle) => Ok(Curve {
            handle,
            raw: raw.to_string(),
        }),
        Err(e) if e.is_parse() => Err(VizError::ParseFailed {
            role,
            message: e.to_string(),
        }),
        Err(e) => Err(e.into()),
    }
}

impl VisualizationState {
    /// Parse both curves. Nothing is computed yet; the state starts stale.
    pub fn new<E: NumericEngine + ?Sized>(
        engine: &E,
        raw_a: &str,
        raw_b: &str,
        kind: TransformKind,
        decimals: usize,
        aspect_ratio: f64,
    ) -> VizResult<Self> {
        let curve_a = parse(engine, CurveRole::A, raw_a)?;
        let curve_b = match parse(engine, CurveRole::B, raw_b) {
            Ok(curve) => curve,
            Err(e) => {
                engine.release_curve(curve_a.handle);
                return Err(e);
            }
        };
        Ok(Self {
            curve_a,
            curve_b,
            kind,
            position: 0.0,
            profile: None,
            sample: None,
            result_value: None,
            viewport: None,
            label_padding: 0,
            decimals,
            aspect_ratio: if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
                aspect_ratio
            } else {
                1.0
            },
            staleness: Staleness::Profile,
        })
    }

    pub fn curve(&self, role: CurveRole) -> &CurveHandle {
        &self.slot(role).handle
    }

    /// Text the current curve was parsed from.
    pub fn raw_text(&self, role: CurveRole) -> &str {
        &self.slot(role).raw
    }

    pub fn kind(&self) -> TransformKind {
        self.kind
    }

    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn profile(&self) -> Option<&ProfileSummary> {
        self.profile.as_ref().map(|p| &p.summary)
    }

    pub fn sample(&self) -> Option<&TransformSample> {
        self.sample.as_ref()
    }

    /// Value of the full result curve at the current position.
    pub fn result_value(&self) -> Option<f64> {
        self.result_value
    }

    pub fn viewport(&self) -> Option<AxisRanges> {
        self.viewport
    }

    pub fn label_padding(&self) -> usize {
        self.label_padding
    }

    pub fn aspect_ratio(&self) -> f64 {
        self.aspect_ratio
    }

    pub fn staleness(&self) -> Staleness {
        self.staleness
    }

    /// Position readout, padded to the width of the widest bound.
    pub fn position_label(&self) -> String {
        pad_label(self.position, self.decimals, self.label_padding)
    }

    fn slot(&self, role: CurveRole) -> &Curve {
        match role {
            CurveRole::A => &self.curve_a,
            CurveRole::B => &self.curve_b,
        }
    }

    fn slot_mut(&mut self, role: CurveRole) -> &mut Curve {
        match role {
            CurveRole::A => &mut self.curve_a,
            CurveRole::B => &mut self.curve_b,
        }
    }

    fn mark(&mut self, staleness: Staleness) {
        self.staleness = self.staleness.max(staleness);
    }

    /// Replace a curve. On a parse failure nothing changes.
    pub fn set_curve<E: NumericEngine + ?Sized>(
        &mut self,
        engine: &E,
        role: CurveRole,
        raw: &str,
    ) -> VizResult<()> {
        let curve = parse(engine, role, raw)?;
        let old = std::mem::replace(self.slot_mut(role), curve);
        engine.release_curve(old.handle);
        debug!(%role, "curve replaced");
        self.mark(Staleness::Profile);
        Ok(())
    }

    pub fn set_transform_kind(&mut self, kind: TransformKind) {
        if kind != self.kind {
            self.kind = kind;
            self.mark(Staleness::Profile);
        }
    }

    /// Move the position, clamped into the profile's legal range.
    pub fn set_position(&mut self, x: f64) {
        let x = if x.is_finite() { x } else { self.position };
        // `+ 0.0` turns a typed `-0` into `0` before it reaches labels or links.
        self.position = match &self.profile {
            Some(p) => clamp_to(x, p.summary.min_position, p.summary.max_position),
            None => x + 0.0,
        };
        trace!(position = self.position, "position set");
        self.mark(Staleness::Sample);
    }

    /// Ignored unless finite and positive.
    pub fn set_aspect_ratio(&mut self, ratio: f64) {
        if !(ratio.is_finite() && ratio > 0.0)
            || nearly_equal(ratio, self.aspect_ratio, Tolerances::default())
        {
            return;
        }
        self.aspect_ratio = ratio;
        if let Some(p) = &self.profile {
            self.viewport = Some(viewport_of(&p.summary, ratio));
        }
    }

    /// Recompute the profile and everything derived from it except the sample.
    pub fn recompute_profile<E: NumericEngine + ?Sized>(&mut self, engine: &E) -> VizResult<()> {
        let handle = engine.compute_profile(&self.curve_a.handle, &self.curve_b.handle, self.kind)?;
        let summary = match engine.summarize(&handle) {
            Ok(summary) => summary,
            Err(e) => {
                engine.release_profile(handle);
                return Err(e.into());
            }
        };

        self.position = clamp_to(self.position, summary.min_position, summary.max_position);
        self.label_padding = label_padding(summary.min_position, summary.max_position, self.decimals);
        self.viewport = Some(viewport_of(&summary, self.aspect_ratio));
        if let Some(old) = self.profile.replace(Profile { handle, summary }) {
            engine.release_profile(old.handle);
        }
        self.sample = None;
        self.result_value = None;
        self.staleness = Staleness::Sample;
        Ok(())
    }

    /// Recompute the sample at the current position, refreshing the profile
    /// first when it is out of date.
    pub fn recompute_sample<E: NumericEngine + ?Sized>(&mut self, engine: &E) -> VizResult<()> {
        if self.staleness == Staleness::Profile || self.profile.is_none() {
            self.recompute_profile(engine)?;
        }
        let Some(profile) = &self.profile else {
            return Ok(());
        };
        let sample = engine.sample_at(
            &self.curve_a.handle,
            &self.curve_b.handle,
            self.position,
            self.kind,
        )?;
        let value = engine.evaluate_result_at(&profile.handle, self.position)?;
        trace!(position = self.position, value, "sample");
        self.sample = Some(sample);
        self.result_value = Some(value);
        self.staleness = Staleness::Fresh;
        Ok(())
    }

    /// Hand every retained handle back to the engine.
    pub fn release<E: NumericEngine + ?Sized>(self, engine: &E) {
        engine.release_curve(self.curve_a.handle);
        engine.release_curve(self.curve_b.handle);
        if let Some(profile) = self.profile {
            engine.release_profile(profile.handle);
        }
    }
}

fn viewport_of(summary: &ProfileSummary, aspect_ratio: f64) -> AxisRanges {
    compute_range(
        summary.min_x,
        summary.max_x,
        summary.min_y,
        summary.max_y,
        aspect_ratio,
    )
}
