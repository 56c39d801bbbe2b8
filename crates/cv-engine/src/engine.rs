//! Numeric engine contract.
//!
//! The engine parses curve definitions, evaluates the transform at a single
//! position and computes its global profile. Long-lived objects (curves and
//! profiles) come back as typed handles that the caller keeps and releases on
//! replacement. Everything else comes back as a transient [`ForeignHandle`]
//! meant to be passed straight to [`materialize`].

use tracing::debug;

use crate::bridge::materialize;
use crate::error::{EngineError, EngineResult};
use crate::foreign::{ForeignHandle, ForeignRuntime};
use crate::kind::TransformKind;
use crate::sample::{ProfileSummary, Series, TransformSample};

/// A parsed curve owned by the foreign engine.
#[derive(Debug, PartialEq, Eq)]
pub struct CurveHandle(ForeignHandle);

/// A computed transform profile owned by the foreign engine.
#[derive(Debug, PartialEq, Eq)]
pub struct ProfileHandle(ForeignHandle);

macro_rules! handle_wrapper {
    ($name:ident) => {
        impl $name {
            pub fn new(handle: ForeignHandle) -> Self {
                Self(handle)
            }

            pub fn raw(&self) -> u64 {
                self.0.raw()
            }

            pub fn into_foreign(self) -> ForeignHandle {
                self.0
            }
        }
    };
}

handle_wrapper!(CurveHandle);
handle_wrapper!(ProfileHandle);

/// The foreign numeric engine.
pub trait NumericEngine {
    type Runtime: ForeignRuntime;

    fn runtime(&self) -> &Self::Runtime;

    /// Parse a textual curve definition. Fails with [`EngineError::Parse`].
    fn parse_curve(&self, text: &str) -> EngineResult<CurveHandle>;

    /// Breakpoints of a curve as a `{x, y}` record.
    fn curve_points(&self, curve: &CurveHandle) -> EngineResult<ForeignHandle>;

    /// Evaluate the transform at `position` as a
    /// `{transformed_a, sum, result: {x, y}}` record.
    fn evaluate_at(
        &self,
        a: &CurveHandle,
        b: &CurveHandle,
        position: f64,
        kind: TransformKind,
    ) -> EngineResult<ForeignHandle>;

    fn compute_profile(
        &self,
        a: &CurveHandle,
        b: &CurveHandle,
        kind: TransformKind,
    ) -> EngineResult<ProfileHandle>;

    /// Profile bounds and result curve as a record.
    fn profile_summary(&self, profile: &ProfileHandle) -> EngineResult<ForeignHandle>;

    /// Value of the full result curve at `x`.
    fn evaluate_result_at(&self, profile: &ProfileHandle, x: f64) -> EngineResult<f64>;

    fn release_curve(&self, curve: CurveHandle) {
        self.runtime().release(curve.into_foreign());
    }

    fn release_profile(&self, profile: ProfileHandle) {
        self.runtime().release(profile.into_foreign());
    }
}

/// Typed calls that pair an engine call with materialization.
pub trait EngineExt: NumericEngine {
    fn curve_series(&self, curve: &CurveHandle) -> EngineResult<Series> {
        let value = self.fetch(self.curve_points(curve)?, "curve points")?;
        Series::from_native(&value, "curve points")
    }

    fn sample_at(
        &self,
        a: &CurveHandle,
        b: &CurveHandle,
        position: f64,
        kind: TransformKind,
    ) -> EngineResult<TransformSample> {
        let value = self.fetch(self.evaluate_at(a, b, position, kind)?, "transform sample")?;
        TransformSample::from_native(&value)
    }

    fn summarize(&self, profile: &ProfileHandle) -> EngineResult<ProfileSummary> {
        let value = self.fetch(self.profile_summary(profile)?, "profile summary")?;
        let summary = ProfileSummary::from_native(&value)?;
        debug!(
            min_position = summary.min_position,
            max_position = summary.max_position,
            points = summary.result.len(),
            "profile summary"
        );
        Ok(summary)
    }

    /// Materialize a value the engine promised to return.
    fn fetch(&self, handle: ForeignHandle, what: &str) -> EngineResult<crate::NativeValue> {
        materialize(self.runtime(), Some(handle))?.ok_or_else(|| EngineError::MissingField {
            field: what.to_string(),
        })
    }
}

impl<E: NumericEngine + ?Sized> EngineExt for E {}
