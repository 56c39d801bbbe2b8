//! Native forms of the engine's sample and profile values.

use cv_core::ensure_finite;
use serde::Serialize;

use crate::bridge::NativeValue;
use crate::error::{EngineError, EngineResult};

/// A polyline as parallel coordinate vectors.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct Series {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

impl Series {
    pub fn point(x: f64, y: f64) -> Self {
        Self {
            x: vec![x],
            y: vec![y],
        }
    }

    pub fn len(&self) -> usize {
        self.x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Read a `{x: [..], y: [..]}` record.
    pub fn from_native(value: &NativeValue, what: &str) -> EngineResult<Self> {
        let x = value.field("x")?.as_f64_vec(what)?;
        let y = value.field("y")?.as_f64_vec(what)?;
        if x.len() != y.len() {
            return Err(EngineError::LengthMismatch {
                what: what.to_string(),
                x_len: x.len(),
                y_len: y.len(),
            });
        }
        Ok(Self { x, y })
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SamplePoint {
    pub x: f64,
    pub y: f64,
}

/// The transform evaluated at one position.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct TransformSample {
    pub transformed_a: Series,
    /// Combination of the transformed operand A and operand B.
    pub sum: Series,
    pub result: SamplePoint,
}

impl TransformSample {
    pub fn from_native(value: &NativeValue) -> EngineResult<Self> {
        let result = value.field("result")?;
        Ok(Self {
            transformed_a: Series::from_native(value.field("transformed_a")?, "transformed_a")?,
            sum: Series::from_native(value.field("sum")?, "sum")?,
            result: SamplePoint {
                x: result.number("x")?,
                y: result.number("y")?,
            },
        })
    }
}

/// Global properties of the transform for the current curves and kind.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ProfileSummary {
    pub min_position: f64,
    pub max_position: f64,
    pub min_x: f64,
    pub max_x: f64,
    pub min_y: f64,
    pub max_y: f64,
    pub result: Series,
}

impl ProfileSummary {
    /// Bounds must be finite: they feed the slider range and the viewport.
    pub fn from_native(value: &NativeValue) -> EngineResult<Self> {
        let bound = |name: &'static str| -> EngineResult<f64> {
            Ok(ensure_finite(value.number(name)?, name)?)
        };
        Ok(Self {
            min_position: bound("min_position")?,
            max_position: bound("max_position")?,
            min_x: bound("min_x")?,
            max_x: bound("max_x")?,
            min_y: bound("min_y")?,
            max_y: bound("max_y")?,
            result: Series::from_native(value.field("result")?, "result")?,
        })
    }

    pub fn position_range(&self) -> (f64, f64) {
        (self.min_position, self.max_position)
    }
}
