//! Aspect-ratio-correct axis ranges.
//!
//! The plot locks one x unit to one y unit on screen, so the displayed box
//! must have the same width/height ratio as the plot area. Exactly one axis
//! is padded, symmetrically, by the minimum amount needed.

use serde::{Deserialize, Serialize};

use crate::Real;

/// Smallest span used when the data box collapses on an axis.
pub const MIN_SPAN: Real = 1e-9;

/// Axis ranges handed to the plot layout.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct AxisRanges {
    pub x: [Real; 2],
    pub y: [Real; 2],
}

impl AxisRanges {
    pub fn width(&self) -> Real {
        self.x[1] - self.x[0]
    }

    pub fn height(&self) -> Real {
        self.y[1] - self.y[0]
    }

    pub fn contains_box(&self, xmin: Real, xmax: Real, ymin: Real, ymax: Real) -> bool {
        self.x[0] <= xmin && self.x[1] >= xmax && self.y[0] <= ymin && self.y[1] >= ymax
    }
}

/// Expand `[xmin, xmax] x [ymin, ymax]` so its width/height equals `aspect_ratio`.
///
/// Non-finite or non-positive aspect ratios are treated as `1.0`. Collapsed
/// spans are widened around their center to [`MIN_SPAN`], or to a few ulps of
/// the center when that is larger, so the result always has positive area.
pub fn compute_range(
    xmin: Real,
    xmax: Real,
    ymin: Real,
    ymax: Real,
    aspect_ratio: Real,
) -> AxisRanges {
    let aspect = if aspect_ratio.is_finite() && aspect_ratio > 0.0 {
        aspect_ratio
    } else {
        1.0
    };
    let (xmin, xmax) = widen(xmin, xmax);
    let (ymin, ymax) = widen(ymin, ymax);
    let x_span = xmax - xmin;
    let y_span = ymax - ymin;

    let needed_y = x_span / aspect;
    if needed_y > y_span {
        let pad = (needed_y - y_span) / 2.0;
        AxisRanges {
            x: [xmin, xmax],
            y: [ymin - pad, ymax + pad],
        }
    } else {
        // Rounding can push the difference a hair below zero.
        let pad = ((y_span * aspect - x_span) / 2.0).max(0.0);
        AxisRanges {
            x: [xmin - pad, xmax + pad],
            y: [ymin, ymax],
        }
    }
}

fn widen(lo: Real, hi: Real) -> (Real, Real) {
    let (lo, hi) = if hi < lo { (hi, lo) } else { (lo, hi) };
    let mid = lo + (hi - lo) / 2.0;
    // An absolute floor vanishes into rounding far from the origin.
    let floor = MIN_SPAN.max(mid.abs() * 4.0 * Real::EPSILON);
    if hi - lo >= floor {
        return (lo, hi);
    }
    (mid - floor / 2.0, mid + floor / 2.0)
}
