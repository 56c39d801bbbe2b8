//! cv-core: shared foundation for the convolution visualizer.
//!
//! Contains:
//! - numeric (tolerances + float helpers)
//! - slots (fixed trace slot enumeration + per-slot visibility)
//! - viewport (aspect-ratio-correct axis ranges)
//! - error (shared error types)

pub mod error;
pub mod numeric;
pub mod slots;
pub mod viewport;

pub use error::{CoreError, CoreResult};
pub use numeric::*;
pub use slots::{SlotVisibilities, TraceSlot, Visibility};
pub use viewport::{AxisRanges, compute_range};
