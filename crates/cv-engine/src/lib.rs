//! cv-engine: boundary to the foreign numeric engine.
//!
//! The numeric engine (curve parsing, transform evaluation, global profile)
//! lives in a foreign runtime and hands back opaque handles. This crate owns
//! the Rust side of that boundary:
//! - foreign (handle tokens + runtime trait)
//! - bridge (convert-then-release materialization into native values)
//! - engine (numeric engine contract + typed helpers)
//! - kind (transform kinds and their display labels)
//! - sample (native sample/profile data)
//! - reference (in-process engine for tests and headless tools, feature `reference`)

pub mod bridge;
pub mod engine;
pub mod error;
pub mod foreign;
pub mod kind;
pub mod sample;

#[cfg(any(test, feature = "reference"))]
pub mod reference;

pub use bridge::{NativeValue, materialize};
pub use engine::{CurveHandle, EngineExt, NumericEngine, ProfileHandle};
pub use error::{EngineError, EngineResult};
pub use foreign::{ForeignHandle, ForeignItem, ForeignNode, ForeignRuntime};
pub use kind::{KindLabels, TransformKind};
pub use sample::{ProfileSummary, SamplePoint, Series, TransformSample};
