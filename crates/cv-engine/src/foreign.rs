//! Handles into the foreign runtime.
//!
//! A [`ForeignHandle`] is a move-only token: it is not `Clone`, and
//! [`ForeignRuntime::release`] consumes it. Whoever holds the token owns the
//! foreign-side resource and is the only party able to release it.

use crate::bridge::NativeValue;
use crate::error::EngineResult;

/// Owned reference to a foreign-side object.
#[derive(Debug, PartialEq, Eq, Hash)]
pub struct ForeignHandle(u64);

impl ForeignHandle {
    /// Wrap a runtime-assigned id. Only runtimes should mint handles.
    pub fn from_raw(id: u64) -> Self {
        Self(id)
    }

    pub fn raw(&self) -> u64 {
        self.0
    }
}

/// One element of a foreign container.
#[derive(Debug)]
pub enum ForeignItem {
    /// Value copied across the boundary; nothing to release.
    Immediate(NativeValue),
    /// Nested foreign object with its own handle.
    Object(ForeignHandle),
}

/// Shallow view of a foreign object.
#[derive(Debug)]
pub enum ForeignNode {
    Scalar(NativeValue),
    List(Vec<ForeignItem>),
    Record(Vec<(String, ForeignItem)>),
}

/// The foreign runtime that owns every handle.
///
/// Calls are synchronous and fast; the runtime uses interior mutability so
/// that handles can be released through a shared reference.
pub trait ForeignRuntime {
    /// Inspect one level of a foreign object. Nested objects come back as
    /// fresh handles that the caller now owns.
    fn inspect(&self, handle: &ForeignHandle) -> EngineResult<ForeignNode>;

    /// Release the foreign-side resource behind `handle`.
    fn release(&self, handle: ForeignHandle);
}
