//! Fixed trace slots and per-slot visibility.
//!
//! Partial plot updates address traces by index, so the mapping from role to
//! index is declared exactly once here and never reordered at runtime.

use core::fmt;
use core::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{CoreError, CoreResult};

/// Logical role of a plot trace. The discriminant is the plot trace index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TraceSlot {
    OperandA = 0,
    TransformedA = 1,
    OperandB = 2,
    RunningSum = 3,
    RunningSumMarker = 4,
    Result = 5,
    ResultMarker = 6,
}

impl TraceSlot {
    pub const COUNT: usize = 7;

    /// All slots in plot index order.
    pub const ALL: [TraceSlot; Self::COUNT] = [
        TraceSlot::OperandA,
        TraceSlot::TransformedA,
        TraceSlot::OperandB,
        TraceSlot::RunningSum,
        TraceSlot::RunningSumMarker,
        TraceSlot::Result,
        TraceSlot::ResultMarker,
    ];

    /// Slots whose data depends on the current position.
    pub const POSITION_DEPENDENT: [TraceSlot; 4] = [
        TraceSlot::TransformedA,
        TraceSlot::RunningSum,
        TraceSlot::RunningSumMarker,
        TraceSlot::ResultMarker,
    ];

    /// Slots rewritten by a structural (curve or kind) change.
    pub const STRUCTURAL: [TraceSlot; 5] = [
        TraceSlot::OperandA,
        TraceSlot::TransformedA,
        TraceSlot::OperandB,
        TraceSlot::RunningSum,
        TraceSlot::Result,
    ];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn from_index(index: usize) -> CoreResult<Self> {
        Self::ALL.get(index).copied().ok_or(CoreError::SlotOob {
            index,
            len: Self::COUNT,
        })
    }

    /// Legend group shared by a line trace and its marker, if any.
    pub fn legend_group(self) -> Option<&'static str> {
        match self {
            TraceSlot::RunningSum | TraceSlot::RunningSumMarker => Some("group_sum"),
            TraceSlot::Result | TraceSlot::ResultMarker => Some("group_result"),
            _ => None,
        }
    }

    pub fn is_marker(self) -> bool {
        matches!(self, TraceSlot::RunningSumMarker | TraceSlot::ResultMarker)
    }
}

impl fmt::Display for TraceSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TraceSlot::OperandA => "operand-a",
            TraceSlot::TransformedA => "transformed-operand-a",
            TraceSlot::OperandB => "operand-b",
            TraceSlot::RunningSum => "running-sum",
            TraceSlot::RunningSumMarker => "running-sum-marker",
            TraceSlot::Result => "result-curve",
            TraceSlot::ResultMarker => "result-marker",
        };
        f.write_str(name)
    }
}

/// Two-state trace visibility.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Visibility {
    #[default]
    Visible,
    /// Hidden from the plot but still listed in the legend.
    LegendOnly,
}

impl Visibility {
    pub fn toggled(self) -> Self {
        match self {
            Visibility::Visible => Visibility::LegendOnly,
            Visibility::LegendOnly => Visibility::Visible,
        }
    }

    pub fn is_visible(self) -> bool {
        self == Visibility::Visible
    }

    fn as_bit(self) -> char {
        match self {
            Visibility::Visible => '1',
            Visibility::LegendOnly => '0',
        }
    }
}

/// One visibility per trace slot, in slot order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SlotVisibilities([Visibility; TraceSlot::COUNT]);

impl SlotVisibilities {
    pub fn all_visible() -> Self {
        Self([Visibility::Visible; TraceSlot::COUNT])
    }

    pub fn get(&self, slot: TraceSlot) -> Visibility {
        self.0[slot.index()]
    }

    pub fn set(&mut self, slot: TraceSlot, visibility: Visibility) {
        self.0[slot.index()] = visibility;
    }

    pub fn iter(&self) -> impl Iterator<Item = (TraceSlot, Visibility)> + '_ {
        TraceSlot::ALL.iter().map(|&slot| (slot, self.get(slot)))
    }

    /// Bitstring form: one character per slot, `1` = visible.
    pub fn to_bitstring(&self) -> String {
        self.0.iter().map(|v| v.as_bit()).collect()
    }

    pub fn from_bitstring(input: &str) -> CoreResult<Self> {
        let invalid = |reason| CoreError::InvalidBitstring {
            input: input.to_string(),
            reason,
        };
        if input.chars().count() != TraceSlot::COUNT {
            return Err(invalid("expected one character per trace slot"));
        }
        let mut out = [Visibility::Visible; TraceSlot::COUNT];
        for (slot, ch) in out.iter_mut().zip(input.chars()) {
            *slot = match ch {
                '1' => Visibility::Visible,
                '0' => Visibility::LegendOnly,
                _ => return Err(invalid("characters must be '0' or '1'")),
            };
        }
        Ok(Self(out))
    }
}

/// Operand A starts hidden; its transformed copy carries the information.
impl Default for SlotVisibilities {
    fn default() -> Self {
        let mut vis = Self::all_visible();
        vis.set(TraceSlot::OperandA, Visibility::LegendOnly);
        vis
    }
}

impl FromStr for SlotVisibilities {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_bitstring(s)
    }
}

impl TryFrom<String> for SlotVisibilities {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_bitstring(&value)
    }
}

impl From<SlotVisibilities> for String {
    fn from(value: SlotVisibilities) -> Self {
        value.to_bitstring()
    }
}

impl fmt::Display for SlotVisibilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_bitstring())
    }
}
