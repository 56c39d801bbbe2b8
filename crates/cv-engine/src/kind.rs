//! Transform kinds and their static display labels.

use core::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};

/// Which min/max-plus operation is visualized.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransformKind {
    #[default]
    MinPlusConv,
    MaxPlusConv,
    MinPlusDeconv,
    MaxPlusDeconv,
}

/// TeX labels shown in the title, legend and selector.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct KindLabels {
    /// The operator applied at the current position, e.g. `(a \otimes b)(\Delta)`.
    pub operator: &'static str,
    pub operand_a: &'static str,
    pub transformed_a: &'static str,
    pub operand_b: &'static str,
    /// The combined curve whose extremum is the sample.
    pub sum: &'static str,
    pub full: &'static str,
}

const MIN_PLUS_CONV: KindLabels = KindLabels {
    operator: r"(a \otimes b)(\Delta)",
    operand_a: r"a(\lambda)",
    transformed_a: r"a(\Delta - \lambda)",
    operand_b: r"b(\lambda)",
    sum: r"a(\Delta - \lambda) + b(\lambda)",
    full: r"\inf_{0 \le \lambda \le \Delta} \left\{ a(\Delta - \lambda) + b(\lambda) \right\}",
};

const MAX_PLUS_CONV: KindLabels = KindLabels {
    operator: r"(a \overline{\otimes} b)(\Delta)",
    operand_a: r"a(\lambda)",
    transformed_a: r"a(\Delta - \lambda)",
    operand_b: r"b(\lambda)",
    sum: r"a(\Delta - \lambda) + b(\lambda)",
    full: r"\sup_{0 \le \lambda \le \Delta} \left\{ a(\Delta - \lambda) + b(\lambda) \right\}",
};

const MIN_PLUS_DECONV: KindLabels = KindLabels {
    operator: r"(a \oslash b)(\Delta)",
    operand_a: r"a(\lambda)",
    transformed_a: r"a(\Delta + \lambda)",
    operand_b: r"b(\lambda)",
    sum: r"a(\Delta + \lambda) - b(\lambda)",
    full: r"\sup_{\lambda \ge 0} \left\{ a(\Delta + \lambda) - b(\lambda) \right\}",
};

const MAX_PLUS_DECONV: KindLabels = KindLabels {
    operator: r"(a \overline{\oslash} b)(\Delta)",
    operand_a: r"a(\lambda)",
    transformed_a: r"a(\Delta + \lambda)",
    operand_b: r"b(\lambda)",
    sum: r"a(\Delta + \lambda) - b(\lambda)",
    full: r"\inf_{\lambda \ge 0} \left\{ a(\Delta + \lambda) - b(\lambda) \right\}",
};

impl TransformKind {
    pub const ALL: [TransformKind; 4] = [
        TransformKind::MinPlusConv,
        TransformKind::MaxPlusConv,
        TransformKind::MinPlusDeconv,
        TransformKind::MaxPlusDeconv,
    ];

    /// Stable ordinal used in shareable links.
    pub fn ordinal(self) -> usize {
        self as usize
    }

    pub fn from_ordinal(ordinal: usize) -> EngineResult<Self> {
        Self::ALL
            .get(ordinal)
            .copied()
            .ok_or_else(|| EngineError::TypeMismatch {
                what: format!("transform kind ordinal {ordinal}"),
                expected: "ordinal in 0..4",
            })
    }

    pub fn labels(self) -> &'static KindLabels {
        match self {
            TransformKind::MinPlusConv => &MIN_PLUS_CONV,
            TransformKind::MaxPlusConv => &MAX_PLUS_CONV,
            TransformKind::MinPlusDeconv => &MIN_PLUS_DECONV,
            TransformKind::MaxPlusDeconv => &MAX_PLUS_DECONV,
        }
    }

    pub fn is_deconvolution(self) -> bool {
        matches!(
            self,
            TransformKind::MinPlusDeconv | TransformKind::MaxPlusDeconv
        )
    }

    /// Whether the sample is the minimum (rather than maximum) of the combined curve.
    pub fn takes_minimum(self) -> bool {
        matches!(
            self,
            TransformKind::MinPlusConv | TransformKind::MaxPlusDeconv
        )
    }

    /// TeX half of the title, `operator = full description`. The plain
    /// name in front of it comes from `Display` and is not TeX.
    pub fn title_tex(self) -> String {
        let labels = self.labels();
        format!("{} = {}", labels.operator, labels.full)
    }
}

impl fmt::Display for TransformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TransformKind::MinPlusConv => "Min-Plus Convolution",
            TransformKind::MaxPlusConv => "Max-Plus Convolution",
            TransformKind::MinPlusDeconv => "Min-Plus Deconvolution",
            TransformKind::MaxPlusDeconv => "Max-Plus Deconvolution",
        };
        f.write_str(name)
    }
}
