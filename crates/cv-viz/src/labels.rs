//! Typeset label targets.
//!
//! Labels are TeX source; the sink decides how to typeset them. Inputs may
//! arrive wrapped in `$...$` inline math delimiters, which are stripped.

use std::collections::HashMap;

use cv_engine::TransformKind;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum LabelTarget {
    Title,
    /// Symbol in front of the position readout.
    PositionSign,
    PositionValue,
    KindOption(TransformKind),
    LegendEntry(usize),
}

pub trait LabelSink {
    fn render_label(&mut self, target: LabelTarget, text: &str);

    /// Typeset `tex` behind `prefix`, which is plain text and never goes
    /// through the TeX renderer.
    fn render_prefixed(&mut self, target: LabelTarget, prefix: &str, tex: &str);

    /// Drop every legend label before a rebuild.
    fn clear_legend(&mut self) {}
}

pub fn tex_source(text: &str) -> String {
    text.replace('$', "")
}

/// Keeps the last text rendered into each target.
#[derive(Debug, Default)]
pub struct RecordingLabels {
    labels: HashMap<LabelTarget, String>,
    prefixes: HashMap<LabelTarget, String>,
    renders: usize,
}

impl RecordingLabels {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, target: LabelTarget) -> Option<&str> {
        self.labels.get(&target).map(String::as_str)
    }

    /// Plain text rendered in front of the TeX in `target`.
    pub fn prefix(&self, target: LabelTarget) -> Option<&str> {
        self.prefixes.get(&target).map(String::as_str)
    }

    pub fn render_count(&self) -> usize {
        self.renders
    }

    pub fn legend_len(&self) -> usize {
        self.labels
            .keys()
            .filter(|t| matches!(t, LabelTarget::LegendEntry(_)))
            .count()
    }
}

impl LabelSink for RecordingLabels {
    fn render_label(&mut self, target: LabelTarget, text: &str) {
        self.renders += 1;
        self.prefixes.remove(&target);
        self.labels.insert(target, text.to_string());
    }

    fn render_prefixed(&mut self, target: LabelTarget, prefix: &str, tex: &str) {
        self.renders += 1;
        self.prefixes.insert(target, prefix.to_string());
        self.labels.insert(target, tex.to_string());
    }

    fn clear_legend(&mut self) {
        self.labels
            .retain(|target, _| !matches!(target, LabelTarget::LegendEntry(_)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_math_delimiters() {
        assert_eq!(tex_source(r"$a(\lambda)$"), r"a(\lambda)");
        assert_eq!(tex_source("plain"), "plain");
    }

    #[test]
    fn clear_legend_keeps_other_targets() {
        let mut labels = RecordingLabels::new();
        labels.render_label(LabelTarget::Title, "t");
        labels.render_label(LabelTarget::LegendEntry(0), "a");
        labels.render_label(LabelTarget::LegendEntry(1), "b");
        labels.clear_legend();
        assert_eq!(labels.legend_len(), 0);
        assert_eq!(labels.get(LabelTarget::Title), Some("t"));
        assert_eq!(labels.render_count(), 3);
    }

    #[test]
    fn prefix_is_kept_apart_from_tex() {
        let mut labels = RecordingLabels::new();
        labels.render_prefixed(LabelTarget::Title, "Name: ", r"\otimes = x");
        assert_eq!(labels.prefix(LabelTarget::Title), Some("Name: "));
        assert_eq!(labels.get(LabelTarget::Title), Some(r"\otimes = x"));

        labels.render_label(LabelTarget::Title, "plain");
        assert_eq!(labels.prefix(LabelTarget::Title), None);
    }
}
