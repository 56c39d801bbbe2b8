//! Custom legend derived from the plot's trace list.
//!
//! Traces sharing a legend group collapse into one entry that toggles all of
//! them; ungrouped traces get an entry each unless they opt out with
//! `show_legend`. Grouped traces always join their group's entry, since
//! toggling the group has to reach them. The legend is always rebuilt from
//! scratch after a visibility or name change.

use cv_core::Visibility;
use serde::Serialize;

use crate::plot::TraceInfo;

pub const FALLBACK_SWATCH: &str = "black";
pub const SHOWN_LABEL_COLOR: &str = "#000";
pub const HIDDEN_LABEL_COLOR: &str = "#888";

#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LegendKey {
    Group(String),
    Trace(usize),
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct LegendEntry {
    pub key: LegendKey,
    /// TeX label of the first member.
    pub label: String,
    pub swatch: String,
    /// Plot indices toggled together, in plot order.
    pub members: Vec<usize>,
    pub visibility: Visibility,
}

impl LegendEntry {
    pub fn label_color(&self) -> &'static str {
        if self.visibility.is_visible() {
            SHOWN_LABEL_COLOR
        } else {
            HIDDEN_LABEL_COLOR
        }
    }

    /// Visibility every member gets when the entry is clicked.
    pub fn toggled(&self) -> Visibility {
        self.visibility.toggled()
    }
}

pub fn rebuild(traces: &[TraceInfo]) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = Vec::new();
    for trace in traces {
        let key = match &trace.legend_group {
            Some(group) => LegendKey::Group(group.clone()),
            None if !trace.show_legend => continue,
            None => LegendKey::Trace(trace.index),
        };
        if let Some(entry) = entries.iter_mut().find(|e| e.key == key) {
            entry.members.push(trace.index);
            continue;
        }
        entries.push(LegendEntry {
            key,
            label: trace.name.clone(),
            swatch: trace
                .color
                .clone()
                .unwrap_or_else(|| FALLBACK_SWATCH.to_string()),
            members: vec![trace.index],
            visibility: trace.visible,
        });
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(index: usize, group: Option<&str>, visible: Visibility) -> TraceInfo {
        TraceInfo {
            index,
            name: format!("t{index}"),
            legend_group: group.map(String::from),
            show_legend: true,
            visible,
            color: (index != 2).then(|| format!("c{index}")),
        }
    }

    #[test]
    fn groups_collapse_in_first_seen_order() {
        let traces = [
            info(0, None, Visibility::LegendOnly),
            info(1, Some("g"), Visibility::Visible),
            info(2, None, Visibility::Visible),
            info(3, Some("g"), Visibility::LegendOnly),
        ];
        let legend = rebuild(&traces);
        assert_eq!(legend.len(), 3);
        assert_eq!(legend[0].key, LegendKey::Trace(0));
        assert_eq!(legend[1].key, LegendKey::Group("g".to_string()));
        assert_eq!(legend[1].members, vec![1, 3]);
        assert_eq!(legend[1].label, "t1");
        assert_eq!(legend[1].visibility, Visibility::Visible);
        assert_eq!(legend[2].swatch, FALLBACK_SWATCH);
    }

    #[test]
    fn label_color_follows_visibility() {
        let legend = rebuild(&[info(0, None, Visibility::LegendOnly)]);
        assert_eq!(legend[0].label_color(), HIDDEN_LABEL_COLOR);
        assert_eq!(legend[0].toggled(), Visibility::Visible);
        let legend = rebuild(&[info(0, None, Visibility::Visible)]);
        assert_eq!(legend[0].label_color(), SHOWN_LABEL_COLOR);
    }

    #[test]
    fn hidden_ungrouped_trace_gets_no_entry() {
        let mut hidden = info(1, None, Visibility::Visible);
        hidden.show_legend = false;
        let mut grouped = info(2, Some("g"), Visibility::Visible);
        grouped.show_legend = false;
        let legend = rebuild(&[info(0, Some("g"), Visibility::Visible), hidden, grouped]);
        assert_eq!(legend.len(), 1);
        assert_eq!(legend[0].members, vec![0, 2]);
    }

    #[test]
    fn empty_plot_has_empty_legend() {
        assert!(rebuild(&[]).is_empty());
    }
}
