//! Visualizer configuration, stored as YAML.
//!
//! Every field has a default so a partial file (or none at all) is valid.

use std::path::Path;

use cv_core::SlotVisibilities;
use cv_engine::TransformKind;
use cv_share::SharedState;
use serde::{Deserialize, Serialize};

pub type ConfigResult<T> = Result<T, ConfigError>;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("Invalid config value: {field} = {value} ({reason})")]
    InvalidValue {
        field: &'static str,
        value: String,
        reason: &'static str,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

pub const DEFAULT_CURVE_A: &str = "[(0, 0, 0), (1, 1, 0), (2, 2, 0), (3, 3, 0)], 5";
pub const DEFAULT_CURVE_B: &str = "[(0, 0, 0), (1, 0, 1)], 4";

/// Decimals beyond this only add noise to the position label.
const MAX_DECIMALS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VizConfig {
    pub curve_a: String,
    pub curve_b: String,
    pub kind: TransformKind,
    /// Fixed decimals of the position label.
    pub decimals: usize,
    pub visibilities: SlotVisibilities,
    /// Trace colors by plot index, cycled when shorter than the slot count.
    pub colorway: Vec<String>,
    /// Plot width / height before the first resize event.
    pub aspect_ratio: f64,
    /// Page address that share links are built on.
    pub base_url: String,
}

impl Default for VizConfig {
    fn default() -> Self {
        Self {
            curve_a: DEFAULT_CURVE_A.to_string(),
            curve_b: DEFAULT_CURVE_B.to_string(),
            kind: TransformKind::default(),
            decimals: 2,
            visibilities: SlotVisibilities::default(),
            colorway: [
                "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#d62728", "#9467bd", "#9467bd",
            ]
            .map(String::from)
            .to_vec(),
            aspect_ratio: 1.5,
            base_url: "http://localhost:8000/".to_string(),
        }
    }
}

impl VizConfig {
    /// The state a plain page load starts from.
    pub fn shared_defaults(&self) -> SharedState {
        SharedState {
            curve_a: self.curve_a.clone(),
            curve_b: self.curve_b.clone(),
            kind: self.kind,
            position: 0.0,
            visibilities: self.visibilities,
        }
    }

    pub fn validate(&self) -> ConfigResult<()> {
        if self.decimals > MAX_DECIMALS {
            return Err(ConfigError::InvalidValue {
                field: "decimals",
                value: self.decimals.to_string(),
                reason: "at most 10",
            });
        }
        if !(self.aspect_ratio.is_finite() && self.aspect_ratio > 0.0) {
            return Err(ConfigError::InvalidValue {
                field: "aspect_ratio",
                value: self.aspect_ratio.to_string(),
                reason: "must be finite and positive",
            });
        }
        if self.colorway.is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "colorway",
                value: "[]".to_string(),
                reason: "needs at least one color",
            });
        }
        for (field, text) in [("curve_a", &self.curve_a), ("curve_b", &self.curve_b)] {
            if text.trim().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field,
                    value: text.clone(),
                    reason: "curve definition is empty",
                });
            }
        }
        Ok(())
    }

    pub fn load_yaml(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: VizConfig = serde_yaml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save_yaml(&self, path: &Path) -> ConfigResult<()> {
        self.validate()?;
        let content = serde_yaml::to_string(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_yaml_fills_defaults() {
        let config: VizConfig = serde_yaml::from_str("decimals: 3\nkind: max_plus_deconv\n").unwrap();
        assert_eq!(config.decimals, 3);
        assert_eq!(config.kind, TransformKind::MaxPlusDeconv);
        assert_eq!(config.curve_a, DEFAULT_CURVE_A);
        assert_eq!(config.visibilities.to_bitstring(), "0111111");
        config.validate().unwrap();
    }

    #[test]
    fn visibilities_read_as_bitstring() {
        let config: VizConfig = serde_yaml::from_str("visibilities: '1111100'\n").unwrap();
        assert_eq!(config.visibilities.to_bitstring(), "1111100");
        assert!(serde_yaml::from_str::<VizConfig>("visibilities: '11'\n").is_err());
    }

    #[test]
    fn validate_rejects_bad_values() {
        let mut config = VizConfig::default();
        config.aspect_ratio = 0.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { field: "aspect_ratio", .. })
        ));

        let mut config = VizConfig::default();
        config.colorway.clear();
        assert!(config.validate().is_err());

        let mut config = VizConfig::default();
        config.curve_b = "  ".to_string();
        assert!(config.validate().is_err());
    }

    #[test]
    fn yaml_file_round_trip() {
        let path = std::env::temp_dir().join(format!("cv-viz-config-{}.yaml", std::process::id()));
        let mut config = VizConfig::default();
        config.kind = TransformKind::MinPlusDeconv;
        config.save_yaml(&path).unwrap();
        let loaded = VizConfig::load_yaml(&path).unwrap();
        std::fs::remove_file(&path).ok();
        assert_eq!(loaded, config);
    }
}
