//! Augmentation settings as read from YAML.
//!
//! Every operation is optional; leaving a key out disables it.
//!
//! ```yaml
//! enable: true
//! gamma: { range: [0.8, 1.2] }
//! contrast: { range: [0.9, 1.1] }
//! zoom: { range: [4, 6] }
//! rotation: { range: [-10, 10] }
//! flip: { horizontal: [0, 1], vertical: [0, 1] }
//! hue_saturation: { h_range: [-5, 5], s_range: [-20, 20], v_range: [-20, 20] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;

/// Closed `[min, max]` interval values are drawn from.
pub type ValueRange = [f64; 2];

fn unit_range() -> ValueRange {
    [0.0, 1.0]
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AugmentConfig {
    pub enable: bool,
    pub gamma: Option<RangeSetting>,
    pub contrast: Option<RangeSetting>,
    /// Drawn value `z` becomes the scale factor `1 + (z - 5) / 10`.
    pub zoom: Option<RangeSetting>,
    /// Degrees, counter-clockwise.
    pub rotation: Option<RangeSetting>,
    pub flip: Option<FlipSetting>,
    pub hue_saturation: Option<HueSaturationSetting>,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RangeSetting {
    pub range: ValueRange,
}

/// Each side flips when its drawn value exceeds 0.5.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct FlipSetting {
    #[serde(default = "unit_range")]
    pub horizontal: ValueRange,
    #[serde(default = "unit_range")]
    pub vertical: ValueRange,
}

impl Default for FlipSetting {
    fn default() -> Self {
        Self {
            horizontal: unit_range(),
            vertical: unit_range(),
        }
    }
}

/// Shifts in 8-bit HSV units: hue wraps at 180, the others clamp to 0..=255.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HueSaturationSetting {
    pub h_range: ValueRange,
    pub s_range: ValueRange,
    pub v_range: ValueRange,
}

impl AugmentConfig {
    /// Reads a config file whose top level is the settings block.
    pub fn from_path(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path).map_err(PrepError::Io)?;
        let config: Self = serde_yaml::from_str(&data).map_err(|source| PrepError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every configured range is finite and ordered.
    pub fn validate(&self) -> Result<(), PrepError> {
        let ranges = [
            ("gamma.range", self.gamma.map(|s| s.range)),
            ("contrast.range", self.contrast.map(|s| s.range)),
            ("zoom.range", self.zoom.map(|s| s.range)),
            ("rotation.range", self.rotation.map(|s| s.range)),
            ("flip.horizontal", self.flip.map(|s| s.horizontal)),
            ("flip.vertical", self.flip.map(|s| s.vertical)),
            ("hue_saturation.h_range", self.hue_saturation.map(|s| s.h_range)),
            ("hue_saturation.s_range", self.hue_saturation.map(|s| s.s_range)),
            ("hue_saturation.v_range", self.hue_saturation.map(|s| s.v_range)),
        ];

        for (name, range) in ranges {
            let Some([min, max]) = range else { continue };
            if !(min.is_finite() && max.is_finite()) {
                return Err(PrepError::InvalidAugmentConfig {
                    message: format!("{name} must be finite, got [{min}, {max}]"),
                });
            }
            if min > max {
                return Err(PrepError::InvalidAugmentConfig {
                    message: format!("{name} has min {min} greater than max {max}"),
                });
            }
        }
        Ok(())
    }
}
