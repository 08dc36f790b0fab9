//! Pipeline configuration file.
//!
//! ```yaml
//! data:
//!   annotations: [bbox.json, segments.json]
//!   labeltype: yolo
//!   id_base: 0
//!   images: data/images
//!   labels: data/labels
//! augment:
//!   enable: true
//!   output: data/augmented
//!   seed: 7
//!   gamma: { range: [0.8, 1.2] }
//! split:
//!   enable: true
//!   ratio: 0.8
//!   seed: 42
//!   output: data/training_data_object_detection
//! ```
//!
//! Relative paths are taken relative to the directory holding the file.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::augment::AugmentConfig;
use crate::conversion::LabelFormat;
use crate::error::PrepError;
use crate::ir::IdBase;
use crate::split::DEFAULT_IMAGE_EXTENSIONS;

const DEFAULT_SPLIT_OUTPUT: &str = "data/training_data_object_detection";

fn default_true() -> bool {
    true
}

fn default_split_output() -> PathBuf {
    PathBuf::from(DEFAULT_SPLIT_OUTPUT)
}

fn default_extensions() -> Vec<String> {
    DEFAULT_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| ext.to_string())
        .collect()
}

#[derive(Clone, Debug, Deserialize)]
pub struct PipelineConfig {
    pub data: DataSection,
    #[serde(default)]
    pub augment: AugmentSection,
    #[serde(default)]
    pub split: SplitSection,
}

/// Inputs and the label-conversion stage.
#[derive(Clone, Debug, Deserialize)]
pub struct DataSection {
    /// Annotation documents, converted in order into `labels`.
    #[serde(default)]
    pub annotations: Vec<PathBuf>,
    #[serde(default)]
    pub labeltype: LabelFormat,
    #[serde(default)]
    pub id_base: IdBase,
    pub images: PathBuf,
    pub labels: PathBuf,
    /// Set to `false` to reuse label files from an earlier run.
    #[serde(default = "default_true")]
    pub convert: bool,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct AugmentSection {
    /// Where augmented images go; required when enabled.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(flatten)]
    pub settings: AugmentConfig,
}

#[derive(Clone, Debug, Deserialize)]
pub struct SplitSection {
    #[serde(default)]
    pub enable: bool,
    #[serde(default)]
    pub ratio: f64,
    #[serde(default)]
    pub seed: Option<u64>,
    #[serde(default = "default_split_output")]
    pub output: PathBuf,
    #[serde(default = "default_extensions")]
    pub extensions: Vec<String>,
    /// Write `data.yaml` next to the split.
    #[serde(default = "default_true")]
    pub data_yaml: bool,
}

impl Default for SplitSection {
    fn default() -> Self {
        Self {
            enable: false,
            ratio: 0.0,
            seed: None,
            output: default_split_output(),
            extensions: default_extensions(),
            data_yaml: true,
        }
    }
}

impl PipelineConfig {
    /// Reads, resolves and validates a pipeline file.
    pub fn from_path(path: &Path) -> Result<Self, PrepError> {
        let data = fs::read_to_string(path).map_err(PrepError::Io)?;
        let mut config: Self =
            serde_yaml::from_str(&data).map_err(|source| PrepError::ConfigParse {
                path: path.to_path_buf(),
                source,
            })?;

        if let Some(base) = path.parent() {
            config.resolve_paths(base);
        }
        config.validate()?;
        Ok(config)
    }

    /// Joins every relative path onto `base`.
    pub fn resolve_paths(&mut self, base: &Path) {
        let resolve = |path: &mut PathBuf| {
            if path.is_relative() {
                *path = base.join(&*path);
            }
        };

        self.data.annotations.iter_mut().for_each(resolve);
        resolve(&mut self.data.images);
        resolve(&mut self.data.labels);
        if let Some(output) = self.augment.output.as_mut() {
            resolve(output);
        }
        resolve(&mut self.split.output);
    }

    pub fn validate(&self) -> Result<(), PrepError> {
        if self.data.convert && self.data.annotations.is_empty() {
            return Err(PrepError::InvalidConfig {
                message: "data.annotations must list at least one file".to_string(),
            });
        }

        if self.augment.settings.enable {
            self.augment.settings.validate()?;
            if self.augment.output.is_none() {
                return Err(PrepError::InvalidConfig {
                    message: "augment.output is required when augment.enable is true".to_string(),
                });
            }
        }

        if self.split.enable && !(self.split.ratio > 0.0 && self.split.ratio < 1.0) {
            return Err(PrepError::InvalidSplitRatio(self.split.ratio));
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = "data:\n  annotations: [a.json]\n  images: imgs\n  labels: lbls\n";

    #[test]
    fn minimal_config_uses_defaults() {
        let config: PipelineConfig = serde_yaml::from_str(MINIMAL).unwrap();
        assert_eq!(config.data.labeltype, LabelFormat::Yolo);
        assert_eq!(config.data.id_base, IdBase::Zero);
        assert!(config.data.convert);
        assert!(!config.augment.settings.enable);
        assert!(!config.split.enable);
        assert_eq!(config.split.extensions.len(), DEFAULT_IMAGE_EXTENSIONS.len());
        config.validate().unwrap();
    }

    #[test]
    fn stage_flags_and_variant_are_read() {
        let yaml = "data:\n  annotations: [a.json]\n  labeltype: coco\n  id_base: 1\n  images: i\n  labels: l\n\
                    augment:\n  enable: true\n  output: aug\n  seed: 3\n  gamma: { range: [0.9, 1.1] }\n\
                    split:\n  enable: true\n  ratio: 0.75\n  extensions: [png]\n";
        let config: PipelineConfig = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.data.labeltype, LabelFormat::Coco);
        assert_eq!(config.data.id_base, IdBase::One);
        assert!(config.augment.settings.enable);
        assert_eq!(config.augment.seed, Some(3));
        assert_eq!(config.augment.settings.gamma.unwrap().range, [0.9, 1.1]);
        assert_eq!(config.split.ratio, 0.75);
        assert_eq!(config.split.extensions, vec!["png"]);
        config.validate().unwrap();
    }

    #[test]
    fn bad_id_base_is_a_parse_error() {
        let yaml = "data:\n  annotations: [a.json]\n  id_base: 2\n  images: i\n  labels: l\n";
        let err = serde_yaml::from_str::<PipelineConfig>(yaml).unwrap_err();
        assert!(err.to_string().contains("id_base"));
    }

    #[test]
    fn validation_catches_stage_problems() {
        let mut config: PipelineConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.split.enable = true;
        config.split.ratio = 1.0;
        assert!(matches!(
            config.validate(),
            Err(PrepError::InvalidSplitRatio(_))
        ));

        let mut config: PipelineConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.augment.settings.enable = true;
        assert!(matches!(
            config.validate(),
            Err(PrepError::InvalidConfig { .. })
        ));

        let mut config: PipelineConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.data.annotations.clear();
        assert!(config.validate().is_err());
        config.data.convert = false;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn relative_paths_follow_the_config_file() {
        let mut config: PipelineConfig = serde_yaml::from_str(MINIMAL).unwrap();
        config.data.images = PathBuf::from("/abs/images");
        config.resolve_paths(Path::new("/project"));

        assert_eq!(config.data.annotations[0], PathBuf::from("/project/a.json"));
        assert_eq!(config.data.images, PathBuf::from("/abs/images"));
        assert_eq!(config.data.labels, PathBuf::from("/project/lbls"));
        assert_eq!(
            config.split.output,
            PathBuf::from("/project/data/training_data_object_detection")
        );
    }
}
