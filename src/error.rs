use std::path::PathBuf;
use thiserror::Error;

/// The main error type for labelprep operations.
///
/// Everything here aborts the current run. Per-annotation and per-image
/// problems are not errors; they are reported through an
/// [`IssueSink`](crate::conversion::IssueSink) and processing continues.
#[derive(Debug, Error)]
pub enum PrepError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse annotation JSON from {path}: {source}")]
    AnnotationJsonParse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Invalid annotation JSON in {path}: {message}")]
    AnnotationJsonInvalid { path: PathBuf, message: String },

    #[error("Failed to write COCO JSON to {path}: {source}")]
    CocoJsonWrite {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Failed to parse config from {path}: {source}")]
    ConfigParse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("Invalid config: {message}")]
    InvalidConfig { message: String },

    #[error("Split ratio must be strictly between 0 and 1, got {0}")]
    InvalidSplitRatio(f64),

    #[error("{role} directory {path} does not exist")]
    MissingDirectory { path: PathBuf, role: &'static str },

    #[error("Invalid augmentation config: {message}")]
    InvalidAugmentConfig { message: String },

    #[error("Failed to write image {path}: {source}")]
    ImageWrite {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    /// The category map handed to the normalizer was not built from the
    /// collection being normalized.
    #[error("Class '{class_name}' in {file_name} is missing from the category map")]
    CategoryMapMismatch {
        class_name: String,
        file_name: String,
    },

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}
