//! Typed annotation collection.
//!
//! The reader in [`io_annotations`](super::io_annotations) turns loosely
//! shaped JSON into these types. Every annotation has already been checked
//! once it gets here: it is either a usable [`Annotation`] or an explicit
//! [`AnnotationEntry::Skipped`] carrying the reason, so later stages never
//! look up untyped fields.

use std::fmt;
use std::path::Path;

use super::bbox::BBoxXYWH;
use super::polygon::Polygon;
use super::space::Pixel;

/// All images of one annotation document, in document order.
#[derive(Clone, Debug, Default)]
pub struct AnnotationCollection {
    pub images: Vec<ImageRecord>,
}

impl AnnotationCollection {
    pub fn new(images: Vec<ImageRecord>) -> Self {
        Self { images }
    }

    /// Every class name carried by any annotation, skipped ones included.
    pub fn class_names(&self) -> impl Iterator<Item = &str> {
        self.images
            .iter()
            .flat_map(|image| image.annotations.iter())
            .filter_map(AnnotationEntry::class_name)
    }

    pub fn annotation_count(&self) -> usize {
        self.images.iter().map(|image| image.annotations.len()).sum()
    }
}

/// One source image and its annotations.
#[derive(Clone, Debug)]
pub struct ImageRecord {
    pub file_name: String,

    /// Width in pixels. `None` when missing or zero.
    pub width: Option<u32>,

    /// Height in pixels. `None` when missing or zero.
    pub height: Option<u32>,

    pub annotations: Vec<AnnotationEntry>,
}

impl ImageRecord {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            width: None,
            height: None,
            annotations: Vec::new(),
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.width = (width > 0).then_some(width);
        self.height = (height > 0).then_some(height);
        self
    }

    pub fn with_annotation(mut self, entry: impl Into<AnnotationEntry>) -> Self {
        self.annotations.push(entry.into());
        self
    }

    /// `(width, height)` when both are known.
    pub fn dimensions(&self) -> Option<(u32, u32)> {
        Some((self.width?, self.height?))
    }

    /// File name without directories or extension; the label file stem.
    pub fn stem(&self) -> Option<&str> {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .filter(|stem| !stem.is_empty())
    }
}

/// A labeled instance that passed parse-time checks.
#[derive(Clone, Debug, PartialEq)]
pub struct Annotation {
    pub class_name: String,
    pub geometry: Geometry,
}

impl Annotation {
    pub fn bbox(class_name: impl Into<String>, x: f64, y: f64, w: f64, h: f64) -> Self {
        Self {
            class_name: class_name.into(),
            geometry: Geometry::BBox(BBoxXYWH::from_xywh(x, y, w, h)),
        }
    }

    pub fn polygon(class_name: impl Into<String>, polygon: Polygon<Pixel>) -> Self {
        Self {
            class_name: class_name.into(),
            geometry: Geometry::Polygon(polygon),
        }
    }
}

/// The two annotation shapes.
#[derive(Clone, Debug, PartialEq)]
pub enum Geometry {
    BBox(BBoxXYWH<Pixel>),
    Polygon(Polygon<Pixel>),
}

/// Result of checking one raw annotation.
#[derive(Clone, Debug, PartialEq)]
pub enum AnnotationEntry {
    Valid(Annotation),
    Skipped {
        /// The class, if the raw annotation carried one. It still counts
        /// toward the category map.
        class_name: Option<String>,
        reason: SkipReason,
    },
}

impl AnnotationEntry {
    pub fn class_name(&self) -> Option<&str> {
        match self {
            AnnotationEntry::Valid(annotation) => Some(&annotation.class_name),
            AnnotationEntry::Skipped { class_name, .. } => class_name.as_deref(),
        }
    }

    pub fn is_valid(&self) -> bool {
        matches!(self, AnnotationEntry::Valid(_))
    }
}

impl From<Annotation> for AnnotationEntry {
    fn from(annotation: Annotation) -> Self {
        AnnotationEntry::Valid(annotation)
    }
}

/// Why an annotation cannot produce label lines.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SkipReason {
    /// The entry is not a JSON object.
    NotAnObject,
    MissingClassName,
    /// Neither `bbox` nor `segmentation` present.
    MissingGeometry,
    /// Geometry present but unusable (wrong arity, non-numeric, odd length).
    InvalidGeometry(String),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::NotAnObject => write!(f, "annotation is not an object"),
            SkipReason::MissingClassName => write!(f, "missing 'class'"),
            SkipReason::MissingGeometry => write!(f, "missing 'bbox' and 'segmentation'"),
            SkipReason::InvalidGeometry(detail) => write!(f, "invalid geometry: {detail}"),
        }
    }
}
