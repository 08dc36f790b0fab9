//! COCO detection JSON export.
//!
//! Turns an [`AnnotationCollection`] into a full COCO document:
//!
//! - categories are numbered from 1 in byte order of their names,
//! - images are numbered from 1 in input order,
//! - annotations are numbered from 1 in the order they are met.
//!
//! # Deterministic Output
//!
//! Nothing time dependent is written. The `info` block only carries the
//! description and version from [`CocoExportOptions`], so exporting the same
//! input twice yields byte-identical files.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use serde::Serialize;

use super::category_map::{CategoryMap, IdBase};
use super::model::{AnnotationCollection, AnnotationEntry, Geometry};
use super::{AnnotationId, ClassId, ImageId};
use crate::conversion::{ConversionIssue, ConversionIssueCode, IssueSink};
use crate::error::PrepError;

// ============================================================================
// COCO Schema Types (internal to this module)
// ============================================================================

#[derive(Debug, Serialize)]
struct CocoDataset {
    info: CocoInfo,
    licenses: Vec<CocoLicense>,
    images: Vec<CocoImage>,
    annotations: Vec<CocoAnnotation>,
    categories: Vec<CocoCategory>,
}

#[derive(Debug, Serialize)]
struct CocoInfo {
    description: String,
    url: String,
    version: String,
    contributor: String,
}

#[derive(Debug, Serialize)]
struct CocoLicense {
    id: u64,
    name: String,
    url: String,
}

#[derive(Debug, Serialize)]
struct CocoImage {
    id: ImageId,
    width: u32,
    height: u32,
    file_name: String,
    license: u64,
}

#[derive(Debug, Serialize)]
struct CocoCategory {
    id: ClassId,
    name: String,
    supercategory: String,
}

#[derive(Debug, Serialize)]
struct CocoAnnotation {
    id: AnnotationId,
    image_id: ImageId,
    category_id: ClassId,
    /// Empty for plain boxes; one ring for polygons.
    segmentation: Vec<Vec<f64>>,
    area: f64,
    /// `[x, y, width, height]`, top-left corner.
    bbox: [f64; 4],
    iscrowd: u8,
}

const LICENSE_ID: u64 = 1;

// ============================================================================
// Public API
// ============================================================================

/// Fields of the `info` block.
#[derive(Clone, Debug)]
pub struct CocoExportOptions {
    pub description: String,
    pub version: String,
}

impl Default for CocoExportOptions {
    fn default() -> Self {
        Self {
            description: "Object detection dataset".to_string(),
            version: "1.0".to_string(),
        }
    }
}

/// Counts reported after an export.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CocoExportSummary {
    pub images: usize,
    pub annotations: usize,
    pub categories: usize,
    /// Images left out for lack of width or height.
    pub images_skipped: usize,
}

/// Writes `collection` as pretty-printed COCO JSON to `path`.
///
/// Skipped annotations and images without dimensions are reported to
/// `sink` and left out of the document.
///
/// # Errors
/// Returns an error if the file cannot be created or written.
pub fn write_coco_json(
    collection: &AnnotationCollection,
    path: &Path,
    opts: &CocoExportOptions,
    sink: &mut dyn IssueSink,
) -> Result<CocoExportSummary, PrepError> {
    let (coco, summary) = collection_to_coco(collection, opts, sink)?;

    let file = File::create(path).map_err(PrepError::Io)?;
    let writer = BufWriter::new(file);
    serde_json::to_writer_pretty(writer, &coco).map_err(|source| PrepError::CocoJsonWrite {
        path: path.to_path_buf(),
        source,
    })?;

    Ok(summary)
}

/// Renders `collection` as a pretty-printed COCO JSON string.
pub fn to_coco_json_string(
    collection: &AnnotationCollection,
    opts: &CocoExportOptions,
    sink: &mut dyn IssueSink,
) -> Result<String, PrepError> {
    let (coco, _) = collection_to_coco(collection, opts, sink)?;
    serde_json::to_string_pretty(&coco).map_err(|source| PrepError::CocoJsonWrite {
        path: "<memory>".into(),
        source,
    })
}

// ============================================================================
// Conversion
// ============================================================================

fn collection_to_coco(
    collection: &AnnotationCollection,
    opts: &CocoExportOptions,
    sink: &mut dyn IssueSink,
) -> Result<(CocoDataset, CocoExportSummary), PrepError> {
    let category_map = CategoryMap::from_collection(collection, IdBase::One);

    let categories: Vec<CocoCategory> = category_map
        .iter()
        .map(|(name, id)| CocoCategory {
            id,
            name: name.to_string(),
            supercategory: String::new(),
        })
        .collect();

    let mut images = Vec::with_capacity(collection.images.len());
    let mut annotations = Vec::new();
    let mut images_skipped = 0;
    let mut next_annotation_id = 1u64;

    for (index, image) in collection.images.iter().enumerate() {
        let image_id = ImageId::new(index as u64 + 1);

        let Some((width, height)) = image.dimensions() else {
            sink.record(ConversionIssue::warning(
                ConversionIssueCode::MissingImageDimensions,
                &image.file_name,
                "skipping image (missing 'width' or 'height')",
            ));
            images_skipped += 1;
            continue;
        };

        images.push(CocoImage {
            id: image_id,
            width,
            height,
            file_name: image.file_name.clone(),
            license: LICENSE_ID,
        });

        for entry in &image.annotations {
            let annotation = match entry {
                AnnotationEntry::Valid(annotation) => annotation,
                AnnotationEntry::Skipped { reason, .. } => {
                    sink.record(ConversionIssue::skipped_annotation(&image.file_name, reason));
                    continue;
                }
            };

            let category_id = category_map.id_of(&annotation.class_name).ok_or_else(|| {
                PrepError::CategoryMapMismatch {
                    class_name: annotation.class_name.clone(),
                    file_name: image.file_name.clone(),
                }
            })?;

            let (bbox, area, segmentation) = match &annotation.geometry {
                Geometry::BBox(bbox) => (bbox.to_array(), bbox.area(), Vec::new()),
                Geometry::Polygon(polygon) => {
                    let bbox = polygon
                        .bounding_box()
                        .map(|b| b.to_array())
                        .unwrap_or_default();
                    (bbox, polygon.area(), vec![polygon.to_flat()])
                }
            };

            annotations.push(CocoAnnotation {
                id: AnnotationId::new(next_annotation_id),
                image_id,
                category_id,
                segmentation,
                area,
                bbox,
                iscrowd: 0,
            });
            next_annotation_id += 1;
        }
    }

    let summary = CocoExportSummary {
        images: images.len(),
        annotations: annotations.len(),
        categories: categories.len(),
        images_skipped,
    };

    let coco = CocoDataset {
        info: CocoInfo {
            description: opts.description.clone(),
            url: String::new(),
            version: opts.version.clone(),
            contributor: String::new(),
        },
        licenses: vec![CocoLicense {
            id: LICENSE_ID,
            name: "Unknown".to_string(),
            url: String::new(),
        }],
        images,
        annotations,
        categories,
    };

    Ok((coco, summary))
}
