//! Annotation → label-file conversion.
//!
//! One call reads a whole [`AnnotationCollection`], builds its
//! [`CategoryMap`] and writes one `<stem>.txt` per image. Two text layouts
//! are supported:
//!
//! - [`LabelFormat::Yolo`]: coordinates divided by the image size, six
//!   decimals. Boxes become `id cx cy w h`; polygons become one `id x y`
//!   line per vertex.
//! - [`LabelFormat::Coco`]: absolute pixel coordinates, three decimals.
//!   Boxes become `id x y w h`; polygons again one line per vertex.

pub mod report;

pub use report::{
    ConversionIssue, ConversionIssueCode, ConversionSummary, IssueSeverity, IssueSink, LogSink,
};

use std::fs;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::PrepError;
use crate::ir::io_annotations::read_annotation_collection;
use crate::ir::{
    AnnotationCollection, AnnotationEntry, BBoxXYWH, CategoryMap, ClassId, Geometry, IdBase,
    ImageRecord, Pixel, Polygon,
};

const LABEL_EXTENSION: &str = "txt";

/// Text layout of a label file.
///
/// Parsed from the CLI's `--format` string and the pipeline's `labeltype`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelFormat {
    #[default]
    Yolo,
    Coco,
}

impl LabelFormat {
    pub fn name(&self) -> &'static str {
        match self {
            LabelFormat::Yolo => "yolo",
            LabelFormat::Coco => "coco",
        }
    }

    /// Whether writing this layout needs the image width and height.
    pub fn requires_dimensions(&self) -> bool {
        matches!(self, LabelFormat::Yolo)
    }
}

impl FromStr for LabelFormat {
    type Err = PrepError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw.to_ascii_lowercase().as_str() {
            "yolo" => Ok(LabelFormat::Yolo),
            "coco" => Ok(LabelFormat::Coco),
            other => Err(PrepError::UnsupportedFormat(format!(
                "'{}' (supported: yolo, coco)",
                other
            ))),
        }
    }
}

/// Options for one conversion call.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ConvertOptions {
    pub format: LabelFormat,
    pub id_base: IdBase,
}

/// Label lines produced for one image.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImageLabels {
    pub lines: Vec<String>,
    /// Annotations that produced no line.
    pub skipped: usize,
}

impl ImageLabels {
    /// File contents: lines joined by `\n`, no trailing newline.
    pub fn to_text(&self) -> String {
        self.lines.join("\n")
    }
}

/// Turns one image's annotations into label lines, in annotation order.
///
/// Skipped annotations and missing dimensions are reported to `sink` and
/// do not stop the image.
///
/// # Errors
/// [`PrepError::CategoryMapMismatch`] if a class is absent from
/// `category_map`, which means the map was built from another collection.
pub fn normalize_image(
    image: &ImageRecord,
    category_map: &CategoryMap,
    format: LabelFormat,
    sink: &mut dyn IssueSink,
) -> Result<ImageLabels, PrepError> {
    let mut labels = ImageLabels::default();

    for entry in &image.annotations {
        let annotation = match entry {
            AnnotationEntry::Valid(annotation) => annotation,
            AnnotationEntry::Skipped { reason, .. } => {
                sink.record(ConversionIssue::skipped_annotation(&image.file_name, reason));
                labels.skipped += 1;
                continue;
            }
        };

        // Yolo divides by the image size; Coco keeps pixels.
        let scale = if format.requires_dimensions() {
            match image.dimensions() {
                Some(dimensions) => Some(dimensions),
                None => {
                    sink.record(ConversionIssue::warning(
                        ConversionIssueCode::MissingImageDimensions,
                        &image.file_name,
                        "skipping annotation (missing 'width' or 'height')",
                    ));
                    labels.skipped += 1;
                    continue;
                }
            }
        } else {
            None
        };

        let class_id = category_map.id_of(&annotation.class_name).ok_or_else(|| {
            PrepError::CategoryMapMismatch {
                class_name: annotation.class_name.clone(),
                file_name: image.file_name.clone(),
            }
        })?;

        match (&annotation.geometry, scale) {
            (Geometry::BBox(bbox), Some((w, h))) => {
                labels.lines.push(yolo_bbox_line(class_id, bbox, w, h));
            }
            (Geometry::Polygon(polygon), Some((w, h))) => {
                labels.lines.extend(yolo_polygon_lines(class_id, polygon, w, h));
            }
            (Geometry::BBox(bbox), None) => {
                labels.lines.push(coco_bbox_line(class_id, bbox));
            }
            (Geometry::Polygon(polygon), None) => {
                labels.lines.extend(coco_polygon_lines(class_id, polygon));
            }
        }
    }

    Ok(labels)
}

/// Writes one label file per image of `collection` into `output_dir`.
///
/// The directory is created if needed and existing files are overwritten.
/// Images without annotations get an empty file. A failure partway leaves
/// the files written so far; rerunning rewrites all of them.
pub fn write_label_files(
    collection: &AnnotationCollection,
    opts: &ConvertOptions,
    output_dir: &Path,
    sink: &mut dyn IssueSink,
) -> Result<ConversionSummary, PrepError> {
    fs::create_dir_all(output_dir).map_err(PrepError::Io)?;

    let category_map = CategoryMap::from_collection(collection, opts.id_base);
    sink.record(ConversionIssue::info(
        ConversionIssueCode::CategoryMapping,
        "",
        format!("Category mapping: {category_map}"),
    ));

    let mut summary = ConversionSummary {
        format: opts.format,
        files_written: 0,
        lines_written: 0,
        annotations_skipped: 0,
        category_map,
    };

    for image in &collection.images {
        let Some(stem) = image.stem() else {
            sink.record(ConversionIssue::warning(
                ConversionIssueCode::MissingFileStem,
                &image.file_name,
                "skipping image (file_name has no usable stem)",
            ));
            summary.annotations_skipped += image.annotations.len();
            continue;
        };

        let labels = normalize_image(image, &summary.category_map, opts.format, sink)?;
        let label_path = output_dir.join(format!("{stem}.{LABEL_EXTENSION}"));
        fs::write(&label_path, labels.to_text()).map_err(PrepError::Io)?;

        summary.files_written += 1;
        summary.lines_written += labels.lines.len();
        summary.annotations_skipped += labels.skipped;
    }

    sink.record(ConversionIssue::info(
        ConversionIssueCode::LabelFilesWritten,
        output_dir.display().to_string(),
        format!(
            "created {} .{} file(s) ({} format)",
            summary.files_written,
            LABEL_EXTENSION,
            opts.format.name()
        ),
    ));

    Ok(summary)
}

/// Reads `input` and writes its label files into `output_dir`.
pub fn convert_annotations(
    input: &Path,
    output_dir: &Path,
    opts: &ConvertOptions,
    sink: &mut dyn IssueSink,
) -> Result<ConversionSummary, PrepError> {
    let collection = read_annotation_collection(input)?;
    write_label_files(&collection, opts, output_dir, sink)
}

/// Fuzz-only entrypoint: reads a document and normalizes every image in
/// both layouts.
#[cfg(feature = "fuzzing")]
pub fn fuzz_normalize_document(bytes: &[u8]) -> Result<(), PrepError> {
    let collection = crate::ir::io_annotations::from_annotation_slice(bytes)?;
    let category_map = CategoryMap::from_collection(&collection, IdBase::Zero);
    let mut sink: Vec<ConversionIssue> = Vec::new();

    for image in &collection.images {
        for format in [LabelFormat::Yolo, LabelFormat::Coco] {
            let _ = normalize_image(image, &category_map, format, &mut sink)?.to_text();
        }
    }
    Ok(())
}

fn yolo_bbox_line(class_id: ClassId, bbox: &BBoxXYWH<Pixel>, width: u32, height: u32) -> String {
    let (cx, cy, w, h) = bbox.to_normalized(width as f64, height as f64).to_cxcywh();
    format!("{} {:.6} {:.6} {:.6} {:.6}", class_id, cx, cy, w, h)
}

fn yolo_polygon_lines(
    class_id: ClassId,
    polygon: &Polygon<Pixel>,
    width: u32,
    height: u32,
) -> impl Iterator<Item = String> {
    polygon
        .to_normalized(width as f64, height as f64)
        .points
        .into_iter()
        .map(move |point| format!("{} {:.6} {:.6}", class_id, point.x, point.y))
}

fn coco_bbox_line(class_id: ClassId, bbox: &BBoxXYWH<Pixel>) -> String {
    let [x, y, w, h] = bbox.to_array();
    format!("{} {:.3} {:.3} {:.3} {:.3}", class_id, x, y, w, h)
}

fn coco_polygon_lines(
    class_id: ClassId,
    polygon: &Polygon<Pixel>,
) -> impl Iterator<Item = String> + '_ {
    polygon
        .points
        .iter()
        .map(move |point| format!("{} {:.3} {:.3}", class_id, point.x, point.y))
}
