//! Annotation JSON reader.
//!
//! Two document shapes are accepted:
//!
//! ```json
//! {"images": [{"file_name": "a.tif", "width": 640, "height": 480,
//!              "annotations": [{"class": "lot", "bbox": [10, 10, 20, 20]}]}]}
//! ```
//!
//! and the older bare form, where the document itself is the image list.
//!
//! Problems with the document as a whole (bad JSON, `images` not a list, an
//! image without `file_name`) are fatal. Problems with a single annotation
//! are not: the annotation becomes an [`AnnotationEntry::Skipped`] and the
//! normalizer warns about it later.

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

use super::model::{Annotation, AnnotationCollection, AnnotationEntry, ImageRecord, SkipReason};
use super::polygon::Polygon;
use super::space::Pixel;
use crate::error::PrepError;

/// Reads an annotation document from disk.
///
/// # Errors
/// Returns an error if the file cannot be opened, is not JSON, or does not
/// have the shape of an image list.
pub fn read_annotation_collection(path: &Path) -> Result<AnnotationCollection, PrepError> {
    let file = File::open(path).map_err(PrepError::Io)?;
    let reader = BufReader::new(file);

    let document: Value =
        serde_json::from_reader(reader).map_err(|source| PrepError::AnnotationJsonParse {
            path: path.to_path_buf(),
            source,
        })?;

    collection_from_value(document).map_err(|message| PrepError::AnnotationJsonInvalid {
        path: path.to_path_buf(),
        message,
    })
}

/// Reads an annotation document from a string.
///
/// Useful for testing without file I/O.
pub fn from_annotation_str(json: &str) -> Result<AnnotationCollection, PrepError> {
    from_annotation_slice(json.as_bytes())
}

/// Reads an annotation document from raw bytes.
pub fn from_annotation_slice(bytes: &[u8]) -> Result<AnnotationCollection, PrepError> {
    let path = PathBuf::from("<memory>");
    let document: Value =
        serde_json::from_slice(bytes).map_err(|source| PrepError::AnnotationJsonParse {
            path: path.clone(),
            source,
        })?;

    collection_from_value(document)
        .map_err(|message| PrepError::AnnotationJsonInvalid { path, message })
}

fn collection_from_value(document: Value) -> Result<AnnotationCollection, String> {
    let entries = match document {
        Value::Array(entries) => entries,
        Value::Object(mut root) => match root.remove("images") {
            Some(Value::Array(entries)) => entries,
            Some(_) => return Err("'images' should be a list".to_string()),
            None => return Err("missing top-level 'images' key".to_string()),
        },
        _ => {
            return Err(
                "expected an object with an 'images' list or a bare list of images".to_string(),
            )
        }
    };

    let images = entries
        .iter()
        .enumerate()
        .map(|(index, entry)| image_from_value(index, entry))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(AnnotationCollection::new(images))
}

fn image_from_value(index: usize, value: &Value) -> Result<ImageRecord, String> {
    let fields = value
        .as_object()
        .ok_or_else(|| format!("images[{index}] is not an object"))?;

    let file_name = fields
        .get("file_name")
        .and_then(Value::as_str)
        .ok_or_else(|| format!("images[{index}] is missing 'file_name'"))?;

    let annotations = match fields.get("annotations") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(raw)) => raw.iter().map(annotation_from_value).collect(),
        Some(_) => return Err(format!("'annotations' of {file_name} should be a list")),
    };

    Ok(ImageRecord {
        file_name: file_name.to_string(),
        width: dimension(fields, "width"),
        height: dimension(fields, "height"),
        annotations,
    })
}

/// A positive integral dimension, tolerating `640.0`.
fn dimension(fields: &Map<String, Value>, key: &str) -> Option<u32> {
    let value = fields.get(key)?;
    let raw = value.as_u64().or_else(|| {
        value
            .as_f64()
            .filter(|v| v.fract() == 0.0 && *v >= 0.0)
            .map(|v| v as u64)
    })?;
    u32::try_from(raw).ok().filter(|v| *v > 0)
}

fn annotation_from_value(value: &Value) -> AnnotationEntry {
    let Some(fields) = value.as_object() else {
        return AnnotationEntry::Skipped {
            class_name: None,
            reason: SkipReason::NotAnObject,
        };
    };

    let class_name = fields
        .get("class")
        .or_else(|| fields.get("class_name"))
        .and_then(Value::as_str)
        .map(str::to_string);

    let Some(class_name) = class_name else {
        return AnnotationEntry::Skipped {
            class_name: None,
            reason: SkipReason::MissingClassName,
        };
    };

    // bbox wins when both are given
    let parsed = match (present(fields, "bbox"), present(fields, "segmentation")) {
        (Some(raw), _) => {
            parse_bbox(raw).map(|[x, y, w, h]| Annotation::bbox(&*class_name, x, y, w, h))
        }
        (None, Some(raw)) => {
            parse_segmentation(raw).map(|polygon| Annotation::polygon(&*class_name, polygon))
        }
        (None, None) => {
            return AnnotationEntry::Skipped {
                class_name: Some(class_name),
                reason: SkipReason::MissingGeometry,
            }
        }
    };

    match parsed {
        Ok(annotation) => AnnotationEntry::Valid(annotation),
        Err(detail) => AnnotationEntry::Skipped {
            class_name: Some(class_name),
            reason: SkipReason::InvalidGeometry(detail),
        },
    }
}

fn present<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a Value> {
    fields.get(key).filter(|value| !value.is_null())
}

fn parse_bbox(raw: &Value) -> Result<[f64; 4], String> {
    let values = raw
        .as_array()
        .ok_or_else(|| "'bbox' is not a list".to_string())?;
    if values.len() != 4 {
        return Err(format!("'bbox' has {} values, expected 4", values.len()));
    }
    let mut out = [0.0; 4];
    for (slot, value) in out.iter_mut().zip(values) {
        *slot = number(value, "bbox")?;
    }
    Ok(out)
}

/// Accepts a flat `[x, y, ...]` list or COCO's list of rings.
fn parse_segmentation(raw: &Value) -> Result<Polygon<Pixel>, String> {
    let values = raw
        .as_array()
        .ok_or_else(|| "'segmentation' is not a list".to_string())?;
    if values.is_empty() {
        return Err("'segmentation' is empty".to_string());
    }

    let flat: Vec<f64> = if values.iter().all(Value::is_array) {
        let mut flat = Vec::new();
        for (index, ring) in values.iter().filter_map(Value::as_array).enumerate() {
            // pairs never span two rings
            if ring.is_empty() || ring.len() % 2 != 0 {
                return Err(format!(
                    "'segmentation' ring {index} has {} values, expected a non-empty even count",
                    ring.len()
                ));
            }
            for value in ring {
                flat.push(number(value, "segmentation")?);
            }
        }
        flat
    } else {
        values
            .iter()
            .map(|value| number(value, "segmentation"))
            .collect::<Result<_, _>>()?
    };

    Polygon::from_flat(&flat)
}

fn number(value: &Value, field: &str) -> Result<f64, String> {
    value
        .as_f64()
        .ok_or_else(|| format!("'{field}' contains non-numeric value {value}"))
}
