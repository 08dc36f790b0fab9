//! Integration tests for annotation → label-file conversion.

use std::fs;

use labelprep::conversion::{
    convert_annotations, ConversionIssue, ConversionIssueCode, ConvertOptions, LabelFormat,
};
use labelprep::ir::io_coco_json::{write_coco_json, CocoExportOptions};
use labelprep::ir::io_annotations::read_annotation_collection;
use labelprep::ir::IdBase;
use labelprep::PrepError;

mod common;
use common::write_sample_annotations;

#[test]
fn yolo_labels_match_expected_lines() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("annotations.json");
    let labels = temp.path().join("labels");
    write_sample_annotations(&input);
    let mut sink: Vec<ConversionIssue> = Vec::new();

    let summary = convert_annotations(&input, &labels, &ConvertOptions::default(), &mut sink)
        .expect("convert");

    assert_eq!(summary.files_written, 3);
    assert_eq!(summary.lines_written, 6);
    assert_eq!(summary.annotations_skipped, 1);
    assert_eq!(summary.category_map.to_string(), "{'building': 0, 'lot': 1}");

    assert_eq!(
        fs::read_to_string(labels.join("tile_a.txt")).unwrap(),
        "1 0.200000 0.200000 0.200000 0.200000\n0 0.750000 0.250000 0.500000 0.500000"
    );
    assert_eq!(
        fs::read_to_string(labels.join("tile_b.txt")).unwrap(),
        "1 0.000000 0.000000\n1 0.500000 0.000000\n1 0.500000 0.500000\n1 0.000000 0.500000"
    );
    assert_eq!(fs::read_to_string(labels.join("tile_c.txt")).unwrap(), "");

    let warnings: Vec<_> = sink.iter().filter(|issue| issue.is_warning()).collect();
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].code, ConversionIssueCode::MissingGeometry);
    assert_eq!(warnings[0].context, "tile_b.bmp");
}

#[test]
fn coco_text_variant_writes_absolute_values() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("annotations.json");
    let labels = temp.path().join("labels");
    write_sample_annotations(&input);
    let opts = ConvertOptions {
        format: LabelFormat::Coco,
        id_base: IdBase::One,
    };

    let mut sink: Vec<ConversionIssue> = Vec::new();
    convert_annotations(&input, &labels, &opts, &mut sink).expect("convert");

    assert_eq!(
        fs::read_to_string(labels.join("tile_a.txt")).unwrap(),
        "2 10.000 10.000 20.000 20.000\n1 50.000 0.000 50.000 50.000"
    );
}

#[test]
fn rerun_overwrites_with_identical_output() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("annotations.json");
    let labels = temp.path().join("labels");
    write_sample_annotations(&input);

    let opts = ConvertOptions::default();
    let mut sink: Vec<ConversionIssue> = Vec::new();

    convert_annotations(&input, &labels, &opts, &mut sink).unwrap();
    let first = fs::read_to_string(labels.join("tile_a.txt")).unwrap();
    fs::write(labels.join("tile_a.txt"), "stale").unwrap();
    convert_annotations(&input, &labels, &opts, &mut sink).unwrap();

    assert_eq!(fs::read_to_string(labels.join("tile_a.txt")).unwrap(), first);
}

#[test]
fn unreadable_input_is_fatal() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("annotations.json");
    fs::write(&input, "{\"images\": 3}").unwrap();

    let err = convert_annotations(
        &input,
        &temp.path().join("labels"),
        &ConvertOptions::default(),
        &mut Vec::<ConversionIssue>::new(),
    )
    .unwrap_err();

    assert!(matches!(err, PrepError::AnnotationJsonInvalid { .. }));
    assert!(!temp.path().join("labels").exists());
}

#[test]
fn coco_json_export_from_file() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let input = temp.path().join("annotations.json");
    let output = temp.path().join("coco.json");
    write_sample_annotations(&input);

    let collection = read_annotation_collection(&input).expect("read");
    let summary = write_coco_json(
        &collection,
        &output,
        &CocoExportOptions::default(),
        &mut Vec::<ConversionIssue>::new(),
    )
    .expect("export");

    assert_eq!(summary.images, 3);
    assert_eq!(summary.annotations, 3);
    assert_eq!(summary.categories, 2);

    let coco: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
    assert_eq!(coco["categories"][0]["id"], 1);
    assert_eq!(coco["categories"][0]["name"], "building");
}
