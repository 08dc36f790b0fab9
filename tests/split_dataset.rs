//! Integration tests for splitting and augmentation on real image files.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use image::GenericImageView;
use labelprep::augment::{augment_dataset, AugmentConfig};
use labelprep::conversion::{convert_annotations, ConversionIssue, ConvertOptions};
use labelprep::split::{split_dataset, SplitOptions};

mod common;
use common::{create_sample_project, write_bmp};

fn stems(dir: &Path) -> BTreeSet<String> {
    fs::read_dir(dir)
        .expect("read dir")
        .map(|entry| {
            entry
                .expect("dir entry")
                .path()
                .file_stem()
                .expect("file stem")
                .to_string_lossy()
                .into_owned()
        })
        .collect()
}

#[test]
fn converted_labels_follow_their_images() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    create_sample_project(root);
    convert_annotations(
        &root.join("annotations.json"),
        &root.join("labels"),
        &ConvertOptions::default(),
        &mut Vec::<ConversionIssue>::new(),
    )
    .expect("convert");

    let out = root.join("split");
    let opts = SplitOptions::new(root.join("images"), root.join("labels"), &out, 0.67)
        .with_seed(5)
        .with_extensions(["bmp"]);
    let summary = split_dataset(&opts, &mut Vec::<ConversionIssue>::new()).expect("split");

    assert_eq!(summary.train_images, 2);
    assert_eq!(summary.val_images, 1);
    for part in ["train", "val"] {
        assert_eq!(
            stems(&out.join("images").join(part)),
            stems(&out.join("labels").join(part))
        );
    }
}

#[test]
fn images_without_labels_are_left_out() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    for i in 0..5 {
        write_bmp(&root.join(format!("images/img_{i}.bmp")), 4, 4);
    }
    fs::create_dir_all(root.join("labels")).unwrap();
    fs::write(root.join("labels/img_0.txt"), "0 0.5 0.5 1 1").unwrap();
    let mut sink: Vec<ConversionIssue> = Vec::new();

    let summary = split_dataset(
        &SplitOptions::new(root.join("images"), root.join("labels"), root.join("out"), 0.5),
        &mut sink,
    )
    .expect("split");

    assert_eq!(summary.train_images + summary.val_images, 5);
    assert_eq!(summary.train_copied + summary.val_copied, 1);
    assert_eq!(summary.skipped_without_label, 4);
    assert_eq!(sink.len(), 4);
}

#[test]
fn augmentation_keeps_names_and_sizes() {
    let temp = tempfile::tempdir().expect("create temp dir");
    let root = temp.path();
    write_bmp(&root.join("images/a.bmp"), 12, 8);
    write_bmp(&root.join("images/b.bmp"), 7, 9);
    fs::write(root.join("images/readme.md"), "not an image").unwrap();

    let config: AugmentConfig = serde_yaml::from_str(
        "enable: true\n\
         gamma: { range: [0.8, 1.2] }\n\
         contrast: { range: [0.9, 1.1] }\n\
         zoom: { range: [3, 7] }\n\
         rotation: { range: [-15, 15] }\n\
         flip: {}\n\
         hue_saturation: { h_range: [-5, 5], s_range: [-10, 10], v_range: [-10, 10] }\n",
    )
    .expect("parse config");
    let mut sink: Vec<ConversionIssue> = Vec::new();

    let summary = augment_dataset(
        &root.join("images"),
        &root.join("augmented"),
        &config,
        Some(11),
        &mut sink,
    )
    .expect("augment");

    assert_eq!(summary.written, 2);
    assert_eq!(summary.skipped_unreadable, 1);
    assert_eq!(sink.len(), 1);
    let a = image::open(root.join("augmented/a.bmp")).expect("open a");
    let b = image::open(root.join("augmented/b.bmp")).expect("open b");
    assert_eq!(a.dimensions(), (12, 8));
    assert_eq!(b.dimensions(), (7, 9));
}
