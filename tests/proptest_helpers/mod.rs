#![allow(dead_code)]

use std::collections::BTreeSet;

use labelprep::ir::{Annotation, AnnotationCollection, ImageRecord, Polygon};
use proptest::prelude::*;
use proptest::strategy::BoxedStrategy;
use proptest::test_runner::{Config as ProptestConfig, FileFailurePersistence};

pub fn proptest_config() -> ProptestConfig {
    let cases = std::env::var("PROPTEST_CASES")
        .ok()
        .and_then(|v| v.parse::<u32>().ok())
        .unwrap_or(64);

    let mut config = ProptestConfig::with_failure_persistence(FileFailurePersistence::WithSource(
        "proptest-regressions",
    ));
    config.cases = cases;
    config.max_shrink_iters = 1024;
    config
}

pub fn arb_class_name() -> BoxedStrategy<String> {
    prop_oneof![
        Just("lot".to_string()),
        Just("building".to_string()),
        Just("Road".to_string()),
        "[a-z]{1,6}",
    ]
    .boxed()
}

/// A box that lies inside a `width` × `height` image.
pub fn arb_bbox_annotation(width: u32, height: u32) -> BoxedStrategy<Annotation> {
    let (w, h) = (width as f64, height as f64);
    (arb_class_name(), 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64, 0.0..1.0f64)
        .prop_map(move |(class, x, y, bw, bh)| {
            let x = x * w;
            let y = y * h;
            Annotation::bbox(class, x, y, bw * (w - x), bh * (h - y))
        })
        .boxed()
}

pub fn arb_polygon_annotation(width: u32, height: u32) -> BoxedStrategy<Annotation> {
    let (w, h) = (width as f64, height as f64);
    (
        arb_class_name(),
        prop::collection::vec((0.0..=1.0f64, 0.0..=1.0f64), 3..8),
    )
        .prop_map(move |(class, points)| {
            let flat: Vec<f64> = points
                .into_iter()
                .flat_map(|(x, y)| [x * w, y * h])
                .collect();
            let polygon = Polygon::from_flat(&flat).expect("even length");
            Annotation::polygon(class, polygon)
        })
        .boxed()
}

pub fn arb_image(index: usize, max_annotations: usize) -> BoxedStrategy<ImageRecord> {
    (1u32..2000, 1u32..2000)
        .prop_flat_map(move |(width, height)| {
            let annotation = prop_oneof![
                3 => arb_bbox_annotation(width, height),
                1 => arb_polygon_annotation(width, height),
            ];
            prop::collection::vec(annotation, 0..=max_annotations).prop_map(move |annotations| {
                annotations.into_iter().fold(
                    ImageRecord::new(format!("tile_{index:04}.tif")).with_size(width, height),
                    |image, annotation| image.with_annotation(annotation),
                )
            })
        })
        .boxed()
}

pub fn arb_collection(
    max_images: usize,
    max_annotations: usize,
) -> BoxedStrategy<AnnotationCollection> {
    (0..=max_images)
        .prop_flat_map(move |count| {
            (0..count)
                .map(|index| arb_image(index, max_annotations))
                .collect::<Vec<_>>()
        })
        .prop_map(AnnotationCollection::new)
        .boxed()
}

pub fn distinct_class_names(collection: &AnnotationCollection) -> BTreeSet<String> {
    collection.class_names().map(str::to_string).collect()
}
