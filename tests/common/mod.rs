#![allow(dead_code)]

use std::fs;
use std::path::Path;

pub fn bmp_bytes(width: u32, height: u32) -> Vec<u8> {
    let row_stride = (width * 3).div_ceil(4) * 4;
    let pixel_array_size = row_stride * height;
    let file_size = 54 + pixel_array_size;

    let mut bytes = Vec::with_capacity(file_size as usize);
    bytes.extend_from_slice(b"BM");
    bytes.extend_from_slice(&file_size.to_le_bytes());
    bytes.extend_from_slice(&[0, 0, 0, 0]);
    bytes.extend_from_slice(&54u32.to_le_bytes());

    bytes.extend_from_slice(&40u32.to_le_bytes());
    bytes.extend_from_slice(&(width as i32).to_le_bytes());
    bytes.extend_from_slice(&(height as i32).to_le_bytes());
    bytes.extend_from_slice(&1u16.to_le_bytes());
    bytes.extend_from_slice(&24u16.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&pixel_array_size.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&2835u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());
    bytes.extend_from_slice(&0u32.to_le_bytes());

    bytes.resize(file_size as usize, 0);
    bytes
}

pub fn write_bmp(path: &Path, width: u32, height: u32) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, bmp_bytes(width, height)).expect("write bmp file");
}

/// Three tiles: two boxes, one polygon, one tile without annotations and
/// one malformed annotation.
pub const SAMPLE_ANNOTATIONS: &str = r#"{
  "images": [
    {
      "file_name": "tile_a.bmp",
      "width": 100,
      "height": 100,
      "annotations": [
        {"class": "lot", "bbox": [10, 10, 20, 20]},
        {"class": "building", "bbox": [50, 0, 50, 50]}
      ]
    },
    {
      "file_name": "tile_b.bmp",
      "width": 200,
      "height": 100,
      "annotations": [
        {"class": "lot", "segmentation": [0, 0, 100, 0, 100, 50, 0, 50]},
        {"class": "lot"}
      ]
    },
    {
      "file_name": "tile_c.bmp",
      "width": 50,
      "height": 50,
      "annotations": []
    }
  ]
}"#;

pub fn write_sample_annotations(path: &Path) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).expect("create parent dir");
    }
    fs::write(path, SAMPLE_ANNOTATIONS).expect("write annotations");
}

/// Writes the sample annotations plus a matching image per tile.
pub fn create_sample_project(root: &Path) {
    write_sample_annotations(&root.join("annotations.json"));
    for name in ["tile_a", "tile_b", "tile_c"] {
        write_bmp(&root.join("images").join(format!("{name}.bmp")), 8, 6);
    }
}
