//! Train/validation splitting of an image + label directory pair.
//!
//! Image files are listed, sorted by name, shuffled (seeded when asked) and
//! cut at `floor(len * ratio)`. The first part goes to `train`, the rest to
//! `val`, in the usual YOLO layout:
//!
//! ```text
//! <output_root>/
//!   images/train/  images/val/
//!   labels/train/  labels/val/
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use rand::seq::SliceRandom;
use rand::{rngs::StdRng, SeedableRng};
use walkdir::WalkDir;

use crate::conversion::{ConversionIssue, ConversionIssueCode, IssueSink};
use crate::error::PrepError;
use crate::ir::CategoryMap;

/// Image extensions picked up when none are configured.
pub const DEFAULT_IMAGE_EXTENSIONS: &[&str] = &["tif", "tiff", "jpg", "jpeg", "png", "bmp"];

const LABEL_EXTENSION: &str = "txt";

/// One of the two output partitions.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SplitPart {
    Train,
    Val,
}

impl SplitPart {
    pub fn dir_name(&self) -> &'static str {
        match self {
            SplitPart::Train => "train",
            SplitPart::Val => "val",
        }
    }
}

/// Split options.
#[derive(Clone, Debug)]
pub struct SplitOptions {
    pub image_dir: PathBuf,
    pub label_dir: PathBuf,
    pub output_root: PathBuf,
    /// Share of images that go to `train`; strictly between 0 and 1.
    pub ratio: f64,
    pub seed: Option<u64>,
    /// Matched case-insensitively, without the leading dot.
    pub extensions: Vec<String>,
}

impl SplitOptions {
    pub fn new(
        image_dir: impl Into<PathBuf>,
        label_dir: impl Into<PathBuf>,
        output_root: impl Into<PathBuf>,
        ratio: f64,
    ) -> Self {
        Self {
            image_dir: image_dir.into(),
            label_dir: label_dir.into(),
            output_root: output_root.into(),
            ratio,
            seed: None,
            extensions: DEFAULT_IMAGE_EXTENSIONS
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_extensions<I, S>(mut self, extensions: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extensions = extensions.into_iter().map(Into::into).collect();
        self
    }
}

/// Outcome of a split.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SplitSummary {
    /// Images assigned to `train`, copied or not.
    pub train_images: usize,
    pub val_images: usize,
    pub train_copied: usize,
    pub val_copied: usize,
    pub skipped_without_label: usize,
}

impl std::fmt::Display for SplitSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Split complete. Train: {} images, Val: {} images.",
            self.train_images, self.val_images
        )?;
        if self.skipped_without_label > 0 {
            write!(f, " ({} without label skipped)", self.skipped_without_label)?;
        }
        Ok(())
    }
}

/// Validate split options before touching the filesystem.
pub fn validate_split_options(opts: &SplitOptions) -> Result<(), PrepError> {
    if !(opts.ratio > 0.0 && opts.ratio < 1.0) {
        return Err(PrepError::InvalidSplitRatio(opts.ratio));
    }
    if !opts.image_dir.is_dir() {
        return Err(PrepError::MissingDirectory {
            path: opts.image_dir.clone(),
            role: "Image",
        });
    }
    if !opts.label_dir.is_dir() {
        return Err(PrepError::MissingDirectory {
            path: opts.label_dir.clone(),
            role: "Label",
        });
    }
    Ok(())
}

/// Splits `opts.image_dir` and copies images with their labels.
///
/// Images without a matching `<stem>.txt` in `opts.label_dir` are reported
/// to `sink` and not copied; they still count toward their partition.
pub fn split_dataset(
    opts: &SplitOptions,
    sink: &mut dyn IssueSink,
) -> Result<SplitSummary, PrepError> {
    validate_split_options(opts)?;

    let mut images = collect_image_files(&opts.image_dir, &opts.extensions)?;
    shuffle_files(&mut images, opts.seed);

    let split_index = split_index(images.len(), opts.ratio);
    let (train, val) = images.split_at(split_index);

    for part in [SplitPart::Train, SplitPart::Val] {
        for kind in ["images", "labels"] {
            fs::create_dir_all(opts.output_root.join(kind).join(part.dir_name()))
                .map_err(PrepError::Io)?;
        }
    }

    let mut summary = SplitSummary {
        train_images: train.len(),
        val_images: val.len(),
        ..Default::default()
    };

    let (train_copied, train_skipped) = copy_part(train, SplitPart::Train, opts, sink)?;
    let (val_copied, val_skipped) = copy_part(val, SplitPart::Val, opts, sink)?;
    summary.train_copied = train_copied;
    summary.val_copied = val_copied;
    summary.skipped_without_label = train_skipped + val_skipped;

    log::info!("{summary}");
    Ok(summary)
}

/// `floor(len * ratio)`, the number of images that go to `train`.
pub fn split_index(len: usize, ratio: f64) -> usize {
    ((len as f64 * ratio).floor() as usize).min(len)
}

/// Image files directly inside `dir`, sorted by file name.
pub fn collect_image_files(dir: &Path, extensions: &[String]) -> Result<Vec<PathBuf>, PrepError> {
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        let entry = entry.map_err(|source| PrepError::Io(source.into()))?;
        if entry.file_type().is_file() && has_extension(entry.path(), extensions) {
            files.push(entry.into_path());
        }
    }

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}

/// Shuffles in place; a seed makes the order reproducible.
pub fn shuffle_files(files: &mut [PathBuf], seed: Option<u64>) {
    if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        files.shuffle(&mut rng);
    } else {
        let mut rng = rand::rng();
        files.shuffle(&mut rng);
    }
}

fn has_extension(path: &Path, allowed: &[String]) -> bool {
    let Some(ext) = path.extension().and_then(|ext| ext.to_str()) else {
        return false;
    };

    allowed
        .iter()
        .any(|allowed_ext| ext.eq_ignore_ascii_case(allowed_ext.trim_start_matches('.')))
}

fn copy_part(
    images: &[PathBuf],
    part: SplitPart,
    opts: &SplitOptions,
    sink: &mut dyn IssueSink,
) -> Result<(usize, usize), PrepError> {
    let image_dest = opts.output_root.join("images").join(part.dir_name());
    let label_dest = opts.output_root.join("labels").join(part.dir_name());
    let (mut copied, mut skipped) = (0, 0);

    for image_path in images {
        let (Some(file_name), Some(stem)) = (image_path.file_name(), image_path.file_stem())
        else {
            continue;
        };

        let label_name = format!("{}.{}", stem.to_string_lossy(), LABEL_EXTENSION);
        let label_path = opts.label_dir.join(&label_name);
        if !label_path.is_file() {
            sink.record(ConversionIssue::warning(
                ConversionIssueCode::MissingLabelFile,
                file_name.to_string_lossy(),
                "No label found, skipping.",
            ));
            skipped += 1;
            continue;
        }

        fs::copy(image_path, image_dest.join(file_name)).map_err(PrepError::Io)?;
        fs::copy(&label_path, label_dest.join(&label_name)).map_err(PrepError::Io)?;
        copied += 1;
    }

    Ok((copied, skipped))
}

/// Writes `<output_root>/data.yaml` for a YOLO trainer.
///
/// Class names are listed under the ids the label files use.
pub fn write_data_yaml(
    output_root: &Path,
    category_map: &CategoryMap,
) -> Result<PathBuf, PrepError> {
    let mut yaml = format!(
        "path: {}\ntrain: images/train\nval: images/val\nnc: {}\nnames:\n",
        yaml_single_quoted(&output_root.to_string_lossy()),
        category_map.len()
    );
    for (name, id) in category_map.iter() {
        yaml.push_str(&format!("  {}: {}\n", id, yaml_single_quoted(name)));
    }

    fs::create_dir_all(output_root).map_err(PrepError::Io)?;
    let path = output_root.join("data.yaml");
    fs::write(&path, yaml).map_err(PrepError::Io)?;
    Ok(path)
}

fn yaml_single_quoted(raw: &str) -> String {
    format!("'{}'", raw.replace('\'', "''"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::IdBase;
    use std::collections::BTreeSet;

    fn create_pairs(root: &Path, count: usize) -> (PathBuf, PathBuf) {
        let images = root.join("images");
        let labels = root.join("labels");
        fs::create_dir_all(&images).expect("create images dir");
        fs::create_dir_all(&labels).expect("create labels dir");
        for i in 0..count {
            fs::write(images.join(format!("tile_{i:02}.tif")), b"img").expect("write image");
            fs::write(labels.join(format!("tile_{i:02}.txt")), "0 0.5 0.5 0.1 0.1")
                .expect("write label");
        }
        (images, labels)
    }

    fn stems(dir: &Path) -> BTreeSet<String> {
        fs::read_dir(dir)
            .expect("read dir")
            .map(|entry| {
                entry
                    .expect("dir entry")
                    .path()
                    .file_stem()
                    .expect("stem")
                    .to_string_lossy()
                    .into_owned()
            })
            .collect()
    }

    #[test]
    fn ten_images_at_point_eight_give_eight_and_two() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images, labels) = create_pairs(temp.path(), 10);
        let out = temp.path().join("out");
        let opts = SplitOptions::new(&images, &labels, &out, 0.8).with_seed(42);

        let summary = split_dataset(&opts, &mut Vec::<ConversionIssue>::new()).expect("split");

        assert_eq!(summary.train_images, 8);
        assert_eq!(summary.val_images, 2);
        assert_eq!(summary.train_copied + summary.val_copied, 10);
        for part in ["train", "val"] {
            assert_eq!(
                stems(&out.join("images").join(part)),
                stems(&out.join("labels").join(part))
            );
        }
        let train = stems(&out.join("images/train"));
        let val = stems(&out.join("images/val"));
        assert!(train.is_disjoint(&val));
    }

    #[test]
    fn same_seed_same_partition() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images, labels) = create_pairs(temp.path(), 12);

        let first = temp.path().join("first");
        let second = temp.path().join("second");
        split_dataset(
            &SplitOptions::new(&images, &labels, &first, 0.5).with_seed(7),
            &mut Vec::<ConversionIssue>::new(),
        )
        .unwrap();
        split_dataset(
            &SplitOptions::new(&images, &labels, &second, 0.5).with_seed(7),
            &mut Vec::<ConversionIssue>::new(),
        )
        .unwrap();

        assert_eq!(
            stems(&first.join("images/train")),
            stems(&second.join("images/train"))
        );
    }

    #[test]
    fn ratio_bounds_are_rejected_before_copying() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images, labels) = create_pairs(temp.path(), 2);
        let out = temp.path().join("out");

        for ratio in [0.0, 1.0, -0.5, 1.5, f64::NAN] {
            let err = split_dataset(
                &SplitOptions::new(&images, &labels, &out, ratio),
                &mut Vec::<ConversionIssue>::new(),
            )
            .unwrap_err();
            assert!(matches!(err, PrepError::InvalidSplitRatio(_)));
        }
        assert!(!out.exists());
    }

    #[test]
    fn missing_label_dir_is_fatal() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images, _) = create_pairs(temp.path(), 1);

        let err = split_dataset(
            &SplitOptions::new(&images, temp.path().join("nope"), temp.path().join("out"), 0.5),
            &mut Vec::<ConversionIssue>::new(),
        )
        .unwrap_err();

        assert!(err.to_string().contains("Label directory"));
    }

    #[test]
    fn missing_label_is_warned_and_skipped() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let (images, labels) = create_pairs(temp.path(), 4);
        fs::remove_file(labels.join("tile_00.txt")).expect("remove label");
        let mut sink: Vec<ConversionIssue> = Vec::new();

        let summary = split_dataset(
            &SplitOptions::new(&images, &labels, temp.path().join("out"), 0.5).with_seed(1),
            &mut sink,
        )
        .unwrap();

        assert_eq!(summary.skipped_without_label, 1);
        assert_eq!(summary.train_copied + summary.val_copied, 3);
        assert_eq!(sink.len(), 1);
        assert_eq!(sink[0].code, ConversionIssueCode::MissingLabelFile);
        assert_eq!(sink[0].context, "tile_00.tif");
    }

    #[test]
    fn only_top_level_files_with_listed_extensions() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let dir = temp.path();
        fs::write(dir.join("b.TIF"), b"").unwrap();
        fs::write(dir.join("a.png"), b"").unwrap();
        fs::write(dir.join("notes.txt"), b"").unwrap();
        fs::create_dir_all(dir.join("nested")).unwrap();
        fs::write(dir.join("nested/c.tif"), b"").unwrap();

        let files = collect_image_files(dir, &["tif".to_string(), "png".to_string()]).unwrap();
        let names: Vec<_> = files
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();

        assert_eq!(names, vec!["a.png", "b.TIF"]);
    }

    #[test]
    fn split_index_floors() {
        assert_eq!(split_index(10, 0.8), 8);
        assert_eq!(split_index(3, 0.5), 1);
        assert_eq!(split_index(0, 0.5), 0);
    }

    #[test]
    fn data_yaml_lists_names_by_id() {
        let temp = tempfile::tempdir().expect("create temp dir");
        let map = CategoryMap::from_names(["lot", "o'hare"], IdBase::Zero);

        let path = write_data_yaml(temp.path(), &map).unwrap();
        let yaml = fs::read_to_string(path).unwrap();

        assert!(yaml.contains("train: images/train\n"));
        assert!(yaml.contains("nc: 2\n"));
        assert!(yaml.contains("  0: 'lot'\n"));
        assert!(yaml.contains("  1: 'o''hare'\n"));
    }
}
