//! Photometric and geometric image augmentation.
//!
//! [`AugmentParams::sample`] draws concrete values from an
//! [`AugmentConfig`]; [`augment_image`] applies them in a fixed order:
//! gamma, contrast, zoom, rotation, flip, then hue/saturation/value.
//! Every operation keeps the image size.
//!
//! Label files are not touched. Geometric operations therefore only suit
//! datasets whose labels are regenerated or tolerant of the change.

mod config;

pub use config::{AugmentConfig, FlipSetting, HueSaturationSetting, RangeSetting, ValueRange};

use std::fs;
use std::path::{Path, PathBuf};

use image::imageops::{self, FilterType};
use image::{DynamicImage, Rgb, RgbImage};
use imageproc::geometric_transformations::{rotate_about_center, Interpolation};
use rand::{rngs::StdRng, Rng, SeedableRng};
use walkdir::WalkDir;

use crate::conversion::{ConversionIssue, ConversionIssueCode, IssueSink};
use crate::error::PrepError;

/// Concrete values for one image. `None` leaves a step out.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct AugmentParams {
    pub gamma: Option<f64>,
    pub contrast: Option<f64>,
    /// Scale factor, already mapped from the configured value.
    pub zoom: Option<f64>,
    /// Degrees, counter-clockwise.
    pub rotation: Option<f64>,
    pub flip_horizontal: bool,
    pub flip_vertical: bool,
    pub hsv_shift: Option<HsvShift>,
}

/// Additive shifts in 8-bit HSV units (hue in `0..180`).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HsvShift {
    pub h: f64,
    pub s: f64,
    pub v: f64,
}

impl AugmentParams {
    /// Draws one set of values. A disabled config yields the identity.
    ///
    /// # Errors
    /// [`PrepError::InvalidAugmentConfig`] for unordered or non-finite ranges.
    pub fn sample<R: Rng + ?Sized>(config: &AugmentConfig, rng: &mut R) -> Result<Self, PrepError> {
        config.validate()?;
        if !config.enable {
            return Ok(Self::default());
        }

        let mut params = Self {
            gamma: config.gamma.map(|s| draw(rng, s.range)),
            contrast: config.contrast.map(|s| draw(rng, s.range)),
            zoom: config.zoom.map(|s| 1.0 + (draw(rng, s.range) - 5.0) / 10.0),
            rotation: config.rotation.map(|s| draw(rng, s.range)),
            ..Self::default()
        };

        if let Some(flip) = config.flip {
            params.flip_horizontal = draw(rng, flip.horizontal) > 0.5;
            params.flip_vertical = draw(rng, flip.vertical) > 0.5;
        }

        params.hsv_shift = config.hue_saturation.map(|hs| HsvShift {
            h: draw(rng, hs.h_range),
            s: draw(rng, hs.s_range),
            v: draw(rng, hs.v_range),
        });

        Ok(params)
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::default()
    }
}

fn draw<R: Rng + ?Sized>(rng: &mut R, [min, max]: ValueRange) -> f64 {
    if min == max {
        min
    } else {
        rng.random_range(min..=max)
    }
}

/// Applies `params` to `image`.
///
/// The identity returns the input untouched; otherwise the result is 8-bit
/// RGB, which every output encoder accepts.
pub fn augment_image(image: DynamicImage, params: &AugmentParams) -> DynamicImage {
    if params.is_identity() {
        return image;
    }

    let mut rgb = image.to_rgb8();

    if let Some(gamma) = params.gamma {
        apply_gamma(&mut rgb, gamma);
    }
    if let Some(contrast) = params.contrast {
        apply_contrast(&mut rgb, contrast);
    }
    if let Some(zoom) = params.zoom {
        rgb = apply_zoom(&rgb, zoom);
    }
    if let Some(angle) = params.rotation {
        rgb = apply_rotation(&rgb, angle);
    }
    if params.flip_horizontal {
        imageops::flip_horizontal_in_place(&mut rgb);
    }
    if params.flip_vertical {
        imageops::flip_vertical_in_place(&mut rgb);
    }
    if let Some(shift) = params.hsv_shift {
        apply_hsv_shift(&mut rgb, shift);
    }

    DynamicImage::ImageRgb8(rgb)
}

fn apply_gamma(image: &mut RgbImage, gamma: f64) {
    let inv_gamma = 1.0 / gamma.max(0.001);
    let table: Vec<u8> = (0..256)
        .map(|i| ((i as f64 / 255.0).powf(inv_gamma) * 255.0).round().clamp(0.0, 255.0) as u8)
        .collect();
    for value in image.iter_mut() {
        *value = table[*value as usize];
    }
}

/// Stretches every channel value away from the global mean.
fn apply_contrast(image: &mut RgbImage, contrast: f64) {
    let count = image.as_raw().len();
    if count == 0 {
        return;
    }
    let mean = image.iter().map(|&v| v as f64).sum::<f64>() / count as f64;
    for value in image.iter_mut() {
        *value = ((*value as f64 - mean) * contrast + mean).round().clamp(0.0, 255.0) as u8;
    }
}

/// Scales about the center, then crops or reflect-pads back to size.
fn apply_zoom(image: &RgbImage, factor: f64) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }
    let new_width = ((width as f64 * factor) as u32).max(1);
    let new_height = ((height as f64 * factor) as u32).max(1);
    if (new_width, new_height) == (width, height) {
        return image.clone();
    }

    let scaled = imageops::resize(image, new_width, new_height, FilterType::Triangle);

    if factor > 1.0 {
        let x = new_width.saturating_sub(width) / 2;
        let y = new_height.saturating_sub(height) / 2;
        return imageops::crop_imm(&scaled, x, y, width.min(new_width), height.min(new_height))
            .to_image();
    }

    let pad_x = width.saturating_sub(new_width) as i64 / 2;
    let pad_y = height.saturating_sub(new_height) as i64 / 2;
    RgbImage::from_fn(width, height, |x, y| {
        let sx = reflect(x as i64 - pad_x, new_width as i64);
        let sy = reflect(y as i64 - pad_y, new_height as i64);
        *scaled.get_pixel(sx, sy)
    })
}

/// Rotates counter-clockwise about the center. Corners the rotation
/// exposes are filled from the mirrored image edge.
fn apply_rotation(image: &RgbImage, degrees: f64) -> RgbImage {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return image.clone();
    }

    // Every corner of the rotated window samples inside this margin.
    let pad = width.max(height);
    let padded = RgbImage::from_fn(width + 2 * pad, height + 2 * pad, |x, y| {
        let sx = reflect(x as i64 - pad as i64, width as i64);
        let sy = reflect(y as i64 - pad as i64, height as i64);
        *image.get_pixel(sx, sy)
    });

    // rotate_about_center turns clockwise for positive angles.
    let rotated = rotate_about_center(
        &padded,
        -(degrees.to_radians() as f32),
        Interpolation::Bilinear,
        Rgb([0, 0, 0]),
    );
    imageops::crop_imm(&rotated, pad, pad, width, height).to_image()
}

/// Mirror index with the edge repeated: `cba|abcd|dcb`.
fn reflect(index: i64, len: i64) -> u32 {
    if len <= 1 {
        return 0;
    }
    let period = 2 * len;
    let m = index.rem_euclid(period);
    (if m < len { m } else { period - 1 - m }) as u32
}

fn apply_hsv_shift(image: &mut RgbImage, shift: HsvShift) {
    for pixel in image.pixels_mut() {
        let [r, g, b] = pixel.0;
        let (h, s, v) = rgb_to_hsv(r, g, b);
        let h = (h + shift.h).rem_euclid(180.0);
        let s = (s + shift.s).clamp(0.0, 255.0);
        let v = (v + shift.v).clamp(0.0, 255.0);
        pixel.0 = hsv_to_rgb(h, s, v);
    }
}

/// 8-bit HSV: hue in `0..180`, saturation and value in `0..=255`.
fn rgb_to_hsv(r: u8, g: u8, b: u8) -> (f64, f64, f64) {
    let (r, g, b) = (r as f64, g as f64, b as f64);
    let max = r.max(g).max(b);
    let min = r.min(g).min(b);
    let delta = max - min;

    let s = if max > 0.0 { delta / max * 255.0 } else { 0.0 };
    let h = if delta == 0.0 {
        0.0
    } else if max == r {
        60.0 * ((g - b) / delta)
    } else if max == g {
        60.0 * ((b - r) / delta) + 120.0
    } else {
        60.0 * ((r - g) / delta) + 240.0
    };

    (h.rem_euclid(360.0) / 2.0, s, max)
}

fn hsv_to_rgb(h: f64, s: f64, v: f64) -> [u8; 3] {
    let s = s / 255.0;
    let c = v * s;
    let h_prime = (h * 2.0) / 60.0;
    let x = c * (1.0 - (h_prime.rem_euclid(2.0) - 1.0).abs());
    let (r, g, b) = match h_prime as u32 {
        0 => (c, x, 0.0),
        1 => (x, c, 0.0),
        2 => (0.0, c, x),
        3 => (0.0, x, c),
        4 => (x, 0.0, c),
        _ => (c, 0.0, x),
    };
    let m = v - c;
    let to_u8 = |channel: f64| (channel + m).round().clamp(0.0, 255.0) as u8;
    [to_u8(r), to_u8(g), to_u8(b)]
}

/// Outcome of [`augment_dataset`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct AugmentSummary {
    pub written: usize,
    pub skipped_unreadable: usize,
}

/// Augments every file directly in `input_dir` into `output_dir`.
///
/// Output files keep their input names, so the encoder follows the
/// extension. Files that do not decode as images are reported to `sink`
/// and skipped.
pub fn augment_dataset(
    input_dir: &Path,
    output_dir: &Path,
    config: &AugmentConfig,
    seed: Option<u64>,
    sink: &mut dyn IssueSink,
) -> Result<AugmentSummary, PrepError> {
    config.validate()?;
    if !input_dir.is_dir() {
        return Err(PrepError::MissingDirectory {
            path: input_dir.to_path_buf(),
            role: "Input",
        });
    }
    fs::create_dir_all(output_dir).map_err(PrepError::Io)?;

    let files = list_files(input_dir)?;

    let summary = if let Some(seed) = seed {
        let mut rng = StdRng::seed_from_u64(seed);
        augment_files(&files, output_dir, config, &mut rng, sink)?
    } else {
        let mut rng = rand::rng();
        augment_files(&files, output_dir, config, &mut rng, sink)?
    };

    log::info!(
        "Augmentation complete. {} image(s) saved to {}",
        summary.written,
        output_dir.display()
    );
    Ok(summary)
}

fn list_files(dir: &Path) -> Result<Vec<PathBuf>, PrepError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|source| PrepError::Io(source.into()))?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

fn augment_files<R: Rng + ?Sized>(
    files: &[PathBuf],
    output_dir: &Path,
    config: &AugmentConfig,
    rng: &mut R,
    sink: &mut dyn IssueSink,
) -> Result<AugmentSummary, PrepError> {
    let mut summary = AugmentSummary::default();

    for path in files {
        let Some(file_name) = path.file_name() else {
            continue;
        };

        let image = match image::open(path) {
            Ok(image) => image,
            Err(err) => {
                sink.record(ConversionIssue::warning(
                    ConversionIssueCode::UnreadableImage,
                    path.display().to_string(),
                    format!("could not read image ({err})"),
                ));
                summary.skipped_unreadable += 1;
                continue;
            }
        };

        let params = AugmentParams::sample(config, rng)?;
        log::debug!("{}: {:?}", path.display(), params);

        let save_path = output_dir.join(file_name);
        augment_image(image, &params)
            .save(&save_path)
            .map_err(|source| PrepError::ImageWrite {
                path: save_path.clone(),
                source,
            })?;
        summary.written += 1;
    }

    Ok(summary)
}
