//! One entry point for the whole preparation run.
//!
//! Stages run in a fixed order, each behind its own flag:
//!
//! 1. label conversion (`data.convert`, format from `data.labeltype`),
//! 2. augmentation (`augment.enable`),
//! 3. train/val split (`split.enable`), followed by `data.yaml`.
//!
//! When augmentation runs, the split reads the augmented images.

mod config;

pub use config::{AugmentSection, DataSection, PipelineConfig, SplitSection};

use std::fmt;
use std::path::PathBuf;

use crate::augment::{augment_dataset, AugmentSummary};
use crate::conversion::{
    convert_annotations, ConversionIssue, ConversionIssueCode, ConversionSummary, ConvertOptions,
    IssueSink,
};
use crate::error::PrepError;
use crate::split::{split_dataset, write_data_yaml, SplitOptions, SplitSummary};

/// What each stage did. Stages that were switched off stay empty.
#[derive(Clone, Debug, Default)]
pub struct PipelineSummary {
    pub conversions: Vec<(PathBuf, ConversionSummary)>,
    pub augment: Option<AugmentSummary>,
    pub split: Option<SplitSummary>,
    pub data_yaml: Option<PathBuf>,
}

impl fmt::Display for PipelineSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (input, summary) in &self.conversions {
            writeln!(f, "Converted {}:", input.display())?;
            write!(f, "{summary}")?;
        }
        if let Some(augment) = &self.augment {
            writeln!(
                f,
                "Augmented {} image(s), {} unreadable",
                augment.written, augment.skipped_unreadable
            )?;
        }
        if let Some(split) = &self.split {
            writeln!(f, "{split}")?;
        }
        if let Some(path) = &self.data_yaml {
            writeln!(f, "Wrote {}", path.display())?;
        }
        Ok(())
    }
}

/// Runs every enabled stage of `config`.
///
/// The first fatal error stops the run; files already written stay.
pub fn run_pipeline(
    config: &PipelineConfig,
    sink: &mut dyn IssueSink,
) -> Result<PipelineSummary, PrepError> {
    config.validate()?;
    let mut summary = PipelineSummary::default();

    if config.data.convert {
        let opts = ConvertOptions {
            format: config.data.labeltype,
            id_base: config.data.id_base,
        };
        for input in &config.data.annotations {
            log::info!("Converting {}", input.display());
            let converted = convert_annotations(input, &config.data.labels, &opts, sink)?;
            summary.conversions.push((input.clone(), converted));
        }
        warn_on_differing_maps(&summary.conversions, sink);
    }

    let mut split_images = config.data.images.clone();
    if config.augment.settings.enable {
        if let Some(output) = &config.augment.output {
            summary.augment = Some(augment_dataset(
                &config.data.images,
                output,
                &config.augment.settings,
                config.augment.seed,
                sink,
            )?);
            split_images = output.clone();
        }
    }

    if config.split.enable {
        let mut opts = SplitOptions::new(
            split_images,
            &config.data.labels,
            &config.split.output,
            config.split.ratio,
        )
        .with_extensions(config.split.extensions.iter().cloned());
        opts.seed = config.split.seed;

        summary.split = Some(split_dataset(&opts, sink)?);

        if config.split.data_yaml {
            if let Some((_, first)) = summary.conversions.first() {
                summary.data_yaml =
                    Some(write_data_yaml(&config.split.output, &first.category_map)?);
            }
        }
    }

    Ok(summary)
}

/// Several documents written into one label directory each number their own
/// classes; ids only line up if the class sets agree.
fn warn_on_differing_maps(conversions: &[(PathBuf, ConversionSummary)], sink: &mut dyn IssueSink) {
    let Some((first_path, first)) = conversions.first() else {
        return;
    };
    for (path, summary) in &conversions[1..] {
        if summary.category_map != first.category_map {
            sink.record(ConversionIssue::warning(
                ConversionIssueCode::CategoryMapsDiffer,
                path.display().to_string(),
                format!(
                    "category mapping {} differs from {} in {}; class ids in the shared label directory are not comparable",
                    summary.category_map,
                    first.category_map,
                    first_path.display()
                ),
            ));
        }
    }
}
