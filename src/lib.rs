//! Labelprep: annotation JSON to training-ready detection datasets.
//!
//! Labelprep turns per-image annotation documents into label files, builds a
//! deterministic class-name → id mapping, optionally augments the images and
//! splits everything into a train/val directory tree.
//!
//! # Modules
//!
//! - [`ir`]: Typed annotation collection, category map and the JSON reader/COCO exporter
//! - [`conversion`]: Label-file normalizer and the issue reporting it uses
//! - [`augment`]: Image augmentation
//! - [`split`]: Train/val splitting and `data.yaml`
//! - [`pipeline`]: YAML-configured run of all stages
//! - [`error`]: Error types for labelprep operations

pub mod augment;
pub mod conversion;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod split;

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};

use conversion::{ConvertOptions, LabelFormat, LogSink};
pub use error::PrepError;
use ir::IdBase;

/// The labelprep CLI application.
#[derive(Parser)]
#[command(name = "labelprep")]
#[command(version, author, about)]
#[command(propagate_version = true)]
struct Cli {
    /// More log output (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    /// Only log errors.
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Option<Commands>,
}

/// Available subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Convert an annotation JSON document into per-image label files.
    Convert(ConvertArgs),
    /// Export an annotation JSON document as COCO detection JSON.
    CocoJson(CocoJsonArgs),
    /// Split images and labels into train/val directories.
    Split(SplitArgs),
    /// Augment every image in a directory.
    Augment(AugmentArgs),
    /// Run the stages enabled in a pipeline YAML file.
    Run(RunArgs),
}

#[derive(clap::Args)]
struct ConvertArgs {
    /// Annotation JSON file.
    input: PathBuf,

    /// Directory the label files are written to.
    #[arg(short, long)]
    output: PathBuf,

    /// Label layout ('yolo' or 'coco').
    #[arg(long, default_value = "yolo")]
    format: String,

    /// First class id (0 or 1).
    #[arg(long, default_value_t = 0)]
    id_base: u8,
}

#[derive(clap::Args)]
struct CocoJsonArgs {
    /// Annotation JSON file.
    input: PathBuf,

    /// COCO JSON file to write.
    #[arg(short, long)]
    output: PathBuf,

    /// Description stored in the 'info' block.
    #[arg(long)]
    description: Option<String>,
}

#[derive(clap::Args)]
struct SplitArgs {
    /// Directory with the source images.
    #[arg(long)]
    images: PathBuf,

    /// Directory with one '<stem>.txt' label file per image.
    #[arg(long)]
    labels: PathBuf,

    /// Root of the train/val tree.
    #[arg(short, long)]
    output: PathBuf,

    /// Share of images that go to train, strictly between 0 and 1.
    #[arg(long)]
    ratio: f64,

    /// Seed for a reproducible shuffle.
    #[arg(long)]
    seed: Option<u64>,

    /// Image extensions to pick up (comma separated).
    #[arg(long = "ext", value_delimiter = ',')]
    extensions: Vec<String>,

    /// Also write data.yaml with class names from this annotation JSON.
    #[arg(long)]
    data_yaml_from: Option<PathBuf>,

    /// First class id used in the label files (0 or 1).
    #[arg(long, default_value_t = 0)]
    id_base: u8,
}

#[derive(clap::Args)]
struct AugmentArgs {
    /// Directory with the source images.
    input: PathBuf,

    /// Directory augmented images are written to.
    #[arg(short, long)]
    output: PathBuf,

    /// Augmentation settings (YAML).
    #[arg(short, long)]
    config: PathBuf,

    /// Seed for reproducible augmentation.
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(clap::Args)]
struct RunArgs {
    /// Pipeline configuration (YAML).
    #[arg(short, long)]
    config: PathBuf,
}

/// Run the labelprep CLI.
///
/// This is the main entry point for the CLI, called from `main.rs`.
pub fn run() -> Result<(), PrepError> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Some(Commands::Convert(args)) => run_convert(args),
        Some(Commands::CocoJson(args)) => run_coco_json(args),
        Some(Commands::Split(args)) => run_split(args),
        Some(Commands::Augment(args)) => run_augment(args),
        Some(Commands::Run(args)) => run_pipeline(args),
        None => {
            // No subcommand: just print help hint and exit successfully
            println!("labelprep {}", env!("CARGO_PKG_VERSION"));
            println!();
            println!("Annotation JSON to training-ready detection datasets.");
            println!();
            println!("Run 'labelprep --help' for usage information.");
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let level = match (quiet, verbose) {
        (true, _) => "error",
        (false, 0) => "info",
        (false, 1) => "debug",
        (false, _) => "trace",
    };
    let _ = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}

fn parse_id_base(raw: u8) -> Result<IdBase, PrepError> {
    IdBase::try_from(raw).map_err(|message| PrepError::InvalidConfig { message })
}

/// Execute the convert subcommand.
fn run_convert(args: ConvertArgs) -> Result<(), PrepError> {
    let opts = ConvertOptions {
        format: args.format.parse::<LabelFormat>()?,
        id_base: parse_id_base(args.id_base)?,
    };

    let summary = conversion::convert_annotations(&args.input, &args.output, &opts, &mut LogSink)?;

    println!("Converted {} -> {}", args.input.display(), args.output.display());
    print!("{}", summary);
    Ok(())
}

/// Execute the coco-json subcommand.
fn run_coco_json(args: CocoJsonArgs) -> Result<(), PrepError> {
    let collection = ir::io_annotations::read_annotation_collection(&args.input)?;

    let mut opts = ir::io_coco_json::CocoExportOptions::default();
    if let Some(description) = args.description {
        opts.description = description;
    }

    let summary =
        ir::io_coco_json::write_coco_json(&collection, &args.output, &opts, &mut LogSink)?;

    println!("Wrote {}", args.output.display());
    println!("  Total images: {}", summary.images);
    println!("  Total annotations: {}", summary.annotations);
    println!("  Total categories: {}", summary.categories);
    if summary.images_skipped > 0 {
        println!("  Images skipped (no size): {}", summary.images_skipped);
    }
    Ok(())
}

/// Execute the split subcommand.
fn run_split(args: SplitArgs) -> Result<(), PrepError> {
    let id_base = parse_id_base(args.id_base)?;

    let mut opts = split::SplitOptions::new(&args.images, &args.labels, &args.output, args.ratio);
    opts.seed = args.seed;
    if !args.extensions.is_empty() {
        opts = opts.with_extensions(args.extensions);
    }

    let summary = split::split_dataset(&opts, &mut LogSink)?;
    println!("{}", summary);

    if let Some(annotations) = args.data_yaml_from {
        let collection = ir::io_annotations::read_annotation_collection(&annotations)?;
        let category_map = ir::CategoryMap::from_collection(&collection, id_base);
        let path = split::write_data_yaml(&args.output, &category_map)?;
        println!("Wrote {}", path.display());
    }
    Ok(())
}

/// Execute the augment subcommand.
fn run_augment(args: AugmentArgs) -> Result<(), PrepError> {
    let config = augment::AugmentConfig::from_path(&args.config)?;

    let summary =
        augment::augment_dataset(&args.input, &args.output, &config, args.seed, &mut LogSink)?;

    println!(
        "Augmented {} image(s) into {}",
        summary.written,
        args.output.display()
    );
    if summary.skipped_unreadable > 0 {
        println!("  {} unreadable file(s) skipped", summary.skipped_unreadable);
    }
    Ok(())
}

/// Execute the run subcommand.
fn run_pipeline(args: RunArgs) -> Result<(), PrepError> {
    let config = pipeline::PipelineConfig::from_path(&args.config)?;
    let summary = pipeline::run_pipeline(&config, &mut LogSink)?;
    print!("{}", summary);
    Ok(())
}
