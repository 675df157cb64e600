//! Apply the cartoon effect to every image in a directory.
//!
//! Walks the input directory (non-recursively), runs each supported
//! image through the pipeline, and writes the result next to the
//! original (or into `--output`) with a filename suffix. A failure on
//! one file is logged and the run continues.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use clap::Parser;
use toonify_pipeline::{CartoonConfig, apply_cartoon_effect, resize_to_bounds};
use toonify_presets::{PresetStore, Strictness};
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// File extensions treated as images, lowercase.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "tif", "tiff"];

/// Apply the cartoon effect to every image in a directory.
#[derive(Parser)]
#[command(version)]
struct Args {
    /// Directory containing the images to process.
    input: PathBuf,

    /// Output directory. Defaults to the input directory.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Name of the preset to apply.
    #[arg(short, long, default_value = "default")]
    preset: String,

    /// JSON file with additional presets, overlaid on the built-ins.
    #[arg(long, value_name = "PATH")]
    presets_file: Option<PathBuf>,

    /// Fail on any invalid preset record instead of skipping it.
    #[arg(long)]
    strict: bool,

    /// Maximum output width; larger images are downscaled.
    #[arg(long, default_value_t = 800)]
    max_width: u32,

    /// Maximum output height; larger images are downscaled.
    #[arg(long, default_value_t = 600)]
    max_height: u32,

    /// Suffix appended to the file stem of each output image.
    #[arg(long, default_value = "_cartoon")]
    suffix: String,

    /// Seed for k-means centroid initialization, for reproducible runs.
    #[arg(long)]
    seed: Option<u64>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let args = Args::parse();
    let config = resolve_config(&args)?;

    let output_dir = args.output.clone().unwrap_or_else(|| args.input.clone());
    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("creating output directory {}", output_dir.display()))?;

    let files = image_files(&args.input)?;
    if files.is_empty() {
        warn!(input = %args.input.display(), "no supported images found");
        return Ok(());
    }
    info!(
        count = files.len(),
        preset = %args.preset,
        "processing images"
    );

    let mut processed = 0usize;
    let mut failed = 0usize;
    for path in &files {
        match process_file(path, &output_dir, &args, &config) {
            Ok(destination) => {
                info!(input = %path.display(), output = %destination.display(), "done");
                processed += 1;
            }
            Err(cause) => {
                error!(input = %path.display(), %cause, "failed, continuing");
                failed += 1;
            }
        }
    }

    info!(processed, failed, "batch finished");
    if processed == 0 {
        bail!("all {failed} images failed");
    }
    Ok(())
}

/// Resolve the effective config: named preset, then CLI overrides.
fn resolve_config(args: &Args) -> anyhow::Result<CartoonConfig> {
    let strictness = if args.strict {
        Strictness::Reject
    } else {
        Strictness::Warn
    };
    let store = match &args.presets_file {
        Some(path) if args.strict => PresetStore::load(path, strictness)
            .with_context(|| format!("loading presets from {}", path.display()))?,
        Some(path) => PresetStore::load_or_builtin(path, strictness),
        None => PresetStore::builtin(),
    };

    let mut config = store
        .resolve(&args.preset)
        .with_context(|| format!("resolving preset '{}'", args.preset))?;
    if args.seed.is_some() {
        config.kmeans_seed = args.seed;
    }
    Ok(config)
}

/// Supported image files in `dir`, sorted for a stable processing order.
fn image_files(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let entries = std::fs::read_dir(dir)
        .with_context(|| format!("reading input directory {}", dir.display()))?;

    let mut files = Vec::new();
    for entry in entries {
        let path = entry?.path();
        if path.is_file() && has_image_extension(&path) {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

fn has_image_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
}

/// Process one image and return the path it was written to.
fn process_file(
    path: &Path,
    output_dir: &Path,
    args: &Args,
    config: &CartoonConfig,
) -> anyhow::Result<PathBuf> {
    let image = image::open(path)
        .with_context(|| format!("decoding {}", path.display()))?
        .to_rgb8();
    let image = resize_to_bounds(&image, args.max_width, args.max_height);

    let result = apply_cartoon_effect(&image, config)?;

    let destination = output_path(path, output_dir, &args.suffix)?;
    result
        .cartoon
        .save(&destination)
        .with_context(|| format!("writing {}", destination.display()))?;
    Ok(destination)
}

/// Build `<output_dir>/<stem><suffix>.<ext>` for an input path.
fn output_path(input: &Path, output_dir: &Path, suffix: &str) -> anyhow::Result<PathBuf> {
    let stem = input
        .file_stem()
        .and_then(|stem| stem.to_str())
        .with_context(|| format!("unusable file name {}", input.display()))?;
    let extension = input
        .extension()
        .and_then(|ext| ext.to_str())
        .with_context(|| format!("unusable extension {}", input.display()))?;
    Ok(output_dir.join(format!("{stem}{suffix}.{extension}")))
}
