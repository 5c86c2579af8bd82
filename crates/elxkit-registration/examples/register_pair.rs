//! Register a moving image to a fixed image and resample a second image
//! with the resulting transform.
//!
//! 1. Optionally normalize both images to the uint8 range
//! 2. Run elastix with a parameter file
//! 3. Rewrite fields of the transform (e.g. nearest neighbour for labels)
//! 4. Run transformix on the image to resample
//!
//! Usage:
//!   cargo run --example register_pair -- \
//!       --fixed fixed.nii.gz --moving moving.nii.gz \
//!       --parameters Parameters.Affine.txt --output results \
//!       --resample labels.nii.gz --set FinalBSplineInterpolationOrder=0

use anyhow::{bail, Context, Result};
use clap::Parser;
use elxkit_core::ScalarKind;
use elxkit_io::{modify_parameters, normalize_nifti};
use elxkit_registration::{Elastix, EngineConfig, OutputTarget, Transformix};
use std::path::PathBuf;
use tracing::info;

#[derive(Parser)]
#[command(name = "register_pair")]
#[command(about = "Register an image pair with elastix and resample with transformix")]
struct Cli {
    /// Fixed (reference) image
    #[arg(long)]
    fixed: PathBuf,

    /// Moving image
    #[arg(long)]
    moving: PathBuf,

    /// Elastix parameter file
    #[arg(short, long)]
    parameters: PathBuf,

    /// Output file (.nii, .nii.gz, .img) or directory
    #[arg(short, long, default_value = "results")]
    output: PathBuf,

    /// Image to resample with the computed transform
    #[arg(long)]
    resample: Option<PathBuf>,

    /// Transform fields to overwrite before resampling, as KEY=VALUE
    #[arg(long = "set", value_name = "KEY=VALUE")]
    fields: Vec<String>,

    /// Normalize fixed and moving images to uint8 before registering
    #[arg(long)]
    normalize: bool,

    /// Number of engine threads
    #[arg(long)]
    threads: Option<usize>,

    /// Keep the engines' raw output in res_tmp
    #[arg(short, long)]
    keep: bool,
}

fn parse_field(field: &str) -> Result<(String, String)> {
    match field.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => bail!("Expected KEY=VALUE, got {}", field),
    }
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();

    let mut config = EngineConfig::from_env();
    if let Some(threads) = cli.threads {
        config = config.with_threads(threads);
    }

    let target = OutputTarget::infer(&cli.output);
    let (mut fixed, mut moving) = (cli.fixed.clone(), cli.moving.clone());

    if cli.normalize {
        let dir = target.output_dir().join("normalized");
        std::fs::create_dir_all(&dir)?;
        let fixed_norm = dir.join(cli.fixed.file_name().context("Fixed image has no file name")?);
        let moving_norm = dir.join(cli.moving.file_name().context("Moving image has no file name")?);
        normalize_nifti(&fixed, &fixed_norm, Some(255.0), Some(ScalarKind::U8))?;
        normalize_nifti(&moving, &moving_norm, Some(255.0), Some(ScalarKind::U8))?;
        fixed = fixed_norm;
        moving = moving_norm;
    }

    let transform = Elastix::new(config.clone())
        .register(&fixed, &moving, &target, &cli.parameters, cli.keep)
        .context("Registration failed")?;
    info!("Transform parameters: {}", transform.display());

    if !cli.fields.is_empty() {
        let fields = cli.fields.iter().map(|f| parse_field(f)).collect::<Result<Vec<_>>>()?;
        modify_parameters(fields.as_slice(), &transform, None)?;
    }

    if let Some(resample) = &cli.resample {
        let resample_target = OutputTarget::directory(target.output_dir().join("resampled"));
        let image = Transformix::new(config)
            .apply(resample, &resample_target, &transform, cli.keep)
            .context("Transform application failed")?;
        info!("Resampled image: {}", image.display());
    }

    Ok(())
}
