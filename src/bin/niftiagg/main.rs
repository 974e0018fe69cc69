//! An application for combining a collection of NIfTI-1 volumes into one,
//! by voxel-wise minimum (group masks) or sum.

use clap::Parser;
use nifti_aggregate::{AggregateOptions, OutputType, Reduction};
use std::path::PathBuf;
use std::process;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// the reduction to apply: `min` (alias `mask`) or `sum`
    reduction: Reduction,

    /// a directory of volumes, or a glob pattern matching them
    input: PathBuf,

    /// the output file [default: group_min_mask.nii.gz or image_sum.nii.gz
    /// in the input directory]
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// file name pattern used when the input is a directory
    #[arg(short, long, default_value = nifti_aggregate::DEFAULT_FILE_PATTERN)]
    pattern: String,

    /// write 64-bit floating point voxels instead of 32-bit
    #[arg(long)]
    float64: bool,

    /// fail if an affine differs from the first volume's by more than this
    #[arg(long, value_name = "TOLERANCE")]
    check_affine: Option<f64>,

    /// print more information (repeat for even more)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() {
    let args = Args::parse();

    let default_level = match args.verbose {
        0 => "warn",
        1 => "info",
        _ => "debug",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let mut options = AggregateOptions::new(args.reduction)
        .file_pattern(args.pattern)
        .check_affine(args.check_affine);
    if let Some(output) = args.output {
        options = options.output(output);
    }
    if args.float64 {
        options = options.output_type(OutputType::Float64);
    }

    match options.run(&args.input) {
        Ok(report) => {
            info!(inputs = report.inputs.len(), shape = ?report.shape, "done");
            println!("{}", report.output.display());
        }
        Err(e) => {
            eprintln!("Error! {}", e);
            process::exit(1);
        }
    }
}
