//! The complete aggregation pipeline, configured through a builder.
//!
//! [`AggregateOptions`] chains the three stages of an aggregation:
//! discovery of the input files, loading and validation of each volume while
//! folding it into the result, and writing the result next to the inputs (or
//! wherever requested).
//!
//! [`AggregateOptions`]: ./struct.AggregateOptions.html

use crate::discover::{discover_inputs, exclude_path, input_pattern, DEFAULT_FILE_PATTERN};
use crate::error::{AggregateError, Result};
use crate::reduce::{aggregate_with, Aggregate, Aggregator, Reduction};
use crate::volume::load_volumes;
use crate::writer::{write_aggregate, OutputType};
use std::path::{Path, PathBuf};
use tracing::{info, info_span};

/// Options and flags which can be used to configure how a collection of
/// volumes is aggregated.
///
/// # Example
///
/// ```no_run
/// use nifti_aggregate::{AggregateOptions, Reduction};
///
/// let report = AggregateOptions::new(Reduction::Sum)
///     .output("/data/image_sum.nii.gz")
///     .run("/data/sim.*p-High.gt.Low.nii.gz")?;
/// println!("summed {} volumes", report.inputs.len());
/// # Ok::<(), nifti_aggregate::AggregateError>(())
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateOptions {
    reduction: Reduction,
    file_pattern: String,
    output: Option<PathBuf>,
    output_type: OutputType,
    affine_tolerance: Option<f64>,
}

/// Outcome of a completed aggregation.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregateReport {
    /// The reduction applied.
    pub reduction: Reduction,
    /// The volumes folded in, in order. The first lent its header.
    pub inputs: Vec<PathBuf>,
    /// The written file.
    pub output: PathBuf,
    /// Spatial shape of the result.
    pub shape: [usize; 3],
}

impl AggregateOptions {
    /// Options for the given reduction, with default settings: `*.nii.gz`
    /// files, `FLOAT32` output named after the reduction, no affine check.
    pub fn new(reduction: Reduction) -> Self {
        AggregateOptions {
            reduction,
            file_pattern: DEFAULT_FILE_PATTERN.to_string(),
            output: None,
            output_type: OutputType::default(),
            affine_tolerance: None,
        }
    }

    /// File name pattern used when the input is a directory.
    pub fn file_pattern<S: Into<String>>(mut self, pattern: S) -> Self {
        self.file_pattern = pattern.into();
        self
    }

    /// Write the result to this path instead of the default location.
    pub fn output<P: Into<PathBuf>>(mut self, path: P) -> Self {
        self.output = Some(path.into());
        self
    }

    /// Element type of the written volume.
    pub fn output_type(mut self, output_type: OutputType) -> Self {
        self.output_type = output_type;
        self
    }

    /// Reject volumes whose affine is not within `tolerance` of the first
    /// volume's affine. `None` (the default) disables the check.
    pub fn check_affine(mut self, tolerance: Option<f64>) -> Self {
        self.affine_tolerance = tolerance;
        self
    }

    /// The file the result of aggregating `input` is written to.
    ///
    /// Without an explicit output this is the reduction's default file name
    /// (`group_min_mask.nii.gz` or `image_sum.nii.gz`) inside the input
    /// directory, or inside the deepest existing directory of the input
    /// pattern.
    pub fn output_path<P: AsRef<Path>>(&self, input: P) -> PathBuf {
        if let Some(output) = &self.output {
            return output.clone();
        }
        let input = input.as_ref();
        let base = if input.is_dir() {
            input
        } else {
            input
                .ancestors()
                .skip(1)
                .find(|dir| !dir.as_os_str().is_empty() && dir.is_dir())
                .unwrap_or_else(|| Path::new("."))
        };
        base.join(self.reduction.default_output_name())
    }

    /// Find the input volumes, leaving out the output file.
    pub fn discover<P: AsRef<Path>>(&self, input: P) -> Result<Vec<PathBuf>> {
        let input = input.as_ref();
        let mut paths = discover_inputs(input, &self.file_pattern)?;
        exclude_path(&mut paths, self.output_path(input));
        if paths.is_empty() {
            return Err(AggregateError::NoInputFiles(Some(input_pattern(
                input,
                &self.file_pattern,
            ))));
        }
        info!(count = paths.len(), "discovered input volumes");
        Ok(paths)
    }

    /// Discover and reduce the input volumes without writing anything.
    pub fn aggregate<P: AsRef<Path>>(&self, input: P) -> Result<Aggregate> {
        let paths = self.discover(input)?;
        self.aggregate_paths(&paths)
    }

    /// Run the whole pipeline: discover, load, reduce and write.
    pub fn run<P: AsRef<Path>>(&self, input: P) -> Result<AggregateReport> {
        let input = input.as_ref();
        let span = info_span!("aggregate", reduction = %self.reduction, input = %input.display());
        let _enter = span.enter();
        let inputs = self.discover(input)?;
        let result = self.aggregate_paths(&inputs)?;
        let output = self.output_path(input);
        write_aggregate(&result, &output, self.output_type)?;
        Ok(AggregateReport {
            reduction: self.reduction,
            inputs,
            output,
            shape: result.shape(),
        })
    }

    fn aggregate_paths(&self, paths: &[PathBuf]) -> Result<Aggregate> {
        let aggregator = Aggregator::new(self.reduction).check_affine(self.affine_tolerance);
        aggregate_with(aggregator, load_volumes(paths))
    }
}

/// Intersect all `*.nii.gz` masks in `mask_dir` by voxel-wise minimum, into
/// `mask_dir/group_min_mask.nii.gz`. Returns the written path.
pub fn create_group_mask<P: AsRef<Path>>(mask_dir: P) -> Result<PathBuf> {
    AggregateOptions::new(Reduction::Minimum)
        .run(mask_dir)
        .map(|report| report.output)
}

/// Sum all volumes matching `pattern` (or all `*.nii.gz` files, if it is a
/// directory) into `output`.
pub fn sum_images<P, Q>(pattern: P, output: Q) -> Result<PathBuf>
where
    P: AsRef<Path>,
    Q: Into<PathBuf>,
{
    AggregateOptions::new(Reduction::Sum)
        .output(output)
        .run(pattern)
        .map(|report| report.output)
}
