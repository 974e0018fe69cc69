//! Voxel-wise reduction of volume collections.
//!
//! Two equivalent routes are offered. [`Aggregator`] folds volumes into a
//! running result one at a time, holding a single input in memory besides
//! the result; this is what [`aggregate`] and the higher level API use.
//! [`stack`] and [`Reduction::reduce_stack`] instead materialise the whole
//! collection as a 4D array with the collection on the last axis, for
//! callers which need the stack itself.
//!
//! Both reductions are commutative, so the order of the volumes only decides
//! which one lends its header and affine to the result (the first).
//!
//! [`Aggregator`]: ./struct.Aggregator.html
//! [`aggregate`]: ./fn.aggregate.html
//! [`stack`]: ./fn.stack.html
//! [`Reduction::reduce_stack`]: ./enum.Reduction.html#method.reduce_stack

use crate::error::{AggregateError, Result};
use crate::volume::{load_volumes, Volume};
use approx::AbsDiffEq;
use nalgebra::Matrix4;
use ndarray::{Array3, Array4, ArrayView3, Axis, Zip};
use nifti::NiftiHeader;
use std::error::Error;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

/// The voxel-wise operation collapsing a collection into one volume.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum Reduction {
    /// Numeric minimum. On 0/1 masks this is the intersection: a voxel stays
    /// positive only if it is positive in every input. A NaN in any input
    /// makes the voxel NaN.
    Minimum,
    /// Arithmetic sum.
    Sum,
}

impl Reduction {
    /// Combine an accumulated voxel value with the next one.
    #[inline]
    pub fn apply(self, acc: f64, value: f64) -> f64 {
        match self {
            Reduction::Minimum if acc.is_nan() || value.is_nan() => f64::NAN,
            Reduction::Minimum => acc.min(value),
            Reduction::Sum => acc + value,
        }
    }

    /// Short name, as accepted by `from_str`.
    pub fn name(self) -> &'static str {
        match self {
            Reduction::Minimum => "min",
            Reduction::Sum => "sum",
        }
    }

    /// File name of the output when none is given.
    pub fn default_output_name(self) -> &'static str {
        match self {
            Reduction::Minimum => "group_min_mask.nii.gz",
            Reduction::Sum => "image_sum.nii.gz",
        }
    }

    /// Reduce a stack of volumes along its last axis.
    ///
    /// # Example
    ///
    /// ```
    /// use ndarray::{Array3, Array4};
    /// use nifti_aggregate::Reduction;
    ///
    /// let stack = Array4::from_shape_vec((1, 1, 1, 2), vec![3.0, 4.5])?;
    /// let sum = Reduction::Sum.reduce_stack(&stack)?;
    /// assert_eq!(sum, Array3::from_elem((1, 1, 1), 7.5));
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn reduce_stack(self, stack: &Array4<f64>) -> Result<Array3<f64>> {
        let mut volumes = stack.axis_iter(Axis(3));
        let mut acc = match volumes.next() {
            Some(first) => first.to_owned(),
            None => return Err(AggregateError::NoInputFiles(None)),
        };
        for volume in volumes {
            self.fold_into(&mut acc, volume);
        }
        Ok(acc)
    }

    fn fold_into(self, acc: &mut Array3<f64>, volume: ArrayView3<f64>) {
        Zip::from(acc)
            .and(volume)
            .for_each(|a, &v| *a = self.apply(*a, v));
    }
}

impl fmt::Display for Reduction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Reduction {
    type Err = ParseReductionError;

    fn from_str(s: &str) -> ::std::result::Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "min" | "minimum" | "mask" => Ok(Reduction::Minimum),
            "sum" => Ok(Reduction::Sum),
            _ => Err(ParseReductionError(s.to_string())),
        }
    }
}

/// Error returned when parsing an unknown reduction name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseReductionError(String);

impl fmt::Display for ParseReductionError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "unknown reduction `{}` (expected `min` or `sum`)", self.0)
    }
}

impl Error for ParseReductionError {}

/// The result of reducing a volume collection.
#[derive(Debug, Clone, PartialEq)]
pub struct Aggregate {
    reduction: Reduction,
    count: usize,
    data: Array3<f64>,
    affine: Matrix4<f64>,
    header: NiftiHeader,
    reference: PathBuf,
}

impl Aggregate {
    /// The reduction which produced this result.
    pub fn reduction(&self) -> Reduction {
        self.reduction
    }

    /// Number of volumes folded in.
    pub fn count(&self) -> usize {
        self.count
    }

    /// The reduced voxel values.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// The spatial shape of the result.
    pub fn shape(&self) -> [usize; 3] {
        let (x, y, z) = self.data.dim();
        [x, y, z]
    }

    /// Affine of the first volume.
    pub fn affine(&self) -> &Matrix4<f64> {
        &self.affine
    }

    /// Header of the first volume.
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// Path of the first volume.
    pub fn reference(&self) -> &Path {
        &self.reference
    }

    /// Move the voxel values out, discarding the metadata.
    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    fn fold(&mut self, volume: Volume, affine_tolerance: Option<f64>) -> Result<()> {
        let expected = self.shape();
        if volume.shape() != expected {
            return Err(AggregateError::ShapeMismatch(
                volume.path().to_owned(),
                expected,
                volume.shape(),
            ));
        }
        if let Some(tolerance) = affine_tolerance {
            if !self.affine.abs_diff_eq(volume.affine(), tolerance) {
                let difference = (self.affine - volume.affine()).amax();
                return Err(AggregateError::AffineMismatch(
                    volume.path().to_owned(),
                    difference,
                ));
            }
        }

        self.reduction.fold_into(&mut self.data, volume.data().view());
        self.count += 1;
        debug!(path = %volume.path().display(), count = self.count, "folded volume");
        Ok(())
    }
}

/// Incremental reduction over volumes of identical shape.
///
/// # Example
///
/// ```
/// use ndarray::Array3;
/// use nifti::NiftiHeader;
/// use nifti_aggregate::{Aggregator, Reduction, Volume};
///
/// let mut aggregator = Aggregator::new(Reduction::Minimum);
/// for (name, value) in &[("a.nii", 1.), ("b.nii", 0.)] {
///     let data = Array3::from_elem((2, 2, 1), *value);
///     aggregator.push(Volume::from_parts(*name, data, NiftiHeader::default()))?;
/// }
/// let mask = aggregator.finish()?;
/// assert_eq!(mask.count(), 2);
/// assert!(mask.data().iter().all(|&v| v == 0.));
/// # Ok::<(), nifti_aggregate::AggregateError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Aggregator {
    reduction: Reduction,
    affine_tolerance: Option<f64>,
    state: Option<Aggregate>,
}

impl Aggregator {
    /// Start an empty aggregation.
    pub fn new(reduction: Reduction) -> Self {
        Aggregator {
            reduction,
            affine_tolerance: None,
            state: None,
        }
    }

    /// Also require every volume's affine to match the first volume's
    /// within `tolerance` (absolute, per element). Unchecked by default.
    pub fn check_affine(mut self, tolerance: Option<f64>) -> Self {
        self.affine_tolerance = tolerance;
        self
    }

    /// Number of volumes folded in so far.
    pub fn count(&self) -> usize {
        self.state.as_ref().map_or(0, |s| s.count)
    }

    /// Fold the next volume into the running result.
    ///
    /// The first volume pushed defines the expected shape and lends its
    /// header and affine to the result.
    pub fn push(&mut self, volume: Volume) -> Result<()> {
        match self.state.as_mut() {
            Some(acc) => acc.fold(volume, self.affine_tolerance),
            None => {
                debug!(path = %volume.path().display(), "first volume");
                let (reference, data, affine, header) = volume.into_parts();
                self.state = Some(Aggregate {
                    reduction: self.reduction,
                    count: 1,
                    data,
                    affine,
                    header,
                    reference,
                });
                Ok(())
            }
        }
    }

    /// Conclude the aggregation. Fails with `NoInputFiles` if no volume was
    /// pushed.
    pub fn finish(self) -> Result<Aggregate> {
        self.state.ok_or(AggregateError::NoInputFiles(None))
    }
}

/// Reduce a collection of volumes, stopping at the first error.
///
/// Volumes are consumed one at a time, so a lazy source such as
/// [`load_volumes`] keeps at most one input in memory.
///
/// [`load_volumes`]: ../volume/fn.load_volumes.html
pub fn aggregate<I>(volumes: I, reduction: Reduction) -> Result<Aggregate>
where
    I: IntoIterator<Item = Result<Volume>>,
{
    aggregate_with(Aggregator::new(reduction), volumes)
}

/// Reduce a collection of volumes with a configured aggregator.
pub fn aggregate_with<I>(mut aggregator: Aggregator, volumes: I) -> Result<Aggregate>
where
    I: IntoIterator<Item = Result<Volume>>,
{
    for volume in volumes {
        aggregator.push(volume?)?;
    }
    aggregator.finish()
}

/// Load and reduce the volumes at the given paths, in order.
pub fn aggregate_paths<I>(paths: I, reduction: Reduction) -> Result<Aggregate>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    aggregate(load_volumes(paths), reduction)
}

/// Stack a collection into a single 4D array, with the collection indexed by
/// the last axis.
pub fn stack(volumes: &[Volume]) -> Result<Array4<f64>> {
    let first = match volumes.first() {
        Some(first) => first,
        None => return Err(AggregateError::NoInputFiles(None)),
    };
    let [x, y, z] = first.shape();
    if let Some(odd) = volumes.iter().find(|v| v.shape() != first.shape()) {
        return Err(AggregateError::ShapeMismatch(
            odd.path().to_owned(),
            first.shape(),
            odd.shape(),
        ));
    }

    let mut stacked = Array4::zeros((x, y, z, volumes.len()));
    for (mut slot, volume) in stacked.axis_iter_mut(Axis(3)).zip(volumes) {
        slot.assign(volume.data());
    }
    Ok(stacked)
}
