//! Loading of NIfTI-1 files into in-memory spatial volumes.
//!
//! A [`Volume`] is a 3D array of voxel values, already scaled by the
//! header's `scl_slope` and `scl_inter`, together with the affine transform
//! mapping voxel indices to scanner coordinates. The header it was read
//! from is retained, since the first volume of a collection lends its
//! spatial metadata to the aggregate.
//!
//! Files with more than three dimensions are accepted when every axis past
//! the third has length 1, which is how some tools save single volumes.
//!
//! [`Volume`]: ./struct.Volume.html

use crate::error::{AggregateError, Result};
use nalgebra::Matrix4;
use ndarray::{Array3, ArrayD, Axis, Ix3};
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::{Path, PathBuf};
use tracing::debug;

/// A spatial volume read from a NIfTI-1 file.
#[derive(Debug, Clone, PartialEq)]
pub struct Volume {
    path: PathBuf,
    data: Array3<f64>,
    affine: Matrix4<f64>,
    header: NiftiHeader,
}

impl Volume {
    /// Read a volume from the given file (`.nii` or `.nii.gz`).
    ///
    /// # Example
    ///
    /// ```no_run
    /// use nifti_aggregate::Volume;
    ///
    /// let volume = Volume::from_file("masks/sub-01.nii.gz")?;
    /// println!("{:?}", volume.shape());
    /// # Ok::<(), nifti_aggregate::AggregateError>(())
    /// ```
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Volume> {
        let path = path.as_ref();
        let obj = ReaderOptions::new()
            .read_file(path)
            .map_err(|e| AggregateError::Load(path.to_owned(), e))?;
        let header = obj.header().clone();
        let data = obj
            .into_volume()
            .into_ndarray::<f64>()
            .map_err(|e| AggregateError::Load(path.to_owned(), e))?;
        let volume = Volume::from_parts(path, into_spatial(path, data)?, header);
        debug!(path = %path.display(), shape = ?volume.shape(), "loaded volume");
        Ok(volume)
    }

    /// Assemble a volume from data already in memory. The affine is derived
    /// from `header` (sform if set, else qform, else the pixdim scaling).
    pub fn from_parts<P>(path: P, data: Array3<f64>, header: NiftiHeader) -> Volume
    where
        P: Into<PathBuf>,
    {
        let affine = header.affine::<f64>();
        Volume {
            path: path.into(),
            data,
            affine,
            header,
        }
    }

    /// The file this volume was read from.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The spatial shape of the volume.
    pub fn shape(&self) -> [usize; 3] {
        let (x, y, z) = self.data.dim();
        [x, y, z]
    }

    /// The voxel values.
    pub fn data(&self) -> &Array3<f64> {
        &self.data
    }

    /// The voxel-to-scanner affine transform.
    pub fn affine(&self) -> &Matrix4<f64> {
        &self.affine
    }

    /// The header the volume was read with.
    pub fn header(&self) -> &NiftiHeader {
        &self.header
    }

    /// Move the voxel values out, discarding the metadata.
    pub fn into_data(self) -> Array3<f64> {
        self.data
    }

    pub(crate) fn into_parts(self) -> (PathBuf, Array3<f64>, Matrix4<f64>, NiftiHeader) {
        (self.path, self.data, self.affine, self.header)
    }
}

/// Read a single volume. Same as [`Volume::from_file`].
///
/// [`Volume::from_file`]: ./struct.Volume.html#method.from_file
pub fn load_volume<P: AsRef<Path>>(path: P) -> Result<Volume> {
    Volume::from_file(path)
}

/// Lazily read the volumes at the given paths, in order.
///
/// Volumes are only loaded as the iterator is consumed, so that a fold over
/// it holds one input volume at a time.
pub fn load_volumes<I>(paths: I) -> impl Iterator<Item = Result<Volume>>
where
    I: IntoIterator,
    I::Item: AsRef<Path>,
{
    paths.into_iter().map(load_volume)
}

/// Drop trailing singleton axes and check that three spatial axes remain.
fn into_spatial(path: &Path, data: ArrayD<f64>) -> Result<Array3<f64>> {
    let shape = data.shape().to_vec();
    if shape.len() < 3 || shape[3..].iter().any(|&d| d != 1) {
        return Err(AggregateError::Dimensionality(path.to_owned(), shape));
    }

    let mut data = data;
    while data.ndim() > 3 {
        let last = data.ndim() - 1;
        data = data.index_axis_move(Axis(last), 0);
    }
    data.into_dimensionality::<Ix3>()
        .map_err(|_| AggregateError::Dimensionality(path.to_owned(), shape))
}
