//! Writing aggregate volumes to NIfTI-1 files.
//!
//! The output header is the first input's header with the data related
//! fields (`dim`, `datatype`, `bitpix`) replaced by the writer, the
//! intensity scaling reset, and a description of the aggregation. The
//! qform and sform fields are kept verbatim, so the output has exactly the
//! affine of the first input.

use crate::error::{AggregateError, Result};
use crate::reduce::Aggregate;
use ndarray::{Array3, Zip};
use nifti::writer::WriterOptions;
use nifti::{NiftiError, NiftiHeader};
use std::io::{Error as IOError, ErrorKind};
use std::path::Path;
use tracing::{info, warn};

/// Element type of the written volume.
#[derive(Debug, Copy, Clone, Eq, Hash, PartialEq)]
pub enum OutputType {
    /// 32-bit floating point (`FLOAT32`), the default. Values are narrowed
    /// from the 64-bit result: precision beyond `f32` is lost, and sums out
    /// of the `f32` range become infinite (logged as a warning).
    Float32,
    /// 64-bit floating point (`FLOAT64`).
    Float64,
}

impl Default for OutputType {
    fn default() -> Self {
        OutputType::Float32
    }
}

/// Build the header an aggregate is written with.
pub fn output_header(aggregate: &Aggregate) -> std::result::Result<NiftiHeader, NiftiError> {
    let mut header = aggregate.header().clone();
    // values are stored already scaled
    header.scl_slope = 1.;
    header.scl_inter = 0.;
    header.cal_min = 0.;
    header.cal_max = 0.;
    // a reduction of statistics is not itself the input's statistic
    header.intent_code = 0;
    header.intent_p1 = 0.;
    header.intent_p2 = 0.;
    header.intent_p3 = 0.;
    header.intent_name = [0; 16];
    header.set_description_str(format!(
        "{} of {} volumes",
        aggregate.reduction(),
        aggregate.count()
    ))?;
    Ok(header)
}

/// Write an aggregate to `path`. The file is gzip compressed if the path
/// ends in `.gz`.
///
/// # Example
///
/// ```no_run
/// use nifti_aggregate::{aggregate_paths, write_aggregate, OutputType, Reduction};
///
/// let mask = aggregate_paths(&["a.nii.gz", "b.nii.gz"], Reduction::Minimum)?;
/// write_aggregate(&mask, "group_min_mask.nii.gz", OutputType::Float32)?;
/// # Ok::<(), nifti_aggregate::AggregateError>(())
/// ```
pub fn write_aggregate<P>(aggregate: &Aggregate, path: P, output_type: OutputType) -> Result<()>
where
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let write_error = |e: NiftiError| AggregateError::Write(path.to_owned(), e);

    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            let err = IOError::new(ErrorKind::NotFound, "output directory does not exist");
            return Err(write_error(NiftiError::Io(err)));
        }
    }

    let header = output_header(aggregate).map_err(write_error)?;
    let options = WriterOptions::new(path).reference_header(&header);
    let written = match output_type {
        OutputType::Float32 => options.write_nifti(&narrow(aggregate.data())),
        OutputType::Float64 => options.write_nifti(aggregate.data()),
    };
    written.map_err(write_error)?;

    info!(
        path = %path.display(),
        reduction = %aggregate.reduction(),
        count = aggregate.count(),
        "wrote aggregate volume"
    );
    Ok(())
}

/// Convert to `f32`, warning about voxels which leave the `f32` range.
fn narrow(data: &Array3<f64>) -> Array3<f32> {
    let narrowed = data.mapv(|v| v as f32);
    let overflowed = Zip::from(data)
        .and(&narrowed)
        .fold(0usize, |n, &wide, &short| {
            n + (wide.is_finite() && !short.is_finite()) as usize
        });
    if overflowed > 0 {
        warn!(voxels = overflowed, "values out of FLOAT32 range written as infinite");
    }
    narrowed
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reduce::{aggregate, Reduction};
    use crate::volume::Volume;
    use tempfile::tempdir;

    fn scaled_mask() -> Aggregate {
        let header = NiftiHeader {
            scl_slope: 2.,
            scl_inter: 1.,
            cal_max: 3.,
            sform_code: 1,
            srow_x: [3., 0., 0., -1.],
            srow_y: [0., 3., 0., -2.],
            srow_z: [0., 0., 3., -3.],
            intent_code: 3,
            intent_p1: 12.,
            intent_name: *b"t-stat\0\0\0\0\0\0\0\0\0\0",
            ..NiftiHeader::default()
        };
        let volume = Volume::from_parts("a.nii", Array3::ones((2, 2, 2)), header);
        aggregate(vec![Ok(volume)], Reduction::Minimum).unwrap()
    }

    #[test]
    fn header_keeps_space_and_resets_scaling() {
        let mask = scaled_mask();
        let header = output_header(&mask).unwrap();
        assert_eq!(header.scl_slope, 1.);
        assert_eq!(header.scl_inter, 0.);
        assert_eq!(header.cal_max, 0.);
        assert_eq!(header.sform_code, 1);
        assert_eq!(header.srow_x, [3., 0., 0., -1.]);
        assert_eq!(header.srow_z, [0., 0., 3., -3.]);
        assert!(header.descrip.starts_with(b"min of 1 volumes"));
        assert_eq!(header.intent_code, 0);
        assert_eq!(header.intent_p1, 0.);
        assert_eq!(header.intent_name, [0; 16]);
    }

    #[test]
    fn narrowing_overflows_to_infinity() {
        let data = Array3::from_shape_vec((3, 1, 1), vec![1.5, 1e300, f64::NAN]).unwrap();
        let narrowed = narrow(&data);
        assert_eq!(narrowed[[0, 0, 0]], 1.5f32);
        assert_eq!(narrowed[[1, 0, 0]], f32::INFINITY);
        assert!(narrowed[[2, 0, 0]].is_nan());
    }

    #[test]
    fn missing_output_directory() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.nii.gz");
        match write_aggregate(&scaled_mask(), &path, OutputType::Float32) {
            Err(AggregateError::Write(p, _)) => assert_eq!(p, path),
            other => panic!("expected Write error, got {:?}", other),
        }
        assert!(!path.exists());
    }
}
