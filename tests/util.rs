use ndarray::{Array, ArrayD, Dimension, RemoveAxis};
use nifti::header::MAGIC_CODE_NIP1;
use nifti::writer::WriterOptions;
use nifti::{IntoNdArray, NiftiHeader, NiftiObject, ReaderOptions};
use std::path::Path;

/// A header placing voxels in scanner space through the sform rows.
pub fn sform_header(srow_x: [f32; 4], srow_y: [f32; 4], srow_z: [f32; 4]) -> NiftiHeader {
    NiftiHeader {
        sform_code: 1,
        qform_code: 0,
        srow_x,
        srow_y,
        srow_z,
        pixdim: [1., srow_x[0].abs(), srow_y[1].abs(), srow_z[2].abs(), 0., 0., 0., 0.],
        magic: *MAGIC_CODE_NIP1,
        ..NiftiHeader::default()
    }
}

/// 1mm isotropic, origin at the corner.
pub fn identity_header() -> NiftiHeader {
    sform_header([1., 0., 0., 0.], [0., 1., 0., 0.], [0., 0., 1., 0.])
}

/// Write `data` to `path` as `FLOAT32`, using `header` for everything else.
pub fn write_volume<D, P>(path: P, data: &Array<f32, D>, header: &NiftiHeader)
where
    D: Dimension + RemoveAxis,
    P: AsRef<Path>,
{
    WriterOptions::new(path.as_ref())
        .reference_header(header)
        .write_nifti(data)
        .expect("failed to write test volume");
}

/// Read a file back with its header and scaled voxel values.
pub fn read_volume<P: AsRef<Path>>(path: P) -> (NiftiHeader, ArrayD<f64>) {
    let obj = ReaderOptions::new()
        .read_file(path.as_ref())
        .expect("output is unreadable");
    let header = obj.header().clone();
    let data = obj.into_volume().into_ndarray::<f64>().unwrap();
    (header, data)
}
