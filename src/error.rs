//! Types for error handling go here.

use nifti::NiftiError;
use quick_error::quick_error;
use std::io::Error as IOError;
use std::path::PathBuf;

quick_error! {
    /// Error type for all error kinds emitted by this crate.
    #[derive(Debug)]
    pub enum AggregateError {
        /// No volume to aggregate: the file pattern (if any) matched nothing.
        NoInputFiles(pattern: Option<String>) {
            display("no input files{}", match pattern {
                Some(p) => format!(" match `{}`", p),
                None => String::new(),
            })
        }
        /// The file pattern is not a valid glob.
        InvalidPattern(pattern: String, err: glob::PatternError) {
            display("invalid file pattern `{}`: {}", pattern, err)
            source(err)
        }
        /// A directory entry could not be read while matching the pattern.
        Glob(err: glob::GlobError) {
            from()
            display("failed to read matched path {}: {}", err.path().display(), err)
            source(err)
        }
        /// A matched file is not a valid or readable NIfTI-1 volume.
        Load(path: PathBuf, err: NiftiError) {
            display("failed to load volume {}: {}", path.display(), err)
            source(err)
        }
        /// A volume is not spatially three dimensional.
        Dimensionality(path: PathBuf, shape: Vec<usize>) {
            display("volume {} has shape {:?}, expected a 3D volume", path.display(), shape)
        }
        /// A volume's shape differs from the first volume's shape.
        ShapeMismatch(path: PathBuf, expected: [usize; 3], found: [usize; 3]) {
            display("volume {} has shape {:?}, expected {:?}", path.display(), found, expected)
        }
        /// A volume's affine differs from the first volume's affine beyond the tolerance.
        AffineMismatch(path: PathBuf, difference: f64) {
            display("volume {} has an affine differing by {} from the first volume", path.display(), difference)
        }
        /// The aggregate volume could not be written.
        Write(path: PathBuf, err: NiftiError) {
            display("failed to write {}: {}", path.display(), err)
            source(err)
        }
        /// I/O Error
        Io(err: IOError) {
            from()
            display("{}", err)
            source(err)
        }
    }
}

/// Alias type for results originating from this crate.
pub type Result<T> = ::std::result::Result<T, AggregateError>;
