//! Discovery of the volume files taking part in an aggregation.
//!
//! An input is either a directory, in which case it is searched for files
//! matching a file name pattern (by default [`DEFAULT_FILE_PATTERN`]), or a
//! glob pattern used as is. Matches are always returned in lexicographic
//! order, so that the first volume of a collection (the one lending its
//! spatial metadata to the output) does not depend on the platform.
//!
//! [`DEFAULT_FILE_PATTERN`]: ./constant.DEFAULT_FILE_PATTERN.html

use crate::error::{AggregateError, Result};
use glob::Pattern;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// File name pattern used when the input is a directory.
pub const DEFAULT_FILE_PATTERN: &str = "*.nii.gz";

/// Build the glob pattern for the given input.
///
/// Directories are joined with `file_pattern` (special characters in the
/// directory name are escaped). Anything else is taken to be a pattern
/// already.
///
/// # Example
///
/// ```
/// # use nifti_aggregate::discover::input_pattern;
/// let pattern = input_pattern("/data/sim.*p-High.gt.Low.nii.gz", "*.nii.gz");
/// assert_eq!(pattern, "/data/sim.*p-High.gt.Low.nii.gz");
/// ```
pub fn input_pattern<P: AsRef<Path>>(input: P, file_pattern: &str) -> String {
    let input = input.as_ref();
    if input.is_dir() {
        let dir = Pattern::escape(&input.to_string_lossy());
        Path::new(&dir).join(file_pattern).to_string_lossy().into_owned()
    } else {
        input.to_string_lossy().into_owned()
    }
}

/// Find the volume files of the given input (directory or glob pattern),
/// sorted lexicographically.
///
/// Fails with [`NoInputFiles`] if nothing matches.
///
/// [`NoInputFiles`]: ../error/enum.AggregateError.html#variant.NoInputFiles
pub fn discover_inputs<P: AsRef<Path>>(input: P, file_pattern: &str) -> Result<Vec<PathBuf>> {
    discover_pattern(&input_pattern(input, file_pattern))
}

/// Find the regular files matching a glob pattern, sorted lexicographically.
pub fn discover_pattern(pattern: &str) -> Result<Vec<PathBuf>> {
    let entries = glob::glob(pattern)
        .map_err(|e| AggregateError::InvalidPattern(pattern.to_string(), e))?;

    let mut paths = Vec::new();
    for entry in entries {
        let path = entry?;
        if path.is_file() {
            paths.push(path);
        } else {
            debug!(path = %path.display(), "skipping non-file match");
        }
    }
    paths.sort();

    if paths.is_empty() {
        return Err(AggregateError::NoInputFiles(Some(pattern.to_string())));
    }
    Ok(paths)
}

/// Remove `excluded` from `paths`, comparing canonical paths.
///
/// Used to keep a previous aggregation output, written next to its inputs,
/// out of the next run. Nothing is removed if `excluded` does not exist.
pub fn exclude_path<P: AsRef<Path>>(paths: &mut Vec<PathBuf>, excluded: P) {
    let excluded = match fs::canonicalize(excluded.as_ref()) {
        Ok(p) => p,
        Err(_) => return,
    };
    paths.retain(|path| {
        let keep = fs::canonicalize(path).map_or(true, |p| p != excluded);
        if !keep {
            warn!(path = %path.display(), "skipping output file matched by the input pattern");
        }
        keep
    });
}
