//! Voxel-wise aggregation of NIfTI-1 volume collections.
//!
//! This crate combines a set of same-shaped volumes into a single summary
//! volume, either by taking the voxel-wise minimum (a conservative group
//! mask out of individual binary masks) or the voxel-wise sum (statistical
//! maps aggregated across subjects or contrasts). The result is written with
//! the spatial metadata of the first input, inputs being taken in
//! lexicographic order.
//!
//! The work is split in three stages, each usable on its own:
//!
//! - [`discover`]: a directory or glob pattern to a sorted list of files;
//! - [`volume`]: loading each file into a [`Volume`];
//! - [`reduce`] and [`writer`]: folding volumes into an [`Aggregate`] and
//!   writing it out.
//!
//! [`AggregateOptions`] runs them all in one go.
//!
//! # Example
//!
//! ```no_run
//! use nifti_aggregate::{AggregateOptions, Reduction};
//!
//! let report = AggregateOptions::new(Reduction::Minimum).run("masks/")?;
//! assert!(report.output.ends_with("group_min_mask.nii.gz"));
//! # Ok::<(), nifti_aggregate::AggregateError>(())
//! ```
//!
//! [`discover`]: ./discover/index.html
//! [`volume`]: ./volume/index.html
//! [`reduce`]: ./reduce/index.html
//! [`writer`]: ./writer/index.html
//! [`Volume`]: ./volume/struct.Volume.html
//! [`Aggregate`]: ./reduce/struct.Aggregate.html
//! [`AggregateOptions`]: ./options/struct.AggregateOptions.html
#![deny(missing_debug_implementations)]
#![warn(missing_docs, unused_extern_crates, trivial_casts, unused_results)]

pub mod discover;
pub mod error;
pub mod options;
pub mod reduce;
pub mod volume;
pub mod writer;

pub use crate::discover::{discover_inputs, DEFAULT_FILE_PATTERN};
pub use crate::error::{AggregateError, Result};
pub use crate::options::{create_group_mask, sum_images, AggregateOptions, AggregateReport};
pub use crate::reduce::{
    aggregate, aggregate_paths, aggregate_with, stack, Aggregate, Aggregator, Reduction,
};
pub use crate::volume::{load_volume, load_volumes, Volume};
pub use crate::writer::{write_aggregate, OutputType};
