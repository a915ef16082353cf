//! Readers for the raw input files.
//!
//! Readers are tolerant: malformed rows are skipped, unparseable numbers
//! become zero. A missing file is reported as
//! [`PipelineError::InputMissing`](crate::error::PipelineError::InputMissing).
use std::fs::File;
use std::path::Path;

use crate::error::PipelineError;

pub mod frequency;
pub mod lexicon;
pub mod words;

pub(crate) fn open_input(path: &Path) -> Result<File, PipelineError> {
    File::open(path).map_err(|e| PipelineError::from_io(path, e))
}
