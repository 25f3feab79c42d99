use std::error::Error as _;

use crate::Error;

/// Outcome of a completed create or extract run.
///
/// Fatal failures never reach a `Report`; they are returned as `Err`.
/// Failures confined to a single entry are collected in `warnings`.
#[derive(Debug, Default)]
pub struct Report {
    /// Records written or replayed, whether or not the filesystem object
    /// could be created.
    pub records: u64,
    pub directories: u64,
    pub files: u64,
    /// Symlinks and special files seen while archiving and left out.
    pub skipped: u64,
    /// Total content bytes moved through the archive.
    pub bytes: u64,
    pub warnings: Vec<Error>,
}

impl Report {
    pub(crate) fn warn(&mut self, error: Error) {
        match error.source() {
            Some(cause) => tracing::warn!("{}: {}", error, cause),
            None => tracing::warn!("{}", error),
        }
        self.warnings.push(error);
    }
}
