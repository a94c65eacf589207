//! Two-revision comparison feeding the diff registry.
//!
//! `git2::Repository` is not `Sync`, so the scanner and every pool worker
//! open their own handle on the workspace. Only owned data (paths, blob ids,
//! fingerprints) crosses thread boundaries.
pub mod scanner;
pub mod types;
pub mod worker;

use diffcov_core::DiffError;

/// Maps a `git2::Error` into the crate-wide source-control error.
pub(crate) fn scm_error(context: impl Into<String>, err: git2::Error) -> DiffError {
    DiffError::source_control(context, err.message())
}
