//! Owned data types passed between the scanner and its worker pool.
//!
//! Everything here is `Send`: blob ids are copied out of the repository so
//! workers can re-read content through their own repository handle.

use diffcov_core::{LineRange, MethodFingerprint};
use git2::Oid;
use serde::Serialize;

/// Change types relevant to coverage; deletions are never scanned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ChangeKind {
    Added,
    Modified,
}

/// A source file added or modified between the base and current revisions.
#[derive(Debug, Clone)]
pub struct ChangedFile {
    /// Repository-relative path in the current revision.
    pub path: String,
    pub kind: ChangeKind,
    /// Blob in the base revision; `None` for added files.
    pub old_blob: Option<Oid>,
    pub new_blob: Oid,
    pub class_identifier: String,
    pub source_file_identifier: String,
    pub line_ranges: Vec<LineRange>,
}

/// Which side of the comparison a fingerprinting job reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Revision {
    Base,
    Current,
}

/// One (file, revision) unit of work for the pool.
#[derive(Debug, Clone)]
pub struct FingerprintJob {
    /// Index into the scanner's changed-file list.
    pub file: usize,
    pub revision: Revision,
    pub blob: Oid,
    pub path: String,
}

/// Outcome of a job. Failed jobs carry an empty fingerprint list.
#[derive(Debug, Clone)]
pub struct JobResult {
    pub file: usize,
    pub revision: Revision,
    pub fingerprints: Vec<MethodFingerprint>,
}

/// Counts gathered during one scan, for logging and the CLI.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScanReport {
    /// Added or modified files matching the source filter.
    pub files_examined: usize,
    /// Files dropped for unreadable content, unknown layout or no methods.
    pub files_skipped: usize,
    /// Fingerprinting jobs dispatched to the pool.
    pub jobs: usize,
    pub classes: usize,
}
