//! Error taxonomy shared by the coverage model and the revision scanner.

use thiserror::Error;

/// Result type for diff-coverage operations.
pub type DiffResult<T> = Result<T, DiffError>;

/// Errors raised while discovering or applying diff data.
///
/// Only [`DiffError::StructuralViolation`] and [`DiffError::WorkerPool`] are
/// expected to reach the caller of a scan or aggregation entry point. The
/// other variants are absorbed at file or job scope and logged.
#[derive(Debug, Error)]
pub enum DiffError {
    /// Diff mode is enabled but a required setting is missing.
    #[error("diff configuration incomplete: {message}")]
    Configuration {
        /// Which setting is missing or invalid
        message: String,
    },

    /// Ref resolution, tree walk or blob read failed.
    #[error("source control failure ({context}): {message}")]
    SourceControl {
        /// Ref or path being processed
        context: String,
        /// Underlying error message
        message: String,
    },

    /// Source text could not be parsed into declarations.
    #[error("failed to parse {path}: {message}")]
    Parse {
        /// File being parsed
        path: String,
        /// Parser message
        message: String,
    },

    /// A caller broke a structural contract of the model.
    #[error("structural violation: {message}")]
    StructuralViolation {
        /// Description of the broken contract
        message: String,
    },

    /// The scan worker pool could not run or join its jobs.
    #[error("worker pool failure: {message}")]
    WorkerPool {
        /// Error message
        message: String,
    },
}

impl DiffError {
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration { message: message.into() }
    }

    pub fn structural(message: impl Into<String>) -> Self {
        Self::StructuralViolation { message: message.into() }
    }

    pub fn source_control(context: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SourceControl { context: context.into(), message: message.into() }
    }

    pub fn parse(path: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Parse { path: path.into(), message: message.into() }
    }

    pub fn worker_pool(message: impl Into<String>) -> Self {
        Self::WorkerPool { message: message.into() }
    }

    /// Returns `true` for errors that must propagate instead of being absorbed.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::StructuralViolation { .. } | Self::WorkerPool { .. })
    }
}
