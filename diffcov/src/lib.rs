//! Revision scanning and source fingerprinting for diff coverage.
//!
//! [`populate_registry`] is the usual entry point: it resolves a
//! [`DiffConfig`], runs the [`RevisionDiffScanner`] and hands the result to a
//! [`DiffRegistry`] exactly once.

pub mod config;
pub mod fingerprint;
pub mod git;
pub mod logging;

use diffcov_core::{DiffError, DiffRegistry, DiffResult};
use tracing::warn;

pub use config::{DiffConfig, ScanTarget};
pub use fingerprint::{JavaParser, SourceParser};
pub use git::scanner::RevisionDiffScanner;
pub use git::types::ScanReport;
pub use logging::init_tracing_once;

/// Scans the configured revisions into `registry`.
///
/// Returns `Ok(true)` if this call populated the registry and `Ok(false)` if
/// it was already populated or diff mode is off. An incomplete configuration
/// is logged and leaves the registry empty.
///
/// # Errors
///
/// Propagates structural violations and worker-pool failures from the scan.
pub fn populate_registry(registry: &DiffRegistry, config: &DiffConfig) -> DiffResult<bool> {
    if !registry.is_diff_mode() {
        return Ok(false);
    }
    let scanner = match RevisionDiffScanner::from_config(config) {
        Ok(scanner) => scanner,
        Err(err @ DiffError::Configuration { .. }) => {
            warn!(error = %err, "diff mode on but configuration incomplete, no diff data");
            return registry.populate(Vec::new());
        }
        Err(err) => return Err(err),
    };
    registry.populate_with(|| scanner.scan())
}
