//! Bounded worker pool running fingerprinting jobs.
//!
//! Jobs are queued on a crossbeam channel before the workers start; each
//! worker opens its own `git2::Repository` inside its thread and drains the
//! queue. The pool lives in a `std::thread::scope`, so every worker is joined
//! (and its resources released) before [`run_jobs`] returns.

use std::path::Path;

use crossbeam_channel::{Receiver, Sender};
use diffcov_core::{DiffError, DiffResult};
use git2::Repository;
use tracing::{debug, warn};

use crate::fingerprint::SourceParser;
use crate::git::types::{FingerprintJob, JobResult};

/// Runs `jobs` on at most `workers` threads and gathers every result.
///
/// A job that fails to read or parse its blob yields an empty fingerprint
/// list; it never affects sibling jobs.
///
/// # Errors
///
/// Returns [`DiffError::WorkerPool`] if the queue cannot be filled or a
/// worker thread panics.
pub fn run_jobs(
    repo_path: &Path,
    jobs: Vec<FingerprintJob>,
    workers: usize,
    parser: &dyn SourceParser,
) -> DiffResult<Vec<JobResult>> {
    if jobs.is_empty() {
        return Ok(Vec::new());
    }
    let workers = workers.clamp(1, jobs.len());
    let expected = jobs.len();

    let (job_tx, job_rx) = crossbeam_channel::unbounded::<FingerprintJob>();
    let (result_tx, result_rx) = crossbeam_channel::unbounded::<JobResult>();
    for job in jobs {
        job_tx
            .send(job)
            .map_err(|_| DiffError::worker_pool("job queue closed before dispatch"))?;
    }
    // Workers stop once the queue is drained.
    drop(job_tx);

    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..workers)
            .map(|id| {
                let rx = job_rx.clone();
                let tx = result_tx.clone();
                scope.spawn(move || worker_loop(id, repo_path, rx, tx, parser))
            })
            .collect();
        drop(result_tx);
        for handle in handles {
            handle
                .join()
                .map_err(|_| DiffError::worker_pool("fingerprint worker panicked"))?;
        }
        Ok::<(), DiffError>(())
    })?;

    let results: Vec<JobResult> = result_rx.iter().collect();
    if results.len() != expected {
        return Err(DiffError::worker_pool(format!(
            "expected {expected} job results, gathered {}",
            results.len()
        )));
    }
    Ok(results)
}

/// Body of one pool thread. Owns its repository handle for its lifetime.
fn worker_loop(
    id: usize,
    repo_path: &Path,
    rx: Receiver<FingerprintJob>,
    tx: Sender<JobResult>,
    parser: &dyn SourceParser,
) {
    let repo = match Repository::open(repo_path) {
        Ok(repo) => Some(repo),
        Err(err) => {
            warn!(worker = id, error = %err.message(), "worker could not open repository");
            None
        }
    };

    for job in rx {
        let fingerprints = match repo.as_ref() {
            Some(repo) => fingerprint_blob(repo, &job, parser),
            None => Vec::new(),
        };
        debug!(worker = id, path = %job.path, revision = ?job.revision, methods = fingerprints.len(), "job done");
        let result = JobResult { file: job.file, revision: job.revision, fingerprints };
        if tx.send(result).is_err() {
            return;
        }
    }
}

fn fingerprint_blob(
    repo: &Repository,
    job: &FingerprintJob,
    parser: &dyn SourceParser,
) -> Vec<diffcov_core::MethodFingerprint> {
    let blob = match repo.find_blob(job.blob) {
        Ok(blob) => blob,
        Err(err) => {
            warn!(path = %job.path, error = %err.message(), "blob read failed");
            return Vec::new();
        }
    };
    let source = String::from_utf8_lossy(blob.content());
    parser.fingerprints(&source).unwrap_or_else(|err| {
        let err = err.into_diff_error(&job.path);
        warn!(revision = ?job.revision, error = %err, "no fingerprints for file");
        Vec::new()
    })
}
