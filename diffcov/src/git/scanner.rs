//! Computes the diff registry input from two revisions of a workspace.
//!
//! 1. Resolve both refs to trees.
//! 2. Diff the trees, keeping added/modified source files outside test dirs.
//! 3. Extract changed line ranges from a line diff of the two blobs.
//! 4. Fingerprint both revisions of every file on the worker pool.
//! 5. Keep the current-revision methods whose hash is new.

use std::collections::HashMap;

use diffcov_core::{validate_ranges, ClassInfo, DiffResult, LineRange, MethodFingerprint};
use git2::{Delta, Oid, Repository, Tree};
use similar::{DiffTag, TextDiff};
use tracing::{debug, info, instrument, warn};

use crate::config::{DiffConfig, ScanTarget};
use crate::fingerprint::{changed_methods, JavaParser, SourceParser};
use crate::git::scm_error;
use crate::git::types::{ChangeKind, ChangedFile, FingerprintJob, Revision, ScanReport};
use crate::git::worker;

/// Default pool size.
pub const DEFAULT_WORKERS: usize = 10;

pub struct RevisionDiffScanner {
    target: ScanTarget,
    workers: usize,
    test_dir_marker: String,
    parser: Box<dyn SourceParser>,
}

impl std::fmt::Debug for RevisionDiffScanner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RevisionDiffScanner")
            .field("target", &self.target)
            .field("workers", &self.workers)
            .field("extension", &self.parser.extension())
            .finish()
    }
}

impl RevisionDiffScanner {
    pub fn new(target: ScanTarget) -> Self {
        Self {
            target,
            workers: DEFAULT_WORKERS,
            test_dir_marker: "test/".to_owned(),
            parser: Box::new(JavaParser),
        }
    }

    /// Builds a scanner from a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the scan triple is incomplete.
    pub fn from_config(config: &DiffConfig) -> DiffResult<Self> {
        let scanner = Self::new(config.scan_target()?)
            .with_workers(config.workers)
            .with_test_dir_marker(config.test_dir_marker.clone());
        Ok(scanner)
    }

    #[must_use]
    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers.max(1);
        self
    }

    #[must_use]
    pub fn with_test_dir_marker(mut self, marker: impl Into<String>) -> Self {
        self.test_dir_marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: Box<dyn SourceParser>) -> Self {
        self.parser = parser;
        self
    }

    /// Runs the comparison and returns one [`ClassInfo`] per changed file.
    ///
    /// # Errors
    ///
    /// Only structural violations and worker-pool failures are returned.
    /// Source-control and parse failures degrade to missing diff data.
    pub fn scan(&self) -> DiffResult<Vec<ClassInfo>> {
        self.scan_with_report().map(|(classes, _)| classes)
    }

    /// Like [`scan`](Self::scan), also returning scan counts.
    #[instrument(skip(self), fields(root = %self.target.workspace_root.display(), current = %self.target.current_ref, base = %self.target.base_ref))]
    pub fn scan_with_report(&self) -> DiffResult<(Vec<ClassInfo>, ScanReport)> {
        let mut report = ScanReport::default();
        let files = match self.changed_files(&mut report) {
            Ok(files) => files,
            Err(err) if !err.is_fatal() => {
                warn!(error = %err, "revision comparison failed, no diff data");
                return Ok((Vec::new(), report));
            }
            Err(err) => return Err(err),
        };

        let jobs = fingerprint_jobs(&files);
        report.jobs = jobs.len();
        let results = worker::run_jobs(
            &self.target.workspace_root,
            jobs,
            self.workers,
            self.parser.as_ref(),
        )?;

        let mut current: HashMap<usize, Vec<MethodFingerprint>> = HashMap::new();
        let mut base: HashMap<usize, Vec<MethodFingerprint>> = HashMap::new();
        for result in results {
            let side = match result.revision {
                Revision::Current => &mut current,
                Revision::Base => &mut base,
            };
            side.insert(result.file, result.fingerprints);
        }

        let mut classes = Vec::new();
        for (index, file) in files.into_iter().enumerate() {
            let new_methods = current.remove(&index).unwrap_or_default();
            if new_methods.is_empty() {
                debug!(path = %file.path, "no methods in current revision, skipping");
                report.files_skipped += 1;
                continue;
            }
            let old_methods = base.remove(&index).unwrap_or_default();
            let changed = changed_methods(&old_methods, new_methods);
            classes.push(ClassInfo::new(
                file.class_identifier,
                file.source_file_identifier,
                changed,
                file.line_ranges,
            ));
        }
        classes.sort_by(|a, b| a.class_identifier.cmp(&b.class_identifier));
        report.classes = classes.len();
        info!(
            examined = report.files_examined,
            skipped = report.files_skipped,
            classes = report.classes,
            "revision scan finished"
        );
        Ok((classes, report))
    }

    /// Lists added/modified source files with their changed line ranges.
    fn changed_files(&self, report: &mut ScanReport) -> DiffResult<Vec<ChangedFile>> {
        let root = &self.target.workspace_root;
        let repo = Repository::open(root).map_err(|e| scm_error(root.display().to_string(), e))?;
        let new_tree = resolve_tree(&repo, &self.target.current_ref)?;
        let old_tree = resolve_tree(&repo, &self.target.base_ref)?;

        // Only deltas are read here; line ranges come from the blob texts.
        let diff = repo
            .diff_tree_to_tree(Some(&old_tree), Some(&new_tree), None)
            .map_err(|e| scm_error("tree diff", e))?;

        let suffix = format!(".{}", self.parser.extension());
        let mut files = Vec::new();
        for delta in diff.deltas() {
            let kind = match delta.status() {
                Delta::Added => ChangeKind::Added,
                Delta::Modified => ChangeKind::Modified,
                _ => continue,
            };
            let Some(path) = delta.new_file().path().and_then(|p| p.to_str()) else {
                continue;
            };
            if !path.ends_with(&suffix) || path.contains(&self.test_dir_marker) {
                continue;
            }
            report.files_examined += 1;

            let Some((class_identifier, source_file_identifier)) = class_identifiers(path, &suffix)
            else {
                debug!(path, "not under a src/ root, skipping");
                report.files_skipped += 1;
                continue;
            };
            let old_blob = (kind == ChangeKind::Modified).then(|| delta.old_file().id());
            let new_blob = delta.new_file().id();

            let line_ranges = match self.line_ranges(&repo, old_blob, new_blob) {
                Ok(ranges) => ranges,
                Err(err) => {
                    warn!(path, error = %err, "cannot read file content, skipping");
                    report.files_skipped += 1;
                    continue;
                }
            };
            let Some(line_ranges) = line_ranges else {
                debug!(path, "content unchanged, skipping");
                report.files_skipped += 1;
                continue;
            };
            validate_ranges(&line_ranges)?;

            files.push(ChangedFile {
                path: path.to_owned(),
                kind,
                old_blob,
                new_blob,
                class_identifier,
                source_file_identifier,
                line_ranges,
            });
        }
        Ok(files)
    }

    /// Changed ranges between two blobs, `None` if the texts are identical.
    fn line_ranges(
        &self,
        repo: &Repository,
        old_blob: Option<Oid>,
        new_blob: Oid,
    ) -> DiffResult<Option<Vec<LineRange>>> {
        let new_text = read_blob(repo, new_blob)?;
        let old_text = match old_blob {
            Some(oid) => read_blob(repo, oid)?,
            None => String::new(),
        };
        Ok(changed_line_ranges(&old_text, &new_text))
    }
}

fn resolve_tree<'r>(repo: &'r Repository, reference: &str) -> DiffResult<Tree<'r>> {
    let commit = repo
        .revparse_single(reference)
        .and_then(|obj| obj.peel_to_commit())
        .map_err(|e| scm_error(reference, e))?;
    commit.tree().map_err(|e| scm_error(reference, e))
}

fn read_blob(repo: &Repository, oid: Oid) -> DiffResult<String> {
    let blob = repo.find_blob(oid).map_err(|e| scm_error(oid.to_string(), e))?;
    Ok(String::from_utf8_lossy(blob.content()).into_owned())
}

/// One job for the current revision of every file, one more for the base
/// revision of modified files.
fn fingerprint_jobs(files: &[ChangedFile]) -> Vec<FingerprintJob> {
    let mut jobs = Vec::with_capacity(files.len() * 2);
    for (index, file) in files.iter().enumerate() {
        jobs.push(FingerprintJob {
            file: index,
            revision: Revision::Current,
            blob: file.new_blob,
            path: file.path.clone(),
        });
        if let Some(blob) = file.old_blob {
            jobs.push(FingerprintJob {
                file: index,
                revision: Revision::Base,
                blob,
                path: file.path.clone(),
            });
        }
    }
    jobs
}

/// Inserted or replaced line spans of `new` relative to `old`, as 1-based
/// `[begin, end)` ranges. `None` when the texts have no edits at all.
///
/// Delete-only edits contribute no range.
pub fn changed_line_ranges(old: &str, new: &str) -> Option<Vec<LineRange>> {
    let diff = TextDiff::from_lines(old, new);
    let mut edited = false;
    let mut ranges = Vec::new();
    for op in diff.ops() {
        match op.tag() {
            DiffTag::Equal => {}
            DiffTag::Delete => edited = true,
            DiffTag::Insert | DiffTag::Replace => {
                edited = true;
                let span = op.new_range();
                ranges.push(LineRange::new(span.start as u32 + 1, span.end as u32 + 1));
            }
        }
    }
    edited.then_some(ranges)
}

/// Derives `(class identifier, source file identifier)` from a repository
/// path: the part after `src/` (and an optional `main/java/`).
///
/// `core/src/main/java/org/x/Foo.java` gives `("org/x/Foo", "org/x/Foo.java")`.
pub fn class_identifiers(path: &str, suffix: &str) -> Option<(String, String)> {
    let at = if path.starts_with("src/") { 0 } else { path.find("/src/")? + 1 };
    let relative = &path[at + "src/".len()..];
    let relative = relative.strip_prefix("main/java/").unwrap_or(relative);
    let class = relative.strip_suffix(suffix)?;
    if class.is_empty() {
        return None;
    }
    Some((class.to_owned(), relative.to_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_strip_source_roots() {
        assert_eq!(
            class_identifiers("core/src/main/java/org/x/Foo.java", ".java"),
            Some(("org/x/Foo".to_owned(), "org/x/Foo.java".to_owned()))
        );
        assert_eq!(
            class_identifiers("src/org/x/Bar.java", ".java"),
            Some(("org/x/Bar".to_owned(), "org/x/Bar.java".to_owned()))
        );
        assert_eq!(class_identifiers("lib/Foo.java", ".java"), None);
        assert_eq!(class_identifiers("mysrc/Foo.java", ".java"), None);
    }

    #[test]
    fn ranges_cover_inserts_and_replacements() {
        let old = "a\nb\nc\nd\ne\n";
        let new = "a\nB\nc\nx\ny\nd\n";
        // line 2 replaced, lines 4-5 inserted, old line 5 deleted
        assert_eq!(
            changed_line_ranges(old, new),
            Some(vec![LineRange::new(2, 3), LineRange::new(4, 6)])
        );
    }

    #[test]
    fn delete_only_edits_have_no_ranges() {
        assert_eq!(changed_line_ranges("a\nb\nc\n", "a\nc\n"), Some(Vec::new()));
        assert_eq!(changed_line_ranges("a\n", "a\n"), None);
    }

    #[test]
    fn new_file_is_one_range() {
        assert_eq!(changed_line_ranges("", "a\nb\nc\n"), Some(vec![LineRange::new(1, 4)]));
    }

    #[test]
    fn jobs_cover_both_revisions_of_modified_files() {
        let oid = Oid::zero();
        let file = |kind, old_blob| ChangedFile {
            path: "src/A.java".to_owned(),
            kind,
            old_blob,
            new_blob: oid,
            class_identifier: "A".to_owned(),
            source_file_identifier: "A.java".to_owned(),
            line_ranges: Vec::new(),
        };
        let jobs = fingerprint_jobs(&[file(ChangeKind::Added, None), file(ChangeKind::Modified, Some(oid))]);
        let shape: Vec<(usize, Revision)> = jobs.iter().map(|j| (j.file, j.revision)).collect();
        assert_eq!(shape, [(0, Revision::Current), (1, Revision::Current), (1, Revision::Base)]);
    }
}
