//! Process-wide store of changed regions and changed methods.
//!
//! # Lifecycle
//!
//! 1. Construct with [`DiffRegistry::new`] (or [`DiffRegistry::disabled`]).
//! 2. Populate exactly once with [`DiffRegistry::populate`] or
//!    [`DiffRegistry::populate_with`]. Later calls are no-ops.
//! 3. Share the registry by reference (or `Arc`) with every aggregation
//!    pass. After population the maps are never mutated again, so lookups
//!    need no synchronization.
//! 4. Teardown is dropping the registry.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, OnceLock};

use tracing::{debug, info, warn};

use crate::error::DiffResult;
use crate::range::{contains_line, validate_ranges, LineRange};
use crate::types::{ClassInfo, MethodFingerprint};

/// Registry entry for one changed file, shared by all of its keys.
#[derive(Debug)]
struct ClassEntry {
    info: ClassInfo,
    ranges: Arc<[LineRange]>,
    hashes: HashSet<String>,
}

#[derive(Debug, Default)]
struct RegistryState {
    by_key: HashMap<String, Arc<ClassEntry>>,
    entries: Vec<Arc<ClassEntry>>,
}

impl RegistryState {
    fn build(classes: Vec<ClassInfo>) -> DiffResult<Self> {
        for class in &classes {
            validate_ranges(&class.line_ranges)?;
        }
        let mut state = RegistryState::default();
        for info in classes {
            let entry = Arc::new(ClassEntry {
                ranges: info.line_ranges.iter().copied().collect(),
                hashes: info.changed_methods.iter().map(|m| m.content_hash.clone()).collect(),
                info,
            });
            let keys = [
                entry.info.class_identifier.clone(),
                entry.info.source_file_identifier.clone(),
            ];
            for key in keys {
                if let Some(previous) = state.by_key.insert(key.clone(), Arc::clone(&entry)) {
                    if !Arc::ptr_eq(&previous, &entry) {
                        warn!(key = %key, "duplicate diff registry key, keeping the later entry");
                    }
                }
            }
            state.entries.push(entry);
        }
        Ok(state)
    }
}

/// Read-mostly registry of diff data keyed by class or source-file identifier.
#[derive(Debug)]
pub struct DiffRegistry {
    diff_mode: bool,
    state: OnceLock<RegistryState>,
}

impl Default for DiffRegistry {
    fn default() -> Self {
        Self::disabled()
    }
}

impl DiffRegistry {
    pub fn new(diff_mode: bool) -> Self {
        Self { diff_mode, state: OnceLock::new() }
    }

    /// A registry whose queries always report "not changed".
    pub fn disabled() -> Self {
        Self::new(false)
    }

    pub fn is_diff_mode(&self) -> bool {
        self.diff_mode
    }

    pub fn is_populated(&self) -> bool {
        self.state.get().is_some()
    }

    /// Populates the registry from finished scan results.
    ///
    /// Returns `Ok(true)` if this call populated the registry and `Ok(false)`
    /// if it was already populated or diff mode is off.
    ///
    /// # Errors
    ///
    /// Returns [`crate::DiffError::StructuralViolation`] when a class carries
    /// unsorted or overlapping ranges. The registry is then left populated
    /// but empty, so diff counters stay at zero.
    pub fn populate(&self, classes: Vec<ClassInfo>) -> DiffResult<bool> {
        self.populate_with(move || Ok(classes))
    }

    /// Populates the registry from the result of `scan`.
    ///
    /// Only the first caller runs `scan`; concurrent callers block until it
    /// finishes and then observe the populated state.
    ///
    /// # Errors
    ///
    /// Propagates the error of `scan` or of range validation. In both cases
    /// the registry ends up populated with no entries.
    pub fn populate_with<F>(&self, scan: F) -> DiffResult<bool>
    where
        F: FnOnce() -> DiffResult<Vec<ClassInfo>>,
    {
        if !self.diff_mode {
            debug!("diff mode disabled, skipping registry population");
            return Ok(false);
        }
        let mut outcome = Ok(false);
        self.state.get_or_init(|| match scan().and_then(RegistryState::build) {
            Ok(state) => {
                info!(classes = state.entries.len(), "diff registry populated");
                outcome = Ok(true);
                state
            }
            Err(err) => {
                warn!(error = %err, "diff registry population failed, no diff data available");
                outcome = Err(err);
                RegistryState::default()
            }
        });
        outcome
    }

    fn entry(&self, key: &str) -> Option<&ClassEntry> {
        if !self.diff_mode {
            return None;
        }
        self.state.get()?.by_key.get(key).map(Arc::as_ref)
    }

    /// Changed line ranges of a class or source file.
    pub fn line_ranges(&self, key: &str) -> Option<Arc<[LineRange]>> {
        self.entry(key).map(|entry| Arc::clone(&entry.ranges))
    }

    pub fn is_diff_line(&self, key: &str, line: u32) -> bool {
        self.entry(key).is_some_and(|entry| contains_line(&entry.ranges, line))
    }

    /// Changed methods of a class or source file; empty when unknown.
    pub fn changed_methods(&self, key: &str) -> &[MethodFingerprint] {
        self.entry(key)
            .map(|entry| entry.info.changed_methods.as_slice())
            .unwrap_or_default()
    }

    pub fn changed_method_hashes(&self, key: &str) -> Option<&HashSet<String>> {
        self.entry(key).map(|entry| &entry.hashes)
    }

    /// `true` when the file registered under `key` has at least one changed method.
    pub fn is_diff_class(&self, key: &str) -> bool {
        !self.changed_methods(key).is_empty()
    }

    /// Looks up a changed method by enclosing type and name.
    ///
    /// `class_path` may use `/` or `.` as package separator.
    pub fn is_changed_method(&self, key: &str, class_path: &str, method_name: &str) -> bool {
        let wanted = class_path.replace('/', ".");
        self.changed_methods(key)
            .iter()
            .any(|m| m.method_name == method_name && m.enclosing_class_path == wanted)
    }

    /// Every registered file, in population order.
    pub fn classes(&self) -> impl Iterator<Item = &ClassInfo> + '_ {
        self.state
            .get()
            .into_iter()
            .filter(|_| self.diff_mode)
            .flat_map(|state| state.entries.iter().map(|entry| &entry.info))
    }

    /// Logs the registry contents at debug level.
    pub fn dump(&self) {
        for class in self.classes() {
            debug!(
                class = %class.class_identifier,
                ranges = ?class.line_ranges,
                methods = class.changed_methods.len(),
                "diff class"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DiffError;

    fn method(class: &str, name: &str, hash: &str) -> MethodFingerprint {
        MethodFingerprint {
            enclosing_class_path: class.to_owned(),
            method_name: name.to_owned(),
            parameter_signatures: Vec::new(),
            content_hash: hash.to_owned(),
            is_anonymous_class: false,
        }
    }

    fn foo() -> ClassInfo {
        ClassInfo::new(
            "org/acme/Foo",
            "org/acme/Foo.java",
            vec![method("org.acme.Foo", "run", "h1")],
            vec![LineRange::new(10, 15), LineRange::new(20, 25)],
        )
    }

    #[test]
    fn both_keys_resolve_to_same_ranges() {
        let registry = DiffRegistry::new(true);
        assert!(registry.populate(vec![foo()]).unwrap());
        let a = registry.line_ranges("org/acme/Foo").unwrap();
        let b = registry.line_ranges("org/acme/Foo.java").unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert!(registry.is_diff_line("org/acme/Foo", 12));
        assert!(!registry.is_diff_line("org/acme/Foo", 17));
        assert!(registry.is_diff_line("org/acme/Foo.java", 20));
        assert!(!registry.is_diff_line("org/acme/Foo.java", 25));
    }

    #[test]
    fn second_populate_is_a_noop() {
        let registry = DiffRegistry::new(true);
        assert!(registry.populate(vec![foo()]).unwrap());
        assert!(!registry.populate(vec![foo()]).unwrap());
        assert!(!registry.populate(Vec::new()).unwrap());
        assert_eq!(registry.classes().count(), 1);
        assert_eq!(registry.changed_methods("org/acme/Foo").len(), 1);
    }

    #[test]
    fn scan_runs_only_once() {
        let registry = DiffRegistry::new(true);
        let mut runs = 0;
        registry
            .populate_with(|| {
                runs += 1;
                Ok(vec![foo()])
            })
            .unwrap();
        registry
            .populate_with(|| {
                runs += 1;
                Ok(Vec::new())
            })
            .unwrap();
        assert_eq!(runs, 1);
    }

    #[test]
    fn concurrent_population_observes_one_scan() {
        let registry = DiffRegistry::new(true);
        let populated: Vec<bool> = std::thread::scope(|s| {
            let handles: Vec<_> = (0..8)
                .map(|_| s.spawn(|| registry.populate(vec![foo()]).unwrap()))
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        });
        assert_eq!(populated.iter().filter(|p| **p).count(), 1);
        assert!(registry.is_diff_line("org/acme/Foo", 10));
    }

    #[test]
    fn disabled_registry_short_circuits() {
        let registry = DiffRegistry::disabled();
        assert!(!registry.populate(vec![foo()]).unwrap());
        assert!(!registry.is_populated());
        assert!(registry.line_ranges("org/acme/Foo").is_none());
        assert!(!registry.is_diff_line("org/acme/Foo", 12));
        assert!(registry.changed_methods("org/acme/Foo").is_empty());
    }

    #[test]
    fn overlapping_ranges_fail_loudly() {
        let mut bad = foo();
        bad.line_ranges = vec![LineRange::new(10, 15), LineRange::new(12, 18)];
        let registry = DiffRegistry::new(true);
        let err = registry.populate(vec![bad]).unwrap_err();
        assert!(matches!(err, DiffError::StructuralViolation { .. }));
        assert!(registry.is_populated());
        assert!(registry.line_ranges("org/acme/Foo").is_none());
    }

    #[test]
    fn changed_method_queries() {
        let registry = DiffRegistry::new(true);
        registry.populate(vec![foo()]).unwrap();
        assert!(registry.is_diff_class("org/acme/Foo"));
        assert!(!registry.is_diff_class("org/acme/Bar"));
        assert!(registry.is_changed_method("org/acme/Foo", "org/acme/Foo", "run"));
        assert!(!registry.is_changed_method("org/acme/Foo", "org/acme/Foo", "stop"));
        let hashes = registry.changed_method_hashes("org/acme/Foo.java").unwrap();
        assert!(hashes.contains("h1"));
    }
}
