//! Diff-mode configuration.
//!
//! Settings are layered: TOML file, then `DIFFCOV_*` environment variables,
//! then command-line flags (applied by the binary). A missing or malformed
//! file is a soft failure; defaults are used and a warning is logged.

use std::path::{Path, PathBuf};

use diffcov_core::{DiffError, DiffResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::git::scanner::DEFAULT_WORKERS;

/// Ref compared against when no current ref is configured.
pub const DEFAULT_CURRENT_REF: &str = "HEAD";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiffConfig {
    /// Diff mode switch. When off, diff counters stay zero.
    pub enabled: bool,
    pub workspace_root: Option<PathBuf>,
    pub current_ref: Option<String>,
    pub base_ref: Option<String>,
    /// Fingerprinting pool size.
    pub workers: usize,
    /// Paths containing this marker are treated as tests and never scanned.
    pub test_dir_marker: String,
}

impl Default for DiffConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            workspace_root: None,
            current_ref: None,
            base_ref: None,
            workers: DEFAULT_WORKERS,
            test_dir_marker: "test/".to_owned(),
        }
    }
}

/// Fully resolved comparison inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanTarget {
    pub workspace_root: PathBuf,
    pub current_ref: String,
    pub base_ref: String,
}

impl DiffConfig {
    /// Parses a TOML document. Unknown keys are ignored.
    ///
    /// # Errors
    ///
    /// Returns a configuration error on malformed TOML.
    pub fn from_toml_str(raw: &str) -> DiffResult<Self> {
        toml::from_str(raw).map_err(|e| DiffError::configuration(e.to_string()))
    }

    /// `$XDG_CONFIG_HOME/diffcov/config.toml`, falling back to
    /// `~/.config/diffcov/config.toml`.
    pub fn default_path() -> PathBuf {
        let base = std::env::var("XDG_CONFIG_HOME")
            .ok()
            .map(PathBuf::from)
            .or_else(|| {
                std::env::var("HOME")
                    .ok()
                    .map(|h| PathBuf::from(h).join(".config"))
            })
            .unwrap_or_else(|| PathBuf::from(".config"));
        base.join("diffcov").join("config.toml")
    }

    /// Loads the file at `path` (or [`default_path`](Self::default_path)).
    /// Never fails: unreadable or malformed files give the defaults.
    pub fn load(path: Option<&Path>) -> Self {
        let path = path.map_or_else(Self::default_path, Path::to_path_buf);
        let raw = match std::fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) => {
                debug!(path = %path.display(), error = %err, "no config file, using defaults");
                return Self::default();
            }
        };
        match Self::from_toml_str(&raw) {
            Ok(config) => config,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "config parse error, using defaults");
                Self::default()
            }
        }
    }

    /// Applies `DIFFCOV_*` overrides from the process environment.
    #[must_use]
    pub fn apply_env(self) -> Self {
        self.with_env_from(|key| std::env::var(key).ok())
    }

    /// Applies overrides read through `lookup`. Unparseable values are
    /// ignored with a warning.
    #[must_use]
    pub fn with_env_from(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(raw) = lookup("DIFFCOV_DIFF_MODE") {
            match parse_flag(&raw) {
                Some(flag) => self.enabled = flag,
                None => warn!(value = %raw, "ignoring DIFFCOV_DIFF_MODE"),
            }
        }
        if let Some(root) = lookup("DIFFCOV_WORKSPACE") {
            self.workspace_root = Some(PathBuf::from(root));
        }
        if let Some(current) = lookup("DIFFCOV_CURRENT_REF") {
            self.current_ref = Some(current);
        }
        if let Some(base) = lookup("DIFFCOV_BASE_REF") {
            self.base_ref = Some(base);
        }
        if let Some(raw) = lookup("DIFFCOV_WORKERS") {
            match raw.trim().parse::<usize>() {
                Ok(n) if n > 0 => self.workers = n,
                _ => warn!(value = %raw, "ignoring DIFFCOV_WORKERS"),
            }
        }
        self
    }

    /// Resolves the comparison triple.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when diff mode is off, or when the
    /// workspace root or base ref is missing. A blank current ref falls back
    /// to [`DEFAULT_CURRENT_REF`].
    pub fn scan_target(&self) -> DiffResult<ScanTarget> {
        if !self.enabled {
            return Err(DiffError::configuration("diff mode is disabled"));
        }
        let workspace_root = self
            .workspace_root
            .clone()
            .filter(|p| !p.as_os_str().is_empty())
            .ok_or_else(|| DiffError::configuration("workspace root is not set"))?;
        let base_ref = non_blank(self.base_ref.as_deref())
            .ok_or_else(|| DiffError::configuration("base ref is not set"))?;
        let current_ref = non_blank(self.current_ref.as_deref()).unwrap_or(DEFAULT_CURRENT_REF);
        Ok(ScanTarget {
            workspace_root,
            current_ref: current_ref.to_owned(),
            base_ref: base_ref.to_owned(),
        })
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
