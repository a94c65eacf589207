use clap::Parser;
use std::path::PathBuf;

use diffcov::DiffConfig;

#[derive(Parser, Debug)]
#[command(name = "diffcov", about = "List classes and methods changed between two revisions")]
pub struct Cli {
    /// Config file (defaults to $XDG_CONFIG_HOME/diffcov/config.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Repository to scan
    #[arg(long, short = 'w')]
    pub workspace: Option<PathBuf>,

    /// Revision under test (defaults to HEAD)
    #[arg(long)]
    pub current: Option<String>,

    /// Revision to compare against
    #[arg(long)]
    pub base: Option<String>,

    /// Fingerprinting worker count
    #[arg(long)]
    pub workers: Option<usize>,

    /// Force diff mode on
    #[arg(long)]
    pub diff_mode: bool,

    /// Print the registry as JSON
    #[arg(long)]
    pub json: bool,
}

impl Cli {
    /// Applies flags over a file/env-derived config.
    pub fn apply(&self, mut config: DiffConfig) -> DiffConfig {
        if self.diff_mode {
            config.enabled = true;
        }
        if let Some(root) = &self.workspace {
            config.workspace_root = Some(root.clone());
        }
        if let Some(current) = &self.current {
            config.current_ref = Some(current.clone());
        }
        if let Some(base) = &self.base {
            config.base_ref = Some(base.clone());
        }
        if let Some(workers) = self.workers.filter(|n| *n > 0) {
            config.workers = workers;
        }
        config
    }
}
