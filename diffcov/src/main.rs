//! `diffcov`: scans two revisions of a repository and prints the changed
//! classes, their changed line ranges and changed methods.
//!
//! Configuration is layered file, then environment, then flags. Exit code is
//! non-zero only for failures that abort the scan; an incomplete
//! configuration or unreadable repository just yields an empty result.

mod cli;

use std::process::ExitCode;

use clap::Parser;
use diffcov::{init_tracing_once, populate_registry, DiffConfig};
use diffcov_core::DiffRegistry;

fn main() -> ExitCode {
    init_tracing_once();
    let cli = cli::Cli::parse();

    let config = cli.apply(DiffConfig::load(cli.config.as_deref()).apply_env());
    let registry = DiffRegistry::new(config.enabled);

    if let Err(err) = populate_registry(&registry, &config) {
        eprintln!("diffcov: {err}");
        return ExitCode::FAILURE;
    }
    registry.dump();

    let classes: Vec<_> = registry.classes().collect();
    if cli.json {
        match serde_json::to_string_pretty(&classes) {
            Ok(json) => println!("{json}"),
            Err(err) => {
                eprintln!("diffcov: cannot encode registry: {err}");
                return ExitCode::FAILURE;
            }
        }
        return ExitCode::SUCCESS;
    }

    if !config.enabled {
        println!("diff mode is off");
        return ExitCode::SUCCESS;
    }
    for class in classes {
        let ranges: Vec<String> = class.line_ranges.iter().map(ToString::to_string).collect();
        println!(
            "{} ({}) lines {}",
            class.class_identifier,
            class.source_file_identifier,
            ranges.join(", ")
        );
        for method in &class.changed_methods {
            println!("  {method}");
        }
    }
    ExitCode::SUCCESS
}
