// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! sectioner - assign section identifiers to building-model elements
//!
//! A project is a primary document JSON file; linked documents are JSON
//! files referenced relative to it.
//!
//! ```bash
//! # Classify the primary document and every link
//! sectioner classify --project model.json --config sectioner.toml
//!
//! # Machine-readable report
//! sectioner classify --project model.json --json
//!
//! # List elements assigned to one section
//! sectioner find --project model.json --section "Секция 05"
//!
//! # Print the default configuration
//! sectioner config
//! ```

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use sectioner_engine::{classify, find_by_section, ClassificationConfig, Eligibility, RunReport};
use sectioner_model::{Document, ElementId, ModelHost};
use sectioner_store::{DocumentData, FsCentral, MemoryHost};
use std::path::{Path, PathBuf};

/// Assign section identifiers to building-model elements
#[derive(Parser, Debug)]
#[command(name = "sectioner")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Classify the primary document and its links
    Classify {
        /// Primary document JSON file
        #[arg(short, long)]
        project: PathBuf,

        /// Configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Print the run report as JSON
        #[arg(long)]
        json: bool,

        /// Directory for committed local copies of links (default: `local/` next to the project)
        #[arg(long)]
        local_dir: Option<PathBuf>,
    },

    /// List elements assigned to a section
    Find {
        /// Primary document JSON file
        #[arg(short, long)]
        project: PathBuf,

        /// Section identifier to look for
        #[arg(short, long)]
        section: String,

        /// Attribute holding the identifier (defaults to the configured target)
        #[arg(short, long)]
        attribute: Option<String>,

        /// Configuration TOML file
        #[arg(short, long)]
        config: Option<PathBuf>,
    },

    /// Print the default configuration as TOML
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Command::Classify {
            project,
            config,
            json,
            local_dir,
        } => run_classify(&project, config.as_deref(), json, local_dir.as_deref()),
        Command::Find {
            project,
            section,
            attribute,
            config,
        } => run_find(&project, &section, attribute, config.as_deref()),
        Command::Config => {
            print!("{}", ClassificationConfig::default().to_toml_string()?);
            Ok(())
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .target(env_logger::Target::Stderr)
        .init();
}

fn load_config(path: Option<&Path>) -> Result<ClassificationConfig> {
    match path {
        Some(path) => ClassificationConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(ClassificationConfig::default()),
    }
}

/// Load a primary document; links resolve relative to its directory
///
/// Committed link state is kept under `local_dir`, or `local/` next to the
/// project when none is given.
fn open_project(path: &Path, local_dir: Option<&Path>) -> Result<MemoryHost<FsCentral>> {
    let data = DocumentData::load(path)
        .with_context(|| format!("Failed to read project: {}", path.display()))?;
    let base = path.parent().map(Path::to_path_buf).unwrap_or_default();
    let local = local_dir.map_or_else(|| base.join("local"), Path::to_path_buf);
    Ok(MemoryHost::from_data(data, FsCentral::new(base)).with_local_store(FsCentral::new(local)))
}

fn run_classify(
    project: &Path,
    config: Option<&Path>,
    json: bool,
    local_dir: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let mut host = open_project(project, local_dir)?;

    let report = classify(&mut host, &config)?;

    host.to_data()
        .save(project)
        .with_context(|| format!("Failed to write project: {}", project.display()))?;

    print_report(&report, json)?;
    let failed = report.failed_scopes().count();
    if failed > 0 {
        bail!("{failed} scope(s) failed");
    }
    Ok(())
}

fn print_report(report: &RunReport, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
    } else {
        print!("{report}");
    }
    Ok(())
}

fn run_find(
    project: &Path,
    section: &str,
    attribute: Option<String>,
    config: Option<&Path>,
) -> Result<()> {
    let config = load_config(config)?;
    let attribute = attribute.unwrap_or_else(|| config.target_attribute.clone());
    let eligibility = Eligibility::from_config(&config);
    let mut host = open_project(project, None)?;

    let primary = host.primary();
    print_matches(primary, &find_by_section(primary, &attribute, section, &eligibility));

    for link in host.links() {
        if !link.is_resolved() {
            continue;
        }
        let doc = match host.open_link(&link, &config.federation.open) {
            Ok(doc) => doc,
            Err(e) => {
                log::warn!("{}: {e}", link.name);
                continue;
            }
        };
        print_matches(&*doc, &find_by_section(&*doc, &attribute, section, &eligibility));
        host.close_document(doc, false)?;
    }
    Ok(())
}

fn print_matches(doc: &dyn Document, ids: &[ElementId]) {
    println!("{} ({} element(s))", doc.name(), ids.len());
    for id in ids {
        println!("  {id}");
    }
}
