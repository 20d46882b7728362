//! adtree - membership trees from a directory snapshot
//!
//! # Usage
//!
//! ```bash
//! # Members of a group, three levels deep
//! adtree -d corp.json members "Domain Admins"
//!
//! # Every group a user belongs to, however deep
//! adtree -d corp.json member-of alice --recursive
//!
//! # Only groups, skipping service accounts, as JSON
//! adtree -d corp.json members "Domain Admins" --groups-only --exclude 'svc_*' -f json
//! ```

mod cli;
mod output;

use anyhow::{Context, Result};
use clap::Parser;
use log::{debug, info};
use memory_directory::MemoryDirectory;
use membership_tree::tree::{TreeOutput, TreeTraversal};
use std::io::{self, Write};
use std::process::ExitCode;

use crate::cli::{Cli, OutputFormat};

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match run(&cli) {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::from(1),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::from(2)
        }
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp(None)
        .init();
}

/// Returns whether every identity was rendered
fn run(cli: &Cli) -> Result<bool> {
    let directory = MemoryDirectory::load(&cli.directory)?;
    info!(
        "Loaded {} objects from {}",
        directory.len(),
        cli.directory.display()
    );

    let options = cli.traversal_options();
    debug!("Traversal options: {:?}", options);
    let mut traversal =
        TreeTraversal::new(&directory, options).context("Invalid traversal options")?;

    let identities = &cli.tree_args().identities;
    let results = traversal.traverse_all(identities);

    let stderr = io::stderr();
    let mut stderr = stderr.lock();
    let mut trees: Vec<&TreeOutput> = Vec::new();
    let mut success = results.len() == identities.len();

    for (identity, result) in identities.iter().zip(&results) {
        match result {
            Ok(tree) => {
                output::write_notices(&mut stderr, tree)?;
                trees.push(tree);
            }
            Err(err) => {
                output::write_error(&mut stderr, identity, err)?;
                success = false;
            }
        }
    }

    let stdout = io::stdout();
    let mut stdout = stdout.lock();
    match cli.format {
        OutputFormat::Text => output::write_text(&mut stdout, &trees)?,
        OutputFormat::Json => output::write_json(&mut stdout, &trees)?,
    }
    stdout.flush()?;

    info!(
        "Rendered {} of {} identities, {} directory queries",
        trees.len(),
        identities.len(),
        directory.total_queries()
    );
    Ok(success)
}
