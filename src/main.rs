//! # Release Merge CLI
//!
//! This is the binary entry point for the `release-merge` command-line tool.
//!
//! Its primary responsibilities are:
//! - Parsing command-line arguments using `clap`.
//! - Setting up logging and running the merge.
//! - Handling top-level errors, which `anyhow` prints to stderr before the
//!   process exits with a non-zero status.
//!
//! The merge itself lives in the `release_merge` library crate, so the binary
//! stays a thin wrapper around it.

mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

fn main() -> Result<()> {
    let cli = cli::Cli::parse();
    cli.execute()
}
