//! CLI argument parsing and command dispatch

use anyhow::Result;
use clap::Parser;

use crate::commands;

/// Release Merge - Combine several release tarballs into one release
#[derive(Parser, Debug)]
#[command(name = "release-merge")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    merge: commands::merge::MergeArgs,

    /// Set log level (error, warn, info, debug, trace); RUST_LOG takes precedence
    #[arg(long, value_name = "LEVEL", default_value = "warn")]
    log_level: String,
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        init_logging(&self.log_level);
        commands::merge::execute(self.merge)
    }
}

/// Route log output to stderr; stdout may be carrying the archive.
fn init_logging(level: &str) {
    let env = env_logger::Env::default().default_filter_or(level);
    let _ = env_logger::Builder::from_env(env)
        .target(env_logger::Target::Stderr)
        .format_timestamp(None)
        .try_init();
}
