//! Merge command implementation
//!
//! Merges the given release archives, in order, into one archive written to
//! stdout or to `--output`. When writing to a file, the archive is staged in a
//! temporary file next to the destination and only renamed into place once
//! the merge has succeeded.

use std::io::{self, BufWriter};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::Args;
use flate2::Compression;
use log::info;
use tempfile::NamedTempFile;

use release_merge::archive::ReleaseWriter;
use release_merge::merge::{merge_releases, MergeSummary};

/// Arguments for the merge command
#[derive(Args, Debug)]
pub struct MergeArgs {
    /// Release archives to merge, in order
    #[arg(value_name = "RELEASE", required = true, num_args = 2..)]
    pub releases: Vec<PathBuf>,

    /// Write the merged archive to PATH instead of stdout
    #[arg(short, long, value_name = "PATH", env = "RELEASE_MERGE_OUTPUT")]
    pub output: Option<PathBuf>,

    /// Gzip compression level for the merged archive (0-9)
    #[arg(
        long,
        value_name = "LEVEL",
        env = "RELEASE_MERGE_COMPRESSION",
        default_value_t = 6,
        value_parser = clap::value_parser!(u32).range(0..=9)
    )]
    pub compression: u32,
}

/// Execute the merge command
pub fn execute(args: MergeArgs) -> Result<()> {
    let compression = Compression::new(args.compression);

    let summary = match &args.output {
        Some(path) => merge_to_file(&args.releases, path, compression)?,
        None => merge_to_stdout(&args.releases, compression)?,
    };

    info!(
        "Wrote {} entries and 1 merged manifest from {} archives ({} repeated directories)",
        summary.entries_written, summary.archives, summary.repeated_directories
    );
    Ok(())
}

fn merge_to_stdout(releases: &[PathBuf], compression: Compression) -> Result<MergeSummary> {
    let writer = ReleaseWriter::new(BufWriter::new(io::stdout().lock()), compression);
    let (_, summary) = merge_releases(releases, writer)?;
    Ok(summary)
}

fn merge_to_file(
    releases: &[PathBuf],
    path: &Path,
    compression: Compression,
) -> Result<MergeSummary> {
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    let staging = NamedTempFile::new_in(dir)
        .with_context(|| format!("Failed to create temporary file in {}", dir.display()))?;

    let writer = ReleaseWriter::new(BufWriter::new(staging), compression);
    let (sink, summary) = merge_releases(releases, writer)?;
    let staging = sink
        .into_inner()
        .map_err(|e| e.into_error())
        .with_context(|| format!("Failed to flush {}", path.display()))?;

    // NamedTempFile is created 0600; give the archive ordinary file permissions
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        staging
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(0o644))
            .with_context(|| format!("Failed to set permissions on {}", path.display()))?;
    }

    staging
        .persist(path)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(summary)
}
