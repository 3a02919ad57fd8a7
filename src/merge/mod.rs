//! Release merging
//!
//! This module drives a whole merge: every input archive is opened up front,
//! then walked in the order given, with pass-through entries streamed to the
//! output as they are read. Once all inputs are consumed the collected
//! manifests are reconciled and the merged `./release.MF` is written last.
//!
//! ## Components
//!
//! - `entries.rs` - Per-entry classification, duplicate policy, forwarding
//! - `manifest.rs` - Field-by-field folding of the collected manifests
//!
//! ## Failure Handling
//!
//! The first error stops the merge. The output writer is then abandoned
//! rather than finalized, so a failed merge never produces something that
//! looks like a complete archive.

pub mod entries;
pub mod manifest;

#[cfg(test)]
mod fold_proptest;

use std::io::Write;
use std::path::PathBuf;

use log::info;

use crate::archive::{ReleaseArchive, ReleaseWriter};
use crate::error::{Error, Result};
use entries::EntryMerger;

/// Counters describing a finished merge
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MergeSummary {
    /// Input archives fully consumed
    pub archives: usize,
    /// Pass-through entries written to the output
    pub entries_written: usize,
    /// Directory entries that an earlier archive had already produced
    pub repeated_directories: usize,
    /// Manifests folded into the merged manifest
    pub manifests: usize,
}

/// Merge the release archives at `paths` into `writer`.
///
/// On success the writer is finalized and its sink returned along with a
/// summary. On failure the writer is abandoned and the error returned.
pub fn merge_releases<W: Write>(
    paths: &[PathBuf],
    mut writer: ReleaseWriter<W>,
) -> Result<(W, MergeSummary)> {
    match run(paths, &mut writer) {
        Ok(summary) => {
            let sink = writer.finish()?;
            Ok((sink, summary))
        }
        Err(e) => {
            writer.abandon();
            Err(e)
        }
    }
}

fn run<W: Write>(paths: &[PathBuf], writer: &mut ReleaseWriter<W>) -> Result<MergeSummary> {
    if paths.is_empty() {
        return Err(Error::Usage {
            message: "at least one release archive is required".to_string(),
        });
    }

    let mut archives = paths
        .iter()
        .map(ReleaseArchive::open)
        .collect::<Result<Vec<_>>>()?;

    let mut merger = EntryMerger::new();
    for archive in &mut archives {
        merger.merge_archive(archive, writer)?;
    }
    // Release the input handles before the manifest is produced.
    drop(archives);

    let (documents, mut summary) = merger.into_parts();
    let reconciled = manifest::reconcile(&documents)?;
    writer.write_manifest(&reconciled.manifest, &reconciled.metadata)?;
    summary.manifests = documents.len();

    info!(
        "Merged {} archives: {} entries, {} manifests",
        summary.archives, summary.entries_written, summary.manifests
    );
    Ok(summary)
}
