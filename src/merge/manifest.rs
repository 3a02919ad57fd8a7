//! Manifest reconciliation
//!
//! Folds the manifests collected from every input into a single
//! `ReleaseManifest`, in input order:
//!
//! | Field                                             | Rule               |
//! |---------------------------------------------------|--------------------|
//! | `name`, `version`, `commit_hash`, `license`,      | last write wins    |
//! | `uncommitted_changes`                             |                    |
//! | `jobs`, `packages`, `compiled_packages`           | append             |
//!
//! File metadata for the synthesized manifest entry is taken from the first
//! collected manifest only.

use log::warn;
use std::path::Path;

use super::entries::ManifestDocument;
use crate::archive::EntryMetadata;
use crate::error::{Error, Result};
use crate::manifest::ReleaseManifest;

/// Result of reconciling all collected manifests
#[derive(Debug, Clone)]
pub struct ReconciledManifest {
    pub manifest: ReleaseManifest,
    /// Header metadata of the first collected manifest
    pub metadata: EntryMetadata,
}

/// Parse and fold every collected manifest document.
///
/// # Errors
///
/// - `Error::NoManifestsFound` if `documents` is empty
/// - `Error::ManifestParse` naming the archive of the first document that is
///   not a valid manifest
pub fn reconcile(documents: &[ManifestDocument]) -> Result<ReconciledManifest> {
    let first = documents.first().ok_or(Error::NoManifestsFound)?;

    let mut merged = ReleaseManifest::default();
    for document in documents {
        let parsed =
            ReleaseManifest::from_yaml(&document.bytes).map_err(|source| Error::ManifestParse {
                archive: document.source.clone(),
                source,
            })?;
        fold_manifest(&mut merged, parsed, &document.source);
    }

    Ok(ReconciledManifest {
        manifest: merged,
        metadata: first.metadata.clone(),
    })
}

/// Fold `next` into the accumulator.
///
/// Scalars are overwritten and listings are appended. A warning is logged when
/// an already set `name` or `version` changes, since the merged release then
/// only carries the later value.
pub fn fold_manifest(acc: &mut ReleaseManifest, next: ReleaseManifest, source: &Path) {
    warn_on_change("name", &acc.name, &next.name, source);
    warn_on_change("version", &acc.version, &next.version, source);

    acc.name = next.name;
    acc.version = next.version;
    acc.commit_hash = next.commit_hash;
    acc.uncommitted_changes = next.uncommitted_changes;
    acc.license = next.license;
    acc.jobs.extend(next.jobs);
    acc.packages.extend(next.packages);
    acc.compiled_packages.extend(next.compiled_packages);
}

fn warn_on_change(field: &str, current: &str, incoming: &str, source: &Path) {
    if !current.is_empty() && current != incoming {
        warn!(
            "{}: Overwriting manifest {} {:?} with {:?}",
            source.display(),
            field,
            current,
            incoming
        );
    }
}
