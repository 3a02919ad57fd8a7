//! Entry merging
//!
//! The `EntryMerger` walks input archives one after the other and decides,
//! entry by entry, what happens to it:
//!
//! - Manifest entries (`*release.MF`) are buffered in memory as
//!   `ManifestDocument`s for the reconciler and are not forwarded.
//! - Every other entry is checked against the `UniqueEntryIndex` and then
//!   streamed straight to the output writer, in input order.
//!
//! All bookkeeping lives in the merger value itself; nothing is global.

use std::collections::hash_map::Entry;
use std::collections::HashMap;
use std::io::{Read, Write};
use std::path::PathBuf;

use log::{debug, info};

use super::MergeSummary;
use crate::archive::{EntryKind, EntryMetadata, ReleaseArchive, ReleaseWriter};
use crate::error::{Error, Result};
use crate::manifest::is_manifest_name;

/// Raw manifest content collected from one input archive
#[derive(Debug, Clone)]
pub struct ManifestDocument {
    /// Archive the manifest was read from
    pub source: PathBuf,
    pub bytes: Vec<u8>,
    /// Header metadata of the manifest entry
    pub metadata: EntryMetadata,
}

/// Outcome of registering an entry name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    /// First time this name was seen
    New,
    /// A directory already produced by an earlier archive
    RepeatedDirectory,
    /// The name appeared earlier in the same archive
    RepeatedInArchive,
}

/// Identifies one input of a merge: its position on the command line and its
/// path. The same path given twice is two different inputs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputSource {
    pub position: usize,
    pub path: PathBuf,
}

impl InputSource {
    pub fn new(position: usize, path: impl Into<PathBuf>) -> Self {
        Self {
            position,
            path: path.into(),
        }
    }
}

/// Index from entry name to the first input that produced it
///
/// Enforces that a non-directory name never comes from two different
/// inputs.
#[derive(Debug, Default)]
pub struct UniqueEntryIndex {
    seen: HashMap<String, InputSource>,
}

impl UniqueEntryIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `name` as coming from `source`.
    ///
    /// Fails with `Error::DuplicateEntry` when a different input already
    /// produced the name and the entry is not a directory.
    pub fn register(
        &mut self,
        name: &str,
        kind: EntryKind,
        source: &InputSource,
    ) -> Result<Registration> {
        match self.seen.entry(name.to_string()) {
            Entry::Vacant(slot) => {
                slot.insert(source.clone());
                Ok(Registration::New)
            }
            Entry::Occupied(slot) if slot.get().position == source.position => {
                Ok(Registration::RepeatedInArchive)
            }
            Entry::Occupied(_) if kind == EntryKind::Directory => {
                Ok(Registration::RepeatedDirectory)
            }
            Entry::Occupied(slot) => Err(Error::DuplicateEntry {
                name: name.to_string(),
                first: slot.get().path.clone(),
                second: source.path.clone(),
            }),
        }
    }

    /// Path of the input that first produced `name`, if any.
    #[cfg(test)]
    pub(crate) fn origin(&self, name: &str) -> Option<&std::path::Path> {
        self.seen.get(name).map(|source| source.path.as_path())
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.seen.len()
    }

    #[cfg(test)]
    pub(crate) fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Accumulated state of a merge in progress
#[derive(Debug, Default)]
pub struct EntryMerger {
    index: UniqueEntryIndex,
    manifests: Vec<ManifestDocument>,
    summary: MergeSummary,
}

impl EntryMerger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Consume every entry of `archive`, forwarding pass-through entries to
    /// `writer` and collecting the manifest.
    pub fn merge_archive<R: Read, W: Write>(
        &mut self,
        archive: &mut ReleaseArchive<R>,
        writer: &mut ReleaseWriter<W>,
    ) -> Result<()> {
        let input = InputSource::new(self.summary.archives, archive.path());
        let source = input.path.clone();
        info!("Merging {}", source.display());

        let mut entries = archive.entries()?;
        while let Some(entry) = entries.next() {
            let mut entry = entry?;

            if is_manifest_name(entry.name()) {
                let bytes = entry.read_content().map_err(|source_err| Error::ManifestRead {
                    archive: source.clone(),
                    source: source_err,
                })?;
                debug!(
                    "Collected manifest {} from {} ({} bytes)",
                    entry.name(),
                    source.display(),
                    bytes.len()
                );
                self.manifests.push(ManifestDocument {
                    source: source.clone(),
                    bytes,
                    metadata: entry.metadata().clone(),
                });
                continue;
            }

            match self.index.register(entry.name(), entry.kind(), &input)? {
                Registration::New => {}
                Registration::RepeatedDirectory => self.summary.repeated_directories += 1,
                Registration::RepeatedInArchive => {
                    debug!("{} appears more than once in {}", entry.name(), source.display());
                }
            }

            debug!("Forwarding {}", entry.name());
            if let Err(e) = writer.write_entry(&mut entry) {
                return Err(if entry.read_failed() {
                    entries.input_error(e)
                } else {
                    Error::write(format!("writing entry {}", entry.name()), e)
                });
            }
            self.summary.entries_written += 1;
        }

        self.summary.archives += 1;
        Ok(())
    }

    /// Manifests collected so far, in input order.
    #[cfg(test)]
    pub(crate) fn manifests(&self) -> &[ManifestDocument] {
        &self.manifests
    }

    #[cfg(test)]
    pub(crate) fn index(&self) -> &UniqueEntryIndex {
        &self.index
    }

    /// Hand over the collected manifests and the running summary.
    pub fn into_parts(self) -> (Vec<ManifestDocument>, MergeSummary) {
        (self.manifests, self.summary)
    }
}
