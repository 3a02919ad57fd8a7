//! Output archive writer
//!
//! `ReleaseWriter` frames entries into a gzip-compressed tar stream. Pass-through
//! entries keep their original header block byte-for-byte; the merged manifest
//! gets a freshly built header.
//!
//! A writer ends in exactly one of two ways, both of which consume it:
//!
//! - `finish` writes the tar trailer, closes the gzip stream and hands back the
//!   sink.
//! - `abandon` cuts the sink off first, so whatever was already written stays
//!   truncated and is never mistaken for a complete archive.

use std::io::{self, Read, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::write::GzEncoder;
use flate2::Compression;
use log::debug;
use tar::{Builder, EntryType, Header};

use super::{EntryMetadata, ReleaseEntry};
use crate::error::{Error, Result};
use crate::manifest::{ReleaseManifest, MANIFEST_ENTRY_NAME};

/// Sink wrapper that silently discards everything once closed.
struct OutputGate<W: Write> {
    inner: W,
    open: bool,
}

impl<W: Write> Write for OutputGate<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if self.open {
            self.inner.write(buf)
        } else {
            Ok(buf.len())
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        if self.open {
            self.inner.flush()
        } else {
            Ok(())
        }
    }
}

/// Writer for a merged release archive
pub struct ReleaseWriter<W: Write> {
    builder: Builder<GzEncoder<OutputGate<W>>>,
}

impl<W: Write> ReleaseWriter<W> {
    pub fn new(sink: W, compression: Compression) -> Self {
        let gate = OutputGate {
            inner: sink,
            open: true,
        };
        Self {
            builder: Builder::new(GzEncoder::new(gate, compression)),
        }
    }

    /// Copy one entry from an input archive, streaming its content.
    ///
    /// PAX extended header records are re-emitted first, unchanged. The
    /// input header block follows as is, except that its checksum is
    /// refreshed when PAX owner ids were folded into it on read. Names or
    /// link targets that only fit through a GNU long-name extension get that
    /// extension re-emitted ahead of the header.
    pub fn write_entry<R: Read>(&mut self, entry: &mut ReleaseEntry<'_, R>) -> io::Result<()> {
        let mut header = entry.header().clone();
        let pax = entry.pax_records()?;
        let has_pax = |key: &str| {
            pax.as_ref()
                .is_some_and(|records| records.iter().any(|(k, _)| k == key))
        };
        let long_name = !has_pax("path") && entry.path_bytes() != header.path_bytes();
        let long_link = !has_pax("linkpath") && entry.link_name_bytes() != header.link_name_bytes();

        if let Some(records) = &pax {
            self.builder.append_pax_extensions(
                records
                    .iter()
                    .map(|(key, value)| (key.as_str(), value.as_slice())),
            )?;
            header.set_cksum();
        }

        if long_link {
            let path = entry.path()?;
            let target = entry.link_name()?.unwrap_or_default();
            self.builder.append_link(&mut header, path, target)
        } else if long_name {
            let path = entry.path()?;
            self.builder.append_data(&mut header, path, entry)
        } else {
            self.builder.append(&header, entry)
        }
    }

    /// Write the merged manifest as `./release.MF`.
    ///
    /// Mode and ownership come from `origin`; the modification time is now.
    pub fn write_manifest(
        &mut self,
        manifest: &ReleaseManifest,
        origin: &EntryMetadata,
    ) -> Result<()> {
        let content = manifest.to_yaml()?;
        let header = manifest_header(content.len() as u64, origin)
            .map_err(|e| Error::write("encoding manifest header", e))?;

        debug!(
            "Writing {} ({} bytes)",
            MANIFEST_ENTRY_NAME,
            content.len()
        );
        self.builder
            .append(&header, content.as_slice())
            .map_err(|e| Error::write(format!("writing {}", MANIFEST_ENTRY_NAME), e))
    }

    /// Finalize the archive and return the underlying sink.
    pub fn finish(self) -> Result<W> {
        let encoder = self
            .builder
            .into_inner()
            .map_err(|e| Error::write("finishing tar stream", e))?;
        let mut gate = encoder
            .finish()
            .map_err(|e| Error::write("finishing gzip stream", e))?;
        gate.inner
            .flush()
            .map_err(|e| Error::write("flushing output", e))?;
        Ok(gate.inner)
    }

    /// Drop the writer without finalizing the archive.
    pub fn abandon(mut self) {
        self.builder.get_mut().get_mut().open = false;
    }
}

fn manifest_header(size: u64, origin: &EntryMetadata) -> io::Result<Header> {
    let mut header = Header::new_ustar();
    // set_path would normalize away the leading "./"
    let name = MANIFEST_ENTRY_NAME.as_bytes();
    header.as_old_mut().name[..name.len()].copy_from_slice(name);
    header.set_entry_type(EntryType::Regular);
    header.set_size(size);
    header.set_mode(origin.mode);
    header.set_uid(origin.uid);
    header.set_gid(origin.gid);
    if let Some(username) = &origin.username {
        header.set_username(username)?;
    }
    if let Some(groupname) = &origin.groupname {
        header.set_groupname(groupname)?;
    }
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    header.set_mtime(now);
    header.set_cksum();
    Ok(header)
}
