//! Release archive I/O
//!
//! Release archives are gzip-compressed tar streams. This module provides a
//! streaming reader over the entries of one input archive and a writer that
//! produces the merged output archive.
//!
//! ## Components
//!
//! - `reader.rs` - Opens an input archive and yields its entries lazily
//! - `writer.rs` - Frames entries into the output archive and finalizes it
//!
//! ## Common Types
//!
//! `EntryKind` and `EntryMetadata` describe an entry independently of the tar
//! header layout, so the merge logic never has to touch raw header fields.

pub mod reader;
pub mod writer;

pub use reader::{ArchiveEntries, ReleaseArchive, ReleaseEntry};
pub use writer::ReleaseWriter;

use tar::Header;

/// Coarse classification of an archive entry
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntryKind {
    /// A regular file with content
    File,
    /// A directory
    Directory,
    /// Links, devices, fifos and anything else
    Other,
}

impl EntryKind {
    /// Classify an entry from its header and full name.
    ///
    /// Old-style headers have no directory type: a NUL typeflag on a name
    /// ending in `/` marks a directory.
    pub fn from_header(header: &Header, name: &str) -> Self {
        let entry_type = header.entry_type();
        if entry_type.is_dir() || (header.as_old().linkflag[0] == 0 && name.ends_with('/')) {
            EntryKind::Directory
        } else if entry_type.is_file() || entry_type.is_contiguous() {
            EntryKind::File
        } else {
            EntryKind::Other
        }
    }
}

/// Filesystem metadata carried by an entry header
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EntryMetadata {
    /// Permission bits
    pub mode: u32,
    pub uid: u64,
    pub gid: u64,
    pub username: Option<String>,
    pub groupname: Option<String>,
    /// Content size in bytes
    pub size: u64,
    /// Modification time in seconds since the Unix epoch
    pub mtime: u64,
}

impl EntryMetadata {
    /// Read the metadata fields out of a tar header.
    ///
    /// Owner names are decoded lossily. Fails with a description of the first
    /// numeric field that cannot be decoded.
    pub fn from_header(header: &Header) -> Result<Self, String> {
        let field = |name: &str, e: std::io::Error| format!("invalid {} field: {}", name, e);
        let lossy = |bytes: &[u8]| String::from_utf8_lossy(bytes).into_owned();
        let username = header.username_bytes().map(lossy);
        let groupname = header.groupname_bytes().map(lossy);

        Ok(Self {
            mode: header.mode().map_err(|e| field("mode", e))?,
            uid: header.uid().map_err(|e| field("uid", e))?,
            gid: header.gid().map_err(|e| field("gid", e))?,
            username,
            groupname,
            size: header.entry_size().map_err(|e| field("size", e))?,
            mtime: header.mtime().map_err(|e| field("mtime", e))?,
        })
    }
}
