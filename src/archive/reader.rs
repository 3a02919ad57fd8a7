//! Streaming reader for release archives
//!
//! A `ReleaseArchive` wraps one gzip-compressed tar input. Its entries are
//! produced lazily and strictly forward: each entry's content must be consumed
//! (or skipped) before the next one is requested, and the sequence cannot be
//! restarted.
//!
//! Failures are reported with the archive path attached:
//!
//! - `Error::Open` when the file cannot be opened
//! - `Error::Decompression` when the gzip layer rejects the stream
//! - `Error::ArchiveFormat` when a tar header is malformed or an entry is
//!   shorter than its header declares
//!
//! A clean end of archive simply ends the iterator.

use std::borrow::Cow;
use std::cell::Cell;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use flate2::read::MultiGzDecoder;
use tar::{Archive, Header};

use super::{EntryKind, EntryMetadata};
use crate::error::{Error, Result};

/// Gzip decoder that records whether it has ever returned an error.
///
/// The tar layer reports every failure as a plain `io::Error`, so the flag is
/// what tells a broken compression envelope apart from a broken tar header.
struct GzipStream<R: Read> {
    decoder: MultiGzDecoder<R>,
    failed: Rc<Cell<bool>>,
}

impl<R: Read> Read for GzipStream<R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.decoder
            .read(buf)
            .inspect_err(|_| self.failed.set(true))
    }
}

/// One gzip-compressed tar input
pub struct ReleaseArchive<R: Read = BufReader<File>> {
    path: PathBuf,
    archive: Archive<GzipStream<R>>,
    decode_failed: Rc<Cell<bool>>,
}

impl ReleaseArchive {
    /// Open a release archive on disk.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|source| Error::Open {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_reader(path, BufReader::new(file))
    }
}

impl<R: Read> ReleaseArchive<R> {
    /// Wrap an arbitrary byte source; `path` is only used to label errors.
    ///
    /// The gzip header is parsed immediately, so input that is not gzip at
    /// all fails here rather than halfway through a merge.
    pub fn from_reader(path: impl Into<PathBuf>, reader: R) -> Result<Self> {
        let path = path.into();
        let decoder = MultiGzDecoder::new(reader);
        if decoder.header().is_none() {
            return Err(Error::Decompression {
                path,
                message: "invalid gzip header".to_string(),
            });
        }

        let decode_failed = Rc::new(Cell::new(false));
        let archive = Archive::new(GzipStream {
            decoder,
            failed: Rc::clone(&decode_failed),
        });

        Ok(Self {
            path,
            archive,
            decode_failed,
        })
    }

    /// Path of the archive, as given when it was opened.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Start iterating over the archive's entries.
    ///
    /// Can only be called once per archive.
    pub fn entries(&mut self) -> Result<ArchiveEntries<'_, R>> {
        let entries = self
            .archive
            .entries()
            .map_err(|e| Error::ArchiveFormat {
                path: self.path.clone(),
                message: e.to_string(),
            })?;

        Ok(ArchiveEntries {
            path: &self.path,
            entries,
            decode_failed: Rc::clone(&self.decode_failed),
        })
    }
}

/// Lazy iterator over the entries of a `ReleaseArchive`
pub struct ArchiveEntries<'a, R: Read> {
    path: &'a Path,
    entries: tar::Entries<'a, GzipStream<R>>,
    decode_failed: Rc<Cell<bool>>,
}

impl<R: Read> ArchiveEntries<'_, R> {
    /// Attach archive context to an error raised while reading input.
    pub fn input_error(&self, error: io::Error) -> Error {
        if self.decode_failed.get() {
            Error::Decompression {
                path: self.path.to_path_buf(),
                message: error.to_string(),
            }
        } else {
            Error::ArchiveFormat {
                path: self.path.to_path_buf(),
                message: error.to_string(),
            }
        }
    }
}

impl<'a, R: Read> Iterator for ArchiveEntries<'a, R> {
    type Item = Result<ReleaseEntry<'a, R>>;

    fn next(&mut self) -> Option<Self::Item> {
        let entry = match self.entries.next()? {
            Ok(entry) => entry,
            Err(e) => return Some(Err(self.input_error(e))),
        };

        Some(
            ReleaseEntry::new(entry).map_err(|message| Error::ArchiveFormat {
                path: self.path.to_path_buf(),
                message,
            }),
        )
    }
}

/// A single entry read from a release archive
///
/// Reading from the entry streams its content. Content that ends before the
/// size declared in the header is reported as `UnexpectedEof`.
pub struct ReleaseEntry<'a, R: Read> {
    name: String,
    kind: EntryKind,
    metadata: EntryMetadata,
    inner: tar::Entry<'a, GzipStream<R>>,
    remaining: u64,
    read_failed: bool,
}

impl<'a, R: Read> ReleaseEntry<'a, R> {
    fn new(inner: tar::Entry<'a, GzipStream<R>>) -> std::result::Result<Self, String> {
        let name = String::from_utf8_lossy(&inner.path_bytes()).into_owned();
        let entry_type = inner.header().entry_type();
        if entry_type.is_gnu_sparse() {
            return Err(format!("sparse entry {:?} is not supported", name));
        }

        let mut metadata = EntryMetadata::from_header(inner.header())
            .map_err(|message| format!("entry {:?}: {}", name, message))?;
        // a PAX size record overrides the header field
        metadata.size = inner.size();

        Ok(Self {
            kind: EntryKind::from_header(inner.header(), &name),
            remaining: metadata.size,
            name,
            metadata,
            inner,
            read_failed: false,
        })
    }

    /// Full entry name, including any long-name extension.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> EntryKind {
        self.kind
    }

    pub fn metadata(&self) -> &EntryMetadata {
        &self.metadata
    }

    /// The raw header block as it appeared in the input.
    pub fn header(&self) -> &Header {
        self.inner.header()
    }

    /// Raw entry name bytes, including any long-name extension.
    pub fn path_bytes(&self) -> Cow<'_, [u8]> {
        self.inner.path_bytes()
    }

    /// Raw link target bytes, including any long-link extension.
    pub fn link_name_bytes(&self) -> Option<Cow<'_, [u8]>> {
        self.inner.link_name_bytes()
    }

    pub fn path(&self) -> io::Result<PathBuf> {
        self.inner.path().map(Cow::into_owned)
    }

    pub fn link_name(&self) -> io::Result<Option<PathBuf>> {
        self.inner.link_name().map(|name| name.map(Cow::into_owned))
    }

    /// The PAX extended header records describing this entry, in order.
    ///
    /// `None` when the entry has no extended header. PAX header entries that
    /// surface on their own (global headers) report `None` too, since their
    /// records are their content.
    pub fn pax_records(&mut self) -> io::Result<Option<Vec<(String, Vec<u8>)>>> {
        let entry_type = self.inner.header().entry_type();
        if entry_type.is_pax_global_extensions() || entry_type.is_pax_local_extensions() {
            return Ok(None);
        }

        let records = match self.inner.pax_extensions() {
            Ok(Some(extensions)) => extensions
                .map(|extension| {
                    let extension = extension?;
                    let key = extension
                        .key()
                        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                    Ok((key.to_string(), extension.value_bytes().to_vec()))
                })
                .collect::<io::Result<Vec<_>>>()
                .map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };
        if records.is_err() {
            self.read_failed = true;
        }
        records
    }

    /// Whether a read of this entry's content has failed.
    ///
    /// Lets callers copying the entry elsewhere tell input faults from output
    /// faults.
    pub fn read_failed(&self) -> bool {
        self.read_failed
    }

    /// Buffer the whole content in memory.
    pub fn read_content(&mut self) -> io::Result<Vec<u8>> {
        let mut content = Vec::with_capacity(self.remaining.min(1 << 20) as usize);
        self.read_to_end(&mut content)?;
        Ok(content)
    }
}

impl<R: Read> Read for ReleaseEntry<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self.inner.read(buf) {
            Ok(0) if self.remaining > 0 && !buf.is_empty() => {
                self.read_failed = true;
                Err(io::Error::new(
                    io::ErrorKind::UnexpectedEof,
                    format!(
                        "entry {:?} truncated: {} bytes missing",
                        self.name, self.remaining
                    ),
                ))
            }
            Ok(n) => {
                self.remaining = self.remaining.saturating_sub(n as u64);
                Ok(n)
            }
            Err(e) => {
                self.read_failed = true;
                Err(e)
            }
        }
    }
}
