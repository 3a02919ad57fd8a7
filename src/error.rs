//! # Error Handling
//!
//! This module defines the centralized error type for `release-merge`. It uses
//! the `thiserror` library to build an `Error` enum that covers every way a
//! merge can fail, each variant carrying the archive path and/or entry name
//! needed to act on the message.
//!
//! ## Key Components
//!
//! - **`Error`**: The enum of all failure modes. There is no local recovery
//!   anywhere in the merge; each variant is terminal and propagates up to the
//!   command layer, which abandons the output and exits non-zero.
//!
//! - **`Result<T>`**: A type alias for `std::result::Result<T, Error>`.
//!
//! The variants fall into a few groups:
//!
//! - Argument problems (`Usage`).
//! - Per-input faults (`Open`, `Decompression`, `ArchiveFormat`).
//! - Merge policy violations (`DuplicateEntry`, `NoManifestsFound`).
//! - Manifest handling (`ManifestRead`, `ManifestParse`, `Serialization`).
//! - Output faults (`Write`).

use std::path::PathBuf;

use thiserror::Error;

/// Main error type for release merge operations
#[derive(Error, Debug)]
pub enum Error {
    /// The merge was invoked with an unusable set of arguments.
    #[error("Usage error: {message}")]
    Usage { message: String },

    /// An input archive could not be opened.
    #[error("Failed to open release archive {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The gzip envelope of an input archive is invalid or truncated.
    #[error("Decompression error in {}: {message}", path.display())]
    Decompression { path: PathBuf, message: String },

    /// A tar header or entry body in an input archive is malformed.
    #[error("Archive format error in {}: {message}", path.display())]
    ArchiveFormat { path: PathBuf, message: String },

    /// Two input archives carry a non-directory entry with the same name.
    #[error("Found duplicated file {name:?} present in both {} and {}", first.display(), second.display())]
    DuplicateEntry {
        name: String,
        /// Archive that produced the entry first
        first: PathBuf,
        /// Archive that produced the colliding entry
        second: PathBuf,
    },

    /// The content of a manifest entry could not be read.
    #[error("Error reading manifest in {}: {source}", archive.display())]
    ManifestRead {
        archive: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A manifest entry is not a valid release manifest document.
    #[error("Error parsing release manifest from {}: {source}", archive.display())]
    ManifestParse {
        archive: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    /// None of the inputs contained a manifest entry.
    #[error("No release.MF manifest found in any of the input archives")]
    NoManifestsFound,

    /// The merged manifest could not be serialized.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_yaml::Error),

    /// Writing to the output stream failed.
    #[error("Error writing to output stream: {context}: {source}")]
    Write {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Wrap an output-side I/O failure with a short description of the step.
    pub fn write(context: impl Into<String>, source: std::io::Error) -> Self {
        Error::Write {
            context: context.into(),
            source,
        }
    }
}

/// A convenient type alias for `Result<T, Error>`.
pub type Result<T> = std::result::Result<T, Error>;
