//! # Release Merge Library
//!
//! This library combines several release archives into one. Each input is a
//! gzip-compressed tar holding payload files plus a `release.MF` manifest; the
//! output is a single archive of the same shape, with every payload entry and
//! one merged manifest. It backs the `release-merge` command-line tool.
//!
//! ## Quick Example
//!
//! ```no_run
//! use flate2::Compression;
//! use release_merge::archive::ReleaseWriter;
//! use release_merge::merge::merge_releases;
//! use std::path::PathBuf;
//!
//! let inputs = vec![PathBuf::from("nginx.tgz"), PathBuf::from("nginx-jobs.tgz")];
//! let writer = ReleaseWriter::new(Vec::new(), Compression::default());
//! let (merged, summary) = merge_releases(&inputs, writer)?;
//! println!("{} entries, {} bytes", summary.entries_written, merged.len());
//! # Ok::<(), release_merge::error::Error>(())
//! ```
//!
//! ## Core Concepts
//!
//! - **Archives (`archive`)**: Streaming reader over one input archive and the
//!   writer that frames the merged output.
//! - **Manifest (`manifest`)**: The `release.MF` schema.
//! - **Merging (`merge`)**: The entry merger with its duplicate policy, the
//!   manifest reconciler, and the driver tying them together.
//!
//! ## Execution Flow
//!
//! 1.  **Open**: Every input archive is opened, in order.
//! 2.  **Stream**: Entries are read one at a time. Payload entries go straight
//!     to the output; manifests are buffered.
//! 3.  **Reconcile**: Buffered manifests are folded into one.
//! 4.  **Finish**: The merged `./release.MF` is appended and the output
//!     archive is finalized.

pub mod archive;
pub mod error;
pub mod manifest;
pub mod merge;
