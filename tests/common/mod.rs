//! Shared test utilities for integration and E2E tests.
//!
//! This module provides release archive builders, a temp-directory fixture
//! and helpers for inspecting merged output, so individual test files stay
//! focused on behavior.
//!
//! ## Usage
//!
//! Add `mod common;` to your test file, then use the helpers:
//!
//! ```rust,ignore
//! mod common;
//! use common::prelude::*;
//!
//! #[test]
//! fn test_example() {
//!     let fixture = TestFixture::new()
//!         .with_release("a.tgz", &ReleaseBuilder::new().manifest(manifests::FOO_V1));
//!     // ... test code
//! }
//! ```

use assert_fs::prelude::*;
use flate2::read::MultiGzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use release_merge::manifest::ReleaseManifest;
use std::io::Read;
use std::path::{Path, PathBuf};
use tar::{Archive, Builder, EntryType, Header};

/// Re-export commonly used test dependencies for convenience.
pub mod prelude {
    #[allow(unused_imports)]
    pub use assert_cmd::cargo::cargo_bin_cmd;
    #[allow(unused_imports)]
    pub use assert_fs::prelude::*;
    #[allow(unused_imports)]
    pub use predicates::prelude::*;

    #[allow(unused_imports)]
    pub use super::manifests;
    #[allow(unused_imports)]
    pub use super::{entry_names, read_release, OutputEntry, ReleaseBuilder, TestFixture};
}

/// Common manifest documents for testing.
#[allow(dead_code)]
pub mod manifests {
    /// First half of the two-part `foo` release.
    pub const FOO_V1: &str = r#"
name: foo
version: "1"
commit_hash: aaaaaaa
uncommitted_changes: true
jobs:
- name: job-a
  version: ja1
  fingerprint: ja1
  sha1: sha256:0a
packages:
- name: p1
  version: p11
  fingerprint: p11
  sha1: sha256:01
  dependencies: []
"#;

    /// Second half of the two-part `foo` release.
    pub const FOO_V2: &str = r#"
name: foo
version: "2"
commit_hash: bbbbbbb
uncommitted_changes: false
jobs:
- name: job-b
  version: jb1
  fingerprint: jb1
  sha1: sha256:0b
packages:
- name: p2
  version: p21
  fingerprint: p21
  sha1: sha256:02
  dependencies: [p1]
"#;

    /// A compiled release with a license.
    pub const COMPILED: &str = r#"
name: foo
version: "3"
commit_hash: ccccccc
compiled_packages:
- name: p1
  version: p11
  fingerprint: p11
  sha1: sha256:c1
  stemcell: ubuntu-jammy/1.83
  dependencies: []
license:
  version: lic1
  fingerprint: lic1
  sha1: sha256:11
"#;

    /// Invalid YAML for error testing.
    pub const INVALID_YAML: &str = "name: [unclosed";
}

/// Builder for a gzip-compressed release tarball.
///
/// Entry names are written into the header verbatim, so `./` prefixes and
/// trailing slashes on directories look the way release tooling writes them.
#[derive(Clone, Default)]
pub struct ReleaseBuilder {
    entries: Vec<(String, EntryType, Vec<u8>, Option<String>)>,
}

#[allow(dead_code)]
impl ReleaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a directory entry.
    pub fn dir(mut self, name: &str) -> Self {
        self.entries
            .push((name.to_string(), EntryType::Directory, Vec::new(), None));
        self
    }

    /// Add a regular file entry.
    pub fn file(mut self, name: &str, content: impl AsRef<[u8]>) -> Self {
        self.entries.push((
            name.to_string(),
            EntryType::Regular,
            content.as_ref().to_vec(),
            None,
        ));
        self
    }

    /// Add a symbolic link entry.
    pub fn symlink(mut self, name: &str, target: &str) -> Self {
        self.entries.push((
            name.to_string(),
            EntryType::Symlink,
            Vec::new(),
            Some(target.to_string()),
        ));
        self
    }

    /// Add the `./release.MF` manifest entry.
    pub fn manifest(self, yaml: &str) -> Self {
        self.file("./release.MF", yaml)
    }

    /// Build the compressed archive bytes.
    pub fn build(&self) -> Vec<u8> {
        let mut builder = Builder::new(GzEncoder::new(Vec::new(), Compression::default()));
        for (name, entry_type, content, link) in &self.entries {
            let mut header = Header::new_ustar();
            let bytes = name.as_bytes();
            header.as_old_mut().name[..bytes.len()].copy_from_slice(bytes);
            header.set_entry_type(*entry_type);
            header.set_mode(if entry_type.is_dir() { 0o755 } else { 0o644 });
            header.set_uid(1000);
            header.set_gid(1000);
            header.set_username("vcap").unwrap();
            header.set_groupname("vcap").unwrap();
            header.set_mtime(1_600_000_000);
            header.set_size(content.len() as u64);
            if let Some(target) = link {
                header.set_link_name(target).unwrap();
            }
            header.set_cksum();
            builder.append(&header, content.as_slice()).unwrap();
        }
        builder.into_inner().unwrap().finish().unwrap()
    }
}

/// A test fixture that provides a temporary directory of release archives.
pub struct TestFixture {
    temp_dir: assert_fs::TempDir,
}

#[allow(dead_code)]
impl TestFixture {
    /// Create a new test fixture with an empty temporary directory.
    pub fn new() -> Self {
        Self {
            temp_dir: assert_fs::TempDir::new().expect("Failed to create temp directory"),
        }
    }

    /// Write a release archive built by `release` under `name`.
    pub fn with_release(self, name: &str, release: &ReleaseBuilder) -> Self {
        self.temp_dir
            .child(name)
            .write_binary(&release.build())
            .expect("Failed to write release archive");
        self
    }

    /// Write arbitrary bytes under `name`.
    pub fn with_binary_file(self, name: &str, content: &[u8]) -> Self {
        self.temp_dir
            .child(name)
            .write_binary(content)
            .expect("Failed to write file");
        self
    }

    /// Get the path to the temporary directory.
    pub fn path(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Path of a file inside the fixture directory.
    pub fn release(&self, name: &str) -> PathBuf {
        self.temp_dir.path().join(name)
    }

    /// Create a child path in the temp directory.
    pub fn child(&self, path: &str) -> assert_fs::fixture::ChildPath {
        self.temp_dir.child(path)
    }

    /// Paths of several files inside the fixture directory, in order.
    pub fn releases(&self, names: &[&str]) -> Vec<PathBuf> {
        names.iter().map(|name| self.release(name)).collect()
    }
}

impl Default for TestFixture {
    fn default() -> Self {
        Self::new()
    }
}

/// One entry of a merged archive, fully read into memory.
#[allow(dead_code)]
#[derive(Debug)]
pub struct OutputEntry {
    pub name: String,
    pub entry_type: EntryType,
    pub header: Vec<u8>,
    pub mode: u32,
    pub uid: u64,
    pub username: Option<String>,
    pub mtime: u64,
    pub content: Vec<u8>,
}

#[allow(dead_code)]
impl OutputEntry {
    pub fn manifest(&self) -> ReleaseManifest {
        ReleaseManifest::from_yaml(&self.content).expect("merged manifest should parse")
    }
}

/// Decode a gzip-compressed tar archive into its entries.
#[allow(dead_code)]
pub fn read_release(bytes: &[u8]) -> Vec<OutputEntry> {
    let mut archive = Archive::new(MultiGzDecoder::new(bytes));
    archive
        .entries()
        .expect("output should be a tar stream")
        .map(|entry| {
            let mut entry = entry.expect("output entry should be readable");
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            let header = entry.header();
            OutputEntry {
                name: String::from_utf8_lossy(&entry.path_bytes()).into_owned(),
                entry_type: header.entry_type(),
                header: header.as_bytes().to_vec(),
                mode: header.mode().unwrap(),
                uid: header.uid().unwrap(),
                username: header.username().unwrap().map(str::to_string),
                mtime: header.mtime().unwrap(),
                content,
            }
        })
        .collect()
}

/// Names of all entries in an archive, in order.
#[allow(dead_code)]
pub fn entry_names(entries: &[OutputEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}
