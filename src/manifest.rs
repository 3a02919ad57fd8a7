//! # Release Manifest Schema
//!
//! This module defines the data structures that represent a `release.MF`
//! document, the YAML manifest every release archive carries. The types are
//! read and written as-is; nothing here checks that versions, fingerprints or
//! dependency lists make sense.
//!
//! ## Key Components
//!
//! - **`ReleaseManifest`**: The whole document: identity fields plus the job,
//!   package and compiled package listings.
//! - **`JobRef`**, **`PackageRef`**, **`CompiledPackageRef`**, **`LicenseRef`**:
//!   One listing entry each.
//!
//! Missing keys deserialize to their defaults, unknown keys are ignored, and
//! empty listings are left out when serializing.

use serde::{Deserialize, Deserializer, Serialize};

/// Suffix identifying the manifest entry inside a release archive.
pub const MANIFEST_SUFFIX: &str = "release.MF";

/// Entry name used for the synthesized manifest in a merged archive.
pub const MANIFEST_ENTRY_NAME: &str = "./release.MF";

/// A job listed in a release manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobRef {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: String,
    /// Packages the job depends on
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub packages: Vec<String>,
}

/// A source package listed in a release manifest
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PackageRef {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
}

/// A package compiled against a specific stemcell
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompiledPackageRef {
    pub name: String,
    pub version: String,
    pub fingerprint: String,
    pub sha1: String,
    /// Stemcell OS and version slug, e.g. `ubuntu-jammy/1.83`
    pub stemcell: String,
    #[serde(deserialize_with = "null_as_default")]
    pub dependencies: Vec<String>,
}

/// The license bundled with a release
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LicenseRef {
    pub version: String,
    pub fingerprint: String,
    pub sha1: String,
}

/// A parsed `release.MF` document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReleaseManifest {
    pub name: String,
    pub version: String,
    pub commit_hash: String,
    #[serde(deserialize_with = "null_as_default")]
    pub uncommitted_changes: bool,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub jobs: Vec<JobRef>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub packages: Vec<PackageRef>,
    #[serde(
        skip_serializing_if = "Vec::is_empty",
        deserialize_with = "null_as_default"
    )]
    pub compiled_packages: Vec<CompiledPackageRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license: Option<LicenseRef>,
}

impl ReleaseManifest {
    /// Parse a manifest from raw entry bytes.
    ///
    /// A document that is empty or holds only whitespace yields an empty
    /// manifest rather than an error.
    pub fn from_yaml(bytes: &[u8]) -> Result<Self, serde_yaml::Error> {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_yaml::from_slice(bytes)
    }

    /// Serialize the manifest to YAML bytes.
    pub fn to_yaml(&self) -> Result<Vec<u8>, serde_yaml::Error> {
        serde_yaml::to_string(self).map(String::into_bytes)
    }
}

/// Read an explicit YAML null as the field's default.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Check whether an archive entry name refers to a release manifest.
pub fn is_manifest_name(name: &str) -> bool {
    name.ends_with(MANIFEST_SUFFIX)
}
