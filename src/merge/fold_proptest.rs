//! Property-based tests for manifest folding.
//!
//! These tests use proptest to generate random manifest sequences and verify
//! that the fold rules hold for all of them.

#[cfg(test)]
mod proptest_tests {
    use crate::manifest::{CompiledPackageRef, JobRef, PackageRef, ReleaseManifest};
    use crate::merge::manifest::fold_manifest;
    use proptest::prelude::*;
    use std::path::Path;

    fn arb_manifest() -> impl Strategy<Value = ReleaseManifest> {
        (
            "[a-z]{0,8}",
            "[0-9]{1,3}",
            "[0-9a-f]{7}",
            any::<bool>(),
            prop::collection::vec("[a-z]{1,6}", 0..4),
            prop::collection::vec("[a-z]{1,6}", 0..4),
            prop::collection::vec("[a-z]{1,6}", 0..4),
        )
            .prop_map(
                |(name, version, commit_hash, uncommitted_changes, jobs, packages, compiled)| {
                    ReleaseManifest {
                        name,
                        version,
                        commit_hash,
                        uncommitted_changes,
                        jobs: jobs
                            .into_iter()
                            .map(|name| JobRef {
                                name,
                                ..Default::default()
                            })
                            .collect(),
                        packages: packages
                            .into_iter()
                            .map(|name| PackageRef {
                                name,
                                ..Default::default()
                            })
                            .collect(),
                        compiled_packages: compiled
                            .into_iter()
                            .map(|name| CompiledPackageRef {
                                name,
                                ..Default::default()
                            })
                            .collect(),
                        license: None,
                    }
                },
            )
    }

    fn fold_all(manifests: &[ReleaseManifest]) -> ReleaseManifest {
        let mut acc = ReleaseManifest::default();
        for manifest in manifests {
            fold_manifest(&mut acc, manifest.clone(), Path::new("input.tgz"));
        }
        acc
    }

    proptest! {
        /// Property: listings are the in-order concatenation of every input
        #[test]
        fn fold_concatenates_listings(manifests in prop::collection::vec(arb_manifest(), 1..6)) {
            let merged = fold_all(&manifests);

            let jobs: Vec<JobRef> = manifests.iter().flat_map(|m| m.jobs.clone()).collect();
            let packages: Vec<PackageRef> =
                manifests.iter().flat_map(|m| m.packages.clone()).collect();
            let compiled: Vec<CompiledPackageRef> =
                manifests.iter().flat_map(|m| m.compiled_packages.clone()).collect();

            prop_assert_eq!(merged.jobs, jobs);
            prop_assert_eq!(merged.packages, packages);
            prop_assert_eq!(merged.compiled_packages, compiled);
        }

        /// Property: scalar fields always equal the last input's values
        #[test]
        fn fold_scalars_follow_last_manifest(manifests in prop::collection::vec(arb_manifest(), 1..6)) {
            let merged = fold_all(&manifests);
            let last = manifests.last().unwrap();

            prop_assert_eq!(&merged.name, &last.name);
            prop_assert_eq!(&merged.version, &last.version);
            prop_assert_eq!(&merged.commit_hash, &last.commit_hash);
            prop_assert_eq!(merged.uncommitted_changes, last.uncommitted_changes);
            prop_assert_eq!(&merged.license, &last.license);
        }

        /// Property: folding is deterministic
        #[test]
        fn fold_is_deterministic(manifests in prop::collection::vec(arb_manifest(), 0..6)) {
            prop_assert_eq!(fold_all(&manifests), fold_all(&manifests));
        }
    }
}
