//! Storage keys: the normalized form under which a reference is stored.
//!
//! Rules, applied in order:
//! - A reference carrying both a tag and a digest keeps only the digest
//! - A reference carrying neither gets the default tag
//! - The repository bucket is the familiar name, the entry key is the
//!   familiar string
//!
//! Bindings are additionally refused when the repository would be named
//! after the canonical digest algorithm, since `sha256:<tag>` reads as a
//! bare digest, and when the familiar string would parse back to a
//! different reference (`docker.io/localhost/app` reads as the
//! `localhost` registry once its default domain is dropped).

use imgref_types::{Reference, CANONICAL_ALGORITHM};

use crate::error::{RefError, Result};

/// The two lookup keys of a stored reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StorageKey {
    /// Repository bucket, e.g. `ubuntu` or `ghcr.io/acme/app`.
    pub repository: String,
    /// Entry within the bucket, e.g. `ubuntu:latest`.
    pub reference: String,
}

impl StorageKey {
    /// Normalize `reference` for reading or removal.
    pub fn for_lookup(reference: &Reference) -> (Reference, StorageKey) {
        let normalized = reference.clone().favor_digest().with_default_tag();
        let key = StorageKey {
            repository: normalized.familiar_name(),
            reference: normalized.familiar_string(),
        };
        (normalized, key)
    }

    /// Normalize `reference` for a new binding.
    pub fn for_binding(reference: &Reference) -> Result<(Reference, StorageKey)> {
        let (normalized, key) = Self::for_lookup(reference);
        if key.repository == CANONICAL_ALGORITHM {
            return Err(RefError::InvalidTag {
                reason: "refusing to create an ambiguous tag using digest algorithm as name".into(),
            });
        }
        let reparsed = Reference::parse_normalized(&key.reference)?;
        if reparsed != normalized {
            return Err(RefError::InvalidReference {
                reference: normalized.to_string(),
                reason: format!("stored form {} names {reparsed}", key.reference),
            });
        }
        Ok((normalized, key))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use imgref_types::Digest;

    fn parse(s: &str) -> Reference {
        Reference::parse_normalized(s).unwrap()
    }

    #[test]
    fn name_only_gets_default_tag() {
        let (normalized, key) = StorageKey::for_lookup(&parse("ubuntu"));
        assert_eq!(normalized.tag(), Some("latest"));
        assert_eq!(key.repository, "ubuntu");
        assert_eq!(key.reference, "ubuntu:latest");
    }

    #[test]
    fn digest_wins_over_tag() {
        let d = Digest::from_content(b"image");
        let (normalized, key) = StorageKey::for_lookup(&parse(&format!("ubuntu:22.04@{d}")));
        assert_eq!(normalized.tag(), None);
        assert_eq!(key.reference, format!("ubuntu@{d}"));
    }

    #[test]
    fn registry_references_keep_their_domain() {
        let (_, key) = StorageKey::for_lookup(&parse("localhost:5000/app:v1"));
        assert_eq!(key.repository, "localhost:5000/app");
        assert_eq!(key.reference, "localhost:5000/app:v1");
    }

    #[test]
    fn reject_repository_named_after_digest_algorithm() {
        let err = StorageKey::for_binding(&parse("sha256:abc")).unwrap_err();
        assert!(matches!(err, RefError::InvalidTag { .. }));
        assert!(StorageKey::for_binding(&parse("sha256x:abc")).is_ok());
    }

    #[test]
    fn reject_hub_namespace_that_reads_as_a_registry() {
        for ambiguous in ["docker.io/localhost/app:v1", "docker.io/my.host/app:v1"] {
            let err = StorageKey::for_binding(&parse(ambiguous)).unwrap_err();
            assert!(matches!(err, RefError::InvalidReference { .. }), "{ambiguous}");
        }
        let (normalized, key) = StorageKey::for_binding(&parse("localhost/app:v1")).unwrap();
        assert_eq!(normalized.domain(), "localhost");
        assert_eq!(key.reference, "localhost/app:v1");
    }

    #[test]
    fn lookup_does_not_reject_algorithm_name() {
        let (_, key) = StorageKey::for_lookup(&parse("sha256:abc"));
        assert_eq!(key.repository, "sha256");
    }
}
