//! The in-memory catalog: forward mapping plus its derived reverse index.
//!
//! [`Catalog`] holds every binding rule of the store and nothing else. It
//! takes no locks and does no I/O; the stores wrap it in a `RwLock` and
//! decide when to persist.
//!
//! - Forward mapping: repository name -> reference string -> digest
//! - Reverse index: digest -> reference string -> parsed reference
//!
//! The reverse index is the exact inverse of the forward mapping after
//! every operation. Empty buckets on either side are removed.

use std::collections::{BTreeMap, HashMap};

use imgref_types::{Digest, Reference};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{RefError, Result};
use crate::key::StorageKey;
use crate::types::{Association, BindOutcome, RebuildReport, SkippedEntry};

type Bucket = BTreeMap<String, Digest>;

/// On-disk shape of the catalog.
#[derive(Serialize)]
struct CatalogFile<'a> {
    #[serde(rename = "Repositories")]
    repositories: &'a BTreeMap<String, Bucket>,
}

/// Decoding shape: values are kept as raw strings so that one malformed
/// entry does not fail the whole file.
#[derive(Deserialize)]
struct RawCatalogFile {
    #[serde(rename = "Repositories", default)]
    repositories: Option<BTreeMap<String, Option<BTreeMap<String, String>>>>,
}

/// Forward mapping and reverse index of reference bindings.
#[derive(Clone, Debug, Default)]
pub struct Catalog {
    repositories: BTreeMap<String, Bucket>,
    by_digest: HashMap<Digest, HashMap<String, Reference>>,
}

impl Catalog {
    /// Create an empty catalog.
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode a persisted catalog and rebuild its reverse index.
    ///
    /// Entries whose key or digest does not parse, or whose key does not
    /// belong to the bucket it was found in, are left out and listed in
    /// the returned report.
    pub fn decode(bytes: &[u8]) -> Result<(Self, RebuildReport)> {
        let raw: RawCatalogFile =
            serde_json::from_slice(bytes).map_err(|e| RefError::Serialization(e.to_string()))?;

        let mut catalog = Catalog::new();
        let mut report = RebuildReport::default();

        for (repository, bucket) in raw.repositories.unwrap_or_default() {
            for (key, digest) in bucket.unwrap_or_default() {
                match Self::decode_entry(&repository, &key, &digest) {
                    Ok((reference, digest)) => {
                        catalog.insert(&repository, key, reference, digest);
                        report.loaded += 1;
                    }
                    Err(reason) => {
                        warn!(
                            %repository,
                            reference = %key,
                            %reason,
                            "skipping malformed reference entry"
                        );
                        report.skipped.push(SkippedEntry {
                            repository: repository.clone(),
                            reference: key,
                            reason,
                        });
                    }
                }
            }
        }

        Ok((catalog, report))
    }

    fn decode_entry(
        repository: &str,
        key: &str,
        digest: &str,
    ) -> std::result::Result<(Reference, Digest), String> {
        let reference = Reference::parse_normalized(key).map_err(|e| e.to_string())?;
        let digest = Digest::parse(digest).map_err(|e| e.to_string())?;
        let (normalized, expected) = StorageKey::for_lookup(&reference);
        if expected.repository != repository || expected.reference != key {
            return Err(format!(
                "entry belongs under {}/{}",
                expected.repository, expected.reference
            ));
        }
        Ok((normalized, digest))
    }

    /// Encode the forward mapping. Keys are sorted, so equal catalogs
    /// encode to identical bytes.
    pub fn encode(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(&CatalogFile {
            repositories: &self.repositories,
        })
        .map_err(|e| RefError::Serialization(e.to_string()))
    }

    /// Outcome that [`bind`](Self::bind) would have, without changing
    /// anything.
    pub fn check_bind(
        &self,
        reference: &Reference,
        digest: &Digest,
        force: bool,
    ) -> Result<BindOutcome> {
        let (normalized, key) = StorageKey::for_binding(reference)?;
        self.classify(&normalized, &key, digest, force)
    }

    /// Bind `reference` to `digest`.
    ///
    /// Digest-qualified keys can never be rebound. Tags are rebound only
    /// when `force` is set.
    pub fn bind(
        &mut self,
        reference: &Reference,
        digest: &Digest,
        force: bool,
    ) -> Result<BindOutcome> {
        let (normalized, key) = StorageKey::for_binding(reference)?;
        let outcome = self.classify(&normalized, &key, digest, force)?;
        match &outcome {
            BindOutcome::Unchanged => return Ok(outcome),
            BindOutcome::Replaced { previous } => self.unindex(&key.reference, previous),
            BindOutcome::Created => {}
        }
        self.insert(&key.repository, key.reference, normalized, digest.clone());
        Ok(outcome)
    }

    fn classify(
        &self,
        normalized: &Reference,
        key: &StorageKey,
        digest: &Digest,
        force: bool,
    ) -> Result<BindOutcome> {
        let existing = self
            .repositories
            .get(&key.repository)
            .and_then(|bucket| bucket.get(&key.reference));

        match existing {
            None => Ok(BindOutcome::Created),
            Some(old) if old == digest => Ok(BindOutcome::Unchanged),
            Some(old) if normalized.is_canonical() => Err(RefError::DigestImmutable {
                reference: key.reference.clone(),
                existing: old.clone(),
            }),
            Some(old) if !force => Err(RefError::TagConflict {
                reference: key.reference.clone(),
                existing: old.clone(),
            }),
            Some(old) => Ok(BindOutcome::Replaced {
                previous: old.clone(),
            }),
        }
    }

    /// Remove the binding for `reference`, returning the digest it had.
    pub fn unbind(&mut self, reference: &Reference) -> Result<Digest> {
        let (_, key) = StorageKey::for_lookup(reference);

        let bucket = self
            .repositories
            .get_mut(&key.repository)
            .ok_or_else(|| RefError::NotFound {
                reference: key.reference.clone(),
            })?;
        let digest = bucket.remove(&key.reference).ok_or_else(|| RefError::NotFound {
            reference: key.reference.clone(),
        })?;
        if bucket.is_empty() {
            self.repositories.remove(&key.repository);
        }
        self.unindex(&key.reference, &digest);
        Ok(digest)
    }

    /// Resolve `reference` to the digest it is bound to.
    pub fn get(&self, reference: &Reference) -> Result<Digest> {
        let (_, key) = StorageKey::for_lookup(reference);
        self.repositories
            .get(&key.repository)
            .and_then(|bucket| bucket.get(&key.reference))
            .cloned()
            .ok_or(RefError::NotFound {
                reference: key.reference,
            })
    }

    /// Every reference bound to `digest`, sorted by full reference string.
    pub fn references(&self, digest: &Digest) -> Vec<Reference> {
        let mut refs: Vec<Reference> = self
            .by_digest
            .get(digest)
            .map(|entries| entries.values().cloned().collect())
            .unwrap_or_default();
        refs.sort_by_cached_key(|r| r.to_string());
        refs
    }

    /// Every binding in the repository of `name`, sorted by full
    /// reference string. Tag and digest on `name` are ignored.
    pub fn associations(&self, name: &Reference) -> Vec<Association> {
        let Some(bucket) = self.repositories.get(&name.familiar_name()) else {
            return Vec::new();
        };
        let mut associations: Vec<Association> = bucket
            .iter()
            .filter_map(|(key, digest)| {
                let reference = self.by_digest.get(digest)?.get(key)?.clone();
                Some(Association {
                    reference,
                    digest: digest.clone(),
                })
            })
            .collect();
        associations.sort_by_cached_key(|a| a.reference.to_string());
        associations
    }

    /// Iterate all bindings as `(repository, reference string, digest)`.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str, &Digest)> {
        self.repositories.iter().flat_map(|(repository, bucket)| {
            bucket
                .iter()
                .map(move |(key, digest)| (repository.as_str(), key.as_str(), digest))
        })
    }

    /// Number of bindings.
    pub fn len(&self) -> usize {
        self.repositories.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.repositories.is_empty()
    }

    /// Number of repositories with at least one binding.
    pub fn repository_count(&self) -> usize {
        self.repositories.len()
    }

    fn insert(&mut self, repository: &str, key: String, reference: Reference, digest: Digest) {
        self.repositories
            .entry(repository.to_string())
            .or_default()
            .insert(key.clone(), digest.clone());
        self.by_digest.entry(digest).or_default().insert(key, reference);
    }

    fn unindex(&mut self, key: &str, digest: &Digest) {
        if let Some(entries) = self.by_digest.get_mut(digest) {
            entries.remove(key);
            if entries.is_empty() {
                self.by_digest.remove(digest);
            }
        }
    }
}
