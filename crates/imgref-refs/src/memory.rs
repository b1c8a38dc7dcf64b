//! In-memory reference store for testing and ephemeral use.
//!
//! [`InMemoryReferenceStore`] applies the same binding rules as
//! [`FileReferenceStore`](crate::FileReferenceStore) to a [`Catalog`]
//! behind a `RwLock`. Data is lost when the store is dropped.

use std::sync::RwLock;

use imgref_types::{Digest, Reference};
use tracing::debug;

use crate::catalog::Catalog;
use crate::error::{RefError, Result};
use crate::traits::{ensure_digest, ensure_tag, ReferenceStore};
use crate::types::Association;

/// An in-memory implementation of [`ReferenceStore`].
#[derive(Debug, Default)]
pub struct InMemoryReferenceStore {
    catalog: RwLock<Catalog>,
}

impl InMemoryReferenceStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with an existing catalog.
    pub fn with_catalog(catalog: Catalog) -> Self {
        Self {
            catalog: RwLock::new(catalog),
        }
    }

    /// A copy of the current catalog.
    pub fn snapshot(&self) -> Result<Catalog> {
        let catalog = self.catalog.read().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        Ok(catalog.clone())
    }

    fn add(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()> {
        let mut catalog = self.catalog.write().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        let outcome = catalog.bind(reference, digest, force)?;
        if outcome.is_mutation() {
            debug!(reference = %reference, %digest, "reference added");
        }
        Ok(())
    }
}

impl ReferenceStore for InMemoryReferenceStore {
    fn resolve(&self, reference: &Reference) -> Result<Digest> {
        let catalog = self.catalog.read().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        catalog.get(reference)
    }

    fn add_tag(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()> {
        ensure_tag(reference)?;
        self.add(reference, digest, force)
    }

    fn add_digest(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()> {
        ensure_digest(reference)?;
        self.add(reference, digest, force)
    }

    fn remove(&self, reference: &Reference) -> Result<bool> {
        let mut catalog = self.catalog.write().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        catalog.unbind(reference)?;
        Ok(true)
    }

    fn references(&self, digest: &Digest) -> Result<Vec<Reference>> {
        let catalog = self.catalog.read().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        Ok(catalog.references(digest))
    }

    fn associations(&self, name: &Reference) -> Result<Vec<Association>> {
        let catalog = self.catalog.read().map_err(|e| {
            RefError::LockPoisoned(e.to_string())
        })?;
        Ok(catalog.associations(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(s: &str) -> Reference {
        Reference::parse_normalized(s).unwrap()
    }

    fn digest(seed: &str) -> Digest {
        Digest::from_content(seed.as_bytes())
    }

    #[test]
    fn add_resolve_remove() {
        let store = InMemoryReferenceStore::new();
        let d = digest("1");
        store.add_tag(&parse("redis:7"), &d, false).unwrap();
        assert_eq!(store.resolve(&parse("redis:7")).unwrap(), d);
        assert!(store.remove(&parse("redis:7")).unwrap());
        assert!(store.resolve(&parse("redis:7")).unwrap_err().is_not_found());
        assert!(store.remove(&parse("redis:7")).unwrap_err().is_not_found());
    }

    #[test]
    fn conflicts_match_file_store_rules() {
        let store = InMemoryReferenceStore::new();
        let (d1, d2) = (digest("1"), digest("2"));
        store.add_tag(&parse("redis:7"), &d1, false).unwrap();
        assert!(matches!(
            store.add_tag(&parse("redis:7"), &d2, false),
            Err(RefError::TagConflict { .. })
        ));

        let pinned = parse(&format!("redis@{}", digest("m")));
        store.add_digest(&pinned, &d1, false).unwrap();
        assert!(matches!(
            store.add_digest(&pinned, &d2, true),
            Err(RefError::DigestImmutable { .. })
        ));
        assert!(store.add_tag(&pinned, &d1, false).unwrap_err().is_validation());
    }

    #[test]
    fn enumeration() {
        let store = InMemoryReferenceStore::new();
        let d = digest("1");
        store.add_tag(&parse("redis:7"), &d, false).unwrap();
        store.add_tag(&parse("redis:6"), &d, false).unwrap();
        let refs: Vec<String> = store
            .references(&d)
            .unwrap()
            .iter()
            .map(Reference::familiar_string)
            .collect();
        assert_eq!(refs, vec!["redis:6", "redis:7"]);
        assert_eq!(store.associations(&parse("redis")).unwrap().len(), 2);
        assert!(store.associations(&parse("valkey")).unwrap().is_empty());
    }

    #[test]
    fn seeded_from_decoded_catalog() {
        let d = digest("1");
        let json = format!(r#"{{"Repositories":{{"redis":{{"redis:7":"{d}"}}}}}}"#);
        let (catalog, _) = Catalog::decode(json.as_bytes()).unwrap();
        let store = InMemoryReferenceStore::with_catalog(catalog);
        assert_eq!(store.resolve(&parse("redis:7")).unwrap(), d);
        assert_eq!(store.snapshot().unwrap().len(), 1);
    }
}
