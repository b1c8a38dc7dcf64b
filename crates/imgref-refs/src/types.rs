//! Value types returned by the reference store.

use imgref_types::{Digest, Reference};
use serde::{Deserialize, Serialize};

/// A reference paired with the digest it is bound to.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Association {
    pub reference: Reference,
    pub digest: Digest,
}

/// Result of a successful bind.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BindOutcome {
    /// The key had no binding before.
    Created,
    /// The key was already bound to the same digest; nothing changed.
    Unchanged,
    /// A tag was forcibly moved off `previous`.
    Replaced { previous: Digest },
}

impl BindOutcome {
    /// Returns `true` if the catalog changed and must be persisted.
    pub fn is_mutation(&self) -> bool {
        !matches!(self, BindOutcome::Unchanged)
    }
}

/// A persisted entry dropped while rebuilding the reverse index.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SkippedEntry {
    /// Repository bucket the entry was found in.
    pub repository: String,
    /// Entry key as stored.
    pub reference: String,
    /// Why the entry could not be loaded.
    pub reason: String,
}

/// Summary of decoding a persisted catalog.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RebuildReport {
    /// Number of bindings loaded.
    pub loaded: usize,
    /// Entries that were malformed and left out.
    pub skipped: Vec<SkippedEntry>,
}

impl RebuildReport {
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
    }
}
