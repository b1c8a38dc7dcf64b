//! Error types for reference store operations.

use std::path::PathBuf;

use imgref_types::{Digest, TypeError};
use thiserror::Error;

/// Errors that can occur during reference store operations.
#[derive(Debug, Error)]
pub enum RefError {
    /// The reference has no binding in the store.
    #[error("reference does not exist: {reference}")]
    NotFound { reference: String },

    /// The reference could not be parsed or is not storable.
    #[error("invalid reference {reference}: {reason}")]
    InvalidReference { reference: String, reason: String },

    /// The reference cannot be used as a tag.
    #[error("invalid tag: {reason}")]
    InvalidTag { reason: String },

    /// A digest-qualified reference is already bound to another digest.
    #[error("cannot overwrite digest {reference}: already bound to {existing}")]
    DigestImmutable { reference: String, existing: Digest },

    /// A tag is already bound to another digest and `force` was not set.
    #[error(
        "tag {reference} is already set to image {existing}, \
         use the force option to replace it"
    )]
    TagConflict { reference: String, existing: Digest },

    /// The catalog could not be written to its backing file.
    #[error("failed to persist reference store to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Encoding or decoding of the persisted catalog failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// The store lock was poisoned by a panicking writer.
    #[error("reference store lock poisoned: {0}")]
    LockPoisoned(String),

    /// Invalid store configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error while loading the catalog.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl RefError {
    /// Returns `true` if the reference has no binding.
    pub fn is_not_found(&self) -> bool {
        matches!(self, RefError::NotFound { .. })
    }

    /// Returns `true` for either kind of rebinding conflict.
    pub fn is_conflict(&self) -> bool {
        matches!(
            self,
            RefError::DigestImmutable { .. } | RefError::TagConflict { .. }
        )
    }

    /// Returns `true` for references rejected before touching the store.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            RefError::InvalidReference { .. } | RefError::InvalidTag { .. }
        )
    }
}

impl From<TypeError> for RefError {
    fn from(err: TypeError) -> Self {
        let reference = match &err {
            TypeError::InvalidReference { value, .. } => value.clone(),
            TypeError::InvalidDigest { value, .. } => value.clone(),
            TypeError::InvalidTag { tag, .. } => tag.clone(),
            TypeError::UppercaseName(name) => name.clone(),
            TypeError::UnsupportedAlgorithm(alg) => alg.clone(),
            TypeError::NameTooLong { name, .. } => name.clone(),
        };
        RefError::InvalidReference {
            reference,
            reason: err.to_string(),
        }
    }
}

/// Convenience type alias for reference store operations.
pub type Result<T> = std::result::Result<T, RefError>;
