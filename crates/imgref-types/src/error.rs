use thiserror::Error;

/// Errors produced when parsing or validating digests and references.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum TypeError {
    #[error("invalid digest {value:?}: {reason}")]
    InvalidDigest { value: String, reason: String },

    #[error("unsupported digest algorithm: {0}")]
    UnsupportedAlgorithm(String),

    #[error("invalid reference format {value:?}: {reason}")]
    InvalidReference { value: String, reason: String },

    #[error("invalid tag {tag:?}: {reason}")]
    InvalidTag { tag: String, reason: String },

    #[error("repository name must be lowercase: {0}")]
    UppercaseName(String),

    #[error("repository name {name:?} exceeds {max} characters: {len}")]
    NameTooLong { name: String, len: usize, max: usize },
}
