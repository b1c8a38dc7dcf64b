//! Foundation types for image reference storage.
//!
//! This crate provides the value types shared by every `imgref` crate: content
//! digests and the structured image references that name them.
//!
//! # Key Types
//!
//! - [`Digest`] — Content-derived identifier rendered as `<algorithm>:<hex>`
//! - [`DigestAlgorithm`] — Hash algorithm tag (sha256, sha384, sha512)
//! - [`Reference`] — Parsed image reference: domain, path, optional tag and digest
//! - [`TypeError`] — Parse and validation failures

pub mod digest;
pub mod error;
pub mod reference;

pub use digest::{Digest, DigestAlgorithm, CANONICAL_ALGORITHM};
pub use error::TypeError;
pub use reference::{Reference, DEFAULT_DOMAIN, DEFAULT_TAG, NAME_TOTAL_LENGTH_MAX};
