//! The [`ReferenceStore`] trait defining the reference storage interface.
//!
//! Any backend (file-backed, in-memory) implements this trait to map image
//! references to content digests.

use imgref_types::{Digest, Reference};

use crate::error::{RefError, Result};
use crate::types::Association;

/// Storage backend for reference-to-digest bindings.
///
/// Implementations must be thread-safe (`Send + Sync`). Reads never block
/// each other; a mutation is complete, and visible, only once it has been
/// made durable by the backend.
pub trait ReferenceStore: Send + Sync {
    /// Resolve a reference to the digest it is bound to.
    ///
    /// A reference with both a tag and a digest is looked up by digest; a
    /// bare name is looked up under the default tag.
    fn resolve(&self, reference: &Reference) -> Result<Digest>;

    /// Bind a tag reference to `digest`.
    ///
    /// Fails with [`RefError::TagConflict`] if the tag is bound to another
    /// digest and `force` is not set. Digest-qualified references are
    /// rejected; use [`add_digest`](Self::add_digest).
    fn add_tag(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()>;

    /// Bind a digest-qualified reference to `digest`.
    ///
    /// Such bindings are immutable: rebinding to another digest fails with
    /// [`RefError::DigestImmutable`] whatever the value of `force`.
    fn add_digest(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()>;

    /// Remove the binding for a reference.
    ///
    /// Returns `Ok(true)` once the binding is removed, and
    /// [`RefError::NotFound`] if there was none.
    fn remove(&self, reference: &Reference) -> Result<bool>;

    /// All references bound to `digest`, sorted by full reference string.
    ///
    /// Empty if the digest is unknown.
    fn references(&self, digest: &Digest) -> Result<Vec<Reference>>;

    /// All bindings in the repository named by `name`, sorted by full
    /// reference string. Empty if the repository is unknown.
    fn associations(&self, name: &Reference) -> Result<Vec<Association>>;

    /// Bind either form of reference, dispatching on whether it carries a
    /// digest.
    fn bind(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()> {
        if reference.is_canonical() {
            self.add_digest(reference, digest, force)
        } else {
            self.add_tag(reference, digest, force)
        }
    }
}

/// Reject digest-qualified references on the tag-only path.
pub(crate) fn ensure_tag(reference: &Reference) -> Result<()> {
    if reference.is_canonical() {
        return Err(RefError::InvalidTag {
            reason: "refusing to create a tag with a digest reference".into(),
        });
    }
    Ok(())
}

/// Reject references without a digest on the digest-only path.
pub(crate) fn ensure_digest(reference: &Reference) -> Result<()> {
    if !reference.is_canonical() {
        return Err(RefError::InvalidReference {
            reference: reference.familiar_string(),
            reason: "a digest reference is required".into(),
        });
    }
    Ok(())
}
