//! Persistent store of image references.
//!
//! This crate maps human-readable image references (tags and digest
//! references) to the content digests they name, and answers the reverse
//! question: which references currently point at a digest.
//!
//! # Architecture
//!
//! - **Tags** (`ubuntu:22.04`) are mutable bindings. Rebinding a tag to a
//!   different digest requires an explicit `force`.
//! - **Digest references** (`ubuntu@sha256:...`) are immutable. Once bound
//!   they can never point elsewhere. A reference carrying both a tag and a
//!   digest is stored under its digest form only.
//! - The **catalog** keeps the forward mapping (repository -> reference ->
//!   digest) and a reverse index (digest -> references) derived from it.
//! - The **file store** persists the forward mapping as JSON with an atomic
//!   replace after every change and rebuilds the reverse index on open.
//!
//! # Modules
//!
//! - [`error`] — Error types for store operations
//! - [`types`] — [`Association`], [`BindOutcome`], [`RebuildReport`]
//! - [`key`] — Normalization of references into storage keys
//! - [`catalog`] — The [`Catalog`] aggregate holding all binding rules
//! - [`traits`] — The [`ReferenceStore`] trait defining the storage interface
//! - [`store`] — File-backed [`FileReferenceStore`]
//! - [`memory`] — In-memory [`InMemoryReferenceStore`] for tests
//! - [`persist`] — Atomic file replacement
//! - [`config`] — [`StoreConfig`]

pub mod catalog;
pub mod config;
pub mod error;
pub mod key;
pub mod memory;
pub mod persist;
pub mod store;
pub mod traits;
pub mod types;

pub use catalog::Catalog;
pub use config::StoreConfig;
pub use error::{RefError, Result};
pub use key::StorageKey;
pub use memory::InMemoryReferenceStore;
pub use store::FileReferenceStore;
pub use traits::ReferenceStore;
pub use types::{Association, BindOutcome, RebuildReport, SkippedEntry};

pub use imgref_types::{Digest, Reference};
