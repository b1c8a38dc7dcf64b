//! File-backed reference store.
//!
//! [`FileReferenceStore`] keeps its [`Catalog`] behind a `RwLock` and
//! writes the whole forward mapping to a JSON file after every change.
//! The write lock is held across the change and the write, so disk writes
//! never interleave and readers never see state that is not on disk.
//!
//! A change is applied to a copy of the catalog. The copy replaces the live
//! catalog only after it has been persisted; a failed write leaves memory
//! and disk as they were.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use imgref_types::{Digest, Reference};
use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::config::StoreConfig;
use crate::error::{RefError, Result};
use crate::persist;
use crate::traits::{ensure_digest, ensure_tag, ReferenceStore};
use crate::types::{Association, BindOutcome, RebuildReport};

/// A [`ReferenceStore`] persisted to a single JSON file.
#[derive(Debug)]
pub struct FileReferenceStore {
    path: PathBuf,
    config: StoreConfig,
    catalog: RwLock<Catalog>,
    report: RebuildReport,
}

impl FileReferenceStore {
    /// Open the store described by `config`.
    ///
    /// Loads the backing file if it exists. Otherwise an empty catalog is
    /// written so the file exists for later runs. A file that exists but
    /// cannot be decoded is an error.
    pub fn open(config: StoreConfig) -> Result<Self> {
        config.validate()?;
        let path = std::path::absolute(&config.path)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let (catalog, report) = match persist::read_if_exists(&path)? {
            Some(bytes) => Catalog::decode(&bytes)?,
            None => {
                let catalog = Catalog::new();
                write_catalog(&path, &config, &catalog)?;
                info!(path = %path.display(), "initialized empty reference store");
                (catalog, RebuildReport::default())
            }
        };

        info!(
            path = %path.display(),
            repositories = catalog.repository_count(),
            references = catalog.len(),
            skipped = report.skipped.len(),
            "reference store opened"
        );

        Ok(Self {
            path,
            config,
            catalog: RwLock::new(catalog),
            report,
        })
    }

    /// Open a store at `path` with default settings.
    pub fn open_path(path: impl AsRef<Path>) -> Result<Self> {
        Self::open(StoreConfig::new(path))
    }

    /// Absolute path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// What was loaded, and skipped, when the store was opened.
    pub fn rebuild_report(&self) -> &RebuildReport {
        &self.report
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, Catalog>> {
        self.catalog
            .read()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, Catalog>> {
        self.catalog
            .write()
            .map_err(|e| RefError::LockPoisoned(e.to_string()))
    }

    fn add(&self, reference: &Reference, digest: &Digest, force: bool) -> Result<()> {
        let mut catalog = self.write()?;
        if !catalog.check_bind(reference, digest, force)?.is_mutation() {
            return Ok(());
        }

        let mut next = catalog.clone();
        let outcome = next.bind(reference, digest, force)?;

        write_catalog(&self.path, &self.config, &next)?;
        *catalog = next;

        match outcome {
            BindOutcome::Replaced { previous } => {
                debug!(reference = %reference, %digest, %previous, "reference moved");
            }
            _ => debug!(reference = %reference, %digest, "reference added"),
        }
        Ok(())
    }
}

fn write_catalog(path: &Path, config: &StoreConfig, catalog: &Catalog) -> Result<()> {
    let data = catalog.encode()?;
    persist::write_atomic(path, &data, config.file_mode, config.sync_writes).map_err(|source| {
        RefError::Persist {
            path: path.to_path_buf(),
            source,
        }
    })
}

impl ReferenceStore for FileReferenceStore {
    fn resolve(&self, reference: &Reference) -> Result<Digest> {
        self.read()?.get(reference)
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
        let mut catalog = self.write()?;
        let mut next = catalog.clone();
        let digest = next.unbind(reference)?;

        write_catalog(&self.path, &self.config, &next)?;
        *catalog = next;

        debug!(reference = %reference, %digest, "reference removed");
        Ok(true)
    }

    fn references(&self, digest: &Digest) -> Result<Vec<Reference>> {
        Ok(self.read()?.references(digest))
    }

    fn associations(&self, name: &Reference) -> Result<Vec<Association>> {
        Ok(self.read()?.associations(name))
    }
}
