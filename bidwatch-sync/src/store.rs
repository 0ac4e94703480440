//! Apply an [`UpdateSet`] to the config file and verify it landed.

use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use bidwatch_core::UpdateSet;

use crate::envfile::KeyValueDocument;
use crate::error::{io_err, SyncError};
use crate::writer::atomic_write;

/// Outcome of [`ConfigStore::apply`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyOutcome {
    /// The file was atomically replaced.
    Written { path: PathBuf },
    /// The file already held exactly the requested content; nothing written.
    Unchanged { path: PathBuf },
}

/// Something the orchestrator can apply updates to and confirm.
pub trait ConfigTarget: Send {
    fn path(&self) -> &Path;

    fn apply(&self, updates: &UpdateSet) -> Result<ApplyOutcome, SyncError>;

    fn confirm(&self, updates: &UpdateSet) -> Result<(), SyncError>;
}

/// The on-disk key=value file.
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ConfigTarget for ConfigStore {
    fn path(&self) -> &Path {
        &self.path
    }

    /// Read, patch, and atomically rewrite the file.
    fn apply(&self, updates: &UpdateSet) -> Result<ApplyOutcome, SyncError> {
        let existing = read_existing(&self.path)?;
        let mut doc = KeyValueDocument::from_bytes(existing.as_deref().unwrap_or_default());
        doc.apply(updates);
        let rendered = doc.to_bytes();

        if existing.as_deref() == Some(rendered.as_slice()) {
            tracing::debug!("unchanged: {}", self.path.display());
            return Ok(ApplyOutcome::Unchanged {
                path: self.path.clone(),
            });
        }

        atomic_write(&self.path, &rendered)?;
        tracing::info!(
            "updated {} with keys: {:?}",
            self.path.display(),
            updates.keys()
        );
        Ok(ApplyOutcome::Written {
            path: self.path.clone(),
        })
    }

    /// Re-read the file and check every key holds its requested value.
    fn confirm(&self, updates: &UpdateSet) -> Result<(), SyncError> {
        let bytes = std::fs::read(&self.path).map_err(|e| io_err(&self.path, e))?;
        let doc = KeyValueDocument::from_bytes(&bytes);

        for (key, expected) in updates.iter() {
            match doc.get(key.as_str()) {
                None => {
                    return Err(SyncError::KeyMissing {
                        path: self.path.clone(),
                        key: key.to_string(),
                    })
                }
                Some(found) if found != expected => {
                    return Err(SyncError::ValueMismatch {
                        path: self.path.clone(),
                        key: key.to_string(),
                        expected: expected.to_string(),
                        found: found.to_string(),
                    })
                }
                Some(_) => {}
            }
        }

        tracing::info!("confirmed {} after update: {updates}", self.path.display());
        Ok(())
    }
}

/// Raw file content; `None` if the file does not exist yet.
pub(crate) fn read_existing(path: &Path) -> Result<Option<Vec<u8>>, SyncError> {
    match std::fs::read(path) {
        Ok(content) => Ok(Some(content)),
        Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
        Err(err) => Err(io_err(path, err)),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
