//! Storage backends for the persisted session document.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use thiserror::Error;
use tracing::{debug, warn};

/// Errors surfaced while writing the session document.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The document could not be written.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Location that holds at most one session document.
pub trait SaveStore: Send {
    /// Current document, if one was stored.
    fn load(&self) -> Option<String>;

    /// Replaces the stored document.
    fn store(&mut self, document: &str) -> Result<(), StoreError>;
}

/// In-memory store, used by tests and embedders without a filesystem.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    document: Option<String>,
}

impl MemoryStore {
    /// Creates a store that already holds `document`.
    #[must_use]
    pub fn with_document(document: impl Into<String>) -> Self {
        Self {
            document: Some(document.into()),
        }
    }

    /// Document currently held by the store.
    #[must_use]
    pub fn document(&self) -> Option<&str> {
        self.document.as_deref()
    }
}

impl SaveStore for MemoryStore {
    fn load(&self) -> Option<String> {
        self.document.clone()
    }

    fn store(&mut self, document: &str) -> Result<(), StoreError> {
        self.document = Some(document.to_owned());
        Ok(())
    }
}

/// Store backed by a single JSON file.
///
/// Writes go to a sibling temporary file which is then renamed over the
/// target.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    /// Creates a store that reads and writes `path`.
    #[must_use]
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    /// Path of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SaveStore for FileStore {
    fn load(&self) -> Option<String> {
        match fs::read_to_string(&self.path) {
            Ok(document) => {
                debug!(path = %self.path.display(), "loaded save file");
                Some(document)
            }
            Err(error) if error.kind() == io::ErrorKind::NotFound => None,
            Err(error) => {
                warn!(path = %self.path.display(), %error, "failed to read save file");
                None
            }
        }
    }

    fn store(&mut self, document: &str) -> Result<(), StoreError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let temp_path = self.path.with_extension("json.tmp");
        fs::write(&temp_path, document)?;
        fs::rename(&temp_path, &self.path)?;

        debug!(path = %self.path.display(), "saved session");
        Ok(())
    }
}
