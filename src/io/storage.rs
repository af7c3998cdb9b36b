use std::collections::HashMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};

use tempfile::NamedTempFile;

/// Error type for slot storage
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("invalid slot name '{0}'")]
    InvalidSlot(String),
    #[error("could not read {path}: {source}")]
    ReadError { path: PathBuf, source: io::Error },
    #[error("could not write {path}: {source}")]
    WriteError { path: PathBuf, source: io::Error },
    #[error("storage quota exceeded writing slot '{slot}' ({size} bytes, limit {limit})")]
    QuotaExceeded {
        slot: String,
        size: usize,
        limit: usize,
    },
}

/// Named-slot blob storage.
///
/// Each slot holds one string value that is replaced wholesale on write.
pub trait KeyValueStore {
    /// Read a slot. `Ok(None)` when it has never been written.
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError>;
    /// Replace the contents of a slot.
    fn set(&mut self, slot: &str, value: &str) -> Result<(), StorageError>;
}

// ---------------------------------------------------------------------------
// File-backed slots
// ---------------------------------------------------------------------------

/// One `<slot>.json` file per slot inside a data directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// Open a store rooted at `dir`, creating the directory if needed.
    pub fn open(dir: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let dir = dir.into();
        fs::create_dir_all(&dir).map_err(|e| StorageError::WriteError {
            path: dir.clone(),
            source: e,
        })?;
        Ok(FileStore { dir })
    }

    pub fn slot_path(&self, slot: &str) -> Result<PathBuf, StorageError> {
        validate_slot(slot)?;
        Ok(self.dir.join(format!("{}.json", slot)))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        let path = self.slot_path(slot)?;
        match fs::read_to_string(&path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(StorageError::ReadError { path, source: e }),
        }
    }

    fn set(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        let path = self.slot_path(slot)?;
        atomic_write(&path, value.as_bytes())
            .map_err(|e| StorageError::WriteError { path, source: e })
    }
}

/// Slot names are file stems: ASCII letters, digits, `-` and `_`.
pub fn validate_slot(slot: &str) -> Result<(), StorageError> {
    if slot.is_empty()
        || !slot
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(StorageError::InvalidSlot(slot.to_string()));
    }
    Ok(())
}

/// Write via a temp file in the same directory, then rename over the target.
pub fn atomic_write(path: &Path, content: &[u8]) -> io::Result<()> {
    let dir = path.parent().unwrap_or(Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(content)?;
    tmp.flush()?;
    tmp.persist(path).map_err(|e| e.error)?;
    Ok(())
}

// ---------------------------------------------------------------------------
// In-memory slots
// ---------------------------------------------------------------------------

/// In-memory slots with an optional size quota.
///
/// Clones share the same slots and quota, so a test can keep a handle,
/// inspect what a store wrote, and make later writes fail.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryInner>>,
}

#[derive(Debug, Default)]
struct MemoryInner {
    slots: HashMap<String, String>,
    quota: Option<usize>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject any single write larger than `bytes`.
    pub fn with_quota(bytes: usize) -> Self {
        let store = Self::default();
        store.set_quota(Some(bytes));
        store
    }

    pub fn set_quota(&self, quota: Option<usize>) {
        self.inner().quota = quota;
    }

    fn inner(&self) -> MutexGuard<'_, MemoryInner> {
        // A poisoned map is still a valid map
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, slot: &str) -> Result<Option<String>, StorageError> {
        Ok(self.inner().slots.get(slot).cloned())
    }

    fn set(&mut self, slot: &str, value: &str) -> Result<(), StorageError> {
        let mut inner = self.inner();
        if let Some(limit) = inner.quota
            && value.len() > limit
        {
            return Err(StorageError::QuotaExceeded {
                slot: slot.to_string(),
                size: value.len(),
                limit,
            });
        }
        inner.slots.insert(slot.to_string(), value.to_string());
        Ok(())
    }
}
