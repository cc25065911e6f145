//! Durable session storage
//!
//! The session store persists the serialized principal-plus-token object
//! under a single key. Implementations never fail the caller on a missing
//! entry; write failures are reported and logged by the session store.

use parking_lot::Mutex;
use std::io;
use std::path::{Path, PathBuf};

/// Key (file stem) under which the session is stored
pub const SESSION_KEY: &str = "userInfo";

pub trait SessionStorage: Send + Sync {
    /// Raw stored value, `None` when absent or unreadable
    fn load(&self) -> Option<String>;
    fn save(&self, value: &str) -> io::Result<()>;
    /// Remove the entry entirely
    fn remove(&self) -> io::Result<()>;
}

/// One JSON file per session key
pub struct FileSessionStorage {
    path: PathBuf,
}

impl FileSessionStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<dir>/userInfo.json`
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::new(dir.as_ref().join(format!("{SESSION_KEY}.json")))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl SessionStorage for FileSessionStorage {
    fn load(&self) -> Option<String> {
        std::fs::read_to_string(&self.path).ok()
    }

    fn save(&self, value: &str) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        std::fs::write(&self.path, value)
    }

    fn remove(&self) -> io::Result<()> {
        match std::fs::remove_file(&self.path) {
            Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// In-process storage, handy for tests and ephemeral sessions
#[derive(Default)]
pub struct MemorySessionStorage {
    slot: Mutex<Option<String>>,
}

impl MemorySessionStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(value: impl Into<String>) -> Self {
        Self {
            slot: Mutex::new(Some(value.into())),
        }
    }

    pub fn value(&self) -> Option<String> {
        self.slot.lock().clone()
    }
}

impl SessionStorage for MemorySessionStorage {
    fn load(&self) -> Option<String> {
        self.value()
    }

    fn save(&self, value: &str) -> io::Result<()> {
        *self.slot.lock() = Some(value.to_string());
        Ok(())
    }

    fn remove(&self) -> io::Result<()> {
        *self.slot.lock() = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_storage_roundtrip_and_remove() {
        let dir = tempfile::tempdir().unwrap();
        let storage = FileSessionStorage::in_dir(dir.path().join("nested"));
        assert!(storage.load().is_none());

        storage.save(r#"{"token":"t"}"#).unwrap();
        assert_eq!(storage.load().as_deref(), Some(r#"{"token":"t"}"#));
        assert!(storage.path().ends_with("userInfo.json"));

        storage.remove().unwrap();
        assert!(storage.load().is_none());
        assert!(!storage.path().exists());

        // removing twice is fine
        storage.remove().unwrap();
    }

    #[test]
    fn test_memory_storage() {
        let storage = MemorySessionStorage::with_value("x");
        assert_eq!(storage.load().as_deref(), Some("x"));
        storage.remove().unwrap();
        assert!(storage.value().is_none());
    }
}
