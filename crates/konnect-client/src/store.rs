//! File-backed key-value slot.
//!
//! The whole store is a single JSON object. Every mutation rewrites the file
//! through a temporary sibling and a rename, so a crash mid-write leaves the
//! previous contents intact.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use konnect_core::{KeyValueStore, StoreError};

/// [`KeyValueStore`] persisted as a JSON object file.
#[derive(Debug, Clone)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
}

impl FileStore {
    /// Open the store at `path`. A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// - `StoreError` if the file exists but cannot be read or is not a JSON
    ///   object of strings
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(contents) if contents.trim().is_empty() => BTreeMap::new(),
            Ok(contents) => serde_json::from_str(&contents)?,
            Err(e) if e.kind() == io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(e.into()),
        };

        tracing::debug!(path = %path.display(), keys = entries.len(), "opened store");
        Ok(Self { path, entries })
    }

    /// Backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entries: &BTreeMap<String, String>) -> Result<(), StoreError> {
        if entries.is_empty() {
            return match fs::remove_file(&self.path) {
                Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            };
        }

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_string_pretty(entries)?)?;
        fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl KeyValueStore for FileStore {
    fn load(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.get(key).cloned())
    }

    fn save(&mut self, key: &str, value: &str) -> Result<(), StoreError> {
        let mut entries = self.entries.clone();
        entries.insert(key.to_string(), value.to_string());
        self.write(&entries)?;
        self.entries = entries;
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        if !self.entries.contains_key(key) {
            return Ok(());
        }

        let mut entries = self.entries.clone();
        entries.remove(key);
        self.write(&entries)?;
        self.entries = entries;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use konnect_core::{IdentityStore, USER_NAME_KEY};

    use super::*;

    #[test]
    fn missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::open(dir.path().join("session.json")).unwrap();
        assert_eq!(store.load(USER_NAME_KEY).unwrap(), None);
    }

    #[test]
    fn identity_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("session.json");

        let mut identities = IdentityStore::open(FileStore::open(&path).unwrap()).unwrap();
        identities.set("  alice ").unwrap();
        drop(identities);

        let reopened = IdentityStore::open(FileStore::open(&path).unwrap()).unwrap();
        assert_eq!(reopened.get().map(|i| i.name.as_str()), Some("alice"));
    }

    #[test]
    fn clear_deletes_the_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");

        let mut identities = IdentityStore::open(FileStore::open(&path).unwrap()).unwrap();
        identities.set("alice").unwrap();
        assert!(path.exists());

        identities.clear().unwrap();
        assert!(!path.exists());
        assert!(IdentityStore::open(FileStore::open(&path).unwrap()).unwrap().get().is_none());
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("session.json");
        fs::write(&path, "not json").unwrap();

        assert!(FileStore::open(&path).is_err());
    }

    #[test]
    fn failed_write_keeps_previous_value() {
        let dir = tempfile::tempdir().unwrap();
        let parent = dir.path().join("state");
        let path = parent.join("session.json");

        let mut store = FileStore::open(&path).unwrap();
        store.save(USER_NAME_KEY, "alice").unwrap();

        // Parent directory becomes a regular file, so the next write fails.
        fs::remove_dir_all(&parent).unwrap();
        fs::write(&parent, "").unwrap();

        assert!(store.save(USER_NAME_KEY, "bob").is_err());
        assert_eq!(store.load(USER_NAME_KEY).unwrap().as_deref(), Some("alice"));
    }
}
