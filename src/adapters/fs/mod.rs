//! Filesystem adapter: Implementation of ArtifactStore.
//!
//! Stores each artifact as `<dir>/<name>.json`. Writes go to a temporary
//! sibling file that is renamed into place, so a blob is either the previous
//! version or the complete new one.

use std::fs;
use std::path::{Path, PathBuf};

use crate::ports::ArtifactStore;

const EXTENSION: &str = "json";

/// Error type for storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid artifact name '{0}'")]
    InvalidName(String),

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl StorageError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Reject names that would escape the artifact directory.
pub(crate) fn check_name(name: &str) -> Result<(), StorageError> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidName(name.to_string()))
    }
}

/// Directory-backed artifact store.
#[derive(Debug, Clone)]
pub struct FsArtifactStore {
    root: PathBuf,
}

impl FsArtifactStore {
    /// Open (creating if needed) an artifact directory.
    ///
    /// # Errors
    /// Returns error if the directory cannot be created.
    pub fn new<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        fs::create_dir_all(&root).map_err(|e| StorageError::io(&root, e))?;
        Ok(Self { root })
    }

    /// Open an existing artifact directory without creating it.
    ///
    /// Used by inference, which must never materialize an empty directory.
    ///
    /// # Errors
    /// Returns `NotFound` if the directory does not exist.
    pub fn open_existing<P: AsRef<Path>>(root: P) -> Result<Self, StorageError> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            return Err(StorageError::NotFound(root.display().to_string()));
        }
        Ok(Self { root })
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, name: &str) -> Result<PathBuf, StorageError> {
        check_name(name)?;
        Ok(self.root.join(format!("{name}.{EXTENSION}")))
    }
}

impl ArtifactStore for FsArtifactStore {
    fn save(&self, name: &str, bytes: &[u8]) -> Result<(), StorageError> {
        let path = self.path_for(name)?;
        let tmp = self.root.join(format!(".{name}.{EXTENSION}.tmp"));
        fs::write(&tmp, bytes).map_err(|e| StorageError::io(&tmp, e))?;
        fs::rename(&tmp, &path).map_err(|e| StorageError::io(&path, e))?;
        tracing::debug!("Saved artifact '{}' ({} bytes) to {}", name, bytes.len(), path.display());
        Ok(())
    }

    fn load(&self, name: &str) -> Result<Vec<u8>, StorageError> {
        let path = self.path_for(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(bytes),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                Err(StorageError::NotFound(name.to_string()))
            }
            Err(e) => Err(StorageError::io(&path, e)),
        }
    }

    fn exists(&self, name: &str) -> Result<bool, StorageError> {
        Ok(self.path_for(name)?.is_file())
    }

    fn clear(&self) -> Result<(), StorageError> {
        if self.root.exists() {
            tracing::info!("Deleting old artifacts folder at {}", self.root.display());
            fs::remove_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))?;
        }
        fs::create_dir_all(&self.root).map_err(|e| StorageError::io(&self.root, e))?;
        Ok(())
    }

    fn list(&self) -> Result<Vec<String>, StorageError> {
        let entries = fs::read_dir(&self.root).map_err(|e| StorageError::io(&self.root, e))?;
        let mut names = Vec::new();
        for entry in entries {
            let path = entry.map_err(|e| StorageError::io(&self.root, e))?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(EXTENSION) {
                continue;
            }
            if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                if check_name(stem).is_ok() {
                    names.push(stem.to_string());
                }
            }
        }
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_artifact_roundtrip() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = FsArtifactStore::new(dir.path()).expect("Should open store");

        store.save("scaler", b"{\"mean\":[1.0]}").expect("Should save");
        assert!(store.exists("scaler").expect("Should check"));
        assert_eq!(store.load("scaler").expect("Should load"), b"{\"mean\":[1.0]}");
        assert!(dir.path().join("scaler.json").is_file());
    }

    #[test]
    fn test_missing_artifact_is_not_found() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = FsArtifactStore::new(dir.path()).expect("Should open store");
        assert!(matches!(store.load("model"), Err(StorageError::NotFound(n)) if n == "model"));
        assert!(!store.exists("model").expect("Should check"));
    }

    #[test]
    fn test_clear_removes_stale_artifacts() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let root = dir.path().join("artifacts");
        let store = FsArtifactStore::new(&root).expect("Should open store");
        store.save("model", b"old").expect("Should save");
        std::fs::write(root.join("notes.txt"), "x").expect("Should write");

        store.clear().expect("Should clear");
        assert!(root.is_dir());
        assert!(store.list().expect("Should list").is_empty());
        assert!(!root.join("notes.txt").exists());
    }

    #[test]
    fn test_list_sorted_names() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = FsArtifactStore::new(dir.path()).expect("Should open store");
        store.save("scaler", b"1").expect("Should save");
        store.save("columns", b"2").expect("Should save");
        assert_eq!(store.list().expect("Should list"), vec!["columns", "scaler"]);
    }

    #[test]
    fn test_rejects_path_traversal() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        let store = FsArtifactStore::new(dir.path()).expect("Should open store");
        assert!(matches!(
            store.save("../escape", b"x"),
            Err(StorageError::InvalidName(_))
        ));
    }

    #[test]
    fn test_open_existing_requires_directory() {
        let dir = tempfile::tempdir().expect("Should create temp dir");
        assert!(FsArtifactStore::open_existing(dir.path().join("absent")).is_err());
        assert!(FsArtifactStore::open_existing(dir.path()).is_ok());
    }
}
