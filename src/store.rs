use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, info};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Identifier of the single logical record in the collection.
const RECORD_ID: u64 = 0;

/// One stored record: an accumulating list of image path references.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PathRecord {
    pub id: u64,
    pub images: Vec<String>,
    pub updated_at: String,
}

impl PathRecord {
    fn empty() -> Self {
        PathRecord {
            id: RECORD_ID,
            images: Vec::new(),
            updated_at: Utc::now().to_rfc3339(),
        }
    }
}

/// Minimal document store over a single collection of path references.
///
/// The collection is persisted as one JSON document file. Every write goes
/// straight to disk; a failure to reach the backing file surfaces immediately
/// as [`Error::Connection`] with no retry.
#[derive(Debug)]
pub struct RecordStore {
    path: PathBuf,
    records: Vec<PathRecord>,
}

impl RecordStore {
    /// Open the store backed by `path`.
    ///
    /// With `create` set, the collection is initialized to a single empty
    /// record, replacing whatever was stored before. Otherwise the existing
    /// document is loaded as-is.
    pub fn open<P: AsRef<Path>>(path: P, create: bool) -> Result<Self> {
        let path = path.as_ref().to_path_buf();

        let records = if create {
            info!("initializing record store at {}", path.display());
            vec![PathRecord::empty()]
        } else {
            load_records(&path)?
        };

        let store = RecordStore { path, records };
        if create {
            store.persist()?;
        }
        Ok(store)
    }

    /// Append a path reference onto the single record and persist.
    pub fn write(&mut self, path_ref: &str) -> Result<()> {
        let record = self.record_mut()?;
        record.images.push(path_ref.to_string());
        record.updated_at = Utc::now().to_rfc3339();
        debug!("stored reference {}", path_ref);
        self.persist()
    }

    /// Look a stored reference up by value.
    pub fn read(&self, path_ref: &str) -> Option<&str> {
        self.records
            .iter()
            .flat_map(|record| record.images.iter())
            .find(|stored| stored.as_str() == path_ref)
            .map(String::as_str)
    }

    /// Every record currently stored.
    pub fn read_all(&self) -> Vec<PathRecord> {
        self.records.clone()
    }

    /// Delete the collection and its backing document. No undo.
    pub fn drop_collection(self) -> Result<()> {
        info!("dropping record store at {}", self.path.display());
        fs::remove_file(&self.path).map_err(|err| {
            Error::Connection(format!(
                "cannot remove store document {}: {}",
                self.path.display(),
                err
            ))
        })
    }

    /// Path of the backing document.
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn record_mut(&mut self) -> Result<&mut PathRecord> {
        self.records
            .iter_mut()
            .find(|record| record.id == RECORD_ID)
            .ok_or_else(|| {
                Error::Connection(format!(
                    "store document {} holds no record {}",
                    self.path.display(),
                    RECORD_ID
                ))
            })
    }

    fn persist(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).map_err(|err| {
                    Error::Connection(format!(
                        "cannot create store directory {}: {}",
                        parent.display(),
                        err
                    ))
                })?;
            }
        }

        let file = File::create(&self.path).map_err(|err| {
            Error::Connection(format!(
                "cannot write store document {}: {}",
                self.path.display(),
                err
            ))
        })?;
        serde_json::to_writer_pretty(file, &self.records).map_err(|err| {
            Error::Connection(format!(
                "cannot serialize store document {}: {}",
                self.path.display(),
                err
            ))
        })
    }
}

fn load_records(path: &Path) -> Result<Vec<PathRecord>> {
    let file = File::open(path).map_err(|err| {
        Error::Connection(format!(
            "cannot open store document {}: {}",
            path.display(),
            err
        ))
    })?;
    let reader = BufReader::new(file);
    serde_json::from_reader(reader).map_err(|err| {
        Error::Connection(format!(
            "cannot parse store document {}: {}",
            path.display(),
            err
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_open_create_initializes_empty_record() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.json");

        let store = RecordStore::open(&path, true).unwrap();
        let records = store.read_all();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id, 0);
        assert!(records[0].images.is_empty());
        assert!(path.exists());
    }

    #[test]
    fn test_write_accumulates_references() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.json");

        let mut store = RecordStore::open(&path, true).unwrap();
        store.write("/data/cat/a.png").unwrap();
        store.write("/data/cat/b.png").unwrap();
        store.write("/data/dog/c.png").unwrap();

        let records = store.read_all();
        assert_eq!(records[0].images.len(), 3);
        assert_eq!(records[0].images[0], "/data/cat/a.png");
        assert_eq!(records[0].images[2], "/data/dog/c.png");
    }

    #[test]
    fn test_references_survive_reopen() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.json");

        {
            let mut store = RecordStore::open(&path, true).unwrap();
            store.write("/data/cat/a.png").unwrap();
        }

        let store = RecordStore::open(&path, false).unwrap();
        assert_eq!(store.read("/data/cat/a.png"), Some("/data/cat/a.png"));
        assert_eq!(store.read("/data/cat/missing.png"), None);
    }

    #[test]
    fn test_open_missing_document_is_connection_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("gone.json");

        let result = RecordStore::open(&path, false);
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_open_corrupt_document_is_connection_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.json");
        fs::write(&path, "not json").unwrap();

        let result = RecordStore::open(&path, false);
        assert!(matches!(result, Err(Error::Connection(_))));
    }

    #[test]
    fn test_drop_collection_removes_document() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("refs.json");

        let store = RecordStore::open(&path, true).unwrap();
        assert!(path.exists());
        store.drop_collection().unwrap();
        assert!(!path.exists());
    }
}
