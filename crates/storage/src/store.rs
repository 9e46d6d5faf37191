//! Result Store Implementation

use crate::StorageError;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::{HashMap, VecDeque};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Every stored file name starts with this
pub const FILE_PREFIX: &str = "prediction_";

const FALLBACK_NAME: &str = "upload.csv";

/// A stored result
#[derive(Debug, Clone, Serialize)]
pub struct ResultEntry<T> {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    /// Name the client uploaded
    pub source_name: String,
    /// Annotated file name inside the output directory
    pub file_name: String,
    pub payload: T,
}

struct Inner<T> {
    entries: HashMap<Uuid, ResultEntry<T>>,
    /// Insertion order, oldest first
    order: VecDeque<Uuid>,
}

/// Handle-keyed results with oldest-first eviction.
///
/// Evicting or removing an entry also deletes its file.
pub struct ResultStore<T> {
    output_dir: PathBuf,
    max_results: usize,
    inner: Mutex<Inner<T>>,
}

impl<T: Clone> ResultStore<T> {
    /// Open a store writing into `output_dir`, creating it if needed
    pub fn open(output_dir: impl Into<PathBuf>, max_results: usize) -> Result<Self, StorageError> {
        let output_dir = output_dir.into();
        fs::create_dir_all(&output_dir)?;
        info!(
            "Result store at {} (retaining {} results)",
            output_dir.display(),
            max_results
        );
        Ok(Self {
            output_dir,
            max_results: max_results.max(1),
            inner: Mutex::new(Inner {
                entries: HashMap::new(),
                order: VecDeque::new(),
            }),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Inner<T>>, StorageError> {
        self.inner.lock().map_err(|e| StorageError::Lock(e.to_string()))
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Write `contents` as the annotated file for a new handle
    pub fn insert(&self, source_name: &str, contents: &[u8], payload: T) -> Result<ResultEntry<T>, StorageError> {
        let id = Uuid::new_v4();
        let file_name = format!("{FILE_PREFIX}{id}_{}", sanitize_file_name(source_name));
        fs::write(self.output_dir.join(&file_name), contents)?;

        let entry = ResultEntry {
            id,
            created_at: Utc::now(),
            source_name: source_name.to_string(),
            file_name,
            payload,
        };

        let mut inner = self.lock()?;
        while inner.order.len() >= self.max_results {
            let Some(oldest) = inner.order.pop_front() else { break };
            if let Some(evicted) = inner.entries.remove(&oldest) {
                debug!("Evicting result {}", evicted.id);
                self.delete_file(&evicted.file_name);
            }
        }
        inner.order.push_back(id);
        inner.entries.insert(id, entry.clone());
        debug!("Stored result {} as {}", id, entry.file_name);
        Ok(entry)
    }

    pub fn get(&self, id: &Uuid) -> Result<ResultEntry<T>, StorageError> {
        self.lock()?
            .entries
            .get(id)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(format!("result {id}")))
    }

    /// Discard a handle and its file; `false` if it was not present
    pub fn remove(&self, id: &Uuid) -> Result<bool, StorageError> {
        let mut inner = self.lock()?;
        let Some(entry) = inner.entries.remove(id) else {
            return Ok(false);
        };
        inner.order.retain(|k| k != id);
        drop(inner);

        self.delete_file(&entry.file_name);
        info!("Reset result {}", id);
        Ok(true)
    }

    /// Path of a stored annotated file. Only names issued by this store resolve.
    pub fn file_path(&self, file_name: &str) -> Result<PathBuf, StorageError> {
        let known = self.lock()?.entries.values().any(|e| e.file_name == file_name);
        if !known {
            return Err(StorageError::NotFound(format!("file {file_name}")));
        }
        let path = self.output_dir.join(file_name);
        if !path.is_file() {
            return Err(StorageError::NotFound(format!("file {file_name}")));
        }
        Ok(path)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|inner| inner.entries.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn delete_file(&self, file_name: &str) {
        match fs::remove_file(self.output_dir.join(file_name)) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("Could not delete {}: {}", file_name, e),
        }
    }
}

/// Reduce a client-supplied file name to `[A-Za-z0-9._-]`.
///
/// Path components are dropped, spaces become `_`, leading dots are stripped.
/// A name whose stem cleans away to nothing becomes `upload.csv`.
pub fn sanitize_file_name(name: &str) -> String {
    let base = name.rsplit(&['/', '\\'][..]).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter_map(|c| match c {
            ' ' => Some('_'),
            c if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') => Some(c),
            _ => None,
        })
        .collect();
    let stem = cleaned.rsplit_once('.').map_or(cleaned.as_str(), |(stem, _)| stem);
    if stem.trim_start_matches('.').is_empty() {
        FALLBACK_NAME.to_string()
    } else {
        cleaned.trim_start_matches('.').to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store(max: usize) -> (tempfile::TempDir, ResultStore<u32>) {
        let dir = tempfile::tempdir().unwrap();
        let store = ResultStore::open(dir.path().join("uploads"), max).unwrap();
        (dir, store)
    }

    #[test]
    fn test_insert_and_get() {
        let (_dir, store) = store(4);
        let entry = store.insert("pump data.csv", b"a,b\n1,2\n", 7).unwrap();
        assert!(entry.file_name.starts_with(FILE_PREFIX));
        assert!(entry.file_name.ends_with("_pump_data.csv"));

        let fetched = store.get(&entry.id).unwrap();
        assert_eq!(fetched.payload, 7);
        let path = store.file_path(&entry.file_name).unwrap();
        assert_eq!(fs::read(path).unwrap(), b"a,b\n1,2\n");
    }

    #[test]
    fn test_retention_evicts_oldest_and_its_file() {
        let (_dir, store) = store(2);
        let first = store.insert("a.csv", b"1", 1).unwrap();
        let second = store.insert("b.csv", b"2", 2).unwrap();
        let third = store.insert("c.csv", b"3", 3).unwrap();

        assert_eq!(store.len(), 2);
        assert!(matches!(store.get(&first.id), Err(StorageError::NotFound(_))));
        assert!(!store.output_dir().join(&first.file_name).exists());
        assert!(store.get(&second.id).is_ok());
        assert!(store.get(&third.id).is_ok());
    }

    #[test]
    fn test_remove_is_idempotent() {
        let (_dir, store) = store(4);
        let entry = store.insert("a.csv", b"1", 1).unwrap();
        assert!(store.remove(&entry.id).unwrap());
        assert!(!store.remove(&entry.id).unwrap());
        assert!(!store.remove(&Uuid::new_v4()).unwrap());
        assert!(!store.output_dir().join(&entry.file_name).exists());
        assert!(store.is_empty());
    }

    #[test]
    fn test_unknown_files_do_not_resolve() {
        let (_dir, store) = store(4);
        fs::write(store.output_dir().join("secret.csv"), b"x").unwrap();
        assert!(matches!(store.file_path("secret.csv"), Err(StorageError::NotFound(_))));
        assert!(matches!(store.file_path("../Cargo.toml"), Err(StorageError::NotFound(_))));
    }

    #[test]
    fn test_sanitize_file_name() {
        assert_eq!(sanitize_file_name("pump data.csv"), "pump_data.csv");
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\uploads\\run#1.csv"), "run1.csv");
        assert_eq!(sanitize_file_name(".hidden.csv"), "hidden.csv");
        assert_eq!(sanitize_file_name("..."), "upload.csv");
        assert_eq!(sanitize_file_name("данные.csv"), "upload.csv");
        assert_eq!(sanitize_file_name(".csv"), "upload.csv");
        assert_eq!(sanitize_file_name("отчёт_1.csv"), "_1.csv");
    }
}
