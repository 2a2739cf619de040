//! JSON file key-value store.
//!
//! The whole store is one JSON object of string keys to string values.
//! Every mutation rewrites the file through a temporary sibling and a
//! rename, so a crash mid-write leaves the previous contents intact.

use std::collections::BTreeMap;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

use cap_std::{ambient_authority, fs::Dir};
use tracing::debug;

use crate::domain::ports::{KeyValueStore, StorageError};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

type Entries = BTreeMap<String, String>;

/// Key-value store persisted to a single file inside a capability directory.
#[derive(Debug)]
pub struct FileKeyValueStore {
    dir: Dir,
    file_name: String,
    lock: Mutex<()>,
}

impl FileKeyValueStore {
    /// Open `file_name` inside an already-open directory.
    pub fn new(dir: Dir, file_name: impl Into<String>) -> Self {
        Self {
            dir,
            file_name: file_name.into(),
            lock: Mutex::new(()),
        }
    }

    /// Open the store at `path`, creating its parent directory if needed.
    ///
    /// # Errors
    ///
    /// Returns [`StorageError::Unavailable`] when `path` has no file name or
    /// the parent directory cannot be created or opened.
    pub fn open(path: &Path) -> Result<Self, StorageError> {
        let file_name = path
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| {
                StorageError::unavailable(format!("{} does not name a file", path.display()))
            })?
            .to_owned();
        let parent = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        Dir::create_ambient_dir_all(&parent, ambient_authority())
            .map_err(|err| unavailable(&parent, &err))?;
        let dir = Dir::open_ambient_dir(&parent, ambient_authority())
            .map_err(|err| unavailable(&parent, &err))?;
        debug!(path = %path.display(), "opened file store");
        Ok(Self::new(dir, file_name))
    }

    fn guard(&self) -> MutexGuard<'_, ()> {
        self.lock.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn read_entries(&self) -> Result<Entries, StorageError> {
        let raw = match self.dir.read_to_string(&self.file_name) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Entries::new()),
            Err(err) => return Err(unavailable(Path::new(&self.file_name), &err)),
        };
        if raw.trim().is_empty() {
            return Ok(Entries::new());
        }
        serde_json::from_str(&raw).map_err(|err| {
            StorageError::corrupt(format!("{}: {err}", self.file_name))
        })
    }

    fn write_entries(&self, entries: &Entries) -> Result<(), StorageError> {
        let contents = serde_json::to_string_pretty(entries)
            .map_err(|err| StorageError::unavailable(err.to_string()))?;
        let counter = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
        let tmp_name = format!(".{}.tmp.{}.{counter}", self.file_name, std::process::id());
        if let Err(err) = self.dir.write(&tmp_name, contents) {
            drop(self.dir.remove_file(&tmp_name));
            return Err(unavailable(Path::new(&tmp_name), &err));
        }
        self.dir
            .rename(&tmp_name, &self.dir, &self.file_name)
            .map_err(|err| unavailable(Path::new(&self.file_name), &err))
    }

    fn update(&self, change: impl FnOnce(&mut Entries)) -> Result<(), StorageError> {
        let _guard = self.guard();
        let mut entries = self.read_entries()?;
        change(&mut entries);
        self.write_entries(&entries)
    }
}

fn unavailable(path: &Path, err: &io::Error) -> StorageError {
    StorageError::unavailable(format!("{}: {err}", path.display()))
}

impl KeyValueStore for FileKeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let _guard = self.guard();
        Ok(self.read_entries()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.insert(key.to_owned(), value.to_owned());
        })
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.update(|entries| {
            entries.remove(key);
        })
    }

    fn clear(&self) -> Result<(), StorageError> {
        let _guard = self.guard();
        match self.dir.remove_file(&self.file_name) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(err) => Err(unavailable(Path::new(&self.file_name), &err)),
        }
    }

    fn keys(&self) -> Result<Vec<String>, StorageError> {
        let _guard = self.guard();
        Ok(self.read_entries()?.into_keys().collect())
    }
}
