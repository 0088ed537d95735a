//! Key-value record store.
//!
//! All persisted state (credentials, histories, working routines, the current
//! user marker) lives behind `KeyValueStore` as string values. `FileStore`
//! keeps every record in one JSON object on disk with file locking;
//! `MemoryStore` backs tests.

use crate::{Error, Result};
use fs2::FileExt;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Minimal get/set/remove storage interface
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&mut self, key: &str, value: &str) -> Result<()>;
    fn remove(&mut self, key: &str) -> Result<()>;
    fn keys(&self) -> Result<Vec<String>>;
}

/// In-memory store
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    records: BTreeMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.records.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.records.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.records.remove(key);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.records.keys().cloned().collect())
    }
}

/// Store backed by a single JSON file
///
/// Reads take a shared lock. Writes load the current records, apply the change
/// and atomically replace the file. For reads, a missing, unreadable or
/// corrupted file counts as empty. A write refuses to run when the file cannot
/// be read. If the file is corrupted, the write first moves it aside to
/// `<name>.corrupt`.
#[derive(Clone, Debug)]
pub struct FileStore {
    path: PathBuf,
}

impl FileStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Where a corrupted store is moved before it is replaced
    pub fn corrupt_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_default();
        name.push(".corrupt");
        self.path.with_file_name(name)
    }

    /// Raw file contents under a shared lock; `None` if the file is missing
    fn read_contents(&self) -> Result<Option<String>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let file = File::open(&self.path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read = reader.read_to_string(&mut contents);
        file.unlock()?;
        read?;

        Ok(Some(contents))
    }

    fn parse(contents: &str) -> serde_json::Result<BTreeMap<String, String>> {
        if contents.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        serde_json::from_str(contents)
    }

    /// Lenient load for reads: any failure counts as an empty store
    fn load(&self) -> Result<BTreeMap<String, String>> {
        let contents = match self.read_contents() {
            Ok(Some(contents)) => contents,
            Ok(None) => return Ok(BTreeMap::new()),
            Err(e) => {
                tracing::warn!("Failed to read store {:?}: {}. Treating as empty.", self.path, e);
                return Ok(BTreeMap::new());
            }
        };

        match Self::parse(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                tracing::warn!("Failed to parse store {:?}: {}. Treating as empty.", self.path, e);
                Ok(BTreeMap::new())
            }
        }
    }

    /// Strict load for writes
    ///
    /// I/O and lock failures are returned. An unparseable file is moved aside
    /// so the write that follows never destroys it.
    fn load_for_update(&self) -> Result<BTreeMap<String, String>> {
        let contents = match self.read_contents()? {
            Some(contents) => contents,
            None => return Ok(BTreeMap::new()),
        };

        match Self::parse(&contents) {
            Ok(records) => Ok(records),
            Err(e) => {
                let backup = self.corrupt_path();
                std::fs::rename(&self.path, &backup)?;
                tracing::warn!(
                    "Store {:?} is corrupted ({}); moved it to {:?} and starting empty",
                    self.path,
                    e,
                    backup
                );
                Ok(BTreeMap::new())
            }
        }
    }

    fn save(&self, records: &BTreeMap<String, String>) -> Result<()> {
        let parent = self
            .path
            .parent()
            .ok_or_else(|| Error::Storage(format!("Store path {:?} has no parent", self.path)))?;
        std::fs::create_dir_all(parent)?;

        let temp = NamedTempFile::new_in(parent)?;
        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            serde_json::to_writer(&mut writer, records)?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(&self.path).map_err(|e| Error::Io(e.error))?;
        Ok(())
    }

    /// Load, modify and save back
    fn update<F>(&self, f: F) -> Result<()>
    where
        F: FnOnce(&mut BTreeMap<String, String>),
    {
        let mut records = self.load_for_update()?;
        f(&mut records);
        self.save(&records)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&mut self, key: &str, value: &str) -> Result<()> {
        self.update(|records| {
            records.insert(key.to_string(), value.to_string());
        })?;
        tracing::debug!("Stored {} in {:?}", key, self.path);
        Ok(())
    }

    fn remove(&mut self, key: &str) -> Result<()> {
        self.update(|records| {
            records.remove(key);
        })?;
        tracing::debug!("Removed {} from {:?}", key, self.path);
        Ok(())
    }

    fn keys(&self) -> Result<Vec<String>> {
        Ok(self.load()?.into_keys().collect())
    }
}
