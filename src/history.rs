/*!
 * Persisted history of translation jobs.
 *
 * The store is loaded once at startup and rewritten in full after every
 * append. Appends are serialized by a mutex so concurrent jobs never lose
 * each other's entries.
 */

use log::{debug, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::errors::PersistenceError;
use crate::file_utils::FileManager;

/// Outcome of one translation job
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Subtitle file the job read
    pub source_file: PathBuf,
    /// Human readable summary: file name, language pair, outcome, duration
    pub summary: String,
    /// Whether the job completed without error
    pub success: bool,
}

impl HistoryEntry {
    pub fn new(source_file: impl Into<PathBuf>, summary: impl Into<String>, success: bool) -> Self {
        Self {
            source_file: source_file.into(),
            summary: summary.into(),
            success,
        }
    }
}

/// Append-only job history backed by a JSON file
#[derive(Debug)]
pub struct HistoryStore {
    /// Location of the persisted list
    path: PathBuf,
    /// Entries, oldest first
    entries: Mutex<Vec<HistoryEntry>>,
}

impl HistoryStore {
    /// Load the store at `path`. A missing file is an empty store; any other
    /// read or decode failure is returned.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, PersistenceError> {
        let path = path.as_ref().to_path_buf();

        let entries = match fs::read_to_string(&path) {
            Ok(content) => serde_json::from_str::<Vec<HistoryEntry>>(&content).map_err(|e| {
                PersistenceError::Corrupt {
                    path: path.clone(),
                    message: e.to_string(),
                }
            })?,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!("No history store at {}, starting empty", path.display());
                Vec::new()
            }
            Err(e) => {
                return Err(PersistenceError::Read {
                    path,
                    message: e.to_string(),
                });
            }
        };

        debug!("Loaded {} history entries from {}", entries.len(), path.display());
        Ok(Self {
            path,
            entries: Mutex::new(entries),
        })
    }

    /// Append an entry and flush the whole list before returning.
    ///
    /// If the flush fails the entry is dropped again, so the in-memory list
    /// never holds an entry that is not on disk.
    pub fn append(&self, entry: HistoryEntry) -> Result<(), PersistenceError> {
        let mut entries = self.entries.lock();
        entries.push(entry);

        if let Err(e) = Self::flush(&self.path, &entries) {
            entries.pop();
            warn!("History entry not recorded: {}", e);
            return Err(e);
        }

        Ok(())
    }

    /// Snapshot of all entries, oldest first
    pub fn all(&self) -> Vec<HistoryEntry> {
        self.entries.lock().clone()
    }

    /// Entry at `index` (0-based, oldest first)
    pub fn get(&self, index: usize) -> Option<HistoryEntry> {
        self.entries.lock().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Location of the persisted list
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn flush(path: &Path, entries: &[HistoryEntry]) -> Result<(), PersistenceError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|e| PersistenceError::Write {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        FileManager::write_atomic(path, &json)
    }
}
