//! Persisted sync state: the per-supplier image cache and progress cursor.
//!
//! Core logic only talks to [`StateStore`]; [`JsonFileStore`] is the on-disk
//! implementation and [`MemoryStore`] backs tests.

use std::collections::BTreeMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::error::StateError;

/// Verdict of the image validator, cached so each image is checked once.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationResult {
    pub valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl ValidationResult {
    #[must_use]
    pub fn valid(width: u32, height: u32) -> Self {
        Self {
            valid: true,
            width: Some(width),
            height: Some(height),
            reason: None,
        }
    }

    #[must_use]
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            valid: false,
            width: None,
            height: None,
            reason: Some(reason.into()),
        }
    }
}

/// Cached knowledge about one canonical image key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CacheEntry {
    pub uploaded: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationResult>,
}

/// Storage for everything that must survive between runs.
pub trait StateStore {
    /// Loads the image cache. A store that has never been written is empty.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the backing storage cannot be read or parsed.
    fn load_entries(&self) -> Result<BTreeMap<String, CacheEntry>, StateError>;

    /// Replaces the persisted image cache with `entries`.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the write does not complete.
    fn save_entries(&self, entries: &BTreeMap<String, CacheEntry>) -> Result<(), StateError>;

    /// # Errors
    ///
    /// Returns [`StateError`] when the cursor cannot be read.
    fn load_cursor(&self) -> Result<Option<String>, StateError>;

    /// # Errors
    ///
    /// Returns [`StateError`] when the cursor cannot be written.
    fn save_cursor(&self, grouping_key: &str) -> Result<(), StateError>;

    /// Deletes the cursor. Clearing an absent cursor succeeds.
    ///
    /// # Errors
    ///
    /// Returns [`StateError`] when the cursor exists but cannot be removed.
    fn clear_cursor(&self) -> Result<(), StateError>;
}

/// File-backed state under one directory:
/// `<dir>/<supplier>_image_cache.json` and `<dir>/<supplier>_progress.txt`.
#[derive(Debug, Clone)]
pub struct JsonFileStore {
    cache_path: PathBuf,
    progress_path: PathBuf,
}

impl JsonFileStore {
    #[must_use]
    pub fn for_supplier(state_dir: &Path, supplier: &str) -> Self {
        let stem = supplier.to_lowercase();
        Self {
            cache_path: state_dir.join(format!("{stem}_image_cache.json")),
            progress_path: state_dir.join(format!("{stem}_progress.txt")),
        }
    }

    #[must_use]
    pub fn cache_path(&self) -> &Path {
        &self.cache_path
    }

    #[must_use]
    pub fn progress_path(&self) -> &Path {
        &self.progress_path
    }
}

fn io_error(path: &Path, source: std::io::Error) -> StateError {
    StateError::Io {
        path: path.display().to_string(),
        source,
    }
}

fn read_optional(path: &Path) -> Result<Option<String>, StateError> {
    match std::fs::read_to_string(path) {
        Ok(content) => Ok(Some(content)),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
        Err(e) => Err(io_error(path, e)),
    }
}

/// Writes `content` next to `path` and renames it into place so a crash
/// never leaves a half-written file behind.
fn write_atomic(path: &Path, content: &[u8]) -> Result<(), StateError> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent).map_err(|e| io_error(parent, e))?;
        }
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    std::fs::write(&tmp, content).map_err(|e| io_error(&tmp, e))?;
    std::fs::rename(&tmp, path).map_err(|e| {
        let _ = std::fs::remove_file(&tmp);
        io_error(path, e)
    })
}

impl StateStore for JsonFileStore {
    fn load_entries(&self) -> Result<BTreeMap<String, CacheEntry>, StateError> {
        match read_optional(&self.cache_path)? {
            Some(content) if !content.trim().is_empty() => {
                serde_json::from_str(&content).map_err(|source| StateError::Corrupt {
                    path: self.cache_path.display().to_string(),
                    source,
                })
            }
            _ => Ok(BTreeMap::new()),
        }
    }

    fn save_entries(&self, entries: &BTreeMap<String, CacheEntry>) -> Result<(), StateError> {
        let json = serde_json::to_vec_pretty(entries).map_err(|source| StateError::Corrupt {
            path: self.cache_path.display().to_string(),
            source,
        })?;
        write_atomic(&self.cache_path, &json)
    }

    fn load_cursor(&self) -> Result<Option<String>, StateError> {
        Ok(read_optional(&self.progress_path)?
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty()))
    }

    fn save_cursor(&self, grouping_key: &str) -> Result<(), StateError> {
        write_atomic(&self.progress_path, grouping_key.as_bytes())
    }

    fn clear_cursor(&self) -> Result<(), StateError> {
        match std::fs::remove_file(&self.progress_path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(io_error(&self.progress_path, e)),
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    entries: BTreeMap<String, CacheEntry>,
    cursor: Option<String>,
    fail_writes: bool,
    entry_writes: usize,
    cursor_history: Vec<String>,
}

/// In-memory [`StateStore`]. Clones share the same state.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write fail with [`StateError::Unavailable`].
    pub fn fail_writes(&self, fail: bool) {
        self.lock().fail_writes = fail;
    }

    #[must_use]
    pub fn entries(&self) -> BTreeMap<String, CacheEntry> {
        self.lock().entries.clone()
    }

    #[must_use]
    pub fn cursor(&self) -> Option<String> {
        self.lock().cursor.clone()
    }

    /// Every cursor value ever saved, in order.
    #[must_use]
    pub fn cursor_history(&self) -> Vec<String> {
        self.lock().cursor_history.clone()
    }

    #[must_use]
    pub fn entry_writes(&self) -> usize {
        self.lock().entry_writes
    }

    pub fn set_cursor(&self, grouping_key: &str) {
        self.lock().cursor = Some(grouping_key.to_string());
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, MemoryState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl StateStore for MemoryStore {
    fn load_entries(&self) -> Result<BTreeMap<String, CacheEntry>, StateError> {
        Ok(self.lock().entries.clone())
    }

    fn save_entries(&self, entries: &BTreeMap<String, CacheEntry>) -> Result<(), StateError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StateError::Unavailable("writes disabled".to_string()));
        }
        state.entries = entries.clone();
        state.entry_writes += 1;
        Ok(())
    }

    fn load_cursor(&self) -> Result<Option<String>, StateError> {
        Ok(self.lock().cursor.clone())
    }

    fn save_cursor(&self, grouping_key: &str) -> Result<(), StateError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StateError::Unavailable("writes disabled".to_string()));
        }
        state.cursor = Some(grouping_key.to_string());
        state.cursor_history.push(grouping_key.to_string());
        Ok(())
    }

    fn clear_cursor(&self) -> Result<(), StateError> {
        let mut state = self.lock();
        if state.fail_writes {
            return Err(StateError::Unavailable("writes disabled".to_string()));
        }
        state.cursor = None;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn temp_dir(label: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "catsync-state-{label}-{}",
            uuid::Uuid::new_v4()
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn file_store_paths_follow_supplier_name() {
        let store = JsonFileStore::for_supplier(Path::new("/var/state"), "Deerhunter");
        assert_eq!(
            store.cache_path(),
            Path::new("/var/state/deerhunter_image_cache.json")
        );
        assert_eq!(
            store.progress_path(),
            Path::new("/var/state/deerhunter_progress.txt")
        );
    }

    #[test]
    fn missing_files_load_as_empty() {
        let dir = temp_dir("missing");
        let store = JsonFileStore::for_supplier(&dir, "chevalier");
        assert!(store.load_entries().unwrap().is_empty());
        assert_eq!(store.load_cursor().unwrap(), None);
        store.clear_cursor().unwrap();
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn entries_round_trip_through_disk() {
        let dir = temp_dir("entries");
        let store = JsonFileStore::for_supplier(&dir, "deerhunter");
        let mut entries = BTreeMap::new();
        entries.insert(
            "d_m_f_3733-642".to_string(),
            CacheEntry {
                uploaded: true,
                remote_id: Some(42),
                validation: Some(ValidationResult::valid(1200, 1600)),
            },
        );
        store.save_entries(&entries).unwrap();
        assert_eq!(store.load_entries().unwrap(), entries);
        assert!(!dir.join("deerhunter_image_cache.json.tmp").exists());
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn cursor_save_load_and_clear() {
        let dir = temp_dir("cursor");
        let store = JsonFileStore::for_supplier(&dir, "deerhunter");
        store.save_cursor("5730").unwrap();
        assert_eq!(store.load_cursor().unwrap().as_deref(), Some("5730"));
        store.save_cursor("5731").unwrap();
        assert_eq!(store.load_cursor().unwrap().as_deref(), Some("5731"));
        store.clear_cursor().unwrap();
        assert!(!store.progress_path().exists());
        assert_eq!(store.load_cursor().unwrap(), None);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn corrupt_cache_is_an_error() {
        let dir = temp_dir("corrupt");
        let store = JsonFileStore::for_supplier(&dir, "deerhunter");
        std::fs::write(store.cache_path(), "{not json").unwrap();
        assert!(matches!(
            store.load_entries(),
            Err(StateError::Corrupt { .. })
        ));
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn legacy_entry_without_optional_fields_parses() {
        let dir = temp_dir("legacy");
        let store = JsonFileStore::for_supplier(&dir, "deerhunter");
        std::fs::write(store.cache_path(), r#"{"cap_1": {"uploaded": true}}"#).unwrap();
        let entries = store.load_entries().unwrap();
        assert!(entries["cap_1"].uploaded);
        assert_eq!(entries["cap_1"].remote_id, None);
        std::fs::remove_dir_all(dir).ok();
    }

    #[test]
    fn memory_store_clones_share_state() {
        let store = MemoryStore::new();
        let clone = store.clone();
        clone.save_cursor("A").unwrap();
        assert_eq!(store.cursor().as_deref(), Some("A"));
        store.fail_writes(true);
        assert!(clone.save_cursor("B").is_err());
        assert_eq!(store.cursor_history(), vec!["A".to_string()]);
    }
}
