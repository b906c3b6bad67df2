//! # Storage
//!
//! The key-value port every persisted feature goes through, with two
//! implementations:
//! - [`MemoryStore`]: a plain map, for tests and one-shot runs
//! - [`FileStore`]: one JSON document on disk with
//!   - **Atomic saves**: write to `.tmp`, fsync, rename over the original
//!   - **Locking**: a `.lock` file held with an OS lock for the store's lifetime
//!   - **Version validation**: the document's schema version must be compatible
//!
//! Values are JSON strings; [`load_json`] and [`store_json`] do the typed
//! conversion.
//!
//! ## File Format
//!
//! ```json
//! {
//!   "version": "0.1.0",
//!   "entries": {
//!     "calc-history": "[...]",
//!     "challengeStreak": "{\"count\":3,\"lastCompleted\":\"2025-01-02\"}"
//!   }
//! }
//! ```
//!
//! ## Example
//!
//! ```rust,no_run
//! use mathbox_core::storage::{FileStore, KeyValueStore};
//!
//! let mut store = FileStore::open("store.json")?;
//! store.set("greeting", "\"hello\"")?;
//! assert_eq!(store.get("greeting").as_deref(), Some("\"hello\""));
//! // Lock is released when the store is dropped
//! # Ok::<(), mathbox_core::errors::CalcError>(())
//! ```

use std::collections::{BTreeMap, HashMap};
use std::fs::{self, File, OpenOptions};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use fs2::FileExt;
use semver::Version;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::errors::{CalcError, CalcResult};

/// Schema version written into every store document
pub const STORE_VERSION: &str = "0.1.0";

/// Hours after which an abandoned lock is ignored
const STALE_LOCK_HOURS: i64 = 24;

/// String key-value storage port
pub trait KeyValueStore {
    fn get(&self, key: &str) -> Option<String>;
    fn set(&mut self, key: &str, value: &str) -> CalcResult<()>;
}

/// Read and deserialize the JSON value under `key`.
///
/// `Ok(None)` when the key is absent.
pub fn load_json<T, S>(store: &S, key: &str) -> CalcResult<Option<T>>
where
    T: DeserializeOwned,
    S: KeyValueStore + ?Sized,
{
    store
        .get(key)
        .map(|raw| serde_json::from_str(&raw).map_err(CalcError::serialization))
        .transpose()
}

/// Serialize `value` to JSON and write it under `key`
pub fn store_json<T, S>(store: &mut S, key: &str, value: &T) -> CalcResult<()>
where
    T: Serialize + ?Sized,
    S: KeyValueStore + ?Sized,
{
    let raw = serde_json::to_string(value).map_err(CalcError::serialization)?;
    store.set(key, &raw)
}

// ============================================================================
// In-memory store
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> CalcResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

// ============================================================================
// Lock file
// ============================================================================

/// Metadata written into the `.lock` file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LockInfo {
    /// Process holding the lock
    pub pid: u32,
    pub locked_at: DateTime<Utc>,
}

impl LockInfo {
    fn current() -> Self {
        LockInfo {
            pid: std::process::id(),
            locked_at: Utc::now(),
        }
    }

    /// The holding process is gone, or the lock is older than a day
    fn is_stale(&self) -> bool {
        #[cfg(unix)]
        {
            if fs::metadata(format!("/proc/{}", self.pid)).is_err() && Path::new("/proc/self").exists() {
                return true;
            }
        }
        (Utc::now() - self.locked_at).num_hours() > STALE_LOCK_HOURS
    }
}

/// Exclusive lock on a store file, released on drop.
///
/// Uses both an OS-level lock (fs2) on the `.lock` file and the
/// [`LockInfo`] written into it, so a second process can report who holds
/// the store.
#[derive(Debug)]
pub struct StoreLock {
    lock_path: PathBuf,
    _lock_file: File,
    pub info: LockInfo,
}

impl StoreLock {
    /// # Errors
    ///
    /// `CalcError::StoreLocked` when a live process already holds the lock.
    pub fn acquire(path: &Path) -> CalcResult<Self> {
        let lock_path = sibling(path, ".lock");

        if let Some(existing) = Self::check(path) {
            return Err(locked(path, &existing));
        }

        let mut lock_file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .map_err(|e| CalcError::storage_error("create lock", lock_path.display().to_string(), e.to_string()))?;

        lock_file
            .try_lock_exclusive()
            .map_err(|_| locked(path, &LockInfo::current()))?;

        let info = LockInfo::current();
        let json = serde_json::to_string_pretty(&info).map_err(CalcError::serialization)?;
        lock_file
            .set_len(0)
            .and_then(|_| lock_file.write_all(json.as_bytes()))
            .and_then(|_| lock_file.sync_all())
            .map_err(|e| CalcError::storage_error("write lock", lock_path.display().to_string(), e.to_string()))?;

        debug!(path = %lock_path.display(), pid = info.pid, "store lock acquired");
        Ok(StoreLock {
            lock_path,
            _lock_file: lock_file,
            info,
        })
    }

    /// Who holds the lock on `path`, if anyone live does
    pub fn check(path: &Path) -> Option<LockInfo> {
        let lock_path = sibling(path, ".lock");
        let mut contents = String::new();
        File::open(&lock_path).ok()?.read_to_string(&mut contents).ok()?;
        let info: LockInfo = serde_json::from_str(&contents).ok()?;
        if info.is_stale() {
            warn!(path = %lock_path.display(), pid = info.pid, "ignoring stale store lock");
            return None;
        }
        Some(info)
    }
}

impl Drop for StoreLock {
    fn drop(&mut self) {
        let _ = fs::remove_file(&self.lock_path);
    }
}

fn locked(path: &Path, holder: &LockInfo) -> CalcError {
    CalcError::StoreLocked {
        path: path.display().to_string(),
        pid: holder.pid,
        locked_at: holder.locked_at.to_rfc3339(),
    }
}

/// `store.json` + `.lock` -> `store.json.lock`
fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}

// ============================================================================
// File store
// ============================================================================

#[derive(Debug, Serialize, Deserialize)]
struct StoreDocument {
    version: String,
    #[serde(default)]
    entries: BTreeMap<String, String>,
}

/// A store persisted as a single JSON document.
///
/// Every `set` rewrites the document atomically. The store holds its lock
/// until dropped, so there is at most one writer per file.
#[derive(Debug)]
pub struct FileStore {
    path: PathBuf,
    entries: BTreeMap<String, String>,
    _lock: StoreLock,
}

impl FileStore {
    /// Lock and load the store at `path`, creating parent directories.
    /// A missing file is an empty store.
    ///
    /// # Errors
    ///
    /// - `CalcError::StoreLocked` - another process holds the store
    /// - `CalcError::VersionMismatch` - the file was written by an incompatible version
    /// - `CalcError::SerializationError` - the file is not a store document
    /// - `CalcError::StorageError` - I/O failure
    pub fn open(path: impl AsRef<Path>) -> CalcResult<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|e| CalcError::storage_error("create directory", parent.display().to_string(), e.to_string()))?;
        }

        let lock = StoreLock::acquire(&path)?;
        let entries = if path.exists() {
            read_document(&path)?.entries
        } else {
            BTreeMap::new()
        };

        info!(path = %path.display(), keys = entries.len(), "store opened");
        Ok(FileStore {
            path,
            entries,
            _lock: lock,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    fn flush(&self) -> CalcResult<()> {
        let document = StoreDocument {
            version: STORE_VERSION.to_string(),
            entries: self.entries.clone(),
        };
        write_atomic(&self.path, &document)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Option<String> {
        self.entries.get(key).cloned()
    }

    fn set(&mut self, key: &str, value: &str) -> CalcResult<()> {
        self.entries.insert(key.to_string(), value.to_string());
        self.flush()?;
        debug!(key, bytes = value.len(), "store entry written");
        Ok(())
    }
}

/// Write `document` to `path` via tmp file + fsync + rename
fn write_atomic(path: &Path, document: &StoreDocument) -> CalcResult<()> {
    let json = serde_json::to_string_pretty(document).map_err(CalcError::serialization)?;
    let tmp_path = sibling(path, ".tmp");

    let mut tmp_file = File::create(&tmp_path)
        .map_err(|e| CalcError::storage_error("create temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .write_all(json.as_bytes())
        .map_err(|e| CalcError::storage_error("write temp file", tmp_path.display().to_string(), e.to_string()))?;
    tmp_file
        .sync_all()
        .map_err(|e| CalcError::storage_error("sync temp file", tmp_path.display().to_string(), e.to_string()))?;

    fs::rename(&tmp_path, path).map_err(|e| {
        let _ = fs::remove_file(&tmp_path);
        CalcError::storage_error("rename to final", path.display().to_string(), e.to_string())
    })
}

fn read_document(path: &Path) -> CalcResult<StoreDocument> {
    let contents = fs::read_to_string(path)
        .map_err(|e| CalcError::storage_error("read", path.display().to_string(), e.to_string()))?;
    let document: StoreDocument = serde_json::from_str(&contents)
        .map_err(|e| CalcError::serialization(format!("Invalid store in {}: {}", path.display(), e)))?;
    validate_version(&document.version)?;
    Ok(document)
}

/// Major must match; on 0.x a newer minor is rejected too
fn validate_version(file_version: &str) -> CalcResult<()> {
    let mismatch = || CalcError::VersionMismatch {
        file_version: file_version.to_string(),
        expected_version: STORE_VERSION.to_string(),
    };
    let file = Version::parse(file_version).map_err(|_| mismatch())?;
    let current = Version::parse(STORE_VERSION).map_err(|_| mismatch())?;

    if file.major != current.major {
        return Err(mismatch());
    }
    if current.major == 0 && file.minor > current.minor {
        return Err(mismatch());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn store_path(dir: &TempDir) -> PathBuf {
        dir.path().join("store.json")
    }

    #[test]
    fn test_memory_store() {
        let mut store = MemoryStore::new();
        assert!(store.get("missing").is_none());
        store.set("k", "\"v\"").unwrap();
        assert_eq!(store.get("k").as_deref(), Some("\"v\""));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_typed_helpers() {
        let mut store = MemoryStore::new();
        store_json(&mut store, "numbers", &vec![1, 2, 3]).unwrap();
        let loaded: Option<Vec<i32>> = load_json(&store, "numbers").unwrap();
        assert_eq!(loaded, Some(vec![1, 2, 3]));
        let absent: Option<Vec<i32>> = load_json(&store, "other").unwrap();
        assert!(absent.is_none());

        store.set("bad", "not json").unwrap();
        let err = load_json::<Vec<i32>, _>(&store, "bad").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_sibling_paths() {
        let path = Path::new("/data/store.json");
        assert_eq!(sibling(path, ".lock"), Path::new("/data/store.json.lock"));
        assert_eq!(sibling(path, ".tmp"), Path::new("/data/store.json.tmp"));
    }

    #[test]
    fn test_file_store_persists() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        {
            let mut store = FileStore::open(&path).unwrap();
            store.set("calc-history", "[]").unwrap();
        }
        let store = FileStore::open(&path).unwrap();
        assert_eq!(store.get("calc-history").as_deref(), Some("[]"));
        assert_eq!(store.keys().collect::<Vec<_>>(), vec!["calc-history"]);
    }

    #[test]
    fn test_atomic_save_leaves_no_tmp_file() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let mut store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        assert!(path.exists());
        assert!(!sibling(&path, ".tmp").exists());

        let raw = fs::read_to_string(&path).unwrap();
        assert!(raw.contains("\"version\": \"0.1.0\""));
    }

    #[test]
    fn test_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("deeper").join("store.json");
        let mut store = FileStore::open(&path).unwrap();
        store.set("a", "1").unwrap();
        assert!(path.exists());
    }

    #[test]
    fn test_lock_released_on_drop() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let lock_path = sibling(&path, ".lock");

        let store = FileStore::open(&path).unwrap();
        assert!(lock_path.exists());
        drop(store);
        assert!(!lock_path.exists());
    }

    #[test]
    fn test_second_open_is_locked() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let _first = FileStore::open(&path).unwrap();

        let err = FileStore::open(&path).unwrap_err();
        assert_eq!(err.error_code(), "STORE_LOCKED");
        assert!(err.is_recoverable());
    }

    #[test]
    fn test_stale_lock_is_taken_over() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        let stale = LockInfo {
            pid: std::process::id(),
            locked_at: Utc::now() - chrono::Duration::hours(48),
        };
        fs::write(sibling(&path, ".lock"), serde_json::to_string(&stale).unwrap()).unwrap();

        assert!(FileStore::open(&path).is_ok());
    }

    #[test]
    fn test_corrupt_store_rejected() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, "{ nope").unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_version_validation() {
        assert!(validate_version(STORE_VERSION).is_ok());
        assert!(validate_version("0.1.7").is_ok());
        assert!(validate_version("0.0.9").is_ok());
        assert!(validate_version("0.2.0").is_err());
        assert!(validate_version("1.0.0").is_err());
        assert!(validate_version("banana").is_err());
    }

    #[test]
    fn test_newer_store_rejected() {
        let dir = TempDir::new().unwrap();
        let path = store_path(&dir);
        fs::write(&path, r#"{"version":"0.9.0","entries":{}}"#).unwrap();
        let err = FileStore::open(&path).unwrap_err();
        assert!(matches!(err, CalcError::VersionMismatch { .. }));
    }
}
