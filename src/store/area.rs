//! Storage areas: the durable key-value backends behind a [`LocalStorage`]
//!
//! An area stores opaque string blobs under string keys, the same contract
//! as a browser's per-origin local storage. Two areas are provided:
//!
//! - [`MemoryArea`]: process-local map, used for tests and ephemeral sessions
//! - [`FileArea`]: one file per key under a data directory
//!
//! [`LocalStorage`]: crate::store::LocalStorage

use crate::store::error::{StoreError, StoreResult};
use std::collections::HashMap;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, RwLock};

/// File extension used for blobs written by [`FileArea`]
const BLOB_EXTENSION: &str = "json";

/// File extension of in-flight writes; never listed as a key
const TEMP_EXTENSION: &str = "tmp";

/// A durable string key-value area
///
/// Every method is synchronous; implementations must make `set_item`
/// atomic from a reader's point of view (last write wins, never a torn blob).
pub trait StorageArea: Send + Sync {
    /// Read the blob stored under `key`, `None` when absent
    fn get_item(&self, key: &str) -> StoreResult<Option<String>>;

    /// Overwrite the blob under `key`
    fn set_item(&self, key: &str, value: &str) -> StoreResult<()>;

    /// Delete the blob under `key`; deleting an absent key is not an error
    fn remove_item(&self, key: &str) -> StoreResult<()>;

    /// All keys currently present, sorted
    fn keys(&self) -> StoreResult<Vec<String>>;
}

/// In-memory storage area
#[derive(Debug, Default)]
pub struct MemoryArea {
    items: RwLock<HashMap<String, String>>,
}

impl MemoryArea {
    pub fn new() -> Self {
        Self::default()
    }
}

impl StorageArea for MemoryArea {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        Ok(items.get(key).cloned())
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        items.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let mut items = self
            .items
            .write()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        items.remove(key);
        Ok(())
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let items = self
            .items
            .read()
            .map_err(|e| StoreError::Lock(e.to_string()))?;
        let mut keys: Vec<String> = items.keys().cloned().collect();
        keys.sort();
        Ok(keys)
    }
}

/// Directory-backed storage area
///
/// Each key maps to `<data_dir>/<percent-encoded key>.json`. Keys such as
/// `dex-stats-api/ui/dashboards` contain path separators, so they are
/// encoded into flat file names.
///
/// Writes go to a temporary sibling file which is then renamed over the
/// target, so readers see either the previous or the new blob.
///
/// Several processes may open the same directory and will read each
/// other's writes, but change events only travel inside one process: a
/// write from another process is not announced and is seen on the next
/// load or reload.
#[derive(Debug)]
pub struct FileArea {
    data_dir: PathBuf,
    /// Serializes writers within this process
    write_lock: Mutex<()>,
}

impl FileArea {
    /// Open (and create if needed) an area rooted at `data_dir`
    pub fn open(data_dir: impl AsRef<Path>) -> StoreResult<Self> {
        let data_dir = data_dir.as_ref().to_path_buf();
        fs::create_dir_all(&data_dir)?;

        tracing::debug!(data_dir = ?data_dir, "Opened file storage area");

        Ok(Self {
            data_dir,
            write_lock: Mutex::new(()),
        })
    }

    /// Root directory of this area
    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    /// Path of the blob file for `key`
    pub fn blob_path(&self, key: &str) -> PathBuf {
        self.data_dir
            .join(format!("{}.{}", escape_key(key), BLOB_EXTENSION))
    }
}

impl StorageArea for FileArea {
    fn get_item(&self, key: &str) -> StoreResult<Option<String>> {
        match fs::read_to_string(self.blob_path(key)) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn set_item(&self, key: &str, value: &str) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        let target = self.blob_path(key);
        let tmp = self.data_dir.join(format!(
            "{}.{}.{}",
            escape_key(key),
            uuid::Uuid::new_v4().simple(),
            TEMP_EXTENSION
        ));

        let mut file = fs::File::create(&tmp)?;
        file.write_all(value.as_bytes())?;
        file.sync_all()?;
        drop(file);

        if let Err(e) = fs::rename(&tmp, &target) {
            let _ = fs::remove_file(&tmp);
            return Err(e.into());
        }
        Ok(())
    }

    fn remove_item(&self, key: &str) -> StoreResult<()> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|e| StoreError::Lock(e.to_string()))?;

        match fs::remove_file(self.blob_path(key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    fn keys(&self) -> StoreResult<Vec<String>> {
        let mut keys = Vec::new();
        for entry in fs::read_dir(&self.data_dir)? {
            let path = entry?.path();
            if path.extension().and_then(|ext| ext.to_str()) != Some(BLOB_EXTENSION) {
                continue;
            }
            let Some(stem) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            if let Some(key) = unescape_key(stem) {
                keys.push(key);
            }
        }
        keys.sort();
        Ok(keys)
    }
}

/// Percent-encode a key into a flat file name
fn escape_key(key: &str) -> String {
    urlencoding::encode(key).into_owned()
}

/// Inverse of [`escape_key`], `None` for names that do not decode to UTF-8
fn unescape_key(name: &str) -> Option<String> {
    urlencoding::decode(name).ok().map(|key| key.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_memory_area_get_set_remove() {
        let area = MemoryArea::new();
        assert_eq!(area.get_item("k").unwrap(), None);

        area.set_item("k", "[1]").unwrap();
        area.set_item("k", "[2]").unwrap();
        assert_eq!(area.get_item("k").unwrap().as_deref(), Some("[2]"));

        area.remove_item("k").unwrap();
        area.remove_item("k").unwrap();
        assert_eq!(area.get_item("k").unwrap(), None);
    }

    #[test]
    fn test_key_escaping() {
        let key = "dex-stats-api/ui/api/settings";
        let escaped = escape_key(key);
        assert_eq!(escaped, "dex-stats-api%2Fui%2Fapi%2Fsettings");
        assert_eq!(unescape_key(&escaped).as_deref(), Some(key));

        assert_eq!(escape_key("a key"), "a%20key");
        assert_eq!(unescape_key("%FF%FE"), None);
    }

    #[test]
    fn test_file_area_persists_across_instances() {
        let dir = tempdir().unwrap();

        {
            let area = FileArea::open(dir.path()).unwrap();
            area.set_item("dex-stats-api/ui/dashboards", "[]").unwrap();
        }

        let area = FileArea::open(dir.path()).unwrap();
        assert_eq!(
            area.get_item("dex-stats-api/ui/dashboards").unwrap().as_deref(),
            Some("[]")
        );
        assert_eq!(area.get_item("missing").unwrap(), None);
    }

    #[test]
    fn test_file_area_keys_skip_foreign_files() {
        let dir = tempdir().unwrap();
        let area = FileArea::open(dir.path()).unwrap();

        area.set_item("b/key", "1").unwrap();
        area.set_item("a key", "2").unwrap();
        std::fs::write(dir.path().join("notes.txt"), "ignored").unwrap();
        std::fs::write(dir.path().join("b%2Fkey.0123abcd.tmp"), "ignored").unwrap();

        assert_eq!(area.keys().unwrap(), vec!["a key", "b/key"]);
    }

    #[test]
    fn test_file_area_dot_keys_are_listed() {
        let dir = tempdir().unwrap();
        let area = FileArea::open(dir.path()).unwrap();

        area.set_item(".hidden", "1").unwrap();
        area.set_item("v1.2", "2").unwrap();

        assert_eq!(area.keys().unwrap(), vec![".hidden", "v1.2"]);
        assert_eq!(area.get_item(".hidden").unwrap().as_deref(), Some("1"));
    }

    #[test]
    fn test_file_area_overwrite_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let area = FileArea::open(dir.path()).unwrap();

        for i in 0..5 {
            area.set_item("k", &i.to_string()).unwrap();
        }

        let files: Vec<_> = std::fs::read_dir(dir.path()).unwrap().collect();
        assert_eq!(files.len(), 1);
        assert_eq!(area.get_item("k").unwrap().as_deref(), Some("4"));

        area.remove_item("k").unwrap();
        assert!(area.keys().unwrap().is_empty());
    }
}
