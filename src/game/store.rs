// game/store.rs

use super::progression::ProgressionError;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

/// Synchronous string key-value storage (browser local storage, a save directory, ...)
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>, ProgressionError>;
    fn set(&mut self, key: &str, value: &str) -> Result<(), ProgressionError>;
}

/// Volatile store; progress lasts as long as the process
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    entries: HashMap<String, String>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProgressionError> {
        Ok(self.entries.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ProgressionError> {
        self.entries.insert(key.to_string(), value.to_string());
        Ok(())
    }
}

/// One `<key>.json` file per key inside a save directory
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", key))
    }

    fn staging_path_for(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{}.json.tmp", key))
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProgressionError> {
        let path = self.path_for(key);
        match fs::read_to_string(&path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(ProgressionError::PersistenceReadFailure(format!(
                "{}: {}",
                path.display(),
                e
            ))),
        }
    }

    /// Written next to the target and renamed over it, so an interrupted
    /// save leaves the previous value intact
    fn set(&mut self, key: &str, value: &str) -> Result<(), ProgressionError> {
        let path = self.path_for(key);
        let staging = self.staging_path_for(key);
        fs::create_dir_all(&self.dir)
            .and_then(|_| fs::write(&staging, value))
            .and_then(|_| fs::rename(&staging, &path))
            .map_err(|e| {
                ProgressionError::PersistenceWriteFailure(format!("{}: {}", path.display(), e))
            })
    }
}

/// Browser `localStorage`, the same place the web build of the game keeps its saves
#[cfg(target_arch = "wasm32")]
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalStorageStore;

#[cfg(target_arch = "wasm32")]
impl LocalStorageStore {
    // `Storage` is not Send, so it is looked up on every access
    fn storage() -> Result<web_sys::Storage, String> {
        web_sys::window()
            .ok_or_else(|| "no browser window".to_string())?
            .local_storage()
            .map_err(describe_js_error)?
            .ok_or_else(|| "local storage is disabled".to_string())
    }
}

#[cfg(target_arch = "wasm32")]
fn describe_js_error(error: wasm_bindgen::JsValue) -> String {
    error.as_string().unwrap_or_else(|| format!("{:?}", error))
}

#[cfg(target_arch = "wasm32")]
impl KeyValueStore for LocalStorageStore {
    fn get(&self, key: &str) -> Result<Option<String>, ProgressionError> {
        let storage = Self::storage().map_err(ProgressionError::PersistenceReadFailure)?;
        storage.get_item(key).map_err(|e| {
            ProgressionError::PersistenceReadFailure(format!("{}: {}", key, describe_js_error(e)))
        })
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ProgressionError> {
        let storage = Self::storage().map_err(ProgressionError::PersistenceWriteFailure)?;
        storage.set_item(key, value).map_err(|e| {
            ProgressionError::PersistenceWriteFailure(format!("{}: {}", key, describe_js_error(e)))
        })
    }
}

/// The persistent store of the current platform: local storage in the
/// browser, `save_dir` everywhere else
#[cfg(not(target_arch = "wasm32"))]
pub fn platform_store(save_dir: &Path) -> Box<dyn KeyValueStore> {
    Box::new(FileStore::new(save_dir))
}

#[cfg(target_arch = "wasm32")]
pub fn platform_store(_save_dir: &Path) -> Box<dyn KeyValueStore> {
    Box::new(LocalStorageStore)
}
