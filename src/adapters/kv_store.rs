//! Key-value storage adapters.
//!
//! Both backends implement [`ConfigPort`] and [`StoragePort`]:
//!
//! - [`MemoryStorage`]: a shared in-process map for tests and dry runs.
//!   Clones share the same map, so a [`Persister`](crate::store::Persister)
//!   can hold one clone while the caller inspects another.
//! - [`FileStorage`]: one JSON file per key under `<root>/<namespace>/`.
//!   Writes go to a temporary sibling first and are renamed into place, so a
//!   reader never observes a half-written blob.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;

use log::{debug, info, warn};

use crate::app::ports::{ConfigError, ConfigPort, StorageError, StoragePort};
use crate::config::ToyConfig;

const CONFIG_NAMESPACE: &str = "fatcat";
const CONFIG_KEY: &str = "config";

/// Keys and namespaces become path components, so keep them boring.
fn valid_component(s: &str) -> bool {
    !s.is_empty()
        && s.len() <= 64
        && s.chars().all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
}

fn check_key(namespace: &str, key: &str) -> Result<(), StorageError> {
    if valid_component(namespace) && valid_component(key) {
        Ok(())
    } else {
        Err(StorageError::InvalidKey)
    }
}

fn decode_config(bytes: &[u8]) -> Result<ToyConfig, ConfigError> {
    let cfg: ToyConfig = serde_json::from_slice(bytes).map_err(|_| ConfigError::Corrupted)?;
    cfg.validate().map_err(ConfigError::ValidationFailed)?;
    Ok(cfg)
}

fn encode_config(config: &ToyConfig) -> Result<Vec<u8>, ConfigError> {
    config.validate().map_err(ConfigError::ValidationFailed)?;
    serde_json::to_vec_pretty(config).map_err(|_| ConfigError::IoError)
}

// ───────────────────────────────────────────────────────────────
// MemoryStorage
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    store: Rc<RefCell<HashMap<String, Vec<u8>>>>,
}

impl MemoryStorage {
    pub fn new() -> Self {
        Self::default()
    }

    fn composite_key(namespace: &str, key: &str) -> String {
        format!("{}::{}", namespace, key)
    }

    /// Number of stored keys across all namespaces.
    pub fn len(&self) -> usize {
        self.store.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.borrow().is_empty()
    }
}

impl ConfigPort for MemoryStorage {
    fn load(&self) -> Result<ToyConfig, ConfigError> {
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        match self.store.borrow().get(&key) {
            Some(bytes) => decode_config(bytes),
            None => {
                info!("MemoryStorage: no stored config, using defaults");
                Ok(ToyConfig::default())
            }
        }
    }

    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError> {
        let bytes = encode_config(config)?;
        let key = Self::composite_key(CONFIG_NAMESPACE, CONFIG_KEY);
        self.store.borrow_mut().insert(key, bytes);
        Ok(())
    }
}

impl StoragePort for MemoryStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(namespace, key)?;
        self.store
            .borrow()
            .get(&Self::composite_key(namespace, key))
            .cloned()
            .ok_or(StorageError::NotFound)
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        check_key(namespace, key)?;
        self.store
            .borrow_mut()
            .insert(Self::composite_key(namespace, key), data.to_vec());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        check_key(namespace, key)?;
        self.store
            .borrow_mut()
            .remove(&Self::composite_key(namespace, key));
        Ok(())
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        check_key(namespace, key).is_ok()
            && self
                .store
                .borrow()
                .contains_key(&Self::composite_key(namespace, key))
    }
}

// ───────────────────────────────────────────────────────────────
// FileStorage
// ───────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct FileStorage {
    root: PathBuf,
}

impl FileStorage {
    /// Creates `root` if it does not exist yet.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StorageError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| {
            warn!("FileStorage: cannot create {}: {}", root.display(), e);
            StorageError::IoError
        })?;
        info!("FileStorage: rooted at {}", root.display());
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn path_for(&self, namespace: &str, key: &str) -> PathBuf {
        self.root.join(namespace).join(format!("{}.json", key))
    }

    fn write_atomic(path: &Path, data: &[u8]) -> std::io::Result<()> {
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)?;
        }
        let tmp = path.with_extension("json.tmp");
        {
            let mut file = fs::File::create(&tmp)?;
            file.write_all(data)?;
            file.sync_all()?;
        }
        fs::rename(&tmp, path)
    }
}

impl ConfigPort for FileStorage {
    fn load(&self) -> Result<ToyConfig, ConfigError> {
        match fs::read(self.path_for(CONFIG_NAMESPACE, CONFIG_KEY)) {
            Ok(bytes) => {
                let cfg = decode_config(&bytes)?;
                info!("FileStorage: loaded config ({} bytes)", bytes.len());
                Ok(cfg)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("FileStorage: no stored config, using defaults");
                Ok(ToyConfig::default())
            }
            Err(e) => {
                warn!("FileStorage: config read failed: {}", e);
                Err(ConfigError::IoError)
            }
        }
    }

    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError> {
        let bytes = encode_config(config)?;
        Self::write_atomic(&self.path_for(CONFIG_NAMESPACE, CONFIG_KEY), &bytes).map_err(|e| {
            warn!("FileStorage: config write failed: {}", e);
            ConfigError::IoError
        })
    }
}

impl StoragePort for FileStorage {
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        check_key(namespace, key)?;
        fs::read(self.path_for(namespace, key)).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StorageError::NotFound,
            _ => {
                warn!("FileStorage: read {}/{} failed: {}", namespace, key, e);
                StorageError::IoError
            }
        })
    }

    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        check_key(namespace, key)?;
        let path = self.path_for(namespace, key);
        Self::write_atomic(&path, data).map_err(|e| {
            warn!("FileStorage: write {} failed: {}", path.display(), e);
            StorageError::IoError
        })?;
        debug!("FileStorage: wrote {} ({} bytes)", path.display(), data.len());
        Ok(())
    }

    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError> {
        check_key(namespace, key)?;
        match fs::remove_file(self.path_for(namespace, key)) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(_) => Err(StorageError::IoError),
        }
    }

    fn exists(&self, namespace: &str, key: &str) -> bool {
        check_key(namespace, key).is_ok() && self.path_for(namespace, key).is_file()
    }
}
