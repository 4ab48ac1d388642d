//! File-backed asset catalog.
//!
//! Maps catalog names (`"fish"`, `"cat"`) to model descriptor files on disk.
//! Reading happens on a short-lived worker thread; the returned future waits
//! on an `embassy-sync` [`Signal`] and is polled by the session's executor,
//! so the event loop never blocks on the file system.
//!
//! A model descriptor is a small JSON document:
//!
//! ```json
//! { "mesh": "cat.usdz", "animations": ["entrance"] }
//! ```

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::thread;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future::BoxedLocal;
use log::{debug, info, warn};
use serde::Deserialize;

use crate::assets::{AssetLoader, EntityHandle};
use crate::error::LoadError;

const DESCRIPTOR_EXTENSION: &str = "json";

type ReadSignal = Signal<CriticalSectionRawMutex, Result<Vec<u8>, String>>;

#[derive(Debug, Deserialize)]
struct ModelDescriptor {
    mesh: String,
    #[serde(default)]
    animations: Vec<String>,
}

pub struct CatalogLoader {
    entries: HashMap<String, PathBuf>,
    next_entity: Arc<AtomicU64>,
}

impl Default for CatalogLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogLoader {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            next_entity: Arc::new(AtomicU64::new(1)),
        }
    }

    pub fn with_entry(mut self, name: &str, path: impl Into<PathBuf>) -> Self {
        self.insert(name, path);
        self
    }

    pub fn insert(&mut self, name: &str, path: impl Into<PathBuf>) {
        self.entries.insert(name.to_string(), path.into());
    }

    /// Registers every `<name>.json` in `dir` under `<name>`.
    pub fn scan_dir(dir: &Path) -> std::io::Result<Self> {
        let mut loader = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if path.extension().and_then(|e| e.to_str()) != Some(DESCRIPTOR_EXTENSION) {
                continue;
            }
            if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
                debug!("catalog: '{}' -> {}", name, path.display());
                loader.insert(name, path.clone());
            }
        }
        info!("catalog: {} model(s) in {}", loader.len(), dir.display());
        Ok(loader)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }
}

fn decode(model_id: &str, bytes: &[u8]) -> Result<ModelDescriptor, LoadError> {
    let descriptor: ModelDescriptor =
        serde_json::from_slice(bytes).map_err(|e| LoadError::Decode {
            model_id: model_id.to_string(),
            cause: e.to_string(),
        })?;
    if descriptor.mesh.trim().is_empty() {
        return Err(LoadError::Decode {
            model_id: model_id.to_string(),
            cause: "empty mesh reference".to_string(),
        });
    }
    Ok(descriptor)
}

impl AssetLoader for CatalogLoader {
    fn load(&self, model_id: &str) -> BoxedLocal<Result<EntityHandle, LoadError>> {
        let model_id = model_id.to_string();
        let Some(path) = self.entries.get(&model_id).cloned() else {
            warn!("catalog: no model named '{}'", model_id);
            return Box::pin(async move { Err(LoadError::NotFound(model_id)) });
        };

        let done: Arc<ReadSignal> = Arc::new(Signal::new());
        let reply = Arc::clone(&done);
        thread::spawn(move || {
            reply.signal(fs::read(&path).map_err(|e| e.to_string()));
        });

        let next_entity = Arc::clone(&self.next_entity);
        Box::pin(async move {
            let bytes = done.wait().await.map_err(|cause| LoadError::Io {
                model_id: model_id.clone(),
                cause,
            })?;
            let descriptor = decode(&model_id, &bytes)?;
            let id = next_entity.fetch_add(1, Ordering::Relaxed);
            debug!(
                "catalog: '{}' ({}, {} animation(s)) ready as entity {}",
                model_id,
                descriptor.mesh,
                descriptor.animations.len(),
                id
            );
            Ok(EntityHandle { id, model_id })
        })
    }
}
