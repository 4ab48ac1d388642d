//! Port traits — the hexagonal boundary between session logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ ArSession (domain)
//! ```
//!
//! Driven adapters (scene graph, speakers, camera capture, storage, event
//! sinks) implement these traits.  The [`ArSession`](super::service::ArSession)
//! consumes them via generics, so the domain core never touches a renderer
//! or the file system directly.
//!
//! - **ConfigPort** implementations MUST validate before persisting.
//! - All port errors are typed; callers handle every variant explicitly.

use crate::assets::EntityHandle;
use crate::config::ToyConfig;
use crate::error::{AudioError, CaptureError};
use crate::model::Pose;
use crate::store::{ScheduleStore, StoreChange};

use super::events::SessionEvent;

// ───────────────────────────────────────────────────────────────
// Scene port (domain → AR scene graph)
// ───────────────────────────────────────────────────────────────

/// Opaque anchor identity handed out by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AnchorId(pub u64);

/// Write-side port: the session calls this to place things in the world.
pub trait ScenePort {
    /// Anchor `entity` at `pose` and return the new anchor.
    fn add_anchor(&mut self, pose: Pose, entity: &EntityHandle) -> AnchorId;

    /// Remove an anchor and everything attached to it.  Unknown ids are ignored.
    fn remove_anchor(&mut self, anchor: AnchorId);

    /// Uniform scale of the entity attached to `anchor`.
    fn set_scale(&mut self, anchor: AnchorId, scale: f32);

    /// Start a named animation on the entity attached to `anchor`.
    fn play_animation(&mut self, anchor: AnchorId, name: &str, duration_ms: u64);
}

// ───────────────────────────────────────────────────────────────
// Audio / capture ports (fire-and-forget side effects)
// ───────────────────────────────────────────────────────────────

/// Fire-and-forget sound playback.  Failures are logged, never surfaced.
pub trait AudioPort {
    fn play_sound(&mut self, name: &str) -> Result<(), AudioError>;
}

/// Renders the current AR frame to an image.
pub trait CapturePort {
    /// Returns a human-readable location of the saved image.
    fn capture_frame(&mut self) -> Result<String, CaptureError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (domain → logging / UI)
// ───────────────────────────────────────────────────────────────

/// The session emits structured [`SessionEvent`]s through this port.
/// Adapters decide where they go (log, UI binding, test recorder).
pub trait EventSink {
    fn emit(&mut self, event: &SessionEvent);
}

// ───────────────────────────────────────────────────────────────
// Store observer (store → subscribers)
// ───────────────────────────────────────────────────────────────

/// Called after every committed store mutation.
pub trait StoreObserver {
    fn on_change(&mut self, change: StoreChange, store: &ScheduleStore);
}

// ───────────────────────────────────────────────────────────────
// Configuration port (domain ↔ persistent config)
// ───────────────────────────────────────────────────────────────

/// Loads and persists toy configuration.
///
/// Implementations MUST validate config values before persisting.
/// Invalid ranges are rejected with [`ConfigError::ValidationFailed`],
/// not silently clamped.
pub trait ConfigPort {
    /// Load configuration from persistent storage.
    /// Returns [`ToyConfig::default()`] if no stored config exists.
    fn load(&self) -> Result<ToyConfig, ConfigError>;

    /// Validate and persist configuration.
    fn save(&self, config: &ToyConfig) -> Result<(), ConfigError>;
}

// ───────────────────────────────────────────────────────────────
// Storage port (domain ↔ key/value blobs)
// ───────────────────────────────────────────────────────────────

/// Persistent key-value storage for whole-collection JSON blobs.
///
/// - Keys are namespaced to prevent collisions between subsystems.
/// - Write operations MUST be atomic; a reader never sees a partial blob.
pub trait StoragePort {
    /// Read a value.  [`StorageError::NotFound`] if the key is absent.
    fn read(&self, namespace: &str, key: &str) -> Result<Vec<u8>, StorageError>;

    /// Write a value atomically.
    fn write(&mut self, namespace: &str, key: &str, data: &[u8]) -> Result<(), StorageError>;

    /// Delete a key.  Returns `Ok(())` even if the key didn't exist.
    fn delete(&mut self, namespace: &str, key: &str) -> Result<(), StorageError>;

    /// Check whether a key exists without reading it.
    fn exists(&self, namespace: &str, key: &str) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from [`ConfigPort`] operations.
#[derive(Debug)]
pub enum ConfigError {
    /// Stored config failed deserialization.
    Corrupted,
    /// A config field failed range validation.
    ValidationFailed(&'static str),
    /// Generic I/O error from the storage backend.
    IoError,
}

/// Errors from [`StoragePort`] operations.
#[derive(Debug)]
pub enum StorageError {
    /// Requested key does not exist.
    NotFound,
    /// Key contains characters the backend cannot store.
    InvalidKey,
    /// Generic I/O error.
    IoError,
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl core::fmt::Display for StorageError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::NotFound => write!(f, "key not found"),
            Self::InvalidKey => write!(f, "invalid key"),
            Self::IoError => write!(f, "I/O error"),
        }
    }
}

impl std::error::Error for ConfigError {}
impl std::error::Error for StorageError {}
