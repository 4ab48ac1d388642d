//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter          | Implements         | Connects to                |
//! |------------------|--------------------|----------------------------|
//! | `catalog_loader` | AssetLoader        | Model descriptors on disk  |
//! | `headless_scene` | ScenePort          | In-memory anchor table     |
//! |                  | AudioPort          | Log output                 |
//! |                  | CapturePort        | JSON frame dumps           |
//! | `kv_store`       | ConfigPort         | In-memory map / JSON files |
//! |                  | StoragePort        |                            |
//! | `log_sink`       | EventSink          | `log` facade               |
//! | `time`           | (clock)            | `Instant` + local time     |

pub mod catalog_loader;
pub mod headless_scene;
pub mod kv_store;
pub mod log_sink;
pub mod time;
