//! Application core: session orchestration with zero direct I/O.
//!
//! This module wires the presence gate, the placement FSM, the asset
//! pipeline and the hunger clock into one [`service::ArSession`].
//! All interaction with the renderer, speakers, camera and storage happens
//! through **port traits** defined in [`ports`], keeping this layer fully
//! testable without a real AR runtime.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;
