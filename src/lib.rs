//! fatcat: location-gated AR pet feeding.
//!
//! Exposes the pure-logic modules (presence gate, placement FSM, asset
//! pipeline, hunger clock, schedule store) plus the host adapters, so the
//! console binary and the integration tests share one core.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod assets;
pub mod config;
pub mod console;
pub mod defaults;
pub mod error;
pub mod fsm;
pub mod hunger;
pub mod model;
pub mod presence;
pub mod store;
pub mod timers;
