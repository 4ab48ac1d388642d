//! Toy configuration parameters
//!
//! All tunable parameters for the presence gate, placement sequence and
//! hunger clock.  Values can be overridden through the [`ConfigPort`]
//! (stored as JSON under the `config` key).
//!
//! [`ConfigPort`]: crate::app::ports::ConfigPort

use core::f32::consts::PI;

use serde::{Deserialize, Serialize};

/// Core toy configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToyConfig {
    // --- Presence ---
    /// Maximum great-circle distance (metres) from the scheduled location
    pub presence_radius_m: f64,
    /// Coarse re-evaluation interval of the presence gate (milliseconds)
    pub presence_refresh_ms: u64,

    // --- Placement ---
    /// Delay between decoy anchoring and creature load request (milliseconds)
    pub spawn_delay_ms: u64,
    /// Length of the creature entrance animation (milliseconds)
    pub entrance_animation_ms: u64,
    /// Creature offset from the decoy in the decoy's local frame (metres)
    pub creature_offset_m: [f32; 3],
    /// Fixed heading of the creature once placed (radians)
    pub creature_yaw_rad: f32,
    /// Catalog name of the decoy model
    pub decoy_model: String,
    /// Catalog name of the creature model
    pub creature_model: String,

    // --- Hunger ---
    /// Hunger tick period (milliseconds)
    pub hunger_interval_ms: u64,
    /// Size gained per feeding
    pub feed_size_increment: f64,
    /// Niboshi in the bag when a session starts
    pub initial_niboshi: u32,
    /// Niboshi added per refill
    pub refill_amount: u32,

    // --- Sounds ---
    pub feed_sound: String,
    pub arrival_sound: String,
}

impl Default for ToyConfig {
    fn default() -> Self {
        Self {
            presence_radius_m: 1000.0,
            presence_refresh_ms: 30_000,

            spawn_delay_ms: 5_000,
            entrance_animation_ms: 1_500,
            creature_offset_m: [0.25, 0.0, 0.0],
            creature_yaw_rad: PI,
            decoy_model: "fish".to_string(),
            creature_model: "cat".to_string(),

            hunger_interval_ms: 15_000,
            feed_size_increment: 0.01,
            initial_niboshi: 5,
            refill_amount: 3,

            feed_sound: "eat".to_string(),
            arrival_sound: "meow".to_string(),
        }
    }
}

impl ToyConfig {
    /// Range-check every field.  Returns the name of the first offending
    /// field.
    pub fn validate(&self) -> Result<(), &'static str> {
        if !self.presence_radius_m.is_finite() || self.presence_radius_m <= 0.0 {
            return Err("presence_radius_m must be positive");
        }
        if self.presence_radius_m > 50_000.0 {
            return Err("presence_radius_m too large (max 50 km)");
        }
        if self.presence_refresh_ms < 1_000 {
            return Err("presence_refresh_ms must be >= 1000");
        }
        if self.spawn_delay_ms == 0 || self.spawn_delay_ms > 60_000 {
            return Err("spawn_delay_ms out of range (1..=60000)");
        }
        if self.entrance_animation_ms > 30_000 {
            return Err("entrance_animation_ms too long (max 30000)");
        }
        if self.creature_offset_m.iter().any(|v| !v.is_finite() || v.abs() > 10.0) {
            return Err("creature_offset_m components must be within 10 m");
        }
        if !self.creature_yaw_rad.is_finite() {
            return Err("creature_yaw_rad must be finite");
        }
        if self.decoy_model.trim().is_empty() {
            return Err("decoy_model must not be empty");
        }
        if self.creature_model.trim().is_empty() {
            return Err("creature_model must not be empty");
        }
        if self.hunger_interval_ms < 1_000 {
            return Err("hunger_interval_ms must be >= 1000");
        }
        if !self.feed_size_increment.is_finite() || self.feed_size_increment < 0.0 {
            return Err("feed_size_increment must be non-negative");
        }
        if self.refill_amount == 0 {
            return Err("refill_amount must be positive");
        }
        Ok(())
    }
}
