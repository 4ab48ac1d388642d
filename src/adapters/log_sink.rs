//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured session events to the
//! `log` facade (stderr via `env_logger` in the headless binary).
//! A UI binding would implement the same trait.

use log::info;

use crate::app::events::SessionEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`SessionEvent`] on one line.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &SessionEvent) {
        match event {
            SessionEvent::Started(phase) => {
                info!("START | initial_phase={:?}", phase);
            }
            SessionEvent::PhaseChanged { from, to } => {
                info!("STATE | {:?} -> {:?}", from, to);
            }
            SessionEvent::Status(message) => {
                info!("UI    | {}", message);
            }
            SessionEvent::PresenceChanged {
                present,
                distance_m,
            } => match distance_m {
                Some(d) => info!(
                    "GATE  | {} | distance={:.0}m",
                    if *present { "OPEN" } else { "CLOSED" },
                    d
                ),
                None => info!("GATE  | {}", if *present { "OPEN" } else { "CLOSED" }),
            },
            SessionEvent::CatFed {
                cat_id,
                size,
                feed_count,
            } => {
                info!("FEED  | cat={} | size={:.2} | count={}", cat_id, size, feed_count);
            }
            SessionEvent::CatHungry { cat_id } => {
                info!("HUNGER| cat={} is hungry", cat_id);
            }
            SessionEvent::NiboshiChanged(count) => {
                info!("BAG   | niboshi={}", count);
            }
            SessionEvent::TornDown => {
                info!("STOP  | scene cleared");
            }
        }
    }
}
