//! Outbound session events.
//!
//! The [`ArSession`](super::service::ArSession) emits these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other side
//! decide what to do with them: log them, drive a UI, record them in tests.

use crate::app::ports::AnchorId;
use crate::fsm::Phase;
use crate::model::{Cat, CatId};
use crate::presence::Authorization;

pub use crate::fsm::context::StatusMessage;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// The session has started (carries the initial phase).
    Started(Phase),

    /// The placement machine moved between phases.
    PhaseChanged { from: Phase, to: Phase },

    /// A user-visible status line.
    Status(StatusMessage),

    /// The presence gate opened or closed.
    PresenceChanged {
        present: bool,
        distance_m: Option<f64>,
    },

    CatFed {
        cat_id: CatId,
        size: f64,
        feed_count: u32,
    },

    CatHungry { cat_id: CatId },

    NiboshiChanged(u32),

    /// Teardown finished; the scene is empty.
    TornDown,
}

/// Read-only view for the UI's info bar.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub niboshi: u32,
    pub present: bool,
    pub distance_m: Option<f64>,
    pub authorization: Authorization,
    /// The cat this session is about (resolved; may be "Unknown Cat").
    pub active_cat: Option<Cat>,
    pub decoy_anchor: Option<AnchorId>,
    pub creature_anchor: Option<AnchorId>,
    pub hunger_running: bool,
}
