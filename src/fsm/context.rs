//! Shared mutable context threaded through every phase handler.
//!
//! `PlacementContext` is the blackboard that handlers read from and write
//! to: the current time, whether the presence gate is open, the placement
//! bookkeeping, and an outbound queue of [`Effect`]s that the session
//! applies to its ports after each dispatch.

use core::fmt;
use core::time::Duration;

use heapless::Vec as HVec;
use log::warn;

use crate::app::ports::AnchorId;
use crate::assets::{AssetSlot, EntityHandle};
use crate::config::ToyConfig;
use crate::model::Pose;
use crate::timers::TimerKind;

// ---------------------------------------------------------------------------
// Status messages (user-visible)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StatusMessage {
    /// Tap rejected: no active schedule here and now.
    NotHere,
    /// Tap did not hit a real-world surface.
    NoSurface,
    /// Decoy anchored, creature on its way.
    DecoyPlaced,
    /// Tap while something is already in progress.
    Waiting,
    LoadFailed { slot: AssetSlot, cause: String },
    CatArrived,
    /// The feed button is available.
    FeedPrompt,
    CatHungry { name: String },
    Fed { name: String, niboshi_left: u32 },
    NoNiboshi,
    /// Feed requested with no creature on screen.
    NothingToFeed,
    Refilled { niboshi: u32 },
    CaptureSaved(String),
    CaptureFailed(String),
    LocationDenied,
}

impl fmt::Display for StatusMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotHere => write!(f, "No cat around here right now"),
            Self::NoSurface => write!(f, "Tap on a flat surface"),
            Self::DecoyPlaced => write!(f, "Fish placed. Wait for the cat..."),
            Self::Waiting => write!(f, "Please wait..."),
            Self::LoadFailed { slot, cause } => {
                write!(f, "Could not load the {}: {}. Tap to retry", slot.name(), cause)
            }
            Self::CatArrived => write!(f, "A cat appeared!"),
            Self::FeedPrompt => write!(f, "Tap the feed button to give niboshi"),
            Self::CatHungry { name } => write!(f, "{name} is hungry"),
            Self::Fed { name, niboshi_left } => {
                write!(f, "{name} ate a niboshi ({niboshi_left} left)")
            }
            Self::NoNiboshi => write!(f, "No niboshi left"),
            Self::NothingToFeed => write!(f, "There is no cat to feed"),
            Self::Refilled { niboshi } => write!(f, "Niboshi refilled ({niboshi})"),
            Self::CaptureSaved(path) => write!(f, "Photo saved: {path}"),
            Self::CaptureFailed(cause) => write!(f, "Photo failed: {cause}"),
            Self::LocationDenied => write!(f, "Location access is off"),
        }
    }
}

// ---------------------------------------------------------------------------
// Effects (written by handlers; applied by the session)
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SoundCue {
    Arrival,
    Feed,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    RequestLoad(AssetSlot),
    CancelLoad(AssetSlot),
    /// Anchor the slot's loaded entity at `pose`.
    Anchor { slot: AssetSlot, pose: Pose },
    ReleaseAnchor(AnchorId),
    ArmTimer(TimerKind),
    CancelTimer(TimerKind),
    PlayEntrance,
    StartHungerClock,
    StopHungerClock,
    Sound(SoundCue),
    Status(StatusMessage),
}

pub const MAX_EFFECTS: usize = 16;

// ---------------------------------------------------------------------------
// Placement bookkeeping
// ---------------------------------------------------------------------------

/// A loaded entity and where it was put.
#[derive(Debug, Clone, PartialEq)]
pub struct Placed {
    pub entity: EntityHandle,
    pub pose: Pose,
    /// Filled in by the session once the scene hands out an anchor.
    pub anchor: Option<AnchorId>,
    pub placed_at: Duration,
}

/// Transient placement state; reset on teardown.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PlacementState {
    pub decoy: Option<Placed>,
    pub creature: Option<Placed>,
    /// Slot with an outstanding load, if any.
    pub pending: Option<AssetSlot>,
    /// Surface pose the pending decoy load will be anchored at.
    pub decoy_target: Option<Pose>,
    pub spawn_armed: bool,
    pub animation_armed: bool,
    pub hunger_started: bool,
}

impl PlacementState {
    pub fn slot(&self, slot: AssetSlot) -> Option<&Placed> {
        match slot {
            AssetSlot::Decoy => self.decoy.as_ref(),
            AssetSlot::Creature => self.creature.as_ref(),
        }
    }

    pub fn slot_mut(&mut self, slot: AssetSlot) -> Option<&mut Placed> {
        match slot {
            AssetSlot::Decoy => self.decoy.as_mut(),
            AssetSlot::Creature => self.creature.as_mut(),
        }
    }
}

// ---------------------------------------------------------------------------
// PlacementContext
// ---------------------------------------------------------------------------

pub struct PlacementContext {
    // -- Timing --
    /// Monotonic time of the stimulus being dispatched.
    pub now: Duration,

    // -- Gate --
    /// Presence gate result, refreshed by the session before each tap.
    pub gate_open: bool,

    // -- Configuration --
    pub config: ToyConfig,

    // -- Placement --
    pub placement: PlacementState,

    // -- Outputs --
    pub effects: HVec<Effect, MAX_EFFECTS>,
}

impl PlacementContext {
    pub fn new(config: ToyConfig) -> Self {
        Self {
            now: Duration::ZERO,
            gate_open: false,
            config,
            placement: PlacementState::default(),
            effects: HVec::new(),
        }
    }

    pub fn emit(&mut self, effect: Effect) {
        if let Err(dropped) = self.effects.push(effect) {
            warn!("placement: effect queue full, dropping {:?}", dropped);
        }
    }

    pub fn status(&mut self, message: StatusMessage) {
        self.emit(Effect::Status(message));
    }

    /// Take the queued effects, leaving the queue empty.
    pub fn drain_effects(&mut self) -> HVec<Effect, MAX_EFFECTS> {
        core::mem::take(&mut self.effects)
    }

    pub fn spawn_delay(&self) -> Duration {
        Duration::from_millis(self.config.spawn_delay_ms)
    }
}
