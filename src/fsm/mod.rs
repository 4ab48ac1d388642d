//! Function-pointer finite state machine for the placement sequence.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────────┐
//! │  PhaseTable                                                      │
//! │  ┌───────────────────┬──────────┬──────────┬──────────────────┐  │
//! │  │ Phase             │ on_enter │ on_exit  │ on_event         │  │
//! │  ├───────────────────┼──────────┼──────────┼──────────────────┤  │
//! │  │ Idle              │ fn(ctx)  │    -     │ fn(ctx,s)->Opt<> │  │
//! │  │ DecoyRequested    │ fn(ctx)  │    -     │ fn(ctx,s)->Opt<> │  │
//! │  │ DecoyPlaced       │    -     │ fn(ctx)  │ fn(ctx,s)->Opt<> │  │
//! │  │ CreatureRequested │ fn(ctx)  │    -     │ fn(ctx,s)->Opt<> │  │
//! │  │ CreaturePlaced    │ fn(ctx)  │ fn(ctx)  │ fn(ctx,s)->Opt<> │  │
//! │  │ Ready             │ fn(ctx)  │    -     │ fn(ctx,s)->Opt<> │  │
//! │  └───────────────────┴──────────┴──────────┴──────────────────┘  │
//! └──────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The machine is event driven: the session calls [`Fsm::dispatch`] with a
//! [`Stimulus`] (tap, load completion, timer).  If the current phase's
//! `on_event` returns `Some(next)`, the engine runs `on_exit` for the
//! current phase, then `on_enter` for the next.  Handlers never touch ports;
//! they queue [`Effect`](context::Effect)s on the context instead.

pub mod context;
pub mod states;

use context::PlacementContext;
use log::info;

use crate::assets::{AssetSlot, EntityHandle};
use crate::error::LoadError;
use crate::model::TapInput;

// ---------------------------------------------------------------------------
// Phase identity
// ---------------------------------------------------------------------------

/// Must stay in sync with the table built in [`states::build_phase_table`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Phase {
    Idle = 0,
    DecoyRequested = 1,
    DecoyPlaced = 2,
    CreatureRequested = 3,
    CreaturePlaced = 4,
    Ready = 5,
}

impl Phase {
    pub const COUNT: usize = 6;

    /// Convert an index back to `Phase`.  Out-of-range indices fall back to
    /// `Idle` (debug builds assert).
    pub fn from_index(idx: usize) -> Self {
        match idx {
            0 => Self::Idle,
            1 => Self::DecoyRequested,
            2 => Self::DecoyPlaced,
            3 => Self::CreatureRequested,
            4 => Self::CreaturePlaced,
            5 => Self::Ready,
            _ => {
                debug_assert!(false, "invalid phase index: {idx}");
                Self::Idle
            }
        }
    }

    /// A creature is anchored in the scene.
    pub fn has_creature(self) -> bool {
        matches!(self, Self::CreaturePlaced | Self::Ready)
    }
}

// ---------------------------------------------------------------------------
// Stimuli
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Stimulus {
    Tap(TapInput),
    Loaded { slot: AssetSlot, entity: EntityHandle },
    LoadFailed { slot: AssetSlot, error: LoadError },
    SpawnDelayElapsed,
    AnimationComplete,
}

// ---------------------------------------------------------------------------
// Function-pointer type aliases
// ---------------------------------------------------------------------------

/// Signature for `on_enter` and `on_exit` actions.
pub type PhaseActionFn = fn(&mut PlacementContext);

/// Signature for the stimulus handler.
/// Returns `Some(next)` to trigger a transition, or `None` to stay.
pub type PhaseEventFn = fn(&mut PlacementContext, &Stimulus) -> Option<Phase>;

/// Static descriptor for a single phase.
pub struct PhaseDescriptor {
    pub id: Phase,
    pub name: &'static str,
    pub on_enter: Option<PhaseActionFn>,
    pub on_exit: Option<PhaseActionFn>,
    pub on_event: PhaseEventFn,
}

// ---------------------------------------------------------------------------
// FSM engine
// ---------------------------------------------------------------------------

pub struct Fsm {
    /// Fixed-size table indexed by `Phase as usize`.
    table: [PhaseDescriptor; Phase::COUNT],
    current: usize,
}

impl Fsm {
    pub fn new(table: [PhaseDescriptor; Phase::COUNT], initial: Phase) -> Self {
        Self {
            table,
            current: initial as usize,
        }
    }

    /// Run the initial `on_enter` for the starting phase.
    pub fn start(&mut self, ctx: &mut PlacementContext) {
        info!("FSM starting in phase: {}", self.table[self.current].name);
        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }

    /// Feed one stimulus to the current phase.  Returns the transition
    /// taken, if any.
    pub fn dispatch(&mut self, ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<(Phase, Phase)> {
        let from = self.current_phase();
        let next = (self.table[self.current].on_event)(ctx, stimulus)?;
        self.transition(next, ctx);
        Some((from, next))
    }

    /// Jump to `next` regardless of the current phase's handler (teardown).
    pub fn force_transition(&mut self, next: Phase, ctx: &mut PlacementContext) -> bool {
        if next as usize == self.current {
            return false;
        }
        self.transition(next, ctx);
        true
    }

    pub fn current_phase(&self) -> Phase {
        Phase::from_index(self.current)
    }

    // -----------------------------------------------------------------------
    // Internal
    // -----------------------------------------------------------------------

    fn transition(&mut self, next: Phase, ctx: &mut PlacementContext) {
        let next_idx = next as usize;

        info!(
            "FSM transition: {} -> {}",
            self.table[self.current].name, self.table[next_idx].name
        );

        if let Some(exit) = self.table[self.current].on_exit {
            exit(ctx);
        }

        self.current = next_idx;

        if let Some(enter) = self.table[self.current].on_enter {
            enter(ctx);
        }
    }
}
