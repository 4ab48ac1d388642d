//! Asynchronous asset loading with per-slot cancellation.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │  AssetPipeline                                               │
//! │                                                              │
//! │  request(slot, id) ──▶ LocalExecutor task ──▶ loader.load()  │
//! │                              │                               │
//! │                              ▼                               │
//! │              completions Channel (slot, generation, result)  │
//! │                              │                               │
//! │  pump() ◀────────────────────┘  stale generations dropped    │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! Each slot holds at most one in-flight task.  Requesting a slot again, or
//! cancelling it, drops the task (which cancels the future) and bumps the
//! slot's generation so a completion already sitting in the channel is
//! discarded when drained.

use std::rc::Rc;

use edge_executor::{LocalExecutor, Task};
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::channel::Channel;
use futures_lite::future::BoxedLocal;
use heapless::Vec as HVec;
use log::{debug, warn};

use crate::error::LoadError;

/// Which placement an asset is destined for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum AssetSlot {
    Decoy = 0,
    Creature = 1,
}

impl AssetSlot {
    pub const COUNT: usize = 2;
    pub const ALL: [AssetSlot; Self::COUNT] = [AssetSlot::Decoy, AssetSlot::Creature];

    pub const fn name(self) -> &'static str {
        match self {
            Self::Decoy => "decoy",
            Self::Creature => "creature",
        }
    }
}

/// A loaded, ready-to-anchor entity.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntityHandle {
    pub id: u64,
    pub model_id: String,
}

/// Resolves a catalog name into an entity.
///
/// The returned future owns everything it needs.  It may finish on another
/// thread's behalf, but it is always polled on the session's event loop.
pub trait AssetLoader {
    fn load(&self, model_id: &str) -> BoxedLocal<Result<EntityHandle, LoadError>>;
}

impl<L: AssetLoader + ?Sized> AssetLoader for Rc<L> {
    fn load(&self, model_id: &str) -> BoxedLocal<Result<EntityHandle, LoadError>> {
        (**self).load(model_id)
    }
}

/// A completion accepted by [`AssetPipeline::pump`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadOutcome {
    pub slot: AssetSlot,
    pub result: Result<EntityHandle, LoadError>,
}

struct Completion {
    slot: AssetSlot,
    generation: u64,
    result: Result<EntityHandle, LoadError>,
}

const COMPLETION_DEPTH: usize = 4;

#[derive(Default)]
struct SlotState {
    generation: u64,
    task: Option<Task<()>>,
}

pub struct AssetPipeline<L: AssetLoader> {
    loader: L,
    executor: LocalExecutor<'static, 8>,
    completions: Rc<Channel<NoopRawMutex, Completion, COMPLETION_DEPTH>>,
    slots: [SlotState; AssetSlot::COUNT],
}

impl<L: AssetLoader> AssetPipeline<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            executor: LocalExecutor::new(),
            completions: Rc::new(Channel::new()),
            slots: Default::default(),
        }
    }

    /// Start loading `model_id` into `slot`, superseding any load already
    /// in flight there.  Returns the new generation.
    pub fn request(&mut self, slot: AssetSlot, model_id: &str) -> u64 {
        self.cancel(slot);

        let state = &mut self.slots[slot as usize];
        state.generation = state.generation.wrapping_add(1);
        let generation = state.generation;

        debug!("assets: load '{}' for {} (gen {})", model_id, slot.name(), generation);

        let load = self.loader.load(model_id);
        let completions = self.completions.clone();
        let task = self.executor.spawn(async move {
            let result = load.await;
            if completions
                .try_send(Completion {
                    slot,
                    generation,
                    result,
                })
                .is_err()
            {
                warn!("assets: completion channel full, dropping {} result", slot.name());
            }
        });
        state.task = Some(task);
        generation
    }

    /// Drop the in-flight load for `slot`.  Returns `true` if one existed.
    pub fn cancel(&mut self, slot: AssetSlot) -> bool {
        let state = &mut self.slots[slot as usize];
        let Some(task) = state.task.take() else {
            return false;
        };
        drop(task);
        state.generation = state.generation.wrapping_add(1);
        debug!("assets: cancelled {} load", slot.name());
        true
    }

    pub fn cancel_all(&mut self) {
        for slot in AssetSlot::ALL {
            self.cancel(slot);
        }
    }

    pub fn is_pending(&self, slot: AssetSlot) -> bool {
        self.slots[slot as usize].task.is_some()
    }

    /// Run every ready load task, then drain the completions that still
    /// belong to the current generation of their slot.
    pub fn pump(&mut self) -> HVec<LoadOutcome, COMPLETION_DEPTH> {
        while self.executor.try_tick() {}

        let mut out = HVec::new();
        while let Ok(done) = self.completions.try_receive() {
            let state = &mut self.slots[done.slot as usize];
            if done.generation != state.generation || state.task.is_none() {
                debug!(
                    "assets: discarding stale {} completion (gen {} != {})",
                    done.slot.name(),
                    done.generation,
                    state.generation
                );
                continue;
            }
            state.task = None;
            if out
                .push(LoadOutcome {
                    slot: done.slot,
                    result: done.result,
                })
                .is_err()
            {
                warn!("assets: too many completions in one pump");
            }
        }
        out
    }
}
