//! Concrete phase handler functions and table builder.
//!
//! Each phase is defined by plain `fn` pointers; no closures and no dynamic
//! dispatch.
//!
//! ```text
//!  IDLE ──[tap, gate open]──▶ DECOY_REQUESTED ◀──[decoy failed]──┐
//!                                   │                            │
//!                        [tap w/ surface hit → load]─────────────┘
//!                                   │ decoy loaded (anchor, arm 5 s)
//!                                   ▼
//!                             DECOY_PLACED ◀─────────[creature failed]──┐
//!                                   │ 5 s elapsed / retry tap           │
//!                                   ▼                                   │
//!                          CREATURE_REQUESTED ──────────────────────────┘
//!                                   │ creature loaded (anchor at offset)
//!                                   ▼
//!                           CREATURE_PLACED ──[animation done]──▶ READY
//!
//!  Any phase ──[teardown]──▶ IDLE   (loads cancelled, anchors released)
//! ```

use log::{debug, info, warn};

use super::context::{Effect, Placed, PlacementContext, SoundCue, StatusMessage};
use super::{Phase, PhaseDescriptor, Stimulus};
use crate::assets::AssetSlot;
use crate::timers::TimerKind;

// ═══════════════════════════════════════════════════════════════════════════
//  Table builder
// ═══════════════════════════════════════════════════════════════════════════

pub fn build_phase_table() -> [PhaseDescriptor; Phase::COUNT] {
    [
        PhaseDescriptor {
            id: Phase::Idle,
            name: "Idle",
            on_enter: Some(idle_enter),
            on_exit: None,
            on_event: idle_event,
        },
        PhaseDescriptor {
            id: Phase::DecoyRequested,
            name: "DecoyRequested",
            on_enter: Some(decoy_requested_enter),
            on_exit: None,
            on_event: decoy_requested_event,
        },
        PhaseDescriptor {
            id: Phase::DecoyPlaced,
            name: "DecoyPlaced",
            on_enter: None,
            on_exit: Some(decoy_placed_exit),
            on_event: decoy_placed_event,
        },
        PhaseDescriptor {
            id: Phase::CreatureRequested,
            name: "CreatureRequested",
            on_enter: Some(creature_requested_enter),
            on_exit: None,
            on_event: creature_requested_event,
        },
        PhaseDescriptor {
            id: Phase::CreaturePlaced,
            name: "CreaturePlaced",
            on_enter: Some(creature_placed_enter),
            on_exit: Some(creature_placed_exit),
            on_event: creature_placed_event,
        },
        PhaseDescriptor {
            id: Phase::Ready,
            name: "Ready",
            on_enter: Some(ready_enter),
            on_exit: None,
            on_event: ready_event,
        },
    ]
}

fn ignore(phase: &str, stimulus: &Stimulus) -> Option<Phase> {
    debug!("{}: ignoring {:?}", phase, stimulus);
    None
}

// ═══════════════════════════════════════════════════════════════════════════
//  IDLE — nothing placed; also the teardown landing phase
// ═══════════════════════════════════════════════════════════════════════════

fn idle_enter(ctx: &mut PlacementContext) {
    let previous = core::mem::take(&mut ctx.placement);

    if let Some(slot) = previous.pending {
        ctx.emit(Effect::CancelLoad(slot));
    }
    if previous.spawn_armed {
        ctx.emit(Effect::CancelTimer(TimerKind::CreatureSpawn));
    }
    if previous.animation_armed {
        ctx.emit(Effect::CancelTimer(TimerKind::EntranceAnimation));
    }
    if previous.hunger_started {
        ctx.emit(Effect::StopHungerClock);
    }
    for placed in [previous.creature, previous.decoy].into_iter().flatten() {
        if let Some(anchor) = placed.anchor {
            ctx.emit(Effect::ReleaseAnchor(anchor));
        }
    }
    info!("IDLE: scene clear");
}

fn idle_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::Tap(tap) => {
            if !ctx.gate_open {
                ctx.status(StatusMessage::NotHere);
                return None;
            }
            ctx.placement.decoy_target = tap.hit;
            Some(Phase::DecoyRequested)
        }
        other => ignore("IDLE", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DECOY_REQUESTED — waiting for a surface tap and/or the decoy load
// ═══════════════════════════════════════════════════════════════════════════

fn request_decoy(ctx: &mut PlacementContext) {
    ctx.placement.pending = Some(AssetSlot::Decoy);
    ctx.emit(Effect::RequestLoad(AssetSlot::Decoy));
}

fn decoy_requested_enter(ctx: &mut PlacementContext) {
    if ctx.placement.decoy_target.is_some() {
        request_decoy(ctx);
    } else {
        ctx.status(StatusMessage::NoSurface);
    }
}

fn decoy_requested_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::Tap(tap) => {
            if !ctx.gate_open {
                ctx.status(StatusMessage::NotHere);
                return None;
            }
            match tap.hit {
                Some(pose) => {
                    ctx.placement.decoy_target = Some(pose);
                    request_decoy(ctx);
                }
                None => ctx.status(StatusMessage::NoSurface),
            }
            None
        }
        Stimulus::Loaded {
            slot: AssetSlot::Decoy,
            entity,
        } if ctx.placement.pending == Some(AssetSlot::Decoy) => {
            ctx.placement.pending = None;
            let Some(pose) = ctx.placement.decoy_target.take() else {
                warn!("DECOY_REQUESTED: decoy loaded without a target pose");
                return None;
            };
            ctx.placement.decoy = Some(Placed {
                entity: entity.clone(),
                pose,
                anchor: None,
                placed_at: ctx.now,
            });
            ctx.emit(Effect::Anchor {
                slot: AssetSlot::Decoy,
                pose,
            });
            ctx.emit(Effect::ArmTimer(TimerKind::CreatureSpawn));
            ctx.placement.spawn_armed = true;
            ctx.status(StatusMessage::DecoyPlaced);
            Some(Phase::DecoyPlaced)
        }
        Stimulus::LoadFailed {
            slot: AssetSlot::Decoy,
            error,
        } if ctx.placement.pending == Some(AssetSlot::Decoy) => {
            ctx.placement.pending = None;
            warn!("DECOY_REQUESTED: decoy load failed: {}", error);
            ctx.status(StatusMessage::LoadFailed {
                slot: AssetSlot::Decoy,
                cause: error.cause(),
            });
            None
        }
        other => ignore("DECOY_REQUESTED", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  DECOY_PLACED — fish anchored, waiting out the spawn delay
// ═══════════════════════════════════════════════════════════════════════════

fn decoy_placed_exit(ctx: &mut PlacementContext) {
    if ctx.placement.spawn_armed {
        ctx.emit(Effect::CancelTimer(TimerKind::CreatureSpawn));
        ctx.placement.spawn_armed = false;
    }
}

/// The delay has passed since the decoy was anchored.
fn spawn_delay_satisfied(ctx: &PlacementContext) -> bool {
    ctx.placement
        .decoy
        .as_ref()
        .is_some_and(|d| ctx.now >= d.placed_at + ctx.spawn_delay())
}

fn decoy_placed_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::SpawnDelayElapsed if ctx.placement.spawn_armed => {
            if !spawn_delay_satisfied(ctx) {
                debug!("DECOY_PLACED: spawn signal before delay, ignoring");
                return None;
            }
            ctx.placement.spawn_armed = false;
            Some(Phase::CreatureRequested)
        }
        Stimulus::Tap(_) => {
            if ctx.placement.spawn_armed {
                ctx.status(StatusMessage::Waiting);
                return None;
            }
            // A previous creature load failed; the user retries by tapping.
            if !ctx.gate_open {
                ctx.status(StatusMessage::NotHere);
                return None;
            }
            if !spawn_delay_satisfied(ctx) {
                ctx.status(StatusMessage::Waiting);
                return None;
            }
            Some(Phase::CreatureRequested)
        }
        other => ignore("DECOY_PLACED", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CREATURE_REQUESTED — creature model loading
// ═══════════════════════════════════════════════════════════════════════════

fn creature_requested_enter(ctx: &mut PlacementContext) {
    ctx.placement.pending = Some(AssetSlot::Creature);
    ctx.emit(Effect::RequestLoad(AssetSlot::Creature));
}

fn creature_requested_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::Loaded {
            slot: AssetSlot::Creature,
            entity,
        } if ctx.placement.pending == Some(AssetSlot::Creature) => {
            ctx.placement.pending = None;
            let Some(decoy) = ctx.placement.decoy.as_ref() else {
                warn!("CREATURE_REQUESTED: creature loaded without a decoy");
                return None;
            };
            let pose = decoy
                .pose
                .offset_by(ctx.config.creature_offset_m, ctx.config.creature_yaw_rad);
            ctx.placement.creature = Some(Placed {
                entity: entity.clone(),
                pose,
                anchor: None,
                placed_at: ctx.now,
            });
            ctx.emit(Effect::Anchor {
                slot: AssetSlot::Creature,
                pose,
            });
            Some(Phase::CreaturePlaced)
        }
        Stimulus::LoadFailed {
            slot: AssetSlot::Creature,
            error,
        } if ctx.placement.pending == Some(AssetSlot::Creature) => {
            ctx.placement.pending = None;
            warn!("CREATURE_REQUESTED: creature load failed: {}", error);
            ctx.status(StatusMessage::LoadFailed {
                slot: AssetSlot::Creature,
                cause: error.cause(),
            });
            Some(Phase::DecoyPlaced)
        }
        Stimulus::Tap(_) => {
            ctx.status(StatusMessage::Waiting);
            None
        }
        other => ignore("CREATURE_REQUESTED", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  CREATURE_PLACED — entrance animation playing
// ═══════════════════════════════════════════════════════════════════════════

fn creature_placed_enter(ctx: &mut PlacementContext) {
    ctx.emit(Effect::PlayEntrance);
    ctx.emit(Effect::ArmTimer(TimerKind::EntranceAnimation));
    ctx.placement.animation_armed = true;
    if !ctx.placement.hunger_started {
        ctx.emit(Effect::StartHungerClock);
        ctx.placement.hunger_started = true;
    }
    ctx.emit(Effect::Sound(SoundCue::Arrival));
    ctx.status(StatusMessage::CatArrived);
    info!("CREATURE_PLACED: cat arrived");
}

fn creature_placed_exit(ctx: &mut PlacementContext) {
    if ctx.placement.animation_armed {
        ctx.emit(Effect::CancelTimer(TimerKind::EntranceAnimation));
        ctx.placement.animation_armed = false;
    }
}

fn creature_placed_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::AnimationComplete if ctx.placement.animation_armed => {
            ctx.placement.animation_armed = false;
            Some(Phase::Ready)
        }
        Stimulus::Tap(_) => {
            ctx.status(StatusMessage::FeedPrompt);
            None
        }
        other => ignore("CREATURE_PLACED", other),
    }
}

// ═══════════════════════════════════════════════════════════════════════════
//  READY — feed enabled
// ═══════════════════════════════════════════════════════════════════════════

fn ready_enter(ctx: &mut PlacementContext) {
    ctx.status(StatusMessage::FeedPrompt);
}

fn ready_event(ctx: &mut PlacementContext, stimulus: &Stimulus) -> Option<Phase> {
    match stimulus {
        Stimulus::Tap(_) => {
            ctx.status(StatusMessage::FeedPrompt);
            None
        }
        other => ignore("READY", other),
    }
}
