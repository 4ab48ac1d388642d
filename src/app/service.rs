//! AR session service — the hexagonal core.
//!
//! [`ArSession`] owns the placement FSM, the asset pipeline, the timers, the
//! hunger clock and the niboshi bag.  All I/O flows through port traits
//! injected at call sites, so the whole session is testable with mock
//! adapters.
//!
//! ```text
//!  SessionCommand ──▶ ┌──────────────────────────────┐ ──▶ EventSink
//!                     │          ArSession            │
//!  ScheduleStore ◀──▶ │ Gate · FSM · Assets · Timers  │ ──▶ Scene/Audio/Capture
//!                     └──────────────────────────────┘
//! ```
//!
//! The session is driven by a single event loop: commands arrive through
//! [`ArSession::handle_command`], and [`ArSession::poll`] is called every
//! loop iteration to drain load completions and fire due timers.

use core::time::Duration;

use log::{debug, info, warn};

use crate::assets::{AssetLoader, AssetPipeline, AssetSlot};
use crate::config::ToyConfig;
use crate::error::{self, Error, FeedError, StoreError};
use crate::fsm::context::{Effect, PlacementContext, SoundCue, StatusMessage};
use crate::fsm::states::build_phase_table;
use crate::fsm::{Fsm, Phase, Stimulus};
use crate::hunger::{self, FeedReceipt, HungerClock, NiboshiBag};
use crate::model::{Cat, CatId, DEFAULT_CAT_SIZE, TapInput};
use crate::presence::{self, Authorization, GeoTracker, PresenceVerdict};
use crate::store::ScheduleStore;
use crate::timers::{Moment, TimerKind, Timers};

use super::commands::SessionCommand;
use super::events::{SessionEvent, SessionSnapshot};
use super::ports::{AudioPort, CapturePort, EventSink, ScenePort};

/// Animation name handed to the scene for the creature's arrival.
pub const ENTRANCE_ANIMATION: &str = "entrance";

// ───────────────────────────────────────────────────────────────
// ArSession
// ───────────────────────────────────────────────────────────────

pub struct ArSession<L: AssetLoader> {
    fsm: Fsm,
    ctx: PlacementContext,
    assets: AssetPipeline<L>,
    timers: Timers,
    hunger: HungerClock,
    niboshi: NiboshiBag,
    geo: GeoTracker,
    verdict: PresenceVerdict,
    /// Cat of the schedule that opened the gate for this placement.
    active_cat: Option<CatId>,
    /// Transient record for a scheduled cat that is missing from the store.
    stray: Option<Cat>,
}

impl<L: AssetLoader> ArSession<L> {
    /// Does **not** start the FSM; call [`start`](Self::start) next.
    pub fn new(config: ToyConfig, loader: L) -> Self {
        let niboshi = NiboshiBag::new(config.initial_niboshi);
        Self {
            fsm: Fsm::new(build_phase_table(), Phase::Idle),
            ctx: PlacementContext::new(config),
            assets: AssetPipeline::new(loader),
            timers: Timers::new(),
            hunger: HungerClock::new(),
            niboshi,
            geo: GeoTracker::new(),
            verdict: PresenceVerdict::NoPosition,
            active_cat: None,
            stray: None,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, at: Moment, store: &ScheduleStore, sink: &mut impl EventSink) {
        self.ctx.now = at.mono;
        self.fsm.start(&mut self.ctx);
        self.ctx.drain_effects();
        self.timers.arm_periodic(
            TimerKind::PresenceRefresh,
            at.mono,
            Duration::from_millis(self.ctx.config.presence_refresh_ms),
        );
        self.refresh_presence(at, store, sink);
        sink.emit(&SessionEvent::Started(self.fsm.current_phase()));
        info!("ArSession started in {:?}", self.fsm.current_phase());
    }

    // ── Command handling ──────────────────────────────────────

    /// The `io` parameter satisfies every output port at once, which avoids
    /// juggling several mutable borrows while keeping the boundary explicit.
    pub fn handle_command(
        &mut self,
        cmd: SessionCommand,
        at: Moment,
        store: &mut ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        match cmd {
            SessionCommand::Tap(tap) => self.tap(tap, at, store, io, sink),
            SessionCommand::Feed => self.feed(store, io, sink),
            SessionCommand::RefillNiboshi => {
                let count = self.niboshi.refill(self.ctx.config.refill_amount);
                info!("Niboshi refilled to {}", count);
                sink.emit(&SessionEvent::NiboshiChanged(count));
                sink.emit(&SessionEvent::Status(StatusMessage::Refilled { niboshi: count }));
            }
            SessionCommand::Capture => {
                let status = match Self::capture(io) {
                    Ok(location) => StatusMessage::CaptureSaved(location),
                    Err(e) => {
                        warn!("Capture failed: {}", e);
                        StatusMessage::CaptureFailed(e.to_string())
                    }
                };
                sink.emit(&SessionEvent::Status(status));
            }
            SessionCommand::Teardown => self.teardown(at, store, io, sink),
            SessionCommand::PositionUpdated(position) => {
                if self.geo.update(position) {
                    self.refresh_presence(at, store, sink);
                }
            }
            SessionCommand::AuthorizationChanged(authorization) => {
                self.geo.set_authorization(authorization);
                if authorization == Authorization::Denied {
                    sink.emit(&SessionEvent::Status(StatusMessage::LocationDenied));
                }
                self.refresh_presence(at, store, sink);
            }
            SessionCommand::UpdateConfig(config) => {
                if let Err(e) = self.update_config(config, at) {
                    warn!("Rejected configuration: {}", e);
                }
            }
        }
    }

    // ── Event loop ────────────────────────────────────────────

    /// Drain finished loads and fire due timers.  Call once per loop pass.
    pub fn poll(
        &mut self,
        at: Moment,
        store: &mut ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        for outcome in self.assets.pump() {
            let stimulus = match outcome.result {
                Ok(entity) => Stimulus::Loaded {
                    slot: outcome.slot,
                    entity,
                },
                Err(error) => Stimulus::LoadFailed {
                    slot: outcome.slot,
                    error,
                },
            };
            self.dispatch(&stimulus, at, store, io, sink);
        }

        for fired in self.timers.poll(at.mono) {
            match fired.kind {
                TimerKind::CreatureSpawn => {
                    self.dispatch(&Stimulus::SpawnDelayElapsed, at, store, io, sink);
                }
                TimerKind::EntranceAnimation => {
                    self.dispatch(&Stimulus::AnimationComplete, at, store, io, sink);
                }
                TimerKind::HungerTick => {
                    if fired.count > 1 {
                        debug!("Hunger tick caught up {} periods", fired.count);
                    }
                    self.hunger_tick(store, sink);
                }
                TimerKind::PresenceRefresh => self.refresh_presence(at, store, sink),
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn phase(&self) -> Phase {
        self.fsm.current_phase()
    }

    pub fn niboshi(&self) -> u32 {
        self.niboshi.count()
    }

    pub fn is_present(&self) -> bool {
        self.verdict.is_present()
    }

    pub fn verdict(&self) -> PresenceVerdict {
        self.verdict
    }

    pub fn active_cat(&self) -> Option<CatId> {
        self.active_cat
    }

    pub fn is_load_pending(&self, slot: AssetSlot) -> bool {
        self.assets.is_pending(slot)
    }

    pub fn is_timer_armed(&self, kind: TimerKind) -> bool {
        self.timers.is_armed(kind)
    }

    pub fn hunger_running(&self) -> bool {
        self.hunger.is_running()
    }

    /// Earliest monotonic deadline; lets the loop size its sleep.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.next_deadline()
    }

    pub fn config(&self) -> &ToyConfig {
        &self.ctx.config
    }

    pub fn snapshot(&self, store: &ScheduleStore) -> SessionSnapshot {
        let placement = &self.ctx.placement;
        SessionSnapshot {
            phase: self.fsm.current_phase(),
            niboshi: self.niboshi.count(),
            present: self.verdict.is_present(),
            distance_m: self.verdict.distance_m(),
            authorization: self.geo.authorization(),
            active_cat: self.active_cat.map(|id| match (store.cat(id), &self.stray) {
                (Some(cat), _) => cat.clone(),
                (None, Some(stray)) if stray.id == id => stray.clone(),
                (None, _) => Cat::unknown(id),
            }),
            decoy_anchor: placement.decoy.as_ref().and_then(|p| p.anchor),
            creature_anchor: placement.creature.as_ref().and_then(|p| p.anchor),
            hunger_running: self.hunger.is_running(),
        }
    }

    // ── Internal ──────────────────────────────────────────────

    fn tap(
        &mut self,
        tap: TapInput,
        at: Moment,
        store: &ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        self.refresh_presence(at, store, sink);
        self.ctx.gate_open = self.verdict.is_present();
        if !self.ctx.gate_open {
            debug!("Tap with gate closed: {:?}", self.verdict);
        }
        let from = self.fsm.current_phase();
        let active = self.verdict.cat_id();
        self.dispatch(&Stimulus::Tap(tap), at, store, io, sink);
        if from == Phase::Idle && self.fsm.current_phase() != Phase::Idle {
            self.active_cat = active;
            self.stray = None;
        }
    }

    fn dispatch(
        &mut self,
        stimulus: &Stimulus,
        at: Moment,
        store: &ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now = at.mono;
        let transition = self.fsm.dispatch(&mut self.ctx, stimulus);
        self.apply_effects(at, store, io, sink);
        if let Some((from, to)) = transition {
            sink.emit(&SessionEvent::PhaseChanged { from, to });
        }
    }

    fn teardown(
        &mut self,
        at: Moment,
        store: &ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        self.ctx.now = at.mono;
        let from = self.fsm.current_phase();
        let moved = self.fsm.force_transition(Phase::Idle, &mut self.ctx);
        self.apply_effects(at, store, io, sink);

        // Whatever the phase flags said, nothing may outlive teardown.
        self.assets.cancel_all();
        self.timers.cancel(TimerKind::CreatureSpawn);
        self.timers.cancel(TimerKind::EntranceAnimation);
        self.hunger.stop(&mut self.timers);
        self.active_cat = None;
        self.stray = None;

        if moved {
            sink.emit(&SessionEvent::PhaseChanged {
                from,
                to: Phase::Idle,
            });
        }
        sink.emit(&SessionEvent::TornDown);
        info!("ArSession torn down");
    }

    fn apply_effects(
        &mut self,
        at: Moment,
        store: &ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        for effect in self.ctx.drain_effects() {
            match effect {
                Effect::RequestLoad(slot) => {
                    let model = match slot {
                        AssetSlot::Decoy => self.ctx.config.decoy_model.as_str(),
                        AssetSlot::Creature => self.ctx.config.creature_model.as_str(),
                    };
                    self.assets.request(slot, model);
                }
                Effect::CancelLoad(slot) => {
                    self.assets.cancel(slot);
                }
                Effect::Anchor { slot, pose } => {
                    let scale = self.active_cat_size(store).map(|s| s as f32);
                    let Some(placed) = self.ctx.placement.slot_mut(slot) else {
                        warn!("Anchor requested for empty {} slot", slot.name());
                        continue;
                    };
                    let anchor = io.add_anchor(pose, &placed.entity);
                    placed.anchor = Some(anchor);
                    if let (AssetSlot::Creature, Some(scale)) = (slot, scale) {
                        io.set_scale(anchor, scale);
                    }
                }
                Effect::ReleaseAnchor(anchor) => io.remove_anchor(anchor),
                Effect::ArmTimer(kind) => {
                    let delay = match kind {
                        TimerKind::CreatureSpawn => self.ctx.spawn_delay(),
                        TimerKind::EntranceAnimation => {
                            Duration::from_millis(self.ctx.config.entrance_animation_ms)
                        }
                        TimerKind::HungerTick | TimerKind::PresenceRefresh => {
                            warn!("{} is periodic and not armed by the FSM", kind.name());
                            continue;
                        }
                    };
                    self.timers.arm_once(kind, at.mono, delay);
                }
                Effect::CancelTimer(kind) => {
                    self.timers.cancel(kind);
                }
                Effect::PlayEntrance => {
                    if let Some(anchor) = self.creature_anchor() {
                        io.play_animation(
                            anchor,
                            ENTRANCE_ANIMATION,
                            self.ctx.config.entrance_animation_ms,
                        );
                    }
                }
                Effect::StartHungerClock => {
                    let interval = Duration::from_millis(self.ctx.config.hunger_interval_ms);
                    self.hunger.start(&mut self.timers, at.mono, interval);
                }
                Effect::StopHungerClock => {
                    self.hunger.stop(&mut self.timers);
                }
                Effect::Sound(cue) => self.play(io, cue),
                Effect::Status(message) => sink.emit(&SessionEvent::Status(message)),
            }
        }
    }

    fn feed(
        &mut self,
        store: &mut ScheduleStore,
        io: &mut (impl ScenePort + AudioPort + CapturePort),
        sink: &mut impl EventSink,
    ) {
        let (cat_id, name, receipt) = match self.try_feed(store) {
            Ok(fed) => fed,
            Err(Error::Feed(FeedError::NotReady)) => {
                sink.emit(&SessionEvent::Status(StatusMessage::NothingToFeed));
                return;
            }
            Err(Error::Feed(FeedError::NoNiboshi)) => {
                sink.emit(&SessionEvent::Status(StatusMessage::NoNiboshi));
                return;
            }
            Err(e) => {
                warn!("Feed failed: {}", e);
                return;
            }
        };

        sink.emit(&SessionEvent::CatFed {
            cat_id,
            size: receipt.new_size,
            feed_count: receipt.feed_count,
        });
        sink.emit(&SessionEvent::NiboshiChanged(receipt.niboshi_left));
        sink.emit(&SessionEvent::Status(StatusMessage::Fed {
            name,
            niboshi_left: receipt.niboshi_left,
        }));
        if let Some(anchor) = self.creature_anchor() {
            io.set_scale(anchor, receipt.new_size as f32);
        }
        self.play(io, SoundCue::Feed);
    }

    /// Spend one niboshi on the active cat.  Only a cat in `Ready` can be
    /// fed; an empty bag leaves the store untouched.
    fn try_feed(
        &mut self,
        store: &mut ScheduleStore,
    ) -> error::Result<(CatId, String, FeedReceipt)> {
        let cat_id = self
            .active_cat
            .filter(|_| self.fsm.current_phase() == Phase::Ready)
            .ok_or(FeedError::NotReady)?;
        if self.niboshi.count() == 0 {
            return Err(FeedError::NoNiboshi.into());
        }

        let increment = self.ctx.config.feed_size_increment;
        let niboshi = &mut self.niboshi;
        if store.cat(cat_id).is_none() {
            let stray = self.stray.get_or_insert_with(|| Cat::unknown(cat_id));
            let receipt = niboshi.feed(stray, increment)?;
            return Ok((cat_id, stray.name.clone(), receipt));
        }

        let mut fed = None;
        store.update_cat(cat_id, |cat| {
            fed = Some(niboshi.feed(cat, increment).map(|r| (cat.name.clone(), r)));
        });
        let (name, receipt) = fed.ok_or(StoreError::UnknownCat(cat_id))??;
        Ok((cat_id, name, receipt))
    }

    fn hunger_tick(&mut self, store: &mut ScheduleStore, sink: &mut impl EventSink) {
        if !self.fsm.current_phase().has_creature() {
            return;
        }
        let Some(cat_id) = self.active_cat else { return };

        let (flipped, name) = match store.cat(cat_id) {
            Some(cat) if cat.is_hungry => (false, String::new()),
            Some(_) => {
                let mut name = String::new();
                let mut flipped = false;
                store.update_cat(cat_id, |cat| {
                    flipped = hunger::on_tick(cat);
                    name = cat.name.clone();
                });
                (flipped, name)
            }
            None => match self.stray.as_mut() {
                Some(stray) => (hunger::on_tick(stray), stray.name.clone()),
                None => (false, String::new()),
            },
        };

        if flipped {
            sink.emit(&SessionEvent::CatHungry { cat_id });
            sink.emit(&SessionEvent::Status(StatusMessage::CatHungry { name }));
        }
    }

    fn refresh_presence(&mut self, at: Moment, store: &ScheduleStore, sink: &mut impl EventSink) {
        let verdict = presence::evaluate(
            store,
            at.wall,
            self.geo.position(),
            self.ctx.config.presence_radius_m,
        );
        let was_present = self.verdict.is_present();
        self.verdict = verdict;
        if was_present != verdict.is_present() {
            info!("Presence gate {}: {:?}", if verdict.is_present() { "open" } else { "closed" }, verdict);
            sink.emit(&SessionEvent::PresenceChanged {
                present: verdict.is_present(),
                distance_m: verdict.distance_m(),
            });
        }
    }

    fn update_config(&mut self, config: ToyConfig, at: Moment) -> error::Result<()> {
        config.validate().map_err(Error::Config)?;
        if config.presence_refresh_ms != self.ctx.config.presence_refresh_ms {
            self.timers.arm_periodic(
                TimerKind::PresenceRefresh,
                at.mono,
                Duration::from_millis(config.presence_refresh_ms),
            );
        }
        self.ctx.config = config;
        info!("Configuration updated at runtime");
        Ok(())
    }

    fn capture(io: &mut impl CapturePort) -> error::Result<String> {
        Ok(io.capture_frame()?)
    }

    fn play(&self, io: &mut impl AudioPort, cue: SoundCue) {
        let name = match cue {
            SoundCue::Arrival => &self.ctx.config.arrival_sound,
            SoundCue::Feed => &self.ctx.config.feed_sound,
        };
        if let Err(e) = io.play_sound(name) {
            warn!("Sound '{}' failed: {}", name, e);
        }
    }

    fn creature_anchor(&self) -> Option<super::ports::AnchorId> {
        self.ctx.placement.creature.as_ref().and_then(|p| p.anchor)
    }

    fn active_cat_size(&self, store: &ScheduleStore) -> Option<f64> {
        let id = self.active_cat?;
        let size = store
            .cat(id)
            .map(|c| c.size)
            .or_else(|| self.stray.as_ref().filter(|c| c.id == id).map(|c| c.size))
            .unwrap_or(DEFAULT_CAT_SIZE);
        Some(size)
    }
}
