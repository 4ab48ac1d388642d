//! Mock adapters for integration tests.
//!
//! Records every scene, audio, capture and event call so tests can assert
//! on the full history without a renderer.  Shared by several test
//! crates, so not every helper is used by each of them.

#![allow(dead_code)]

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::time::Duration;

use chrono::NaiveDate;
use embassy_sync::blocking_mutex::raw::NoopRawMutex;
use embassy_sync::signal::Signal;
use futures_lite::future::BoxedLocal;

use fatcat::app::commands::SessionCommand;
use fatcat::app::events::{SessionEvent, StatusMessage};
use fatcat::app::ports::{AnchorId, AudioPort, CapturePort, EventSink, ScenePort};
use fatcat::app::service::ArSession;
use fatcat::assets::{AssetLoader, EntityHandle};
use fatcat::config::ToyConfig;
use fatcat::error::{AudioError, CaptureError, LoadError};
use fatcat::model::{Cat, CatId, CatType, Coordinate, Location, Pose, Schedule, TapInput};
use fatcat::presence::Authorization;
use fatcat::store::ScheduleStore;
use fatcat::timers::Moment;
use uuid::Uuid;

// ── Scene call record ─────────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum SceneCall {
    Add {
        anchor: AnchorId,
        model_id: String,
        pose: Pose,
    },
    Remove(AnchorId),
    Scale(AnchorId, f32),
    Animate(AnchorId, String),
    Sound(String),
    Capture,
}

// ── MockIo ────────────────────────────────────────────────────

#[derive(Default)]
pub struct MockIo {
    pub calls: Vec<SceneCall>,
    pub live: Vec<AnchorId>,
    next: u64,
    pub capture_result: Option<Result<String, CaptureError>>,
}

impl MockIo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn added(&self) -> Vec<(&str, Pose)> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SceneCall::Add { model_id, pose, .. } => Some((model_id.as_str(), *pose)),
                _ => None,
            })
            .collect()
    }

    pub fn last_scale(&self) -> Option<f32> {
        self.calls.iter().rev().find_map(|c| match c {
            SceneCall::Scale(_, s) => Some(*s),
            _ => None,
        })
    }

    pub fn sounds(&self) -> Vec<&str> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                SceneCall::Sound(name) => Some(name.as_str()),
                _ => None,
            })
            .collect()
    }
}

impl ScenePort for MockIo {
    fn add_anchor(&mut self, pose: Pose, entity: &EntityHandle) -> AnchorId {
        self.next += 1;
        let anchor = AnchorId(self.next);
        self.live.push(anchor);
        self.calls.push(SceneCall::Add {
            anchor,
            model_id: entity.model_id.clone(),
            pose,
        });
        anchor
    }

    fn remove_anchor(&mut self, anchor: AnchorId) {
        self.live.retain(|a| *a != anchor);
        self.calls.push(SceneCall::Remove(anchor));
    }

    fn set_scale(&mut self, anchor: AnchorId, scale: f32) {
        self.calls.push(SceneCall::Scale(anchor, scale));
    }

    fn play_animation(&mut self, anchor: AnchorId, name: &str, _duration_ms: u64) {
        self.calls.push(SceneCall::Animate(anchor, name.to_string()));
    }
}

impl AudioPort for MockIo {
    fn play_sound(&mut self, name: &str) -> Result<(), AudioError> {
        self.calls.push(SceneCall::Sound(name.to_string()));
        Ok(())
    }
}

impl CapturePort for MockIo {
    fn capture_frame(&mut self) -> Result<String, CaptureError> {
        self.calls.push(SceneCall::Capture);
        self.capture_result
            .clone()
            .unwrap_or_else(|| Ok("mock://frame".to_string()))
    }
}

// ── Event recorder ────────────────────────────────────────────

#[derive(Default)]
pub struct RecordingSink {
    pub events: Vec<SessionEvent>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn statuses(&self) -> Vec<&StatusMessage> {
        self.events
            .iter()
            .filter_map(|e| match e {
                SessionEvent::Status(m) => Some(m),
                _ => None,
            })
            .collect()
    }

    pub fn last_status(&self) -> Option<&StatusMessage> {
        self.statuses().last().copied()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &SessionEvent) {
        self.events.push(event.clone());
    }
}

// ── Loaders ───────────────────────────────────────────────────

/// Resolves every request on the first poll.  Per-model failures can be
/// queued; each queued error is consumed by one request.
#[derive(Default)]
pub struct ImmediateLoader {
    failures: RefCell<HashMap<String, VecDeque<LoadError>>>,
    next: Cell<u64>,
    pub requests: RefCell<Vec<String>>,
}

impl ImmediateLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    pub fn fail_next(&self, model_id: &str, error: LoadError) {
        self.failures
            .borrow_mut()
            .entry(model_id.to_string())
            .or_default()
            .push_back(error);
    }

    pub fn request_count(&self, model_id: &str) -> usize {
        self.requests
            .borrow()
            .iter()
            .filter(|m| m.as_str() == model_id)
            .count()
    }
}

impl AssetLoader for ImmediateLoader {
    fn load(&self, model_id: &str) -> BoxedLocal<Result<EntityHandle, LoadError>> {
        self.requests.borrow_mut().push(model_id.to_string());
        let queued = self
            .failures
            .borrow_mut()
            .get_mut(model_id)
            .and_then(VecDeque::pop_front);
        let result = match queued {
            Some(error) => Err(error),
            None => {
                self.next.set(self.next.get() + 1);
                Ok(EntityHandle {
                    id: self.next.get(),
                    model_id: model_id.to_string(),
                })
            }
        };
        Box::pin(async move { result })
    }
}

type Gate = Rc<Signal<NoopRawMutex, Result<EntityHandle, LoadError>>>;

/// Holds every load open until the test releases it.
#[derive(Default)]
pub struct GatedLoader {
    pub gates: RefCell<Vec<(String, Gate)>>,
}

impl GatedLoader {
    pub fn new() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Completes the oldest open load for `model_id` with a fresh entity.
    pub fn release(&self, model_id: &str, entity_id: u64) -> bool {
        let mut gates = self.gates.borrow_mut();
        let Some(i) = gates.iter().position(|(m, _)| m == model_id) else {
            return false;
        };
        let (model_id, gate) = gates.remove(i);
        gate.signal(Ok(EntityHandle {
            id: entity_id,
            model_id,
        }));
        true
    }

    /// Completes every open load, including superseded ones.
    pub fn release_all(&self) {
        for (i, (model_id, gate)) in self.gates.borrow_mut().drain(..).enumerate() {
            gate.signal(Ok(EntityHandle {
                id: 1000 + i as u64,
                model_id,
            }));
        }
    }

    pub fn open_count(&self) -> usize {
        self.gates.borrow().len()
    }
}

impl AssetLoader for GatedLoader {
    fn load(&self, model_id: &str) -> BoxedLocal<Result<EntityHandle, LoadError>> {
        let gate: Gate = Rc::new(Signal::new());
        self.gates
            .borrow_mut()
            .push((model_id.to_string(), gate.clone()));
        Box::pin(async move { gate.wait().await })
    }
}

// ── Fixtures ──────────────────────────────────────────────────

/// Tokyo Station.
pub const STATION: Coordinate = Coordinate::new(35.6812, 139.7671);
/// About 330 m north of the station.
pub const NEARBY: Coordinate = Coordinate::new(35.6842, 139.7671);
/// About 2 km north of the station.
pub const FAR_AWAY: Coordinate = Coordinate::new(35.6992, 139.7671);

pub const DECOY_POSE: Pose = Pose {
    position: [0.0, 0.0, -1.0],
    yaw: 0.0,
};

pub fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()
}

/// 15:00 on [`today`], monotonic zero.
pub fn three_pm() -> Moment {
    Moment::new(Duration::ZERO, today().and_hms_opt(15, 0, 0).unwrap())
}

/// One cat, one location at the station, one 14:00–17:00 schedule today.
pub fn station_store() -> (ScheduleStore, CatId) {
    let cat = Cat::new("Kuro", 1);
    let cat_id = cat.id;
    let location = Location {
        id: Uuid::new_v4(),
        name: "Tokyo Station".to_string(),
        address: None,
        latitude: STATION.latitude,
        longitude: STATION.longitude,
    };
    let schedule = Schedule::new(cat_id, location.id, today(), "14:00", "17:00");
    let types = vec![CatType {
        id: 1,
        icon: "cat.fill".to_string(),
        label: "Black cat".to_string(),
    }];
    (
        ScheduleStore::new(vec![cat], types, vec![location], vec![schedule]),
        cat_id,
    )
}

pub struct Harness<L: AssetLoader> {
    pub session: ArSession<L>,
    pub store: ScheduleStore,
    pub io: MockIo,
    pub sink: RecordingSink,
    pub now: Moment,
}

impl<L: AssetLoader> Harness<L> {
    pub fn start(config: ToyConfig, loader: L, store: ScheduleStore, now: Moment) -> Self {
        let mut sink = RecordingSink::new();
        let mut session = ArSession::new(config, loader);
        session.start(now, &store, &mut sink);
        Self {
            session,
            store,
            io: MockIo::new(),
            sink,
            now,
        }
    }

    pub fn cmd(&mut self, cmd: SessionCommand) {
        self.session
            .handle_command(cmd, self.now, &mut self.store, &mut self.io, &mut self.sink);
    }

    pub fn poll(&mut self) {
        self.session
            .poll(self.now, &mut self.store, &mut self.io, &mut self.sink);
    }

    pub fn advance(&mut self, ms: u64) {
        self.now = self.now.advanced(Duration::from_millis(ms));
        self.poll();
    }

    pub fn stand_at(&mut self, position: Coordinate) {
        self.cmd(SessionCommand::AuthorizationChanged(Authorization::Granted));
        self.cmd(SessionCommand::PositionUpdated(position));
    }

    pub fn tap(&mut self) {
        self.cmd(SessionCommand::Tap(TapInput::on_surface(DECOY_POSE)));
    }
}

impl Harness<Rc<ImmediateLoader>> {
    /// Station store, standing nearby at 15:00.
    pub fn at_station(config: ToyConfig) -> (Self, Rc<ImmediateLoader>, CatId) {
        let (store, cat_id) = station_store();
        let loader = ImmediateLoader::new();
        let mut h = Self::start(config, loader.clone(), store, three_pm());
        h.stand_at(NEARBY);
        (h, loader, cat_id)
    }

    /// Tap, place the decoy, wait out the spawn delay and the entrance.
    pub fn run_to_ready(&mut self) {
        let config = self.session.config().clone();
        self.tap();
        self.poll();
        self.advance(config.spawn_delay_ms);
        self.poll();
        self.advance(config.entrance_animation_ms);
    }
}
