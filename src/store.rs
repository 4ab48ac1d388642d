//! Schedule store: the authoritative in-memory collections of cats, cat
//! types, locations and schedules.
//!
//! Every committed mutation notifies the subscribed [`StoreObserver`]s with
//! the collection that changed.  Persistence is one such observer
//! ([`Persister`]), which rewrites the whole collection blob under its key.
//!
//! ```text
//!   update_cat / add_schedule / ...
//!          │
//!          ▼
//!   ScheduleStore ──notify(StoreChange)──▶ Persister ──▶ StoragePort
//!                                     └──▶ other observers
//! ```

use std::borrow::Cow;
use std::collections::BTreeMap;

use chrono::{NaiveDate, NaiveTime};
use log::{debug, info, warn};
use serde::de::DeserializeOwned;

use crate::app::ports::{StorageError, StoragePort, StoreObserver};
use crate::defaults;
use crate::error::StoreError;
use crate::model::{
    Cat, CatId, CatType, CatTypeId, Location, LocationId, Schedule, ScheduleId, UNKNOWN_PLACE_NAME,
    parse_wall_time,
};

/// Storage namespace holding the four collection blobs.
pub const STORE_NAMESPACE: &str = "fatcat";

// ---------------------------------------------------------------------------
// Change notification
// ---------------------------------------------------------------------------

/// Which collection a mutation touched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StoreChange {
    Cats,
    CatTypes,
    Schedules,
    Locations,
}

impl StoreChange {
    pub const ALL: [StoreChange; 4] = [
        StoreChange::Cats,
        StoreChange::CatTypes,
        StoreChange::Schedules,
        StoreChange::Locations,
    ];

    /// Storage key of the collection blob.
    pub const fn key(self) -> &'static str {
        match self {
            Self::Cats => "cats",
            Self::CatTypes => "catTypes",
            Self::Schedules => "schedules",
            Self::Locations => "locations",
        }
    }
}

/// Display row for a schedule list.  Dangling references resolve to
/// placeholder names rather than errors.
#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleSummary {
    pub schedule_id: ScheduleId,
    pub cat_name: String,
    pub cat_icon: Option<String>,
    pub location_name: String,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

pub struct ScheduleStore {
    cats: Vec<Cat>,
    cat_types: Vec<CatType>,
    locations: Vec<Location>,
    schedules: Vec<Schedule>,
    observers: Vec<Box<dyn StoreObserver>>,
}

impl ScheduleStore {
    pub fn new(
        cats: Vec<Cat>,
        cat_types: Vec<CatType>,
        locations: Vec<Location>,
        schedules: Vec<Schedule>,
    ) -> Self {
        Self {
            cats,
            cat_types,
            locations,
            schedules,
            observers: Vec::new(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), Vec::new(), Vec::new(), Vec::new())
    }

    /// Store seeded with the built-in sample data.
    pub fn with_defaults(today: NaiveDate) -> Self {
        Self::new(
            defaults::cats(),
            defaults::cat_types(),
            defaults::locations(),
            defaults::schedules(today),
        )
    }

    /// Load every collection from `storage`.  A missing or undecodable
    /// blob falls back to the built-in defaults for that collection.
    pub fn load(storage: &impl StoragePort, today: NaiveDate) -> Self {
        let store = Self::new(
            load_collection(storage, StoreChange::Cats.key(), defaults::cats),
            load_collection(storage, StoreChange::CatTypes.key(), defaults::cat_types),
            load_collection(storage, StoreChange::Locations.key(), defaults::locations),
            load_collection(storage, StoreChange::Schedules.key(), || {
                defaults::schedules(today)
            }),
        );
        info!(
            "store: {} cats, {} types, {} locations, {} schedules",
            store.cats.len(),
            store.cat_types.len(),
            store.locations.len(),
            store.schedules.len()
        );
        store
    }

    /// Write every collection to `storage`.
    pub fn save_all(&self, storage: &mut impl StoragePort) -> Result<(), StorageError> {
        for change in StoreChange::ALL {
            let bytes = self.encode(change).map_err(|e| {
                warn!("store: failed to encode '{}': {}", change.key(), e);
                StorageError::IoError
            })?;
            storage.write(STORE_NAMESPACE, change.key(), &bytes)?;
        }
        Ok(())
    }

    /// JSON blob for one collection.
    pub fn encode(&self, change: StoreChange) -> serde_json::Result<Vec<u8>> {
        match change {
            StoreChange::Cats => serde_json::to_vec(&self.cats),
            StoreChange::CatTypes => serde_json::to_vec(&self.cat_types),
            StoreChange::Schedules => serde_json::to_vec(&self.schedules),
            StoreChange::Locations => serde_json::to_vec(&self.locations),
        }
    }

    pub fn subscribe(&mut self, observer: Box<dyn StoreObserver>) {
        self.observers.push(observer);
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn cats(&self) -> &[Cat] {
        &self.cats
    }

    pub fn cat_types(&self) -> &[CatType] {
        &self.cat_types
    }

    pub fn locations(&self) -> &[Location] {
        &self.locations
    }

    /// Schedules in store (insertion) order.
    pub fn schedules(&self) -> &[Schedule] {
        &self.schedules
    }

    pub fn cat(&self, id: CatId) -> Option<&Cat> {
        self.cats.iter().find(|c| c.id == id)
    }

    pub fn cat_type(&self, id: CatTypeId) -> Option<&CatType> {
        self.cat_types.iter().find(|t| t.id == id)
    }

    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations.iter().find(|l| l.id == id)
    }

    pub fn schedule(&self, id: ScheduleId) -> Option<&Schedule> {
        self.schedules.iter().find(|s| s.id == id)
    }

    /// The cat record, or an "Unknown Cat" stand-in if it was deleted.
    pub fn resolve_cat(&self, id: CatId) -> Cow<'_, Cat> {
        match self.cat(id) {
            Some(cat) => Cow::Borrowed(cat),
            None => Cow::Owned(Cat::unknown(id)),
        }
    }

    /// Schedules dated `today`, in store order.
    pub fn todays_schedules(&self, today: NaiveDate) -> Vec<&Schedule> {
        self.schedules.iter().filter(|s| s.date == today).collect()
    }

    /// Schedules grouped by calendar day, days ascending, each day sorted by
    /// parsed start time.  Unparseable start times go last.
    pub fn grouped_by_date(&self) -> BTreeMap<NaiveDate, Vec<&Schedule>> {
        let mut groups: BTreeMap<NaiveDate, Vec<&Schedule>> = BTreeMap::new();
        for s in &self.schedules {
            groups.entry(s.date).or_default().push(s);
        }
        for day in groups.values_mut() {
            day.sort_by(|a, b| {
                start_key(a)
                    .cmp(&start_key(b))
                    .then_with(|| a.start_time.cmp(&b.start_time))
            });
        }
        groups
    }

    pub fn summarize(&self, schedule: &Schedule) -> ScheduleSummary {
        let cat = self.resolve_cat(schedule.cat_id);
        ScheduleSummary {
            schedule_id: schedule.id,
            cat_icon: self.cat_type(cat.type_id).map(|t| t.icon.clone()),
            cat_name: cat.name.clone(),
            location_name: self
                .location(schedule.location_id)
                .map_or_else(|| UNKNOWN_PLACE_NAME.to_string(), |l| l.name.clone()),
            date: schedule.date,
            start_time: schedule.start_time.clone(),
            end_time: schedule.end_time.clone(),
        }
    }

    // ── Mutations ─────────────────────────────────────────────

    pub fn add_cat(&mut self, cat: Cat) {
        debug!("store: add cat {} ({})", cat.name, cat.id);
        self.cats.push(cat);
        self.notify(StoreChange::Cats);
    }

    /// Delete a cat.  Its schedules stay and resolve to "Unknown Cat".
    pub fn remove_cat(&mut self, id: CatId) -> Option<Cat> {
        let idx = self.cats.iter().position(|c| c.id == id)?;
        let cat = self.cats.remove(idx);
        info!("store: removed cat {}", cat.name);
        self.notify(StoreChange::Cats);
        Some(cat)
    }

    /// Add a schedule at `location`.  The location is appended if the store
    /// has not seen its id yet.
    pub fn add_schedule(
        &mut self,
        schedule: Schedule,
        location: Location,
    ) -> Result<ScheduleId, StoreError> {
        schedule.window()?;
        if self.cat(schedule.cat_id).is_none() {
            return Err(StoreError::UnknownCat(schedule.cat_id));
        }
        if schedule.location_id != location.id {
            return Err(StoreError::LocationMismatch {
                schedule_location: schedule.location_id,
                location: location.id,
            });
        }
        if !location.coordinate().is_valid() {
            return Err(StoreError::InvalidCoordinate {
                latitude: location.latitude,
                longitude: location.longitude,
            });
        }
        let new_location = match self.location(location.id) {
            Some(existing) if *existing == location => false,
            Some(_) => return Err(StoreError::LocationConflict(location.id)),
            None => true,
        };

        if new_location {
            info!("store: new location '{}'", location.name);
            self.locations.push(location);
            self.notify(StoreChange::Locations);
        }

        let id = schedule.id;
        self.schedules.push(schedule);
        self.notify(StoreChange::Schedules);
        Ok(id)
    }

    pub fn remove_schedule(&mut self, id: ScheduleId) -> Result<Schedule, StoreError> {
        let idx = self
            .schedules
            .iter()
            .position(|s| s.id == id)
            .ok_or(StoreError::UnknownSchedule(id))?;
        let removed = self.schedules.remove(idx);
        self.notify(StoreChange::Schedules);
        Ok(removed)
    }

    /// Apply `mutate` to the cat with `id` and notify.  Returns `false` if
    /// the cat does not exist.
    pub(crate) fn update_cat(&mut self, id: CatId, mutate: impl FnOnce(&mut Cat)) -> bool {
        let Some(cat) = self.cats.iter_mut().find(|c| c.id == id) else {
            return false;
        };
        mutate(cat);
        self.notify(StoreChange::Cats);
        true
    }

    fn notify(&mut self, change: StoreChange) {
        let mut observers = core::mem::take(&mut self.observers);
        for observer in &mut observers {
            observer.on_change(change, self);
        }
        self.observers = observers;
    }
}

/// `"9:05"` and `"09:05"` compare equal; garbage sorts after every time.
fn start_key(schedule: &Schedule) -> (bool, Option<NaiveTime>) {
    let time = parse_wall_time(&schedule.start_time).ok();
    (time.is_none(), time)
}

fn load_collection<T: DeserializeOwned>(
    storage: &impl StoragePort,
    key: &str,
    fallback: impl FnOnce() -> Vec<T>,
) -> Vec<T> {
    match storage.read(STORE_NAMESPACE, key) {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(items) => items,
            Err(e) => {
                warn!("store: failed to decode '{}' ({}), using defaults", key, e);
                fallback()
            }
        },
        Err(StorageError::NotFound) => {
            info!("store: no '{}' stored, using defaults", key);
            fallback()
        }
        Err(e) => {
            warn!("store: reading '{}' failed ({}), using defaults", key, e);
            fallback()
        }
    }
}

// ---------------------------------------------------------------------------
// Persistence observer
// ---------------------------------------------------------------------------

/// Rewrites the changed collection through a [`StoragePort`] after every
/// mutation.  Write failures are logged and otherwise ignored.
pub struct Persister<S: StoragePort> {
    storage: S,
}

impl<S: StoragePort> Persister<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }
}

impl<S: StoragePort> StoreObserver for Persister<S> {
    fn on_change(&mut self, change: StoreChange, store: &ScheduleStore) {
        let bytes = match store.encode(change) {
            Ok(b) => b,
            Err(e) => {
                warn!("persist: failed to encode '{}': {}", change.key(), e);
                return;
            }
        };
        match self.storage.write(STORE_NAMESPACE, change.key(), &bytes) {
            Ok(()) => debug!("persist: wrote '{}' ({} bytes)", change.key(), bytes.len()),
            Err(e) => warn!("persist: write '{}' failed: {}", change.key(), e),
        }
    }
}
