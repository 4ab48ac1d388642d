//! Presence gate: may a cat appear here, now?
//!
//! The rule is evaluated against the store on position updates, on a coarse
//! refresh timer and on every tap.  It is a pure function of
//! `(store, now, position)`.
//!
//! 1. keep schedules dated today whose window contains `now`;
//! 2. without a position fix or a surviving schedule the gate is closed;
//! 3. the **first** survivor in store order decides, with no fallthrough to
//!    later survivors;
//! 4. its location must exist and lie within the radius.

use chrono::NaiveDateTime;
use log::{debug, info};

use crate::model::{CatId, Coordinate, LocationId, ScheduleId};
use crate::store::ScheduleStore;

/// Default presence radius in metres.
pub const PRESENCE_RADIUS_M: f64 = 1000.0;

/// Why the gate is open or closed.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PresenceVerdict {
    /// No position fix (not authorized, or none received yet).
    NoPosition,
    /// No schedule is active at this instant.
    NoActiveSchedule,
    /// The active schedule references a missing location.
    UnknownLocation {
        schedule_id: ScheduleId,
        location_id: LocationId,
    },
    /// The active schedule's location is outside the radius.
    TooFar {
        schedule_id: ScheduleId,
        cat_id: CatId,
        distance_m: f64,
    },
    /// Gate open.
    Present {
        schedule_id: ScheduleId,
        cat_id: CatId,
        location_id: LocationId,
        distance_m: f64,
    },
}

impl PresenceVerdict {
    pub fn is_present(&self) -> bool {
        matches!(self, Self::Present { .. })
    }

    /// Cat of the deciding schedule, if the gate is open.
    pub fn cat_id(&self) -> Option<CatId> {
        match self {
            Self::Present { cat_id, .. } => Some(*cat_id),
            _ => None,
        }
    }

    /// Distance to the deciding location, if one was resolved.
    pub fn distance_m(&self) -> Option<f64> {
        match self {
            Self::TooFar { distance_m, .. } | Self::Present { distance_m, .. } => Some(*distance_m),
            _ => None,
        }
    }
}

/// Evaluate the gate and report the reason.
pub fn evaluate(
    store: &ScheduleStore,
    now: NaiveDateTime,
    position: Option<Coordinate>,
    radius_m: f64,
) -> PresenceVerdict {
    let Some(position) = position else {
        return PresenceVerdict::NoPosition;
    };

    let Some(active) = store.schedules().iter().find(|s| s.is_active_at(now)) else {
        return PresenceVerdict::NoActiveSchedule;
    };

    let Some(location) = store.location(active.location_id) else {
        debug!("presence: schedule {} points at missing location", active.id);
        return PresenceVerdict::UnknownLocation {
            schedule_id: active.id,
            location_id: active.location_id,
        };
    };

    let distance_m = position.distance_m(&location.coordinate());
    if distance_m <= radius_m {
        PresenceVerdict::Present {
            schedule_id: active.id,
            cat_id: active.cat_id,
            location_id: location.id,
            distance_m,
        }
    } else {
        PresenceVerdict::TooFar {
            schedule_id: active.id,
            cat_id: active.cat_id,
            distance_m,
        }
    }
}

/// `true` iff a schedule is active now and `position` is within
/// [`PRESENCE_RADIUS_M`] of its location.
pub fn is_present(store: &ScheduleStore, now: NaiveDateTime, position: Option<Coordinate>) -> bool {
    evaluate(store, now, position, PRESENCE_RADIUS_M).is_present()
}

// ---------------------------------------------------------------------------
// Geolocation tracking
// ---------------------------------------------------------------------------

/// Location permission state as reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Authorization {
    #[default]
    Undetermined,
    Granted,
    Denied,
}

/// Keeps the latest position fix, subject to authorization.
#[derive(Debug, Clone, Default)]
pub struct GeoTracker {
    authorization: Authorization,
    latest: Option<Coordinate>,
}

impl GeoTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn authorization(&self) -> Authorization {
        self.authorization
    }

    /// Record a permission change.  Denial drops the last fix.
    pub fn set_authorization(&mut self, authorization: Authorization) {
        if self.authorization != authorization {
            info!("geo: authorization {:?} -> {:?}", self.authorization, authorization);
        }
        self.authorization = authorization;
        if authorization == Authorization::Denied {
            self.latest = None;
        }
    }

    /// Record a fix.  Ignored while denied or if the coordinate is invalid.
    /// Returns `true` if the fix was accepted.
    pub fn update(&mut self, position: Coordinate) -> bool {
        if self.authorization == Authorization::Denied || !position.is_valid() {
            debug!("geo: ignoring fix {:?}", position);
            return false;
        }
        self.latest = Some(position);
        true
    }

    /// The latest usable fix.
    pub fn position(&self) -> Option<Coordinate> {
        match self.authorization {
            Authorization::Denied => None,
            _ => self.latest,
        }
    }
}
