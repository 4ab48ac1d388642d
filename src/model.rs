//! Domain records shared by the store, the presence gate and the session.
//!
//! Everything here is plain data with serde derives so the persistence
//! adapter can write whole collections as JSON blobs.  Field names are
//! camelCase on the wire to stay compatible with blobs written by the
//! mobile client.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use geo::{HaversineDistance, Point};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TimeParseError;

pub type CatId = Uuid;
pub type CatTypeId = u32;
pub type LocationId = Uuid;
pub type ScheduleId = Uuid;

/// Display name used when a schedule points at a cat that no longer exists.
pub const UNKNOWN_CAT_NAME: &str = "Unknown Cat";
/// Display name used when a schedule points at a missing location.
pub const UNKNOWN_PLACE_NAME: &str = "Unknown Place";

/// Size a freshly created cat starts at.
pub const DEFAULT_CAT_SIZE: f64 = 1.0;

// ---------------------------------------------------------------------------
// Cat
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cat {
    pub id: CatId,
    pub name: String,
    pub is_hungry: bool,
    /// Never negative; only grows through [`Cat::feed`].
    pub size: f64,
    pub type_id: CatTypeId,
    #[serde(default)]
    pub feed_count: u32,
}

impl Cat {
    pub fn new(name: impl Into<String>, type_id: CatTypeId) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            is_hungry: true,
            size: DEFAULT_CAT_SIZE,
            type_id,
            feed_count: 0,
        }
    }

    /// Stand-in record for a schedule whose cat was deleted.
    pub fn unknown(id: CatId) -> Self {
        Self {
            id,
            name: UNKNOWN_CAT_NAME.to_string(),
            is_hungry: true,
            size: DEFAULT_CAT_SIZE,
            type_id: 0,
            feed_count: 0,
        }
    }

    pub(crate) fn feed(&mut self, increment: f64) {
        self.feed_count = self.feed_count.saturating_add(1);
        self.size = (self.size + increment.max(0.0)).max(0.0);
        self.is_hungry = false;
    }

    /// Flip a fed cat back to hungry.  Returns `true` if the flag changed.
    pub(crate) fn make_hungry(&mut self) -> bool {
        if self.is_hungry {
            return false;
        }
        self.is_hungry = true;
        true
    }
}

/// Immutable catalog entry describing a breed / coat.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatType {
    pub id: CatTypeId,
    /// Icon identifier understood by the UI layer.
    pub icon: String,
    pub label: String,
}

// ---------------------------------------------------------------------------
// Location & coordinates
// ---------------------------------------------------------------------------

/// WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle (haversine) distance in metres.
    pub fn distance_m(&self, other: &Coordinate) -> f64 {
        let a = Point::new(self.longitude, self.latitude);
        let b = Point::new(other.longitude, other.latitude);
        a.haversine_distance(&b)
    }

    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && (-90.0..=90.0).contains(&self.latitude)
            && (-180.0..=180.0).contains(&self.longitude)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub id: LocationId,
    pub name: String,
    #[serde(default)]
    pub address: Option<String>,
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }
}

/// Human-friendly distance label: `"<0.4km"` below one kilometre,
/// `"2.3km"` otherwise.
pub fn format_distance_km(distance_m: f64) -> String {
    let km = distance_m.max(0.0) / 1000.0;
    if km < 1.0 {
        format!("<{:.1}km", km)
    } else {
        format!("{:.1}km", km)
    }
}

// ---------------------------------------------------------------------------
// Schedule
// ---------------------------------------------------------------------------

/// When and where a cat may appear.  Times are wall-clock `"HH:mm"`
/// strings on `date`; windows never cross midnight.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schedule {
    pub id: ScheduleId,
    pub cat_id: CatId,
    pub location_id: LocationId,
    pub date: NaiveDate,
    pub start_time: String,
    pub end_time: String,
}

impl Schedule {
    pub fn new(
        cat_id: CatId,
        location_id: LocationId,
        date: NaiveDate,
        start_time: impl Into<String>,
        end_time: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            cat_id,
            location_id,
            date,
            start_time: start_time.into(),
            end_time: end_time.into(),
        }
    }

    /// The schedule's window as two instants on `date`.
    ///
    /// Fails if either time is malformed or the window is empty/inverted.
    pub fn window(&self) -> Result<(NaiveDateTime, NaiveDateTime), TimeParseError> {
        let start = parse_wall_time(&self.start_time)?;
        let end = parse_wall_time(&self.end_time)?;
        if start >= end {
            return Err(TimeParseError::EmptyWindow {
                start: self.start_time.clone(),
                end: self.end_time.clone(),
            });
        }
        Ok((self.date.and_time(start), self.date.and_time(end)))
    }

    /// `true` if `now` falls inside the window (both ends inclusive).
    /// Malformed schedules never match.
    pub fn is_active_at(&self, now: NaiveDateTime) -> bool {
        if now.date() != self.date {
            return false;
        }
        match self.window() {
            Ok((start, end)) => start <= now && now <= end,
            Err(_) => false,
        }
    }
}

/// Parse a strict `"HH:mm"` wall-clock time.
pub fn parse_wall_time(raw: &str) -> Result<NaiveTime, TimeParseError> {
    let trimmed = raw.trim();
    let (h, m) = trimmed
        .split_once(':')
        .ok_or_else(|| TimeParseError::Malformed(raw.to_string()))?;
    if h.is_empty() || h.len() > 2 || m.len() != 2 {
        return Err(TimeParseError::Malformed(raw.to_string()));
    }
    let hour: u32 = h
        .parse()
        .map_err(|_| TimeParseError::Malformed(raw.to_string()))?;
    let minute: u32 = m
        .parse()
        .map_err(|_| TimeParseError::Malformed(raw.to_string()))?;
    NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| TimeParseError::OutOfRange(raw.to_string()))
}

// ---------------------------------------------------------------------------
// Spatial input
// ---------------------------------------------------------------------------

/// 2D point on the camera view, in screen pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPoint {
    pub x: f32,
    pub y: f32,
}

/// World-space pose of a detected surface or an anchor.
/// `yaw` is the rotation about the vertical axis, in radians.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Pose {
    pub position: [f32; 3],
    pub yaw: f32,
}

impl Pose {
    pub const fn at(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
            yaw: 0.0,
        }
    }

    /// Pose displaced by `offset` expressed in this pose's local frame,
    /// re-oriented to face `yaw`.
    pub fn offset_by(&self, offset: [f32; 3], yaw: f32) -> Pose {
        let (sin, cos) = self.yaw.sin_cos();
        let [ox, oy, oz] = offset;
        let [x, y, z] = self.position;
        Pose {
            position: [x + ox * cos + oz * sin, y + oy, z - ox * sin + oz * cos],
            yaw,
        }
    }
}

/// A tap on the AR view plus the hit-test result against detected planes.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TapInput {
    pub screen: ScreenPoint,
    /// `None` when the ray did not hit a real-world surface.
    pub hit: Option<Pose>,
}

impl TapInput {
    pub fn on_surface(pose: Pose) -> Self {
        Self {
            screen: ScreenPoint::default(),
            hit: Some(pose),
        }
    }

    pub fn miss() -> Self {
        Self::default()
    }
}
