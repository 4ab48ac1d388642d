//! Unified error types for the fatcat core.
//!
//! Each subsystem has its own error enum.  The session's fallible
//! operations (feeding, capture, runtime config) return the crate-level
//! [`Error`] and turn it into a status message or a log line.  None of
//! these are fatal.

use core::fmt;

use crate::model::{CatId, LocationId, ScheduleId};

// ---------------------------------------------------------------------------
// Top-level error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// The store rejected a lookup or mutation.
    Store(StoreError),
    /// Feeding was refused.
    Feed(FeedError),
    /// Frame capture failed.
    Capture(CaptureError),
    /// Configuration is invalid or could not be loaded.
    Config(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Store(e) => write!(f, "store: {e}"),
            Self::Feed(e) => write!(f, "feed: {e}"),
            Self::Capture(e) => write!(f, "capture: {e}"),
            Self::Config(msg) => write!(f, "config: {msg}"),
        }
    }
}

impl std::error::Error for Error {}

// ---------------------------------------------------------------------------
// Asset loading
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadError {
    /// No asset with that name exists in the catalog.
    NotFound(String),
    /// The asset exists but could not be decoded.
    Decode { model_id: String, cause: String },
    /// I/O failure while reading the asset.
    Io { model_id: String, cause: String },
    /// The load was superseded or torn down before it finished.
    Cancelled,
}

impl LoadError {
    /// Cause text suitable for a status line.
    pub fn cause(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotFound(id) => write!(f, "asset '{id}' not found"),
            Self::Decode { model_id, cause } => write!(f, "asset '{model_id}' is corrupt: {cause}"),
            Self::Io { model_id, cause } => write!(f, "asset '{model_id}' unreadable: {cause}"),
            Self::Cancelled => write!(f, "load cancelled"),
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// Store
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq)]
pub enum StoreError {
    /// The schedule references a cat that is not in the store.
    UnknownCat(CatId),
    /// No schedule with that id.
    UnknownSchedule(ScheduleId),
    /// A location with the same id but different contents already exists.
    LocationConflict(LocationId),
    /// The schedule's `location_id` names a different location than the one
    /// supplied with it.
    LocationMismatch {
        schedule_location: LocationId,
        location: LocationId,
    },
    /// Start/end did not form a valid same-day window.
    InvalidWindow(TimeParseError),
    /// Coordinates outside the WGS84 range.
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCat(id) => write!(f, "unknown cat {id}"),
            Self::UnknownSchedule(id) => write!(f, "unknown schedule {id}"),
            Self::LocationConflict(id) => write!(f, "location {id} already exists with other data"),
            Self::LocationMismatch {
                schedule_location,
                location,
            } => write!(
                f,
                "schedule points at location {schedule_location} but {location} was supplied"
            ),
            Self::InvalidWindow(e) => write!(f, "invalid window: {e}"),
            Self::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(f, "invalid coordinate ({latitude}, {longitude})"),
        }
    }
}

impl std::error::Error for StoreError {}

impl From<StoreError> for Error {
    fn from(e: StoreError) -> Self {
        Self::Store(e)
    }
}

impl From<TimeParseError> for StoreError {
    fn from(e: TimeParseError) -> Self {
        Self::InvalidWindow(e)
    }
}

// ---------------------------------------------------------------------------
// Feeding
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedError {
    /// Niboshi count is zero.
    NoNiboshi,
    /// No creature on screen to feed.
    NotReady,
}

impl fmt::Display for FeedError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoNiboshi => write!(f, "no niboshi left"),
            Self::NotReady => write!(f, "no cat to feed"),
        }
    }
}

impl std::error::Error for FeedError {}

impl From<FeedError> for Error {
    fn from(e: FeedError) -> Self {
        Self::Feed(e)
    }
}

// ---------------------------------------------------------------------------
// Time parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimeParseError {
    /// Not of the form `HH:mm`.
    Malformed(String),
    /// Numeric but not a valid time of day.
    OutOfRange(String),
    /// Start is not strictly before end.
    EmptyWindow { start: String, end: String },
}

impl fmt::Display for TimeParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Malformed(s) => write!(f, "'{s}' is not HH:mm"),
            Self::OutOfRange(s) => write!(f, "'{s}' is not a time of day"),
            Self::EmptyWindow { start, end } => write!(f, "window {start}-{end} is empty"),
        }
    }
}

impl std::error::Error for TimeParseError {}

// ---------------------------------------------------------------------------
// Capture & audio
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureError {
    /// The renderer has no frame to hand out.
    NoFrame,
    /// Writing the image failed.
    Write(String),
}

impl fmt::Display for CaptureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoFrame => write!(f, "no frame available"),
            Self::Write(cause) => write!(f, "write failed: {cause}"),
        }
    }
}

impl std::error::Error for CaptureError {}

impl From<CaptureError> for Error {
    fn from(e: CaptureError) -> Self {
        Self::Capture(e)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    /// No sound registered under that name.
    UnknownSound(String),
    /// Output device unavailable.
    Unavailable,
}

impl fmt::Display for AudioError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownSound(name) => write!(f, "unknown sound '{name}'"),
            Self::Unavailable => write!(f, "audio unavailable"),
        }
    }
}

impl std::error::Error for AudioError {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

pub type Result<T> = core::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    fn through_question_mark(e: FeedError) -> Result<()> {
        Err::<(), _>(e)?;
        Ok(())
    }

    #[test]
    fn subsystem_errors_convert_and_prefix() {
        let err = through_question_mark(FeedError::NoNiboshi).unwrap_err();
        assert_eq!(err, Error::Feed(FeedError::NoNiboshi));
        assert_eq!(err.to_string(), "feed: no niboshi left");

        let err = Error::from(CaptureError::NoFrame);
        assert_eq!(err.to_string(), "capture: no frame available");
    }

    #[test]
    fn time_errors_become_invalid_windows() {
        let err = StoreError::from(TimeParseError::Malformed("9h".into()));
        assert!(matches!(err, StoreError::InvalidWindow(_)));
        assert_eq!(Error::from(err).to_string(), "store: invalid window: '9h' is not HH:mm");
    }
}
