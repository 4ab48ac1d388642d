//! Host clock adapter.
//!
//! Produces [`Moment`]s for the session: a monotonic reading from
//! `std::time::Instant` (timers and the spawn-delay guard) paired with the
//! local wall clock from `chrono` (schedule windows).

use std::time::Instant;

use chrono::{Local, NaiveDate, NaiveDateTime};

use crate::timers::Moment;

pub struct SessionClock {
    start: Instant,
}

impl Default for SessionClock {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Seconds since the clock was created (monotonic).
    pub fn uptime_secs(&self) -> u64 {
        self.start.elapsed().as_secs()
    }

    /// Local wall-clock time, without a zone.
    pub fn wall(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }

    pub fn today(&self) -> NaiveDate {
        self.wall().date()
    }

    pub fn now(&self) -> Moment {
        Moment::new(self.start.elapsed(), self.wall())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn monotonic_part_never_goes_backwards() {
        let clock = SessionClock::new();
        let a = clock.now();
        let b = clock.now();
        assert!(b.mono >= a.mono);
    }

    #[test]
    fn uptime_starts_at_zero() {
        let clock = SessionClock::new();
        assert_eq!(clock.uptime_secs(), 0);
    }

    #[test]
    fn today_matches_wall_date() {
        let clock = SessionClock::new();
        let today = clock.today();
        let wall = clock.wall().date();
        // Midnight may pass between the two reads.
        assert!(wall == today || wall == today.succ_opt().unwrap());
    }
}
