//! Hunger clock and the niboshi bag.
//!
//! The clock runs only while a creature is on screen.  It is started once
//! when the creature is anchored and stopped once on teardown; the tick
//! itself is a periodic [`TimerKind::HungerTick`] owned by the session's
//! [`Timers`].

use core::time::Duration;

use log::{debug, info};

use crate::error::FeedError;
use crate::model::Cat;
use crate::timers::{TimerKind, Timers};

// ---------------------------------------------------------------------------
// Clock
// ---------------------------------------------------------------------------

#[derive(Debug, Default)]
pub struct HungerClock {
    running: bool,
    /// Lifetime count of start() calls, for diagnostics.
    starts: u32,
}

impl HungerClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arm the periodic tick.  A second start while running is ignored.
    pub fn start(&mut self, timers: &mut Timers, now: Duration, interval: Duration) -> bool {
        if self.running {
            debug!("hunger: already running");
            return false;
        }
        timers.arm_periodic(TimerKind::HungerTick, now, interval);
        self.running = true;
        self.starts += 1;
        info!("hunger: clock started ({:?})", interval);
        true
    }

    /// Cancel the periodic tick.  Stopping a stopped clock is a no-op.
    pub fn stop(&mut self, timers: &mut Timers) -> bool {
        if !self.running {
            return false;
        }
        timers.cancel(TimerKind::HungerTick);
        self.running = false;
        info!("hunger: clock stopped");
        true
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn starts(&self) -> u32 {
        self.starts
    }
}

/// One hunger tick against `cat`.  Returns `true` if it turned hungry.
pub fn on_tick(cat: &mut Cat) -> bool {
    let flipped = cat.make_hungry();
    if flipped {
        info!("hunger: {} is hungry", cat.name);
    }
    flipped
}

// ---------------------------------------------------------------------------
// Niboshi
// ---------------------------------------------------------------------------

/// What a successful feeding did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedReceipt {
    pub niboshi_left: u32,
    pub new_size: f64,
    pub feed_count: u32,
}

/// The user's supply of dried sardines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NiboshiBag {
    count: u32,
}

impl NiboshiBag {
    pub fn new(count: u32) -> Self {
        Self { count }
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    /// Spend one niboshi on `cat`.  With an empty bag nothing changes.
    pub fn feed(&mut self, cat: &mut Cat, size_increment: f64) -> Result<FeedReceipt, FeedError> {
        if self.count == 0 {
            return Err(FeedError::NoNiboshi);
        }
        self.count -= 1;
        cat.feed(size_increment);
        info!(
            "hunger: fed {} (size {:.2}, {} niboshi left)",
            cat.name, cat.size, self.count
        );
        Ok(FeedReceipt {
            niboshi_left: self.count,
            new_size: cat.size,
            feed_count: cat.feed_count,
        })
    }

    pub fn refill(&mut self, amount: u32) -> u32 {
        self.count = self.count.saturating_add(amount);
        self.count
    }
}
