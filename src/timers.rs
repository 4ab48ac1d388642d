//! Deadline timers polled by the event loop.
//!
//! The session owns one slot per [`TimerKind`].  Arming a slot replaces any
//! previous deadline in it; cancelling clears it.  Nothing sleeps: the loop
//! calls [`Timers::poll`] with the current monotonic time and receives the
//! timers that came due, oldest deadline first.
//!
//! ```text
//!   arm_once(CreatureSpawn, now, 5 s) ──┐
//!   arm_periodic(HungerTick, now, 15 s) ┼──▶ [slots] ──poll(now)──▶ Fired{kind,count}
//!   cancel(kind) ───────────────────────┘
//! ```

use core::time::Duration;

use chrono::NaiveDateTime;
use heapless::Vec as HVec;
use log::debug;

/// A point in time as seen by the session: monotonic offset for timers,
/// wall clock for the presence gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Moment {
    pub mono: Duration,
    pub wall: NaiveDateTime,
}

impl Moment {
    pub fn new(mono: Duration, wall: NaiveDateTime) -> Self {
        Self { mono, wall }
    }

    /// The same instant advanced by `by` on both clocks.
    pub fn advanced(&self, by: Duration) -> Self {
        let wall = chrono::Duration::from_std(by)
            .ok()
            .and_then(|d| self.wall.checked_add_signed(d))
            .unwrap_or(self.wall);
        Self {
            mono: self.mono + by,
            wall,
        }
    }
}

// ═══════════════════════════════════════════════════════════════
//  Timer identity
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TimerKind {
    /// Decoy anchored; creature load follows when this fires.
    CreatureSpawn = 0,
    /// Creature entrance animation finished.
    EntranceAnimation = 1,
    /// Periodic hunger tick.
    HungerTick = 2,
    /// Coarse presence-gate re-evaluation.
    PresenceRefresh = 3,
}

impl TimerKind {
    pub const COUNT: usize = 4;

    pub const ALL: [TimerKind; Self::COUNT] = [
        TimerKind::CreatureSpawn,
        TimerKind::EntranceAnimation,
        TimerKind::HungerTick,
        TimerKind::PresenceRefresh,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::CreatureSpawn => "creature-spawn",
            Self::EntranceAnimation => "entrance-animation",
            Self::HungerTick => "hunger-tick",
            Self::PresenceRefresh => "presence-refresh",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerMode {
    /// Fire once, then the slot is cleared.
    OneShot,
    /// Fire every `period` until cancelled.
    Periodic { period: Duration },
}

/// A timer that came due during [`Timers::poll`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fired {
    pub kind: TimerKind,
    /// Number of periods elapsed since the last poll (always 1 for one-shots).
    pub count: u32,
}

#[derive(Debug, Clone, Copy)]
struct TimerEntry {
    deadline: Duration,
    mode: TimerMode,
}

// ═══════════════════════════════════════════════════════════════
//  Timer engine
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct Timers {
    slots: [Option<TimerEntry>; TimerKind::COUNT],
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fire `kind` once, `delay` after `now`.
    pub fn arm_once(&mut self, kind: TimerKind, now: Duration, delay: Duration) {
        debug!("timers: arm {} in {:?}", kind.name(), delay);
        self.slots[kind as usize] = Some(TimerEntry {
            deadline: now + delay,
            mode: TimerMode::OneShot,
        });
    }

    /// Fire `kind` every `period`, first at `now + period`.
    pub fn arm_periodic(&mut self, kind: TimerKind, now: Duration, period: Duration) {
        let period = period.max(Duration::from_millis(1));
        debug!("timers: arm {} every {:?}", kind.name(), period);
        self.slots[kind as usize] = Some(TimerEntry {
            deadline: now + period,
            mode: TimerMode::Periodic { period },
        });
    }

    /// Returns `true` if the slot was armed.
    pub fn cancel(&mut self, kind: TimerKind) -> bool {
        let was_armed = self.slots[kind as usize].take().is_some();
        if was_armed {
            debug!("timers: cancel {}", kind.name());
        }
        was_armed
    }

    pub fn is_armed(&self, kind: TimerKind) -> bool {
        self.slots[kind as usize].is_some()
    }

    pub fn deadline(&self, kind: TimerKind) -> Option<Duration> {
        self.slots[kind as usize].map(|e| e.deadline)
    }

    /// Earliest deadline across all slots.
    pub fn next_deadline(&self) -> Option<Duration> {
        self.slots.iter().flatten().map(|e| e.deadline).min()
    }

    /// Collect every timer due at `now`, oldest deadline first.
    ///
    /// One-shots are cleared.  Periodic timers report how many periods have
    /// elapsed and are rescheduled on their original cadence.
    pub fn poll(&mut self, now: Duration) -> HVec<Fired, { TimerKind::COUNT }> {
        let mut due: HVec<(Duration, Fired), { TimerKind::COUNT }> = HVec::new();

        for kind in TimerKind::ALL {
            let slot = &mut self.slots[kind as usize];
            let Some(entry) = *slot else { continue };
            if entry.deadline > now {
                continue;
            }
            let count = match entry.mode {
                TimerMode::OneShot => {
                    *slot = None;
                    1
                }
                TimerMode::Periodic { period } => {
                    let behind = (now - entry.deadline).as_nanos() / period.as_nanos();
                    let count = u32::try_from(behind + 1).unwrap_or(u32::MAX);
                    *slot = Some(TimerEntry {
                        deadline: entry.deadline + period * count,
                        mode: entry.mode,
                    });
                    count
                }
            };
            // Capacity equals the slot count, so this cannot overflow.
            let _ = due.push((entry.deadline, Fired { kind, count }));
        }

        due.sort_unstable_by_key(|(deadline, f)| (*deadline, f.kind as u8));
        due.into_iter().map(|(_, f)| f).collect()
    }
}
