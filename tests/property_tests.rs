//! Property tests for the presence gate, the timer wheel and whole-session
//! robustness under arbitrary input sequences.

#[path = "integration/mock_io.rs"]
mod mock_io;

use std::time::Duration;

use proptest::prelude::*;

use fatcat::app::commands::SessionCommand;
use fatcat::assets::AssetSlot;
use fatcat::config::ToyConfig;
use fatcat::error::LoadError;
use fatcat::fsm::Phase;
use fatcat::model::{Coordinate, TapInput};
use fatcat::presence::{self, PRESENCE_RADIUS_M};
use fatcat::timers::{TimerKind, Timers};

use mock_io::{Harness, STATION, SceneCall, station_store, three_pm};

fn arb_position() -> impl Strategy<Value = Coordinate> {
    (-0.05f64..0.05, -0.05f64..0.05).prop_map(|(dlat, dlon)| {
        Coordinate::new(STATION.latitude + dlat, STATION.longitude + dlon)
    })
}

// ── Presence gate ─────────────────────────────────────────────

proptest! {
    /// Same inputs, same verdict; and the verdict agrees with the distance.
    #[test]
    fn gate_is_pure_and_matches_distance(
        position in arb_position(),
        minutes in 0i64..(24 * 60),
    ) {
        let (store, _) = station_store();
        let now = three_pm().wall.date().and_hms_opt(0, 0, 0).unwrap()
            + chrono::Duration::minutes(minutes);

        let first = presence::evaluate(&store, now, Some(position), PRESENCE_RADIUS_M);
        let second = presence::evaluate(&store, now, Some(position), PRESENCE_RADIUS_M);
        prop_assert_eq!(first, second);

        let in_window = (14 * 60..=17 * 60).contains(&minutes);
        let near = position.distance_m(&STATION) <= PRESENCE_RADIUS_M;
        prop_assert_eq!(first.is_present(), in_window && near);
    }

    #[test]
    fn no_position_is_never_present(minutes in 0i64..(24 * 60)) {
        let (store, _) = station_store();
        let now = three_pm().wall.date().and_hms_opt(0, 0, 0).unwrap()
            + chrono::Duration::minutes(minutes);
        prop_assert!(!presence::is_present(&store, now, None));
    }
}

// ── Timers ────────────────────────────────────────────────────

proptest! {
    /// Fired timers come out in deadline order and never early.
    #[test]
    fn timers_fire_in_deadline_order(
        delays in proptest::collection::vec(1u64..10_000, TimerKind::COUNT),
        poll_at in 0u64..12_000,
    ) {
        let mut timers = Timers::new();
        for (kind, delay) in TimerKind::ALL.into_iter().zip(&delays) {
            timers.arm_once(kind, Duration::ZERO, Duration::from_millis(*delay));
        }
        let now = Duration::from_millis(poll_at);
        let fired = timers.poll(now);

        let deadlines: Vec<u64> = fired
            .iter()
            .map(|f| delays[f.kind as usize])
            .collect();
        prop_assert!(deadlines.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(deadlines.iter().all(|d| *d <= poll_at));
        let due = delays.iter().filter(|d| **d <= poll_at).count();
        prop_assert_eq!(fired.len(), due);
        for f in &fired {
            prop_assert!(!timers.is_armed(f.kind));
        }
    }
}

// ── Whole session ─────────────────────────────────────────────

#[derive(Debug, Clone)]
enum Op {
    Tap,
    Miss,
    Feed,
    Refill,
    Teardown,
    FailNext(AssetSlot),
    Wait(u64),
}

fn arb_op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => Just(Op::Tap),
        1 => Just(Op::Miss),
        2 => Just(Op::Feed),
        1 => Just(Op::Refill),
        1 => Just(Op::Teardown),
        1 => prop_oneof![Just(AssetSlot::Decoy), Just(AssetSlot::Creature)].prop_map(Op::FailNext),
        5 => (0u64..8_000).prop_map(Op::Wait),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    /// For any input sequence the creature is anchored no sooner than the
    /// spawn delay after its decoy, the bag never goes negative, and
    /// teardown always leaves an empty scene.
    #[test]
    fn session_invariants_hold(ops in proptest::collection::vec(arb_op(), 1..60)) {
        let (mut h, loader, _) = Harness::at_station(ToyConfig::default());
        let delay = Duration::from_millis(h.session.config().spawn_delay_ms);
        let mut decoy_at: Option<Duration> = None;

        for op in ops {
            let seen = h.io.calls.len();
            match op {
                Op::Tap => h.tap(),
                Op::Miss => h.cmd(SessionCommand::Tap(TapInput::miss())),
                Op::Feed => h.cmd(SessionCommand::Feed),
                Op::Refill => h.cmd(SessionCommand::RefillNiboshi),
                Op::Teardown => {
                    h.cmd(SessionCommand::Teardown);
                    prop_assert_eq!(h.session.phase(), Phase::Idle);
                    prop_assert!(h.io.live.is_empty());
                    prop_assert!(!h.session.hunger_running());
                    decoy_at = None;
                }
                Op::FailNext(slot) => {
                    let model = match slot {
                        AssetSlot::Decoy => "fish",
                        AssetSlot::Creature => "cat",
                    };
                    loader.fail_next(model, LoadError::NotFound(model.into()));
                }
                Op::Wait(ms) => h.advance(ms),
            }
            h.poll();

            for call in &h.io.calls[seen..] {
                if let SceneCall::Add { model_id, .. } = call {
                    match model_id.as_str() {
                        "fish" => decoy_at = Some(h.now.mono),
                        "cat" => {
                            let placed = decoy_at.expect("creature anchored without a decoy");
                            prop_assert!(h.now.mono >= placed + delay);
                        }
                        other => prop_assert!(false, "unexpected model {}", other),
                    }
                }
            }
            prop_assert!(h.io.live.len() <= 2);
            prop_assert!(h.session.niboshi() <= 5 + 3 * 60);
        }
    }
}
