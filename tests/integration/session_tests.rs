//! Session command handling beyond the core placement flow: permissions,
//! capture, runtime config, manual retries and the info-bar snapshot.

use super::mock_io::{FAR_AWAY, Harness, NEARBY, station_store, three_pm};

use fatcat::app::commands::SessionCommand;
use fatcat::app::events::{SessionEvent, StatusMessage};
use fatcat::assets::AssetSlot;
use fatcat::config::ToyConfig;
use fatcat::error::{CaptureError, LoadError};
use fatcat::fsm::Phase;
use fatcat::presence::{Authorization, PresenceVerdict};
use fatcat::timers::TimerKind;

use super::mock_io::ImmediateLoader;

#[test]
fn start_emits_started_in_idle() {
    let (store, _) = station_store();
    let h = Harness::start(ToyConfig::default(), ImmediateLoader::new(), store, three_pm());
    assert_eq!(h.sink.events.first(), Some(&SessionEvent::Started(Phase::Idle)));
    assert!(h.session.is_timer_armed(TimerKind::PresenceRefresh));
    assert_eq!(h.session.verdict(), PresenceVerdict::NoPosition);
}

#[test]
fn denied_location_closes_the_gate() {
    let (mut h, loader, _) = Harness::at_station(ToyConfig::default());
    assert!(h.session.is_present());

    h.cmd(SessionCommand::AuthorizationChanged(Authorization::Denied));
    assert!(!h.session.is_present());
    assert!(h.sink.statuses().contains(&&StatusMessage::LocationDenied));

    // Fixes are ignored until access comes back.
    h.cmd(SessionCommand::PositionUpdated(NEARBY));
    assert!(!h.session.is_present());
    h.tap();
    assert_eq!(h.sink.last_status(), Some(&StatusMessage::NotHere));
    assert_eq!(loader.request_count("fish"), 0);

    h.stand_at(NEARBY);
    assert!(h.session.is_present());
}

#[test]
fn gate_closes_when_the_window_ends() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    assert!(h.session.is_present());

    // Two hours later it is 17:00:00, still inside; the refresh after that closes it.
    h.advance(2 * 60 * 60 * 1000);
    assert!(h.session.is_present());
    h.advance(30_000);
    assert!(!h.session.is_present());
}

#[test]
fn invalid_coordinates_are_ignored() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    h.cmd(SessionCommand::PositionUpdated(fatcat::model::Coordinate::new(
        f64::NAN,
        0.0,
    )));
    assert!(h.session.is_present());
}

#[test]
fn capture_reports_saved_and_failed() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    h.cmd(SessionCommand::Capture);
    assert_eq!(
        h.sink.last_status(),
        Some(&StatusMessage::CaptureSaved("mock://frame".to_string()))
    );

    h.io.capture_result = Some(Err(CaptureError::NoFrame));
    h.cmd(SessionCommand::Capture);
    assert!(matches!(
        h.sink.last_status(),
        Some(StatusMessage::CaptureFailed(_))
    ));
    assert_eq!(h.session.phase(), Phase::Idle);
}

#[test]
fn creature_failure_falls_back_and_tap_retries() {
    let (mut h, loader, _) = Harness::at_station(ToyConfig::default());
    loader.fail_next("cat", LoadError::NotFound("cat".into()));

    h.tap();
    h.poll();
    h.advance(5_000);
    h.poll();
    assert_eq!(h.session.phase(), Phase::DecoyPlaced);
    assert!(matches!(
        h.sink.last_status(),
        Some(StatusMessage::LoadFailed {
            slot: AssetSlot::Creature,
            ..
        })
    ));
    assert!(!h.session.is_timer_armed(TimerKind::CreatureSpawn));

    h.tap();
    assert_eq!(h.session.phase(), Phase::CreatureRequested);
    assert_eq!(loader.request_count("cat"), 2);
    h.poll();
    assert_eq!(h.session.phase(), Phase::CreaturePlaced);
}

#[test]
fn tap_after_arrival_shows_feed_prompt() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    h.run_to_ready();
    h.sink.clear();
    h.tap();
    assert_eq!(h.sink.statuses(), vec![&StatusMessage::FeedPrompt]);
    assert_eq!(h.session.phase(), Phase::Ready);
}

#[test]
fn phase_changes_are_reported_in_order() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    h.run_to_ready();
    let phases: Vec<(Phase, Phase)> = h
        .sink
        .events
        .iter()
        .filter_map(|e| match e {
            SessionEvent::PhaseChanged { from, to } => Some((*from, *to)),
            _ => None,
        })
        .collect();
    assert_eq!(
        phases,
        vec![
            (Phase::Idle, Phase::DecoyRequested),
            (Phase::DecoyRequested, Phase::DecoyPlaced),
            (Phase::DecoyPlaced, Phase::CreatureRequested),
            (Phase::CreatureRequested, Phase::CreaturePlaced),
            (Phase::CreaturePlaced, Phase::Ready),
        ]
    );
}

#[test]
fn update_config_applies_valid_and_rejects_invalid() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());

    let bad = ToyConfig {
        spawn_delay_ms: 0,
        ..Default::default()
    };
    h.cmd(SessionCommand::UpdateConfig(bad));
    assert_eq!(h.session.config().spawn_delay_ms, 5_000);

    let quick = ToyConfig {
        spawn_delay_ms: 1_000,
        ..Default::default()
    };
    h.cmd(SessionCommand::UpdateConfig(quick));
    h.tap();
    h.poll();
    h.advance(1_000);
    assert_eq!(h.session.phase(), Phase::CreatureRequested);
}

#[test]
fn smaller_radius_closes_the_gate_on_next_refresh() {
    let (mut h, _, _) = Harness::at_station(ToyConfig::default());
    let tight = ToyConfig {
        presence_radius_m: 100.0,
        ..Default::default()
    };
    h.cmd(SessionCommand::UpdateConfig(tight));
    h.advance(30_000);
    assert!(!h.session.is_present());
    assert!(matches!(h.session.verdict(), PresenceVerdict::TooFar { .. }));
}

#[test]
fn snapshot_tracks_the_session() {
    let (mut h, _, cat_id) = Harness::at_station(ToyConfig::default());
    let idle = h.session.snapshot(&h.store);
    assert_eq!(idle.phase, Phase::Idle);
    assert!(idle.present);
    assert!(idle.distance_m.unwrap() < 500.0);
    assert_eq!(idle.authorization, Authorization::Granted);
    assert!(idle.active_cat.is_none());

    h.run_to_ready();
    h.cmd(SessionCommand::Feed);
    let ready = h.session.snapshot(&h.store);
    assert_eq!(ready.phase, Phase::Ready);
    assert_eq!(ready.niboshi, 4);
    assert_eq!(ready.active_cat.as_ref().map(|c| c.id), Some(cat_id));
    assert_eq!(ready.active_cat.unwrap().feed_count, 1);
    assert!(ready.decoy_anchor.is_some());
    assert!(ready.creature_anchor.is_some());
    assert!(ready.hunger_running);
}

#[test]
fn far_tap_then_walk_in_then_tap_works() {
    let (store, _) = station_store();
    let loader = ImmediateLoader::new();
    let mut h = Harness::start(ToyConfig::default(), loader.clone(), store, three_pm());
    h.stand_at(FAR_AWAY);
    h.tap();
    assert_eq!(h.session.phase(), Phase::Idle);

    h.cmd(SessionCommand::PositionUpdated(NEARBY));
    h.tap();
    h.poll();
    assert_eq!(h.session.phase(), Phase::DecoyPlaced);
}
