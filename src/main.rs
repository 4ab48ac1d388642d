//! fatcat: headless console driver.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  CatalogLoader    HeadlessScene        FileStorage   LogSink   │
//! │  (AssetLoader)    (Scene+Audio+Capture) (Config+KV)  (Events)  │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              ArSession (pure logic)                    │    │
//! │  │  Presence gate · Placement FSM · Hunger clock          │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! │                                                                │
//! │  stdin thread ──▶ CONSOLE_CHANNEL ──▶ event loop (20 ms tick)  │
//! └────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Usage: `fatcat [DATA_DIR]` (default `./fatcat-data`).  `RUST_LOG`
//! controls verbosity.

#![deny(unused_must_use)]

use std::fs;
use std::path::{Path, PathBuf};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{info, warn};

use fatcat::adapters::catalog_loader::CatalogLoader;
use fatcat::adapters::headless_scene::HeadlessScene;
use fatcat::adapters::kv_store::FileStorage;
use fatcat::adapters::log_sink::LogEventSink;
use fatcat::adapters::time::SessionClock;
use fatcat::app::commands::SessionCommand;
use fatcat::app::ports::{ConfigPort, StoragePort};
use fatcat::app::service::ArSession;
use fatcat::config::ToyConfig;
use fatcat::console::{self, CONSOLE_CHANNEL, ConsoleCommand};
use fatcat::model::format_distance_km;
use fatcat::store::{Persister, STORE_NAMESPACE, ScheduleStore, StoreChange};
use fatcat::timers::Moment;

const DEFAULT_DATA_DIR: &str = "fatcat-data";
const TICK: Duration = Duration::from_millis(20);

/// Descriptors written on first run so the default model ids resolve.
const SEED_MODELS: [(&str, &str); 2] = [
    ("fish", r#"{ "mesh": "fish.usdz", "animations": [] }"#),
    ("cat", r#"{ "mesh": "cat.usdz", "animations": ["entrance"] }"#),
];

fn seed_models(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).with_context(|| format!("creating {}", dir.display()))?;
    for (name, body) in SEED_MODELS {
        let path = dir.join(format!("{name}.json"));
        if !path.exists() {
            fs::write(&path, body).with_context(|| format!("writing {}", path.display()))?;
            info!("Seeded model descriptor {}", path.display());
        }
    }
    Ok(())
}

fn print_status(session: &ArSession<CatalogLoader>, store: &ScheduleStore, now: Moment) {
    let snap = session.snapshot(store);
    let distance = snap
        .distance_m
        .map_or_else(|| "-".to_string(), format_distance_km);
    let cat = snap
        .active_cat
        .as_ref()
        .map_or_else(|| "-".to_string(), |c| format!("{} (size {:.2}, fed {}x)", c.name, c.size, c.feed_count));
    info!(
        "STATUS | phase={:?} | present={} ({}) | auth={:?} | niboshi={} | cat={} | hunger={}",
        snap.phase,
        snap.present,
        distance,
        snap.authorization,
        snap.niboshi,
        cat,
        if snap.hunger_running { "running" } else { "idle" },
    );
    for (day, schedules) in store.grouped_by_date() {
        for schedule in schedules {
            let row = store.summarize(schedule);
            let active = if schedule.is_active_at(now.wall) { "*" } else { " " };
            info!(
                "  {} {} {}-{} {} @ {}",
                active, day, row.start_time, row.end_time, row.cat_name, row.location_name
            );
        }
    }
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    info!("╔══════════════════════════════════════╗");
    info!("║  fatcat v{}                        ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    // ── 1. Storage + config ───────────────────────────────────
    let data_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from(DEFAULT_DATA_DIR), PathBuf::from);
    let mut storage = FileStorage::open(&data_dir)
        .with_context(|| format!("opening data directory {}", data_dir.display()))?;

    let config = match storage.load() {
        Ok(cfg) => cfg,
        Err(e) => {
            warn!("Config load failed ({}), using defaults", e);
            ToyConfig::default()
        }
    };

    // ── 2. Schedule store ─────────────────────────────────────
    let clock = SessionClock::new();
    let mut store = ScheduleStore::load(&storage, clock.today());
    if !storage.exists(STORE_NAMESPACE, StoreChange::Schedules.key()) {
        // Pin the seed schedules to the first launch date.
        store.save_all(&mut storage).context("persisting seed data")?;
    }
    store.subscribe(Box::new(Persister::new(storage.clone())));

    // ── 3. Adapters ───────────────────────────────────────────
    let models = data_dir.join("models");
    seed_models(&models)?;
    let loader = CatalogLoader::scan_dir(&models)
        .with_context(|| format!("scanning {}", models.display()))?;
    let mut scene = HeadlessScene::new(Some(data_dir.join("captures")));
    let mut sink = LogEventSink::new();

    // ── 4. Session ────────────────────────────────────────────
    let mut session = ArSession::new(config, loader);
    session.start(clock.now(), &store, &mut sink);

    console::spawn_stdin_reader().context("starting console reader")?;
    info!("{}", console::HELP);

    // ── 5. Event loop ─────────────────────────────────────────
    loop {
        let now = clock.now();
        while let Ok(cmd) = CONSOLE_CHANNEL.try_receive() {
            match cmd {
                ConsoleCommand::Session(cmd) => {
                    session.handle_command(cmd, now, &mut store, &mut scene, &mut sink);
                }
                ConsoleCommand::Status => print_status(&session, &store, now),
                ConsoleCommand::Quit => {
                    session.handle_command(
                        SessionCommand::Teardown,
                        now,
                        &mut store,
                        &mut scene,
                        &mut sink,
                    );
                    info!("Bye after {}s.", clock.uptime_secs());
                    return Ok(());
                }
            }
        }
        session.poll(now, &mut store, &mut scene, &mut sink);
        thread::sleep(TICK);
    }
}
