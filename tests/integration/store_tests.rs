//! Schedule store against the file-backed storage adapter.

use chrono::NaiveDate;
use uuid::Uuid;

use fatcat::adapters::kv_store::FileStorage;
use fatcat::app::ports::StoragePort;
use fatcat::error::StoreError;
use fatcat::model::{Cat, Location, Schedule, UNKNOWN_CAT_NAME, UNKNOWN_PLACE_NAME};
use fatcat::store::{Persister, STORE_NAMESPACE, ScheduleStore};

fn launch_day() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 6, 21).unwrap()
}

fn shrine() -> Location {
    Location {
        id: Uuid::new_v4(),
        name: "Meiji Shrine".to_string(),
        address: Some("1-1 Yoyogikamizonocho".to_string()),
        latitude: 35.6764,
        longitude: 139.6993,
    }
}

#[test]
fn first_launch_seeds_then_reloads_from_disk() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::open(dir.path()).unwrap();

    let seeded = ScheduleStore::load(&storage, launch_day());
    seeded.save_all(&mut storage).unwrap();

    // A later launch must not re-date the seed schedules.
    let later = NaiveDate::from_ymd_opt(2025, 7, 1).unwrap();
    let reloaded = ScheduleStore::load(&storage, later);
    assert_eq!(reloaded.schedules(), seeded.schedules());
    assert_eq!(reloaded.cats(), seeded.cats());
}

#[test]
fn mutations_are_persisted_through_the_observer() {
    let dir = tempfile::tempdir().unwrap();
    let storage = FileStorage::open(dir.path()).unwrap();
    let mut store = ScheduleStore::with_defaults(launch_day());
    store.subscribe(Box::new(Persister::new(storage.clone())));

    let cat_id = store.cats()[0].id;
    let location = shrine();
    let schedule = Schedule::new(cat_id, location.id, launch_day(), "09:00", "10:30");
    let schedule_id = store.add_schedule(schedule, location.clone()).unwrap();

    assert!(storage.exists(STORE_NAMESPACE, "locations"));
    assert!(storage.exists(STORE_NAMESPACE, "schedules"));

    let reloaded = ScheduleStore::load(&storage, launch_day());
    assert!(reloaded.schedule(schedule_id).is_some());
    assert_eq!(reloaded.location(location.id), Some(&location));
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    let dir = tempfile::tempdir().unwrap();
    let mut storage = FileStorage::open(dir.path()).unwrap();
    storage
        .write(STORE_NAMESPACE, "locations", b"[{\"broken\":")
        .unwrap();

    let store = ScheduleStore::load(&storage, launch_day());
    assert_eq!(store.locations().len(), 5);
    assert_eq!(store.locations()[0].name, "Central Park");
}

#[test]
fn rejected_schedules_leave_the_store_untouched() {
    let mut store = ScheduleStore::with_defaults(launch_day());
    let before = store.schedules().len();
    let cat_id = store.cats()[0].id;

    let location = shrine();
    let backwards = Schedule::new(cat_id, location.id, launch_day(), "18:00", "09:00");
    assert!(matches!(
        store.add_schedule(backwards, location.clone()),
        Err(StoreError::InvalidWindow(_))
    ));

    let stranger = Schedule::new(Uuid::new_v4(), location.id, launch_day(), "09:00", "10:00");
    assert!(matches!(
        store.add_schedule(stranger, location.clone()),
        Err(StoreError::UnknownCat(_))
    ));

    let mut off_planet = shrine();
    off_planet.latitude = 123.0;
    let schedule = Schedule::new(cat_id, off_planet.id, launch_day(), "09:00", "10:00");
    assert!(matches!(
        store.add_schedule(schedule, off_planet),
        Err(StoreError::InvalidCoordinate { .. })
    ));

    assert_eq!(store.schedules().len(), before);
    assert_eq!(store.locations().len(), 5);
}

#[test]
fn removed_cat_resolves_to_placeholder_in_listings() {
    let mut store = ScheduleStore::with_defaults(launch_day());
    let schedule = store.schedules()[0].clone();
    store.remove_cat(schedule.cat_id);

    let row = store.summarize(&schedule);
    assert_eq!(row.cat_name, UNKNOWN_CAT_NAME);
    assert_eq!(row.cat_icon, None);
    assert_eq!(store.schedules().len(), 5);
}

#[test]
fn schedule_at_unknown_place_summarizes_gracefully() {
    let cat = Cat::new("Mike", 2);
    let schedule = Schedule::new(cat.id, Uuid::new_v4(), launch_day(), "10:00", "11:00");
    let store = ScheduleStore::new(vec![cat], Vec::new(), Vec::new(), vec![schedule.clone()]);
    let row = store.summarize(&schedule);
    assert_eq!(row.location_name, UNKNOWN_PLACE_NAME);
    assert_eq!(row.cat_name, "Mike");
}
