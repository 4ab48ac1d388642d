//! Built-in seed data used when storage holds nothing (first launch) or a
//! stored collection fails to decode.

use chrono::{Days, NaiveDate};
use uuid::Uuid;

use crate::model::{Cat, CatId, CatType, Location, LocationId, Schedule};

/// Seed schedules are placed this many days after the first launch.
pub const SEED_SCHEDULE_OFFSET_DAYS: u64 = 2;

const KURO: CatId = Uuid::from_u128(0xE621E1F8_C36C_495A_93FC_0C247A3E6E5F);
const MIKE: CatId = Uuid::from_u128(0xF621E1F8_C36C_495A_93FC_0C247A3E6E5F);
const SHIRO: CatId = Uuid::from_u128(0xA621E1F8_C36C_495A_93FC_0C247A3E6E5F);
const TORA: CatId = Uuid::from_u128(0xB621E1F8_C36C_495A_93FC_0C247A3E6E5F);
const HACHIWARE: CatId = Uuid::from_u128(0xC621E1F8_C36C_495A_93FC_0C247A3E6E5F);

const CENTRAL_PARK: LocationId = Uuid::from_u128(0xE621E1F8_C36C_495A_93FC_0C247A3E6E61);
const LIBRARY_BACK: LocationId = Uuid::from_u128(0xF621E1F8_C36C_495A_93FC_0C247A3E6E62);
const SHOPPING_STREET: LocationId = Uuid::from_u128(0xA621E1F8_C36C_495A_93FC_0C247A3E6E63);
const RIVERSIDE: LocationId = Uuid::from_u128(0xB621E1F8_C36C_495A_93FC_0C247A3E6E64);
const STATION_PLAZA: LocationId = Uuid::from_u128(0xC621E1F8_C36C_495A_93FC_0C247A3E6E65);

fn cat(id: CatId, name: &str, is_hungry: bool, size: f64, type_id: u32) -> Cat {
    Cat {
        id,
        name: name.to_string(),
        is_hungry,
        size,
        type_id,
        feed_count: 0,
    }
}

pub fn cats() -> Vec<Cat> {
    vec![
        cat(KURO, "Kuro", true, 5.0, 1),
        cat(MIKE, "Mike", false, 4.5, 2),
        cat(SHIRO, "Shiro", true, 5.2, 3),
        cat(TORA, "Tora", false, 4.8, 2),
        cat(HACHIWARE, "Hachiware", true, 5.5, 1),
    ]
}

pub fn cat_types() -> Vec<CatType> {
    [
        (1, "cat.fill", "Black cat"),
        (2, "cat.circle.fill", "Calico"),
        (3, "pawprint.fill", "White cat"),
    ]
    .into_iter()
    .map(|(id, icon, label)| CatType {
        id,
        icon: icon.to_string(),
        label: label.to_string(),
    })
    .collect()
}

pub fn locations() -> Vec<Location> {
    [
        (CENTRAL_PARK, "Central Park", "1-1 Koen, Chuo, Tokyo", 35.681_236, 139.767_125),
        (LIBRARY_BACK, "Behind the library", "2-2 Toshokan, Shinjuku, Tokyo", 35.69, 139.70),
        (SHOPPING_STREET, "Shopping street corner", "3-3 Shotengai, Shibuya, Tokyo", 35.658, 139.691_7),
        (RIVERSIDE, "Riverside path", "4-4 Kawazoi, Setagaya, Tokyo", 35.64, 139.66),
        (STATION_PLAZA, "Station plaza", "5-5 Ekimae, Minato, Tokyo", 35.66, 139.75),
    ]
    .into_iter()
    .map(|(id, name, address, latitude, longitude)| Location {
        id,
        name: name.to_string(),
        address: Some(address.to_string()),
        latitude,
        longitude,
    })
    .collect()
}

/// Seed schedules, one per cat at its own location, 14:00-17:00 two days
/// after `today`.
pub fn schedules(today: NaiveDate) -> Vec<Schedule> {
    let date = today
        .checked_add_days(Days::new(SEED_SCHEDULE_OFFSET_DAYS))
        .unwrap_or(today);
    [
        (0xA621E1F8_C36C_495A_93FC_0C247A3E6E51_u128, KURO, CENTRAL_PARK),
        (0xB621E1F8_C36C_495A_93FC_0C247A3E6E52, MIKE, LIBRARY_BACK),
        (0xC621E1F8_C36C_495A_93FC_0C247A3E6E53, SHIRO, SHOPPING_STREET),
        (0xD621E1F8_C36C_495A_93FC_0C247A3E6E54, TORA, RIVERSIDE),
        (0xE621E1F8_C36C_495A_93FC_0C247A3E6E55, HACHIWARE, STATION_PLAZA),
    ]
    .into_iter()
    .map(|(id, cat_id, location_id)| Schedule {
        id: Uuid::from_u128(id),
        cat_id,
        location_id,
        date,
        start_time: "14:00".to_string(),
        end_time: "17:00".to_string(),
    })
    .collect()
}
