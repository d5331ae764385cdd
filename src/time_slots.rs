// Date/time step support: departure slots per date

use crate::catalog::{Ride, TimeSlot};
use chrono::{Duration, NaiveDate};

// Days shown by the date picker
pub const PICKER_DAYS: u32 = 14;

const MORNING_SLOTS: &[(&str, u32)] = &[("05:00", 8), ("05:30", 6), ("06:00", 4), ("06:30", 7)];

const DAY_SLOTS: &[(&str, u32)] = &[
    ("08:00", 6),
    ("09:00", 8),
    ("10:00", 5),
    ("11:00", 3),
    ("14:00", 6),
    ("15:00", 7),
];

const EVENING_SLOTS: &[(&str, u32)] = &[("17:00", 5), ("18:00", 8), ("19:00", 6), ("20:00", 4)];

fn to_slots(tables: &[&[(&str, u32)]]) -> Vec<TimeSlot> {
    tables
        .iter()
        .flat_map(|table| table.iter())
        .map(|(time, available)| TimeSlot {
            time: time.to_string(),
            available: *available,
            price: None,
        })
        .collect()
}

// Fallback slot table when a ride has no published availability for a date
pub fn default_slots(category_id: Option<&str>) -> Vec<TimeSlot> {
    match category_id {
        Some("sunrise") => to_slots(&[MORNING_SLOTS]),
        Some("night") => to_slots(&[EVENING_SLOTS]),
        Some("private") | Some("family") => to_slots(&[MORNING_SLOTS, DAY_SLOTS]),
        _ => to_slots(&[MORNING_SLOTS, DAY_SLOTS, EVENING_SLOTS]),
    }
}

// The ride's own slots for the date when it publishes any, otherwise the category defaults
pub fn slots_for_date(ride: Option<&Ride>, category_id: Option<&str>, date: NaiveDate) -> Vec<TimeSlot> {
    let published = ride
        .and_then(|ride| ride.availability.iter().find(|a| a.date == date))
        .filter(|a| !a.slots.is_empty());

    match published {
        Some(availability) => availability.slots.clone(),
        None => default_slots(category_id),
    }
}

pub fn upcoming_dates(from: NaiveDate, days: u32) -> Vec<NaiveDate> {
    (0..i64::from(days))
        .map(|offset| from + Duration::days(offset))
        .collect()
}
