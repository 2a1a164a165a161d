use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime, Weekday};
use sqlx::SqlitePool;

use crate::error::ScheduleError;

/// The daily booking grid. Fixed configuration, not a computed schedule:
/// one bookable start time per hour from opening to closing.
pub const TIME_SLOTS: [&str; 10] = [
    "09:00", "10:00", "11:00", "12:00", "13:00", "14:00", "15:00", "16:00", "17:00", "18:00",
];

/// The salon's weekly non-working day. Slots on this day are never offered.
pub const CLOSED_WEEKDAY: Weekday = Weekday::Sun;

pub fn is_valid_slot(slot: &str) -> bool {
    TIME_SLOTS.contains(&slot)
}

pub fn slot_start(slot: &str) -> Option<NaiveTime> {
    if !is_valid_slot(slot) {
        return None;
    }
    NaiveTime::parse_from_str(slot, "%H:%M").ok()
}

pub fn is_salon_closed(date: NaiveDate) -> bool {
    date.weekday() == CLOSED_WEEKDAY
}

/// A slot is in the past when its date is before today, or it is today and
/// its start time has already been reached. Same-day bookings for later
/// slots are allowed.
pub fn is_slot_in_past(date: NaiveDate, slot: &str, now: NaiveDateTime) -> bool {
    if date < now.date() {
        return true;
    }
    if date > now.date() {
        return false;
    }
    match slot_start(slot) {
        Some(start) => start <= now.time(),
        None => false,
    }
}

/// A slot is free when no non-cancelled appointment occupies it for the
/// stylist. Cancelled appointments release the slot.
pub async fn is_slot_free(
    pool: &SqlitePool,
    stylist_id: &str,
    date: NaiveDate,
    slot: &str,
) -> Result<bool, ScheduleError> {
    let occupied = sqlx::query_scalar::<_, i64>(
        r#"SELECT COUNT(*) FROM appointments
           WHERE stylist_id = ? AND date = ? AND slot = ? AND status != 'cancelled'"#,
    )
    .bind(stylist_id)
    .bind(date)
    .bind(slot)
    .fetch_one(pool)
    .await?;

    Ok(occupied == 0)
}
