use chrono::{Duration, NaiveDate, TimeZone, Utc};
use chrono_tz::Tz;

use crate::models::{BusinessHours, Slot, TimeInterval};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SlotLabelError {
    #[error("slot label is missing an AM/PM suffix: {0}")]
    MissingPeriod(String),
    #[error("invalid hour in slot label: {0}")]
    InvalidHour(String),
    #[error("invalid minute in slot label: {0}")]
    InvalidMinute(String),
}

/// `9` → `"9:00 AM"`, `0` → `"12:00 AM"`, `12` → `"12:00 PM"`.
pub fn format_slot_label(hour: u32) -> String {
    let display = match hour % 12 {
        0 => 12,
        h => h,
    };
    let suffix = if hour < 12 { "AM" } else { "PM" };
    format!("{display}:00 {suffix}")
}

/// Converts a 12-hour label back to a 24-hour hour. Minutes are validated
/// but ignored since slots are whole-hour aligned.
pub fn parse_slot_label(label: &str) -> Result<u32, SlotLabelError> {
    let mut parts = label.split_whitespace();
    let time = parts
        .next()
        .ok_or_else(|| SlotLabelError::InvalidHour(label.to_string()))?;
    let period = parts
        .next()
        .ok_or_else(|| SlotLabelError::MissingPeriod(label.to_string()))?;
    if parts.next().is_some() {
        return Err(SlotLabelError::MissingPeriod(label.to_string()));
    }

    let (hour_str, minute_str) = match time.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (time, None),
    };

    let hour: u32 = hour_str
        .parse()
        .map_err(|_| SlotLabelError::InvalidHour(label.to_string()))?;
    if !(1..=12).contains(&hour) {
        return Err(SlotLabelError::InvalidHour(label.to_string()));
    }
    if let Some(m) = minute_str {
        let minute: u32 = m
            .parse()
            .map_err(|_| SlotLabelError::InvalidMinute(label.to_string()))?;
        if minute > 59 {
            return Err(SlotLabelError::InvalidMinute(label.to_string()));
        }
    }

    match period.to_ascii_uppercase().as_str() {
        "AM" if hour == 12 => Ok(0),
        "AM" => Ok(hour),
        "PM" if hour == 12 => Ok(12),
        "PM" => Ok(hour + 12),
        _ => Err(SlotLabelError::MissingPeriod(label.to_string())),
    }
}

/// The one-hour interval starting at `hour` on `date`, in business time.
/// `None` for hours past 23 or local times skipped by a DST change.
pub fn slot_interval(date: NaiveDate, hour: u32, tz: Tz) -> Option<TimeInterval> {
    let local = date.and_hms_opt(hour, 0, 0)?;
    let start = tz.from_local_datetime(&local).earliest()?.with_timezone(&Utc);
    TimeInterval::new(start, start + Duration::hours(1))
}

/// `[open, close)` of `date` in business time, used for the free/busy query.
pub fn business_day_window(date: NaiveDate, hours: BusinessHours, tz: Tz) -> Option<TimeInterval> {
    let open = slot_interval(date, hours.open_hour, tz)?;
    let close = slot_interval(date, hours.close_hour.checked_sub(1)?, tz)?;
    TimeInterval::new(open.start, close.end)
}

/// Bookable slots of one day: every whole hour in business hours whose
/// interval does not overlap a busy interval. Touching endpoints are free.
pub fn available_slots(
    date: NaiveDate,
    tz: Tz,
    hours: BusinessHours,
    busy: &[TimeInterval],
) -> Vec<Slot> {
    hours
        .hours()
        .filter_map(|hour| slot_interval(date, hour, tz).map(|interval| Slot { hour, interval }))
        .filter(|slot| !busy.iter().any(|b| slot.interval.overlaps(b)))
        .collect()
}

pub fn slot_labels(slots: &[Slot]) -> Vec<String> {
    slots.iter().map(|s| format_slot_label(s.hour)).collect()
}

/// Labels for a day with nothing booked.
pub fn default_slot_labels(hours: BusinessHours) -> Vec<String> {
    hours.hours().map(format_slot_label).collect()
}
