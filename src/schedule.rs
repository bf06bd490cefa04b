//! Daily schedule arithmetic.

use chrono::{DateTime, Duration, NaiveTime, TimeZone};

use crate::error::{DigestError, Result};

/// Parse a `HH:MM` run time.
pub fn parse_schedule_time(raw: &str) -> Result<NaiveTime> {
    NaiveTime::parse_from_str(raw.trim(), "%H:%M").map_err(|e| {
        DigestError::Config(vec![format!(
            "SCHEDULE_TIME must be HH:MM, got {raw:?} ({e})"
        )])
    })
}

/// The first occurrence of `at` strictly after `now`.
///
/// Walks forward a day at a time so a wall-clock time skipped by a DST
/// change resolves to the next day it exists.
pub fn next_run_after<Tz: TimeZone>(now: &DateTime<Tz>, at: &NaiveTime) -> DateTime<Tz> {
    let tz = now.timezone();
    let mut day = now.date_naive();
    loop {
        if let Some(candidate) = tz.from_local_datetime(&day.and_time(*at)).earliest() {
            if candidate > *now {
                return candidate;
            }
        }
        day += Duration::days(1);
    }
}
