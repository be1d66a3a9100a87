//! Weekly cache partition key.
//!
//! `week_number` is `ceil((now - Jan 1 00:00 UTC) / 7 days)`. It is a
//! partition key for "one cache generation per 7-day period", not an
//! ISO-8601 week: boundaries do not align to Mondays and the first instant
//! of a year maps to week 0.

use chrono::{DateTime, Datelike, TimeZone, Utc};
use serde::Serialize;

use crate::constants::{MILLIS_PER_WEEK, PHASE_LABEL_PREFIX};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WeekKey {
    pub week_number: u32,
    pub year: i32,
}

impl WeekKey {
    pub fn at(now: DateTime<Utc>) -> Self {
        Self {
            week_number: week_number(now),
            year: now.year(),
        }
    }
}

pub fn week_number(now: DateTime<Utc>) -> u32 {
    let Some(start_of_year) = Utc
        .with_ymd_and_hms(now.year(), 1, 1, 0, 0, 0)
        .single()
    else {
        return 0;
    };
    let elapsed_ms = (now - start_of_year).num_milliseconds().max(0);
    // ceil division on non-negative values
    ((elapsed_ms + MILLIS_PER_WEEK - 1) / MILLIS_PER_WEEK) as u32
}

pub fn phase_label(position: usize) -> String {
    format!("{PHASE_LABEL_PREFIX}{position}")
}

/// Numeric suffix of a `Phase N` label, used for ordering. Labels that do
/// not parse sort after every numbered label.
pub fn phase_label_number(label: &str) -> u32 {
    label
        .strip_prefix(PHASE_LABEL_PREFIX)
        .and_then(|rest| rest.trim().parse::<u32>().ok())
        .unwrap_or(u32::MAX)
}
