//! Epoch-day calendar.
//!
//! All ledger dates are whole days since 1970-01-01 UTC. Day of week and
//! week number are pure arithmetic on that counter; month and year membership
//! goes through full Gregorian conversion. `year_estimate` is a display
//! default only and must never decide which records belong to a view.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{
    APPROX_DAYS_PER_YEAR, DAYS_PER_WEEK, EPOCH_DAY_OF_WEEK, MS_PER_DAY, REFERENCE_EPOCH_DAY,
    REFERENCE_YEAR, UNIX_EPOCH_DAYS_FROM_CE,
};
use crate::errors::{CalendarError, CalendarResult};

// ============================================================================
// Epoch-day Arithmetic
// ============================================================================

/// Day of week with Sunday = 0. Epoch day 0 was a Thursday.
pub fn day_of_week(epoch_day: i64) -> u8 {
    ((epoch_day.rem_euclid(DAYS_PER_WEEK) + EPOCH_DAY_OF_WEEK) % DAYS_PER_WEEK) as u8
}

/// Week index anchored on Sundays: every day from a Sunday through the
/// following Saturday maps to the same number.
pub fn week_number(epoch_day: i64) -> i64 {
    let sunday = epoch_day.saturating_sub(i64::from(day_of_week(epoch_day)));
    sunday.div_euclid(DAYS_PER_WEEK)
}

/// Approximate calendar year using 365-day years from 2024-01-01
pub fn year_estimate(epoch_day: i64) -> i32 {
    let years = epoch_day
        .saturating_sub(REFERENCE_EPOCH_DAY)
        .div_euclid(APPROX_DAYS_PER_YEAR);
    let year = i64::from(REFERENCE_YEAR).saturating_add(years);
    year.clamp(i64::from(i32::MIN), i64::from(i32::MAX)) as i32
}

/// Whole days since the epoch for a millisecond timestamp
pub fn epoch_day_from_timestamp_ms(timestamp_ms: u64) -> i64 {
    // u64::MAX / MS_PER_DAY is far below i64::MAX
    (timestamp_ms / MS_PER_DAY) as i64
}

// ============================================================================
// Gregorian Conversion
// ============================================================================

/// Gregorian date of an epoch day
pub fn epoch_day_to_date(epoch_day: i64) -> CalendarResult<NaiveDate> {
    epoch_day
        .checked_add(UNIX_EPOCH_DAYS_FROM_CE)
        .and_then(|days| i32::try_from(days).ok())
        .and_then(NaiveDate::from_num_days_from_ce_opt)
        .ok_or_else(|| CalendarError::out_of_range("epoch_day", epoch_day))
}

/// Epoch day of a Gregorian date
pub fn date_to_epoch_day(date: NaiveDate) -> i64 {
    i64::from(date.num_days_from_ce()) - UNIX_EPOCH_DAYS_FROM_CE
}

/// `(year, month)` of an epoch day, month in 1..=12
pub fn year_month(epoch_day: i64) -> CalendarResult<(i32, u32)> {
    let date = epoch_day_to_date(epoch_day)?;
    Ok((date.year(), date.month()))
}

/// Epoch days of the first and last day of a month (month in 1..=12)
pub fn month_bounds(year: i32, month: u32) -> CalendarResult<(i64, i64)> {
    if !(1..=12).contains(&month) {
        return Err(CalendarError::InvalidMonth { month });
    }
    let first = NaiveDate::from_ymd_opt(year, month, 1)
        .ok_or_else(|| CalendarError::out_of_range("year", year))?;
    let next_first = if month == 12 {
        year.checked_add(1)
            .and_then(|next| NaiveDate::from_ymd_opt(next, 1, 1))
    } else {
        NaiveDate::from_ymd_opt(year, month + 1, 1)
    }
    .ok_or_else(|| CalendarError::out_of_range("year", year))?;

    Ok((date_to_epoch_day(first), date_to_epoch_day(next_first) - 1))
}

/// Epoch days of January 1 and December 31 of a year
pub fn year_bounds(year: i32) -> CalendarResult<(i64, i64)> {
    let (first, _) = month_bounds(year, 1)?;
    let (_, last) = month_bounds(year, 12)?;
    Ok((first, last))
}

/// Date in the reference day's week whose day of week is `target_dow`.
///
/// Used to label weekly columns: the reference day is "today" and
/// `reference_dow` its day of week.
pub fn date_for_day_of_week(
    target_dow: u8,
    reference_epoch_day: i64,
    reference_dow: u8,
) -> CalendarResult<NaiveDate> {
    for day_of_week in [target_dow, reference_dow] {
        if i64::from(day_of_week) >= DAYS_PER_WEEK {
            return Err(CalendarError::InvalidDayOfWeek { day_of_week });
        }
    }
    let offset = i64::from(target_dow) - i64::from(reference_dow);
    let day = reference_epoch_day
        .checked_add(offset)
        .ok_or_else(|| CalendarError::out_of_range("reference_epoch_day", reference_epoch_day))?;
    epoch_day_to_date(day)
}

// ============================================================================
// Time Snapshot
// ============================================================================

/// Where a timestamp came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TimeSource {
    /// The ledger's shared clock object
    Ledger,
    /// Local wall clock, used when the ledger clock is unreachable
    LocalClock,
}

/// "Now" with every derived calendar field.
///
/// Both sources go through `from_timestamp_ms`, so day of week and week
/// number are computed identically regardless of where the time came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSnapshot {
    pub timestamp_ms: u64,
    pub epoch_day: i64,
    pub day_of_week: u8,
    pub week_number: i64,
    pub year_estimate: i32,
    pub source: TimeSource,
}

impl TimeSnapshot {
    pub fn from_timestamp_ms(timestamp_ms: u64, source: TimeSource) -> Self {
        let epoch_day = epoch_day_from_timestamp_ms(timestamp_ms);
        Self {
            timestamp_ms,
            epoch_day,
            day_of_week: day_of_week(epoch_day),
            week_number: week_number(epoch_day),
            year_estimate: year_estimate(epoch_day),
            source,
        }
    }

    /// Snapshot of the local wall clock
    pub fn local_now() -> Self {
        let millis = chrono::Utc::now().timestamp_millis().max(0) as u64;
        Self::from_timestamp_ms(millis, TimeSource::LocalClock)
    }

    /// Date of `day_of_week` within this snapshot's week
    pub fn date_for_day_of_week(&self, day_of_week: u8) -> CalendarResult<NaiveDate> {
        date_for_day_of_week(day_of_week, self.epoch_day, self.day_of_week)
    }
}
