use biblestudy_sdk::Address;
use biblestudy_types::calendar;
use biblestudy_types::{ClaimRecord, MS_PER_DAY, TOKEN_SCALE};
use chrono::NaiveDate;

pub fn address(s: &str) -> Address {
    s.parse().expect("test address must be valid hex")
}

/// Epoch day of a calendar date
pub fn epoch_day(year: i32, month: u32, day: u32) -> u64 {
    let date = NaiveDate::from_ymd_opt(year, month, day).expect("valid test date");
    calendar::date_to_epoch_day(date) as u64
}

/// Noon UTC on `claim_day`
pub fn midday_ms(claim_day: u64) -> u64 {
    claim_day * MS_PER_DAY + MS_PER_DAY / 2
}

/// A consistent record for `claim_day`: day of week and timestamp derived
/// from it, 10 tokens, streak 1
pub fn claim_record(claim_day: u64, verse: &str) -> ClaimRecord {
    ClaimRecord {
        day_of_week: calendar::day_of_week(claim_day as i64),
        amount_claimed: 10 * TOKEN_SCALE,
        timestamp: midday_ms(claim_day),
        verse_reference: verse.as_bytes().to_vec(),
        claim_day,
        streak_at_claim: 1,
    }
}

/// One record per day in `[first_day, last_day]`
pub fn daily_records(first_day: u64, last_day: u64) -> Vec<ClaimRecord> {
    (first_day..=last_day)
        .map(|day| claim_record(day, &format!("Psalm {}:1", day % 150 + 1)))
        .collect()
}
