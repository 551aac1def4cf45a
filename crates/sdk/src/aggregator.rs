//! Weekly, monthly and yearly progress views.
//!
//! The ledger only answers per-week queries, so a month or year is loaded as
//! every week overlapping it and then filtered by the Gregorian date of each
//! record's `claim_day`. Weeks at the edges spill into neighbouring months;
//! the exact-month filter is what keeps them out of the result.

use std::ops::RangeInclusive;
use std::sync::Arc;

use biblestudy_types::calendar::{self, month_bounds, year_bounds};
use biblestudy_types::{
    decode_claim_records, ClaimRecord, EnrichedClaim, MonthlyView, WeeklyView, YearlyView,
};
use chrono::Datelike;
use futures::future::join_all;
use tracing::{debug, warn};

use crate::client::{Address, ChainQuery, VerseLookup};
use crate::error::{SdkError, SdkResult};

/// Week numbers to query for the epoch-day range `[first_day, last_day]`.
///
/// One week past the last Sunday-anchored week is included: a ledger keying
/// weeks as `(day + 4) / 7` numbers every week one higher.
/// Records outside the range are dropped by the caller's date filter.
pub fn week_range(first_day: i64, last_day: i64) -> RangeInclusive<i64> {
    calendar::week_number(first_day)..=calendar::week_number(last_day).saturating_add(1)
}

pub struct ProgressAggregator {
    chain: Arc<dyn ChainQuery>,
    verses: Arc<dyn VerseLookup>,
}

impl ProgressAggregator {
    pub fn new(chain: Arc<dyn ChainQuery>, verses: Arc<dyn VerseLookup>) -> Self {
        Self { chain, verses }
    }

    pub fn chain(&self) -> &Arc<dyn ChainQuery> {
        &self.chain
    }

    /// Records of one week.
    ///
    /// Never fails: an unavailable or undecodable week contributes nothing.
    pub async fn load_week(&self, identity: &Address, week: i64) -> Vec<ClaimRecord> {
        let Ok(ledger_week) = u64::try_from(week) else {
            warn!(week, "Skipping week before the epoch");
            return Vec::new();
        };

        let bytes = match self.chain.get_progress_for_week(identity, ledger_week).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(week, error = %e, "Week unavailable, counting it as empty");
                return Vec::new();
            }
        };

        match decode_claim_records(&bytes) {
            Ok(records) => records,
            Err(e) => {
                warn!(week, error = %e, "Undecodable week, counting it as empty");
                Vec::new()
            }
        }
    }

    /// Records of every week in `weeks`, concatenated in week order
    async fn load_weeks(&self, identity: &Address, weeks: RangeInclusive<i64>) -> Vec<ClaimRecord> {
        let batches = join_all(weeks.map(|week| self.load_week(identity, week))).await;
        batches.into_iter().flatten().collect()
    }

    /// Current week's view. Query and decode failures propagate; the caller
    /// decides what an unavailable week looks like.
    pub async fn load_weekly(&self, identity: &Address) -> SdkResult<WeeklyView> {
        let bytes = self.chain.get_weekly_progress(identity).await?;
        let records = decode_claim_records(&bytes)?;
        debug!(records = records.len(), "Loaded weekly progress");

        let claims = self.enrich(records).await?;
        Ok(WeeklyView::from_claims(claims))
    }

    /// Enriched claims whose `claim_day` falls in `month` (1..=12) of `year`
    pub async fn load_month(&self, identity: &Address, month: u32, year: i32) -> SdkResult<MonthlyView> {
        let (first_day, last_day) = month_bounds(year, month)?;
        let weeks = week_range(first_day, last_day);
        debug!(month, year, ?weeks, "Loading month");

        let records: Vec<ClaimRecord> = self
            .load_weeks(identity, weeks)
            .await
            .into_iter()
            .filter(|record| {
                record
                    .claim_date()
                    .is_some_and(|date| date.year() == year && date.month() == month)
            })
            .collect();

        let claims = self.enrich(records).await?;
        Ok(MonthlyView { month, year, claims })
    }

    /// Per-month claim counts for `year`. No verse enrichment.
    pub async fn load_year(&self, identity: &Address, year: i32) -> SdkResult<YearlyView> {
        let (first_day, last_day) = year_bounds(year)?;
        let weeks = week_range(first_day, last_day);
        debug!(year, ?weeks, "Loading year");

        let mut view = YearlyView::empty(year);
        for record in self.load_weeks(identity, weeks).await {
            if let Some(date) = record.claim_date().filter(|date| date.year() == year) {
                view.tally(date.month());
            }
        }
        Ok(view)
    }

    /// Attach verse text to each record, one lookup task per record.
    ///
    /// Lookup failures leave text and version empty; only a task that dies
    /// fails the whole batch.
    async fn enrich(&self, records: Vec<ClaimRecord>) -> SdkResult<Vec<EnrichedClaim>> {
        let handles: Vec<_> = records
            .into_iter()
            .map(|record| {
                let verses = Arc::clone(&self.verses);
                tokio::spawn(async move {
                    let reference = record.verse_reference_str().into_owned();
                    let verse = match verses.lookup_verse_text(&reference).await {
                        Ok(verse) => Some(verse),
                        Err(e) => {
                            warn!(%reference, error = %e, "Verse lookup failed");
                            None
                        }
                    };
                    EnrichedClaim::new(record, verse)
                })
            })
            .collect();

        join_all(handles)
            .await
            .into_iter()
            .map(|joined| joined.map_err(|e| SdkError::Aggregation(format!("enrichment task failed: {}", e))))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_week_range_covers_partial_weeks() {
        // March 2024: Fri 1st .. Sun 31st
        let (first, last) = month_bounds(2024, 3).unwrap();
        let weeks = week_range(first, last);
        assert_eq!(weeks.clone().count(), 7);
        assert_eq!(calendar::day_of_week(first), 5);
        assert_eq!(calendar::day_of_week(last), 0);
    }

    #[test]
    fn test_week_range_reaches_last_sunday_under_epoch_keying() {
        let (first, last) = month_bounds(2024, 3).unwrap();
        let weeks = week_range(first, last);
        for day in [first, last] {
            assert!(weeks.contains(&((day + 4).div_euclid(7))));
            assert!(weeks.contains(&calendar::week_number(day)));
        }
    }

    #[test]
    fn test_week_range_single_day() {
        let weeks = week_range(19_800, 19_800);
        assert_eq!(weeks.clone().count(), 2);
    }
}
