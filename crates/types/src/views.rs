//! Aggregated progress views
//!
//! Every view is rebuilt from scratch on refresh and replaces the previous one
//! wholesale; nothing here supports incremental merging.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::constants::MONTHS_PER_YEAR;
use crate::record::EnrichedClaim;

/// Current week's claims keyed by day of week (0 = Sunday)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyView {
    days: BTreeMap<u8, EnrichedClaim>,
}

impl WeeklyView {
    /// Build a view from claims in ledger order.
    ///
    /// At most one claim per day of week is kept; a later claim for the same
    /// day replaces an earlier one.
    pub fn from_claims(claims: impl IntoIterator<Item = EnrichedClaim>) -> Self {
        let mut days = BTreeMap::new();
        for claim in claims {
            days.insert(claim.record.day_of_week, claim);
        }
        Self { days }
    }

    pub fn get(&self, day_of_week: u8) -> Option<&EnrichedClaim> {
        self.days.get(&day_of_week)
    }

    pub fn contains(&self, day_of_week: u8) -> bool {
        self.days.contains_key(&day_of_week)
    }

    /// Number of days claimed this week, used as the client-side streak
    pub fn len(&self) -> usize {
        self.days.len()
    }

    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }

    /// Claims ordered Sunday to Saturday
    pub fn iter(&self) -> impl Iterator<Item = (u8, &EnrichedClaim)> {
        self.days.iter().map(|(day, claim)| (*day, claim))
    }
}

/// Claims whose `claim_day` falls in one calendar month
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyView {
    /// 1..=12
    pub month: u32,
    pub year: i32,
    pub claims: Vec<EnrichedClaim>,
}

/// Claim counts per calendar month of one year
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct YearlyView {
    pub year: i32,
    /// Index 0 = January
    pub counts: [u32; MONTHS_PER_YEAR],
}

impl YearlyView {
    pub fn empty(year: i32) -> Self {
        Self {
            year,
            counts: [0; MONTHS_PER_YEAR],
        }
    }

    /// Count a claim in `month` (1..=12). Out-of-range months are ignored.
    pub fn tally(&mut self, month: u32) {
        if let Some(slot) = (month as usize)
            .checked_sub(1)
            .and_then(|index| self.counts.get_mut(index))
        {
            *slot = slot.saturating_add(1);
        }
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().map(|count| u64::from(*count)).sum()
    }
}
