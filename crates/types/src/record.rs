use std::borrow::Cow;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::calendar;
use crate::constants::TOKEN_SCALE;

/// One day's claim as stored on the ledger
///
/// Produced only by decoding. `claim_day` is the canonical date key and is
/// trusted as-is; it is never re-derived from `timestamp`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimRecord {
    /// 0 = Sunday .. 6 = Saturday
    pub day_of_week: u8,
    /// Reward in minor units
    pub amount_claimed: u64,
    /// Milliseconds since the Unix epoch at claim time
    pub timestamp: u64,
    /// UTF-8 reference of the claimed reading, e.g. `John 3:16`
    pub verse_reference: Vec<u8>,
    /// Whole days since the Unix epoch
    pub claim_day: u64,
    /// Consecutive-day count reported at claim time
    pub streak_at_claim: u64,
}

impl ClaimRecord {
    /// Verse reference as text, replacing invalid UTF-8
    pub fn verse_reference_str(&self) -> Cow<'_, str> {
        String::from_utf8_lossy(&self.verse_reference)
    }

    /// Claimed amount in whole tokens
    pub fn whole_tokens(&self) -> u64 {
        self.amount_claimed / TOKEN_SCALE
    }

    /// `claim_day` as a signed epoch day, if it fits
    pub fn epoch_day(&self) -> Option<i64> {
        i64::try_from(self.claim_day).ok()
    }

    /// Gregorian date of `claim_day`, if representable
    pub fn claim_date(&self) -> Option<NaiveDate> {
        self.epoch_day()
            .and_then(|day| calendar::epoch_day_to_date(day).ok())
    }
}

/// Display text for a verse reference
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseText {
    pub text: String,
    pub version: String,
}

/// A claim record joined with its verse text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnrichedClaim {
    pub record: ClaimRecord,
    pub verse_reference: String,
    pub verse_text: String,
    pub version: String,
}

impl EnrichedClaim {
    /// Join a record with looked-up text; `None` leaves text and version empty
    pub fn new(record: ClaimRecord, verse: Option<VerseText>) -> Self {
        let verse_reference = record.verse_reference_str().into_owned();
        let VerseText { text, version } = verse.unwrap_or_default();
        Self {
            record,
            verse_reference,
            verse_text: text,
            version,
        }
    }
}
