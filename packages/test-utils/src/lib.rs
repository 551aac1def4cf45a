//! In-memory collaborators for SDK and watcher tests.
//!
//! `MockChain` stores claim records and answers week queries by bucketing
//! them on a configurable `WeekKey`: Sunday-anchored `week_number` by
//! default, or the `(day + 4) / 7` numbering used by the dapp client.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use biblestudy_sdk::{
    Address, ChainQuery, ClaimSubmitter, SdkError, SdkResult, SubmissionFailure, VerseLookup,
};
use biblestudy_types::calendar;
use biblestudy_types::{encode_claim_records, ClaimRecord, VerseText};

pub mod constants;
pub mod helpers;

pub use constants::*;
pub use helpers::*;

// ============================================================================
// Chain
// ============================================================================

/// How the ledger double numbers weeks
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WeekKey {
    /// `calendar::week_number`: weeks start on Sunday
    #[default]
    SundayAnchored,
    /// `(day + 4) / 7`: same Sunday boundaries, numbered one higher
    EpochOffset,
}

impl WeekKey {
    pub fn of(self, epoch_day: i64) -> u64 {
        let week = match self {
            WeekKey::SundayAnchored => calendar::week_number(epoch_day),
            WeekKey::EpochOffset => epoch_day.saturating_add(4).div_euclid(7),
        };
        u64::try_from(week).unwrap_or(0)
    }
}

#[derive(Debug, Default)]
struct ChainState {
    week_key: WeekKey,
    records: Vec<ClaimRecord>,
    /// Extra records returned for a week regardless of their claim day
    spillover: HashMap<u64, Vec<ClaimRecord>>,
    failing_weeks: HashSet<u64>,
    corrupt_weeks: HashSet<u64>,
    claimed_today: bool,
    clock_ms: u64,
    clock_fails: bool,
    status_fails: bool,
    weekly_fails: bool,
    status_delays: VecDeque<Duration>,
    gas_balance: Option<u64>,
}

/// Ledger double
#[derive(Debug, Default)]
pub struct MockChain {
    state: Mutex<ChainState>,
    status_calls: AtomicUsize,
    week_calls: AtomicUsize,
}

impl MockChain {
    pub fn new(clock_ms: u64) -> Self {
        let chain = Self::default();
        chain.state().clock_ms = clock_ms;
        chain
    }

    fn state(&self) -> MutexGuard<'_, ChainState> {
        self.state.lock().expect("mock chain state poisoned")
    }

    pub fn with_week_key(self, key: WeekKey) -> Self {
        self.state().week_key = key;
        self
    }

    pub fn with_records(self, records: Vec<ClaimRecord>) -> Self {
        self.state().records.extend(records);
        self
    }

    pub fn push_record(&self, record: ClaimRecord) {
        self.state().records.push(record);
    }

    /// Return `records` from the week `week` query in addition to the
    /// records that really belong to it
    pub fn add_spillover(&self, week: u64, records: Vec<ClaimRecord>) {
        self.state().spillover.entry(week).or_default().extend(records);
    }

    pub fn fail_week(&self, week: u64) {
        self.state().failing_weeks.insert(week);
    }

    /// Week query returns a truncated batch
    pub fn corrupt_week(&self, week: u64) {
        self.state().corrupt_weeks.insert(week);
    }

    pub fn set_claimed_today(&self, claimed: bool) {
        self.state().claimed_today = claimed;
    }

    pub fn set_clock_ms(&self, clock_ms: u64) {
        self.state().clock_ms = clock_ms;
    }

    pub fn set_clock_fails(&self, fails: bool) {
        self.state().clock_fails = fails;
    }

    pub fn set_status_fails(&self, fails: bool) {
        self.state().status_fails = fails;
    }

    pub fn set_weekly_fails(&self, fails: bool) {
        self.state().weekly_fails = fails;
    }

    /// Delay the next status queries, one entry per call
    pub fn queue_status_delay(&self, delay: Duration) {
        self.state().status_delays.push_back(delay);
    }

    pub fn set_gas_balance(&self, balance: Option<u64>) {
        self.state().gas_balance = balance;
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    pub fn week_calls(&self) -> usize {
        self.week_calls.load(Ordering::SeqCst)
    }

    fn week_bytes(state: &ChainState, week: u64) -> Vec<u8> {
        let mut records: Vec<ClaimRecord> = state
            .records
            .iter()
            .filter(|record| state.week_key.of(record.claim_day as i64) == week)
            .cloned()
            .collect();
        if let Some(extra) = state.spillover.get(&week) {
            records.extend(extra.iter().cloned());
        }
        encode_claim_records(&records)
    }

    fn unavailable(what: &str) -> SdkError {
        SdkError::RpcError(format!("{} unavailable", what))
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn has_claimed_today(&self, _identity: &Address) -> SdkResult<bool> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        let (delay, fails, claimed) = {
            let mut state = self.state();
            (state.status_delays.pop_front(), state.status_fails, state.claimed_today)
        };
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        if fails {
            return Err(Self::unavailable("status"));
        }
        Ok(claimed)
    }

    async fn get_weekly_progress(&self, _identity: &Address) -> SdkResult<Vec<u8>> {
        let state = self.state();
        if state.weekly_fails {
            return Err(Self::unavailable("weekly progress"));
        }
        let today = calendar::epoch_day_from_timestamp_ms(state.clock_ms);
        Ok(Self::week_bytes(&state, state.week_key.of(today)))
    }

    async fn get_progress_for_week(&self, _identity: &Address, week: u64) -> SdkResult<Vec<u8>> {
        self.week_calls.fetch_add(1, Ordering::SeqCst);
        let state = self.state();
        if state.failing_weeks.contains(&week) {
            return Err(Self::unavailable("week"));
        }
        let mut bytes = Self::week_bytes(&state, week);
        if state.corrupt_weeks.contains(&week) {
            // count of one with nothing after it
            bytes = vec![0x01, 0x03];
        }
        Ok(bytes)
    }

    async fn get_clock_time(&self) -> SdkResult<u64> {
        let state = self.state();
        if state.clock_fails {
            return Err(Self::unavailable("clock"));
        }
        Ok(state.clock_ms)
    }

    async fn get_gas_balance(&self, _identity: &Address) -> SdkResult<u64> {
        self.state()
            .gas_balance
            .ok_or_else(|| Self::unavailable("balance"))
    }
}

// ============================================================================
// Verses
// ============================================================================

/// Verse lookup double: answers every reference except the failing ones
#[derive(Debug, Default)]
pub struct MockVerses {
    failing: Mutex<HashSet<String>>,
    lookups: AtomicUsize,
}

impl MockVerses {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reference(&self, reference: &str) {
        self.failing
            .lock()
            .expect("mock verses poisoned")
            .insert(reference.to_string());
    }

    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }

    pub fn text_for(reference: &str) -> String {
        format!("Text of {}", reference)
    }
}

#[async_trait]
impl VerseLookup for MockVerses {
    async fn lookup_verse_text(&self, reference: &str) -> SdkResult<VerseText> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        if self.failing.lock().expect("mock verses poisoned").contains(reference) {
            return Err(SdkError::VerseLookup {
                reference: reference.to_string(),
                reason: "not found".to_string(),
            });
        }
        Ok(VerseText {
            text: Self::text_for(reference),
            version: "King James Version".to_string(),
        })
    }
}

// ============================================================================
// Submitter
// ============================================================================

/// Signer double.
///
/// Replays queued results (default: success). When attached to a
/// `MockChain`, a successful submission lands on that ledger for the
/// chain clock's day.
#[derive(Debug, Default)]
pub struct MockSubmitter {
    results: Mutex<VecDeque<Result<String, SubmissionFailure>>>,
    submitted: Mutex<Vec<(u64, Vec<u8>)>>,
    ledger: Option<Arc<MockChain>>,
}

impl MockSubmitter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn landing_on(chain: Arc<MockChain>) -> Self {
        Self {
            ledger: Some(chain),
            ..Self::default()
        }
    }

    pub fn queue_failure(&self, message: &str) {
        self.results
            .lock()
            .expect("mock submitter poisoned")
            .push_back(Err(SubmissionFailure::new(message)));
    }

    /// `(amount, verse_reference)` of every submission so far
    pub fn submitted(&self) -> Vec<(u64, Vec<u8>)> {
        self.submitted.lock().expect("mock submitter poisoned").clone()
    }
}

#[async_trait]
impl ClaimSubmitter for MockSubmitter {
    async fn submit_claim(
        &self,
        amount: u64,
        verse_reference: &[u8],
    ) -> Result<String, SubmissionFailure> {
        self.submitted
            .lock()
            .expect("mock submitter poisoned")
            .push((amount, verse_reference.to_vec()));

        let result = self
            .results
            .lock()
            .expect("mock submitter poisoned")
            .pop_front()
            .unwrap_or_else(|| Ok(TEST_DIGEST.to_string()));

        if let (Ok(_), Some(chain)) = (&result, &self.ledger) {
            let clock_ms = chain.state().clock_ms;
            let claim_day = calendar::epoch_day_from_timestamp_ms(clock_ms) as u64;
            let mut record = claim_record(claim_day, &String::from_utf8_lossy(verse_reference));
            record.amount_claimed = amount;
            record.timestamp = clock_ms;
            chain.push_record(record);
            chain.set_claimed_today(true);
        }
        result
    }
}
