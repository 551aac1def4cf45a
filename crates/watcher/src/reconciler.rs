//! Claim status reconciliation.
//!
//! `ClaimState` is the single owner of everything the watcher knows about the
//! connected identity. Every asynchronous request is tagged with a `Ticket`
//! when it is issued; results are applied only if the ticket belongs to the
//! current identity session and is newer than the last applied result of the
//! same kind. A late reply can therefore never overwrite fresher state.

use std::collections::HashMap;

use biblestudy_sdk::reward;
use biblestudy_sdk::{Address, ClaimOutcome};
use biblestudy_types::{MonthlyView, TimeSnapshot, WeeklyView, YearlyView};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Whether the connected identity has claimed today
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimStatus {
    /// No identity, or no status query has completed yet
    Checking,
    NotClaimed,
    Claimed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GasStatus {
    Checking,
    Sufficient,
    Low,
}

/// Kinds of request sequenced independently
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RequestKind {
    Status,
    Weekly,
    Monthly,
    Yearly,
    Gas,
    Submission,
}

/// Issued with every request; identifies its session and order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket {
    kind: RequestKind,
    session: u64,
    seq: u64,
}

impl Ticket {
    pub fn kind(&self) -> RequestKind {
        self.kind
    }
}

#[derive(Debug, Clone)]
pub struct ClaimState {
    identity: Option<Address>,
    session: u64,
    next_seq: u64,
    last_applied: HashMap<RequestKind, u64>,
    status: ClaimStatus,
    /// Day on which `Claimed` was last confirmed; a poll for the same day
    /// cannot downgrade it
    claimed_day: Option<i64>,
    today: Option<TimeSnapshot>,
    weekly: WeeklyView,
    monthly: Option<MonthlyView>,
    yearly: Option<YearlyView>,
    gas: GasStatus,
}

impl Default for ClaimState {
    fn default() -> Self {
        Self {
            identity: None,
            session: 0,
            next_seq: 0,
            last_applied: HashMap::new(),
            status: ClaimStatus::Checking,
            claimed_day: None,
            today: None,
            weekly: WeeklyView::default(),
            monthly: None,
            yearly: None,
            gas: GasStatus::Checking,
        }
    }
}

impl ClaimState {
    pub fn new() -> Self {
        Self::default()
    }

    // ------------------------------------------------------------------------
    // Identity
    // ------------------------------------------------------------------------

    /// Switch identity. Any change starts a new session: everything resets to
    /// `Checking` and tickets from the old session become stale.
    ///
    /// Returns whether the identity changed.
    pub fn set_identity(&mut self, identity: Option<Address>) -> bool {
        if self.identity == identity {
            return false;
        }
        let session = self.session.wrapping_add(1);
        *self = Self {
            identity,
            session,
            next_seq: self.next_seq,
            ..Self::default()
        };
        true
    }

    pub fn identity(&self) -> Option<Address> {
        self.identity
    }

    // ------------------------------------------------------------------------
    // Sequencing
    // ------------------------------------------------------------------------

    pub fn issue(&mut self, kind: RequestKind) -> Ticket {
        self.next_seq = self.next_seq.wrapping_add(1);
        Ticket {
            kind,
            session: self.session,
            seq: self.next_seq,
        }
    }

    /// Whether a result for `ticket` may still be applied
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        ticket.session == self.session
            && self.identity.is_some()
            && self
                .last_applied
                .get(&ticket.kind)
                .map_or(true, |last| ticket.seq > *last)
    }

    /// Check and consume `ticket`
    fn accept(&mut self, ticket: &Ticket) -> bool {
        if !self.is_current(ticket) {
            debug!(kind = ?ticket.kind, seq = ticket.seq, "Discarding stale result");
            return false;
        }
        self.last_applied.insert(ticket.kind, ticket.seq);
        true
    }

    /// Make every outstanding ticket of `kind` stale
    fn invalidate(&mut self, kind: RequestKind) {
        let seq = self.next_seq;
        self.last_applied.insert(kind, seq);
    }

    // ------------------------------------------------------------------------
    // Results
    // ------------------------------------------------------------------------

    /// Apply a status query result; `None` means the query failed.
    ///
    /// A failed query counts as not claimed. `Claimed` confirmed for the same
    /// day is kept whatever a later poll says.
    pub fn apply_status(&mut self, ticket: &Ticket, now: TimeSnapshot, claimed: Option<bool>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.today = Some(now);

        if claimed == Some(true) {
            self.status = ClaimStatus::Claimed;
            self.claimed_day = Some(now.epoch_day);
        } else if self.claimed_day == Some(now.epoch_day) {
            self.status = ClaimStatus::Claimed;
        } else {
            self.status = ClaimStatus::NotClaimed;
        }
        true
    }

    /// Replace the weekly view; `None` (failed refresh) empties it
    pub fn apply_weekly(&mut self, ticket: &Ticket, now: TimeSnapshot, weekly: Option<WeeklyView>) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.today = Some(now);
        self.weekly = weekly.unwrap_or_default();
        true
    }

    pub fn apply_monthly(&mut self, ticket: &Ticket, monthly: MonthlyView) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.monthly = Some(monthly);
        true
    }

    pub fn apply_yearly(&mut self, ticket: &Ticket, yearly: YearlyView) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.yearly = Some(yearly);
        true
    }

    /// Apply a gas balance; a failed query counts as low
    pub fn apply_gas(&mut self, ticket: &Ticket, balance: Option<u64>, min_balance: u64) -> bool {
        if !self.accept(ticket) {
            return false;
        }
        self.gas = match balance {
            Some(balance) if balance >= min_balance => GasStatus::Sufficient,
            _ => GasStatus::Low,
        };
        true
    }

    /// Optimistically mark today claimed after a submission.
    ///
    /// Status queries issued before this point are discarded so an in-flight
    /// poll cannot revert it.
    pub fn record_submission_success(&mut self, ticket: &Ticket, now: TimeSnapshot) -> bool {
        if ticket.session != self.session || self.identity.is_none() {
            return false;
        }
        self.invalidate(RequestKind::Status);
        self.today = Some(now);
        self.status = ClaimStatus::Claimed;
        self.claimed_day = Some(now.epoch_day);
        true
    }

    /// Apply a submission outcome; only outcomes proving the claim landed
    /// change state
    pub fn record_submission_outcome(&mut self, ticket: &Ticket, now: TimeSnapshot, outcome: &ClaimOutcome) -> bool {
        outcome.marks_claimed() && self.record_submission_success(ticket, now)
    }

    // ------------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------------

    pub fn status(&self) -> ClaimStatus {
        self.status
    }

    pub fn gas(&self) -> GasStatus {
        self.gas
    }

    pub fn today(&self) -> Option<TimeSnapshot> {
        self.today
    }

    pub fn weekly(&self) -> &WeeklyView {
        &self.weekly
    }

    pub fn monthly(&self) -> Option<&MonthlyView> {
        self.monthly.as_ref()
    }

    pub fn yearly(&self) -> Option<&YearlyView> {
        self.yearly.as_ref()
    }

    /// Claimed per the status query, or today's slot already in the week
    pub fn is_today_completed(&self, today_dow: u8) -> bool {
        self.status == ClaimStatus::Claimed || self.weekly.contains(today_dow)
    }

    /// Whole tokens earned today, 0 if not completed
    pub fn todays_claim_amount(&self, today_dow: u8) -> u64 {
        reward::todays_claim_amount(&self.weekly, today_dow, self.is_today_completed(today_dow))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use biblestudy_types::{ClaimRecord, EnrichedClaim, TimeSource, MS_PER_DAY};

    const DAY: i64 = 19_797;

    fn identity() -> Address {
        "0xb1b1e".parse().unwrap()
    }

    fn at_day(day: i64) -> TimeSnapshot {
        TimeSnapshot::from_timestamp_ms(day as u64 * MS_PER_DAY + 1_000, TimeSource::Ledger)
    }

    fn connected() -> ClaimState {
        let mut state = ClaimState::new();
        state.set_identity(Some(identity()));
        state
    }

    fn poll(state: &mut ClaimState, day: i64, claimed: Option<bool>) -> bool {
        let ticket = state.issue(RequestKind::Status);
        state.apply_status(&ticket, at_day(day), claimed)
    }

    #[test]
    fn test_starts_checking() {
        let state = connected();
        assert_eq!(state.status(), ClaimStatus::Checking);
        assert_eq!(state.gas(), GasStatus::Checking);
    }

    #[test]
    fn test_repeated_polls_converge() {
        let mut state = connected();
        for _ in 0..5 {
            assert!(poll(&mut state, DAY, Some(false)));
            assert_eq!(state.status(), ClaimStatus::NotClaimed);
        }
        for _ in 0..5 {
            poll(&mut state, DAY, Some(true));
            assert_eq!(state.status(), ClaimStatus::Claimed);
        }
    }

    #[test]
    fn test_claimed_is_not_downgraded_same_day() {
        let mut state = connected();
        poll(&mut state, DAY, Some(true));
        poll(&mut state, DAY, Some(false));
        assert_eq!(state.status(), ClaimStatus::Claimed);
        poll(&mut state, DAY, None);
        assert_eq!(state.status(), ClaimStatus::Claimed);

        // a new ledger day starts unclaimed
        poll(&mut state, DAY + 1, Some(false));
        assert_eq!(state.status(), ClaimStatus::NotClaimed);
    }

    #[test]
    fn test_failed_query_means_not_claimed() {
        let mut state = connected();
        poll(&mut state, DAY, None);
        assert_eq!(state.status(), ClaimStatus::NotClaimed);
    }

    #[test]
    fn test_stale_result_is_discarded() {
        let mut state = connected();
        let older = state.issue(RequestKind::Status);
        let newer = state.issue(RequestKind::Status);

        assert!(state.apply_status(&newer, at_day(DAY), Some(true)));
        assert!(!state.apply_status(&older, at_day(DAY), Some(false)));
        assert_eq!(state.status(), ClaimStatus::Claimed);
    }

    #[test]
    fn test_kinds_are_sequenced_independently() {
        let mut state = connected();
        let status = state.issue(RequestKind::Status);
        let weekly = state.issue(RequestKind::Weekly);

        assert!(state.apply_weekly(&weekly, at_day(DAY), Some(WeeklyView::default())));
        assert!(state.apply_status(&status, at_day(DAY), Some(false)));
    }

    #[test]
    fn test_identity_change_resets_and_invalidates() {
        let mut state = connected();
        poll(&mut state, DAY, Some(true));
        let in_flight = state.issue(RequestKind::Status);

        assert!(state.set_identity(Some("0xc0ffee".parse().unwrap())));
        assert_eq!(state.status(), ClaimStatus::Checking);
        assert!(!state.apply_status(&in_flight, at_day(DAY), Some(true)));
        assert_eq!(state.status(), ClaimStatus::Checking);

        // same identity again is not a change
        assert!(!state.set_identity(Some("0xc0ffee".parse().unwrap())));

        state.set_identity(None);
        let ticket = state.issue(RequestKind::Status);
        assert!(!state.apply_status(&ticket, at_day(DAY), Some(true)));
        assert_eq!(state.status(), ClaimStatus::Checking);
    }

    #[test]
    fn test_submission_beats_in_flight_poll() {
        let mut state = connected();
        poll(&mut state, DAY, Some(false));

        let in_flight = state.issue(RequestKind::Status);
        let submission = state.issue(RequestKind::Submission);
        assert!(state.record_submission_success(&submission, at_day(DAY)));
        assert_eq!(state.status(), ClaimStatus::Claimed);

        // poll issued before the submission finished reports the old answer
        assert!(!state.apply_status(&in_flight, at_day(DAY), Some(false)));
        assert_eq!(state.status(), ClaimStatus::Claimed);
    }

    #[test]
    fn test_submission_invalidates_poll_from_previous_day() {
        let mut state = connected();
        poll(&mut state, DAY, Some(false));

        let in_flight = state.issue(RequestKind::Status);
        let submission = state.issue(RequestKind::Submission);
        assert!(state.record_submission_success(&submission, at_day(DAY + 1)));

        // the latch only covers DAY + 1; rejection must come from the ticket
        assert!(!state.is_current(&in_flight));
        assert!(!state.apply_status(&in_flight, at_day(DAY), Some(false)));
        assert_eq!(state.status(), ClaimStatus::Claimed);
    }

    #[test]
    fn test_failed_submission_leaves_state() {
        let mut state = connected();
        poll(&mut state, DAY, Some(false));

        let ticket = state.issue(RequestKind::Submission);
        assert!(!state.record_submission_outcome(&ticket, at_day(DAY), &ClaimOutcome::InsufficientGas));
        assert_eq!(state.status(), ClaimStatus::NotClaimed);

        assert!(state.record_submission_outcome(&ticket, at_day(DAY), &ClaimOutcome::AlreadyClaimed));
        assert_eq!(state.status(), ClaimStatus::Claimed);
    }

    #[test]
    fn test_today_completed_from_weekly_view() {
        let mut state = connected();
        poll(&mut state, DAY, Some(false));

        let today = at_day(DAY);
        let record = ClaimRecord {
            day_of_week: today.day_of_week,
            amount_claimed: 15_000_000,
            timestamp: today.timestamp_ms,
            verse_reference: b"John 3:16".to_vec(),
            claim_day: DAY as u64,
            streak_at_claim: 3,
        };
        let ticket = state.issue(RequestKind::Weekly);
        state.apply_weekly(
            &ticket,
            today,
            Some(WeeklyView::from_claims(vec![EnrichedClaim::new(record, None)])),
        );

        assert_eq!(state.status(), ClaimStatus::NotClaimed);
        assert!(state.is_today_completed(today.day_of_week));
        assert_eq!(state.todays_claim_amount(today.day_of_week), 15);
        assert!(!state.is_today_completed((today.day_of_week + 1) % 7));
    }

    #[test]
    fn test_failed_weekly_refresh_empties_view() {
        let mut state = connected();
        let record = ClaimRecord {
            day_of_week: 1,
            amount_claimed: 10_000_000,
            timestamp: 0,
            verse_reference: Vec::new(),
            claim_day: 19_793,
            streak_at_claim: 1,
        };
        let ticket = state.issue(RequestKind::Weekly);
        state.apply_weekly(
            &ticket,
            at_day(DAY),
            Some(WeeklyView::from_claims(vec![EnrichedClaim::new(record, None)])),
        );
        assert_eq!(state.weekly().len(), 1);

        let ticket = state.issue(RequestKind::Weekly);
        state.apply_weekly(&ticket, at_day(DAY), None);
        assert!(state.weekly().is_empty());
    }

    #[test]
    fn test_gas_status() {
        let mut state = connected();
        let ticket = state.issue(RequestKind::Gas);
        state.apply_gas(&ticket, Some(50_000_000), 50_000_000);
        assert_eq!(state.gas(), GasStatus::Sufficient);

        let ticket = state.issue(RequestKind::Gas);
        state.apply_gas(&ticket, Some(49_999_999), 50_000_000);
        assert_eq!(state.gas(), GasStatus::Low);

        let ticket = state.issue(RequestKind::Gas);
        state.apply_gas(&ticket, None, 50_000_000);
        assert_eq!(state.gas(), GasStatus::Low);
    }
}
