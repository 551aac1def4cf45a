//! Classification of claim submission results.
//!
//! The signer only reports a message; known abort signatures map to distinct
//! outcomes so callers never show a generic failure for a known case.

use std::fmt;

use biblestudy_types::MAX_DIAGNOSTIC_CHARS;
use serde::{Deserialize, Serialize};

const ALREADY_CLAIMED_SIGNATURES: [&str; 2] = ["EAlreadyClaimedToday", "Abort(1)"];
const PERIOD_LIMIT_SIGNATURES: [&str; 2] = ["EGlobalPeriodLimitExceeded", "Abort(4)"];
const INSUFFICIENT_GAS_SIGNATURE: &str = "Insufficient gas";
const USER_REJECTED_SIGNATURE: &str = "User rejected";

/// Result of one claim attempt
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClaimOutcome {
    /// Executed; `reward` in whole tokens for streak day `streak`
    Completed {
        digest: String,
        reward: u64,
        streak: u64,
    },
    /// Refused locally: today is already completed
    AlreadyCompleted,
    /// Refused locally: no verse reference to claim with
    MissingVerse,
    /// Ledger says a prior attempt already claimed today
    AlreadyClaimed,
    /// Global period budget exhausted, retry later
    PeriodLimitReached,
    InsufficientGas,
    /// Declined in the signer
    Cancelled,
    /// Unrecognized failure with a truncated diagnostic
    Failed { diagnostic: String },
}

impl ClaimOutcome {
    /// Map a signer failure message to an outcome
    pub fn from_failure(message: &str) -> Self {
        let matches_any = |signatures: &[&str]| signatures.iter().any(|s| message.contains(s));

        if matches_any(&ALREADY_CLAIMED_SIGNATURES) {
            ClaimOutcome::AlreadyClaimed
        } else if matches_any(&PERIOD_LIMIT_SIGNATURES) {
            ClaimOutcome::PeriodLimitReached
        } else if message.contains(INSUFFICIENT_GAS_SIGNATURE) {
            ClaimOutcome::InsufficientGas
        } else if message.contains(USER_REJECTED_SIGNATURE) {
            ClaimOutcome::Cancelled
        } else {
            ClaimOutcome::Failed {
                diagnostic: truncate_chars(message, MAX_DIAGNOSTIC_CHARS),
            }
        }
    }

    /// Whether the claim is known to be on the ledger
    pub fn marks_claimed(&self) -> bool {
        matches!(
            self,
            ClaimOutcome::Completed { .. } | ClaimOutcome::AlreadyClaimed
        )
    }

    /// Whether this is a real failure rather than success, a refusal or a cancel
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            ClaimOutcome::PeriodLimitReached
                | ClaimOutcome::InsufficientGas
                | ClaimOutcome::Failed { .. }
        )
    }

    /// User-facing message
    pub fn message(&self) -> String {
        match self {
            ClaimOutcome::Completed { reward, streak, .. } => {
                format!("Claimed {} tokens (day {} of your streak)", reward, streak)
            }
            ClaimOutcome::AlreadyCompleted => "Today's reading is already completed".to_string(),
            ClaimOutcome::MissingVerse => "No verse loaded for today".to_string(),
            ClaimOutcome::AlreadyClaimed => "You have already claimed today".to_string(),
            ClaimOutcome::PeriodLimitReached => {
                "The reward pool limit for this period is reached, try again later".to_string()
            }
            ClaimOutcome::InsufficientGas => "Not enough SUI to pay for gas".to_string(),
            ClaimOutcome::Cancelled => "Claim cancelled".to_string(),
            ClaimOutcome::Failed { diagnostic } => format!("Claim failed: {}...", diagnostic),
        }
    }
}

impl fmt::Display for ClaimOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message())
    }
}

fn truncate_chars(message: &str, max_chars: usize) -> String {
    match message.char_indices().nth(max_chars) {
        Some((end, _)) => message[..end].to_string(),
        None => message.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_signatures() {
        assert_eq!(
            ClaimOutcome::from_failure("MoveAbort(... biblestudy ...) EAlreadyClaimedToday"),
            ClaimOutcome::AlreadyClaimed
        );
        assert_eq!(
            ClaimOutcome::from_failure("VMError Abort(1) in claim_daily_reward"),
            ClaimOutcome::AlreadyClaimed
        );
        assert_eq!(
            ClaimOutcome::from_failure("Abort(4)"),
            ClaimOutcome::PeriodLimitReached
        );
        assert_eq!(
            ClaimOutcome::from_failure("EGlobalPeriodLimitExceeded"),
            ClaimOutcome::PeriodLimitReached
        );
        assert_eq!(
            ClaimOutcome::from_failure("Insufficient gas for transaction"),
            ClaimOutcome::InsufficientGas
        );
        assert_eq!(
            ClaimOutcome::from_failure("User rejected the request"),
            ClaimOutcome::Cancelled
        );
    }

    #[test]
    fn test_unknown_failure_is_truncated() {
        let long = "x".repeat(250);
        match ClaimOutcome::from_failure(&long) {
            ClaimOutcome::Failed { diagnostic } => assert_eq!(diagnostic.len(), 100),
            other => panic!("unexpected outcome {:?}", other),
        }

        // multi-byte characters are never split
        let wide = "é".repeat(120);
        match ClaimOutcome::from_failure(&wide) {
            ClaimOutcome::Failed { diagnostic } => assert_eq!(diagnostic.chars().count(), 100),
            other => panic!("unexpected outcome {:?}", other),
        }
    }

    #[test]
    fn test_outcome_flags() {
        assert!(ClaimOutcome::AlreadyClaimed.marks_claimed());
        assert!(!ClaimOutcome::AlreadyClaimed.is_error());
        assert!(!ClaimOutcome::Cancelled.is_error());
        assert!(!ClaimOutcome::Cancelled.marks_claimed());
        assert!(ClaimOutcome::InsufficientGas.is_error());
        assert!(ClaimOutcome::Completed {
            digest: "abc".to_string(),
            reward: 10,
            streak: 1
        }
        .marks_claimed());
    }
}
