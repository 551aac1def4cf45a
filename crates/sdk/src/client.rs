//! Collaborator interfaces.
//!
//! The SDK never talks to the network directly outside these traits:
//! `ChainQuery` reads the ledger, `VerseLookup` resolves verse text and
//! `ClaimSubmitter` hands a claim to an external signer.

use std::fmt;
use std::str::FromStr;

use async_trait::async_trait;
use biblestudy_types::VerseText;
use serde::{Deserialize, Serialize};

use crate::error::{SdkError, SdkResult};

/// 32-byte Sui address or object ID
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address([u8; 32]);

impl Address {
    pub const LENGTH: usize = 32;

    pub fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl FromStr for Address {
    type Err = SdkError;

    /// Parse `0x`-prefixed hex, left-padding short forms such as `0x6`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s
            .strip_prefix("0x")
            .or_else(|| s.strip_prefix("0X"))
            .unwrap_or(s);
        if digits.is_empty() || digits.len() > Self::LENGTH * 2 {
            return Err(SdkError::InvalidParameters(format!(
                "address '{}' must have 1 to 64 hex digits",
                s
            )));
        }

        let padded = format!("{:0>64}", digits);
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(&padded, &mut bytes)
            .map_err(|e| SdkError::InvalidParameters(format!("address '{}': {}", s, e)))?;
        Ok(Self(bytes))
    }
}

impl TryFrom<String> for Address {
    type Error = SdkError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Address> for String {
    fn from(address: Address) -> Self {
        address.to_string()
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

/// Read-only ledger queries
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Whether `identity` has claimed for the current ledger day
    async fn has_claimed_today(&self, identity: &Address) -> SdkResult<bool>;

    /// Encoded claim records for the current week
    async fn get_weekly_progress(&self, identity: &Address) -> SdkResult<Vec<u8>>;

    /// Encoded claim records for an explicit week number
    async fn get_progress_for_week(&self, identity: &Address, week: u64) -> SdkResult<Vec<u8>>;

    /// Ledger clock in milliseconds since the Unix epoch
    async fn get_clock_time(&self) -> SdkResult<u64>;

    /// Gas coin balance in MIST
    async fn get_gas_balance(&self, identity: &Address) -> SdkResult<u64>;
}

/// Resolves a verse reference to display text
#[async_trait]
pub trait VerseLookup: Send + Sync {
    async fn lookup_verse_text(&self, reference: &str) -> SdkResult<VerseText>;
}

/// Failure reported by the signer, carrying its raw message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmissionFailure {
    pub message: String,
}

impl SubmissionFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for SubmissionFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

/// Builds, signs and executes a `claim_daily_reward` transaction.
///
/// Returns the transaction digest on success.
#[async_trait]
pub trait ClaimSubmitter: Send + Sync {
    async fn submit_claim(
        &self,
        amount: u64,
        verse_reference: &[u8],
    ) -> Result<String, SubmissionFailure>;
}
