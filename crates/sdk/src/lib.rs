/// Bible Study SDK
///
/// Client-side logic for the Bible study claim ledger on Sui:
/// - Ledger queries over JSON-RPC
/// - Weekly, monthly and yearly progress aggregation
/// - Verse text lookup
/// - Reward estimates and claim result classification

pub mod aggregator;
pub mod bcs_tx;
pub mod client;
pub mod clock;
pub mod error;
pub mod reward;
pub mod rpc;
pub mod submission;
pub mod verse;

pub use aggregator::{week_range, ProgressAggregator};
pub use client::{Address, ChainQuery, ClaimSubmitter, SubmissionFailure, VerseLookup};
pub use clock::current_time;
pub use error::{SdkError, SdkResult};
pub use rpc::{LedgerObjects, SuiRpcClient};
pub use submission::ClaimOutcome;
pub use verse::BibleApiClient;

// Re-export shared ledger types
pub use biblestudy_types::*;
