/// Shared types for the Bible study claim ledger
///
/// This crate provides the claim record model, the wire codec for record
/// batches returned by the ledger, and the epoch-day calendar used by the SDK
/// and the watcher.

pub mod calendar;
pub mod codec;
pub mod constants;
pub mod errors;
pub mod record;
pub mod views;

// Re-export all public types
pub use calendar::{TimeSnapshot, TimeSource};
pub use codec::{decode_claim_records, encode_claim_records};
pub use constants::*;
pub use errors::*;
pub use record::*;
pub use views::*;
