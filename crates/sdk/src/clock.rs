use biblestudy_types::{TimeSnapshot, TimeSource};
use tracing::{debug, warn};

use crate::client::ChainQuery;

/// Authoritative "now": the ledger clock, or the local clock when the
/// ledger cannot be reached.
pub async fn current_time(chain: &dyn ChainQuery) -> TimeSnapshot {
    match chain.get_clock_time().await {
        Ok(timestamp_ms) => {
            debug!(timestamp_ms, "Using ledger clock");
            TimeSnapshot::from_timestamp_ms(timestamp_ms, TimeSource::Ledger)
        }
        Err(e) => {
            warn!(error = %e, "Ledger clock unavailable, falling back to local time");
            TimeSnapshot::local_now()
        }
    }
}
