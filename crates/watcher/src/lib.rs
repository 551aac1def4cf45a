pub mod config;
pub mod error;
pub mod poller;
pub mod reconciler;
pub mod tracker;

pub use config::{create_example_config, RetryConfig, VerseConfig, WatcherConfig};
pub use error::{WatcherError, WatcherResult};
pub use poller::PollerHandle;
pub use reconciler::{ClaimState, ClaimStatus, GasStatus, RequestKind, Ticket};
pub use tracker::{ClaimTracker, TrackerSettings};
