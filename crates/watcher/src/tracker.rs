//! Claim tracker
//!
//! Owns the `ClaimState` of the connected identity and drives it: the initial
//! status check on connect, the background poller, on-demand month and year
//! loads, and claim submission with its optimistic update.

use std::sync::{Arc, Weak};
use std::time::Duration;

use biblestudy_sdk::{
    current_time, reward, Address, ChainQuery, ClaimOutcome, ClaimSubmitter, ProgressAggregator,
    VerseLookup,
};
use biblestudy_types::{MonthlyView, TimeSnapshot, YearlyView};
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::config::{RetryConfig, WatcherConfig};
use crate::error::{WatcherError, WatcherResult};
use crate::poller::PollerHandle;
use crate::reconciler::{ClaimState, ClaimStatus, RequestKind, Ticket};

/// Timing and thresholds used by the tracker
#[derive(Debug, Clone)]
pub struct TrackerSettings {
    pub poll_interval: Duration,
    pub settle_delay: Duration,
    pub min_gas_balance: u64,
    pub retry: RetryConfig,
}

impl TrackerSettings {
    pub fn from_config(config: &WatcherConfig) -> Self {
        Self {
            poll_interval: config.poll_interval(),
            settle_delay: config.settle_delay(),
            min_gas_balance: config.min_gas_balance_mist,
            retry: config.retry.clone(),
        }
    }
}

impl Default for TrackerSettings {
    fn default() -> Self {
        Self::from_config(&WatcherConfig::default())
    }
}

struct TrackerInner {
    chain: Arc<dyn ChainQuery>,
    aggregator: ProgressAggregator,
    submitter: Option<Arc<dyn ClaimSubmitter>>,
    settings: TrackerSettings,
    state: RwLock<ClaimState>,
    poller: Mutex<Option<PollerHandle>>,
}

/// Cheap to clone; clones share state
#[derive(Clone)]
pub struct ClaimTracker {
    inner: Arc<TrackerInner>,
}

/// Non-owning tracker reference held by the poller task, so dropping the
/// last `ClaimTracker` also ends polling
#[derive(Clone)]
pub(crate) struct WeakClaimTracker {
    inner: Weak<TrackerInner>,
}

impl WeakClaimTracker {
    pub(crate) fn upgrade(&self) -> Option<ClaimTracker> {
        self.inner.upgrade().map(|inner| ClaimTracker { inner })
    }
}

impl ClaimTracker {
    pub fn new(
        chain: Arc<dyn ChainQuery>,
        verses: Arc<dyn VerseLookup>,
        submitter: Option<Arc<dyn ClaimSubmitter>>,
        settings: TrackerSettings,
    ) -> Self {
        let aggregator = ProgressAggregator::new(Arc::clone(&chain), verses);
        Self {
            inner: Arc::new(TrackerInner {
                chain,
                aggregator,
                submitter,
                settings,
                state: RwLock::new(ClaimState::new()),
                poller: Mutex::new(None),
            }),
        }
    }

    pub(crate) fn downgrade(&self) -> WeakClaimTracker {
        WeakClaimTracker {
            inner: Arc::downgrade(&self.inner),
        }
    }

    pub fn settings(&self) -> &TrackerSettings {
        &self.inner.settings
    }

    pub async fn identity(&self) -> Option<Address> {
        self.inner.state.read().await.identity()
    }

    pub async fn status(&self) -> ClaimStatus {
        self.inner.state.read().await.status()
    }

    /// Copy of the current state
    pub async fn state(&self) -> ClaimState {
        self.inner.state.read().await.clone()
    }

    /// Authoritative "now" from the ledger, local clock as fallback
    pub async fn now(&self) -> TimeSnapshot {
        current_time(self.inner.chain.as_ref()).await
    }

    // ========================================================================
    // Identity lifecycle
    // ========================================================================

    /// Make `identity` active: check its status, load its week and gas, then
    /// start polling.
    ///
    /// Fails if the initial status check keeps failing past the retry budget;
    /// the tracker is then left disconnected.
    pub async fn connect(&self, identity: Address) -> WatcherResult<ClaimStatus> {
        self.stop_poller().await;
        let changed = self.inner.state.write().await.set_identity(Some(identity));
        info!(%identity, changed, "Connecting identity");

        if let Err(e) = self.initial_status_check(identity).await {
            self.inner.state.write().await.set_identity(None);
            return Err(e);
        }
        self.refresh_weekly().await?;
        self.refresh_gas().await?;

        let poller = PollerHandle::spawn(self.downgrade(), identity, self.inner.settings.poll_interval);
        *self.inner.poller.lock().await = Some(poller);

        Ok(self.status().await)
    }

    /// Stop polling and forget the identity
    pub async fn disconnect(&self) {
        self.stop_poller().await;
        if self.inner.state.write().await.set_identity(None) {
            info!("Identity disconnected");
        }
    }

    pub async fn shutdown(&self) {
        info!("Shutting down claim tracker");
        self.disconnect().await;
    }

    pub async fn is_polling(&self) -> bool {
        self.inner
            .poller
            .lock()
            .await
            .as_ref()
            .is_some_and(|poller| !poller.is_finished())
    }

    async fn stop_poller(&self) {
        let poller = self.inner.poller.lock().await.take();
        if let Some(poller) = poller {
            debug!(identity = %poller.identity(), "Stopping poller");
            poller.stop().await;
        }
    }

    /// Issue a ticket for the connected identity
    async fn begin(&self, kind: RequestKind) -> WatcherResult<(Address, Ticket)> {
        let mut state = self.inner.state.write().await;
        let identity = state.identity().ok_or(WatcherError::NoIdentity)?;
        Ok((identity, state.issue(kind)))
    }

    // ========================================================================
    // Status
    // ========================================================================

    async fn initial_status_check(&self, identity: Address) -> WatcherResult<()> {
        let retry = &self.inner.settings.retry;
        let attempts = retry.max_retries.saturating_add(1);
        let mut last_error = String::new();

        for attempt in 0..attempts {
            let (_, ticket) = self.begin(RequestKind::Status).await?;
            let now = self.now().await;

            match self.inner.chain.has_claimed_today(&identity).await {
                Ok(claimed) => {
                    self.apply_status(&ticket, now, Some(claimed)).await;
                    return Ok(());
                }
                Err(e) => {
                    warn!(%identity, attempt, error = %e, "Initial claim status check failed");
                    last_error = e.to_string();
                    if attempt + 1 < attempts {
                        tokio::time::sleep(retry.delay_for_attempt(attempt)).await;
                    }
                }
            }
        }

        Err(WatcherError::InitialCheckFailed {
            attempts,
            reason: last_error,
        })
    }

    /// Re-query today's claim status. A failed query counts as not claimed;
    /// `silent` only lowers the log level.
    pub async fn refresh_status(&self, silent: bool) -> WatcherResult<ClaimStatus> {
        let (identity, ticket) = self.begin(RequestKind::Status).await?;
        if silent {
            debug!(%identity, "Polling claim status");
        } else {
            info!(%identity, "Checking claim status");
        }

        let now = self.now().await;
        let claimed = match self.inner.chain.has_claimed_today(&identity).await {
            Ok(claimed) => Some(claimed),
            Err(e) => {
                warn!(%identity, error = %e, "Claim status query failed");
                None
            }
        };

        Ok(self.apply_status(&ticket, now, claimed).await)
    }

    async fn apply_status(&self, ticket: &Ticket, now: TimeSnapshot, claimed: Option<bool>) -> ClaimStatus {
        let mut state = self.inner.state.write().await;
        let before = state.status();
        if state.apply_status(ticket, now, claimed) && state.status() != before {
            info!(from = ?before, to = ?state.status(), "Claim status changed");
        }
        state.status()
    }

    // ========================================================================
    // Views
    // ========================================================================

    /// Replace the weekly view; a failed load leaves it empty
    pub async fn refresh_weekly(&self) -> WatcherResult<()> {
        let (identity, ticket) = self.begin(RequestKind::Weekly).await?;
        let now = self.now().await;

        let weekly = match self.inner.aggregator.load_weekly(&identity).await {
            Ok(weekly) => {
                debug!(%identity, days = weekly.len(), "Weekly progress refreshed");
                Some(weekly)
            }
            Err(e) => {
                warn!(%identity, error = %e, "Weekly progress unavailable");
                None
            }
        };

        self.inner.state.write().await.apply_weekly(&ticket, now, weekly);
        Ok(())
    }

    pub async fn refresh_gas(&self) -> WatcherResult<()> {
        let (identity, ticket) = self.begin(RequestKind::Gas).await?;

        let balance = match self.inner.chain.get_gas_balance(&identity).await {
            Ok(balance) => Some(balance),
            Err(e) => {
                warn!(%identity, error = %e, "Gas balance unavailable");
                None
            }
        };

        let mut state = self.inner.state.write().await;
        state.apply_gas(&ticket, balance, self.inner.settings.min_gas_balance);
        debug!(%identity, gas = ?state.gas(), "Gas status refreshed");
        Ok(())
    }

    /// One poller tick: silent status check and weekly refresh
    pub async fn poll_once(&self) {
        if let Err(e) = self.refresh_status(true).await {
            debug!(error = %e, "Status poll skipped");
        }
        if let Err(e) = self.refresh_weekly().await {
            debug!(error = %e, "Weekly poll skipped");
        }
    }

    /// Load `month` (1..=12) of `year`
    pub async fn load_month(&self, month: u32, year: i32) -> WatcherResult<MonthlyView> {
        let (identity, ticket) = self.begin(RequestKind::Monthly).await?;
        let view = self.inner.aggregator.load_month(&identity, month, year).await?;
        info!(%identity, month, year, claims = view.claims.len(), "Monthly progress loaded");

        self.inner.state.write().await.apply_monthly(&ticket, view.clone());
        Ok(view)
    }

    /// Load a year; defaults to the estimated current year
    pub async fn load_year(&self, year: Option<i32>) -> WatcherResult<YearlyView> {
        let (identity, ticket) = self.begin(RequestKind::Yearly).await?;
        let year = match year {
            Some(year) => year,
            None => self.now().await.year_estimate,
        };

        let view = self.inner.aggregator.load_year(&identity, year).await?;
        info!(%identity, year, claims = view.total(), "Yearly progress loaded");

        self.inner.state.write().await.apply_yearly(&ticket, view.clone());
        Ok(view)
    }

    // ========================================================================
    // Submission
    // ========================================================================

    /// Claim today's reward for `verse_reference`.
    ///
    /// Refuses locally when today is already completed or no verse is given.
    /// On success today is marked claimed at once and the week is re-read
    /// after the settle delay.
    pub async fn submit_claim(&self, verse_reference: &str) -> WatcherResult<ClaimOutcome> {
        let submitter = self
            .inner
            .submitter
            .clone()
            .ok_or(WatcherError::NoSubmitter)?;
        let (identity, ticket) = self.begin(RequestKind::Submission).await?;
        let now = self.now().await;

        let (completed, amount, streak) = {
            let state = self.inner.state.read().await;
            (
                state.is_today_completed(now.day_of_week),
                reward::next_claim_amount(state.weekly()),
                reward::current_streak(state.weekly()).saturating_add(1),
            )
        };

        if completed {
            info!(%identity, "Today's reading is already completed");
            return Ok(ClaimOutcome::AlreadyCompleted);
        }
        if verse_reference.trim().is_empty() {
            warn!(%identity, "No verse to claim with");
            return Ok(ClaimOutcome::MissingVerse);
        }

        info!(%identity, amount, streak, %verse_reference, "Submitting claim");
        match submitter.submit_claim(amount, verse_reference.as_bytes()).await {
            Ok(digest) => {
                self.inner
                    .state
                    .write()
                    .await
                    .record_submission_success(&ticket, now);
                info!(%identity, %digest, "Claim executed");

                tokio::time::sleep(self.inner.settings.settle_delay).await;
                if let Err(e) = self.refresh_weekly().await {
                    debug!(error = %e, "Post-claim weekly refresh skipped");
                }

                Ok(ClaimOutcome::Completed {
                    digest,
                    reward: reward::to_whole_tokens(amount),
                    streak,
                })
            }
            Err(failure) => {
                let outcome = ClaimOutcome::from_failure(&failure.message);
                let reconciled = self
                    .inner
                    .state
                    .write()
                    .await
                    .record_submission_outcome(&ticket, now, &outcome);

                if reconciled {
                    info!(%identity, "Claim was already on the ledger");
                } else if outcome.is_error() {
                    warn!(%identity, outcome = %outcome, "Claim failed");
                } else {
                    info!(%identity, outcome = %outcome, "Claim not submitted");
                }
                Ok(outcome)
            }
        }
    }
}
