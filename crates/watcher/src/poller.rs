use std::time::Duration;

use biblestudy_sdk::Address;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};
use tracing::{debug, info};

use crate::tracker::WeakClaimTracker;

/// Background status and weekly refresh for one identity.
///
/// The task exits on `stop`, when the owning tracker is dropped (the handle
/// and its shutdown sender go with it), or as soon as a tick finds a
/// different identity connected.
pub struct PollerHandle {
    identity: Address,
    shutdown_tx: mpsc::Sender<()>,
    task: JoinHandle<()>,
}

impl PollerHandle {
    pub(crate) fn spawn(tracker: WeakClaimTracker, identity: Address, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = mpsc::channel::<()>(1);

        let task = tokio::spawn(async move {
            info!(%identity, interval_secs = period.as_secs_f64(), "Poller started");

            // first tick one period out; connect already ran the initial refresh
            let mut tick = interval_at(Instant::now() + period, period);
            tick.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = tick.tick() => {
                        let Some(tracker) = tracker.upgrade() else {
                            debug!(%identity, "Tracker dropped, poller exiting");
                            break;
                        };
                        if tracker.identity().await != Some(identity) {
                            debug!(%identity, "Identity changed, poller exiting");
                            break;
                        }
                        tracker.poll_once().await;
                    }
                    // `None` once the handle is dropped with its tracker
                    _ = shutdown_rx.recv() => {
                        info!(%identity, "Poller shutting down");
                        break;
                    }
                }
            }
        });

        Self {
            identity,
            shutdown_tx,
            task,
        }
    }

    pub fn identity(&self) -> Address {
        self.identity
    }

    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signal the task and wait for it to exit
    pub async fn stop(self) {
        // the task may already be gone
        let _ = self.shutdown_tx.send(()).await;
        let _ = self.task.await;
    }
}
