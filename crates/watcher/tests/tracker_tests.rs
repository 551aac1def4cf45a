//! Claim tracker behaviour against in-memory collaborators

use std::sync::Arc;
use std::time::Duration;

use biblestudy_sdk::ClaimOutcome;
use biblestudy_test_utils::{
    address, claim_record, MockChain, MockSubmitter, MockVerses, OTHER_ADDRESS, TEST_ADDRESS,
    TEST_CLOCK_MS, TEST_EPOCH_DAY,
};
use biblestudy_watcher::{
    ClaimStatus, ClaimTracker, GasStatus, RetryConfig, TrackerSettings, WatcherError,
};

const POLL: Duration = Duration::from_secs(5);
const SETTLE: Duration = Duration::from_millis(2_000);
/// Friday
const TODAY_DOW: u8 = 5;

fn settings() -> TrackerSettings {
    TrackerSettings {
        poll_interval: POLL,
        settle_delay: SETTLE,
        min_gas_balance: 50_000_000,
        retry: RetryConfig {
            max_retries: 2,
            base_delay_ms: 100,
            max_delay_ms: 1_000,
            backoff_multiplier: 2.0,
        },
    }
}

fn chain() -> Arc<MockChain> {
    let chain = MockChain::new(TEST_CLOCK_MS);
    chain.set_gas_balance(Some(75_000_000));
    Arc::new(chain)
}

fn tracker(chain: &Arc<MockChain>) -> ClaimTracker {
    ClaimTracker::new(chain.clone(), Arc::new(MockVerses::new()), None, settings())
}

fn tracker_with_submitter(chain: &Arc<MockChain>, submitter: Arc<MockSubmitter>) -> ClaimTracker {
    ClaimTracker::new(
        chain.clone(),
        Arc::new(MockVerses::new()),
        Some(submitter),
        settings(),
    )
}

#[tokio::test(start_paused = true)]
async fn test_connect_reads_status_week_and_gas() {
    let chain = chain();
    chain.push_record(claim_record(TEST_EPOCH_DAY - 1, "Psalm 1:1"));
    let tracker = tracker(&chain);

    assert_eq!(tracker.status().await, ClaimStatus::Checking);
    let status = tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    assert_eq!(status, ClaimStatus::NotClaimed);
    let state = tracker.state().await;
    assert_eq!(state.gas(), GasStatus::Sufficient);
    assert!(state.weekly().contains(TODAY_DOW - 1));
    assert!(!state.is_today_completed(TODAY_DOW));
    assert!(tracker.is_polling().await);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_gas_query_failure_is_low() {
    let chain = chain();
    chain.set_gas_balance(None);
    let tracker = tracker(&chain);

    tracker.connect(address(TEST_ADDRESS)).await.unwrap();
    assert_eq!(tracker.state().await.gas(), GasStatus::Low);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_initial_check_gives_up_after_retries() {
    let chain = chain();
    chain.set_status_fails(true);
    let tracker = tracker(&chain);

    let result = tracker.connect(address(TEST_ADDRESS)).await;

    assert!(matches!(
        result,
        Err(WatcherError::InitialCheckFailed { attempts: 3, .. })
    ));
    assert_eq!(chain.status_calls(), 3);
    assert_eq!(tracker.identity().await, None);
    assert_eq!(tracker.status().await, ClaimStatus::Checking);
    assert!(!tracker.is_polling().await);
}

#[tokio::test(start_paused = true)]
async fn test_poll_picks_up_claim_made_elsewhere() {
    let chain = chain();
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();
    assert_eq!(tracker.status().await, ClaimStatus::NotClaimed);

    chain.set_claimed_today(true);
    chain.push_record(claim_record(TEST_EPOCH_DAY, "John 3:16"));
    tokio::time::sleep(POLL + Duration::from_millis(100)).await;

    let state = tracker.state().await;
    assert_eq!(state.status(), ClaimStatus::Claimed);
    assert!(state.weekly().contains(TODAY_DOW));
    assert_eq!(state.todays_claim_amount(TODAY_DOW), 10);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_claimed_survives_later_polls() {
    let chain = chain();
    chain.set_claimed_today(true);
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    // ledger flaps and then becomes unreachable
    chain.set_claimed_today(false);
    tokio::time::sleep(POLL + Duration::from_millis(100)).await;
    chain.set_status_fails(true);
    tokio::time::sleep(POLL).await;

    assert!(chain.status_calls() >= 3);
    assert_eq!(tracker.status().await, ClaimStatus::Claimed);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_disconnect_stops_polling() {
    let chain = chain();
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    tracker.disconnect().await;
    assert_eq!(tracker.status().await, ClaimStatus::Checking);
    assert_eq!(tracker.state().await.gas(), GasStatus::Checking);
    assert!(!tracker.is_polling().await);

    let calls = chain.status_calls();
    tokio::time::sleep(POLL * 4).await;
    assert_eq!(chain.status_calls(), calls);

    assert!(matches!(
        tracker.refresh_status(true).await,
        Err(WatcherError::NoIdentity)
    ));
}

#[tokio::test(start_paused = true)]
async fn test_dropping_tracker_stops_polling() {
    let chain = chain();
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    // one poll runs while the tracker is alive
    tokio::time::sleep(POLL + Duration::from_millis(1)).await;
    let calls = chain.status_calls();
    assert!(calls >= 2);

    drop(tracker);
    tokio::time::sleep(POLL * 12).await;
    assert_eq!(chain.status_calls(), calls);
}

#[tokio::test(start_paused = true)]
async fn test_switching_identity_restarts_session() {
    let chain = chain();
    chain.set_claimed_today(true);
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();
    assert_eq!(tracker.status().await, ClaimStatus::Claimed);

    chain.set_claimed_today(false);
    let status = tracker.connect(address(OTHER_ADDRESS)).await.unwrap();

    assert_eq!(status, ClaimStatus::NotClaimed);
    assert_eq!(tracker.identity().await, Some(address(OTHER_ADDRESS)));

    // one poller, not two
    let calls = chain.status_calls();
    tokio::time::sleep(POLL + Duration::from_millis(100)).await;
    assert_eq!(chain.status_calls(), calls + 1);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_failed_weekly_refresh_empties_week() {
    let chain = chain();
    chain.push_record(claim_record(TEST_EPOCH_DAY - 2, "Psalm 3:1"));
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();
    assert_eq!(tracker.state().await.weekly().len(), 1);

    chain.set_weekly_fails(true);
    tracker.refresh_weekly().await.unwrap();
    assert!(tracker.state().await.weekly().is_empty());

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_submit_claim_marks_claimed_and_refreshes_week() {
    let chain = chain();
    // Sunday through Thursday already claimed
    for day in (TEST_EPOCH_DAY - 5)..TEST_EPOCH_DAY {
        chain.push_record(claim_record(day, "Psalm 23:1"));
    }
    let submitter = Arc::new(MockSubmitter::landing_on(chain.clone()));
    let tracker = tracker_with_submitter(&chain, submitter.clone());
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    let outcome = tracker.submit_claim("John 3:16").await.unwrap();

    // sixth day of the week: 10 + 2 * 5
    assert!(matches!(
        outcome,
        ClaimOutcome::Completed { reward: 20, streak: 6, .. }
    ));
    assert_eq!(submitter.submitted(), vec![(20_000_000, b"John 3:16".to_vec())]);

    let state = tracker.state().await;
    assert_eq!(state.status(), ClaimStatus::Claimed);
    assert!(state.weekly().contains(TODAY_DOW));
    assert_eq!(state.todays_claim_amount(TODAY_DOW), 20);

    // a second attempt is refused locally
    let again = tracker.submit_claim("John 3:16").await.unwrap();
    assert_eq!(again, ClaimOutcome::AlreadyCompleted);
    assert_eq!(submitter.submitted().len(), 1);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_submission_failures_are_classified() {
    let chain = chain();
    let submitter = Arc::new(MockSubmitter::new());
    submitter.queue_failure("Insufficient gas: balance too low");
    submitter.queue_failure("User rejected the request.");
    submitter.queue_failure("MoveAbort in claim_daily_reward: EAlreadyClaimedToday");
    let tracker = tracker_with_submitter(&chain, submitter.clone());
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    let outcome = tracker.submit_claim("John 3:16").await.unwrap();
    assert_eq!(outcome, ClaimOutcome::InsufficientGas);
    assert_eq!(tracker.status().await, ClaimStatus::NotClaimed);

    let outcome = tracker.submit_claim("John 3:16").await.unwrap();
    assert_eq!(outcome, ClaimOutcome::Cancelled);
    assert_eq!(tracker.status().await, ClaimStatus::NotClaimed);

    let outcome = tracker.submit_claim("John 3:16").await.unwrap();
    assert_eq!(outcome, ClaimOutcome::AlreadyClaimed);
    assert_eq!(tracker.status().await, ClaimStatus::Claimed);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_submit_requires_verse_and_submitter() {
    let chain = chain();
    let submitter = Arc::new(MockSubmitter::new());
    let signing = tracker_with_submitter(&chain, submitter.clone());
    signing.connect(address(TEST_ADDRESS)).await.unwrap();

    assert_eq!(
        signing.submit_claim("  ").await.unwrap(),
        ClaimOutcome::MissingVerse
    );
    assert!(submitter.submitted().is_empty());
    signing.shutdown().await;

    let read_only = tracker(&chain);
    read_only.connect(address(TEST_ADDRESS)).await.unwrap();
    assert!(matches!(
        read_only.submit_claim("John 3:16").await,
        Err(WatcherError::NoSubmitter)
    ));
    read_only.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_late_poll_cannot_undo_submission() {
    const HALF_DAY_MS: u64 = 12 * 60 * 60 * 1_000;

    // Friday 23:59:55
    let chain = chain();
    chain.set_clock_ms(TEST_CLOCK_MS + HALF_DAY_MS - 5_000);
    let submitter = Arc::new(MockSubmitter::landing_on(chain.clone()));
    let tracker = tracker_with_submitter(&chain, submitter);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    // a slow status query that read "not claimed" on Friday
    chain.queue_status_delay(Duration::from_secs(10));
    let slow_poll = tokio::spawn({
        let tracker = tracker.clone();
        async move { tracker.refresh_status(true).await }
    });
    tokio::task::yield_now().await;

    // the claim lands on Saturday, so the same-day latch cannot cover Friday's answer
    chain.set_clock_ms(TEST_CLOCK_MS + HALF_DAY_MS + 5_000);
    let outcome = tracker.submit_claim("John 3:16").await.unwrap();
    assert!(outcome.marks_claimed());
    assert_eq!(tracker.state().await.today().map(|now| now.epoch_day), Some(TEST_EPOCH_DAY as i64 + 1));

    slow_poll.await.unwrap().unwrap();
    assert_eq!(tracker.status().await, ClaimStatus::Claimed);

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_month_and_year_views_are_stored() {
    let chain = chain();
    chain.push_record(claim_record(TEST_EPOCH_DAY, "John 3:16"));
    chain.push_record(claim_record(TEST_EPOCH_DAY - 20, "John 3:17"));
    let tracker = tracker(&chain);
    tracker.connect(address(TEST_ADDRESS)).await.unwrap();

    let march = tracker.load_month(3, 2024).await.unwrap();
    assert_eq!(march.claims.len(), 1);

    // year defaults to the estimate from the ledger clock
    let year = tracker.load_year(None).await.unwrap();
    assert_eq!(year.year, 2024);
    assert_eq!(year.counts[1], 1);
    assert_eq!(year.counts[2], 1);

    let state = tracker.state().await;
    assert_eq!(state.monthly(), Some(&march));
    assert_eq!(state.yearly(), Some(&year));

    tracker.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_local_clock_fallback() {
    let chain = chain();
    chain.set_clock_fails(true);
    let tracker = tracker(&chain);

    tracker.connect(address(TEST_ADDRESS)).await.unwrap();
    let today = tracker.state().await.today().unwrap();
    assert_eq!(today.source, biblestudy_types::TimeSource::LocalClock);

    tracker.shutdown().await;
}
