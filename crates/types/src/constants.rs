/// Ledger constants shared across the SDK and the watcher

// ============================================================================
// Calendar Constants
// ============================================================================

/// Milliseconds in one UTC day
pub const MS_PER_DAY: u64 = 86_400_000;

/// Days in a week
pub const DAYS_PER_WEEK: i64 = 7;

/// Day-of-week index of epoch day 0 (1970-01-01, a Thursday) with Sunday = 0
pub const EPOCH_DAY_OF_WEEK: i64 = 4;

/// Epoch day of 2024-01-01, anchor of the approximate year estimate
pub const REFERENCE_EPOCH_DAY: i64 = 19_723;

/// Calendar year of `REFERENCE_EPOCH_DAY`
pub const REFERENCE_YEAR: i32 = 2024;

/// Year length used by the approximate year estimate (no leap-year correction)
pub const APPROX_DAYS_PER_YEAR: i64 = 365;

/// Slots in a yearly histogram
pub const MONTHS_PER_YEAR: usize = 12;

/// `NaiveDate::num_days_from_ce` of 1970-01-01
pub const UNIX_EPOCH_DAYS_FROM_CE: i64 = 719_163;

// ============================================================================
// Token Constants
// ============================================================================

/// Minor units per whole $BIBLESTUDY token (6 decimals)
pub const TOKEN_SCALE: u64 = 1_000_000;

/// Base daily reward in whole tokens
pub const BASE_DAILY_REWARD: u64 = 10;

/// Every this many streak days adds one bonus step
pub const STREAK_BONUS_INTERVAL: u64 = 3;

/// Bonus in whole tokens per completed streak interval
pub const STREAK_BONUS_STEP: u64 = 5;

// ============================================================================
// Ledger Constants
// ============================================================================

/// Move module holding the claim entry points
pub const MODULE_NAME: &str = "biblestudy";

/// View function: has the sender claimed for the current ledger day
pub const FN_HAS_CLAIMED_TODAY: &str = "has_claimed_today";

/// View function: claim records for the current week
pub const FN_GET_WEEKLY_PROGRESS: &str = "get_weekly_progress";

/// View function: claim records for an explicit week number
pub const FN_GET_PROGRESS_FOR_WEEK: &str = "get_progress_for_week";

/// Shared clock object
pub const CLOCK_OBJECT_ID: &str = "0x6";

/// Initial shared version of the clock object
pub const CLOCK_INITIAL_SHARED_VERSION: u64 = 1;

/// Coin type used to pay gas
pub const GAS_COIN_TYPE: &str = "0x2::sui::SUI";

/// Gas balance (MIST) below which the account is reported as low on gas
pub const MIN_GAS_BALANCE_MIST: u64 = 50_000_000;

// ============================================================================
// Wire Constants
// ============================================================================

/// Smallest encoded claim record: u8 + 2 * u64 + empty vector + 2 * u64
pub const MIN_ENCODED_RECORD_LEN: usize = 1 + 8 + 8 + 1 + 8 + 8;

/// Longest diagnostic message kept from an unrecognized submission failure
pub const MAX_DIAGNOSTIC_CHARS: usize = 100;
