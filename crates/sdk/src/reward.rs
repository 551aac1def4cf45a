//! Client-side reward estimate.
//!
//! The ledger program decides the real payout; these figures only label the
//! claim button and pick the amount handed to the signer.

use biblestudy_types::{
    WeeklyView, BASE_DAILY_REWARD, STREAK_BONUS_INTERVAL, STREAK_BONUS_STEP, TOKEN_SCALE,
};

/// Whole-token reward for the `day_count`-th consecutive day
pub fn daily_reward(day_count: u64) -> u64 {
    BASE_DAILY_REWARD.saturating_add((day_count / STREAK_BONUS_INTERVAL).saturating_mul(STREAK_BONUS_STEP))
}

/// Reward in minor units
pub fn reward_amount(day_count: u64) -> u64 {
    daily_reward(day_count).saturating_mul(TOKEN_SCALE)
}

pub fn to_whole_tokens(amount: u64) -> u64 {
    amount / TOKEN_SCALE
}

/// Client-side streak: days claimed in the current week
pub fn current_streak(weekly: &WeeklyView) -> u64 {
    weekly.len() as u64
}

/// Amount (minor units) the next claim submits
pub fn next_claim_amount(weekly: &WeeklyView) -> u64 {
    reward_amount(current_streak(weekly).saturating_add(1))
}

/// Whole tokens to show for today.
///
/// Zero until today is completed; then the recorded amount if today's weekly
/// entry has arrived, else the estimate for the next streak day.
pub fn todays_claim_amount(weekly: &WeeklyView, today_dow: u8, completed: bool) -> u64 {
    if !completed {
        return 0;
    }
    match weekly.get(today_dow) {
        Some(claim) => to_whole_tokens(claim.record.amount_claimed),
        None => daily_reward(current_streak(weekly).saturating_add(1)),
    }
}
