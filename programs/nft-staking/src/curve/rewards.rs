use crate::states::Tier;
use crate::SECONDS_PER_DAY;

/// Daily base emission in reward tokens.
pub fn daily_base_rate(tier: Tier) -> f64 {
    match tier {
        Tier::Common => 25.0,
        Tier::Rare => 50.0,
        Tier::Epic => 100.0,
        Tier::Legendary => 200.0,
    }
}

/// Launch boost bands as (last day, bonus). Later days get no boost.
const INITIAL_BONUS_BANDS: [(u64, f64); 3] = [(7, 2.0), (14, 1.75), (30, 1.5)];

/// Launch boost applied during the first month of a stake (`day` is 1-based).
pub fn initial_bonus(day: u64) -> f64 {
    INITIAL_BONUS_BANDS
        .iter()
        .find(|(last_day, _)| day <= *last_day)
        .map_or(1.0, |(_, bonus)| *bonus)
}

/// Bonus for committing to a long period.
pub fn long_term_bonus(period_days: u64) -> f64 {
    if period_days >= 365 {
        2.0
    } else if period_days >= 180 {
        1.7
    } else if period_days >= 90 {
        1.4
    } else if period_days >= 30 {
        1.2
    } else {
        1.0
    }
}

/// Reward for a single staking day. The larger of the two bonuses applies.
pub fn daily_reward(tier: Tier, day: u64, period_days: u64) -> f64 {
    daily_base_rate(tier) * initial_bonus(day).max(long_term_bonus(period_days))
}

/// Sum of `daily_reward` over days `1..=days`. Runs in constant time, one
/// term per bonus band.
pub fn cumulative_reward(tier: Tier, days: u64, period_days: u64) -> f64 {
    let long_term = long_term_bonus(period_days);
    let mut covered = 0u64;
    let mut weighted_days = 0.0;
    for (last_day, bonus) in INITIAL_BONUS_BANDS {
        let end = days.min(last_day);
        if end > covered {
            weighted_days += (end - covered) as f64 * bonus.max(long_term);
            covered = end;
        }
    }
    weighted_days += days.saturating_sub(covered) as f64 * long_term;
    daily_base_rate(tier) * weighted_days
}

#[derive(Debug, Clone, PartialEq)]
pub struct RewardEstimate {
    pub tier: Tier,
    pub base_rate: f64,
    pub period_days: u64,
    pub long_term_bonus: f64,
    pub total_rewards: f64,
    pub average_daily_reward: f64,
}

/// Projected rewards for staking the full `period_days`.
pub fn estimated_rewards(tier: Tier, period_days: u64) -> RewardEstimate {
    let total_rewards = cumulative_reward(tier, period_days, period_days);
    RewardEstimate {
        tier,
        base_rate: daily_base_rate(tier),
        period_days,
        long_term_bonus: long_term_bonus(period_days),
        total_rewards,
        average_daily_reward: if period_days == 0 {
            0.0
        } else {
            total_rewards / period_days as f64
        },
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct EarnedRewards {
    pub tier: Tier,
    pub elapsed_days: f64,
    pub earned: f64,
    pub progress_percentage: f64,
    pub remaining_days: f64,
}

/// Rewards accrued between `staked_at` and `now`, capped at the period.
/// A partially elapsed day accrues pro rata.
pub fn earned_rewards(tier: Tier, staked_at: i64, now: i64, period_days: u64) -> EarnedRewards {
    let elapsed = now.saturating_sub(staked_at).max(0) as f64 / SECONDS_PER_DAY as f64;
    let capped = elapsed.min(period_days as f64);
    let full_days = capped.floor() as u64;

    let mut earned = cumulative_reward(tier, full_days, period_days);
    let partial = capped - full_days as f64;
    if partial > 0.0 {
        earned += daily_reward(tier, full_days.saturating_add(1), period_days) * partial;
    }

    let progress_percentage = if period_days == 0 {
        100.0
    } else {
        capped / period_days as f64 * 100.0
    };
    EarnedRewards {
        tier,
        elapsed_days: capped,
        earned,
        progress_percentage,
        remaining_days: (period_days as f64 - capped).max(0.0),
    }
}
