use crate::states::StakeInfo;

/// Emergency fee used when the pool account cannot be read.
pub const DEFAULT_EMERGENCY_FEE_PERCENT: u8 = 10;

/// Share of accrued rewards forfeited by a regular early unstake.
/// Nothing is forfeited on or after `release_date`.
pub fn unstaking_penalty_percent(stake: &StakeInfo, now: i64) -> u8 {
    if !stake.is_early_unstake(now) {
        return 0;
    }
    let progress = stake.completion(now);
    if progress < 0.3 {
        50
    } else if progress < 0.6 {
        30
    } else if progress < 0.9 {
        15
    } else {
        5
    }
}

/// Emergency unstake fee: the pool fee scaled by the share of the period left.
pub fn emergency_fee_percent(stake: &StakeInfo, now: i64, pool_fee_percent: u8) -> f64 {
    if !stake.is_early_unstake(now) {
        return 0.0;
    }
    pool_fee_percent as f64 * (1.0 - stake.completion(now))
}
