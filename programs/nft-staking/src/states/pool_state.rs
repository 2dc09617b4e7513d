use super::{discriminator, encode_account, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// PoolState Account
// ──────────────────────────────────────────────────────────────────────────────
//

pub const DEFAULT_MAX_NFTS_PER_USER: u8 = 5;
pub const DEFAULT_TIME_MULTIPLIER_INCREMENT: u64 = 500;
pub const DEFAULT_TIME_MULTIPLIER_PERIOD_DAYS: u64 = 30;
pub const DEFAULT_MAX_TIME_MULTIPLIER: u64 = 5_000;

/// Global staking configuration and totals. A single keypair account created by
/// the admin `initialize` instruction.
///
/// Every field after `long_staking_bonus` was appended in a later program
/// version. Accounts created before that lack them and decode with the
/// `DEFAULT_*` values.
#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct PoolState {
    /// Authority allowed to update pool settings.
    pub admin: Pubkey,

    /// Base reward emission rate.
    pub reward_rate: u64,

    /// Fee percent charged on emergency unstake.
    pub emergency_fee_percent: u8,

    pub paused: bool,

    /// Number of NFTs currently staked across all users.
    pub total_staked: u64,

    /// Tier multipliers in basis points of 1.0x (100 = 1.0x).
    pub common_multiplier: u64,
    pub rare_multiplier: u64,
    pub epic_multiplier: u64,
    pub legendary_multiplier: u64,

    /// Bonus in basis points for long staking periods.
    pub long_staking_bonus: u64,

    pub max_nfts_per_user: u8,

    /// Time multiplier gained per period, in basis points.
    pub time_multiplier_increment: u64,
    pub time_multiplier_period_days: u64,
    /// Cap on the accumulated time multiplier, in basis points.
    pub max_time_multiplier: u64,

    pub reward_mint: Pubkey,
    pub reward_vault: Pubkey,
    pub rewards_distributed: u64,
}

impl Default for PoolState {
    fn default() -> Self {
        Self {
            admin: Pubkey::default(),
            reward_rate: 0,
            emergency_fee_percent: 0,
            paused: false,
            total_staked: 0,
            common_multiplier: 0,
            rare_multiplier: 0,
            epic_multiplier: 0,
            legendary_multiplier: 0,
            long_staking_bonus: 0,
            max_nfts_per_user: DEFAULT_MAX_NFTS_PER_USER,
            time_multiplier_increment: DEFAULT_TIME_MULTIPLIER_INCREMENT,
            time_multiplier_period_days: DEFAULT_TIME_MULTIPLIER_PERIOD_DAYS,
            max_time_multiplier: DEFAULT_MAX_TIME_MULTIPLIER,
            reward_mint: Pubkey::default(),
            reward_vault: Pubkey::default(),
            rewards_distributed: 0,
        }
    }
}

impl PoolState {
    /// Mandatory prefix.
    ///
    /// Breakdown:
    /// - 8: account discriminator
    /// - 32: admin
    /// - 8: reward_rate
    /// - 1 + 1: emergency_fee_percent, paused
    /// - 8 * 6: total_staked, four tier multipliers, long_staking_bonus
    pub const MANDATORY_LEN: usize = 8 + 32 + 8 + 1 + 1 + 8 * 6;

    /// Size of the current layout with every extended field.
    pub const LEN: usize = Self::MANDATORY_LEN + 1 + 8 * 3 + 32 * 2 + 8;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::POOL_STATE, self)
    }

    /// Multiplier for a tier as a plain factor (basis points / 100).
    pub fn tier_multiplier(&self, tier: super::Tier) -> f64 {
        let bps = match tier {
            super::Tier::Common => self.common_multiplier,
            super::Tier::Rare => self.rare_multiplier,
            super::Tier::Epic => self.epic_multiplier,
            super::Tier::Legendary => self.legendary_multiplier,
        };
        bps as f64 / crate::MULTIPLIER_BASE as f64
    }

    /// Pools created before the reward vault fields existed cannot pay claims.
    pub fn has_reward_vault(&self) -> bool {
        self.reward_mint != Pubkey::default() && self.reward_vault != Pubkey::default()
    }
}

impl AccountLayout for PoolState {
    const NAME: &'static str = "PoolState";
    const DISCRIMINATOR: [u8; 8] = discriminator::POOL_STATE;
    const MIN_LEN: usize = Self::MANDATORY_LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        let admin = p.parse_pubkey()?;
        let reward_rate = p.parse_u64()?;
        let emergency_fee_percent = p.parse_u8()?;
        let paused = p.parse_bool()?;
        let total_staked = p.parse_u64()?;
        let common_multiplier = p.parse_u64()?;
        let rare_multiplier = p.parse_u64()?;
        let epic_multiplier = p.parse_u64()?;
        let legendary_multiplier = p.parse_u64()?;
        let long_staking_bonus = p.parse_u64()?;

        let max_nfts_per_user = p.parse_optional(DEFAULT_MAX_NFTS_PER_USER, |p| p.parse_u8());
        let time_multiplier_increment =
            p.parse_optional(DEFAULT_TIME_MULTIPLIER_INCREMENT, |p| p.parse_u64());
        let time_multiplier_period_days =
            p.parse_optional(DEFAULT_TIME_MULTIPLIER_PERIOD_DAYS, |p| p.parse_u64());
        let max_time_multiplier = p.parse_optional(DEFAULT_MAX_TIME_MULTIPLIER, |p| p.parse_u64());
        let reward_mint = p.parse_optional(Pubkey::default(), |p| p.parse_pubkey());
        let reward_vault = p.parse_optional(Pubkey::default(), |p| p.parse_pubkey());
        let rewards_distributed = p.parse_optional(0, |p| p.parse_u64());

        Ok(Self {
            admin,
            reward_rate,
            emergency_fee_percent,
            paused,
            total_staked,
            common_multiplier,
            rare_multiplier,
            epic_multiplier,
            legendary_multiplier,
            long_staking_bonus,
            max_nfts_per_user,
            time_multiplier_increment,
            time_multiplier_period_days,
            max_time_multiplier,
            reward_mint,
            reward_vault,
            rewards_distributed,
        })
    }
}
