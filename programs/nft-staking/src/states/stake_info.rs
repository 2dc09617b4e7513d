use super::{discriminator, encode_account, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use crate::SECONDS_PER_DAY;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// StakeInfo Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// Rarity tier of a staked NFT, stored as a single byte.
#[derive(AnchorSerialize, Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Tier {
    #[default]
    Common,
    Rare,
    Epic,
    Legendary,
}

impl Tier {
    /// Unknown bytes map to `Common` instead of failing the decode.
    pub fn from_u8(value: u8) -> Self {
        match value {
            1 => Tier::Rare,
            2 => Tier::Epic,
            3 => Tier::Legendary,
            _ => Tier::Common,
        }
    }

    pub fn as_u8(self) -> u8 {
        self as u8
    }

    pub fn name(self) -> &'static str {
        match self {
            Tier::Common => "COMMON",
            Tier::Rare => "RARE",
            Tier::Epic => "EPIC",
            Tier::Legendary => "LEGENDARY",
        }
    }

    /// Lenient parse of tier labels coming from NFT metadata.
    pub fn from_label(label: &str) -> Self {
        let normalized = label.trim().to_uppercase();
        if normalized.contains("LEGEND") {
            Tier::Legendary
        } else if normalized.contains("EPIC") {
            Tier::Epic
        } else if normalized.contains("RARE") {
            Tier::Rare
        } else {
            Tier::Common
        }
    }
}

#[derive(AnchorSerialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CompoundFrequency {
    Daily,
    Weekly,
    Monthly,
    #[default]
    Manual,
}

impl CompoundFrequency {
    pub fn from_u8(value: u8) -> Self {
        match value {
            0 => CompoundFrequency::Daily,
            1 => CompoundFrequency::Weekly,
            2 => CompoundFrequency::Monthly,
            _ => CompoundFrequency::Manual,
        }
    }
}

/// Milestone bits in `milestones_achieved`, paired with the days required.
pub const MILESTONES: [(u8, u64); 4] = [(1, 30), (2, 90), (4, 180), (8, 365)];

/// One account per staked mint, at PDA `["stake", mint]`.
///
/// Unstaking keeps the account and clears `is_staked`. The booster fields
/// after `accumulated_compound` are absent on accounts created by the first
/// program version.
#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct StakeInfo {
    /// Wallet that staked the NFT.
    pub owner: Pubkey,

    pub mint: Pubkey,

    /// UNIX timestamp (seconds) of the stake.
    pub staked_at: i64,

    /// UNIX timestamp (seconds) after which unstaking carries no penalty.
    pub release_date: i64,

    pub is_staked: bool,

    pub tier: Tier,

    pub last_claim_time: i64,

    /// Committed staking period in seconds.
    pub staking_period: u64,

    pub auto_compound: bool,

    pub accumulated_compound: u64,

    /// Dynamic time multiplier in basis points.
    pub current_time_multiplier: u64,
    pub last_multiplier_update: i64,
    /// Bitmap over `MILESTONES`.
    pub milestones_achieved: u8,
    pub next_milestone_days: u64,
    pub compound_frequency: CompoundFrequency,
    pub compound_streak: u16,
    pub compound_streak_multiplier: u64,
}

impl Default for StakeInfo {
    fn default() -> Self {
        Self {
            owner: Pubkey::default(),
            mint: Pubkey::default(),
            staked_at: 0,
            release_date: 0,
            is_staked: false,
            tier: Tier::Common,
            last_claim_time: 0,
            staking_period: 0,
            auto_compound: false,
            accumulated_compound: 0,
            current_time_multiplier: 0,
            last_multiplier_update: 0,
            milestones_achieved: 0,
            next_milestone_days: MILESTONES[0].1,
            compound_frequency: CompoundFrequency::Manual,
            compound_streak: 0,
            compound_streak_multiplier: 0,
        }
    }
}

impl StakeInfo {
    /// Breakdown:
    /// - 8: account discriminator
    /// - 32 * 2: owner, mint
    /// - 8 * 2: staked_at, release_date
    /// - 1 + 1: is_staked, tier
    /// - 8 * 2: last_claim_time, staking_period
    /// - 1: auto_compound
    /// - 8: accumulated_compound
    pub const MANDATORY_LEN: usize = 8 + 32 * 2 + 8 * 2 + 1 + 1 + 8 * 2 + 1 + 8;

    pub const LEN: usize = Self::MANDATORY_LEN + 8 + 8 + 1 + 8 + 1 + 2 + 8;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::STAKE_INFO, self)
    }

    pub fn staking_period_days(&self) -> u64 {
        self.staking_period / SECONDS_PER_DAY as u64
    }

    pub fn days_staked(&self, now: i64) -> u64 {
        (now.saturating_sub(self.staked_at).max(0) / SECONDS_PER_DAY) as u64
    }

    /// Unstaking before `release_date` is allowed but penalized.
    pub fn is_early_unstake(&self, now: i64) -> bool {
        now < self.release_date
    }

    /// Fraction of the committed period already served, clamped to [0, 1].
    pub fn completion(&self, now: i64) -> f64 {
        let total = self.release_date.saturating_sub(self.staked_at);
        if total <= 0 {
            return 1.0;
        }
        let elapsed = now.saturating_sub(self.staked_at);
        (elapsed as f64 / total as f64).clamp(0.0, 1.0)
    }

    pub fn milestones(&self) -> Vec<u64> {
        MILESTONES
            .iter()
            .filter(|(bit, _)| self.milestones_achieved & bit != 0)
            .map(|(_, days)| *days)
            .collect()
    }
}

/// Next milestone after `days_staked` days, `None` once all are reached.
pub fn next_milestone(days_staked: u64) -> Option<u64> {
    MILESTONES
        .iter()
        .map(|(_, days)| *days)
        .find(|days| days_staked < *days)
}

impl AccountLayout for StakeInfo {
    const NAME: &'static str = "StakeInfo";
    const DISCRIMINATOR: [u8; 8] = discriminator::STAKE_INFO;
    const MIN_LEN: usize = Self::MANDATORY_LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        let owner = p.parse_pubkey()?;
        let mint = p.parse_pubkey()?;
        let staked_at = p.parse_i64()?;
        let release_date = p.parse_i64()?;
        let is_staked = p.parse_bool()?;
        let tier = Tier::from_u8(p.parse_u8()?);
        let last_claim_time = p.parse_i64()?;
        let staking_period = p.parse_u64()?;
        let auto_compound = p.parse_bool()?;
        let accumulated_compound = p.parse_u64()?;

        let defaults = StakeInfo::default();
        let current_time_multiplier =
            p.parse_optional(defaults.current_time_multiplier, |p| p.parse_u64());
        let last_multiplier_update =
            p.parse_optional(defaults.last_multiplier_update, |p| p.parse_i64());
        let milestones_achieved = p.parse_optional(defaults.milestones_achieved, |p| p.parse_u8());
        let next_milestone_days = p.parse_optional(defaults.next_milestone_days, |p| p.parse_u64());
        let compound_frequency = p.parse_optional(defaults.compound_frequency, |p| {
            p.parse_u8().map(CompoundFrequency::from_u8)
        });
        let compound_streak = p.parse_optional(defaults.compound_streak, |p| p.parse_u16());
        let compound_streak_multiplier =
            p.parse_optional(defaults.compound_streak_multiplier, |p| p.parse_u64());

        Ok(Self {
            owner,
            mint,
            staked_at,
            release_date,
            is_staked,
            tier,
            last_claim_time,
            staking_period,
            auto_compound,
            accumulated_compound,
            current_time_multiplier,
            last_multiplier_update,
            milestones_achieved,
            next_milestone_days,
            compound_frequency,
            compound_streak,
            compound_streak_multiplier,
        })
    }
}
