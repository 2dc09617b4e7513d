use anchor_lang::prelude::*;

declare_id!("4SfUyQkbeyz9jeJDsR5XiUf8DATVZJXtGG4JUsYsWzTs");

/// Keypair account holding the initialized `PoolState`.
pub mod pool_state_account {
    use anchor_lang::prelude::declare_id;
    declare_id!("YBZdU27VdXY7AHpzFDkphMFX1GHQ888ivU4Kgua5uCu");
}

pub mod governance_settings {
    use anchor_lang::prelude::declare_id;
    declare_id!("5ZLH7FGCXLPZveEf3AoQKJpnYF2LzUcJccW3y15DiprA");
}

pub const POOL_SEED: &str = "pool";
pub const STAKE_SEED: &str = "stake";
pub const ESCROW_SEED: &str = "escrow";
pub const USER_STAKING_SEED: &str = "user_staking";
pub const VOTE_SEED: &str = "vote";
pub const MEME_VOTE_SEED: &str = "meme_vote";
pub const MEME_SUBMISSION_SEED: &str = "meme_submission";
pub const REWARD_VAULT_AUTHORITY_SEED: &str = "reward_vault_authority";

/// Multipliers and bonuses on chain are expressed in basis points of 1.0x.
pub const MULTIPLIER_BASE: u64 = 100;
pub const SECONDS_PER_DAY: i64 = 86_400;

pub mod accounts;
pub mod curve;
pub mod error;
pub mod instruction;
pub mod parser;
pub mod states;
