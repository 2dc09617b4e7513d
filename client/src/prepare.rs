//! Builds unsigned transactions for a wallet to sign. Every flow checks the
//! on-chain state it depends on, then simulates the result. A failed
//! simulation is reported, never fatal.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use nft_staking::curve::{
    earned_rewards, emergency_fee_percent, estimated_rewards, unstaking_penalty_percent,
    DEFAULT_EMERGENCY_FEE_PERCENT,
};
use nft_staking::states::{
    AccountLayout, MemeInfo, PoolState, StakeInfo, Tier, UserStakingInfo,
};
use nft_staking::SECONDS_PER_DAY;
use serde::Serialize;
use serde_json::{json, Value};
use solana_sdk::{
    instruction::Instruction,
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::Transaction,
};
use std::collections::BTreeMap;

use crate::api::ApiError;
use crate::governance::{
    can_vote, validate_meme, voting_power, MIN_CONTEST_POWER, MIN_PROPOSAL_POWER,
};
use crate::instructions::governance_instructions::*;
use crate::instructions::rpc::{send_txn, SimulationReport, StakingRpc};
use crate::instructions::staking_instructions::*;
use crate::instructions::utils::*;
use crate::store::{ContestVote, ProposalRecord, StakingStore};
use crate::ClientConfig;

/// Blocks past `last_valid_block_height` a caller may still try to land.
pub const EXPIRY_GRACE_BLOCKS: u64 = 150;
pub const MAX_STAKING_PERIOD_DAYS: u64 = 365;

#[derive(Serialize, Debug, Clone)]
pub struct PreparedTransaction {
    /// Base64 of the bincode encoded transaction.
    pub transaction: String,
    pub blockhash: String,
    pub last_valid_block_height: u64,
    pub expiry_block_height: u64,
    pub accounts: BTreeMap<&'static str, String>,
    pub simulation: SimulationReport,
    pub warnings: Vec<String>,
    #[serde(skip_serializing_if = "Value::is_null")]
    pub extra: Value,
}

fn build_prepared(
    rpc: &dyn StakingRpc,
    payer: &Pubkey,
    instructions: &[Instruction],
    partial_signers: &[&Keypair],
    accounts: BTreeMap<&'static str, String>,
) -> Result<PreparedTransaction> {
    let (blockhash, last_valid_block_height) = rpc.get_latest_blockhash()?;
    let mut txn = Transaction::new_with_payer(instructions, Some(payer));
    txn.message.recent_blockhash = blockhash;
    if !partial_signers.is_empty() {
        let signers: Vec<&Keypair> = partial_signers.to_vec();
        txn.try_partial_sign(&signers, blockhash)?;
    }

    let simulation = match rpc.simulate_transaction(&txn) {
        Ok(outcome) => SimulationReport::from_outcome(outcome),
        Err(e) => {
            log_warn!("prepare", "simulation unavailable: {:#}", e);
            SimulationReport::unavailable(&e)
        }
    };
    for warning in &simulation.warnings {
        log_warn!("prepare", "{}", warning);
    }

    Ok(PreparedTransaction {
        transaction: STANDARD.encode(bincode::serialize(&txn)?),
        blockhash: blockhash.to_string(),
        last_valid_block_height,
        expiry_block_height: last_valid_block_height + EXPIRY_GRACE_BLOCKS,
        accounts,
        warnings: simulation.warnings.clone(),
        simulation,
        extra: Value::Null,
    })
}

fn fetch_pool(rpc: &dyn StakingRpc, config: &ClientConfig) -> Result<PoolState> {
    let account = rpc.get_account(&config.pool_state)?.ok_or_else(|| {
        ApiError::NotFound(format!(
            "Pool state {} is not initialized",
            config.pool_state
        ))
    })?;
    Ok(PoolState::try_from_account_data(&account.data)?)
}

/// Stake record for `mint`, required to be staked by `wallet`.
fn fetch_active_stake(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    mint: &Pubkey,
) -> Result<(Pubkey, StakeInfo)> {
    let (address, _bump) = get_stake_info_address(mint, &config.program_id);
    let account = rpc
        .get_account(&address)?
        .ok_or_else(|| ApiError::NotFound(format!("Stake account for {} not found", mint)))?;
    let stake = deserialize_staking_account::<StakeInfo>(&account, &config.program_id)?;
    if !stake.is_staked {
        return Err(ApiError::Conflict(format!("NFT {} is not staked", mint)).into());
    }
    if stake.owner != *wallet {
        return Err(ApiError::Validation(format!(
            "NFT {} is staked by another wallet",
            mint
        ))
        .into());
    }
    Ok((address, stake))
}

pub fn prepare_stake(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    mint: &Pubkey,
    period_days: u64,
    tier: Tier,
    auto_compound: bool,
) -> Result<PreparedTransaction> {
    if !(1..=MAX_STAKING_PERIOD_DAYS).contains(&period_days) {
        return Err(ApiError::Validation(format!(
            "Staking period must be between 1 and {} days",
            MAX_STAKING_PERIOD_DAYS
        ))
        .into());
    }
    let program_id = &config.program_id;
    let mut warnings = Vec::new();

    let (stake_address, _bump) = get_stake_info_address(mint, program_id);
    if let Some(account) = rpc.get_account(&stake_address)? {
        match StakeInfo::try_from_account_data(&account.data) {
            Ok(stake) if stake.is_staked => {
                return Err(ApiError::Conflict(format!("NFT {} is already staked", mint)).into());
            }
            Ok(_) => {}
            Err(e) => {
                log_warn!("prepare", "existing stake account {} unreadable: {}", stake_address, e);
                warnings.push(format!("Existing stake account is unreadable: {}", e));
            }
        }
    }

    let pool = fetch_pool(rpc, config)?;
    if pool.paused {
        return Err(ApiError::Conflict("Staking pool is paused".to_string()).into());
    }

    let (user_address, _bump) = get_user_staking_info_address(wallet, program_id);
    let init_user_account = match rpc.get_account(&user_address)? {
        None => true,
        Some(account) => {
            let user = UserStakingInfo::try_from_account_data(&account.data)?;
            if user.staked_count >= pool.max_nfts_per_user {
                return Err(ApiError::Validation(format!(
                    "Maximum of {} staked NFTs reached",
                    pool.max_nfts_per_user
                ))
                .into());
            }
            false
        }
    };

    let instructions = stake_nft_instr(
        program_id,
        config.pool_state,
        *wallet,
        *mint,
        period_days,
        tier,
        auto_compound,
        init_user_account,
    )?;
    let (escrow_authority, _bump) = get_escrow_authority_address(mint, program_id);
    let accounts = BTreeMap::from([
        ("stake_info", stake_address.to_string()),
        ("escrow_authority", escrow_authority.to_string()),
        (
            "escrow_nft_account",
            get_escrow_nft_address(mint, program_id).to_string(),
        ),
        ("user_nft_account", get_user_nft_address(wallet, mint).to_string()),
        ("user_staking_info", user_address.to_string()),
        ("pool_state", config.pool_state.to_string()),
    ]);

    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;
    prepared.warnings.extend(warnings);
    let estimate = estimated_rewards(tier, period_days);
    prepared.extra = json!({
        "tier": tier.name(),
        "staking_period": period_days,
        "init_user_staking_info": init_user_account,
        "estimated_rewards": {
            "base_rate": estimate.base_rate,
            "long_term_bonus": estimate.long_term_bonus,
            "total_rewards": estimate.total_rewards,
            "average_daily_reward": estimate.average_daily_reward,
        },
    });
    Ok(prepared)
}

pub fn prepare_unstake(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    mint: &Pubkey,
    now: i64,
) -> Result<PreparedTransaction> {
    let (stake_address, stake) = fetch_active_stake(rpc, config, wallet, mint)?;
    let instructions = unstake_nft_instr(&config.program_id, *wallet, *mint)?;
    let accounts = BTreeMap::from([
        ("stake_info", stake_address.to_string()),
        (
            "escrow_nft_account",
            get_escrow_nft_address(mint, &config.program_id).to_string(),
        ),
        ("user_nft_account", get_user_nft_address(wallet, mint).to_string()),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;

    let early = stake.is_early_unstake(now);
    let penalty = unstaking_penalty_percent(&stake, now);
    if early {
        prepared.warnings.push(format!(
            "Unstaking before the release date forfeits {}% of rewards",
            penalty
        ));
    }
    if prepared.simulation.is_early_unstake_warning() {
        log_info!("prepare", "early unstake of {} accepted with penalty", mint);
    }
    prepared.extra = json!({
        "early_unstake": early,
        "penalty_percent": penalty,
        "days_remaining": stake.release_date.saturating_sub(now).max(0) as f64 / SECONDS_PER_DAY as f64,
    });
    Ok(prepared)
}

pub fn prepare_emergency_unstake(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    mint: &Pubkey,
    now: i64,
) -> Result<PreparedTransaction> {
    let (stake_address, stake) = fetch_active_stake(rpc, config, wallet, mint)?;
    let pool_fee = match fetch_pool(rpc, config) {
        Ok(pool) => pool.emergency_fee_percent,
        Err(e) => {
            log_warn!("prepare", "using default emergency fee: {:#}", e);
            DEFAULT_EMERGENCY_FEE_PERCENT
        }
    };
    let instructions =
        emergency_unstake_nft_instr(&config.program_id, config.pool_state, *wallet, *mint)?;
    let (user_address, _bump) = get_user_staking_info_address(wallet, &config.program_id);
    let accounts = BTreeMap::from([
        ("stake_info", stake_address.to_string()),
        (
            "escrow_nft_account",
            get_escrow_nft_address(mint, &config.program_id).to_string(),
        ),
        ("user_nft_account", get_user_nft_address(wallet, mint).to_string()),
        ("user_staking_info", user_address.to_string()),
        ("pool_state", config.pool_state.to_string()),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;

    let fee = emergency_fee_percent(&stake, now, pool_fee);
    if fee > 0.0 {
        prepared
            .warnings
            .push(format!("Emergency unstake charges a {:.2}% fee", fee));
    }
    prepared.extra = json!({
        "early_unstake": stake.is_early_unstake(now),
        "emergency_fee_percent": fee,
        "penalty_percent": unstaking_penalty_percent(&stake, now),
    });
    Ok(prepared)
}

pub fn prepare_claim(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    mint: &Pubkey,
    now: i64,
) -> Result<PreparedTransaction> {
    let (stake_address, stake) = fetch_active_stake(rpc, config, wallet, mint)?;
    let pool = fetch_pool(rpc, config)?;
    if !pool.has_reward_vault() {
        return Err(ApiError::Validation(
            "Reward vault is not configured for this pool".to_string(),
        )
        .into());
    }
    let instructions =
        claim_rewards_instr(&config.program_id, config.pool_state, &pool, *wallet, *mint)?;
    let (vault_authority, _bump) = get_reward_vault_authority_address(&config.program_id);
    let accounts = BTreeMap::from([
        ("stake_info", stake_address.to_string()),
        ("reward_vault", pool.reward_vault.to_string()),
        ("reward_vault_authority", vault_authority.to_string()),
        (
            "user_token_account",
            get_user_nft_address(wallet, &pool.reward_mint).to_string(),
        ),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;
    let earned = earned_rewards(
        stake.tier,
        stake.staked_at,
        now,
        stake.staking_period_days(),
    );
    prepared.extra = json!({
        "earned": earned.earned,
        "elapsed_days": earned.elapsed_days,
        "progress_percentage": earned.progress_percentage,
    });
    Ok(prepared)
}

pub fn prepare_vote(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    proposal: &Pubkey,
    support: bool,
    now: i64,
) -> Result<PreparedTransaction> {
    let eligibility = can_vote(rpc, &config.program_id, wallet, proposal, now)?;
    if !eligibility.can_vote {
        let reason = eligibility.reason.unwrap_or_else(|| "Cannot vote".to_string());
        return Err(ApiError::Validation(reason).into());
    }
    let instructions = cast_vote_instr(&config.program_id, *wallet, *proposal, support)?;
    let (vote_address, _bump) = get_vote_address(proposal, wallet, &config.program_id);
    let accounts = BTreeMap::from([
        ("proposal", proposal.to_string()),
        ("vote", vote_address.to_string()),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;
    prepared.extra = json!({
        "support": support,
        "voting_power": eligibility.voting_power,
    });
    Ok(prepared)
}

/// The proposal account is a fresh keypair that partially signs here. The
/// wallet adds the fee payer signature.
pub fn prepare_create_proposal(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    wallet: &Pubkey,
    title: &str,
    description: &str,
    now: i64,
) -> Result<PreparedTransaction> {
    if title.trim().is_empty() {
        return Err(ApiError::Validation("Proposal title is required".to_string()).into());
    }
    let power = voting_power(rpc, &config.program_id, wallet)?;
    if power < MIN_PROPOSAL_POWER {
        return Err(ApiError::Validation(format!(
            "Creating a proposal requires {} staked NFTs, wallet has {}",
            MIN_PROPOSAL_POWER, power
        ))
        .into());
    }

    let proposal = Keypair::new();
    let proposal_id: u64 = rand::random();
    let instructions = create_proposal_instr(
        &config.program_id,
        config.governance_settings,
        *wallet,
        proposal.pubkey(),
        proposal_id,
        title.to_string(),
        description.to_string(),
    )?;
    let accounts = BTreeMap::from([
        ("proposal", proposal.pubkey().to_string()),
        ("governance_settings", config.governance_settings.to_string()),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[&proposal], accounts)?;

    let record = ProposalRecord {
        proposal: proposal.pubkey().to_string(),
        creator: wallet.to_string(),
        proposal_id,
        title: title.to_string(),
        description: description.to_string(),
        created_at: now,
    };
    if let Err(e) = store.insert_proposal(record) {
        log_warn!("prepare", "failed to record proposal {}: {:#}", proposal.pubkey(), e);
        prepared
            .warnings
            .push(format!("Proposal was not recorded in the store: {:#}", e));
    }
    prepared.extra = json!({
        "proposal_id": proposal_id,
        "voting_power": power,
    });
    Ok(prepared)
}

pub fn prepare_submit_meme(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    wallet: &Pubkey,
    title: &str,
    description: &str,
    ipfs_hash: &str,
) -> Result<PreparedTransaction> {
    validate_meme(title, description, ipfs_hash)?;
    let power = voting_power(rpc, &config.program_id, wallet)?;
    if power < MIN_CONTEST_POWER {
        return Err(ApiError::Validation(
            "Submitting a meme requires at least one staked NFT".to_string(),
        )
        .into());
    }
    let (meme_address, _bump) = get_meme_address(wallet, &config.program_id);
    if rpc.get_account(&meme_address)?.is_some() {
        return Err(
            ApiError::Conflict("This wallet has already submitted a meme".to_string()).into(),
        );
    }
    let instructions = submit_meme_instr(
        &config.program_id,
        *wallet,
        title.trim().to_string(),
        description.to_string(),
        ipfs_hash.to_string(),
    )?;
    let accounts = BTreeMap::from([("meme", meme_address.to_string())]);
    build_prepared(rpc, wallet, &instructions, &[], accounts)
}

pub fn prepare_vote_meme(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    wallet: &Pubkey,
    meme: &Pubkey,
    now: i64,
) -> Result<PreparedTransaction> {
    let power = voting_power(rpc, &config.program_id, wallet)?;
    if power < MIN_CONTEST_POWER {
        return Err(ApiError::Validation(
            "Voting on a meme requires at least one staked NFT".to_string(),
        )
        .into());
    }
    let account = rpc
        .get_account(meme)?
        .ok_or_else(|| ApiError::NotFound(format!("Meme {} not found", meme)))?;
    let info = deserialize_staking_account::<MemeInfo>(&account, &config.program_id)?;

    let (vote_address, _bump) = get_meme_vote_address(meme, wallet, &config.program_id);
    if rpc.get_account(&vote_address)?.is_some()
        || store.has_contest_vote(&meme.to_string(), &wallet.to_string())?
    {
        return Err(ApiError::Conflict("Already voted for this meme".to_string()).into());
    }

    let instructions = vote_meme_instr(&config.program_id, *wallet, *meme)?;
    let accounts = BTreeMap::from([
        ("meme", meme.to_string()),
        ("meme_vote", vote_address.to_string()),
    ]);
    let mut prepared = build_prepared(rpc, wallet, &instructions, &[], accounts)?;

    let vote = ContestVote {
        meme: meme.to_string(),
        voter: wallet.to_string(),
        voting_power: power,
        created_at: now,
    };
    if let Err(e) = store.insert_contest_vote(vote) {
        log_warn!("prepare", "failed to record contest vote: {:#}", e);
        prepared
            .warnings
            .push(format!("Vote was not recorded in the store: {:#}", e));
    }
    prepared.extra = json!({
        "title": info.title,
        "total_votes": info.total_votes,
        "voting_power": power,
    });
    Ok(prepared)
}

#[derive(Serialize, Debug, Clone)]
pub struct SendOutcome {
    pub signature: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sync: Option<Value>,
    pub warnings: Vec<String>,
}

pub fn decode_transaction(encoded: &str) -> Result<Transaction> {
    let raw = STANDARD
        .decode(encoded.trim())
        .map_err(|e| ApiError::Validation(format!("Transaction is not base64: {}", e)))?;
    let txn: Transaction = bincode::deserialize(&raw)
        .map_err(|e| ApiError::Validation(format!("Transaction does not decode: {}", e)))?;
    if txn.signatures.iter().any(|s| *s == Signature::default()) {
        return Err(ApiError::Validation("Transaction is missing signatures".to_string()).into());
    }
    Ok(txn)
}

/// Submit a wallet-signed transaction and wait for confirmation. The store
/// sync afterwards is best effort.
pub fn send_signed(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    encoded: &str,
    sync_mint: Option<&Pubkey>,
    now: i64,
) -> Result<SendOutcome> {
    let txn = decode_transaction(encoded)?;
    let signature = send_txn(rpc, &txn, true).context("failed to send transaction")?;
    log_info!("prepare", "confirmed {}", signature);

    let mut outcome = SendOutcome {
        signature: signature.to_string(),
        sync: None,
        warnings: Vec::new(),
    };
    if let Some(mint) = sync_mint {
        match crate::sync::sync_nft(rpc, config, store, mint, now) {
            Ok(item) => outcome.sync = Some(serde_json::to_value(item)?),
            Err(e) => {
                log_warn!("prepare", "store sync for {} failed: {:#}", mint, e);
                outcome
                    .warnings
                    .push(format!("Transaction confirmed but store sync failed: {:#}", e));
            }
        }
    }
    Ok(outcome)
}
