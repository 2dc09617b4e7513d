//! Read-only account health checks. Nothing here blocks a transaction; the
//! results tell the caller what to fix first.

use anyhow::Result;
use nft_staking::curve::{earned_rewards, emergency_fee_percent, unstaking_penalty_percent};
use nft_staking::states::{
    discriminator, next_milestone, AccountKind, AccountLayout, PoolState, StakeInfo,
};
use nft_staking::SECONDS_PER_DAY;
use serde::Serialize;
use solana_sdk::{account::Account, pubkey::Pubkey};
use std::collections::BTreeMap;

use crate::instructions::rpc::StakingRpc;
use crate::instructions::utils::{
    deserialize_staking_account, get_escrow_authority_address, get_escrow_nft_address,
    get_pool_address, get_stake_info_address, get_user_staking_info_address,
};

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountCheck {
    pub address: String,
    pub exists: bool,
    pub owned_by_program: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub owner: Option<String>,
    pub size: usize,
    /// Hex of the first 8 bytes, empty when the account is missing.
    pub discriminator: String,
    pub discriminator_matches: bool,
}

impl AccountCheck {
    pub fn inspect(
        address: &Pubkey,
        account: Option<&Account>,
        program_id: &Pubkey,
        expected: &[u8; 8],
    ) -> Self {
        match account {
            None => Self {
                address: address.to_string(),
                exists: false,
                owned_by_program: false,
                owner: None,
                size: 0,
                discriminator: String::new(),
                discriminator_matches: false,
            },
            Some(account) => {
                let head = &account.data[..account.data.len().min(8)];
                Self {
                    address: address.to_string(),
                    exists: true,
                    owned_by_program: account.owner == *program_id,
                    owner: Some(account.owner.to_string()),
                    size: account.data.len(),
                    discriminator: hex::encode(head),
                    discriminator_matches: head == expected.as_slice(),
                }
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.exists && self.owned_by_program && self.discriminator_matches
    }

    /// First applicable problem with this account, if any.
    pub fn issue(&self, account: &'static str, expected: &[u8; 8]) -> Option<Issue> {
        if !self.exists {
            Some(Issue {
                account,
                kind: IssueKind::MissingAccount,
                message: format!("{} account does not exist", account),
            })
        } else if !self.owned_by_program {
            Some(Issue {
                account,
                kind: IssueKind::WrongOwner,
                message: format!(
                    "{} account is owned by {}",
                    account,
                    self.owner.as_deref().unwrap_or("unknown")
                ),
            })
        } else if !self.discriminator_matches {
            Some(Issue {
                account,
                kind: IssueKind::WrongDiscriminator,
                message: format!(
                    "{} discriminator is {}, expected {}",
                    account,
                    self.discriminator,
                    hex::encode(expected)
                ),
            })
        } else {
            None
        }
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    MissingAccount,
    WrongOwner,
    WrongDiscriminator,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub account: &'static str,
    pub kind: IssueKind,
    pub message: String,
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum RecommendedAction {
    Restake,
    AdminInitPool,
    InitUserAccount,
    Proceed,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StakeSummary {
    pub is_staked: bool,
    pub tier: &'static str,
    pub staked_at: i64,
    pub release_date: i64,
    pub early_unstake: bool,
    pub days_remaining: f64,
    pub penalty_percent: u8,
    pub emergency_fee_percent: f64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StakingDiagnosis {
    pub program_id: String,
    pub mint: String,
    pub wallet: String,
    pub stake_info: AccountCheck,
    pub user_staking_info: AccountCheck,
    pub escrow_authority: String,
    pub escrow_nft_account: AccountPresence,
    pub pool_state: PoolDiagnosis,
    pub issues: Vec<Issue>,
    pub actions: Vec<RecommendedAction>,
    /// `"fix"` when any issue was found, otherwise `"proceed"`.
    pub recommended_action: &'static str,
    pub can_unstake: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stake: Option<StakeSummary>,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct AccountPresence {
    pub address: String,
    pub exists: bool,
}

pub fn diagnose_staking_account(
    rpc: &dyn StakingRpc,
    program_id: &Pubkey,
    pool_address: &Pubkey,
    mint: &Pubkey,
    wallet: &Pubkey,
    now: i64,
) -> Result<StakingDiagnosis> {
    let (stake_address, _bump) = get_stake_info_address(mint, program_id);
    let (user_address, _bump) = get_user_staking_info_address(wallet, program_id);
    let (escrow_authority, _bump) = get_escrow_authority_address(mint, program_id);
    let escrow_nft = get_escrow_nft_address(mint, program_id);

    let stake_account = rpc.get_account(&stake_address)?;
    let user_account = rpc.get_account(&user_address)?;
    let escrow_exists = rpc.get_account(&escrow_nft)?.is_some();

    let stake_check = AccountCheck::inspect(
        &stake_address,
        stake_account.as_ref(),
        program_id,
        &discriminator::STAKE_INFO,
    );
    let user_check = AccountCheck::inspect(
        &user_address,
        user_account.as_ref(),
        program_id,
        &discriminator::USER_STAKING_INFO,
    );
    let pool_state = diagnose_pool_state(rpc, program_id, pool_address)?;

    let mut issues = Vec::new();
    let mut actions = Vec::new();
    if let Some(issue) = stake_check.issue("stake_info", &discriminator::STAKE_INFO) {
        if issue.kind == IssueKind::MissingAccount {
            actions.push(RecommendedAction::Restake);
        }
        issues.push(issue);
    }
    if let Some(issue) = user_check.issue("user_staking_info", &discriminator::USER_STAKING_INFO) {
        if issue.kind == IssueKind::MissingAccount {
            actions.push(RecommendedAction::InitUserAccount);
        }
        issues.push(issue);
    }
    if let Some(issue) = pool_state.check.issue("pool_state", &discriminator::POOL_STATE) {
        actions.push(RecommendedAction::AdminInitPool);
        issues.push(issue);
    }
    if issues.is_empty() {
        actions.push(RecommendedAction::Proceed);
    }
    actions.sort();
    actions.dedup();

    let pool_fee = pool_state
        .pool
        .as_ref()
        .map(|pool| pool.emergency_fee_percent)
        .unwrap_or(nft_staking::curve::DEFAULT_EMERGENCY_FEE_PERCENT);
    let stake = match (&stake_account, stake_check.is_valid()) {
        (Some(account), true) => match StakeInfo::try_from_account_data(&account.data) {
            Ok(stake) => Some(stake_summary(&stake, now, pool_fee)),
            Err(e) => {
                log_warn!("diagnostics", "stake account {} unreadable: {}", stake_address, e);
                None
            }
        },
        _ => None,
    };

    Ok(StakingDiagnosis {
        program_id: program_id.to_string(),
        mint: mint.to_string(),
        wallet: wallet.to_string(),
        can_unstake: stake_check.is_valid(),
        recommended_action: if issues.is_empty() { "proceed" } else { "fix" },
        stake_info: stake_check,
        user_staking_info: user_check,
        escrow_authority: escrow_authority.to_string(),
        escrow_nft_account: AccountPresence {
            address: escrow_nft.to_string(),
            exists: escrow_exists,
        },
        pool_state,
        issues,
        actions,
        stake,
    })
}

fn stake_summary(stake: &StakeInfo, now: i64, pool_fee: u8) -> StakeSummary {
    let remaining = stake.release_date.saturating_sub(now).max(0);
    StakeSummary {
        is_staked: stake.is_staked,
        tier: stake.tier.name(),
        staked_at: stake.staked_at,
        release_date: stake.release_date,
        early_unstake: stake.is_early_unstake(now),
        days_remaining: remaining as f64 / SECONDS_PER_DAY as f64,
        penalty_percent: unstaking_penalty_percent(stake, now),
        emergency_fee_percent: emergency_fee_percent(stake, now, pool_fee),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct StakeStatus {
    pub stake_info: String,
    pub owner: String,
    #[serde(flatten)]
    pub summary: StakeSummary,
    pub staking_period_days: u64,
    pub days_staked: u64,
    pub auto_compound: bool,
    pub milestones_achieved: Vec<u64>,
    pub next_milestone: Option<u64>,
    pub earned_rewards: f64,
    pub progress_percentage: f64,
}

/// Decoded stake account for `mint` with reward progress at `now`.
pub fn stake_status(
    rpc: &dyn StakingRpc,
    program_id: &Pubkey,
    pool_address: &Pubkey,
    mint: &Pubkey,
    now: i64,
) -> Result<StakeStatus> {
    let (address, _bump) = get_stake_info_address(mint, program_id);
    let account = rpc.get_account(&address)?.ok_or_else(|| {
        crate::api::ApiError::NotFound(format!("Stake account for {} not found", mint))
    })?;
    let stake = deserialize_staking_account::<StakeInfo>(&account, program_id)?;
    let pool_fee = rpc
        .get_account(pool_address)?
        .and_then(|pool| PoolState::try_from_account_data(&pool.data).ok())
        .map(|pool| pool.emergency_fee_percent)
        .unwrap_or(nft_staking::curve::DEFAULT_EMERGENCY_FEE_PERCENT);

    let days_staked = stake.days_staked(now);
    let earned = earned_rewards(stake.tier, stake.staked_at, now, stake.staking_period_days());
    Ok(StakeStatus {
        stake_info: address.to_string(),
        owner: stake.owner.to_string(),
        summary: stake_summary(&stake, now, pool_fee),
        staking_period_days: stake.staking_period_days(),
        days_staked,
        auto_compound: stake.auto_compound,
        milestones_achieved: stake.milestones(),
        next_milestone: next_milestone(days_staked),
        earned_rewards: earned.earned,
        progress_percentage: earned.progress_percentage,
    })
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct PoolSummary {
    pub admin: String,
    pub reward_rate: u64,
    pub emergency_fee_percent: u8,
    pub paused: bool,
    pub total_staked: u64,
    pub max_nfts_per_user: u8,
    pub has_reward_vault: bool,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct PoolDiagnosis {
    #[serde(flatten)]
    pub check: AccountCheck,
    /// `"valid"`, `"invalid"` or `"missing"`.
    pub status: &'static str,
    pub message: String,
    /// The `"pool"` seed PDA. Older deployments keep the pool state in a
    /// keypair account instead.
    pub pool_pda: AccountPresence,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pool: Option<PoolSummary>,
}

pub fn diagnose_pool_state(
    rpc: &dyn StakingRpc,
    program_id: &Pubkey,
    pool_address: &Pubkey,
) -> Result<PoolDiagnosis> {
    let account = rpc.get_account(pool_address)?;
    let check = AccountCheck::inspect(
        pool_address,
        account.as_ref(),
        program_id,
        &discriminator::POOL_STATE,
    );
    let (pda, _) = get_pool_address(program_id);
    let pda_exists = if pda == *pool_address {
        check.exists
    } else {
        rpc.get_account(&pda)?.is_some()
    };
    let pool_pda = AccountPresence {
        address: pda.to_string(),
        exists: pda_exists,
    };
    if !check.exists {
        return Ok(PoolDiagnosis {
            check,
            status: "missing",
            message: "Pool state account does not exist, an admin must initialize it".to_string(),
            pool_pda,
            pool: None,
        });
    }
    if !check.is_valid() {
        return Ok(PoolDiagnosis {
            check,
            status: "invalid",
            message: "Pool state account has the wrong owner or discriminator".to_string(),
            pool_pda,
            pool: None,
        });
    }
    let data = account.map(|a| a.data).unwrap_or_default();
    match PoolState::try_from_account_data(&data) {
        Ok(pool) => Ok(PoolDiagnosis {
            check,
            status: "valid",
            message: "Pool state account is initialized".to_string(),
            pool_pda,
            pool: Some(PoolSummary {
                admin: pool.admin.to_string(),
                reward_rate: pool.reward_rate,
                emergency_fee_percent: pool.emergency_fee_percent,
                paused: pool.paused,
                total_staked: pool.total_staked,
                max_nfts_per_user: pool.max_nfts_per_user,
                has_reward_vault: pool.has_reward_vault(),
            }),
        }),
        Err(e) => Ok(PoolDiagnosis {
            check,
            status: "invalid",
            message: format!("Pool state account does not decode: {}", e),
            pool_pda,
            pool: None,
        }),
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ProgramStats {
    pub total_accounts: usize,
    /// Accounts per known kind, keyed by account name.
    pub counts: BTreeMap<&'static str, usize>,
    pub unknown_accounts: usize,
    pub pool_state_accounts: Vec<String>,
    pub total_data_size: usize,
}

pub fn program_stats(rpc: &dyn StakingRpc, program_id: &Pubkey) -> Result<ProgramStats> {
    let accounts = rpc.get_program_accounts(program_id, None)?;
    let mut stats = ProgramStats {
        total_accounts: accounts.len(),
        counts: BTreeMap::new(),
        unknown_accounts: 0,
        pool_state_accounts: Vec::new(),
        total_data_size: 0,
    };
    for (address, account) in &accounts {
        stats.total_data_size += account.data.len();
        match AccountKind::from_account_data(&account.data) {
            Some(kind) => {
                *stats.counts.entry(kind.name()).or_default() += 1;
                if kind == AccountKind::PoolState {
                    stats.pool_state_accounts.push(address.to_string());
                }
            }
            None => stats.unknown_accounts += 1,
        }
    }
    log_debug!(
        "diagnostics",
        "{} program accounts, {} unknown",
        stats.total_accounts,
        stats.unknown_accounts
    );
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::rpc::mock::MockRpc;
    use nft_staking::states::{Tier, UserStakingInfo};

    const NOW: i64 = 1_700_000_000;

    fn staked(rpc: &MockRpc, mint: &Pubkey, wallet: &Pubkey, owner: Pubkey) {
        let stake = StakeInfo {
            owner: *wallet,
            mint: *mint,
            staked_at: NOW - 20 * SECONDS_PER_DAY,
            release_date: NOW + 10 * SECONDS_PER_DAY,
            is_staked: true,
            tier: Tier::Legendary,
            staking_period: 30 * SECONDS_PER_DAY as u64,
            ..StakeInfo::default()
        };
        let (address, _) = get_stake_info_address(mint, &nft_staking::ID);
        rpc.set_account(address, owner, stake.to_account_data().unwrap());
    }

    fn user_account(rpc: &MockRpc, wallet: &Pubkey) {
        let info = UserStakingInfo {
            owner: *wallet,
            staked_count: 1,
            ..UserStakingInfo::default()
        };
        let (address, _) = get_user_staking_info_address(wallet, &nft_staking::ID);
        rpc.set_account(address, nft_staking::ID, info.to_account_data().unwrap());
    }

    fn pool(rpc: &MockRpc) -> Pubkey {
        let address = nft_staking::pool_state_account::ID;
        rpc.set_account(
            address,
            nft_staking::ID,
            PoolState::default().to_account_data().unwrap(),
        );
        address
    }

    #[test]
    fn locked_stake_can_still_unstake() {
        let rpc = MockRpc::new();
        let (mint, wallet) = (Pubkey::new_unique(), Pubkey::new_unique());
        staked(&rpc, &mint, &wallet, nft_staking::ID);
        user_account(&rpc, &wallet);
        let pool_address = pool(&rpc);

        let report =
            diagnose_staking_account(&rpc, &nft_staking::ID, &pool_address, &mint, &wallet, NOW)
                .unwrap();
        assert!(report.can_unstake);
        assert!(report.issues.is_empty());
        assert_eq!(report.recommended_action, "proceed");
        assert_eq!(report.actions, vec![RecommendedAction::Proceed]);
        assert_eq!(report.stake_info.discriminator, hex::encode(discriminator::STAKE_INFO));

        let stake = report.stake.unwrap();
        assert!(stake.early_unstake);
        assert_eq!(stake.tier, "LEGENDARY");
        assert!((stake.days_remaining - 10.0).abs() < 1e-9);
        // two thirds served
        assert_eq!(stake.penalty_percent, 15);
    }

    #[test]
    fn foreign_owner_blocks_unstake() {
        let rpc = MockRpc::new();
        let (mint, wallet) = (Pubkey::new_unique(), Pubkey::new_unique());
        staked(&rpc, &mint, &wallet, Pubkey::new_unique());
        let pool_address = pool(&rpc);

        let report =
            diagnose_staking_account(&rpc, &nft_staking::ID, &pool_address, &mint, &wallet, NOW)
                .unwrap();
        assert!(!report.can_unstake);
        assert_eq!(report.recommended_action, "fix");
        assert_eq!(report.issues.len(), 2);
        assert_eq!(report.issues[0].kind, IssueKind::WrongOwner);
        assert_eq!(report.issues[1].kind, IssueKind::MissingAccount);
        assert_eq!(report.actions, vec![RecommendedAction::InitUserAccount]);
        assert!(report.stake.is_none());
    }

    #[test]
    fn missing_everything() {
        let rpc = MockRpc::new();
        let (mint, wallet) = (Pubkey::new_unique(), Pubkey::new_unique());
        let report = diagnose_staking_account(
            &rpc,
            &nft_staking::ID,
            &nft_staking::pool_state_account::ID,
            &mint,
            &wallet,
            NOW,
        )
        .unwrap();
        assert_eq!(
            report.actions,
            vec![
                RecommendedAction::Restake,
                RecommendedAction::AdminInitPool,
                RecommendedAction::InitUserAccount,
            ]
        );
        assert_eq!(report.pool_state.status, "missing");
    }

    #[test]
    fn wrong_discriminator_is_only_issue_once_owned() {
        let check = AccountCheck::inspect(
            &Pubkey::new_unique(),
            Some(&Account {
                lamports: 1,
                data: vec![9; 40],
                owner: nft_staking::ID,
                executable: false,
                rent_epoch: 0,
            }),
            &nft_staking::ID,
            &discriminator::USER_STAKING_INFO,
        );
        let issue = check
            .issue("user_staking_info", &discriminator::USER_STAKING_INFO)
            .unwrap();
        assert_eq!(issue.kind, IssueKind::WrongDiscriminator);
        assert_eq!(check.discriminator, "0909090909090909");
    }

    #[test]
    fn pool_diagnosis_decodes_valid_pool() {
        let rpc = MockRpc::new();
        let address = pool(&rpc);
        let report = diagnose_pool_state(&rpc, &nft_staking::ID, &address).unwrap();
        assert_eq!(report.status, "valid");
        let summary = report.pool.unwrap();
        assert!(!summary.paused);
        assert_eq!(summary.max_nfts_per_user, 5);

        rpc.set_account(address, nft_staking::ID, discriminator::STAKE_INFO.to_vec());
        let report = diagnose_pool_state(&rpc, &nft_staking::ID, &address).unwrap();
        assert_eq!(report.status, "invalid");
    }

    #[test]
    fn pool_diagnosis_reports_seed_pda() {
        let rpc = MockRpc::new();
        let (pda, _) = get_pool_address(&nft_staking::ID);

        let address = pool(&rpc);
        let report = diagnose_pool_state(&rpc, &nft_staking::ID, &address).unwrap();
        assert_eq!(report.pool_pda.address, pda.to_string());
        assert!(!report.pool_pda.exists);

        rpc.set_account(
            pda,
            nft_staking::ID,
            PoolState::default().to_account_data().unwrap(),
        );
        let report = diagnose_pool_state(&rpc, &nft_staking::ID, &pda).unwrap();
        assert_eq!(report.status, "valid");
        assert_eq!(report.check.address, pda.to_string());
        assert!(report.pool_pda.exists);

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["pool_pda"]["exists"], true);
    }

    #[test]
    fn stake_status_reports_milestones() {
        let rpc = MockRpc::new();
        let mint = Pubkey::new_unique();
        let stake = StakeInfo {
            owner: Pubkey::new_unique(),
            mint,
            staked_at: NOW - 40 * SECONDS_PER_DAY,
            release_date: NOW + 50 * SECONDS_PER_DAY,
            is_staked: true,
            staking_period: 90 * SECONDS_PER_DAY as u64,
            milestones_achieved: 1,
            ..StakeInfo::default()
        };
        let (address, _) = get_stake_info_address(&mint, &nft_staking::ID);
        rpc.set_account(address, nft_staking::ID, stake.to_account_data().unwrap());

        let status = stake_status(
            &rpc,
            &nft_staking::ID,
            &nft_staking::pool_state_account::ID,
            &mint,
            NOW,
        )
        .unwrap();
        assert_eq!(status.days_staked, 40);
        assert_eq!(status.staking_period_days, 90);
        assert_eq!(status.milestones_achieved, vec![30]);
        assert_eq!(status.next_milestone, Some(90));
        assert!(status.earned_rewards > 0.0);

        let missing = stake_status(
            &rpc,
            &nft_staking::ID,
            &nft_staking::pool_state_account::ID,
            &Pubkey::new_unique(),
            NOW,
        );
        assert_eq!(crate::api::status_of(&missing.unwrap_err()), 404);
    }

    #[test]
    fn stats_classify_by_discriminator() {
        let rpc = MockRpc::new();
        pool(&rpc);
        let wallet = Pubkey::new_unique();
        user_account(&rpc, &wallet);
        staked(&rpc, &Pubkey::new_unique(), &wallet, nft_staking::ID);
        staked(&rpc, &Pubkey::new_unique(), &wallet, nft_staking::ID);
        rpc.set_account(Pubkey::new_unique(), nft_staking::ID, vec![1, 2, 3]);
        rpc.set_account(Pubkey::new_unique(), Pubkey::new_unique(), vec![0; 8]);

        let stats = program_stats(&rpc, &nft_staking::ID).unwrap();
        assert_eq!(stats.total_accounts, 5);
        assert_eq!(stats.counts.get("StakeInfo"), Some(&2));
        assert_eq!(stats.counts.get("UserStakingInfo"), Some(&1));
        assert_eq!(stats.unknown_accounts, 1);
        assert_eq!(
            stats.pool_state_accounts,
            vec![nft_staking::pool_state_account::ID.to_string()]
        );
    }
}
