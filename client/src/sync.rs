//! Admin reconciliation between on-chain stake accounts and the store.
//! Batches are capped and report what was skipped.

use anyhow::Result;
use nft_staking::states::{discriminator, AccountLayout, StakeInfo};
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;

use crate::api::ApiError;
use crate::instructions::rpc::StakingRpc;
use crate::instructions::utils::{deserialize_staking_account, get_stake_info_address};
use crate::store::{staking_record, StakingRecord, StakingStatus, StakingStore};
use crate::ClientConfig;

pub const SYNC_ALL_LIMIT: usize = 50;
pub const DISCREPANCY_LIMIT: usize = 100;

/// Checks the shared admin secret. An unset secret rejects everyone.
pub fn test_auth(config: &ClientConfig, provided: Option<&str>) -> Result<()> {
    match (config.admin_secret.as_deref(), provided) {
        (Some(expected), Some(provided)) if !expected.is_empty() && expected == provided => Ok(()),
        _ => Err(ApiError::Unauthorized.into()),
    }
}

#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SyncStatus {
    Synchronized,
    Unstaked,
    Skipped,
    Error,
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct SyncItem {
    /// Stake account address.
    pub account: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mint: Option<String>,
    pub status: SyncStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl SyncItem {
    fn new(account: &Pubkey, mint: Option<&Pubkey>, status: SyncStatus) -> Self {
        Self {
            account: account.to_string(),
            mint: mint.map(Pubkey::to_string),
            status,
            reason: None,
            error: None,
        }
    }

    fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    fn failed(account: &Pubkey, mint: Option<&Pubkey>, error: &anyhow::Error) -> Self {
        Self {
            error: Some(format!("{:#}", error)),
            ..Self::new(account, mint, SyncStatus::Error)
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct BatchReport {
    pub total: usize,
    pub processed: usize,
    pub synchronized: usize,
    pub results: Vec<SyncItem>,
}

impl BatchReport {
    fn new(total: usize, results: Vec<SyncItem>) -> Self {
        Self {
            total,
            processed: results.len(),
            synchronized: results
                .iter()
                .filter(|item| item.status == SyncStatus::Synchronized)
                .count(),
            results,
        }
    }
}

fn upsert_stake(
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    stake: &StakeInfo,
    now: i64,
) -> Result<()> {
    let record = staking_record(store, &stake.mint.to_string(), stake, &config.images(), now)?;
    store.upsert_staking(record)
}

/// Mirror one mint's stake account into the store.
pub fn sync_nft(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    mint: &Pubkey,
    now: i64,
) -> Result<SyncItem> {
    let (address, _bump) = get_stake_info_address(mint, &config.program_id);
    let Some(account) = rpc.get_account(&address)? else {
        store.mark_unstaked(&mint.to_string(), now)?;
        return Ok(SyncItem::new(&address, Some(mint), SyncStatus::Unstaked)
            .with_reason("Stake account not found on chain"));
    };
    let stake = deserialize_staking_account::<StakeInfo>(&account, &config.program_id)?;
    if !stake.is_staked {
        store.mark_unstaked(&mint.to_string(), now)?;
        return Ok(SyncItem::new(&address, Some(mint), SyncStatus::Unstaked)
            .with_reason("NFT is unstaked on chain"));
    }
    upsert_stake(config, store, &stake, now)?;
    log_info!("sync", "synchronized {}", mint);
    Ok(SyncItem::new(&address, Some(mint), SyncStatus::Synchronized))
}

/// Decoded stake accounts, in RPC order. Malformed accounts are logged and
/// returned as errors for the caller to report or drop.
fn stake_accounts(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
) -> Result<Vec<(Pubkey, Result<StakeInfo>)>> {
    let accounts = rpc.get_program_accounts(&config.program_id, Some(&discriminator::STAKE_INFO))?;
    Ok(accounts
        .into_iter()
        .map(|(address, account)| {
            let decoded = StakeInfo::try_from_account_data(&account.data).map_err(|e| {
                log_warn!("sync", "stake account {} unreadable: {}", address, e);
                anyhow::Error::from(e)
            });
            (address, decoded)
        })
        .collect())
}

pub fn sync_wallet(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    wallet: &Pubkey,
    now: i64,
) -> Result<BatchReport> {
    let stakes: Vec<(Pubkey, StakeInfo)> = stake_accounts(rpc, config)?
        .into_iter()
        .filter_map(|(address, decoded)| decoded.ok().map(|stake| (address, stake)))
        .filter(|(_, stake)| stake.owner == *wallet)
        .collect();

    let results = stakes
        .iter()
        .map(|(address, stake)| {
            if !stake.is_staked {
                return SyncItem::new(address, Some(&stake.mint), SyncStatus::Skipped)
                    .with_reason("NFT is unstaked");
            }
            match upsert_stake(config, store, stake, now) {
                Ok(()) => SyncItem::new(address, Some(&stake.mint), SyncStatus::Synchronized),
                Err(e) => SyncItem::failed(address, Some(&stake.mint), &e),
            }
        })
        .collect();
    Ok(BatchReport::new(stakes.len(), results))
}

/// Sync the first `SYNC_ALL_LIMIT` stake accounts. `total` counts all of them.
pub fn sync_all(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &mut dyn StakingStore,
    now: i64,
) -> Result<BatchReport> {
    let accounts = stake_accounts(rpc, config)?;
    let total = accounts.len();
    let results = accounts
        .into_iter()
        .take(SYNC_ALL_LIMIT)
        .map(|(address, decoded)| match decoded {
            Err(e) => SyncItem::failed(&address, None, &e),
            Ok(stake) if !stake.is_staked => {
                SyncItem::new(&address, Some(&stake.mint), SyncStatus::Skipped)
                    .with_reason("NFT is unstaked")
            }
            Ok(stake) => match upsert_stake(config, store, &stake, now) {
                Ok(()) => SyncItem::new(&address, Some(&stake.mint), SyncStatus::Synchronized),
                Err(e) => SyncItem::failed(&address, Some(&stake.mint), &e),
            },
        })
        .collect();
    let report = BatchReport::new(total, results);
    if report.total > report.processed {
        log_info!(
            "sync",
            "processed {} of {} stake accounts",
            report.processed,
            report.total
        );
    }
    Ok(report)
}

#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ChainStake {
    pub mint_address: String,
    pub wallet_address: String,
    pub staked_at: i64,
    pub release_date: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct DiscrepancyReport {
    /// On-chain accounts compared against the store.
    pub total_checked: usize,
    pub missing_on_chain: Vec<StakingRecord>,
    pub missing_in_db: Vec<ChainStake>,
    /// Mints of staked rows without an image URL.
    pub missing_image_url: Vec<String>,
}

pub fn check_discrepancies(
    rpc: &dyn StakingRpc,
    config: &ClientConfig,
    store: &dyn StakingStore,
) -> Result<DiscrepancyReport> {
    let staked_rows = store.staked_records()?;

    let mut missing_on_chain = Vec::new();
    for row in &staked_rows {
        let Ok(mint) = row.mint_address.parse::<Pubkey>() else {
            log_warn!("sync", "store row has invalid mint {}", row.mint_address);
            continue;
        };
        let (address, _bump) = get_stake_info_address(&mint, &config.program_id);
        match rpc.get_account(&address)? {
            None => missing_on_chain.push(row.clone()),
            Some(account) => match StakeInfo::try_from_account_data(&account.data) {
                Ok(stake) if !stake.is_staked => missing_on_chain.push(row.clone()),
                Ok(_) => {}
                Err(e) => log_warn!("sync", "stake account {} unreadable: {}", address, e),
            },
        }
    }

    let chain_stakes: Vec<StakeInfo> = stake_accounts(rpc, config)?
        .into_iter()
        .filter_map(|(_, decoded)| decoded.ok())
        .take(DISCREPANCY_LIMIT)
        .collect();
    let mut missing_in_db = Vec::new();
    for stake in chain_stakes.iter().filter(|stake| stake.is_staked) {
        let mint = stake.mint.to_string();
        let tracked = store
            .get_staking(&mint)?
            .is_some_and(|row| row.status == StakingStatus::Staked);
        if !tracked {
            missing_in_db.push(ChainStake {
                mint_address: mint,
                wallet_address: stake.owner.to_string(),
                staked_at: stake.staked_at,
                release_date: stake.release_date,
            });
        }
    }

    let missing_image_url = staked_rows
        .iter()
        .filter(|row| row.image_url.as_deref().map_or(true, str::is_empty))
        .map(|row| row.mint_address.clone())
        .collect();

    Ok(DiscrepancyReport {
        total_checked: chain_stakes.len(),
        missing_on_chain,
        missing_in_db,
        missing_image_url,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::instructions::rpc::mock::MockRpc;
    use crate::store::MemoryStore;
    use nft_staking::SECONDS_PER_DAY;

    const NOW: i64 = 1_700_000_000;

    fn put_stake(rpc: &MockRpc, config: &ClientConfig, owner: &Pubkey, staked: bool) -> Pubkey {
        let mint = Pubkey::new_unique();
        let stake = StakeInfo {
            owner: *owner,
            mint,
            staked_at: NOW - SECONDS_PER_DAY,
            release_date: NOW + 29 * SECONDS_PER_DAY,
            is_staked: staked,
            ..StakeInfo::default()
        };
        let (address, _) = get_stake_info_address(&mint, &config.program_id);
        rpc.set_account(address, config.program_id, stake.to_account_data().unwrap());
        mint
    }

    #[test]
    fn auth_requires_matching_secret() {
        let mut config = ClientConfig::default();
        assert!(test_auth(&config, Some("anything")).is_err());
        config.admin_secret = Some("s3cret".to_string());
        assert!(test_auth(&config, Some("s3cret")).is_ok());
        let err = test_auth(&config, Some("wrong")).unwrap_err();
        assert_eq!(crate::api::status_of(&err), 401);
        assert!(test_auth(&config, None).is_err());
    }

    #[test]
    fn sync_all_is_capped() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let owner = Pubkey::new_unique();
        for _ in 0..80 {
            put_stake(&rpc, &config, &owner, true);
        }
        let mut store = MemoryStore::default();
        let report = sync_all(&rpc, &config, &mut store, NOW).unwrap();
        assert_eq!(report.total, 80);
        assert_eq!(report.processed, 50);
        assert_eq!(report.synchronized, 50);
        assert_eq!(store.tables.nft_staking.len(), 50);

        // syncing again changes nothing
        sync_all(&rpc, &config, &mut store, NOW).unwrap();
        assert_eq!(store.tables.nft_staking.len(), 50);
    }

    #[test]
    fn sync_all_records_per_item_outcomes() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let owner = Pubkey::new_unique();
        put_stake(&rpc, &config, &owner, true);
        put_stake(&rpc, &config, &owner, false);
        let mut broken = discriminator::STAKE_INFO.to_vec();
        broken.extend_from_slice(&[0; 10]);
        rpc.set_account(Pubkey::new_unique(), config.program_id, broken);

        let mut store = MemoryStore::default();
        let report = sync_all(&rpc, &config, &mut store, NOW).unwrap();
        assert_eq!(report.total, 3);
        let count = |status| report.results.iter().filter(|r| r.status == status).count();
        assert_eq!(count(SyncStatus::Synchronized), 1);
        assert_eq!(count(SyncStatus::Skipped), 1);
        assert_eq!(count(SyncStatus::Error), 1);
    }

    #[test]
    fn extreme_dates_do_not_abort_the_batch() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let owner = Pubkey::new_unique();
        put_stake(&rpc, &config, &owner, true);
        let mint = Pubkey::new_unique();
        let stake = StakeInfo {
            owner,
            mint,
            staked_at: 0,
            release_date: i64::MAX,
            is_staked: true,
            ..StakeInfo::default()
        };
        let (address, _) = get_stake_info_address(&mint, &config.program_id);
        rpc.set_account(address, config.program_id, stake.to_account_data().unwrap());
        put_stake(&rpc, &config, &owner, true);

        let mut store = MemoryStore::default();
        let report = sync_all(&rpc, &config, &mut store, NOW).unwrap();
        assert_eq!(report.total, 3);
        assert_eq!(report.processed, 3);
        assert_eq!(report.synchronized, 3);
        let row = store.get_staking(&mint.to_string()).unwrap().unwrap();
        assert_eq!(row.release_date, i64::MAX);
    }

    #[test]
    fn sync_nft_marks_unstaked_rows() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let owner = Pubkey::new_unique();
        let mint = put_stake(&rpc, &config, &owner, true);
        let mut store = MemoryStore::default();

        let item = sync_nft(&rpc, &config, &mut store, &mint, NOW).unwrap();
        assert_eq!(item.status, SyncStatus::Synchronized);
        let row = store.get_staking(&mint.to_string()).unwrap().unwrap();
        assert_eq!(row.wallet_address, owner.to_string());

        let (address, _) = get_stake_info_address(&mint, &config.program_id);
        rpc.accounts.borrow_mut().remove(&address);
        let item = sync_nft(&rpc, &config, &mut store, &mint, NOW + 1).unwrap();
        assert_eq!(item.status, SyncStatus::Unstaked);
        let row = store.get_staking(&mint.to_string()).unwrap().unwrap();
        assert_eq!(row.status, StakingStatus::Unstaked);

        rpc.set_account(address, config.program_id, vec![0; 4]);
        assert!(sync_nft(&rpc, &config, &mut store, &mint, NOW).is_err());
    }

    #[test]
    fn sync_wallet_filters_by_owner() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let wallet = Pubkey::new_unique();
        put_stake(&rpc, &config, &wallet, true);
        put_stake(&rpc, &config, &wallet, false);
        put_stake(&rpc, &config, &Pubkey::new_unique(), true);

        let mut store = MemoryStore {
            fail_writes: true,
            ..MemoryStore::default()
        };
        let report = sync_wallet(&rpc, &config, &mut store, &wallet, NOW).unwrap();
        assert_eq!(report.total, 2);
        assert_eq!(report.synchronized, 0);
        assert!(report.results.iter().any(|r| r.status == SyncStatus::Error));
        assert!(report.results.iter().any(|r| r.status == SyncStatus::Skipped));
    }

    #[test]
    fn discrepancies_compare_both_directions() {
        let rpc = MockRpc::new();
        let config = ClientConfig::default();
        let owner = Pubkey::new_unique();
        let tracked = put_stake(&rpc, &config, &owner, true);
        let untracked = put_stake(&rpc, &config, &owner, true);

        let mut store = MemoryStore::default();
        sync_nft(&rpc, &config, &mut store, &tracked, NOW).unwrap();

        let gone = Pubkey::new_unique();
        let mut stale = store.get_staking(&tracked.to_string()).unwrap().unwrap();
        stale.mint_address = gone.to_string();
        stale.image_url = None;
        store.upsert_staking(stale).unwrap();

        let report = check_discrepancies(&rpc, &config, &store).unwrap();
        assert_eq!(report.total_checked, 2);
        assert_eq!(report.missing_on_chain.len(), 1);
        assert_eq!(report.missing_on_chain[0].mint_address, gone.to_string());
        assert_eq!(report.missing_in_db.len(), 1);
        assert_eq!(report.missing_in_db[0].mint_address, untracked.to_string());
        assert_eq!(report.missing_image_url, vec![gone.to_string()]);
    }
}
