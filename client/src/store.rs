//! Off-chain mirror of staking state. The chain is authoritative; these rows
//! only cache what the last sync saw.

use anyhow::{Context, Result};
use nft_staking::curve::daily_base_rate;
use nft_staking::states::StakeInfo;
use nft_staking::SECONDS_PER_DAY;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

pub const DEFAULT_IMAGES_CID: &str = "bafybeihq6qozwmf4t6omeyuunj7r7vdj26l4akuzmcnnu5pgemd6bxjike";
pub const DEFAULT_IPFS_GATEWAY: &str = "https://tesola.mypinata.cloud/ipfs/";

#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StakingStatus {
    Staked,
    Unstaked,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct StakingRecord {
    pub mint_address: String,
    pub wallet_address: String,
    pub nft_id: String,
    pub nft_name: String,
    pub nft_tier: String,
    pub staked_at: i64,
    pub release_date: i64,
    /// Whole days, rounded up.
    pub staking_period: u64,
    pub daily_reward_rate: f64,
    pub total_rewards: f64,
    pub status: StakingStatus,
    pub image_url: Option<String>,
    pub nft_image: Option<String>,
    pub ipfs_hash: Option<String>,
    pub last_verified: i64,
    #[serde(default)]
    pub unstaked_at: Option<i64>,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ContestVote {
    pub meme: String,
    pub voter: String,
    pub voting_power: u64,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct ProposalRecord {
    pub proposal: String,
    pub creator: String,
    pub proposal_id: u64,
    pub title: String,
    pub description: String,
    pub created_at: i64,
}

#[derive(Serialize, Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct StoreTables {
    /// Keyed by mint address.
    pub nft_staking: BTreeMap<String, StakingRecord>,
    /// Mint address to collection index.
    pub minted_nfts: BTreeMap<String, u32>,
    pub contest_votes: Vec<ContestVote>,
    pub governance_proposals: Vec<ProposalRecord>,
}

pub trait StakingStore {
    /// Insert or replace the row for `record.mint_address`.
    fn upsert_staking(&mut self, record: StakingRecord) -> Result<()>;

    /// Flip a staked row to unstaked. Returns whether a row changed.
    fn mark_unstaked(&mut self, mint: &str, now: i64) -> Result<bool>;

    fn get_staking(&self, mint: &str) -> Result<Option<StakingRecord>>;

    fn staked_records(&self) -> Result<Vec<StakingRecord>>;

    fn minted_nft_index(&self, mint: &str) -> Result<Option<u32>>;

    fn has_contest_vote(&self, meme: &str, voter: &str) -> Result<bool>;

    fn insert_contest_vote(&mut self, vote: ContestVote) -> Result<()>;

    fn insert_proposal(&mut self, proposal: ProposalRecord) -> Result<()>;
}

impl StoreTables {
    fn upsert_staking(&mut self, record: StakingRecord) {
        self.nft_staking.insert(record.mint_address.clone(), record);
    }

    fn mark_unstaked(&mut self, mint: &str, now: i64) -> bool {
        match self.nft_staking.get_mut(mint) {
            Some(row) if row.status == StakingStatus::Staked => {
                row.status = StakingStatus::Unstaked;
                row.unstaked_at = Some(now);
                row.last_verified = now;
                true
            }
            _ => false,
        }
    }

    fn staked_records(&self) -> Vec<StakingRecord> {
        self.nft_staking
            .values()
            .filter(|row| row.status == StakingStatus::Staked)
            .cloned()
            .collect()
    }

    fn has_contest_vote(&self, meme: &str, voter: &str) -> bool {
        self.contest_votes
            .iter()
            .any(|vote| vote.meme == meme && vote.voter == voter)
    }
}

/// Store persisted as a single pretty-printed JSON document.
pub struct JsonFileStore {
    path: PathBuf,
    tables: StoreTables,
}

impl JsonFileStore {
    /// A missing file opens as an empty store.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let tables = if path.exists() {
            let raw = std::fs::read_to_string(&path)
                .with_context(|| format!("failed to read store {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("failed to parse store {}", path.display()))?
        } else {
            StoreTables::default()
        };
        Ok(Self { path, tables })
    }

    fn save(&self) -> Result<()> {
        let raw = serde_json::to_string_pretty(&self.tables)?;
        std::fs::write(&self.path, raw)
            .with_context(|| format!("failed to write store {}", self.path.display()))
    }
}

impl StakingStore for JsonFileStore {
    fn upsert_staking(&mut self, record: StakingRecord) -> Result<()> {
        self.tables.upsert_staking(record);
        self.save()
    }

    fn mark_unstaked(&mut self, mint: &str, now: i64) -> Result<bool> {
        let changed = self.tables.mark_unstaked(mint, now);
        if changed {
            self.save()?;
        }
        Ok(changed)
    }

    fn get_staking(&self, mint: &str) -> Result<Option<StakingRecord>> {
        Ok(self.tables.nft_staking.get(mint).cloned())
    }

    fn staked_records(&self) -> Result<Vec<StakingRecord>> {
        Ok(self.tables.staked_records())
    }

    fn minted_nft_index(&self, mint: &str) -> Result<Option<u32>> {
        Ok(self.tables.minted_nfts.get(mint).copied())
    }

    fn has_contest_vote(&self, meme: &str, voter: &str) -> Result<bool> {
        Ok(self.tables.has_contest_vote(meme, voter))
    }

    fn insert_contest_vote(&mut self, vote: ContestVote) -> Result<()> {
        self.tables.contest_votes.push(vote);
        self.save()
    }

    fn insert_proposal(&mut self, proposal: ProposalRecord) -> Result<()> {
        self.tables.governance_proposals.push(proposal);
        self.save()
    }
}

/// In-memory store. `fail_writes` makes every write return an error.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct MemoryStore {
    pub tables: StoreTables,
    pub fail_writes: bool,
}

#[cfg(test)]
impl MemoryStore {
    fn check_writable(&self) -> Result<()> {
        if self.fail_writes {
            anyhow::bail!("store is read-only");
        }
        Ok(())
    }
}

#[cfg(test)]
impl StakingStore for MemoryStore {
    fn upsert_staking(&mut self, record: StakingRecord) -> Result<()> {
        self.check_writable()?;
        self.tables.upsert_staking(record);
        Ok(())
    }

    fn mark_unstaked(&mut self, mint: &str, now: i64) -> Result<bool> {
        self.check_writable()?;
        Ok(self.tables.mark_unstaked(mint, now))
    }

    fn get_staking(&self, mint: &str) -> Result<Option<StakingRecord>> {
        Ok(self.tables.nft_staking.get(mint).cloned())
    }

    fn staked_records(&self) -> Result<Vec<StakingRecord>> {
        Ok(self.tables.staked_records())
    }

    fn minted_nft_index(&self, mint: &str) -> Result<Option<u32>> {
        Ok(self.tables.minted_nfts.get(mint).copied())
    }

    fn has_contest_vote(&self, meme: &str, voter: &str) -> Result<bool> {
        Ok(self.tables.has_contest_vote(meme, voter))
    }

    fn insert_contest_vote(&mut self, vote: ContestVote) -> Result<()> {
        self.check_writable()?;
        self.tables.contest_votes.push(vote);
        Ok(())
    }

    fn insert_proposal(&mut self, proposal: ProposalRecord) -> Result<()> {
        self.check_writable()?;
        self.tables.governance_proposals.push(proposal);
        Ok(())
    }
}

/// 32-bit rolling string hash over UTF-16 code units.
pub fn string_hash(value: &str) -> i32 {
    value.encode_utf16().fold(0i32, |hash, unit| {
        (hash << 5).wrapping_sub(hash).wrapping_add(unit as i32)
    })
}

/// Collection id used when a mint has no `minted_nfts` row, in 1..=999.
pub fn fallback_nft_id(mint: &str) -> u32 {
    string_hash(mint).unsigned_abs() % 999 + 1
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageUrls {
    pub ipfs_url: String,
    pub gateway_url: String,
    pub ipfs_hash: String,
}

pub fn image_urls(nft_id: u32, images_cid: &str, gateway: &str) -> ImageUrls {
    ImageUrls {
        ipfs_url: format!("ipfs://{}/{:04}.png", images_cid, nft_id),
        gateway_url: format!("{}{}/{:04}.png", gateway, images_cid, nft_id),
        ipfs_hash: images_cid.to_string(),
    }
}

/// Images location used when building store rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageSource {
    pub images_cid: String,
    pub gateway: String,
}

impl Default for ImageSource {
    fn default() -> Self {
        Self {
            images_cid: DEFAULT_IMAGES_CID.to_string(),
            gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }
}

/// Row mirroring a decoded stake account.
pub fn staking_record(
    store: &dyn StakingStore,
    mint: &str,
    stake: &StakeInfo,
    images: &ImageSource,
    now: i64,
) -> Result<StakingRecord> {
    let nft_id = match store.minted_nft_index(mint)? {
        Some(index) => index,
        None => fallback_nft_id(mint),
    };
    let span = stake.release_date.saturating_sub(stake.staked_at).max(0) as u64;
    let staking_period = span.div_ceil(SECONDS_PER_DAY as u64);
    let daily_reward_rate = daily_base_rate(stake.tier);
    let urls = image_urls(nft_id, &images.images_cid, &images.gateway);
    Ok(StakingRecord {
        mint_address: mint.to_string(),
        wallet_address: stake.owner.to_string(),
        nft_id: nft_id.to_string(),
        nft_name: format!("SOLARA #{}", nft_id),
        nft_tier: stake.tier.name().to_string(),
        staked_at: stake.staked_at,
        release_date: stake.release_date,
        staking_period,
        daily_reward_rate,
        total_rewards: daily_reward_rate * staking_period as f64,
        status: if stake.is_staked {
            StakingStatus::Staked
        } else {
            StakingStatus::Unstaked
        },
        image_url: Some(urls.ipfs_url),
        nft_image: Some(urls.gateway_url),
        ipfs_hash: Some(urls.ipfs_hash),
        last_verified: now,
        unstaked_at: None,
    })
}
