use anyhow::Result;
use nft_staking::states::{
    AccountLayout, Proposal, UserStakingInfo, VoteInfo, MAX_MEME_DESCRIPTION_LEN,
    MAX_MEME_TITLE_LEN,
};
use regex::Regex;
use serde::Serialize;
use solana_sdk::pubkey::Pubkey;
use std::sync::OnceLock;

use crate::api::ApiError;
use crate::instructions::rpc::StakingRpc;
use crate::instructions::utils::{get_user_staking_info_address, get_vote_address};

/// Staked NFTs needed to open a proposal.
pub const MIN_PROPOSAL_POWER: u64 = 10;
/// Staked NFTs needed to enter or vote in the meme contest.
pub const MIN_CONTEST_POWER: u64 = 1;

/// Voting power is the number of NFTs the wallet has staked. Missing or
/// unreadable user accounts count as zero.
pub fn voting_power(rpc: &dyn StakingRpc, program_id: &Pubkey, wallet: &Pubkey) -> Result<u64> {
    let (address, _bump) = get_user_staking_info_address(wallet, program_id);
    let Some(account) = rpc.get_account(&address)? else {
        log_debug!("governance", "no user staking account for {}", wallet);
        return Ok(0);
    };
    match UserStakingInfo::try_from_account_data(&account.data) {
        Ok(info) => Ok(info.staked_count as u64),
        Err(e) => {
            log_warn!("governance", "user staking account {} unreadable: {}", address, e);
            Ok(0)
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProposalDetails {
    pub title: String,
    pub start_time: u64,
    pub end_time: u64,
    pub quorum: u64,
    pub threshold: u32,
    pub for_votes: u64,
    pub against_votes: u64,
}

impl From<&Proposal> for ProposalDetails {
    fn from(proposal: &Proposal) -> Self {
        Self {
            title: proposal.title.clone(),
            start_time: proposal.start_time,
            end_time: proposal.end_time,
            quorum: proposal.quorum,
            threshold: proposal.threshold,
            for_votes: proposal.for_votes,
            against_votes: proposal.against_votes,
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ExistingVote {
    pub side: &'static str,
    pub weight: u64,
    pub timestamp: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct VoteEligibility {
    pub can_vote: bool,
    pub reason: Option<String>,
    pub voting_power: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub existing_vote: Option<ExistingVote>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub proposal: Option<ProposalDetails>,
}

impl VoteEligibility {
    fn denied(reason: impl Into<String>, voting_power: u64) -> Self {
        Self {
            can_vote: false,
            reason: Some(reason.into()),
            voting_power,
            existing_vote: None,
            proposal: None,
        }
    }
}

/// Whether `wallet` may vote on `proposal` at `now`. The first failing check
/// is reported as the reason.
pub fn can_vote(
    rpc: &dyn StakingRpc,
    program_id: &Pubkey,
    wallet: &Pubkey,
    proposal_key: &Pubkey,
    now: i64,
) -> Result<VoteEligibility> {
    let power = voting_power(rpc, program_id, wallet)?;
    if power == 0 {
        return Ok(VoteEligibility::denied(
            "No staked NFTs, voting power is zero",
            0,
        ));
    }

    let (vote_address, _bump) = get_vote_address(proposal_key, wallet, program_id);
    if let Some(account) = rpc.get_account(&vote_address)? {
        let mut denied = VoteEligibility::denied("Already voted on this proposal", power);
        if let Ok(vote) = VoteInfo::try_from_account_data(&account.data) {
            let side = if vote.is_for() { "for" } else { "against" };
            denied.reason = Some(format!("Already voted {} this proposal", side));
            denied.existing_vote = Some(ExistingVote {
                side,
                weight: vote.weight,
                timestamp: vote.timestamp,
            });
        }
        return Ok(denied);
    }

    let Some(account) = rpc.get_account(proposal_key)? else {
        return Ok(VoteEligibility::denied("Proposal not found", power));
    };
    let proposal = match Proposal::try_from_account_data(&account.data) {
        Ok(proposal) => proposal,
        Err(e) => {
            log_debug!("governance", "proposal {} rejected: {}", proposal_key, e);
            return Ok(VoteEligibility::denied(
                "Not a valid proposal account",
                power,
            ));
        }
    };

    let now = now.max(0) as u64;
    let reason = if now < proposal.start_time {
        Some("Voting period has not started")
    } else if now > proposal.end_time {
        Some("Voting period has ended")
    } else if proposal.is_executed {
        Some("Proposal has already been executed")
    } else {
        None
    };
    Ok(VoteEligibility {
        can_vote: reason.is_none(),
        reason: reason.map(str::to_string),
        voting_power: power,
        existing_vote: None,
        proposal: Some(ProposalDetails::from(&proposal)),
    })
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct ProposalStatus {
    pub proposal: String,
    pub creator: String,
    #[serde(flatten)]
    pub details: ProposalDetails,
    pub total_votes: u64,
    pub approval_percentage: f64,
    pub can_execute: bool,
    pub is_executed: bool,
    pub voting_open: bool,
}

pub fn proposal_status(
    rpc: &dyn StakingRpc,
    proposal_key: &Pubkey,
    now: i64,
) -> Result<ProposalStatus> {
    let account = rpc
        .get_account(proposal_key)?
        .ok_or_else(|| ApiError::NotFound(format!("Proposal {} not found", proposal_key)))?;
    let proposal = Proposal::try_from_account_data(&account.data)?;
    Ok(ProposalStatus {
        proposal: proposal_key.to_string(),
        creator: proposal.creator.to_string(),
        details: ProposalDetails::from(&proposal),
        total_votes: proposal.total_votes(),
        approval_percentage: proposal.approval_percentage(),
        can_execute: proposal.can_execute(),
        is_executed: proposal.is_executed,
        voting_open: proposal.is_voting_open(now.max(0) as u64),
    })
}

fn ipfs_hash_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^(Qm[1-9A-HJ-NP-Za-km-z]{44}|bafy[a-zA-Z0-9]{55})$").ok())
        .as_ref()
}

pub fn is_valid_ipfs_hash(hash: &str) -> bool {
    ipfs_hash_regex().is_some_and(|re| re.is_match(hash))
}

/// Input checks for a contest submission. Lengths count characters.
pub fn validate_meme(title: &str, description: &str, ipfs_hash: &str) -> Result<()> {
    let title_len = title.trim().chars().count();
    if title_len == 0 {
        return Err(ApiError::Validation("Meme title is required".to_string()).into());
    }
    if title_len > MAX_MEME_TITLE_LEN {
        return Err(ApiError::Validation(format!(
            "Meme title must be at most {} characters",
            MAX_MEME_TITLE_LEN
        ))
        .into());
    }
    if description.chars().count() > MAX_MEME_DESCRIPTION_LEN {
        return Err(ApiError::Validation(format!(
            "Meme description must be at most {} characters",
            MAX_MEME_DESCRIPTION_LEN
        ))
        .into());
    }
    if !is_valid_ipfs_hash(ipfs_hash) {
        return Err(ApiError::Validation("Invalid IPFS hash".to_string()).into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::status_of;
    use crate::instructions::rpc::mock::MockRpc;
    use nft_staking::states::VOTE_FOR;

    const NOW: i64 = 1_700_000_000;

    fn staker(rpc: &MockRpc, count: u8) -> Pubkey {
        let wallet = Pubkey::new_unique();
        let info = UserStakingInfo {
            owner: wallet,
            staked_count: count,
            staked_mints: vec![],
            collection_bonus: 0,
        };
        let (address, _) = get_user_staking_info_address(&wallet, &nft_staking::ID);
        rpc.set_account(address, nft_staking::ID, info.to_account_data().unwrap());
        wallet
    }

    fn proposal(rpc: &MockRpc, start: u64, end: u64, executed: bool) -> Pubkey {
        let key = Pubkey::new_unique();
        let p = Proposal {
            creator: Pubkey::new_unique(),
            title: "Raise rewards".to_string(),
            start_time: start,
            end_time: end,
            quorum: 3,
            threshold: 51,
            for_votes: 2,
            against_votes: 1,
            is_executed: executed,
            ..Proposal::default()
        };
        rpc.set_account(key, nft_staking::ID, p.to_account_data().unwrap());
        key
    }

    #[test]
    fn power_is_staked_count() {
        let rpc = MockRpc::new();
        let wallet = staker(&rpc, 4);
        assert_eq!(voting_power(&rpc, &nft_staking::ID, &wallet).unwrap(), 4);
        assert_eq!(
            voting_power(&rpc, &nft_staking::ID, &Pubkey::new_unique()).unwrap(),
            0
        );

        let broken = Pubkey::new_unique();
        let (address, _) = get_user_staking_info_address(&broken, &nft_staking::ID);
        rpc.set_account(address, nft_staking::ID, vec![0; 64]);
        assert_eq!(voting_power(&rpc, &nft_staking::ID, &broken).unwrap(), 0);
    }

    #[test]
    fn eligibility_checks_run_in_order() {
        let rpc = MockRpc::new();
        let now = NOW as u64;

        let nobody = Pubkey::new_unique();
        let open = proposal(&rpc, now - 10, now + 10, false);
        let result = can_vote(&rpc, &nft_staking::ID, &nobody, &open, NOW).unwrap();
        assert!(!result.can_vote);
        assert_eq!(result.voting_power, 0);

        let wallet = staker(&rpc, 2);
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &open, NOW).unwrap();
        assert!(result.can_vote);
        assert_eq!(result.reason, None);

        let missing = Pubkey::new_unique();
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &missing, NOW).unwrap();
        assert_eq!(result.reason.as_deref(), Some("Proposal not found"));

        let not_a_proposal = Pubkey::new_unique();
        rpc.set_account(not_a_proposal, nft_staking::ID, vec![1; 200]);
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &not_a_proposal, NOW).unwrap();
        assert_eq!(result.reason.as_deref(), Some("Not a valid proposal account"));

        let future = proposal(&rpc, now + 5, now + 10, false);
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &future, NOW).unwrap();
        assert_eq!(result.reason.as_deref(), Some("Voting period has not started"));

        let ended = proposal(&rpc, now - 10, now - 1, true);
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &ended, NOW).unwrap();
        assert_eq!(result.reason.as_deref(), Some("Voting period has ended"));

        let executed = proposal(&rpc, now - 10, now + 10, true);
        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &executed, NOW).unwrap();
        assert_eq!(
            result.reason.as_deref(),
            Some("Proposal has already been executed")
        );
    }

    #[test]
    fn existing_vote_is_reported() {
        let rpc = MockRpc::new();
        let now = NOW as u64;
        let wallet = staker(&rpc, 1);
        let key = proposal(&rpc, now - 10, now + 10, false);
        let vote = VoteInfo {
            proposal: key,
            voter: wallet,
            side: VOTE_FOR,
            weight: 1,
            timestamp: NOW - 5,
        };
        let (address, _) = get_vote_address(&key, &wallet, &nft_staking::ID);
        rpc.set_account(address, nft_staking::ID, vote.to_account_data().unwrap());

        let result = can_vote(&rpc, &nft_staking::ID, &wallet, &key, NOW).unwrap();
        assert!(!result.can_vote);
        assert_eq!(result.reason.as_deref(), Some("Already voted for this proposal"));
        assert_eq!(result.existing_vote.unwrap().side, "for");
    }

    #[test]
    fn status_reports_execution_readiness() {
        let rpc = MockRpc::new();
        let key = proposal(&rpc, 0, 10, false);
        let status = proposal_status(&rpc, &key, NOW).unwrap();
        assert_eq!(status.total_votes, 3);
        assert!(status.can_execute);
        assert!(!status.voting_open);

        let err = proposal_status(&rpc, &Pubkey::new_unique(), NOW).unwrap_err();
        assert_eq!(status_of(&err), 404);
    }

    #[test]
    fn meme_input_validation() {
        let cid_v0 = format!("Qm{}", "a".repeat(44));
        let cid_v1 = format!("bafy{}", "b".repeat(55));
        assert!(validate_meme("gm", "", &cid_v0).is_ok());
        assert!(validate_meme("gm", "", &cid_v1).is_ok());
        assert!(validate_meme("  ", "", &cid_v0).is_err());
        assert!(validate_meme(&"t".repeat(51), "", &cid_v0).is_err());
        assert!(validate_meme("gm", &"d".repeat(201), &cid_v0).is_err());
        // 0 and l are outside the base58 alphabet
        assert!(validate_meme("gm", "", &format!("Qm{}", "0".repeat(44))).is_err());
        let err = validate_meme("gm", "", "Qmshort").unwrap_err();
        assert_eq!(status_of(&err), 400);
    }
}
