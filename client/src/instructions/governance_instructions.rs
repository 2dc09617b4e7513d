use anchor_lang::{InstructionData, ToAccountMetas};
use anyhow::Result;
use nft_staking::accounts as staking_accounts;
use nft_staking::instruction as staking_instructions;
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program};

use crate::instructions::utils::{
    get_meme_address, get_meme_vote_address, get_user_staking_info_address, get_vote_address,
};

pub fn cast_vote_instr(
    program_id: &Pubkey,
    voter: Pubkey,
    proposal: Pubkey,
    support: bool,
) -> Result<Vec<Instruction>> {
    let (vote, _bump) = get_vote_address(&proposal, &voter, program_id);
    let (user_staking_info, _bump) = get_user_staking_info_address(&voter, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::CastVote {
            voter,
            proposal,
            vote,
            user_staking_info,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::CastVote {
            support: u8::from(support),
        }
        .data(),
    }])
}

/// `proposal` is a fresh keypair address that must co-sign.
pub fn create_proposal_instr(
    program_id: &Pubkey,
    governance_settings: Pubkey,
    proposer: Pubkey,
    proposal: Pubkey,
    proposal_id: u64,
    title: String,
    description: String,
) -> Result<Vec<Instruction>> {
    let (user_staking_info, _bump) = get_user_staking_info_address(&proposer, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::CreateProposal {
            proposer,
            proposal,
            governance_settings,
            user_staking_info,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::CreateProposal {
            proposal_id,
            title,
            description,
        }
        .data(),
    }])
}

pub fn submit_meme_instr(
    program_id: &Pubkey,
    submitter: Pubkey,
    title: String,
    description: String,
    ipfs_hash: String,
) -> Result<Vec<Instruction>> {
    let (meme, _bump) = get_meme_address(&submitter, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::SubmitMeme {
            submitter,
            meme,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::SubmitMeme {
            title,
            description,
            ipfs_hash,
        }
        .data(),
    }])
}

pub fn vote_meme_instr(program_id: &Pubkey, voter: Pubkey, meme: Pubkey) -> Result<Vec<Instruction>> {
    let (meme_vote, _bump) = get_meme_vote_address(&meme, &voter, program_id);
    let (user_staking_info, _bump) = get_user_staking_info_address(&voter, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::VoteMeme {
            voter,
            meme,
            meme_vote,
            user_staking_info,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::VoteMeme {}.data(),
    }])
}
