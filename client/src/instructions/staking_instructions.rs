use anchor_lang::{InstructionData, ToAccountMetas};
use anyhow::Result;
use nft_staking::accounts as staking_accounts;
use nft_staking::instruction as staking_instructions;
use nft_staking::states::{PoolState, Tier};
use solana_sdk::{instruction::Instruction, pubkey::Pubkey, system_program, sysvar};
use spl_associated_token_account::instruction::create_associated_token_account_idempotent;

use crate::instructions::utils::{
    get_escrow_authority_address, get_escrow_nft_address, get_reward_vault_authority_address,
    get_stake_info_address, get_user_nft_address, get_user_staking_info_address,
};

pub fn initialize_pool_instr(
    program_id: &Pubkey,
    admin: Pubkey,
    pool_state: Pubkey,
    reward_rate: u64,
    emergency_fee: u8,
) -> Result<Vec<Instruction>> {
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::Initialize {
            admin,
            pool_state,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::Initialize {
            reward_rate,
            emergency_fee,
        }
        .data(),
    }])
}

pub fn init_user_staking_info_instr(program_id: &Pubkey, user: Pubkey) -> Result<Vec<Instruction>> {
    let (user_staking_info, _bump) = get_user_staking_info_address(&user, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::InitUserStakingInfo {
            user,
            user_staking_info,
            system_program: system_program::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::InitUserStakingInfo {}.data(),
    }])
}

/// Escrow ATA creation, optional user account init, then `stake_nft`.
pub fn stake_nft_instr(
    program_id: &Pubkey,
    pool_state: Pubkey,
    owner: Pubkey,
    nft_mint: Pubkey,
    staking_period: u64,
    tier: Tier,
    auto_compound: bool,
    init_user_account: bool,
) -> Result<Vec<Instruction>> {
    let (escrow_authority, _bump) = get_escrow_authority_address(&nft_mint, program_id);
    let (stake_info, _bump) = get_stake_info_address(&nft_mint, program_id);
    let (user_staking_info, _bump) = get_user_staking_info_address(&owner, program_id);

    let mut instructions = vec![create_associated_token_account_idempotent(
        &owner,
        &escrow_authority,
        &nft_mint,
        &spl_token::id(),
    )];
    if init_user_account {
        instructions.extend(init_user_staking_info_instr(program_id, owner)?);
    }
    instructions.push(Instruction {
        program_id: *program_id,
        accounts: staking_accounts::StakeNft {
            owner,
            nft_mint,
            user_nft_account: get_user_nft_address(&owner, &nft_mint),
            escrow_nft_account: get_escrow_nft_address(&nft_mint, program_id),
            escrow_authority,
            stake_info,
            pool_state,
            user_staking_info,
            system_program: system_program::id(),
            token_program: spl_token::id(),
            associated_token_program: spl_associated_token_account::id(),
            rent: sysvar::rent::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::StakeNft {
            staking_period,
            nft_tier: tier.as_u8(),
            auto_compound,
        }
        .data(),
    });
    Ok(instructions)
}

pub fn unstake_nft_instr(
    program_id: &Pubkey,
    owner: Pubkey,
    nft_mint: Pubkey,
) -> Result<Vec<Instruction>> {
    let (escrow_authority, _bump) = get_escrow_authority_address(&nft_mint, program_id);
    let (stake_info, _bump) = get_stake_info_address(&nft_mint, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::UnstakeNft {
            owner,
            nft_mint,
            user_nft_account: get_user_nft_address(&owner, &nft_mint),
            escrow_nft_account: get_escrow_nft_address(&nft_mint, program_id),
            escrow_authority,
            stake_info,
            token_program: spl_token::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::UnstakeNft {}.data(),
    }])
}

pub fn emergency_unstake_nft_instr(
    program_id: &Pubkey,
    pool_state: Pubkey,
    owner: Pubkey,
    nft_mint: Pubkey,
) -> Result<Vec<Instruction>> {
    let (escrow_authority, _bump) = get_escrow_authority_address(&nft_mint, program_id);
    let (stake_info, _bump) = get_stake_info_address(&nft_mint, program_id);
    let (user_staking_info, _bump) = get_user_staking_info_address(&owner, program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::EmergencyUnstakeNft {
            owner,
            nft_mint,
            stake_info,
            escrow_nft_account: get_escrow_nft_address(&nft_mint, program_id),
            escrow_authority,
            user_nft_account: get_user_nft_address(&owner, &nft_mint),
            user_staking_info,
            pool_state,
            system_program: system_program::id(),
            token_program: spl_token::id(),
            rent: sysvar::rent::id(),
            associated_token_program: spl_associated_token_account::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::EmergencyUnstakeNft {}.data(),
    }])
}

/// The provided pool must carry the reward vault extension.
pub fn claim_rewards_instr(
    program_id: &Pubkey,
    pool_address: Pubkey,
    pool: &PoolState,
    user: Pubkey,
    nft_mint: Pubkey,
) -> Result<Vec<Instruction>> {
    if !pool.has_reward_vault() {
        anyhow::bail!("pool {} has no reward vault configured", pool_address);
    }
    let (stake_info, _bump) = get_stake_info_address(&nft_mint, program_id);
    let (reward_vault_authority, _bump) = get_reward_vault_authority_address(program_id);
    Ok(vec![Instruction {
        program_id: *program_id,
        accounts: staking_accounts::ClaimRewards {
            user,
            nft_mint,
            stake_info,
            pool_state: pool_address,
            reward_vault: pool.reward_vault,
            reward_vault_authority,
            user_token_account: get_user_nft_address(&user, &pool.reward_mint),
            token_program: spl_token::id(),
        }
        .to_account_metas(None),
        data: staking_instructions::ClaimRewards {}.data(),
    }])
}
