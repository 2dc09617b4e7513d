use crate::api::ApiError;
use anyhow::Result;
use nft_staking::{
    error::DecodeError,
    states::AccountLayout,
    ESCROW_SEED, MEME_SUBMISSION_SEED, MEME_VOTE_SEED, POOL_SEED, REWARD_VAULT_AUTHORITY_SEED,
    STAKE_SEED, USER_STAKING_SEED, VOTE_SEED,
};
use solana_sdk::{account::Account, pubkey::Pubkey};
use spl_associated_token_account::get_associated_token_address;

/// Parse a base58 address from user input, rejecting anything that is not
/// exactly 32 bytes.
pub fn parse_pubkey(field: &str, value: &str) -> Result<Pubkey> {
    let bytes = bs58::decode(value.trim())
        .into_vec()
        .map_err(|_| ApiError::Validation(format!("Invalid {}: not base58", field)))?;
    let bytes: [u8; 32] = bytes.try_into().map_err(|raw: Vec<u8>| {
        ApiError::Validation(format!(
            "Invalid {}: expected 32 bytes, got {}",
            field,
            raw.len()
        ))
    })?;
    Ok(Pubkey::new_from_array(bytes))
}

/// Decode an account fetched from RPC, insisting it is owned by `program_id`.
pub fn deserialize_staking_account<T: AccountLayout>(
    account: &Account,
    program_id: &Pubkey,
) -> Result<T> {
    if account.owner != *program_id {
        anyhow::bail!(
            "{} account is owned by {}, expected {}",
            T::NAME,
            account.owner,
            program_id
        );
    }
    T::try_from_account_data(&account.data).map_err(|e: DecodeError| e.into())
}

pub fn derive_address(seeds: &[&[u8]], program_id: &Pubkey) -> (Pubkey, u8) {
    Pubkey::find_program_address(seeds, program_id)
}

pub fn get_pool_address(program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[POOL_SEED.as_bytes()], program_id)
}

pub fn get_stake_info_address(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[STAKE_SEED.as_bytes(), mint.as_ref()], program_id)
}

pub fn get_escrow_authority_address(mint: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[ESCROW_SEED.as_bytes(), mint.as_ref()], program_id)
}

pub fn get_user_staking_info_address(wallet: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[USER_STAKING_SEED.as_bytes(), wallet.as_ref()], program_id)
}

pub fn get_vote_address(proposal: &Pubkey, voter: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(
        &[VOTE_SEED.as_bytes(), proposal.as_ref(), voter.as_ref()],
        program_id,
    )
}

pub fn get_meme_vote_address(meme: &Pubkey, voter: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(
        &[MEME_VOTE_SEED.as_bytes(), meme.as_ref(), voter.as_ref()],
        program_id,
    )
}

pub fn get_meme_address(creator: &Pubkey, program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[MEME_SUBMISSION_SEED.as_bytes(), creator.as_ref()], program_id)
}

pub fn get_reward_vault_authority_address(program_id: &Pubkey) -> (Pubkey, u8) {
    derive_address(&[REWARD_VAULT_AUTHORITY_SEED.as_bytes()], program_id)
}

/// Escrow token account holding a staked NFT. Its owner is the off-curve
/// escrow authority PDA.
pub fn get_escrow_nft_address(mint: &Pubkey, program_id: &Pubkey) -> Pubkey {
    let (escrow_authority, _bump) = get_escrow_authority_address(mint, program_id);
    get_associated_token_address(&escrow_authority, mint)
}

pub fn get_user_nft_address(wallet: &Pubkey, mint: &Pubkey) -> Pubkey {
    get_associated_token_address(wallet, mint)
}
