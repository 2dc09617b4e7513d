//! Account lists for each instruction. The program validates accounts by
//! position, so `to_account_metas` order and flags must match it exactly.

use anchor_lang::prelude::*;

pub struct Initialize {
    pub admin: Pubkey,
    /// Fresh keypair account, must co-sign.
    pub pool_state: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for Initialize {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.admin, true),
            AccountMeta::new(self.pool_state, true),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub struct InitUserStakingInfo {
    pub user: Pubkey,
    pub user_staking_info: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for InitUserStakingInfo {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.user, true),
            AccountMeta::new(self.user_staking_info, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub struct StakeNft {
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    pub user_nft_account: Pubkey,
    pub escrow_nft_account: Pubkey,
    pub escrow_authority: Pubkey,
    pub stake_info: Pubkey,
    pub pool_state: Pubkey,
    pub user_staking_info: Pubkey,
    pub system_program: Pubkey,
    pub token_program: Pubkey,
    pub associated_token_program: Pubkey,
    pub rent: Pubkey,
}

impl ToAccountMetas for StakeNft {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.owner, true),
            AccountMeta::new_readonly(self.nft_mint, false),
            AccountMeta::new(self.user_nft_account, false),
            AccountMeta::new(self.escrow_nft_account, false),
            AccountMeta::new_readonly(self.escrow_authority, false),
            AccountMeta::new(self.stake_info, false),
            AccountMeta::new(self.pool_state, false),
            AccountMeta::new(self.user_staking_info, false),
            AccountMeta::new_readonly(self.system_program, false),
            AccountMeta::new_readonly(self.token_program, false),
            AccountMeta::new_readonly(self.associated_token_program, false),
            AccountMeta::new_readonly(self.rent, false),
        ]
    }
}

pub struct UnstakeNft {
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    pub user_nft_account: Pubkey,
    pub escrow_nft_account: Pubkey,
    pub escrow_authority: Pubkey,
    pub stake_info: Pubkey,
    pub token_program: Pubkey,
}

impl ToAccountMetas for UnstakeNft {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.owner, true),
            AccountMeta::new_readonly(self.nft_mint, false),
            AccountMeta::new(self.user_nft_account, false),
            AccountMeta::new(self.escrow_nft_account, false),
            AccountMeta::new_readonly(self.escrow_authority, false),
            AccountMeta::new(self.stake_info, false),
            AccountMeta::new_readonly(self.token_program, false),
        ]
    }
}

pub struct EmergencyUnstakeNft {
    pub owner: Pubkey,
    pub nft_mint: Pubkey,
    pub stake_info: Pubkey,
    pub escrow_nft_account: Pubkey,
    pub escrow_authority: Pubkey,
    pub user_nft_account: Pubkey,
    pub user_staking_info: Pubkey,
    pub pool_state: Pubkey,
    pub system_program: Pubkey,
    pub token_program: Pubkey,
    pub rent: Pubkey,
    pub associated_token_program: Pubkey,
}

impl ToAccountMetas for EmergencyUnstakeNft {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.owner, true),
            AccountMeta::new_readonly(self.nft_mint, false),
            AccountMeta::new(self.stake_info, false),
            AccountMeta::new(self.escrow_nft_account, false),
            AccountMeta::new_readonly(self.escrow_authority, false),
            AccountMeta::new(self.user_nft_account, false),
            AccountMeta::new(self.user_staking_info, false),
            AccountMeta::new(self.pool_state, false),
            AccountMeta::new_readonly(self.system_program, false),
            AccountMeta::new_readonly(self.token_program, false),
            AccountMeta::new_readonly(self.rent, false),
            AccountMeta::new_readonly(self.associated_token_program, false),
        ]
    }
}

pub struct ClaimRewards {
    pub user: Pubkey,
    pub nft_mint: Pubkey,
    pub stake_info: Pubkey,
    pub pool_state: Pubkey,
    pub reward_vault: Pubkey,
    pub reward_vault_authority: Pubkey,
    pub user_token_account: Pubkey,
    pub token_program: Pubkey,
}

impl ToAccountMetas for ClaimRewards {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.user, true),
            AccountMeta::new_readonly(self.nft_mint, false),
            AccountMeta::new(self.stake_info, false),
            AccountMeta::new(self.pool_state, false),
            AccountMeta::new(self.reward_vault, false),
            AccountMeta::new_readonly(self.reward_vault_authority, false),
            AccountMeta::new(self.user_token_account, false),
            AccountMeta::new_readonly(self.token_program, false),
        ]
    }
}

pub struct CastVote {
    pub voter: Pubkey,
    pub proposal: Pubkey,
    pub vote: Pubkey,
    pub user_staking_info: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for CastVote {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.voter, true),
            AccountMeta::new(self.proposal, false),
            AccountMeta::new(self.vote, false),
            AccountMeta::new_readonly(self.user_staking_info, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub struct CreateProposal {
    pub proposer: Pubkey,
    /// Fresh keypair account, partially signed by the preparer.
    pub proposal: Pubkey,
    pub governance_settings: Pubkey,
    pub user_staking_info: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for CreateProposal {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.proposer, true),
            AccountMeta::new(self.proposal, true),
            AccountMeta::new_readonly(self.governance_settings, false),
            AccountMeta::new_readonly(self.user_staking_info, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub struct SubmitMeme {
    pub submitter: Pubkey,
    pub meme: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for SubmitMeme {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.submitter, true),
            AccountMeta::new(self.meme, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

pub struct VoteMeme {
    pub voter: Pubkey,
    pub meme: Pubkey,
    pub meme_vote: Pubkey,
    pub user_staking_info: Pubkey,
    pub system_program: Pubkey,
}

impl ToAccountMetas for VoteMeme {
    fn to_account_metas(&self, _is_signer: Option<bool>) -> Vec<AccountMeta> {
        vec![
            AccountMeta::new(self.voter, true),
            AccountMeta::new(self.meme, false),
            AccountMeta::new(self.meme_vote, false),
            AccountMeta::new_readonly(self.user_staking_info, false),
            AccountMeta::new_readonly(self.system_program, false),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flags(metas: &[AccountMeta]) -> Vec<(bool, bool)> {
        metas.iter().map(|m| (m.is_signer, m.is_writable)).collect()
    }

    #[test]
    fn unstake_only_owner_signs() {
        let accounts = UnstakeNft {
            owner: Pubkey::new_unique(),
            nft_mint: Pubkey::new_unique(),
            user_nft_account: Pubkey::new_unique(),
            escrow_nft_account: Pubkey::new_unique(),
            escrow_authority: Pubkey::new_unique(),
            stake_info: Pubkey::new_unique(),
            token_program: anchor_spl::token::ID,
        };
        let metas = accounts.to_account_metas(None);
        assert_eq!(metas[0].pubkey, accounts.owner);
        assert_eq!(metas[6].pubkey, anchor_spl::token::ID);
        assert_eq!(
            flags(&metas),
            vec![
                (true, true),
                (false, false),
                (false, true),
                (false, true),
                (false, false),
                (false, true),
                (false, false),
            ]
        );
    }

    #[test]
    fn create_proposal_has_two_signers() {
        let accounts = CreateProposal {
            proposer: Pubkey::new_unique(),
            proposal: Pubkey::new_unique(),
            governance_settings: crate::governance_settings::ID,
            user_staking_info: Pubkey::new_unique(),
            system_program: anchor_lang::system_program::ID,
        };
        let signers: Vec<Pubkey> = accounts
            .to_account_metas(None)
            .into_iter()
            .filter(|m| m.is_signer)
            .map(|m| m.pubkey)
            .collect();
        assert_eq!(signers, vec![accounts.proposer, accounts.proposal]);
    }

    #[test]
    fn stake_list_has_twelve_accounts() {
        let key = Pubkey::new_unique();
        let accounts = StakeNft {
            owner: key,
            nft_mint: key,
            user_nft_account: key,
            escrow_nft_account: key,
            escrow_authority: key,
            stake_info: key,
            pool_state: key,
            user_staking_info: key,
            system_program: key,
            token_program: key,
            associated_token_program: key,
            rent: key,
        };
        let metas = accounts.to_account_metas(None);
        assert_eq!(metas.len(), 12);
        assert_eq!(metas.iter().filter(|m| m.is_writable).count(), 6);
    }
}
