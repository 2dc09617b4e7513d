//! Instruction data. Each struct serializes to its 8-byte discriminator followed
//! by the borsh encoding of its fields, in the order the program reads them.
//!
//! Governance and contest instructions are tagged with account discriminators
//! rather than `sha256("global:<name>")`, matching the deployed program.

use crate::states::discriminator;
use anchor_lang::prelude::*;
use anchor_lang::InstructionData;

macro_rules! instruction_discriminator {
    ($name:ident, $bytes:expr) => {
        impl Discriminator for $name {
            const DISCRIMINATOR: &'static [u8] = &$bytes;
        }

        impl InstructionData for $name {}
    };
}

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct Initialize {
    pub reward_rate: u64,
    pub emergency_fee: u8,
}
instruction_discriminator!(Initialize, [175, 175, 109, 31, 13, 152, 155, 237]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct InitUserStakingInfo {}
instruction_discriminator!(InitUserStakingInfo, [228, 148, 161, 162, 20, 86, 73, 202]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct StakeNft {
    /// Committed period in days.
    pub staking_period: u64,
    pub nft_tier: u8,
    pub auto_compound: bool,
}
instruction_discriminator!(StakeNft, [38, 27, 66, 46, 69, 65, 151, 219]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct UnstakeNft {}
instruction_discriminator!(UnstakeNft, [17, 182, 24, 211, 101, 138, 50, 163]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct EmergencyUnstakeNft {}
instruction_discriminator!(EmergencyUnstakeNft, [86, 197, 139, 66, 164, 73, 30, 201]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct ClaimRewards {}
instruction_discriminator!(ClaimRewards, [4, 144, 132, 71, 116, 23, 151, 80]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct CastVote {
    /// 1 for, 0 against.
    pub support: u8,
}
instruction_discriminator!(CastVote, discriminator::VOTE);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct CreateProposal {
    pub proposal_id: u64,
    pub title: String,
    pub description: String,
}
instruction_discriminator!(CreateProposal, discriminator::PROPOSAL);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct SubmitMeme {
    pub title: String,
    pub description: String,
    pub ipfs_hash: String,
}
instruction_discriminator!(SubmitMeme, [21, 172, 163, 92, 221, 25, 178, 17]);

#[derive(AnchorSerialize, Debug, Clone, PartialEq, Eq)]
pub struct VoteMeme {}
instruction_discriminator!(VoteMeme, discriminator::MEME_VOTE);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stake_nft_packs_period_tier_and_flag() {
        let data = StakeNft {
            staking_period: 30,
            nft_tier: 2,
            auto_compound: false,
        }
        .data();
        assert_eq!(data.len(), 8 + 8 + 1 + 1);
        assert_eq!(&data[..8], &[38, 27, 66, 46, 69, 65, 151, 219]);
        assert_eq!(&data[8..16], &30u64.to_le_bytes());
        assert_eq!(data[16], 2);
        assert_eq!(data[17], 0);
    }

    #[test]
    fn argument_free_instructions_are_bare_discriminators() {
        assert_eq!(UnstakeNft {}.data(), vec![17, 182, 24, 211, 101, 138, 50, 163]);
        assert_eq!(VoteMeme {}.data(), discriminator::MEME_VOTE.to_vec());
        assert_eq!(InitUserStakingInfo {}.data().len(), 8);
    }

    #[test]
    fn strings_are_u32_length_prefixed() {
        let data = SubmitMeme {
            title: "gm".to_string(),
            description: "".to_string(),
            ipfs_hash: "Qm1".to_string(),
        }
        .data();
        let mut expected = vec![21, 172, 163, 92, 221, 25, 178, 17];
        expected.extend_from_slice(&[2, 0, 0, 0, b'g', b'm']);
        expected.extend_from_slice(&[0, 0, 0, 0]);
        expected.extend_from_slice(&[3, 0, 0, 0, b'Q', b'm', b'1']);
        assert_eq!(data, expected);
    }

    #[test]
    fn create_proposal_layout() {
        let data = CreateProposal {
            proposal_id: 0x0102_0304_0506_0708,
            title: "t".to_string(),
            description: "d".to_string(),
        }
        .data();
        assert_eq!(&data[..8], &discriminator::PROPOSAL);
        assert_eq!(&data[8..16], &[8, 7, 6, 5, 4, 3, 2, 1]);
        assert_eq!(&data[16..], &[1, 0, 0, 0, b't', 1, 0, 0, 0, b'd']);
    }

    #[test]
    fn initialize_and_vote_layouts() {
        let init = Initialize {
            reward_rate: 100,
            emergency_fee: 10,
        }
        .data();
        assert_eq!(init.len(), 17);
        assert_eq!(init[16], 10);

        let vote = CastVote { support: 1 }.data();
        assert_eq!(&vote[..8], &discriminator::VOTE);
        assert_eq!(vote[8], 1);
    }
}
