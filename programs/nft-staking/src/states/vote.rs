use super::{discriminator, encode_account, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Vote records
// ──────────────────────────────────────────────────────────────────────────────
//
// One account per (target, voter). The account existing is the "has voted"
// flag, the PDA makes a second vote impossible.

pub const VOTE_AGAINST: u8 = 0;
pub const VOTE_FOR: u8 = 1;

/// Governance vote at PDA `["vote", proposal, voter]`.
#[derive(AnchorSerialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct VoteInfo {
    pub proposal: Pubkey,
    pub voter: Pubkey,
    /// `VOTE_FOR` or `VOTE_AGAINST`.
    pub side: u8,
    pub weight: u64,
    pub timestamp: i64,
}

impl VoteInfo {
    pub const LEN: usize = 8 + 32 + 32 + 1 + 8 + 8;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::VOTE, self)
    }

    pub fn is_for(&self) -> bool {
        self.side == VOTE_FOR
    }
}

impl AccountLayout for VoteInfo {
    const NAME: &'static str = "VoteInfo";
    const DISCRIMINATOR: [u8; 8] = discriminator::VOTE;
    const MIN_LEN: usize = Self::LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            proposal: p.parse_pubkey()?,
            voter: p.parse_pubkey()?,
            side: p.parse_u8()?,
            weight: p.parse_u64()?,
            timestamp: p.parse_i64()?,
        })
    }
}

/// Meme contest vote at PDA `["meme_vote", meme, voter]`.
#[derive(AnchorSerialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct MemeVoteInfo {
    pub meme: Pubkey,
    pub voter: Pubkey,
    pub voting_power: u64,
    pub timestamp: i64,
}

impl MemeVoteInfo {
    pub const LEN: usize = 8 + 32 + 32 + 8 + 8;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::MEME_VOTE, self)
    }
}

impl AccountLayout for MemeVoteInfo {
    const NAME: &'static str = "MemeVoteInfo";
    const DISCRIMINATOR: [u8; 8] = discriminator::MEME_VOTE;
    const MIN_LEN: usize = Self::LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            meme: p.parse_pubkey()?,
            voter: p.parse_pubkey()?,
            voting_power: p.parse_u64()?,
            timestamp: p.parse_i64()?,
        })
    }
}
