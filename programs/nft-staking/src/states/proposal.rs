use super::{discriminator, encode_account, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// Proposal Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// Governance proposal. Created from a fresh keypair account, not a PDA.
#[derive(AnchorSerialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct Proposal {
    pub creator: Pubkey,
    pub title: String,
    pub description: String,
    /// UNIX seconds when voting opens.
    pub start_time: u64,
    /// UNIX seconds when voting closes.
    pub end_time: u64,
    /// Minimum total votes for the outcome to count.
    pub quorum: u64,
    /// Approval percent (0-100) of votes cast needed to pass.
    pub threshold: u32,
    pub for_votes: u64,
    pub against_votes: u64,
    pub is_executed: bool,
}

impl Proposal {
    pub const MANDATORY_LEN: usize = 8 + 32 + 4 + 4 + 8 * 3 + 4 + 8 * 2 + 1;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::PROPOSAL, self)
    }

    pub fn total_votes(&self) -> u64 {
        self.for_votes.saturating_add(self.against_votes)
    }

    pub fn approval_percentage(&self) -> f64 {
        let total = self.total_votes();
        if total == 0 {
            return 0.0;
        }
        self.for_votes as f64 * 100.0 / total as f64
    }

    pub fn can_execute(&self) -> bool {
        self.total_votes() >= self.quorum && self.approval_percentage() >= self.threshold as f64
    }

    pub fn is_voting_open(&self, now: u64) -> bool {
        now >= self.start_time && now <= self.end_time
    }
}

impl AccountLayout for Proposal {
    const NAME: &'static str = "Proposal";
    const DISCRIMINATOR: [u8; 8] = discriminator::PROPOSAL;
    const MIN_LEN: usize = Self::MANDATORY_LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            creator: p.parse_pubkey()?,
            title: p.parse_string()?,
            description: p.parse_string()?,
            start_time: p.parse_u64()?,
            end_time: p.parse_u64()?,
            quorum: p.parse_u64()?,
            threshold: p.parse_u32()?,
            for_votes: p.parse_u64()?,
            against_votes: p.parse_u64()?,
            is_executed: p.parse_bool()?,
        })
    }
}
