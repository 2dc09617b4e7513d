use super::{discriminator, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// MemeInfo Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// Width of the NUL padded `ipfs_hash` field.
pub const IPFS_HASH_LEN: usize = 46;
pub const MAX_MEME_TITLE_LEN: usize = 50;
pub const MAX_MEME_DESCRIPTION_LEN: usize = 200;

/// Contest submission at PDA `["meme_submission", creator]`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MemeInfo {
    pub creator: Pubkey,
    pub title: String,
    pub description: String,
    pub ipfs_hash: String,
    pub total_votes: u64,
    pub created_at: i64,
}

impl MemeInfo {
    /// Discriminator, creator, two empty string prefixes, the fixed hash and
    /// the two trailing integers.
    pub const MANDATORY_LEN: usize = 8 + 32 + 4 + 4 + IPFS_HASH_LEN + 8 + 8;

    /// `ipfs_hash` is a fixed-width field, so this cannot reuse borsh.
    /// Hashes longer than the field are truncated to it.
    pub fn to_account_data(&self) -> Vec<u8> {
        let mut data = Vec::with_capacity(
            Self::MANDATORY_LEN + self.title.len() + self.description.len(),
        );
        data.extend_from_slice(&discriminator::MEME_ACCOUNT);
        data.extend_from_slice(self.creator.as_ref());
        for text in [&self.title, &self.description] {
            data.extend_from_slice(&(text.len() as u32).to_le_bytes());
            data.extend_from_slice(text.as_bytes());
        }
        let mut hash = [0u8; IPFS_HASH_LEN];
        let bytes = self.ipfs_hash.as_bytes();
        let n = bytes.len().min(IPFS_HASH_LEN);
        hash[..n].copy_from_slice(&bytes[..n]);
        data.extend_from_slice(&hash);
        data.extend_from_slice(&self.total_votes.to_le_bytes());
        data.extend_from_slice(&self.created_at.to_le_bytes());
        data
    }
}

impl AccountLayout for MemeInfo {
    const NAME: &'static str = "MemeInfo";
    const DISCRIMINATOR: [u8; 8] = discriminator::MEME_ACCOUNT;
    const MIN_LEN: usize = Self::MANDATORY_LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        Ok(Self {
            creator: p.parse_pubkey()?,
            title: p.parse_string()?,
            description: p.parse_string()?,
            ipfs_hash: p.parse_fixed_string(IPFS_HASH_LEN)?,
            total_votes: p.parse_u64()?,
            created_at: p.parse_i64()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HASH: &str = "QmYwAPJzv5CZsnA625s3Xf2nemtYgPpHdWEz79ojWnPbdG";

    fn sample() -> MemeInfo {
        MemeInfo {
            creator: Pubkey::new_unique(),
            title: "Solara to the moon".to_string(),
            description: "a meme about staking".to_string(),
            ipfs_hash: HASH.to_string(),
            total_votes: 17,
            created_at: 1_712_345_678,
        }
    }

    #[test]
    fn decodes_variable_and_fixed_strings() {
        assert_eq!(HASH.len(), IPFS_HASH_LEN);
        let meme = sample();
        let data = meme.to_account_data();
        assert_eq!(MemeInfo::try_from_account_data(&data).unwrap(), meme);
    }

    #[test]
    fn short_hash_is_nul_padded() {
        let meme = MemeInfo {
            ipfs_hash: "QmShort".to_string(),
            ..sample()
        };
        let data = meme.to_account_data();
        let decoded = MemeInfo::try_from_account_data(&data).unwrap();
        assert_eq!(decoded.ipfs_hash, "QmShort");
        assert_eq!(decoded.total_votes, 17);
    }

    #[test]
    fn title_overrunning_buffer_fails() {
        let mut data = sample().to_account_data();
        // corrupt the title length prefix
        data[40..44].copy_from_slice(&1_000u32.to_le_bytes());
        assert!(matches!(
            MemeInfo::try_from_account_data(&data),
            Err(DecodeError::BufferTooSmall { needed: 1_000, offset: 44, .. })
        ));
    }
}
