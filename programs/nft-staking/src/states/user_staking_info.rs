use super::{discriminator, encode_account, AccountLayout};
use crate::error::DecodeError;
use crate::parser::BufferParser;
use anchor_lang::prelude::*;

//
// ──────────────────────────────────────────────────────────────────────────────
// UserStakingInfo Account
// ──────────────────────────────────────────────────────────────────────────────
//

/// Per-wallet staking summary at PDA `["user_staking", wallet]`.
#[derive(AnchorSerialize, Debug, Default, Clone, PartialEq, Eq)]
pub struct UserStakingInfo {
    pub owner: Pubkey,

    /// Number of NFTs currently staked. Also the wallet's voting power.
    pub staked_count: u8,

    pub staked_mints: Vec<Pubkey>,

    /// Collection bonus in basis points. Missing on older accounts.
    pub collection_bonus: u64,
}

impl UserStakingInfo {
    /// Breakdown:
    /// - 8: account discriminator
    /// - 32: owner
    /// - 1: staked_count
    /// - 4: length prefix of `staked_mints`
    pub const MANDATORY_LEN: usize = 8 + 32 + 1 + 4;

    pub fn to_account_data(&self) -> std::io::Result<Vec<u8>> {
        encode_account(&discriminator::USER_STAKING_INFO, self)
    }

    pub fn is_staking(&self, mint: &Pubkey) -> bool {
        self.staked_mints.contains(mint)
    }
}

impl AccountLayout for UserStakingInfo {
    const NAME: &'static str = "UserStakingInfo";
    const DISCRIMINATOR: [u8; 8] = discriminator::USER_STAKING_INFO;
    const MIN_LEN: usize = Self::MANDATORY_LEN;

    fn decode_fields(p: &mut BufferParser) -> std::result::Result<Self, DecodeError> {
        let owner = p.parse_pubkey()?;
        let staked_count = p.parse_u8()?;
        let count = p.parse_u32()? as usize;
        // never trust the length prefix for the allocation size
        let mut staked_mints = Vec::with_capacity(count.min(p.remaining() / 32));
        for _ in 0..count {
            staked_mints.push(p.parse_pubkey()?);
        }
        let collection_bonus = p.parse_optional(0, |p| p.parse_u64());

        Ok(Self {
            owner,
            staked_count,
            staked_mints,
            collection_bonus,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(mints: usize) -> UserStakingInfo {
        UserStakingInfo {
            owner: Pubkey::new_unique(),
            staked_count: mints as u8,
            staked_mints: (0..mints).map(|_| Pubkey::new_unique()).collect(),
            collection_bonus: 300,
        }
    }

    #[test]
    fn decodes_vector_of_mints() {
        let info = sample(3);
        let data = info.to_account_data().unwrap();
        assert_eq!(data.len(), UserStakingInfo::MANDATORY_LEN + 3 * 32 + 8);
        let decoded = UserStakingInfo::try_from_account_data(&data).unwrap();
        assert_eq!(decoded, info);
        assert!(decoded.is_staking(&info.staked_mints[1]));
    }

    #[test]
    fn missing_collection_bonus_defaults_to_zero() {
        let info = sample(2);
        let data = info.to_account_data().unwrap();
        let decoded = UserStakingInfo::try_from_account_data(&data[..data.len() - 8]).unwrap();
        assert_eq!(decoded.staked_mints, info.staked_mints);
        assert_eq!(decoded.collection_bonus, 0);
    }

    #[test]
    fn truncated_mint_vector_is_an_error() {
        let info = sample(2);
        let data = info.to_account_data().unwrap();
        let cut = UserStakingInfo::MANDATORY_LEN + 32 + 10;
        assert!(matches!(
            UserStakingInfo::try_from_account_data(&data[..cut]),
            Err(DecodeError::BufferTooSmall { needed: 32, .. })
        ));
    }

    #[test]
    fn oversized_length_prefix_fails_without_allocating() {
        let mut data = sample(0).to_account_data().unwrap();
        data[41..45].copy_from_slice(&u32::MAX.to_le_bytes());
        assert!(UserStakingInfo::try_from_account_data(&data).is_err());
    }
}
