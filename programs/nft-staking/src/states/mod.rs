pub mod discriminator;
pub use discriminator::*;

pub mod meme;
pub use meme::*;

pub mod pool_state;
pub use pool_state::*;

pub mod proposal;
pub use proposal::*;

pub mod stake_info;
pub use stake_info::*;

pub mod user_staking_info;
pub use user_staking_info::*;

pub mod vote;
pub use vote::*;

use crate::error::DecodeError;
use crate::parser::{validate_account_data, BufferParser};
use anchor_lang::AnchorSerialize;

/// Positional on-chain layout of a program account.
///
/// Fields are read in declaration order after the discriminator. Reordering
/// them breaks every account already on chain.
pub trait AccountLayout: Sized {
    const NAME: &'static str;
    const DISCRIMINATOR: [u8; 8];
    /// Discriminator plus every mandatory field.
    const MIN_LEN: usize;

    fn decode_fields(parser: &mut BufferParser) -> Result<Self, DecodeError>;

    fn decode(data: &[u8], expected: &[u8; 8]) -> Result<Self, DecodeError> {
        validate_account_data(data, expected, Self::NAME, Self::MIN_LEN)?;
        let mut parser = BufferParser::from_account_data(data, expected, Self::NAME)?;
        Self::decode_fields(&mut parser)
    }

    fn try_from_account_data(data: &[u8]) -> Result<Self, DecodeError> {
        Self::decode(data, &Self::DISCRIMINATOR)
    }
}

/// Discriminator followed by the borsh encoding of `value`.
pub(crate) fn encode_account<T: AnchorSerialize>(
    discriminator: &[u8; 8],
    value: &T,
) -> std::io::Result<Vec<u8>> {
    let mut data = discriminator.to_vec();
    value.serialize(&mut data)?;
    Ok(data)
}
