use anchor_lang::prelude::*;
use thiserror::Error;

// Discriminant order is the on-chain error number minus 6000. Do not reorder.
#[error_code]
pub enum ErrorCode {
    #[msg("NFT is not staked")]
    NotStaked,

    #[msg("Signer is not the owner of this stake")]
    NotOwner,

    #[msg("Signer is not the pool admin")]
    NotAdmin,

    #[msg("Staking pool is paused")]
    PoolPaused,

    #[msg("Staking period not completed")]
    StakingPeriodNotCompleted,

    #[msg("Invalid NFT tier")]
    InvalidNftTier,

    #[msg("Invalid staking period")]
    InvalidStakingPeriod,

    #[msg("Maximum number of staked NFTs per user exceeded")]
    MaxNftsExceeded,

    #[msg("Proposal not found")]
    ProposalNotFound,

    #[msg("Voting has not started yet")]
    VotingNotStarted,

    #[msg("Voting period has ended")]
    VotingEnded,

    #[msg("Voting period has not ended")]
    VotingNotEnded,

    #[msg("Already voted on this proposal")]
    AlreadyVoted,

    #[msg("Insufficient voting power")]
    InsufficientVotingPower,

    #[msg("Quorum not reached")]
    QuorumNotReached,

    #[msg("Proposal was cancelled")]
    ProposalCancelled,

    #[msg("Proposal already executed")]
    ProposalAlreadyExecuted,

    #[msg("Proposal failed")]
    ProposalFailed,

    #[msg("Timelock not completed")]
    TimelockNotCompleted,

    #[msg("Invalid voting parameters")]
    InvalidVotingParams,

    #[msg("Unauthorized social verifier")]
    UnauthorizedVerifier,

    #[msg("Invalid social activity type")]
    InvalidActivityType,

    #[msg("Social activity reward already claimed")]
    ActivityAlreadyClaimed,

    #[msg("Invalid signature")]
    InvalidSignature,

    #[msg("Cooldown period not completed")]
    CooldownNotCompleted,

    #[msg("Maximum daily rewards exceeded")]
    MaxDailyRewardsExceeded,

    #[msg("User is not registered for social rewards")]
    UserNotRegisteredForSocial,

    #[msg("Invalid proof")]
    InvalidProof,
}

/// First custom error number assigned by `#[error_code]`.
pub const PROGRAM_ERROR_OFFSET: u32 = 6000;

impl ErrorCode {
    pub const ALL: [ErrorCode; 28] = [
        ErrorCode::NotStaked,
        ErrorCode::NotOwner,
        ErrorCode::NotAdmin,
        ErrorCode::PoolPaused,
        ErrorCode::StakingPeriodNotCompleted,
        ErrorCode::InvalidNftTier,
        ErrorCode::InvalidStakingPeriod,
        ErrorCode::MaxNftsExceeded,
        ErrorCode::ProposalNotFound,
        ErrorCode::VotingNotStarted,
        ErrorCode::VotingEnded,
        ErrorCode::VotingNotEnded,
        ErrorCode::AlreadyVoted,
        ErrorCode::InsufficientVotingPower,
        ErrorCode::QuorumNotReached,
        ErrorCode::ProposalCancelled,
        ErrorCode::ProposalAlreadyExecuted,
        ErrorCode::ProposalFailed,
        ErrorCode::TimelockNotCompleted,
        ErrorCode::InvalidVotingParams,
        ErrorCode::UnauthorizedVerifier,
        ErrorCode::InvalidActivityType,
        ErrorCode::ActivityAlreadyClaimed,
        ErrorCode::InvalidSignature,
        ErrorCode::CooldownNotCompleted,
        ErrorCode::MaxDailyRewardsExceeded,
        ErrorCode::UserNotRegisteredForSocial,
        ErrorCode::InvalidProof,
    ];

    pub fn code(self) -> u32 {
        PROGRAM_ERROR_OFFSET + self as u32
    }

    pub fn from_code(code: u32) -> Option<ErrorCode> {
        let index = code.checked_sub(PROGRAM_ERROR_OFFSET)? as usize;
        Self::ALL.get(index).copied()
    }
}

/// Anchor framework error raised when account data fails to deserialize.
pub const ACCOUNT_DID_NOT_DESERIALIZE: u32 = 3003;

/// Human readable message for a custom program error number.
pub fn program_error_message(code: u32) -> String {
    match ErrorCode::from_code(code) {
        Some(error) => error.to_string(),
        None if code == ACCOUNT_DID_NOT_DESERIALIZE => {
            "Account data could not be deserialized (AccountDidNotDeserialize)".to_string()
        }
        None => format!("Unknown program error: {} (0x{:x})", code, code),
    }
}

/// Errors raised while decoding raw account bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("Buffer too small: needed {needed} bytes at offset {offset}, buffer length {len}")]
    BufferTooSmall {
        needed: usize,
        offset: usize,
        len: usize,
    },

    #[error("{account} discriminator mismatch: expected {expected:?}, found {found:?}")]
    DiscriminatorMismatch {
        account: &'static str,
        expected: [u8; 8],
        found: Vec<u8>,
    },

    #[error("{account} data too small ({len} bytes), minimum is {min}")]
    AccountTooShort {
        account: &'static str,
        min: usize,
        len: usize,
    },

    #[error("Invalid UTF-8 string at offset {offset}")]
    InvalidUtf8 { offset: usize },
}
