//
// ──────────────────────────────────────────────────────────────────────────────
// Account discriminators
// ──────────────────────────────────────────────────────────────────────────────
//
// The deployed program tags accounts with these fixed bytes. They do not match
// `sha256("account:<Name>")`, so they are kept as literal tables.

pub const POOL_STATE: [u8; 8] = [4, 146, 216, 218, 165, 66, 244, 30];
pub const STAKE_INFO: [u8; 8] = [91, 4, 83, 117, 169, 120, 168, 119];
pub const USER_STAKING_INFO: [u8; 8] = [200, 93, 190, 77, 226, 132, 111, 181];
pub const PROPOSAL: [u8; 8] = [28, 110, 127, 144, 48, 40, 151, 174];
pub const VOTE: [u8; 8] = [213, 157, 193, 142, 228, 56, 248, 150];
pub const GOVERNANCE_SETTINGS: [u8; 8] = [10, 231, 7, 225, 242, 111, 48, 79];
pub const SOCIAL_VERIFIER: [u8; 8] = [175, 119, 64, 163, 18, 112, 201, 161];
pub const USER_SOCIAL_ACTIVITY: [u8; 8] = [198, 23, 155, 219, 173, 188, 238, 173];
pub const SOCIAL_ACTIVITY_PROOF: [u8; 8] = [211, 16, 96, 201, 152, 47, 97, 219];
pub const MEME_ACCOUNT: [u8; 8] = [120, 82, 76, 134, 93, 115, 244, 62];
pub const MEME_VOTE: [u8; 8] = [49, 132, 89, 223, 111, 47, 218, 156];

/// Every account type owned by the staking program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AccountKind {
    PoolState,
    StakeInfo,
    UserStakingInfo,
    Proposal,
    Vote,
    GovernanceSettings,
    SocialVerifier,
    UserSocialActivity,
    SocialActivityProof,
    MemeAccount,
    MemeVote,
}

impl AccountKind {
    pub const ALL: [AccountKind; 11] = [
        AccountKind::PoolState,
        AccountKind::StakeInfo,
        AccountKind::UserStakingInfo,
        AccountKind::Proposal,
        AccountKind::Vote,
        AccountKind::GovernanceSettings,
        AccountKind::SocialVerifier,
        AccountKind::UserSocialActivity,
        AccountKind::SocialActivityProof,
        AccountKind::MemeAccount,
        AccountKind::MemeVote,
    ];

    pub fn discriminator(self) -> &'static [u8; 8] {
        match self {
            AccountKind::PoolState => &POOL_STATE,
            AccountKind::StakeInfo => &STAKE_INFO,
            AccountKind::UserStakingInfo => &USER_STAKING_INFO,
            AccountKind::Proposal => &PROPOSAL,
            AccountKind::Vote => &VOTE,
            AccountKind::GovernanceSettings => &GOVERNANCE_SETTINGS,
            AccountKind::SocialVerifier => &SOCIAL_VERIFIER,
            AccountKind::UserSocialActivity => &USER_SOCIAL_ACTIVITY,
            AccountKind::SocialActivityProof => &SOCIAL_ACTIVITY_PROOF,
            AccountKind::MemeAccount => &MEME_ACCOUNT,
            AccountKind::MemeVote => &MEME_VOTE,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            AccountKind::PoolState => "PoolState",
            AccountKind::StakeInfo => "StakeInfo",
            AccountKind::UserStakingInfo => "UserStakingInfo",
            AccountKind::Proposal => "Proposal",
            AccountKind::Vote => "Vote",
            AccountKind::GovernanceSettings => "GovernanceSettings",
            AccountKind::SocialVerifier => "SocialVerifier",
            AccountKind::UserSocialActivity => "UserSocialActivity",
            AccountKind::SocialActivityProof => "SocialActivityProof",
            AccountKind::MemeAccount => "MemeAccount",
            AccountKind::MemeVote => "MemeVote",
        }
    }

    /// Identifies an account from its leading bytes. Shorter buffers never match.
    pub fn from_account_data(data: &[u8]) -> Option<AccountKind> {
        let tag = data.get(..8)?;
        Self::ALL
            .into_iter()
            .find(|kind| kind.discriminator().as_slice() == tag)
    }
}
