#[macro_use]
mod logger;

use anyhow::{format_err, Result};
use clap::Parser;
use configparser::ini::Ini;
use nft_staking::curve::estimated_rewards;
use nft_staking::states::Tier;
use serde_json::{json, Value};
use solana_client::rpc_client::RpcClient;
use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signer},
    transaction::Transaction,
};
use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

mod api;
mod diagnostics;
mod governance;
mod instructions;
mod prepare;
mod store;
mod sync;

use api::Envelope;
use instructions::rpc::*;
use instructions::staking_instructions::*;
use instructions::utils::parse_pubkey;
use store::{ImageSource, JsonFileStore, DEFAULT_IMAGES_CID, DEFAULT_IPFS_GATEWAY};

pub const DEFAULT_RPC_URL: &str = "https://api.devnet.solana.com";
pub const DEFAULT_STORE_PATH: &str = "staking_store.json";

#[derive(Clone, Debug, PartialEq)]
pub struct ClientConfig {
    http_url: String,
    payer_path: String,
    program_id: Pubkey,
    pool_state: Pubkey,
    governance_settings: Pubkey,
    store_path: String,
    admin_secret: Option<String>,
    images_cid: String,
    ipfs_gateway: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            http_url: DEFAULT_RPC_URL.to_string(),
            payer_path: "~/.config/solana/id.json".to_string(),
            program_id: nft_staking::ID,
            pool_state: nft_staking::pool_state_account::ID,
            governance_settings: nft_staking::governance_settings::ID,
            store_path: DEFAULT_STORE_PATH.to_string(),
            admin_secret: None,
            images_cid: DEFAULT_IMAGES_CID.to_string(),
            ipfs_gateway: DEFAULT_IPFS_GATEWAY.to_string(),
        }
    }
}

impl ClientConfig {
    pub fn images(&self) -> ImageSource {
        ImageSource {
            images_cid: self.images_cid.clone(),
            gateway: self.ipfs_gateway.clone(),
        }
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// File values override defaults, environment values override both.
fn load_cfg(client_config: &str, env: impl Fn(&str) -> Option<String>) -> Result<ClientConfig> {
    let mut cfg = ClientConfig::default();
    let mut ini = Ini::new();
    if Path::new(client_config).exists() {
        ini.load(client_config)
            .map_err(|e| format_err!("failed to load {}: {}", client_config, e))?;
    } else {
        log_debug!("config", "{} not found, using defaults", client_config);
    }
    let get = |key: &str| non_empty(ini.get("Global", key));

    if let Some(http_url) = get("http_url") {
        cfg.http_url = http_url;
    }
    if let Some(payer_path) = get("payer_path") {
        cfg.payer_path = payer_path;
    }
    if let Some(program_id) = get("program_id") {
        cfg.program_id = parse_pubkey("program_id", &program_id)?;
    }
    if let Some(pool_state) = get("pool_state") {
        cfg.pool_state = parse_pubkey("pool_state", &pool_state)?;
    }
    if let Some(governance_settings) = get("governance_settings") {
        cfg.governance_settings = parse_pubkey("governance_settings", &governance_settings)?;
    }
    if let Some(store_path) = get("store_path") {
        cfg.store_path = store_path;
    }
    cfg.admin_secret = get("admin_secret");
    if let Some(images_cid) = get("images_cid") {
        cfg.images_cid = images_cid;
    }
    if let Some(ipfs_gateway) = get("ipfs_gateway") {
        cfg.ipfs_gateway = ipfs_gateway;
    }

    if let Some(url) =
        non_empty(env("SOLANA_RPC_ENDPOINT")).or_else(|| non_empty(env("NEXT_PUBLIC_SOLANA_RPC_ENDPOINT")))
    {
        cfg.http_url = url;
    }
    if let Some(secret) = non_empty(env("ADMIN_SECRET_KEY")) {
        cfg.admin_secret = Some(secret);
    }
    if let Some(cid) = non_empty(env("NEXT_PUBLIC_IMAGES_CID")) {
        cfg.images_cid = cid;
    }
    if let Some(gateway) = non_empty(env("NEXT_PUBLIC_IPFS_GATEWAY")) {
        cfg.ipfs_gateway = gateway;
    }
    if let Some(path) = non_empty(env("STAKING_STORE_PATH")) {
        cfg.store_path = path;
    }
    Ok(cfg)
}

fn read_keypair_file(s: &str) -> Result<Keypair> {
    solana_sdk::signature::read_keypair_file(s)
        .map_err(|_| format_err!("failed to read keypair from {}", s))
}

fn unix_now() -> Result<i64> {
    Ok(SystemTime::now().duration_since(UNIX_EPOCH)?.as_secs() as i64)
}

#[derive(Debug, Parser)]
pub struct Opts {
    #[arg(long, default_value = "client_config.ini")]
    pub config: String,
    /// Print debug logs to stderr.
    #[arg(long)]
    pub verbose: bool,
    #[clap(subcommand)]
    pub command: StakingCommands,
}

#[derive(Debug, Parser)]
pub enum StakingCommands {
    /// Create the pool state account. Signed locally by the payer.
    Initialize {
        #[arg(long)]
        pool_keypair: String,
        #[arg(long)]
        reward_rate: u64,
        #[arg(long, default_value_t = 10)]
        emergency_fee: u8,
    },
    Diagnose {
        #[arg(long)]
        mint: String,
        #[arg(long)]
        wallet: String,
    },
    StakeStatus {
        #[arg(long)]
        mint: String,
    },
    PoolState {},
    ProgramStats {},
    EstimateRewards {
        #[arg(long)]
        tier: String,
        #[arg(long)]
        period: u64,
    },
    PrepareStake {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        mint: String,
        #[arg(long)]
        period: u64,
        #[arg(long, default_value = "COMMON")]
        tier: String,
        #[arg(long)]
        auto_compound: bool,
    },
    PrepareUnstake {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        mint: String,
    },
    PrepareEmergencyUnstake {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        mint: String,
    },
    PrepareClaim {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        mint: String,
    },
    VotingPower {
        #[arg(long)]
        wallet: String,
    },
    CanVote {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        proposal: String,
    },
    ProposalStatus {
        #[arg(long)]
        proposal: String,
    },
    PrepareVote {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        proposal: String,
        /// Vote for the proposal. Omit to vote against.
        #[arg(long)]
        support: bool,
    },
    PrepareCreateProposal {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
    },
    SubmitMeme {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        #[arg(long)]
        ipfs_hash: String,
    },
    VoteMeme {
        #[arg(long)]
        wallet: String,
        #[arg(long)]
        meme: String,
    },
    SendSigned {
        /// Base64 bincode transaction signed by the wallet.
        #[arg(long)]
        transaction: String,
        #[arg(long)]
        sync_mint: Option<String>,
    },
    TestAuth {
        #[arg(long)]
        admin_key: Option<String>,
    },
    SyncNft {
        #[arg(long)]
        admin_key: Option<String>,
        #[arg(long)]
        mint: String,
    },
    SyncWallet {
        #[arg(long)]
        admin_key: Option<String>,
        #[arg(long)]
        wallet: String,
    },
    SyncAll {
        #[arg(long)]
        admin_key: Option<String>,
    },
    CheckDiscrepancies {
        #[arg(long)]
        admin_key: Option<String>,
    },
}

fn run(opts: Opts) -> Result<Value> {
    let pool_config = load_cfg(&opts.config, |key| std::env::var(key).ok())?;
    // solana rpc client
    let rpc_client = RpcClient::new(pool_config.http_url.to_string());
    let rpc: &dyn StakingRpc = &rpc_client;
    let now = unix_now()?;
    log_debug!("client", "rpc {} program {}", pool_config.http_url, pool_config.program_id);

    let value = match opts.command {
        StakingCommands::Initialize {
            pool_keypair,
            reward_rate,
            emergency_fee,
        } => {
            let payer = read_keypair_file(&pool_config.payer_path)?;
            let pool = read_keypair_file(&pool_keypair)?;
            let mut instructions = Vec::new();
            let initialize_ix = initialize_pool_instr(
                &pool_config.program_id,
                payer.pubkey(),
                pool.pubkey(),
                reward_rate,
                emergency_fee,
            )?;
            instructions.extend(initialize_ix);
            let signers = vec![&payer, &pool];
            let (recent_hash, _last_valid) = rpc.get_latest_blockhash()?;
            let txn = Transaction::new_signed_with_payer(
                &instructions,
                Some(&payer.pubkey()),
                &signers,
                recent_hash,
            );
            let signature = send_txn(rpc, &txn, true)?;
            log_info!("client", "pool {} initialized", pool.pubkey());
            json!({ "signature": signature.to_string(), "pool_state": pool.pubkey().to_string() })
        }
        StakingCommands::Diagnose { mint, wallet } => {
            let mint = parse_pubkey("mint", &mint)?;
            let wallet = parse_pubkey("wallet", &wallet)?;
            serde_json::to_value(diagnostics::diagnose_staking_account(
                rpc,
                &pool_config.program_id,
                &pool_config.pool_state,
                &mint,
                &wallet,
                now,
            )?)?
        }
        StakingCommands::StakeStatus { mint } => {
            let mint = parse_pubkey("mint", &mint)?;
            serde_json::to_value(diagnostics::stake_status(
                rpc,
                &pool_config.program_id,
                &pool_config.pool_state,
                &mint,
                now,
            )?)?
        }
        StakingCommands::PoolState {} => serde_json::to_value(diagnostics::diagnose_pool_state(
            rpc,
            &pool_config.program_id,
            &pool_config.pool_state,
        )?)?,
        StakingCommands::ProgramStats {} => serde_json::to_value(diagnostics::program_stats(
            rpc,
            &pool_config.program_id,
        )?)?,
        StakingCommands::EstimateRewards { tier, period } => {
            let estimate = estimated_rewards(Tier::from_label(&tier), period);
            json!({
                "tier": estimate.tier.name(),
                "period_days": estimate.period_days,
                "base_rate": estimate.base_rate,
                "long_term_bonus": estimate.long_term_bonus,
                "total_rewards": estimate.total_rewards,
                "average_daily_reward": estimate.average_daily_reward,
            })
        }
        StakingCommands::PrepareStake {
            wallet,
            mint,
            period,
            tier,
            auto_compound,
        } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mint = parse_pubkey("mint", &mint)?;
            serde_json::to_value(prepare::prepare_stake(
                rpc,
                &pool_config,
                &wallet,
                &mint,
                period,
                Tier::from_label(&tier),
                auto_compound,
            )?)?
        }
        StakingCommands::PrepareUnstake { wallet, mint } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mint = parse_pubkey("mint", &mint)?;
            serde_json::to_value(prepare::prepare_unstake(
                rpc,
                &pool_config,
                &wallet,
                &mint,
                now,
            )?)?
        }
        StakingCommands::PrepareEmergencyUnstake { wallet, mint } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mint = parse_pubkey("mint", &mint)?;
            serde_json::to_value(prepare::prepare_emergency_unstake(
                rpc,
                &pool_config,
                &wallet,
                &mint,
                now,
            )?)?
        }
        StakingCommands::PrepareClaim { wallet, mint } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mint = parse_pubkey("mint", &mint)?;
            serde_json::to_value(prepare::prepare_claim(
                rpc,
                &pool_config,
                &wallet,
                &mint,
                now,
            )?)?
        }
        StakingCommands::VotingPower { wallet } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let power = governance::voting_power(rpc, &pool_config.program_id, &wallet)?;
            json!({ "wallet": wallet.to_string(), "voting_power": power })
        }
        StakingCommands::CanVote { wallet, proposal } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let proposal = parse_pubkey("proposal", &proposal)?;
            serde_json::to_value(governance::can_vote(
                rpc,
                &pool_config.program_id,
                &wallet,
                &proposal,
                now,
            )?)?
        }
        StakingCommands::ProposalStatus { proposal } => {
            let proposal = parse_pubkey("proposal", &proposal)?;
            serde_json::to_value(governance::proposal_status(rpc, &proposal, now)?)?
        }
        StakingCommands::PrepareVote {
            wallet,
            proposal,
            support,
        } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let proposal = parse_pubkey("proposal", &proposal)?;
            serde_json::to_value(prepare::prepare_vote(
                rpc,
                &pool_config,
                &wallet,
                &proposal,
                support,
                now,
            )?)?
        }
        StakingCommands::PrepareCreateProposal {
            wallet,
            title,
            description,
        } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(prepare::prepare_create_proposal(
                rpc,
                &pool_config,
                &mut store,
                &wallet,
                &title,
                &description,
                now,
            )?)?
        }
        StakingCommands::SubmitMeme {
            wallet,
            title,
            description,
            ipfs_hash,
        } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            serde_json::to_value(prepare::prepare_submit_meme(
                rpc,
                &pool_config,
                &wallet,
                &title,
                &description,
                &ipfs_hash,
            )?)?
        }
        StakingCommands::VoteMeme { wallet, meme } => {
            let wallet = parse_pubkey("wallet", &wallet)?;
            let meme = parse_pubkey("meme", &meme)?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(prepare::prepare_vote_meme(
                rpc,
                &pool_config,
                &mut store,
                &wallet,
                &meme,
                now,
            )?)?
        }
        StakingCommands::SendSigned {
            transaction,
            sync_mint,
        } => {
            let sync_mint = sync_mint
                .map(|mint| parse_pubkey("sync_mint", &mint))
                .transpose()?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(prepare::send_signed(
                rpc,
                &pool_config,
                &mut store,
                &transaction,
                sync_mint.as_ref(),
                now,
            )?)?
        }
        StakingCommands::TestAuth { admin_key } => {
            sync::test_auth(&pool_config, admin_key.as_deref())?;
            json!({ "authorized": true })
        }
        StakingCommands::SyncNft { admin_key, mint } => {
            sync::test_auth(&pool_config, admin_key.as_deref())?;
            let mint = parse_pubkey("mint", &mint)?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(sync::sync_nft(rpc, &pool_config, &mut store, &mint, now)?)?
        }
        StakingCommands::SyncWallet { admin_key, wallet } => {
            sync::test_auth(&pool_config, admin_key.as_deref())?;
            let wallet = parse_pubkey("wallet", &wallet)?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(sync::sync_wallet(
                rpc,
                &pool_config,
                &mut store,
                &wallet,
                now,
            )?)?
        }
        StakingCommands::SyncAll { admin_key } => {
            sync::test_auth(&pool_config, admin_key.as_deref())?;
            let mut store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(sync::sync_all(rpc, &pool_config, &mut store, now)?)?
        }
        StakingCommands::CheckDiscrepancies { admin_key } => {
            sync::test_auth(&pool_config, admin_key.as_deref())?;
            let store = JsonFileStore::open(&pool_config.store_path)?;
            serde_json::to_value(sync::check_discrepancies(rpc, &pool_config, &store)?)?
        }
    };
    Ok(value)
}

fn main() -> Result<()> {
    let opts = Opts::parse();
    logger::set_verbose(opts.verbose);

    let envelope = match run(opts) {
        Ok(data) => Envelope::ok(data),
        Err(e) => {
            log_error!("client", "{:#}", e);
            Envelope::from_error(&e)
        }
    };
    println!("{}", serde_json::to_string_pretty(&envelope)?);
    if !envelope.success {
        std::process::exit(1);
    }
    Ok(())
}
