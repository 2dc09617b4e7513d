use anyhow::Result;
use nft_staking::error::{program_error_message, ErrorCode, ACCOUNT_DID_NOT_DESERIALIZE};
use regex::Regex;
use serde::Serialize;
use solana_account_decoder::UiAccountEncoding;
use solana_client::{
    rpc_client::RpcClient,
    rpc_config::{RpcAccountInfoConfig, RpcProgramAccountsConfig, RpcSendTransactionConfig},
    rpc_filter::{Memcmp, RpcFilterType},
};
use solana_sdk::{
    account::Account, commitment_config::CommitmentConfig, hash::Hash, pubkey::Pubkey,
    signature::Signature, transaction::Transaction,
};
use solana_transaction_status::UiTransactionEncoding;
use std::sync::OnceLock;

/// Raw simulation result. `err` is the rendered transaction error, if any.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SimulationOutcome {
    pub err: Option<String>,
    pub logs: Vec<String>,
}

/// The subset of the RPC node the tool relies on. Every byte it returns is
/// untrusted until a decoder has checked the discriminator.
pub trait StakingRpc {
    fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>>;

    /// Program accounts, optionally restricted to those whose first 8 bytes
    /// equal `discriminator`.
    fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: Option<&[u8; 8]>,
    ) -> Result<Vec<(Pubkey, Account)>>;

    /// Latest blockhash and the last block height at which it stays valid.
    fn get_latest_blockhash(&self) -> Result<(Hash, u64)>;

    fn simulate_transaction(&self, txn: &Transaction) -> Result<SimulationOutcome>;

    fn send_transaction(&self, txn: &Transaction) -> Result<Signature>;

    fn confirm_transaction(&self, signature: &Signature) -> Result<bool>;
}

impl StakingRpc for RpcClient {
    fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
        Ok(self
            .get_account_with_commitment(pubkey, CommitmentConfig::confirmed())?
            .value)
    }

    fn get_program_accounts(
        &self,
        program_id: &Pubkey,
        discriminator: Option<&[u8; 8]>,
    ) -> Result<Vec<(Pubkey, Account)>> {
        let filters = discriminator
            .map(|disc| vec![RpcFilterType::Memcmp(Memcmp::new_raw_bytes(0, disc.to_vec()))]);
        let config = RpcProgramAccountsConfig {
            filters,
            account_config: RpcAccountInfoConfig {
                encoding: Some(UiAccountEncoding::Base64),
                commitment: Some(CommitmentConfig::confirmed()),
                ..RpcAccountInfoConfig::default()
            },
            ..RpcProgramAccountsConfig::default()
        };
        Ok(self.get_program_accounts_with_config(program_id, config)?)
    }

    fn get_latest_blockhash(&self) -> Result<(Hash, u64)> {
        Ok(self.get_latest_blockhash_with_commitment(CommitmentConfig::confirmed())?)
    }

    fn simulate_transaction(&self, txn: &Transaction) -> Result<SimulationOutcome> {
        let result = RpcClient::simulate_transaction(self, txn)?.value;
        Ok(SimulationOutcome {
            err: result.err.map(|e| e.to_string()),
            logs: result.logs.unwrap_or_default(),
        })
    }

    fn send_transaction(&self, txn: &Transaction) -> Result<Signature> {
        Ok(self.send_transaction_with_config(
            txn,
            RpcSendTransactionConfig {
                encoding: Some(UiTransactionEncoding::Base64),
                preflight_commitment: Some(CommitmentConfig::confirmed().commitment),
                ..RpcSendTransactionConfig::default()
            },
        )?)
    }

    fn confirm_transaction(&self, signature: &Signature) -> Result<bool> {
        Ok(self
            .confirm_transaction_with_commitment(signature, CommitmentConfig::confirmed())?
            .value)
    }
}

/// Send a locally signed transaction, optionally waiting for confirmation.
pub fn send_txn(rpc: &dyn StakingRpc, txn: &Transaction, wait_confirm: bool) -> Result<Signature> {
    let signature = rpc.send_transaction(txn)?;
    if wait_confirm && !rpc.confirm_transaction(&signature)? {
        anyhow::bail!("transaction {} was not confirmed", signature);
    }
    Ok(signature)
}

fn error_number_regex() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"Error Number: (\d+)|custom program error: 0x([0-9a-fA-F]+)").ok()
    })
    .as_ref()
}

/// Custom program error number found in simulation logs or an error string.
pub fn parse_program_error<'a>(lines: impl IntoIterator<Item = &'a str>) -> Option<u32> {
    let re = error_number_regex()?;
    lines.into_iter().find_map(|line| {
        let caps = re.captures(line)?;
        if let Some(decimal) = caps.get(1) {
            decimal.as_str().parse().ok()
        } else {
            u32::from_str_radix(caps.get(2)?.as_str(), 16).ok()
        }
    })
}

/// Outcome of simulating a prepared transaction, as reported to the caller.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct SimulationReport {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_code: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    pub warnings: Vec<String>,
    pub logs: Vec<String>,
}

impl SimulationReport {
    pub fn from_outcome(outcome: SimulationOutcome) -> Self {
        let Some(err) = outcome.err else {
            return Self {
                success: true,
                logs: outcome.logs,
                ..Self::default()
            };
        };
        let code = parse_program_error(
            outcome
                .logs
                .iter()
                .map(String::as_str)
                .chain(std::iter::once(err.as_str())),
        );
        let message = match code {
            Some(code) => program_error_message(code),
            None => format!("Simulation failed: {}", err),
        };
        let mut warnings = vec![message.clone()];
        if let Some(hint) = transient_hint(&err, &outcome.logs) {
            warnings.push(hint.to_string());
        }
        Self {
            success: false,
            error_code: code,
            error_message: Some(message),
            warnings,
            logs: outcome.logs,
        }
    }

    /// A simulation that failed this way still returns the transaction,
    /// the program accepts it as a penalized path.
    pub fn is_early_unstake_warning(&self) -> bool {
        self.error_code == Some(ErrorCode::StakingPeriodNotCompleted.code())
    }

    /// Report for a simulation that could not run at all.
    pub fn unavailable(reason: &anyhow::Error) -> Self {
        Self {
            success: false,
            warnings: vec![format!("Simulation unavailable: {:#}", reason)],
            ..Self::default()
        }
    }
}

/// Known failure patterns that usually resolve by retrying or funding.
pub fn transient_hint(err: &str, logs: &[String]) -> Option<&'static str> {
    let text = std::iter::once(err)
        .chain(logs.iter().map(String::as_str))
        .collect::<Vec<_>>()
        .join("\n")
        .to_lowercase();
    if text.contains("insufficient funds") || text.contains("insufficientfunds") {
        Some("Insufficient SOL to pay transaction fees")
    } else if text.contains("blockhash") {
        Some("Blockhash expired, prepare the transaction again")
    } else if text.contains("failed to fetch") {
        Some("Network error while reaching the RPC node")
    } else if text.contains(&format!("0x{:x}", ACCOUNT_DID_NOT_DESERIALIZE)) {
        Some("An account could not be deserialized, run diagnostics first")
    } else {
        None
    }
}

#[cfg(test)]
pub mod mock {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// In-memory RPC node for tests.
    #[derive(Default)]
    pub struct MockRpc {
        pub accounts: RefCell<HashMap<Pubkey, Account>>,
        pub simulation: RefCell<SimulationOutcome>,
        pub sent: RefCell<Vec<Transaction>>,
        pub confirm: bool,
        pub blockhash: Hash,
    }

    impl MockRpc {
        pub fn new() -> Self {
            Self {
                confirm: true,
                blockhash: Hash::new_unique(),
                ..Self::default()
            }
        }

        pub fn set_account(&self, address: Pubkey, owner: Pubkey, data: Vec<u8>) {
            self.accounts.borrow_mut().insert(
                address,
                Account {
                    lamports: 1_000_000,
                    data,
                    owner,
                    executable: false,
                    rent_epoch: 0,
                },
            );
        }

        pub fn fail_simulation(&self, err: &str, logs: &[&str]) {
            *self.simulation.borrow_mut() = SimulationOutcome {
                err: Some(err.to_string()),
                logs: logs.iter().map(|l| l.to_string()).collect(),
            };
        }
    }

    impl StakingRpc for MockRpc {
        fn get_account(&self, pubkey: &Pubkey) -> Result<Option<Account>> {
            Ok(self.accounts.borrow().get(pubkey).cloned())
        }

        fn get_program_accounts(
            &self,
            program_id: &Pubkey,
            discriminator: Option<&[u8; 8]>,
        ) -> Result<Vec<(Pubkey, Account)>> {
            let mut found: Vec<(Pubkey, Account)> = self
                .accounts
                .borrow()
                .iter()
                .filter(|(_, account)| account.owner == *program_id)
                .filter(|(_, account)| match discriminator {
                    Some(disc) => account.data.starts_with(disc),
                    None => true,
                })
                .map(|(key, account)| (*key, account.clone()))
                .collect();
            found.sort_by_key(|(key, _)| *key);
            Ok(found)
        }

        fn get_latest_blockhash(&self) -> Result<(Hash, u64)> {
            Ok((self.blockhash, 1_000))
        }

        fn simulate_transaction(&self, _txn: &Transaction) -> Result<SimulationOutcome> {
            Ok(self.simulation.borrow().clone())
        }

        fn send_transaction(&self, txn: &Transaction) -> Result<Signature> {
            self.sent.borrow_mut().push(txn.clone());
            Ok(Signature::new_unique())
        }

        fn confirm_transaction(&self, _signature: &Signature) -> Result<bool> {
            Ok(self.confirm)
        }
    }
}
