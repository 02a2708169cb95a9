use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use chrono::Utc;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, info};
use tycho_core::BackendMode;

use super::{ChainBackend, ConstructorCall, FunctionCall};
use crate::address::{self, Address, TxId};
use crate::contracts::{self, ContractKind, MintArgs, RootConstructorArgs, RootInitialData, getters};
use crate::error::TokenError;
use crate::registry::{RegistryEntry, TokenRegistry};
use crate::types::Submission;
use crate::wallet::WalletState;

/// Balance reported for the server wallet: 1000 display units.
pub const SIMULATED_WALLET_BALANCE: u128 = 1_000_000_000_000;

/// Native balance credited to every simulated token root.
pub const SIMULATED_ROOT_BALANCE: u128 = 1_000_000_000;

/// Local stand-in for the chain. Never touches the network.
///
/// Addresses and transaction ids are hashes of an explicit nonce (a
/// per-process counter plus a random salt), so two calls can never collide.
pub struct SimulatedBackend {
    wallet: WalletState,
    registry: TokenRegistry,
    nonce: AtomicU64,
    salt: u64,
}

impl SimulatedBackend {
    pub fn new(wallet: WalletState) -> Self {
        Self {
            wallet,
            registry: TokenRegistry::new(),
            nonce: AtomicU64::new(0),
            salt: rand::random(),
        }
    }

    #[cfg(test)]
    pub(crate) fn registry(&self) -> &TokenRegistry {
        &self.registry
    }

    fn next_nonce(&self) -> u64 {
        self.nonce.fetch_add(1, Ordering::Relaxed)
    }

    fn next_tx_id(&self, nonce: u64) -> TxId {
        TxId::from_seed(format!("tx|{}|{nonce}", self.salt).as_bytes())
    }

    fn entry(&self, address: &Address) -> Result<RegistryEntry, TokenError> {
        self.registry
            .get(address)
            .ok_or_else(|| TokenError::NotFound(address.to_string()))
    }
}

fn decode_args<T: DeserializeOwned>(value: Value, what: &str) -> Result<T, TokenError> {
    serde_json::from_value(value)
        .map_err(|e| TokenError::Validation(format!("malformed {what}: {e}")))
}

fn unsupported(contract: ContractKind, function: &str) -> TokenError {
    TokenError::ExecutionFailed {
        exit_code: None,
        message: format!("{contract:?}.{function} is not available on the simulated chain"),
    }
}

#[async_trait]
impl ChainBackend for SimulatedBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    fn wallet_address(&self) -> &Address {
        self.wallet.address()
    }

    async fn submit_constructor(&self, call: ConstructorCall) -> Result<Submission, TokenError> {
        if call.contract != ContractKind::TokenRoot {
            return Err(unsupported(call.contract, contracts::CONSTRUCTOR));
        }
        let data: RootInitialData = decode_args(call.initial_data, "initial data")?;
        let args: RootConstructorArgs = decode_args(call.input, "constructor arguments")?;

        let nonce = self.next_nonce();
        let seed = format!(
            "{}|{}|{}|{}|{}|{nonce}",
            data.name, data.symbol, data.decimals, data.random_nonce, self.salt
        );
        let address = address::derive_simulated_address(seed.as_bytes());
        let tx_id = self.next_tx_id(nonce);

        let entry = RegistryEntry {
            name: data.name,
            symbol: data.symbol,
            decimals: data.decimals,
            total_supply: args.initial_supply,
            root_owner: data.root_owner,
            balance: SIMULATED_ROOT_BALANCE,
            created_at: Utc::now(),
        };
        if !self.registry.insert(address.clone(), entry) {
            return Err(TokenError::ExecutionFailed {
                exit_code: None,
                message: format!("account {address} already exists"),
            });
        }

        info!(mode = "simulated", %address, tx_id = %tx_id, "token root deployed");
        Ok(Submission { address, tx_id })
    }

    async fn submit_call(&self, call: FunctionCall) -> Result<TxId, TokenError> {
        if call.contract != ContractKind::TokenRoot || call.function != contracts::MINT {
            return Err(unsupported(call.contract, &call.function));
        }
        let args: MintArgs = decode_args(call.input, "mint arguments")?;
        let total = self.registry.add_supply(&call.target, args.amount)?;
        let tx_id = self.next_tx_id(self.next_nonce());

        info!(
            mode = "simulated",
            token = %call.target,
            amount = %args.amount,
            total_supply = %total,
            tx_id = %tx_id,
            "tokens minted"
        );
        Ok(tx_id)
    }

    async fn run_read_only(&self, call: FunctionCall) -> Result<Value, TokenError> {
        if call.contract != ContractKind::TokenRoot {
            return Err(unsupported(call.contract, &call.function));
        }
        let entry = self.entry(&call.target)?;
        debug!(mode = "simulated", target = %call.target, function = %call.function, "read-only call");

        let value = match call.function.as_str() {
            getters::NAME => json!(entry.name),
            getters::SYMBOL => json!(entry.symbol),
            getters::DECIMALS => json!(entry.decimals.to_string()),
            getters::TOTAL_SUPPLY => json!(entry.total_supply.to_string()),
            getters::ROOT_OWNER => json!(entry.root_owner),
            getters::WALLET_CODE => json!(contracts::wallet_code()),
            other => return Err(unsupported(call.contract, other)),
        };
        Ok(json!({ "value0": value }))
    }

    async fn account_balance(&self, address: &Address) -> Result<u128, TokenError> {
        if address == self.wallet.address() {
            return Ok(SIMULATED_WALLET_BALANCE);
        }
        Ok(self.entry(address)?.balance)
    }

    async fn shutdown(&self) {
        info!(mode = "simulated", tokens = self.registry.len(), "simulated chain discarded");
    }
}
