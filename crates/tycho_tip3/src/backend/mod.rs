//! Dual-mode chain backend.
//!
//! The protocols only see [`ChainBackend`]. Which implementation sits behind
//! it is decided once by [`build_backend`] and never changes for the life of
//! the process.

pub mod live;
pub mod simulated;

#[cfg(test)]
pub(crate) mod mock;

use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use tracing::info;
use tycho_core::{BackendMode, TychoConfig};

use crate::address::{Address, TxId};
use crate::contracts::ContractKind;
use crate::error::TokenError;
use crate::network::NetworkConfig;
use crate::transport::HttpTransport;
use crate::types::Submission;
use crate::wallet::WalletState;

pub use live::LiveBackend;
pub use simulated::SimulatedBackend;

/// A constructor message: persistent data plus constructor arguments.
#[derive(Debug, Clone)]
pub struct ConstructorCall {
    pub contract: ContractKind,
    pub initial_data: Value,
    pub input: Value,
}

/// A function call against a deployed contract.
#[derive(Debug, Clone)]
pub struct FunctionCall {
    pub contract: ContractKind,
    pub target: Address,
    pub function: String,
    pub input: Value,
}

impl FunctionCall {
    pub fn new(
        contract: ContractKind,
        target: Address,
        function: impl Into<String>,
        input: Value,
    ) -> Self {
        Self {
            contract,
            target,
            function: function.into(),
            input,
        }
    }
}

/// Serialize typed arguments into the JSON shape the encoder takes.
pub fn encode_input<T: Serialize>(args: &T) -> Result<Value, TokenError> {
    serde_json::to_value(args).map_err(|e| TokenError::Decode(format!("unencodable arguments: {e}")))
}

// ---------------------------------------------------------------------------
// ChainBackend trait
// ---------------------------------------------------------------------------

/// Submit, read and balance capabilities shared by both backends.
///
/// Both implementations return the same success and error shapes, so the
/// protocols never branch on the mode.
#[async_trait]
pub trait ChainBackend: Send + Sync {
    fn mode(&self) -> BackendMode;

    /// The server wallet that signs and pays for every submission.
    fn wallet_address(&self) -> &Address;

    /// Deploy a contract. The address is fixed before broadcast.
    async fn submit_constructor(&self, call: ConstructorCall) -> Result<Submission, TokenError>;

    /// Send a state-changing call and wait for settlement.
    async fn submit_call(&self, call: FunctionCall) -> Result<TxId, TokenError>;

    /// Execute a getter without a transaction. Returns the decoded output
    /// object (`{ "value0": ... }`).
    async fn run_read_only(&self, call: FunctionCall) -> Result<Value, TokenError>;

    /// Native balance of an account, in nano units. `NotFound` if the
    /// account does not exist.
    async fn account_balance(&self, address: &Address) -> Result<u128, TokenError>;

    async fn wallet_balance(&self) -> Result<u128, TokenError> {
        self.account_balance(self.wallet_address()).await
    }

    /// Release backend resources. Called once at process exit.
    async fn shutdown(&self) {}
}

/// Build the backend `config` selects.
pub fn build_backend(config: &TychoConfig) -> Result<Arc<dyn ChainBackend>> {
    let wallet = WalletState::from_config(config)?;
    let backend: Arc<dyn ChainBackend> = match config.backend_mode() {
        BackendMode::Simulated => Arc::new(SimulatedBackend::new(wallet)),
        BackendMode::Live => {
            let network = NetworkConfig::from_config(config);
            let transport = Arc::new(HttpTransport::new(&network)?);
            Arc::new(LiveBackend::new(
                transport,
                wallet,
                config.settlement_timeout(),
                config.read_retries,
            )?)
        }
    };
    info!(
        mode = %backend.mode(),
        wallet = %backend.wallet_address(),
        "chain backend initialized"
    );
    Ok(backend)
}
