use std::sync::Arc;

use anyhow::Result;
use serde::Serialize;
use tracing::info;
use tycho_core::{BackendMode, TychoConfig};

use crate::address::{Address, TxId};
use crate::backend::{ChainBackend, build_backend};
use crate::contracts::wallet_code;
use crate::deploy::DeploymentProtocol;
use crate::error::TokenError;
use crate::info::InfoQueryProtocol;
use crate::mint::MintProtocol;
use crate::network::NetworkConfig;
use crate::types::{DeployedToken, TokenParams, TokenView, WalletBalance};

/// Liveness summary: network, wallet and its balance.
#[derive(Debug, Clone, Serialize)]
pub struct HealthReport {
    pub status: &'static str,
    pub network: String,
    pub mode: BackendMode,
    pub wallet_address: Address,
    pub wallet_balance: f64,
}

/// The four upward operations over one process-wide backend.
pub struct TokenService {
    backend: Arc<dyn ChainBackend>,
    network: NetworkConfig,
    deployment: DeploymentProtocol,
    minting: MintProtocol,
    queries: InfoQueryProtocol,
}

impl TokenService {
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        network: NetworkConfig,
        deploy_wallet_value: u128,
    ) -> Self {
        Self {
            deployment: DeploymentProtocol::new(
                backend.clone(),
                network.clone(),
                deploy_wallet_value,
            ),
            minting: MintProtocol::new(backend.clone(), deploy_wallet_value),
            queries: InfoQueryProtocol::new(backend.clone(), network.clone()),
            backend,
            network,
        }
    }

    /// Build the backend `config` selects and wire the protocols over it.
    pub fn connect(config: &TychoConfig) -> Result<Self> {
        let backend = build_backend(config)?;
        Ok(Self::new(
            backend,
            NetworkConfig::from_config(config),
            config.deploy_wallet_value,
        ))
    }

    pub fn mode(&self) -> BackendMode {
        self.backend.mode()
    }

    pub fn wallet_address(&self) -> &Address {
        self.backend.wallet_address()
    }

    pub fn network(&self) -> &NetworkConfig {
        &self.network
    }

    pub async fn deploy(&self, params: TokenParams) -> Result<DeployedToken, TokenError> {
        self.deployment.deploy(params, wallet_code()).await
    }

    pub async fn info(&self, token: &Address) -> Result<TokenView, TokenError> {
        self.queries.info(token).await
    }

    pub async fn mint(
        &self,
        token: &Address,
        amount: u128,
        recipient: &Address,
        notify: bool,
    ) -> Result<TxId, TokenError> {
        self.minting.mint(token, amount, recipient, notify).await
    }

    pub async fn wallet_balance(&self) -> Result<WalletBalance, TokenError> {
        let nano = self.backend.wallet_balance().await?;
        Ok(WalletBalance::from_nano(self.wallet_address().clone(), nano))
    }

    pub async fn health(&self) -> Result<HealthReport, TokenError> {
        let balance = self.wallet_balance().await?;
        Ok(HealthReport {
            status: "healthy",
            network: self.network.name.clone(),
            mode: self.mode(),
            wallet_address: balance.address,
            wallet_balance: balance.display,
        })
    }

    pub async fn shutdown(&self) {
        info!(mode = %self.mode(), "shutting down token service");
        self.backend.shutdown().await;
    }
}
