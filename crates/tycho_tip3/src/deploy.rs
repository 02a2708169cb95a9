use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::address::Address;
use crate::backend::{ChainBackend, ConstructorCall, encode_input};
use crate::contracts::{CodeBlob, ContractKind, RootConstructorArgs, RootInitialData};
use crate::error::TokenError;
use crate::network::NetworkConfig;
use crate::types::{DeployedToken, TokenParams};

/// Assembles and submits token root constructor messages.
pub struct DeploymentProtocol {
    backend: Arc<dyn ChainBackend>,
    network: NetworkConfig,
    deploy_wallet_value: u128,
}

impl DeploymentProtocol {
    pub fn new(
        backend: Arc<dyn ChainBackend>,
        network: NetworkConfig,
        deploy_wallet_value: u128,
    ) -> Self {
        Self {
            backend,
            network,
            deploy_wallet_value,
        }
    }

    /// Deploy a new token root owned by the server wallet.
    ///
    /// Every call gets a fresh random nonce in the persistent data, so the
    /// derived address is new each time; a retried deploy never collides
    /// with an earlier attempt.
    pub async fn deploy(
        &self,
        mut params: TokenParams,
        wallet_code: CodeBlob,
    ) -> Result<DeployedToken, TokenError> {
        let wallet = self.backend.wallet_address().clone();
        let recipient = params
            .initial_supply_to
            .clone()
            .unwrap_or_else(|| wallet.clone());

        // No holder wallet is allocated for a zero balance.
        let initial_supply_to = if params.initial_supply == 0 {
            Address::null()
        } else {
            recipient.clone()
        };

        let initial_data = RootInitialData {
            name: params.name.clone(),
            symbol: params.symbol.clone(),
            decimals: params.decimals,
            root_owner: wallet.clone(),
            wallet_code,
            random_nonce: rand::random::<u64>().to_string(),
        };
        let args = RootConstructorArgs {
            initial_supply_to,
            initial_supply: params.initial_supply,
            deploy_wallet_value: self.deploy_wallet_value,
            mint_disabled: params.mint_disabled,
            burn_by_root_disabled: params.burn_by_root_disabled,
            burn_paused: params.burn_paused,
            remaining_gas_to: wallet.clone(),
        };

        let submission = self
            .backend
            .submit_constructor(ConstructorCall {
                contract: ContractKind::TokenRoot,
                initial_data: encode_input(&initial_data)?,
                input: encode_input(&args)?,
            })
            .await?;

        info!(
            mode = %self.backend.mode(),
            address = %submission.address,
            symbol = %params.symbol,
            initial_supply = %params.initial_supply,
            "token deployed"
        );

        params.initial_supply_to = Some(recipient);
        Ok(DeployedToken {
            explorer_url: self.network.account_url(&submission.address),
            address: submission.address,
            params,
            owner: wallet,
            transaction_id: submission.tx_id,
            deployed_at: Utc::now(),
        })
    }
}
