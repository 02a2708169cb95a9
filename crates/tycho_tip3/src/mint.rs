use std::sync::Arc;

use tracing::info;

use crate::address::{Address, TxId};
use crate::backend::{ChainBackend, FunctionCall, encode_input};
use crate::contracts::{self, ContractKind, MintArgs};
use crate::error::TokenError;

/// Issues new supply through the root's `mint` function.
///
/// No owner check happens here. The live root contract rejects non-owner
/// mints, which surfaces as `AuthorizationRejected`.
pub struct MintProtocol {
    backend: Arc<dyn ChainBackend>,
    deploy_wallet_value: u128,
}

impl MintProtocol {
    pub fn new(backend: Arc<dyn ChainBackend>, deploy_wallet_value: u128) -> Self {
        Self {
            backend,
            deploy_wallet_value,
        }
    }

    pub async fn mint(
        &self,
        token: &Address,
        amount: u128,
        recipient: &Address,
        notify: bool,
    ) -> Result<TxId, TokenError> {
        if amount == 0 {
            return Err(TokenError::Validation("mint amount must be positive".into()));
        }

        let args = MintArgs {
            amount,
            recipient: recipient.clone(),
            deploy_wallet_value: self.deploy_wallet_value,
            remaining_gas_to: self.backend.wallet_address().clone(),
            notify,
            payload: String::new(),
        };
        let call = FunctionCall::new(
            ContractKind::TokenRoot,
            token.clone(),
            contracts::MINT,
            encode_input(&args)?,
        );

        let tx_id = self.backend.submit_call(call).await?;
        info!(
            mode = %self.backend.mode(),
            token = %token,
            recipient = %recipient,
            amount = %amount,
            tx_id = %tx_id,
            "mint submitted"
        );
        Ok(tx_id)
    }
}
