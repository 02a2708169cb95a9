use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde_json::Value;
use tracing::{debug, info, warn};
use tycho_core::BackendMode;

use super::{ChainBackend, ConstructorCall, FunctionCall};
use crate::address::{Address, TxId};
use crate::contracts;
use crate::error::{TokenError, classify_execution_failure};
use crate::transport::{
    CallSet, ChainTransport, DeploySet, EncodeParams, EncodedMessage, RunTvmParams, Signer,
    TransportError,
};
use crate::types::Submission;
use crate::wallet::{KeyPair, WalletState};

const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_millis(250);

impl From<TransportError> for TokenError {
    fn from(err: TransportError) -> Self {
        match err {
            TransportError::Unreachable(msg) => TokenError::BackendUnavailable(msg),
            TransportError::AccountNotFound(addr) => TokenError::NotFound(addr),
            TransportError::Execution { exit_code, message } => {
                classify_execution_failure(exit_code, &message)
            }
            TransportError::Protocol(msg) => TokenError::Decode(msg),
        }
    }
}

/// Backend that signs with the server wallet and talks to a real node.
pub struct LiveBackend {
    transport: Arc<dyn ChainTransport>,
    wallet: WalletState,
    keys: KeyPair,
    settlement_timeout: Duration,
    read_retries: u32,
    retry_backoff: Duration,
}

impl LiveBackend {
    /// Fails if the wallet carries no signing keys.
    pub fn new(
        transport: Arc<dyn ChainTransport>,
        wallet: WalletState,
        settlement_timeout: Duration,
        read_retries: u32,
    ) -> anyhow::Result<Self> {
        let keys = wallet
            .keys()
            .cloned()
            .context("live backend requires a wallet key pair")?;
        Ok(Self {
            transport,
            wallet,
            keys,
            settlement_timeout,
            read_retries,
            retry_backoff: DEFAULT_RETRY_BACKOFF,
        })
    }

    pub fn with_retry_backoff(mut self, backoff: Duration) -> Self {
        self.retry_backoff = backoff;
        self
    }

    fn signer(&self) -> Signer {
        Signer::Keys(self.keys.clone())
    }

    /// Broadcast and wait for settlement, bounded by the settlement timeout.
    /// On expiry the message may still land; the caller gets `Timeout`. A
    /// connection lost mid-broadcast is `OutcomeUnknown` for the same reason.
    async fn settle(&self, encoded: &EncodedMessage, abi: &Value) -> Result<TxId, TokenError> {
        let outcome =
            tokio::time::timeout(self.settlement_timeout, self.transport.process_message(encoded, abi))
                .await;

        match outcome {
            Ok(Ok(raw)) => TxId::parse(&raw),
            Ok(Err(TransportError::Unreachable(msg))) => {
                warn!(
                    mode = "live",
                    address = %encoded.address,
                    error = %msg,
                    "lost contact with the bridge while broadcasting"
                );
                Err(TokenError::OutcomeUnknown(msg))
            }
            Ok(Err(err)) => Err(err.into()),
            Err(_) => {
                warn!(
                    mode = "live",
                    address = %encoded.address,
                    timeout_secs = self.settlement_timeout.as_secs(),
                    "settlement not observed before timeout; transaction may still finalize"
                );
                Err(TokenError::Timeout {
                    timeout_secs: self.settlement_timeout.as_secs(),
                })
            }
        }
    }

    /// Run a side-effect-free operation, retrying on `BackendUnavailable`.
    async fn read_with_retry<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T, TokenError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, TokenError>>,
    {
        let mut attempt = 0;
        loop {
            match op().await {
                Err(err) if err.is_retryable() && attempt < self.read_retries => {
                    attempt += 1;
                    warn!(mode = "live", what, attempt, error = %err, "retrying read");
                    tokio::time::sleep(self.retry_backoff * attempt).await;
                }
                other => return other,
            }
        }
    }

    async fn run_read_only_once(&self, call: &FunctionCall) -> Result<Value, TokenError> {
        let abi = &contracts::interface(call.contract).abi;
        let account = self.transport.query_account(&call.target).await?;
        let account_boc = account
            .boc
            .ok_or_else(|| TokenError::NotFound(call.target.to_string()))?;

        let encoded = self
            .transport
            .encode_message(&EncodeParams {
                abi: abi.clone(),
                address: Some(call.target.clone()),
                deploy_set: None,
                call_set: CallSet {
                    function_name: call.function.clone(),
                    input: call.input.clone(),
                },
                signer: Signer::None,
            })
            .await?;

        let output = self
            .transport
            .run_tvm(&RunTvmParams {
                account_boc,
                message: encoded.message,
                abi: abi.clone(),
            })
            .await?;
        Ok(output)
    }

    async fn account_balance_once(&self, address: &Address) -> Result<u128, TokenError> {
        Ok(self.transport.query_account(address).await?.balance)
    }
}

#[async_trait]
impl ChainBackend for LiveBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Live
    }

    fn wallet_address(&self) -> &Address {
        self.wallet.address()
    }

    async fn submit_constructor(&self, call: ConstructorCall) -> Result<Submission, TokenError> {
        let interface = contracts::interface(call.contract);
        let encoded = self
            .transport
            .encode_message(&EncodeParams {
                abi: interface.abi.clone(),
                address: None,
                deploy_set: Some(DeploySet {
                    tvc: interface.tvc.clone(),
                    initial_data: call.initial_data,
                }),
                call_set: CallSet {
                    function_name: contracts::CONSTRUCTOR.into(),
                    input: call.input,
                },
                signer: self.signer(),
            })
            .await?;

        // Address is final here, before anything is broadcast.
        info!(mode = "live", address = %encoded.address, "constructor encoded; broadcasting");
        let tx_id = self.settle(&encoded, &interface.abi).await?;
        info!(mode = "live", address = %encoded.address, tx_id = %tx_id, "contract deployed");

        Ok(Submission {
            address: encoded.address,
            tx_id,
        })
    }

    async fn submit_call(&self, call: FunctionCall) -> Result<TxId, TokenError> {
        let abi = &contracts::interface(call.contract).abi;
        let encoded = self
            .transport
            .encode_message(&EncodeParams {
                abi: abi.clone(),
                address: Some(call.target.clone()),
                deploy_set: None,
                call_set: CallSet {
                    function_name: call.function.clone(),
                    input: call.input,
                },
                signer: self.signer(),
            })
            .await?;

        let tx_id = self.settle(&encoded, abi).await?;
        info!(
            mode = "live",
            target = %call.target,
            function = %call.function,
            tx_id = %tx_id,
            "call settled"
        );
        Ok(tx_id)
    }

    async fn run_read_only(&self, call: FunctionCall) -> Result<Value, TokenError> {
        debug!(mode = "live", target = %call.target, function = %call.function, "read-only call");
        let call = &call;
        self.read_with_retry("run_read_only", move || self.run_read_only_once(call))
            .await
    }

    async fn account_balance(&self, address: &Address) -> Result<u128, TokenError> {
        self.read_with_retry("account_balance", move || self.account_balance_once(address))
            .await
    }

    async fn shutdown(&self) {
        info!(mode = "live", wallet = %self.wallet.address(), "live backend shut down");
    }
}
