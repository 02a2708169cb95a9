//! Test doubles: a scripted [`ChainTransport`] for driving the live backend
//! offline, and a [`ChainBackend`] that records what the protocols submit.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{Value, json};
use tycho_core::BackendMode;

use super::{ChainBackend, ConstructorCall, FunctionCall};
use crate::address::{self, Address, TxId};
use crate::error::TokenError;
use crate::types::Submission;
use crate::transport::{
    AccountRecord, ChainTransport, EncodeParams, EncodedMessage, RunTvmParams, Signer,
    TransportError,
};

pub(crate) const MOCK_TX_ID: &str = "abababababababababababababababababababababababababababababababab";

/// Every knob defaults to the happy path.
#[derive(Default)]
pub(crate) struct MockTransport {
    /// Delay before `process_message` answers.
    pub process_delay: Duration,
    /// Error returned (once) by `process_message`.
    pub process_error: Mutex<Option<TransportError>>,
    /// Account returned by `query_account`; `None` means not found.
    pub account: Option<AccountRecord>,
    /// Number of leading `query_account` calls that fail as unreachable.
    pub unreachable_queries: u32,
    /// Getter outputs keyed by function name (`value0` payload).
    pub outputs: HashMap<String, Value>,
    /// Getter whose `run_tvm` fails as unreachable.
    pub failing_getter: Option<String>,

    pub query_calls: AtomicU32,
    pub events: Mutex<Vec<String>>,
}

impl MockTransport {
    /// A transport serving a deployed root at `address`.
    pub fn with_account(address: &Address, balance: u128) -> Self {
        Self {
            account: Some(AccountRecord {
                id: address.clone(),
                balance,
                boc: Some("te6ccgEBAQEA".into()),
            }),
            ..Self::default()
        }
    }

    pub fn output(mut self, function: &str, value: Value) -> Self {
        self.outputs.insert(function.to_string(), value);
        self
    }

    pub fn events(&self) -> Vec<String> {
        self.events.lock().clone()
    }

    fn record(&self, event: String) {
        self.events.lock().push(event);
    }
}

#[async_trait]
impl ChainTransport for MockTransport {
    async fn encode_message(&self, params: &EncodeParams) -> Result<EncodedMessage, TransportError> {
        let function = &params.call_set.function_name;
        let signed = matches!(params.signer, Signer::Keys(_));
        self.record(format!("encode:{function}:signed={signed}"));

        let address = match &params.address {
            Some(target) => target.clone(),
            None => {
                let seed = serde_json::to_vec(&params.deploy_set.as_ref().map(|d| &d.initial_data))
                    .map_err(|e| TransportError::Protocol(e.to_string()))?;
                address::derive_simulated_address(&seed)
            }
        };
        Ok(EncodedMessage {
            address,
            message: format!("msg:{function}"),
        })
    }

    async fn process_message(
        &self,
        message: &EncodedMessage,
        _abi: &Value,
    ) -> Result<String, TransportError> {
        self.record(format!("process:{}", message.address));
        if !self.process_delay.is_zero() {
            tokio::time::sleep(self.process_delay).await;
        }
        if let Some(err) = self.process_error.lock().take() {
            return Err(err);
        }
        Ok(MOCK_TX_ID.to_uppercase())
    }

    async fn run_tvm(&self, params: &RunTvmParams) -> Result<Value, TransportError> {
        let function = params.message.trim_start_matches("msg:");
        self.record(format!("run:{function}"));
        if self.failing_getter.as_deref() == Some(function) {
            return Err(TransportError::Unreachable("connection reset".into()));
        }
        self.outputs
            .get(function)
            .map(|v| json!({ "value0": v }))
            .ok_or_else(|| TransportError::Execution {
                exit_code: Some(60),
                message: format!("function {function} not found"),
            })
    }

    async fn query_account(&self, address: &Address) -> Result<AccountRecord, TransportError> {
        let call = self.query_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call <= self.unreachable_queries {
            return Err(TransportError::Unreachable("connection refused".into()));
        }
        match &self.account {
            Some(account) if &account.id == address => Ok(account.clone()),
            _ => Err(TransportError::AccountNotFound(address.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// RecordingBackend
// ---------------------------------------------------------------------------

/// [`ChainBackend`] that records submissions and answers with fixed ids.
pub(crate) struct RecordingBackend {
    pub wallet: Address,
    pub constructors: Mutex<Vec<ConstructorCall>>,
    pub calls: Mutex<Vec<FunctionCall>>,
}

impl RecordingBackend {
    pub fn new() -> Self {
        Self {
            wallet: address::derive_simulated_address(b"recording-wallet"),
            constructors: Mutex::new(Vec::new()),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl ChainBackend for RecordingBackend {
    fn mode(&self) -> BackendMode {
        BackendMode::Simulated
    }

    fn wallet_address(&self) -> &Address {
        &self.wallet
    }

    async fn submit_constructor(&self, call: ConstructorCall) -> Result<Submission, TokenError> {
        let n = {
            let mut constructors = self.constructors.lock();
            constructors.push(call);
            constructors.len()
        };
        Ok(Submission {
            address: address::derive_simulated_address(format!("recorded-{n}").as_bytes()),
            tx_id: TxId::from_seed(format!("recorded-{n}").as_bytes()),
        })
    }

    async fn submit_call(&self, call: FunctionCall) -> Result<TxId, TokenError> {
        self.calls.lock().push(call);
        Ok(TxId::from_seed(b"recorded-call"))
    }

    async fn run_read_only(&self, call: FunctionCall) -> Result<Value, TokenError> {
        Err(TokenError::NotFound(call.target.to_string()))
    }

    async fn account_balance(&self, address: &Address) -> Result<u128, TokenError> {
        Err(TokenError::NotFound(address.to_string()))
    }
}
