//! Chain transport: the four capabilities the live backend needs from a node.
//!
//! [`HttpTransport`] talks to two HTTP services: the GraphQL endpoint for
//! account state, and an SDK bridge that encodes, signs, processes and runs
//! messages. The bridge takes `{ "function": "module.fn", "params": {...} }`
//! and answers `{ "result": ... }` or `{ "error": { code, message, data } }`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::address::Address;
use crate::network::NetworkConfig;
use crate::types::amount;
use crate::wallet::KeyPair;

const CONNECT_TIMEOUT_SECS: u64 = 10;

const ACCOUNT_QUERY: &str =
    "query($id: String!) { accounts(filter: { id: { eq: $id } }) { id balance boc } }";

/// Failures reported by a [`ChainTransport`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("chain endpoint unreachable: {0}")]
    Unreachable(String),

    #[error("account not found: {0}")]
    AccountNotFound(String),

    #[error("execution failed (exit code {exit_code:?}): {message}")]
    Execution {
        exit_code: Option<i32>,
        message: String,
    },

    #[error("unexpected transport response: {0}")]
    Protocol(String),
}

// ---------------------------------------------------------------------------
// Message types
// ---------------------------------------------------------------------------

/// How a message is signed.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", content = "keys")]
pub enum Signer {
    /// Unsigned; used for read-only calls.
    None,
    Keys(KeyPair),
}

/// State-init part of a constructor message.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploySet {
    pub tvc: String,
    pub initial_data: Value,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CallSet {
    pub function_name: String,
    pub input: Value,
}

/// A typed call against an interface description.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EncodeParams {
    pub abi: Value,
    /// Target account; absent for constructor messages.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub address: Option<Address>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deploy_set: Option<DeploySet>,
    pub call_set: CallSet,
    pub signer: Signer,
}

/// An encoded (and, if a signer was given, signed) external message.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct EncodedMessage {
    /// Destination; for constructors this is the derived contract address.
    pub address: Address,
    /// Base64 message BOC.
    pub message: String,
}

/// Read-only execution of `message` against `account_boc`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunTvmParams {
    pub account_boc: String,
    pub message: String,
    pub abi: Value,
}

/// Account fields returned by the existence probe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    pub id: Address,
    pub balance: u128,
    /// Serialized account state; absent for uninitialized accounts.
    pub boc: Option<String>,
}

// ---------------------------------------------------------------------------
// ChainTransport trait
// ---------------------------------------------------------------------------

#[async_trait]
pub trait ChainTransport: Send + Sync {
    /// Encode a typed call. For constructors the returned address is final
    /// before anything is broadcast.
    async fn encode_message(&self, params: &EncodeParams) -> Result<EncodedMessage, TransportError>;

    /// Broadcast and wait for settlement. Returns the transaction id.
    async fn process_message(
        &self,
        message: &EncodedMessage,
        abi: &Value,
    ) -> Result<String, TransportError>;

    /// Execute a message locally against an account state. Returns the
    /// decoded output fields.
    async fn run_tvm(&self, params: &RunTvmParams) -> Result<Value, TransportError>;

    /// Fetch the account, failing with `AccountNotFound` if it does not exist.
    async fn query_account(&self, address: &Address) -> Result<AccountRecord, TransportError>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphQLResponse<T> {
    data: Option<T>,
    errors: Option<Vec<GraphQLError>>,
}

#[derive(Debug, Deserialize)]
struct GraphQLError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct AccountsData {
    accounts: Vec<RawAccount>,
}

#[derive(Debug, Deserialize)]
struct RawAccount {
    id: String,
    balance: Option<Value>,
    boc: Option<String>,
}

#[derive(Debug, Deserialize)]
struct BridgeReply<T> {
    result: Option<T>,
    error: Option<BridgeError>,
}

#[derive(Debug, Deserialize)]
struct BridgeError {
    code: Option<i64>,
    message: String,
    #[serde(default)]
    data: Option<BridgeErrorData>,
}

#[derive(Debug, Default, Deserialize)]
struct BridgeErrorData {
    exit_code: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct ProcessResult {
    transaction: ProcessedTransaction,
}

#[derive(Debug, Deserialize)]
struct ProcessedTransaction {
    id: String,
}

#[derive(Debug, Deserialize)]
struct RunTvmResult {
    decoded: Option<DecodedOutput>,
}

#[derive(Debug, Deserialize)]
struct DecodedOutput {
    output: Option<Value>,
}

/// Parse a balance reported as a decimal string, `0x` hex string, or number.
pub fn parse_balance(raw: &Value) -> Result<u128, TransportError> {
    match raw {
        Value::String(s) => amount::parse(s).map_err(TransportError::Protocol),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| TransportError::Protocol(format!("invalid balance {n}"))),
        Value::Null => Ok(0),
        other => Err(TransportError::Protocol(format!("invalid balance {other}"))),
    }
}

fn account_from_data(address: &Address, data: AccountsData) -> Result<AccountRecord, TransportError> {
    let Some(raw) = data.accounts.into_iter().next() else {
        return Err(TransportError::AccountNotFound(address.to_string()));
    };
    let id = Address::parse(&raw.id)
        .map_err(|_| TransportError::Protocol(format!("invalid account id {:?}", raw.id)))?;
    let balance = match &raw.balance {
        Some(value) => parse_balance(value)?,
        None => 0,
    };
    Ok(AccountRecord {
        id,
        balance,
        boc: raw.boc.filter(|b| !b.is_empty()),
    })
}

fn bridge_result<T>(function: &str, reply: BridgeReply<T>) -> Result<T, TransportError> {
    if let Some(err) = reply.error {
        let exit_code = err.data.unwrap_or_default().exit_code;
        return Err(match exit_code {
            Some(_) => TransportError::Execution {
                exit_code,
                message: err.message,
            },
            None => TransportError::Protocol(format!(
                "{function} failed (code {}): {}",
                err.code.unwrap_or_default(),
                err.message
            )),
        });
    }
    reply
        .result
        .ok_or_else(|| TransportError::Protocol(format!("{function} returned no result")))
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() || err.is_request() {
        TransportError::Unreachable(err.to_string())
    } else {
        TransportError::Protocol(err.to_string())
    }
}

// ---------------------------------------------------------------------------
// HttpTransport
// ---------------------------------------------------------------------------

/// [`ChainTransport`] over the GraphQL endpoint and the SDK bridge.
pub struct HttpTransport {
    client: Client,
    endpoint: String,
    bridge_url: String,
    request_timeout: Duration,
}

impl HttpTransport {
    pub fn new(network: &NetworkConfig) -> anyhow::Result<Self> {
        network.validate()?;
        // No client-wide timeout: settlement waits are bounded by the caller.
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build HTTP client: {e}"))?;

        Ok(Self {
            client,
            endpoint: network.endpoint.clone(),
            bridge_url: network.sdk_bridge_url.clone(),
            request_timeout: Duration::from_secs(network.request_timeout_secs),
        })
    }

    async fn graphql<T: DeserializeOwned>(
        &self,
        query: &str,
        variables: Value,
    ) -> Result<T, TransportError> {
        debug!(url = %self.endpoint, "GraphQL request");

        let resp = self
            .client
            .post(&self.endpoint)
            .timeout(self.request_timeout)
            .json(&serde_json::json!({ "query": query, "variables": variables }))
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(TransportError::Unreachable(format!("GraphQL HTTP {status}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TransportError::Protocol(format!("GraphQL HTTP {status}: {body}")));
        }

        let gql: GraphQLResponse<T> = resp
            .json()
            .await
            .map_err(|e| TransportError::Protocol(format!("bad GraphQL response: {e}")))?;

        if let Some(errors) = gql.errors
            && !errors.is_empty()
        {
            let messages: Vec<&str> = errors.iter().map(|e| e.message.as_str()).collect();
            return Err(TransportError::Protocol(format!(
                "GraphQL errors: {}",
                messages.join("; ")
            )));
        }

        gql.data
            .ok_or_else(|| TransportError::Protocol("GraphQL response contained no data".into()))
    }

    async fn bridge<T: DeserializeOwned>(
        &self,
        function: &str,
        params: Value,
        timeout: Option<Duration>,
    ) -> Result<T, TransportError> {
        debug!(url = %self.bridge_url, function, "SDK bridge request");

        let mut request = self
            .client
            .post(&self.bridge_url)
            .json(&serde_json::json!({ "function": function, "params": params }));
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let resp = request.send().await.map_err(map_reqwest_error)?;

        let status = resp.status();
        if status.is_server_error() {
            return Err(TransportError::Unreachable(format!("SDK bridge HTTP {status}")));
        }

        let reply: BridgeReply<T> = resp
            .json()
            .await
            .map_err(|e| TransportError::Protocol(format!("bad SDK bridge response: {e}")))?;
        bridge_result(function, reply)
    }
}

fn abi_param(abi: &Value) -> Value {
    serde_json::json!({ "type": "Contract", "value": abi })
}

#[async_trait]
impl ChainTransport for HttpTransport {
    async fn encode_message(&self, params: &EncodeParams) -> Result<EncodedMessage, TransportError> {
        let mut body =
            serde_json::to_value(params).map_err(|e| TransportError::Protocol(e.to_string()))?;
        body["abi"] = abi_param(&params.abi);
        self.bridge("abi.encode_message", body, Some(self.request_timeout))
            .await
    }

    async fn process_message(
        &self,
        message: &EncodedMessage,
        abi: &Value,
    ) -> Result<String, TransportError> {
        let body = serde_json::json!({
            "message": message.message,
            "abi": abi_param(abi),
            "send_events": false,
        });
        let result: ProcessResult = self.bridge("processing.send_and_wait", body, None).await?;
        Ok(result.transaction.id)
    }

    async fn run_tvm(&self, params: &RunTvmParams) -> Result<Value, TransportError> {
        let body = serde_json::json!({
            "account": params.account_boc,
            "message": params.message,
            "abi": abi_param(&params.abi),
        });
        let result: RunTvmResult = self
            .bridge("tvm.run_tvm", body, Some(self.request_timeout))
            .await?;
        result
            .decoded
            .and_then(|d| d.output)
            .ok_or_else(|| TransportError::Protocol("run_tvm returned no decoded output".into()))
    }

    async fn query_account(&self, address: &Address) -> Result<AccountRecord, TransportError> {
        let data: AccountsData = self
            .graphql(ACCOUNT_QUERY, serde_json::json!({ "id": address.as_str() }))
            .await?;
        account_from_data(address, data)
    }
}
