use std::sync::Arc;

use serde_json::Value;
use tracing::debug;

use crate::address::Address;
use crate::backend::{ChainBackend, FunctionCall, encode_input};
use crate::contracts::{ContractKind, GetterArgs, getters};
use crate::error::TokenError;
use crate::network::NetworkConfig;
use crate::types::{TokenView, amount};

/// Reads authoritative token state back from the chain.
pub struct InfoQueryProtocol {
    backend: Arc<dyn ChainBackend>,
    network: NetworkConfig,
}

impl InfoQueryProtocol {
    pub fn new(backend: Arc<dyn ChainBackend>, network: NetworkConfig) -> Self {
        Self { backend, network }
    }

    /// Existence probe, then the five getters concurrently. Any getter
    /// failure fails the whole query; no partial view is returned.
    pub async fn info(&self, token: &Address) -> Result<TokenView, TokenError> {
        let balance = self.backend.account_balance(token).await?;

        let (name, symbol, decimals, total_supply, root_owner) = futures::try_join!(
            self.getter(token, getters::NAME),
            self.getter(token, getters::SYMBOL),
            self.getter(token, getters::DECIMALS),
            self.getter(token, getters::TOTAL_SUPPLY),
            self.getter(token, getters::ROOT_OWNER),
        )?;

        let view = TokenView {
            address: token.clone(),
            name: decode_string(&name, getters::NAME)?,
            symbol: decode_string(&symbol, getters::SYMBOL)?,
            decimals: decode_decimals(&decimals)?,
            total_supply: decode_amount(&total_supply, getters::TOTAL_SUPPLY)?,
            root_owner: decode_address(&root_owner, getters::ROOT_OWNER)?,
            balance,
            explorer_url: self.network.account_url(token),
        };
        debug!(mode = %self.backend.mode(), address = %token, "token state read");
        Ok(view)
    }

    async fn getter(&self, token: &Address, function: &str) -> Result<Value, TokenError> {
        let call = FunctionCall::new(
            ContractKind::TokenRoot,
            token.clone(),
            function,
            encode_input(&GetterArgs::default())?,
        );
        let output = self.backend.run_read_only(call).await?;
        output
            .get("value0")
            .cloned()
            .ok_or_else(|| TokenError::Decode(format!("{function} returned no value0")))
    }
}

// ---------------------------------------------------------------------------
// Output decoding
// ---------------------------------------------------------------------------

fn decode_error(function: &str, value: &Value) -> TokenError {
    TokenError::Decode(format!("unexpected {function} output: {value}"))
}

fn decode_string(value: &Value, function: &str) -> Result<String, TokenError> {
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| decode_error(function, value))
}

/// Integers come back as decimal or hex strings, occasionally as numbers.
fn decode_amount(value: &Value, function: &str) -> Result<u128, TokenError> {
    match value {
        Value::String(s) => amount::parse(s).map_err(|_| decode_error(function, value)),
        Value::Number(n) => n
            .as_u64()
            .map(u128::from)
            .ok_or_else(|| decode_error(function, value)),
        _ => Err(decode_error(function, value)),
    }
}

fn decode_decimals(value: &Value) -> Result<u8, TokenError> {
    let raw = decode_amount(value, getters::DECIMALS)?;
    u8::try_from(raw).map_err(|_| decode_error(getters::DECIMALS, value))
}

fn decode_address(value: &Value, function: &str) -> Result<Address, TokenError> {
    value
        .as_str()
        .and_then(|s| Address::parse(s).ok())
        .ok_or_else(|| decode_error(function, value))
}
