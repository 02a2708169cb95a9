//! Request shapes accepted from callers, with boundary validation.
//!
//! The protocols trust what they receive; these types are where untrusted
//! input becomes [`TokenParams`] or a [`MintOrder`].

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::error::TokenError;
use crate::types::{TokenParams, amount};

pub const MAX_NAME_CHARS: usize = 64;
pub const MAX_SYMBOL_CHARS: usize = 16;
pub const MAX_DECIMALS: u8 = 18;
pub const DEFAULT_DECIMALS: u8 = 9;

fn default_decimals() -> u8 {
    DEFAULT_DECIMALS
}

fn check_len(field: &str, value: &str, max: usize) -> Result<(), TokenError> {
    let len = value.chars().count();
    if len == 0 || len > max {
        return Err(TokenError::Validation(format!(
            "{field} must be 1-{max} characters (got {len})"
        )));
    }
    Ok(())
}

fn parse_address(field: &str, value: &str) -> Result<Address, TokenError> {
    Address::parse(value.trim())
        .map_err(|_| TokenError::Validation(format!("{field} is not a valid address: {value:?}")))
}

// ---------------------------------------------------------------------------
// Token creation
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenCreateRequest {
    pub name: String,
    pub symbol: String,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
    #[serde(default, with = "amount")]
    pub initial_supply: u128,
    #[serde(default)]
    pub initial_supply_to: Option<String>,
    #[serde(default)]
    pub mint_disabled: bool,
    #[serde(default)]
    pub burn_by_root_disabled: bool,
    #[serde(default)]
    pub burn_paused: bool,
}

impl TokenCreateRequest {
    pub fn new(name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals: DEFAULT_DECIMALS,
            initial_supply: 0,
            initial_supply_to: None,
            mint_disabled: false,
            burn_by_root_disabled: false,
            burn_paused: false,
        }
    }

    pub fn validate(&self) -> Result<(), TokenError> {
        check_len("name", &self.name, MAX_NAME_CHARS)?;
        check_len("symbol", &self.symbol, MAX_SYMBOL_CHARS)?;
        if self.decimals > MAX_DECIMALS {
            return Err(TokenError::Validation(format!(
                "decimals must be 0-{MAX_DECIMALS} (got {})",
                self.decimals
            )));
        }
        if let Some(to) = &self.initial_supply_to {
            parse_address("initial_supply_to", to)?;
        }
        Ok(())
    }

    /// Validate and convert into deploy parameters.
    pub fn into_params(self) -> Result<TokenParams, TokenError> {
        self.validate()?;
        let initial_supply_to = self
            .initial_supply_to
            .as_deref()
            .map(|to| parse_address("initial_supply_to", to))
            .transpose()?;

        Ok(TokenParams {
            name: self.name,
            symbol: self.symbol,
            decimals: self.decimals,
            initial_supply: self.initial_supply,
            initial_supply_to,
            mint_disabled: self.mint_disabled,
            burn_by_root_disabled: self.burn_by_root_disabled,
            burn_paused: self.burn_paused,
        })
    }
}

// ---------------------------------------------------------------------------
// Mint
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MintRequest {
    pub token_address: String,
    #[serde(with = "amount")]
    pub amount: u128,
    pub recipient: String,
    #[serde(default)]
    pub notify: bool,
}

/// A validated mint.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintOrder {
    pub token: Address,
    pub amount: u128,
    pub recipient: Address,
    pub notify: bool,
}

impl MintRequest {
    pub fn validate(&self) -> Result<(), TokenError> {
        self.clone().into_order().map(|_| ())
    }

    pub fn into_order(self) -> Result<MintOrder, TokenError> {
        if self.amount == 0 {
            return Err(TokenError::Validation("amount must be greater than 0".into()));
        }
        Ok(MintOrder {
            token: parse_address("token_address", &self.token_address)?,
            amount: self.amount,
            recipient: parse_address("recipient", &self.recipient)?,
            notify: self.notify,
        })
    }
}
