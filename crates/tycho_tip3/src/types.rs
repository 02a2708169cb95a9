use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::address::{Address, TxId};

/// Nano units per display unit.
pub const NANO_PER_UNIT: u128 = 1_000_000_000;

/// `uint128` values travel as decimal strings; numbers are accepted on input.
pub mod amount {
    use serde::{Deserialize, Deserializer, Serializer, de};

    pub fn serialize<S: Serializer>(value: &u128, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<u128, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum Raw {
            Text(String),
            Number(u64),
        }

        match Raw::deserialize(deserializer)? {
            Raw::Text(s) => parse(&s).map_err(de::Error::custom),
            Raw::Number(n) => Ok(u128::from(n)),
        }
    }

    /// Parse a decimal or `0x`-prefixed hex amount.
    pub fn parse(s: &str) -> Result<u128, String> {
        let s = s.trim();
        let parsed = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
            Some(hex) => u128::from_str_radix(hex, 16),
            None => s.parse(),
        };
        parsed.map_err(|e| format!("invalid uint128 amount {s:?}: {e}"))
    }
}

/// Parameters for deploying a new token root. Validated at the boundary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenParams {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "amount")]
    pub initial_supply: u128,
    pub initial_supply_to: Option<Address>,
    pub mint_disabled: bool,
    pub burn_by_root_disabled: bool,
    pub burn_paused: bool,
}

impl TokenParams {
    /// Params with the given identity, zero supply and all policy flags off.
    pub fn new(name: impl Into<String>, symbol: impl Into<String>, decimals: u8) -> Self {
        Self {
            name: name.into(),
            symbol: symbol.into(),
            decimals,
            initial_supply: 0,
            initial_supply_to: None,
            mint_disabled: false,
            burn_by_root_disabled: false,
            burn_paused: false,
        }
    }

    pub fn with_initial_supply(mut self, supply: u128) -> Self {
        self.initial_supply = supply;
        self
    }
}

/// Result of a successful deployment. Immutable once returned.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployedToken {
    pub address: Address,
    #[serde(flatten)]
    pub params: TokenParams,
    pub owner: Address,
    pub transaction_id: TxId,
    pub explorer_url: String,
    pub deployed_at: DateTime<Utc>,
}

/// Authoritative token state as read back from the chain (or registry).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenView {
    pub address: Address,
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    #[serde(with = "amount")]
    pub total_supply: u128,
    pub root_owner: Address,
    /// Native balance of the root account, in nano units.
    #[serde(with = "amount")]
    pub balance: u128,
    pub explorer_url: String,
}

/// Server wallet balance in both nano and display units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalletBalance {
    pub address: Address,
    #[serde(with = "amount")]
    pub nano: u128,
    pub display: f64,
}

impl WalletBalance {
    pub fn from_nano(address: Address, nano: u128) -> Self {
        Self {
            address,
            nano,
            display: nano as f64 / NANO_PER_UNIT as f64,
        }
    }
}

/// Address + settlement id returned by a constructor submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub address: Address,
    pub tx_id: TxId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize, Deserialize)]
    struct Holder {
        #[serde(with = "amount")]
        value: u128,
    }

    #[test]
    fn amount_serializes_as_decimal_string() {
        let json = serde_json::to_string(&Holder {
            value: 340_282_366_920_938_463_463_374_607_431_768_211_455,
        })
        .unwrap();
        assert_eq!(
            json,
            r#"{"value":"340282366920938463463374607431768211455"}"#
        );
    }

    #[test]
    fn amount_accepts_number_hex_and_decimal() {
        let a: Holder = serde_json::from_str(r#"{"value":42}"#).unwrap();
        let b: Holder = serde_json::from_str(r#"{"value":"0x2a"}"#).unwrap();
        let c: Holder = serde_json::from_str(r#"{"value":"42"}"#).unwrap();
        assert_eq!((a.value, b.value, c.value), (42, 42, 42));
        assert!(serde_json::from_str::<Holder>(r#"{"value":"-1"}"#).is_err());
    }

    #[test]
    fn wallet_balance_display_units() {
        let balance = WalletBalance::from_nano(Address::null(), 1_500_000_000);
        assert!((balance.display - 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn token_params_builder_defaults() {
        let params = TokenParams::new("Test Token", "TST", 9).with_initial_supply(10);
        assert_eq!(params.initial_supply, 10);
        assert!(params.initial_supply_to.is_none());
        assert!(!params.mint_disabled && !params.burn_by_root_disabled && !params.burn_paused);
    }

    #[test]
    fn deployed_token_flattens_params() {
        let token = DeployedToken {
            address: Address::null(),
            params: TokenParams::new("Flat", "FLT", 6).with_initial_supply(7),
            owner: Address::null(),
            transaction_id: TxId::from_seed(b"t"),
            explorer_url: "https://explorer/accounts/0:00".into(),
            deployed_at: Utc::now(),
        };
        let value = serde_json::to_value(&token).unwrap();
        assert_eq!(value["name"], "Flat");
        assert_eq!(value["initial_supply"], "7");
        assert!(value.get("params").is_none());
    }
}
