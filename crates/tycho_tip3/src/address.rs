//! Canonical account addresses and transaction ids.
//!
//! An address is the workchain tag `0:` followed by 64 lowercase hex chars
//! (a 256-bit account id). Simulated addresses and transaction ids are
//! SHA-256 digests of caller-supplied seeds.

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::TokenError;

const WORKCHAIN_PREFIX: &str = "0:";
const ACCOUNT_ID_HEX_LEN: usize = 64;

/// Total rendered length: prefix + 64 hex chars.
pub const ADDRESS_LEN: usize = WORKCHAIN_PREFIX.len() + ACCOUNT_ID_HEX_LEN;

fn is_lower_hex(s: &str, len: usize) -> bool {
    s.len() == len && s.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
}

/// Structural check only: prefix + 64 lowercase hex chars. Says nothing
/// about whether a contract is deployed there.
pub fn validate(s: &str) -> bool {
    s.strip_prefix(WORKCHAIN_PREFIX)
        .is_some_and(|id| is_lower_hex(id, ACCOUNT_ID_HEX_LEN))
}

fn sha256_hex(seed: &[u8]) -> String {
    hex::encode(Sha256::digest(seed))
}

/// Derive a simulated account address from seed bytes.
pub fn derive_simulated_address(seed: &[u8]) -> Address {
    Address(format!("{WORKCHAIN_PREFIX}{}", sha256_hex(seed)))
}

fn invalid_address(s: &str) -> TokenError {
    TokenError::Validation(format!(
        "invalid address {s:?}: expected \"0:\" followed by 64 lowercase hex chars"
    ))
}

// ---------------------------------------------------------------------------
// Address
// ---------------------------------------------------------------------------

/// A validated account address. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Address(String);

impl Address {
    /// Parse and validate an address string.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        if validate(s) {
            Ok(Self(s.to_string()))
        } else {
            Err(invalid_address(s))
        }
    }

    /// The canonical null address (all-zero account id).
    pub fn null() -> Self {
        Self(format!("{WORKCHAIN_PREFIX}{}", "0".repeat(ACCOUNT_ID_HEX_LEN)))
    }

    pub fn is_null(&self) -> bool {
        self.0[WORKCHAIN_PREFIX.len()..].bytes().all(|b| b == b'0')
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for Address {
    type Error = TokenError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        if validate(&value) {
            Ok(Self(value))
        } else {
            Err(invalid_address(&value))
        }
    }
}

impl From<Address> for String {
    fn from(value: Address) -> Self {
        value.0
    }
}

impl std::str::FromStr for Address {
    type Err = TokenError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

// ---------------------------------------------------------------------------
// TxId
// ---------------------------------------------------------------------------

/// Transaction identifier: 64 hex chars.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TxId(String);

impl TxId {
    /// Wrap a transaction id reported by the chain.
    pub fn parse(s: &str) -> Result<Self, TokenError> {
        let lower = s.to_lowercase();
        if is_lower_hex(&lower, ACCOUNT_ID_HEX_LEN) {
            Ok(Self(lower))
        } else {
            Err(TokenError::Decode(format!("invalid transaction id {s:?}")))
        }
    }

    /// Derive a simulated transaction id from a unique nonce.
    pub fn from_seed(seed: &[u8]) -> Self {
        Self(sha256_hex(seed))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TxId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID: &str = "0:8a3f0f0bd4c2a7e8b1d6f6a4c9e0b2d3f4a5b6c7d8e9f0a1b2c3d4e5f6a7b8c9";

    #[test]
    fn validate_accepts_canonical_form() {
        assert!(validate(VALID));
        assert!(validate(Address::null().as_str()));
    }

    #[test]
    fn validate_rejects_malformed_strings() {
        let upper = VALID.to_uppercase();
        let short = &VALID[..ADDRESS_LEN - 1];
        let long = format!("{VALID}0");
        let wrong_workchain = VALID.replacen("0:", "-1:", 1);
        let non_hex = VALID.replacen('a', "g", 1);
        for bad in [
            "",
            "0:",
            "0:nonexistent",
            short,
            long.as_str(),
            upper.as_str(),
            wrong_workchain.as_str(),
            non_hex.as_str(),
            &VALID[2..],
        ] {
            assert!(!validate(bad), "accepted {bad:?}");
        }
    }

    #[test]
    fn derived_address_has_canonical_shape() {
        let addr = derive_simulated_address(b"Test Token|TST|9|1");
        assert_eq!(addr.as_str().len(), ADDRESS_LEN);
        assert!(validate(addr.as_str()));
    }

    #[test]
    fn derivation_is_deterministic_and_seed_sensitive() {
        let a = derive_simulated_address(b"seed-1");
        let b = derive_simulated_address(b"seed-1");
        let c = derive_simulated_address(b"seed-2");
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn parse_rejects_with_validation_error() {
        let err = Address::parse("0:xyz").unwrap_err();
        assert!(matches!(err, TokenError::Validation(_)));
    }

    #[test]
    fn try_from_string_rejects_with_validation_error() {
        let err = Address::try_from("0:123".to_string()).unwrap_err();
        assert!(matches!(err, TokenError::Validation(msg) if msg.contains("\"0:123\"")));
        assert_eq!(Address::try_from(VALID.to_string()).unwrap().as_str(), VALID);
    }

    #[test]
    fn null_address_is_null() {
        assert!(Address::null().is_null());
        assert!(!Address::parse(VALID).unwrap().is_null());
    }

    #[test]
    fn serde_uses_plain_string_and_validates() {
        let addr = Address::parse(VALID).unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, format!("\"{VALID}\""));

        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);

        let bad: Result<Address, _> = serde_json::from_str("\"0:123\"");
        assert!(bad.is_err());
    }

    #[test]
    fn tx_id_parse_normalizes_case() {
        let raw = "AB".repeat(32);
        let tx = TxId::parse(&raw).unwrap();
        assert_eq!(tx.as_str(), "ab".repeat(32));
        assert!(TxId::parse("unknown").is_err());
    }

    #[test]
    fn tx_id_from_seed_is_64_hex() {
        let tx = TxId::from_seed(b"tx-1");
        assert_eq!(tx.as_str().len(), 64);
        assert_ne!(tx, TxId::from_seed(b"tx-2"));
    }
}
