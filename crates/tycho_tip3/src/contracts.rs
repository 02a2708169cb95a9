//! Fixed TIP-3 interface tables and the typed argument lists encoded against them.
//!
//! The ABI tables are passed verbatim to the encoder; nothing in this crate
//! interprets them beyond looking up the interface for a [`ContractKind`].

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::address::Address;
use crate::types::amount;

/// Which of the two fixed contract interfaces a call targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContractKind {
    TokenRoot,
    TokenWallet,
}

/// ABI description plus compiled state-init image (base64 TVC).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractInterface {
    pub abi: serde_json::Value,
    pub tvc: String,
}

/// Base64 code cell embedded into the root's persistent data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CodeBlob(String);

impl CodeBlob {
    pub fn new(base64: impl Into<String>) -> Self {
        Self(base64.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

/// Holder-wallet code cell consumed by every root deployment.
pub fn wallet_code() -> CodeBlob {
    CodeBlob::new(TOKEN_WALLET_TVC)
}

/// Returns the interface table for `kind`. Tables are built once per process.
pub fn interface(kind: ContractKind) -> &'static ContractInterface {
    static ROOT: OnceLock<ContractInterface> = OnceLock::new();
    static WALLET: OnceLock<ContractInterface> = OnceLock::new();

    match kind {
        ContractKind::TokenRoot => ROOT.get_or_init(|| ContractInterface {
            abi: token_root_abi(),
            tvc: TOKEN_ROOT_TVC.to_string(),
        }),
        ContractKind::TokenWallet => WALLET.get_or_init(|| ContractInterface {
            abi: token_wallet_abi(),
            tvc: TOKEN_WALLET_TVC.to_string(),
        }),
    }
}

// ---------------------------------------------------------------------------
// Typed argument lists
// ---------------------------------------------------------------------------

/// Root persistent-data section. The deployed address is a function of the
/// root code and exactly these values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootInitialData {
    #[serde(rename = "name_")]
    pub name: String,
    #[serde(rename = "symbol_")]
    pub symbol: String,
    #[serde(rename = "decimals_")]
    pub decimals: u8,
    #[serde(rename = "rootOwner_")]
    pub root_owner: Address,
    #[serde(rename = "walletCode_")]
    pub wallet_code: CodeBlob,
    #[serde(rename = "randomNonce_")]
    pub random_nonce: String,
}

/// Root constructor arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RootConstructorArgs {
    pub initial_supply_to: Address,
    #[serde(with = "amount")]
    pub initial_supply: u128,
    #[serde(with = "amount")]
    pub deploy_wallet_value: u128,
    pub mint_disabled: bool,
    pub burn_by_root_disabled: bool,
    pub burn_paused: bool,
    pub remaining_gas_to: Address,
}

/// Root `mint` arguments.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MintArgs {
    #[serde(with = "amount")]
    pub amount: u128,
    pub recipient: Address,
    #[serde(with = "amount")]
    pub deploy_wallet_value: u128,
    pub remaining_gas_to: Address,
    pub notify: bool,
    /// Empty cell.
    pub payload: String,
}

/// Input of every responsible getter (`name`, `symbol`, ...).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GetterArgs {
    pub answer_id: u32,
}

/// Getter names on the root contract.
pub mod getters {
    pub const NAME: &str = "name";
    pub const SYMBOL: &str = "symbol";
    pub const DECIMALS: &str = "decimals";
    pub const TOTAL_SUPPLY: &str = "totalSupply";
    pub const ROOT_OWNER: &str = "rootOwner";
    pub const WALLET_CODE: &str = "walletCode";
}

pub const CONSTRUCTOR: &str = "constructor";
pub const MINT: &str = "mint";

// ---------------------------------------------------------------------------
// Interface tables
// ---------------------------------------------------------------------------

fn getter(name: &str, output_type: &str) -> serde_json::Value {
    serde_json::json!({
        "name": name,
        "inputs": [{ "name": "answerId", "type": "uint32" }],
        "outputs": [{ "name": "value0", "type": output_type }]
    })
}

fn token_root_abi() -> serde_json::Value {
    serde_json::json!({
        "ABI version": 2,
        "version": "2.3",
        "header": ["pubkey", "time", "expire"],
        "functions": [
            {
                "name": "constructor",
                "inputs": [
                    { "name": "initialSupplyTo", "type": "address" },
                    { "name": "initialSupply", "type": "uint128" },
                    { "name": "deployWalletValue", "type": "uint128" },
                    { "name": "mintDisabled", "type": "bool" },
                    { "name": "burnByRootDisabled", "type": "bool" },
                    { "name": "burnPaused", "type": "bool" },
                    { "name": "remainingGasTo", "type": "address" }
                ],
                "outputs": []
            },
            getter("name", "string"),
            getter("symbol", "string"),
            getter("decimals", "uint8"),
            getter("totalSupply", "uint128"),
            getter("walletCode", "cell"),
            getter("rootOwner", "address"),
            {
                "name": "walletOf",
                "inputs": [
                    { "name": "answerId", "type": "uint32" },
                    { "name": "walletOwner", "type": "address" }
                ],
                "outputs": [{ "name": "value0", "type": "address" }]
            },
            {
                "name": "deployWallet",
                "inputs": [
                    { "name": "answerId", "type": "uint32" },
                    { "name": "walletOwner", "type": "address" },
                    { "name": "deployWalletValue", "type": "uint128" }
                ],
                "outputs": [{ "name": "tokenWallet", "type": "address" }]
            },
            {
                "name": "mint",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "recipient", "type": "address" },
                    { "name": "deployWalletValue", "type": "uint128" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "notify", "type": "bool" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "acceptBurn",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "walletOwner", "type": "address" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "callbackTo", "type": "address" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "sendSurplusGas",
                "inputs": [{ "name": "to", "type": "address" }],
                "outputs": []
            }
        ],
        "data": [
            { "key": 1, "name": "name_", "type": "string" },
            { "key": 2, "name": "symbol_", "type": "string" },
            { "key": 3, "name": "decimals_", "type": "uint8" },
            { "key": 4, "name": "rootOwner_", "type": "address" },
            { "key": 5, "name": "walletCode_", "type": "cell" },
            { "key": 6, "name": "randomNonce_", "type": "uint256" }
        ],
        "events": [],
        "fields": [
            { "name": "_pubkey", "type": "uint256" },
            { "name": "_timestamp", "type": "uint64" },
            { "name": "_constructorFlag", "type": "bool" },
            { "name": "name_", "type": "string" },
            { "name": "symbol_", "type": "string" },
            { "name": "decimals_", "type": "uint8" },
            { "name": "rootOwner_", "type": "address" },
            { "name": "totalSupply_", "type": "uint128" },
            { "name": "walletCode_", "type": "cell" },
            { "name": "randomNonce_", "type": "uint256" },
            { "name": "mintDisabled_", "type": "bool" },
            { "name": "burnByRootDisabled_", "type": "bool" },
            { "name": "burnPaused_", "type": "bool" }
        ]
    })
}

fn token_wallet_abi() -> serde_json::Value {
    serde_json::json!({
        "ABI version": 2,
        "version": "2.3",
        "header": ["pubkey", "time", "expire"],
        "functions": [
            { "name": "constructor", "inputs": [], "outputs": [] },
            getter("balance", "uint128"),
            getter("owner", "address"),
            getter("root", "address"),
            getter("walletCode", "cell"),
            {
                "name": "transfer",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "recipient", "type": "address" },
                    { "name": "deployWalletValue", "type": "uint128" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "notify", "type": "bool" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "transferToWallet",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "recipientTokenWallet", "type": "address" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "notify", "type": "bool" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "acceptTransfer",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "sender", "type": "address" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "notify", "type": "bool" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "acceptMint",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "notify", "type": "bool" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            },
            {
                "name": "burn",
                "inputs": [
                    { "name": "amount", "type": "uint128" },
                    { "name": "remainingGasTo", "type": "address" },
                    { "name": "callbackTo", "type": "address" },
                    { "name": "payload", "type": "cell" }
                ],
                "outputs": []
            }
        ],
        "data": [
            { "key": 1, "name": "root_", "type": "address" },
            { "key": 2, "name": "owner_", "type": "address" }
        ],
        "events": [],
        "fields": [
            { "name": "_pubkey", "type": "uint256" },
            { "name": "_timestamp", "type": "uint64" },
            { "name": "_constructorFlag", "type": "bool" },
            { "name": "root_", "type": "address" },
            { "name": "owner_", "type": "address" },
            { "name": "balance_", "type": "uint128" }
        ]
    })
}

const TOKEN_ROOT_TVC: &str = "te0oHppGdz0JXN/oGr/QFH+gKxQICC3Rx52omhAAe6Omf/AFkZD8IWRl/\
+D+qAfCFlZf/g/qgHwhaEX/4P6oB8IWND/+D+qAfBFQNwBIBEBEREREREQ\
AAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAAA\
AAAAAAAAAAAAAAAAAAH//////////////////////////////////////////";

const TOKEN_WALLET_TVC: &str = "te0oHppGdz0JXN/oGr/QFH+gKxQICC3Rx52omhAAe6Omf/AFkZD8IWRl/\
+D+qAfCFlZf/g/qgHwhaEX/4P6oB8IWND/+D+qAfBFQNwBIBEBERERERE=";

#[cfg(test)]
mod tests {
    use super::*;

    fn function_names(kind: ContractKind) -> Vec<String> {
        interface(kind).abi["functions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|f| f["name"].as_str().unwrap().to_string())
            .collect()
    }

    #[test]
    fn root_abi_declares_protocol_functions() {
        let names = function_names(ContractKind::TokenRoot);
        for required in [
            CONSTRUCTOR,
            MINT,
            getters::NAME,
            getters::SYMBOL,
            getters::DECIMALS,
            getters::TOTAL_SUPPLY,
            getters::ROOT_OWNER,
            getters::WALLET_CODE,
        ] {
            assert!(names.iter().any(|n| n == required), "missing {required}");
        }
        assert_eq!(names.len(), 12);
    }

    #[test]
    fn wallet_abi_declares_holder_functions() {
        let names = function_names(ContractKind::TokenWallet);
        assert_eq!(names.len(), 10);
        assert!(names.iter().any(|n| n == "acceptMint"));
    }

    #[test]
    fn initial_data_keys_match_abi_data_section() {
        let data = RootInitialData {
            name: "Test Token".into(),
            symbol: "TST".into(),
            decimals: 9,
            root_owner: Address::null(),
            wallet_code: wallet_code(),
            random_nonce: "7".into(),
        };
        let value = serde_json::to_value(&data).unwrap();
        let declared: Vec<&str> = interface(ContractKind::TokenRoot).abi["data"]
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["name"].as_str().unwrap())
            .collect();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), declared.len());
        for key in declared {
            assert!(object.contains_key(key), "initial data lacks {key}");
        }
    }

    #[test]
    fn constructor_args_use_abi_names() {
        let args = RootConstructorArgs {
            initial_supply_to: Address::null(),
            initial_supply: 1_000_000_000_000,
            deploy_wallet_value: 100_000_000,
            mint_disabled: false,
            burn_by_root_disabled: true,
            burn_paused: false,
            remaining_gas_to: Address::null(),
        };
        let value = serde_json::to_value(&args).unwrap();
        assert_eq!(value["initialSupply"], "1000000000000");
        assert_eq!(value["burnByRootDisabled"], true);
        assert!(value.get("remainingGasTo").is_some());

        let back: RootConstructorArgs = serde_json::from_value(value).unwrap();
        assert_eq!(back, args);
    }

    #[test]
    fn getter_args_encode_answer_id() {
        let value = serde_json::to_value(GetterArgs::default()).unwrap();
        assert_eq!(value, serde_json::json!({ "answerId": 0 }));
    }

    #[test]
    fn interface_tables_are_shared() {
        let a = interface(ContractKind::TokenRoot) as *const ContractInterface;
        let b = interface(ContractKind::TokenRoot) as *const ContractInterface;
        assert_eq!(a, b);
        assert!(!wallet_code().as_str().is_empty());
    }
}
