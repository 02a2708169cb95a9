// TIP-3 token deployment and chain-state protocol layer

pub mod address;
pub mod backend;
pub mod contracts;
pub mod deploy;
pub mod error;
pub mod info;
pub mod mint;
pub mod network;
pub mod registry;
pub mod requests;
pub mod service;
pub mod transport;
pub mod types;
pub mod wallet;

// Re-export primary types for convenient access.
pub use address::{Address, TxId};
pub use backend::{ChainBackend, LiveBackend, SimulatedBackend, build_backend};
pub use contracts::{CodeBlob, ContractKind, wallet_code};
pub use error::{ErrorCategory, TokenError};
pub use network::{NetworkConfig, is_private_channel, validate_url};
pub use requests::{MintOrder, MintRequest, TokenCreateRequest};
pub use service::{HealthReport, TokenService};
pub use transport::{ChainTransport, HttpTransport, TransportError};
pub use types::{DeployedToken, TokenParams, TokenView, WalletBalance};
pub use wallet::{KeyPair, WalletKeyFile, WalletState, decrypt_secret, encrypt_secret};
