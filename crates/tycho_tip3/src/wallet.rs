use std::fmt;
use std::path::Path;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::info;
use tycho_core::{BackendMode, TychoConfig};

use crate::address::{self, Address};

const AES_NONCE_LEN: usize = 12;
const KEY_HEX_LEN: usize = 64;

/// Seed of the wallet address used in simulated mode when none is configured.
const DEMO_WALLET_SEED: &[u8] = b"tycho-demo-wallet";

/// An ed25519 key pair as two 64-char hex halves.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyPair {
    pub public: String,
    pub secret: String,
}

impl KeyPair {
    pub fn new(public: &str, secret: &str) -> Result<Self> {
        let public = public.trim().to_lowercase();
        let secret = secret.trim().to_lowercase();
        for (label, value) in [("public", &public), ("secret", &secret)] {
            if value.len() != KEY_HEX_LEN || hex::decode(value).is_err() {
                anyhow::bail!("wallet {label} key must be {KEY_HEX_LEN} hex chars");
            }
        }
        Ok(Self { public, secret })
    }
}

impl fmt::Debug for KeyPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("KeyPair")
            .field("public", &self.public)
            .field("secret", &"<redacted>")
            .finish()
    }
}

// ---------------------------------------------------------------------------
// WalletState
// ---------------------------------------------------------------------------

/// The server wallet. Owned by the backend; read-only after startup.
#[derive(Debug, Clone)]
pub struct WalletState {
    address: Address,
    keys: Option<KeyPair>,
    mode: BackendMode,
}

impl WalletState {
    /// Wallet for the simulated backend. Falls back to a fixed demo address.
    pub fn simulated(address: Option<Address>) -> Self {
        Self {
            address: address.unwrap_or_else(|| address::derive_simulated_address(DEMO_WALLET_SEED)),
            keys: None,
            mode: BackendMode::Simulated,
        }
    }

    /// Wallet for the live backend; signing requires a key pair.
    pub fn live(address: Address, keys: KeyPair) -> Self {
        Self {
            address,
            keys: Some(keys),
            mode: BackendMode::Live,
        }
    }

    /// Resolve the wallet for the mode `config` selects.
    pub fn from_config(config: &TychoConfig) -> Result<Self> {
        let configured = config.wallet_address.trim();
        match config.backend_mode() {
            BackendMode::Simulated => {
                let address = if configured.is_empty() {
                    None
                } else {
                    Some(Address::parse(configured).context("invalid WALLET_ADDRESS")?)
                };
                Ok(Self::simulated(address))
            }
            BackendMode::Live => {
                if configured.is_empty() {
                    anyhow::bail!("WALLET_ADDRESS is required for the live backend");
                }
                let address = Address::parse(configured).context("invalid WALLET_ADDRESS")?;
                let keys = load_key_pair(config)?;
                Ok(Self::live(address, keys))
            }
        }
    }

    pub fn address(&self) -> &Address {
        &self.address
    }

    pub fn keys(&self) -> Option<&KeyPair> {
        self.keys.as_ref()
    }

    pub fn mode(&self) -> BackendMode {
        self.mode
    }
}

/// Key pair from the environment, or from the encrypted key file.
fn load_key_pair(config: &TychoConfig) -> Result<KeyPair> {
    if let (Some(public), Some(secret)) = (&config.wallet_public_key, &config.wallet_secret_key) {
        return KeyPair::new(public, secret);
    }

    let Some(path) = &config.wallet_key_file else {
        anyhow::bail!(
            "wallet keys not configured: set WALLET_PUBLIC_KEY/WALLET_SECRET_KEY or WALLET_KEY_FILE"
        );
    };
    let passphrase = config
        .wallet_key_passphrase
        .as_deref()
        .context("WALLET_KEY_PASSPHRASE is required to unlock WALLET_KEY_FILE")?;
    WalletKeyFile::load(path)?.unlock(passphrase)
}

// ---------------------------------------------------------------------------
// Encrypted key file
// ---------------------------------------------------------------------------

/// On-disk wallet key: public half in clear, secret half encrypted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WalletKeyFile {
    pub public: String,
    /// Hex of `nonce || ciphertext`.
    pub encrypted_secret: String,
}

impl WalletKeyFile {
    /// Encrypt `keys` under `passphrase`.
    pub fn seal(keys: &KeyPair, passphrase: &str) -> Result<Self> {
        let encrypted = encrypt_secret(keys.secret.as_bytes(), passphrase)?;
        Ok(Self {
            public: keys.public.clone(),
            encrypted_secret: hex::encode(encrypted),
        })
    }

    /// Decrypt the secret half and rebuild the key pair.
    pub fn unlock(&self, passphrase: &str) -> Result<KeyPair> {
        let encrypted =
            hex::decode(&self.encrypted_secret).context("key file secret is not valid hex")?;
        let secret = decrypt_secret(&encrypted, passphrase)?;
        let secret = String::from_utf8(secret).context("decrypted secret is not UTF-8")?;
        KeyPair::new(&self.public, &secret)
    }

    /// Persist the key file with owner-only permissions.
    pub fn save(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("failed to serialize key file")?;
        std::fs::write(path, json).context("failed to write wallet key file")?;

        // Restrict file permissions to owner-only on Unix (0o600 = rw-------).
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .context("failed to set wallet key file permissions")?;
        }

        info!(path = %path.display(), "wallet key file saved");
        Ok(())
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read wallet key file {}", path.display()))?;
        serde_json::from_str(&json).context("failed to parse wallet key file")
    }
}

// ---------------------------------------------------------------------------
// Encryption helpers
// ---------------------------------------------------------------------------

/// Derive a 256-bit AES key from a passphrase using Argon2id.
///
/// Uses a fixed salt so the same passphrase always produces the same key.
/// Parameters: m=19456 KiB (~19 MB), t=2, p=1.
fn derive_key_from_passphrase(passphrase: &str) -> Result<[u8; 32]> {
    use argon2::{Algorithm, Argon2, Params, Version};

    let salt = b"tycho-wallet-key-v1";
    let params = Params::new(19_456, 2, 1, Some(32))
        .map_err(|e| anyhow::anyhow!("invalid argon2 params: {e}"))?;
    let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);
    let mut key = [0u8; 32];
    argon2
        .hash_password_into(passphrase.as_bytes(), salt, &mut key)
        .map_err(|e| anyhow::anyhow!("argon2 key derivation failed: {e}"))?;
    Ok(key)
}

/// Encrypt with AES-256-GCM. Output is `nonce || ciphertext`.
pub fn encrypt_secret(plaintext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    let key_bytes = derive_key_from_passphrase(passphrase)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    let nonce_bytes: [u8; AES_NONCE_LEN] = rand::random();
    let ciphertext = cipher
        .encrypt(Nonce::from_slice(&nonce_bytes), plaintext)
        .map_err(|e| anyhow::anyhow!("encryption failed: {e}"))?;

    let mut result = nonce_bytes.to_vec();
    result.extend_from_slice(&ciphertext);
    Ok(result)
}

/// Decrypt output of [`encrypt_secret`].
pub fn decrypt_secret(ciphertext: &[u8], passphrase: &str) -> Result<Vec<u8>> {
    if ciphertext.len() < AES_NONCE_LEN {
        anyhow::bail!("ciphertext too short (expected at least {AES_NONCE_LEN} bytes for nonce)");
    }

    let (nonce_bytes, encrypted) = ciphertext.split_at(AES_NONCE_LEN);
    let key_bytes = derive_key_from_passphrase(passphrase)?;
    let cipher = Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(&key_bytes));

    cipher
        .decrypt(Nonce::from_slice(nonce_bytes), encrypted)
        .map_err(|e| anyhow::anyhow!("decryption failed: {e}"))
}
