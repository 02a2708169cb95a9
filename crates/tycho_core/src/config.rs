use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{info, warn};

// ---------------------------------------------------------------------------
// Environment variable names
// ---------------------------------------------------------------------------

const ENV_ENDPOINT: &str = "TYCHO_ENDPOINT";
const ENV_EXPLORER_URL: &str = "TYCHO_EXPLORER_URL";
const ENV_SDK_BRIDGE_URL: &str = "TYCHO_SDK_BRIDGE_URL";
const ENV_SETTLEMENT_TIMEOUT: &str = "TYCHO_SETTLEMENT_TIMEOUT_SECS";
const ENV_DEMO_MODE: &str = "DEMO_MODE";
const ENV_WALLET_ADDRESS: &str = "WALLET_ADDRESS";
const ENV_WALLET_PUBLIC_KEY: &str = "WALLET_PUBLIC_KEY";
const ENV_WALLET_SECRET_KEY: &str = "WALLET_SECRET_KEY";
const ENV_WALLET_KEY_FILE: &str = "WALLET_KEY_FILE";
const ENV_WALLET_KEY_PASSPHRASE: &str = "WALLET_KEY_PASSPHRASE";
const ENV_LOG_LEVEL: &str = "LOG_LEVEL";

const MIN_SETTLEMENT_TIMEOUT_SECS: u64 = 1;

// ---------------------------------------------------------------------------
// BackendMode
// ---------------------------------------------------------------------------

/// Which chain backend the process runs against. Chosen once at startup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendMode {
    Live,
    Simulated,
}

impl BackendMode {
    pub fn label(&self) -> &'static str {
        match self {
            BackendMode::Live => "live",
            BackendMode::Simulated => "simulated",
        }
    }
}

impl fmt::Display for BackendMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// TychoConfig
// ---------------------------------------------------------------------------

/// Process configuration stored at `~/.tycho/config.json`.
///
/// Wallet key material is **never** written to the JSON file. It is supplied
/// through the environment or an encrypted key file referenced by
/// `wallet_key_file`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TychoConfig {
    // Network
    pub network_name: String,
    pub endpoint: String,
    pub explorer_url: String,
    pub sdk_bridge_url: String,
    pub request_timeout_secs: u64,

    // Backend
    pub demo_mode: bool,
    pub settlement_timeout_secs: u64,
    pub read_retries: u32,
    /// Fee budget (nano units) attached for auto-deploying a holder wallet.
    pub deploy_wallet_value: u128,

    // Server wallet
    pub wallet_address: String,
    pub wallet_key_file: Option<PathBuf>,
    #[serde(skip)]
    pub wallet_public_key: Option<String>,
    #[serde(skip)]
    pub wallet_secret_key: Option<String>,
    #[serde(skip)]
    pub wallet_key_passphrase: Option<String>,

    // General
    pub log_level: String,
}

impl Default for TychoConfig {
    fn default() -> Self {
        Self {
            network_name: "Tycho Testnet".into(),
            endpoint: "https://testnet.tychoprotocol.com/graphql".into(),
            explorer_url: "https://testnet.tychoprotocol.com".into(),
            sdk_bridge_url: "http://localhost:8090/sdk".into(),
            request_timeout_secs: 30,
            demo_mode: false,
            settlement_timeout_secs: 60,
            read_retries: 2,
            deploy_wallet_value: 100_000_000,
            wallet_address: String::new(),
            wallet_key_file: None,
            wallet_public_key: None,
            wallet_secret_key: None,
            wallet_key_passphrase: None,
            log_level: "info".into(),
        }
    }
}

impl TychoConfig {
    /// Returns the base config directory: `~/.tycho/`
    pub fn base_dir() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;
        Ok(home.join(".tycho"))
    }

    /// Returns the config file path: `~/.tycho/config.json`
    pub fn config_path() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("config.json"))
    }

    /// Returns the logs directory: `~/.tycho/logs/`
    pub fn logs_dir() -> Result<PathBuf> {
        Ok(Self::base_dir()?.join("logs"))
    }

    /// Ensures all required directories exist.
    pub fn ensure_dirs() -> Result<()> {
        for dir in [Self::base_dir()?, Self::logs_dir()?] {
            if !dir.exists() {
                std::fs::create_dir_all(&dir)
                    .with_context(|| format!("Failed to create directory: {}", dir.display()))?;
            }
        }
        Ok(())
    }

    /// Loads config from `~/.tycho/config.json`, creating a default file if
    /// missing, then applies overrides from the process environment.
    pub fn load() -> Result<Self> {
        Self::ensure_dirs()?;
        let path = Self::config_path()?;
        let mut config = Self::load_from_path(&path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load config from a specific file path. Writes the defaults there if
    /// the file does not exist yet.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        if path.exists() {
            let content = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config: {}", path.display()))?;
            let config: Self = serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config: {}", path.display()))?;
            info!("Loaded config from {}", path.display());
            Ok(config)
        } else {
            let config = Self::default();
            config.save_to_path(path)?;
            info!("Created default config at {}", path.display());
            Ok(config)
        }
    }

    /// Save config to a specific file path (secrets are excluded via `#[serde(skip)]`).
    pub fn save_to_path(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config: {}", path.display()))?;
        Ok(())
    }

    /// Apply overrides from the process environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_env_overrides_with(|name| std::env::var(name).ok());
    }

    /// Apply overrides from an arbitrary lookup. Empty values are ignored.
    pub fn apply_env_overrides_with(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        if let Some(v) = get(ENV_ENDPOINT) {
            self.endpoint = v;
        }
        if let Some(v) = get(ENV_EXPLORER_URL) {
            self.explorer_url = v;
        }
        if let Some(v) = get(ENV_SDK_BRIDGE_URL) {
            self.sdk_bridge_url = v;
        }
        if let Some(v) = get(ENV_SETTLEMENT_TIMEOUT) {
            match v.trim().parse::<u64>() {
                Ok(secs) if secs >= MIN_SETTLEMENT_TIMEOUT_SECS => {
                    self.settlement_timeout_secs = secs
                }
                _ => warn!("Ignoring invalid {ENV_SETTLEMENT_TIMEOUT}={v}"),
            }
        }
        if let Some(v) = get(ENV_DEMO_MODE) {
            self.demo_mode = matches!(v.trim().to_lowercase().as_str(), "true" | "1" | "yes");
        }
        if let Some(v) = get(ENV_WALLET_ADDRESS) {
            self.wallet_address = v;
        }
        if let Some(v) = get(ENV_WALLET_PUBLIC_KEY) {
            self.wallet_public_key = Some(v);
        }
        if let Some(v) = get(ENV_WALLET_SECRET_KEY) {
            self.wallet_secret_key = Some(v);
        }
        if let Some(v) = get(ENV_WALLET_KEY_FILE) {
            self.wallet_key_file = Some(PathBuf::from(v));
        }
        if let Some(v) = get(ENV_WALLET_KEY_PASSPHRASE) {
            self.wallet_key_passphrase = Some(v);
        }
        if let Some(v) = get(ENV_LOG_LEVEL) {
            self.log_level = v.to_lowercase();
        }
    }

    /// Settlement bound for live submits, never below one second.
    pub fn settlement_timeout(&self) -> Duration {
        Duration::from_secs(self.settlement_timeout_secs.max(MIN_SETTLEMENT_TIMEOUT_SECS))
    }

    /// The backend this configuration selects.
    pub fn backend_mode(&self) -> BackendMode {
        if self.demo_mode {
            BackendMode::Simulated
        } else {
            BackendMode::Live
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
