use serde::{Deserialize, Serialize};
use tycho_core::TychoConfig;

use crate::address::Address;

/// Endpoints of the network the server wallet operates on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkConfig {
    pub name: String,
    /// GraphQL endpoint for account queries.
    pub endpoint: String,
    pub explorer_url: String,
    /// Bridge that encodes, signs, processes and runs messages.
    pub sdk_bridge_url: String,
    pub request_timeout_secs: u64,
}

impl NetworkConfig {
    /// Tycho testnet defaults.
    pub fn testnet() -> Self {
        let defaults = TychoConfig::default();
        Self {
            name: defaults.network_name,
            endpoint: defaults.endpoint,
            explorer_url: defaults.explorer_url,
            sdk_bridge_url: defaults.sdk_bridge_url,
            request_timeout_secs: defaults.request_timeout_secs,
        }
    }

    pub fn from_config(config: &TychoConfig) -> Self {
        Self {
            name: config.network_name.clone(),
            endpoint: config.endpoint.clone(),
            explorer_url: config.explorer_url.trim_end_matches('/').to_string(),
            sdk_bridge_url: config.sdk_bridge_url.clone(),
            request_timeout_secs: config.request_timeout_secs,
        }
    }

    /// Check that every URL the live backend needs is well-formed.
    ///
    /// The bridge receives the signing keys, so it must be reached over
    /// HTTPS or on the loopback interface.
    pub fn validate(&self) -> anyhow::Result<()> {
        for (label, url) in [
            ("endpoint", &self.endpoint),
            ("sdk_bridge_url", &self.sdk_bridge_url),
            ("explorer_url", &self.explorer_url),
        ] {
            if !validate_url(url) {
                anyhow::bail!("invalid {label}: {url}");
            }
        }
        if !is_private_channel(&self.sdk_bridge_url) {
            anyhow::bail!(
                "sdk_bridge_url must use https or a loopback host: {}",
                self.sdk_bridge_url
            );
        }
        Ok(())
    }

    /// Explorer page for an account.
    pub fn account_url(&self, address: &Address) -> String {
        format!("{}/accounts/{address}", self.explorer_url)
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self::testnet()
    }
}

/// Validate that a URL is well-formed and uses HTTP or HTTPS.
pub fn validate_url(url: &str) -> bool {
    match url::Url::parse(url) {
        Ok(parsed) => {
            let scheme = parsed.scheme();
            (scheme == "http" || scheme == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

/// True for `https` URLs and for any URL whose host is the loopback interface.
pub fn is_private_channel(url: &str) -> bool {
    let Ok(parsed) = url::Url::parse(url) else {
        return false;
    };
    if parsed.scheme() == "https" {
        return true;
    }
    match parsed.host() {
        Some(url::Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(url::Host::Ipv4(ip)) => ip.is_loopback(),
        Some(url::Host::Ipv6(ip)) => ip.is_loopback(),
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn testnet_defaults_are_valid() {
        let network = NetworkConfig::testnet();
        assert_eq!(network.name, "Tycho Testnet");
        assert!(network.validate().is_ok());
    }

    #[test]
    fn from_config_trims_explorer_slash() {
        let mut config = TychoConfig::default();
        config.explorer_url = "https://explorer.example.com/".into();
        let network = NetworkConfig::from_config(&config);
        assert_eq!(network.explorer_url, "https://explorer.example.com");
    }

    #[test]
    fn account_url_points_at_accounts_page() {
        let network = NetworkConfig::testnet();
        let url = network.account_url(&Address::null());
        assert_eq!(
            url,
            format!(
                "https://testnet.tychoprotocol.com/accounts/0:{}",
                "0".repeat(64)
            )
        );
    }

    #[test]
    fn validate_reports_bad_bridge_url() {
        let mut network = NetworkConfig::testnet();
        network.sdk_bridge_url = "localhost".into();
        let err = network.validate().unwrap_err();
        assert!(err.to_string().contains("sdk_bridge_url"));
    }

    #[test]
    fn validate_rejects_plain_http_remote_bridge() {
        let mut network = NetworkConfig::testnet();
        network.sdk_bridge_url = "http://203.0.113.9:8090/sdk".into();
        let err = network.validate().unwrap_err();
        assert!(err.to_string().contains("loopback"));

        network.sdk_bridge_url = "https://203.0.113.9:8090/sdk".into();
        assert!(network.validate().is_ok());
    }

    #[test]
    fn private_channel_accepts_loopback_hosts() {
        assert!(is_private_channel("http://localhost:8090/sdk"));
        assert!(is_private_channel("http://127.0.0.1:8090/sdk"));
        assert!(is_private_channel("http://[::1]:8090/sdk"));
        assert!(is_private_channel("https://bridge.example.com/sdk"));
        assert!(!is_private_channel("http://bridge.example.com/sdk"));
        assert!(!is_private_channel("http://10.0.0.5/sdk"));
        assert!(!is_private_channel("not a url"));
    }

    #[test]
    fn validate_url_rejects_garbage() {
        assert!(validate_url("https://rpc.example.com"));
        assert!(validate_url("http://localhost:8545"));
        assert!(!validate_url(""));
        assert!(!validate_url("not a url"));
        assert!(!validate_url("file:///etc/passwd"));
    }
}
