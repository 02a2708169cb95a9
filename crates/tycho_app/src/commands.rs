use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use tycho_tip3::{MintRequest, TokenCreateRequest};

/// Deploy and manage TIP-3 tokens from the server wallet.
#[derive(Parser, Debug)]
#[command(name = "tycho", version, about)]
pub struct Cli {
    /// Config file (defaults to ~/.tycho/config.json)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Run against the in-process simulated chain
    #[arg(long, global = true)]
    pub demo: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Show the server wallet address and balance
    Wallet,
    /// Check that the backend answers
    Health,
    /// Deploy a new token root
    Deploy(DeployArgs),
    /// Read token state back from the chain
    Info {
        /// Token root address ("0:" + 64 hex chars)
        address: String,
    },
    /// Mint tokens to a recipient
    Mint(MintArgs),
    /// Deploy, mint and query a sample token on the simulated chain
    Demo,
    /// Encrypt the wallet keys from WALLET_PUBLIC_KEY / WALLET_SECRET_KEY
    /// under WALLET_KEY_PASSPHRASE into a key file for WALLET_KEY_FILE
    SealKey {
        /// Where to write the key file
        #[arg(long)]
        out: PathBuf,
    },
}

#[derive(Args, Debug)]
pub struct DeployArgs {
    #[arg(long)]
    pub name: String,
    #[arg(long)]
    pub symbol: String,
    #[arg(long, default_value_t = 9)]
    pub decimals: u8,
    /// Initial supply in the smallest units
    #[arg(long, default_value_t = 0)]
    pub initial_supply: u128,
    /// Receiver of the initial supply (defaults to the server wallet)
    #[arg(long)]
    pub initial_supply_to: Option<String>,
    #[arg(long)]
    pub mint_disabled: bool,
    #[arg(long)]
    pub burn_by_root_disabled: bool,
    #[arg(long)]
    pub burn_paused: bool,
}

impl DeployArgs {
    pub fn into_request(self) -> TokenCreateRequest {
        TokenCreateRequest {
            name: self.name,
            symbol: self.symbol,
            decimals: self.decimals,
            initial_supply: self.initial_supply,
            initial_supply_to: self.initial_supply_to,
            mint_disabled: self.mint_disabled,
            burn_by_root_disabled: self.burn_by_root_disabled,
            burn_paused: self.burn_paused,
        }
    }
}

#[derive(Args, Debug)]
pub struct MintArgs {
    /// Token root address
    #[arg(long)]
    pub token: String,
    /// Amount in the smallest units
    #[arg(long)]
    pub amount: u128,
    #[arg(long)]
    pub recipient: String,
    #[arg(long)]
    pub notify: bool,
}

impl MintArgs {
    pub fn into_request(self) -> MintRequest {
        MintRequest {
            token_address: self.token,
            amount: self.amount,
            recipient: self.recipient,
            notify: self.notify,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn deploy_defaults() {
        let cli = Cli::try_parse_from(["tycho", "deploy", "--name", "Test Token", "--symbol", "TST"])
            .unwrap();
        let Command::Deploy(args) = cli.command else {
            panic!("expected deploy");
        };
        let request = args.into_request();
        assert_eq!(request.decimals, 9);
        assert_eq!(request.initial_supply, 0);
        assert!(!request.burn_paused);
    }

    #[test]
    fn global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["tycho", "wallet", "--demo", "--config", "/tmp/c.json"])
            .unwrap();
        assert!(cli.demo);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.json")));
    }

    #[test]
    fn mint_parses_large_amounts() {
        let cli = Cli::try_parse_from([
            "tycho",
            "mint",
            "--token",
            "0:aa",
            "--amount",
            "340282366920938463463374607431768211455",
            "--recipient",
            "0:bb",
        ])
        .unwrap();
        let Command::Mint(args) = cli.command else {
            panic!("expected mint");
        };
        assert_eq!(args.into_request().amount, u128::MAX);
    }

    #[test]
    fn seal_key_requires_output_path() {
        assert!(Cli::try_parse_from(["tycho", "seal-key"]).is_err());
        let cli = Cli::try_parse_from(["tycho", "seal-key", "--out", "/tmp/wallet.json"])
            .unwrap();
        let Command::SealKey { out } = cli.command else {
            panic!("expected seal-key");
        };
        assert_eq!(out, PathBuf::from("/tmp/wallet.json"));
    }

    #[test]
    fn info_requires_address() {
        assert!(Cli::try_parse_from(["tycho", "info"]).is_err());
    }
}
