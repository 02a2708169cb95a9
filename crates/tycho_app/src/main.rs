mod commands;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use serde::Serialize;
use tracing::{error, info, warn};

use tycho_core::{TychoConfig, logging};
use tycho_tip3::{Address, KeyPair, TokenError, TokenParams, TokenService, WalletKeyFile};

use commands::{Cli, Command};

const DEMO_SUPPLY: u128 = 1_000_000_000_000;
const DEMO_MINT: u128 = 5_000_000_000;

fn load_config(cli: &Cli) -> Result<TychoConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = TychoConfig::load_from_path(path)?;
            config.apply_env_overrides();
            config
        }
        None => TychoConfig::load()?,
    };
    if cli.demo || matches!(cli.command, Command::Demo) {
        config.demo_mode = true;
    }
    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Log the full error and hand the caller the user-facing message.
fn report(err: TokenError) -> anyhow::Error {
    error!(category = ?err.category(), "{err}");
    anyhow::anyhow!(err.user_message())
}

fn parse_address(raw: &str) -> Result<Address> {
    Address::parse(raw).map_err(report)
}

/// Write the configured key pair to an encrypted key file.
fn seal_key(config: &TychoConfig, out: &Path) -> Result<()> {
    let (Some(public), Some(secret)) = (&config.wallet_public_key, &config.wallet_secret_key)
    else {
        anyhow::bail!("set WALLET_PUBLIC_KEY and WALLET_SECRET_KEY to seal a key file");
    };
    let passphrase = config
        .wallet_key_passphrase
        .as_deref()
        .context("WALLET_KEY_PASSPHRASE is required to seal a key file")?;

    let keys = KeyPair::new(public, secret)?;
    WalletKeyFile::seal(&keys, passphrase)?.save(out)?;
    print_json(&serde_json::json!({
        "key_file": out.display().to_string(),
        "public": keys.public,
    }))
}

async fn run(service: &TokenService, command: Command) -> Result<()> {
    match command {
        Command::Wallet => print_json(&service.wallet_balance().await.map_err(report)?),
        Command::Health => print_json(&service.health().await.map_err(report)?),
        Command::Deploy(args) => {
            let params = args.into_request().into_params().map_err(report)?;
            print_json(&service.deploy(params).await.map_err(report)?)
        }
        Command::Info { address } => {
            let address = parse_address(&address)?;
            print_json(&service.info(&address).await.map_err(report)?)
        }
        Command::Mint(args) => {
            let order = args.into_request().into_order().map_err(report)?;
            let tx_id = service
                .mint(&order.token, order.amount, &order.recipient, order.notify)
                .await
                .map_err(report)?;
            print_json(&serde_json::json!({
                "success": true,
                "transaction_id": tx_id,
                "message": format!("Minted {} tokens to {}", order.amount, order.recipient),
            }))
        }
        Command::Demo => run_demo(service).await,
        Command::SealKey { .. } => anyhow::bail!("seal-key runs before the backend starts"),
    }
}

async fn run_demo(service: &TokenService) -> Result<()> {
    let params = TokenParams::new("Test Token", "TST", 9).with_initial_supply(DEMO_SUPPLY);
    let deployed = service.deploy(params).await.map_err(report)?;
    let mint_tx = service
        .mint(&deployed.address, DEMO_MINT, service.wallet_address(), false)
        .await
        .map_err(report)?;
    let view = service.info(&deployed.address).await.map_err(report)?;

    print_json(&serde_json::json!({
        "deployed": deployed,
        "mint_transaction_id": mint_tx,
        "info": view,
    }))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;
    let _log_guard = logging::init_logging(&config)?;
    info!("Starting tycho v{}", env!("CARGO_PKG_VERSION"));

    // Sealing needs no chain connection.
    if let Command::SealKey { out } = &cli.command {
        return seal_key(&config, out);
    }

    let service = TokenService::connect(&config).context("failed to start chain backend")?;
    info!(
        network = %service.network().name,
        mode = %service.mode(),
        wallet = %service.wallet_address(),
        "token service ready"
    );
    match service.wallet_balance().await {
        Ok(balance) => info!(balance = balance.display, "server wallet balance"),
        Err(e) => warn!("wallet balance unavailable: {e}"),
    }

    let outcome = run(&service, cli.command).await;
    service.shutdown().await;
    outcome
}
