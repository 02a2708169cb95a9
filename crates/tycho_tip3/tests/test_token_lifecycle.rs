use std::collections::HashSet;
use std::sync::Arc;

use tycho_core::{BackendMode, TychoConfig};
use tycho_tip3::address::{self, ADDRESS_LEN};
use tycho_tip3::*;

fn demo_service() -> TokenService {
    let mut config = TychoConfig::default();
    config.demo_mode = true;
    TokenService::connect(&config).expect("demo service")
}

fn recipient() -> Address {
    Address::parse(&format!("0:{}", "5e".repeat(32))).unwrap()
}

// ---------------------------------------------------------------------------
// Deploy -> info
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_deploy_then_info_matches_params() {
    let service = demo_service();
    let cases = [("Alpha", "ALP", 0u8), ("Beta Coin", "BETA", 9), ("G", "G", 18)];

    for (name, symbol, decimals) in cases {
        let token = service
            .deploy(TokenParams::new(name, symbol, decimals))
            .await
            .unwrap();
        let view = service.info(&token.address).await.unwrap();
        assert_eq!(view.name, name);
        assert_eq!(view.symbol, symbol);
        assert_eq!(view.decimals, decimals);
        assert_eq!(&view.root_owner, service.wallet_address());
        assert_eq!(view.explorer_url, token.explorer_url);
    }
}

#[tokio::test]
async fn test_deploy_addresses_are_pairwise_distinct() {
    let service = demo_service();
    let mut seen = HashSet::new();
    for _ in 0..50 {
        let token = service
            .deploy(TokenParams::new("Same", "SAME", 9))
            .await
            .unwrap();
        assert!(seen.insert(token.address.clone()), "duplicate {}", token.address);
    }
}

#[tokio::test]
async fn test_concrete_scenario() {
    let service = demo_service();
    let params = TokenParams::new("Test Token", "TST", 9).with_initial_supply(1_000_000_000_000);

    let token = service.deploy(params).await.unwrap();
    assert_eq!(token.address.as_str().len(), ADDRESS_LEN);
    assert!(address::validate(token.address.as_str()));

    let view = service.info(&token.address).await.unwrap();
    assert_eq!(view.decimals, 9);
    let json = serde_json::to_value(&view).unwrap();
    assert_eq!(json["total_supply"], "1000000000000");

    service
        .mint(&token.address, 5_000_000_000, &recipient(), false)
        .await
        .unwrap();
    let json = serde_json::to_value(service.info(&token.address).await.unwrap()).unwrap();
    assert_eq!(json["total_supply"], "1005000000000");
}

#[tokio::test]
async fn test_zero_supply_without_recipient() {
    let service = demo_service();
    let token = service
        .deploy(TokenParams::new("Empty", "EMT", 9))
        .await
        .unwrap();
    let json = serde_json::to_value(service.info(&token.address).await.unwrap()).unwrap();
    assert_eq!(json["total_supply"], "0");
}

// ---------------------------------------------------------------------------
// Mint
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_mints_accumulate_additively() {
    let service = demo_service();
    let token = service
        .deploy(TokenParams::new("Acc", "ACC", 6).with_initial_supply(100))
        .await
        .unwrap();

    service.mint(&token.address, 30, &recipient(), false).await.unwrap();
    service.mint(&token.address, 12, &recipient(), true).await.unwrap();

    let view = service.info(&token.address).await.unwrap();
    assert_eq!(view.total_supply, 142);
}

#[tokio::test]
async fn test_concurrent_mints_lose_no_increments() {
    let service = Arc::new(demo_service());
    let token = service
        .deploy(TokenParams::new("Race", "RCE", 9))
        .await
        .unwrap();

    let handles: Vec<_> = (1..=20u128)
        .map(|amount| {
            let service = Arc::clone(&service);
            let address = token.address.clone();
            tokio::spawn(async move { service.mint(&address, amount, &recipient(), false).await })
        })
        .collect();
    let mut tx_ids = HashSet::new();
    for handle in handles {
        tx_ids.insert(handle.await.unwrap().unwrap());
    }

    assert_eq!(tx_ids.len(), 20);
    let view = service.info(&token.address).await.unwrap();
    assert_eq!(view.total_supply, (1..=20u128).sum::<u128>());
}

#[tokio::test]
async fn test_zero_mint_rejected() {
    let service = demo_service();
    let token = service
        .deploy(TokenParams::new("Zero", "ZER", 9).with_initial_supply(7))
        .await
        .unwrap();

    let err = service
        .mint(&token.address, 0, &recipient(), false)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::Validation);
    assert_eq!(service.info(&token.address).await.unwrap().total_supply, 7);
}

#[tokio::test]
async fn test_mint_request_boundary() {
    let service = demo_service();
    let token = service
        .deploy(TokenParams::new("Req", "REQ", 9))
        .await
        .unwrap();

    let request: MintRequest = serde_json::from_value(serde_json::json!({
        "token_address": token.address.as_str(),
        "amount": "250",
        "recipient": recipient().as_str(),
    }))
    .unwrap();
    let order = request.into_order().unwrap();
    service
        .mint(&order.token, order.amount, &order.recipient, order.notify)
        .await
        .unwrap();
    assert_eq!(service.info(&token.address).await.unwrap().total_supply, 250);
}

// ---------------------------------------------------------------------------
// Not found
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_info_on_unknown_address_is_not_found() {
    let service = demo_service();
    let never_deployed = Address::parse(&format!("0:{}", "01".repeat(32))).unwrap();
    let err = service.info(&never_deployed).await.unwrap_err();
    assert!(matches!(err, TokenError::NotFound(_)));
    assert_eq!(
        err.to_string(),
        format!("Token not found at address: {never_deployed}")
    );
}

#[tokio::test]
async fn test_mint_on_unknown_address_is_not_found() {
    let service = demo_service();
    let never_deployed = Address::parse(&format!("0:{}", "02".repeat(32))).unwrap();
    let err = service
        .mint(&never_deployed, 1, &recipient(), false)
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
}

// ---------------------------------------------------------------------------
// Address validation
// ---------------------------------------------------------------------------

#[test]
fn test_validate_matches_canonical_pattern() {
    let good = format!("0:{}", "0123456789abcdef".repeat(4));
    assert!(address::validate(&good));

    let rejected = [
        String::new(),
        "0:".to_string(),
        good.to_uppercase(),
        format!("1:{}", &good[2..]),
        format!("{good}f"),
        good[..ADDRESS_LEN - 1].to_string(),
        format!(" {good}"),
        good.replace('a', "x"),
    ];
    for bad in rejected {
        assert!(!address::validate(&bad), "accepted {bad:?}");
    }
}

// ---------------------------------------------------------------------------
// Service surface
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_token_create_request_through_service() {
    let service = demo_service();
    let request: TokenCreateRequest = serde_json::from_value(serde_json::json!({
        "name": "My Token",
        "symbol": "MTK",
        "initial_supply": 1_000_000_000_000_000u64,
    }))
    .unwrap();

    let token = service.deploy(request.into_params().unwrap()).await.unwrap();
    assert_eq!(token.params.decimals, 9);
    assert_eq!(token.params.initial_supply, 1_000_000_000_000_000);
    assert_eq!(service.mode(), BackendMode::Simulated);
}

#[tokio::test]
async fn test_wallet_balance_is_funded_in_demo_mode() {
    let service = demo_service();
    let balance = service.wallet_balance().await.unwrap();
    assert!(balance.nano > 0);
    assert!((balance.display - balance.nano as f64 / 1e9).abs() < 1e-9);
}
