use std::env;

use keyless_ci::{Provider, TokenSource};

use crate::jwt::{Claims, Token};
use crate::oidc::{acquire_token, TokenManager};

fn direct_provider() -> Provider {
    Provider {
        name: "Test Direct",
        issuer: "https://issuer.example",
        jwks_uri: "https://issuer.example/jwks",
        token_source: TokenSource::Direct { env: "KEYLESS_TEST_DIRECT_TOKEN" },
    }
}

fn claims_expiring_in(seconds: i64) -> Claims {
    let now = std::time::SystemTime::now().duration_since(std::time::UNIX_EPOCH).unwrap().as_secs() as i64;
    Claims { iss: "https://issuer.example".to_string(), exp: now + seconds, iat: now, ..Default::default() }
}

#[tokio::test]
async fn direct_provider_reads_the_token_verbatim_from_its_env_var() {
    env::set_var("KEYLESS_TEST_DIRECT_TOKEN", "raw-jwt-value");
    let client = reqwest::Client::new();

    let token = acquire_token(&client, &direct_provider(), "some-audience").await.unwrap();
    assert_eq!(token, "raw-jwt-value");

    env::remove_var("KEYLESS_TEST_DIRECT_TOKEN");
}

#[tokio::test]
async fn direct_provider_fails_closed_when_env_var_is_absent() {
    env::remove_var("KEYLESS_TEST_DIRECT_TOKEN_MISSING");
    let mut provider = direct_provider();
    provider.token_source = TokenSource::Direct { env: "KEYLESS_TEST_DIRECT_TOKEN_MISSING" };
    let client = reqwest::Client::new();

    assert!(acquire_token(&client, &provider, "some-audience").await.is_err());
}

fn manager_with_ttl(ttl_seconds: i64, refresh_threshold: i64) -> TokenManager {
    let token = Token::for_test("raw", claims_expiring_in(ttl_seconds));
    TokenManager::new(direct_provider(), "audience", refresh_threshold).with_token_for_test(token)
}

#[test]
fn token_ttl_reflects_time_remaining_until_expiry() {
    let manager = manager_with_ttl(120, 300);
    assert!(manager.get_token_ttl() <= 120 && manager.get_token_ttl() > 110);
}

#[test]
fn needs_refresh_when_no_token_is_held() {
    let manager = TokenManager::new(direct_provider(), "audience", 300);
    assert!(manager.needs_refresh_for_operation(10));
}

#[test]
fn needs_refresh_when_ttl_is_below_operation_plus_threshold() {
    let manager = manager_with_ttl(120, 300);
    assert!(manager.needs_refresh_for_operation(10));
}

#[test]
fn does_not_need_refresh_when_ttl_comfortably_exceeds_operation_plus_threshold() {
    let manager = manager_with_ttl(10_000, 300);
    assert!(!manager.needs_refresh_for_operation(10));
}
