use std::time::Duration;

use pretty_assertions::assert_eq;

use yolink_uac::config::{AuthConfig, DEFAULT_API_URL, DEFAULT_TOKEN_URL};
use yolink_uac::error::AuthError;

#[test]
fn full_toml_table_overrides_every_field() {
    let raw = r#"
        token_url = "http://localhost:8080/token"
        api_url = "http://localhost:8080/api"
        exchange_timeout_ms = 2500
        verification_timeout_ms = 4000
        refresh_buffer_secs = 120
        default_expires_in_secs = 900
    "#;

    let config = AuthConfig::from_toml_str(raw).expect("parse");

    assert_eq!(
        config,
        AuthConfig::new()
            .with_token_url("http://localhost:8080/token")
            .with_api_url("http://localhost:8080/api")
            .with_exchange_timeout(Duration::from_millis(2500))
            .with_verification_timeout(Duration::from_secs(4))
            .with_refresh_buffer(Duration::from_secs(120))
            .with_default_expires_in(900)
    );
}

#[test]
fn empty_toml_yields_defaults() {
    let config = AuthConfig::from_toml_str("").expect("parse");
    assert_eq!(config.token_url, DEFAULT_TOKEN_URL);
    assert_eq!(config.api_url, DEFAULT_API_URL);
    assert_eq!(config, AuthConfig::default());
}

#[test]
fn zero_timeouts_are_rejected() {
    let err = AuthConfig::from_toml_str("exchange_timeout_ms = 0").unwrap_err();
    assert!(matches!(err, AuthError::Configuration(msg) if msg.contains("exchange_timeout_ms")));

    let err = AuthConfig::default()
        .with_verification_timeout(Duration::ZERO)
        .validate()
        .unwrap_err();
    assert_eq!(err.reason_code(), "invalid_config");
}
