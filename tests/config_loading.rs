//! Loading provider configuration from files and assembling providers from it.

mod common;

use common::{TENANCY, init_logging, test_credentials};
use oci_identity_provider::client::InMemoryIdentityClient;
use oci_identity_provider::config::{ProviderConfig, Timeouts};
use oci_identity_provider::error::{ConfigError, ProviderError};
use oci_identity_provider::provider::IdentityProvider;
use std::time::Duration;

#[test]
fn test_load_from_file() {
    init_logging();
    let config = ProviderConfig::from_json_file("tests/fixtures/provider_config.json").unwrap();

    assert_eq!(config.tenancy_ocid(), TENANCY);
    assert_eq!(config.region, "us-phoenix-1");
    assert_eq!(config.timeouts.poll_interval_ms, 1000);
    assert_eq!(config.timeouts.max_transient_retries, 8);
    // Unset fields fall back to their defaults.
    assert_eq!(
        config.timeouts.delete_timeout_secs,
        Timeouts::default().delete_timeout_secs
    );

    let policy = config.timeouts.create_policy();
    assert_eq!(policy.interval, Duration::from_secs(1));
    assert_eq!(policy.timeout, Duration::from_secs(600));
}

#[test]
fn test_missing_file_is_an_io_error() {
    let error = ProviderConfig::from_json_file("tests/fixtures/missing.json").unwrap_err();
    assert!(matches!(error, ConfigError::Io { .. }));
    assert!(error.to_string().contains("missing.json"));
}

#[test]
fn test_zero_timeout_is_rejected() {
    let json = serde_json::json!({
        "credentials": test_credentials(),
        "region": "us-phoenix-1",
        "timeouts": { "update_timeout_secs": 0 }
    });
    let error = ProviderConfig::from_json_str(&json.to_string()).unwrap_err();
    assert!(error.to_string().contains("update_timeout_secs"));
}

#[test]
fn test_provider_rejects_invalid_config() {
    let mut credentials = test_credentials();
    credentials.user_ocid = "ocid1.group.oc1..aaaa".to_string();
    let config = ProviderConfig::new(credentials, "us-phoenix-1");

    let result = IdentityProvider::new(InMemoryIdentityClient::new(), config);
    assert!(matches!(
        result,
        Err(ProviderError::Config(ConfigError::InvalidValue { ref field, .. })) if field == "user_ocid"
    ));
}

#[test]
fn test_builder_from_loaded_config() {
    let config = ProviderConfig::from_json_file("tests/fixtures/provider_config.json").unwrap();
    let provider = IdentityProvider::builder(InMemoryIdentityClient::new())
        .with_config(config.clone())
        .build()
        .unwrap();
    assert_eq!(provider.config(), &config);

    let cloned = provider.clone();
    let desired = oci_identity_provider::ResourceData::new()
        .with("name", "-tf-user")
        .with("description", "automated test user");
    let state = tokio_test::block_on(cloned.create("oci_identity_user", &desired)).unwrap();
    // Both handles see the same service.
    assert!(tokio_test::block_on(provider.read("oci_identity_user", &state.id))
        .unwrap()
        .is_some());
}
