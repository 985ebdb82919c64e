//! Shared setup for the lifecycle integration suites.
//!
//! Every test builds its own simulated service and provider; nothing is
//! shared between tests.

#![allow(dead_code)]

use oci_identity_provider::client::{InMemoryClientOptions, InMemoryIdentityClient};
use oci_identity_provider::config::{Credentials, ProviderConfig, Timeouts};
use oci_identity_provider::provider::IdentityProvider;
use oci_identity_provider::resource_data::ResourceState;

pub mod fixtures;

pub const TENANCY: &str = "ocid1.tenancy.oc1..aaaaaaaaba3pv6wkcr4jqae5f15p2b2m2yt2j6rx32uzr4h25vqstifsfdsq";
pub const USER_TYPE: &str = "oci_identity_user";
pub const GROUP_TYPE: &str = "oci_identity_group";
pub const MEMBERSHIP_TYPE: &str = "oci_identity_user_group_membership";
pub const AVAILABILITY_DOMAINS_TYPE: &str = "oci_identity_availability_domains";

/// Install the log backend once; later calls are no-ops.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// Polling fast enough for tests: 10ms interval, 1s bound, 3 retries.
pub fn fast_timeouts() -> Timeouts {
    Timeouts {
        poll_interval_ms: 10,
        create_timeout_secs: 1,
        update_timeout_secs: 1,
        delete_timeout_secs: 1,
        max_transient_retries: 3,
    }
}

pub fn test_credentials() -> Credentials {
    Credentials {
        tenancy_ocid: TENANCY.to_string(),
        user_ocid: "ocid1.user.oc1..aaaaaaaa4hgfqmdtszzduhy5cjdkkrwdeu7irtrbnfzwfpbaqs2ifu3hphpa"
            .to_string(),
        fingerprint: "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34".to_string(),
        private_key_path: "/tmp/oci_api_key.pem".into(),
        private_key_password: None,
    }
}

pub fn test_config() -> ProviderConfig {
    ProviderConfig::new(test_credentials(), "us-phoenix-1").with_timeouts(fast_timeouts())
}

/// Provider over a fresh simulated service, plus a handle to inspect it.
pub fn provider_with(
    options: InMemoryClientOptions,
) -> (IdentityProvider<InMemoryIdentityClient>, InMemoryIdentityClient) {
    init_logging();
    let client = InMemoryIdentityClient::with_options(options);
    let provider = IdentityProvider::builder(client.clone())
        .with_config(test_config())
        .build()
        .expect("test configuration is valid");
    (provider, client)
}

pub fn provider() -> (IdentityProvider<InMemoryIdentityClient>, InMemoryIdentityClient) {
    provider_with(InMemoryClientOptions::default())
}

/// Assert that a state's flattened attributes contain every `(key, value)` pair.
pub fn assert_attributes(state: &ResourceState, expected: &[(&str, &str)]) {
    let flat = state.attributes.flatten();
    for (key, value) in expected {
        assert_eq!(
            flat.get(*key).map(String::as_str),
            Some(*value),
            "attribute '{}' of {} '{}'",
            key,
            state.type_name,
            state.id
        );
    }
}

/// Assert that a state's flattened attributes carry a non-empty value for `key`.
pub fn assert_attribute_set(state: &ResourceState, key: &str) {
    let flat = state.attributes.flatten();
    assert!(
        flat.get(key).is_some_and(|value| !value.is_empty()),
        "attribute '{}' of {} '{}' is not set",
        key,
        state.type_name,
        state.id
    );
}

/// Assert that a lifecycle call failed with the given `ProviderError` variant.
#[macro_export]
macro_rules! assert_provider_error {
    ($result:expr, $pattern:pat) => {
        match $result {
            Err($pattern) => {}
            Err(other) => panic!("Expected {}, got {:?}", stringify!($pattern), other),
            Ok(value) => panic!("Expected {}, got Ok({:?})", stringify!($pattern), value),
        }
    };
}
