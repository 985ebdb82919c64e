//! Fluent construction of [`IdentityProvider`] instances.

use super::IdentityProvider;
use crate::client::IdentityClient;
use crate::config::{Credentials, ProviderConfig, Timeouts};
use crate::error::{ConfigError, ProviderResult};

/// Builder for configuring and creating identity providers.
///
/// Either pass a complete [`ProviderConfig`] or set the pieces one at a
/// time; later calls override earlier ones.
///
/// # Examples
///
/// ```rust
/// use oci_identity_provider::client::InMemoryIdentityClient;
/// use oci_identity_provider::config::{Credentials, Timeouts};
/// use oci_identity_provider::provider::IdentityProvider;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let provider = IdentityProvider::builder(InMemoryIdentityClient::new())
///     .with_credentials(Credentials {
///         tenancy_ocid: "ocid1.tenancy.oc1..aaaa".to_string(),
///         user_ocid: "ocid1.user.oc1..bbbb".to_string(),
///         fingerprint: "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34".to_string(),
///         private_key_path: "/tmp/oci_api_key.pem".into(),
///         private_key_password: None,
///     })
///     .with_region("us-ashburn-1")
///     .with_timeouts(Timeouts {
///         poll_interval_ms: 100,
///         ..Timeouts::default()
///     })
///     .build()?;
/// assert_eq!(provider.config().region, "us-ashburn-1");
/// # Ok(())
/// # }
/// ```
pub struct IdentityProviderBuilder<C> {
    client: C,
    credentials: Option<Credentials>,
    region: Option<String>,
    timeouts: Timeouts,
}

impl<C: IdentityClient> IdentityProviderBuilder<C> {
    pub fn new(client: C) -> Self {
        Self {
            client,
            credentials: None,
            region: None,
            timeouts: Timeouts::default(),
        }
    }

    /// Take credentials, region and timeouts from a loaded configuration.
    pub fn with_config(mut self, config: ProviderConfig) -> Self {
        self.credentials = Some(config.credentials);
        self.region = Some(config.region);
        self.timeouts = config.timeouts;
        self
    }

    pub fn with_credentials(mut self, credentials: Credentials) -> Self {
        self.credentials = Some(credentials);
        self
    }

    pub fn with_region(mut self, region: impl Into<String>) -> Self {
        self.region = Some(region.into());
        self
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Validate the assembled configuration and create the provider.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Config`](crate::error::ProviderError::Config)
    /// when credentials or region are missing or fail validation.
    pub fn build(self) -> ProviderResult<IdentityProvider<C>> {
        let credentials = self
            .credentials
            .ok_or_else(|| ConfigError::missing("credentials"))?;
        let region = self.region.ok_or_else(|| ConfigError::missing("region"))?;
        let config = ProviderConfig::new(credentials, region).with_timeouts(self.timeouts);
        IdentityProvider::new(self.client, config)
    }
}
