//! Provider configuration.
//!
//! Configuration comes from a JSON document or from `OCI_*` environment
//! variables and is validated before a provider is built from it.
//!
//! ```rust
//! use oci_identity_provider::config::ProviderConfig;
//!
//! let config = ProviderConfig::from_json_str(r#"{
//!     "credentials": {
//!         "tenancy_ocid": "ocid1.tenancy.oc1..aaaaaaaa",
//!         "user_ocid": "ocid1.user.oc1..bbbbbbbb",
//!         "fingerprint": "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34",
//!         "private_key_path": "/home/opc/.oci/oci_api_key.pem"
//!     },
//!     "region": "us-phoenix-1",
//!     "timeouts": { "poll_interval_ms": 500 }
//! }"#).unwrap();
//! assert_eq!(config.timeouts.poll_interval_ms, 500);
//! assert_eq!(config.timeouts.create_timeout_secs, 1200);
//! ```

use crate::error::{ConfigError, ConfigResult};
use crate::lifecycle::WaitPolicy;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// API signing credentials. The provider never reads the key itself; it
/// only carries the location to whatever client signs requests.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Credentials {
    pub tenancy_ocid: String,
    pub user_ocid: String,
    /// Fingerprint of the API signing key, `aa:bb:...` (16 octets).
    pub fingerprint: String,
    pub private_key_path: PathBuf,
    #[serde(default, skip_serializing)]
    pub private_key_password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("tenancy_ocid", &self.tenancy_ocid)
            .field("user_ocid", &self.user_ocid)
            .field("fingerprint", &self.fingerprint)
            .field("private_key_path", &self.private_key_path)
            .field(
                "private_key_password",
                &self.private_key_password.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}

/// Polling interval and per-operation bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Timeouts {
    pub poll_interval_ms: u64,
    pub create_timeout_secs: u64,
    pub update_timeout_secs: u64,
    pub delete_timeout_secs: u64,
    pub max_transient_retries: u32,
}

impl Default for Timeouts {
    fn default() -> Self {
        Self {
            poll_interval_ms: 2_000,
            create_timeout_secs: 20 * 60,
            update_timeout_secs: 20 * 60,
            delete_timeout_secs: 20 * 60,
            max_transient_retries: 5,
        }
    }
}

impl Timeouts {
    fn policy(&self, timeout_secs: u64) -> WaitPolicy {
        WaitPolicy::new(
            Duration::from_millis(self.poll_interval_ms),
            Duration::from_secs(timeout_secs),
            self.max_transient_retries,
        )
    }

    pub fn create_policy(&self) -> WaitPolicy {
        self.policy(self.create_timeout_secs)
    }

    pub fn update_policy(&self) -> WaitPolicy {
        self.policy(self.update_timeout_secs)
    }

    pub fn delete_policy(&self) -> WaitPolicy {
        self.policy(self.delete_timeout_secs)
    }
}

/// Complete provider configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProviderConfig {
    pub credentials: Credentials,
    pub region: String,
    #[serde(default)]
    pub timeouts: Timeouts,
}

impl ProviderConfig {
    pub fn new(credentials: Credentials, region: impl Into<String>) -> Self {
        Self {
            credentials,
            region: region.into(),
            timeouts: Timeouts::default(),
        }
    }

    pub fn with_timeouts(mut self, timeouts: Timeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    /// Tenancy OCID, also the default compartment for identity objects.
    pub fn tenancy_ocid(&self) -> &str {
        &self.credentials.tenancy_ocid
    }

    pub fn from_json_str(json: &str) -> ConfigResult<Self> {
        let config: ProviderConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Read `OCI_TENANCY_OCID`, `OCI_USER_OCID`, `OCI_FINGERPRINT`,
    /// `OCI_PRIVATE_KEY_PATH`, `OCI_REGION` and the optional
    /// `OCI_PRIVATE_KEY_PASSWORD`, `OCI_POLL_INTERVAL_MS`,
    /// `OCI_CREATE_TIMEOUT_SECS`, `OCI_UPDATE_TIMEOUT_SECS`,
    /// `OCI_DELETE_TIMEOUT_SECS`, `OCI_MAX_TRANSIENT_RETRIES`.
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Like [`from_env`](Self::from_env) with an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let required = |key: &str| lookup(key).ok_or_else(|| ConfigError::missing(key));

        let credentials = Credentials {
            tenancy_ocid: required("OCI_TENANCY_OCID")?,
            user_ocid: required("OCI_USER_OCID")?,
            fingerprint: required("OCI_FINGERPRINT")?,
            private_key_path: PathBuf::from(required("OCI_PRIVATE_KEY_PATH")?),
            private_key_password: lookup("OCI_PRIVATE_KEY_PASSWORD"),
        };

        let defaults = Timeouts::default();
        let timeouts = Timeouts {
            poll_interval_ms: parse_or(&lookup, "OCI_POLL_INTERVAL_MS", defaults.poll_interval_ms)?,
            create_timeout_secs: parse_or(
                &lookup,
                "OCI_CREATE_TIMEOUT_SECS",
                defaults.create_timeout_secs,
            )?,
            update_timeout_secs: parse_or(
                &lookup,
                "OCI_UPDATE_TIMEOUT_SECS",
                defaults.update_timeout_secs,
            )?,
            delete_timeout_secs: parse_or(
                &lookup,
                "OCI_DELETE_TIMEOUT_SECS",
                defaults.delete_timeout_secs,
            )?,
            max_transient_retries: parse_or(
                &lookup,
                "OCI_MAX_TRANSIENT_RETRIES",
                defaults.max_transient_retries,
            )?,
        };

        let config = ProviderConfig {
            credentials,
            region: required("OCI_REGION")?,
            timeouts,
        };
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> ConfigResult<()> {
        validate_ocid("tenancy_ocid", &self.credentials.tenancy_ocid, "tenancy")?;
        validate_ocid("user_ocid", &self.credentials.user_ocid, "user")?;
        validate_fingerprint(&self.credentials.fingerprint)?;
        if self.credentials.private_key_path.as_os_str().is_empty() {
            return Err(ConfigError::missing("private_key_path"));
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::missing("region"));
        }

        let t = &self.timeouts;
        if t.poll_interval_ms == 0 {
            return Err(ConfigError::invalid("poll_interval_ms", "must be greater than zero"));
        }
        for (field, secs) in [
            ("create_timeout_secs", t.create_timeout_secs),
            ("update_timeout_secs", t.update_timeout_secs),
            ("delete_timeout_secs", t.delete_timeout_secs),
        ] {
            if secs == 0 {
                return Err(ConfigError::invalid(field, "must be greater than zero"));
            }
        }
        Ok(())
    }
}

fn parse_or<T: std::str::FromStr>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> ConfigResult<T> {
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|_| ConfigError::invalid(key, format!("'{}' is not a valid number", raw))),
    }
}

fn validate_ocid(field: &str, value: &str, kind: &str) -> ConfigResult<()> {
    if value.is_empty() {
        return Err(ConfigError::missing(field));
    }
    let prefix = format!("ocid1.{}.", kind);
    if !value.starts_with(&prefix) {
        return Err(ConfigError::invalid(
            field,
            format!("expected an OCID starting with '{}'", prefix),
        ));
    }
    Ok(())
}

fn validate_fingerprint(value: &str) -> ConfigResult<()> {
    let octets: Vec<&str> = value.split(':').collect();
    let well_formed = octets.len() == 16
        && octets
            .iter()
            .all(|octet| octet.len() == 2 && octet.chars().all(|c| c.is_ascii_hexdigit()));
    if !well_formed {
        return Err(ConfigError::invalid(
            "fingerprint",
            "expected 16 colon-separated hex octets",
        ));
    }
    Ok(())
}
