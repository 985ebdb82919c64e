//! Resource lifecycle adapter for OCI identity objects.
//!
//! Lets a declarative engine manage identity users, groups and user-group
//! memberships, and read the availability domains of a compartment. Every
//! mutation waits for the remote object to settle before it returns.
//!
//! # Core Components
//!
//! - [`IdentityProvider`] - Type-name dispatch, plan and apply
//! - [`IdentityClient`] - Outbound seam to the identity service
//! - [`InMemoryIdentityClient`] - Simulated service for tests and local use
//! - [`lifecycle::await_terminal_state`] - The single polling utility
//!
//! # Quick Start
//!
//! ```rust
//! use oci_identity_provider::{IdentityProvider, InMemoryIdentityClient, ProviderConfig};
//! use oci_identity_provider::resource_data::ResourceData;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::from_json_str(r#"{
//!     "credentials": {
//!         "tenancy_ocid": "ocid1.tenancy.oc1..aaaa",
//!         "user_ocid": "ocid1.user.oc1..bbbb",
//!         "fingerprint": "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34",
//!         "private_key_path": "/tmp/oci_api_key.pem"
//!     },
//!     "region": "us-phoenix-1"
//! }"#)?;
//! let provider = IdentityProvider::new(InMemoryIdentityClient::new(), config)?;
//!
//! let user = provider
//!     .create(
//!         "oci_identity_user",
//!         &ResourceData::new()
//!             .with("name", "-tf-user")
//!             .with("description", "automated test user"),
//!     )
//!     .await?;
//! assert!(user.id.starts_with("ocid1.user."));
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod config;
pub mod error;
pub mod fingerprint;
pub mod lifecycle;
pub mod model;
pub mod provider;
pub mod resource_data;
pub mod resources;
pub mod schema;

pub use client::{ClientError, IdentityClient, InMemoryClientOptions, InMemoryIdentityClient};
pub use config::{Credentials, ProviderConfig, Timeouts};
pub use error::{ProviderError, ProviderResult, ValidationError};
pub use lifecycle::{InstancePhase, LifecycleState, WaitPolicy};
pub use provider::{IdentityProvider, IdentityProviderBuilder, PlanAction, RefreshOutcome};
pub use resource_data::{ResourceData, ResourceState};
pub use resources::{DataSourceKind, ResourceAdapter, ResourceKind};
pub use schema::{Mutability, ResourceSchema};
