//! Provider entry point.
//!
//! [`IdentityProvider`] is what a declarative engine talks to. It resolves a
//! type name to the matching adapter, computes plans from the schema diff and
//! applies them, and serves the availability-domains data source.
//!
//! # Example
//!
//! ```rust
//! use oci_identity_provider::client::InMemoryIdentityClient;
//! use oci_identity_provider::config::{Credentials, ProviderConfig};
//! use oci_identity_provider::provider::{IdentityProvider, PlanAction};
//! use oci_identity_provider::resource_data::ResourceData;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = ProviderConfig::new(
//!     Credentials {
//!         tenancy_ocid: "ocid1.tenancy.oc1..aaaa".to_string(),
//!         user_ocid: "ocid1.user.oc1..bbbb".to_string(),
//!         fingerprint: "20:3b:97:13:55:1c:5b:0d:d3:37:d8:50:4e:c5:3a:34".to_string(),
//!         private_key_path: "/tmp/oci_api_key.pem".into(),
//!         private_key_password: None,
//!     },
//!     "us-phoenix-1",
//! );
//! let provider = IdentityProvider::new(InMemoryIdentityClient::new(), config)?;
//!
//! let desired = ResourceData::new()
//!     .with("name", "-tf-group")
//!     .with("description", "automated test group");
//! let plan = provider.plan("oci_identity_group", None, &desired)?;
//! assert_eq!(plan, PlanAction::Create);
//!
//! let state = provider.apply("oci_identity_group", None, &desired).await?;
//! assert_eq!(state.get_str("state"), Some("ACTIVE"));
//!
//! provider.destroy(&state).await?;
//! provider.destroy(&state).await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;

pub use builder::IdentityProviderBuilder;

use crate::client::IdentityClient;
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::lifecycle::InstancePhase;
use crate::resource_data::{ResourceData, ResourceState};
use crate::resources::{
    AvailabilityDomainsDataSource, DataSourceKind, GroupResource, ResourceAdapter, ResourceKind,
    UserGroupMembershipResource, UserResource,
};
use crate::schema::ResourceSchema;
use log::{debug, info, warn};
use std::sync::Arc;

/// What applying a desired state to a prior state will do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlanAction {
    /// No prior state; the object will be created.
    Create,
    /// Mutable attributes changed; the object is updated in place.
    Update { changed: Vec<String> },
    /// The existing object is deleted and a new one created.
    ///
    /// `tainted` is set when the prior instance ended in a failed phase, as
    /// recorded from [`ProviderError::Tainted`];
    /// `forced_by` lists the immutable attributes that changed.
    Replace {
        forced_by: Vec<String>,
        tainted: bool,
    },
    NoOp,
}

/// Result of re-reading a recorded instance.
#[derive(Debug, Clone, PartialEq)]
pub struct RefreshOutcome {
    pub state: ResourceState,
    /// The remote object no longer matches what was recorded.
    pub drifted: bool,
}

/// Runs `$body` with `$adapter` bound to the adapter for `$kind`.
macro_rules! with_adapter {
    ($provider:expr, $kind:expr, |$adapter:ident| $body:expr) => {{
        let client = &*$provider.client;
        let config = &*$provider.config;
        match $kind {
            ResourceKind::User => {
                let $adapter = UserResource::new(client, config);
                $body
            }
            ResourceKind::Group => {
                let $adapter = GroupResource::new(client, config);
                $body
            }
            ResourceKind::UserGroupMembership => {
                let $adapter = UserGroupMembershipResource::new(client, config);
                $body
            }
        }
    }};
}

/// Identity resource provider.
///
/// Cloning shares the client and configuration.
pub struct IdentityProvider<C> {
    client: Arc<C>,
    config: Arc<ProviderConfig>,
}

impl<C> Clone for IdentityProvider<C> {
    fn clone(&self) -> Self {
        Self {
            client: Arc::clone(&self.client),
            config: Arc::clone(&self.config),
        }
    }
}

impl<C: IdentityClient> IdentityProvider<C> {
    /// Build a provider after validating `config`.
    pub fn new(client: C, config: ProviderConfig) -> ProviderResult<Self> {
        config.validate()?;
        Ok(Self {
            client: Arc::new(client),
            config: Arc::new(config),
        })
    }

    pub fn builder(client: C) -> IdentityProviderBuilder<C> {
        IdentityProviderBuilder::new(client)
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        ResourceKind::ALL.iter().map(|kind| kind.type_name()).collect()
    }

    pub fn data_source_types(&self) -> Vec<&'static str> {
        DataSourceKind::ALL
            .iter()
            .map(|kind| kind.type_name())
            .collect()
    }

    /// Schema of a resource or data source type.
    pub fn schema(&self, type_name: &str) -> ProviderResult<&'static ResourceSchema> {
        ResourceKind::from_type_name(type_name)
            .map(|kind| kind.schema())
            .or_else(|_| DataSourceKind::from_type_name(type_name).map(|kind| kind.schema()))
    }

    /// Decide what applying `desired` over `prior` requires.
    pub fn plan(
        &self,
        type_name: &str,
        prior: Option<&ResourceState>,
        desired: &ResourceData,
    ) -> ProviderResult<PlanAction> {
        let schema = ResourceKind::from_type_name(type_name)?.schema();
        schema.validate(desired)?;

        let action = match prior {
            None => PlanAction::Create,
            Some(prior) if prior.phase == InstancePhase::Failed => PlanAction::Replace {
                forced_by: Vec::new(),
                tainted: true,
            },
            Some(prior) => {
                let diff = schema.diff(&prior.attributes, desired);
                if diff.requires_replace() {
                    PlanAction::Replace {
                        forced_by: diff.forces_new,
                        tainted: false,
                    }
                } else if !diff.updated.is_empty() {
                    PlanAction::Update {
                        changed: diff.updated,
                    }
                } else {
                    PlanAction::NoOp
                }
            }
        };
        debug!("Plan for {}: {:?}", type_name, action);
        Ok(action)
    }

    /// Plan and execute in one step.
    ///
    /// A replacement deletes the prior object before creating its
    /// successor, so the returned state carries a new identifier.
    pub async fn apply(
        &self,
        type_name: &str,
        prior: Option<&ResourceState>,
        desired: &ResourceData,
    ) -> ProviderResult<ResourceState> {
        let action = self.plan(type_name, prior, desired)?;
        match (action, prior) {
            (PlanAction::Create, _) => self.create(type_name, desired).await,
            (PlanAction::Update { .. }, Some(prior)) => {
                self.update(type_name, prior, desired).await
            }
            (PlanAction::Replace { forced_by, tainted }, Some(prior)) => {
                info!(
                    "Replacing {} '{}' (forced by {:?}, tainted: {})",
                    type_name, prior.id, forced_by, tainted
                );
                self.delete(type_name, &prior.id).await?;
                self.create(type_name, desired).await
            }
            (PlanAction::NoOp, Some(prior)) => Ok(prior.clone()),
            (action, None) => Err(ProviderError::internal(format!(
                "plan {:?} for {} needs a prior state",
                action, type_name
            ))),
        }
    }

    pub async fn create(
        &self,
        type_name: &str,
        desired: &ResourceData,
    ) -> ProviderResult<ResourceState> {
        let kind = ResourceKind::from_type_name(type_name)?;
        with_adapter!(self, kind, |adapter| adapter.create(desired).await)
    }

    pub async fn read(&self, type_name: &str, id: &str) -> ProviderResult<Option<ResourceState>> {
        let kind = ResourceKind::from_type_name(type_name)?;
        with_adapter!(self, kind, |adapter| adapter.read(id).await)
    }

    pub async fn update(
        &self,
        type_name: &str,
        prior: &ResourceState,
        desired: &ResourceData,
    ) -> ProviderResult<ResourceState> {
        let kind = ResourceKind::from_type_name(type_name)?;
        with_adapter!(self, kind, |adapter| adapter.update(prior, desired).await)
    }

    pub async fn delete(&self, type_name: &str, id: &str) -> ProviderResult<()> {
        let kind = ResourceKind::from_type_name(type_name)?;
        with_adapter!(self, kind, |adapter| adapter.delete(id).await)
    }

    /// Re-read a recorded instance. `None` means the object is gone and the
    /// record should be dropped.
    pub async fn refresh(&self, recorded: &ResourceState) -> ProviderResult<Option<RefreshOutcome>> {
        let Some(state) = self.read(&recorded.type_name, &recorded.id).await? else {
            warn!(
                "{} '{}' no longer exists remotely",
                recorded.type_name, recorded.id
            );
            return Ok(None);
        };
        let drifted = state.fingerprint != recorded.fingerprint;
        if drifted {
            warn!(
                "{} '{}' drifted from recorded state",
                recorded.type_name, recorded.id
            );
        }
        Ok(Some(RefreshOutcome { state, drifted }))
    }

    /// Delete a recorded instance; succeeds when it is already gone.
    pub async fn destroy(&self, recorded: &ResourceState) -> ProviderResult<()> {
        self.delete(&recorded.type_name, &recorded.id).await
    }

    /// Bring an existing remote object under management.
    pub async fn import(&self, type_name: &str, id: &str) -> ProviderResult<ResourceState> {
        info!("Importing {} '{}'", type_name, id);
        self.read(type_name, id)
            .await?
            .ok_or_else(|| ProviderError::not_found(type_name, id))
    }

    pub async fn read_data_source(
        &self,
        type_name: &str,
        config: &ResourceData,
    ) -> ProviderResult<ResourceData> {
        match DataSourceKind::from_type_name(type_name)? {
            DataSourceKind::AvailabilityDomains => {
                AvailabilityDomainsDataSource::new(&*self.client)
                    .read(config)
                    .await
            }
        }
    }
}
