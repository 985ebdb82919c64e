//! `oci_identity_user_group_membership` adapter.
//!
//! A membership has nothing that can change in place: every settable
//! attribute identifies the binding itself. Changing the user or group means
//! removing the old membership and adding a new one.

use super::{
    ResourceAdapter, check_in_place, compartment_or_tenancy, create_and_wait, delete_and_wait,
    observed_attributes, recorded_phase,
};
use crate::client::{ClientResultExt, IdentityClient};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::lifecycle::LifecycleState;
use crate::model::{AddUserToGroupDetails, UserGroupMembership};
use crate::resource_data::{ResourceData, ResourceState};
use crate::schema::{ResourceSchema, USER_GROUP_MEMBERSHIP_SCHEMA};
use log::{debug, trace};

const TYPE_NAME: &str = USER_GROUP_MEMBERSHIP_SCHEMA.type_name;

pub struct UserGroupMembershipResource<'a, C> {
    client: &'a C,
    config: &'a ProviderConfig,
}

impl<'a, C: IdentityClient> UserGroupMembershipResource<'a, C> {
    pub fn new(client: &'a C, config: &'a ProviderConfig) -> Self {
        Self { client, config }
    }

    fn to_state(membership: &UserGroupMembership) -> ResourceState {
        let attributes = observed_attributes(
            &membership.id,
            &membership.compartment_id,
            membership.lifecycle_state,
            membership.inactive_status,
            &membership.time_created,
        )
        .with("user_id", membership.user_id.as_str())
        .with("group_id", membership.group_id.as_str());
        ResourceState::new(
            TYPE_NAME,
            &membership.id,
            recorded_phase(membership.lifecycle_state),
            attributes,
            membership.etag.clone(),
        )
    }
}

impl<C: IdentityClient> ResourceAdapter for UserGroupMembershipResource<'_, C> {
    fn schema(&self) -> &'static ResourceSchema {
        &USER_GROUP_MEMBERSHIP_SCHEMA
    }

    async fn create(&self, desired: &ResourceData) -> ProviderResult<ResourceState> {
        USER_GROUP_MEMBERSHIP_SCHEMA.validate(desired)?;
        let details = AddUserToGroupDetails {
            compartment_id: compartment_or_tenancy(desired, self.config)?,
            user_id: desired.require_str(TYPE_NAME, "user_id")?.to_string(),
            group_id: desired.require_str(TYPE_NAME, "group_id")?.to_string(),
        };
        trace!("add_user_to_group request: {:?}", details);

        let client = self.client;
        create_and_wait(
            TYPE_NAME,
            &self.config.timeouts.create_policy(),
            client.add_user_to_group(details),
            move |id: String| async move { client.get_user_group_membership(&id).await.optional() },
            Self::to_state,
        )
        .await
    }

    async fn read(&self, id: &str) -> ProviderResult<Option<ResourceState>> {
        debug!("Reading {} '{}'", TYPE_NAME, id);
        match self.client.get_user_group_membership(id).await.optional() {
            Ok(Some(membership)) if membership.lifecycle_state == LifecycleState::Deleted => {
                Ok(None)
            }
            Ok(Some(membership)) => Ok(Some(Self::to_state(&membership))),
            Ok(None) => Ok(None),
            Err(error) => Err(ProviderError::rejected(TYPE_NAME, "read", error)),
        }
    }

    /// Succeeds only when nothing changed.
    async fn update(
        &self,
        prior: &ResourceState,
        desired: &ResourceData,
    ) -> ProviderResult<ResourceState> {
        check_in_place(&USER_GROUP_MEMBERSHIP_SCHEMA, prior, desired)?;
        debug!("{} '{}' is up to date", TYPE_NAME, prior.id);
        Ok(prior.clone())
    }

    async fn delete(&self, id: &str) -> ProviderResult<()> {
        let client = self.client;
        delete_and_wait(
            TYPE_NAME,
            id,
            &self.config.timeouts.delete_policy(),
            client.remove_user_from_group(id, None),
            move || async move { client.get_user_group_membership(id).await.optional() },
        )
        .await
    }
}
