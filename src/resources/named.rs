//! `oci_identity_user` and `oci_identity_group` adapters.
//!
//! Users and groups share one shape: a `name` and `compartment_id` fixed at
//! creation and a `description` that can change in place. The adapters
//! differ only in the entity type and the client calls they use, so both
//! are generated by `named_entity_resource!`.

use super::{
    ResourceAdapter, check_in_place, compartment_or_tenancy, create_and_wait, delete_and_wait,
    observed_attributes, recorded_phase, update_and_wait,
};
use crate::client::{ClientResultExt, IdentityClient};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult};
use crate::lifecycle::LifecycleState;
use crate::model::{
    CreateGroupDetails, CreateUserDetails, Group, UpdateGroupDetails, UpdateUserDetails, User,
};
use crate::resource_data::{ResourceData, ResourceState};
use crate::schema::{GROUP_SCHEMA, ResourceSchema, USER_SCHEMA};
use log::{debug, trace};

macro_rules! named_entity_resource {
    (
        $(#[$meta:meta])*
        $name:ident {
            entity: $entity:ty,
            schema: $schema:ident,
            create: $create:ident($create_details:ident),
            get: $get:ident,
            update: $update:ident($update_details:ident),
            delete: $delete:ident,
        }
    ) => {
        $(#[$meta])*
        pub struct $name<'a, C> {
            client: &'a C,
            config: &'a ProviderConfig,
        }

        impl<'a, C: IdentityClient> $name<'a, C> {
            pub fn new(client: &'a C, config: &'a ProviderConfig) -> Self {
                Self { client, config }
            }

            fn to_state(entity: &$entity) -> ResourceState {
                let attributes = observed_attributes(
                    &entity.id,
                    &entity.compartment_id,
                    entity.lifecycle_state,
                    entity.inactive_status,
                    &entity.time_created,
                )
                .with("name", entity.name.as_str())
                .with("description", entity.description.as_str());
                ResourceState::new(
                    $schema.type_name,
                    &entity.id,
                    recorded_phase(entity.lifecycle_state),
                    attributes,
                    entity.etag.clone(),
                )
            }
        }

        impl<C: IdentityClient> ResourceAdapter for $name<'_, C> {
            fn schema(&self) -> &'static ResourceSchema {
                &$schema
            }

            async fn create(&self, desired: &ResourceData) -> ProviderResult<ResourceState> {
                let type_name = $schema.type_name;
                $schema.validate(desired)?;
                let details = $create_details {
                    compartment_id: compartment_or_tenancy(desired, self.config)?,
                    name: desired.require_str(type_name, "name")?.to_string(),
                    description: desired.require_str(type_name, "description")?.to_string(),
                };
                trace!("{} request: {:?}", stringify!($create), details);

                let client = self.client;
                create_and_wait(
                    type_name,
                    &self.config.timeouts.create_policy(),
                    client.$create(details),
                    move |id: String| async move { client.$get(&id).await.optional() },
                    Self::to_state,
                )
                .await
            }

            async fn read(&self, id: &str) -> ProviderResult<Option<ResourceState>> {
                debug!("Reading {} '{}'", $schema.type_name, id);
                match self.client.$get(id).await.optional() {
                    Ok(Some(entity)) if entity.lifecycle_state == LifecycleState::Deleted => {
                        Ok(None)
                    }
                    Ok(Some(entity)) => Ok(Some(Self::to_state(&entity))),
                    Ok(None) => Ok(None),
                    Err(error) => Err(ProviderError::rejected($schema.type_name, "read", error)),
                }
            }

            async fn update(
                &self,
                prior: &ResourceState,
                desired: &ResourceData,
            ) -> ProviderResult<ResourceState> {
                let type_name = $schema.type_name;
                let diff = check_in_place(&$schema, prior, desired)?;
                if diff.is_empty() {
                    debug!("{} '{}' is up to date", type_name, prior.id);
                    return Ok(prior.clone());
                }

                let details = $update_details {
                    description: Some(desired.require_str(type_name, "description")?.to_string()),
                };
                let client = self.client;
                let id = prior.id.as_str();
                update_and_wait(
                    type_name,
                    id,
                    &self.config.timeouts.update_policy(),
                    client.$update(id, details, prior.etag.as_deref()),
                    move || async move { client.$get(id).await.optional() },
                    Self::to_state,
                )
                .await
            }

            async fn delete(&self, id: &str) -> ProviderResult<()> {
                let client = self.client;
                delete_and_wait(
                    $schema.type_name,
                    id,
                    &self.config.timeouts.delete_policy(),
                    client.$delete(id, None),
                    move || async move { client.$get(id).await.optional() },
                )
                .await
            }
        }
    };
}

named_entity_resource! {
    /// Lifecycle adapter for identity users.
    UserResource {
        entity: User,
        schema: USER_SCHEMA,
        create: create_user(CreateUserDetails),
        get: get_user,
        update: update_user(UpdateUserDetails),
        delete: delete_user,
    }
}

named_entity_resource! {
    /// Lifecycle adapter for identity groups.
    GroupResource {
        entity: Group,
        schema: GROUP_SCHEMA,
        create: create_group(CreateGroupDetails),
        get: get_group,
        update: update_group(UpdateGroupDetails),
        delete: delete_group,
    }
}
