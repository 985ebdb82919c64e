//! Per-type lifecycle adapters.
//!
//! Each managed resource type has an adapter implementing
//! [`ResourceAdapter`]: it validates desired attributes, sends the single
//! request the service needs, waits for the object to settle and maps the
//! entity back into a [`ResourceState`]. The create/update/delete sequences
//! are shared through the helpers at the bottom of this module so that every
//! type polls, tracks its phase and reports failures the same way.

pub mod availability_domains;
pub mod membership;
pub mod named;

pub use availability_domains::AvailabilityDomainsDataSource;
pub use membership::UserGroupMembershipResource;
pub use named::{GroupResource, UserResource};

use crate::client::{ClientError, ClientResult};
use crate::config::ProviderConfig;
use crate::error::{ProviderError, ProviderResult, ValidationResult};
use crate::lifecycle::{
    InstancePhase, LifecycleState, PhaseTracker, WaitError, WaitPolicy, WaitTarget,
    await_terminal_state, settle,
};
use crate::model::IdentityEntity;
use crate::resource_data::{ResourceData, ResourceState};
use crate::schema::{
    AVAILABILITY_DOMAINS_SCHEMA, AttributeDiff, GROUP_SCHEMA, ResourceSchema,
    USER_GROUP_MEMBERSHIP_SCHEMA, USER_SCHEMA,
};
use chrono::{DateTime, SecondsFormat, Utc};
use log::{debug, info, warn};
use std::future::Future;

/// Managed resource types served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    User,
    Group,
    UserGroupMembership,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 3] = [
        ResourceKind::User,
        ResourceKind::Group,
        ResourceKind::UserGroupMembership,
    ];

    pub fn schema(&self) -> &'static ResourceSchema {
        match self {
            ResourceKind::User => &USER_SCHEMA,
            ResourceKind::Group => &GROUP_SCHEMA,
            ResourceKind::UserGroupMembership => &USER_GROUP_MEMBERSHIP_SCHEMA,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    pub fn from_type_name(type_name: &str) -> ProviderResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }
}

/// Read-only data sources served by the provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DataSourceKind {
    AvailabilityDomains,
}

impl DataSourceKind {
    pub const ALL: [DataSourceKind; 1] = [DataSourceKind::AvailabilityDomains];

    pub fn schema(&self) -> &'static ResourceSchema {
        match self {
            DataSourceKind::AvailabilityDomains => &AVAILABILITY_DOMAINS_SCHEMA,
        }
    }

    pub fn type_name(&self) -> &'static str {
        self.schema().type_name
    }

    pub fn from_type_name(type_name: &str) -> ProviderResult<Self> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.type_name() == type_name)
            .ok_or_else(|| ProviderError::UnknownResourceType(type_name.to_string()))
    }
}

/// Create, read, update and delete one resource type.
///
/// # Contract
///
/// * `create` returns only once the object is stable (`ACTIVE` or
///   `INACTIVE`); the returned state carries the service-assigned `id`.
/// * `read` returns `Ok(None)` when the object is gone, including objects
///   the service still reports as `DELETED`.
/// * `update` never sends a request for a change to an immutable attribute;
///   it fails with [`ProviderError::Conflict`] instead. An update with no
///   changes returns the prior state untouched.
/// * `delete` is idempotent: an object that is already gone is a success.
pub trait ResourceAdapter {
    fn schema(&self) -> &'static ResourceSchema;

    fn create(
        &self,
        desired: &ResourceData,
    ) -> impl Future<Output = ProviderResult<ResourceState>> + Send;

    fn read(&self, id: &str) -> impl Future<Output = ProviderResult<Option<ResourceState>>> + Send;

    fn update(
        &self,
        prior: &ResourceState,
        desired: &ResourceData,
    ) -> impl Future<Output = ProviderResult<ResourceState>> + Send;

    fn delete(&self, id: &str) -> impl Future<Output = ProviderResult<()>> + Send;
}

/// Compartment from the desired state, or the tenancy when unset.
pub(crate) fn compartment_or_tenancy(
    desired: &ResourceData,
    config: &ProviderConfig,
) -> ValidationResult<String> {
    Ok(match desired.get_str("compartment_id")? {
        Some(compartment) if !compartment.trim().is_empty() => compartment.to_string(),
        _ => config.tenancy_ocid().to_string(),
    })
}

/// Attributes every identity entity reports.
pub(crate) fn observed_attributes(
    id: &str,
    compartment_id: &str,
    state: LifecycleState,
    inactive_status: Option<i64>,
    time_created: &DateTime<Utc>,
) -> ResourceData {
    let mut data = ResourceData::new()
        .with("id", id)
        .with("compartment_id", compartment_id)
        .with("state", state.as_str())
        .with(
            "time_created",
            time_created.to_rfc3339_opts(SecondsFormat::Millis, true),
        );
    if let Some(code) = inactive_status {
        data.set("inactive_state", code);
    }
    data
}

/// Phase recorded for an entity the service reports in `state`.
pub(crate) fn recorded_phase(state: LifecycleState) -> InstancePhase {
    InstancePhase::from_remote(state).unwrap_or(InstancePhase::Absent)
}

/// Validate desired attributes against the prior state for an in-place update.
pub(crate) fn check_in_place(
    schema: &ResourceSchema,
    prior: &ResourceState,
    desired: &ResourceData,
) -> ProviderResult<AttributeDiff> {
    schema.validate(desired)?;
    let diff = schema.diff(&prior.attributes, desired);
    if diff.requires_replace() {
        warn!(
            "Refusing in-place update of {} '{}': {:?} can only be set at creation",
            schema.type_name, prior.id, diff.forces_new
        );
        return Err(ProviderError::Conflict {
            resource_type: schema.type_name.to_string(),
            id: prior.id.clone(),
            attributes: diff.forces_new,
        });
    }
    Ok(diff)
}

/// Translate a failed wait into the error the engine sees.
pub(crate) fn wait_failure(
    resource_type: &str,
    id: &str,
    operation: &str,
    target: &WaitTarget,
    error: WaitError,
) -> ProviderError {
    let rejected = |message: String, source: Option<ClientError>| ProviderError::RemoteRejected {
        resource_type: resource_type.to_string(),
        operation: operation.to_string(),
        message,
        source,
    };
    match error {
        WaitError::Timeout { last_state, waited } => ProviderError::Timeout {
            resource_type: resource_type.to_string(),
            id: id.to_string(),
            target: target.describe(),
            last_state,
            waited,
        },
        WaitError::UnexpectedState { state } => rejected(
            format!(
                "'{}' entered {} while waiting for {}",
                id,
                state,
                target.describe()
            ),
            None,
        ),
        WaitError::Vanished => rejected(
            format!("'{}' disappeared while waiting for {}", id, target.describe()),
            None,
        ),
        WaitError::RetriesExhausted { attempts, source } => rejected(
            format!(
                "gave up polling '{}' after {} transient failures",
                id, attempts
            ),
            Some(source),
        ),
        WaitError::Client(source) => ProviderError::rejected(resource_type, operation, source),
    }
}

/// Send a create request and wait for the new object to become stable.
///
/// `probe` receives the identifier the service assigned. Once that
/// identifier exists, a failed wait comes back as
/// [`ProviderError::Tainted`] carrying the instance in the `Failed` phase.
pub(crate) async fn create_and_wait<T, Fut, P, PFut>(
    resource_type: &'static str,
    policy: &WaitPolicy,
    request: Fut,
    mut probe: P,
    to_state: fn(&T) -> ResourceState,
) -> ProviderResult<ResourceState>
where
    T: IdentityEntity,
    Fut: Future<Output = ClientResult<T>>,
    P: FnMut(String) -> PFut,
    PFut: Future<Output = ClientResult<Option<T>>>,
{
    let mut tracker = PhaseTracker::new(resource_type, "", InstancePhase::Absent);
    tracker.advance(InstancePhase::Creating)?;

    let created = match request.await {
        Ok(created) => created,
        Err(error) => {
            tracker.fail();
            return Err(ProviderError::rejected(resource_type, "create", error));
        }
    };
    let id = created.id().to_string();
    tracker.set_id(&id);
    info!(
        "Created {} '{}' (state {})",
        resource_type,
        id,
        created.lifecycle_state()
    );

    let pending = to_state(&created);
    let target = WaitTarget::STABLE;
    let error = match settle(created, || probe(id.clone()), &target, policy).await {
        Ok(Some(object)) => {
            tracker.advance(InstancePhase::Active)?;
            return Ok(to_state(&object));
        }
        Ok(None) => WaitError::Vanished,
        Err(error) => error,
    };
    tracker.fail();
    Err(taint(
        pending,
        tracker.phase(),
        wait_failure(resource_type, &id, "create", &target, error),
    ))
}

/// Send an update request and wait for the object to settle again.
///
/// A rejected request leaves the object as it was. A failed wait after
/// the service accepted the change taints the instance.
pub(crate) async fn update_and_wait<T, Fut, P, PFut>(
    resource_type: &'static str,
    id: &str,
    policy: &WaitPolicy,
    request: Fut,
    probe: P,
    to_state: fn(&T) -> ResourceState,
) -> ProviderResult<ResourceState>
where
    T: IdentityEntity,
    Fut: Future<Output = ClientResult<T>>,
    P: FnMut() -> PFut,
    PFut: Future<Output = ClientResult<Option<T>>>,
{
    let mut tracker = PhaseTracker::new(resource_type, id, InstancePhase::Active);
    tracker.advance(InstancePhase::Updating)?;

    let updated = match request.await {
        Ok(updated) => updated,
        Err(error) => {
            tracker.fail();
            return Err(ProviderError::rejected(resource_type, "update", error));
        }
    };
    info!("Updated {} '{}'", resource_type, id);

    let pending = to_state(&updated);
    let target = WaitTarget::STABLE;
    let error = match settle(updated, probe, &target, policy).await {
        Ok(Some(object)) => {
            tracker.advance(InstancePhase::Active)?;
            return Ok(to_state(&object));
        }
        Ok(None) => WaitError::Vanished,
        Err(error) => error,
    };
    tracker.fail();
    Err(taint(
        pending,
        tracker.phase(),
        wait_failure(resource_type, id, "update", &target, error),
    ))
}

fn taint(mut state: ResourceState, phase: InstancePhase, source: ProviderError) -> ProviderError {
    warn!(
        "{} '{}' is now {}: {}",
        state.type_name, state.id, phase, source
    );
    state.phase = phase;
    ProviderError::tainted(state, source)
}

/// Send a delete request and wait until the object is gone.
///
/// An object that no longer exists when the request is sent counts as
/// deleted.
pub(crate) async fn delete_and_wait<T, Fut, P, PFut>(
    resource_type: &'static str,
    id: &str,
    policy: &WaitPolicy,
    request: Fut,
    probe: P,
) -> ProviderResult<()>
where
    T: IdentityEntity,
    Fut: Future<Output = ClientResult<()>>,
    P: FnMut() -> PFut,
    PFut: Future<Output = ClientResult<Option<T>>>,
{
    let mut tracker = PhaseTracker::new(resource_type, id, InstancePhase::Active);
    tracker.advance(InstancePhase::Deleting)?;

    match request.await {
        Ok(()) => info!("Deleting {} '{}'", resource_type, id),
        Err(error) if error.is_not_found() => {
            debug!("{} '{}' is already gone", resource_type, id);
            return tracker.advance(InstancePhase::Absent);
        }
        Err(error) => {
            tracker.fail();
            return Err(ProviderError::rejected(resource_type, "delete", error));
        }
    }

    let target = WaitTarget::GONE;
    match await_terminal_state(probe, &target, policy).await {
        Ok(_) => tracker.advance(InstancePhase::Absent),
        Err(error) => {
            tracker.fail();
            Err(wait_failure(resource_type, id, "delete", &target, error))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_kind_lookup() {
        assert_eq!(
            ResourceKind::from_type_name("oci_identity_user_group_membership").unwrap(),
            ResourceKind::UserGroupMembership
        );
        assert_eq!(
            DataSourceKind::from_type_name("oci_identity_availability_domains").unwrap(),
            DataSourceKind::AvailabilityDomains
        );
        assert!(matches!(
            ResourceKind::from_type_name("oci_identity_availability_domains"),
            Err(ProviderError::UnknownResourceType(_))
        ));
    }

    #[test]
    fn test_wait_failures_map_to_provider_errors() {
        let timeout = wait_failure(
            "oci_identity_user",
            "ocid1.user.oc1..a",
            "create",
            &WaitTarget::STABLE,
            WaitError::Timeout {
                last_state: Some(LifecycleState::Creating),
                waited: Duration::from_secs(3),
            },
        );
        assert!(timeout.is_timeout());
        assert!(timeout.to_string().contains("ACTIVE|INACTIVE"));

        let exhausted = wait_failure(
            "oci_identity_user",
            "ocid1.user.oc1..a",
            "delete",
            &WaitTarget::GONE,
            WaitError::RetriesExhausted {
                attempts: 6,
                source: ClientError::transient("connection reset"),
            },
        );
        assert!(exhausted.is_remote_rejected());

        let failed = wait_failure(
            "oci_identity_group",
            "ocid1.group.oc1..g",
            "create",
            &WaitTarget::STABLE,
            WaitError::UnexpectedState {
                state: LifecycleState::Failed,
            },
        );
        assert!(failed.to_string().contains("FAILED"));
    }

    #[test]
    fn test_observed_attributes_omit_missing_inactive_state() {
        let created = DateTime::parse_from_rfc3339("2017-05-02T16:28:12.123Z")
            .unwrap()
            .with_timezone(&Utc);
        let data = observed_attributes(
            "ocid1.user.oc1..a",
            "ocid1.tenancy.oc1..t",
            LifecycleState::Active,
            None,
            &created,
        );
        assert_eq!(data.get_str("time_created").unwrap(), Some("2017-05-02T16:28:12.123Z"));
        assert!(!data.contains("inactive_state"));
    }
}
