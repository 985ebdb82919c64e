//! In-memory identity service.
//!
//! A thread-safe simulation of the identity service that implements
//! [`IdentityClient`]. Tests and local development use it in place of the
//! real service.
//!
//! # Features
//!
//! * OCID-shaped identifiers and `time_created` stamps
//! * Entity tags that change on every update, checked against `if_match`
//! * Objects that report `CREATING`/`DELETING` for a configurable number
//!   of reads before settling
//! * Fault injection: transient failures and rejections per operation, and
//!   provisioning or updates that end in `FAILED`
//! * Call statistics, so tests can assert which requests were sent
//!
//! # Example Usage
//!
//! ```rust
//! use oci_identity_provider::client::{
//!     IdentityClient, InMemoryClientOptions, InMemoryIdentityClient,
//! };
//! use oci_identity_provider::lifecycle::LifecycleState;
//! use oci_identity_provider::model::CreateGroupDetails;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InMemoryIdentityClient::with_options(
//!     InMemoryClientOptions::default().with_creating_reads(1),
//! );
//! let group = client
//!     .create_group(CreateGroupDetails {
//!         compartment_id: "ocid1.tenancy.oc1..aaaa".to_string(),
//!         name: "-tf-group".to_string(),
//!         description: "automated test group".to_string(),
//!     })
//!     .await?;
//! assert_eq!(group.lifecycle_state, LifecycleState::Creating);
//!
//! // The first read still reports CREATING, the second one ACTIVE.
//! client.get_group(&group.id).await?;
//! let settled = client.get_group(&group.id).await?;
//! assert_eq!(settled.lifecycle_state, LifecycleState::Active);
//! # Ok(())
//! # }
//! ```

use crate::client::{ClientError, ClientResult, IdentityClient};
use crate::fingerprint::Fingerprint;
use crate::lifecycle::LifecycleState;
use crate::model::{
    AddUserToGroupDetails, AvailabilityDomain, CreateGroupDetails, CreateUserDetails, Group,
    UpdateGroupDetails, UpdateUserDetails, User, UserGroupMembership,
};
use chrono::Utc;
use log::{debug, trace};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// Behavior knobs for the simulated service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InMemoryClientOptions {
    /// Reads for which a new object still reports `CREATING`.
    pub creating_reads: u32,
    /// Reads for which a deleted object still reports `DELETING`.
    pub deleting_reads: u32,
    /// Region key used in generated availability domain names.
    pub region_key: String,
    /// Number of availability domains per compartment.
    pub availability_domain_count: usize,
}

impl Default for InMemoryClientOptions {
    fn default() -> Self {
        Self {
            creating_reads: 0,
            deleting_reads: 0,
            region_key: "PHX".to_string(),
            availability_domain_count: 3,
        }
    }
}

impl InMemoryClientOptions {
    pub fn with_creating_reads(mut self, reads: u32) -> Self {
        self.creating_reads = reads;
        self
    }

    pub fn with_deleting_reads(mut self, reads: u32) -> Self {
        self.deleting_reads = reads;
        self
    }

    pub fn with_region_key(mut self, region_key: impl Into<String>) -> Self {
        self.region_key = region_key.into();
        self
    }

    pub fn with_availability_domain_count(mut self, count: usize) -> Self {
        self.availability_domain_count = count;
        self
    }
}

/// Counts of requests the service has answered, faults included.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InMemoryClientStats {
    pub creates: usize,
    pub reads: usize,
    pub updates: usize,
    pub deletes: usize,
    pub lists: usize,
    pub faults: usize,
}

/// Common access to the three entity kinds the service stores.
trait StoredEntity: Clone {
    fn id(&self) -> &str;
    fn state(&self) -> LifecycleState;
    fn set_state(&mut self, state: LifecycleState);
    fn set_etag(&mut self, etag: String);
}

macro_rules! stored_entity {
    ($($ty:ty),*) => {
        $(impl StoredEntity for $ty {
            fn id(&self) -> &str {
                &self.id
            }

            fn state(&self) -> LifecycleState {
                self.lifecycle_state
            }

            fn set_state(&mut self, state: LifecycleState) {
                self.lifecycle_state = state;
            }

            fn set_etag(&mut self, etag: String) {
                self.etag = Some(etag);
            }
        })*
    };
}

stored_entity!(User, Group, UserGroupMembership);

struct Entry<T> {
    object: T,
    pending_reads: u32,
    settle_to: LifecycleState,
    revision: u64,
}

impl<T: StoredEntity> Entry<T> {
    fn new(mut object: T, pending_reads: u32, settle_to: LifecycleState) -> Self {
        let initial = if pending_reads > 0 {
            LifecycleState::Creating
        } else {
            settle_to
        };
        object.set_state(initial);
        let mut entry = Self {
            object,
            pending_reads,
            settle_to,
            revision: 0,
        };
        entry.bump_revision();
        entry
    }

    fn bump_revision(&mut self) {
        self.revision += 1;
        let tag = format!("{}:{}", self.object.id(), self.revision);
        self.object
            .set_etag(Fingerprint::from_content(tag.as_bytes()).to_string());
    }

    /// Advance a pending object by one read.
    fn observe(&mut self) -> T {
        if self.object.state().is_pending() {
            if self.pending_reads > 0 {
                self.pending_reads -= 1;
            } else {
                self.object.set_state(self.settle_to);
            }
        }
        self.object.clone()
    }

    fn is_live(&self) -> bool {
        !matches!(
            self.object.state(),
            LifecycleState::Deleted | LifecycleState::Deleting
        )
    }

    fn check_etag(&self, if_match: Option<&str>) -> ClientResult<()> {
        let current = Fingerprint::from_content(
            format!("{}:{}", self.object.id(), self.revision).as_bytes(),
        );
        match if_match {
            Some(expected) if expected != current.as_str() => Err(ClientError::service(
                412,
                "NoEtagMatch",
                format!(
                    "etag '{}' does not match current '{}'",
                    expected,
                    current.as_str()
                ),
            )),
            _ => Ok(()),
        }
    }

    fn begin_delete(&mut self, deleting_reads: u32) {
        self.settle_to = LifecycleState::Deleted;
        if deleting_reads > 0 {
            self.pending_reads = deleting_reads;
            self.object.set_state(LifecycleState::Deleting);
        } else {
            self.object.set_state(LifecycleState::Deleted);
        }
        self.bump_revision();
    }
}

#[derive(Default)]
struct Faults {
    transient: HashMap<String, u32>,
    rejections: HashMap<String, ClientError>,
    failed_provisioning: u32,
    failed_updates: u32,
}

#[derive(Default)]
struct Tables {
    users: HashMap<String, Entry<User>>,
    groups: HashMap<String, Entry<Group>>,
    memberships: HashMap<String, Entry<UserGroupMembership>>,
    availability_domains: HashMap<String, Vec<String>>,
    faults: Faults,
    stats: InMemoryClientStats,
}

impl Tables {
    /// Apply any fault registered for `operation`.
    fn check_faults(&mut self, operation: &str) -> ClientResult<()> {
        if let Some(remaining) = self.faults.transient.get_mut(operation) {
            if *remaining > 0 {
                *remaining -= 1;
                self.stats.faults += 1;
                trace!("injected transient failure for {}", operation);
                return Err(ClientError::transient(format!(
                    "simulated connection reset during {}",
                    operation
                )));
            }
        }
        if let Some(error) = self.faults.rejections.get(operation) {
            self.stats.faults += 1;
            return Err(error.clone());
        }
        Ok(())
    }

    /// Lifecycle state a newly created object settles into.
    fn provisioning_outcome(&mut self) -> LifecycleState {
        if self.faults.failed_provisioning > 0 {
            self.faults.failed_provisioning -= 1;
            LifecycleState::Failed
        } else {
            LifecycleState::Active
        }
    }

    fn has_live_membership(&self, predicate: impl Fn(&UserGroupMembership) -> bool) -> bool {
        self.memberships
            .values()
            .any(|entry| entry.is_live() && predicate(&entry.object))
    }
}

/// Simulated identity service.
///
/// Cloning is cheap and every clone shares the same tables, so a test can
/// keep one handle for inspection while the provider owns another.
#[derive(Clone)]
pub struct InMemoryIdentityClient {
    tables: Arc<RwLock<Tables>>,
    options: InMemoryClientOptions,
}

impl InMemoryIdentityClient {
    pub fn new() -> Self {
        Self::with_options(InMemoryClientOptions::default())
    }

    pub fn with_options(options: InMemoryClientOptions) -> Self {
        Self {
            tables: Arc::new(RwLock::new(Tables::default())),
            options,
        }
    }

    pub fn options(&self) -> &InMemoryClientOptions {
        &self.options
    }

    /// Make the next `count` calls of `operation` fail transiently.
    pub async fn inject_transient_failures(&self, operation: &str, count: u32) {
        let mut tables = self.tables.write().await;
        tables.faults.transient.insert(operation.to_string(), count);
    }

    /// Reject every call of `operation` with a service error until cleared.
    pub async fn reject_operation(
        &self,
        operation: &str,
        status: u16,
        code: &str,
        message: &str,
    ) {
        let mut tables = self.tables.write().await;
        tables.faults.rejections.insert(
            operation.to_string(),
            ClientError::service(status, code, message),
        );
    }

    /// Make the next `count` created objects end up `FAILED`.
    pub async fn fail_next_provisioning(&self, count: u32) {
        let mut tables = self.tables.write().await;
        tables.faults.failed_provisioning = count;
    }

    /// Make the next `count` accepted updates leave their object `FAILED`.
    pub async fn fail_next_update(&self, count: u32) {
        let mut tables = self.tables.write().await;
        tables.faults.failed_updates = count;
    }

    pub async fn clear_faults(&self) {
        let mut tables = self.tables.write().await;
        tables.faults = Faults::default();
    }

    /// Replace the availability domain catalogue of one compartment.
    pub async fn set_availability_domains(&self, compartment_id: &str, names: Vec<String>) {
        let mut tables = self.tables.write().await;
        tables
            .availability_domains
            .insert(compartment_id.to_string(), names);
    }

    /// Move an object to `state` as if the service did it on its own.
    ///
    /// Returns `false` when no object has that identifier.
    pub async fn set_lifecycle_state(&self, id: &str, state: LifecycleState) -> bool {
        let mut tables = self.tables.write().await;
        if let Some(entry) = tables.users.get_mut(id) {
            entry.object.lifecycle_state = state;
            entry.object.inactive_status = (state == LifecycleState::Inactive).then_some(4);
            return true;
        }
        if let Some(entry) = tables.groups.get_mut(id) {
            entry.object.lifecycle_state = state;
            entry.object.inactive_status = (state == LifecycleState::Inactive).then_some(4);
            return true;
        }
        if let Some(entry) = tables.memberships.get_mut(id) {
            entry.object.lifecycle_state = state;
            return true;
        }
        false
    }

    pub async fn stats(&self) -> InMemoryClientStats {
        self.tables.read().await.stats.clone()
    }

    /// Number of users, groups and memberships that are not deleted.
    pub async fn live_object_count(&self) -> usize {
        let tables = self.tables.read().await;
        tables.users.values().filter(|e| e.is_live()).count()
            + tables.groups.values().filter(|e| e.is_live()).count()
            + tables.memberships.values().filter(|e| e.is_live()).count()
    }

    fn generate_id(kind: &str) -> String {
        format!("ocid1.{}.oc1..{}", kind, Uuid::new_v4().simple())
    }

    fn default_availability_domains(&self) -> Vec<String> {
        (1..=self.options.availability_domain_count)
            .map(|n| format!("Uocm:{}-AD-{}", self.options.region_key, n))
            .collect()
    }
}

impl Default for InMemoryIdentityClient {
    fn default() -> Self {
        Self::new()
    }
}

fn require_non_empty(field: &str, value: &str) -> ClientResult<()> {
    if value.trim().is_empty() {
        return Err(ClientError::service(
            400,
            "MissingParameter",
            format!("'{}' must not be empty", field),
        ));
    }
    Ok(())
}

fn incorrect_state(entity: &str, id: &str, state: LifecycleState) -> ClientError {
    ClientError::service(
        409,
        "IncorrectState",
        format!("{} '{}' is {}", entity, id, state),
    )
}

impl IdentityClient for InMemoryIdentityClient {
    async fn create_user(&self, details: CreateUserDetails) -> ClientResult<User> {
        let mut tables = self.tables.write().await;
        tables.stats.creates += 1;
        tables.check_faults("create_user")?;
        require_non_empty("compartmentId", &details.compartment_id)?;
        require_non_empty("name", &details.name)?;

        let duplicate = tables.users.values().any(|entry| {
            entry.is_live()
                && entry.object.compartment_id == details.compartment_id
                && entry.object.name == details.name
        });
        if duplicate {
            return Err(ClientError::service(
                409,
                "Conflict",
                format!("user '{}' already exists", details.name),
            ));
        }

        let settle_to = tables.provisioning_outcome();
        let user = User {
            id: Self::generate_id("user"),
            compartment_id: details.compartment_id,
            name: details.name,
            description: details.description,
            lifecycle_state: LifecycleState::Creating,
            inactive_status: None,
            time_created: Utc::now(),
            etag: None,
        };
        let entry = Entry::new(user, self.options.creating_reads, settle_to);
        let created = entry.object.clone();
        debug!("created user '{}' ({})", created.name, created.id);
        tables.users.insert(created.id.clone(), entry);
        Ok(created)
    }

    async fn get_user(&self, user_id: &str) -> ClientResult<User> {
        let mut tables = self.tables.write().await;
        tables.stats.reads += 1;
        tables.check_faults("get_user")?;
        tables
            .users
            .get_mut(user_id)
            .map(Entry::observe)
            .ok_or_else(|| ClientError::not_found("User", user_id))
    }

    async fn update_user(
        &self,
        user_id: &str,
        details: UpdateUserDetails,
        if_match: Option<&str>,
    ) -> ClientResult<User> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        tables.stats.updates += 1;
        tables.check_faults("update_user")?;
        let entry = tables
            .users
            .get_mut(user_id)
            .filter(|entry| entry.is_live())
            .ok_or_else(|| ClientError::not_found("User", user_id))?;
        entry.check_etag(if_match)?;
        if !entry.object.lifecycle_state.is_stable() {
            return Err(incorrect_state("user", user_id, entry.object.lifecycle_state));
        }
        if let Some(description) = details.description {
            entry.object.description = description;
        }
        entry.bump_revision();
        if tables.faults.failed_updates > 0 {
            tables.faults.failed_updates -= 1;
            entry.object.set_state(LifecycleState::Failed);
        }
        debug!("updated user {}", user_id);
        Ok(entry.object.clone())
    }

    async fn delete_user(&self, user_id: &str, if_match: Option<&str>) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        tables.stats.deletes += 1;
        tables.check_faults("delete_user")?;
        if tables.has_live_membership(|m| m.user_id == user_id) {
            return Err(ClientError::service(
                409,
                "IncorrectState",
                format!("user '{}' still belongs to one or more groups", user_id),
            ));
        }
        let deleting_reads = self.options.deleting_reads;
        let entry = tables
            .users
            .get_mut(user_id)
            .filter(|entry| entry.object.lifecycle_state != LifecycleState::Deleted)
            .ok_or_else(|| ClientError::not_found("User", user_id))?;
        entry.check_etag(if_match)?;
        if entry.object.lifecycle_state == LifecycleState::Deleting {
            return Err(incorrect_state("user", user_id, entry.object.lifecycle_state));
        }
        entry.begin_delete(deleting_reads);
        debug!("deleting user {}", user_id);
        Ok(())
    }

    async fn create_group(&self, details: CreateGroupDetails) -> ClientResult<Group> {
        let mut tables = self.tables.write().await;
        tables.stats.creates += 1;
        tables.check_faults("create_group")?;
        require_non_empty("compartmentId", &details.compartment_id)?;
        require_non_empty("name", &details.name)?;

        let duplicate = tables.groups.values().any(|entry| {
            entry.is_live()
                && entry.object.compartment_id == details.compartment_id
                && entry.object.name == details.name
        });
        if duplicate {
            return Err(ClientError::service(
                409,
                "Conflict",
                format!("group '{}' already exists", details.name),
            ));
        }

        let settle_to = tables.provisioning_outcome();
        let group = Group {
            id: Self::generate_id("group"),
            compartment_id: details.compartment_id,
            name: details.name,
            description: details.description,
            lifecycle_state: LifecycleState::Creating,
            inactive_status: None,
            time_created: Utc::now(),
            etag: None,
        };
        let entry = Entry::new(group, self.options.creating_reads, settle_to);
        let created = entry.object.clone();
        debug!("created group '{}' ({})", created.name, created.id);
        tables.groups.insert(created.id.clone(), entry);
        Ok(created)
    }

    async fn get_group(&self, group_id: &str) -> ClientResult<Group> {
        let mut tables = self.tables.write().await;
        tables.stats.reads += 1;
        tables.check_faults("get_group")?;
        tables
            .groups
            .get_mut(group_id)
            .map(Entry::observe)
            .ok_or_else(|| ClientError::not_found("Group", group_id))
    }

    async fn update_group(
        &self,
        group_id: &str,
        details: UpdateGroupDetails,
        if_match: Option<&str>,
    ) -> ClientResult<Group> {
        let mut guard = self.tables.write().await;
        let tables = &mut *guard;
        tables.stats.updates += 1;
        tables.check_faults("update_group")?;
        let entry = tables
            .groups
            .get_mut(group_id)
            .filter(|entry| entry.is_live())
            .ok_or_else(|| ClientError::not_found("Group", group_id))?;
        entry.check_etag(if_match)?;
        if !entry.object.lifecycle_state.is_stable() {
            return Err(incorrect_state("group", group_id, entry.object.lifecycle_state));
        }
        if let Some(description) = details.description {
            entry.object.description = description;
        }
        entry.bump_revision();
        if tables.faults.failed_updates > 0 {
            tables.faults.failed_updates -= 1;
            entry.object.set_state(LifecycleState::Failed);
        }
        debug!("updated group {}", group_id);
        Ok(entry.object.clone())
    }

    async fn delete_group(&self, group_id: &str, if_match: Option<&str>) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        tables.stats.deletes += 1;
        tables.check_faults("delete_group")?;
        if tables.has_live_membership(|m| m.group_id == group_id) {
            return Err(ClientError::service(
                409,
                "IncorrectState",
                format!("group '{}' still has members", group_id),
            ));
        }
        let deleting_reads = self.options.deleting_reads;
        let entry = tables
            .groups
            .get_mut(group_id)
            .filter(|entry| entry.object.lifecycle_state != LifecycleState::Deleted)
            .ok_or_else(|| ClientError::not_found("Group", group_id))?;
        entry.check_etag(if_match)?;
        if entry.object.lifecycle_state == LifecycleState::Deleting {
            return Err(incorrect_state("group", group_id, entry.object.lifecycle_state));
        }
        entry.begin_delete(deleting_reads);
        debug!("deleting group {}", group_id);
        Ok(())
    }

    async fn add_user_to_group(
        &self,
        details: AddUserToGroupDetails,
    ) -> ClientResult<UserGroupMembership> {
        let mut tables = self.tables.write().await;
        tables.stats.creates += 1;
        tables.check_faults("add_user_to_group")?;
        require_non_empty("compartmentId", &details.compartment_id)?;

        let user_ok = tables
            .users
            .get(&details.user_id)
            .is_some_and(|entry| entry.object.lifecycle_state.is_stable());
        let group_ok = tables
            .groups
            .get(&details.group_id)
            .is_some_and(|entry| entry.object.lifecycle_state.is_stable());
        if !user_ok || !group_ok {
            return Err(ClientError::service(
                400,
                "InvalidParameter",
                format!(
                    "user '{}' and group '{}' must both exist",
                    details.user_id, details.group_id
                ),
            ));
        }
        if tables.has_live_membership(|m| {
            m.user_id == details.user_id && m.group_id == details.group_id
        }) {
            return Err(ClientError::service(
                409,
                "Conflict",
                format!(
                    "user '{}' is already a member of group '{}'",
                    details.user_id, details.group_id
                ),
            ));
        }

        let settle_to = tables.provisioning_outcome();
        let membership = UserGroupMembership {
            id: Self::generate_id("groupmembership"),
            compartment_id: details.compartment_id,
            user_id: details.user_id,
            group_id: details.group_id,
            lifecycle_state: LifecycleState::Creating,
            inactive_status: None,
            time_created: Utc::now(),
            etag: None,
        };
        let entry = Entry::new(membership, self.options.creating_reads, settle_to);
        let created = entry.object.clone();
        debug!(
            "added user {} to group {} ({})",
            created.user_id, created.group_id, created.id
        );
        tables.memberships.insert(created.id.clone(), entry);
        Ok(created)
    }

    async fn get_user_group_membership(
        &self,
        membership_id: &str,
    ) -> ClientResult<UserGroupMembership> {
        let mut tables = self.tables.write().await;
        tables.stats.reads += 1;
        tables.check_faults("get_user_group_membership")?;
        tables
            .memberships
            .get_mut(membership_id)
            .map(Entry::observe)
            .ok_or_else(|| ClientError::not_found("UserGroupMembership", membership_id))
    }

    async fn remove_user_from_group(
        &self,
        membership_id: &str,
        if_match: Option<&str>,
    ) -> ClientResult<()> {
        let mut tables = self.tables.write().await;
        tables.stats.deletes += 1;
        tables.check_faults("remove_user_from_group")?;
        let deleting_reads = self.options.deleting_reads;
        let entry = tables
            .memberships
            .get_mut(membership_id)
            .filter(|entry| entry.object.lifecycle_state != LifecycleState::Deleted)
            .ok_or_else(|| ClientError::not_found("UserGroupMembership", membership_id))?;
        entry.check_etag(if_match)?;
        if entry.object.lifecycle_state == LifecycleState::Deleting {
            return Err(incorrect_state(
                "membership",
                membership_id,
                entry.object.lifecycle_state,
            ));
        }
        entry.begin_delete(deleting_reads);
        debug!("removing membership {}", membership_id);
        Ok(())
    }

    async fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> ClientResult<Vec<AvailabilityDomain>> {
        let mut tables = self.tables.write().await;
        tables.stats.lists += 1;
        tables.check_faults("list_availability_domains")?;
        require_non_empty("compartmentId", compartment_id)?;

        let names = tables
            .availability_domains
            .get(compartment_id)
            .cloned()
            .unwrap_or_else(|| self.default_availability_domains());
        Ok(names
            .into_iter()
            .map(|name| AvailabilityDomain {
                name,
                compartment_id: compartment_id.to_string(),
            })
            .collect())
    }
}
