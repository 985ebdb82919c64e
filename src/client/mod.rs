//! Outbound interface to the identity service.
//!
//! [`IdentityClient`] is the seam between the lifecycle adapter and whatever
//! actually talks to the service: a signed HTTP client in production, or
//! [`InMemoryIdentityClient`] in tests and local development. Authentication
//! is the implementation's concern; the adapter only sees entities and
//! [`ClientError`]s.
//!
//! Every call is a single request. Retrying, polling and interpreting
//! lifecycle states is left to the adapter.
//!
//! ```rust
//! use oci_identity_provider::client::{IdentityClient, InMemoryIdentityClient};
//! use oci_identity_provider::model::CreateUserDetails;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = InMemoryIdentityClient::new();
//! let user = client
//!     .create_user(CreateUserDetails {
//!         compartment_id: "ocid1.tenancy.oc1..aaaa".to_string(),
//!         name: "-tf-user".to_string(),
//!         description: "automated test user".to_string(),
//!     })
//!     .await?;
//! let fetched = client.get_user(&user.id).await?;
//! assert_eq!(fetched.name, "-tf-user");
//! # Ok(())
//! # }
//! ```

pub mod errors;
pub mod in_memory;

pub use errors::{ClientError, ClientResult, ClientResultExt};
pub use in_memory::{InMemoryClientOptions, InMemoryClientStats, InMemoryIdentityClient};

use crate::model::{
    AddUserToGroupDetails, AvailabilityDomain, CreateGroupDetails, CreateUserDetails, Group,
    UpdateGroupDetails, UpdateUserDetails, User, UserGroupMembership,
};
use std::future::Future;

/// Identity service operations used by the lifecycle adapter.
///
/// `if_match` carries the entity tag the caller last saw; implementations
/// reject the call with HTTP 412 when it no longer matches.
pub trait IdentityClient: Send + Sync {
    fn create_user(
        &self,
        details: CreateUserDetails,
    ) -> impl Future<Output = ClientResult<User>> + Send;

    fn get_user(&self, user_id: &str) -> impl Future<Output = ClientResult<User>> + Send;

    fn update_user(
        &self,
        user_id: &str,
        details: UpdateUserDetails,
        if_match: Option<&str>,
    ) -> impl Future<Output = ClientResult<User>> + Send;

    fn delete_user(
        &self,
        user_id: &str,
        if_match: Option<&str>,
    ) -> impl Future<Output = ClientResult<()>> + Send;

    fn create_group(
        &self,
        details: CreateGroupDetails,
    ) -> impl Future<Output = ClientResult<Group>> + Send;

    fn get_group(&self, group_id: &str) -> impl Future<Output = ClientResult<Group>> + Send;

    fn update_group(
        &self,
        group_id: &str,
        details: UpdateGroupDetails,
        if_match: Option<&str>,
    ) -> impl Future<Output = ClientResult<Group>> + Send;

    fn delete_group(
        &self,
        group_id: &str,
        if_match: Option<&str>,
    ) -> impl Future<Output = ClientResult<()>> + Send;

    fn add_user_to_group(
        &self,
        details: AddUserToGroupDetails,
    ) -> impl Future<Output = ClientResult<UserGroupMembership>> + Send;

    fn get_user_group_membership(
        &self,
        membership_id: &str,
    ) -> impl Future<Output = ClientResult<UserGroupMembership>> + Send;

    fn remove_user_from_group(
        &self,
        membership_id: &str,
        if_match: Option<&str>,
    ) -> impl Future<Output = ClientResult<()>> + Send;

    /// Availability domains visible to a compartment, in service order.
    fn list_availability_domains(
        &self,
        compartment_id: &str,
    ) -> impl Future<Output = ClientResult<Vec<AvailabilityDomain>>> + Send;
}
