//! Identity entities as the service reports them, and the request bodies
//! used to create and update them.

use crate::lifecycle::{HasLifecycleState, LifecycleState};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// An identity user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub compartment_id: String,
    pub name: String,
    pub description: String,
    pub lifecycle_state: LifecycleState,
    /// Reason code while the user is `INACTIVE`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive_status: Option<i64>,
    pub time_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// An identity group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Group {
    pub id: String,
    pub compartment_id: String,
    pub name: String,
    pub description: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive_status: Option<i64>,
    pub time_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

/// Binding of one user to one group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserGroupMembership {
    pub id: String,
    pub compartment_id: String,
    pub user_id: String,
    pub group_id: String,
    pub lifecycle_state: LifecycleState,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inactive_status: Option<i64>,
    pub time_created: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvailabilityDomain {
    pub name: String,
    pub compartment_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserDetails {
    pub compartment_id: String,
    pub name: String,
    pub description: String,
}

/// Only the description of a user can change after creation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUserDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateGroupDetails {
    pub compartment_id: String,
    pub name: String,
    pub description: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateGroupDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserToGroupDetails {
    pub compartment_id: String,
    pub user_id: String,
    pub group_id: String,
}

/// Accessors shared by every identity entity.
pub trait IdentityEntity: HasLifecycleState {
    fn id(&self) -> &str;
    fn etag(&self) -> Option<&str>;
}

macro_rules! identity_entity {
    ($($entity:ty),*) => {
        $(
            impl HasLifecycleState for $entity {
                fn lifecycle_state(&self) -> LifecycleState {
                    self.lifecycle_state
                }
            }

            impl IdentityEntity for $entity {
                fn id(&self) -> &str {
                    &self.id
                }

                fn etag(&self) -> Option<&str> {
                    self.etag.as_deref()
                }
            }
        )*
    };
}

identity_entity!(User, Group, UserGroupMembership);
