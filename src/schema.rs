//! Attribute schemas for the served resource types.
//!
//! Each resource type declares which attributes are required, which the
//! service computes, and whether a change can be applied in place. The
//! schema drives both validation of desired state and the plan: a change
//! to an [`Mutability::Immutable`] attribute forces a replacement.

use crate::error::{ValidationError, ValidationResult};
use crate::resource_data::ResourceData;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Attribute mutability characteristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Mutability {
    /// Set by the service, never by the user.
    ReadOnly,
    /// Can be changed in place.
    ReadWrite,
    /// Set at creation; changing it means destroy and recreate.
    Immutable,
}

/// Definition of one attribute.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct AttributeSchema {
    pub name: &'static str,
    pub description: &'static str,
    pub required: bool,
    /// Filled in by the provider or the service when not configured.
    pub computed: bool,
    pub mutability: Mutability,
}

impl AttributeSchema {
    pub const fn required(
        name: &'static str,
        description: &'static str,
        mutability: Mutability,
    ) -> Self {
        Self {
            name,
            description,
            required: true,
            computed: false,
            mutability,
        }
    }

    pub const fn optional_computed(
        name: &'static str,
        description: &'static str,
        mutability: Mutability,
    ) -> Self {
        Self {
            name,
            description,
            required: false,
            computed: true,
            mutability,
        }
    }

    pub const fn computed(name: &'static str, description: &'static str) -> Self {
        Self {
            name,
            description,
            required: false,
            computed: true,
            mutability: Mutability::ReadOnly,
        }
    }

    pub fn is_settable(&self) -> bool {
        self.mutability != Mutability::ReadOnly
    }
}

/// Schema of one resource or data source type.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub description: &'static str,
    pub attributes: &'static [AttributeSchema],
}

/// Attributes whose desired value differs from the prior state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeDiff {
    /// Changes that can be applied in place.
    pub updated: Vec<String>,
    /// Changes to immutable attributes.
    pub forces_new: Vec<String>,
}

impl AttributeDiff {
    pub fn is_empty(&self) -> bool {
        self.updated.is_empty() && self.forces_new.is_empty()
    }

    pub fn requires_replace(&self) -> bool {
        !self.forces_new.is_empty()
    }
}

impl ResourceSchema {
    pub fn attribute(&self, name: &str) -> Option<&'static AttributeSchema> {
        self.attributes.iter().find(|attr| attr.name == name)
    }

    /// Check desired state before it is sent anywhere.
    ///
    /// Rejects unknown and read-only attributes, missing or blank required
    /// ones, and non-string values (every attribute a user can set here is a
    /// string).
    pub fn validate(&self, desired: &ResourceData) -> ValidationResult<()> {
        for key in desired.keys() {
            let attr = self
                .attribute(key)
                .ok_or_else(|| ValidationError::UnknownAttribute {
                    resource_type: self.type_name.to_string(),
                    attribute: key.to_string(),
                })?;
            if !attr.is_settable() && desired.contains(key) {
                return Err(ValidationError::ComputedAttribute {
                    resource_type: self.type_name.to_string(),
                    attribute: key.to_string(),
                });
            }
        }

        for attr in self.attributes.iter().filter(|attr| attr.is_settable()) {
            if attr.required {
                desired.require_str(self.type_name, attr.name)?;
            } else {
                desired.get_str(attr.name)?;
            }
        }
        Ok(())
    }

    /// Compare desired attributes with what the prior state recorded.
    ///
    /// An optional computed attribute left out of the desired state, or set
    /// to a blank string, keeps whatever value was computed before and is
    /// not a change.
    pub fn diff(&self, prior: &ResourceData, desired: &ResourceData) -> AttributeDiff {
        let mut diff = AttributeDiff::default();
        for attr in self.attributes.iter().filter(|attr| attr.is_settable()) {
            let wanted = desired
                .get(attr.name)
                .filter(|value| !(attr.computed && is_blank(value)));
            let changed = match wanted {
                None if attr.computed => false,
                None => prior.get(attr.name).is_some(),
                Some(value) => prior.get(attr.name) != Some(value),
            };
            if !changed {
                continue;
            }
            match attr.mutability {
                Mutability::Immutable => diff.forces_new.push(attr.name.to_string()),
                _ => diff.updated.push(attr.name.to_string()),
            }
        }
        diff
    }
}

fn is_blank(value: &Value) -> bool {
    value.as_str().is_some_and(|s| s.trim().is_empty())
}

const COMMON_COMPUTED: [AttributeSchema; 4] = [
    AttributeSchema::computed("id", "OCID assigned by the service"),
    AttributeSchema::computed("state", "Lifecycle state reported by the service"),
    AttributeSchema::computed("time_created", "Creation time, RFC 3339"),
    AttributeSchema::computed("inactive_state", "Reason code while INACTIVE"),
];

pub const USER_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "oci_identity_user",
    description: "An identity user in the tenancy",
    attributes: &[
        AttributeSchema::required("name", "Unique user name", Mutability::Immutable),
        AttributeSchema::required("description", "Free-form description", Mutability::ReadWrite),
        AttributeSchema::optional_computed(
            "compartment_id",
            "Compartment holding the user, the tenancy when unset",
            Mutability::Immutable,
        ),
        COMMON_COMPUTED[0],
        COMMON_COMPUTED[1],
        COMMON_COMPUTED[2],
        COMMON_COMPUTED[3],
    ],
};

pub const GROUP_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "oci_identity_group",
    description: "An identity group in the tenancy",
    attributes: &[
        AttributeSchema::required("name", "Unique group name", Mutability::Immutable),
        AttributeSchema::required("description", "Free-form description", Mutability::ReadWrite),
        AttributeSchema::optional_computed(
            "compartment_id",
            "Compartment holding the group, the tenancy when unset",
            Mutability::Immutable,
        ),
        COMMON_COMPUTED[0],
        COMMON_COMPUTED[1],
        COMMON_COMPUTED[2],
        COMMON_COMPUTED[3],
    ],
};

pub const USER_GROUP_MEMBERSHIP_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "oci_identity_user_group_membership",
    description: "Membership of one user in one group",
    attributes: &[
        AttributeSchema::required("user_id", "OCID of the member user", Mutability::Immutable),
        AttributeSchema::required("group_id", "OCID of the group", Mutability::Immutable),
        AttributeSchema::optional_computed(
            "compartment_id",
            "Compartment of the membership, the tenancy when unset",
            Mutability::Immutable,
        ),
        COMMON_COMPUTED[0],
        COMMON_COMPUTED[1],
        COMMON_COMPUTED[2],
        COMMON_COMPUTED[3],
    ],
};

pub const AVAILABILITY_DOMAINS_SCHEMA: ResourceSchema = ResourceSchema {
    type_name: "oci_identity_availability_domains",
    description: "Availability domains visible to a compartment",
    attributes: &[
        AttributeSchema::required(
            "compartment_id",
            "Compartment to list availability domains for",
            Mutability::ReadWrite,
        ),
        AttributeSchema::computed("id", "Digest of the listing"),
        AttributeSchema::computed(
            "availability_domains",
            "Ordered list of {name, compartment_id} blocks",
        ),
    ],
};
