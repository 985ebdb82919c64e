//! Attribute maps exchanged with the owning engine.
//!
//! [`ResourceData`] is a flat set of top-level attributes with JSON values,
//! the shape a declarative engine hands to a provider. [`ResourceState`] is
//! what the provider hands back after an operation: the attributes plus the
//! identifier, phase, entity tag and fingerprint the engine must keep.

use crate::error::{ValidationError, ValidationResult};
use crate::fingerprint::Fingerprint;
use crate::lifecycle::{InstancePhase, LifecycleState};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;

/// Attribute map of one resource or data source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ResourceData {
    attributes: BTreeMap<String, Value>,
}

impl ResourceData {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON object such as `{"name": "-tf-user", "description": "..."}`.
    pub fn from_json(value: Value) -> ValidationResult<Self> {
        match value {
            Value::Object(map) => Ok(Self {
                attributes: map.into_iter().collect(),
            }),
            other => Err(ValidationError::NotAnObject {
                actual: json_type_name(&other).to_string(),
            }),
        }
    }

    pub fn to_json(&self) -> Value {
        Value::Object(
            self.attributes
                .iter()
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect::<Map<String, Value>>(),
        )
    }

    /// Builder-style setter.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.attributes.remove(key)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key).filter(|value| !value.is_null())
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// String attribute, `None` when absent or null.
    pub fn get_str(&self, key: &str) -> ValidationResult<Option<&str>> {
        match self.get(key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.as_str())),
            Some(other) => Err(ValidationError::invalid_type(
                key,
                "string",
                json_type_name(other),
            )),
        }
    }

    /// String attribute that must be present and non-blank.
    pub fn require_str(&self, resource_type: &str, key: &str) -> ValidationResult<&str> {
        match self.get_str(key)? {
            None => Err(ValidationError::missing_required(resource_type, key)),
            Some(s) if s.trim().is_empty() => Err(ValidationError::EmptyAttribute {
                resource_type: resource_type.to_string(),
                attribute: key.to_string(),
            }),
            Some(s) => Ok(s),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.attributes.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }

    /// Render as a flat map with dotted keys.
    ///
    /// Lists contribute a `<key>.#` count and one entry per element, so
    /// `availability_domains` becomes `availability_domains.#`,
    /// `availability_domains.0.name` and so on. Nulls are omitted.
    pub fn flatten(&self) -> BTreeMap<String, String> {
        let mut flat = BTreeMap::new();
        for (key, value) in &self.attributes {
            flatten_into(&mut flat, key, value);
        }
        flat
    }

    pub fn fingerprint(&self) -> Fingerprint {
        Fingerprint::of_json(&self.to_json())
    }
}

fn flatten_into(flat: &mut BTreeMap<String, String>, prefix: &str, value: &Value) {
    match value {
        Value::Null => {}
        Value::String(s) => {
            flat.insert(prefix.to_string(), s.clone());
        }
        Value::Bool(_) | Value::Number(_) => {
            flat.insert(prefix.to_string(), value.to_string());
        }
        Value::Array(items) => {
            flat.insert(format!("{}.#", prefix), items.len().to_string());
            for (index, item) in items.iter().enumerate() {
                flatten_into(flat, &format!("{}.{}", prefix, index), item);
            }
        }
        Value::Object(map) => {
            for (key, nested) in map {
                flatten_into(flat, &format!("{}.{}", prefix, key), nested);
            }
        }
    }
}

pub(crate) fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// State the engine records for one managed resource instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceState {
    pub type_name: String,
    pub id: String,
    pub phase: InstancePhase,
    pub attributes: ResourceData,
    /// Entity tag last returned by the service, sent back as `if-match`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub etag: Option<String>,
    pub fingerprint: Fingerprint,
}

impl ResourceState {
    pub fn new(
        type_name: impl Into<String>,
        id: impl Into<String>,
        phase: InstancePhase,
        attributes: ResourceData,
        etag: Option<String>,
    ) -> Self {
        let fingerprint = attributes.fingerprint();
        Self {
            type_name: type_name.into(),
            id: id.into(),
            phase,
            attributes,
            etag,
            fingerprint,
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    /// String attribute; absent and non-string values both read as `None`.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).and_then(Value::as_str)
    }

    /// Remote lifecycle state mirrored in the `state` attribute.
    pub fn lifecycle_state(&self) -> Option<LifecycleState> {
        self.get_str("state").and_then(|s| s.parse().ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json_requires_object() {
        assert!(ResourceData::from_json(json!({"name": "-tf-user"})).is_ok());
        let error = ResourceData::from_json(json!(["-tf-user"])).unwrap_err();
        assert!(matches!(error, ValidationError::NotAnObject { .. }));
    }

    #[test]
    fn test_require_str() {
        let data = ResourceData::new()
            .with("name", "-tf-user")
            .with("description", "  ")
            .with("count", 3);

        assert_eq!(data.require_str("oci_identity_user", "name").unwrap(), "-tf-user");
        assert!(matches!(
            data.require_str("oci_identity_user", "description"),
            Err(ValidationError::EmptyAttribute { .. })
        ));
        assert!(matches!(
            data.require_str("oci_identity_user", "compartment_id"),
            Err(ValidationError::MissingRequiredAttribute { .. })
        ));
        assert!(matches!(
            data.require_str("oci_identity_user", "count"),
            Err(ValidationError::InvalidAttributeType { .. })
        ));
    }

    #[test]
    fn test_null_reads_as_absent() {
        let data = ResourceData::new().with("compartment_id", Value::Null);
        assert!(!data.contains("compartment_id"));
        assert_eq!(data.get_str("compartment_id").unwrap(), None);
    }

    #[test]
    fn test_flatten_lists_of_blocks() {
        let data = ResourceData::new().with("compartment_id", "c").with(
            "availability_domains",
            json!([
                {"name": "AD1", "compartment_id": "c"},
                {"name": "AD2", "compartment_id": "c"}
            ]),
        );
        let flat = data.flatten();
        assert_eq!(flat["availability_domains.#"], "2");
        assert_eq!(flat["availability_domains.0.name"], "AD1");
        assert_eq!(flat["availability_domains.1.name"], "AD2");
        assert_eq!(flat["compartment_id"], "c");
    }

    #[test]
    fn test_state_fingerprint_tracks_attributes() {
        let attributes = ResourceData::new().with("state", "ACTIVE");
        let state = ResourceState::new(
            "oci_identity_user",
            "ocid1.user.oc1..a",
            InstancePhase::Active,
            attributes.clone(),
            None,
        );
        assert_eq!(state.fingerprint, attributes.fingerprint());
        assert_eq!(state.lifecycle_state(), Some(LifecycleState::Active));
    }
}
