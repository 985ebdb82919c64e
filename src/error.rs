//! Error types for identity provider operations.
//!
//! [`ProviderError`] is what the owning engine sees. It separates the four
//! lifecycle outcomes callers must react to differently (not found,
//! conflict, timeout, remote rejection) from local problems with the
//! desired state or configuration.

use crate::client::ClientError;
use crate::lifecycle::{InstancePhase, LifecycleState};
use crate::resource_data::ResourceState;
use std::time::Duration;

/// Main error type for resource lifecycle operations.
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// The remote object does not exist.
    ///
    /// Delete treats this as success and read reports it as `Ok(None)`, so
    /// it only surfaces from operations that require the object (import).
    #[error("{resource_type} '{id}' not found")]
    NotFound { resource_type: String, id: String },

    /// An update tried to change attributes that can only be set at creation.
    #[error(
        "Cannot update immutable attribute(s) {attributes:?} of {resource_type} '{id}' in place; the resource must be replaced"
    )]
    Conflict {
        resource_type: String,
        id: String,
        attributes: Vec<String>,
    },

    /// The remote object did not reach a stable state within the bound.
    #[error(
        "Timed out after {waited:?} waiting for {resource_type} '{id}' to become {target} (last observed state: {})",
        state_label(.last_state)
    )]
    Timeout {
        resource_type: String,
        id: String,
        target: String,
        last_state: Option<LifecycleState>,
        waited: Duration,
    },

    /// The remote service refused the operation or the object entered a
    /// failed state.
    #[error("Remote service rejected {operation} of {resource_type}: {message}")]
    RemoteRejected {
        resource_type: String,
        operation: String,
        message: String,
        #[source]
        source: Option<ClientError>,
    },

    /// Desired state does not satisfy the resource schema.
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),

    /// Resource or data source type name is not served by this provider.
    #[error("Unsupported resource type: {0}")]
    UnknownResourceType(String),

    /// Provider configuration is missing or malformed.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A lifecycle move the instance state machine does not allow.
    #[error("Invalid lifecycle transition for {resource_type} '{id}': {from} -> {to}")]
    InvalidTransition {
        resource_type: String,
        id: String,
        from: InstancePhase,
        to: InstancePhase,
    },

    /// The service assigned an identifier but the object never became
    /// usable.
    ///
    /// `state` is the instance in the `Failed` phase. Recording it lets the
    /// next apply delete the object and create a fresh one instead of
    /// colliding with it.
    #[error("{} '{}' is tainted: {source}", .state.type_name, .state.id)]
    Tainted {
        state: Box<ResourceState>,
        #[source]
        source: Box<ProviderError>,
    },

    #[error("Internal provider error: {message}")]
    Internal { message: String },
}

/// Errors found while checking desired state against a resource schema.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{resource_type}: required attribute '{attribute}' is missing")]
    MissingRequiredAttribute {
        resource_type: String,
        attribute: String,
    },

    #[error("{resource_type}: attribute '{attribute}' cannot be empty")]
    EmptyAttribute {
        resource_type: String,
        attribute: String,
    },

    #[error("Attribute '{attribute}' has invalid type, expected {expected}, got {actual}")]
    InvalidAttributeType {
        attribute: String,
        expected: String,
        actual: String,
    },

    #[error("{resource_type}: unknown attribute '{attribute}'")]
    UnknownAttribute {
        resource_type: String,
        attribute: String,
    },

    #[error("{resource_type}: attribute '{attribute}' is computed and cannot be set")]
    ComputedAttribute {
        resource_type: String,
        attribute: String,
    },

    #[error("Attribute '{attribute}' has invalid value '{value}', allowed values: {allowed:?}")]
    InvalidValue {
        attribute: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Resource data must be a JSON object, got {actual}")]
    NotAnObject { actual: String },

    #[error("State belongs to '{actual}' but '{expected}' was requested")]
    TypeMismatch { expected: String, actual: String },
}

/// Errors raised while loading or validating provider configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration value '{field}'")]
    MissingValue { field: String },

    #[error("Configuration value '{field}' is invalid: {message}")]
    InvalidValue { field: String, message: String },

    #[error("Failed to read configuration file '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

fn state_label(state: &Option<LifecycleState>) -> &'static str {
    state.map(|s| s.as_str()).unwrap_or("unknown")
}

impl ProviderError {
    pub fn not_found(resource_type: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            resource_type: resource_type.into(),
            id: id.into(),
        }
    }

    /// Wrap a client error that the adapter cannot recover from.
    pub fn rejected(
        resource_type: impl Into<String>,
        operation: impl Into<String>,
        source: ClientError,
    ) -> Self {
        Self::RemoteRejected {
            resource_type: resource_type.into(),
            operation: operation.into(),
            message: source.to_string(),
            source: Some(source),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Attach the failed instance to `source`.
    pub fn tainted(state: ResourceState, source: ProviderError) -> Self {
        Self::Tainted {
            state: Box::new(state),
            source: Box::new(source),
        }
    }

    /// Instance left behind by a failed operation, if any.
    pub fn tainted_state(&self) -> Option<&ResourceState> {
        match self {
            Self::Tainted { state, .. } => Some(&**state),
            _ => None,
        }
    }

    /// The underlying failure, looking through [`ProviderError::Tainted`].
    pub fn cause(&self) -> &ProviderError {
        match self {
            Self::Tainted { source, .. } => source.cause(),
            other => other,
        }
    }

    pub fn into_cause(self) -> ProviderError {
        match self {
            Self::Tainted { source, .. } => (*source).into_cause(),
            other => other,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self.cause(), Self::NotFound { .. })
    }

    pub fn is_conflict(&self) -> bool {
        matches!(self.cause(), Self::Conflict { .. })
    }

    pub fn is_timeout(&self) -> bool {
        matches!(self.cause(), Self::Timeout { .. })
    }

    pub fn is_remote_rejected(&self) -> bool {
        matches!(self.cause(), Self::RemoteRejected { .. })
    }
}

impl ValidationError {
    pub fn missing_required(resource_type: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingRequiredAttribute {
            resource_type: resource_type.into(),
            attribute: attribute.into(),
        }
    }

    pub fn invalid_type(
        attribute: impl Into<String>,
        expected: impl Into<String>,
        actual: impl Into<String>,
    ) -> Self {
        Self::InvalidAttributeType {
            attribute: attribute.into(),
            expected: expected.into(),
            actual: actual.into(),
        }
    }
}

impl ConfigError {
    pub fn missing(field: impl Into<String>) -> Self {
        Self::MissingValue {
            field: field.into(),
        }
    }

    pub fn invalid(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            message: message.into(),
        }
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;
pub type ValidationResult<T> = Result<T, ValidationError>;
pub type ConfigResult<T> = Result<T, ConfigError>;
