//! Errors returned by identity service clients.
//!
//! These mirror what the service itself reports: a missing object, a
//! rejected request with an HTTP status and service error code, or a
//! transport-level failure that is worth retrying.

use thiserror::Error;

/// Error returned by an [`IdentityClient`](super::IdentityClient) call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClientError {
    /// The addressed object does not exist (HTTP 404).
    #[error("{entity} '{id}' not found")]
    NotFound { entity: String, id: String },

    /// The service answered with an error status.
    #[error("Service error {status} ({code}): {message}")]
    Service {
        status: u16,
        code: String,
        message: String,
    },

    /// The request never got a definitive answer (connection reset, timeout).
    #[error("Transient failure: {message}")]
    Transient { message: String },
}

impl ClientError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn service(status: u16, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Service {
            status,
            code: code.into(),
            message: message.into(),
        }
    }

    pub fn transient(message: impl Into<String>) -> Self {
        Self::Transient {
            message: message.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Throttling and server-side failures are retried; everything else is final.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transient { .. } => true,
            Self::Service { status, .. } => *status == 429 || *status >= 500,
            Self::NotFound { .. } => false,
        }
    }

    /// HTTP status the error corresponds to, when there is one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::NotFound { .. } => Some(404),
            Self::Service { status, .. } => Some(*status),
            Self::Transient { .. } => None,
        }
    }
}

pub type ClientResult<T> = Result<T, ClientError>;

/// Turn "not found" into `None` for callers that expect absence.
pub trait ClientResultExt<T> {
    fn optional(self) -> ClientResult<Option<T>>;
}

impl<T> ClientResultExt<T> for ClientResult<T> {
    fn optional(self) -> ClientResult<Option<T>> {
        match self {
            Ok(value) => Ok(Some(value)),
            Err(error) if error.is_not_found() => Ok(None),
            Err(error) => Err(error),
        }
    }
}
