//! Unified error handling for awsauth-core
//!
//! Collaborator calls (IAM, STS, instance metadata) report an [`ApiError`]
//! carrying a closed [`ErrorKind`]. Fallback decisions match on the kind, never
//! on raw error-code strings.
//!
//! # Example
//!
//! ```rust
//! use awsauth_core::{ApiError, ErrorKind};
//!
//! let err = ApiError::from_code(Some("AccessDenied"), "iam:GetUser refused");
//! assert_eq!(err.kind, ErrorKind::AccessDenied);
//! assert!(err.kind.is_permission_like());
//! ```

use std::fmt;
use thiserror::Error;

use crate::config::ConfigError;
use crate::credentials::CredentialsError;
use crate::identity::IdentityError;

/// Classification of a failed collaborator call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// Caller lacks permission (HTTP 403 equivalent)
    AccessDenied,
    /// Request is semantically inapplicable, e.g. GetUser from a role session
    ValidationError,
    /// The requested entity does not exist
    NotFound,
    /// Connection refused, timeout, DNS failure and similar
    Transport,
    /// The response arrived but could not be understood
    InvalidResponse,
    /// Any other service error code
    Service(String),
}

impl ErrorKind {
    /// Map an AWS error code onto a kind
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some("AccessDenied" | "AccessDeniedException" | "UnauthorizedOperation") => {
                Self::AccessDenied
            }
            Some("ValidationError" | "ValidationException") => Self::ValidationError,
            Some("NoSuchEntity" | "NotFound") => Self::NotFound,
            Some(other) => Self::Service(other.to_string()),
            None => Self::Service("Unknown".to_string()),
        }
    }

    /// Map an HTTP status returned by a plain HTTP collaborator
    pub fn from_status(status: u16) -> Self {
        match status {
            401 | 403 => Self::AccessDenied,
            404 => Self::NotFound,
            400 => Self::ValidationError,
            other => Self::Service(format!("HTTP{other}")),
        }
    }

    /// Access denied or validation error: the method does not apply to this caller
    #[must_use]
    pub fn is_permission_like(&self) -> bool {
        matches!(self, Self::AccessDenied | Self::ValidationError)
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AccessDenied => write!(f, "AccessDenied"),
            Self::ValidationError => write!(f, "ValidationError"),
            Self::NotFound => write!(f, "NotFound"),
            Self::Transport => write!(f, "Transport"),
            Self::InvalidResponse => write!(f, "InvalidResponse"),
            Self::Service(code) => write!(f, "{code}"),
        }
    }
}

/// Failure of a single collaborator call
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("{kind}: {message}")]
pub struct ApiError {
    pub kind: ErrorKind,
    pub message: String,
}

impl ApiError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub fn from_code(code: Option<&str>, message: impl Into<String>) -> Self {
        Self::new(ErrorKind::from_code(code), message)
    }

    pub fn transport(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::Transport, message)
    }

    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidResponse, message)
    }
}

/// Top-level error type for session establishment
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Credentials(#[from] CredentialsError),

    #[error(transparent)]
    Identity(#[from] IdentityError),

    #[error("Forbidden account ID ({account_id})")]
    ForbiddenAccount { account_id: String },

    #[error("Account ID not allowed ({account_id})")]
    AccountNotAllowed { account_id: String },

    #[error("Cannot check allowed/forbidden account IDs: account ID lookup was skipped")]
    AccountUnknown,
}

/// Result type alias for core operations
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    /// Returns true if no credential source produced usable credentials
    #[must_use]
    pub fn is_no_credentials(&self) -> bool {
        matches!(self, CoreError::Credentials(e) if e.code() == crate::credentials::NO_CREDENTIAL_PROVIDERS)
    }

    /// Returns true if account discovery failed or the account was rejected
    #[must_use]
    pub fn is_account_rejected(&self) -> bool {
        matches!(
            self,
            CoreError::ForbiddenAccount { .. }
                | CoreError::AccountNotAllowed { .. }
                | CoreError::AccountUnknown
        )
    }

    /// Returns true if every identity method failed
    #[must_use]
    pub fn is_identity_exhausted(&self) -> bool {
        matches!(self, CoreError::Identity(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_code() {
        assert_eq!(
            ErrorKind::from_code(Some("AccessDenied")),
            ErrorKind::AccessDenied
        );
        assert_eq!(
            ErrorKind::from_code(Some("ValidationError")),
            ErrorKind::ValidationError
        );
        assert_eq!(
            ErrorKind::from_code(Some("NoSuchEntity")),
            ErrorKind::NotFound
        );
        assert_eq!(
            ErrorKind::from_code(Some("Throttling")),
            ErrorKind::Service("Throttling".to_string())
        );
        assert_eq!(
            ErrorKind::from_code(None),
            ErrorKind::Service("Unknown".to_string())
        );
    }

    #[test]
    fn test_kind_from_status() {
        assert_eq!(ErrorKind::from_status(403), ErrorKind::AccessDenied);
        assert_eq!(ErrorKind::from_status(404), ErrorKind::NotFound);
        assert_eq!(
            ErrorKind::from_status(500),
            ErrorKind::Service("HTTP500".to_string())
        );
    }

    #[test]
    fn test_permission_like() {
        assert!(ErrorKind::AccessDenied.is_permission_like());
        assert!(ErrorKind::ValidationError.is_permission_like());
        assert!(!ErrorKind::Transport.is_permission_like());
        assert!(!ErrorKind::NotFound.is_permission_like());
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::transport("connection refused");
        assert_eq!(err.to_string(), "Transport: connection refused");
    }

    #[test]
    fn test_account_errors() {
        let err = CoreError::ForbiddenAccount {
            account_id: "123456789012".to_string(),
        };
        assert!(err.is_account_rejected());
        assert!(!err.is_no_credentials());
        assert!(err.to_string().contains("123456789012"));
    }

    #[test]
    fn test_no_credentials_predicate() {
        let err: CoreError = CredentialsError::no_providers("nothing configured").into();
        assert!(err.is_no_credentials());
        assert!(!err.is_account_rejected());
    }
}
