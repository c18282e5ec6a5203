//! Credential sources and precedence-ordered selection
//!
//! A session picks exactly one [`CredentialSource`] with [`CredentialChain`].
//! Selection looks only at what is configured; nothing is fetched until
//! [`CredentialSource::get`] is called.
//!
//! Precedence:
//! 1. Explicit static keys from the configuration
//! 2. Environment variables (`AWS_ACCESS_KEY_ID`, ...)
//! 3. Shared credentials file profile
//! 4. Instance metadata role (unless the metadata API check is skipped)

use chrono::{DateTime, Utc};
use std::fmt;
use thiserror::Error;

pub mod chain;
pub mod ec2_role;
pub mod environment;
pub mod shared_file;
pub mod static_keys;

pub use chain::CredentialChain;
pub use ec2_role::Ec2RoleProvider;
pub use environment::EnvProvider;
pub use shared_file::SharedFileProvider;
pub use static_keys::StaticProvider;

/// Error code reported when no source yields usable credentials
pub const NO_CREDENTIAL_PROVIDERS: &str = "NoCredentialProviders";

/// Stable label of the provider that produced a set of credentials
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProviderName {
    Static,
    Environment,
    SharedCredentials,
    Ec2Role,
}

impl ProviderName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            ProviderName::Static => "StaticProvider",
            ProviderName::Environment => "EnvProvider",
            ProviderName::SharedCredentials => "SharedCredentialsProvider",
            ProviderName::Ec2Role => "EC2RoleProvider",
        }
    }
}

impl fmt::Display for ProviderName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved set of access keys
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
    pub provider_name: ProviderName,
    /// Set for temporary credentials
    pub expires_at: Option<DateTime<Utc>>,
}

impl Credentials {
    /// Access key with everything but the first four characters hidden
    pub fn masked_access_key(&self) -> String {
        let visible: String = self.access_key_id.chars().take(4).collect();
        let hidden = self.access_key_id.chars().count().saturating_sub(4);
        format!("{visible}{}", "*".repeat(hidden))
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"** redacted **")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "** redacted **"),
            )
            .field("provider_name", &self.provider_name)
            .field("expires_at", &self.expires_at)
            .finish()
    }
}

/// Errors raised while selecting or reading a credential source
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialsError {
    #[error("NoCredentialProviders: no valid credential sources found: {reason}")]
    NoCredentialProviders { reason: String },

    #[error("StaticCredsEmpty: static credentials are empty")]
    StaticCredsEmpty,

    #[error("EnvAccessKeyNotFound: AWS_ACCESS_KEY_ID or AWS_ACCESS_KEY not found in environment")]
    EnvAccessKeyNotFound,

    #[error("EnvSecretNotFound: AWS_SECRET_ACCESS_KEY or AWS_SECRET_KEY not found in environment")]
    EnvSecretNotFound,

    #[error("UserHomeNotFound: user home directory not found")]
    HomeNotFound,

    #[error("SharedCredsLoad: failed to load shared credentials file {path}: {message}")]
    SharedCredsLoad { path: String, message: String },

    #[error("SharedCredsLoad: profile '{profile}' not found in {path}")]
    SharedCredsProfileNotFound { profile: String, path: String },

    #[error("SharedCredsAccessKey: shared credentials {path} in profile '{profile}' did not contain {key}")]
    SharedCredsKeyNotFound {
        profile: String,
        path: String,
        key: &'static str,
    },

    #[error("InvalidConfiguration: {0}")]
    InvalidConfiguration(String),
}

impl CredentialsError {
    pub fn no_providers(reason: impl Into<String>) -> Self {
        Self::NoCredentialProviders {
            reason: reason.into(),
        }
    }

    /// AWS-SDK-style error code
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoCredentialProviders { .. } => NO_CREDENTIAL_PROVIDERS,
            Self::StaticCredsEmpty => "StaticCredsEmpty",
            Self::EnvAccessKeyNotFound => "EnvAccessKeyNotFound",
            Self::EnvSecretNotFound => "EnvSecretNotFound",
            Self::HomeNotFound => "UserHomeNotFound",
            Self::SharedCredsLoad { .. } | Self::SharedCredsProfileNotFound { .. } => {
                "SharedCredsLoad"
            }
            Self::SharedCredsKeyNotFound { .. } => "SharedCredsAccessKey",
            Self::InvalidConfiguration(_) => "InvalidConfiguration",
        }
    }
}

/// The single credential source chosen for a session
#[derive(Debug)]
pub enum CredentialSource {
    Static(StaticProvider),
    Environment(EnvProvider),
    SharedFile(SharedFileProvider),
    Ec2InstanceRole(Ec2RoleProvider),
    /// Nothing is configured and the metadata role is disabled
    None,
}

impl CredentialSource {
    /// Fetch credentials from the chosen source.
    ///
    /// Blocks on file or network I/O for the shared-file and instance-role
    /// variants.
    pub async fn get(&self) -> Result<Credentials, CredentialsError> {
        match self {
            CredentialSource::Static(p) => p.credentials(),
            CredentialSource::Environment(p) => p.credentials(),
            CredentialSource::SharedFile(p) => p.credentials().await,
            CredentialSource::Ec2InstanceRole(p) => p.credentials().await,
            CredentialSource::None => Err(CredentialsError::no_providers(
                "no static keys, environment variables or shared credentials configured, \
                 and the instance metadata check is disabled",
            )),
        }
    }

    /// Label of the provider backing this source, `None` for the sentinel
    pub fn provider_name(&self) -> Option<ProviderName> {
        match self {
            CredentialSource::Static(_) => Some(ProviderName::Static),
            CredentialSource::Environment(_) => Some(ProviderName::Environment),
            CredentialSource::SharedFile(_) => Some(ProviderName::SharedCredentials),
            CredentialSource::Ec2InstanceRole(_) => Some(ProviderName::Ec2Role),
            CredentialSource::None => None,
        }
    }

    /// Whether the caller identity can be read from the instance metadata service
    pub fn supports_instance_metadata_identity(&self) -> bool {
        matches!(self, CredentialSource::Ec2InstanceRole(_))
    }
}
