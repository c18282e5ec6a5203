//! Shared credentials file (`~/.aws/credentials`) provider
//!
//! The file is read here and parsed with the AWS SDK profile parser, so
//! comments and profile-name validation follow the same rules as every
//! other AWS tool:
//!
//! ```ini
//! [default]
//! aws_access_key_id = AKID...
//! aws_secret_access_key = ...
//! aws_session_token = ...   ; optional
//! ```

use aws_config::profile::profile_file::{ProfileFileKind, ProfileFiles};
use aws_config::profile::{self, ProfileSet};
use aws_types::os_shim_internal::{Env as SdkEnv, Fs};
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{Credentials, CredentialsError, ProviderName};

const ACCESS_KEY_ID: &str = "aws_access_key_id";
const SECRET_ACCESS_KEY: &str = "aws_secret_access_key";
const SESSION_TOKEN: &str = "aws_session_token";

/// Profile used when neither the configuration nor the environment names one
pub const DEFAULT_PROFILE: &str = "default";

/// Reads one profile from a shared credentials file.
///
/// The file is read on every [`credentials`](Self::credentials) call; it is
/// never written.
#[derive(Debug, Clone)]
pub struct SharedFileProvider {
    path: Option<PathBuf>,
    profile: String,
}

impl SharedFileProvider {
    /// `path` is `None` when no file was configured and the home directory is unknown
    pub fn new(path: Option<PathBuf>, profile: impl Into<String>) -> Self {
        Self {
            path,
            profile: profile.into(),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn profile(&self) -> &str {
        &self.profile
    }

    pub async fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let path = self.path.as_ref().ok_or(CredentialsError::HomeNotFound)?;
        let shown = path.display().to_string();

        let content = tokio::fs::read_to_string(path).await.map_err(|e| {
            CredentialsError::SharedCredsLoad {
                path: shown.clone(),
                message: e.to_string(),
            }
        })?;

        let profiles = parse_profiles(content, &self.profile).await.map_err(|message| {
            CredentialsError::SharedCredsLoad {
                path: shown.clone(),
                message,
            }
        })?;
        let section = profiles.get_profile(&self.profile).ok_or_else(|| {
            CredentialsError::SharedCredsProfileNotFound {
                profile: self.profile.clone(),
                path: shown.clone(),
            }
        })?;
        debug!(profile = %self.profile, path = %shown, "Loaded shared credentials profile");

        let value = |key: &str| section.get(key).filter(|v| !v.is_empty()).map(str::to_string);
        let required = |key: &'static str| {
            value(key).ok_or_else(|| CredentialsError::SharedCredsKeyNotFound {
                profile: self.profile.clone(),
                path: shown.clone(),
                key,
            })
        };

        Ok(Credentials {
            access_key_id: required(ACCESS_KEY_ID)?,
            secret_access_key: required(SECRET_ACCESS_KEY)?,
            session_token: value(SESSION_TOKEN),
            provider_name: ProviderName::SharedCredentials,
            expires_at: None,
        })
    }
}

/// Parse credentials-file content with the SDK profile loader.
///
/// Only the given content is considered: the default config and credentials
/// files and the process environment are not consulted.
async fn parse_profiles(content: String, selected: &str) -> Result<ProfileSet, String> {
    let files = ProfileFiles::builder()
        .with_contents(ProfileFileKind::Credentials, content)
        .build();
    profile::load(
        &Fs::real(),
        &SdkEnv::from_slice(&[]),
        &files,
        Some(selected.to_string().into()),
    )
    .await
    .map_err(|e| e.to_string())
}
