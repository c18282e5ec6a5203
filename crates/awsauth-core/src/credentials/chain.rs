//! Precedence-ordered credential source selection

use std::path::PathBuf;
use tracing::{debug, info, warn};

use super::shared_file::DEFAULT_PROFILE;
use super::{
    CredentialSource, CredentialsError, Ec2RoleProvider, EnvProvider, SharedFileProvider,
    StaticProvider,
};
use crate::config::Config;
use crate::env::{self, Env};
use crate::imds::MetadataClient;

/// Chooses exactly one [`CredentialSource`] for a session.
///
/// Selection is based on what is configured, never on reachability: the
/// first source with configuration present wins even if it later fails.
///
/// ```
/// use awsauth_core::{Config, CredentialChain, Env};
///
/// let config = Config {
///     access_key: Some("AKIDEXAMPLE".to_string()),
///     secret_key: Some("secret".to_string()),
///     ..Config::default()
/// };
/// let source = CredentialChain::new(&config, &Env::from_slice(&[])).resolve().unwrap();
/// assert_eq!(source.provider_name().unwrap().as_str(), "StaticProvider");
/// ```
#[derive(Debug)]
pub struct CredentialChain<'a> {
    config: &'a Config,
    env: &'a Env,
}

impl<'a> CredentialChain<'a> {
    pub fn new(config: &'a Config, env: &'a Env) -> Self {
        Self { config, env }
    }

    /// Pick the highest-precedence configured source.
    ///
    /// A secret key or token without an access key does not select the
    /// static source; selection continues with the environment. Fails only
    /// when the metadata client cannot be built.
    pub fn resolve(&self) -> Result<CredentialSource, CredentialsError> {
        let config = self.config;

        if let Some(access_key) = non_empty(&config.access_key) {
            debug!("Using static credentials from configuration");
            return Ok(CredentialSource::Static(StaticProvider::new(
                access_key,
                config.secret_key.clone(),
                config.token.clone(),
            )));
        }
        if non_empty(&config.secret_key).is_some() || non_empty(&config.token).is_some() {
            warn!("Ignoring static secret_key/token configured without access_key");
        }

        if EnvProvider::is_configured(self.env) {
            debug!("Using credentials from environment variables");
            return Ok(CredentialSource::Environment(EnvProvider::new(
                self.env.clone(),
            )));
        }

        if let Some(provider) = self.shared_file() {
            debug!(
                profile = provider.profile(),
                path = ?provider.path(),
                "Using shared credentials file"
            );
            return Ok(CredentialSource::SharedFile(provider));
        }

        if config.skip_metadata_api_check {
            info!("No credentials configured and instance metadata check is skipped");
            return Ok(CredentialSource::None);
        }

        let client = MetadataClient::from_config(config)
            .map_err(|e| CredentialsError::InvalidConfiguration(e.to_string()))?;
        debug!(base_url = client.base_url(), "Falling back to instance role credentials");
        Ok(CredentialSource::Ec2InstanceRole(Ec2RoleProvider::new(
            client,
        )))
    }

    /// Shared file source, if a profile or path is configured or the default file exists
    fn shared_file(&self) -> Option<SharedFileProvider> {
        let profile = non_empty(&self.config.profile)
            .or_else(|| self.env.first_of(&[env::PROFILE, env::PROFILE_LEGACY]));
        let explicit_path = non_empty(&self.config.shared_credentials_file)
            .or_else(|| self.env.get(env::SHARED_CREDENTIALS_FILE));

        let path = match &explicit_path {
            Some(path) => self.expand_home(path),
            None => self.default_path(),
        };

        let default_exists = explicit_path.is_none() && path.as_ref().is_some_and(|p| p.is_file());
        if profile.is_none() && explicit_path.is_none() && !default_exists {
            return None;
        }

        Some(SharedFileProvider::new(
            path,
            profile.unwrap_or_else(|| DEFAULT_PROFILE.to_string()),
        ))
    }

    fn default_path(&self) -> Option<PathBuf> {
        self.env
            .home_dir()
            .map(|home| PathBuf::from(home).join(".aws").join("credentials"))
    }

    /// Expand a leading `~` with the home directory seen through [`Env`]
    fn expand_home(&self, path: &str) -> Option<PathBuf> {
        let home = self.env.home_dir();
        if path.starts_with('~') && home.is_none() {
            return None;
        }
        let expanded = shellexpand::tilde_with_context(path, || home.as_deref());
        Some(PathBuf::from(expanded.as_ref()))
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.is_empty()).cloned()
}
