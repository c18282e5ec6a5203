//! Credentials from the well-known environment variables

use super::{Credentials, CredentialsError, ProviderName};
use crate::env::{self, Env};

/// Reads `AWS_ACCESS_KEY_ID`/`AWS_SECRET_ACCESS_KEY`/`AWS_SESSION_TOKEN`
/// (and their legacy spellings) through a captured [`Env`]
#[derive(Debug, Clone)]
pub struct EnvProvider {
    env: Env,
}

impl EnvProvider {
    pub fn new(env: Env) -> Self {
        Self { env }
    }

    /// Whether an access key is present, used for source selection
    pub fn is_configured(env: &Env) -> bool {
        env.first_of(&[env::ACCESS_KEY_ID, env::ACCESS_KEY_ID_LEGACY])
            .is_some()
    }

    pub fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let access_key_id = self
            .env
            .first_of(&[env::ACCESS_KEY_ID, env::ACCESS_KEY_ID_LEGACY])
            .ok_or(CredentialsError::EnvAccessKeyNotFound)?;
        let secret_access_key = self
            .env
            .first_of(&[env::SECRET_ACCESS_KEY, env::SECRET_ACCESS_KEY_LEGACY])
            .ok_or(CredentialsError::EnvSecretNotFound)?;

        Ok(Credentials {
            access_key_id,
            secret_access_key,
            session_token: self.env.get(env::SESSION_TOKEN),
            provider_name: ProviderName::Environment,
            expires_at: None,
        })
    }
}
