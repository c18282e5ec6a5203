//! Explicitly configured keys

use super::{Credentials, CredentialsError, ProviderName};

/// Keys supplied directly in the configuration, exactly as given
#[derive(Clone)]
pub struct StaticProvider {
    access_key_id: String,
    secret_access_key: Option<String>,
    session_token: Option<String>,
}

impl std::fmt::Debug for StaticProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StaticProvider")
            .field("access_key_id", &self.access_key_id)
            .finish_non_exhaustive()
    }
}

impl StaticProvider {
    pub fn new(
        access_key_id: impl Into<String>,
        secret_access_key: Option<String>,
        session_token: Option<String>,
    ) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            secret_access_key,
            session_token,
        }
    }

    pub fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let secret = self
            .secret_access_key
            .as_deref()
            .filter(|s| !s.is_empty())
            .ok_or(CredentialsError::StaticCredsEmpty)?;
        if self.access_key_id.is_empty() {
            return Err(CredentialsError::StaticCredsEmpty);
        }

        Ok(Credentials {
            access_key_id: self.access_key_id.clone(),
            secret_access_key: secret.to_string(),
            session_token: self.session_token.clone().filter(|t| !t.is_empty()),
            provider_name: ProviderName::Static,
            expires_at: None,
        })
    }
}
