//! Temporary credentials of the role attached to the running instance

use chrono::{Duration as ChronoDuration, Utc};
use tokio::sync::Mutex;
use tracing::{debug, warn};

use super::{Credentials, CredentialsError, ProviderName};
use crate::imds::MetadataClient;

/// Credentials are refreshed this long before they expire
const EXPIRY_WINDOW_SECS: i64 = 5 * 60;

/// Fetches role credentials from the instance metadata service and caches
/// them until shortly before expiry
#[derive(Debug)]
pub struct Ec2RoleProvider {
    client: MetadataClient,
    cache: Mutex<Option<Credentials>>,
}

impl Ec2RoleProvider {
    pub fn new(client: MetadataClient) -> Self {
        Self {
            client,
            cache: Mutex::new(None),
        }
    }

    pub fn client(&self) -> &MetadataClient {
        &self.client
    }

    pub async fn credentials(&self) -> Result<Credentials, CredentialsError> {
        let mut cache = self.cache.lock().await;
        if let Some(creds) = cache.as_ref().filter(|c| is_fresh(c)) {
            return Ok(creds.clone());
        }

        let role = self.client.role_credentials().await.map_err(|e| {
            warn!(error = %e, "Instance role credentials unavailable");
            CredentialsError::no_providers(format!("EC2RoleRequestError: {e}"))
        })?;
        debug!(expires_at = %role.expiration, "Fetched instance role credentials");

        let creds = Credentials {
            access_key_id: role.access_key_id,
            secret_access_key: role.secret_access_key,
            session_token: Some(role.token).filter(|t| !t.is_empty()),
            provider_name: ProviderName::Ec2Role,
            expires_at: Some(role.expiration),
        };
        *cache = Some(creds.clone());
        Ok(creds)
    }
}

fn is_fresh(creds: &Credentials) -> bool {
    creds
        .expires_at
        .is_none_or(|at| at - ChronoDuration::seconds(EXPIRY_WINDOW_SECS) > Utc::now())
}
