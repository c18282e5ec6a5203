//! `awsauth credentials`: which source would sign requests

use awsauth_core::{Config, CoreError, CredentialChain, Credentials, Env};
use serde::Serialize;
use tracing::info;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output;

#[derive(Debug, Serialize)]
pub struct CredentialsReport {
    pub provider: &'static str,
    pub access_key_id: String,
    pub session_token: bool,
    pub expires_at: Option<String>,
}

impl From<&Credentials> for CredentialsReport {
    fn from(creds: &Credentials) -> Self {
        Self {
            provider: creds.provider_name.as_str(),
            access_key_id: creds.masked_access_key(),
            session_token: creds.session_token.is_some(),
            expires_at: creds.expires_at.map(|at| at.to_rfc3339()),
        }
    }
}

pub async fn handle_credentials(
    config: &Config,
    env: &Env,
    output_format: OutputFormat,
) -> Result<()> {
    let source = CredentialChain::new(config, env)
        .resolve()
        .map_err(CoreError::from)?;
    let creds = source.get().await.map_err(CoreError::from)?;
    info!(provider = %creds.provider_name, "Credentials loaded");

    output::print_output(CredentialsReport::from(&creds), output_format)?;
    Ok(())
}
