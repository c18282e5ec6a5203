//! `awsauth whoami`: establish a full session

use awsauth_core::{Config, Env, SdkClientFactory, Session};
use serde::Serialize;

use crate::cli::OutputFormat;
use crate::error::Result;
use crate::output;

#[derive(Debug, Serialize)]
pub struct WhoamiReport {
    pub provider: Option<&'static str>,
    pub account_id: Option<String>,
    pub partition: String,
    pub region: String,
}

impl From<&Session> for WhoamiReport {
    fn from(session: &Session) -> Self {
        Self {
            provider: session.provider_name().map(|p| p.as_str()),
            account_id: session.account_id().map(str::to_string),
            partition: session.partition().to_string(),
            region: session.region().to_string(),
        }
    }
}

pub async fn handle_whoami(
    config: &Config,
    env: &Env,
    skip_account_lookup: bool,
    output_format: OutputFormat,
) -> Result<()> {
    let mut config = config.clone();
    config.skip_requesting_account_id |= skip_account_lookup;

    let session = Session::establish(&config, env, &SdkClientFactory).await?;
    output::print_output(WhoamiReport::from(&session), output_format)?;
    Ok(())
}
