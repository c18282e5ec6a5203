//! IAM and STS clients backed by the AWS SDK
//!
//! The SDK clients sign requests with whatever [`CredentialSource`] the
//! session selected, through [`SourceCredentialsProvider`]. SDK errors are
//! classified into [`ErrorKind`] here, at the boundary, so nothing above this
//! module sees raw error-code strings.

use async_trait::async_trait;
use aws_credential_types::provider::error::CredentialsError as SdkCredentialsError;
use aws_credential_types::provider::{self, ProvideCredentials, future};
use aws_sdk_iam::config::retry::RetryConfig;
use aws_sdk_iam::config::{BehaviorVersion, Region};
use aws_sdk_iam::error::{DisplayErrorContext, ProvideErrorMetadata, SdkError};
use std::fmt::Debug;
use std::sync::Arc;
use std::time::SystemTime;
use tracing::trace;

use crate::config::Config;
use crate::credentials::CredentialSource;
use crate::error::{ApiError, ErrorKind};
use crate::identity::{IamApi, StsApi};

/// Exposes a [`CredentialSource`] to the SDK's signing pipeline
#[derive(Debug, Clone)]
pub struct SourceCredentialsProvider {
    source: Arc<CredentialSource>,
}

impl SourceCredentialsProvider {
    pub fn new(source: Arc<CredentialSource>) -> Self {
        Self { source }
    }

    async fn load(&self) -> provider::Result {
        let creds = self
            .source
            .get()
            .await
            .map_err(SdkCredentialsError::provider_error)?;
        Ok(aws_credential_types::Credentials::new(
            creds.access_key_id,
            creds.secret_access_key,
            creds.session_token,
            creds.expires_at.map(SystemTime::from),
            creds.provider_name.as_str(),
        ))
    }
}

impl ProvideCredentials for SourceCredentialsProvider {
    fn provide_credentials<'a>(&'a self) -> future::ProvideCredentials<'a>
    where
        Self: 'a,
    {
        future::ProvideCredentials::new(self.load())
    }
}

/// Map an SDK failure onto an [`ApiError`]
fn classify<E, R>(operation: &str, err: SdkError<E, R>) -> ApiError
where
    E: ProvideErrorMetadata + std::error::Error + Send + Sync + 'static,
    R: Debug,
{
    let kind = match &err {
        SdkError::ServiceError(context) => ErrorKind::from_code(context.err().code()),
        SdkError::TimeoutError(_) | SdkError::DispatchFailure(_) => ErrorKind::Transport,
        SdkError::ResponseError(_) => ErrorKind::InvalidResponse,
        _ => ErrorKind::Service(operation.to_string()),
    };
    ApiError::new(kind, format!("{operation}: {}", DisplayErrorContext(&err)))
}

/// Builds the collaborator clients for a session
pub trait ClientFactory: Send + Sync {
    fn iam(&self, config: &Config, source: Arc<CredentialSource>) -> Arc<dyn IamApi>;

    fn sts(&self, config: &Config, source: Arc<CredentialSource>) -> Arc<dyn StsApi>;
}

/// [`ClientFactory`] producing real AWS SDK clients
#[derive(Debug, Clone, Copy, Default)]
pub struct SdkClientFactory;

impl ClientFactory for SdkClientFactory {
    fn iam(&self, config: &Config, source: Arc<CredentialSource>) -> Arc<dyn IamApi> {
        let mut builder = aws_sdk_iam::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.region.clone()))
            .retry_config(retry_config(config))
            .credentials_provider(SourceCredentialsProvider::new(source));
        if let Some(endpoint) = &config.endpoints.iam {
            builder = builder.endpoint_url(endpoint.clone());
        }
        Arc::new(SdkIamClient {
            client: aws_sdk_iam::Client::from_conf(builder.build()),
        })
    }

    fn sts(&self, config: &Config, source: Arc<CredentialSource>) -> Arc<dyn StsApi> {
        let mut builder = aws_sdk_sts::Config::builder()
            .behavior_version(aws_sdk_sts::config::BehaviorVersion::latest())
            .region(aws_sdk_sts::config::Region::new(config.region.clone()))
            .retry_config(retry_config(config))
            .credentials_provider(SourceCredentialsProvider::new(source));
        if let Some(endpoint) = &config.endpoints.sts {
            builder = builder.endpoint_url(endpoint.clone());
        }
        Arc::new(SdkStsClient {
            client: aws_sdk_sts::Client::from_conf(builder.build()),
        })
    }
}

fn retry_config(config: &Config) -> RetryConfig {
    RetryConfig::standard().with_max_attempts(config.max_retries.saturating_add(1))
}

#[derive(Debug, Clone)]
pub struct SdkIamClient {
    client: aws_sdk_iam::Client,
}

#[async_trait]
impl IamApi for SdkIamClient {
    async fn current_user_arn(&self) -> Result<String, ApiError> {
        trace!("Calling iam:GetUser");
        let out = self
            .client
            .get_user()
            .send()
            .await
            .map_err(|e| classify("iam:GetUser", e))?;
        out.user()
            .map(|user| user.arn().to_string())
            .ok_or_else(|| ApiError::invalid_response("iam:GetUser returned no user"))
    }

    async fn first_role_arn(&self) -> Result<Option<String>, ApiError> {
        trace!("Calling iam:ListRoles");
        let out = self
            .client
            .list_roles()
            .max_items(1)
            .send()
            .await
            .map_err(|e| classify("iam:ListRoles", e))?;
        Ok(out.roles().first().map(|role| role.arn().to_string()))
    }
}

#[derive(Debug, Clone)]
pub struct SdkStsClient {
    client: aws_sdk_sts::Client,
}

#[async_trait]
impl StsApi for SdkStsClient {
    async fn caller_arn(&self) -> Result<String, ApiError> {
        trace!("Calling sts:GetCallerIdentity");
        let out = self
            .client
            .get_caller_identity()
            .send()
            .await
            .map_err(|e| classify("sts:GetCallerIdentity", e))?;
        out.arn()
            .map(str::to_string)
            .ok_or_else(|| ApiError::invalid_response("sts:GetCallerIdentity returned no ARN"))
    }
}
