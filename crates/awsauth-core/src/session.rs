//! Session establishment
//!
//! A [`Session`] ties together the credential source chosen for a process,
//! the account it belongs to and the account allow/deny checks. Once
//! established it is read-only.

use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::aws::ClientFactory;
use crate::config::Config;
use crate::credentials::{CredentialChain, CredentialSource, Credentials, ProviderName};
use crate::env::Env;
use crate::error::{CoreError, Result};
use crate::identity::{Identity, IdentityApis, IdentityResolver, InstanceIdentityApi};

/// Partition inferred from a region name
///
/// ```
/// use awsauth_core::partition_for_region;
///
/// assert_eq!(partition_for_region("cn-north-1"), "aws-cn");
/// assert_eq!(partition_for_region("eu-west-1"), "aws");
/// ```
pub fn partition_for_region(region: &str) -> &'static str {
    if region.starts_with("cn-") {
        "aws-cn"
    } else if region.starts_with("us-gov-") {
        "aws-us-gov"
    } else if region.starts_with("us-isob-") {
        "aws-iso-b"
    } else if region.starts_with("us-iso-") {
        "aws-iso"
    } else {
        "aws"
    }
}

#[derive(Debug)]
pub struct Session {
    source: Arc<CredentialSource>,
    credentials: Option<Credentials>,
    account_id: Option<String>,
    partition: String,
    region: String,
}

impl Session {
    /// Select credentials, verify them, discover the account and check it
    /// against the allowed and forbidden lists
    pub async fn establish(config: &Config, env: &Env, clients: &dyn ClientFactory) -> Result<Self> {
        config.validate()?;

        let source = Arc::new(CredentialChain::new(config, env).resolve()?);
        debug!(provider = ?source.provider_name(), "Selected credential source");

        let credentials = if config.skip_credentials_validation {
            debug!("Skipping credentials validation");
            None
        } else {
            let creds = source.get().await?;
            info!(
                provider = %creds.provider_name,
                access_key = %creds.masked_access_key(),
                "Credentials validated"
            );
            Some(creds)
        };

        let identity = if config.skip_requesting_account_id {
            warn!("Account ID lookup skipped; partition inferred from region");
            None
        } else {
            let apis = IdentityApis {
                iam: clients.iam(config, source.clone()),
                sts: clients.sts(config, source.clone()),
                instance: instance_identity(&source),
            };
            let identity = IdentityResolver::standard(&source, apis)
                .with_deadline(config.identity_timeout())
                .resolve()
                .await?;
            Some(identity)
        };

        check_account(config, identity.as_ref())?;

        let (account_id, partition) = match identity {
            Some(Identity {
                account_id,
                partition,
            }) => (Some(account_id), partition),
            None => (None, partition_for_region(&config.region).to_string()),
        };
        info!(account_id = ?account_id, partition = %partition, "Session established");

        Ok(Self {
            source,
            credentials,
            account_id,
            partition,
            region: config.region.clone(),
        })
    }

    pub fn source(&self) -> &CredentialSource {
        &self.source
    }

    pub fn provider_name(&self) -> Option<ProviderName> {
        self.source.provider_name()
    }

    /// Credentials fetched during validation, absent when validation was skipped
    pub fn credentials(&self) -> Option<&Credentials> {
        self.credentials.as_ref()
    }

    /// `None` when the lookup was skipped
    pub fn account_id(&self) -> Option<&str> {
        self.account_id.as_deref()
    }

    pub fn partition(&self) -> &str {
        &self.partition
    }

    pub fn region(&self) -> &str {
        &self.region
    }
}

/// Metadata lookups reuse the client the instance-role source was built with
fn instance_identity(source: &CredentialSource) -> Option<Arc<dyn InstanceIdentityApi>> {
    match source {
        CredentialSource::Ec2InstanceRole(provider) => Some(Arc::new(provider.client().clone())),
        _ => None,
    }
}

fn check_account(config: &Config, identity: Option<&Identity>) -> Result<()> {
    if config.allowed_account_ids.is_empty() && config.forbidden_account_ids.is_empty() {
        return Ok(());
    }
    let Some(identity) = identity else {
        return Err(CoreError::AccountUnknown);
    };
    let account_id = &identity.account_id;

    if config.forbidden_account_ids.contains(account_id) {
        return Err(CoreError::ForbiddenAccount {
            account_id: account_id.clone(),
        });
    }
    if !config.allowed_account_ids.is_empty() && !config.allowed_account_ids.contains(account_id)
    {
        return Err(CoreError::AccountNotAllowed {
            account_id: account_id.clone(),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigError;
    use crate::error::ApiError;
    use crate::identity::{IamApi, StsApi};
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeIam;

    #[async_trait]
    impl IamApi for FakeIam {
        async fn current_user_arn(&self) -> std::result::Result<String, ApiError> {
            Err(ApiError::from_code(Some("AccessDenied"), "denied"))
        }

        async fn first_role_arn(&self) -> std::result::Result<Option<String>, ApiError> {
            Err(ApiError::from_code(Some("AccessDenied"), "denied"))
        }
    }

    struct FakeSts(Option<&'static str>);

    #[async_trait]
    impl StsApi for FakeSts {
        async fn caller_arn(&self) -> std::result::Result<String, ApiError> {
            self.0
                .map(str::to_string)
                .ok_or_else(|| ApiError::transport("connection refused"))
        }
    }

    /// Hands out fakes and counts how often clients were requested
    struct FakeFactory {
        caller: Option<&'static str>,
        built: AtomicUsize,
    }

    impl FakeFactory {
        fn new(caller: Option<&'static str>) -> Self {
            Self {
                caller,
                built: AtomicUsize::new(0),
            }
        }
    }

    impl ClientFactory for FakeFactory {
        fn iam(&self, _config: &Config, _source: Arc<CredentialSource>) -> Arc<dyn IamApi> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Arc::new(FakeIam)
        }

        fn sts(&self, _config: &Config, _source: Arc<CredentialSource>) -> Arc<dyn StsApi> {
            self.built.fetch_add(1, Ordering::SeqCst);
            Arc::new(FakeSts(self.caller))
        }
    }

    const CALLER: &str = "arn:aws:sts::123456789012:assumed-role/ci/session";

    fn static_config() -> Config {
        Config {
            access_key: Some("AKIDSTATIC".to_string()),
            secret_key: Some("static-secret".to_string()),
            ..Config::default()
        }
    }

    fn no_env() -> Env {
        Env::from_slice(&[])
    }

    #[test]
    fn test_partition_for_region() {
        assert_eq!(partition_for_region("us-east-1"), "aws");
        assert_eq!(partition_for_region("cn-northwest-1"), "aws-cn");
        assert_eq!(partition_for_region("us-gov-west-1"), "aws-us-gov");
        assert_eq!(partition_for_region("us-iso-east-1"), "aws-iso");
        assert_eq!(partition_for_region("us-isob-east-1"), "aws-iso-b");
    }

    #[tokio::test]
    async fn test_establish_resolves_account() {
        let factory = FakeFactory::new(Some(CALLER));
        let session = Session::establish(&static_config(), &no_env(), &factory)
            .await
            .unwrap();

        assert_eq!(session.provider_name(), Some(ProviderName::Static));
        assert_eq!(session.account_id(), Some("123456789012"));
        assert_eq!(session.partition(), "aws");
        assert_eq!(
            session.credentials().unwrap().access_key_id,
            "AKIDSTATIC"
        );
    }

    #[tokio::test]
    async fn test_identity_exhaustion_is_fatal() {
        let factory = FakeFactory::new(None);
        let err = Session::establish(&static_config(), &no_env(), &factory)
            .await
            .unwrap_err();
        assert!(err.is_identity_exhausted());
        assert!(err.to_string().contains("connection refused"));
    }

    #[tokio::test]
    async fn test_skip_account_lookup_infers_partition() {
        let config = Config {
            region: "us-gov-west-1".to_string(),
            skip_requesting_account_id: true,
            ..static_config()
        };
        let factory = FakeFactory::new(None);
        let session = Session::establish(&config, &no_env(), &factory)
            .await
            .unwrap();

        assert_eq!(session.account_id(), None);
        assert_eq!(session.partition(), "aws-us-gov");
        assert_eq!(factory.built.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_invalid_credentials_are_fatal() {
        let config = Config {
            access_key: Some("AKIDSTATIC".to_string()),
            ..Config::default()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::Credentials(_)));
    }

    #[tokio::test]
    async fn test_skip_credentials_validation() {
        let config = Config {
            skip_credentials_validation: true,
            skip_requesting_account_id: true,
            skip_metadata_api_check: true,
            ..Config::default()
        };
        let session = Session::establish(&config, &no_env(), &FakeFactory::new(None))
            .await
            .unwrap();
        assert!(session.credentials().is_none());
        assert_eq!(session.provider_name(), None);
    }

    #[tokio::test]
    async fn test_no_credentials_anywhere() {
        let config = Config {
            skip_metadata_api_check: true,
            ..Config::default()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(err.is_no_credentials());
    }

    #[tokio::test]
    async fn test_forbidden_account() {
        let config = Config {
            forbidden_account_ids: vec!["123456789012".to_string()],
            ..static_config()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::ForbiddenAccount { ref account_id } if account_id == "123456789012"));
    }

    #[tokio::test]
    async fn test_account_not_allowed() {
        let config = Config {
            allowed_account_ids: vec!["999999999999".to_string()],
            ..static_config()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountNotAllowed { .. }));
        assert!(err.is_account_rejected());
    }

    #[tokio::test]
    async fn test_allowed_account() {
        let config = Config {
            allowed_account_ids: vec!["123456789012".to_string()],
            ..static_config()
        };
        let session = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap();
        assert_eq!(session.account_id(), Some("123456789012"));
    }

    #[tokio::test]
    async fn test_account_lists_need_account_lookup() {
        let config = Config {
            allowed_account_ids: vec!["123456789012".to_string()],
            skip_requesting_account_id: true,
            ..static_config()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(matches!(err, CoreError::AccountUnknown));
    }

    #[tokio::test]
    async fn test_conflicting_account_lists() {
        let config = Config {
            allowed_account_ids: vec!["1".to_string()],
            forbidden_account_ids: vec!["2".to_string()],
            ..static_config()
        };
        let err = Session::establish(&config, &no_env(), &FakeFactory::new(Some(CALLER)))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Config(ConfigError::ConflictingAccountLists)
        ));
    }
}
