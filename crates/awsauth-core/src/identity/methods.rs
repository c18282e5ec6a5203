//! The concrete discovery methods and the collaborator APIs behind them

use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

use super::{AttemptFailure, Identity, IdentityMethod, IdentityResolver, MethodName};
use crate::credentials::CredentialSource;
use crate::error::{ApiError, ErrorKind};
use crate::imds::MetadataClient;

/// IAM calls used for account discovery
#[async_trait]
pub trait IamApi: Send + Sync {
    /// ARN of the calling IAM user
    async fn current_user_arn(&self) -> Result<String, ApiError>;

    /// ARN of any one role in the account, `None` if there are no roles
    async fn first_role_arn(&self) -> Result<Option<String>, ApiError>;
}

/// STS calls used for account discovery
#[async_trait]
pub trait StsApi: Send + Sync {
    /// ARN of the caller, whatever the principal type
    async fn caller_arn(&self) -> Result<String, ApiError>;
}

/// Instance metadata lookup of the attached instance profile
#[async_trait]
pub trait InstanceIdentityApi: Send + Sync {
    async fn instance_profile_arn(&self) -> Result<String, ApiError>;
}

#[async_trait]
impl InstanceIdentityApi for MetadataClient {
    async fn instance_profile_arn(&self) -> Result<String, ApiError> {
        Ok(self.iam_info().await?.instance_profile_arn)
    }
}

pub struct Ec2MetadataMethod {
    api: Arc<dyn InstanceIdentityApi>,
}

impl Ec2MetadataMethod {
    pub fn new(api: Arc<dyn InstanceIdentityApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityMethod for Ec2MetadataMethod {
    fn name(&self) -> MethodName {
        MethodName::Ec2Metadata
    }

    async fn attempt(&self) -> Result<Identity, AttemptFailure> {
        let arn = self.api.instance_profile_arn().await?;
        debug!(arn = %arn, "Instance profile ARN from metadata");
        Ok(Identity::from_arn(&arn)?)
    }
}

/// `iam:GetUser` on the caller.
///
/// `AccessDenied` and `ValidationError` are expected for role sessions and
/// federated callers.
pub struct IamGetUserMethod {
    api: Arc<dyn IamApi>,
}

impl IamGetUserMethod {
    pub fn new(api: Arc<dyn IamApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityMethod for IamGetUserMethod {
    fn name(&self) -> MethodName {
        MethodName::IamGetUser
    }

    async fn attempt(&self) -> Result<Identity, AttemptFailure> {
        let arn = self.api.current_user_arn().await?;
        Ok(Identity::from_arn(&arn)?)
    }

    fn is_expected_failure(&self, failure: &AttemptFailure) -> bool {
        matches!(failure, AttemptFailure::Api(e) if e.kind.is_permission_like())
    }
}

/// `iam:ListRoles` limited to one result; any role ARN carries the account
pub struct IamListRolesMethod {
    api: Arc<dyn IamApi>,
}

impl IamListRolesMethod {
    pub fn new(api: Arc<dyn IamApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityMethod for IamListRolesMethod {
    fn name(&self) -> MethodName {
        MethodName::IamListRoles
    }

    async fn attempt(&self) -> Result<Identity, AttemptFailure> {
        let arn = self
            .api
            .first_role_arn()
            .await?
            .ok_or_else(|| ApiError::new(ErrorKind::NotFound, "account has no IAM roles"))?;
        Ok(Identity::from_arn(&arn)?)
    }
}

pub struct StsCallerIdentityMethod {
    api: Arc<dyn StsApi>,
}

impl StsCallerIdentityMethod {
    pub fn new(api: Arc<dyn StsApi>) -> Self {
        Self { api }
    }
}

#[async_trait]
impl IdentityMethod for StsCallerIdentityMethod {
    fn name(&self) -> MethodName {
        MethodName::StsGetCallerIdentity
    }

    async fn attempt(&self) -> Result<Identity, AttemptFailure> {
        let arn = self.api.caller_arn().await?;
        Ok(Identity::from_arn(&arn)?)
    }
}

/// Clients the standard resolver is built from
#[derive(Clone)]
pub struct IdentityApis {
    pub iam: Arc<dyn IamApi>,
    pub sts: Arc<dyn StsApi>,
    /// Absent when the metadata service must not be contacted
    pub instance: Option<Arc<dyn InstanceIdentityApi>>,
}

impl IdentityResolver {
    /// Standard order: instance metadata (instance-role sources only), then
    /// `iam:GetUser`, `iam:ListRoles` and `sts:GetCallerIdentity`
    pub fn standard(source: &CredentialSource, apis: IdentityApis) -> Self {
        let mut methods: Vec<Box<dyn IdentityMethod>> = Vec::with_capacity(4);
        if source.supports_instance_metadata_identity()
            && let Some(instance) = apis.instance
        {
            methods.push(Box::new(Ec2MetadataMethod::new(instance)));
        }
        methods.push(Box::new(IamGetUserMethod::new(apis.iam.clone())));
        methods.push(Box::new(IamListRolesMethod::new(apis.iam)));
        methods.push(Box::new(StsCallerIdentityMethod::new(apis.sts)));
        Self::new(methods)
    }
}
