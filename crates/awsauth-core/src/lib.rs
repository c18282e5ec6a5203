//! # awsauth-core
//!
//! Credential selection and account discovery for AWS API clients.
//!
//! The crate answers two questions for a process about to call AWS:
//!
//! 1. **Which credentials?** [`CredentialChain`] picks exactly one
//!    [`CredentialSource`] by precedence: static keys, environment variables,
//!    the shared credentials file, then the instance role.
//! 2. **Which account and partition?** [`IdentityResolver`] tries instance
//!    metadata, `iam:GetUser`, `iam:ListRoles` and `sts:GetCallerIdentity` in
//!    order and returns the first [`Identity`] found.
//!
//! [`Session::establish`] runs both steps plus the allowed/forbidden account
//! checks from [`Config`].
//!
//! ## Layout
//!
//! ```text
//! awsauth-core/
//! ├── src/
//! │   ├── lib.rs
//! │   ├── arn.rs          # ARN -> (account, partition)
//! │   ├── aws.rs          # SDK-backed IAM/STS clients
//! │   ├── config/         # TOML config and validation
//! │   ├── credentials/    # sources and the selection chain
//! │   ├── env.rs          # environment shim
//! │   ├── error.rs        # ErrorKind, ApiError, CoreError
//! │   ├── identity/       # ordered discovery methods
//! │   ├── imds.rs         # instance metadata client
//! │   └── session.rs      # establishment and account checks
//! ```

pub mod arn;
pub mod aws;
pub mod config;
pub mod credentials;
pub mod env;
pub mod error;
pub mod identity;
pub mod imds;
pub mod session;

pub use arn::{Arn, ArnError, parse_account_and_partition};
pub use aws::{ClientFactory, SdkClientFactory, SourceCredentialsProvider};
pub use config::{Config, ConfigError, Endpoints};
pub use credentials::{
    CredentialChain, CredentialSource, Credentials, CredentialsError, NO_CREDENTIAL_PROVIDERS,
    ProviderName,
};
pub use env::Env;
pub use error::{ApiError, CoreError, ErrorKind, Result};
pub use identity::{Identity, IdentityError, IdentityResolver, MethodName};
pub use imds::MetadataClient;
pub use session::{Session, partition_for_region};
