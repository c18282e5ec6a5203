//! Account ID and partition discovery
//!
//! [`IdentityResolver`] tries an ordered list of [`IdentityMethod`]s, one at a
//! time, and returns the first success. Every failure is recorded as a
//! [`ResolutionAttempt`]; when all methods fail the attempts are folded into a
//! single [`IdentityError`] so the operator can see which permission or
//! endpoint is missing.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::arn::{self, ArnError};
use crate::error::ApiError;

pub mod methods;

pub use methods::{
    Ec2MetadataMethod, IamApi, IamGetUserMethod, IamListRolesMethod, IdentityApis,
    InstanceIdentityApi, StsApi, StsCallerIdentityMethod,
};

/// The account a set of credentials belongs to
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Identity {
    pub account_id: String,
    pub partition: String,
}

impl Identity {
    /// Extract the identity embedded in any ARN owned by the account
    pub fn from_arn(arn: &str) -> Result<Self, ArnError> {
        let (account_id, partition) = arn::parse_account_and_partition(arn)?;
        Ok(Self {
            account_id,
            partition,
        })
    }
}

/// Discovery methods, in the order the default resolver tries them
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum MethodName {
    Ec2Metadata,
    IamGetUser,
    IamListRoles,
    StsGetCallerIdentity,
}

impl MethodName {
    pub const fn as_str(&self) -> &'static str {
        match self {
            MethodName::Ec2Metadata => "EC2 instance metadata",
            MethodName::IamGetUser => "iam:GetUser",
            MethodName::IamListRoles => "iam:ListRoles",
            MethodName::StsGetCallerIdentity => "sts:GetCallerIdentity",
        }
    }
}

impl fmt::Display for MethodName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why a single method did not produce an identity
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptFailure {
    #[error(transparent)]
    Api(#[from] ApiError),

    #[error("unparseable ARN: {0}")]
    Arn(#[from] ArnError),
}

/// One discovery strategy.
///
/// Implementations make at most one collaborator call per [`attempt`](Self::attempt)
/// and never retry.
#[async_trait]
pub trait IdentityMethod: Send + Sync {
    fn name(&self) -> MethodName;

    async fn attempt(&self) -> Result<Identity, AttemptFailure>;

    /// Whether `failure` only means the method does not apply to this caller
    fn is_expected_failure(&self, _failure: &AttemptFailure) -> bool {
        false
    }
}

/// A failed method and the reason it failed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionAttempt {
    pub method: MethodName,
    pub failure: AttemptFailure,
    /// The method was not applicable rather than broken
    pub expected: bool,
}

/// Every method failed, or the overall deadline elapsed first
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error(
        "failed getting account information via all available methods: {}",
        Summary(.attempts)
    )]
    Exhausted { attempts: Vec<ResolutionAttempt> },

    #[error(
        "account information lookup did not finish within {}s: {}",
        .deadline.as_secs_f64(),
        Summary(.attempts)
    )]
    DeadlineExceeded {
        deadline: Duration,
        attempts: Vec<ResolutionAttempt>,
    },
}

impl IdentityError {
    pub fn attempts(&self) -> &[ResolutionAttempt] {
        match self {
            IdentityError::Exhausted { attempts } => attempts,
            IdentityError::DeadlineExceeded { attempts, .. } => attempts,
        }
    }
}

/// Aggregate rendering of the attempts.
///
/// Expected failures are reported as "not applicable"; other reasons are
/// listed once each, with every method that produced them.
struct Summary<'a>(&'a [ResolutionAttempt]);

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            return f.write_str("no methods were attempted");
        }

        let mut reasons: Vec<(Vec<MethodName>, String)> = Vec::new();
        let mut not_applicable = Vec::new();
        for attempt in self.0 {
            if attempt.expected {
                not_applicable.push(attempt.method);
                continue;
            }
            let reason = attempt.failure.to_string();
            match reasons.iter_mut().find(|(_, r)| *r == reason) {
                Some((methods, _)) => methods.push(attempt.method),
                None => reasons.push((vec![attempt.method], reason)),
            }
        }

        let mut parts: Vec<String> = reasons
            .into_iter()
            .map(|(methods, reason)| format!("{}: {reason}", join(&methods)))
            .collect();
        if !not_applicable.is_empty() {
            parts.push(format!("{}: not applicable", join(&not_applicable)));
        }
        f.write_str(&parts.join("; "))
    }
}

fn join(methods: &[MethodName]) -> String {
    methods
        .iter()
        .map(MethodName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Folds an ordered list of methods, returning the first success
pub struct IdentityResolver {
    methods: Vec<Box<dyn IdentityMethod>>,
    deadline: Option<Duration>,
}

impl fmt::Debug for IdentityResolver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("IdentityResolver")
            .field("methods", &self.method_names())
            .field("deadline", &self.deadline)
            .finish()
    }
}

impl IdentityResolver {
    pub fn new(methods: Vec<Box<dyn IdentityMethod>>) -> Self {
        Self {
            methods,
            deadline: None,
        }
    }

    /// Bound the whole chain; `None` leaves it unbounded
    pub fn with_deadline(mut self, deadline: Option<Duration>) -> Self {
        self.deadline = deadline;
        self
    }

    pub fn method_names(&self) -> Vec<MethodName> {
        self.methods.iter().map(|m| m.name()).collect()
    }

    pub async fn resolve(&self) -> Result<Identity, IdentityError> {
        let mut attempts = Vec::new();

        let found = match self.deadline {
            Some(deadline) => {
                let outcome = tokio::time::timeout(deadline, self.run(&mut attempts)).await;
                match outcome {
                    Ok(found) => found,
                    Err(_) => {
                        warn!(?deadline, attempted = attempts.len(), "Account lookup timed out");
                        return Err(IdentityError::DeadlineExceeded { deadline, attempts });
                    }
                }
            }
            None => self.run(&mut attempts).await,
        };

        found.ok_or_else(|| {
            let err = IdentityError::Exhausted { attempts };
            warn!(error = %err, "Account lookup failed");
            err
        })
    }

    async fn run(&self, attempts: &mut Vec<ResolutionAttempt>) -> Option<Identity> {
        for method in &self.methods {
            let name = method.name();
            match method.attempt().await {
                Ok(identity) => {
                    debug!(
                        method = %name,
                        account_id = %identity.account_id,
                        partition = %identity.partition,
                        "Resolved account"
                    );
                    return Some(identity);
                }
                Err(failure) => {
                    let expected = method.is_expected_failure(&failure);
                    debug!(method = %name, expected, error = %failure, "Account lookup method failed");
                    attempts.push(ResolutionAttempt {
                        method: name,
                        failure,
                        expected,
                    });
                }
            }
        }
        None
    }
}
