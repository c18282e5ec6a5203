//! Error types for awsauth
//!
//! Library errors are folded into [`AwsAuthError`], which knows how to render
//! itself as a cargo-style diagnostic with tips.

use awsauth_core::{ArnError, ConfigError, CoreError};
use colored::Colorize;
use thiserror::Error;

/// Cargo-style diagnostic formatter for CLI errors.
///
/// Produces structured output like:
/// ```text
/// error: no AWS credentials found
///   NoCredentialProviders: no valid credential sources found: ...
///
///   tip: export static keys:
///       export AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=...
/// ```
pub struct CliDiagnostic {
    message: String,
    detail: Option<String>,
    tips: Vec<(String, Vec<String>)>,
}

impl CliDiagnostic {
    /// Start a new error diagnostic with the given message.
    pub fn error(message: &str) -> Self {
        Self {
            message: message.to_string(),
            detail: None,
            tips: Vec::new(),
        }
    }

    /// Add a detail line below the error message.
    pub fn detail(mut self, text: &str) -> Self {
        self.detail = Some(text.to_string());
        self
    }

    /// Add a tip with optional example commands.
    pub fn tip(mut self, description: &str, commands: &[&str]) -> Self {
        self.tips.push((
            description.to_string(),
            commands.iter().map(|s| s.to_string()).collect(),
        ));
        self
    }

    /// Print the diagnostic to stderr with colored formatting.
    pub fn print(&self) {
        eprint!("{}{}", "error".red().bold(), ": ".bold());
        eprintln!("{}", self.message);

        if let Some(detail) = &self.detail {
            eprintln!("  {}", detail);
        }

        for (description, commands) in &self.tips {
            eprintln!();
            eprint!("  {}{}", "tip".yellow().bold(), ": ".bold());
            eprintln!("{}", description);
            for cmd in commands {
                eprintln!("      {}", cmd);
            }
        }
    }
}

/// Main error type for the awsauth application
#[derive(Error, Debug)]
pub enum AwsAuthError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("no AWS credentials found")]
    NoCredentials { message: String },

    #[error("unusable AWS credentials")]
    InvalidCredentials { message: String },

    #[error("could not determine the AWS account")]
    AccountLookup { message: String },

    #[error("{message}")]
    AccountRejected { message: String },

    #[error("Invalid ARN: {message}")]
    InvalidArn { message: String },

    #[error("Output formatting error: {message}")]
    OutputError { message: String },
}

/// Result type for awsauth operations
pub type Result<T> = std::result::Result<T, AwsAuthError>;

impl AwsAuthError {
    /// Underlying cause shown below the headline
    pub fn detail(&self) -> Option<&str> {
        match self {
            AwsAuthError::NoCredentials { message }
            | AwsAuthError::InvalidCredentials { message }
            | AwsAuthError::AccountLookup { message } => Some(message),
            _ => None,
        }
    }

    /// Tips with example commands for resolving this error
    pub fn tips(&self) -> Vec<(&'static str, Vec<&'static str>)> {
        match self {
            AwsAuthError::NoCredentials { .. } => vec![
                (
                    "export static keys:",
                    vec!["export AWS_ACCESS_KEY_ID=... AWS_SECRET_ACCESS_KEY=..."],
                ),
                (
                    "or use a shared credentials profile:",
                    vec!["awsauth --profile <name> whoami"],
                ),
            ],
            AwsAuthError::InvalidCredentials { .. } => vec![(
                "check the selected source:",
                vec!["awsauth credentials -v"],
            )],
            AwsAuthError::AccountLookup { .. } => vec![
                (
                    "grant one of iam:GetUser, iam:ListRoles or sts:GetCallerIdentity",
                    vec![],
                ),
                (
                    "or skip the lookup:",
                    vec!["awsauth whoami --skip-account-lookup"],
                ),
            ],
            AwsAuthError::Configuration(_) => vec![(
                "check the configuration file:",
                vec!["awsauth --config-file <path> whoami"],
            )],
            _ => vec![],
        }
    }

    /// Print a cargo-style diagnostic to stderr using colored formatting.
    pub fn print_diagnostic(&self) {
        let mut diag = CliDiagnostic::error(&self.to_string());
        if let Some(detail) = self.detail() {
            diag = diag.detail(detail);
        }
        for (description, commands) in self.tips() {
            diag = diag.tip(description, &commands);
        }
        diag.print();
    }
}

impl From<CoreError> for AwsAuthError {
    fn from(err: CoreError) -> Self {
        if err.is_no_credentials() {
            return AwsAuthError::NoCredentials {
                message: err.to_string(),
            };
        }
        match err {
            CoreError::Config(e) => AwsAuthError::from(e),
            CoreError::Credentials(e) => AwsAuthError::InvalidCredentials {
                message: e.to_string(),
            },
            CoreError::Identity(e) => AwsAuthError::AccountLookup {
                message: e.to_string(),
            },
            other @ (CoreError::ForbiddenAccount { .. }
            | CoreError::AccountNotAllowed { .. }
            | CoreError::AccountUnknown) => AwsAuthError::AccountRejected {
                message: other.to_string(),
            },
        }
    }
}

impl From<ConfigError> for AwsAuthError {
    fn from(err: ConfigError) -> Self {
        AwsAuthError::Configuration(err.to_string())
    }
}

impl From<ArnError> for AwsAuthError {
    fn from(err: ArnError) -> Self {
        AwsAuthError::InvalidArn {
            message: err.to_string(),
        }
    }
}

impl From<anyhow::Error> for AwsAuthError {
    fn from(err: anyhow::Error) -> Self {
        AwsAuthError::OutputError {
            message: err.to_string(),
        }
    }
}
