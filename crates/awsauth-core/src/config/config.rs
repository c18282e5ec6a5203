//! Configuration management for awsauth
//!
//! Handles configuration loading from files, environment variables, and command-line arguments.
//! Configuration is stored in TOML format.

#[cfg(target_os = "macos")]
use directories::BaseDirs;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use super::error::{ConfigError, Result};
use crate::env::{self, Env};

/// Default instance metadata base URL
pub const DEFAULT_METADATA_URL: &str = "http://169.254.169.254";

/// Region used for IAM/STS clients when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Main configuration structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    /// Explicit access key ID
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,
    /// Explicit secret access key
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_key: Option<String>,
    /// Explicit session token
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Profile name in the shared credentials file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<String>,
    /// Path to the shared credentials file
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shared_credentials_file: Option<String>,
    /// Region for the IAM and STS clients
    #[serde(default = "default_region")]
    pub region: String,
    /// Maximum retries handed to the SDK clients
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    /// Only these accounts may be used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed_account_ids: Vec<String>,
    /// These accounts must never be used
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forbidden_account_ids: Vec<String>,
    /// Custom API endpoints
    #[serde(default)]
    pub endpoints: Endpoints,
    /// Instance metadata base URL
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata_url: Option<String>,
    /// Per-request timeout for the instance metadata client
    #[serde(default = "default_metadata_timeout_ms")]
    pub metadata_timeout_ms: u64,
    /// Overall deadline for account discovery; unbounded when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_timeout_secs: Option<u64>,
    #[serde(default)]
    pub skip_credentials_validation: bool,
    #[serde(default)]
    pub skip_requesting_account_id: bool,
    #[serde(default)]
    pub skip_metadata_api_check: bool,
}

/// Endpoint overrides for the identity APIs
#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq, Eq)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iam: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sts: Option<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            access_key: None,
            secret_key: None,
            token: None,
            profile: None,
            shared_credentials_file: None,
            region: default_region(),
            max_retries: default_max_retries(),
            allowed_account_ids: Vec::new(),
            forbidden_account_ids: Vec::new(),
            endpoints: Endpoints::default(),
            metadata_url: None,
            metadata_timeout_ms: default_metadata_timeout_ms(),
            identity_timeout_secs: None,
            skip_credentials_validation: false,
            skip_requesting_account_id: false,
            skip_metadata_api_check: false,
        }
    }
}

fn default_region() -> String {
    DEFAULT_REGION.to_string()
}

fn default_max_retries() -> u32 {
    25
}

fn default_metadata_timeout_ms() -> u64 {
    1000
}

impl Config {
    /// Load configuration from the standard location
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;
        Self::load_from_path(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from_path(config_path: &Path) -> Result<Self> {
        if !config_path.exists() {
            return Ok(Config::default());
        }

        let content = fs::read_to_string(config_path).map_err(|e| ConfigError::LoadError {
            path: config_path.display().to_string(),
            source: e,
        })?;

        // Expand environment variables in the config content
        let expanded_content = Self::expand_env_vars(&content);

        let config: Config = toml::from_str(&expanded_content)?;
        config.validate()?;

        Ok(config)
    }

    /// Check settings that cannot be combined
    pub fn validate(&self) -> Result<()> {
        if !self.allowed_account_ids.is_empty() && !self.forbidden_account_ids.is_empty() {
            return Err(ConfigError::ConflictingAccountLists);
        }
        if self.region.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "region".to_string(),
                message: "must not be empty".to_string(),
            });
        }
        if self.metadata_timeout_ms == 0 {
            return Err(ConfigError::InvalidValue {
                field: "metadata_timeout_ms".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if self.identity_timeout_secs == Some(0) {
            return Err(ConfigError::InvalidValue {
                field: "identity_timeout_secs".to_string(),
                message: "must be greater than zero".to_string(),
            });
        }
        if let Some(url) = &self.metadata_url {
            url::Url::parse(url).map_err(|e| ConfigError::InvalidValue {
                field: "metadata_url".to_string(),
                message: e.to_string(),
            })?;
        }
        Ok(())
    }

    /// Fill process-wide overrides from the environment.
    ///
    /// Call this once at process entry. Everything below the entry point sees
    /// only the resulting fields, so concurrent sessions in one process cannot
    /// observe each other's environment changes.
    pub fn apply_env(&mut self, env: &Env) {
        if self.metadata_url.is_none() {
            self.metadata_url = env.get(env::METADATA_URL);
        }
    }

    /// Instance metadata base URL, falling back to the link-local default
    pub fn metadata_url(&self) -> &str {
        self.metadata_url.as_deref().unwrap_or(DEFAULT_METADATA_URL)
    }

    pub fn metadata_timeout(&self) -> Duration {
        Duration::from_millis(self.metadata_timeout_ms)
    }

    pub fn identity_timeout(&self) -> Option<Duration> {
        self.identity_timeout_secs.map(Duration::from_secs)
    }

    /// Get the path to the configuration file
    ///
    /// On macOS, this supports both the standard macOS path and Linux-style ~/.config path:
    /// 1. Check ~/.config/awsauth/config.toml (Linux-style, preferred for consistency)
    /// 2. Fall back to ~/Library/Application Support/io.awsauth.awsauth/config.toml (macOS standard)
    ///
    /// On Linux: ~/.config/awsauth/config.toml
    /// On Windows: %APPDATA%\awsauth\awsauth\config.toml
    pub fn config_path() -> Result<PathBuf> {
        // On macOS, check for Linux-style path first for cross-platform consistency
        #[cfg(target_os = "macos")]
        {
            if let Some(base_dirs) = BaseDirs::new() {
                let linux_style_path = base_dirs
                    .home_dir()
                    .join(".config")
                    .join("awsauth")
                    .join("config.toml");

                if linux_style_path.exists() {
                    return Ok(linux_style_path);
                }
            }
        }

        let proj_dirs =
            ProjectDirs::from("io", "awsauth", "awsauth").ok_or(ConfigError::ConfigDirError)?;

        Ok(proj_dirs.config_dir().join("config.toml"))
    }

    /// Expand environment variables in configuration content
    ///
    /// Supports ${VAR} and ${VAR:-default} syntax, e.g.:
    /// ```toml
    /// access_key = "${CI_AWS_ACCESS_KEY}"
    /// region = "${AWS_REGION:-us-east-1}"
    /// ```
    fn expand_env_vars(content: &str) -> String {
        // Unset variables are left as-is rather than failing the whole file
        let expanded =
            shellexpand::env_with_context_no_errors(content, |var| std::env::var(var).ok());
        expanded.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.region, "us-east-1");
        assert_eq!(config.max_retries, 25);
        assert_eq!(config.metadata_url(), DEFAULT_METADATA_URL);
        assert_eq!(config.metadata_timeout(), Duration::from_secs(1));
        assert_eq!(config.identity_timeout(), None);
        assert!(!config.skip_metadata_api_check);
    }

    #[test]
    fn test_parse_full_config() {
        let content = r#"
access_key = "AKIDEXAMPLE"
secret_key = "secret"
profile = "ci"
region = "eu-west-1"
allowed_account_ids = ["123456789012"]
metadata_url = "http://127.0.0.1:1338"
identity_timeout_secs = 30
skip_requesting_account_id = true

[endpoints]
sts = "https://sts.eu-west-1.amazonaws.com"
"#;
        let config: Config = toml::from_str(content).unwrap();
        config.validate().unwrap();

        assert_eq!(config.access_key.as_deref(), Some("AKIDEXAMPLE"));
        assert_eq!(config.profile.as_deref(), Some("ci"));
        assert_eq!(config.region, "eu-west-1");
        assert_eq!(config.allowed_account_ids, vec!["123456789012".to_string()]);
        assert_eq!(config.metadata_url(), "http://127.0.0.1:1338");
        assert_eq!(config.identity_timeout(), Some(Duration::from_secs(30)));
        assert!(config.skip_requesting_account_id);
        assert_eq!(
            config.endpoints,
            Endpoints {
                iam: None,
                sts: Some("https://sts.eu-west-1.amazonaws.com".to_string()),
            }
        );
    }

    #[test]
    fn test_conflicting_account_lists() {
        let config = Config {
            allowed_account_ids: vec!["111111111111".to_string()],
            forbidden_account_ids: vec!["222222222222".to_string()],
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ConflictingAccountLists)
        ));
    }

    #[test]
    fn test_zero_timeouts_rejected() {
        let config = Config {
            metadata_timeout_ms: 0,
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "metadata_timeout_ms"
        ));

        let config = Config {
            identity_timeout_secs: Some(0),
            ..Config::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidValue { ref field, .. }) if field == "identity_timeout_secs"
        ));
    }

    #[test]
    fn test_invalid_metadata_url() {
        let config = Config {
            metadata_url: Some("not a url".to_string()),
            ..Config::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("metadata_url"));
    }

    #[test]
    fn test_apply_env_reads_metadata_override() {
        let env = Env::from_slice(&[(env::METADATA_URL, "http://localhost:9999")]);

        let mut config = Config::default();
        config.apply_env(&env);
        assert_eq!(config.metadata_url(), "http://localhost:9999");
    }

    #[test]
    fn test_apply_env_keeps_explicit_metadata_url() {
        let env = Env::from_slice(&[(env::METADATA_URL, "http://localhost:9999")]);

        let mut config = Config {
            metadata_url: Some("http://10.0.0.1".to_string()),
            ..Config::default()
        };
        config.apply_env(&env);
        assert_eq!(config.metadata_url(), "http://10.0.0.1");
    }

    #[test]
    fn test_env_var_expansion() {
        unsafe {
            std::env::set_var("AWSAUTH_TEST_REGION", "ap-southeast-2");
        }

        let content = r#"
region = "${AWSAUTH_TEST_REGION}"
profile = "${AWSAUTH_TEST_UNSET_PROFILE:-fallback}"
"#;
        let expanded = Config::expand_env_vars(content);
        let config: Config = toml::from_str(&expanded).unwrap();

        assert_eq!(config.region, "ap-southeast-2");
        assert_eq!(config.profile.as_deref(), Some("fallback"));

        unsafe {
            std::env::remove_var("AWSAUTH_TEST_REGION");
        }
    }
}
