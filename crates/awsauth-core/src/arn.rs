//! ARN decomposition and account/partition extraction
//!
//! Every identity method converges on [`parse_account_and_partition`], so the
//! extraction rules live in exactly one place.

use serde::Serialize;
use std::fmt;
use thiserror::Error;

const ARN_PREFIX: &str = "arn:";
const ARN_SECTIONS: usize = 6;

/// Errors produced while parsing an ARN
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArnError {
    #[error("invalid ARN '{arn}': missing 'arn:' prefix")]
    MissingPrefix { arn: String },

    #[error("invalid ARN '{arn}': expected 6 colon-separated sections, found {found}")]
    NotEnoughSections { arn: String, found: usize },

    #[error("ARN '{arn}' does not contain {field}")]
    MissingField { arn: String, field: &'static str },
}

/// A decomposed `arn:<partition>:<service>:<region>:<account>:<resource>` string
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Arn<'a> {
    pub partition: &'a str,
    pub service: &'a str,
    pub region: &'a str,
    pub account_id: &'a str,
    /// Everything after the fifth colon; may itself contain colons and slashes
    pub resource: &'a str,
}

impl<'a> Arn<'a> {
    /// Split an ARN into its sections without validating their content.
    pub fn parse(arn: &'a str) -> Result<Self, ArnError> {
        if !arn.starts_with(ARN_PREFIX) {
            return Err(ArnError::MissingPrefix {
                arn: arn.to_string(),
            });
        }

        // splitn keeps colons inside the resource section intact
        let sections: Vec<&str> = arn.splitn(ARN_SECTIONS, ':').collect();
        if sections.len() < ARN_SECTIONS {
            return Err(ArnError::NotEnoughSections {
                arn: arn.to_string(),
                found: sections.len(),
            });
        }

        Ok(Self {
            partition: sections[1],
            service: sections[2],
            region: sections[3],
            account_id: sections[4],
            resource: sections[5],
        })
    }
}

impl fmt::Display for Arn<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "arn:{}:{}:{}:{}:{}",
            self.partition, self.service, self.region, self.account_id, self.resource
        )
    }
}

/// Extract `(account_id, partition)` from any principal or resource ARN.
///
/// Both values must be non-empty: an ARN without an account (for example an
/// S3 bucket) cannot identify the caller.
pub fn parse_account_and_partition(arn: &str) -> Result<(String, String), ArnError> {
    let parsed = Arn::parse(arn)?;

    if parsed.partition.is_empty() {
        return Err(ArnError::MissingField {
            arn: arn.to_string(),
            field: "a partition",
        });
    }
    if parsed.account_id.is_empty() {
        return Err(ArnError::MissingField {
            arn: arn.to_string(),
            field: "an account ID",
        });
    }

    Ok((parsed.account_id.to_string(), parsed.partition.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iam_user_arn() {
        let (account, partition) =
            parse_account_and_partition("arn:aws:iam::123456789012:user/Bob").unwrap();
        assert_eq!(account, "123456789012");
        assert_eq!(partition, "aws");
    }

    #[test]
    fn test_govcloud_assumed_role_arn() {
        let (account, partition) =
            parse_account_and_partition("arn:aws-us-gov:sts::123456789012:assumed-role/name")
                .unwrap();
        assert_eq!(account, "123456789012");
        assert_eq!(partition, "aws-us-gov");
    }

    #[test]
    fn test_instance_profile_arn() {
        let (account, partition) = parse_account_and_partition(
            "arn:aws-cn:iam::210987654321:instance-profile/web/frontend",
        )
        .unwrap();
        assert_eq!(account, "210987654321");
        assert_eq!(partition, "aws-cn");
    }

    #[test]
    fn test_resource_keeps_colons() {
        let arn = Arn::parse("arn:aws:logs:us-east-1:123456789012:log-group:/app:*").unwrap();
        assert_eq!(arn.service, "logs");
        assert_eq!(arn.region, "us-east-1");
        assert_eq!(arn.resource, "log-group:/app:*");
        assert_eq!(
            arn.to_string(),
            "arn:aws:logs:us-east-1:123456789012:log-group:/app:*"
        );
    }

    #[test]
    fn test_invalid_arn() {
        let err = parse_account_and_partition("invalid-arn").unwrap_err();
        assert!(matches!(err, ArnError::MissingPrefix { .. }));
    }

    #[test]
    fn test_too_few_sections() {
        let err = parse_account_and_partition("arn:aws:iam::123456789012").unwrap_err();
        assert_eq!(
            err,
            ArnError::NotEnoughSections {
                arn: "arn:aws:iam::123456789012".to_string(),
                found: 5,
            }
        );

        assert!(parse_account_and_partition("arn:").is_err());
        assert!(parse_account_and_partition("").is_err());
    }

    #[test]
    fn test_missing_account() {
        let err = parse_account_and_partition("arn:aws:s3:::my-bucket").unwrap_err();
        assert!(err.to_string().contains("account ID"));
    }

    #[test]
    fn test_prefix_is_case_sensitive() {
        assert!(parse_account_and_partition("ARN:aws:iam::123456789012:root").is_err());
    }
}
