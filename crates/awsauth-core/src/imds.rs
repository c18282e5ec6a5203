//! Instance metadata service client
//!
//! Talks to the link-local metadata endpoint (or whatever base URL the
//! configuration threads in). A session token is requested first; if the
//! token endpoint is unavailable the client falls back to tokenless requests.

use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, trace};

use crate::config::Config;
use crate::error::{ApiError, ErrorKind};

const TOKEN_PATH: &str = "/latest/api/token";
const TOKEN_TTL_HEADER: &str = "X-aws-ec2-metadata-token-ttl-seconds";
const TOKEN_HEADER: &str = "X-aws-ec2-metadata-token";
const TOKEN_TTL_SECONDS: &str = "21600";

const IAM_INFO_PATH: &str = "/latest/meta-data/iam/info";
const SECURITY_CREDENTIALS_PATH: &str = "/latest/meta-data/iam/security-credentials/";

/// `Code` value reported by metadata documents on success
const SUCCESS_CODE: &str = "Success";

/// Response of the IAM info endpoint
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct IamInfo {
    pub code: String,
    #[serde(default)]
    pub last_updated: Option<String>,
    pub instance_profile_arn: String,
    #[serde(default)]
    pub instance_profile_id: Option<String>,
}

/// Temporary credentials for the instance role
#[derive(Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct RoleCredentials {
    pub code: String,
    pub access_key_id: String,
    pub secret_access_key: String,
    pub token: String,
    pub expiration: DateTime<Utc>,
}

impl std::fmt::Debug for RoleCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RoleCredentials")
            .field("code", &self.code)
            .field("access_key_id", &self.access_key_id)
            .field("expiration", &self.expiration)
            .finish_non_exhaustive()
    }
}

/// HTTP client for the instance metadata service
#[derive(Debug, Clone)]
pub struct MetadataClient {
    http: reqwest::Client,
    base_url: String,
}

impl MetadataClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, ApiError> {
        url::Url::parse(base_url).map_err(|e| {
            ApiError::new(
                ErrorKind::ValidationError,
                format!("invalid metadata URL '{base_url}': {e}"),
            )
        })?;

        let http = reqwest::Client::builder()
            .timeout(timeout)
            .connect_timeout(timeout)
            .build()
            .map_err(|e| ApiError::transport(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, ApiError> {
        Self::new(config.metadata_url(), config.metadata_timeout())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Fetch the instance profile details
    pub async fn iam_info(&self) -> Result<IamInfo, ApiError> {
        let token = self.session_token().await;
        let body = self.get(IAM_INFO_PATH, token.as_deref()).await?;

        let info: IamInfo = serde_json::from_str(&body).map_err(|e| {
            ApiError::invalid_response(format!("failed to decode IAM info document: {e}"))
        })?;
        if info.code != SUCCESS_CODE {
            return Err(ApiError::invalid_response(format!(
                "IAM info reported code '{}'",
                info.code
            )));
        }
        Ok(info)
    }

    /// Fetch credentials for the first role attached to the instance
    pub async fn role_credentials(&self) -> Result<RoleCredentials, ApiError> {
        let token = self.session_token().await;

        let listing = self.get(SECURITY_CREDENTIALS_PATH, token.as_deref()).await?;
        let role = listing
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .ok_or_else(|| ApiError::new(ErrorKind::NotFound, "no instance role attached"))?;
        debug!(role, "Found instance role");

        let path = format!("{SECURITY_CREDENTIALS_PATH}{role}");
        let body = self.get(&path, token.as_deref()).await?;

        let creds: RoleCredentials = serde_json::from_str(&body).map_err(|e| {
            ApiError::invalid_response(format!("failed to decode role credentials: {e}"))
        })?;
        if creds.code != SUCCESS_CODE {
            return Err(ApiError::invalid_response(format!(
                "role credentials reported code '{}'",
                creds.code
            )));
        }
        Ok(creds)
    }

    /// Request a session token; `None` means continue without one
    async fn session_token(&self) -> Option<String> {
        let url = format!("{}{TOKEN_PATH}", self.base_url);
        let response = self
            .http
            .put(&url)
            .header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS)
            .send()
            .await;

        match response {
            Ok(resp) if resp.status().is_success() => match resp.text().await {
                Ok(token) if !token.trim().is_empty() => Some(token.trim().to_string()),
                _ => None,
            },
            Ok(resp) => {
                debug!(status = %resp.status(), "Metadata token unavailable, continuing without");
                None
            }
            Err(e) => {
                debug!(error = %e, "Metadata token request failed, continuing without");
                None
            }
        }
    }

    async fn get(&self, path: &str, token: Option<&str>) -> Result<String, ApiError> {
        let url = format!("{}{path}", self.base_url);
        trace!(%url, "GET metadata");

        let mut request = self.http.get(&url);
        if let Some(token) = token {
            request = request.header(TOKEN_HEADER, token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| ApiError::transport(format!("GET {url}: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::new(
                ErrorKind::from_status(status.as_u16()),
                format!("GET {url} returned {status}"),
            ));
        }

        response
            .text()
            .await
            .map_err(|e| ApiError::transport(format!("reading body of {url}: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer) -> MetadataClient {
        MetadataClient::new(&server.uri(), Duration::from_secs(2)).unwrap()
    }

    async fn mount_token(server: &MockServer) {
        Mock::given(method("PUT"))
            .and(path(TOKEN_PATH))
            .and(header(TOKEN_TTL_HEADER, TOKEN_TTL_SECONDS))
            .respond_with(ResponseTemplate::new(200).set_body_string("imds-token"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_iam_info_with_token() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(IAM_INFO_PATH))
            .and(header(TOKEN_HEADER, "imds-token"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "Code": "Success",
                    "LastUpdated": "2024-01-01T00:00:00Z",
                    "InstanceProfileArn": "arn:aws:iam::111111111111:instance-profile/web",
                    "InstanceProfileId": "AIPAEXAMPLE"
                }"#,
            ))
            .expect(1)
            .mount(&server)
            .await;

        let info = client_for(&server).iam_info().await.unwrap();
        assert_eq!(
            info.instance_profile_arn,
            "arn:aws:iam::111111111111:instance-profile/web"
        );
        assert_eq!(info.instance_profile_id.as_deref(), Some("AIPAEXAMPLE"));
    }

    #[tokio::test]
    async fn test_iam_info_without_token_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(IAM_INFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"Success","InstanceProfileArn":"arn:aws:iam::111111111111:instance-profile/web"}"#,
            ))
            .mount(&server)
            .await;

        let info = client_for(&server).iam_info().await.unwrap();
        assert_eq!(info.code, "Success");
    }

    #[tokio::test]
    async fn test_iam_info_not_found() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(IAM_INFO_PATH))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let err = client_for(&server).iam_info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_iam_info_malformed_body() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(IAM_INFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>captive portal</html>"))
            .mount(&server)
            .await;

        let err = client_for(&server).iam_info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResponse);
    }

    #[tokio::test]
    async fn test_iam_info_failure_code() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(IAM_INFO_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{"Code":"AssumeRoleUnauthorizedAccess","InstanceProfileArn":""}"#,
            ))
            .mount(&server)
            .await;

        let err = client_for(&server).iam_info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::InvalidResponse);
        assert!(err.message.contains("AssumeRoleUnauthorizedAccess"));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = MetadataClient::new("http://127.0.0.1:1", Duration::from_millis(200)).unwrap();
        let err = client.iam_info().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::Transport);
    }

    #[tokio::test]
    async fn test_role_credentials() {
        let server = MockServer::start().await;
        mount_token(&server).await;

        Mock::given(method("GET"))
            .and(path(SECURITY_CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string("web-role\n"))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/latest/meta-data/iam/security-credentials/web-role"))
            .respond_with(ResponseTemplate::new(200).set_body_string(
                r#"{
                    "Code": "Success",
                    "LastUpdated": "2024-01-01T00:00:00Z",
                    "Type": "AWS-HMAC",
                    "AccessKeyId": "ASIAEXAMPLE",
                    "SecretAccessKey": "role-secret",
                    "Token": "role-token",
                    "Expiration": "2099-01-01T00:00:00Z"
                }"#,
            ))
            .mount(&server)
            .await;

        let creds = client_for(&server).role_credentials().await.unwrap();
        assert_eq!(creds.access_key_id, "ASIAEXAMPLE");
        assert_eq!(creds.token, "role-token");
        assert!(!format!("{creds:?}").contains("role-secret"));
    }

    #[tokio::test]
    async fn test_role_credentials_without_role() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path(SECURITY_CREDENTIALS_PATH))
            .respond_with(ResponseTemplate::new(200).set_body_string(""))
            .mount(&server)
            .await;

        let err = client_for(&server).role_credentials().await.unwrap_err();
        assert_eq!(err.kind, ErrorKind::NotFound);
    }

    #[test]
    fn test_invalid_base_url() {
        let err = MetadataClient::new("::not-a-url", Duration::from_secs(1)).unwrap_err();
        assert_eq!(err.kind, ErrorKind::ValidationError);
    }

    #[test]
    fn test_trailing_slash_trimmed() {
        let client = MetadataClient::new("http://localhost:8080/", Duration::from_secs(1)).unwrap();
        assert_eq!(client.base_url(), "http://localhost:8080");
    }
}
