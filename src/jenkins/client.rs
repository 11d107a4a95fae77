//! Jenkins HTTP client.
//!
//! Every call authenticates with the configured user and API token. Job
//! calls additionally carry a CSRF crumb fetched from the crumb issuer.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;

use super::error::BuildSystemError;
use super::{BuildSystem, Crumb};

const CRUMB_ISSUER_PATH: &str = "crumbIssuer/api/json";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CrumbResponse {
    crumb: String,
    crumb_request_field: String,
}

/// A [`BuildSystem`] backed by a Jenkins server.
#[derive(Clone)]
pub struct JenkinsClient {
    http: Client,
    base_url: String,
    user: String,
    token: String,
}

impl JenkinsClient {
    pub fn new(
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(REQUEST_TIMEOUT).build()?;
        Ok(Self::with_client(http, base_url, user, token))
    }

    /// Creates a client around a pre-configured `reqwest::Client`.
    pub fn with_client(
        http: Client,
        base_url: impl Into<String>,
        user: impl Into<String>,
        token: impl Into<String>,
    ) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        JenkinsClient {
            http,
            base_url,
            user: user.into(),
            token: token.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

impl BuildSystem for JenkinsClient {
    async fn crumb(&self) -> Result<Crumb, BuildSystemError> {
        let url = self.url(CRUMB_ISSUER_PATH);
        let response = self
            .http
            .get(&url)
            .basic_auth(&self.user, Some(&self.token))
            .send()
            .await
            .map_err(|e| BuildSystemError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(BuildSystemError::CrumbStatus {
                url,
                status: status.as_u16(),
            });
        }

        let body: CrumbResponse =
            response
                .json()
                .await
                .map_err(|e| BuildSystemError::MalformedCrumb {
                    url: url.clone(),
                    message: e.to_string(),
                })?;

        if body.crumb_request_field.is_empty() {
            return Err(BuildSystemError::MalformedCrumb {
                url,
                message: "empty crumbRequestField".to_string(),
            });
        }

        Ok(Crumb {
            field: body.crumb_request_field,
            value: body.crumb,
        })
    }

    async fn post(&self, path: &str, crumb: &Crumb) -> Result<u16, BuildSystemError> {
        let url = self.url(path);
        let response = self
            .http
            .post(&url)
            .basic_auth(&self.user, Some(&self.token))
            .header(crumb.field.as_str(), crumb.value.as_str())
            .send()
            .await
            .map_err(|e| BuildSystemError::transport(&url, e))?;
        Ok(response.status().as_u16())
    }
}

impl std::fmt::Debug for JenkinsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JenkinsClient")
            .field("base_url", &self.base_url)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
