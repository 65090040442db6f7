//! HTTP client for the job site's internal REST API.
//!
//! Two endpoints are used: job posting detail and company detail. Both
//! require the per-session CSRF token and, outside a browser, the session
//! cookie that token was issued for.

mod response;

use reqwest::{Client, Url};

use jobmap_core::{CompanyLocationRecord, JobDetail};

use crate::error::ApiError;
use crate::{build_http_client, parse_base_url};

const DEFAULT_BASE_URL: &str = "https://www.linkedin.com/voyager/api/";
const NORMALIZED_JSON: &str = "application/vnd.linkedin.normalized+json+2.1";

/// Client for job posting and company lookups.
///
/// Use [`VoyagerClient::new`] for production or
/// [`VoyagerClient::with_base_url`] to point at a mock server in tests.
pub struct VoyagerClient {
    client: Client,
    base_url: Url,
    cookie: Option<String>,
}

impl VoyagerClient {
    /// Creates a client pointed at the production API.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the underlying `reqwest::Client`
    /// cannot be constructed.
    pub fn new(
        timeout_secs: u64,
        user_agent: &str,
        cookie: Option<String>,
    ) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent, cookie)
    }

    /// Creates a client with a custom base URL.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ApiError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
        cookie: Option<String>,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
            cookie,
        })
    }

    /// Fetches one job posting.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not JSON.
    /// - [`ApiError::Malformed`] if the body has no `data` envelope.
    pub async fn fetch_job(&self, job_id: &str, csrf_token: &str) -> Result<JobDetail, ApiError> {
        let url = self.endpoint(&format!("jobs/jobPostings/{job_id}"))?;
        let body = self.request_json(&url, csrf_token).await?;
        response::parse_job_posting(job_id, &body).ok_or_else(|| ApiError::Malformed {
            context: format!("jobPostings(id={job_id})"),
        })
    }

    /// Fetches the office locations and logo of one company.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not JSON.
    pub async fn fetch_company(
        &self,
        company_id: &str,
        csrf_token: &str,
    ) -> Result<CompanyLocationRecord, ApiError> {
        let url = self.endpoint(&format!("organization/dash/companies/{company_id}"))?;
        let body = self.request_json(&url, csrf_token).await?;
        Ok(response::parse_company(&body))
    }

    fn endpoint(&self, path: &str) -> Result<Url, ApiError> {
        self.base_url.join(path).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{path}", self.base_url),
            reason: e.to_string(),
        })
    }

    async fn request_json(
        &self,
        url: &Url,
        csrf_token: &str,
    ) -> Result<serde_json::Value, ApiError> {
        let mut request = self
            .client
            .get(url.clone())
            .header("csrf-token", csrf_token)
            .header(reqwest::header::ACCEPT, NORMALIZED_JSON);
        if let Some(cookie) = &self.cookie {
            request = request.header(reqwest::header::COOKIE, cookie);
        }

        tracing::debug!(path = url.path(), "voyager request");
        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            tracing::debug!(status = status.as_u16(), path = url.path(), "voyager request rejected");
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let body = response.text().await?;
        serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: url.to_string(),
            source: e,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_appends_to_base_path() {
        let client = VoyagerClient::with_base_url("https://example.com/voyager/api", 5, "t", None)
            .expect("client construction should not fail");
        let url = client.endpoint("jobs/jobPostings/123").unwrap();
        assert_eq!(
            url.as_str(),
            "https://example.com/voyager/api/jobs/jobPostings/123"
        );
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = VoyagerClient::with_base_url("not a url", 5, "t", None);
        assert!(matches!(result, Err(ApiError::InvalidUrl { .. })));
    }
}
