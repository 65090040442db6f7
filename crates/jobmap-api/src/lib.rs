//! Typed clients for the remote services the job map consumes: job and
//! company detail, forward geocoding, and point-to-point routing.

pub mod error;
pub mod geocoding;
pub mod routing;
pub mod voyager;

pub use error::ApiError;
pub use geocoding::GeocodingClient;
pub use routing::{Route, RoutingClient};
pub use voyager::VoyagerClient;

/// Build the shared `reqwest::Client` used by every service client.
pub(crate) fn build_http_client(
    timeout_secs: u64,
    user_agent: &str,
) -> Result<reqwest::Client, ApiError> {
    let client = reqwest::Client::builder()
        .timeout(std::time::Duration::from_secs(timeout_secs))
        .connect_timeout(std::time::Duration::from_secs(10))
        .user_agent(user_agent)
        .build()?;
    Ok(client)
}

/// Parse a base URL, normalising it to end with exactly one slash so that
/// relative joins append rather than replace the last path segment.
pub(crate) fn parse_base_url(base_url: &str) -> Result<reqwest::Url, ApiError> {
    let normalised = format!("{}/", base_url.trim_end_matches('/'));
    reqwest::Url::parse(&normalised).map_err(|e| ApiError::InvalidUrl {
        url: base_url.to_owned(),
        reason: e.to_string(),
    })
}
