use std::path::PathBuf;

/// Pool sizes for the three enrichment stages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConcurrencyLimits {
    pub job_fetch: usize,
    pub company_lookup: usize,
    pub geocode: usize,
}

impl Default for ConcurrencyLimits {
    fn default() -> Self {
        Self {
            job_fetch: 4,
            company_lookup: 4,
            geocode: 6,
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub mapbox_token: String,
    pub csrf_token: Option<String>,
    pub cookie: Option<String>,
    pub voyager_base_url: String,
    pub geocoding_base_url: String,
    pub routing_base_url: String,
    pub data_dir: PathBuf,
    pub log_level: String,
    pub request_timeout_secs: u64,
    pub user_agent: String,
    pub concurrency: ConcurrencyLimits,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("mapbox_token", &"[redacted]")
            .field("csrf_token", &self.csrf_token.as_ref().map(|_| "[redacted]"))
            .field("cookie", &self.cookie.as_ref().map(|_| "[redacted]"))
            .field("voyager_base_url", &self.voyager_base_url)
            .field("geocoding_base_url", &self.geocoding_base_url)
            .field("routing_base_url", &self.routing_base_url)
            .field("data_dir", &self.data_dir)
            .field("log_level", &self.log_level)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("concurrency", &self.concurrency)
            .finish()
    }
}
