use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::geo::Coordinate;

/// Where the work happens. Serialized as the job site's numeric code.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "u8", into = "u8")]
pub enum WorkplaceType {
    #[default]
    OnSite,
    Remote,
    Hybrid,
}

impl WorkplaceType {
    #[must_use]
    pub fn code(self) -> u8 {
        match self {
            WorkplaceType::OnSite => 1,
            WorkplaceType::Remote => 2,
            WorkplaceType::Hybrid => 3,
        }
    }

    /// Unknown codes are treated as on-site.
    #[must_use]
    pub fn from_code(code: u8) -> Self {
        match code {
            2 => WorkplaceType::Remote,
            3 => WorkplaceType::Hybrid,
            _ => WorkplaceType::OnSite,
        }
    }

    /// Parse the first typed URN (e.g. `urn:li:fs_workplaceType:2`); the
    /// code is its last colon segment. Empty lists and unparsable codes fall
    /// back to on-site.
    pub fn from_urns<S: AsRef<str>>(urns: &[S]) -> Self {
        urns.first()
            .and_then(|urn| urn.as_ref().rsplit(':').next())
            .and_then(|code| code.trim().parse::<u8>().ok())
            .map_or(WorkplaceType::OnSite, WorkplaceType::from_code)
    }

    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            WorkplaceType::OnSite => "On-site",
            WorkplaceType::Remote => "Remote",
            WorkplaceType::Hybrid => "Hybrid",
        }
    }
}

impl From<u8> for WorkplaceType {
    fn from(code: u8) -> Self {
        WorkplaceType::from_code(code)
    }
}

impl From<WorkplaceType> for u8 {
    fn from(wt: WorkplaceType) -> Self {
        wt.code()
    }
}

impl std::fmt::Display for WorkplaceType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// A posting as returned by the job detail service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobDetail {
    pub job_id: String,
    pub title: String,
    pub formatted_location: String,
    pub workplace_type: WorkplaceType,
    pub work_remote_allowed: bool,
    pub company_id: Option<String>,
    pub listed_at: Option<DateTime<Utc>>,
}

/// A fully resolved posting with coordinates, the unit that is stored and
/// rendered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeocodedJob {
    pub job_id: String,
    pub title: String,
    pub company: String,
    pub location: String,
    pub address: String,
    pub has_precise_address: bool,
    pub workplace_type: WorkplaceType,
    pub workplace_label: String,
    pub lat: f64,
    pub lng: f64,
    #[serde(default, with = "chrono::serde::ts_milliseconds_option")]
    pub listed_at: Option<DateTime<Utc>>,
    pub logo_url: Option<String>,
}

impl GeocodedJob {
    #[must_use]
    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.lat, self.lng)
    }

    #[must_use]
    pub fn view_url(&self) -> String {
        format!("https://www.linkedin.com/jobs/view/{}", self.job_id)
    }
}
