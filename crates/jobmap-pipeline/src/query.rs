//! Filtering, sorting, and commute display over accumulated jobs.

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use jobmap_core::{estimate_commute_minutes, format_distance, Coordinate, GeocodedJob, WorkplaceType};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommuteBand {
    /// Up to 15 minutes.
    Short,
    /// Up to 40 minutes.
    Medium,
    Long,
}

impl CommuteBand {
    #[must_use]
    pub fn for_minutes(minutes: u32) -> Self {
        match minutes {
            0..=15 => Self::Short,
            16..=40 => Self::Medium,
            _ => Self::Long,
        }
    }
}

/// What the commute column shows for one job.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Commute {
    /// Remote jobs have no commute.
    NotApplicable,
    /// No reference location is set.
    Unknown,
    Estimate {
        km: f64,
        minutes: u32,
        band: CommuteBand,
    },
}

impl Commute {
    #[must_use]
    pub fn for_job(job: &GeocodedJob, reference: Option<Coordinate>) -> Self {
        if job.workplace_type == WorkplaceType::Remote {
            return Self::NotApplicable;
        }
        let Some(reference) = reference else {
            return Self::Unknown;
        };
        let km = reference.distance_km(&job.coordinate());
        let minutes = estimate_commute_minutes(km);
        Self::Estimate {
            km,
            minutes,
            band: CommuteBand::for_minutes(minutes),
        }
    }

    #[must_use]
    pub fn minutes(&self) -> Option<u32> {
        match self {
            Self::Estimate { minutes, .. } => Some(*minutes),
            Self::NotApplicable | Self::Unknown => None,
        }
    }
}

impl fmt::Display for Commute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotApplicable => f.write_str("N/A"),
            Self::Unknown => f.write_str("--"),
            Self::Estimate { km, minutes, .. } => {
                write!(f, "{minutes} min ({})", format_distance(*km))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    /// Nearest first; only applies when a reference location is set.
    #[default]
    Distance,
    /// Case-insensitive company name.
    Company,
    /// Workplace code: on-site, remote, hybrid.
    Type,
    /// Newest posting first; undated jobs last.
    Date,
}

impl FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "distance" => Ok(Self::Distance),
            "company" => Ok(Self::Company),
            "type" => Ok(Self::Type),
            "date" => Ok(Self::Date),
            other => Err(format!(
                "unknown sort order {other:?} (expected distance, company, type or date)"
            )),
        }
    }
}

/// Workplace toggles plus free-text search.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobFilter {
    pub on_site: bool,
    pub hybrid: bool,
    pub remote: bool,
    /// Case-insensitive substring over title, company and location.
    pub search: Option<String>,
}

impl Default for JobFilter {
    fn default() -> Self {
        Self {
            on_site: true,
            hybrid: true,
            remote: true,
            search: None,
        }
    }
}

impl JobFilter {
    #[must_use]
    pub fn matches(&self, job: &GeocodedJob) -> bool {
        let type_shown = match job.workplace_type {
            WorkplaceType::OnSite => self.on_site,
            WorkplaceType::Hybrid => self.hybrid,
            WorkplaceType::Remote => self.remote,
        };
        if !type_shown {
            return false;
        }
        match self.search.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
            None => true,
            Some(q) => {
                let q = q.to_lowercase();
                [&job.title, &job.company, &job.location]
                    .iter()
                    .any(|field| field.to_lowercase().contains(&q))
            }
        }
    }
}

/// Apply `filter`, then order by `sort`. Ties, and distance order without a
/// reference, fall back to job id so output is stable.
#[must_use]
pub fn filter_and_sort(
    jobs: Vec<GeocodedJob>,
    filter: &JobFilter,
    sort: SortOrder,
    reference: Option<Coordinate>,
) -> Vec<GeocodedJob> {
    let mut out: Vec<GeocodedJob> = jobs.into_iter().filter(|j| filter.matches(j)).collect();
    out.sort_by(|a, b| a.job_id.cmp(&b.job_id));

    match (sort, reference) {
        (SortOrder::Distance, Some(origin)) => out.sort_by(|a, b| {
            let da = origin.distance_km(&a.coordinate());
            let db = origin.distance_km(&b.coordinate());
            da.partial_cmp(&db).unwrap_or(Ordering::Equal)
        }),
        (SortOrder::Distance, None) => {}
        (SortOrder::Company, _) => {
            out.sort_by_cached_key(|j| j.company.to_lowercase());
        }
        (SortOrder::Type, _) => out.sort_by_key(|j| j.workplace_type.code()),
        (SortOrder::Date, _) => out.sort_by(|a, b| b.listed_at.cmp(&a.listed_at)),
    }
    out
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};

    use super::*;

    fn job(id: &str, company: &str, wt: WorkplaceType, lat: f64, lng: f64) -> GeocodedJob {
        GeocodedJob {
            job_id: id.to_string(),
            title: format!("Engineer {id}"),
            company: company.to_string(),
            location: "Istanbul, Turkey".to_string(),
            address: String::new(),
            has_precise_address: false,
            workplace_type: wt,
            workplace_label: wt.label().to_string(),
            lat,
            lng,
            listed_at: None,
            logo_url: None,
        }
    }

    #[test]
    fn commute_for_remote_is_not_applicable() {
        let remote = job("1", "A", WorkplaceType::Remote, 41.0, 29.0);
        let c = Commute::for_job(&remote, Some(Coordinate::new(41.0, 29.0)));
        assert_eq!(c, Commute::NotApplicable);
        assert_eq!(c.to_string(), "N/A");
        assert_eq!(c.minutes(), None);
    }

    #[test]
    fn commute_without_reference_is_unknown() {
        let onsite = job("1", "A", WorkplaceType::OnSite, 41.0, 29.0);
        let c = Commute::for_job(&onsite, None);
        assert_eq!(c.to_string(), "--");
    }

    #[test]
    fn commute_estimate_carries_band() {
        let onsite = job("1", "A", WorkplaceType::OnSite, 41.0, 29.0);
        let c = Commute::for_job(&onsite, Some(Coordinate::new(41.0, 29.0)));
        assert_eq!(
            c,
            Commute::Estimate {
                km: 0.0,
                minutes: 0,
                band: CommuteBand::Short
            }
        );
    }

    #[test]
    fn commute_estimate_renders_minutes_first() {
        let near = Commute::Estimate {
            km: 0.4,
            minutes: 8,
            band: CommuteBand::Short,
        };
        assert_eq!(near.to_string(), "8 min (400 m)");

        let far = Commute::Estimate {
            km: 23.46,
            minutes: 28,
            band: CommuteBand::Medium,
        };
        assert_eq!(far.to_string(), "28 min (23.5 km)");
    }

    #[test]
    fn band_boundaries() {
        assert_eq!(CommuteBand::for_minutes(15), CommuteBand::Short);
        assert_eq!(CommuteBand::for_minutes(16), CommuteBand::Medium);
        assert_eq!(CommuteBand::for_minutes(40), CommuteBand::Medium);
        assert_eq!(CommuteBand::for_minutes(41), CommuteBand::Long);
    }

    #[test]
    fn filter_toggles_and_search() {
        let jobs = vec![
            job("1", "Acme", WorkplaceType::OnSite, 0.0, 0.0),
            job("2", "Globex", WorkplaceType::Remote, 0.0, 0.0),
            job("3", "Initech", WorkplaceType::Hybrid, 0.0, 0.0),
        ];

        let no_remote = JobFilter {
            remote: false,
            ..JobFilter::default()
        };
        let ids: Vec<_> = filter_and_sort(jobs.clone(), &no_remote, SortOrder::Type, None)
            .into_iter()
            .map(|j| j.job_id)
            .collect();
        assert_eq!(ids, vec!["1", "3"]);

        let search = JobFilter {
            search: Some("  GLOB ".to_string()),
            ..JobFilter::default()
        };
        let ids: Vec<_> = filter_and_sort(jobs, &search, SortOrder::Company, None)
            .into_iter()
            .map(|j| j.job_id)
            .collect();
        assert_eq!(ids, vec!["2"]);
    }

    #[test]
    fn distance_sort_needs_reference() {
        let jobs = vec![
            job("a", "X", WorkplaceType::OnSite, 41.5, 29.0),
            job("b", "X", WorkplaceType::OnSite, 41.0, 29.0),
            job("c", "X", WorkplaceType::OnSite, 42.0, 29.0),
        ];
        let sorted = filter_and_sort(
            jobs.clone(),
            &JobFilter::default(),
            SortOrder::Distance,
            Some(Coordinate::new(41.0, 29.0)),
        );
        let ids: Vec<_> = sorted.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);

        let unsorted = filter_and_sort(jobs, &JobFilter::default(), SortOrder::Distance, None);
        let ids: Vec<_> = unsorted.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }

    #[test]
    fn company_sort_is_case_insensitive() {
        let jobs = vec![
            job("1", "beta", WorkplaceType::OnSite, 0.0, 0.0),
            job("2", "Alpha", WorkplaceType::OnSite, 0.0, 0.0),
            job("3", "Gamma", WorkplaceType::OnSite, 0.0, 0.0),
        ];
        let sorted = filter_and_sort(jobs, &JobFilter::default(), SortOrder::Company, None);
        let names: Vec<_> = sorted.iter().map(|j| j.company.as_str()).collect();
        assert_eq!(names, vec!["Alpha", "beta", "Gamma"]);
    }

    #[test]
    fn date_sort_puts_newest_first_and_undated_last() {
        let mut old = job("1", "A", WorkplaceType::OnSite, 0.0, 0.0);
        old.listed_at = Utc.timestamp_millis_opt(1_000).single();
        let mut new = job("2", "A", WorkplaceType::OnSite, 0.0, 0.0);
        new.listed_at = Utc.timestamp_millis_opt(9_000).single();
        let undated = job("3", "A", WorkplaceType::OnSite, 0.0, 0.0);

        let sorted = filter_and_sort(
            vec![undated, old, new],
            &JobFilter::default(),
            SortOrder::Date,
            None,
        );
        let ids: Vec<_> = sorted.iter().map(|j| j.job_id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }

    #[test]
    fn sort_order_parses_case_insensitively() {
        assert_eq!("Date".parse::<SortOrder>(), Ok(SortOrder::Date));
        assert!("nearest".parse::<SortOrder>().is_err());
    }
}
