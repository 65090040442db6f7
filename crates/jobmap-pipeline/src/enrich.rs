//! Three-stage enrichment of newly discovered job ids:
//! job detail → company office address → coordinates.
//!
//! Stages run one after another over the whole batch; each stage fans out
//! through [`run_bounded`] with its own pool size. Items that fail at any
//! stage drop out of the batch.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use jobmap_api::{GeocodingClient, VoyagerClient};
use jobmap_core::{
    CompanyLocationRecord, ConcurrencyLimits, Coordinate, GeocodedJob, JobDetail,
};

use crate::company::{find_best_address, CompanyLocationResolver};
use crate::geocode_cache::GeocodeCache;
use crate::runner::run_bounded;

/// Job detail plus everything the geocode stage needs.
#[derive(Debug, Clone, PartialEq)]
pub struct EnrichedJob {
    pub detail: JobDetail,
    /// Matched office address, or the job's own stated location.
    pub geocode_address: String,
    pub has_precise_address: bool,
    /// Coordinates carried by the matched office; these skip geocoding.
    pub direct: Option<Coordinate>,
    pub country_code: Option<String>,
    pub logo_url: Option<String>,
    /// Name from the company record.
    pub company_name: Option<String>,
}

impl EnrichedJob {
    /// Attach a company record (or its absence) to a fetched job.
    #[must_use]
    pub fn new(detail: JobDetail, record: Option<&CompanyLocationRecord>) -> Self {
        let matched = record.and_then(|r| find_best_address(r, &detail.formatted_location));

        let (geocode_address, has_precise_address, direct, mut country_code) = match matched {
            Some(m) => (
                m.address
                    .filter(|a| !a.is_empty())
                    .unwrap_or_else(|| detail.formatted_location.clone()),
                true,
                m.geo,
                m.country,
            ),
            None => (detail.formatted_location.clone(), false, None, None),
        };

        if country_code.is_none() {
            country_code = country_code_from_location(&detail.formatted_location);
        }

        Self {
            geocode_address,
            has_precise_address,
            direct,
            country_code,
            logo_url: record.and_then(|r| r.logo_url.clone()),
            company_name: record.and_then(|r| r.name.clone()).filter(|n| !n.is_empty()),
            detail,
        }
    }

    fn into_geocoded(self, coordinate: Coordinate, company: String) -> GeocodedJob {
        let workplace_type = self.detail.workplace_type;
        GeocodedJob {
            job_id: self.detail.job_id,
            title: self.detail.title,
            company,
            location: self.detail.formatted_location,
            address: self.geocode_address,
            has_precise_address: self.has_precise_address,
            workplace_type,
            workplace_label: workplace_type.label().to_string(),
            lat: coordinate.lat,
            lng: coordinate.lng,
            listed_at: self.detail.listed_at,
            logo_url: self.logo_url,
        }
    }
}

/// Last comma segment of a stated location, upper-cased, when it is exactly
/// two characters long.
#[must_use]
pub fn country_code_from_location(location: &str) -> Option<String> {
    let last = location.rsplit(',').next().unwrap_or_default().trim();
    (last.chars().count() == 2).then(|| last.to_uppercase())
}

/// Geocoding bias for a batch: the reference location if set, otherwise the
/// centroid of already accumulated jobs, otherwise nothing.
#[must_use]
pub fn proximity_hint(reference: Option<Coordinate>, existing: &[GeocodedJob]) -> Option<Coordinate> {
    if reference.is_some() {
        return reference;
    }
    let located: Vec<Coordinate> = existing
        .iter()
        .map(GeocodedJob::coordinate)
        .filter(|c| c.lat.abs() > f64::EPSILON && c.lng.abs() > f64::EPSILON)
        .collect();
    Coordinate::centroid(&located)
}

pub struct EnrichmentPipeline {
    voyager: Arc<VoyagerClient>,
    companies: CompanyLocationResolver,
    geocoder: GeocodingClient,
    cache: GeocodeCache,
    limits: ConcurrencyLimits,
}

impl EnrichmentPipeline {
    pub fn new(
        voyager: Arc<VoyagerClient>,
        geocoder: GeocodingClient,
        cache: GeocodeCache,
        limits: ConcurrencyLimits,
    ) -> Self {
        Self {
            companies: CompanyLocationResolver::new(Arc::clone(&voyager)),
            voyager,
            geocoder,
            cache,
            limits,
        }
    }

    #[must_use]
    pub fn companies(&self) -> &CompanyLocationResolver {
        &self.companies
    }

    #[must_use]
    pub fn geocode_cache(&self) -> &GeocodeCache {
        &self.cache
    }

    /// Stage 1. Jobs whose detail request fails drop out.
    pub async fn fetch_jobs<P>(&self, job_ids: &[String], csrf: &str, on_progress: P) -> Vec<JobDetail>
    where
        P: FnMut(usize, usize),
    {
        let voyager = &self.voyager;
        run_bounded(
            job_ids,
            self.limits.job_fetch,
            |job_id, _| async move {
                voyager.fetch_job(job_id, csrf).await.map_err(|e| {
                    tracing::warn!(job_id = %job_id, error = %e, "job detail fetch failed");
                    e
                })
            },
            on_progress,
        )
        .await
        .into_iter()
        .flatten()
        .collect()
    }

    /// Stage 2. Each distinct company is looked up once; every job then gets
    /// its office match from its own company's record. Progress counts
    /// companies, not jobs.
    pub async fn enrich_with_company_addresses<P>(
        &self,
        jobs: Vec<JobDetail>,
        csrf: &str,
        on_progress: P,
    ) -> Vec<EnrichedJob>
    where
        P: FnMut(usize, usize),
    {
        let mut seen = HashSet::new();
        let company_ids: Vec<String> = jobs
            .iter()
            .filter_map(|j| j.company_id.clone())
            .filter(|id| seen.insert(id.clone()))
            .collect();

        let companies = &self.companies;
        let records = run_bounded(
            &company_ids,
            self.limits.company_lookup,
            |company_id, _| async move {
                companies
                    .resolve(company_id, csrf)
                    .await
                    .ok_or("company lookup failed")
            },
            on_progress,
        )
        .await;

        let by_id: HashMap<&str, Arc<CompanyLocationRecord>> = company_ids
            .iter()
            .map(String::as_str)
            .zip(records)
            .filter_map(|(id, record)| record.map(|r| (id, r)))
            .collect();

        jobs.into_iter()
            .map(|detail| {
                let record = detail
                    .company_id
                    .as_deref()
                    .and_then(|id| by_id.get(id))
                    .map(Arc::as_ref);
                EnrichedJob::new(detail, record)
            })
            .collect()
    }

    /// Stage 3. Jobs with direct coordinates skip the network; the rest are
    /// geocoded once per distinct address through the cache. Jobs whose
    /// address does not resolve are dropped. Progress counts addresses.
    pub async fn geocode_jobs<P>(
        &self,
        jobs: Vec<EnrichedJob>,
        proximity: Option<Coordinate>,
        company_names: &HashMap<String, String>,
        on_progress: P,
    ) -> Vec<GeocodedJob>
    where
        P: FnMut(usize, usize),
    {
        let mut seen = HashSet::new();
        let lookups: Vec<(String, Option<String>)> = jobs
            .iter()
            .filter(|j| j.direct.is_none() && !j.geocode_address.is_empty())
            .filter(|j| seen.insert(j.geocode_address.clone()))
            .map(|j| (j.geocode_address.clone(), j.country_code.clone()))
            .collect();

        let cache = &self.cache;
        let geocoder = &self.geocoder;
        let resolved = run_bounded(
            &lookups,
            self.limits.geocode,
            |(address, country), _| async move {
                match cache
                    .resolve(geocoder, address, proximity, country.as_deref())
                    .await
                {
                    Ok(Some(coordinate)) => Ok(coordinate),
                    Ok(None) => {
                        tracing::debug!(address = %address, "no geocoding result");
                        Err("no geocoding result".to_string())
                    }
                    Err(e) => {
                        tracing::warn!(address = %address, error = %e, "geocoding failed");
                        Err(e.to_string())
                    }
                }
            },
            on_progress,
        )
        .await;

        let by_address: HashMap<&str, Coordinate> = lookups
            .iter()
            .map(|(address, _)| address.as_str())
            .zip(resolved)
            .filter_map(|(address, c)| c.map(|c| (address, c)))
            .collect();

        let mut out = Vec::with_capacity(jobs.len());
        for job in jobs {
            let coordinate = match job.direct {
                Some(c) => c,
                None => match by_address.get(job.geocode_address.as_str()) {
                    Some(c) => *c,
                    None => continue,
                },
            };
            let company = company_names
                .get(&job.detail.job_id)
                .filter(|n| !n.is_empty())
                .cloned()
                .or_else(|| job.company_name.clone())
                .unwrap_or_default();
            out.push(job.into_geocoded(coordinate, company));
        }
        out
    }
}
