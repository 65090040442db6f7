//! Company office lookup and office-to-job matching.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use jobmap_api::VoyagerClient;
use jobmap_core::{CompanyLocation, CompanyLocationRecord, Coordinate};

/// Office selected for a job.
#[derive(Debug, Clone, PartialEq)]
pub struct AddressMatch {
    /// Present address fields joined for display and geocoding.
    pub address: Option<String>,
    pub geo: Option<Coordinate>,
    pub country: Option<String>,
}

impl AddressMatch {
    fn from_location(location: &CompanyLocation) -> Self {
        Self {
            address: location.display_address(),
            geo: location.geo,
            country: location.country().map(str::to_owned),
        }
    }
}

/// Pick the company office that best fits a job's stated location.
///
/// The job city is the first comma segment of `job_location`, lowercased.
/// Candidates are the grouped-by-country locations followed by the confirmed
/// locations; the first whose city contains the job city, or is contained in
/// it, wins. Without a match the headquarters is used; without a
/// headquarters there is no match.
#[must_use]
pub fn find_best_address(
    record: &CompanyLocationRecord,
    job_location: &str,
) -> Option<AddressMatch> {
    let job_city = job_location
        .split(',')
        .next()
        .unwrap_or_default()
        .trim()
        .to_lowercase();

    if !job_city.is_empty() {
        let matched = record.candidate_locations().find(|location| {
            let city = location.city().unwrap_or_default().trim().to_lowercase();
            !city.is_empty() && (city.contains(&job_city) || job_city.contains(&city))
        });
        if let Some(location) = matched {
            return Some(AddressMatch::from_location(location));
        }
    }

    record.headquarter.as_ref().map(AddressMatch::from_location)
}

/// Memoizing front for company lookups.
///
/// Only successful lookups are memoized; a failed company is retried the
/// next time a batch references it. The memo lives as long as the resolver.
pub struct CompanyLocationResolver {
    client: Arc<VoyagerClient>,
    memo: Mutex<HashMap<String, Arc<CompanyLocationRecord>>>,
}

impl CompanyLocationResolver {
    pub fn new(client: Arc<VoyagerClient>) -> Self {
        Self {
            client,
            memo: Mutex::new(HashMap::new()),
        }
    }

    /// `None` on network failure, non-success status, or an unusable body.
    pub async fn resolve(&self, company_id: &str, csrf: &str) -> Option<Arc<CompanyLocationRecord>> {
        if let Some(hit) = self.memoized(company_id) {
            return Some(hit);
        }

        match self.client.fetch_company(company_id, csrf).await {
            Ok(record) => {
                let record = Arc::new(record);
                self.memo
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .insert(company_id.to_owned(), Arc::clone(&record));
                Some(record)
            }
            Err(e) => {
                tracing::warn!(company_id, error = %e, "company lookup failed");
                None
            }
        }
    }

    pub fn clear(&self) {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }

    fn memoized(&self, company_id: &str) -> Option<Arc<CompanyLocationRecord>> {
        self.memo
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(company_id)
            .cloned()
    }
}
