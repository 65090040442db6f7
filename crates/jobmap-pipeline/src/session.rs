//! One browsing session: the accumulated jobs, the caches, the reference
//! location, and scan coordination.
//!
//! Durable state (geocode cache, reference location) lives in one store and
//! outlives the session; accumulated jobs and captured company names live
//! in a session-scoped store. The company memo lives only as long as the
//! session object.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use serde::Deserialize;

use jobmap_api::{ApiError, GeocodingClient, RoutingClient, VoyagerClient};
use jobmap_core::{AppConfig, Coordinate, GeocodedJob};

use crate::enrich::{proximity_hint, EnrichmentPipeline};
use crate::error::ScanError;
use crate::geocode_cache::GeocodeCache;
use crate::query::{filter_and_sort, JobFilter, SortOrder};
use crate::route::{RouteEstimator, RouteSummary};
use crate::storage::{load_json, remove_logged, save_json_logged, FileStore, KeyValueStore};
use crate::store::{AccumulatedJobStore, ALL_JOBS_KEY, COMPANY_NAMES_KEY};

/// Key of the pre-v3 geocode cache; its presence triggers a reset.
pub const LEGACY_GEOCODE_CACHE_KEY: &str = "ljm_geocode_cache";
pub const MY_LOCATION_KEY: &str = "ljm_my_location";

/// Job ids (and employer names, when shown) visible on the current page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageSnapshot {
    pub job_ids: Vec<String>,
    #[serde(default)]
    pub company_names: HashMap<String, String>,
}

pub trait JobPageSource: Send + Sync {
    fn snapshot(&self) -> PageSnapshot;
}

impl JobPageSource for PageSnapshot {
    fn snapshot(&self) -> PageSnapshot {
        self.clone()
    }
}

/// Supplies the per-request job-site credential.
pub trait CredentialSource: Send + Sync {
    fn csrf_token(&self) -> Option<String>;
}

/// A credential fixed at startup.
#[derive(Clone, Default)]
pub struct StaticCredential(pub Option<String>);

impl CredentialSource for StaticCredential {
    fn csrf_token(&self) -> Option<String> {
        self.0.clone()
    }
}

impl fmt::Debug for StaticCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let shown = if self.0.is_some() { "[redacted]" } else { "None" };
        f.debug_tuple("StaticCredential").field(&shown).finish()
    }
}

/// Progress and outcome notices emitted while scanning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanStatus {
    NoNewJobs { total: usize },
    FetchingNew { count: usize },
    JobsProgress { done: usize, total: usize },
    GettingAddresses { count: usize },
    CompaniesProgress { done: usize, total: usize },
    PreciseGeocoding { precise: usize, total: usize },
    GeocodingProgress { done: usize, total: usize },
    Collected { total: usize, precise: usize },
    MissingCredential,
}

impl fmt::Display for ScanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NoNewJobs { total } => write!(f, "No new jobs on this page ({total} total)"),
            Self::FetchingNew { count } => write!(f, "Fetching {count} new jobs..."),
            Self::JobsProgress { done, total } => write!(f, "Jobs: {done}/{total}"),
            Self::GettingAddresses { count } => {
                write!(f, "Getting office addresses for {count} jobs...")
            }
            Self::CompaniesProgress { done, total } => write!(f, "Companies: {done}/{total}"),
            Self::PreciseGeocoding { precise, total } => {
                write!(f, "{precise}/{total} precise addresses, geocoding...")
            }
            Self::GeocodingProgress { done, total } => write!(f, "Geocoding: {done}/{total}"),
            Self::Collected { total, precise } => {
                write!(f, "{total} jobs collected ({precise} precise)")
            }
            Self::MissingCredential => f.write_str("Session credential not found; sign in and reload"),
        }
    }
}

pub trait StatusSink: Send + Sync {
    fn update(&self, status: ScanStatus);
}

/// Emits every status as an `info` event.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingStatus;

impl StatusSink for TracingStatus {
    fn update(&self, status: ScanStatus) {
        tracing::info!("{status}");
    }
}

/// Counts from one completed scan.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScanReport {
    /// Distinct job ids on the page.
    pub discovered: usize,
    /// Of those, ids not yet accumulated.
    pub new: usize,
    pub fetched: usize,
    pub enriched: usize,
    pub precise: usize,
    pub geocoded: usize,
    /// Accumulated jobs after merging.
    pub total: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScanOutcome {
    /// The scan ran, followed by any scans requested meanwhile; the report
    /// is from the last one.
    Completed(ScanReport),
    /// Another scan was in flight; it will run one more scan when done.
    Deferred,
}

#[derive(Debug, Default)]
struct ScanGate {
    in_flight: bool,
    pending: bool,
}

pub struct JobMapSession {
    pipeline: EnrichmentPipeline,
    routes: RouteEstimator,
    jobs: AccumulatedJobStore,
    durable: Arc<dyn KeyValueStore>,
    credentials: Box<dyn CredentialSource>,
    status: Box<dyn StatusSink>,
    reference: Mutex<Option<Coordinate>>,
    gate: Mutex<ScanGate>,
    pages_scanned: AtomicUsize,
}

impl JobMapSession {
    /// Start a session over the given stores.
    ///
    /// A legacy geocode cache found in `durable` is removed together with
    /// any accumulated session state before the job store is loaded.
    pub fn new(
        pipeline: EnrichmentPipeline,
        routes: RouteEstimator,
        durable: Arc<dyn KeyValueStore>,
        session: Arc<dyn KeyValueStore>,
        credentials: Box<dyn CredentialSource>,
        status: Box<dyn StatusSink>,
    ) -> Self {
        migrate_legacy_cache(durable.as_ref(), session.as_ref());

        let jobs = AccumulatedJobStore::load(session);
        let reference = load_json(durable.as_ref(), MY_LOCATION_KEY);
        let pages_scanned = usize::from(!jobs.is_empty());

        Self {
            pipeline,
            routes,
            jobs,
            durable,
            credentials,
            status,
            reference: Mutex::new(reference),
            gate: Mutex::new(ScanGate::default()),
            pages_scanned: AtomicUsize::new(pages_scanned),
        }
    }

    /// Wire clients and file-backed stores from configuration. Stores live
    /// under `<data_dir>/durable` and `<data_dir>/session`.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError`] if an HTTP client cannot be built or a base URL
    /// does not parse.
    pub fn from_config(config: &AppConfig, status: Box<dyn StatusSink>) -> Result<Self, ApiError> {
        let timeout = config.request_timeout_secs;
        let ua = config.user_agent.as_str();

        let voyager = VoyagerClient::with_base_url(
            &config.voyager_base_url,
            timeout,
            ua,
            config.cookie.clone(),
        )?;
        let geocoder = GeocodingClient::with_base_url(
            &config.geocoding_base_url,
            &config.mapbox_token,
            timeout,
            ua,
        )?;
        let router = RoutingClient::with_base_url(&config.routing_base_url, timeout, ua)?;

        let (durable, session) = file_stores(&config.data_dir);
        let pipeline = EnrichmentPipeline::new(
            Arc::new(voyager),
            geocoder,
            GeocodeCache::new(Arc::clone(&durable)),
            config.concurrency,
        );

        Ok(Self::new(
            pipeline,
            RouteEstimator::new(router),
            durable,
            session,
            Box::new(StaticCredential(config.csrf_token.clone())),
            status,
        ))
    }

    #[must_use]
    pub fn jobs(&self) -> &AccumulatedJobStore {
        &self.jobs
    }

    #[must_use]
    pub fn pages_scanned(&self) -> usize {
        self.pages_scanned.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn reference_location(&self) -> Option<Coordinate> {
        *self.reference()
    }

    pub fn set_reference_location(&self, location: Coordinate) {
        *self.reference() = Some(location);
        save_json_logged(self.durable.as_ref(), MY_LOCATION_KEY, &location);
    }

    pub fn clear_reference_location(&self) {
        *self.reference() = None;
        remove_logged(self.durable.as_ref(), MY_LOCATION_KEY);
    }

    /// Accumulated jobs after `filter`, ordered by `sort` relative to the
    /// reference location.
    #[must_use]
    pub fn listing(&self, filter: &JobFilter, sort: SortOrder) -> Vec<GeocodedJob> {
        filter_and_sort(self.jobs.get_all(), filter, sort, self.reference_location())
    }

    /// Driving route from the reference location to `destination`; `None`
    /// without a reference location or when routing fails.
    pub async fn route_to(&self, destination: Coordinate) -> Option<RouteSummary> {
        let Some(origin) = self.reference_location() else {
            tracing::info!("no reference location set; cannot route");
            return None;
        };
        self.routes.get_route(origin, destination).await
    }

    /// Forget accumulated jobs and captured company names.
    pub fn clear_jobs(&self) {
        self.jobs.clear();
        self.pages_scanned.store(0, Ordering::SeqCst);
    }

    /// [`Self::clear_jobs`], plus the durable geocode cache and the company
    /// memo.
    pub fn clear_all_cache(&self) {
        self.pipeline.geocode_cache().clear();
        self.pipeline.companies().clear();
        self.clear_jobs();
    }

    /// Scan the page, or defer if a scan is already running.
    ///
    /// A deferred request makes the running scan perform exactly one more
    /// scan once it settles, however many requests arrived meanwhile.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError::MissingCredential`] when no credential is
    /// available for the last scan run; no request is sent in that case.
    pub async fn request_scan(&self, page: &dyn JobPageSource) -> Result<ScanOutcome, ScanError> {
        let Some(mut claim) = ScanClaim::acquire(&self.gate) else {
            tracing::debug!("scan in flight; deferring");
            return Ok(ScanOutcome::Deferred);
        };

        loop {
            let result = self.scan_once(page).await;
            if claim.take_pending() {
                tracing::debug!("running deferred scan");
                continue;
            }
            return result.map(ScanOutcome::Completed);
        }
    }

    async fn scan_once(&self, page: &dyn JobPageSource) -> Result<ScanReport, ScanError> {
        let Some(csrf) = self.credentials.csrf_token().filter(|t| !t.is_empty()) else {
            self.status.update(ScanStatus::MissingCredential);
            return Err(ScanError::MissingCredential);
        };

        let snapshot = page.snapshot();
        self.jobs.record_company_names(&snapshot.company_names);

        let mut seen = HashSet::new();
        let page_ids: Vec<String> = snapshot
            .job_ids
            .into_iter()
            .map(|id| id.trim().to_owned())
            .filter(|id| !id.is_empty() && seen.insert(id.clone()))
            .collect();
        let new_ids: Vec<String> = page_ids
            .iter()
            .filter(|id| !self.jobs.contains(id))
            .cloned()
            .collect();

        let mut report = ScanReport {
            discovered: page_ids.len(),
            new: new_ids.len(),
            ..ScanReport::default()
        };

        if new_ids.is_empty() {
            report.total = self.jobs.len();
            self.status.update(ScanStatus::NoNewJobs {
                total: report.total,
            });
            return Ok(report);
        }

        tracing::info!(new = new_ids.len(), discovered = report.discovered, "scanning page");
        self.status.update(ScanStatus::FetchingNew {
            count: new_ids.len(),
        });

        let details = self
            .pipeline
            .fetch_jobs(&new_ids, &csrf, |done, total| {
                self.status.update(ScanStatus::JobsProgress { done, total });
            })
            .await;
        report.fetched = details.len();

        self.status.update(ScanStatus::GettingAddresses {
            count: details.len(),
        });
        let enriched = self
            .pipeline
            .enrich_with_company_addresses(details, &csrf, |done, total| {
                self.status.update(ScanStatus::CompaniesProgress { done, total });
            })
            .await;
        report.enriched = enriched.len();
        report.precise = enriched.iter().filter(|j| j.has_precise_address).count();

        self.status.update(ScanStatus::PreciseGeocoding {
            precise: report.precise,
            total: enriched.len(),
        });
        let proximity = proximity_hint(self.reference_location(), &self.jobs.get_all());
        let names = self.jobs.company_names();
        let geocoded = self
            .pipeline
            .geocode_jobs(enriched, proximity, &names, |done, total| {
                self.status.update(ScanStatus::GeocodingProgress { done, total });
            })
            .await;
        report.geocoded = geocoded.len();

        if !geocoded.is_empty() {
            self.pages_scanned.fetch_add(1, Ordering::SeqCst);
            self.jobs.merge(geocoded);
        }

        let all = self.jobs.get_all();
        report.total = all.len();
        self.status.update(ScanStatus::Collected {
            total: all.len(),
            precise: all.iter().filter(|j| j.has_precise_address).count(),
        });
        tracing::info!(
            fetched = report.fetched,
            precise = report.precise,
            geocoded = report.geocoded,
            total = report.total,
            "scan complete"
        );
        Ok(report)
    }

    fn reference(&self) -> MutexGuard<'_, Option<Coordinate>> {
        self.reference.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Holds the scan gate for one `request_scan` call.
///
/// Dropping an unsettled claim (cancelled or panicking scan) reopens the
/// gate and clears any pending follow-up.
struct ScanClaim<'a> {
    gate: &'a Mutex<ScanGate>,
    released: bool,
}

impl<'a> ScanClaim<'a> {
    /// Claim the gate, or mark a follow-up pending if it is already held.
    fn acquire(gate: &'a Mutex<ScanGate>) -> Option<Self> {
        let mut state = lock_gate(gate);
        if state.in_flight {
            state.pending = true;
            return None;
        }
        state.in_flight = true;
        Some(Self {
            gate,
            released: false,
        })
    }

    /// Either claim the pending follow-up scan or release the gate.
    fn take_pending(&mut self) -> bool {
        let mut state = lock_gate(self.gate);
        if state.pending {
            state.pending = false;
            true
        } else {
            state.in_flight = false;
            self.released = true;
            false
        }
    }
}

impl Drop for ScanClaim<'_> {
    fn drop(&mut self) {
        if !self.released {
            let mut state = lock_gate(self.gate);
            state.in_flight = false;
            state.pending = false;
        }
    }
}

fn lock_gate(gate: &Mutex<ScanGate>) -> MutexGuard<'_, ScanGate> {
    gate.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Durable and session stores under `data_dir`.
#[must_use]
pub fn file_stores(data_dir: &Path) -> (Arc<dyn KeyValueStore>, Arc<dyn KeyValueStore>) {
    (
        Arc::new(FileStore::new(data_dir.join("durable"))),
        Arc::new(FileStore::new(data_dir.join("session"))),
    )
}

fn migrate_legacy_cache(durable: &dyn KeyValueStore, session: &dyn KeyValueStore) {
    match durable.get(LEGACY_GEOCODE_CACHE_KEY) {
        Ok(Some(_)) => {
            tracing::info!("removing legacy geocode cache and resetting session state");
            remove_logged(durable, LEGACY_GEOCODE_CACHE_KEY);
            remove_logged(session, ALL_JOBS_KEY);
            remove_logged(session, COMPANY_NAMES_KEY);
        }
        Ok(None) => {}
        Err(e) => tracing::warn!(error = %e, "could not check for legacy geocode cache"),
    }
}
