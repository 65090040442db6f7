pub mod company;
pub mod enrich;
pub mod error;
pub mod export;
pub mod geocode_cache;
pub mod query;
pub mod route;
pub mod runner;
pub mod session;
pub mod storage;
pub mod store;

pub use company::{find_best_address, AddressMatch, CompanyLocationResolver};
pub use enrich::{country_code_from_location, proximity_hint, EnrichedJob, EnrichmentPipeline};
pub use error::{ScanError, StorageError};
pub use export::{jobs_to_csv, write_jobs_csv, CSV_HEADER};
pub use geocode_cache::{GeocodeCache, GEOCODE_CACHE_KEY};
pub use query::{filter_and_sort, Commute, CommuteBand, JobFilter, SortOrder};
pub use route::{RouteEstimator, RouteSummary};
pub use runner::run_bounded;
pub use session::{
    file_stores, CredentialSource, JobMapSession, JobPageSource, PageSnapshot, ScanOutcome,
    ScanReport, ScanStatus, StaticCredential, StatusSink, TracingStatus,
};
pub use storage::{load_json, save_json, FileStore, KeyValueStore, MemoryStore};
pub use store::AccumulatedJobStore;
