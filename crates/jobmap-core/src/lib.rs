pub mod app_config;
pub mod auth;
pub mod company;
pub mod config;
pub mod format;
pub mod geo;
pub mod jobs;

use thiserror::Error;

pub use app_config::{AppConfig, ConcurrencyLimits};
pub use auth::csrf_from_cookie_header;
pub use company::{Address, CompanyLocation, CompanyLocationRecord, LocationGroup};
pub use config::{load_app_config, load_app_config_from_env};
pub use format::{format_distance, time_ago};
pub use geo::{estimate_commute_minutes, haversine_km, Coordinate, EARTH_RADIUS_KM};
pub use jobs::{GeocodedJob, JobDetail, WorkplaceType};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },
}
