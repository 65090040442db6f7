use crate::app_config::{AppConfig, ConcurrencyLimits};
use crate::auth::csrf_from_cookie_header;
use crate::ConfigError;

/// Load application configuration from environment variables.
///
/// Calls `dotenvy::dotenv().ok()` to load `.env` files before reading env vars.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config() -> Result<AppConfig, ConfigError> {
    dotenvy::dotenv().ok();
    load_app_config_from_env()
}

/// Load application configuration from environment variables already in the process.
///
/// Unlike [`load_app_config`], this does NOT load `.env` files.
///
/// # Errors
///
/// Returns `ConfigError` if required env vars are missing or values are invalid.
pub fn load_app_config_from_env() -> Result<AppConfig, ConfigError> {
    build_app_config(|key| std::env::var(key))
}

/// Build application configuration using the provided env-var lookup function.
///
/// Decoupled from the real environment so it can be tested with a plain
/// `HashMap` lookup.
fn build_app_config<F>(lookup: F) -> Result<AppConfig, ConfigError>
where
    F: Fn(&str) -> Result<String, std::env::VarError>,
{
    use std::path::PathBuf;

    let require = |var: &str| -> Result<String, ConfigError> {
        lookup(var).map_err(|_| ConfigError::MissingEnvVar(var.to_string()))
    };

    let or_default = |var: &str, default: &str| -> String {
        lookup(var).unwrap_or_else(|_| default.to_string())
    };

    let parse_u64 = |var: &str, default: &str| -> Result<u64, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<u64>().map_err(|e| ConfigError::InvalidEnvVar {
            var: var.to_string(),
            reason: e.to_string(),
        })
    };

    // Zero would stall a stage forever; clamp to a single worker.
    let parse_pool = |var: &str, default: &str| -> Result<usize, ConfigError> {
        let raw = or_default(var, default);
        raw.parse::<usize>()
            .map(|n| n.max(1))
            .map_err(|e| ConfigError::InvalidEnvVar {
                var: var.to_string(),
                reason: e.to_string(),
            })
    };

    let mapbox_token = require("JOBMAP_MAPBOX_TOKEN")?;

    let cookie = lookup("JOBMAP_COOKIE").ok().filter(|c| !c.trim().is_empty());
    let csrf_token = lookup("JOBMAP_CSRF_TOKEN")
        .ok()
        .filter(|t| !t.trim().is_empty())
        .or_else(|| cookie.as_deref().and_then(csrf_from_cookie_header));

    let voyager_base_url = or_default(
        "JOBMAP_VOYAGER_BASE_URL",
        "https://www.linkedin.com/voyager/api/",
    );
    let geocoding_base_url = or_default(
        "JOBMAP_GEOCODING_BASE_URL",
        "https://api.mapbox.com/geocoding/v5/mapbox.places/",
    );
    let routing_base_url = or_default(
        "JOBMAP_ROUTING_BASE_URL",
        "https://router.project-osrm.org/route/v1/driving/",
    );
    let data_dir = PathBuf::from(or_default("JOBMAP_DATA_DIR", "./.jobmap"));
    let log_level = or_default("JOBMAP_LOG_LEVEL", "info");
    let request_timeout_secs = parse_u64("JOBMAP_REQUEST_TIMEOUT_SECS", "30")?;
    let user_agent = or_default("JOBMAP_USER_AGENT", "jobmap/0.1 (job-map)");

    let defaults = ConcurrencyLimits::default();
    let concurrency = ConcurrencyLimits {
        job_fetch: parse_pool("JOBMAP_JOB_CONCURRENCY", &defaults.job_fetch.to_string())?,
        company_lookup: parse_pool(
            "JOBMAP_COMPANY_CONCURRENCY",
            &defaults.company_lookup.to_string(),
        )?,
        geocode: parse_pool("JOBMAP_GEOCODE_CONCURRENCY", &defaults.geocode.to_string())?,
    };

    Ok(AppConfig {
        mapbox_token,
        csrf_token,
        cookie,
        voyager_base_url,
        geocoding_base_url,
        routing_base_url,
        data_dir,
        log_level,
        request_timeout_secs,
        user_agent,
        concurrency,
    })
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;
    use std::env::VarError;

    use super::*;

    fn lookup_from_map<'a>(
        map: &'a HashMap<&'a str, &'a str>,
    ) -> impl Fn(&str) -> Result<String, VarError> + 'a {
        move |key| {
            map.get(key)
                .map(|v| (*v).to_string())
                .ok_or(VarError::NotPresent)
        }
    }

    fn full_env<'a>() -> HashMap<&'a str, &'a str> {
        let mut m = HashMap::new();
        m.insert("JOBMAP_MAPBOX_TOKEN", "pk.test");
        m
    }

    #[test]
    fn fails_without_mapbox_token() {
        let map: HashMap<&str, &str> = HashMap::new();
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::MissingEnvVar(ref v)) if v == "JOBMAP_MAPBOX_TOKEN"),
            "expected MissingEnvVar(JOBMAP_MAPBOX_TOKEN), got: {result:?}"
        );
    }

    #[test]
    fn defaults_with_only_required_vars() {
        let map = full_env();
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.mapbox_token, "pk.test");
        assert!(cfg.csrf_token.is_none());
        assert!(cfg.cookie.is_none());
        assert_eq!(cfg.voyager_base_url, "https://www.linkedin.com/voyager/api/");
        assert_eq!(
            cfg.geocoding_base_url,
            "https://api.mapbox.com/geocoding/v5/mapbox.places/"
        );
        assert_eq!(
            cfg.routing_base_url,
            "https://router.project-osrm.org/route/v1/driving/"
        );
        assert_eq!(cfg.data_dir, std::path::PathBuf::from("./.jobmap"));
        assert_eq!(cfg.log_level, "info");
        assert_eq!(cfg.request_timeout_secs, 30);
        assert_eq!(cfg.user_agent, "jobmap/0.1 (job-map)");
        assert_eq!(cfg.concurrency, ConcurrencyLimits::default());
    }

    #[test]
    fn explicit_csrf_token_wins_over_cookie() {
        let mut map = full_env();
        map.insert("JOBMAP_CSRF_TOKEN", "explicit");
        map.insert("JOBMAP_COOKIE", "JSESSIONID=\"from-cookie\"");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.csrf_token.as_deref(), Some("explicit"));
        assert_eq!(cfg.cookie.as_deref(), Some("JSESSIONID=\"from-cookie\""));
    }

    #[test]
    fn csrf_token_derived_from_cookie() {
        let mut map = full_env();
        map.insert("JOBMAP_COOKIE", "li_at=xyz; JSESSIONID=\"ajax:123\"");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.csrf_token.as_deref(), Some("ajax:123"));
    }

    #[test]
    fn concurrency_overrides() {
        let mut map = full_env();
        map.insert("JOBMAP_JOB_CONCURRENCY", "8");
        map.insert("JOBMAP_COMPANY_CONCURRENCY", "2");
        map.insert("JOBMAP_GEOCODE_CONCURRENCY", "10");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(
            cfg.concurrency,
            ConcurrencyLimits {
                job_fetch: 8,
                company_lookup: 2,
                geocode: 10,
            }
        );
    }

    #[test]
    fn zero_concurrency_clamped_to_one() {
        let mut map = full_env();
        map.insert("JOBMAP_GEOCODE_CONCURRENCY", "0");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        assert_eq!(cfg.concurrency.geocode, 1);
    }

    #[test]
    fn invalid_concurrency_is_rejected() {
        let mut map = full_env();
        map.insert("JOBMAP_JOB_CONCURRENCY", "many");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "JOBMAP_JOB_CONCURRENCY"),
            "expected InvalidEnvVar(JOBMAP_JOB_CONCURRENCY), got: {result:?}"
        );
    }

    #[test]
    fn invalid_timeout_is_rejected() {
        let mut map = full_env();
        map.insert("JOBMAP_REQUEST_TIMEOUT_SECS", "not-a-number");
        let result = build_app_config(lookup_from_map(&map));
        assert!(
            matches!(result, Err(ConfigError::InvalidEnvVar { ref var, .. }) if var == "JOBMAP_REQUEST_TIMEOUT_SECS"),
            "expected InvalidEnvVar(JOBMAP_REQUEST_TIMEOUT_SECS), got: {result:?}"
        );
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let mut map = full_env();
        map.insert("JOBMAP_COOKIE", "JSESSIONID=secret-session");
        let cfg = build_app_config(lookup_from_map(&map)).unwrap();
        let rendered = format!("{cfg:?}");
        assert!(!rendered.contains("pk.test"));
        assert!(!rendered.contains("secret-session"));
        assert!(rendered.contains("[redacted]"));
    }
}
