//! Job posting and company response parsers.
//!
//! Both payloads are navigated as loose JSON: absent or mistyped fields fall
//! back to defaults instead of failing the whole item.

use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use jobmap_core::{
    Address, CompanyLocation, CompanyLocationRecord, Coordinate, JobDetail, LocationGroup,
    WorkplaceType,
};

const VECTOR_IMAGE_KEY: &str = "com.linkedin.common.VectorImage";

/// Parse a job posting body. Returns `None` when the `data` envelope is
/// missing.
pub(super) fn parse_job_posting(job_id: &str, body: &Value) -> Option<JobDetail> {
    let data = body.get("data").filter(|d| d.is_object())?;

    let workplace_urns: Vec<&str> = data
        .get("workplaceTypes")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_str)
        .collect();

    let company_id = data
        .get("companyDetails")
        .and_then(|cd| cd.get("company"))
        .and_then(Value::as_str)
        .and_then(|urn| urn.rsplit(':').next())
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .map(str::to_string);

    Some(JobDetail {
        job_id: job_id.to_string(),
        title: str_field(data, "title"),
        formatted_location: str_field(data, "formattedLocation"),
        workplace_type: WorkplaceType::from_urns(&workplace_urns),
        work_remote_allowed: data
            .get("workRemoteAllowed")
            .and_then(Value::as_bool)
            .unwrap_or(false),
        company_id,
        listed_at: data
            .get("listedAt")
            .and_then(Value::as_i64)
            .and_then(epoch_millis),
    })
}

/// Parse a company body. The service sometimes wraps the payload in `data`
/// and sometimes returns it bare.
pub(super) fn parse_company(body: &Value) -> CompanyLocationRecord {
    let d = body.get("data").filter(|d| d.is_object()).unwrap_or(body);

    let confirmed_locations = d
        .get("confirmedLocations")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(parse_location)
        .collect();

    let grouped_locations_by_country = d
        .get("groupedLocationsByCountry")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .map(|group| LocationGroup {
            locations: group
                .get("locations")
                .and_then(Value::as_array)
                .into_iter()
                .flatten()
                .map(parse_location)
                .collect(),
        })
        .collect();

    CompanyLocationRecord {
        name: d
            .get("name")
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(str::to_string),
        headquarter: d
            .get("headquarter")
            .filter(|hq| hq.is_object())
            .map(parse_location),
        confirmed_locations,
        grouped_locations_by_country,
        logo_url: parse_logo_url(d),
    }
}

fn parse_location(loc: &Value) -> CompanyLocation {
    let address = loc.get("address").filter(|a| a.is_object()).map(|a| Address {
        line1: opt_str_field(a, "line1"),
        city: opt_str_field(a, "city"),
        geographic_area: opt_str_field(a, "geographicArea"),
        postal_code: opt_str_field(a, "postalCode"),
        country: opt_str_field(a, "country"),
    });

    CompanyLocation {
        address,
        geo: parse_geo(loc),
    }
}

/// `geoLocation` wins over `geographicLocation` whenever it is present, even
/// if it turns out to be unusable. Zero coordinates count as absent.
fn parse_geo(loc: &Value) -> Option<Coordinate> {
    let geo = loc
        .get("geoLocation")
        .filter(|g| !g.is_null())
        .or_else(|| loc.get("geographicLocation"))?;
    let lat = geo.get("latitude").and_then(Value::as_f64)?;
    let lng = geo.get("longitude").and_then(Value::as_f64)?;
    if lat.abs() < f64::EPSILON || lng.abs() < f64::EPSILON {
        return None;
    }
    Some(Coordinate::new(lat, lng))
}

/// Root URL plus the path segment of the last (largest) artifact.
fn parse_logo_url(d: &Value) -> Option<String> {
    let image = d.get("logo")?.get("image")?.get(VECTOR_IMAGE_KEY)?;
    let root = image.get("rootUrl").and_then(Value::as_str)?;
    let last = image.get("artifacts").and_then(Value::as_array)?.last()?;
    let segment = last
        .get("fileIdentifyingUrlPathSegment")
        .and_then(Value::as_str)?;
    Some(format!("{root}{segment}"))
}

fn str_field(v: &Value, key: &str) -> String {
    v.get(key)
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

fn opt_str_field(v: &Value, key: &str) -> Option<String> {
    v.get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn epoch_millis(ms: i64) -> Option<DateTime<Utc>> {
    if ms <= 0 {
        return None;
    }
    Utc.timestamp_millis_opt(ms).single()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn parses_full_job_posting() {
        let body = json!({
            "data": {
                "title": "Backend Engineer",
                "formattedLocation": "Istanbul, Istanbul, Turkey",
                "workplaceTypes": ["urn:li:fs_workplaceType:3"],
                "workRemoteAllowed": true,
                "companyDetails": { "company": "urn:li:fs_normalized_company:1035" },
                "listedAt": 1_700_000_000_000_i64
            }
        });
        let job = parse_job_posting("99", &body).expect("job should parse");
        assert_eq!(job.job_id, "99");
        assert_eq!(job.title, "Backend Engineer");
        assert_eq!(job.formatted_location, "Istanbul, Istanbul, Turkey");
        assert_eq!(job.workplace_type, WorkplaceType::Hybrid);
        assert!(job.work_remote_allowed);
        assert_eq!(job.company_id.as_deref(), Some("1035"));
        assert_eq!(
            job.listed_at.map(|t| t.timestamp_millis()),
            Some(1_700_000_000_000)
        );
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let job = parse_job_posting("7", &json!({ "data": {} })).expect("job should parse");
        assert_eq!(job.title, "");
        assert_eq!(job.formatted_location, "");
        assert_eq!(job.workplace_type, WorkplaceType::OnSite);
        assert!(!job.work_remote_allowed);
        assert!(job.company_id.is_none());
        assert!(job.listed_at.is_none());
    }

    #[test]
    fn missing_data_envelope_is_none() {
        assert!(parse_job_posting("7", &json!({ "title": "x" })).is_none());
        assert!(parse_job_posting("7", &json!({ "data": null })).is_none());
    }

    #[test]
    fn company_bare_payload_and_logo() {
        let body = json!({
            "name": "Acme",
            "headquarter": {
                "address": { "city": "Ankara", "country": "TR" },
                "geographicLocation": { "latitude": 39.9, "longitude": 32.8 }
            },
            "logo": { "image": { "com.linkedin.common.VectorImage": {
                "rootUrl": "https://media.example/",
                "artifacts": [
                    { "fileIdentifyingUrlPathSegment": "100.png" },
                    { "fileIdentifyingUrlPathSegment": "400.png" }
                ]
            }}}
        });
        let record = parse_company(&body);
        assert_eq!(record.name.as_deref(), Some("Acme"));
        assert_eq!(
            record.logo_url.as_deref(),
            Some("https://media.example/400.png")
        );
        let hq = record.headquarter.expect("headquarter");
        assert_eq!(hq.city(), Some("Ankara"));
        assert_eq!(hq.geo, Some(Coordinate::new(39.9, 32.8)));
        assert!(record.confirmed_locations.is_empty());
        assert!(record.grouped_locations_by_country.is_empty());
    }

    #[test]
    fn company_wrapped_in_data_with_locations() {
        let body = json!({
            "data": {
                "confirmedLocations": [
                    { "address": { "city": "Izmir", "line1": "Alsancak" },
                      "geoLocation": { "latitude": 38.4, "longitude": 27.1 } }
                ],
                "groupedLocationsByCountry": [
                    { "locations": [ { "address": { "city": "Bursa" } } ] }
                ]
            }
        });
        let record = parse_company(&body);
        assert!(record.headquarter.is_none());
        assert!(record.logo_url.is_none());
        assert_eq!(record.confirmed_locations[0].city(), Some("Izmir"));
        assert_eq!(
            record.confirmed_locations[0].geo,
            Some(Coordinate::new(38.4, 27.1))
        );
        assert_eq!(
            record.grouped_locations_by_country[0].locations[0].city(),
            Some("Bursa")
        );
    }

    #[test]
    fn geo_location_takes_precedence_even_when_incomplete() {
        let loc = json!({
            "geoLocation": { "latitude": 41.0 },
            "geographicLocation": { "latitude": 40.0, "longitude": 29.0 }
        });
        assert!(parse_geo(&loc).is_none());
    }

    #[test]
    fn zero_coordinates_are_ignored() {
        let loc = json!({ "geoLocation": { "latitude": 0.0, "longitude": 29.0 } });
        assert!(parse_geo(&loc).is_none());
    }
}
