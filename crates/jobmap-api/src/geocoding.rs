//! Forward geocoding against the Mapbox places endpoint.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Client, Url};
use serde_json::Value;

use jobmap_core::Coordinate;

use crate::error::ApiError;
use crate::{build_http_client, parse_base_url};

const DEFAULT_BASE_URL: &str = "https://api.mapbox.com/geocoding/v5/mapbox.places/";

/// Same unreserved set as JavaScript's `encodeURIComponent`.
const PATH_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub struct GeocodingClient {
    client: Client,
    base_url: Url,
    access_token: String,
}

impl GeocodingClient {
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(access_token: &str, timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, access_token, timeout_secs, user_agent)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ApiError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        access_token: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
            access_token: access_token.to_owned(),
        })
    }

    /// Resolve a free-text address to the centre of the best-ranked feature.
    ///
    /// `proximity` biases results toward a point; `country` (two-letter code,
    /// any case) restricts them to one country. An empty feature list is
    /// `Ok(None)`.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ApiError::Deserialize`] if the body is not JSON.
    pub async fn geocode(
        &self,
        address: &str,
        proximity: Option<Coordinate>,
        country: Option<&str>,
    ) -> Result<Option<Coordinate>, ApiError> {
        let url = self.build_url(address, proximity, country)?;
        tracing::debug!(address, country, "geocoding address");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: redact_token(&url),
            });
        }
        let body = response.text().await?;
        let json: Value = serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
            context: format!("geocode({address})"),
            source: e,
        })?;
        Ok(first_feature_center(&json))
    }

    fn build_url(
        &self,
        address: &str,
        proximity: Option<Coordinate>,
        country: Option<&str>,
    ) -> Result<Url, ApiError> {
        let segment = format!("{}.json", utf8_percent_encode(address, PATH_COMPONENT));
        let mut url = self.base_url.join(&segment).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{segment}", self.base_url),
            reason: e.to_string(),
        })?;
        {
            let mut pairs = url.query_pairs_mut();
            pairs.append_pair("access_token", &self.access_token);
            pairs.append_pair("limit", "1");
            if let Some(p) = proximity {
                pairs.append_pair("proximity", &format!("{},{}", p.lng, p.lat));
            }
            if let Some(c) = country.map(str::trim).filter(|c| !c.is_empty()) {
                pairs.append_pair("country", &c.to_lowercase());
            }
        }
        Ok(url)
    }
}

/// Features carry their centre as `[lng, lat]`.
fn first_feature_center(json: &Value) -> Option<Coordinate> {
    let center = json
        .get("features")?
        .as_array()?
        .first()?
        .get("center")?
        .as_array()?;
    let lng = center.first()?.as_f64()?;
    let lat = center.get(1)?.as_f64()?;
    Some(Coordinate::new(lat, lng))
}

fn redact_token(url: &Url) -> String {
    let mut redacted = url.clone();
    let pairs: Vec<(String, String)> = url
        .query_pairs()
        .map(|(k, v)| {
            let v = if k == "access_token" {
                "[redacted]".to_string()
            } else {
                v.into_owned()
            };
            (k.into_owned(), v)
        })
        .collect();
    redacted.query_pairs_mut().clear().extend_pairs(pairs);
    redacted.to_string()
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn test_client() -> GeocodingClient {
        GeocodingClient::with_base_url("https://geo.example/places", "tok", 5, "t")
            .expect("client construction should not fail")
    }

    #[test]
    fn build_url_encodes_address_like_uri_component() {
        let url = test_client()
            .build_url("Levent, Istanbul (TR)", None, None)
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://geo.example/places/Levent%2C%20Istanbul%20(TR).json?access_token=tok&limit=1"
        );
    }

    #[test]
    fn build_url_adds_proximity_and_lowercase_country() {
        let url = test_client()
            .build_url("Berlin", Some(Coordinate::new(52.5, 13.4)), Some("DE"))
            .unwrap();
        let pairs: Vec<(String, String)> = url
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();
        assert!(pairs.contains(&("proximity".into(), "13.4,52.5".into())));
        assert!(pairs.contains(&("country".into(), "de".into())));
    }

    #[test]
    fn first_feature_center_reads_lng_lat_order() {
        let body = json!({ "features": [
            { "center": [28.97, 41.01] },
            { "center": [0.0, 0.0] }
        ]});
        assert_eq!(
            first_feature_center(&body),
            Some(Coordinate::new(41.01, 28.97))
        );
    }

    #[test]
    fn no_features_is_none() {
        assert!(first_feature_center(&json!({ "features": [] })).is_none());
        assert!(first_feature_center(&json!({})).is_none());
    }

    #[test]
    fn redact_token_hides_access_token() {
        let url = test_client().build_url("Berlin", None, None).unwrap();
        let shown = redact_token(&url);
        assert!(!shown.contains("tok&"));
        assert!(shown.contains("redacted"));
    }
}
