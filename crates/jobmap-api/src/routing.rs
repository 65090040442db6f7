//! Driving routes from an OSRM-compatible routing service.

use reqwest::{Client, Url};
use serde::Deserialize;

use jobmap_core::Coordinate;

use crate::error::ApiError;
use crate::{build_http_client, parse_base_url};

const DEFAULT_BASE_URL: &str = "https://router.project-osrm.org/route/v1/driving/";

/// First route returned by the service, in the service's own units.
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    /// Ordered points of the route line.
    pub path: Vec<Coordinate>,
    pub distance_m: f64,
    pub duration_s: f64,
}

#[derive(Debug, Deserialize)]
struct RouteResponse {
    #[serde(default)]
    routes: Vec<RawRoute>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    geometry: Option<Geometry>,
    distance: f64,
    duration: f64,
}

/// GeoJSON `LineString`; positions are `[lng, lat]`.
#[derive(Debug, Deserialize)]
struct Geometry {
    #[serde(default)]
    coordinates: Vec<Vec<f64>>,
}

pub struct RoutingClient {
    client: Client,
    base_url: Url,
}

impl RoutingClient {
    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built.
    pub fn new(timeout_secs: u64, user_agent: &str) -> Result<Self, ApiError> {
        Self::with_base_url(DEFAULT_BASE_URL, timeout_secs, user_agent)
    }

    /// # Errors
    ///
    /// Returns [`ApiError::Http`] if the `reqwest::Client` cannot be built,
    /// or [`ApiError::InvalidUrl`] if `base_url` does not parse.
    pub fn with_base_url(
        base_url: &str,
        timeout_secs: u64,
        user_agent: &str,
    ) -> Result<Self, ApiError> {
        Ok(Self {
            client: build_http_client(timeout_secs, user_agent)?,
            base_url: parse_base_url(base_url)?,
        })
    }

    /// Request a route between two points. `Ok(None)` when the service finds
    /// no route.
    ///
    /// # Errors
    ///
    /// - [`ApiError::Http`] on network failure.
    /// - [`ApiError::UnexpectedStatus`] on any non-2xx status.
    /// - [`ApiError::Deserialize`] if the body does not match the route shape.
    pub async fn route(&self, from: Coordinate, to: Coordinate) -> Result<Option<Route>, ApiError> {
        let url = self.build_url(from, to)?;
        tracing::debug!(url = %url, "requesting route");
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(ApiError::UnexpectedStatus {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }
        let body = response.text().await?;
        let parsed: RouteResponse =
            serde_json::from_str(&body).map_err(|e| ApiError::Deserialize {
                context: url.to_string(),
                source: e,
            })?;

        Ok(parsed.routes.into_iter().next().map(|r| Route {
            path: r
                .geometry
                .map(|g| {
                    g.coordinates
                        .iter()
                        .filter_map(|pos| match pos.as_slice() {
                            [lng, lat, ..] => Some(Coordinate::new(*lat, *lng)),
                            _ => None,
                        })
                        .collect()
                })
                .unwrap_or_default(),
            distance_m: r.distance,
            duration_s: r.duration,
        }))
    }

    fn build_url(&self, from: Coordinate, to: Coordinate) -> Result<Url, ApiError> {
        let segment = format!("{},{};{},{}", from.lng, from.lat, to.lng, to.lat);
        let mut url = self.base_url.join(&segment).map_err(|e| ApiError::InvalidUrl {
            url: format!("{}{segment}", self.base_url),
            reason: e.to_string(),
        })?;
        url.query_pairs_mut()
            .append_pair("overview", "full")
            .append_pair("geometries", "geojson");
        Ok(url)
    }
}
