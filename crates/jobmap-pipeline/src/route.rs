use jobmap_api::RoutingClient;
use jobmap_core::Coordinate;

/// A driving route reduced to display units.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSummary {
    pub path: Vec<Coordinate>,
    /// Kilometres rounded to one decimal place.
    pub distance_km: f64,
    /// Whole minutes, rounded.
    pub duration_min: u32,
}

impl RouteSummary {
    /// Distance with exactly one decimal, e.g. `"12.3"`.
    #[must_use]
    pub fn distance_label(&self) -> String {
        format!("{:.1}", self.distance_km)
    }
}

/// One routing request per call; no caching, no retry.
pub struct RouteEstimator {
    client: RoutingClient,
}

impl RouteEstimator {
    pub fn new(client: RoutingClient) -> Self {
        Self { client }
    }

    /// `None` on network failure, non-success status, or when the service
    /// finds no route.
    pub async fn get_route(&self, from: Coordinate, to: Coordinate) -> Option<RouteSummary> {
        match self.client.route(from, to).await {
            Ok(Some(route)) => Some(summarize(route.path, route.distance_m, route.duration_s)),
            Ok(None) => {
                tracing::info!("routing service returned no route");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "route request failed");
                None
            }
        }
    }
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn summarize(path: Vec<Coordinate>, distance_m: f64, duration_s: f64) -> RouteSummary {
    RouteSummary {
        path,
        distance_km: (distance_m / 100.0).round() / 10.0,
        duration_min: (duration_s / 60.0).round().max(0.0) as u32,
    }
}
