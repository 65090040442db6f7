//! Great-circle distance and the zone-based commute heuristic.

use serde::{Deserialize, Serialize};

/// Mean Earth radius used by [`haversine_km`].
pub const EARTH_RADIUS_KM: f64 = 6371.0;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinate {
    #[must_use]
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in kilometres.
    #[must_use]
    pub fn distance_km(&self, other: &Coordinate) -> f64 {
        haversine_km(self.lat, self.lng, other.lat, other.lng)
    }

    /// Arithmetic mean of latitudes and longitudes, `None` for an empty set.
    pub fn centroid<'a, I>(points: I) -> Option<Coordinate>
    where
        I: IntoIterator<Item = &'a Coordinate>,
    {
        let (count, sum_lat, sum_lng) = points
            .into_iter()
            .fold((0u32, 0.0, 0.0), |(n, lat, lng), p| {
                (n + 1, lat + p.lat, lng + p.lng)
            });
        if count == 0 {
            return None;
        }
        let n = f64::from(count);
        Some(Coordinate::new(sum_lat / n, sum_lng / n))
    }
}

/// Haversine distance between two lat/lng points, in kilometres.
#[must_use]
pub fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    EARTH_RADIUS_KM * 2.0 * a.sqrt().atan2((1.0 - a).sqrt())
}

/// Rough door-to-door commute time in whole minutes for a straight-line
/// distance.
///
/// | Distance | Minutes |
/// |----------|---------|
/// | ≤ 2 km   | `km * 8 + 5` |
/// | ≤ 5 km   | `km * 3` |
/// | ≤ 15 km  | `km * 1.5` |
/// | ≤ 30 km  | `km * 1.2` |
/// | beyond   | `km` |
///
/// Zero, negative and non-finite distances yield `0`.
#[must_use]
pub fn estimate_commute_minutes(km: f64) -> u32 {
    if !km.is_finite() || km <= 0.0 {
        return 0;
    }
    let minutes = if km <= 2.0 {
        km * 8.0 + 5.0
    } else if km <= 5.0 {
        km * 3.0
    } else if km <= 15.0 {
        km * 1.5
    } else if km <= 30.0 {
        km * 1.2
    } else {
        km
    };
    // Finite and positive here; saturates for absurd distances.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let rounded = minutes.round() as u32;
    rounded
}
