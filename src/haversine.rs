//! Great-circle travel estimates.
//!
//! Uses straight-line distance inflated by a per-mode detour factor and
//! divided by a per-mode speed. Ignores the road network entirely.

use crate::model::{GeoPoint, TransportMode};
use crate::traits::{TravelEstimate, TravelTimeEstimator};

/// Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Speed and detour assumptions for one transport mode.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransportProfile {
    pub speed_kmh: f64,
    /// Multiplier applied to straight-line distance to approximate real paths.
    pub detour_factor: f64,
}

const WALK: TransportProfile = TransportProfile { speed_kmh: 5.0, detour_factor: 1.3 };
const BIKE: TransportProfile = TransportProfile { speed_kmh: 15.0, detour_factor: 1.25 };
const CAR: TransportProfile = TransportProfile { speed_kmh: 40.0, detour_factor: 1.4 };

impl TransportProfile {
    pub const fn for_mode(mode: TransportMode) -> Self {
        match mode {
            TransportMode::Walk => WALK,
            TransportMode::Bike => BIKE,
            // A driver-guide travels by car.
            TransportMode::Car | TransportMode::DriverGuide => CAR,
        }
    }
}

/// Calculate haversine distance between two points in kilometers.
pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let lat1_rad = from.lat.to_radians();
    let lat2_rad = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Arithmetic midpoint. Accurate enough at city scale.
pub fn midpoint(a: GeoPoint, b: GeoPoint) -> GeoPoint {
    GeoPoint::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0)
}

/// Haversine-based travel estimator for a single transport mode.
#[derive(Debug, Clone)]
pub struct HaversineEstimator {
    pub profile: TransportProfile,
}

impl HaversineEstimator {
    pub fn new(profile: TransportProfile) -> Self {
        Self { profile }
    }

    pub fn for_mode(mode: TransportMode) -> Self {
        Self::new(TransportProfile::for_mode(mode))
    }

    /// Travel seconds for a straight-line distance.
    pub fn seconds_for_km(&self, km: f64) -> u32 {
        let hours = km * self.profile.detour_factor / self.profile.speed_kmh;
        (hours * 3600.0).round() as u32
    }
}

impl TravelTimeEstimator for HaversineEstimator {
    fn estimate(&self, from: GeoPoint, to: GeoPoint) -> TravelEstimate {
        let km = haversine_km(from, to);
        TravelEstimate {
            seconds: self.seconds_for_km(km),
            distance_km: km * self.profile.detour_factor,
        }
    }
}
