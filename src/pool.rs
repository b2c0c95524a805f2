//! Candidate pool selection.
//!
//! Narrows a city catalog to the attractions near the start/end corridor
//! that the traveler can afford, ranked by proximity and popularity.

use std::cmp::Ordering;
use std::collections::HashSet;

use tracing::{info, warn};

use crate::catalog::Catalog;
use crate::haversine::{haversine_km, midpoint};
use crate::model::{Attraction, GeoPoint, TripRequest};

const MIN_SEARCH_RADIUS_KM: f64 = 5.0;
const MAX_SEARCH_RADIUS_KM: f64 = 50.0;
const RADIUS_PADDING_KM: f64 = 10.0;

/// Non-must attractions priced above this share of `budget.max` are dropped.
const MAX_PRICE_SHARE: f64 = 0.5;

const PROXIMITY_WEIGHT: f64 = 0.5;
const POPULARITY_WEIGHT: f64 = 0.5;

/// Working set for one request.
#[derive(Debug, Clone)]
pub struct CandidatePool {
    pub must_visit: Vec<Attraction>,
    /// Ranked best first. Never contains a must-visit id.
    pub candidates: Vec<Attraction>,
    /// Requested must-visit ids that no catalog entry matches.
    pub unresolved: Vec<String>,
    pub midpoint: GeoPoint,
    pub radius_km: f64,
}

impl CandidatePool {
    /// Must-visit plus candidate count.
    pub fn len(&self) -> usize {
        self.must_visit.len() + self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Must-visit attractions followed by candidates.
    pub fn all(&self) -> impl Iterator<Item = &Attraction> {
        self.must_visit.iter().chain(self.candidates.iter())
    }

    pub fn must_visit_ids(&self) -> HashSet<&str> {
        self.must_visit.iter().map(|a| a.id.as_str()).collect()
    }
}

/// Half the corridor plus padding, clamped to a sane city range.
pub fn search_radius_km(start: GeoPoint, end: GeoPoint) -> f64 {
    let corridor = haversine_km(start, end);
    (corridor / 2.0 + RADIUS_PADDING_KM).clamp(MIN_SEARCH_RADIUS_KM, MAX_SEARCH_RADIUS_KM)
}

pub fn select_pool(catalog: &Catalog, request: &TripRequest, max_candidates: usize) -> CandidatePool {
    let radius_km = search_radius_km(request.start, request.end);
    let center = midpoint(request.start, request.end);

    let nearby: Vec<(&Attraction, f64)> = catalog
        .attractions()
        .iter()
        .map(|a| (a, haversine_km(center, a.location)))
        .filter(|(_, dist)| *dist <= radius_km)
        .collect();
    info!(
        catalog = catalog.len(),
        nearby = nearby.len(),
        radius_km,
        "radius filter"
    );

    let mut seen = HashSet::new();
    let mut must_visit = Vec::new();
    let mut unresolved = Vec::new();
    for id in &request.must_visit_ids {
        if !seen.insert(id.as_str()) {
            continue;
        }
        if let Some((attraction, _)) = nearby.iter().find(|(a, _)| a.id == *id) {
            must_visit.push((*attraction).clone());
        } else if let Some(attraction) = catalog.get(id) {
            info!(id = %id, "must-visit lies outside the search radius, keeping it");
            must_visit.push(attraction.clone());
        } else {
            unresolved.push(id.clone());
        }
    }
    if !unresolved.is_empty() {
        warn!(ids = ?unresolved, "must-visit ids not found in catalog");
    }

    let price_ceiling = request.budget.max * MAX_PRICE_SHARE;
    let affordable: Vec<(&Attraction, f64)> = nearby
        .into_iter()
        .filter(|(a, _)| !seen.contains(a.id.as_str()))
        .filter(|(a, _)| a.price <= price_ceiling)
        .collect();

    let max_popularity = affordable
        .iter()
        .map(|(a, _)| a.popularity)
        .fold(0.0_f64, f64::max);

    let mut scored: Vec<(&Attraction, f64)> = affordable
        .into_iter()
        .map(|(a, dist)| {
            let proximity = (1.0 - dist / radius_km).max(0.0);
            let popularity = if max_popularity > 0.0 {
                a.popularity / max_popularity
            } else {
                0.0
            };
            (a, PROXIMITY_WEIGHT * proximity + POPULARITY_WEIGHT * popularity)
        })
        .collect();
    scored.sort_by(|(_, lhs), (_, rhs)| rhs.partial_cmp(lhs).unwrap_or(Ordering::Equal));
    scored.truncate(max_candidates);

    let candidates: Vec<Attraction> = scored.into_iter().map(|(a, _)| a.clone()).collect();
    info!(
        must_visit = must_visit.len(),
        candidates = candidates.len(),
        "candidate pool"
    );

    CandidatePool {
        must_visit,
        candidates,
        unresolved,
        midpoint: center,
        radius_km,
    }
}
