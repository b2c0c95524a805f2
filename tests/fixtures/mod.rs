//! Test fixtures for trip-planner.
//!
//! Provides realistic test data including:
//! - Real Oxford attractions and start points
//! - Request builders and scripted enrichers

#![allow(dead_code)]

pub mod oxford_attractions;

pub use oxford_attractions::*;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::thread;
use std::time::Duration;

use trip_planner::enrichment::EnrichmentContext;
use trip_planner::error::EnrichmentError;
use trip_planner::model::{Budget, EnrichmentResult, GeoPoint, TransportMode, TripRequest, ValidatedRoute};
use trip_planner::traits::Enricher;

/// Builder for trip requests.
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: TripRequest,
}

impl RequestBuilder {
    pub fn new(start: GeoPoint, end: GeoPoint, hours: f64) -> Self {
        Self {
            request: TripRequest::new(start, end, hours),
        }
    }

    pub fn oxford_day(hours: f64) -> Self {
        Self::new(CARFAX, CHRIST_CHURCH, hours)
    }

    pub fn must_visit(mut self, ids: &[&str]) -> Self {
        self.request.must_visit_ids = ids.iter().map(|id| id.to_string()).collect();
        self
    }

    pub fn budget(mut self, min: f64, max: f64) -> Self {
        self.request.budget = Budget { min, max };
        self
    }

    pub fn transport(mut self, mode: TransportMode) -> Self {
        self.request.transport = mode;
        self
    }

    pub fn city(mut self, city: &str) -> Self {
        self.request.city = Some(city.to_string());
        self
    }

    pub fn preferences(mut self, text: &str) -> Self {
        self.request.preferences = text.to_string();
        self
    }

    pub fn build(self) -> TripRequest {
        self.request
    }
}

/// Enricher whose collaborator is always down.
#[derive(Debug, Default)]
pub struct FailingEnricher {
    pub calls: AtomicUsize,
}

impl Enricher for FailingEnricher {
    fn enrich(&self, _: &ValidatedRoute, _: &EnrichmentContext<'_>) -> Result<EnrichmentResult, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EnrichmentError::Unavailable("connection refused".to_string()))
    }

    fn describe(&self, _: &[ValidatedRoute], _: &EnrichmentContext<'_>) -> Result<String, EnrichmentError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(EnrichmentError::Unavailable("connection refused".to_string()))
    }
}

/// Enricher that suggests every id it is given, including ones that don't exist.
#[derive(Debug, Clone)]
pub struct GreedyEnricher {
    pub suggestions: Vec<String>,
}

impl Enricher for GreedyEnricher {
    fn enrich(&self, route: &ValidatedRoute, _: &EnrichmentContext<'_>) -> Result<EnrichmentResult, EnrichmentError> {
        Ok(EnrichmentResult {
            explanation: format!("{} picks", route.theme),
            micro_stops: self.suggestions.clone(),
            narrative: String::new(),
        })
    }

    fn describe(&self, routes: &[ValidatedRoute], _: &EnrichmentContext<'_>) -> Result<String, EnrichmentError> {
        Ok(format!("{} ways to see Oxford.", routes.len()))
    }
}

/// Enricher that answers correctly, but only after `delay`.
#[derive(Debug, Clone)]
pub struct SlowEnricher {
    pub delay: Duration,
}

impl Enricher for SlowEnricher {
    fn enrich(&self, _: &ValidatedRoute, _: &EnrichmentContext<'_>) -> Result<EnrichmentResult, EnrichmentError> {
        thread::sleep(self.delay);
        Ok(EnrichmentResult {
            explanation: "Worth the wait.".to_string(),
            micro_stops: Vec::new(),
            narrative: String::new(),
        })
    }

    fn describe(&self, _: &[ValidatedRoute], _: &EnrichmentContext<'_>) -> Result<String, EnrichmentError> {
        thread::sleep(self.delay);
        Ok("Worth the wait.".to_string())
    }
}
