//! End-to-end trip planning.
//!
//! Catalog -> candidate pool -> travel graph -> per-theme skeletons ->
//! schedule validation -> enrichment -> response.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{info, info_span};

use crate::assembly::assemble_response;
use crate::catalog::Catalog;
use crate::enrichment::{EnrichmentInput, TemplateEnricher, describe_trip, enrich_routes};
use crate::error::PlannerError;
use crate::graph::RouteGraph;
use crate::haversine::HaversineEstimator;
use crate::model::{TripRequest, TripResponse, ValidatedRoute};
use crate::pool::{CandidatePool, select_pool};
use crate::schedule::validate_all;
use crate::skeleton::{SkeletonOptions, generate_skeletons};
use crate::traits::Enricher;

#[derive(Debug, Clone)]
pub struct PlannerOptions {
    /// Seed for theme jitter. `None` draws from OS entropy.
    pub seed: Option<u64>,
    /// Score penalty for candidates already used by an earlier theme.
    pub reuse_penalty: f64,
    /// Maximum 2-opt passes per skeleton.
    pub two_opt_iterations: usize,
    /// Cap on ranked non-must candidates.
    pub max_candidates: usize,
    pub max_micro_stops: usize,
    /// Deadline for each enrichment or description call before the local fallback is used.
    pub enrichment_timeout: Duration,
}

impl Default for PlannerOptions {
    fn default() -> Self {
        Self {
            seed: None,
            reuse_penalty: 0.25,
            two_opt_iterations: 100,
            max_candidates: 100,
            max_micro_stops: 3,
            enrichment_timeout: Duration::from_secs(30),
        }
    }
}

impl PlannerOptions {
    fn skeleton_options(&self) -> SkeletonOptions {
        SkeletonOptions {
            reuse_penalty: self.reuse_penalty,
            two_opt_iterations: self.two_opt_iterations,
        }
    }
}

/// Rejects requests that no pipeline stage could satisfy.
pub fn validate_request(request: &TripRequest) -> Result<(), PlannerError> {
    if !request.duration_hours.is_finite() || request.duration_hours <= 0.0 {
        return Err(PlannerError::InputValidation(format!(
            "duration must be positive, got {}",
            request.duration_hours
        )));
    }
    let budget = request.budget;
    if !budget.min.is_finite() || !budget.max.is_finite() || budget.min < 0.0 || budget.min > budget.max {
        return Err(PlannerError::InputValidation(format!(
            "budget must satisfy 0 <= min <= max, got {}..{}",
            budget.min, budget.max
        )));
    }
    if !request.start.is_valid() || !request.end.is_valid() {
        return Err(PlannerError::InputValidation(
            "start and end must be valid coordinates".to_string(),
        ));
    }
    Ok(())
}

/// Scheduled routes before enrichment, with the pool they were drawn from.
#[derive(Debug, Clone)]
pub struct PlannedRoutes {
    pub pool: CandidatePool,
    pub routes: Vec<ValidatedRoute>,
}

pub struct TripPlanner<E: ?Sized = TemplateEnricher> {
    enricher: Arc<E>,
    options: PlannerOptions,
}

impl TripPlanner<TemplateEnricher> {
    /// Planner that never calls out and uses the canned narrative.
    pub fn offline(options: PlannerOptions) -> Self {
        Self::new(TemplateEnricher, options)
    }
}

impl<E: Enricher + 'static> TripPlanner<E> {
    pub fn new(enricher: E, options: PlannerOptions) -> Self {
        Self::from_shared(Arc::new(enricher), options)
    }
}

impl<E: Enricher + ?Sized + 'static> TripPlanner<E> {
    /// Planner around an enricher that is shared with other planners.
    pub fn from_shared(enricher: Arc<E>, options: PlannerOptions) -> Self {
        Self { enricher, options }
    }

    /// Loads the catalog for `request.city` from `data_dir` and plans against it.
    pub fn plan_for_city(&self, data_dir: impl AsRef<Path>, request: &TripRequest) -> Result<TripResponse, PlannerError> {
        validate_request(request)?;
        let city = request
            .city
            .as_deref()
            .filter(|city| !city.trim().is_empty())
            .ok_or_else(|| PlannerError::InputValidation("city is required to locate a catalog".to_string()))?;
        let catalog = Catalog::for_city(data_dir, city)?;
        self.plan(&catalog, request)
    }

    /// Pool selection through schedule validation. No collaborator is called.
    pub fn plan_routes(&self, catalog: &Catalog, request: &TripRequest) -> Result<PlannedRoutes, PlannerError> {
        validate_request(request)?;

        let pool = select_pool(catalog, request, self.options.max_candidates);
        if pool.is_empty() {
            info!("empty candidate pool, no routes to build");
            return Ok(PlannedRoutes {
                pool,
                routes: Vec::new(),
            });
        }

        let estimator = HaversineEstimator::for_mode(request.transport);
        let graph = RouteGraph::build(request.start, request.end, pool.all(), &estimator);

        let mut rng = match self.options.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let skeletons = generate_skeletons(&graph, &pool, &self.options.skeleton_options(), &mut rng);
        let routes = validate_all(&skeletons, &graph, &pool, request);

        Ok(PlannedRoutes { pool, routes })
    }

    pub fn plan(&self, catalog: &Catalog, request: &TripRequest) -> Result<TripResponse, PlannerError> {
        let span = info_span!("plan_trip", transport = %request.transport, hours = request.duration_hours);
        let _guard = span.enter();

        let PlannedRoutes { pool, routes } = self.plan_routes(catalog, request)?;
        let candidate_count = pool.len();
        if routes.is_empty() {
            return Ok(assemble_response(&[], Vec::new(), candidate_count, None));
        }

        let input = EnrichmentInput::new(request.clone(), pool.all().cloned().collect());
        let timeout = self.options.enrichment_timeout;
        let (enrichments, description) = rayon::join(
            || enrich_routes(&self.enricher, &routes, &input, self.options.max_micro_stops, timeout),
            || describe_trip(&self.enricher, &routes, &input, timeout),
        );

        Ok(assemble_response(&routes, enrichments, candidate_count, description))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Budget, GeoPoint};

    fn request() -> TripRequest {
        TripRequest::new(GeoPoint::new(51.752, -1.2577), GeoPoint::new(51.75, -1.2568), 6.0)
    }

    #[test]
    fn test_rejects_non_positive_duration() {
        let mut bad = request();
        bad.duration_hours = 0.0;
        assert!(matches!(validate_request(&bad), Err(PlannerError::InputValidation(_))));
        bad.duration_hours = f64::NAN;
        assert!(matches!(validate_request(&bad), Err(PlannerError::InputValidation(_))));
    }

    #[test]
    fn test_rejects_inverted_budget() {
        let mut bad = request();
        bad.budget = Budget { min: 60.0, max: 50.0 };
        assert!(matches!(validate_request(&bad), Err(PlannerError::InputValidation(_))));
        bad.budget = Budget { min: -1.0, max: 50.0 };
        assert!(matches!(validate_request(&bad), Err(PlannerError::InputValidation(_))));
    }

    #[test]
    fn test_accepts_zero_budget() {
        let mut ok = request();
        ok.budget = Budget { min: 0.0, max: 0.0 };
        assert!(validate_request(&ok).is_ok());
    }

    #[test]
    fn test_empty_catalog_gives_empty_response() {
        let planner = TripPlanner::offline(PlannerOptions::default());
        let response = planner.plan(&Catalog::default(), &request()).unwrap();
        assert!(response.routes.is_empty());
        assert_eq!(response.candidate_count, 0);
        assert!(response.trip_description.is_none());
    }

    #[test]
    fn test_plan_for_city_requires_city() {
        let planner = TripPlanner::offline(PlannerOptions::default());
        let dir = tempfile::tempdir().unwrap();
        let err = planner.plan_for_city(dir.path(), &request()).unwrap_err();
        assert!(matches!(err, PlannerError::InputValidation(_)));
    }

    #[test]
    fn test_plan_for_city_missing_catalog_is_data_load_error() {
        let planner = TripPlanner::offline(PlannerOptions::default());
        let dir = tempfile::tempdir().unwrap();
        let mut req = request();
        req.city = Some("oxford".to_string());
        let err = planner.plan_for_city(dir.path(), &req).unwrap_err();
        assert!(matches!(err, PlannerError::DataLoad(_)));
    }

    #[test]
    fn test_invalid_request_checked_before_catalog() {
        let planner = TripPlanner::offline(PlannerOptions::default());
        let mut req = request();
        req.city = Some("nowhere".to_string());
        req.duration_hours = -2.0;
        let err = planner.plan_for_city("/nonexistent", &req).unwrap_err();
        assert!(matches!(err, PlannerError::InputValidation(_)));
    }
}
