//! Seams between the planning core and its collaborators.
//!
//! The core needs a way to estimate travel between two coordinates and,
//! optionally, an enricher (usually backed by a language model) to add
//! narrative to finished routes.

use crate::enrichment::EnrichmentContext;
use crate::error::EnrichmentError;
use crate::model::{EnrichmentResult, GeoPoint, ValidatedRoute};

/// Estimated cost of travelling between two points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TravelEstimate {
    pub seconds: u32,
    pub distance_km: f64,
}

/// Estimates travel between two coordinates.
///
/// Implementations must be symmetric: the route graph asks once per
/// unordered pair and uses the answer in both directions.
pub trait TravelTimeEstimator {
    fn estimate(&self, from: GeoPoint, to: GeoPoint) -> TravelEstimate;
}

/// A text completion backend.
pub trait LanguageModel: Send + Sync {
    fn complete(&self, system: &str, prompt: &str) -> Result<String, EnrichmentError>;
}

/// Adds narrative to validated routes.
///
/// Calls are independent and idempotent. The planner issues them
/// concurrently under a deadline and replaces any error or late answer with
/// a local fallback.
pub trait Enricher: Send + Sync {
    fn enrich(
        &self,
        route: &ValidatedRoute,
        context: &EnrichmentContext<'_>,
    ) -> Result<EnrichmentResult, EnrichmentError>;

    /// One summary covering every route offered for the trip.
    fn describe(
        &self,
        routes: &[ValidatedRoute],
        context: &EnrichmentContext<'_>,
    ) -> Result<String, EnrichmentError>;
}

