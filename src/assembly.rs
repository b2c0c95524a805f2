//! Response assembly.

use chrono::{SecondsFormat, Utc};
use tracing::info;
use uuid::Uuid;

use crate::model::{EnrichmentResult, RoutePlan, TimelineEntry, TripResponse, ValidatedRoute};

/// Timeline for one route. Each entry's travel-to-next is the following entry's travel-from-previous.
pub fn build_timeline(route: &ValidatedRoute) -> Vec<TimelineEntry> {
    route
        .entries
        .iter()
        .enumerate()
        .map(|(i, entry)| TimelineEntry {
            attraction_id: entry.attraction_id.clone(),
            attraction_name: entry.attraction_name.clone(),
            offset_start_min: entry.offset_start_min,
            offset_end_min: entry.offset_end_min,
            visit_duration_minutes: entry.visit_minutes,
            travel_to_next_minutes: route.entries.get(i + 1).map(|next| next.travel_from_prev_min),
            cost: entry.cost,
        })
        .collect()
}

pub fn build_route_plan(index: usize, route: &ValidatedRoute, enrichment: EnrichmentResult) -> RoutePlan {
    let mut explanation = enrichment.explanation;
    if !enrichment.narrative.is_empty() {
        explanation.push_str("\n\n");
        explanation.push_str(&enrichment.narrative);
    }

    RoutePlan {
        route_id: format!("route_{}_{}", index + 1, route.theme),
        theme: route.theme,
        attractions: route.ordered_ids.clone(),
        timeline: build_timeline(route),
        total_duration_hours: f64::from(route.total_duration_min) / 60.0,
        total_cost: route.total_cost,
        explanation,
        path: route.path.clone(),
        micro_stops: enrichment.micro_stops,
    }
}

/// Pairs routes with their enrichment, in order. Routes without a matching enrichment are dropped.
pub fn assemble_response(
    routes: &[ValidatedRoute],
    enrichments: Vec<EnrichmentResult>,
    candidate_count: usize,
    trip_description: Option<String>,
) -> TripResponse {
    let plans: Vec<RoutePlan> = routes
        .iter()
        .zip(enrichments)
        .enumerate()
        .map(|(i, (route, enrichment))| build_route_plan(i, route, enrichment))
        .collect();
    info!(routes = plans.len(), candidate_count, "assembled response");

    TripResponse {
        request_id: Uuid::new_v4().to_string(),
        generated_at: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
        candidate_count,
        trip_description,
        routes: plans,
    }
}
