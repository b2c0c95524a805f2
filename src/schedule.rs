//! Duration and budget validation of route skeletons.
//!
//! A single pass over the skeleton's interior stops decides, stop by stop,
//! whether to schedule it, skip it, or reject the whole theme.

use std::collections::{HashMap, HashSet};

use tracing::{info, warn};

use crate::error::Infeasibility;
use crate::graph::{END, RouteGraph, START};
use crate::model::{Attraction, RouteSkeleton, ScheduleEntry, TripRequest, ValidatedRoute};
use crate::polyline::Polyline;
use crate::pool::CandidatePool;

/// Travel assumed between two nodes the graph cannot connect.
const MISSING_EDGE_SECONDS: u32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Schedule,
    Skip,
    Reject,
}

fn decide(is_must: bool, over_duration: bool, over_budget: bool) -> Step {
    match (over_duration, over_budget, is_must) {
        (true, _, true) => Step::Reject,
        (true, _, false) => Step::Skip,
        // Must-visit stops ignore the budget.
        (false, true, true) => Step::Schedule,
        (false, true, false) => Step::Skip,
        (false, false, _) => Step::Schedule,
    }
}

/// Turns a skeleton into a schedule or explains why the theme is infeasible.
pub fn validate_skeleton(
    skeleton: &RouteSkeleton,
    graph: &RouteGraph,
    pool: &CandidatePool,
    request: &TripRequest,
) -> Result<ValidatedRoute, Infeasibility> {
    let lookup: HashMap<&str, &Attraction> = pool.all().map(|a| (a.id.as_str(), a)).collect();
    let must_ids = pool.must_visit_ids();
    let daily_limit = request.daily_minutes();

    let mut budget_left = request.budget.max;
    let mut elapsed: u32 = 0;
    let mut prev = START;
    let mut entries: Vec<ScheduleEntry> = Vec::new();
    let mut scheduled: Vec<(String, usize)> = Vec::new();

    for id in skeleton.attraction_ids() {
        let (Some(attraction), Some(node)) = (lookup.get(id), graph.index_of_attraction(id)) else {
            continue;
        };
        let is_must = must_ids.contains(id);

        let travel_min = graph.seconds(prev, node).unwrap_or(MISSING_EDGE_SECONDS) / 60;
        let block = travel_min.saturating_add(attraction.visit_minutes);
        let over_duration = elapsed.saturating_add(block) > daily_limit;
        let over_budget = attraction.price > budget_left;

        match decide(is_must, over_duration, over_budget) {
            Step::Reject => {
                return Err(Infeasibility::MustVisitOverDuration { id: id.to_string() });
            }
            Step::Skip => continue,
            Step::Schedule => {}
        }

        // Within the daily limit here, so neither sum can overflow.
        let offset_start_min = elapsed + travel_min;
        let offset_end_min = offset_start_min + attraction.visit_minutes;
        entries.push(ScheduleEntry {
            attraction_id: attraction.id.clone(),
            attraction_name: attraction.name.clone(),
            offset_start_min,
            offset_end_min,
            visit_minutes: attraction.visit_minutes,
            travel_from_prev_min: travel_min,
            cost: attraction.price,
        });
        scheduled.push((attraction.id.clone(), node));
        budget_left -= attraction.price;
        elapsed = offset_end_min;
        prev = node;
    }

    let scheduled_ids: HashSet<&str> = scheduled.iter().map(|(id, _)| id.as_str()).collect();
    let mut missing: Vec<String> = must_ids
        .iter()
        .filter(|id| !scheduled_ids.contains(*id))
        .map(|id| id.to_string())
        .collect();
    if !missing.is_empty() {
        missing.sort();
        return Err(Infeasibility::MustVisitUnscheduled { ids: missing });
    }

    let total_duration_min = entries.last().map(|e| e.offset_end_min).unwrap_or(0);
    let total_cost = entries.iter().map(|e| e.cost).sum();

    let mut path = Polyline::default();
    let path_nodes = std::iter::once(START)
        .chain(scheduled.iter().map(|(_, node)| *node))
        .chain(std::iter::once(END));
    for node in path_nodes {
        if let Some(location) = graph.location(node) {
            path.push(location);
        }
    }

    Ok(ValidatedRoute {
        theme: skeleton.theme,
        entries,
        ordered_ids: scheduled.into_iter().map(|(id, _)| id).collect(),
        total_duration_min,
        total_cost,
        path,
    })
}

/// Validates every skeleton, dropping infeasible themes.
pub fn validate_all(
    skeletons: &[RouteSkeleton],
    graph: &RouteGraph,
    pool: &CandidatePool,
    request: &TripRequest,
) -> Vec<ValidatedRoute> {
    skeletons
        .iter()
        .filter_map(|skeleton| match validate_skeleton(skeleton, graph, pool, request) {
            Ok(route) => {
                info!(
                    theme = %route.theme,
                    stops = route.entries.len(),
                    minutes = route.total_duration_min,
                    cost = route.total_cost,
                    "validated route"
                );
                Some(route)
            }
            Err(reason) => {
                warn!(theme = %skeleton.theme, %reason, "dropping infeasible theme");
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Budget, GeoPoint, RouteNode, Theme};
    use crate::traits::{TravelEstimate, TravelTimeEstimator};

    /// One minute per 0.001 degrees of latitude.
    struct MinuteGrid;

    impl TravelTimeEstimator for MinuteGrid {
        fn estimate(&self, from: GeoPoint, to: GeoPoint) -> TravelEstimate {
            let d = (from.lat - to.lat).abs() + (from.lng - to.lng).abs();
            TravelEstimate {
                seconds: (d * 60_000.0).round() as u32,
                distance_km: d,
            }
        }
    }

    fn attraction(id: &str, lat: f64, price: f64, minutes: u32) -> Attraction {
        Attraction::new(id, id.to_uppercase(), GeoPoint::new(lat, 0.0))
            .with_price(price)
            .with_visit_minutes(minutes)
    }

    fn fixture(must: Vec<Attraction>, candidates: Vec<Attraction>) -> (CandidatePool, RouteGraph) {
        let pool = CandidatePool {
            must_visit: must,
            candidates,
            unresolved: Vec::new(),
            midpoint: GeoPoint::new(0.0, 0.0),
            radius_km: 10.0,
        };
        let graph = RouteGraph::build(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.01, 0.0), pool.all(), &MinuteGrid);
        (pool, graph)
    }

    fn skeleton(ids: &[&str]) -> RouteSkeleton {
        let mut nodes = vec![RouteNode::Start];
        nodes.extend(ids.iter().map(|id| RouteNode::Attraction(id.to_string())));
        nodes.push(RouteNode::End);
        RouteSkeleton {
            theme: Theme::Balanced,
            ordered_nodes: nodes,
            total_travel_seconds: 0,
        }
    }

    fn request(hours: f64, budget_max: f64) -> TripRequest {
        let mut request = TripRequest::new(GeoPoint::new(0.0, 0.0), GeoPoint::new(0.01, 0.0), hours);
        request.budget = Budget { min: 0.0, max: budget_max };
        request
    }

    #[test]
    fn test_decision_table() {
        assert_eq!(decide(true, true, false), Step::Reject);
        assert_eq!(decide(false, true, false), Step::Skip);
        assert_eq!(decide(true, false, true), Step::Schedule);
        assert_eq!(decide(false, false, true), Step::Skip);
        assert_eq!(decide(false, false, false), Step::Schedule);
    }

    #[test]
    fn test_schedules_in_order_with_offsets() {
        let (pool, graph) = fixture(
            vec![],
            vec![attraction("a", 0.001, 5.0, 30), attraction("b", 0.003, 2.5, 45)],
        );
        let route = validate_skeleton(&skeleton(&["a", "b"]), &graph, &pool, &request(4.0, 50.0)).unwrap();

        assert_eq!(route.ordered_ids, vec!["a", "b"]);
        let a = &route.entries[0];
        assert_eq!((a.offset_start_min, a.offset_end_min, a.travel_from_prev_min), (1, 31, 1));
        let b = &route.entries[1];
        assert_eq!((b.offset_start_min, b.offset_end_min, b.travel_from_prev_min), (33, 78, 2));
        assert_eq!(route.total_duration_min, 78);
        assert_eq!(route.total_cost, 7.5);
        assert_eq!(route.path.len(), 4);
        assert_eq!(route.path.points()[0], GeoPoint::new(0.0, 0.0));
        assert_eq!(route.path.points()[3], GeoPoint::new(0.01, 0.0));
    }

    #[test]
    fn test_non_must_over_duration_is_skipped_and_later_stop_fits() {
        let (pool, graph) = fixture(
            vec![],
            vec![
                attraction("long", 0.001, 0.0, 200),
                attraction("short", 0.002, 0.0, 30),
            ],
        );
        let route = validate_skeleton(&skeleton(&["long", "short"]), &graph, &pool, &request(1.0, 50.0)).unwrap();
        assert_eq!(route.ordered_ids, vec!["short"]);
        // Travel is measured from the start because `long` was never accepted.
        assert_eq!(route.entries[0].travel_from_prev_min, 2);
    }

    #[test]
    fn test_must_over_duration_rejects_theme() {
        let (pool, graph) = fixture(vec![attraction("m", 0.001, 0.0, 200)], vec![]);
        let err = validate_skeleton(&skeleton(&["m"]), &graph, &pool, &request(1.0, 50.0)).unwrap_err();
        assert_eq!(err, Infeasibility::MustVisitOverDuration { id: "m".to_string() });
    }

    #[test]
    fn test_huge_visit_length_does_not_overflow() {
        let (pool, graph) = fixture(
            vec![],
            vec![attraction("endless", 0.001, 0.0, u32::MAX), attraction("short", 0.002, 0.0, 30)],
        );
        let route = validate_skeleton(&skeleton(&["endless", "short"]), &graph, &pool, &request(6.0, 50.0)).unwrap();
        assert_eq!(route.ordered_ids, vec!["short"]);
        let entry = &route.entries[0];
        assert_eq!(entry.offset_end_min - entry.offset_start_min, entry.visit_minutes);

        let (pool, graph) = fixture(vec![attraction("endless", 0.001, 0.0, u32::MAX)], vec![]);
        let err = validate_skeleton(&skeleton(&["endless"]), &graph, &pool, &request(6.0, 50.0)).unwrap_err();
        assert_eq!(err, Infeasibility::MustVisitOverDuration { id: "endless".to_string() });
    }

    #[test]
    fn test_must_visit_overrides_budget() {
        let (pool, graph) = fixture(
            vec![attraction("m", 0.002, 80.0, 30)],
            vec![attraction("a", 0.001, 5.0, 30), attraction("c", 0.003, 0.0, 30)],
        );
        let route = validate_skeleton(&skeleton(&["a", "m", "c"]), &graph, &pool, &request(6.0, 50.0)).unwrap();
        assert_eq!(route.ordered_ids, vec!["a", "m"]);
        assert_eq!(route.total_cost, 85.0);
    }

    #[test]
    fn test_non_must_over_budget_is_skipped() {
        let (pool, graph) = fixture(
            vec![],
            vec![attraction("a", 0.001, 30.0, 30), attraction("b", 0.002, 30.0, 30)],
        );
        let route = validate_skeleton(&skeleton(&["a", "b"]), &graph, &pool, &request(6.0, 50.0)).unwrap();
        assert_eq!(route.ordered_ids, vec!["a"]);
        assert!(route.total_cost <= 50.0);
    }

    #[test]
    fn test_must_visit_missing_from_skeleton_is_infeasible() {
        let (pool, graph) = fixture(vec![attraction("m", 0.001, 0.0, 30)], vec![attraction("a", 0.002, 0.0, 30)]);
        let err = validate_skeleton(&skeleton(&["a"]), &graph, &pool, &request(6.0, 50.0)).unwrap_err();
        assert_eq!(err, Infeasibility::MustVisitUnscheduled { ids: vec!["m".to_string()] });
    }

    #[test]
    fn test_empty_skeleton_has_zero_duration() {
        let (pool, graph) = fixture(vec![], vec![]);
        let route = validate_skeleton(&skeleton(&[]), &graph, &pool, &request(6.0, 50.0)).unwrap();
        assert!(route.entries.is_empty());
        assert_eq!(route.total_duration_min, 0);
        assert_eq!(route.total_cost, 0.0);
        assert_eq!(route.path.len(), 2);
    }

    #[test]
    fn test_validate_all_drops_infeasible() {
        let (pool, graph) = fixture(vec![attraction("m", 0.001, 0.0, 30)], vec![attraction("a", 0.002, 0.0, 30)]);
        let skeletons = vec![skeleton(&["m", "a"]), skeleton(&["a"])];
        let routes = validate_all(&skeletons, &graph, &pool, &request(6.0, 50.0));
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].ordered_ids, vec!["m", "a"]);
    }
}
