//! Per-theme route skeletons.
//!
//! Each theme picks its own subset of the candidate pool, joins it with the
//! must-visit set, and orders the stops with nearest-neighbor construction
//! followed by bounded 2-opt.

use std::cmp::Ordering;
use std::collections::HashSet;

use rand::{Rng, RngCore};
use tracing::{debug, info};

use crate::graph::{END, RouteGraph, START};
use crate::model::{Attraction, RouteSkeleton, Theme};
use crate::pool::CandidatePool;

/// Cost charged for an edge the graph does not know.
const MISSING_EDGE_PENALTY: u64 = 1_000_000;

/// A 2-opt move must save more than this many seconds to be accepted.
const IMPROVEMENT_EPSILON: u64 = 1;

type ThemeScorer = fn(f64, &mut dyn RngCore) -> f64;

struct ThemeRule {
    theme: Theme,
    max_stops: usize,
    score: ThemeScorer,
}

static THEME_RULES: [ThemeRule; 5] = [
    ThemeRule {
        theme: Theme::Fastest,
        max_stops: 6,
        score: |p, _| 0.5 + 0.5 * p,
    },
    ThemeRule {
        theme: Theme::Popular,
        max_stops: 5,
        score: |p, _| p,
    },
    ThemeRule {
        theme: Theme::Balanced,
        max_stops: 5,
        score: |p, rng| 0.6 * p + 0.4 * rng.gen_range(0.3_f64..1.0),
    },
    ThemeRule {
        theme: Theme::Relaxed,
        max_stops: 3,
        score: |p, rng| 0.8 * p + 0.2 * rng.gen_range(0.0_f64..1.0),
    },
    ThemeRule {
        theme: Theme::HiddenGems,
        max_stops: 5,
        score: |p, rng| 0.7 * (1.0 - p).max(0.0) + 0.3 * rng.gen_range(0.0_f64..1.0),
    },
];

fn rule_for(theme: Theme) -> &'static ThemeRule {
    THEME_RULES
        .iter()
        .find(|rule| rule.theme == theme)
        .unwrap_or(&THEME_RULES[0])
}

/// Stop cap for a theme, excluding must-visit stops.
pub fn max_stops(theme: Theme) -> usize {
    rule_for(theme).max_stops
}

/// Theme score of one attraction, never negative.
pub fn theme_score(theme: Theme, attraction: &Attraction, penalty: f64, rng: &mut dyn RngCore) -> f64 {
    let popularity = (attraction.popularity / 100.0).clamp(0.0, 1.0);
    ((rule_for(theme).score)(popularity, rng) - penalty).max(0.0)
}

/// Ids selected by themes that have already been processed.
///
/// Threaded through the themes in [`Theme::ALL`] order so later themes are
/// nudged away from stops earlier themes already use.
#[derive(Debug, Clone, Default)]
pub struct UsedIds(HashSet<String>);

impl UsedIds {
    pub fn contains(&self, id: &str) -> bool {
        self.0.contains(id)
    }

    pub fn record(&mut self, skeleton: &RouteSkeleton) {
        self.0.extend(skeleton.attraction_ids().map(str::to_string));
    }
}

#[derive(Debug, Clone)]
pub struct SkeletonOptions {
    /// Subtracted from the theme score of candidates used by earlier themes.
    pub reuse_penalty: f64,
    /// Upper bound on full 2-opt passes.
    pub two_opt_iterations: usize,
}

impl Default for SkeletonOptions {
    fn default() -> Self {
        Self {
            reuse_penalty: 0.25,
            two_opt_iterations: 100,
        }
    }
}

/// Top-scoring candidates for a theme, at most the theme's stop cap.
pub fn select_for_theme<'a>(
    candidates: &'a [Attraction],
    theme: Theme,
    used: &UsedIds,
    reuse_penalty: f64,
    rng: &mut dyn RngCore,
) -> Vec<&'a Attraction> {
    let mut scored: Vec<(&Attraction, f64)> = candidates
        .iter()
        .map(|a| {
            let penalty = if used.contains(&a.id) { reuse_penalty } else { 0.0 };
            (a, theme_score(theme, a, penalty, rng))
        })
        .collect();
    scored.sort_by(|(_, lhs), (_, rhs)| rhs.partial_cmp(lhs).unwrap_or(Ordering::Equal));
    scored.truncate(max_stops(theme));
    scored.into_iter().map(|(a, _)| a).collect()
}

fn edge_cost(graph: &RouteGraph, a: usize, b: usize) -> u64 {
    graph
        .seconds(a, b)
        .map(u64::from)
        .unwrap_or(MISSING_EDGE_PENALTY)
}

/// Total edge cost of a node sequence, penalising unknown edges.
pub fn route_cost(graph: &RouteGraph, route: &[usize]) -> u64 {
    route.windows(2).map(|pair| edge_cost(graph, pair[0], pair[1])).sum()
}

/// Greedy tour from the virtual start through `stops` to the virtual end.
///
/// Ties keep the earlier stop in `stops`.
pub fn nearest_neighbor(graph: &RouteGraph, stops: &[usize]) -> Vec<usize> {
    let mut unvisited: Vec<usize> = stops.to_vec();
    let mut route = Vec::with_capacity(stops.len() + 2);
    route.push(START);
    let mut current = START;

    while !unvisited.is_empty() {
        let mut best: Option<(usize, u32)> = None;
        for (pos, &node) in unvisited.iter().enumerate() {
            if let Some(seconds) = graph.seconds(current, node) {
                if best.is_none_or(|(_, best_seconds)| seconds < best_seconds) {
                    best = Some((pos, seconds));
                }
            }
        }
        let Some((pos, _)) = best else {
            debug!(remaining = unvisited.len(), "no reachable stop left");
            break;
        };
        current = unvisited.remove(pos);
        route.push(current);
    }

    route.push(END);
    route
}

/// Reverses interior segments while that shortens the tour.
///
/// The first and last nodes stay fixed. Stops after a pass without an
/// improving move or after `max_iterations` passes.
pub fn two_opt(graph: &RouteGraph, mut route: Vec<usize>, max_iterations: usize) -> Vec<usize> {
    let len = route.len();
    if len < 4 {
        return route;
    }

    for _ in 0..max_iterations {
        let mut improved = false;
        for i in 1..len - 2 {
            for j in i + 1..len - 1 {
                // Segment cost is unchanged on a symmetric graph; only the two boundary edges move.
                let before = edge_cost(graph, route[i - 1], route[i]) + edge_cost(graph, route[j], route[j + 1]);
                let after = edge_cost(graph, route[i - 1], route[j]) + edge_cost(graph, route[i], route[j + 1]);
                if after + IMPROVEMENT_EPSILON < before {
                    route[i..=j].reverse();
                    improved = true;
                }
            }
        }
        if !improved {
            break;
        }
    }

    route
}

/// Orders must-visit plus selected stops into a skeleton for one theme.
pub fn build_skeleton(
    graph: &RouteGraph,
    must_visit: &[Attraction],
    selected: &[&Attraction],
    theme: Theme,
    two_opt_iterations: usize,
) -> RouteSkeleton {
    let mut seen = HashSet::new();
    let stops: Vec<usize> = must_visit
        .iter()
        .chain(selected.iter().copied())
        .filter(|a| seen.insert(a.id.as_str()))
        .filter_map(|a| graph.index_of_attraction(&a.id))
        .collect();

    let ordered = two_opt(graph, nearest_neighbor(graph, &stops), two_opt_iterations);
    let total_travel_seconds = ordered
        .windows(2)
        .filter_map(|pair| graph.seconds(pair[0], pair[1]))
        .sum();
    let ordered_nodes = ordered
        .iter()
        .filter_map(|&index| graph.node(index).map(|node| node.node.clone()))
        .collect();

    RouteSkeleton {
        theme,
        ordered_nodes,
        total_travel_seconds,
    }
}

/// One skeleton per theme, in [`Theme::ALL`] order.
///
/// Returns nothing when the pool is empty.
pub fn generate_skeletons(
    graph: &RouteGraph,
    pool: &CandidatePool,
    options: &SkeletonOptions,
    rng: &mut dyn RngCore,
) -> Vec<RouteSkeleton> {
    if pool.is_empty() {
        return Vec::new();
    }

    let mut used = UsedIds::default();
    let mut skeletons = Vec::with_capacity(Theme::ALL.len());
    for theme in Theme::ALL {
        let selected = select_for_theme(&pool.candidates, theme, &used, options.reuse_penalty, rng);
        let skeleton = build_skeleton(graph, &pool.must_visit, &selected, theme, options.two_opt_iterations);
        info!(
            theme = %theme,
            stops = ?skeleton.attraction_ids().collect::<Vec<_>>(),
            travel_seconds = skeleton.total_travel_seconds,
            "route skeleton"
        );
        used.record(&skeleton);
        skeletons.push(skeleton);
    }
    skeletons
}
