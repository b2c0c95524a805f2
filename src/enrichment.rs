//! Narrative enrichment of validated routes.
//!
//! Enrichment is best effort. Every route gets a complete
//! [`EnrichmentResult`]: whatever the collaborator returns is sanitised, and
//! any failure or missed deadline is replaced by a deterministic local
//! fallback.

use std::collections::{HashMap, HashSet};
use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use rayon::prelude::*;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, warn};

use crate::error::EnrichmentError;
use crate::model::{Attraction, EnrichmentResult, Theme, TripRequest, ValidatedRoute};
use crate::traits::{Enricher, LanguageModel};

const SYSTEM_PROMPT: &str = "You are a travel planning assistant. Return only valid JSON.";

/// What an enricher may know about the request.
#[derive(Debug, Clone)]
pub struct EnrichmentContext<'a> {
    pub request: &'a TripRequest,
    /// Every attraction in the working set; micro-stops must come from here.
    pub attractions: &'a [Attraction],
    lookup: HashMap<&'a str, &'a Attraction>,
}

impl<'a> EnrichmentContext<'a> {
    pub fn new(request: &'a TripRequest, attractions: &'a [Attraction]) -> Self {
        let lookup = attractions.iter().map(|a| (a.id.as_str(), a)).collect();
        Self {
            request,
            attractions,
            lookup,
        }
    }

    pub fn attraction(&self, id: &str) -> Option<&'a Attraction> {
        self.lookup.get(id).copied()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.lookup.contains_key(id)
    }

    /// Working-set attractions the route does not visit.
    pub fn unused_for<'r>(&'r self, route: &'r ValidatedRoute) -> impl Iterator<Item = &'a Attraction> + 'r {
        let visited: HashSet<&str> = route.ordered_ids.iter().map(String::as_str).collect();
        self.attractions
            .iter()
            .filter(move |a| !visited.contains(a.id.as_str()))
    }
}

/// Owned request and working set that a detached enrichment call can hold on to.
#[derive(Debug, Clone)]
pub struct EnrichmentInput {
    request: Arc<TripRequest>,
    attractions: Arc<[Attraction]>,
}

impl EnrichmentInput {
    pub fn new(request: TripRequest, attractions: Vec<Attraction>) -> Self {
        Self {
            request: Arc::new(request),
            attractions: attractions.into(),
        }
    }

    pub fn context(&self) -> EnrichmentContext<'_> {
        EnrichmentContext::new(&self.request, &self.attractions)
    }
}

/// Runs `call` on its own thread and waits at most `timeout` for the answer.
///
/// A call that misses the deadline is abandoned; its thread finishes in the
/// background and its result is discarded.
fn call_with_deadline<T, F>(timeout: Duration, call: F) -> Result<T, EnrichmentError>
where
    T: Send + 'static,
    F: FnOnce() -> Result<T, EnrichmentError> + Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("enrichment".to_string())
        .spawn(move || {
            let _ = tx.send(call());
        })
        .map_err(|err| EnrichmentError::Unavailable(err.to_string()))?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(RecvTimeoutError::Timeout) => Err(EnrichmentError::Timeout(timeout)),
        Err(RecvTimeoutError::Disconnected) => {
            Err(EnrichmentError::Unavailable("enrichment call panicked".to_string()))
        }
    }
}

fn theme_blurb(theme: Theme) -> &'static str {
    match theme {
        Theme::Fastest => "Optimized for efficiency: the most stops for the least travel.",
        Theme::Popular => "The most popular attractions in the area.",
        Theme::Balanced => "A balanced mix of well-known and off-the-radar stops.",
        Theme::Relaxed => "A leisurely pace with fewer stops and time to linger.",
        Theme::HiddenGems => "Hidden gems: great spots without the crowds.",
    }
}

/// Canned enrichment used whenever the collaborator fails.
pub fn fallback_enrichment(route: &ValidatedRoute) -> EnrichmentResult {
    EnrichmentResult {
        explanation: theme_blurb(route.theme).to_string(),
        micro_stops: Vec::new(),
        narrative: format!(
            "A {}-hour day with {} stops.",
            route.total_duration_min / 60,
            route.ordered_ids.len()
        ),
    }
}

/// Templated trip summary used whenever the collaborator fails.
pub fn fallback_description(routes: &[ValidatedRoute], request: &TripRequest) -> String {
    let themes: Vec<&str> = routes.iter().map(|r| r.theme.as_str()).collect();
    let unique: HashSet<&str> = routes
        .iter()
        .flat_map(|r| r.ordered_ids.iter().map(String::as_str))
        .collect();
    let mut description = format!(
        "A {}-hour day trip with {} route options ({}) covering {} unique attractions.",
        request.duration_hours,
        routes.len(),
        themes.join(", "),
        unique.len()
    );
    if !request.preferences.is_empty() {
        description.push_str(&format!(" Tailored for: \"{}\".", request.preferences));
    }
    description
}

/// Keeps micro-stops that exist in the working set and are not already on
/// the route. A blank explanation becomes the theme sentence.
pub fn sanitize(
    mut result: EnrichmentResult,
    route: &ValidatedRoute,
    context: &EnrichmentContext<'_>,
    max_micro_stops: usize,
) -> EnrichmentResult {
    let mut seen: HashSet<String> = route.ordered_ids.iter().cloned().collect();
    result
        .micro_stops
        .retain(|id| context.contains(id) && seen.insert(id.clone()));
    result.micro_stops.truncate(max_micro_stops);
    if result.explanation.trim().is_empty() {
        result.explanation = theme_blurb(route.theme).to_string();
    }
    result
}

/// Enriches every route concurrently, each call bounded by `timeout`.
/// Output order matches `routes`.
pub fn enrich_routes<E>(
    enricher: &Arc<E>,
    routes: &[ValidatedRoute],
    input: &EnrichmentInput,
    max_micro_stops: usize,
    timeout: Duration,
) -> Vec<EnrichmentResult>
where
    E: Enricher + ?Sized + 'static,
{
    let context = input.context();
    routes
        .par_iter()
        .map(|route| {
            let call = {
                let enricher = Arc::clone(enricher);
                let input = input.clone();
                let route = route.clone();
                move || enricher.enrich(&route, &input.context())
            };
            match call_with_deadline(timeout, call) {
                Ok(result) => sanitize(result, route, &context, max_micro_stops),
                Err(err) => {
                    warn!(theme = %route.theme, error = %err, "enrichment failed, using fallback");
                    fallback_enrichment(route)
                }
            }
        })
        .collect()
}

/// Trip-level description, or `None` when there is nothing to describe.
pub fn describe_trip<E>(
    enricher: &Arc<E>,
    routes: &[ValidatedRoute],
    input: &EnrichmentInput,
    timeout: Duration,
) -> Option<String>
where
    E: Enricher + ?Sized + 'static,
{
    if routes.is_empty() {
        return None;
    }
    let call = {
        let enricher = Arc::clone(enricher);
        let input = input.clone();
        let routes = routes.to_vec();
        move || enricher.describe(&routes, &input.context())
    };
    match call_with_deadline(timeout, call) {
        Ok(description) if !description.trim().is_empty() => Some(description),
        Ok(_) => {
            warn!("empty trip description, using fallback");
            Some(fallback_description(routes, &input.request))
        }
        Err(err) => {
            warn!(error = %err, "trip description failed, using fallback");
            Some(fallback_description(routes, &input.request))
        }
    }
}

/// Offline enricher that always answers with the canned texts.
#[derive(Debug, Clone, Copy, Default)]
pub struct TemplateEnricher;

impl Enricher for TemplateEnricher {
    fn enrich(
        &self,
        route: &ValidatedRoute,
        _context: &EnrichmentContext<'_>,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        Ok(fallback_enrichment(route))
    }

    fn describe(&self, routes: &[ValidatedRoute], context: &EnrichmentContext<'_>) -> Result<String, EnrichmentError> {
        Ok(fallback_description(routes, context.request))
    }
}

/// Enricher that prompts a language model and parses its JSON replies.
#[derive(Debug, Clone)]
pub struct LlmEnricher<M> {
    model: M,
    /// Unused attractions offered to the model as micro-stop ideas.
    micro_stop_candidates: usize,
}

impl<M: LanguageModel> LlmEnricher<M> {
    pub fn new(model: M) -> Self {
        Self::with_candidate_limit(model, 15)
    }

    pub fn with_candidate_limit(model: M, micro_stop_candidates: usize) -> Self {
        Self {
            model,
            micro_stop_candidates,
        }
    }
}

impl<M: LanguageModel> Enricher for LlmEnricher<M> {
    fn enrich(
        &self,
        route: &ValidatedRoute,
        context: &EnrichmentContext<'_>,
    ) -> Result<EnrichmentResult, EnrichmentError> {
        let prompt = route_prompt(route, context, self.micro_stop_candidates);
        let raw = self.model.complete(SYSTEM_PROMPT, &prompt)?;
        debug!(theme = %route.theme, bytes = raw.len(), "enrichment reply");
        parse_route_reply(&raw)
    }

    fn describe(&self, routes: &[ValidatedRoute], context: &EnrichmentContext<'_>) -> Result<String, EnrichmentError> {
        let prompt = trip_prompt(routes, context);
        let raw = self.model.complete(SYSTEM_PROMPT, &prompt)?;
        parse_trip_reply(&raw)
    }
}

fn request_block(request: &TripRequest) -> String {
    let mut block = format!(
        "Transport: {}\nBudget: {:.0}-{:.0}\nDuration: {} hours\nCity: {}\nDate: {}\nLanguages: {}\n",
        request.transport,
        request.budget.min,
        request.budget.max,
        request.duration_hours,
        request.city.as_deref().unwrap_or("unknown"),
        request
            .date
            .map(|d| d.to_string())
            .unwrap_or_else(|| "not specified".to_string()),
        request.languages.join(", "),
    );
    if !request.preferences.is_empty() {
        block.push_str(&format!(
            "\n=== USER PREFERENCE ===\n{}\nUse this preference to tailor your answer.\n",
            request.preferences
        ));
    }
    block
}

pub fn route_prompt(route: &ValidatedRoute, context: &EnrichmentContext<'_>, candidate_limit: usize) -> String {
    let attractions: Vec<_> = route
        .ordered_ids
        .iter()
        .filter_map(|id| context.attraction(id))
        .map(|a| json!({"id": a.id, "name": a.name, "popularity": a.popularity, "price": a.price}))
        .collect();
    let schedule: Vec<_> = route
        .entries
        .iter()
        .map(|e| {
            json!({
                "name": e.attraction_name,
                "start_min": e.offset_start_min,
                "end_min": e.offset_end_min,
                "visit_min": e.visit_minutes,
                "travel_min": e.travel_from_prev_min,
                "cost": e.cost,
            })
        })
        .collect();
    let micro: Vec<_> = context
        .unused_for(route)
        .take(candidate_limit)
        .map(|a| json!({"id": a.id, "name": a.name, "popularity": a.popularity, "price": a.price}))
        .collect();

    format!(
        "Enrich this pre-computed single-day route.\n\n\
         === RULES ===\n\
         1. ONLY suggest micro-stops from the micro-stop candidates below.\n\
         2. Do NOT invent any attraction not in the provided data.\n\
         3. Return ONLY a JSON object, no markdown.\n\n\
         === ROUTE ===\nTheme: {}\nRoute duration: {} minutes\nTotal cost: {:.2}\n{}\n\
         === ATTRACTIONS (visit order) ===\n{}\n\n\
         === SCHEDULE ===\n{}\n\n\
         === MICRO-STOP CANDIDATES (suggest up to 3) ===\n{}\n\n\
         === REQUIRED OUTPUT ===\n\
         {{\"explanation\": \"2-3 sentences on why this route is great\", \
         \"micro_stops\": [\"id_from_list\"], \
         \"timeline_narrative\": \"3-5 sentence narrative of the day\"}}",
        route.theme,
        route.total_duration_min,
        route.total_cost,
        request_block(context.request),
        pretty(&attractions),
        pretty(&schedule),
        pretty(&micro),
    )
}

pub fn trip_prompt(routes: &[ValidatedRoute], context: &EnrichmentContext<'_>) -> String {
    let summaries: Vec<_> = routes
        .iter()
        .map(|r| {
            let names: Vec<&str> = r
                .ordered_ids
                .iter()
                .filter_map(|id| context.attraction(id))
                .map(|a| a.name.as_str())
                .collect();
            json!({
                "theme": r.theme,
                "stops": r.ordered_ids.len(),
                "duration_min": r.total_duration_min,
                "cost": r.total_cost,
                "attractions": names,
            })
        })
        .collect();

    format!(
        "Write a short, engaging trip description (3-5 sentences) summarising what this day trip offers.\n\n\
         === TRIP INFO ===\nLocation: near ({}, {})\n{}\n\
         === ROUTES GENERATED ({}) ===\n{}\n\n\
         === RULES ===\n\
         1. Return ONLY a JSON object: {{\"trip_description\": \"your summary\"}}\n\
         2. Mention the area, highlight standout attractions across routes, and reference the user's preference if given.",
        context.request.start.lat,
        context.request.start.lng,
        request_block(context.request),
        summaries.len(),
        pretty(&summaries),
    )
}

fn pretty(value: &[serde_json::Value]) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| "[]".to_string())
}

/// Removes a surrounding Markdown code fence, if any.
pub fn strip_code_fence(raw: &str) -> &str {
    let trimmed = raw.trim();
    if !trimmed.starts_with("```") {
        return trimmed;
    }
    let body = trimmed.split_once('\n').map(|(_, rest)| rest).unwrap_or("");
    body.trim_end().strip_suffix("```").unwrap_or(body).trim()
}

#[derive(Debug, Deserialize)]
struct RouteReply {
    #[serde(default)]
    explanation: Option<String>,
    #[serde(default)]
    micro_stops: serde_json::Value,
    #[serde(default)]
    timeline_narrative: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TripReply {
    #[serde(default)]
    trip_description: Option<String>,
}

pub fn parse_route_reply(raw: &str) -> Result<EnrichmentResult, EnrichmentError> {
    let reply: RouteReply =
        serde_json::from_str(strip_code_fence(raw)).map_err(|err| EnrichmentError::Parse(err.to_string()))?;

    let micro_stops = match reply.micro_stops {
        serde_json::Value::Array(items) => items
            .into_iter()
            .filter_map(|item| item.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    };
    Ok(EnrichmentResult {
        explanation: reply.explanation.unwrap_or_default(),
        micro_stops,
        narrative: reply.timeline_narrative.unwrap_or_default(),
    })
}

pub fn parse_trip_reply(raw: &str) -> Result<String, EnrichmentError> {
    let reply: TripReply =
        serde_json::from_str(strip_code_fence(raw)).map_err(|err| EnrichmentError::Parse(err.to_string()))?;
    reply
        .trip_description
        .filter(|text| !text.trim().is_empty())
        .ok_or(EnrichmentError::EmptyCompletion)
}
