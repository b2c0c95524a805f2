//! Domain types shared by every pipeline stage.
//!
//! Everything here is created fresh for a single trip request and dropped
//! once the response has been produced.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::polyline::Polyline;

/// Visit length used when the catalog does not specify one.
pub const DEFAULT_VISIT_MINUTES: u32 = 45;

/// A WGS84 coordinate in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub lat: f64,
    pub lng: f64,
}

impl GeoPoint {
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    pub fn is_valid(&self) -> bool {
        self.lat.is_finite()
            && self.lng.is_finite()
            && (-90.0..=90.0).contains(&self.lat)
            && (-180.0..=180.0).contains(&self.lng)
    }
}

/// Money the traveler is willing to spend, in catalog currency units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Budget {
    pub min: f64,
    pub max: f64,
}

impl Default for Budget {
    fn default() -> Self {
        Self { min: 0.0, max: 500.0 }
    }
}

/// How the traveler moves between stops.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    #[default]
    Walk,
    Bike,
    Car,
    DriverGuide,
}

impl TransportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransportMode::Walk => "walk",
            TransportMode::Bike => "bike",
            TransportMode::Car => "car",
            TransportMode::DriverGuide => "driver_guide",
        }
    }
}

impl fmt::Display for TransportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Route personality. Themes are always processed in [`Theme::ALL`] order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    Fastest,
    Popular,
    Balanced,
    Relaxed,
    HiddenGems,
}

impl Theme {
    pub const ALL: [Theme; 5] = [
        Theme::Fastest,
        Theme::Popular,
        Theme::Balanced,
        Theme::Relaxed,
        Theme::HiddenGems,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Theme::Fastest => "fastest",
            Theme::Popular => "popular",
            Theme::Balanced => "balanced",
            Theme::Relaxed => "relaxed",
            Theme::HiddenGems => "hidden_gems",
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A point of interest from the city catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attraction {
    pub id: String,
    pub name: String,
    pub location: GeoPoint,
    /// 0-100.
    pub popularity: f64,
    pub price: f64,
    pub visit_minutes: u32,
}

impl Attraction {
    pub fn new(id: impl Into<String>, name: impl Into<String>, location: GeoPoint) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            location,
            popularity: 0.0,
            price: 0.0,
            visit_minutes: DEFAULT_VISIT_MINUTES,
        }
    }

    pub fn with_popularity(mut self, popularity: f64) -> Self {
        self.popularity = popularity;
        self
    }

    pub fn with_price(mut self, price: f64) -> Self {
        self.price = price;
        self
    }

    pub fn with_visit_minutes(mut self, minutes: u32) -> Self {
        self.visit_minutes = minutes;
        self
    }
}

/// Traveler constraints for a single day.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripRequest {
    pub start: GeoPoint,
    pub end: GeoPoint,
    #[serde(default)]
    pub must_visit_ids: Vec<String>,
    pub duration_hours: f64,
    #[serde(default)]
    pub budget: Budget,
    #[serde(default)]
    pub transport: TransportMode,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default = "default_languages")]
    pub languages: Vec<String>,
    /// Free-text preference forwarded to the enrichment collaborator.
    #[serde(default)]
    pub preferences: String,
}

fn default_languages() -> Vec<String> {
    vec!["en".to_string()]
}

impl TripRequest {
    pub fn new(start: GeoPoint, end: GeoPoint, duration_hours: f64) -> Self {
        Self {
            start,
            end,
            must_visit_ids: Vec::new(),
            duration_hours,
            budget: Budget::default(),
            transport: TransportMode::default(),
            date: None,
            city: None,
            languages: default_languages(),
            preferences: String::new(),
        }
    }

    /// Whole minutes available for the day.
    pub fn daily_minutes(&self) -> u32 {
        (self.duration_hours * 60.0).floor().max(0.0) as u32
    }
}

/// A node of a route skeleton: one of the two virtual endpoints or a catalog attraction.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RouteNode {
    Start,
    End,
    Attraction(String),
}

impl RouteNode {
    pub fn attraction_id(&self) -> Option<&str> {
        match self {
            RouteNode::Attraction(id) => Some(id),
            RouteNode::Start | RouteNode::End => None,
        }
    }
}

/// Ordered stops for one theme before feasibility checking.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteSkeleton {
    pub theme: Theme,
    /// Begins with [`RouteNode::Start`] and ends with [`RouteNode::End`].
    pub ordered_nodes: Vec<RouteNode>,
    pub total_travel_seconds: u32,
}

impl RouteSkeleton {
    /// Interior attraction ids in visiting order.
    pub fn attraction_ids(&self) -> impl Iterator<Item = &str> {
        self.ordered_nodes.iter().filter_map(RouteNode::attraction_id)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ScheduleEntry {
    pub attraction_id: String,
    pub attraction_name: String,
    pub offset_start_min: u32,
    pub offset_end_min: u32,
    pub visit_minutes: u32,
    pub travel_from_prev_min: u32,
    pub cost: f64,
}

/// A skeleton that passed duration and budget checks.
#[derive(Debug, Clone, PartialEq)]
pub struct ValidatedRoute {
    pub theme: Theme,
    pub entries: Vec<ScheduleEntry>,
    pub ordered_ids: Vec<String>,
    pub total_duration_min: u32,
    pub total_cost: f64,
    pub path: Polyline,
}

/// Narrative layered onto a validated route by the enrichment collaborator.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct EnrichmentResult {
    pub explanation: String,
    pub micro_stops: Vec<String>,
    pub narrative: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub attraction_id: String,
    pub attraction_name: String,
    pub offset_start_min: u32,
    pub offset_end_min: u32,
    pub visit_duration_minutes: u32,
    pub travel_to_next_minutes: Option<u32>,
    pub cost: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub route_id: String,
    pub theme: Theme,
    pub attractions: Vec<String>,
    pub timeline: Vec<TimelineEntry>,
    pub total_duration_hours: f64,
    pub total_cost: f64,
    pub explanation: String,
    pub path: Polyline,
    pub micro_stops: Vec<String>,
}

/// Externally visible result of a planning request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TripResponse {
    pub request_id: String,
    pub generated_at: String,
    pub candidate_count: usize,
    pub trip_description: Option<String>,
    pub routes: Vec<RoutePlan>,
}
