//! trip-planner core
//!
//! Builds up to five themed one-day routes through a city's attractions:
//! candidate pool, travel graph, route skeletons, schedule validation,
//! narrative enrichment and response assembly.

pub mod model;
pub mod error;
pub mod traits;
pub mod haversine;
pub mod polyline;
pub mod catalog;
pub mod pool;
pub mod graph;
pub mod skeleton;
pub mod schedule;
pub mod enrichment;
pub mod llm;
pub mod assembly;
pub mod planner;

pub use catalog::Catalog;
pub use error::PlannerError;
pub use model::{TripRequest, TripResponse};
pub use planner::{PlannerOptions, TripPlanner};
