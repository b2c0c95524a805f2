//! Error taxonomy.
//!
//! Only [`PlannerError`] ever reaches the caller. Theme infeasibility and
//! collaborator failures are handled inside the pipeline.

use std::io;
use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

/// Fatal request failure.
#[derive(Debug, Error)]
pub enum PlannerError {
    #[error("catalog could not be loaded: {0}")]
    DataLoad(#[from] CatalogError),
    #[error("invalid trip request: {0}")]
    InputValidation(String),
}

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("catalog is missing required column `{0}`")]
    MissingColumn(&'static str),
    #[error("line {line}: invalid {field} value `{value}`")]
    InvalidField {
        line: u64,
        field: &'static str,
        value: String,
    },
}

/// Why a theme's skeleton could not be turned into a schedule.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Infeasibility {
    #[error("must-visit `{id}` does not fit in the daily duration")]
    MustVisitOverDuration { id: String },
    #[error("must-visit ids were never scheduled: {ids:?}")]
    MustVisitUnscheduled { ids: Vec<String> },
}

/// Enrichment collaborator failure. Always recovered by a local fallback.
#[derive(Debug, Error)]
pub enum EnrichmentError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion was empty")]
    EmptyCompletion,
    #[error("unparsable completion: {0}")]
    Parse(String),
    #[error("no answer within {0:?}")]
    Timeout(Duration),
    #[error("enrichment unavailable: {0}")]
    Unavailable(String),
}
