//! Attraction catalog loading.
//!
//! A catalog is one CSV file per city with the columns
//! `attraction, lat, lng, popularity, price_range` and an optional
//! `visit_minutes`. Ids are derived from the display name.

use std::collections::HashMap;
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::model::{Attraction, DEFAULT_VISIT_MINUTES, GeoPoint};

/// Longest visit a catalog row may declare: one full day.
pub const MAX_VISIT_MINUTES: u32 = 24 * 60;

static NON_SLUG_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("slug pattern is valid"));
static NON_NUMERIC_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[^0-9.]").expect("price pattern is valid"));

/// Validated, id-unique set of attractions for one city.
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    attractions: Vec<Attraction>,
    index: HashMap<String, usize>,
}

impl Catalog {
    /// Builds a catalog, renaming colliding ids in order of appearance.
    ///
    /// The first attraction keeps its id; later ones get `_2`, `_3`, ...
    pub fn new(attractions: Vec<Attraction>) -> Self {
        let mut index = HashMap::with_capacity(attractions.len());
        let mut unique = Vec::with_capacity(attractions.len());

        for mut attraction in attractions {
            if index.contains_key(&attraction.id) {
                let base = attraction.id.clone();
                let mut suffix = 2;
                while index.contains_key(&format!("{}_{}", base, suffix)) {
                    suffix += 1;
                }
                attraction.id = format!("{}_{}", base, suffix);
                warn!(
                    name = %attraction.name,
                    original = %base,
                    renamed = %attraction.id,
                    "duplicate attraction id"
                );
            }
            index.insert(attraction.id.clone(), unique.len());
            unique.push(attraction);
        }

        Self {
            attractions: unique,
            index,
        }
    }

    /// Loads `<data_dir>/<city>.csv`, with the city lowercased and spaces replaced by `_`.
    pub fn for_city(data_dir: impl AsRef<Path>, city: &str) -> Result<Self, CatalogError> {
        let file_name = format!("{}.csv", city.trim().to_lowercase().replace(' ', "_"));
        Self::from_path(data_dir.as_ref().join(file_name))
    }

    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, CatalogError> {
        let path = path.into();
        let file = File::open(&path).map_err(|source| CatalogError::Io {
            path: path.clone(),
            source,
        })?;
        let catalog = Self::from_reader(file)?;
        info!(path = %path.display(), attractions = catalog.len(), "loaded catalog");
        Ok(catalog)
    }

    pub fn from_reader<R: io::Read>(reader: R) -> Result<Self, CatalogError> {
        let mut reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .flexible(true)
            .from_reader(reader);

        let headers = reader.headers()?.clone();
        let column = |name: &str| {
            headers
                .iter()
                .position(|header| header.trim().eq_ignore_ascii_case(name))
        };
        let name_col = column("attraction").ok_or(CatalogError::MissingColumn("attraction"))?;
        let lat_col = column("lat").ok_or(CatalogError::MissingColumn("lat"))?;
        let lng_col = column("lng").ok_or(CatalogError::MissingColumn("lng"))?;
        let popularity_col = column("popularity");
        let price_col = column("price_range");
        let minutes_col = column("visit_minutes");

        let mut attractions = Vec::new();
        for record in reader.records() {
            let record = record?;
            let line = record.position().map(|pos| pos.line()).unwrap_or_default();
            let field = |col: Option<usize>| col.and_then(|c| record.get(c)).unwrap_or("");

            let name = field(Some(name_col));
            if name.is_empty() {
                warn!(line, "skipping catalog row without a name");
                continue;
            }

            let lat = parse_coordinate(field(Some(lat_col)), "lat", 90.0, line)?;
            let lng = parse_coordinate(field(Some(lng_col)), "lng", 180.0, line)?;

            let raw_popularity = field(popularity_col);
            let popularity = match raw_popularity.parse::<f64>() {
                Ok(value) if value.is_finite() => value.clamp(0.0, 100.0),
                _ => {
                    if !raw_popularity.is_empty() {
                        warn!(line, value = raw_popularity, "unparsable popularity, using 0");
                    }
                    0.0
                }
            };

            let raw_price = field(price_col);
            let price = parse_price(raw_price).unwrap_or_else(|| {
                warn!(line, value = raw_price, "unparsable price_range, using 0");
                0.0
            });

            let raw_minutes = field(minutes_col);
            let visit_minutes = if raw_minutes.is_empty() {
                DEFAULT_VISIT_MINUTES
            } else {
                match raw_minutes.parse::<u32>() {
                    Ok(minutes) if (1..=MAX_VISIT_MINUTES).contains(&minutes) => minutes,
                    _ => {
                        warn!(line, value = raw_minutes, "visit_minutes unparsable or out of range, using default");
                        DEFAULT_VISIT_MINUTES
                    }
                }
            };

            attractions.push(
                Attraction::new(slugify(name), name, GeoPoint::new(lat, lng))
                    .with_popularity(popularity)
                    .with_price(price)
                    .with_visit_minutes(visit_minutes),
            );
        }

        Ok(Self::new(attractions))
    }

    pub fn get(&self, id: &str) -> Option<&Attraction> {
        self.index.get(id).map(|&i| &self.attractions[i])
    }

    pub fn contains(&self, id: &str) -> bool {
        self.index.contains_key(id)
    }

    pub fn attractions(&self) -> &[Attraction] {
        &self.attractions
    }

    pub fn len(&self) -> usize {
        self.attractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attractions.is_empty()
    }
}

/// Lowercases and collapses every run of non-alphanumerics into `_`.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    NON_SLUG_RE.replace_all(&lowered, "_").trim_matches('_').to_string()
}

/// Parses a `price_range` cell: `""`/`free` is 0, `lo-hi` is the midpoint.
pub fn parse_price(raw: &str) -> Option<f64> {
    let raw = raw.trim().to_lowercase();
    if raw.is_empty() || raw == "free" {
        return Some(0.0);
    }
    if let Some((lo, hi)) = raw.split_once('-') {
        if let (Some(lo), Some(hi)) = (parse_number(lo), parse_number(hi)) {
            return Some((lo + hi) / 2.0);
        }
    }
    parse_number(&raw)
}

fn parse_number(raw: &str) -> Option<f64> {
    NON_NUMERIC_RE
        .replace_all(raw, "")
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
}

fn parse_coordinate(
    raw: &str,
    field: &'static str,
    limit: f64,
    line: u64,
) -> Result<f64, CatalogError> {
    raw.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite() && value.abs() <= limit)
        .ok_or_else(|| CatalogError::InvalidField {
            line,
            field,
            value: raw.to_string(),
        })
}
