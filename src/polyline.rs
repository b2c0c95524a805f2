//! Coordinate path of a validated route.
//!
//! The path runs from the virtual start through every scheduled stop to the
//! virtual end. It serializes as a plain `[{lat, lng}, ...]` array.

use serde::{Deserialize, Serialize};

use crate::model::GeoPoint;

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Polyline {
    points: Vec<GeoPoint>,
}

impl Polyline {
    pub fn new(points: Vec<GeoPoint>) -> Self {
        Self { points }
    }

    pub fn push(&mut self, point: GeoPoint) {
        self.points.push(point);
    }

    pub fn points(&self) -> &[GeoPoint] {
        &self.points
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }
}
