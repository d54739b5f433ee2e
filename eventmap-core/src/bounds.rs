//! Geographic rectangles and points.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{EventMapError, EventMapResult};

/// A latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        LatLng { lat, lng }
    }
}

impl From<[f64; 2]> for LatLng {
    fn from([lat, lng]: [f64; 2]) -> Self {
        LatLng { lat, lng }
    }
}

/// Rectangle described by its four edges in degrees.
///
/// Invariant: `north >= south` and `east >= west`. Rectangles crossing the
/// antimeridian are not representable.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bounds {
    pub north: f64,
    pub south: f64,
    pub east: f64,
    pub west: f64,
}

impl Bounds {
    pub fn new(north: f64, south: f64, east: f64, west: f64) -> EventMapResult<Self> {
        let edges = [north, south, east, west];
        if edges.iter().any(|e| !e.is_finite()) {
            return Err(EventMapError::InvalidBounds(format!(
                "edges must be finite, got {:?}",
                edges
            )));
        }
        if north < south {
            return Err(EventMapError::InvalidBounds(format!(
                "north ({north}) is below south ({south})"
            )));
        }
        if east < west {
            return Err(EventMapError::InvalidBounds(format!(
                "east ({east}) is west of west ({west})"
            )));
        }
        Ok(Bounds {
            north,
            south,
            east,
            west,
        })
    }

    pub fn lat_span(&self) -> f64 {
        self.north - self.south
    }

    pub fn lng_span(&self) -> f64 {
        self.east - self.west
    }

    pub fn center(&self) -> LatLng {
        LatLng {
            lat: (self.north + self.south) / 2.0,
            lng: (self.east + self.west) / 2.0,
        }
    }

    /// Grow every edge outward by `ratio` times the span of its axis.
    ///
    /// `expand(0.0)` returns the rectangle unchanged.
    pub fn expand(&self, ratio: f64) -> Self {
        let lat_diff = self.lat_span() * ratio;
        let lng_diff = self.lng_span() * ratio;
        Bounds {
            north: self.north + lat_diff,
            south: self.south - lat_diff,
            east: self.east + lng_diff,
            west: self.west - lng_diff,
        }
    }

    /// True if `other` lies entirely inside `self`, edges inclusive.
    pub fn contains(&self, other: &Bounds) -> bool {
        other.north <= self.north
            && other.south >= self.south
            && other.east <= self.east
            && other.west >= self.west
    }

    /// True if the point lies inside `self`, edges inclusive.
    pub fn contains_point(&self, point: LatLng) -> bool {
        point.lat >= self.south
            && point.lat <= self.north
            && point.lng >= self.west
            && point.lng <= self.east
    }
}

impl fmt::Display for Bounds {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "N{:.4} S{:.4} E{:.4} W{:.4}",
            self.north, self.south, self.east, self.west
        )
    }
}
