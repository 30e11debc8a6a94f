//! Geodesy helpers
//!
//! Coordinates are plain WGS84 degrees. An unset position is `None`, never
//! `(0, 0)`: the equator and the prime meridian are real places.

use crate::{Result, RiskError, EARTH_RADIUS_M};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Validate latitude is in valid range
fn is_valid_latitude(lat: f64) -> bool {
    (-90.0..=90.0).contains(&lat) && lat.is_finite()
}

/// Validate longitude is in valid range
fn is_valid_longitude(lng: f64) -> bool {
    (-180.0..=180.0).contains(&lng) && lng.is_finite()
}

/// A latitude/longitude pair in degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    /// Build a validated coordinate pair
    pub fn new(lat: f64, lng: f64) -> Result<Self> {
        if is_valid_latitude(lat) && is_valid_longitude(lng) {
            Ok(Self { lat, lng })
        } else {
            Err(RiskError::InvalidCoordinates { lat, lng })
        }
    }

    /// Re-check a pair that came in through deserialization
    pub fn validate(self) -> Result<Self> {
        Self::new(self.lat, self.lng)
    }

    /// Shift by a delta in degrees (used to lay out POIs around a center)
    pub fn offset(&self, dlat: f64, dlng: f64) -> Self {
        Self {
            lat: self.lat + dlat,
            lng: self.lng + dlng,
        }
    }

    /// Great-circle distance to another point in meters
    pub fn distance_to(&self, other: &Coordinates) -> f64 {
        haversine_m(self.lat, self.lng, other.lat, other.lng)
    }
}

/// Haversine distance between two points in meters
pub fn haversine_m(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let lat1_rad = lat1 * PI / 180.0;
    let lat2_rad = lat2 * PI / 180.0;
    let dlat = (lat2 - lat1) * PI / 180.0;
    let dlng = (lng2 - lng1) * PI / 180.0;

    // Rounding can push `a` past 1 for near-antipodal points
    let a = ((dlat / 2.0).sin().powi(2) + lat1_rad.cos() * lat2_rad.cos() * (dlng / 2.0).sin().powi(2)).min(1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_M * c
}

/// Distance between two optional positions in meters.
///
/// Returns `0.0` when either side is unset.
pub fn distance_m(from: Option<Coordinates>, to: Option<Coordinates>) -> f64 {
    match (from, to) {
        (Some(a), Some(b)) => a.distance_to(&b),
        _ => 0.0,
    }
}
