//! Perimeter Risk Library
//!
//! Security assessment of office perimeters from the points of interest
//! (POIs) found around them.
//!
//! # Risk Model
//!
//! ```text
//! total    = High    if PR > 3
//!          = Low     if PR <= 1 and PA > 2
//!          = Medium  otherwise
//! residual = Medium  if total = High, else Low
//! geo      = A | I | D   (PR vs PA: greater | equal | less)
//! ```
//!
//! | Code | Category | Role in the model |
//! |------|----------|-------------------|
//! | PR   | Risk     | raises total risk, pushes direction to A |
//! | PN   | Neutral  | counted, no effect |
//! | PA   | Support  | lowers total risk, pushes direction to D |
//! | Va   | Aggregation | report legend only |
//!
//! Distances use the haversine formula on a 6,371 km sphere.

use thiserror::Error;

pub mod assessment;
pub mod discovery;
pub mod evaluator;
pub mod geo;
pub mod office;
pub mod poi;
#[cfg(feature = "remote")]
pub mod remote;
pub mod report;
pub mod store;

pub use evaluator::{evaluate, CategoryTally, GeoRiskDirection, RiskAssessment, RiskLevel};
pub use geo::{distance_m, haversine_m, Coordinates};
pub use office::{AssessmentRecord, AssessmentSource, AssessmentStatus, Office, OfficeProfile};
pub use poi::{Poi, PoiCategory, PoiSubcategory};
pub use report::SecurityReport;
pub use store::{JsonFileRepository, MemoryRepository, OfficeRepository};

/// Mean Earth radius in meters
pub const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Perimeter radius drawn around an office and used for POI discovery (meters)
pub const DEFAULT_PERIMETER_RADIUS_M: f64 = 200.0;

#[derive(Error, Debug)]
pub enum RiskError {
    #[error("Office not found: {0}")]
    NotFound(String),
    #[error("Office already exists: {0}")]
    Duplicate(String),
    #[error("POI not found in office {office}: {poi}")]
    PoiNotFound { office: String, poi: String },
    #[error("Invalid coordinates: lat={lat}, lng={lng}")]
    InvalidCoordinates { lat: f64, lng: f64 },
    #[error("Office {office} cannot be assessed: {reason}")]
    MissingPrerequisite { office: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Failed to persist office store: {0}")]
    Persist(#[from] tempfile::PersistError),
}

pub type Result<T> = std::result::Result<T, RiskError>;
