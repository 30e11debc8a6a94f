//! Perimeter Fuzz Harness
//!
//! Property-based testing for the perimeter risk model: POI generators,
//! the named invariants of the evaluator and geodesy helpers, and a
//! counting runner for long CLI runs.
//!
//! # Usage
//!
//! ```rust
//! use perimeter_fuzz::prelude::*;
//!
//! proptest! {
//!     #[test]
//!     fn residual_never_exceeds_total(pois in poi_set(0..12)) {
//!         let a = evaluate(&pois);
//!         prop_assert!(a.residual_risk <= a.total_risk);
//!     }
//! }
//! ```

pub mod generators;
pub mod runner;
pub mod targets;

pub mod prelude {
    pub use crate::generators::*;
    pub use crate::runner::{FuzzConfig, FuzzFailure, FuzzResult, FuzzRunner};
    pub use perimeter_risk::{evaluate, Coordinates, Poi, PoiCategory, RiskLevel};
    pub use proptest::prelude::*;
}

// Re-export proptest for convenience
pub use proptest;
