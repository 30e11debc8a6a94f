//! POI discovery fallback
//!
//! When no discovery service answers, the perimeter is seeded with a fixed
//! set of six POIs laid out around the office (roughly 100-180 m away).

use crate::geo::Coordinates;
use crate::poi::{Poi, PoiCategory, PoiSubcategory};

/// (id, category, subcategory, name, dlat, dlng)
const SIMULATED_LAYOUT: [(&str, &str, Option<&str>, &str, f64, f64); 6] = [
    ("1", "PR", None, "Gas station", 0.001, 0.001),
    ("2", "PN", None, "Police station", -0.001, 0.0008),
    ("3", "PA", None, "Hospital", 0.0008, -0.001),
    ("4", "PA", Some("inundacion"), "Flood zone", -0.0005, -0.0012),
    ("5", "PA", Some("deslizamiento"), "Landslide zone", 0.0015, -0.0005),
    ("6", "Va", None, "Crowd gathering", -0.0012, 0.0015),
];

/// The fixed six-entry POI set around `center`
pub fn simulated_pois(center: Coordinates) -> Vec<Poi> {
    SIMULATED_LAYOUT
        .iter()
        .map(|&(id, category, subcategory, name, dlat, dlng)| {
            let poi = Poi::new(
                id,
                PoiCategory::from(category.to_string()),
                name,
                center.offset(dlat, dlng),
            );
            match subcategory {
                Some(sub) => poi.with_subcategory(PoiSubcategory::from(sub.to_string())),
                None => poi,
            }
        })
        .collect()
}
