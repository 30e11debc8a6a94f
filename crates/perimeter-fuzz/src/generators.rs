//! Generators for the perimeter domain
//!
//! Coordinates stay inside the valid WGS84 range. POI sets mix every
//! category, including unknown codes, so category handling is exercised too.

use perimeter_risk::{Coordinates, Poi, PoiCategory, PoiSubcategory};
use proptest::prelude::*;
use std::ops::Range;

// ============================================================================
// Geodesy
// ============================================================================

/// Latitude in degrees (-90 to 90)
pub fn latitude_deg() -> impl Strategy<Value = f64> {
    -90.0f64..=90.0
}

/// Longitude in degrees (-180 to 180)
pub fn longitude_deg() -> impl Strategy<Value = f64> {
    -180.0f64..=180.0
}

/// Any valid coordinate pair
pub fn coordinates() -> impl Strategy<Value = Coordinates> {
    (latitude_deg(), longitude_deg()).prop_map(|(lat, lng)| Coordinates { lat, lng })
}

/// A point within roughly `max_deg` degrees of `center`, clamped to range
pub fn nearby(center: Coordinates, max_deg: f64) -> impl Strategy<Value = Coordinates> {
    (-max_deg..=max_deg, -max_deg..=max_deg).prop_map(move |(dlat, dlng)| Coordinates {
        lat: (center.lat + dlat).clamp(-90.0, 90.0),
        lng: (center.lng + dlng).clamp(-180.0, 180.0),
    })
}

// ============================================================================
// POIs
// ============================================================================

/// Unknown category code (never one of PR, PN, PA, Va)
pub fn unknown_code() -> impl Strategy<Value = String> {
    "[a-z]{1,3}[0-9]{0,2}".prop_filter("known code", |s| !matches!(s.as_str(), "PR" | "PN" | "PA" | "Va"))
}

/// POI category, weighted towards the four known codes
pub fn poi_category() -> impl Strategy<Value = PoiCategory> {
    prop_oneof![
        4 => Just(PoiCategory::Risk),
        2 => Just(PoiCategory::Neutral),
        4 => Just(PoiCategory::Support),
        1 => Just(PoiCategory::Aggregation),
        1 => unknown_code().prop_map(PoiCategory::Other),
    ]
}

/// Optional hazard subtype
pub fn poi_subcategory() -> impl Strategy<Value = Option<PoiSubcategory>> {
    prop_oneof![
        3 => Just(None),
        1 => Just(Some(PoiSubcategory::Flood)),
        1 => Just(Some(PoiSubcategory::Landslide)),
    ]
}

/// Display name
pub fn poi_name() -> impl Strategy<Value = String> {
    "[A-Z][a-z]{2,10}( [a-z]{2,8})?"
}

pub fn poi() -> impl Strategy<Value = Poi> {
    ("[0-9a-f]{8}", poi_category(), poi_subcategory(), poi_name(), coordinates()).prop_map(
        |(id, category, subcategory, name, at)| {
            let mut poi = Poi::new(id, category, name, at);
            poi.subcategory = subcategory;
            poi
        },
    )
}

/// POI set with a size drawn from `size`
pub fn poi_set(size: Range<usize>) -> impl Strategy<Value = Vec<Poi>> {
    prop::collection::vec(poi(), size)
}

/// POI set together with a shuffled copy of itself
pub fn poi_set_and_permutation(size: Range<usize>) -> impl Strategy<Value = (Vec<Poi>, Vec<Poi>)> {
    poi_set(size).prop_flat_map(|pois| {
        let original = pois.clone();
        Just(pois).prop_shuffle().prop_map(move |shuffled| (original.clone(), shuffled))
    })
}

/// Only risk and support points, with the counts that produced them
pub fn risk_support_counts() -> impl Strategy<Value = (usize, usize)> {
    (0usize..10, 0usize..10)
}

/// Build a POI set with exactly `risk` PR and `support` PA entries
pub fn pois_with_counts(risk: usize, support: usize) -> Vec<Poi> {
    let at = Coordinates { lat: 0.0, lng: 0.0 };
    (0..risk)
        .map(|i| Poi::new(format!("pr-{}", i), PoiCategory::Risk, "Risk point", at))
        .chain((0..support).map(|i| Poi::new(format!("pa-{}", i), PoiCategory::Support, "Support point", at)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    proptest! {
        #[test]
        fn test_coordinates_are_valid(c in coordinates()) {
            prop_assert!(c.validate().is_ok());
        }

        #[test]
        fn test_nearby_stays_valid(center in coordinates(), c in nearby(Coordinates { lat: 89.9, lng: 179.9 }, 0.5)) {
            prop_assert!(center.validate().is_ok());
            prop_assert!(c.validate().is_ok());
        }

        #[test]
        fn test_unknown_code_is_not_known(code in unknown_code()) {
            prop_assert!(matches!(PoiCategory::from(code), PoiCategory::Other(_)));
        }

        #[test]
        fn test_permutation_keeps_elements((a, b) in poi_set_and_permutation(0..8)) {
            prop_assert_eq!(a.len(), b.len());
            for poi in &a {
                prop_assert!(b.contains(poi));
            }
        }
    }

    #[test]
    fn test_pois_with_counts() {
        let pois = pois_with_counts(3, 2);
        assert_eq!(pois.len(), 5);
        assert_eq!(pois.iter().filter(|p| p.category == PoiCategory::Risk).count(), 3);
    }
}
