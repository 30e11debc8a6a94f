//! Local risk evaluation
//!
//! Classifies an office perimeter from the categories of the POIs around it.
//! Only the counts matter, so the result does not depend on POI order.

use crate::poi::{Poi, PoiCategory, PoiSubcategory};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// Risk points above this count make the perimeter High risk
pub const HIGH_RISK_MIN_EXCLUSIVE: usize = 3;

/// At most this many risk points may be present for a Low classification
pub const LOW_RISK_MAX_RISK_POINTS: usize = 1;

/// Support points above this count are needed for a Low classification
pub const LOW_RISK_MIN_SUPPORT_EXCLUSIVE: usize = 2;

/// Placeholder control set returned by the local evaluator.
///
/// Not derived from the POIs. A remote analysis replaces it when available.
pub const BASELINE_CONTROLS: [&str; 5] = [
    "CCTV surveillance system",
    "Biometric access control",
    "24/7 security guards",
    "Evacuation protocol",
    "Fire suppression system",
];

/// Ordinal risk level (Low < Medium < High)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[serde(rename = "Bajo", alias = "Low")]
    Low,
    #[serde(rename = "Medio", alias = "Medium")]
    Medium,
    #[serde(rename = "Alto", alias = "High")]
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }
}

impl fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Which side dominates the vicinity: risk points or support points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GeoRiskDirection {
    /// More risk points than support points
    A,
    /// Balanced
    I,
    /// More support points than risk points
    D,
}

impl GeoRiskDirection {
    pub fn from_counts(risk: usize, support: usize) -> Self {
        match risk.cmp(&support) {
            std::cmp::Ordering::Greater => Self::A,
            std::cmp::Ordering::Equal => Self::I,
            std::cmp::Ordering::Less => Self::D,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            Self::A => "A",
            Self::I => "I",
            Self::D => "D",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::A => "risk-dominant",
            Self::I => "balanced",
            Self::D => "support-dominant",
        }
    }
}

impl fmt::Display for GeoRiskDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of a risk evaluation, local or remote.
/// Field names match the analysis service wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    #[serde(rename = "riesgoTotal")]
    pub total_risk: RiskLevel,
    #[serde(rename = "riesgoResidual")]
    pub residual_risk: RiskLevel,
    #[serde(rename = "riesgoGeografico")]
    pub geographic_risk: GeoRiskDirection,
    #[serde(rename = "controlesExistentes", default)]
    pub existing_controls: Vec<String>,
}

impl RiskAssessment {
    /// Residual risk may never exceed total risk
    pub fn is_consistent(&self) -> bool {
        self.residual_risk <= self.total_risk
    }
}

/// Per-category POI counts
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTally {
    pub risk: usize,
    pub neutral: usize,
    pub support: usize,
    pub aggregation: usize,
    pub other: usize,
    pub flood: usize,
    pub landslide: usize,
}

impl CategoryTally {
    pub fn from_pois<'a>(pois: impl IntoIterator<Item = &'a Poi>) -> Self {
        let mut tally = Self::default();
        for poi in pois {
            match poi.category {
                PoiCategory::Risk => tally.risk += 1,
                PoiCategory::Neutral => tally.neutral += 1,
                PoiCategory::Support => tally.support += 1,
                PoiCategory::Aggregation => tally.aggregation += 1,
                PoiCategory::Other(_) => tally.other += 1,
            }
            match poi.subcategory {
                Some(PoiSubcategory::Flood) => tally.flood += 1,
                Some(PoiSubcategory::Landslide) => tally.landslide += 1,
                _ => {}
            }
        }
        tally
    }

    pub fn total(&self) -> usize {
        self.risk + self.neutral + self.support + self.aggregation + self.other
    }
}

/// Total risk from the risk/support counts
pub fn classify_total(risk: usize, support: usize) -> RiskLevel {
    if risk > HIGH_RISK_MIN_EXCLUSIVE {
        RiskLevel::High
    } else if risk <= LOW_RISK_MAX_RISK_POINTS && support > LOW_RISK_MIN_SUPPORT_EXCLUSIVE {
        RiskLevel::Low
    } else {
        RiskLevel::Medium
    }
}

/// Residual risk assuming the baseline mitigations are in place.
/// Medium and Low totals both collapse to Low.
pub fn residual_for(total: RiskLevel) -> RiskLevel {
    match total {
        RiskLevel::High => RiskLevel::Medium,
        RiskLevel::Medium | RiskLevel::Low => RiskLevel::Low,
    }
}

/// Evaluate a POI set. Total function: an empty set yields Medium / Low / I.
pub fn evaluate(pois: &[Poi]) -> RiskAssessment {
    let tally = CategoryTally::from_pois(pois);

    let total_risk = classify_total(tally.risk, tally.support);
    let residual_risk = residual_for(total_risk);
    let geographic_risk = GeoRiskDirection::from_counts(tally.risk, tally.support);

    debug!(
        "Evaluated {} POIs: PR={} PN={} PA={} -> total={} residual={} geo={}",
        pois.len(),
        tally.risk,
        tally.neutral,
        tally.support,
        total_risk,
        residual_risk,
        geographic_risk
    );

    RiskAssessment {
        total_risk,
        residual_risk,
        geographic_risk,
        existing_controls: BASELINE_CONTROLS.iter().map(|c| c.to_string()).collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geo::Coordinates;

    fn pois(risk: usize, neutral: usize, support: usize) -> Vec<Poi> {
        let at = Coordinates { lat: 4.6, lng: -74.08 };
        let mut out = Vec::new();
        for (n, category) in [
            (risk, PoiCategory::Risk),
            (neutral, PoiCategory::Neutral),
            (support, PoiCategory::Support),
        ] {
            for _ in 0..n {
                out.push(Poi::new(format!("p{}", out.len()), category.clone(), "poi", at));
            }
        }
        out
    }

    #[test]
    fn test_four_risk_points_is_high() {
        let result = evaluate(&pois(4, 0, 0));
        assert_eq!(result.total_risk, RiskLevel::High);
        assert_eq!(result.residual_risk, RiskLevel::Medium);
        assert_eq!(result.geographic_risk, GeoRiskDirection::A);
    }

    #[test]
    fn test_support_dominant_is_low() {
        let result = evaluate(&pois(0, 0, 3));
        assert_eq!(result.total_risk, RiskLevel::Low);
        assert_eq!(result.residual_risk, RiskLevel::Low);
        assert_eq!(result.geographic_risk, GeoRiskDirection::D);
    }

    #[test]
    fn test_balanced_is_medium() {
        let result = evaluate(&pois(2, 0, 2));
        assert_eq!(result.total_risk, RiskLevel::Medium);
        assert_eq!(result.residual_risk, RiskLevel::Low);
        assert_eq!(result.geographic_risk, GeoRiskDirection::I);
    }

    #[test]
    fn test_empty_set() {
        let result = evaluate(&[]);
        assert_eq!(result.total_risk, RiskLevel::Medium);
        assert_eq!(result.residual_risk, RiskLevel::Low);
        assert_eq!(result.geographic_risk, GeoRiskDirection::I);
        assert_eq!(result.existing_controls.len(), 5);
    }

    #[test]
    fn test_high_wins_over_low_branch() {
        // 4 PR and plenty of PA: High is checked first
        assert_eq!(classify_total(4, 10), RiskLevel::High);
        // 1 PR, 3 PA: Low
        assert_eq!(classify_total(1, 3), RiskLevel::Low);
        // 1 PR, 2 PA: not enough support
        assert_eq!(classify_total(1, 2), RiskLevel::Medium);
        // 3 PR: boundary stays Medium
        assert_eq!(classify_total(3, 0), RiskLevel::Medium);
    }

    #[test]
    fn test_neutral_points_do_not_matter() {
        assert_eq!(evaluate(&pois(1, 0, 3)), evaluate(&pois(1, 12, 3)));
    }

    #[test]
    fn test_residual_never_exceeds_total() {
        for total in [RiskLevel::Low, RiskLevel::Medium, RiskLevel::High] {
            assert!(residual_for(total) <= total);
        }
    }

    #[test]
    fn test_tally_counts_subtypes() {
        let at = Coordinates { lat: 0.0, lng: 0.0 };
        let set = vec![
            Poi::new("1", PoiCategory::Support, "Flood zone", at).with_subcategory(PoiSubcategory::Flood),
            Poi::new("2", PoiCategory::Support, "Slide", at).with_subcategory(PoiSubcategory::Landslide),
            Poi::new("3", PoiCategory::Aggregation, "Crowd", at),
            Poi::new("4", PoiCategory::Other("Ve".into()), "Traffic", at),
        ];
        let tally = CategoryTally::from_pois(&set);
        assert_eq!(tally.support, 2);
        assert_eq!(tally.flood, 1);
        assert_eq!(tally.landslide, 1);
        assert_eq!(tally.aggregation, 1);
        assert_eq!(tally.other, 1);
        assert_eq!(tally.total(), 4);
    }

    #[test]
    fn test_wire_format_accepts_both_languages() {
        let json = r#"{"riesgoTotal":"Alto","riesgoResidual":"Medium","riesgoGeografico":"A","controlesExistentes":["Guard"]}"#;
        let parsed: RiskAssessment = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.total_risk, RiskLevel::High);
        assert_eq!(parsed.residual_risk, RiskLevel::Medium);
        assert!(parsed.is_consistent());

        let value = serde_json::to_value(&parsed).unwrap();
        assert_eq!(value["riesgoResidual"], "Medio");
    }
}
