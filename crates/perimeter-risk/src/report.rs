//! Printable office security report

use crate::evaluator::CategoryTally;
use crate::geo::Coordinates;
use crate::office::{AssessmentRecord, AssessmentSource, AssessmentStatus, Office};
use crate::poi::{Poi, PoiCategory};
use crate::DEFAULT_PERIMETER_RADIUS_M;
use chrono::{DateTime, Utc};
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const CRITICAL_PROCESSES: [&str; 5] = [
    "Customer service",
    "Document management",
    "Financial operations",
    "Information security",
    "Communications",
];

pub const SERVICES: [&str; 5] = [
    "Personalized service",
    "Financial advisory",
    "Account management",
    "Loans and credit",
    "Digital services",
];

const UNEVALUATED: &str = "Unevaluated";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OfficeSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub location: Option<Coordinates>,
    pub department: String,
    pub city: String,
    pub zone: String,
    pub capacity: u32,
    pub facilities: String,
}

/// One row of the POI table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PoiDistance {
    pub poi: Poi,
    /// `None` when the office has no location
    pub distance_m: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityReport {
    pub generated_at: DateTime<Utc>,
    pub office: OfficeSummary,
    pub status: AssessmentStatus,
    pub tally: CategoryTally,
    pub assessment: Option<AssessmentRecord>,
    pub critical_processes: Vec<String>,
    pub services: Vec<String>,
    pub perimeter_radius_m: f64,
    /// Nearest first
    pub pois: Vec<PoiDistance>,
}

impl SecurityReport {
    /// Build a report. `assessment` overrides whatever the office has cached.
    pub fn build(office: &Office, assessment: Option<AssessmentRecord>) -> Self {
        let assessment = assessment.or_else(|| office.assessment.clone());

        let status = match (&assessment, office.status()) {
            (Some(_), AssessmentStatus::Pending) => AssessmentStatus::Evaluated,
            (_, status) => status,
        };

        let mut pois: Vec<PoiDistance> = office
            .pois
            .iter()
            .map(|poi| PoiDistance {
                poi: poi.clone(),
                distance_m: office.location.map(|c| c.distance_to(&poi.position())),
            })
            .collect();
        pois.sort_by(|a, b| match (a.distance_m, b.distance_m) {
            (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(std::cmp::Ordering::Equal),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => std::cmp::Ordering::Equal,
        });

        Self {
            generated_at: Utc::now(),
            office: OfficeSummary {
                id: office.id.clone(),
                name: office.name.clone(),
                address: office.address.clone(),
                location: office.location,
                department: office.profile.department.clone(),
                city: office.profile.city.clone(),
                zone: office.profile.zone.clone(),
                capacity: office.profile.capacity,
                facilities: office.profile.facilities.clone(),
            },
            status,
            tally: CategoryTally::from_pois(&office.pois),
            assessment,
            critical_processes: CRITICAL_PROCESSES.iter().map(|s| s.to_string()).collect(),
            services: SERVICES.iter().map(|s| s.to_string()).collect(),
            perimeter_radius_m: DEFAULT_PERIMETER_RADIUS_M,
            pois,
        }
    }

    pub fn render_text(&self) -> String {
        self.to_string()
    }

    /// Map layer: the office point plus one point per POI
    pub fn to_geojson(&self) -> FeatureCollection {
        let mut features = Vec::with_capacity(self.pois.len() + 1);

        if let Some(center) = self.office.location {
            features.push(point_feature(
                center,
                serde_json::json!({
                    "kind": "office",
                    "id": self.office.id,
                    "name": self.office.name,
                    "radius_m": self.perimeter_radius_m,
                    "total_risk": self.assessment.as_ref().map(|a| a.result.total_risk.as_str()),
                }),
            ));
        }

        for row in &self.pois {
            features.push(point_feature(
                row.poi.position(),
                serde_json::json!({
                    "kind": "poi",
                    "id": row.poi.id,
                    "name": row.poi.name,
                    "category": row.poi.category.code(),
                    "subcategory": row.poi.subcategory.as_ref().map(|s| s.code()),
                    "distance_m": row.distance_m,
                }),
            ));
        }

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}

fn point_feature(at: Coordinates, properties: serde_json::Value) -> Feature {
    let properties: Option<JsonObject> = match properties {
        serde_json::Value::Object(map) => Some(map),
        _ => None,
    };
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(Value::Point(vec![at.lng, at.lat]))),
        id: None,
        properties,
        foreign_members: None,
    }
}

impl fmt::Display for SecurityReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let rule = "-".repeat(60);
        let o = &self.office;

        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "OFFICE SECURITY REPORT")?;
        writeln!(f, "Generated: {}", self.generated_at.to_rfc3339())?;
        writeln!(f, "{}", "=".repeat(60))?;
        writeln!(f, "Name:        {}", o.name)?;
        writeln!(f, "Address:     {}", o.address)?;
        match o.location {
            Some(c) => writeln!(f, "Location:    {:.6}, {:.6}", c.lat, c.lng)?,
            None => writeln!(f, "Location:    Not set")?,
        }
        writeln!(f, "Department:  {}", o.department)?;
        writeln!(f, "City:        {}", o.city)?;
        writeln!(f, "Zone:        {}", o.zone)?;
        writeln!(f, "Capacity:    {} people", o.capacity)?;
        writeln!(f, "Facilities:  {}", o.facilities)?;

        writeln!(f, "{}", rule)?;
        writeln!(f, "PERIMETER ({:.0} m)", self.perimeter_radius_m)?;
        let t = &self.tally;
        writeln!(
            f,
            "PR = {}   PN = {}   PA = {}   Va = {}   Other = {}",
            t.risk, t.neutral, t.support, t.aggregation, t.other
        )?;
        writeln!(f, "Flood = {}   Landslide = {}", t.flood, t.landslide)?;
        let legend: Vec<String> = [
            PoiCategory::Risk,
            PoiCategory::Neutral,
            PoiCategory::Support,
            PoiCategory::Aggregation,
        ]
        .iter()
        .map(|c| format!("{} {}", c.code(), c.label()))
        .collect();
        writeln!(f, "Legend: {}", legend.join(", "))?;
        match &self.assessment {
            Some(a) => writeln!(
                f,
                "Geographic risk = {} ({})",
                a.result.geographic_risk,
                a.result.geographic_risk.description()
            )?,
            None => writeln!(f, "Geographic risk = N/A")?,
        }

        writeln!(f, "{}", rule)?;
        writeln!(f, "CRITICAL PROCESSES")?;
        for p in &self.critical_processes {
            writeln!(f, "  - {}", p)?;
        }
        writeln!(f, "SERVICES, PRODUCTS")?;
        for s in &self.services {
            writeln!(f, "  - {}", s)?;
        }

        writeln!(f, "{}", rule)?;
        match &self.assessment {
            Some(a) => {
                writeln!(f, "ZC RISK:           {}", a.result.total_risk)?;
                writeln!(f, "ZC RESIDUAL RISK:  {}", a.result.residual_risk)?;
                let source = match a.source {
                    AssessmentSource::Local => "local evaluator",
                    AssessmentSource::Remote => "analysis service",
                };
                writeln!(f, "Source:            {} ({})", source, a.assessed_at.to_rfc3339())?;
            }
            None => {
                writeln!(f, "ZC RISK:           {}", UNEVALUATED)?;
                writeln!(f, "ZC RESIDUAL RISK:  {}", UNEVALUATED)?;
            }
        }

        writeln!(f, "{}", rule)?;
        writeln!(f, "EXISTING CONTROLS")?;
        match self.assessment.as_ref().map(|a| &a.result.existing_controls) {
            Some(controls) if !controls.is_empty() => {
                for c in controls {
                    writeln!(f, "  - {}", c)?;
                }
            }
            _ => writeln!(f, "  No controls recorded")?,
        }

        writeln!(f, "{}", rule)?;
        writeln!(f, "POINTS OF INTEREST")?;
        if self.pois.is_empty() {
            writeln!(f, "  None")?;
        }
        for row in &self.pois {
            let name = match &row.poi.subcategory {
                Some(sub) => format!("{} ({})", row.poi.name, sub.code()),
                None => row.poi.name.clone(),
            };
            match row.distance_m {
                Some(d) => writeln!(f, "  {:<4}{:<40}{:>8.0} m", row.poi.category.code(), name, d)?,
                None => writeln!(f, "  {:<4}{:<40}{:>10}", row.poi.category.code(), name, "-")?,
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::assess_locally;
    use crate::discovery::simulated_pois;

    fn sample_office() -> Office {
        let center = Coordinates::new(4.6097, -74.0817).unwrap();
        let mut office = Office::new("of-7", "Centro Internacional", "Calle 26 # 7-30");
        office.profile.city = "Bogotá".into();
        office.profile.capacity = 35;
        office.set_location(center);
        office.replace_pois(simulated_pois(center));
        office
    }

    #[test]
    fn test_unevaluated_report() {
        let report = SecurityReport::build(&sample_office(), None);
        assert_eq!(report.status, AssessmentStatus::Pending);

        let text = report.render_text();
        assert!(text.contains("ZC RISK:           Unevaluated"));
        assert!(text.contains("No controls recorded"));
        assert!(text.contains("Geographic risk = N/A"));
        assert!(text.contains("PR = 1   PN = 1   PA = 3   Va = 1"));
        assert!(text.contains("Legend: PR Risk, PN Neutral, PA Support, Va Aggregation"));
    }

    #[test]
    fn test_evaluated_report() {
        let office = sample_office();
        let record = assess_locally(&office).unwrap();
        let report = SecurityReport::build(&office, Some(record));
        assert_eq!(report.status, AssessmentStatus::Evaluated);

        let text = report.render_text();
        assert!(text.contains("ZC RISK:           Low"));
        assert!(text.contains("Geographic risk = D (support-dominant)"));
        assert!(text.contains("CCTV surveillance system"));
        assert!(text.contains("Location:    4.609700, -74.081700"));
    }

    #[test]
    fn test_pois_sorted_nearest_first() {
        let report = SecurityReport::build(&sample_office(), None);
        let distances: Vec<f64> = report.pois.iter().filter_map(|r| r.distance_m).collect();
        assert_eq!(distances.len(), 6);
        assert!(distances.windows(2).all(|w| w[0] <= w[1]));
    }

    #[test]
    fn test_no_location_leaves_distances_empty() {
        let mut office = sample_office();
        office.clear_location();
        let report = SecurityReport::build(&office, None);
        assert_eq!(report.status, AssessmentStatus::MissingLocation);
        assert!(report.pois.iter().all(|r| r.distance_m.is_none()));
        assert!(report.to_geojson().features.len() == 6);
    }

    #[test]
    fn test_geojson_layer() {
        let report = SecurityReport::build(&sample_office(), None);
        let collection = report.to_geojson();
        assert_eq!(collection.features.len(), 7);

        let office = &collection.features[0];
        let props = office.properties.as_ref().unwrap();
        assert_eq!(props["kind"], "office");
        assert_eq!(props["radius_m"], 200.0);

        let json = serde_json::to_string(&collection).unwrap();
        assert!(json.contains("FeatureCollection"));
        assert!(json.contains("-74.0817"));
    }
}
