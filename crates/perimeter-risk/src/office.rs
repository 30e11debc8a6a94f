//! Office records
//!
//! An office owns its POIs and caches its latest assessment. Anything that
//! changes the inputs of the evaluation (location or POI set) drops the cache.

use crate::evaluator::RiskAssessment;
use crate::geo::Coordinates;
use crate::poi::Poi;
use crate::{Result, RiskError};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Administrative metadata shown in the report header
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OfficeProfile {
    #[serde(default)]
    pub department: String,
    #[serde(default)]
    pub city: String,
    #[serde(default)]
    pub zone: String,
    /// Maximum number of people on site
    #[serde(default)]
    pub capacity: u32,
    #[serde(default)]
    pub facilities: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentSource {
    /// Computed by the local evaluator
    Local,
    /// Returned by the external analysis service
    Remote,
}

/// A cached assessment with provenance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AssessmentRecord {
    #[serde(flatten)]
    pub result: RiskAssessment,
    pub source: AssessmentSource,
    pub assessed_at: DateTime<Utc>,
}

impl AssessmentRecord {
    pub fn new(result: RiskAssessment, source: AssessmentSource) -> Self {
        Self {
            result,
            source,
            assessed_at: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentStatus {
    /// No location set yet
    MissingLocation,
    /// Location set but no POIs attached
    MissingPois,
    /// Inputs are complete but nothing has been computed since the last change
    Pending,
    Evaluated,
}

impl AssessmentStatus {
    pub fn is_evaluated(&self) -> bool {
        matches!(self, Self::Evaluated)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Office {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(flatten)]
    pub profile: OfficeProfile,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Coordinates>,
    #[serde(default)]
    pub pois: Vec<Poi>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assessment: Option<AssessmentRecord>,
}

impl Office {
    pub fn new(id: impl Into<String>, name: impl Into<String>, address: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            address: address.into(),
            profile: OfficeProfile::default(),
            location: None,
            pois: Vec::new(),
            assessment: None,
        }
    }

    /// New office with a random v4 id
    pub fn with_generated_id(name: impl Into<String>, address: impl Into<String>) -> Self {
        Self::new(uuid::Uuid::new_v4().to_string(), name, address)
    }

    pub fn status(&self) -> AssessmentStatus {
        if self.location.is_none() {
            AssessmentStatus::MissingLocation
        } else if self.pois.is_empty() {
            AssessmentStatus::MissingPois
        } else if self.assessment.is_none() {
            AssessmentStatus::Pending
        } else {
            AssessmentStatus::Evaluated
        }
    }

    /// Location of an office that has everything needed for an evaluation
    pub fn assessment_center(&self) -> Result<Coordinates> {
        let center = self.location.ok_or_else(|| RiskError::MissingPrerequisite {
            office: self.id.clone(),
            reason: "location not set".to_string(),
        })?;
        if self.pois.is_empty() {
            return Err(RiskError::MissingPrerequisite {
                office: self.id.clone(),
                reason: "no points of interest".to_string(),
            });
        }
        Ok(center)
    }

    pub fn set_location(&mut self, location: Coordinates) {
        self.location = Some(location);
        self.invalidate();
    }

    pub fn clear_location(&mut self) {
        self.location = None;
        self.invalidate();
    }

    pub fn add_poi(&mut self, poi: Poi) {
        self.pois.push(poi);
        self.invalidate();
    }

    pub fn remove_poi(&mut self, poi_id: &str) -> Result<Poi> {
        let idx = self
            .pois
            .iter()
            .position(|p| p.id == poi_id)
            .ok_or_else(|| RiskError::PoiNotFound {
                office: self.id.clone(),
                poi: poi_id.to_string(),
            })?;
        let removed = self.pois.remove(idx);
        self.invalidate();
        Ok(removed)
    }

    pub fn replace_pois(&mut self, pois: Vec<Poi>) {
        self.pois = pois;
        self.invalidate();
    }

    pub fn update_profile(&mut self, name: Option<String>, address: Option<String>, profile: Option<OfficeProfile>) {
        if let Some(name) = name {
            self.name = name;
        }
        if let Some(address) = address {
            self.address = address;
        }
        if let Some(profile) = profile {
            self.profile = profile;
        }
    }

    pub fn record_assessment(&mut self, record: AssessmentRecord) {
        self.assessment = Some(record);
    }

    fn invalidate(&mut self) {
        self.assessment = None;
    }
}
