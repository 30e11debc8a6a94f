//! Points of interest around an office

use crate::geo::Coordinates;
use serde::{Deserialize, Serialize};
use std::fmt;

/// POI category, serialized as its short code
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PoiCategory {
    /// `PR` - risk point (gas station, bar, vacant lot...)
    Risk,
    /// `PN` - neutral point
    Neutral,
    /// `PA` - support point (hospital, hazard zone under monitoring...)
    Support,
    /// `Va` - aggregation of people
    Aggregation,
    /// Any other code, kept verbatim
    Other(String),
}

impl PoiCategory {
    pub fn code(&self) -> &str {
        match self {
            Self::Risk => "PR",
            Self::Neutral => "PN",
            Self::Support => "PA",
            Self::Aggregation => "Va",
            Self::Other(code) => code,
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Self::Risk => "Risk",
            Self::Neutral => "Neutral",
            Self::Support => "Support",
            Self::Aggregation => "Aggregation",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for PoiCategory {
    fn from(code: String) -> Self {
        match code.as_str() {
            "PR" => Self::Risk,
            "PN" => Self::Neutral,
            "PA" => Self::Support,
            "Va" => Self::Aggregation,
            _ => Self::Other(code),
        }
    }
}

impl From<PoiCategory> for String {
    fn from(category: PoiCategory) -> Self {
        match category {
            PoiCategory::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

impl fmt::Display for PoiCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Hazard subtype attached to a POI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum PoiSubcategory {
    /// `inundacion`
    Flood,
    /// `deslizamiento`
    Landslide,
    Other(String),
}

impl PoiSubcategory {
    pub fn code(&self) -> &str {
        match self {
            Self::Flood => "inundacion",
            Self::Landslide => "deslizamiento",
            Self::Other(code) => code,
        }
    }
}

impl From<String> for PoiSubcategory {
    fn from(code: String) -> Self {
        match code.as_str() {
            "inundacion" | "flood" => Self::Flood,
            "deslizamiento" | "landslide" => Self::Landslide,
            _ => Self::Other(code),
        }
    }
}

impl From<PoiSubcategory> for String {
    fn from(sub: PoiSubcategory) -> Self {
        match sub {
            PoiSubcategory::Other(code) => code,
            known => known.code().to_string(),
        }
    }
}

/// A point of interest. Field names match the analysis/discovery wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Poi {
    pub id: String,
    #[serde(rename = "tipo")]
    pub category: PoiCategory,
    #[serde(rename = "subtipo", default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<PoiSubcategory>,
    #[serde(rename = "nombre")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

impl Poi {
    pub fn new(id: impl Into<String>, category: PoiCategory, name: impl Into<String>, at: Coordinates) -> Self {
        Self {
            id: id.into(),
            category,
            subcategory: None,
            name: name.into(),
            lat: at.lat,
            lng: at.lng,
        }
    }

    pub fn with_subcategory(mut self, subcategory: PoiSubcategory) -> Self {
        self.subcategory = Some(subcategory);
        self
    }

    pub fn position(&self) -> Coordinates {
        Coordinates {
            lat: self.lat,
            lng: self.lng,
        }
    }
}
