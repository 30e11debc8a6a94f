//! External analysis service client
//!
//! Two endpoints under one base URL:
//!
//! | Endpoint | Request | Response |
//! |----------|---------|----------|
//! | `POST {base}/analyze` | `{center, pois}` | `{riesgoTotal, riesgoResidual, riesgoGeografico, controlesExistentes}` |
//! | `POST {base}/places`  | `{center, radio}` | `{POIs: [...]}` |
//!
//! One attempt per call, no retry. Every failure comes back as a
//! [`RemoteError`] and the caller decides what to fall back to.
//!
//! # Usage
//!
//! ```rust,ignore
//! let client = AnalysisClient::new(AnalysisClientConfig::with_base_url("http://analysis:8080"))?;
//! let result = client.analyze(center, &office.pois).await;
//! ```

use crate::evaluator::RiskAssessment;
use crate::geo::Coordinates;
use crate::poi::Poi;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisClientConfig {
    /// Base URL without trailing slash
    pub base_url: String,
    /// Request timeout in seconds (default: 10)
    pub timeout_sec: u64,
}

impl AnalysisClientConfig {
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout_sec: 10,
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RemoteError {
    #[error("Request failed: {0}")]
    Transport(String),
    #[error("Service returned status {0}")]
    Status(u16),
    #[error("Parse error: {0}")]
    Decode(String),
    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

#[derive(Serialize)]
struct AnalyzeRequest<'a> {
    center: Coordinates,
    pois: &'a [Poi],
}

#[derive(Serialize)]
struct PlacesRequest {
    center: Coordinates,
    radio: f64,
}

#[derive(Deserialize)]
struct PlacesResponse {
    #[serde(rename = "POIs")]
    pois: Option<Vec<Poi>>,
}

/// Check an analysis response before it is allowed to replace a local result
pub fn validate_assessment(assessment: RiskAssessment) -> Result<RiskAssessment, RemoteError> {
    if !assessment.is_consistent() {
        return Err(RemoteError::InvalidResponse(format!(
            "residual risk {} exceeds total risk {}",
            assessment.residual_risk, assessment.total_risk
        )));
    }
    Ok(assessment)
}

/// Check discovered POIs before they are stored on an office
pub fn validate_places(pois: Vec<Poi>) -> Result<Vec<Poi>, RemoteError> {
    if let Some(bad) = pois.iter().find(|p| Coordinates::new(p.lat, p.lng).is_err()) {
        return Err(RemoteError::InvalidResponse(format!(
            "POI {} has invalid coordinates ({}, {})",
            bad.id, bad.lat, bad.lng
        )));
    }
    Ok(pois)
}

pub struct AnalysisClient {
    config: AnalysisClientConfig,
    client: reqwest::Client,
}

impl AnalysisClient {
    pub fn new(config: AnalysisClientConfig) -> Result<Self, RemoteError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_sec))
            .build()
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Ask the service for a full risk assessment
    pub async fn analyze(&self, center: Coordinates, pois: &[Poi]) -> Result<RiskAssessment, RemoteError> {
        let url = format!("{}/analyze", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&AnalyzeRequest { center, pois })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let assessment: RiskAssessment = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        validate_assessment(assessment)
    }

    /// Ask the service for POIs within `radius_m` of `center`
    pub async fn discover(&self, center: Coordinates, radius_m: f64) -> Result<Vec<Poi>, RemoteError> {
        let url = format!("{}/places", self.config.base_url);
        let response = self
            .client
            .post(&url)
            .json(&PlacesRequest {
                center,
                radio: radius_m,
            })
            .send()
            .await
            .map_err(|e| RemoteError::Transport(e.to_string()))?;

        if !response.status().is_success() {
            return Err(RemoteError::Status(response.status().as_u16()));
        }

        let data: PlacesResponse = response
            .json()
            .await
            .map_err(|e| RemoteError::Decode(e.to_string()))?;

        let pois = data
            .pois
            .ok_or_else(|| RemoteError::InvalidResponse("missing POIs array".to_string()))?;
        validate_places(pois)
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::stub_client;
    use super::*;
    use crate::evaluator::{GeoRiskDirection, RiskLevel};
    use crate::poi::PoiCategory;
    use axum::{http::StatusCode, routing::post, Json, Router};
    use serde_json::{json, Value};

    #[test]
    fn test_rejects_inconsistent_assessment() {
        let bad = RiskAssessment {
            total_risk: RiskLevel::Low,
            residual_risk: RiskLevel::High,
            geographic_risk: GeoRiskDirection::I,
            existing_controls: vec![],
        };
        assert!(matches!(validate_assessment(bad), Err(RemoteError::InvalidResponse(_))));
    }

    #[test]
    fn test_trims_trailing_slash() {
        let config = AnalysisClientConfig::with_base_url("http://localhost:8080/");
        assert_eq!(config.base_url, "http://localhost:8080");
    }

    #[test]
    fn test_places_response_without_pois() {
        let parsed: PlacesResponse = serde_json::from_str(r#"{"status":"ok"}"#).unwrap();
        assert!(parsed.pois.is_none());
    }

    #[test]
    fn test_rejects_out_of_range_places() {
        let good = Poi::new("1", PoiCategory::Risk, "Bar", Coordinates { lat: 4.6, lng: -74.0 });
        let mut bad = good.clone();
        bad.id = "2".to_string();
        bad.lat = 91.0;

        assert_eq!(validate_places(vec![good.clone()]).unwrap(), vec![good.clone()]);
        let err = validate_places(vec![good, bad]).unwrap_err();
        assert!(matches!(&err, RemoteError::InvalidResponse(msg) if msg.contains("POI 2")));
    }

    fn center() -> Coordinates {
        Coordinates::new(4.6097, -74.0817).unwrap()
    }

    #[tokio::test]
    async fn test_analyze_against_stub_service() {
        let router = Router::new().route(
            "/analyze",
            post(|Json(body): Json<Value>| async move {
                // Echo the POI count back as a control so the request shape is checked
                let count = body["pois"].as_array().map(|a| a.len()).unwrap_or(0);
                Json(json!({
                    "riesgoTotal": "Alto",
                    "riesgoResidual": "Medio",
                    "riesgoGeografico": "A",
                    "controlesExistentes": [format!("{} pois at {}", count, body["center"]["lat"])]
                }))
            }),
        );
        let client = stub_client(router).await;
        let pois = vec![Poi::new("1", PoiCategory::Risk, "Bar", center())];

        let result = client.analyze(center(), &pois).await.unwrap();
        assert_eq!(result.total_risk, RiskLevel::High);
        assert_eq!(result.residual_risk, RiskLevel::Medium);
        assert_eq!(result.geographic_risk, GeoRiskDirection::A);
        assert_eq!(result.existing_controls, vec!["1 pois at 4.6097".to_string()]);
    }

    #[tokio::test]
    async fn test_error_status_is_reported() {
        let router = Router::new()
            .route("/analyze", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
            .route("/places", post(|| async { StatusCode::INTERNAL_SERVER_ERROR }));
        let client = stub_client(router).await;

        let analyzed = client.analyze(center(), &[]).await;
        assert!(matches!(analyzed, Err(RemoteError::Status(503))));
        let discovered = client.discover(center(), 200.0).await;
        assert!(matches!(discovered, Err(RemoteError::Status(500))));
    }

    #[tokio::test]
    async fn test_places_stub_responses() {
        let router = Router::new()
            .route(
                "/places",
                post(|Json(body): Json<Value>| async move {
                    match body["radio"].as_f64() {
                        Some(r) if r < 100.0 => Json(json!({"status": "ok"})),
                        Some(r) if r < 1000.0 => Json(json!({"POIs": [
                            {"id": "a", "tipo": "PA", "nombre": "Clinic", "lat": 4.61, "lng": -74.08}
                        ]})),
                        _ => Json(json!({"POIs": [
                            {"id": "z", "tipo": "PR", "nombre": "Nowhere", "lat": 500.0, "lng": 999.0}
                        ]})),
                    }
                }),
            )
            .route("/analyze", post(|| async { "not json" }));
        let client = stub_client(router).await;

        let found = client.discover(center(), 200.0).await.unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].category, PoiCategory::Support);

        let missing = client.discover(center(), 50.0).await;
        assert!(matches!(missing, Err(RemoteError::InvalidResponse(_))));

        let out_of_range = client.discover(center(), 5000.0).await;
        assert!(matches!(out_of_range, Err(RemoteError::InvalidResponse(_))));

        let undecodable = client.analyze(center(), &[]).await;
        assert!(matches!(undecodable, Err(RemoteError::Decode(_))));
    }

    #[tokio::test]
    async fn test_inconsistent_stub_assessment_is_rejected() {
        let router = Router::new().route(
            "/analyze",
            post(|| async {
                Json(json!({
                    "riesgoTotal": "Bajo",
                    "riesgoResidual": "Alto",
                    "riesgoGeografico": "I",
                    "controlesExistentes": []
                }))
            }),
        );
        let client = stub_client(router).await;

        let result = client.analyze(center(), &[]).await;
        assert!(matches!(result, Err(RemoteError::InvalidResponse(_))));
    }

    #[tokio::test]
    async fn test_unreachable_service_is_transport_error() {
        // Port 9 (discard) is closed on test hosts
        let client = AnalysisClient::new(AnalysisClientConfig {
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_sec: 2,
        })
        .unwrap();

        let center = Coordinates::new(4.6097, -74.0817).unwrap();
        let result = client.discover(center, 200.0).await;
        assert!(matches!(result, Err(RemoteError::Transport(_))));
    }
}
