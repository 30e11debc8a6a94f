//! Assessment service
//!
//! Picks the assessment source for an office: the remote analysis when it
//! answers with a valid result, the local evaluator otherwise.

use crate::evaluator::evaluate;
use crate::office::{AssessmentRecord, AssessmentSource, Office};
use crate::Result;
use tracing::info;

#[cfg(feature = "remote")]
use crate::discovery::simulated_pois;
#[cfg(feature = "remote")]
use crate::geo::Coordinates;
#[cfg(feature = "remote")]
use crate::poi::Poi;
#[cfg(feature = "remote")]
use crate::remote::AnalysisClient;
#[cfg(feature = "remote")]
use tracing::warn;

/// Evaluate an office with the local heuristic only
pub fn assess_locally(office: &Office) -> Result<AssessmentRecord> {
    office.assessment_center()?;
    let record = AssessmentRecord::new(evaluate(&office.pois), AssessmentSource::Local);
    info!(
        "Assessed office {} locally: total={} residual={} geo={}",
        office.id, record.result.total_risk, record.result.residual_risk, record.result.geographic_risk
    );
    Ok(record)
}

/// Cached assessment if present, otherwise a fresh local one
pub fn current_or_local(office: &Office) -> Result<AssessmentRecord> {
    match &office.assessment {
        Some(record) => Ok(record.clone()),
        None => assess_locally(office),
    }
}

/// Evaluate an office, preferring the remote analysis service.
///
/// Remote failures are logged and replaced by the local result; only a
/// missing location or an empty POI set is reported to the caller.
#[cfg(feature = "remote")]
pub async fn assess(office: &Office, client: Option<&AnalysisClient>) -> Result<AssessmentRecord> {
    let center = office.assessment_center()?;

    let Some(client) = client else {
        return assess_locally(office);
    };

    match client.analyze(center, &office.pois).await {
        Ok(result) => {
            info!(
                "Assessed office {} remotely: total={} residual={} geo={}",
                office.id, result.total_risk, result.residual_risk, result.geographic_risk
            );
            Ok(AssessmentRecord::new(result, AssessmentSource::Remote))
        }
        Err(e) => {
            warn!("Analysis service failed for office {} ({}), using local evaluator", office.id, e);
            assess_locally(office)
        }
    }
}

/// Discover POIs around `center`, falling back to the simulated set
#[cfg(feature = "remote")]
pub async fn discover_pois(center: Coordinates, radius_m: f64, client: Option<&AnalysisClient>) -> Vec<Poi> {
    let Some(client) = client else {
        return simulated_pois(center);
    };

    match client.discover(center, radius_m).await {
        Ok(pois) => {
            info!("Discovered {} POIs within {:.0} m", pois.len(), radius_m);
            pois
        }
        Err(e) => {
            warn!("Discovery failed ({}), using simulated POIs", e);
            simulated_pois(center)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::RiskLevel;
    use crate::geo::Coordinates;
    use crate::poi::{Poi, PoiCategory};
    use crate::RiskError;

    fn office_with(pois: usize) -> Office {
        let center = Coordinates::new(4.6097, -74.0817).unwrap();
        let mut office = Office::new("of-1", "Centro", "Calle 10");
        office.set_location(center);
        for i in 0..pois {
            office.add_poi(Poi::new(i.to_string(), PoiCategory::Risk, "Bar", center.offset(0.001, 0.0)));
        }
        office
    }

    #[test]
    fn test_local_assessment() {
        let record = assess_locally(&office_with(5)).unwrap();
        assert_eq!(record.source, AssessmentSource::Local);
        assert_eq!(record.result.total_risk, RiskLevel::High);
    }

    #[test]
    fn test_missing_pois_is_reported() {
        assert!(matches!(
            assess_locally(&office_with(0)),
            Err(RiskError::MissingPrerequisite { .. })
        ));
    }

    #[test]
    fn test_current_prefers_cache() {
        let mut office = office_with(1);
        let mut cached = assess_locally(&office).unwrap();
        cached.result.existing_controls = vec!["Guard dog".to_string()];
        office.record_assessment(cached.clone());
        assert_eq!(current_or_local(&office).unwrap(), cached);
    }

    #[cfg(feature = "remote")]
    mod remote {
        use super::*;
        use crate::assessment::{assess, discover_pois};
        use crate::discovery::simulated_pois;
        use crate::remote::test_support::stub_client;
        use crate::remote::{AnalysisClient, AnalysisClientConfig};
        use axum::{http::StatusCode, routing::post, Json, Router};
        use serde_json::json;

        fn unreachable_client() -> AnalysisClient {
            AnalysisClient::new(AnalysisClientConfig {
                base_url: "http://127.0.0.1:9".to_string(),
                timeout_sec: 2,
            })
            .unwrap()
        }

        #[tokio::test]
        async fn test_unreachable_service_falls_back() {
            let client = unreachable_client();
            let record = assess(&office_with(4), Some(&client)).await.unwrap();
            assert_eq!(record.source, AssessmentSource::Local);
            assert_eq!(record.result.total_risk, RiskLevel::High);
        }

        #[tokio::test]
        async fn test_no_client_is_local() {
            let record = assess(&office_with(2), None).await.unwrap();
            assert_eq!(record.source, AssessmentSource::Local);
        }

        #[tokio::test]
        async fn test_discovery_falls_back_to_simulated() {
            let client = unreachable_client();
            let center = Coordinates::new(4.6097, -74.0817).unwrap();
            let pois = discover_pois(center, 200.0, Some(&client)).await;
            assert_eq!(pois, simulated_pois(center));
        }

        fn analysis_reply(total: &'static str, residual: &'static str) -> Router {
            Router::new().route(
                "/analyze",
                post(move || async move {
                    Json(json!({
                        "riesgoTotal": total,
                        "riesgoResidual": residual,
                        "riesgoGeografico": "A",
                        "controlesExistentes": ["Access control"]
                    }))
                }),
            )
        }

        #[tokio::test]
        async fn test_remote_result_is_used() {
            let client = stub_client(analysis_reply("Alto", "Medio")).await;
            let record = assess(&office_with(1), Some(&client)).await.unwrap();
            assert_eq!(record.source, AssessmentSource::Remote);
            assert_eq!(record.result.total_risk, RiskLevel::High);
            assert_eq!(record.result.existing_controls, vec!["Access control".to_string()]);
        }

        #[tokio::test]
        async fn test_inconsistent_remote_result_falls_back() {
            let client = stub_client(analysis_reply("Bajo", "Alto")).await;
            let record = assess(&office_with(1), Some(&client)).await.unwrap();
            assert_eq!(record.source, AssessmentSource::Local);
            assert_eq!(record.result.total_risk, RiskLevel::Medium);
            assert_eq!(record.result.residual_risk, RiskLevel::Low);
        }

        #[tokio::test]
        async fn test_error_status_falls_back() {
            let router = Router::new()
                .route("/analyze", post(|| async { StatusCode::SERVICE_UNAVAILABLE }))
                .route("/places", post(|| async { StatusCode::SERVICE_UNAVAILABLE }));
            let client = stub_client(router).await;

            let record = assess(&office_with(4), Some(&client)).await.unwrap();
            assert_eq!(record.source, AssessmentSource::Local);
            assert_eq!(record.result.total_risk, RiskLevel::High);

            let center = Coordinates::new(4.6097, -74.0817).unwrap();
            assert_eq!(discover_pois(center, 200.0, Some(&client)).await, simulated_pois(center));
        }

        #[tokio::test]
        async fn test_unusable_places_fall_back_to_simulated() {
            let router = Router::new().route(
                "/places",
                post(|| async { Json(json!({"POIs": [{"id": "z", "tipo": "PR", "nombre": "Nowhere", "lat": 95.0, "lng": 0.0}]})) }),
            );
            let client = stub_client(router).await;
            let center = Coordinates::new(4.6097, -74.0817).unwrap();
            let pois = discover_pois(center, 200.0, Some(&client)).await;
            assert_eq!(pois.len(), 6);
            assert_eq!(pois, simulated_pois(center));

            let empty = stub_client(Router::new().route("/places", post(|| async { Json(json!({})) }))).await;
            assert_eq!(discover_pois(center, 200.0, Some(&empty)).await, simulated_pois(center));
        }

        #[tokio::test]
        async fn test_remote_places_are_kept() {
            let router = Router::new().route(
                "/places",
                post(|| async { Json(json!({"POIs": [{"id": "r1", "tipo": "PN", "nombre": "Park", "lat": 4.61, "lng": -74.08}]})) }),
            );
            let client = stub_client(router).await;
            let center = Coordinates::new(4.6097, -74.0817).unwrap();
            let pois = discover_pois(center, 200.0, Some(&client)).await;
            assert_eq!(pois.len(), 1);
            assert_eq!(pois[0].id, "r1");
        }
    }
}
