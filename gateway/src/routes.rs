//! Office routes
//!
//! CRUD on offices and their POIs, discovery, assessment and reports.
//! Store writes run on the blocking pool, one record at a time.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use perimeter_risk::assessment::{assess, discover_pois};
use perimeter_risk::{
    distance_m, evaluate, AssessmentRecord, AssessmentStatus, Coordinates, Office, OfficeProfile,
    OfficeRepository, Poi, PoiCategory, PoiSubcategory, RiskAssessment, RiskError, SecurityReport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::{ApiError, ApiJson, ApiResult};
use crate::AppState;

// ========== Request/Response Types ==========

#[derive(Serialize)]
pub struct OfficeView {
    #[serde(flatten)]
    pub office: Office,
    pub status: AssessmentStatus,
}

impl From<Office> for OfficeView {
    fn from(office: Office) -> Self {
        let status = office.status();
        Self { office, status }
    }
}

#[derive(Deserialize)]
pub struct CreateOfficeRequest {
    pub id: Option<String>,
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(flatten)]
    pub profile: OfficeProfile,
    pub location: Option<Coordinates>,
}

#[derive(Deserialize)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub address: Option<String>,
    pub profile: Option<OfficeProfile>,
}

#[derive(Deserialize)]
pub struct NewPoiRequest {
    #[serde(rename = "tipo", alias = "category")]
    pub category: PoiCategory,
    #[serde(rename = "subtipo", alias = "subcategory", default)]
    pub subcategory: Option<PoiSubcategory>,
    #[serde(rename = "nombre", alias = "name")]
    pub name: String,
    pub lat: f64,
    pub lng: f64,
}

#[derive(Deserialize, Default)]
pub struct DiscoverRequest {
    pub radius_m: Option<f64>,
}

#[derive(Serialize)]
pub struct AssessmentResponse {
    pub office_id: String,
    pub status: AssessmentStatus,
    pub assessment: AssessmentRecord,
}

#[derive(Deserialize)]
pub struct ReportQuery {
    pub format: Option<String>,
}

#[derive(Deserialize)]
pub struct DistanceRequest {
    pub from: Option<Coordinates>,
    pub to: Option<Coordinates>,
}

#[derive(Serialize)]
pub struct DistanceResponse {
    pub distance_m: f64,
}

#[derive(Deserialize)]
pub struct EvaluateRequest {
    pub pois: Vec<Poi>,
}

/// Run a store write on the blocking pool; file-backed stores fsync under
/// their write lock
async fn write_store<T, F>(state: &AppState, write: F) -> ApiResult<T>
where
    T: Send + 'static,
    F: FnOnce(&dyn OfficeRepository) -> perimeter_risk::Result<T> + Send + 'static,
{
    let repo = Arc::clone(&state.repo);
    Ok(tokio::task::spawn_blocking(move || write(repo.as_ref())).await??)
}

fn require_name(name: &str) -> ApiResult<()> {
    if name.trim().is_empty() {
        return Err(ApiError::InvalidInput("name must not be empty".to_string()));
    }
    Ok(())
}

// ========== Route Handlers ==========

pub async fn list_offices(State(state): State<AppState>) -> ApiResult<Json<Vec<OfficeView>>> {
    let offices = state.repo.list()?;
    Ok(Json(offices.into_iter().map(OfficeView::from).collect()))
}

pub async fn create_office(
    State(state): State<AppState>,
    ApiJson(req): ApiJson<CreateOfficeRequest>,
) -> ApiResult<(StatusCode, Json<OfficeView>)> {
    require_name(&req.name)?;

    let mut office = match req.id {
        Some(id) if !id.trim().is_empty() => Office::new(id, req.name, req.address),
        _ => Office::with_generated_id(req.name, req.address),
    };
    office.profile = req.profile;
    if let Some(location) = req.location {
        office.set_location(location.validate()?);
    }

    let office = write_store(&state, move |repo| repo.insert(office)).await?;
    tracing::info!("Created office {} ({})", office.id, office.name);

    Ok((StatusCode::CREATED, Json(office.into())))
}

pub async fn get_office(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<Json<OfficeView>> {
    Ok(Json(state.repo.get(&id)?.into()))
}

pub async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<UpdateProfileRequest>,
) -> ApiResult<Json<OfficeView>> {
    if let Some(name) = &req.name {
        require_name(name)?;
    }

    let UpdateProfileRequest { name, address, profile } = req;
    let office = write_store(&state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| {
            o.update_profile(name.clone(), address.clone(), profile.clone());
            Ok(())
        })
    })
    .await?;

    Ok(Json(office.into()))
}

pub async fn delete_office(State(state): State<AppState>, Path(id): Path<String>) -> ApiResult<StatusCode> {
    let removed = write_store(&state, move |repo| repo.remove(&id)).await?;
    tracing::info!("Removed office {}", removed.id);
    Ok(StatusCode::NO_CONTENT)
}

pub async fn set_location(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(location): ApiJson<Coordinates>,
) -> ApiResult<Json<OfficeView>> {
    let location = location.validate()?;
    let office = write_store(&state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| {
            o.set_location(location);
            Ok(())
        })
    })
    .await?;

    Ok(Json(office.into()))
}

pub async fn add_poi(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<NewPoiRequest>,
) -> ApiResult<(StatusCode, Json<OfficeView>)> {
    require_name(&req.name)?;
    let at = Coordinates::new(req.lat, req.lng)?;

    let mut poi = Poi::new(uuid::Uuid::new_v4().to_string(), req.category, req.name, at);
    poi.subcategory = req.subcategory;

    let office = write_store(&state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| {
            if o.location.is_none() {
                return Err(RiskError::MissingPrerequisite {
                    office: o.id.clone(),
                    reason: "set the office location before adding POIs".to_string(),
                });
            }
            o.add_poi(poi.clone());
            Ok(())
        })
    })
    .await?;

    Ok((StatusCode::CREATED, Json(office.into())))
}

pub async fn remove_poi(
    State(state): State<AppState>,
    Path((id, poi_id)): Path<(String, String)>,
) -> ApiResult<Json<OfficeView>> {
    let office = write_store(&state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| o.remove_poi(&poi_id).map(|_| ()))
    })
    .await?;

    Ok(Json(office.into()))
}

pub async fn discover(
    State(state): State<AppState>,
    Path(id): Path<String>,
    ApiJson(req): ApiJson<DiscoverRequest>,
) -> ApiResult<Json<OfficeView>> {
    let office = state.repo.get(&id)?;
    let center = office.location.ok_or_else(|| RiskError::MissingPrerequisite {
        office: office.id.clone(),
        reason: "location not set".to_string(),
    })?;

    let radius_m = req.radius_m.unwrap_or(state.discovery_radius_m);
    if !(radius_m.is_finite() && radius_m > 0.0) {
        return Err(ApiError::InvalidInput(format!("invalid radius: {}", radius_m)));
    }

    let pois = discover_pois(center, radius_m, state.analysis.as_deref()).await;

    let office = write_store(&state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| {
            o.replace_pois(pois.clone());
            Ok(())
        })
    })
    .await?;

    Ok(Json(office.into()))
}

/// Assess an office and cache the result if its inputs did not change meanwhile
async fn assess_and_cache(state: &AppState, office: &Office) -> ApiResult<AssessmentRecord> {
    let record = assess(office, state.analysis.as_deref()).await?;

    let cached = record.clone();
    let (id, location, pois) = (office.id.clone(), office.location, office.pois.clone());
    write_store(state, move |repo| {
        repo.update(&id, &mut |o: &mut Office| {
            if o.location == location && o.pois == pois {
                o.record_assessment(cached.clone());
            } else {
                tracing::debug!("Office {} changed during assessment, result not cached", o.id);
            }
            Ok(())
        })
    })
    .await?;

    Ok(record)
}

pub async fn run_assessment(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AssessmentResponse>> {
    let office = state.repo.get(&id)?;
    let assessment = assess_and_cache(&state, &office).await?;

    Ok(Json(AssessmentResponse {
        office_id: office.id,
        status: AssessmentStatus::Evaluated,
        assessment,
    }))
}

/// Report for an office, assessing it first when it has complete inputs
/// but no cached result
async fn build_report(state: &AppState, id: &str) -> ApiResult<SecurityReport> {
    let office = state.repo.get(id)?;

    let assessment = match office.status() {
        AssessmentStatus::Pending => Some(assess_and_cache(state, &office).await?),
        _ => office.assessment.clone(),
    };

    Ok(SecurityReport::build(&office, assessment))
}

pub async fn get_report(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<ReportQuery>,
) -> ApiResult<Response> {
    let report = build_report(&state, &id).await?;

    match query.format.as_deref() {
        None | Some("json") => Ok(Json(report).into_response()),
        Some("text") => Ok(report.render_text().into_response()),
        Some(other) => Err(ApiError::InvalidInput(format!("unknown report format: {}", other))),
    }
}

pub async fn get_report_geojson(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<geojson::FeatureCollection>> {
    let report = build_report(&state, &id).await?;
    Ok(Json(report.to_geojson()))
}

pub async fn distance(ApiJson(req): ApiJson<DistanceRequest>) -> ApiResult<Json<DistanceResponse>> {
    let from = req.from.map(Coordinates::validate).transpose()?;
    let to = req.to.map(Coordinates::validate).transpose()?;

    Ok(Json(DistanceResponse {
        distance_m: distance_m(from, to),
    }))
}

pub async fn evaluate_pois(ApiJson(req): ApiJson<EvaluateRequest>) -> Json<RiskAssessment> {
    Json(evaluate(&req.pois))
}

// ========== Router ==========

pub fn office_routes(state: AppState) -> Router {
    Router::new()
        .route("/offices", get(list_offices).post(create_office))
        .route("/offices/:id", get(get_office).delete(delete_office))
        .route("/offices/:id/profile", put(update_profile))
        .route("/offices/:id/location", put(set_location))
        .route("/offices/:id/pois", post(add_poi))
        .route("/offices/:id/pois/discover", post(discover))
        .route("/offices/:id/pois/:poi_id", axum::routing::delete(remove_poi))
        .route("/offices/:id/assessment", post(run_assessment))
        .route("/offices/:id/report", get(get_report))
        .route("/offices/:id/report.geojson", get(get_report_geojson))
        .route("/distance", post(distance))
        .route("/evaluate", post(evaluate_pois))
        .with_state(state)
}
