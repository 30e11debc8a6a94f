use axum::{
    extract::{rejection::JsonRejection, FromRequest},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use perimeter_risk::RiskError;
use serde_json::json;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ApiError {
    #[error(transparent)]
    Risk(#[from] RiskError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error("Store task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

/// JSON body extractor whose rejections go through `ApiError`
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct ApiJson<T>(pub T);

impl ApiError {
    fn status(&self) -> StatusCode {
        match self {
            ApiError::Risk(RiskError::NotFound(_)) | ApiError::Risk(RiskError::PoiNotFound { .. }) => {
                StatusCode::NOT_FOUND
            }
            ApiError::Risk(RiskError::Duplicate(_)) => StatusCode::CONFLICT,
            ApiError::Risk(RiskError::InvalidCoordinates { .. })
            | ApiError::Risk(RiskError::MissingPrerequisite { .. })
            | ApiError::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Body(JsonRejection::JsonDataError(_) | JsonRejection::JsonSyntaxError(_)) => {
                StatusCode::UNPROCESSABLE_ENTITY
            }
            ApiError::Body(rejection) => rejection.status(),
            ApiError::Task(_)
            | ApiError::Risk(RiskError::Io(_))
            | ApiError::Risk(RiskError::Json(_))
            | ApiError::Risk(RiskError::Persist(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        let message = match &self {
            ApiError::Body(rejection) => rejection.body_text(),
            other => other.to_string(),
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

pub type ApiResult<T> = std::result::Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        assert_eq!(
            ApiError::from(RiskError::NotFound("x".into())).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::from(RiskError::Duplicate("x".into())).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ApiError::from(RiskError::InvalidCoordinates { lat: 99.0, lng: 0.0 }).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ApiError::InvalidInput("empty name".into()).status(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
    }

    #[tokio::test]
    async fn test_panicked_store_task_is_server_error() {
        let join_error = tokio::task::spawn_blocking(|| panic!("store exploded")).await.unwrap_err();
        assert_eq!(ApiError::from(join_error).status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
