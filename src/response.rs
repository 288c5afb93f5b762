use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::catalog::CatalogError;
use crate::service::RecommendError;

#[derive(Debug, Serialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
}

pub fn ok<T: Serialize>(data: T) -> Response {
    Json(SuccessResponse {
        success: true,
        data,
    })
    .into_response()
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

#[derive(Debug, Clone)]
pub struct AppError {
    status: StatusCode,
    code: String,
    message: String,
    is_operational: bool,
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::NOT_FOUND, "NOT_FOUND", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::operational(StatusCode::SERVICE_UNAVAILABLE, "SERVICE_UNAVAILABLE", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            code: "INTERNAL_ERROR".to_string(),
            message: message.into(),
            is_operational: false,
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    fn operational(
        status: StatusCode,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            status,
            code: code.into(),
            message: message.into(),
            is_operational: true,
        }
    }
}

impl From<RecommendError> for AppError {
    fn from(err: RecommendError) -> Self {
        match err {
            RecommendError::Catalog(
                e @ (CatalogError::UnknownTopic(_) | CatalogError::UnknownCourse(_)),
            ) => Self::not_found(e.to_string()),
            RecommendError::Catalog(e) => {
                tracing::error!(error = %e, "catalog defect");
                Self::internal(e.to_string())
            }
            RecommendError::InvalidCfWeight(_) | RecommendError::InvalidMastery(_) => {
                Self::validation(err.to_string())
            }
            RecommendError::Store(e) => {
                tracing::warn!(error = %e, "progress store write failed");
                Self::unavailable("progress store unavailable")
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let message = if self.is_operational {
            self.message
        } else {
            "internal server error".to_string()
        };

        let body = ErrorResponse {
            success: false,
            error: message,
            code: self.code,
        };

        (self.status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_recommend_error_status_mapping() {
        let unknown = AppError::from(RecommendError::Catalog(CatalogError::UnknownTopic(
            "Alchemy".to_string(),
        )));
        assert_eq!(unknown.status(), StatusCode::NOT_FOUND);

        let weight = AppError::from(RecommendError::InvalidCfWeight(2.0));
        assert_eq!(weight.status(), StatusCode::BAD_REQUEST);

        let ambiguous = AppError::from(RecommendError::Catalog(CatalogError::AmbiguousTopic {
            topic: "Statistics".to_string(),
            courses: vec!["Mathematics".to_string(), "Data Science".to_string()],
        }));
        assert_eq!(ambiguous.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_internal_errors_hide_message() {
        let response = AppError::internal("db path leaked").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
