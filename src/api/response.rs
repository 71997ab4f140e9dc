/// Uniform response envelope and error mapping
///
/// Every endpoint answers `{ "success": bool, "data"?: ..., "error"?: "..." }`.
/// Handlers return `Result<Json<ApiResponse<T>>, ApiError>`; the error side is
/// rendered into the same envelope with a matching status code.

use crate::generation::GenerationError;
use axum::{
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Json, Response},
};
use serde::Serialize;
use thiserror::Error;

/// Header carrying the caller identity, set by the upstream auth gateway
pub const USER_ID_HEADER: &str = "x-user-id";

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Json<Self> {
        Json(Self { success: true, data: Some(data), error: None, message: None })
    }

    pub fn ok_with_message(data: T, message: impl Into<String>) -> Json<Self> {
        Json(Self { success: true, data: Some(data), error: None, message: Some(message.into()) })
    }
}

/// Boundary error; the message is what the user sees
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Authentication required")]
    Unauthorized,

    #[error("{0}")]
    BadRequest(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    /// Model output could not be turned into an importable workflow
    #[error("Failed to generate workflow. Please try again or simplify your request.")]
    GenerationRejected,

    #[error("Workflow generation is temporarily unavailable. Please try again shortly.")]
    Unavailable,

    #[error("Internal server error")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            // 422 for bad model output vs 500 for system errors
            Self::GenerationRejected => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Log an infrastructure failure and hide its details from the client
    pub fn internal(context: &str, err: impl std::fmt::Display) -> Self {
        tracing::error!("❌ {}: {}", context, err);
        Self::Internal
    }
}

impl From<GenerationError> for ApiError {
    fn from(err: GenerationError) -> Self {
        match err {
            GenerationError::InvalidRequest(msg) => Self::BadRequest(msg),
            GenerationError::GenerationEmpty | GenerationError::GenerationMalformed(_) => {
                Self::GenerationRejected
            }
            GenerationError::GenerationUnavailable(_) => Self::Unavailable,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(self.to_string()),
            message: None,
        };
        (self.status(), Json(body)).into_response()
    }
}

/// Authenticated caller, taken from the `x-user-id` header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CurrentUser(pub String);

impl<S: Send + Sync> FromRequestParts<S> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .headers
            .get(USER_ID_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .map(|id| CurrentUser(id.to_string()))
            .ok_or(ApiError::Unauthorized)
    }
}
