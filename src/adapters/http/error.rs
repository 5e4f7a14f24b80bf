use axum::{http::StatusCode, response::{IntoResponse, Response}, Json};
use tracing::{error, warn};

use crate::application::dto::ErrorResponse;
use crate::domain::errors::DomainError;

/// `DomainError` rendered as an HTTP status plus `{ "error": ... }`.
#[derive(Debug)]
pub struct ApiError(pub DomainError);

impl From<DomainError> for ApiError {
    fn from(e: DomainError) -> Self { Self(e) }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            DomainError::InvalidInput(_) | DomainError::InvalidImage(_) => StatusCode::BAD_REQUEST,
            DomainError::NotFound(_) => StatusCode::NOT_FOUND,
            DomainError::MissingResource { .. }
            | DomainError::Inference(_)
            | DomainError::OperationFailed(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        if status.is_server_error() {
            error!("{}", self.0);
        } else {
            warn!("{}", self.0);
        }
        (status, Json(ErrorResponse { error: self.0.to_string() })).into_response()
    }
}
