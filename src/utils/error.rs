use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FieldError {
    pub field: String,
    pub message: String,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("{message}")]
    Validation {
        message: String,
        errors: Vec<FieldError>,
    },

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("Server error")]
    Internal,
}

impl ApiError {
    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::Validation {
            message: message.into(),
            errors: Vec::new(),
        }
    }

    /// Logs the underlying cause server-side; clients only see a generic message.
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        tracing::error!(error = %err, "internal error");
        ApiError::Internal
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation { .. } => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let mut body = json!({
            "success": false,
            "message": self.to_string(),
        });
        if let ApiError::Validation { errors, .. } = &self {
            if !errors.is_empty() {
                body["errors"] = json!(errors);
            }
        }
        (status, axum::Json(body)).into_response()
    }
}

/// Maps diesel's row-not-found onto the API taxonomy; everything else is
/// an internal failure.
pub fn db_error(err: diesel::result::Error, what: &str) -> ApiError {
    match err {
        diesel::result::Error::NotFound => ApiError::NotFound(format!("{} not found", what)),
        other => ApiError::internal(other),
    }
}

pub async fn handler_404() -> impl IntoResponse {
    ApiError::NotFound("Route not found".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_mapping_follows_taxonomy() {
        assert_eq!(ApiError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            ApiError::Unauthorized("no token".into()).status(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            ApiError::Forbidden("wrong role".into()).status(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            ApiError::NotFound("Order not found".into()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ApiError::Conflict("already rated".into()).status(),
            StatusCode::CONFLICT
        );
        assert_eq!(ApiError::Internal.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn not_found_rows_map_to_not_found() {
        let err = db_error(diesel::result::Error::NotFound, "Restaurant");
        match err {
            ApiError::NotFound(msg) => assert_eq!(msg, "Restaurant not found"),
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn internal_errors_hide_details() {
        let err = db_error(diesel::result::Error::AlreadyInTransaction, "Order");
        assert_eq!(err.to_string(), "Server error");
    }
}
