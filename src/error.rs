use actix_web::{HttpResponse, ResponseError, http::StatusCode};
use thiserror::Error;

use crate::database::models::ApprovalStage;
use crate::handlers::shared::ApiResponse;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(sqlx::Error),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Stage mismatch: request is at {actual}, not {expected}")]
    StageMismatch {
        expected: ApprovalStage,
        actual: ApprovalStage,
    },

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("External service error: {0}")]
    ExternalService(String),

    #[error("Internal server error{}", .0.as_ref().map_or("".to_string(), |s| format!(": {}", s)))]
    InternalServerError(Option<String>),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Configuration(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
            AppError::StageMismatch { .. } => StatusCode::CONFLICT,
            AppError::PermissionDenied(_) => StatusCode::FORBIDDEN,
            AppError::ExternalService(_) => StatusCode::BAD_GATEWAY,
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status_code = self.status_code();
        let error_message = self.to_string();

        if self.is_rejection() {
            log::warn!("Request rejected with status {}: {}", status_code, error_message);
        } else {
            log::error!(
                "Request failed with status {}: {}",
                status_code,
                error_message
            );
        }

        let response_body = ApiResponse::<()>::error(&error_message);

        HttpResponse::build(status_code).json(response_body)
    }
}

impl From<sqlx::Error> for AppError {
    fn from(error: sqlx::Error) -> Self {
        log::error!("Database error: {}", error);
        AppError::DatabaseError(error)
    }
}

impl AppError {
    pub fn internal_server_error_message(message: impl Into<String>) -> Self {
        AppError::InternalServerError(Some(message.into()))
    }

    pub fn internal_server_error() -> Self {
        AppError::InternalServerError(None)
    }

    /// True for errors raised before any write: validation, configuration and state guards
    pub fn is_rejection(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::BadRequest(_)
                | AppError::Configuration(_)
                | AppError::InvalidState(_)
                | AppError::StageMismatch { .. }
                | AppError::PermissionDenied(_)
        )
    }
}

impl From<anyhow::Error> for AppError {
    fn from(error: anyhow::Error) -> Self {
        log::error!("Anyhow error: {}", error);

        if error.is::<sqlx::Error>() {
            match error.downcast::<sqlx::Error>() {
                Ok(sqlx_err) => return AppError::DatabaseError(sqlx_err),
                Err(original_error) => {
                    return AppError::InternalServerError(Some(original_error.to_string()));
                }
            }
        }

        AppError::InternalServerError(Some(error.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_state_guard_errors_map_to_conflict() {
        let mismatch = AppError::StageMismatch {
            expected: ApprovalStage::Manager,
            actual: ApprovalStage::Supervisor,
        };
        assert_eq!(mismatch.status_code(), StatusCode::CONFLICT);
        assert_eq!(
            mismatch.to_string(),
            "Stage mismatch: request is at supervisor, not manager"
        );
        assert_eq!(
            AppError::InvalidState("done".into()).status_code(),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_error_message_formatting() {
        assert_eq!(
            AppError::internal_server_error().to_string(),
            "Internal server error"
        );
        assert_eq!(
            AppError::internal_server_error_message("boom").to_string(),
            "Internal server error: boom"
        );
    }

    #[test]
    fn test_rejections_are_distinguished_from_failures() {
        assert!(AppError::PermissionDenied("x".into()).is_rejection());
        assert!(AppError::Configuration("x".into()).is_rejection());
        assert!(!AppError::ExternalService("x".into()).is_rejection());
        assert!(!AppError::internal_server_error().is_rejection());
    }
}
