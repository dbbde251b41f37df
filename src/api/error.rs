use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, ResponseError};

use crate::auth::SessionError;
use crate::error::{DomainError, ErrorKind, FieldErrors};
use super::envelope::ErrorResponse;

// ============================================================================
// HTTP mapping of the error taxonomy
// ============================================================================

impl ResponseError for DomainError {
    fn status_code(&self) -> StatusCode {
        match self.kind() {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::NotFound => StatusCode::NOT_FOUND,
            ErrorKind::Conflict => StatusCode::CONFLICT,
            ErrorKind::Forbidden => StatusCode::FORBIDDEN,
            ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let body = match self {
            DomainError::Internal(detail) => {
                tracing::error!(detail = %detail, "Internal error returned to caller");
                ErrorResponse::new("Internal server error", None)
            }
            other => ErrorResponse::new(other.to_string(), other.field_errors().cloned()),
        };
        HttpResponse::build(self.status_code()).json(body)
    }
}

/// Everything a handler can fail with
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Domain(#[from] DomainError),

    #[error("Unauthenticated: {0}")]
    Unauthenticated(#[from] SessionError),
}

impl ResponseError for ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Domain(e) => e.status_code(),
            ApiError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        match self {
            ApiError::Domain(e) => e.error_response(),
            ApiError::Unauthenticated(e) => {
                HttpResponse::Unauthorized().json(ErrorResponse::new(e.to_string(), None))
            }
        }
    }
}

/// Malformed body, path or query: reported as a validation failure
pub fn malformed_input(detail: impl std::fmt::Display, _req: &HttpRequest) -> actix_web::Error {
    DomainError::Validation {
        message: format!("Malformed request: {}", detail),
        fields: FieldErrors::new(),
    }
    .into()
}
