use crate::services::registration_service::RegistrationError;
use crate::services::user_service::StoreError;
use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("Not found: {0}")]
    NotFound(String),
    #[error("Invalid request: {0}")]
    InvalidRequest(String),
    #[error("Unknown or expired session")]
    SessionNotFound,
    #[error("{0}")]
    Unprocessable(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    Unauthorized(String),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::DatabaseError(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::NotFound(_) | AppError::SessionNotFound => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Unprocessable(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
        }
    }

    fn error_response(&self) -> HttpResponse {
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "success": false,
            "error": self.to_string()
        }))
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound(email) => AppError::NotFound(format!("user {}", email)),
            StoreError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<RegistrationError> for AppError {
    fn from(e: RegistrationError) -> Self {
        match e {
            RegistrationError::OutOfOrder { .. } => AppError::Conflict(e.to_string()),
            RegistrationError::MissingCapture | RegistrationError::InvalidCredentials(_) => {
                AppError::InvalidRequest(e.to_string())
            }
            RegistrationError::UnreadableCard | RegistrationError::IncompleteScan(_) => {
                AppError::Unprocessable(e.to_string())
            }
            RegistrationError::Auth(msg) => AppError::Unauthorized(msg),
            RegistrationError::PasswordHash(msg) => AppError::Internal(msg),
            RegistrationError::Persistence(store) => store.into(),
        }
    }
}
