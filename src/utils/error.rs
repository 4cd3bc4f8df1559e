use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use std::fmt;

#[derive(Debug)]
pub enum AppError {
    Unauthenticated(String),
    NotFound(String),
    CacheUnavailable(String),
    UpstreamGeneration(String),
    UpstreamFetch(String),
    DatabaseError(String),
    Config(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Unauthenticated(msg) => write!(f, "Unauthenticated: {}", msg),
            AppError::NotFound(msg) => write!(f, "Not found: {}", msg),
            AppError::CacheUnavailable(msg) => write!(f, "Menu cache unavailable: {}", msg),
            AppError::UpstreamGeneration(msg) => write!(f, "Generation service error: {}", msg),
            AppError::UpstreamFetch(msg) => write!(f, "{}", msg),
            AppError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            AppError::Config(msg) => write!(f, "Configuration error: {}", msg),
        }
    }
}

impl std::error::Error for AppError {}

impl From<mongodb::error::Error> for AppError {
    fn from(e: mongodb::error::Error) -> Self {
        AppError::DatabaseError(e.to_string())
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthenticated(_) => StatusCode::UNAUTHORIZED,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::CacheUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::UpstreamGeneration(_) | AppError::UpstreamFetch(_) => StatusCode::BAD_GATEWAY,
            AppError::DatabaseError(_) | AppError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        // Provider details never leave the process for auth failures
        let message = match self {
            AppError::Unauthenticated(_) => "Invalid Firebase Token".to_string(),
            AppError::NotFound(msg) => msg.clone(),
            other => other.to_string(),
        };

        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "status": "error",
            "message": message
        }))
    }
}
