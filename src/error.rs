use axum::{
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde_json::json;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("AI response failed schema validation: {0}")]
    AiFormat(String),

    #[error("AI curriculum failed validation: {0}")]
    AiCurriculum(String),

    #[error("AI service unreachable: {0}")]
    AiTransport(String),

    #[error("Database error: {0}")]
    Database(sqlx::Error),

    #[error("Validation error: {0}")]
    Validation(#[from] validator::ValidationErrors),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Stable machine-readable code surfaced in every error body.
    pub fn code(&self) -> &'static str {
        match self {
            Error::BadRequest(_) => "BAD_REQUEST",
            Error::Unauthorized(_) => "UNAUTHORIZED",
            Error::NotFound(_) => "NOT_FOUND",
            Error::InvalidState(_) => "INVALID_STATE",
            Error::AiFormat(_) => "AI_FORMAT_ERROR",
            Error::AiCurriculum(_) => "AI_CURRICULUM_ERROR",
            Error::AiTransport(_) => "AI_UNAVAILABLE",
            Error::Validation(_) => "VALIDATION_ERROR",
            _ => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Error::BadRequest(_) | Error::Validation(_) => StatusCode::BAD_REQUEST,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::InvalidState(_) => StatusCode::CONFLICT,
            Error::AiFormat(_) | Error::AiCurriculum(_) | Error::AiTransport(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let code = self.code();

        // Internal detail (SQL errors, raw oracle output) stays in the logs.
        let message = match &self {
            Error::BadRequest(msg)
            | Error::Unauthorized(msg)
            | Error::NotFound(msg)
            | Error::InvalidState(msg) => msg.clone(),
            Error::Validation(err) => err.to_string(),
            Error::AiFormat(_) => "The AI service returned an unusable response".to_string(),
            Error::AiCurriculum(_) => "The AI service returned an invalid curriculum".to_string(),
            Error::AiTransport(_) => "The AI service is currently unavailable".to_string(),
            _ => "An unexpected error occurred".to_string(),
        };

        if status.is_server_error() {
            tracing::error!(error = ?self, code, "request failed");
        }

        let body = Json(json!({ "error": { "code": code, "message": message } }));
        (status, body).into_response()
    }
}

impl From<sqlx::Error> for Error {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => Error::NotFound("Resource not found".to_string()),
            other => Error::Database(other),
        }
    }
}
