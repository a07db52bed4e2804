use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use std::fmt;

use super::views;

#[derive(Debug)]
pub enum WebError {
    NotFound(String),

    Forbidden,

    ValidationError(String),

    DatabaseError(String),

    MailError(String),

    InternalError(String),
}

impl fmt::Display for WebError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WebError::NotFound(msg) => write!(f, "Not found: {}", msg),
            WebError::Forbidden => write!(f, "Forbidden"),
            WebError::ValidationError(msg) => write!(f, "Validation error: {}", msg),
            WebError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
            WebError::MailError(msg) => write!(f, "Mail error: {}", msg),
            WebError::InternalError(msg) => write!(f, "Internal error: {}", msg),
        }
    }
}

impl std::error::Error for WebError {}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            WebError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            WebError::Forbidden => (
                StatusCode::FORBIDDEN,
                "You do not have permission to access this page".to_string(),
            ),
            WebError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            WebError::DatabaseError(msg) => {
                tracing::error!("Database error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "A database error occurred".to_string(),
                )
            }
            WebError::MailError(msg) => {
                tracing::warn!("Mail delivery failed: {}", msg);
                (
                    StatusCode::BAD_GATEWAY,
                    "Your message could not be sent. Please try again later.".to_string(),
                )
            }
            WebError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal error occurred".to_string(),
                )
            }
        };

        (status, Html(views::error_page(status, &message))).into_response()
    }
}

impl From<anyhow::Error> for WebError {
    fn from(err: anyhow::Error) -> Self {
        WebError::InternalError(err.to_string())
    }
}

impl WebError {
    pub fn not_found(resource: &str, id: impl fmt::Display) -> Self {
        WebError::NotFound(format!("{} {} not found", resource, id))
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        WebError::ValidationError(msg.into())
    }

    pub fn database(msg: impl Into<String>) -> Self {
        WebError::DatabaseError(msg.into())
    }

    pub fn mail(msg: impl Into<String>) -> Self {
        WebError::MailError(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        WebError::InternalError(msg.into())
    }
}
