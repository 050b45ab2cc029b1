//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type that captures server errors to Sentry
//! before responding. Every response body is JSON `{ "message": ... }`.

use axum::{
    Json,
    extract::multipart::{MultipartError, MultipartRejection},
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::db::RepositoryError;
use crate::session::SessionError;
use crate::webhooks::WebhookError;

/// Response body shared by every JSON endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MessageBody {
    pub message: String,
}

impl MessageBody {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Application-level error type.
#[derive(Debug, Error)]
pub enum AppError {
    /// Webhook headers or signature did not verify.
    #[error("Webhook error: {0}")]
    Webhook(#[from] WebhookError),

    /// A verified event of a kind nothing handles.
    #[error("Unhandled event type: {0}")]
    UnhandledEvent(String),

    /// Writing a provisioned account failed.
    #[error("Provisioning failed: {0}")]
    Provisioning(#[source] RepositoryError),

    /// Server wiring is wrong (e.g. a required layer is missing).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Caller is not authenticated.
    #[error("Unauthorized")]
    Unauthorized,

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Uploaded files exceed the body limit.
    #[error("Payload too large")]
    PayloadTooLarge,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::NotFound(_) => Self::NotFound(err.to_string()),
            SessionError::MissingProvider => Self::Configuration(err.to_string()),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        Self::BadRequest(format!("Invalid path: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::BadRequest(format!("Invalid query: {}", rejection.body_text()))
    }
}

impl From<MultipartRejection> for AppError {
    fn from(rejection: MultipartRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

impl From<MultipartError> for AppError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            Self::PayloadTooLarge
        } else {
            Self::BadRequest(format!("Failed to read multipart: {}", err.body_text()))
        }
    }
}

impl AppError {
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Webhook(_) | Self::UnhandledEvent(_) | Self::BadRequest(_) => {
                StatusCode::BAD_REQUEST
            }
            Self::Provisioning(_) | Self::Configuration(_) => StatusCode::INTERNAL_SERVER_ERROR,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
        }
    }

    /// Client-facing message. Internal detail never leaves the server.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::Webhook(_) => "Webhook verification failed".to_string(),
            Self::UnhandledEvent(kind) => format!("Unhandled event type: {kind}"),
            Self::Provisioning(_) => "Failed to insert user data".to_string(),
            Self::Unauthorized => "Unauthorized".to_string(),
            Self::PayloadTooLarge => "Uploaded files exceed the size limit".to_string(),
            Self::Configuration(msg) | Self::NotFound(msg) | Self::BadRequest(msg) => msg.clone(),
        }
    }

    fn log(&self) {
        match self {
            Self::Webhook(err) => tracing::warn!(error = %err, "Webhook verification failed"),
            Self::UnhandledEvent(kind) => tracing::info!(event_type = %kind, "Unhandled event type"),
            Self::Provisioning(_) | Self::Configuration(_) => {
                let event_id = sentry::capture_error(self);
                tracing::error!(
                    error = %self,
                    sentry_event_id = %event_id,
                    "Request error"
                );
            }
            Self::NotFound(_) | Self::Unauthorized | Self::BadRequest(_) | Self::PayloadTooLarge => {
                tracing::debug!(error = %self, "Request rejected");
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        self.log();
        (self.status(), Json(MessageBody::new(self.public_message()))).into_response()
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context for the verified caller.
pub fn set_sentry_user(user_id: &impl ToString) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}
