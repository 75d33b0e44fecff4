//! Error types for the Gateway
//!
//! [`GatewayError`] covers startup and configuration. [`ApiError`] is what
//! handlers return; it renders as `{ "message": ..., "details"?: ... }`.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Value};
use thiserror::Error;

use twolife_core::error::{
    AuthError, IntakeError, NotificationError, ReplyError, StoreError,
};
use twolife_core::verification::VerifierError;

/// Gateway error type
#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Config file error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage error: {0:#}")]
    Storage(anyhow::Error),

    #[error("Authentication setup failed: {0}")]
    Auth(#[from] AuthError),

    #[error("HTTP client error: {0}")]
    HttpClient(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

/// Configuration loading failures
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },

    #[error("Invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
}

/// Result type for Gateway operations
pub type Result<T> = std::result::Result<T, GatewayError>;

/// HTTP-facing error
#[derive(Debug, Clone)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<Value>,
}

impl ApiError {
    pub fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(mut self, details: Value) -> Self {
        self.details = Some(details);
        self
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, message)
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, message)
    }

    /// Drop diagnostic details (production responses)
    pub fn redacted(mut self) -> Self {
        self.details = None;
        self
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            tracing::error!(status = %self.status, details = ?self.details, "{}", self.message);
        } else {
            tracing::debug!(status = %self.status, "{}", self.message);
        }

        let mut body = json!({ "message": self.message });
        if let Some(details) = self.details {
            body["details"] = details;
        }
        (self.status, Json(body)).into_response()
    }
}

impl From<IntakeError> for ApiError {
    fn from(e: IntakeError) -> Self {
        match e {
            IntakeError::Validation(v) => ApiError::bad_request(v.to_string())
                .with_details(json!({ "field": v.field() })),
            IntakeError::Verification(reason) => {
                ApiError::bad_request(reason.user_message()).with_details(json!(reason))
            }
            IntakeError::VerificationUnavailable(e) => e.into(),
            IntakeError::DependencyUnavailable(what) => ApiError::internal("Service unavailable")
                .with_details(json!({ "kind": "dependency_unavailable", "dependency": what })),
            IntakeError::Storage(e) => e.into(),
        }
    }
}

// Every server-side failure surfaces as 500; the cause only goes in details.
impl From<VerifierError> for ApiError {
    fn from(e: VerifierError) -> Self {
        let kind = match e {
            VerifierError::NotConfigured => "verification_not_configured",
            VerifierError::Transport(_) => "verification_transport",
            VerifierError::Provider { .. } => "verification_provider",
        };
        ApiError::internal("Verification service unavailable")
            .with_details(json!({ "kind": kind, "error": e.to_string() }))
    }
}

impl From<StoreError> for ApiError {
    fn from(e: StoreError) -> Self {
        ApiError::internal("Storage error").with_details(json!(e.to_string()))
    }
}

impl From<AuthError> for ApiError {
    fn from(e: AuthError) -> Self {
        match e {
            AuthError::MissingCredentials => ApiError::new(StatusCode::FORBIDDEN, "Token required"),
            AuthError::InvalidLogin => {
                ApiError::new(StatusCode::UNAUTHORIZED, "Invalid username or password")
            }
            AuthError::InvalidToken | AuthError::ExpiredToken | AuthError::InvalidServiceKey => {
                ApiError::new(StatusCode::UNAUTHORIZED, "Invalid token")
                    .with_details(json!(e.to_string()))
            }
            AuthError::Backend(detail) => {
                ApiError::internal("Authentication error").with_details(json!(detail))
            }
        }
    }
}

impl From<NotificationError> for ApiError {
    fn from(e: NotificationError) -> Self {
        match e {
            NotificationError::NotConfigured(channel) => {
                ApiError::unavailable(format!("Notification channel '{}' not configured", channel))
            }
            other => ApiError::new(StatusCode::BAD_GATEWAY, "Notification delivery failed")
                .with_details(json!(other.to_string())),
        }
    }
}

impl From<ReplyError> for ApiError {
    fn from(e: ReplyError) -> Self {
        match e {
            ReplyError::LeadNotFound(id) => ApiError::not_found(format!("Lead {} not found", id)),
            ReplyError::Store(e) => e.into(),
            ReplyError::Notification(e) => e.into(),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::bad_request("Invalid request body").with_details(json!(rejection.body_text()))
    }
}
