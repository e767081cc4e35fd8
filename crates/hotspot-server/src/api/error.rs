//! API error types and response handling.
//!
//! This module provides a unified error type for all API handlers
//! with automatic conversion to appropriate HTTP responses.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use hotspot_core::{ConfigError, HotspotError};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Result type alias for API handlers.
pub type ApiResult<T> = Result<T, ApiError>;

/// Unified API error type.
///
/// Each variant maps to a specific HTTP status code and produces a
/// consistent JSON error response.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// 400 Bad Request - Invalid hotspot parameters.
    #[error("Bad Request: {message}")]
    BadRequest {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 403 Forbidden - Device policy refuses tethering.
    #[error("Forbidden: {message}")]
    Forbidden {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 409 Conflict - A later request overtook this one.
    #[error("Conflict: {message}")]
    Conflict {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 422 Unprocessable Entity - Valid parameters this platform cannot honour.
    #[error("Unsupported: {message}")]
    Unsupported {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 500 Internal Server Error - Unexpected server-side error.
    #[error("Internal Error: {message}")]
    InternalError {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },

    /// 503 Service Unavailable - The radio could not start a hotspot.
    #[error("Service Unavailable: {message}")]
    ServiceUnavailable {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
        /// Whether retrying later may succeed.
        retryable: bool,
    },

    /// 504 Gateway Timeout - The radio never answered.
    #[error("Timeout: {message}")]
    Timeout {
        /// Machine-readable error code.
        error_code: String,
        /// Human-readable error message.
        message: String,
    },
}

impl ApiError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::BadRequest { .. } => StatusCode::BAD_REQUEST,
            Self::Forbidden { .. } => StatusCode::FORBIDDEN,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::Unsupported { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            Self::InternalError { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ServiceUnavailable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            Self::Timeout { .. } => StatusCode::GATEWAY_TIMEOUT,
        }
    }
}

/// Standard JSON error response body.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
#[schema(example = json!({
    "error": "config_invalid",
    "message": "SSID and Password cannot be empty",
    "details": null
}))]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "radio_busy").
    #[schema(example = "config_invalid")]
    pub error: String,

    /// Human-readable error message.
    #[schema(example = "SSID and Password cannot be empty")]
    pub message: String,

    /// Optional additional details.
    #[schema(nullable)]
    pub details: Option<serde_json::Value>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let error_response = match self {
            Self::BadRequest {
                error_code,
                message,
            }
            | Self::Forbidden {
                error_code,
                message,
            }
            | Self::Conflict {
                error_code,
                message,
            }
            | Self::Unsupported {
                error_code,
                message,
            }
            | Self::Timeout {
                error_code,
                message,
            } => ErrorResponse {
                error: error_code,
                message,
                details: None,
            },

            Self::ServiceUnavailable {
                error_code,
                message,
                retryable,
            } => ErrorResponse {
                error: error_code,
                message,
                details: Some(serde_json::json!({ "retryable": retryable })),
            },

            Self::InternalError {
                error_code,
                message,
            } => {
                tracing::error!(
                    error_code = %error_code,
                    message = %message,
                    "Internal server error"
                );
                ErrorResponse {
                    error: error_code,
                    message,
                    details: None,
                }
            }
        };

        (status, Json(error_response)).into_response()
    }
}

/// Convert from hotspot_core errors.
impl From<HotspotError> for ApiError {
    fn from(err: HotspotError) -> Self {
        let error_code = err.error_code().to_ascii_lowercase();
        let status = err.http_status_code();

        match err {
            // The UI shows the validation message as-is.
            HotspotError::Config(ConfigError::Unsupported { .. }) => Self::Unsupported {
                error_code,
                message: config_message(err),
            },
            HotspotError::Config(_) => Self::BadRequest {
                error_code,
                message: config_message(err),
            },
            HotspotError::Superseded | HotspotError::Cancelled => Self::Conflict {
                error_code,
                message: err.to_string(),
            },
            HotspotError::ActivationTimedOut { .. } => Self::Timeout {
                error_code,
                message: err.to_string(),
            },
            HotspotError::ActivationFailed(_) if status == 403 => Self::Forbidden {
                error_code,
                message: err.to_string(),
            },
            HotspotError::ActivationFailed(_) | HotspotError::ControllerUnavailable => {
                Self::ServiceUnavailable {
                    error_code,
                    retryable: err.is_recoverable(),
                    message: err.to_string(),
                }
            }
            HotspotError::Settings(_) | HotspotError::IoError(_) => Self::InternalError {
                error_code,
                message: err.to_string(),
            },
        }
    }
}

fn config_message(err: HotspotError) -> String {
    match err {
        HotspotError::Config(inner) => inner.to_string(),
        other => other.to_string(),
    }
}
