//! HTTP request and response bodies

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use livestage_core::ConcertSession;
use serde::{Deserialize, Serialize};

use crate::tickets::ApplicationId;
use crate::ControlError;

/// API response wrapper
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: String) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message),
        }
    }
}

impl ControlError {
    /// HTTP status for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            ControlError::InvalidParameter(_)
            | ControlError::InvalidMessage(_)
            | ControlError::JsonError(_) => StatusCode::BAD_REQUEST,
            ControlError::NotFound(_) => StatusCode::NOT_FOUND,
            ControlError::Unauthorized => StatusCode::UNAUTHORIZED,
            ControlError::Forbidden => StatusCode::FORBIDDEN,
            ControlError::HttpError(_) | ControlError::IoError(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for ControlError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        }
        (status, Json(ApiResponse::<()>::error(self.to_string()))).into_response()
    }
}

/// System status response
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    pub version: String,
    pub uptime_seconds: u64,
    pub connected_viewers: usize,
    pub session: ConcertSession,
}

/// Ticket application request
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub depositor_name: String,
}

/// Ticket application receipt
#[derive(Debug, Serialize, Deserialize)]
pub struct PaymentResponse {
    pub id: ApplicationId,
}

/// Admin approval request
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveRequest {
    pub id: ApplicationId,
}

/// Issued access token
#[derive(Debug, Serialize, Deserialize)]
pub struct ApproveResponse {
    pub token: String,
}

/// Entry check request
#[derive(Debug, Serialize, Deserialize)]
pub struct EnterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub token: String,
}
