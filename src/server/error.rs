//! HTTP error mapping.
//!
//! Every failure leaves the API as a JSON body with a single `detail` key,
//! the shape clients of the upload endpoint already parse. Validation
//! errors for missing form fields carry a list of per-field entries instead
//! of a string.

use crate::error::OverlayError;
use axum::extract::multipart::{MultipartError, MultipartRejection};
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

/// Unified API error type.
#[derive(Debug)]
pub enum ApiError {
    /// 400 - unusable upload or document
    BadRequest(String),
    /// 413 - body larger than the configured limit
    PayloadTooLarge(String),
    /// 422 - required form fields absent
    MissingFields(Vec<&'static str>),
    /// 500 - failure on our side
    Internal(String),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::PayloadTooLarge(_) => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::MissingFields(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> Value {
        match self {
            ApiError::BadRequest(m) | ApiError::PayloadTooLarge(m) | ApiError::Internal(m) => {
                Value::String(m.clone())
            }
            ApiError::MissingFields(fields) => Value::Array(
                fields
                    .iter()
                    .map(|f| {
                        json!({
                            "type": "missing",
                            "loc": ["body", f],
                            "msg": "Field required",
                        })
                    })
                    .collect(),
            ),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("{}", self);
        } else {
            tracing::debug!("Rejected request: {}", self);
        }
        (status, Json(json!({ "detail": self.detail() }))).into_response()
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::BadRequest(m) => write!(f, "Bad request: {}", m),
            ApiError::PayloadTooLarge(m) => write!(f, "Payload too large: {}", m),
            ApiError::MissingFields(fields) => write!(f, "Missing fields: {}", fields.join(", ")),
            ApiError::Internal(m) => write!(f, "Internal error: {}", m),
        }
    }
}

impl std::error::Error for ApiError {}

impl From<OverlayError> for ApiError {
    fn from(e: OverlayError) -> Self {
        if e.is_client_error() {
            ApiError::BadRequest(e.to_string())
        } else {
            ApiError::Internal(format!("Erro interno ao processar o PDF: {}", e))
        }
    }
}

impl From<MultipartError> for ApiError {
    fn from(e: MultipartError) -> Self {
        if e.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::PayloadTooLarge(e.body_text())
        } else {
            ApiError::BadRequest(format!("Erro ao ler o arquivo PDF: {}", e.body_text()))
        }
    }
}

impl From<MultipartRejection> for ApiError {
    fn from(rejection: MultipartRejection) -> Self {
        ApiError::BadRequest(format!("Erro ao ler o arquivo PDF: {}", rejection.body_text()))
    }
}

/// Convenient type alias.
pub type ApiResult<T> = Result<T, ApiError>;
