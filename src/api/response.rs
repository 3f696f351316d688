use axum::extract::rejection::JsonRejection;
use axum::extract::{FromRequest, Request};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

// ============================================================================
// Error bodies
// ============================================================================

/// Read-path error body: `{"error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: String,
}

/// Write-path error body: `{"ok": false, "error": "..."}`
#[derive(Debug, Serialize, Deserialize)]
pub struct RejectedBody {
    pub ok: bool,
    pub error: String,
}

// ============================================================================
// Unified error type for handlers
// ============================================================================

/// An error rendered in one of the two envelopes the API uses.
#[derive(Debug)]
pub enum ApiError {
    /// Read paths: `{"error": ...}`
    Plain(StatusCode, String),
    /// Write paths and the access check: `{"ok": false, "error": ...}`
    Rejected(StatusCode, String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Plain(code, error) => (code, Json(ErrorBody { error })).into_response(),
            ApiError::Rejected(code, error) => {
                (code, Json(RejectedBody { ok: false, error })).into_response()
            }
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::Plain(StatusCode::BAD_REQUEST, message.into())
    }

    pub fn payload_too_large(message: impl Into<String>) -> Self {
        ApiError::Plain(StatusCode::PAYLOAD_TOO_LARGE, message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::Plain(StatusCode::NOT_FOUND, message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Plain(StatusCode::UNAUTHORIZED, message.into())
    }

    /// Generic server failure. The message is shown to clients, so it must
    /// never carry the underlying error.
    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::Plain(StatusCode::INTERNAL_SERVER_ERROR, message.into())
    }

    /// Switch to the `{"ok": false, ...}` envelope.
    pub fn rejected(self) -> Self {
        match self {
            ApiError::Plain(code, msg) | ApiError::Rejected(code, msg) => {
                ApiError::Rejected(code, msg)
            }
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Plain(code, _) | ApiError::Rejected(code, _) => *code,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Plain(_, msg) | ApiError::Rejected(_, msg) => msg,
        }
    }
}

// ============================================================================
// Custom extractors
// ============================================================================

/// Drop-in replacement for `axum::Json` that rejects with `{"ok": false, ...}`.
pub struct AppJson<T>(pub T);

#[axum::async_trait]
impl<S, T> FromRequest<S> for AppJson<T>
where
    axum::Json<T>: FromRequest<S, Rejection = JsonRejection>,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, ApiError> {
        match axum::Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(AppJson(value)),
            Err(rejection) if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE => {
                Err(ApiError::payload_too_large("Request body is too large").rejected())
            }
            Err(rejection) => {
                let message = match rejection {
                    JsonRejection::JsonDataError(err) => {
                        format!("Invalid request body: {}", err.body_text())
                    }
                    JsonRejection::JsonSyntaxError(_) => "Malformed JSON in request body".into(),
                    JsonRejection::MissingJsonContentType(_) => {
                        "Missing Content-Type: application/json header".into()
                    }
                    _ => "Failed to read request body".into(),
                };
                Err(ApiError::bad_request(message).rejected())
            }
        }
    }
}
