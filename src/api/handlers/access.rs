use axum::extract::State;
use axum::Json;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use subtle::ConstantTimeEq;

use crate::api::response::{ApiError, AppJson};
use crate::AppState;

#[derive(Debug, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRequest {
    #[serde(default)]
    pub access_code: Option<String>,
}

#[derive(Debug, Deserialize, Serialize)]
pub struct AccessGranted {
    pub ok: bool,
}

/// Compare a candidate code with the shared family secret.
///
/// This only gates the client experience; the CRUD routes do not check it.
pub async fn check_access(
    State(state): State<Arc<AppState>>,
    AppJson(req): AppJson<AccessRequest>,
) -> Result<Json<AccessGranted>, ApiError> {
    let candidate = req.access_code.unwrap_or_default();
    if candidate.is_empty() {
        return Err(ApiError::bad_request("accessCode is required").rejected());
    }

    if code_matches(state.config.access_code.as_deref(), &candidate) {
        return Ok(Json(AccessGranted { ok: true }));
    }

    tracing::debug!("Rejected access code");
    Err(ApiError::unauthorized("Invalid access code").rejected())
}

/// An unset secret never matches, and the failure looks the same either way.
fn code_matches(expected: Option<&str>, candidate: &str) -> bool {
    match expected {
        Some(expected) => candidate.as_bytes().ct_eq(expected.as_bytes()).into(),
        None => false,
    }
}
