//! Authentication routes

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiError;
use crate::gateway::GatewayState;

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub expires_at: DateTime<Utc>,
}

pub async fn login(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload.map_err(|e| state.api_error(e))?;

    let (Some(username), Some(password)) = (
        request.username.filter(|u| !u.trim().is_empty()),
        request.password.filter(|p| !p.is_empty()),
    ) else {
        return Err(ApiError::bad_request("Username and password are required"));
    };

    let session = state
        .gate
        .login(username.trim(), &password)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(LoginResponse {
        token: session.token,
        expires_at: session.expires_at,
    }))
}
