//! Verification provider status, public config and operator test

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::gateway::GatewayState;

/// Default action label for operator test runs
pub const TEST_ACTION: &str = "test_action";

/// Relaxed threshold for operator test runs
pub const TEST_MIN_SCORE: f64 = 0.3;

#[derive(Debug, Deserialize)]
pub struct TestRequest {
    #[serde(default)]
    pub token: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
}

pub async fn status(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let verification = &state.config.verification;
    let mechanism = state
        .intake
        .verifier()
        .map(|v| v.mechanism().to_string())
        .unwrap_or_else(|| "none".to_string());

    Json(json!({
        "mechanism": mechanism,
        "policy": state.intake.config().verification_policy,
        "riskAssessment": verification.has_risk_assessment(),
        "sharedSecret": verification.has_shared_secret(),
        "projectId": verification.project_id,
        "siteKey": verification.masked_site_key(),
        "minScore": verification.min_score,
        "action": verification.action,
    }))
}

/// Public values the landing page needs to render the widget
pub async fn public_config(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let verification = &state.config.verification;
    Json(json!({
        "siteKey": verification.site_key,
        "projectId": verification.project_id,
        "legacySiteKey": verification.legacy_site_key,
        "hasEnterprise": verification.has_risk_assessment(),
        "hasLegacy": verification.has_shared_secret(),
    }))
}

pub async fn test(
    Authorized(_): Authorized,
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<TestRequest>, JsonRejection>,
) -> Result<impl IntoResponse, ApiError> {
    let Json(request) = payload.map_err(|e| state.api_error(e))?;

    let token = request
        .token
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Field 'token' is required"))?;
    let action = request.action.unwrap_or_else(|| TEST_ACTION.to_string());

    let verifier = state
        .intake
        .verifier()
        .ok_or_else(|| ApiError::unavailable("No verification mechanism configured"))?;

    let result = verifier
        .verify(&token, &action, TEST_MIN_SCORE)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(json!({
        "success": result.accepted,
        "mechanism": verifier.mechanism(),
        "result": result,
    })))
}
