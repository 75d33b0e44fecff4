//! Lead routes: public intake plus operator list/delete/reply

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;

use twolife_core::{Lead, LeadId, LeadSubmission};

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::gateway::GatewayState;

#[derive(Debug, Serialize)]
pub struct CreatedResponse {
    pub message: &'static str,
    pub lead: Lead,
}

#[derive(Debug, Deserialize)]
pub struct ReplyRequest {
    #[serde(default)]
    pub subject: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
}

pub async fn create_lead(
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<LeadSubmission>, JsonRejection>,
) -> Result<(StatusCode, Json<CreatedResponse>), ApiError> {
    let Json(submission) = payload.map_err(|e| state.api_error(e))?;

    let lead = state
        .intake
        .submit(submission)
        .await
        .map_err(|e| state.api_error(e))?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            message: "Lead created successfully",
            lead,
        }),
    ))
}

pub async fn list_leads(
    Authorized(principal): Authorized,
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Vec<Lead>>, ApiError> {
    let leads = state.intake.list().await.map_err(|e| state.api_error(e))?;
    tracing::debug!(principal = principal.id(), count = leads.len(), "Leads listed");
    Ok(Json(leads))
}

pub async fn delete_lead(
    Authorized(principal): Authorized,
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let id = LeadId::from(id);
    state
        .intake
        .delete(&id)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(principal = principal.id(), lead_id = %id, "Delete requested");
    Ok(Json(json!({ "message": "Lead deleted" })))
}

pub async fn reply_to_lead(
    Authorized(principal): Authorized,
    State(state): State<Arc<GatewayState>>,
    Path(id): Path<String>,
    payload: Result<Json<ReplyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| state.api_error(e))?;

    let body = request
        .message
        .filter(|m| !m.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Field 'message' is required"))?;

    let lead = state
        .intake
        .reply(&LeadId::from(id), request.subject.as_deref(), &body)
        .await
        .map_err(|e| state.api_error(e))?;

    tracing::info!(principal = principal.id(), lead_id = %lead.id, "Operator replied");
    Ok(Json(json!({ "message": format!("Reply sent to {}", lead.email) })))
}
