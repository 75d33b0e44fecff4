//! Team channel status, connectivity test and custom messages

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

use twolife_core::notify::{TeamChannel, DEFAULT_COLOR};
use twolife_core::NotificationError;

use crate::auth::Authorized;
use crate::error::ApiError;
use crate::gateway::GatewayState;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub color: Option<u32>,
}

pub async fn status(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let notifications = state.intake.notifications();
    Json(json!({
        "chat": notifications.team().is_some(),
        "email": notifications.mailer().is_some(),
    }))
}

fn team(state: &GatewayState) -> Result<&Arc<dyn TeamChannel>, ApiError> {
    state
        .intake
        .notifications()
        .team()
        .ok_or_else(|| state.api_error(NotificationError::NotConfigured("chat")))
}

pub async fn test(
    Authorized(principal): Authorized,
    State(state): State<Arc<GatewayState>>,
) -> Result<Json<Value>, ApiError> {
    let team = team(&state)?;
    team.send_custom(
        "🧪 Connection test",
        &format!(
            "{} API is connected to this channel (requested by {})",
            state.config.notification.brand,
            principal.id()
        ),
        DEFAULT_COLOR,
    )
    .await
    .map_err(|e| state.api_error(e))?;

    Ok(Json(json!({ "message": "Test notification sent" })))
}

pub async fn send(
    Authorized(_): Authorized,
    State(state): State<Arc<GatewayState>>,
    payload: Result<Json<SendRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload.map_err(|e| state.api_error(e))?;

    let (Some(title), Some(message)) = (
        request.title.filter(|t| !t.trim().is_empty()),
        request.message.filter(|m| !m.trim().is_empty()),
    ) else {
        return Err(ApiError::bad_request("Fields 'title' and 'message' are required"));
    };

    let team = team(&state)?;
    team.send_custom(&title, &message, request.color.unwrap_or(DEFAULT_COLOR))
        .await
        .map_err(|e| state.api_error(e))?;

    Ok(Json(json!({ "message": "Message sent" })))
}
