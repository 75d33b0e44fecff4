//! API routes

pub mod auth;
pub mod leads;
pub mod notifications;
pub mod verification;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

use twolife_core::LeadStore;

use crate::gateway::GatewayState;

fn configured(flag: bool) -> &'static str {
    if flag {
        "configured"
    } else {
        "not configured"
    }
}

/// Service info: name, version, environment and integration flags
pub async fn index(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let config = &state.config;
    Json(serde_json::json!({
        "message": "🚗 TwoLifeCar API is running",
        "version": crate::VERSION,
        "status": "healthy",
        "timestamp": Utc::now(),
        "environment": config.environment.as_str(),
        "services": {
            "chat_webhook": configured(config.notification.has_chat_webhook()),
            "email": configured(config.notification.has_email()),
            "risk_assessment": configured(config.verification.has_risk_assessment()),
            "shared_secret": configured(config.verification.has_shared_secret()),
        },
        "endpoints": {
            "leads": "/api/leads",
            "login": "/api/login",
            "health": "/api/health",
            "verification_status": "/api/verification/status",
            "notifications_status": "/api/notifications/status",
        }
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub timestamp: chrono::DateTime<Utc>,
    pub store: StoreHealth,
    pub integrations: Integrations,
}

#[derive(Debug, Serialize)]
pub struct StoreHealth {
    pub connected: bool,
}

#[derive(Debug, Serialize)]
pub struct Integrations {
    pub risk_assessment: bool,
    pub shared_secret: bool,
    pub chat_webhook: bool,
    pub email: bool,
    pub service_key: bool,
}

/// Store connectivity and configured-integration flags. No secrets.
pub async fn health(State(state): State<Arc<GatewayState>>) -> impl IntoResponse {
    let connected = state.intake.store().is_available().await;
    let config = &state.config;

    let body = HealthResponse {
        status: if connected { "ok" } else { "degraded" },
        version: crate::VERSION,
        timestamp: Utc::now(),
        store: StoreHealth { connected },
        integrations: Integrations {
            risk_assessment: config.verification.has_risk_assessment(),
            shared_secret: config.verification.has_shared_secret(),
            chat_webhook: config.notification.has_chat_webhook(),
            email: config.notification.has_email(),
            service_key: config.auth.has_service_api_key(),
        },
    };

    let status = if connected {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };
    (status, Json(body))
}
