//! Request authentication
//!
//! `Authorized` pulls credentials from the `Authorization` header (raw token
//! or `Bearer <token>`) and the `x-api-key` header, and asks the admin gate
//! for a principal. Handlers that take it are operator-only.

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use std::sync::Arc;

use twolife_core::{Credentials, Principal};

use crate::error::ApiError;
use crate::gateway::{GatewayState, SERVICE_KEY_HEADER};

/// An authenticated operator or service
#[derive(Debug, Clone)]
pub struct Authorized(pub Principal);

pub fn credentials_from(parts: &Parts) -> Credentials {
    let mut credentials = Credentials::new();

    if let Some(value) = parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
    {
        credentials = credentials.with_authorization(value);
    }
    if let Some(value) = parts
        .headers
        .get(SERVICE_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
    {
        credentials = credentials.with_service_key(value.trim());
    }

    credentials
}

#[async_trait]
impl FromRequestParts<Arc<GatewayState>> for Authorized {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<GatewayState>,
    ) -> Result<Self, Self::Rejection> {
        let credentials = credentials_from(parts);

        match state.gate.authorize(&credentials) {
            Ok(principal) => {
                tracing::debug!(principal = principal.id(), "Request authorized");
                Ok(Authorized(principal))
            }
            Err(e) => {
                tracing::warn!(path = %parts.uri.path(), "Rejected credentials: {}", e);
                Err(state.api_error(e))
            }
        }
    }
}
