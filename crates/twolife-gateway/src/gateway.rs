//! Main Gateway implementation
//!
//! Wires the core workflow, admin gate and store into an axum router.

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::routing::{delete, get, post};
use axum::Router;
use std::sync::Arc;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use twolife_core::config::http_client;
use twolife_core::store::{CredentialStore, LeadStore, SqliteStore};
use twolife_core::{AdminGate, LeadIntake};

use crate::config::GatewayConfig;
use crate::error::ApiError;
use crate::routes;
use crate::{GatewayError, Result};

/// Header carrying the static service key
pub const SERVICE_KEY_HEADER: &str = "x-api-key";

/// Gateway state shared across handlers
pub struct GatewayState {
    pub config: GatewayConfig,
    pub intake: LeadIntake,
    pub gate: AdminGate,
    pub http_client: reqwest::Client,
}

impl std::fmt::Debug for GatewayState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayState")
            .field("environment", &self.config.environment)
            .field("intake", &self.intake)
            .field("gate", &self.gate)
            .finish_non_exhaustive()
    }
}

impl GatewayState {
    /// Build the state over explicit store collaborators
    pub fn new(
        config: GatewayConfig,
        leads: Arc<dyn LeadStore>,
        credentials: Arc<dyn CredentialStore>,
    ) -> Result<Self> {
        let http_client = http_client(config.http_timeout_secs)?;

        let intake = LeadIntake::from_config(
            leads,
            config.intake_config(),
            &config.verification,
            &config.notification,
            http_client.clone(),
        );
        let gate = AdminGate::new(config.auth.clone(), credentials);

        Ok(Self {
            config,
            intake,
            gate,
            http_client,
        })
    }

    /// Apply the environment's error disclosure policy
    pub fn api_error(&self, err: impl Into<ApiError>) -> ApiError {
        let err = err.into();
        if self.config.environment.is_production() {
            err.redacted()
        } else {
            err
        }
    }
}

/// Main Gateway
pub struct Gateway {
    state: Arc<GatewayState>,
}

impl Gateway {
    /// Create a gateway over prepared state
    pub fn new(state: GatewayState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    /// Open the SQLite store named in the configuration and build the gateway
    pub fn open(config: GatewayConfig) -> Result<Self> {
        config.validate()?;

        let store = Arc::new(
            SqliteStore::open(&config.database_path).map_err(GatewayError::Storage)?,
        );
        tracing::info!("Lead store opened at {}", config.database_path);

        let state = GatewayState::new(config, store.clone(), store)?;
        Ok(Self::new(state))
    }

    /// Get gateway state
    pub fn state(&self) -> Arc<GatewayState> {
        self.state.clone()
    }

    /// Create the default operator if missing
    pub async fn provision_admin(&self) -> Result<bool> {
        Ok(self.state.gate.ensure_default_admin().await?)
    }

    /// Build the Axum router
    pub fn build_router(&self) -> Router {
        let api = Router::new()
            .route("/health", get(routes::health))
            .route("/login", post(routes::auth::login))
            .route(
                "/leads",
                post(routes::leads::create_lead).get(routes::leads::list_leads),
            )
            .route("/leads/:id", delete(routes::leads::delete_lead))
            .route("/leads/:id/reply", post(routes::leads::reply_to_lead))
            .route("/verification/status", get(routes::verification::status))
            .route("/verification/config", get(routes::verification::public_config))
            .route("/verification/test", post(routes::verification::test))
            .route("/notifications/status", get(routes::notifications::status))
            .route("/notifications/test", post(routes::notifications::test))
            .route("/notifications/send", post(routes::notifications::send));

        Router::new()
            .route("/", get(routes::index))
            .nest("/api", api)
            .layer(cors_layer(&self.state.config))
            .layer(TraceLayer::new_for_http())
            .with_state(self.state.clone())
    }

    /// Start the gateway server
    pub async fn start(&self) -> Result<()> {
        let addr = self.state.config.socket_addr()?;
        let router = self.build_router();

        tracing::info!("🚗 TwoLifeCar gateway starting on {}", addr);

        let listener = tokio::net::TcpListener::bind(addr).await?;

        axum::serve(listener, router)
            .with_graceful_shutdown(shutdown_signal())
            .await
            .map_err(|e| GatewayError::Internal(e.to_string()))?;

        tracing::info!("Gateway stopped");
        Ok(())
    }
}

fn cors_layer(config: &GatewayConfig) -> CorsLayer {
    if config.allowed_origins.is_empty() {
        if config.environment.is_production() {
            tracing::warn!("No CORS origins configured; cross-origin requests will be refused");
            return CorsLayer::new();
        }
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static(SERVICE_KEY_HEADER),
        ])
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received");
}
