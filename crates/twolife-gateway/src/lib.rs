//! TwoLife Gateway - HTTP surface for lead capture and the admin dashboard
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    TwoLifeCar Gateway                     │
//! ├──────────────────────────────────────────────────────────┤
//! │   landing page                    admin dashboard         │
//! │        │                                │                 │
//! │  POST /api/leads          POST /api/login, GET /api/leads │
//! │        │                                │                 │
//! │        │                     ┌──────────▼──────────┐      │
//! │        │                     │  Authorized (gate)  │      │
//! │        │                     └──────────┬──────────┘      │
//! │  ┌─────▼────────────────────────────────▼───────┐         │
//! │  │                 LeadIntake                   │         │
//! │  └─────┬──────────────┬──────────────┬──────────┘         │
//! │   verifier          store       notifications             │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Features
//!
//! - **Public intake**: validated, verified, persisted, announced
//! - **Operator access**: session tokens or a static service key
//! - **Diagnostics**: health, verification and notification status

pub mod auth;
pub mod config;
pub mod error;
pub mod gateway;
pub mod routes;

pub use auth::Authorized;
pub use config::{Environment, GatewayConfig};
pub use error::{ApiError, ConfigError, GatewayError, Result};
pub use gateway::{Gateway, GatewayState};

/// Gateway version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default HTTP port
pub const DEFAULT_PORT: u16 = 5000;

/// Default host
pub const DEFAULT_HOST: &str = "127.0.0.1";
