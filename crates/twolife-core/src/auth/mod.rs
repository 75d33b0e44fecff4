//! Admin session gate
//!
//! Sits in front of the privileged lead operations (list, delete, reply).
//! Two mutually exclusive credential types are accepted:
//!
//! - a service key, presented on its own channel, for trusted
//!   server-to-server access. When present it alone decides.
//! - an operator session token issued by [`AdminGate::login`].

pub mod session;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::config::AuthConfig;
use crate::error::AuthError;
use crate::store::CredentialStore;

pub use session::{SessionClaims, SessionIssuer, SessionToken};

/// Stored operator identity. The password is only ever held as a bcrypt hash.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdminCredential {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
}

impl AdminCredential {
    /// Build a credential around an already-hashed password
    pub fn new(username: impl Into<String>, password_hash: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            username: username.into(),
            password_hash: password_hash.into(),
            created_at: Utc::now(),
        }
    }
}

/// Who an authorized request acts as
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Principal {
    /// A logged-in operator
    Operator { admin_id: String },
    /// A trusted service holding the static key
    Service,
}

impl Principal {
    pub fn id(&self) -> &str {
        match self {
            Principal::Operator { admin_id } => admin_id,
            Principal::Service => "api_access",
        }
    }
}

/// Credentials presented with a request
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    /// Value of the session token channel, `Bearer ` prefix stripped
    pub session_token: Option<String>,
    /// Value of the service key channel
    pub service_key: Option<String>,
}

impl Credentials {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accepts either a raw token or `Bearer <token>`
    pub fn with_authorization(mut self, value: impl AsRef<str>) -> Self {
        let value = value.as_ref().trim();
        let token = value
            .strip_prefix("Bearer ")
            .or_else(|| value.strip_prefix("bearer "))
            .unwrap_or(value)
            .trim();
        if !token.is_empty() {
            self.session_token = Some(token.to_string());
        }
        self
    }

    pub fn with_service_key(mut self, key: impl Into<String>) -> Self {
        let key = key.into();
        if !key.is_empty() {
            self.service_key = Some(key);
        }
        self
    }
}

/// Issues and validates operator credentials
pub struct AdminGate {
    config: AuthConfig,
    issuer: SessionIssuer,
    credentials: Arc<dyn CredentialStore>,
}

impl std::fmt::Debug for AdminGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminGate")
            .field("issuer", &self.issuer)
            .field("service_key_configured", &self.config.has_service_api_key())
            .finish_non_exhaustive()
    }
}

impl AdminGate {
    pub fn new(config: AuthConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        let issuer = SessionIssuer::new(&config.jwt_secret, config.session_ttl_secs);
        Self {
            config,
            issuer,
            credentials,
        }
    }

    /// Provision the default operator if it does not exist yet.
    ///
    /// Returns whether a credential was created. Safe to call on every start.
    pub async fn ensure_default_admin(&self) -> Result<bool, AuthError> {
        let username = self.config.default_admin_username.clone();
        if self.credentials.find_by_username(&username).await?.is_some() {
            tracing::info!("Admin credential '{}' already present", username);
            return Ok(false);
        }

        let hash = self
            .hash_password(self.config.default_admin_password.clone())
            .await?;
        let created = self
            .credentials
            .insert_credential(AdminCredential::new(username.clone(), hash))
            .await?;

        if created {
            tracing::info!("Admin credential '{}' provisioned", username);
        }
        Ok(created)
    }

    /// Check a username/password pair and issue a session token
    pub async fn login(&self, username: &str, password: &str) -> Result<SessionToken, AuthError> {
        let credential = match self.credentials.find_by_username(username).await? {
            Some(c) => c,
            None => {
                tracing::warn!("Login attempt for unknown user '{}'", username);
                return Err(AuthError::InvalidLogin);
            }
        };

        let password = password.to_string();
        let hash = credential.password_hash.clone();
        let matches = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .map_err(|e| AuthError::Backend(format!("verifying password hash: {}", e)))?;

        if !matches {
            tracing::warn!("Wrong password for '{}'", username);
            return Err(AuthError::InvalidLogin);
        }

        let token = self.issuer.issue(&credential.id)?;
        tracing::info!("Operator '{}' logged in", username);
        Ok(token)
    }

    /// Resolve the principal for a request.
    ///
    /// A presented service key is checked alone; a wrong key is rejected even
    /// when a valid session token accompanies it.
    pub fn authorize(&self, credentials: &Credentials) -> Result<Principal, AuthError> {
        if let Some(key) = credentials.service_key.as_deref() {
            return match self.config.service_api_key.as_deref() {
                Some(expected) if !expected.is_empty() && constant_time_eq(key, expected) => {
                    Ok(Principal::Service)
                }
                _ => Err(AuthError::InvalidServiceKey),
            };
        }

        let token = credentials
            .session_token
            .as_deref()
            .ok_or(AuthError::MissingCredentials)?;
        let claims = self.issuer.validate(token)?;

        Ok(Principal::Operator {
            admin_id: claims.sub,
        })
    }

    async fn hash_password(&self, password: String) -> Result<String, AuthError> {
        let cost = self.config.bcrypt_cost;
        tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
            .await
            .map_err(|e| AuthError::Backend(e.to_string()))?
            .map_err(|e| AuthError::Backend(format!("hashing password: {}", e)))
    }
}

fn constant_time_eq(a: &str, b: &str) -> bool {
    let (a, b) = (a.as_bytes(), b.as_bytes());
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
