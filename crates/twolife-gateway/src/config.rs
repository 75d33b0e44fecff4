//! Gateway configuration
//!
//! Layered: defaults, then an optional JSON/TOML file, then environment
//! variables (a `.env` file is honored), then CLI flags in the binary.

use serde::{Deserialize, Serialize};
use std::net::SocketAddr;
use std::path::Path;

use twolife_core::config::{
    AuthConfig, IntakeConfig, NotificationConfig, VerificationConfig, VerificationPolicy,
    DEFAULT_HTTP_TIMEOUT_SECS,
};

use crate::error::{ConfigError, GatewayError};
use crate::{DEFAULT_HOST, DEFAULT_PORT};

/// Deployment environment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    #[default]
    Development,
    Production,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            _ => Environment::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Development => "development",
            Environment::Production => "production",
        }
    }

    pub fn is_production(&self) -> bool {
        matches!(self, Environment::Production)
    }
}

/// Main gateway configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Server host
    pub host: String,

    /// Server port
    pub port: u16,

    pub environment: Environment,

    /// SQLite database file, or `:memory:`
    pub database_path: String,

    /// CORS origins. Empty means permissive in development, none in production.
    pub allowed_origins: Vec<String>,

    /// Timeout applied to every outbound provider call
    pub http_timeout_secs: u64,

    /// Token that skips verification (internal testing only)
    pub bypass_token: Option<String>,

    /// Force verification on or off. Unset follows the environment.
    pub require_verification: Option<bool>,

    pub verification: VerificationConfig,
    pub notification: NotificationConfig,
    pub auth: AuthConfig,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            environment: Environment::Development,
            database_path: "data/twolife.db".to_string(),
            allowed_origins: Vec::new(),
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            bypass_token: None,
            require_verification: None,
            verification: VerificationConfig::default(),
            notification: NotificationConfig::default(),
            auth: AuthConfig::default(),
        }
    }
}

impl GatewayConfig {
    /// Create a new configuration with default values
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    pub fn with_database_path(mut self, path: impl Into<String>) -> Self {
        self.database_path = path.into();
        self
    }

    pub fn with_allowed_origins(mut self, origins: Vec<String>) -> Self {
        self.allowed_origins = origins;
        self
    }

    pub fn with_bypass_token(mut self, token: impl Into<String>) -> Self {
        self.bypass_token = Some(token.into());
        self
    }

    pub fn with_require_verification(mut self, require: bool) -> Self {
        self.require_verification = Some(require);
        self
    }

    pub fn with_verification(mut self, verification: VerificationConfig) -> Self {
        self.verification = verification;
        self
    }

    pub fn with_notification(mut self, notification: NotificationConfig) -> Self {
        self.notification = notification;
        self
    }

    pub fn with_auth(mut self, auth: AuthConfig) -> Self {
        self.auth = auth;
        self
    }

    /// Get the socket address
    pub fn socket_addr(&self) -> Result<SocketAddr, GatewayError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|_| {
                GatewayError::InvalidConfig(format!("bad listen address {}:{}", self.host, self.port))
            })
    }

    /// Fail closed in production unless explicitly overridden
    pub fn verification_policy(&self) -> VerificationPolicy {
        match self.require_verification {
            Some(true) => VerificationPolicy::FailClosed,
            Some(false) => VerificationPolicy::FailOpen,
            None if self.environment.is_production() => VerificationPolicy::FailClosed,
            None => VerificationPolicy::FailOpen,
        }
    }

    /// Intake section handed to the workflow
    pub fn intake_config(&self) -> IntakeConfig {
        let mut intake = IntakeConfig::new().with_policy(self.verification_policy());
        if let Some(token) = self.bypass_token.as_deref().filter(|t| !t.is_empty()) {
            intake = intake.with_bypass_token(token);
        }
        intake
    }

    /// Load configuration from a JSON or TOML file (by extension)
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;

        let is_toml = path
            .extension()
            .map(|ext| ext.eq_ignore_ascii_case("toml"))
            .unwrap_or(false);

        if is_toml {
            Ok(toml::from_str(&content)?)
        } else {
            Ok(serde_json::from_str(&content)?)
        }
    }

    /// Defaults overlaid with the process environment (and `.env`)
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::default().with_env()
    }

    /// Overlay the process environment (and `.env`) onto this config
    pub fn with_env(self) -> Result<Self, ConfigError> {
        if let Ok(path) = dotenvy::dotenv() {
            tracing::debug!("Loaded environment from {}", path.display());
        }
        self.apply_vars(|key| std::env::var(key).ok())
    }

    /// Overlay variables from `lookup`. Blank values are ignored.
    pub fn apply_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        if let Some(port) = get("PORT") {
            self.port = parse(&port, "PORT")?;
        }
        if let Some(host) = get("HOST") {
            self.host = host;
        }
        if let Some(env) = get("APP_ENV").or_else(|| get("NODE_ENV")) {
            self.environment = Environment::parse(&env);
        }
        if let Some(path) = get("DATABASE_PATH") {
            self.database_path = path;
        }
        if let Some(origins) = get("ALLOWED_ORIGINS") {
            self.allowed_origins = origins
                .split(',')
                .map(str::trim)
                .filter(|o| !o.is_empty())
                .map(str::to_string)
                .collect();
        }
        if let Some(timeout) = get("HTTP_TIMEOUT_SECS") {
            self.http_timeout_secs = parse(&timeout, "HTTP_TIMEOUT_SECS")?;
        }
        if let Some(token) = get("VERIFICATION_BYPASS_TOKEN") {
            self.bypass_token = Some(token);
        }
        if let Some(require) = get("REQUIRE_VERIFICATION") {
            self.require_verification = Some(parse_bool(&require, "REQUIRE_VERIFICATION")?);
        }

        // Auth
        if let Some(secret) = get("JWT_SECRET") {
            self.auth.jwt_secret = secret;
        }
        if let Some(key) = get("PRIVATE_API_KEY") {
            self.auth.service_api_key = Some(key);
        }

        // Verification
        let v = &mut self.verification;
        if let Some(project) = get("GOOGLE_CLOUD_PROJECT_ID") {
            v.project_id = Some(project);
        }
        if let Some(site_key) = get("RECAPTCHA_ENTERPRISE_SITE_KEY") {
            v.site_key = Some(site_key);
        }
        if let Some(api_key) = get("RECAPTCHA_ENTERPRISE_API_KEY") {
            v.api_key = Some(api_key);
        }
        if let Some(min_score) = get("RECAPTCHA_MIN_SCORE") {
            let min_score: f64 = parse(&min_score, "RECAPTCHA_MIN_SCORE")?;
            if !(0.0..=1.0).contains(&min_score) {
                return Err(ConfigError::InvalidValue {
                    key: "RECAPTCHA_MIN_SCORE",
                    value: min_score.to_string(),
                });
            }
            v.min_score = min_score;
        }
        if let Some(secret) = get("RECAPTCHA_SECRET_KEY") {
            v.shared_secret = Some(secret);
        }
        if let Some(site_key) = get("RECAPTCHA_SITE_KEY") {
            v.legacy_site_key = Some(site_key);
        }

        // Notifications
        let n = &mut self.notification;
        if let Some(url) = get("DISCORD_WEBHOOK_URL") {
            n.chat_webhook_url = Some(url);
        }
        if let Some(url) = get("EMAIL_API_URL") {
            n.email_api_url = url;
        }
        if let Some(key) = get("EMAIL_API_KEY") {
            n.email_api_key = Some(key);
        }
        if let Some(from) = get("EMAIL_FROM") {
            n.email_from = Some(from);
        }

        Ok(self)
    }

    /// Startup checks that should stop the process
    pub fn validate(&self) -> Result<(), GatewayError> {
        self.socket_addr()?;
        if self.environment.is_production() && self.auth.jwt_secret == AuthConfig::default().jwt_secret
        {
            return Err(GatewayError::InvalidConfig(
                "JWT_SECRET must be set in production".to_string(),
            ));
        }
        if self.environment.is_production()
            && self.bypass_token.as_deref().is_some_and(|t| !t.is_empty())
        {
            return Err(GatewayError::InvalidConfig(
                "VERIFICATION_BYPASS_TOKEN is for internal testing and must not be set in production"
                    .to_string(),
            ));
        }
        let min_score = self.verification.min_score;
        if !(0.0..=1.0).contains(&min_score) {
            return Err(GatewayError::InvalidConfig(format!(
                "verification min_score must be within 0.0..=1.0, got {}",
                min_score
            )));
        }
        Ok(())
    }
}

fn parse<T: std::str::FromStr>(value: &str, key: &'static str) -> Result<T, ConfigError> {
    value.parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

fn parse_bool(value: &str, key: &'static str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key,
            value: value.to_string(),
        }),
    }
}
