//! Core configuration sections
//!
//! Each collaborator of the intake workflow gets its own section. The gateway
//! composes them into a single `GatewayConfig`; nothing in this crate reads
//! the process environment.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default action label the landing page attaches to its token
pub const DEFAULT_ACTION: &str = "submit_lead";

/// Default minimum risk score accepted by the assessment mechanism
pub const DEFAULT_MIN_SCORE: f64 = 0.5;

/// Default bound on every outbound HTTP call
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 5;

/// Verification provider configuration.
///
/// The risk-scored assessment is used when a project id, site key and API
/// key are all present; otherwise the shared-secret check is used when a
/// secret is present; otherwise no mechanism is active.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct VerificationConfig {
    /// Cloud project the assessments are filed under
    pub project_id: Option<String>,

    /// Site key the landing page widget was issued
    pub site_key: Option<String>,

    /// API key for the assessment endpoint
    pub api_key: Option<String>,

    /// Assessment API base URL
    pub assessment_base_url: String,

    /// Minimum score an assessment must reach
    pub min_score: f64,

    /// Action label expected on the token
    pub action: String,

    /// Shared secret for the legacy token check
    pub shared_secret: Option<String>,

    /// Legacy public site key, handed to the landing page
    pub legacy_site_key: Option<String>,

    /// Legacy verify endpoint
    pub verify_url: String,
}

impl Default for VerificationConfig {
    fn default() -> Self {
        Self {
            project_id: None,
            site_key: None,
            api_key: None,
            assessment_base_url: "https://recaptchaenterprise.googleapis.com".to_string(),
            min_score: DEFAULT_MIN_SCORE,
            action: DEFAULT_ACTION.to_string(),
            shared_secret: None,
            legacy_site_key: None,
            verify_url: "https://www.google.com/recaptcha/api/siteverify".to_string(),
        }
    }
}

impl VerificationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Configure the risk-scored assessment mechanism
    pub fn with_risk_assessment(
        mut self,
        project_id: impl Into<String>,
        site_key: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Self {
        self.project_id = Some(project_id.into());
        self.site_key = Some(site_key.into());
        self.api_key = Some(api_key.into());
        self
    }

    /// Configure the shared-secret mechanism
    pub fn with_shared_secret(mut self, secret: impl Into<String>) -> Self {
        self.shared_secret = Some(secret.into());
        self
    }

    pub fn with_assessment_base_url(mut self, url: impl Into<String>) -> Self {
        self.assessment_base_url = url.into();
        self
    }

    pub fn with_verify_url(mut self, url: impl Into<String>) -> Self {
        self.verify_url = url.into();
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score.clamp(0.0, 1.0);
        self
    }

    pub fn has_risk_assessment(&self) -> bool {
        is_set(&self.project_id) && is_set(&self.site_key) && is_set(&self.api_key)
    }

    pub fn has_shared_secret(&self) -> bool {
        is_set(&self.shared_secret)
    }

    /// Site key with everything after the first ten characters hidden
    pub fn masked_site_key(&self) -> Option<String> {
        self.site_key.as_deref().filter(|k| !k.is_empty()).map(|k| {
            let prefix: String = k.chars().take(10).collect();
            format!("{}...", prefix)
        })
    }
}

/// Notification channel configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NotificationConfig {
    /// Team chat webhook
    pub chat_webhook_url: Option<String>,

    /// Transactional email API endpoint
    pub email_api_url: String,

    /// Transactional email API key
    pub email_api_key: Option<String>,

    /// Sender address for confirmation and reply emails
    pub email_from: Option<String>,

    /// Brand shown in message titles and footers
    pub brand: String,
}

impl Default for NotificationConfig {
    fn default() -> Self {
        Self {
            chat_webhook_url: None,
            email_api_url: "https://api.resend.com/emails".to_string(),
            email_api_key: None,
            email_from: None,
            brand: "TwoLifeCar".to_string(),
        }
    }
}

impl NotificationConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_chat_webhook(mut self, url: impl Into<String>) -> Self {
        self.chat_webhook_url = Some(url.into());
        self
    }

    pub fn with_email(
        mut self,
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
    ) -> Self {
        self.email_api_url = api_url.into();
        self.email_api_key = Some(api_key.into());
        self.email_from = Some(from.into());
        self
    }

    pub fn has_chat_webhook(&self) -> bool {
        is_set(&self.chat_webhook_url)
    }

    pub fn has_email(&self) -> bool {
        is_set(&self.email_api_key) && is_set(&self.email_from)
    }
}

/// Admin authentication configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// HMAC secret for session tokens
    pub jwt_secret: String,

    /// Session validity in seconds
    pub session_ttl_secs: u64,

    /// Static key for trusted server-to-server access
    pub service_api_key: Option<String>,

    /// Username provisioned at first startup
    pub default_admin_username: String,

    /// Password provisioned at first startup
    pub default_admin_password: String,

    /// bcrypt work factor
    pub bcrypt_cost: u32,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            jwt_secret: "development-secret-change-in-production".to_string(),
            session_ttl_secs: 2 * 60 * 60, // 2 hours
            service_api_key: None,
            default_admin_username: "admin".to_string(),
            default_admin_password: "123456".to_string(),
            bcrypt_cost: 10,
        }
    }
}

impl AuthConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_jwt_secret(mut self, secret: impl Into<String>) -> Self {
        self.jwt_secret = secret.into();
        self
    }

    pub fn with_service_api_key(mut self, key: impl Into<String>) -> Self {
        self.service_api_key = Some(key.into());
        self
    }

    pub fn with_session_ttl_secs(mut self, ttl: u64) -> Self {
        self.session_ttl_secs = ttl;
        self
    }

    pub fn with_bcrypt_cost(mut self, cost: u32) -> Self {
        self.bcrypt_cost = cost;
        self
    }

    pub fn has_service_api_key(&self) -> bool {
        is_set(&self.service_api_key)
    }
}

/// What the intake workflow does when no verification mechanism is configured
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VerificationPolicy {
    /// Accept submissions without verification, logging a warning
    FailOpen,
    /// Refuse submissions until a mechanism is configured
    FailClosed,
}

/// Intake workflow configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IntakeConfig {
    /// Token value that skips verification (internal testing only)
    pub bypass_token: Option<String>,

    /// Behaviour when no verification mechanism is configured
    pub verification_policy: VerificationPolicy,
}

impl Default for IntakeConfig {
    fn default() -> Self {
        Self {
            bypass_token: None,
            verification_policy: VerificationPolicy::FailClosed,
        }
    }
}

impl IntakeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_bypass_token(mut self, token: impl Into<String>) -> Self {
        self.bypass_token = Some(token.into());
        self
    }

    pub fn with_policy(mut self, policy: VerificationPolicy) -> Self {
        self.verification_policy = policy;
        self
    }

    /// Whether `token` is the configured bypass value
    pub fn is_bypass(&self, token: Option<&str>) -> bool {
        match (self.bypass_token.as_deref(), token) {
            (Some(bypass), Some(token)) => !bypass.is_empty() && bypass == token,
            _ => false,
        }
    }
}

/// Build the shared outbound HTTP client with a bounded timeout
pub fn http_client(timeout_secs: u64) -> reqwest::Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs.max(1)))
        .connect_timeout(Duration::from_secs(timeout_secs.max(1)))
        .build()
}

fn is_set(value: &Option<String>) -> bool {
    value.as_deref().map(|v| !v.trim().is_empty()).unwrap_or(false)
}
