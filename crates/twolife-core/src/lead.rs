//! Lead model and submission validation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique lead identifier
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LeadId(pub String);

impl LeadId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for LeadId {
    fn default() -> Self {
        Self::new()
    }
}

impl From<String> for LeadId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for LeadId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl std::fmt::Display for LeadId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A captured customer inquiry.
///
/// Leads are immutable after creation; the only lifecycle transition is
/// permanent removal by an operator. The id serializes as `_id` because the
/// dashboard keys rows on that name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lead {
    #[serde(rename = "_id", alias = "id")]
    pub id: LeadId,
    pub name: String,
    pub email: String,
    pub message: String,
    pub accepted_terms: bool,
    pub created_at: DateTime<Utc>,
}

impl Lead {
    /// Build a lead from validated fields with a fresh id and `created_at = now`.
    ///
    /// The timestamp is truncated to milliseconds so it survives a store
    /// round-trip unchanged.
    pub fn create(fields: LeadFields) -> Self {
        Self::create_at(fields, now_millis())
    }

    pub fn create_at(fields: LeadFields, created_at: DateTime<Utc>) -> Self {
        Self {
            id: LeadId::new(),
            name: fields.name,
            email: fields.email,
            message: fields.message,
            accepted_terms: true,
            created_at,
        }
    }

    /// One-line summary used in logs and chat notifications
    pub fn summary(&self) -> String {
        format!("{} <{}>: {}", self.name, self.email, self.message)
    }
}

fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Trimmed, validated lead fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeadFields {
    pub name: String,
    pub email: String,
    pub message: String,
}

/// Raw public form submission
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadSubmission {
    #[serde(default)]
    pub name: Option<String>,

    #[serde(default)]
    pub email: Option<String>,

    #[serde(default)]
    pub message: Option<String>,

    /// Opaque proof-of-humanity token from the landing page widget
    #[serde(default, alias = "recaptchaResponse")]
    pub token: Option<String>,

    /// Only a literal JSON `true` counts as acceptance
    #[serde(default, deserialize_with = "deserialize_strict_true")]
    pub accepted_terms: bool,
}

impl LeadSubmission {
    pub fn new(
        name: impl Into<String>,
        email: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            name: Some(name.into()),
            email: Some(email.into()),
            message: Some(message.into()),
            token: None,
            accepted_terms: false,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn with_accepted_terms(mut self, accepted: bool) -> Self {
        self.accepted_terms = accepted;
        self
    }

    /// Structural validation. Runs before any external call.
    pub fn validate(&self) -> Result<LeadFields, ValidationError> {
        let name = required(&self.name, "name")?;
        let email = required(&self.email, "email")?;
        let message = required(&self.message, "message")?;

        if !self.accepted_terms {
            return Err(ValidationError::TermsNotAccepted);
        }

        Ok(LeadFields {
            name,
            email,
            message,
        })
    }

    /// The supplied token, if it is non-blank
    pub fn token(&self) -> Option<&str> {
        self.token
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

fn required(value: &Option<String>, field: &'static str) -> Result<String, ValidationError> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or(ValidationError::MissingField(field))
}

fn deserialize_strict_true<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(value == serde_json::Value::Bool(true))
}
