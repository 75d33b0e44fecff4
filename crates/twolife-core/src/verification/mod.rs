//! Verification provider adapter
//!
//! Classifies a client-supplied proof token as accepted or rejected. Two
//! interchangeable mechanisms implement [`Verifier`]:
//!
//! - [`RiskAssessmentVerifier`]: risk-scored assessment; rejects invalid
//!   tokens, action mismatches and scores below the threshold.
//! - [`SharedSecretVerifier`]: legacy shared-secret check; binary outcome.
//!
//! The active mechanism is resolved once from [`VerificationConfig`] by
//! [`resolve_verifier`]. A rejection is a normal [`VerificationResult`];
//! only transport and configuration problems surface as [`VerifierError`].

pub mod risk_assessment;
pub mod shared_secret;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;

use crate::config::VerificationConfig;

pub use risk_assessment::RiskAssessmentVerifier;
pub use shared_secret::SharedSecretVerifier;

/// Which mechanism a verifier implements
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mechanism {
    RiskAssessment,
    SharedSecret,
}

impl std::fmt::Display for Mechanism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Mechanism::RiskAssessment => write!(f, "risk_assessment"),
            Mechanism::SharedSecret => write!(f, "shared_secret"),
        }
    }
}

/// Why a token was rejected
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "code", rename_all = "snake_case")]
pub enum RejectionReason {
    /// The provider did not accept our secret
    MisconfiguredSecret,
    /// The token is unknown or invalid
    InvalidToken,
    /// The provider could not parse the request
    MalformedRequest,
    /// The token timed out or was already redeemed
    ExpiredOrDuplicate,
    /// The token was generated for a different action
    ActionMismatch { expected: String, actual: String },
    /// The risk score is below the acceptance threshold
    ScoreTooLow { score: f64, min_score: f64 },
    /// The assessment marked the token invalid
    TokenInvalid { invalid_reason: String },
    /// Rejected without a recognized reason
    Unspecified { codes: Vec<String> },
}

impl RejectionReason {
    /// Message safe to show the submitter. Never contains configuration values.
    pub fn user_message(&self) -> &'static str {
        match self {
            RejectionReason::MisconfiguredSecret => {
                "Verification is misconfigured on the server, please try again later"
            }
            RejectionReason::InvalidToken | RejectionReason::TokenInvalid { .. } => {
                "Invalid verification token"
            }
            RejectionReason::MalformedRequest => "Malformed verification request",
            RejectionReason::ExpiredOrDuplicate => {
                "Verification token expired or already used, please complete the challenge again"
            }
            RejectionReason::ActionMismatch { .. } => "Verification action does not match",
            RejectionReason::ScoreTooLow { .. } => "Verification score too low",
            RejectionReason::Unspecified { .. } => "Verification failed",
        }
    }
}

impl std::fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.user_message())
    }
}

/// Outcome of a single verification. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerificationResult {
    pub accepted: bool,
    /// Confidence in [0, 1], when the mechanism has one
    pub score: Option<f64>,
    pub reason: Option<RejectionReason>,
}

impl VerificationResult {
    pub fn accepted(score: Option<f64>) -> Self {
        Self {
            accepted: true,
            score,
            reason: None,
        }
    }

    pub fn rejected(score: Option<f64>, reason: RejectionReason) -> Self {
        Self {
            accepted: false,
            score,
            reason: Some(reason),
        }
    }
}

/// Transport or configuration failure while verifying
#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Verification provider unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Verification provider returned {status}")]
    Provider { status: u16, body: String },

    #[error("Verification not configured")]
    NotConfigured,
}

/// A proof-of-humanity check
#[async_trait]
pub trait Verifier: Send + Sync {
    fn mechanism(&self) -> Mechanism;

    /// Classify `token`. `action` and `min_score` only matter to mechanisms
    /// that report them.
    async fn verify(
        &self,
        token: &str,
        action: &str,
        min_score: f64,
    ) -> Result<VerificationResult, VerifierError>;
}

/// Pick the active mechanism: risk assessment, then shared secret, then none.
pub fn resolve_verifier(
    config: &VerificationConfig,
    client: reqwest::Client,
) -> Option<Arc<dyn Verifier>> {
    if let Some(verifier) = RiskAssessmentVerifier::from_config(config, client.clone()) {
        tracing::info!(
            mechanism = %Mechanism::RiskAssessment,
            site_key = ?config.masked_site_key(),
            "Verification mechanism selected"
        );
        return Some(Arc::new(verifier));
    }

    if let Some(verifier) = SharedSecretVerifier::from_config(config, client) {
        tracing::info!(mechanism = %Mechanism::SharedSecret, "Verification mechanism selected");
        return Some(Arc::new(verifier));
    }

    tracing::warn!("No verification mechanism configured");
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_precedence() {
        let client = reqwest::Client::new();

        let both = VerificationConfig::new()
            .with_risk_assessment("proj", "site", "key")
            .with_shared_secret("secret");
        assert_eq!(
            resolve_verifier(&both, client.clone()).map(|v| v.mechanism()),
            Some(Mechanism::RiskAssessment)
        );

        let legacy = VerificationConfig::new().with_shared_secret("secret");
        assert_eq!(
            resolve_verifier(&legacy, client.clone()).map(|v| v.mechanism()),
            Some(Mechanism::SharedSecret)
        );

        assert!(resolve_verifier(&VerificationConfig::new(), client).is_none());
    }

    #[test]
    fn test_user_messages_hide_details() {
        let reason = RejectionReason::ScoreTooLow {
            score: 0.1,
            min_score: 0.5,
        };
        assert_eq!(reason.to_string(), "Verification score too low");
        assert!(RejectionReason::MisconfiguredSecret
            .user_message()
            .contains("misconfigured"));
    }

    #[test]
    fn test_reason_serializes_with_code() {
        let json = serde_json::to_value(RejectionReason::ExpiredOrDuplicate).unwrap();
        assert_eq!(json["code"], "expired_or_duplicate");
    }
}
