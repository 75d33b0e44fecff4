//! Shared-secret token check (legacy mechanism)

use async_trait::async_trait;
use serde::Deserialize;

use super::{Mechanism, RejectionReason, VerificationResult, Verifier, VerifierError};
use crate::config::VerificationConfig;

/// Posts `{secret, response}` to the provider's verify endpoint
#[derive(Clone)]
pub struct SharedSecretVerifier {
    secret: String,
    verify_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for SharedSecretVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSecretVerifier")
            .field("verify_url", &self.verify_url)
            .finish_non_exhaustive()
    }
}

impl SharedSecretVerifier {
    pub fn new(
        secret: impl Into<String>,
        verify_url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            secret: secret.into(),
            verify_url: verify_url.into(),
            http_client,
        }
    }

    pub fn from_config(config: &VerificationConfig, http_client: reqwest::Client) -> Option<Self> {
        if !config.has_shared_secret() {
            return None;
        }
        let secret = config.shared_secret.clone()?;
        Some(Self::new(secret, config.verify_url.clone(), http_client))
    }
}

#[derive(Debug, Deserialize)]
struct SiteVerifyResponse {
    success: bool,
    #[serde(default, rename = "error-codes")]
    error_codes: Vec<String>,
    #[serde(default)]
    hostname: Option<String>,
}

/// Map the provider's error-code list to a rejection reason.
///
/// The first recognized code wins.
pub fn reason_from_codes(codes: &[String]) -> RejectionReason {
    codes
        .iter()
        .find_map(|code| match code.as_str() {
            "missing-input-secret" | "invalid-input-secret" => {
                Some(RejectionReason::MisconfiguredSecret)
            }
            "missing-input-response" | "invalid-input-response" => {
                Some(RejectionReason::InvalidToken)
            }
            "bad-request" => Some(RejectionReason::MalformedRequest),
            "timeout-or-duplicate" => Some(RejectionReason::ExpiredOrDuplicate),
            _ => None,
        })
        .unwrap_or_else(|| RejectionReason::Unspecified {
            codes: codes.to_vec(),
        })
}

#[async_trait]
impl Verifier for SharedSecretVerifier {
    fn mechanism(&self) -> Mechanism {
        Mechanism::SharedSecret
    }

    async fn verify(
        &self,
        token: &str,
        _action: &str,
        _min_score: f64,
    ) -> Result<VerificationResult, VerifierError> {
        let response = self
            .http_client
            .post(&self.verify_url)
            .form(&[("secret", self.secret.as_str()), ("response", token)])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let verdict: SiteVerifyResponse = response.json().await?;

        if verdict.success {
            tracing::debug!(hostname = ?verdict.hostname, "Shared-secret verification passed");
            return Ok(VerificationResult::accepted(Some(1.0)));
        }

        let reason = reason_from_codes(&verdict.error_codes);
        tracing::warn!(codes = ?verdict.error_codes, "Shared-secret verification rejected");
        Ok(VerificationResult::rejected(Some(0.0), reason))
    }
}
