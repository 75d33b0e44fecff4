//! Risk-scored assessment mechanism
//!
//! Files an assessment for `{token, siteKey, expectedAction}` under the
//! configured project and judges the returned token properties and score.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::{Mechanism, RejectionReason, VerificationResult, Verifier, VerifierError};
use crate::config::VerificationConfig;

#[derive(Clone)]
pub struct RiskAssessmentVerifier {
    project_id: String,
    site_key: String,
    api_key: String,
    base_url: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for RiskAssessmentVerifier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RiskAssessmentVerifier")
            .field("project_id", &self.project_id)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentRequest<'a> {
    event: AssessmentEvent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentEvent<'a> {
    token: &'a str,
    site_key: &'a str,
    expected_action: &'a str,
}

/// Subset of the assessment response this adapter reads
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssessmentResponse {
    #[serde(default)]
    pub token_properties: TokenProperties,
    #[serde(default)]
    pub risk_analysis: RiskAnalysis,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenProperties {
    #[serde(default)]
    pub valid: bool,
    #[serde(default)]
    pub invalid_reason: Option<String>,
    #[serde(default)]
    pub action: Option<String>,
    #[serde(default)]
    pub hostname: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiskAnalysis {
    #[serde(default)]
    pub score: f64,
    #[serde(default)]
    pub reasons: Vec<String>,
}

impl RiskAssessmentVerifier {
    pub fn new(
        project_id: impl Into<String>,
        site_key: impl Into<String>,
        api_key: impl Into<String>,
        base_url: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            project_id: project_id.into(),
            site_key: site_key.into(),
            api_key: api_key.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        }
    }

    pub fn from_config(config: &VerificationConfig, http_client: reqwest::Client) -> Option<Self> {
        if !config.has_risk_assessment() {
            return None;
        }
        Some(Self::new(
            config.project_id.clone()?,
            config.site_key.clone()?,
            config.api_key.clone()?,
            config.assessment_base_url.clone(),
            http_client,
        ))
    }

    fn endpoint(&self) -> String {
        format!("{}/v1/projects/{}/assessments", self.base_url, self.project_id)
    }
}

/// Judge an assessment: token validity, then action, then score.
pub fn evaluate(
    response: &AssessmentResponse,
    expected_action: &str,
    min_score: f64,
) -> VerificationResult {
    let props = &response.token_properties;
    if !props.valid {
        let invalid_reason = props
            .invalid_reason
            .clone()
            .unwrap_or_else(|| "INVALID_REASON_UNSPECIFIED".to_string());
        return VerificationResult::rejected(
            Some(0.0),
            RejectionReason::TokenInvalid { invalid_reason },
        );
    }

    let score = response.risk_analysis.score;
    let actual = props.action.clone().unwrap_or_default();
    if actual != expected_action {
        return VerificationResult::rejected(
            Some(score),
            RejectionReason::ActionMismatch {
                expected: expected_action.to_string(),
                actual,
            },
        );
    }

    if score < min_score {
        return VerificationResult::rejected(
            Some(score),
            RejectionReason::ScoreTooLow { score, min_score },
        );
    }

    VerificationResult::accepted(Some(score))
}

#[async_trait]
impl Verifier for RiskAssessmentVerifier {
    fn mechanism(&self) -> Mechanism {
        Mechanism::RiskAssessment
    }

    async fn verify(
        &self,
        token: &str,
        action: &str,
        min_score: f64,
    ) -> Result<VerificationResult, VerifierError> {
        let request = AssessmentRequest {
            event: AssessmentEvent {
                token,
                site_key: &self.site_key,
                expected_action: action,
            },
        };

        // The response is fully consumed here; no connection outlives the call.
        // The key rides in the query string, so errors drop the URL.
        let response = self
            .http_client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await
            .map_err(|e| VerifierError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(VerifierError::Provider {
                status: status.as_u16(),
                body,
            });
        }

        let assessment: AssessmentResponse = response
            .json()
            .await
            .map_err(|e| VerifierError::Transport(e.without_url()))?;
        if !assessment.risk_analysis.reasons.is_empty() {
            tracing::info!(reasons = ?assessment.risk_analysis.reasons, "Assessment risk reasons");
        }

        let result = evaluate(&assessment, action, min_score);
        tracing::debug!(
            accepted = result.accepted,
            score = ?result.score,
            hostname = ?assessment.token_properties.hostname,
            "Risk assessment evaluated"
        );
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(valid: bool, action: &str, score: f64) -> AssessmentResponse {
        AssessmentResponse {
            token_properties: TokenProperties {
                valid,
                invalid_reason: if valid { None } else { Some("EXPIRED".into()) },
                action: Some(action.to_string()),
                hostname: Some("twolifecar.com".into()),
            },
            risk_analysis: RiskAnalysis {
                score,
                reasons: vec![],
            },
        }
    }

    #[test]
    fn test_accepts_matching_action_above_threshold() {
        let result = evaluate(&response(true, "submit_lead", 0.9), "submit_lead", 0.5);
        assert!(result.accepted);
        assert_eq!(result.score, Some(0.9));
        assert!(result.reason.is_none());
    }

    #[test]
    fn test_score_equal_to_threshold_accepted() {
        assert!(evaluate(&response(true, "submit_lead", 0.5), "submit_lead", 0.5).accepted);
    }

    #[test]
    fn test_invalid_token_rejected() {
        let result = evaluate(&response(false, "submit_lead", 0.9), "submit_lead", 0.5);
        assert!(!result.accepted);
        assert_eq!(
            result.reason,
            Some(RejectionReason::TokenInvalid {
                invalid_reason: "EXPIRED".into()
            })
        );
    }

    #[test]
    fn test_action_mismatch_rejected() {
        let result = evaluate(&response(true, "login", 0.9), "submit_lead", 0.5);
        assert!(!result.accepted);
        assert!(matches!(
            result.reason,
            Some(RejectionReason::ActionMismatch { ref actual, .. }) if actual == "login"
        ));
    }

    #[test]
    fn test_low_score_rejected() {
        let result = evaluate(&response(true, "submit_lead", 0.2), "submit_lead", 0.5);
        assert!(!result.accepted);
        assert_eq!(result.score, Some(0.2));
        assert!(matches!(result.reason, Some(RejectionReason::ScoreTooLow { .. })));
    }

    #[test]
    fn test_response_parses_with_missing_sections() {
        let parsed: AssessmentResponse =
            serde_json::from_str(r#"{"tokenProperties":{"valid":false,"invalidReason":"MALFORMED"}}"#)
                .unwrap();
        assert!(!parsed.token_properties.valid);
        assert_eq!(parsed.risk_analysis.score, 0.0);
    }

    #[test]
    fn test_endpoint_and_debug() {
        let verifier = RiskAssessmentVerifier::new(
            "my-project",
            "site",
            "api-key-value",
            "https://assess.example/",
            reqwest::Client::new(),
        );
        assert_eq!(
            verifier.endpoint(),
            "https://assess.example/v1/projects/my-project/assessments"
        );
        assert!(!format!("{:?}", verifier).contains("api-key-value"));
    }
}
