//! Lead intake workflow
//!
//! `submit` runs a public form submission through, in order:
//!
//! 1. structural validation (no external calls)
//! 2. store availability check (fast fail, no retry)
//! 3. verification with the single mechanism resolved at startup
//! 4. persistence
//! 5. best-effort notification fan-out, dispatched without awaiting
//!
//! Any failure in 1-4 short-circuits everything after it.

use std::sync::Arc;

use tokio::task::JoinHandle;

use crate::config::{
    IntakeConfig, NotificationConfig, VerificationConfig, VerificationPolicy, DEFAULT_ACTION,
    DEFAULT_MIN_SCORE,
};
use crate::error::{
    IntakeError, NotificationError, ReplyError, Result, StoreError, ValidationError,
};
use crate::lead::{Lead, LeadId, LeadSubmission};
use crate::notify::Notifications;
use crate::store::LeadStore;
use crate::verification::{resolve_verifier, RejectionReason, Verifier, VerifierError};

/// Subject used when an operator reply does not set one
pub const DEFAULT_REPLY_SUBJECT: &str = "Re: your TwoLifeCar inquiry";

pub struct LeadIntake {
    config: IntakeConfig,
    action: String,
    min_score: f64,
    store: Arc<dyn LeadStore>,
    verifier: Option<Arc<dyn Verifier>>,
    notifications: Notifications,
}

impl std::fmt::Debug for LeadIntake {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LeadIntake")
            .field("action", &self.action)
            .field("min_score", &self.min_score)
            .field("policy", &self.config.verification_policy)
            .field("mechanism", &self.verifier.as_ref().map(|v| v.mechanism()))
            .field("notifications", &self.notifications)
            .finish_non_exhaustive()
    }
}

impl LeadIntake {
    /// Workflow with no verifier and no notification targets
    pub fn new(store: Arc<dyn LeadStore>, config: IntakeConfig) -> Self {
        Self {
            config,
            action: DEFAULT_ACTION.to_string(),
            min_score: DEFAULT_MIN_SCORE,
            store,
            verifier: None,
            notifications: Notifications::new(),
        }
    }

    /// Resolve the verifier and notification targets from configuration
    pub fn from_config(
        store: Arc<dyn LeadStore>,
        intake: IntakeConfig,
        verification: &VerificationConfig,
        notification: &NotificationConfig,
        http_client: reqwest::Client,
    ) -> Self {
        let mut workflow = Self::new(store, intake)
            .with_action(verification.action.clone())
            .with_min_score(verification.min_score)
            .with_notifications(Notifications::from_config(notification, http_client.clone()));

        if let Some(verifier) = resolve_verifier(verification, http_client) {
            workflow = workflow.with_verifier(verifier);
        }
        workflow
    }

    pub fn with_verifier(mut self, verifier: Arc<dyn Verifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    pub fn with_notifications(mut self, notifications: Notifications) -> Self {
        self.notifications = notifications;
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = action.into();
        self
    }

    pub fn with_min_score(mut self, min_score: f64) -> Self {
        self.min_score = min_score;
        self
    }

    pub fn store(&self) -> &Arc<dyn LeadStore> {
        &self.store
    }

    pub fn verifier(&self) -> Option<&Arc<dyn Verifier>> {
        self.verifier.as_ref()
    }

    pub fn notifications(&self) -> &Notifications {
        &self.notifications
    }

    pub fn config(&self) -> &IntakeConfig {
        &self.config
    }

    /// Accept a public submission and return the stored lead.
    ///
    /// Notifications run on a background task; their outcome never reaches
    /// the caller.
    pub async fn submit(&self, submission: LeadSubmission) -> Result<Lead> {
        let (lead, _notifications) = self.submit_and_dispatch(submission).await?;
        Ok(lead)
    }

    /// Same as [`submit`](Self::submit) but hands back the fan-out task
    pub async fn submit_and_dispatch(
        &self,
        submission: LeadSubmission,
    ) -> Result<(Lead, JoinHandle<()>)> {
        let fields = submission.validate().map_err(|e| {
            tracing::info!(field = e.field(), "Submission rejected: {}", e);
            e
        })?;

        if !self.store.is_available().await {
            tracing::error!("Lead store unavailable, refusing submission");
            return Err(IntakeError::DependencyUnavailable(
                "lead store is not connected".to_string(),
            ));
        }

        self.verify(&submission).await?;

        let lead = self.store.create(Lead::create(fields)).await.map_err(|e| {
            tracing::error!("Failed to store lead: {}", e);
            IntakeError::Storage(e)
        })?;
        tracing::info!(lead_id = %lead.id, "Lead stored");

        let notifications = self.notifications.dispatch(lead.clone());
        Ok((lead, notifications))
    }

    async fn verify(&self, submission: &LeadSubmission) -> Result<()> {
        let token = submission.token();

        if self.config.is_bypass(token) {
            tracing::warn!("Bypass token presented, skipping verification");
            return Ok(());
        }

        let Some(verifier) = &self.verifier else {
            return match self.config.verification_policy {
                VerificationPolicy::FailOpen => {
                    if token.is_some() {
                        tracing::error!(
                            "Verification token supplied but no mechanism is configured; accepting unverified"
                        );
                    } else {
                        tracing::warn!("No verification mechanism configured; accepting unverified");
                    }
                    Ok(())
                }
                VerificationPolicy::FailClosed => {
                    tracing::error!("No verification mechanism configured; refusing submission");
                    Err(IntakeError::VerificationUnavailable(
                        VerifierError::NotConfigured,
                    ))
                }
            };
        };

        let token = token.ok_or(ValidationError::MissingToken)?;
        let mechanism = verifier.mechanism();

        let result = verifier
            .verify(token, &self.action, self.min_score)
            .await
            .map_err(|e| {
                tracing::error!(provider = %mechanism, "Verification provider failed: {}", e);
                IntakeError::VerificationUnavailable(e)
            })?;

        if result.accepted {
            tracing::info!(provider = %mechanism, score = ?result.score, "Verification passed");
            return Ok(());
        }

        let reason = result
            .reason
            .unwrap_or(RejectionReason::Unspecified { codes: Vec::new() });
        tracing::warn!(provider = %mechanism, reason = ?reason, "Verification rejected");
        Err(IntakeError::Verification(reason))
    }

    /// All leads, newest first
    pub async fn list(&self) -> std::result::Result<Vec<Lead>, StoreError> {
        self.store.list().await
    }

    /// Remove a lead; unknown ids are not an error
    pub async fn delete(&self, id: &LeadId) -> std::result::Result<bool, StoreError> {
        let removed = self.store.delete_by_id(id).await?;
        if removed {
            tracing::info!(lead_id = %id, "Lead deleted");
        } else {
            tracing::debug!(lead_id = %id, "Delete of unknown lead");
        }
        Ok(removed)
    }

    /// Email an operator reply to the lead's author
    pub async fn reply(
        &self,
        id: &LeadId,
        subject: Option<&str>,
        body: &str,
    ) -> std::result::Result<Lead, ReplyError> {
        let lead = self
            .store
            .get(id)
            .await?
            .ok_or_else(|| ReplyError::LeadNotFound(id.to_string()))?;

        let mailer = self
            .notifications
            .mailer()
            .ok_or(NotificationError::NotConfigured("email"))?;

        let subject = subject
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_REPLY_SUBJECT);

        mailer.send_reply(&lead, subject, body).await?;
        tracing::info!(lead_id = %lead.id, "Reply sent");
        Ok(lead)
    }
}
