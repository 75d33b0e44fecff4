//! Notification fan-out
//!
//! After a lead is stored, staff are pinged on the team chat channel and the
//! submitter gets a confirmation email. Both targets are optional, both are
//! best-effort, and neither can affect the other or the submission outcome.

pub mod email;
pub mod webhook;

use async_trait::async_trait;
use std::sync::Arc;
use tokio::task::JoinHandle;

use crate::config::NotificationConfig;
use crate::error::NotificationError;
use crate::lead::Lead;

pub use email::EmailClient;
pub use webhook::ChatWebhook;

/// Default embed color for custom messages
pub const DEFAULT_COLOR: u32 = 0x0099ff;

/// Team chat channel
#[async_trait]
pub trait TeamChannel: Send + Sync {
    /// Post a summary of a new lead
    async fn send_lead(&self, lead: &Lead) -> Result<(), NotificationError>;

    /// Post an arbitrary titled message
    async fn send_custom(
        &self,
        title: &str,
        description: &str,
        color: u32,
    ) -> Result<(), NotificationError>;
}

/// Email delivery to lead authors
#[async_trait]
pub trait LeadMailer: Send + Sync {
    /// "We got your message" confirmation
    async fn send_confirmation(&self, lead: &Lead) -> Result<(), NotificationError>;

    /// Operator reply to a lead
    async fn send_reply(
        &self,
        lead: &Lead,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError>;
}

/// Configured notification targets
#[derive(Clone, Default)]
pub struct Notifications {
    team: Option<Arc<dyn TeamChannel>>,
    mailer: Option<Arc<dyn LeadMailer>>,
}

impl std::fmt::Debug for Notifications {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Notifications")
            .field("team", &self.team.is_some())
            .field("mailer", &self.mailer.is_some())
            .finish()
    }
}

impl Notifications {
    /// No targets
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_team(mut self, team: Arc<dyn TeamChannel>) -> Self {
        self.team = Some(team);
        self
    }

    pub fn with_mailer(mut self, mailer: Arc<dyn LeadMailer>) -> Self {
        self.mailer = Some(mailer);
        self
    }

    /// Build the targets the configuration enables
    pub fn from_config(config: &NotificationConfig, http_client: reqwest::Client) -> Self {
        let mut notifications = Self::new();

        if let Some(webhook) = ChatWebhook::from_config(config, http_client.clone()) {
            notifications = notifications.with_team(Arc::new(webhook));
        } else {
            tracing::info!("Team chat webhook not configured");
        }

        if let Some(email) = EmailClient::from_config(config, http_client) {
            notifications = notifications.with_mailer(Arc::new(email));
        } else {
            tracing::info!("Email provider not configured");
        }

        notifications
    }

    pub fn team(&self) -> Option<&Arc<dyn TeamChannel>> {
        self.team.as_ref()
    }

    pub fn mailer(&self) -> Option<&Arc<dyn LeadMailer>> {
        self.mailer.as_ref()
    }

    /// Best-effort team ping. Failures are logged, never returned.
    pub async fn notify_team(&self, lead: &Lead) {
        let Some(team) = &self.team else {
            tracing::debug!(lead_id = %lead.id, "Team channel not configured, skipping");
            return;
        };

        match team.send_lead(lead).await {
            Ok(()) => tracing::info!(lead_id = %lead.id, "Team notified"),
            Err(e) => tracing::error!(lead_id = %lead.id, "Team notification failed: {}", e),
        }
    }

    /// Best-effort confirmation email. Failures are logged, never returned.
    pub async fn notify_lead_author(&self, lead: &Lead) {
        let Some(mailer) = &self.mailer else {
            tracing::debug!(lead_id = %lead.id, "Email provider not configured, skipping");
            return;
        };

        match mailer.send_confirmation(lead).await {
            Ok(()) => tracing::info!(lead_id = %lead.id, "Confirmation email sent"),
            Err(e) => tracing::error!(lead_id = %lead.id, "Confirmation email failed: {}", e),
        }
    }

    /// Fire both notifications on a background task.
    ///
    /// The caller does not need to await the handle; it is returned so tests
    /// and shutdown paths can join it.
    pub fn dispatch(&self, lead: Lead) -> JoinHandle<()> {
        let notifications = self.clone();
        tokio::spawn(async move {
            futures::join!(
                notifications.notify_team(&lead),
                notifications.notify_lead_author(&lead)
            );
        })
    }
}
