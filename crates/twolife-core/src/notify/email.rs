//! Transactional email over an HTTP API (Resend-compatible)

use async_trait::async_trait;
use serde::Serialize;

use super::LeadMailer;
use crate::config::NotificationConfig;
use crate::error::NotificationError;
use crate::lead::Lead;

#[derive(Debug, Serialize)]
pub(crate) struct EmailMessage {
    from: String,
    to: Vec<String>,
    subject: String,
    text: String,
}

#[derive(Clone)]
pub struct EmailClient {
    api_url: String,
    api_key: String,
    from: String,
    brand: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for EmailClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailClient")
            .field("api_url", &self.api_url)
            .field("from", &self.from)
            .finish_non_exhaustive()
    }
}

impl EmailClient {
    pub fn new(
        api_url: impl Into<String>,
        api_key: impl Into<String>,
        from: impl Into<String>,
        brand: impl Into<String>,
        http_client: reqwest::Client,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            api_key: api_key.into(),
            from: from.into(),
            brand: brand.into(),
            http_client,
        }
    }

    pub fn from_config(config: &NotificationConfig, http_client: reqwest::Client) -> Option<Self> {
        if !config.has_email() {
            return None;
        }
        Some(Self::new(
            config.email_api_url.clone(),
            config.email_api_key.clone()?,
            config.email_from.clone()?,
            config.brand.clone(),
            http_client,
        ))
    }

    pub(crate) fn confirmation(&self, lead: &Lead) -> EmailMessage {
        let text = format!(
            "Hi {name},\n\n\
             Thanks for contacting {brand}. We received your message and \
             someone from the team will get back to you shortly.\n\n\
             Your message:\n{message}\n\n\
             The {brand} team",
            name = lead.name,
            brand = self.brand,
            message = lead.message,
        );
        EmailMessage {
            from: self.from.clone(),
            to: vec![lead.email.clone()],
            subject: format!("We received your message | {}", self.brand),
            text,
        }
    }

    pub(crate) fn reply(&self, lead: &Lead, subject: &str, body: &str) -> EmailMessage {
        EmailMessage {
            from: self.from.clone(),
            to: vec![lead.email.clone()],
            subject: subject.to_string(),
            text: body.to_string(),
        }
    }

    async fn send(&self, message: &EmailMessage) -> Result<(), NotificationError> {
        let response = self
            .http_client
            .post(&self.api_url)
            .bearer_auth(&self.api_key)
            .json(message)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                channel: "email",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl LeadMailer for EmailClient {
    async fn send_confirmation(&self, lead: &Lead) -> Result<(), NotificationError> {
        self.send(&self.confirmation(lead)).await
    }

    async fn send_reply(
        &self,
        lead: &Lead,
        subject: &str,
        body: &str,
    ) -> Result<(), NotificationError> {
        self.send(&self.reply(lead, subject, body)).await
    }
}
