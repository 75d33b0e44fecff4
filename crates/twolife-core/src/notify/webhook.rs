//! Team chat webhook (Discord-style embeds)

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;

use super::TeamChannel;
use crate::config::NotificationConfig;
use crate::error::NotificationError;
use crate::lead::Lead;

/// Embed color for new-lead messages
pub const LEAD_COLOR: u32 = 0x00ff00;

/// Embed field values are capped by the chat provider
const MAX_FIELD_LEN: usize = 1024;

#[derive(Debug, Serialize)]
pub(crate) struct WebhookPayload {
    content: String,
    embeds: Vec<Embed>,
}

#[derive(Debug, Serialize)]
struct Embed {
    title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    description: Option<String>,
    color: u32,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    fields: Vec<EmbedField>,
    timestamp: DateTime<Utc>,
    footer: EmbedFooter,
}

#[derive(Debug, Serialize)]
struct EmbedField {
    name: String,
    value: String,
    inline: bool,
}

#[derive(Debug, Serialize)]
struct EmbedFooter {
    text: String,
}

#[derive(Clone)]
pub struct ChatWebhook {
    url: String,
    brand: String,
    http_client: reqwest::Client,
}

impl std::fmt::Debug for ChatWebhook {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // The webhook URL embeds its own secret
        f.debug_struct("ChatWebhook")
            .field("brand", &self.brand)
            .finish_non_exhaustive()
    }
}

impl ChatWebhook {
    pub fn new(url: impl Into<String>, brand: impl Into<String>, http_client: reqwest::Client) -> Self {
        Self {
            url: url.into(),
            brand: brand.into(),
            http_client,
        }
    }

    pub fn from_config(config: &NotificationConfig, http_client: reqwest::Client) -> Option<Self> {
        if !config.has_chat_webhook() {
            return None;
        }
        let url = config.chat_webhook_url.clone()?;
        Some(Self::new(url, config.brand.clone(), http_client))
    }

    pub(crate) fn lead_payload(&self, lead: &Lead) -> WebhookPayload {
        WebhookPayload {
            content: String::new(),
            embeds: vec![Embed {
                title: format!("🚗 New lead for {}", self.brand),
                description: None,
                color: LEAD_COLOR,
                fields: vec![
                    field("Name", &lead.name, true),
                    field("Email", &lead.email, true),
                    field("Message", &lead.message, false),
                ],
                timestamp: lead.created_at,
                footer: EmbedFooter {
                    text: format!("{} CRM", self.brand),
                },
            }],
        }
    }

    pub(crate) fn custom_payload(&self, title: &str, description: &str, color: u32) -> WebhookPayload {
        WebhookPayload {
            content: String::new(),
            embeds: vec![Embed {
                title: title.to_string(),
                description: Some(description.to_string()),
                color,
                fields: Vec::new(),
                timestamp: Utc::now(),
                footer: EmbedFooter {
                    text: format!("{} CRM", self.brand),
                },
            }],
        }
    }

    async fn post(&self, payload: &WebhookPayload) -> Result<(), NotificationError> {
        let response = self
            .http_client
            .post(&self.url)
            .json(payload)
            .send()
            .await
            .map_err(|e| NotificationError::Transport(e.without_url()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NotificationError::Rejected {
                channel: "chat",
                status: status.as_u16(),
                body,
            });
        }
        Ok(())
    }
}

fn field(name: &str, value: &str, inline: bool) -> EmbedField {
    let value = if value.chars().count() > MAX_FIELD_LEN {
        let mut cut: String = value.chars().take(MAX_FIELD_LEN - 3).collect();
        cut.push_str("...");
        cut
    } else {
        value.to_string()
    };
    EmbedField {
        name: name.to_string(),
        value,
        inline,
    }
}

#[async_trait]
impl TeamChannel for ChatWebhook {
    async fn send_lead(&self, lead: &Lead) -> Result<(), NotificationError> {
        self.post(&self.lead_payload(lead)).await
    }

    async fn send_custom(
        &self,
        title: &str,
        description: &str,
        color: u32,
    ) -> Result<(), NotificationError> {
        self.post(&self.custom_payload(title, description, color)).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lead::LeadFields;

    fn webhook() -> ChatWebhook {
        ChatWebhook::new("https://chat.example/hook/secret", "TwoLifeCar", reqwest::Client::new())
    }

    #[test]
    fn test_lead_payload_shape() {
        let lead = Lead::create(LeadFields {
            name: "Juan".into(),
            email: "juan@example.com".into(),
            message: "Hola".into(),
        });
        let json = serde_json::to_value(webhook().lead_payload(&lead)).unwrap();
        let embed = &json["embeds"][0];

        assert_eq!(embed["color"], LEAD_COLOR);
        assert_eq!(embed["fields"][0]["value"], "Juan");
        assert_eq!(embed["fields"][1]["value"], "juan@example.com");
        assert_eq!(embed["footer"]["text"], "TwoLifeCar CRM");
        assert!(embed.get("description").is_none());
    }

    #[test]
    fn test_long_message_truncated() {
        let long = "x".repeat(3000);
        let f = field("Message", &long, false);
        assert_eq!(f.value.chars().count(), MAX_FIELD_LEN);
        assert!(f.value.ends_with("..."));
    }

    #[test]
    fn test_custom_payload() {
        let json =
            serde_json::to_value(webhook().custom_payload("Ping", "hello", 0x0099ff)).unwrap();
        assert_eq!(json["embeds"][0]["title"], "Ping");
        assert_eq!(json["embeds"][0]["description"], "hello");
        assert_eq!(json["embeds"][0]["color"], 0x0099ff);
    }

    #[test]
    fn test_debug_hides_url() {
        assert!(!format!("{:?}", webhook()).contains("secret"));
    }
}
