use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize, PartialEq, Eq, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub read: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attachment_url: Option<String>,
}

/// Outgoing message as typed by the sender; the sender comes from the session.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageForm {
    pub receiver_id: String,
    pub content: String,
    #[serde(default)]
    pub attachment_url: Option<String>,
}

#[derive(Debug, Clone)]
pub struct NewMessage {
    pub sender_id: String,
    pub receiver_id: String,
    pub content: String,
    pub attachment_url: Option<String>,
}

impl NewMessage {
    pub fn parse(sender_id: &str, form: MessageForm) -> Result<Self, String> {
        let content = form.content.trim();
        if content.is_empty() {
            return Err("Message content cannot be empty".to_string());
        }
        Ok(Self {
            sender_id: sender_id.to_string(),
            receiver_id: form.receiver_id,
            content: content.to_string(),
            attachment_url: form.attachment_url.filter(|url| !url.trim().is_empty()),
        })
    }
}
