use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::application::errors::MessagingError;

/// Text message addressed to a customer's chat
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    pub chat_number: String,
    pub text: String,
    pub send_date: Option<String>,
}

impl OutboundMessage {
    pub fn new(chat_number: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            chat_number: chat_number.into(),
            text: text.into(),
            send_date: None,
        }
    }

    pub fn scheduled_at(mut self, send_date: impl Into<String>) -> Self {
        self.send_date = Some(send_date.into());
        self
    }
}

/// Provider answer for a send or status request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeliveryReport {
    pub code: u16,
    pub result: String,
    pub description: String,
    pub message_id: Option<String>,
    pub message_status: Option<String>,
}

impl DeliveryReport {
    pub fn success(description: impl Into<String>) -> Self {
        Self {
            code: 200,
            result: "success".to_string(),
            description: description.into(),
            message_id: None,
            message_status: None,
        }
    }

    pub fn with_message_id(mut self, id: impl Into<String>) -> Self {
        self.message_id = Some(id.into());
        self
    }

    pub fn with_status(mut self, status: impl Into<String>) -> Self {
        self.message_status = Some(status.into());
        self
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.code) && self.result != "error"
    }
}

/// Outbound chat transport (WhatsApp provider, console, ...)
#[async_trait]
pub trait ChatMessenger: Send + Sync {
    async fn send_message(&self, message: &OutboundMessage) -> Result<DeliveryReport, MessagingError>;

    async fn get_message_status(&self, message_id: &str) -> Result<DeliveryReport, MessagingError>;

    /// Provider name for logs
    fn provider(&self) -> &str;
}
