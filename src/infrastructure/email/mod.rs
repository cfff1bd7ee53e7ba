//! Order emails via the Resend HTTP API

pub mod templates;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::application::errors::EmailError;
use crate::domain::entities::{Order, OrderStatus};
use crate::domain::traits::EmailService;
use crate::infrastructure::adapters::http_client;
use crate::infrastructure::config::EmailConfig;

use templates::EmailContent;

const RESEND_URL: &str = "https://api.resend.com/emails";

#[derive(Debug, Serialize)]
struct SendEmailRequest<'a> {
    from: String,
    to: [&'a str; 1],
    subject: &'a str,
    html: &'a str,
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
struct ResendError {
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ResendSent {
    id: String,
}

fn recipient(order: &Order) -> Result<&str, EmailError> {
    order.customer().email().ok_or(EmailError::MissingRecipient)
}

pub struct ResendEmailService {
    config: EmailConfig,
    client: Client,
}

impl ResendEmailService {
    pub fn new(config: EmailConfig) -> Result<Self, EmailError> {
        if !config.is_enabled() {
            return Err(EmailError::Config("resend-api-key is not set".to_string()));
        }
        let client = http_client().map_err(|e| EmailError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    async fn send(&self, to: &str, content: &EmailContent) -> Result<(), EmailError> {
        let request = SendEmailRequest {
            from: self.config.from_header(),
            to: [to],
            subject: &content.subject,
            html: &content.html,
            text: &content.text,
        };

        let response = self
            .client
            .post(RESEND_URL)
            .bearer_auth(&self.config.resend_api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| EmailError::Network(e.to_string()))?;

        if !status.is_success() {
            let error: ResendError = serde_json::from_str(&body).unwrap_or_default();
            return Err(EmailError::Api {
                code: status.as_u16(),
                description: error.message.unwrap_or(body),
            });
        }

        if let Ok(sent) = serde_json::from_str::<ResendSent>(&body) {
            tracing::debug!(email_id = %sent.id, "Email accepted by Resend");
        }
        Ok(())
    }
}

#[async_trait]
impl EmailService for ResendEmailService {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let to = recipient(order)?;
        self.send(to, &templates::order_confirmation(order)).await
    }

    async fn send_order_status_update(&self, order: &Order, new_status: OrderStatus) -> Result<(), EmailError> {
        let to = recipient(order)?;
        self.send(to, &templates::status_update(order, new_status)).await
    }
}

/// Logs emails instead of sending them; used when no provider is configured
#[derive(Debug, Default)]
pub struct LogEmailService;

#[async_trait]
impl EmailService for LogEmailService {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError> {
        let to = recipient(order)?;
        let content = templates::order_confirmation(order);
        tracing::info!(to = %to, subject = %content.subject, "Email not sent (no provider configured)");
        Ok(())
    }

    async fn send_order_status_update(&self, order: &Order, new_status: OrderStatus) -> Result<(), EmailError> {
        let to = recipient(order)?;
        let content = templates::status_update(order, new_status);
        tracing::info!(to = %to, subject = %content.subject, "Email not sent (no provider configured)");
        Ok(())
    }
}
