//! Twilio WhatsApp adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_client;
use crate::application::errors::MessagingError;
use crate::domain::traits::{ChatMessenger, DeliveryReport, OutboundMessage};
use crate::infrastructure::config::TwilioConfig;

/// Twilio REST API base URL
const API_BASE: &str = "https://api.twilio.com/2010-04-01";

#[derive(Debug, Deserialize)]
struct MessageResource {
    sid: String,
    status: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ApiError {
    message: Option<String>,
}

pub struct TwilioMessenger {
    config: TwilioConfig,
    client: Client,
}

impl TwilioMessenger {
    pub fn new(config: TwilioConfig) -> Result<Self, MessagingError> {
        let client = http_client().map_err(|e| MessagingError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/Accounts/{}/Messages.json", API_BASE, self.config.account_sid)
    }

    fn message_url(&self, sid: &str) -> String {
        format!("{}/Accounts/{}/Messages/{}.json", API_BASE, self.config.account_sid, sid)
    }

    fn send_form(&self, message: &OutboundMessage) -> Vec<(&'static str, String)> {
        vec![
            ("From", whatsapp_address(&self.config.phone_number)),
            ("To", whatsapp_address(&message.chat_number)),
            ("Body", message.text.clone()),
        ]
    }

    async fn read_report(
        response: reqwest::Response,
        success: &str,
    ) -> Result<DeliveryReport, MessagingError> {
        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;

        if !status.is_success() {
            let error: ApiError = serde_json::from_str(&body).unwrap_or_default();
            return Ok(DeliveryReport {
                code: status.as_u16(),
                result: "error".to_string(),
                description: error.message.unwrap_or_else(|| format!("HTTP {}", status.as_u16())),
                message_id: None,
                message_status: None,
            });
        }

        let resource: MessageResource =
            serde_json::from_str(&body).map_err(|e| MessagingError::Parse(e.to_string()))?;

        let mut report = DeliveryReport::success(success).with_message_id(resource.sid);
        if let Some(s) = resource.status {
            report = report.with_status(s);
        }
        Ok(report)
    }
}

/// `whatsapp:+<digits>`; WhatsApp ids arrive without the leading `+`
fn whatsapp_address(number: &str) -> String {
    let number = number.trim();
    let number = number.strip_prefix("whatsapp:").unwrap_or(number);
    if number.starts_with('+') {
        format!("whatsapp:{}", number)
    } else {
        format!("whatsapp:+{}", number)
    }
}

#[async_trait]
impl ChatMessenger for TwilioMessenger {
    async fn send_message(&self, message: &OutboundMessage) -> Result<DeliveryReport, MessagingError> {
        tracing::debug!(chat_number = %message.chat_number, "Sending Twilio message");

        let response = self
            .client
            .post(self.messages_url())
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .form(&self.send_form(message))
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;

        Self::read_report(response, "Mensagem enviada com sucesso").await
    }

    async fn get_message_status(&self, message_id: &str) -> Result<DeliveryReport, MessagingError> {
        let response = self
            .client
            .get(self.message_url(message_id))
            .basic_auth(&self.config.account_sid, Some(&self.config.auth_token))
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;

        Self::read_report(response, "Status consultado com sucesso").await
    }

    fn provider(&self) -> &str {
        "twilio"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messenger() -> TwilioMessenger {
        TwilioMessenger::new(TwilioConfig {
            account_sid: "AC123".to_string(),
            auth_token: "token".to_string(),
            phone_number: "+14155238886".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_whatsapp_address() {
        assert_eq!(whatsapp_address("5511999999999"), "whatsapp:+5511999999999");
        assert_eq!(whatsapp_address("+14155238886"), "whatsapp:+14155238886");
        assert_eq!(whatsapp_address("whatsapp:+5511999999999"), "whatsapp:+5511999999999");
    }

    #[test]
    fn test_urls() {
        let m = messenger();
        assert_eq!(
            m.messages_url(),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages.json"
        );
        assert_eq!(
            m.message_url("SM1"),
            "https://api.twilio.com/2010-04-01/Accounts/AC123/Messages/SM1.json"
        );
    }

    #[test]
    fn test_send_form() {
        let form = messenger().send_form(&OutboundMessage::new("5511999999999", "Pedido confirmado"));
        assert_eq!(
            form,
            vec![
                ("From", "whatsapp:+14155238886".to_string()),
                ("To", "whatsapp:+5511999999999".to_string()),
                ("Body", "Pedido confirmado".to_string()),
            ]
        );
    }
}
