//! ChatGuru adapter

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use super::http_client;
use crate::application::errors::MessagingError;
use crate::domain::traits::{ChatMessenger, DeliveryReport, OutboundMessage};
use crate::infrastructure::config::ChatGuruConfig;

/// Body returned by the ChatGuru API. Every field may be missing on errors.
#[derive(Debug, Default, Deserialize)]
struct ApiResponse {
    code: Option<u16>,
    result: Option<String>,
    description: Option<String>,
    message_id: Option<String>,
    message_status: Option<String>,
}

impl ApiResponse {
    fn into_report(self) -> DeliveryReport {
        DeliveryReport {
            code: self.code.unwrap_or(500),
            result: self.result.unwrap_or_else(|| "error".to_string()),
            description: self
                .description
                .unwrap_or_else(|| "Erro desconhecido".to_string()),
            message_id: self.message_id,
            message_status: self.message_status,
        }
    }
}

/// WhatsApp delivery through ChatGuru's form-encoded action API
pub struct ChatGuruMessenger {
    config: ChatGuruConfig,
    client: Client,
}

impl ChatGuruMessenger {
    pub fn new(config: ChatGuruConfig) -> Result<Self, MessagingError> {
        let client = http_client().map_err(|e| MessagingError::Config(e.to_string()))?;
        Ok(Self { config, client })
    }

    fn credentials(&self, action: &str) -> Vec<(&'static str, String)> {
        vec![
            ("key", self.config.api_key.clone()),
            ("account_id", self.config.account_id.clone()),
            ("phone_id", self.config.phone_id.clone()),
            ("action", action.to_string()),
        ]
    }

    fn send_form(&self, message: &OutboundMessage) -> Vec<(&'static str, String)> {
        let mut form = self.credentials("message_send");
        form.push(("chat_number", message.chat_number.clone()));
        form.push(("text", message.text.clone()));
        if let Some(date) = &message.send_date {
            form.push(("send_date", date.clone()));
        }
        form
    }

    fn status_form(&self, message_id: &str) -> Vec<(&'static str, String)> {
        let mut form = self.credentials("message_status");
        form.push(("message_id", message_id.to_string()));
        form
    }

    async fn post(&self, form: &[(&'static str, String)]) -> Result<DeliveryReport, MessagingError> {
        let response = self
            .client
            .post(&self.config.api_url)
            .form(form)
            .send()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| MessagingError::Network(e.to_string()))?;

        Ok(report_from(status.as_u16(), &body))
    }
}

/// Build a report from an HTTP status and raw body. Non-2xx statuses keep
/// the HTTP code and the provider's description when there is one.
fn report_from(status: u16, body: &str) -> DeliveryReport {
    let parsed: ApiResponse = serde_json::from_str(body).unwrap_or_default();

    if (200..300).contains(&status) {
        return parsed.into_report();
    }

    DeliveryReport {
        code: status,
        result: "error".to_string(),
        description: parsed
            .description
            .unwrap_or_else(|| format!("HTTP {}", status)),
        message_id: None,
        message_status: None,
    }
}

#[async_trait]
impl ChatMessenger for ChatGuruMessenger {
    async fn send_message(&self, message: &OutboundMessage) -> Result<DeliveryReport, MessagingError> {
        tracing::debug!(chat_number = %message.chat_number, "Sending ChatGuru message");
        self.post(&self.send_form(message)).await
    }

    async fn get_message_status(&self, message_id: &str) -> Result<DeliveryReport, MessagingError> {
        self.post(&self.status_form(message_id)).await
    }

    fn provider(&self) -> &str {
        "chatguru"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messenger() -> ChatGuruMessenger {
        ChatGuruMessenger::new(ChatGuruConfig {
            api_url: "https://chatguru.example/api/v1".to_string(),
            api_key: "KEY".to_string(),
            account_id: "ACC".to_string(),
            phone_id: "PHONE".to_string(),
        })
        .unwrap()
    }

    fn field<'a>(form: &'a [(&'static str, String)], name: &str) -> Option<&'a str> {
        form.iter().find(|(k, _)| *k == name).map(|(_, v)| v.as_str())
    }

    #[test]
    fn test_send_form() {
        let form = messenger().send_form(&OutboundMessage::new("5511999999999", "Olá"));
        assert_eq!(field(&form, "action"), Some("message_send"));
        assert_eq!(field(&form, "key"), Some("KEY"));
        assert_eq!(field(&form, "account_id"), Some("ACC"));
        assert_eq!(field(&form, "phone_id"), Some("PHONE"));
        assert_eq!(field(&form, "chat_number"), Some("5511999999999"));
        assert_eq!(field(&form, "text"), Some("Olá"));
        assert_eq!(field(&form, "send_date"), None);
    }

    #[test]
    fn test_scheduled_send_form() {
        let message = OutboundMessage::new("5511999999999", "Lembrete").scheduled_at("2024-05-01 10:00");
        let form = messenger().send_form(&message);
        assert_eq!(field(&form, "send_date"), Some("2024-05-01 10:00"));
    }

    #[test]
    fn test_status_form() {
        let form = messenger().status_form("abc123");
        assert_eq!(field(&form, "action"), Some("message_status"));
        assert_eq!(field(&form, "message_id"), Some("abc123"));
    }

    #[test]
    fn test_report_from_success_body() {
        let body = r#"{"code":201,"result":"success","description":"Mensagem agendada","message_id":"m1","message_status":"pending"}"#;
        let report = report_from(200, body);
        assert!(report.is_success());
        assert_eq!(report.code, 201);
        assert_eq!(report.message_id.as_deref(), Some("m1"));
        assert_eq!(report.message_status.as_deref(), Some("pending"));
    }

    #[test]
    fn test_report_from_empty_body() {
        let report = report_from(200, "");
        assert!(!report.is_success());
        assert_eq!(report.code, 500);
        assert_eq!(report.description, "Erro desconhecido");
    }

    #[test]
    fn test_report_from_http_error() {
        let report = report_from(401, r#"{"description":"Chave inválida"}"#);
        assert_eq!(report.code, 401);
        assert_eq!(report.result, "error");
        assert_eq!(report.description, "Chave inválida");

        let report = report_from(502, "<html>bad gateway</html>");
        assert_eq!(report.description, "HTTP 502");
    }
}
