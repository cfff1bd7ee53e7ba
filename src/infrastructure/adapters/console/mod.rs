//! Console adapter for development/testing

use async_trait::async_trait;
use tokio::sync::mpsc;

use crate::application::errors::MessagingError;
use crate::domain::traits::{ChatMessenger, DeliveryReport, OutboundMessage};

/// Prints replies to stdout instead of sending them to WhatsApp
#[derive(Default)]
pub struct ConsoleMessenger {
    sender: Option<mpsc::UnboundedSender<OutboundMessage>>,
}

impl ConsoleMessenger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forward every message to `sender` as well as printing it
    pub fn with_sender(mut self, sender: mpsc::UnboundedSender<OutboundMessage>) -> Self {
        self.sender = Some(sender);
        self
    }
}

#[async_trait]
impl ChatMessenger for ConsoleMessenger {
    async fn send_message(&self, message: &OutboundMessage) -> Result<DeliveryReport, MessagingError> {
        println!("[BOT → {}]\n{}\n", message.chat_number, message.text);

        if let Some(sender) = &self.sender {
            sender
                .send(message.clone())
                .map_err(|e| MessagingError::Network(e.to_string()))?;
        }

        Ok(DeliveryReport::success("Mensagem exibida no console")
            .with_message_id(uuid::Uuid::new_v4().to_string()))
    }

    async fn get_message_status(&self, message_id: &str) -> Result<DeliveryReport, MessagingError> {
        Ok(DeliveryReport::success("Mensagem exibida no console")
            .with_message_id(message_id)
            .with_status("delivered"))
    }

    fn provider(&self) -> &str {
        "console"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_send_forwards_to_sender() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        let messenger = ConsoleMessenger::new().with_sender(tx);

        let report = messenger
            .send_message(&OutboundMessage::new("5511999999999", "Olá"))
            .await
            .unwrap();
        assert!(report.is_success());
        assert!(report.message_id.is_some());

        let forwarded = rx.recv().await.unwrap();
        assert_eq!(forwarded.text, "Olá");
    }

    #[tokio::test]
    async fn test_closed_sender_is_an_error() {
        let (tx, rx) = mpsc::unbounded_channel();
        drop(rx);
        let messenger = ConsoleMessenger::new().with_sender(tx);

        let result = messenger
            .send_message(&OutboundMessage::new("5511999999999", "Olá"))
            .await;
        assert!(matches!(result, Err(MessagingError::Network(_))));
    }

    #[tokio::test]
    async fn test_status_is_delivered() {
        let report = ConsoleMessenger::new().get_message_status("m1").await.unwrap();
        assert_eq!(report.message_status.as_deref(), Some("delivered"));
    }
}
