use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};
use tracing::Instrument;

use crate::application::conversation::{ConversationFlow, Effect, Transition};
use crate::application::errors::{MessagingError, ProcessError};
use crate::domain::entities::ChatSession;
use crate::domain::traits::{ChatMessenger, ChatSessionRepository, EmailService, MenuRepository, OutboundMessage};

/// Idle time after which a session is discarded (30 minutes)
pub const DEFAULT_SESSION_TIMEOUT_MS: u64 = 30 * 60 * 1000;

/// One inbound chat message, already extracted from the transport payload
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProcessMessageRequest {
    pub phone_number: String,
    pub message: String,
}

impl ProcessMessageRequest {
    pub fn new(phone_number: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            phone_number: phone_number.into(),
            message: message.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProcessMessageResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ProcessMessageResponse {
    fn ok(response: String) -> Self {
        Self {
            success: true,
            response: Some(response),
            error: None,
        }
    }

    fn failed(error: String) -> Self {
        Self {
            success: false,
            response: None,
            error: Some(error),
        }
    }
}

/// Serializes turns per phone number; different numbers never wait on each other.
#[derive(Default)]
struct TurnLocks {
    locks: Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl TurnLocks {
    fn handle(&self, phone_number: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        locks.entry(phone_number.to_string()).or_default().clone()
    }

    fn release(&self, phone_number: &str) {
        let mut locks = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
        if locks.get(phone_number).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(phone_number);
        }
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.locks.lock().unwrap_or_else(PoisonError::into_inner).len()
    }
}

/// Processes one inbound message: load or start the session, run the state
/// handler, persist, reply, then run side effects.
pub struct ProcessMessageUseCase {
    sessions: Arc<dyn ChatSessionRepository>,
    messenger: Arc<dyn ChatMessenger>,
    mailer: Arc<dyn EmailService>,
    flow: ConversationFlow,
    session_timeout_ms: u64,
    turn_locks: TurnLocks,
}

impl ProcessMessageUseCase {
    pub fn new(
        sessions: Arc<dyn ChatSessionRepository>,
        menu: Arc<dyn MenuRepository>,
        messenger: Arc<dyn ChatMessenger>,
        mailer: Arc<dyn EmailService>,
    ) -> Self {
        Self {
            sessions,
            messenger,
            mailer,
            flow: ConversationFlow::new(menu),
            session_timeout_ms: DEFAULT_SESSION_TIMEOUT_MS,
            turn_locks: TurnLocks::default(),
        }
    }

    pub fn with_session_timeout(mut self, timeout_ms: u64) -> Self {
        self.session_timeout_ms = timeout_ms;
        self
    }

    pub fn with_delivery_fee(mut self, cents: i64) -> Self {
        self.flow = self.flow.with_delivery_fee(cents);
        self
    }

    /// Never fails: errors are reported in the response
    pub async fn execute(&self, request: ProcessMessageRequest) -> ProcessMessageResponse {
        let phone_number = request.phone_number.trim().to_string();
        let span = tracing::info_span!("turn", phone = %phone_number);

        async {
            let lock = self.turn_locks.handle(&phone_number);
            let result = {
                let _guard = lock.lock().await;
                self.process(&phone_number, &request.message).await
            };
            drop(lock);
            self.turn_locks.release(&phone_number);

            match result {
                Ok(reply) => ProcessMessageResponse::ok(reply.unwrap_or_default()),
                Err(e) => {
                    tracing::error!("Failed to process message: {}", e);
                    ProcessMessageResponse::failed(e.to_string())
                }
            }
        }
        .instrument(span)
        .await
    }

    async fn process(&self, phone_number: &str, message: &str) -> Result<Option<String>, ProcessError> {
        let session = self.load_session(phone_number).await?;
        let previous = session.state();

        let Transition { session, reply, effects } = self.flow.dispatch(&session, message).await?;
        let session = session.touch();
        tracing::debug!(from = %previous, to = %session.state(), "Transition");

        self.sessions.save(&session).await?;

        let delivery = match &reply {
            Some(text) => self.send_reply(phone_number, text).await,
            None => Ok(()),
        };

        for effect in effects {
            self.apply(effect).await;
        }

        delivery?;
        Ok(reply)
    }

    async fn load_session(&self, phone_number: &str) -> Result<ChatSession, ProcessError> {
        if let Some(session) = self.sessions.find_by_phone_number(phone_number).await? {
            if !session.is_expired(self.session_timeout_ms) {
                return Ok(session);
            }
            tracing::info!(state = %session.state(), "Session expired, starting over");
            self.sessions.delete(phone_number).await?;
        }

        tracing::debug!("Starting new session");
        Ok(ChatSession::create(phone_number)?)
    }

    async fn send_reply(&self, phone_number: &str, text: &str) -> Result<(), MessagingError> {
        let report = self
            .messenger
            .send_message(&OutboundMessage::new(phone_number, text))
            .await?;

        if !report.is_success() {
            tracing::warn!(
                provider = self.messenger.provider(),
                code = report.code,
                "Reply not accepted: {}",
                report.description
            );
        }
        Ok(())
    }

    /// Effects are best-effort: a failure is logged and does not fail the turn
    async fn apply(&self, effect: Effect) {
        match effect {
            Effect::SendOrderConfirmation(order) => {
                match self.mailer.send_order_confirmation(&order).await {
                    Ok(()) => tracing::info!(order_id = order.id(), "Order confirmation email sent"),
                    Err(e) => tracing::warn!(order_id = order.id(), "Order confirmation email failed: {}", e),
                }
            }
        }
    }

    #[cfg(test)]
    pub(crate) fn pending_turn_locks(&self) -> usize {
        self.turn_locks.len()
    }
}
