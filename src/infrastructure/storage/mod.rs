//! In-memory storage implementation

pub mod menu;

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::application::errors::StorageError;
use crate::domain::entities::ChatSession;
use crate::domain::traits::ChatSessionRepository;

pub use menu::{default_catalog, load_catalog, InMemoryMenuRepository};

/// Sessions kept in process memory, keyed by phone number
#[derive(Default, Clone)]
pub struct InMemoryChatSessionRepository {
    sessions: Arc<RwLock<HashMap<String, ChatSession>>>,
}

impl InMemoryChatSessionRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }
}

#[async_trait]
impl ChatSessionRepository for InMemoryChatSessionRepository {
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        sessions.insert(session.phone_number().to_string(), session.clone());
        Ok(())
    }

    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<ChatSession>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions.get(phone_number).cloned())
    }

    async fn delete(&self, phone_number: &str) -> Result<(), StorageError> {
        let mut sessions = self.sessions.write().await;
        sessions.remove(phone_number);
        Ok(())
    }

    async fn find_expired_sessions(&self, timeout_ms: u64) -> Result<Vec<ChatSession>, StorageError> {
        let sessions = self.sessions.read().await;
        Ok(sessions
            .values()
            .filter(|s| s.is_expired(timeout_ms))
            .cloned()
            .collect())
    }

    async fn delete_expired_sessions(&self, timeout_ms: u64) -> Result<usize, StorageError> {
        let mut sessions = self.sessions.write().await;
        let before = sessions.len();
        sessions.retain(|_, s| !s.is_expired(timeout_ms));
        Ok(before - sessions.len())
    }
}
