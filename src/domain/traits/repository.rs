use async_trait::async_trait;

use crate::application::errors::StorageError;
use crate::domain::entities::{ChatSession, MenuItem};

/// Session persistence, keyed by phone number (one active session per number)
#[async_trait]
pub trait ChatSessionRepository: Send + Sync {
    async fn save(&self, session: &ChatSession) -> Result<(), StorageError>;
    async fn find_by_phone_number(&self, phone_number: &str) -> Result<Option<ChatSession>, StorageError>;
    async fn delete(&self, phone_number: &str) -> Result<(), StorageError>;

    /// Sessions idle for longer than `timeout_ms`
    async fn find_expired_sessions(&self, timeout_ms: u64) -> Result<Vec<ChatSession>, StorageError>;

    /// Removes idle sessions and returns how many were removed
    async fn delete_expired_sessions(&self, timeout_ms: u64) -> Result<usize, StorageError>;
}

/// Read access to the menu catalog
#[async_trait]
pub trait MenuRepository: Send + Sync {
    async fn find_all_items(&self) -> Result<Vec<MenuItem>, StorageError>;

    /// Available items of a category, matched case-insensitively, in catalog order
    async fn find_items_by_category(&self, category: &str) -> Result<Vec<MenuItem>, StorageError>;

    async fn find_item_by_id(&self, id: &str) -> Result<Option<MenuItem>, StorageError>;
    async fn find_available_items(&self) -> Result<Vec<MenuItem>, StorageError>;

    /// Distinct categories of available items, sorted
    async fn get_categories(&self) -> Result<Vec<String>, StorageError>;
}
