use async_trait::async_trait;

use crate::application::errors::EmailError;
use crate::domain::entities::{Order, OrderStatus};

/// Transactional email for orders
#[async_trait]
pub trait EmailService: Send + Sync {
    async fn send_order_confirmation(&self, order: &Order) -> Result<(), EmailError>;

    async fn send_order_status_update(&self, order: &Order, new_status: OrderStatus) -> Result<(), EmailError>;
}
