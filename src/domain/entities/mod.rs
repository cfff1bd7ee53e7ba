//! Domain entities - Core business objects with no external dependencies

pub mod chat_session;
pub mod customer;
pub mod menu_item;
pub mod order;

pub use chat_session::{ChatContext, ChatSession, ChatState, ContextPatch, CustomerDraft};
pub use customer::{Address, Customer};
pub use menu_item::{format_cents, MenuItem};
pub use order::{Order, OrderItem, OrderStatus, PaymentMethod};
