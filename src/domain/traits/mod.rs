//! Domain traits - Abstractions for infrastructure implementations

pub mod mailer;
pub mod messenger;
pub mod repository;

pub use mailer::EmailService;
pub use messenger::{ChatMessenger, DeliveryReport, OutboundMessage};
pub use repository::{ChatSessionRepository, MenuRepository};
