//! Conversation engine - input parsing, per-state handlers and reply texts

pub mod dispatcher;
pub mod parser;
pub mod replies;

pub use dispatcher::{ConversationFlow, Effect, Transition, DEFAULT_DELIVERY_FEE_CENTS};
pub use parser::Input;
