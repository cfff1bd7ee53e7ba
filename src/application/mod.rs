//! Application layer - Use cases and business logic
//! 
//! This layer contains:
//! - Conversation: Input parsing, per-state handlers and reply texts
//! - Services: Message processing and session cleanup
//! - Errors: Domain-specific errors

pub mod conversation;
pub mod errors;
pub mod services;
