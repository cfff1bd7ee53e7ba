//! Domain layer - Core business logic with no external dependencies
//!
//! This layer contains:
//! - Entities: Core business objects (ChatSession, Customer, MenuItem, Order)
//! - Traits: Abstractions for infrastructure (repositories, messenger, mailer)

pub mod entities;
pub mod traits;
