//! WhatsApp ordering bot for a delivery restaurant
//!
//! Customers browse the menu, build an order, give their delivery data and
//! confirm payment through a numbered-menu chat conversation.

pub mod application;
pub mod domain;
pub mod infrastructure;
