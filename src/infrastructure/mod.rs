//! Infrastructure layer - External concerns
//! 
//! This layer contains:
//! - Config: Configuration loading
//! - Storage: In-memory repositories and the menu catalog
//! - Database: SQLite persistence
//! - Adapters: Chat transports (ChatGuru, Twilio, console)
//! - Email: Order notification emails
//! - Web: Webhook HTTP server

pub mod adapters;
pub mod config;
pub mod database;
pub mod email;
pub mod storage;
pub mod web;
