//! Application services - Business logic orchestration

pub mod process_message;
pub mod session_cleanup;

pub use process_message::{
    ProcessMessageRequest, ProcessMessageResponse, ProcessMessageUseCase, DEFAULT_SESSION_TIMEOUT_MS,
};
pub use session_cleanup::{SessionCleanupService, DEFAULT_CLEANUP_INTERVAL_MS};
