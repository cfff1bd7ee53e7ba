//! Chat transport adapters (WhatsApp providers and the local console)

pub mod chatguru;
pub mod console;
pub mod twilio;

use std::time::Duration;

pub use chatguru::ChatGuruMessenger;
pub use console::ConsoleMessenger;
pub use twilio::TwilioMessenger;

/// Timeout applied to every provider HTTP request
pub const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

pub(crate) fn http_client() -> Result<reqwest::Client, reqwest::Error> {
    reqwest::Client::builder().timeout(HTTP_TIMEOUT).build()
}
