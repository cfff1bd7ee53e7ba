//! Input parser - normalizes raw chat text before dispatch

use crate::domain::entities::ChatState;

/// Normalized customer input for one turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Input {
    text: String,
}

impl Input {
    /// Trims the raw message and lowercases it, except in states that collect
    /// free text (name, email, address), where the casing is the customer's data.
    pub fn parse(state: ChatState, raw: &str) -> Self {
        let trimmed = raw.trim();
        let text = if state.collects_free_text() {
            trimmed.to_string()
        } else {
            trimmed.to_lowercase()
        };
        Self { text }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is(&self, option: &str) -> bool {
        self.text == option
    }

    /// Zero-based position for a 1-based numeric choice ("1" -> 0).
    /// Anything non-numeric, zero, or outside `len` is `None`.
    pub fn choice(&self, len: usize) -> Option<usize> {
        if !self.text.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        let n: usize = self.text.parse().ok()?;
        if n == 0 || n > len {
            return None;
        }
        Some(n - 1)
    }

    /// Comma-separated parts, trimmed
    pub fn comma_parts(&self) -> Vec<&str> {
        self.text.split(',').map(str::trim).collect()
    }
}
