//! importkit Common Library
//!
//! Shared code for the importkit command-line tools:
//! - Configuration management
//! - Error types and handling
//! - Tracing setup
//! - Metrics helpers

pub mod config;
pub mod errors;
pub mod metrics;
pub mod telemetry;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Truncate `text` to at most `max_chars` characters for log previews.
///
/// Cuts on a character boundary and appends `...` when anything was dropped.
pub fn preview(text: &str, max_chars: usize) -> String {
    let trimmed = text.trim();
    match trimmed.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &trimmed[..idx]),
        None => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_preview_short_text_untouched() {
        assert_eq!(preview("  ok \n", 10), "ok");
    }

    #[test]
    fn test_preview_truncates_on_char_boundary() {
        assert_eq!(preview("importação", 6), "import...");
        assert_eq!(preview("ççççç", 2), "çç...");
    }

    #[test]
    fn test_preview_exact_length() {
        assert_eq!(preview("abcd", 4), "abcd");
    }
}
