//! CLI command implementations
//!
//! Commands are organized by domain:
//! - `run` - Full statement pipeline (classify, accumulate, write outputs)
//! - `categories` - Category cache listing
//! - `classify` - Dry-run classification of a single transaction name

pub mod categories;
pub mod classify;
pub mod run;

// Re-export command functions for main.rs
pub use categories::*;
pub use classify::*;
pub use run::*;

/// Truncate a string to a maximum length, adding "..." if truncated
pub fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}
