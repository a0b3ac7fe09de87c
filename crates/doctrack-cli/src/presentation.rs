//! Shared CLI presentation utilities.
//!
//! Format-only helpers; no domain transforms.

use chrono::{DateTime, Utc};

/// Truncate a string to a maximum length with ellipsis.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{kept}...")
    }
}

/// Print a horizontal separator line.
pub fn print_separator(width: usize) {
    println!("{}", "-".repeat(width));
}

/// Format an optional timestamp, or `default` when absent.
pub fn format_timestamp(value: Option<DateTime<Utc>>, default: &str) -> String {
    value.map_or_else(
        || default.to_string(),
        |ts| ts.format("%Y-%m-%d %H:%M").to_string(),
    )
}

/// Print up to `limit` ids under a heading.
pub fn print_id_list(heading: &str, ids: &[String], limit: usize) {
    if ids.is_empty() {
        return;
    }
    println!("{heading} ({}):", ids.len());
    for id in ids.iter().take(limit) {
        println!("  {id}");
    }
    if ids.len() > limit {
        println!("  ... and {} more", ids.len() - limit);
    }
}
