//! Display helpers shared by the storefront and admin templates.

use chrono::{DateTime, Utc};

/// `16 Oct 2026`
#[must_use]
pub fn format_date(date: DateTime<Utc>) -> String {
    date.format("%-d %b %Y").to_string()
}

/// `16 Oct 2026, 14:05`
#[must_use]
pub fn format_datetime(date: DateTime<Utc>) -> String {
    date.format("%-d %b %Y, %H:%M").to_string()
}

/// "Just now", "5 minutes ago", ... falling back to the date after a week.
#[must_use]
pub fn format_relative(date: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - date).num_seconds();
    match seconds {
        s if s < 60 => "Just now".to_owned(),
        s if s < 3_600 => format!("{} minutes ago", s / 60),
        s if s < 86_400 => format!("{} hours ago", s / 3_600),
        s if s < 604_800 => format!("{} days ago", s / 86_400),
        _ => format_date(date),
    }
}

/// Cut `text` to `max` characters, adding an ellipsis when shortened.
#[must_use]
pub fn truncate(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_owned();
    }
    let mut out: String = text.chars().take(max).collect();
    out.push_str("...");
    out
}
