//! Data models for Booktoshare

pub mod book;
pub mod history;
pub mod item;
pub mod user;
pub mod volume;

// Re-export commonly used types
pub use book::{Book, NewBook};
pub use history::{History, HistoryEvent};
pub use item::{Item, ItemView, UserItems};
pub use user::{Session, User};
pub use volume::{VolumeDetail, VolumeSummary};

/// HTML checkboxes are submitted as "y", "on" or "true" when ticked and omitted otherwise
pub(crate) fn checkbox(value: Option<&str>) -> bool {
    matches!(
        value.map(|v| v.trim().to_ascii_lowercase()).as_deref(),
        Some("y" | "yes" | "on" | "true" | "1")
    )
}

/// Treat empty or whitespace-only form values as absent
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
