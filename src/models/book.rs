//! Book (catalog entry) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// Catalog-level metadata; many items may point at one book
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Book {
    pub id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    /// Google Books volume id, when the book came from a catalog search
    pub google_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Add-book form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct NewBookForm {
    #[validate(length(min = 1, max = 256, message = "Title must be 1 to 256 characters"))]
    pub title: String,
    #[validate(length(max = 256, message = "Subtitle must be at most 256 characters"))]
    pub subtitle: Option<String>,
    #[validate(length(max = 64))]
    pub google_id: Option<String>,
    /// HTML checkbox value, present when ticked
    pub add_item: Option<String>,
}

/// Normalized add-book request handed to the library service
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewBook {
    pub title: String,
    pub subtitle: Option<String>,
    pub google_id: Option<String>,
    pub add_item: bool,
}

impl NewBook {
    pub fn new(title: impl Into<String>, subtitle: Option<String>, add_item: bool) -> Self {
        Self {
            title: title.into(),
            subtitle,
            google_id: None,
            add_item,
        }
    }
}

impl From<NewBookForm> for NewBook {
    fn from(form: NewBookForm) -> Self {
        Self {
            title: form.title.trim().to_string(),
            subtitle: super::non_blank(form.subtitle),
            google_id: super::non_blank(form.google_id),
            add_item: super::checkbox(form.add_item.as_deref()),
        }
    }
}
