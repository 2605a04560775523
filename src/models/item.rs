//! Item (owned copy of a book) model and related types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;
use validator::Validate;

/// A concrete copy of a book owned by one user, optionally held by another
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct Item {
    pub id: i32,
    pub book_id: i32,
    pub owner_id: i32,
    /// User currently holding the item, if lent out
    pub controller_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

impl Item {
    pub fn is_lent(&self) -> bool {
        self.controller_id.is_some()
    }
}

/// Item joined with its book and the usernames involved, for listings
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct ItemView {
    pub id: i32,
    pub book_id: i32,
    pub title: String,
    pub subtitle: Option<String>,
    pub google_id: Option<String>,
    pub owner_id: i32,
    pub owner: String,
    pub controller_id: Option<i32>,
    pub controller: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Index page content
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserItems {
    pub own_items: Vec<ItemView>,
    pub controlled_items: Vec<ItemView>,
}

/// Lend form
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct LendForm {
    #[validate(length(min = 1, message = "Borrower is required"))]
    pub borrower: String,
}

/// A change of controller on one item, applied atomically with its history row
#[derive(Debug, Clone)]
pub struct ControlTransfer {
    pub item_id: i32,
    pub actor_id: i32,
    /// Controller the caller observed; the update fails if it changed meanwhile
    pub expected_controller: Option<i32>,
    pub new_controller: Option<i32>,
    pub event: super::HistoryEvent,
    pub from_user_id: Option<i32>,
    pub to_user_id: Option<i32>,
}
