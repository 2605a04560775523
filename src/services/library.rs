//! Personal library operations performed on behalf of the signed-in user

use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, NewBook},
        history::{History, HistoryEvent},
        item::{ControlTransfer, Item, UserItems},
        user::User,
    },
    repository::Repository,
};

#[derive(Clone)]
pub struct LibraryService {
    repository: Repository,
}

impl LibraryService {
    pub fn new(repository: Repository) -> Self {
        Self { repository }
    }

    /// Register a book for `user`, and an owned item when `add_item` is set.
    ///
    /// A book carrying a Google Books id already known to the store is reused
    /// instead of inserted again.
    pub async fn add_book(&self, user: &User, book: NewBook) -> AppResult<Book> {
        let (stored, item) = self.repository.books.add_book(user.id, &book).await?;

        tracing::info!(
            user_id = user.id,
            book_id = stored.id,
            item_id = item.as_ref().map(|i| i.id),
            title = %stored.title,
            "Book added"
        );

        Ok(stored)
    }

    /// Items the user owns and items the user currently holds for someone else
    pub async fn list_items(&self, user: &User) -> AppResult<UserItems> {
        let own_items = self.repository.items.list_owned(user.id).await?;
        let controlled_items = self.repository.items.list_controlled(user.id).await?;
        Ok(UserItems {
            own_items,
            controlled_items,
        })
    }

    /// Hand an owned item to another user
    pub async fn lend_item(&self, user: &User, item_id: i32, borrower: &str) -> AppResult<Item> {
        let item = self.repository.items.get_by_id(item_id).await?;
        if item.owner_id != user.id {
            return Err(AppError::Authorization(
                "Only the owner can lend this item".to_string(),
            ));
        }
        if item.is_lent() {
            return Err(AppError::Conflict(format!("Item {} is already lent", item_id)));
        }

        let borrower = self
            .repository
            .users
            .get_by_username(borrower.trim())
            .await?
            .ok_or_else(|| AppError::field("borrower", "unknown", "No user with this username."))?;
        if borrower.id == user.id {
            return Err(AppError::field(
                "borrower",
                "owner",
                "You cannot lend an item to yourself.",
            ));
        }

        let updated = self
            .repository
            .items
            .transfer(&ControlTransfer {
                item_id,
                actor_id: user.id,
                expected_controller: None,
                new_controller: Some(borrower.id),
                event: HistoryEvent::Lent,
                from_user_id: Some(user.id),
                to_user_id: Some(borrower.id),
            })
            .await?;

        tracing::info!(item_id, owner_id = user.id, borrower_id = borrower.id, "Item lent");
        Ok(updated)
    }

    /// Give control back to the owner; either party may record the return
    pub async fn return_item(&self, user: &User, item_id: i32) -> AppResult<Item> {
        let item = self.repository.items.get_by_id(item_id).await?;
        let Some(controller_id) = item.controller_id else {
            return Err(AppError::Conflict(format!("Item {} is not lent", item_id)));
        };
        if user.id != item.owner_id && user.id != controller_id {
            return Err(AppError::Authorization(
                "Only the owner or the borrower can return this item".to_string(),
            ));
        }

        let updated = self
            .repository
            .items
            .transfer(&ControlTransfer {
                item_id,
                actor_id: user.id,
                expected_controller: Some(controller_id),
                new_controller: None,
                event: HistoryEvent::Returned,
                from_user_id: Some(controller_id),
                to_user_id: Some(item.owner_id),
            })
            .await?;

        tracing::info!(item_id, actor_id = user.id, "Item returned");
        Ok(updated)
    }

    /// Transfer log of an item, visible to its owner and current holder
    pub async fn item_history(&self, user: &User, item_id: i32) -> AppResult<Vec<History>> {
        let item = self.repository.items.get_by_id(item_id).await?;
        if item.owner_id != user.id && item.controller_id != Some(user.id) {
            // Same answer as a missing item
            return Err(AppError::NotFound(format!("Item with id {} not found", item_id)));
        }
        self.repository.items.history(item_id).await
    }
}
