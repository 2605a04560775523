//! In-memory repository backed by ordered maps, for tests and local demos.
//!
//! A single mutex guards the whole state, so every multi-row write (book +
//! item + history, transfer + history) is applied all-or-nothing just like the
//! PostgreSQL transactions.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{BooksRepository, ItemsRepository, SessionsRepository, UsersRepository};
use crate::{
    error::{AppError, AppResult},
    models::{
        book::{Book, NewBook},
        history::{History, HistoryEvent, NewHistory},
        item::{ControlTransfer, Item, ItemView},
        user::{NewUser, Session, User},
    },
};

#[derive(Default)]
struct MemoryState {
    users: BTreeMap<i32, User>,
    books: BTreeMap<i32, Book>,
    items: BTreeMap<i32, Item>,
    history: BTreeMap<i32, History>,
    sessions: BTreeMap<String, Session>,
    next_id: i32,
}

impl MemoryState {
    fn next_id(&mut self) -> i32 {
        self.next_id += 1;
        self.next_id
    }

    fn append_history(&mut self, new: &NewHistory) -> History {
        let row = History {
            id: self.next_id(),
            item_id: new.item_id,
            actor_id: new.actor_id,
            event: new.event,
            from_user_id: new.from_user_id,
            to_user_id: new.to_user_id,
            created_at: Utc::now(),
        };
        self.history.insert(row.id, row.clone());
        row
    }

    fn view(&self, item: &Item) -> Option<ItemView> {
        let book = self.books.get(&item.book_id)?;
        let owner = self.users.get(&item.owner_id)?;
        let controller = item
            .controller_id
            .and_then(|id| self.users.get(&id))
            .map(|u| u.username.clone());
        Some(ItemView {
            id: item.id,
            book_id: book.id,
            title: book.title.clone(),
            subtitle: book.subtitle.clone(),
            google_id: book.google_id.clone(),
            owner_id: owner.id,
            owner: owner.username.clone(),
            controller_id: item.controller_id,
            controller,
            created_at: item.created_at,
        })
    }
}

/// Clone-friendly via Arc; every clone sees the same data.
#[derive(Clone, Default)]
pub struct MemoryStore {
    state: Arc<Mutex<MemoryState>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> AppResult<MutexGuard<'_, MemoryState>> {
        self.state
            .lock()
            .map_err(|_| AppError::Internal("memory store lock poisoned".to_string()))
    }

    pub fn book_count(&self) -> usize {
        self.lock().map(|s| s.books.len()).unwrap_or_default()
    }

    pub fn item_count(&self) -> usize {
        self.lock().map(|s| s.items.len()).unwrap_or_default()
    }

    pub fn session_count(&self) -> usize {
        self.lock().map(|s| s.sessions.len()).unwrap_or_default()
    }
}

#[async_trait]
impl UsersRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<User> {
        self.lock()?
            .users
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("User with id {} not found", id)))
    }

    async fn get_by_username(&self, username: &str) -> AppResult<Option<User>> {
        Ok(self
            .lock()?
            .users
            .values()
            .find(|u| u.username.eq_ignore_ascii_case(username))
            .cloned())
    }

    async fn username_exists(&self, username: &str) -> AppResult<bool> {
        Ok(self.get_by_username(username).await?.is_some())
    }

    async fn email_exists(&self, email: &str) -> AppResult<bool> {
        Ok(self
            .lock()?
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(email)))
    }

    async fn create(&self, user: &NewUser) -> AppResult<User> {
        let mut state = self.lock()?;
        if state
            .users
            .values()
            .any(|u| u.username.eq_ignore_ascii_case(&user.username))
        {
            return Err(AppError::field(
                "username",
                "duplicate",
                "Please use a different username.",
            ));
        }
        if state
            .users
            .values()
            .any(|u| u.email.eq_ignore_ascii_case(&user.email))
        {
            return Err(AppError::field(
                "email",
                "duplicate",
                "Please use a different email address.",
            ));
        }

        let created = User {
            id: state.next_id(),
            username: user.username.clone(),
            email: user.email.clone(),
            password_hash: user.password_hash.clone(),
            created_at: Utc::now(),
        };
        state.users.insert(created.id, created.clone());
        Ok(created)
    }
}

#[async_trait]
impl SessionsRepository for MemoryStore {
    async fn create(&self, session: &Session) -> AppResult<()> {
        self.lock()?
            .sessions
            .insert(session.token_hash.clone(), session.clone());
        Ok(())
    }

    async fn get(&self, token_hash: &str) -> AppResult<Option<Session>> {
        Ok(self.lock()?.sessions.get(token_hash).cloned())
    }

    async fn delete(&self, token_hash: &str) -> AppResult<bool> {
        Ok(self.lock()?.sessions.remove(token_hash).is_some())
    }

    async fn delete_expired(&self, now: DateTime<Utc>) -> AppResult<u64> {
        let mut state = self.lock()?;
        let before = state.sessions.len();
        state.sessions.retain(|_, s| !s.is_expired(now));
        Ok((before - state.sessions.len()) as u64)
    }
}

#[async_trait]
impl BooksRepository for MemoryStore {
    async fn add_book(&self, owner_id: i32, book: &NewBook) -> AppResult<(Book, Option<Item>)> {
        let mut state = self.lock()?;

        if !state.users.contains_key(&owner_id) {
            return Err(AppError::NotFound(format!("User with id {} not found", owner_id)));
        }

        let existing = book.google_id.as_deref().and_then(|google_id| {
            state
                .books
                .values()
                .find(|b| b.google_id.as_deref() == Some(google_id))
                .cloned()
        });

        let stored = match existing {
            Some(found) => found,
            None => {
                let created = Book {
                    id: state.next_id(),
                    title: book.title.clone(),
                    subtitle: book.subtitle.clone(),
                    google_id: book.google_id.clone(),
                    created_at: Utc::now(),
                };
                state.books.insert(created.id, created.clone());
                created
            }
        };

        let item = if book.add_item {
            let item = Item {
                id: state.next_id(),
                book_id: stored.id,
                owner_id,
                controller_id: None,
                created_at: Utc::now(),
            };
            state.items.insert(item.id, item.clone());
            state.append_history(&NewHistory {
                item_id: item.id,
                actor_id: owner_id,
                event: HistoryEvent::Acquired,
                from_user_id: None,
                to_user_id: Some(owner_id),
            });
            Some(item)
        } else {
            None
        };

        Ok((stored, item))
    }
}

#[async_trait]
impl ItemsRepository for MemoryStore {
    async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        self.lock()?
            .items
            .get(&id)
            .cloned()
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    async fn list_owned(&self, owner_id: i32) -> AppResult<Vec<ItemView>> {
        let state = self.lock()?;
        Ok(state
            .items
            .values()
            .filter(|i| i.owner_id == owner_id)
            .filter_map(|i| state.view(i))
            .collect())
    }

    async fn list_controlled(&self, controller_id: i32) -> AppResult<Vec<ItemView>> {
        let state = self.lock()?;
        Ok(state
            .items
            .values()
            .filter(|i| i.controller_id == Some(controller_id))
            .filter_map(|i| state.view(i))
            .collect())
    }

    async fn transfer(&self, transfer: &ControlTransfer) -> AppResult<Item> {
        let mut state = self.lock()?;

        let item = state
            .items
            .get_mut(&transfer.item_id)
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", transfer.item_id)))?;
        if item.controller_id != transfer.expected_controller {
            return Err(AppError::Conflict(format!(
                "Item {} changed hands in the meantime",
                transfer.item_id
            )));
        }
        item.controller_id = transfer.new_controller;
        let updated = item.clone();

        state.append_history(&NewHistory {
            item_id: updated.id,
            actor_id: transfer.actor_id,
            event: transfer.event,
            from_user_id: transfer.from_user_id,
            to_user_id: transfer.to_user_id,
        });

        Ok(updated)
    }

    async fn history(&self, item_id: i32) -> AppResult<Vec<History>> {
        Ok(self
            .lock()?
            .history
            .values()
            .filter(|h| h.item_id == item_id)
            .cloned()
            .collect())
    }
}
