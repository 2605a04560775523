//! Repository layer for database operations

pub mod books;
pub mod items;
pub mod memory;
pub mod sessions;
pub mod users;

use std::sync::Arc;

use sqlx::{Pool, Postgres};

pub use books::BooksRepository;
pub use items::ItemsRepository;
pub use memory::MemoryStore;
pub use sessions::SessionsRepository;
pub use users::UsersRepository;

/// Main repository struct holding one handle per table group
#[derive(Clone)]
pub struct Repository {
    pub users: Arc<dyn UsersRepository>,
    pub books: Arc<dyn BooksRepository>,
    pub items: Arc<dyn ItemsRepository>,
    pub sessions: Arc<dyn SessionsRepository>,
}

impl Repository {
    /// Create a new repository with the given database pool
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self {
            users: Arc::new(users::PgUsersRepository::new(pool.clone())),
            books: Arc::new(books::PgBooksRepository::new(pool.clone())),
            items: Arc::new(items::PgItemsRepository::new(pool.clone())),
            sessions: Arc::new(sessions::PgSessionsRepository::new(pool)),
        }
    }

    /// Repository whose tables all live in `store`
    pub fn in_memory(store: MemoryStore) -> Self {
        Self {
            users: Arc::new(store.clone()),
            books: Arc::new(store.clone()),
            items: Arc::new(store.clone()),
            sessions: Arc::new(store),
        }
    }
}
