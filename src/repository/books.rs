//! Books repository for database operations

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::AppResult,
    models::{
        book::{Book, NewBook},
        history::{HistoryEvent, NewHistory},
        item::Item,
    },
};

#[async_trait]
pub trait BooksRepository: Send + Sync {
    /// Store a book (reusing the one with the same `google_id` if any) and,
    /// when requested, an item owned by `owner_id` plus its `acquired` history
    /// row. Everything is written in one transaction.
    async fn add_book(&self, owner_id: i32, book: &NewBook) -> AppResult<(Book, Option<Item>)>;
}

#[derive(Clone)]
pub struct PgBooksRepository {
    pool: Pool<Postgres>,
}

impl PgBooksRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl BooksRepository for PgBooksRepository {
    async fn add_book(&self, owner_id: i32, book: &NewBook) -> AppResult<(Book, Option<Item>)> {
        let mut tx = self.pool.begin().await?;

        // A catalog id already on file wins; the partial unique index on
        // books.google_id serializes concurrent inserts of the same volume.
        let inserted = sqlx::query_as::<_, Book>(
            r#"
            INSERT INTO books (title, subtitle, google_id)
            VALUES ($1, $2, $3)
            ON CONFLICT (google_id) WHERE google_id IS NOT NULL DO NOTHING
            RETURNING *
            "#,
        )
        .bind(&book.title)
        .bind(&book.subtitle)
        .bind(&book.google_id)
        .fetch_optional(&mut *tx)
        .await?;

        let stored = match inserted {
            Some(created) => created,
            None => {
                sqlx::query_as::<_, Book>("SELECT * FROM books WHERE google_id = $1")
                    .bind(&book.google_id)
                    .fetch_one(&mut *tx)
                    .await?
            }
        };

        let item = if book.add_item {
            Some(insert_item(&mut tx, stored.id, owner_id).await?)
        } else {
            None
        };

        tx.commit().await?;

        Ok((stored, item))
    }
}

async fn insert_item(tx: &mut Transaction<'_, Postgres>, book_id: i32, owner_id: i32) -> AppResult<Item> {
    let item = sqlx::query_as::<_, Item>(
        r#"
        INSERT INTO items (book_id, owner_id)
        VALUES ($1, $2)
        RETURNING *
        "#,
    )
    .bind(book_id)
    .bind(owner_id)
    .fetch_one(&mut **tx)
    .await?;

    let history = NewHistory {
        item_id: item.id,
        actor_id: owner_id,
        event: HistoryEvent::Acquired,
        from_user_id: None,
        to_user_id: Some(owner_id),
    };
    super::items::insert_history(tx, &history).await?;

    Ok(item)
}
