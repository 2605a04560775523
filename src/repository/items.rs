//! Items repository: ownership, control and history queries

use async_trait::async_trait;
use sqlx::{Pool, Postgres, Transaction};

use crate::{
    error::{AppError, AppResult},
    models::{
        history::{History, NewHistory},
        item::{ControlTransfer, Item, ItemView},
    },
};

const ITEM_VIEW_SELECT: &str = r#"
    SELECT i.id, i.book_id, b.title, b.subtitle, b.google_id,
           i.owner_id, o.username AS owner,
           i.controller_id, c.username AS controller,
           i.created_at
    FROM items i
    JOIN books b ON b.id = i.book_id
    JOIN users o ON o.id = i.owner_id
    LEFT JOIN users c ON c.id = i.controller_id
"#;

#[async_trait]
pub trait ItemsRepository: Send + Sync {
    async fn get_by_id(&self, id: i32) -> AppResult<Item>;

    /// Items owned by a user, oldest first
    async fn list_owned(&self, owner_id: i32) -> AppResult<Vec<ItemView>>;

    /// Items currently held by a user on behalf of their owners, oldest first
    async fn list_controlled(&self, controller_id: i32) -> AppResult<Vec<ItemView>>;

    /// Apply a controller change and append its history row in one transaction.
    /// Fails with `Conflict` if the controller is no longer `expected_controller`.
    async fn transfer(&self, transfer: &ControlTransfer) -> AppResult<Item>;

    /// History of an item, oldest first
    async fn history(&self, item_id: i32) -> AppResult<Vec<History>>;
}

#[derive(Clone)]
pub struct PgItemsRepository {
    pool: Pool<Postgres>,
}

impl PgItemsRepository {
    pub fn new(pool: Pool<Postgres>) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ItemsRepository for PgItemsRepository {
    async fn get_by_id(&self, id: i32) -> AppResult<Item> {
        sqlx::query_as::<_, Item>("SELECT * FROM items WHERE id = $1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("Item with id {} not found", id)))
    }

    async fn list_owned(&self, owner_id: i32) -> AppResult<Vec<ItemView>> {
        let query = format!("{} WHERE i.owner_id = $1 ORDER BY i.id", ITEM_VIEW_SELECT);
        let items = sqlx::query_as::<_, ItemView>(&query)
            .bind(owner_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn list_controlled(&self, controller_id: i32) -> AppResult<Vec<ItemView>> {
        let query = format!("{} WHERE i.controller_id = $1 ORDER BY i.id", ITEM_VIEW_SELECT);
        let items = sqlx::query_as::<_, ItemView>(&query)
            .bind(controller_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(items)
    }

    async fn transfer(&self, transfer: &ControlTransfer) -> AppResult<Item> {
        let mut tx = self.pool.begin().await?;

        let item = sqlx::query_as::<_, Item>(
            r#"
            UPDATE items SET controller_id = $1
            WHERE id = $2 AND controller_id IS NOT DISTINCT FROM $3
            RETURNING *
            "#,
        )
        .bind(transfer.new_controller)
        .bind(transfer.item_id)
        .bind(transfer.expected_controller)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| {
            AppError::Conflict(format!("Item {} changed hands in the meantime", transfer.item_id))
        })?;

        let history = NewHistory {
            item_id: item.id,
            actor_id: transfer.actor_id,
            event: transfer.event,
            from_user_id: transfer.from_user_id,
            to_user_id: transfer.to_user_id,
        };
        insert_history(&mut tx, &history).await?;

        tx.commit().await?;

        Ok(item)
    }

    async fn history(&self, item_id: i32) -> AppResult<Vec<History>> {
        let rows = sqlx::query_as::<_, History>(
            "SELECT * FROM history WHERE item_id = $1 ORDER BY created_at, id",
        )
        .bind(item_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows)
    }
}

pub(super) async fn insert_history(
    tx: &mut Transaction<'_, Postgres>,
    history: &NewHistory,
) -> AppResult<History> {
    let row = sqlx::query_as::<_, History>(
        r#"
        INSERT INTO history (item_id, actor_id, event, from_user_id, to_user_id)
        VALUES ($1, $2, $3, $4, $5)
        RETURNING *
        "#,
    )
    .bind(history.item_id)
    .bind(history.actor_id)
    .bind(history.event)
    .bind(history.from_user_id)
    .bind(history.to_user_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}
