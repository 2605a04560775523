//! Append-only ownership/control log for items

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{Decode, Encode, FromRow, Postgres};
use utoipa::ToSchema;

/// Kind of transition recorded for an item
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum HistoryEvent {
    /// Item registered by its owner
    Acquired,
    /// Control handed to a borrower
    Lent,
    /// Control given back to the owner
    Returned,
}

impl HistoryEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            HistoryEvent::Acquired => "acquired",
            HistoryEvent::Lent => "lent",
            HistoryEvent::Returned => "returned",
        }
    }
}

impl std::fmt::Display for HistoryEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for HistoryEvent {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "acquired" => Ok(HistoryEvent::Acquired),
            "lent" => Ok(HistoryEvent::Lent),
            "returned" => Ok(HistoryEvent::Returned),
            _ => Err(format!("Invalid history event: {}", s)),
        }
    }
}

// Stored as VARCHAR
impl sqlx::Type<Postgres> for HistoryEvent {
    fn type_info() -> sqlx::postgres::PgTypeInfo {
        <String as sqlx::Type<Postgres>>::type_info()
    }

    fn compatible(ty: &sqlx::postgres::PgTypeInfo) -> bool {
        <String as sqlx::Type<Postgres>>::compatible(ty)
    }
}

impl<'r> Decode<'r, Postgres> for HistoryEvent {
    fn decode(value: sqlx::postgres::PgValueRef<'r>) -> Result<Self, sqlx::error::BoxDynError> {
        let s: String = Decode::<Postgres>::decode(value)?;
        s.parse().map_err(|e: String| e.into())
    }
}

impl Encode<'_, Postgres> for HistoryEvent {
    fn encode_by_ref(&self, buf: &mut sqlx::postgres::PgArgumentBuffer) -> sqlx::encode::IsNull {
        <&str as Encode<Postgres>>::encode(self.as_str(), buf)
    }
}

/// One immutable history row
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, ToSchema)]
pub struct History {
    pub id: i32,
    pub item_id: i32,
    /// User who performed the transition
    pub actor_id: i32,
    pub event: HistoryEvent,
    pub from_user_id: Option<i32>,
    pub to_user_id: Option<i32>,
    pub created_at: DateTime<Utc>,
}

/// History row to append
#[derive(Debug, Clone)]
pub struct NewHistory {
    pub item_id: i32,
    pub actor_id: i32,
    pub event: HistoryEvent,
    pub from_user_id: Option<i32>,
    pub to_user_id: Option<i32>,
}
