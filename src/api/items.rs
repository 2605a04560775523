//! Lending endpoints for owned items

use axum::{
    extract::{Path, State},
    response::Redirect,
    Form, Json,
};
use validator::Validate;

use crate::{
    error::AppResult,
    models::{history::History, item::LendForm},
    AppState,
};

use super::CurrentUser;

/// Hand an owned item to another user
pub async fn lend_item(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i32>,
    Form(form): Form<LendForm>,
) -> AppResult<Redirect> {
    form.validate()?;
    state.services.library.lend_item(&user, id, &form.borrower).await?;
    Ok(Redirect::to("/"))
}

/// Record the return of a lent item
pub async fn return_item(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Redirect> {
    state.services.library.return_item(&user, id).await?;
    Ok(Redirect::to("/"))
}

/// Transfer log of an item, oldest first
#[utoipa::path(
    get,
    path = "/items/{id}/history",
    tag = "library",
    security(("session_cookie" = [])),
    params(("id" = i32, Path, description = "Item ID")),
    responses(
        (status = 200, description = "Item history", body = Vec<History>),
        (status = 404, description = "Item not found", body = crate::error::ErrorResponse)
    )
)]
pub async fn item_history(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<i32>,
) -> AppResult<Json<Vec<History>>> {
    let history = state.services.library.item_history(&user, id).await?;
    Ok(Json(history))
}
