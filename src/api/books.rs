//! Index and add-book endpoints

use axum::{
    extract::State,
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use validator::Validate;

use crate::{
    error::{single_field_error, AppResult},
    models::{
        book::{NewBook, NewBookForm},
        item::UserItems,
    },
    AppState,
};

use super::{CurrentUser, FormPage};

const ADD_BOOK_FIELDS: &[&str] = &["title", "subtitle", "google_id", "add_item"];

fn add_book_form() -> FormPage {
    FormPage::new("Add Book", "add_book", ADD_BOOK_FIELDS)
}

/// Items owned by and currently held by the signed-in user
#[utoipa::path(
    get,
    path = "/index",
    tag = "library",
    security(("session_cookie" = [])),
    responses(
        (status = 200, description = "Owned and controlled items", body = UserItems),
        (status = 303, description = "Not signed in, redirect to /login")
    )
)]
pub async fn index(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
) -> AppResult<Json<UserItems>> {
    let items = state.services.library.list_items(&user).await?;
    Ok(Json(items))
}

/// Add-book form
pub async fn add_book_page(_current: CurrentUser, jar: CookieJar) -> Response {
    add_book_form().render(jar)
}

/// Store a book, optionally with a copy owned by the user
pub async fn add_book(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    jar: CookieJar,
    Form(form): Form<NewBookForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok(add_book_form().with_errors(jar, &errors));
    }

    let book = NewBook::from(form);
    if book.title.is_empty() {
        let errors = single_field_error("title", "blank", "Title must not be blank");
        return Ok(add_book_form().with_errors(jar, &errors));
    }

    state.services.library.add_book(&user, book).await?;
    Ok(Redirect::to("/").into_response())
}
