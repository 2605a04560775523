//! Google Books search endpoints

use axum::{
    extract::{Path, Query, State},
    response::{IntoResponse, Redirect, Response},
    Form, Json,
};
use axum_extra::extract::cookie::CookieJar;
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::{
    error::{single_field_error, AppResult},
    models::{
        checkbox,
        volume::{VolumeDetail, VolumeSummary},
    },
    AppState,
};

use super::{CurrentUser, FormPage};

#[derive(Debug, Deserialize, IntoParams)]
pub struct SearchQuery {
    /// Free-text catalog query
    pub q: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct SearchForm {
    pub query: String,
}

/// Add-from-catalog form
#[derive(Debug, Deserialize, ToSchema)]
pub struct AddVolumeForm {
    /// HTML checkbox value, present when ticked
    pub add_item: Option<String>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SearchResults {
    pub query: String,
    pub items: Vec<VolumeSummary>,
}

fn search_form() -> FormPage {
    FormPage::new("Search", "search", &["query"])
}

async fn run_search(state: &AppState, query: &str) -> AppResult<Response> {
    let items = state.services.catalog.search(query).await?;
    Ok(Json(SearchResults {
        query: query.to_string(),
        items,
    })
    .into_response())
}

/// Catalog search; without `q` the search form is returned
#[utoipa::path(
    get,
    path = "/search",
    tag = "catalog",
    security(("session_cookie" = [])),
    params(SearchQuery),
    responses(
        (status = 200, description = "Search results, or the search form when q is empty", body = SearchResults),
        (status = 502, description = "Catalog unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn search(
    State(state): State<AppState>,
    _current: CurrentUser,
    jar: CookieJar,
    Query(params): Query<SearchQuery>,
) -> AppResult<Response> {
    match params.q.as_deref().map(str::trim) {
        Some(q) if !q.is_empty() => run_search(&state, q).await,
        _ => Ok(search_form().render(jar)),
    }
}

/// Search form submission
pub async fn search_submit(
    State(state): State<AppState>,
    _current: CurrentUser,
    jar: CookieJar,
    Form(form): Form<SearchForm>,
) -> AppResult<Response> {
    let query = form.query.trim();
    if query.is_empty() {
        let errors = single_field_error("query", "required", "This field is required.");
        return Ok(search_form().with_errors(jar, &errors));
    }
    run_search(&state, query).await
}

/// One catalog record by its Google Books id
#[utoipa::path(
    get,
    path = "/google_volume/{id}",
    tag = "catalog",
    security(("session_cookie" = [])),
    params(("id" = String, Path, description = "Google Books volume id")),
    responses(
        (status = 200, description = "Volume details", body = VolumeDetail),
        (status = 404, description = "Unknown volume", body = crate::error::ErrorResponse),
        (status = 502, description = "Catalog unavailable", body = crate::error::ErrorResponse)
    )
)]
pub async fn google_volume(
    State(state): State<AppState>,
    _current: CurrentUser,
    Path(id): Path<String>,
) -> AppResult<Json<VolumeDetail>> {
    let volume = state.services.catalog.get_volume(&id).await?;
    Ok(Json(volume))
}

/// Store a catalog volume as a book, optionally with an owned copy
pub async fn add_google_volume(
    State(state): State<AppState>,
    CurrentUser { user, .. }: CurrentUser,
    Path(id): Path<String>,
    Form(form): Form<AddVolumeForm>,
) -> AppResult<Redirect> {
    let volume = state.services.catalog.get_volume(&id).await?;
    let book = volume.to_new_book(checkbox(form.add_item.as_deref()));
    state.services.library.add_book(&user, book).await?;
    Ok(Redirect::to("/"))
}
