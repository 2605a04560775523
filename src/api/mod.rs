//! HTTP handlers for the Booktoshare site

pub mod auth;
pub mod books;
pub mod catalog;
pub mod health;
pub mod items;
pub mod openapi;

use std::collections::BTreeMap;

use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{request::Parts, StatusCode},
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Json, Router,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::Utc;
use serde::Serialize;
use tower_http::{services::ServeFile, trace::TraceLayer};
use url::form_urlencoded;
use utoipa::ToSchema;
use validator::ValidationErrors;

use crate::{error::field_messages, models::user::User, services::auth::SessionToken, AppState};

pub const SESSION_COOKIE: &str = "booktoshare_session";
pub const FLASH_COOKIE: &str = "booktoshare_flash";

/// Build the application router with all routes
pub fn router(state: AppState) -> Router {
    let favicon = ServeFile::new(state.config.server.static_dir.join("favicon.png"));

    Router::new()
        .route("/", get(books::index))
        .route("/index", get(books::index))
        .route("/login", get(auth::login_page).post(auth::login))
        .route("/logout", get(auth::logout))
        .route("/register", get(auth::register_page).post(auth::register))
        .route("/add_book", get(books::add_book_page).post(books::add_book))
        .route("/search", get(catalog::search).post(catalog::search_submit))
        .route(
            "/google_volume/:id",
            get(catalog::google_volume).post(catalog::add_google_volume),
        )
        .route("/items/:id/lend", post(items::lend_item))
        .route("/items/:id/return", post(items::return_item))
        .route("/items/:id/history", get(items::item_history))
        .route("/health", get(health::health_check))
        .route_service("/favicon.ico", favicon)
        .with_state(state)
        .merge(openapi::create_openapi_router())
        .layer(TraceLayer::new_for_http())
}

/// Signed-in user resolved from the session cookie.
///
/// Without a live session the request is answered with a redirect to
/// `/login?next=<original path>`.
pub struct CurrentUser {
    pub user: User,
    pub token: String,
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");

        let jar = CookieJar::from_headers(&parts.headers);
        let Some(token) = jar.get(SESSION_COOKIE).map(|c| c.value().to_string()) else {
            return Err(login_redirect(next).into_response());
        };

        match state.services.auth.resolve_session(&token).await {
            Ok(Some(user)) => Ok(CurrentUser { user, token }),
            Ok(None) => Err((remove_session_cookie(jar), login_redirect(next)).into_response()),
            Err(e) => Err(e.into_response()),
        }
    }
}

/// `/login?next=...` for a protected path
pub fn login_redirect(next: &str) -> Redirect {
    let encoded: String = form_urlencoded::byte_serialize(next.as_bytes()).collect();
    Redirect::to(&format!("/login?next={}", encoded))
}

/// Only same-site relative paths made of visible ASCII are followed after login
pub fn safe_next(next: Option<&str>) -> &str {
    match next {
        Some(path)
            if path.starts_with('/')
                && !path.starts_with("//")
                && !path.starts_with("/\\")
                && path.bytes().all(|b| b.is_ascii_graphic()) =>
        {
            path
        }
        _ => "/index",
    }
}

pub fn session_cookie(session: &SessionToken, secure: bool) -> Cookie<'static> {
    let mut cookie = Cookie::build((SESSION_COOKIE, session.token.clone()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(secure);
    if session.remember {
        let seconds = (session.expires_at - Utc::now()).num_seconds().max(0);
        cookie = cookie.max_age(time::Duration::seconds(seconds));
    }
    cookie.build()
}

pub fn remove_session_cookie(jar: CookieJar) -> CookieJar {
    jar.remove(Cookie::build(SESSION_COOKIE).path("/"))
}

/// Queue a one-shot message for the next rendered form page
pub fn flash(jar: CookieJar, message: &str) -> CookieJar {
    let encoded: String = form_urlencoded::byte_serialize(message.as_bytes()).collect();
    jar.add(
        Cookie::build((FLASH_COOKIE, encoded))
            .path("/")
            .http_only(true)
            .same_site(SameSite::Lax),
    )
}

/// Pop the pending flash message, if any
pub fn take_flashes(jar: CookieJar) -> (CookieJar, Vec<String>) {
    let Some(raw) = jar.get(FLASH_COOKIE).map(|c| c.value().to_string()) else {
        return (jar, Vec::new());
    };
    let message: String = form_urlencoded::parse(format!("m={}", raw).as_bytes())
        .map(|(_, v)| v.into_owned())
        .next()
        .unwrap_or_default();
    let jar = jar.remove(Cookie::build(FLASH_COOKIE).path("/"));
    (jar, vec![message])
}

/// Description of a form for clients that render it themselves
#[derive(Debug, Serialize, ToSchema)]
pub struct FormPage {
    pub title: String,
    /// Form identifier (login, register, add_book, search)
    pub form: String,
    /// Expected field names, in display order
    pub fields: Vec<String>,
    /// Field-level validation messages
    pub errors: BTreeMap<String, Vec<String>>,
    pub flashes: Vec<String>,
}

impl FormPage {
    pub fn new(title: &str, form: &str, fields: &[&str]) -> Self {
        Self {
            title: title.to_string(),
            form: form.to_string(),
            fields: fields.iter().map(|f| f.to_string()).collect(),
            errors: BTreeMap::new(),
            flashes: Vec::new(),
        }
    }

    /// Render the page, consuming any pending flash message
    pub fn render(mut self, jar: CookieJar) -> Response {
        let (jar, flashes) = take_flashes(jar);
        self.flashes = flashes;
        (jar, Json(self)).into_response()
    }

    /// Re-render after failed validation
    pub fn with_errors(mut self, jar: CookieJar, errors: &ValidationErrors) -> Response {
        self.errors = field_messages(errors);
        let (jar, flashes) = take_flashes(jar);
        self.flashes = flashes;
        (StatusCode::UNPROCESSABLE_ENTITY, jar, Json(self)).into_response()
    }
}
