//! Login, logout and registration endpoints

use axum::{
    extract::{Query, State},
    response::{IntoResponse, Redirect, Response},
    Form,
};
use axum_extra::extract::cookie::CookieJar;
use serde::Deserialize;
use validator::Validate;

use crate::{
    error::{AppError, AppResult},
    models::user::{LoginForm, RegisterForm},
    AppState,
};

use super::{flash, remove_session_cookie, safe_next, session_cookie, CurrentUser, FormPage};

const LOGIN_FIELDS: &[&str] = &["username", "password", "remember_me"];
const REGISTER_FIELDS: &[&str] = &["username", "email", "password", "password2"];

#[derive(Debug, Deserialize)]
pub struct NextParam {
    pub next: Option<String>,
}

fn login_form() -> FormPage {
    FormPage::new("Sign In", "login", LOGIN_FIELDS)
}

fn register_form() -> FormPage {
    FormPage::new("Register", "register", REGISTER_FIELDS)
}

/// Sign-in form
pub async fn login_page(current: Option<CurrentUser>, jar: CookieJar) -> Response {
    if current.is_some() {
        return Redirect::to("/index").into_response();
    }
    login_form().render(jar)
}

/// Check credentials and open a session
pub async fn login(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    jar: CookieJar,
    Query(params): Query<NextParam>,
    Form(form): Form<LoginForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to("/index").into_response());
    }
    if let Err(errors) = form.validate() {
        return Ok(login_form().with_errors(jar, &errors));
    }

    let user = match state.services.auth.authenticate(&form.username, &form.password).await {
        Ok(user) => user,
        Err(AppError::Authentication(message)) => {
            return Ok((flash(jar, &message), Redirect::to("/login")).into_response());
        }
        Err(e) => return Err(e),
    };

    let session = state.services.auth.start_session(&user, form.remember()).await?;
    let jar = jar.add(session_cookie(&session, state.config.auth.secure_cookies));

    let next = safe_next(params.next.as_deref());
    Ok((jar, Redirect::to(next)).into_response())
}

/// Close the current session
pub async fn logout(
    State(state): State<AppState>,
    CurrentUser { token, .. }: CurrentUser,
    jar: CookieJar,
) -> AppResult<Response> {
    state.services.auth.logout(&token).await?;
    let jar = flash(remove_session_cookie(jar), "Logging out");
    Ok((jar, Redirect::to("/index")).into_response())
}

/// Account creation form
pub async fn register_page(current: Option<CurrentUser>, jar: CookieJar) -> Response {
    if current.is_some() {
        return Redirect::to("/index").into_response();
    }
    register_form().render(jar)
}

/// Create an account, then send the user to the sign-in form
pub async fn register(
    State(state): State<AppState>,
    current: Option<CurrentUser>,
    jar: CookieJar,
    Form(form): Form<RegisterForm>,
) -> AppResult<Response> {
    if current.is_some() {
        return Ok(Redirect::to("/index").into_response());
    }

    match state.services.auth.register(form).await {
        Ok(_) => {
            let jar = flash(jar, "Congratulations, you are now a registered user!");
            Ok((jar, Redirect::to("/login")).into_response())
        }
        Err(AppError::Validation(errors)) => Ok(register_form().with_errors(jar, &errors)),
        Err(e) => Err(e),
    }
}
