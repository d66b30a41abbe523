use askama::Template;
use axum::extract::State;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use rusqlite::Connection;

use crate::auth::cookies::{clear_cookie, set_cookie};
use crate::auth::{password, session};
use crate::db::{users, DbError};
use crate::csrf::{CsrfForm, CsrfToken};
use crate::error::AppResult;
use crate::extractors::{session_token, MaybeUser};
use crate::flash::{redirect_with_flash, Flash};
use crate::forms::{FormErrors, LoginForm, RegisterForm};
use crate::routes::home::Html;
use crate::state::AppState;

const EMAIL_TAKEN: &str = "You've already signed up with that email, log in instead!";
const NO_SUCH_ACCOUNT: &str = "That email does not exist, please try again.";
const WRONG_PASSWORD: &str = "Password incorrect, please try again.";

// -- Templates --

#[derive(Template)]
#[template(path = "pages/register.html")]
pub struct RegisterTemplate {
    pub logged_in: bool,
    pub name: String,
    pub email: String,
    pub errors: FormErrors,
    pub flash: Option<String>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "pages/login.html")]
pub struct LoginTemplate {
    pub logged_in: bool,
    pub email: String,
    pub errors: FormErrors,
    pub flash: Option<String>,
    pub csrf_token: String,
}

// -- Response helpers --

/// Attach a signed session cookie and send the browser home.
fn start_session_response(state: &AppState, token: &str) -> Response {
    let cookie = set_cookie(
        &state.config.auth.cookie_name,
        &state.signer.sign(token),
        state.config.auth.session_max_age_secs(),
    );
    (
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Redirect::to("/"),
    )
        .into_response()
}

/// Drop the session the browser already holds, if any, before issuing a new one.
fn end_previous_session(
    conn: &Connection,
    headers: &HeaderMap,
    state: &AppState,
) -> rusqlite::Result<()> {
    if let Some(token) = session_token(headers, state) {
        session::delete_session(conn, token)?;
    }
    Ok(())
}

// -- Registration --

/// GET /register
pub async fn register_page(
    State(state): State<AppState>,
    viewer: MaybeUser,
    flash: Flash,
    csrf: CsrfToken,
) -> Response {
    let clearing = flash.clearing(&state);
    (
        AppendHeaders(clearing),
        AppendHeaders(csrf.cookie()),
        Html(RegisterTemplate {
            logged_in: viewer.logged_in(),
            name: String::new(),
            email: String::new(),
            errors: Vec::new(),
            flash: flash.0,
            csrf_token: csrf.value(),
        }),
    )
        .into_response()
}

/// POST /register
pub async fn register(
    State(state): State<AppState>,
    viewer: MaybeUser,
    headers: HeaderMap,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<RegisterForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(RegisterTemplate {
                logged_in: viewer.logged_in(),
                name: form.name,
                email: form.email,
                errors,
                flash: None,
                csrf_token: csrf.value(),
            }),
        )
            .into_response());
    }

    let name = form.name.trim();
    let email = form.email.trim();

    let mut conn = state.db.get()?;
    if users::find_by_email(&conn, email)?.is_some() {
        tracing::info!("Registration rejected: email already in use");
        return Ok(redirect_with_flash(&state, "/login", EMAIL_TAKEN));
    }

    let hash =
        password::hash_password_blocking(form.password.clone(), state.config.auth.bcrypt_cost)
            .await?;

    let tx = conn.transaction()?;
    let user = match users::create_user(&tx, name, email, &hash) {
        Ok(user) => user,
        // Lost a race with a concurrent registration for the same email.
        Err(DbError::Conflict(_)) => {
            tracing::info!("Registration rejected: email already in use");
            return Ok(redirect_with_flash(&state, "/login", EMAIL_TAKEN));
        }
        Err(e) => return Err(e.into()),
    };
    end_previous_session(&tx, &headers, &state)?;
    let token = session::create_session(&tx, user.id, state.config.auth.session_hours)?;
    tx.commit()?;

    tracing::info!("Registered user {}", user.id);
    Ok(start_session_response(&state, &token))
}

// -- Login / logout --

/// GET /login
pub async fn login_page(
    State(state): State<AppState>,
    viewer: MaybeUser,
    flash: Flash,
    csrf: CsrfToken,
) -> Response {
    let clearing = flash.clearing(&state);
    (
        AppendHeaders(clearing),
        AppendHeaders(csrf.cookie()),
        Html(LoginTemplate {
            logged_in: viewer.logged_in(),
            email: String::new(),
            errors: Vec::new(),
            flash: flash.0,
            csrf_token: csrf.value(),
        }),
    )
        .into_response()
}

/// POST /login
pub async fn login(
    State(state): State<AppState>,
    viewer: MaybeUser,
    headers: HeaderMap,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<LoginForm>,
) -> AppResult<Response> {
    if let Err(errors) = form.validate() {
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            Html(LoginTemplate {
                logged_in: viewer.logged_in(),
                email: form.email,
                errors,
                flash: None,
                csrf_token: csrf.value(),
            }),
        )
            .into_response());
    }

    let conn = state.db.get()?;
    let Some(user) = users::find_by_email(&conn, form.email.trim())? else {
        tracing::info!("Login failed: unknown email");
        return Ok(redirect_with_flash(&state, "/login", NO_SUCH_ACCOUNT));
    };

    if !password::verify_password_blocking(form.password, user.password_hash.clone()).await? {
        tracing::info!("Login failed for user {}: wrong password", user.id);
        return Ok(redirect_with_flash(&state, "/login", WRONG_PASSWORD));
    }

    end_previous_session(&conn, &headers, &state)?;
    let token = session::create_session(&conn, user.id, state.config.auth.session_hours)?;
    tracing::info!("User {} logged in", user.id);
    Ok(start_session_response(&state, &token))
}

/// GET /logout: always clears the session cookie, logged in or not.
pub async fn logout(State(state): State<AppState>, headers: HeaderMap) -> AppResult<Response> {
    if let Some(token) = session_token(&headers, &state) {
        let conn = state.db.get()?;
        session::delete_session(&conn, token)?;
        tracing::info!("Session ended");
    }

    Ok((
        AppendHeaders([(
            header::SET_COOKIE,
            clear_cookie(&state.config.auth.cookie_name),
        )]),
        Redirect::to("/"),
    )
        .into_response())
}
