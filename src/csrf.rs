//! Cross-site request forgery protection for form posts.
//!
//! Every browser gets a random nonce in a signed `SameSite=Strict` cookie.
//! Each rendered form carries a second token, signed over that nonce with the
//! same key, in a hidden `csrf_token` field. A POST is accepted only when the
//! field matches the cookie, so a page on another origin cannot forge one.

use std::convert::Infallible;

use axum::body::Body;
use axum::extract::{FromRequest, FromRequestParts, Request};
use axum::http::request::Parts;
use axum::http::{header, HeaderMap, HeaderName};
use axum::response::{IntoResponse, Response};
use axum::Form;
use rand::RngCore;
use serde::de::DeserializeOwned;

use crate::auth::cookies::{get_cookie_value, set_cookie};
use crate::error::AppError;
use crate::state::AppState;

/// Name of the hidden form field carrying the token.
pub const FIELD: &str = "csrf_token";

const FORM_TOKEN_PREFIX: &str = "csrf:";
const BODY_LIMIT: usize = 2 * 1024 * 1024;

fn cookie_name(state: &AppState) -> String {
    format!("{}_csrf", state.config.auth.cookie_name)
}

fn cookie_nonce<'a>(headers: &'a HeaderMap, state: &AppState) -> Option<&'a str> {
    let signed = get_cookie_value(headers, &cookie_name(state))?;
    state.signer.verify(signed)
}

fn form_token(state: &AppState, nonce: &str) -> String {
    state
        .signer
        .sign(&format!("{}{}", FORM_TOKEN_PREFIX, nonce))
}

/// Whether `submitted` is the form token belonging to the request's CSRF cookie.
pub fn is_valid(headers: &HeaderMap, state: &AppState, submitted: Option<&str>) -> bool {
    let (Some(nonce), Some(submitted)) = (cookie_nonce(headers, state), submitted) else {
        return false;
    };
    state
        .signer
        .verify(submitted)
        .and_then(|value| value.strip_prefix(FORM_TOKEN_PREFIX))
        .is_some_and(|value| value == nonce)
}

/// The form token to embed in rendered pages.
///
/// Reuses the browser's nonce when its cookie is valid, otherwise mints a new
/// one; `cookie()` then yields the header that hands it to the browser.
#[derive(Debug)]
pub struct CsrfToken {
    token: String,
    new_cookie: Option<String>,
}

impl CsrfToken {
    pub fn value(&self) -> String {
        self.token.clone()
    }

    pub fn cookie(&self) -> Option<(HeaderName, String)> {
        self.new_cookie
            .as_ref()
            .map(|cookie| (header::SET_COOKIE, cookie.clone()))
    }
}

impl FromRequestParts<AppState> for CsrfToken {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if let Some(nonce) = cookie_nonce(&parts.headers, state) {
            return Ok(CsrfToken {
                token: form_token(state, nonce),
                new_cookie: None,
            });
        }

        let mut bytes = [0u8; 32];
        rand::thread_rng().fill_bytes(&mut bytes);
        let nonce = hex::encode(bytes);

        Ok(CsrfToken {
            token: form_token(state, &nonce),
            new_cookie: Some(set_cookie(
                &cookie_name(state),
                &state.signer.sign(&nonce),
                state.config.auth.session_max_age_secs(),
            )),
        })
    }
}

/// `Form<T>` that first insists on a valid `csrf_token` field.
///
/// A missing or mismatched token is answered with 403 before `T` is parsed.
pub struct CsrfForm<T>(pub T);

impl<T> FromRequest<AppState> for CsrfForm<T>
where
    T: DeserializeOwned + Send,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &AppState) -> Result<Self, Self::Rejection> {
        let (parts, body) = req.into_parts();
        let bytes = axum::body::to_bytes(body, BODY_LIMIT)
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()).into_response())?;

        let submitted = url::form_urlencoded::parse(&bytes)
            .find(|(key, _)| *key == FIELD)
            .map(|(_, value)| value.into_owned());

        if !is_valid(&parts.headers, state, submitted.as_deref()) {
            tracing::warn!(
                "Rejected {} {}: missing or invalid CSRF token",
                parts.method,
                parts.uri.path()
            );
            return Err(AppError::Forbidden.into_response());
        }

        let req = Request::from_parts(parts, Body::from(bytes));
        let Form(value) = Form::<T>::from_request(req, state)
            .await
            .map_err(IntoResponse::into_response)?;
        Ok(CsrfForm(value))
    }
}
