//! One-shot user-visible messages carried across a redirect in a signed cookie.

use std::convert::Infallible;

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{header, HeaderName};
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};

use crate::auth::cookies::{clear_cookie, get_cookie_value, set_cookie};
use crate::state::AppState;

const FLASH_MAX_AGE_SECS: u64 = 300;

fn cookie_name(state: &AppState) -> String {
    format!("{}_flash", state.config.auth.cookie_name)
}

/// The pending flash message, if any.
#[derive(Debug, Default)]
pub struct Flash(pub Option<String>);

impl Flash {
    /// Header that drops the flash cookie once the message has been shown.
    pub fn clearing(&self, state: &AppState) -> Option<(HeaderName, String)> {
        self.0
            .as_ref()
            .map(|_| (header::SET_COOKIE, clear_cookie(&cookie_name(state))))
    }
}

impl FromRequestParts<AppState> for Flash {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let message = get_cookie_value(&parts.headers, &cookie_name(state))
            .and_then(|signed| state.signer.verify(signed))
            .and_then(|encoded| hex::decode(encoded).ok())
            .and_then(|bytes| String::from_utf8(bytes).ok());

        Ok(Flash(message))
    }
}

/// Redirect to `to`, leaving `message` for the next page that shows flashes.
pub fn redirect_with_flash(state: &AppState, to: &str, message: &str) -> Response {
    let value = state.signer.sign(&hex::encode(message.as_bytes()));
    (
        AppendHeaders([(
            header::SET_COOKIE,
            set_cookie(&cookie_name(state), &value, FLASH_MAX_AGE_SECS),
        )]),
        Redirect::to(to),
    )
        .into_response()
}
