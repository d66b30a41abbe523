use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use crate::auth::cookies::get_cookie_value;
use crate::auth::{session, ADMIN_USER_ID};
use crate::error::AppError;
use crate::state::AppState;

/// Represents the currently authenticated user.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: i64,
    pub name: String,
    pub email: String,
}

impl CurrentUser {
    pub fn is_admin(&self) -> bool {
        self.id == ADMIN_USER_ID
    }
}

/// Session token from a correctly signed session cookie.
pub fn session_token<'a>(headers: &'a HeaderMap, state: &AppState) -> Option<&'a str> {
    let signed = get_cookie_value(headers, &state.config.auth.cookie_name)?;
    state.signer.verify(signed)
}

/// Extractor that requires authentication.
/// Anonymous requests are redirected to the login page.
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = session_token(&parts.headers, state).ok_or(AppError::LoginRequired)?;

        let conn = state.db.get()?;
        let user = session::find_user(&conn, token)?.ok_or(AppError::LoginRequired)?;

        Ok(CurrentUser {
            id: user.id,
            name: user.name,
            email: user.email,
        })
    }
}

/// Optional user extractor: `None` instead of a redirect when not authenticated.
pub struct MaybeUser(pub Option<CurrentUser>);

impl MaybeUser {
    pub fn logged_in(&self) -> bool {
        self.0.is_some()
    }

    pub fn is_admin(&self) -> bool {
        self.0.as_ref().is_some_and(CurrentUser::is_admin)
    }
}

impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match CurrentUser::from_request_parts(parts, state).await {
            Ok(user) => Ok(MaybeUser(Some(user))),
            Err(AppError::LoginRequired) => Ok(MaybeUser(None)),
            Err(e) => Err(e),
        }
    }
}

/// Guard for administrator-only routes.
///
/// Anonymous requests are sent to the login page first; authenticated
/// non-administrators get 403 before the handler body runs.
pub struct AdminUser(pub CurrentUser);

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = CurrentUser::from_request_parts(parts, state).await?;

        if !user.is_admin() {
            tracing::warn!(
                "User {} denied access to {} {}",
                user.id,
                parts.method,
                parts.uri.path()
            );
            return Err(AppError::Forbidden);
        }

        Ok(AdminUser(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(id: i64) -> CurrentUser {
        CurrentUser {
            id,
            name: "n".into(),
            email: "e@x.com".into(),
        }
    }

    #[test]
    fn only_first_user_is_admin() {
        assert!(user(1).is_admin());
        assert!(!user(2).is_admin());
    }

    #[test]
    fn maybe_user_reports_state() {
        let anonymous = MaybeUser(None);
        assert!(!anonymous.logged_in());
        assert!(!anonymous.is_admin());

        let reader = MaybeUser(Some(user(2)));
        assert!(reader.logged_in());
        assert!(!reader.is_admin());

        assert!(MaybeUser(Some(user(1))).is_admin());
    }
}
