use askama::Template;
use axum::extract::State;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};

use crate::db::models::Post;
use crate::db::posts;
use crate::error::AppResult;
use crate::extractors::MaybeUser;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/index.html")]
pub struct IndexTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub posts: Vec<Post>,
}

/// Wrapper to render askama templates as axum responses
pub struct Html<T: Template>(pub T);

impl<T: Template> IntoResponse for Html<T> {
    fn into_response(self) -> Response {
        match self.0.render() {
            Ok(body) => (
                StatusCode::OK,
                [(header::CONTENT_TYPE, "text/html; charset=utf-8")],
                body,
            )
                .into_response(),
            Err(e) => {
                tracing::error!("Template render error: {}", e);
                (StatusCode::INTERNAL_SERVER_ERROR, "Template error").into_response()
            }
        }
    }
}

/// GET /: every post, in store order.
pub async fn index(State(state): State<AppState>, viewer: MaybeUser) -> AppResult<Response> {
    let conn = state.db.get()?;
    let posts = posts::list(&conn)?;

    Ok(Html(IndexTemplate {
        logged_in: viewer.logged_in(),
        is_admin: viewer.is_admin(),
        posts,
    })
    .into_response())
}
