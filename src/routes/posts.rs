use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::db::models::{Comment, Post};
use crate::csrf::{CsrfForm, CsrfToken};
use crate::db::{comments, posts};
use crate::error::{AppError, AppResult};
use crate::extractors::MaybeUser;
use crate::flash::redirect_with_flash;
use crate::forms::{CommentForm, FormErrors};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/post.html")]
pub struct PostTemplate {
    pub logged_in: bool,
    pub is_admin: bool,
    pub post: Post,
    pub comments: Vec<Comment>,
    pub comment_text: String,
    pub errors: FormErrors,
    pub csrf_token: String,
}

pub fn router() -> Router<AppState> {
    Router::new().route("/post/{post_id}", get(show_post).post(add_comment))
}

fn post_page(
    viewer: &MaybeUser,
    csrf: &CsrfToken,
    post: Post,
    comments: Vec<Comment>,
    comment_text: String,
    errors: FormErrors,
) -> Response {
    (
        AppendHeaders(csrf.cookie()),
        Html(PostTemplate {
            logged_in: viewer.logged_in(),
            is_admin: viewer.is_admin(),
            post,
            comments,
            comment_text,
            errors,
            csrf_token: csrf.value(),
        }),
    )
        .into_response()
}

/// GET /post/{post_id}
async fn show_post(
    State(state): State<AppState>,
    viewer: MaybeUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;
    let comments = comments::list_for_post(&conn, post.id)?;

    Ok(post_page(&viewer, &csrf, post, comments, String::new(), Vec::new()))
}

/// POST /post/{post_id}: add a comment as the current user.
async fn add_comment(
    State(state): State<AppState>,
    viewer: MaybeUser,
    csrf: CsrfToken,
    Path(post_id): Path<i64>,
    CsrfForm(form): CsrfForm<CommentForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let post = posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;

    if let Err(errors) = form.validate() {
        let comments = comments::list_for_post(&conn, post.id)?;
        return Ok((
            StatusCode::UNPROCESSABLE_ENTITY,
            post_page(&viewer, &csrf, post, comments, form.comment_text, errors),
        )
            .into_response());
    }

    let Some(user) = viewer.0.as_ref() else {
        return Ok(redirect_with_flash(
            &state,
            "/login",
            "You need to login or register to comment.",
        ));
    };

    let tx = conn.transaction()?;
    let comment_id = comments::create(&tx, post.id, user.id, form.comment_text.trim())?;
    let comments = comments::list_for_post(&tx, post.id)?;
    tx.commit()?;

    tracing::info!(
        "User {} added comment {} on post {}",
        user.id,
        comment_id,
        post.id
    );
    Ok(post_page(&viewer, &csrf, post, comments, String::new(), Vec::new()))
}
