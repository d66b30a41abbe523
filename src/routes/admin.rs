use askama::Template;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{AppendHeaders, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use chrono::{Local, NaiveDate};

use crate::csrf::{CsrfForm, CsrfToken};
use crate::db::models::Post;
use crate::db::{posts, DbError};
use crate::error::{AppError, AppResult};
use crate::extractors::AdminUser;
use crate::flash::{redirect_with_flash, Flash};
use crate::forms::{DeleteForm, FormErrors, PostForm};
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/make_post.html")]
pub struct MakePostTemplate {
    pub logged_in: bool,
    pub is_edit: bool,
    pub action: String,
    pub form: PostForm,
    pub errors: FormErrors,
    pub flash: Option<String>,
    pub csrf_token: String,
}

#[derive(Template)]
#[template(path = "pages/confirm_delete.html")]
pub struct ConfirmDeleteTemplate {
    pub logged_in: bool,
    pub post: Post,
    pub csrf_token: String,
}

/// Administrator-only routes. Every handler takes `AdminUser`, so the
/// login and administrator checks run before anything else.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/new-post", get(new_post_page).post(create_post))
        .route("/edit-post/{post_id}", get(edit_post_page).post(update_post))
        .route("/delete/{post_id}", get(confirm_delete).post(delete_post))
}

/// Publication date as shown on posts, e.g. "April 01, 2024".
pub fn publication_date(date: NaiveDate) -> String {
    date.format("%B %d, %Y").to_string()
}

fn post_form_page(
    csrf: &CsrfToken,
    action: String,
    is_edit: bool,
    form: PostForm,
    errors: FormErrors,
    flash: Option<String>,
) -> Response {
    (
        AppendHeaders(csrf.cookie()),
        Html(MakePostTemplate {
            logged_in: true,
            is_edit,
            action,
            form,
            errors,
            flash,
            csrf_token: csrf.value(),
        }),
    )
        .into_response()
}

// -- Create --

async fn new_post_page(
    State(state): State<AppState>,
    _admin: AdminUser,
    flash: Flash,
    csrf: CsrfToken,
) -> Response {
    let clearing = flash.clearing(&state);
    (
        AppendHeaders(clearing),
        post_form_page(
            &csrf,
            "/new-post".to_string(),
            false,
            PostForm::default(),
            Vec::new(),
            flash.0,
        ),
    )
        .into_response()
}

async fn create_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<PostForm>,
) -> AppResult<Response> {
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                post_form_page(&csrf, "/new-post".to_string(), false, form, errors, None),
            )
                .into_response())
        }
    };

    let date = publication_date(Local::now().date_naive());

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    let post_id = match posts::create(&tx, &draft, admin.id, &date) {
        Ok(id) => id,
        Err(DbError::Conflict(msg)) => {
            tracing::info!("Post rejected: {}", msg);
            return Ok(redirect_with_flash(
                &state,
                "/new-post",
                "A post with that title already exists.",
            ));
        }
        Err(e) => return Err(e.into()),
    };
    tx.commit()?;

    tracing::info!("Post {} created by user {}", post_id, admin.id);
    Ok(Redirect::to("/").into_response())
}

// -- Edit --

async fn edit_post_page(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(post_id): Path<i64>,
    flash: Flash,
    csrf: CsrfToken,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;

    let clearing = flash.clearing(&state);
    Ok((
        AppendHeaders(clearing),
        post_form_page(
            &csrf,
            format!("/edit-post/{}", post.id),
            true,
            PostForm::from_post(&post),
            Vec::new(),
            flash.0,
        ),
    )
        .into_response())
}

async fn update_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(post_id): Path<i64>,
    csrf: CsrfToken,
    CsrfForm(form): CsrfForm<PostForm>,
) -> AppResult<Response> {
    let action = format!("/edit-post/{}", post_id);
    let draft = match form.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            let conn = state.db.get()?;
            posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;
            return Ok((
                StatusCode::UNPROCESSABLE_ENTITY,
                post_form_page(&csrf, action, true, form, errors, None),
            )
                .into_response());
        }
    };

    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    match posts::update(&tx, post_id, &draft, admin.id) {
        Ok(true) => {}
        Ok(false) => return Err(AppError::NotFound),
        Err(DbError::Conflict(msg)) => {
            tracing::info!("Post {} edit rejected: {}", post_id, msg);
            return Ok(redirect_with_flash(
                &state,
                &action,
                "A post with that title already exists.",
            ));
        }
        Err(e) => return Err(e.into()),
    }
    tx.commit()?;

    tracing::info!("Post {} updated by user {}", post_id, admin.id);
    Ok(Redirect::to(&format!("/post/{}", post_id)).into_response())
}

// -- Delete --

/// GET /delete/{post_id} only asks for confirmation; the deletion itself is a POST.
async fn confirm_delete(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(post_id): Path<i64>,
    csrf: CsrfToken,
) -> AppResult<Response> {
    let conn = state.db.get()?;
    let post = posts::find(&conn, post_id)?.ok_or(AppError::NotFound)?;

    Ok((
        AppendHeaders(csrf.cookie()),
        Html(ConfirmDeleteTemplate {
            logged_in: true,
            post,
            csrf_token: csrf.value(),
        }),
    )
        .into_response())
}

async fn delete_post(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    Path(post_id): Path<i64>,
    CsrfForm(DeleteForm {}): CsrfForm<DeleteForm>,
) -> AppResult<Response> {
    let mut conn = state.db.get()?;
    let tx = conn.transaction()?;
    if !posts::delete(&tx, post_id)? {
        return Err(AppError::NotFound);
    }
    tx.commit()?;

    tracing::info!("Post {} deleted by user {}", post_id, admin.id);
    Ok(Redirect::to("/").into_response())
}
