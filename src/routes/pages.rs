use askama::Template;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::Router;

use crate::extractors::MaybeUser;
use crate::routes::home::Html;
use crate::state::AppState;

#[derive(Template)]
#[template(path = "pages/about.html")]
pub struct AboutTemplate {
    pub logged_in: bool,
}

#[derive(Template)]
#[template(path = "pages/contact.html")]
pub struct ContactTemplate {
    pub logged_in: bool,
}

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/about", get(about))
        .route("/contact", get(contact))
}

async fn about(viewer: MaybeUser) -> Response {
    Html(AboutTemplate {
        logged_in: viewer.logged_in(),
    })
    .into_response()
}

async fn contact(viewer: MaybeUser) -> Response {
    Html(ContactTemplate {
        logged_in: viewer.logged_in(),
    })
    .into_response()
}
