//! In-process test harness: drives the full router with `oneshot` and keeps
//! a per-client cookie jar so sessions survive across requests.
#![allow(dead_code)]

use std::collections::HashMap;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chronicle::config::{Config, SecretKey};
use chronicle::db;
use chronicle::routes;
use chronicle::state::{AppState, DbPool};
use tempfile::TempDir;
use tower::ServiceExt;

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    _tmp: TempDir,
}

impl TestApp {
    pub fn new() -> Self {
        let tmp = TempDir::new().unwrap();
        let pool = db::create_pool(&tmp.path().join("blog.db")).expect("Failed to create test database");
        db::run_migrations(&pool).expect("Failed to run migrations");

        let mut config = Config::default();
        config.secret_key = SecretKey::new("integration-test-secret");
        config.auth.bcrypt_cost = 4;

        let state = AppState::new(pool.clone(), config).unwrap();
        Self {
            router: routes::router(state),
            pool,
            _tmp: tmp,
        }
    }

    /// A fresh browser with an empty cookie jar.
    pub fn client(&self) -> Client {
        Client {
            router: self.router.clone(),
            cookies: HashMap::new(),
            csrf: None,
        }
    }

    pub fn scalar(&self, sql: &str) -> i64 {
        let conn = self.pool.get().unwrap();
        conn.query_row(sql, [], |row| row.get(0)).unwrap()
    }
}

pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub body: String,
}

impl TestResponse {
    pub fn is_redirect_to(&self, path: &str) -> bool {
        self.status == StatusCode::SEE_OTHER && self.location.as_deref() == Some(path)
    }
}

pub struct Client {
    router: Router,
    pub cookies: HashMap<String, String>,
    csrf: Option<String>,
}

/// Value of the hidden `csrf_token` input on a rendered page.
pub fn hidden_csrf_token(body: &str) -> Option<String> {
    let marker = "name=\"csrf_token\" value=\"";
    let start = body.find(marker)? + marker.len();
    let len = body[start..].find('"')?;
    Some(body[start..start + len].to_string())
}

impl Client {
    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = Request::builder().method("GET").uri(path);
        self.send(request, Body::empty()).await
    }

    /// The form token this browser would find on any page, fetched once.
    pub async fn csrf_token(&mut self) -> String {
        if let Some(token) = &self.csrf {
            return token.clone();
        }
        let page = self.get("/login").await;
        let token = hidden_csrf_token(&page.body).expect("login page carries a CSRF token");
        self.csrf = Some(token.clone());
        token
    }

    /// Submit a form the way the browser would, including the page's CSRF token.
    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let token = self.csrf_token().await;
        let mut fields = form.to_vec();
        fields.push(("csrf_token", token.as_str()));
        self.post_without_csrf(path, &fields).await
    }

    /// Submit exactly the given fields, as a cross-site form would.
    pub async fn post_without_csrf(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request = Request::builder()
            .method("POST")
            .uri(path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded");
        self.send(request, Body::from(body)).await
    }

    async fn send(&mut self, request: axum::http::request::Builder, body: Body) -> TestResponse {
        let request = if self.cookies.is_empty() {
            request
        } else {
            let cookie = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{}={}", k, v))
                .collect::<Vec<_>>()
                .join("; ");
            request.header(header::COOKIE, cookie)
        };

        let response = self
            .router
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        for value in response.headers().get_all(header::SET_COOKIE) {
            self.store_cookie(value.to_str().unwrap());
        }

        let status = response.status();
        let location = response
            .headers()
            .get(header::LOCATION)
            .map(|v| v.to_str().unwrap().to_string());
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();

        TestResponse {
            status,
            location,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }

    fn store_cookie(&mut self, set_cookie: &str) {
        let pair = set_cookie.split(';').next().unwrap_or_default();
        let Some((name, value)) = pair.split_once('=') else {
            return;
        };
        let expired = set_cookie.contains("Max-Age=0");
        if value.is_empty() || expired {
            self.cookies.remove(name.trim());
        } else {
            self.cookies
                .insert(name.trim().to_string(), value.trim().to_string());
        }
    }

    pub async fn register(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            "/register",
            &[("name", name), ("email", email), ("password", password)],
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post("/login", &[("email", email), ("password", password)])
            .await
    }

    pub async fn logout(&mut self) -> TestResponse {
        self.get("/logout").await
    }

    /// Whether the server renders this client as logged in.
    pub async fn is_authenticated(&mut self) -> bool {
        let page = self.get("/about").await;
        page.body.contains("href=\"/logout\"")
    }

    pub async fn create_post(&mut self, title: &str) -> TestResponse {
        self.post(
            "/new-post",
            &[
                ("title", title),
                ("subtitle", "A subtitle"),
                ("img_url", "https://example.com/cover.jpg"),
                ("body", "<p>Post body</p>"),
            ],
        )
        .await
    }
}

/// App with the administrator (user 1) registered and logged in.
pub async fn app_with_admin() -> (TestApp, Client) {
    let app = TestApp::new();
    let mut admin = app.client();
    let response = admin.register("Admin", "admin@x.com", "admin-pw").await;
    assert!(response.is_redirect_to("/"));
    (app, admin)
}
