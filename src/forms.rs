//! Submitted form bodies and their validation.
//!
//! Every field defaults to empty so that a missing field surfaces as a
//! validation message on the re-rendered form rather than a framework rejection.

use serde::Deserialize;
use url::Url;

use crate::db::models::{Post, PostDraft};

pub type FormErrors = Vec<String>;

fn required(label: &str, value: &str, errors: &mut FormErrors) {
    if value.trim().is_empty() {
        errors.push(format!("{} is required.", label));
    }
}

fn finish(errors: FormErrors) -> Result<(), FormErrors> {
    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        required("Name", &self.name, &mut errors);
        required("Email", &self.email, &mut errors);
        if !self.email.trim().is_empty() && !looks_like_email(self.email.trim()) {
            errors.push("Email must be a valid address.".to_string());
        }
        required("Password", &self.password, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        required("Email", &self.email, &mut errors);
        required("Password", &self.password, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CommentForm {
    pub comment_text: String,
}

impl CommentForm {
    pub fn validate(&self) -> Result<(), FormErrors> {
        let mut errors = Vec::new();
        required("Comment", &self.comment_text, &mut errors);
        finish(errors)
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct PostForm {
    pub title: String,
    pub subtitle: String,
    pub img_url: String,
    pub body: String,
}

impl PostForm {
    /// Pre-fill from an existing post.
    pub fn from_post(post: &Post) -> Self {
        Self {
            title: post.title.clone(),
            subtitle: post.subtitle.clone(),
            img_url: post.img_url.clone(),
            body: post.body.clone(),
        }
    }

    pub fn validate(&self) -> Result<PostDraft, FormErrors> {
        let mut errors = Vec::new();
        required("Blog post title", &self.title, &mut errors);
        required("Subtitle", &self.subtitle, &mut errors);
        required("Blog image URL", &self.img_url, &mut errors);
        if !self.img_url.trim().is_empty() && !is_web_url(self.img_url.trim()) {
            errors.push("Blog image URL must be an http or https URL.".to_string());
        }
        required("Blog content", &self.body, &mut errors);
        finish(errors)?;

        Ok(PostDraft {
            title: self.title.trim().to_string(),
            subtitle: self.subtitle.trim().to_string(),
            body: self.body.trim().to_string(),
            img_url: self.img_url.trim().to_string(),
        })
    }
}

/// Body of the delete confirmation form: nothing but the CSRF token.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct DeleteForm {}

fn looks_like_email(value: &str) -> bool {
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && domain.contains('.')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
                && !value.contains(char::is_whitespace)
        }
        None => false,
    }
}

fn is_web_url(value: &str) -> bool {
    Url::parse(value)
        .map(|u| matches!(u.scheme(), "http" | "https") && u.host().is_some())
        .unwrap_or(false)
}
