use sha2::{Digest, Sha256};

#[derive(Debug, Clone)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    /// bcrypt hash, never the plaintext password.
    pub password_hash: String,
    pub created_at: String,
}

/// A post joined with its author's display name.
#[derive(Debug, Clone)]
pub struct Post {
    pub id: i64,
    pub author_id: Option<i64>,
    pub author_name: Option<String>,
    pub title: String,
    pub subtitle: String,
    pub date: String,
    pub body: String,
    pub img_url: String,
}

impl Post {
    pub fn author(&self) -> &str {
        self.author_name.as_deref().unwrap_or("Unknown")
    }
}

/// Fields an administrator supplies when writing or editing a post.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub title: String,
    pub subtitle: String,
    pub body: String,
    pub img_url: String,
}

/// A comment joined with its author.
#[derive(Debug, Clone)]
pub struct Comment {
    pub id: i64,
    pub post_id: i64,
    pub author_id: i64,
    pub author_name: String,
    pub author_email: String,
    pub text: String,
    pub created_at: String,
}

impl Comment {
    pub fn avatar_url(&self) -> String {
        gravatar_url(&self.author_email, 100)
    }
}

/// Gravatar image URL for an email, using the SHA-256 form of the address hash.
pub fn gravatar_url(email: &str, size: u32) -> String {
    let digest = Sha256::digest(email.trim().to_lowercase().as_bytes());
    format!(
        "https://www.gravatar.com/avatar/{}?s={}&r=g&d=retro",
        hex::encode(digest),
        size
    )
}
