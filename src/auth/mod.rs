pub mod cookies;
pub mod handlers;
pub mod password;
pub mod session;

/// Primary key of the administrator account: the first user ever registered.
pub const ADMIN_USER_ID: i64 = 1;
