use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::User;
use crate::db::{is_unique_violation, DbError};

const USER_COLUMNS: &str = "id, name, email, password, created_at";

fn map_user(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        created_at: row.get(4)?,
    })
}

/// Insert a user. A taken email comes back as `DbError::Conflict` and no row is written.
pub fn create_user(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
) -> Result<User, DbError> {
    let inserted = conn.execute(
        "INSERT INTO users (name, email, password) VALUES (?1, ?2, ?3)",
        params![name, email, password_hash],
    );

    match inserted {
        Ok(_) => {}
        Err(e) if is_unique_violation(&e) => {
            return Err(DbError::Conflict(format!("email {} already registered", email)))
        }
        Err(e) => return Err(e.into()),
    }

    let id = conn.last_insert_rowid();
    find_by_id(conn, id)?.ok_or(DbError::Sql(rusqlite::Error::QueryReturnedNoRows))
}

pub fn find_by_id(conn: &Connection, id: i64) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS),
        params![id],
        map_user,
    )
    .optional()
}

/// Exact, case-sensitive match on the stored email.
pub fn find_by_email(conn: &Connection, email: &str) -> rusqlite::Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS),
        params![email],
        map_user,
    )
    .optional()
}

#[cfg(test)]
pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM users", [], |row| row.get(0))
}
