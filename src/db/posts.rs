use rusqlite::{params, Connection, OptionalExtension, Row};

use crate::db::models::{Post, PostDraft};
use crate::db::{is_unique_violation, DbError};

const POST_SELECT: &str = "SELECT p.id, p.author_id, u.name, p.title, p.subtitle, p.date, p.body, p.img_url
     FROM posts p
     LEFT JOIN users u ON u.id = p.author_id";

fn map_post(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        author_id: row.get(1)?,
        author_name: row.get(2)?,
        title: row.get(3)?,
        subtitle: row.get(4)?,
        date: row.get(5)?,
        body: row.get(6)?,
        img_url: row.get(7)?,
    })
}

fn title_conflict(e: rusqlite::Error, title: &str) -> DbError {
    if is_unique_violation(&e) {
        DbError::Conflict(format!("a post titled {:?} already exists", title))
    } else {
        e.into()
    }
}

/// Every post in store order.
pub fn list(conn: &Connection) -> rusqlite::Result<Vec<Post>> {
    let mut stmt = conn.prepare(&format!("{} ORDER BY p.id", POST_SELECT))?;
    let posts = stmt
        .query_map([], map_post)?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn find(conn: &Connection, id: i64) -> rusqlite::Result<Option<Post>> {
    conn.query_row(
        &format!("{} WHERE p.id = ?1", POST_SELECT),
        params![id],
        map_post,
    )
    .optional()
}

/// Insert a post dated `date`. Returns the new id.
pub fn create(
    conn: &Connection,
    draft: &PostDraft,
    author_id: i64,
    date: &str,
) -> Result<i64, DbError> {
    conn.execute(
        "INSERT INTO posts (author_id, title, subtitle, date, body, img_url)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            author_id,
            draft.title,
            draft.subtitle,
            date,
            draft.body,
            draft.img_url
        ],
    )
    .map_err(|e| title_conflict(e, &draft.title))?;

    Ok(conn.last_insert_rowid())
}

/// Overwrite the editable fields of a post; the publication date is left alone.
/// Returns false when the post does not exist.
pub fn update(
    conn: &Connection,
    id: i64,
    draft: &PostDraft,
    author_id: i64,
) -> Result<bool, DbError> {
    let rows = conn
        .execute(
            "UPDATE posts
             SET title = ?1, subtitle = ?2, img_url = ?3, author_id = ?4, body = ?5
             WHERE id = ?6",
            params![
                draft.title,
                draft.subtitle,
                draft.img_url,
                author_id,
                draft.body,
                id
            ],
        )
        .map_err(|e| title_conflict(e, &draft.title))?;

    Ok(rows > 0)
}

/// Delete a post together with its comments. Returns false when the post does not exist.
pub fn delete(conn: &Connection, id: i64) -> rusqlite::Result<bool> {
    conn.execute("DELETE FROM comments WHERE post_id = ?1", params![id])?;
    let rows = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    Ok(rows > 0)
}

#[cfg(test)]
pub fn count(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM posts", [], |row| row.get(0))
}
