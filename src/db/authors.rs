use rusqlite::{params, OptionalExtension};

use crate::db::models::Author;
use crate::error::AppResult;
use crate::state::DbPool;

/// Look up the author row for an identity. Authors are provisioned out of
/// band; a `None` here means the user may not publish.
pub fn find_by_user(pool: &DbPool, user_id: &str) -> AppResult<Option<Author>> {
    let conn = pool.get()?;
    let author = conn
        .query_row(
            "SELECT id, user_id, rating FROM authors WHERE user_id = ?1",
            params![user_id],
            |row| {
                Ok(Author {
                    id: row.get(0)?,
                    user_id: row.get(1)?,
                    rating: row.get(2)?,
                })
            },
        )
        .optional()?;
    Ok(author)
}

/// Provision an author row for a user. Used by the seed path and tests.
pub fn create(pool: &DbPool, user_id: &str) -> AppResult<Author> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO authors (user_id) VALUES (?1)",
        params![user_id],
    )?;
    drop(conn);
    find_by_user(pool, user_id)?
        .ok_or_else(|| crate::error::AppError::Internal("author row missing after insert".into()))
}
