use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, OptionalExtension, Row};

use crate::db::models::{Post, PostKind};
use crate::error::{AppError, AppResult};
use crate::filters::PostFilter;
use crate::pagination::{Page, Paginated};
use crate::state::DbPool;

const POST_COLUMNS: &str = "id, title, body, posted_at, kind, category_id, author_id";

fn post_from_row(row: &Row<'_>) -> rusqlite::Result<Post> {
    Ok(Post {
        id: row.get(0)?,
        title: row.get(1)?,
        body: row.get(2)?,
        posted_at: row.get(3)?,
        kind: row.get(4)?,
        category_id: row.get(5)?,
        author_id: row.get(6)?,
    })
}

/// A validated submission, ready to persist.
#[derive(Debug, Clone)]
pub struct NewPost {
    pub title: String,
    pub body: String,
    pub category_id: i64,
    pub kind: PostKind,
}

/// One page of posts matching `filter`, newest first. Ties on `posted_at`
/// break by `id` descending so pagination stays deterministic. Pure read; a
/// page past the end comes back empty.
pub fn list(pool: &DbPool, filter: &PostFilter, page: Page) -> AppResult<Paginated<Post>> {
    let conn = pool.get()?;
    let (where_sql, values) = filter.sql_where();

    let total: i64 = conn.query_row(
        &format!("SELECT COUNT(*) FROM posts {where_sql}"),
        params_from_iter(values.iter()),
        |row| row.get(0),
    )?;

    let mut bind = values;
    bind.push(Value::Integer(i64::from(page.size)));
    bind.push(Value::Integer(i64::from(page.offset())));

    let mut stmt = conn.prepare(&format!(
        "SELECT {POST_COLUMNS} FROM posts {where_sql} \
         ORDER BY posted_at DESC, id DESC LIMIT ? OFFSET ?"
    ))?;
    let items = stmt
        .query_map(params_from_iter(bind.iter()), post_from_row)?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Paginated::new(items, page, total as u64))
}

pub fn get(pool: &DbPool, id: i64) -> AppResult<Post> {
    let conn = pool.get()?;
    conn.query_row(
        &format!("SELECT {POST_COLUMNS} FROM posts WHERE id = ?1"),
        params![id],
        post_from_row,
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

/// Persist a new post. `posted_at` is stamped by the database at insert time
/// and never touched again.
pub fn insert(pool: &DbPool, author_id: i64, new: &NewPost) -> AppResult<Post> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT INTO posts (title, body, kind, category_id, author_id)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![new.title, new.body, new.kind, new.category_id, author_id],
    )?;
    let id = conn.last_insert_rowid();
    drop(conn);
    get(pool, id)
}

/// Apply a validated submission to an existing post. The author and
/// `posted_at` are not part of the update.
pub fn update(pool: &DbPool, id: i64, new: &NewPost) -> AppResult<Post> {
    let conn = pool.get()?;
    let changed = conn.execute(
        "UPDATE posts SET title = ?1, body = ?2, kind = ?3, category_id = ?4 WHERE id = ?5",
        params![new.title, new.body, new.kind, new.category_id, id],
    )?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    drop(conn);
    get(pool, id)
}

pub fn delete(pool: &DbPool, id: i64) -> AppResult<()> {
    let conn = pool.get()?;
    let changed = conn.execute("DELETE FROM posts WHERE id = ?1", params![id])?;
    if changed == 0 {
        return Err(AppError::NotFound);
    }
    Ok(())
}
