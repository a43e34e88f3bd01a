use rusqlite::{params, OptionalExtension};

use crate::db::models::{Category, Post};
use crate::error::{AppError, AppResult};
use crate::state::DbPool;

pub fn get(pool: &DbPool, id: i64) -> AppResult<Category> {
    let conn = pool.get()?;
    conn.query_row(
        "SELECT id, name FROM categories WHERE id = ?1",
        params![id],
        |row| {
            Ok(Category {
                id: row.get(0)?,
                name: row.get(1)?,
            })
        },
    )
    .optional()?
    .ok_or(AppError::NotFound)
}

pub fn exists(pool: &DbPool, id: i64) -> AppResult<bool> {
    let conn = pool.get()?;
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM categories WHERE id = ?1)",
        params![id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Every post in the category, newest first with the same tie-break as the
/// paginated listings.
pub fn posts_in(pool: &DbPool, category_id: i64) -> AppResult<Vec<Post>> {
    let conn = pool.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, title, body, posted_at, kind, category_id, author_id
         FROM posts WHERE category_id = ?1
         ORDER BY posted_at DESC, id DESC",
    )?;
    let posts = stmt
        .query_map(params![category_id], |row| {
            Ok(Post {
                id: row.get(0)?,
                title: row.get(1)?,
                body: row.get(2)?,
                posted_at: row.get(3)?,
                kind: row.get(4)?,
                category_id: row.get(5)?,
                author_id: row.get(6)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(posts)
}

pub fn is_subscribed(pool: &DbPool, category_id: i64, user_id: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let found: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM category_subscribers
         WHERE category_id = ?1 AND user_id = ?2)",
        params![category_id, user_id],
        |row| row.get(0),
    )?;
    Ok(found)
}

/// Add `user_id` to the category's subscriber set. Subscribing twice is a
/// no-op, not an error; the set only grows.
pub fn subscribe(pool: &DbPool, category_id: i64, user_id: &str) -> AppResult<()> {
    if !exists(pool, category_id)? {
        return Err(AppError::NotFound);
    }
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO category_subscribers (category_id, user_id) VALUES (?1, ?2)",
        params![category_id, user_id],
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db;
    use r2d2_sqlite::SqliteConnectionManager;

    fn seeded_pool() -> DbPool {
        let manager = SqliteConnectionManager::memory();
        let pool = r2d2::Pool::builder().max_size(1).build(manager).unwrap();
        db::run_migrations(&pool).unwrap();
        let conn = pool.get().unwrap();
        conn.execute_batch(
            "PRAGMA foreign_keys = ON;
             INSERT INTO users (id, username) VALUES ('u1', 'alice');
             INSERT INTO users (id, username) VALUES ('u2', 'bob');
             INSERT INTO categories (name) VALUES ('tech');",
        )
        .unwrap();
        pool
    }

    #[test]
    fn get_missing_category_is_not_found() {
        let pool = seeded_pool();
        assert!(matches!(get(&pool, 9), Err(AppError::NotFound)));
        assert_eq!(get(&pool, 1).unwrap().name, "tech");
    }

    #[test]
    fn subscribe_is_idempotent() {
        let pool = seeded_pool();
        subscribe(&pool, 1, "u1").unwrap();
        subscribe(&pool, 1, "u1").unwrap();

        let conn = pool.get().unwrap();
        let count: i64 = conn
            .query_row(
                "SELECT COUNT(*) FROM category_subscribers WHERE category_id = 1",
                [],
                |row| row.get(0),
            )
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn subscribe_to_missing_category_is_not_found() {
        let pool = seeded_pool();
        assert!(matches!(subscribe(&pool, 9, "u1"), Err(AppError::NotFound)));
    }

    #[test]
    fn is_subscribed_tracks_membership_per_user() {
        let pool = seeded_pool();
        subscribe(&pool, 1, "u1").unwrap();
        assert!(is_subscribed(&pool, 1, "u1").unwrap());
        assert!(!is_subscribed(&pool, 1, "u2").unwrap());
    }
}
