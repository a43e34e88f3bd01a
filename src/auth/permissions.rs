use rusqlite::params;

use crate::error::AppResult;
use crate::state::DbPool;

pub fn has_permission(pool: &DbPool, user_id: &str, permission: &str) -> AppResult<bool> {
    let conn = pool.get()?;
    let granted: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM user_permissions
         WHERE user_id = ?1 AND permission = ?2)",
        params![user_id, permission],
        |row| row.get(0),
    )?;
    Ok(granted)
}

/// Grant a permission to a user. Granting twice is a no-op. Used by the seed
/// path and tests; real grants come from the external identity provider.
pub fn grant_permission(pool: &DbPool, user_id: &str, permission: &str) -> AppResult<()> {
    let conn = pool.get()?;
    conn.execute(
        "INSERT OR IGNORE INTO user_permissions (user_id, permission) VALUES (?1, ?2)",
        params![user_id, permission],
    )?;
    Ok(())
}
