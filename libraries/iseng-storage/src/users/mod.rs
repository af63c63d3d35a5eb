//! User queries
//!
//! Reads run against any pool handed in (the reader pool in production);
//! writes take a connection that is already inside a transaction.

use crate::error::{Result, StorageError};
use chrono::NaiveDate;
use iseng_core::{ListUserRequest, User, UserId};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqliteConnection, SqlitePool};

const DATE_FORMAT: &str = "%Y-%m-%d";

const COLUMNS: &str = "id, name, date_of_birth, created_at, updated_at";

/// Shared by list and count so both always see the same rows
///
/// Matches against `name_folded`; SQLite's own `LIKE` only folds ASCII.
const FILTER: &str = r"(? IS NULL OR name_folded LIKE ? ESCAPE '\')";

/// Case folding applied to stored names and to the filter alike
fn fold(name: &str) -> String {
    name.to_lowercase()
}

/// `LIKE` pattern matching `name` anywhere, with wildcards in `name` escaped
fn like_pattern(name: &str) -> String {
    let mut escaped = String::with_capacity(name.len() + 2);
    escaped.push('%');
    for ch in name.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    escaped.push('%');
    escaped
}

fn from_row(row: &SqliteRow) -> Result<User> {
    let date_of_birth: String = row.try_get("date_of_birth").map_err(StorageError::Query)?;
    let date_of_birth = NaiveDate::parse_from_str(&date_of_birth, DATE_FORMAT)
        .map_err(|e| StorageError::Decode(format!("invalid date_of_birth {:?}: {}", date_of_birth, e)))?;

    Ok(User {
        id: UserId::new(row.try_get::<String, _>("id").map_err(StorageError::Query)?),
        name: row.try_get("name").map_err(StorageError::Query)?,
        date_of_birth,
        created_at: row.try_get("created_at").map_err(StorageError::Query)?,
        updated_at: row.try_get("updated_at").map_err(StorageError::Query)?,
    })
}

/// Get a user by ID
pub async fn get_by_id(pool: &SqlitePool, id: &UserId) -> Result<Option<User>> {
    let sql = format!("SELECT {} FROM users WHERE id = ?", COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id.as_str())
        .fetch_optional(pool)
        .await
        .map_err(StorageError::Query)?;

    row.as_ref().map(from_row).transpose()
}

/// Get one page of users, newest first
pub async fn list(pool: &SqlitePool, filter: &ListUserRequest) -> Result<Vec<User>> {
    let pattern = filter.name_filter().map(|name| like_pattern(&fold(name)));
    let sql = format!(
        "SELECT {} FROM users WHERE {} ORDER BY created_at DESC, id ASC LIMIT ? OFFSET ?",
        COLUMNS, FILTER
    );

    let rows = sqlx::query(&sql)
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .bind(i64::from(filter.limit))
        .bind(i64::try_from(filter.offset()).unwrap_or(i64::MAX))
        .fetch_all(pool)
        .await
        .map_err(StorageError::Query)?;

    rows.iter().map(from_row).collect()
}

/// Count every user matching the filter
pub async fn count(pool: &SqlitePool, filter: &ListUserRequest) -> Result<u64> {
    let pattern = filter.name_filter().map(|name| like_pattern(&fold(name)));
    let sql = format!("SELECT COUNT(*) FROM users WHERE {}", FILTER);

    let count: i64 = sqlx::query_scalar(&sql)
        .bind(pattern.as_deref())
        .bind(pattern.as_deref())
        .fetch_one(pool)
        .await
        .map_err(StorageError::Query)?;

    Ok(count.max(0) as u64)
}

/// Insert a user
pub async fn insert(conn: &mut SqliteConnection, user: &User) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, name, name_folded, date_of_birth, created_at, updated_at)
         VALUES (?, ?, ?, ?, ?, ?)",
    )
    .bind(user.id.as_str())
    .bind(&user.name)
    .bind(fold(&user.name))
    .bind(user.date_of_birth.format(DATE_FORMAT).to_string())
    .bind(user.created_at)
    .bind(user.updated_at)
    .execute(conn)
    .await
    .map_err(StorageError::Write)?;

    Ok(())
}

/// Replace the mutable columns of a user, returning the number of rows touched
pub async fn update(conn: &mut SqliteConnection, user: &User) -> Result<u64> {
    let result = sqlx::query(
        "UPDATE users SET name = ?, name_folded = ?, date_of_birth = ?, updated_at = ?
         WHERE id = ?",
    )
    .bind(&user.name)
    .bind(fold(&user.name))
    .bind(user.date_of_birth.format(DATE_FORMAT).to_string())
    .bind(user.updated_at)
    .bind(user.id.as_str())
    .execute(conn)
    .await
    .map_err(StorageError::Write)?;

    Ok(result.rows_affected())
}

/// Delete a user, returning the number of rows touched
pub async fn delete(conn: &mut SqliteConnection, id: &UserId) -> Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE id = ?")
        .bind(id.as_str())
        .execute(conn)
        .await
        .map_err(StorageError::Write)?;

    Ok(result.rows_affected())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn like_pattern_escapes_wildcards() {
        assert_eq!(like_pattern("ann"), "%ann%");
        assert_eq!(like_pattern("50%_off"), "%50\\%\\_off%");
        assert_eq!(like_pattern("a\\b"), "%a\\\\b%");
    }

    #[test]
    fn fold_lowercases_beyond_ascii() {
        assert_eq!(fold("ÄRNE"), "ärne");
        assert_eq!(fold("Ölmez"), fold("ölmez"));
    }
}
