//! Test helpers and fixtures for storage integration tests
//!
//! Databases are real SQLite files in a temp dir so migrations, constraints
//! and the read-only reader pool behave as in production.
#![allow(dead_code)]

use chrono::NaiveDate;
use iseng_core::{User, UserId};
use iseng_storage::{SqlUserReader, SqlUserWriter};
use sqlx::SqlitePool;
use tempfile::TempDir;

/// Test database with a writer pool and a read-only reader pool on the same file
pub struct TestDb {
    pub writer_pool: SqlitePool,
    pub reader_pool: SqlitePool,
    _temp_dir: TempDir,
}

impl TestDb {
    /// Create a new test database with migrations applied
    pub async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");
        let db_url = format!("sqlite://{}", db_path.display());

        let writer_pool = iseng_storage::create_writer_pool(&db_url, 2)
            .await
            .expect("Failed to create writer pool");

        iseng_storage::run_migrations(&writer_pool)
            .await
            .expect("Failed to run migrations");

        let reader_pool = iseng_storage::create_reader_pool(&db_url, 2)
            .await
            .expect("Failed to create reader pool");

        Self {
            writer_pool,
            reader_pool,
            _temp_dir: temp_dir,
        }
    }

    pub fn reader(&self) -> SqlUserReader {
        SqlUserReader::new(self.reader_pool.clone())
    }

    pub fn writer(&self) -> SqlUserWriter {
        SqlUserWriter::new(self.writer_pool.clone())
    }
}

/// Test fixture: a user row that has not been stored yet
pub fn test_user(id: &str, name: &str, created_at: i64) -> User {
    User {
        id: UserId::new(id),
        name: name.to_string(),
        date_of_birth: NaiveDate::from_ymd_opt(1990, 5, 17).expect("valid date"),
        created_at,
        updated_at: created_at,
    }
}

/// Test fixture: insert and commit `user` through the writer
pub async fn seed_user(db: &TestDb, user: &User) {
    use iseng_core::UserWriter;

    let writer = db.writer();
    let mut tx = writer.begin_transaction().await.expect("Failed to begin");
    writer
        .create_user(&mut tx, user)
        .await
        .expect("Failed to insert user");
    writer
        .commit_transaction(&mut tx)
        .await
        .expect("Failed to commit");
}
